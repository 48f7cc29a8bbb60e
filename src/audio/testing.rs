use super::{AudioBackend, PlayerError};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory stand-in for the sound card. Tracks "play" until `finish()`.
#[derive(Debug, Default)]
pub(crate) struct FakeBackend {
    busy: AtomicBool,
    paused: AtomicBool,
    starts: AtomicUsize,
    loaded: Mutex<Option<PathBuf>>,
}

impl FakeBackend {
    pub(crate) fn playing() -> Self {
        let backend = Self::default();
        backend.busy.store(true, Ordering::SeqCst);
        backend
    }

    /// Let the current source run out.
    pub(crate) fn finish(&self) {
        self.busy.store(false, Ordering::SeqCst);
    }

    pub(crate) fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub(crate) fn loaded(&self) -> Option<PathBuf> {
        self.loaded.lock().unwrap().clone()
    }
}

impl AudioBackend for FakeBackend {
    fn load(&self, path: &Path) -> Result<(), PlayerError> {
        if !path.is_file() {
            return Err(PlayerError::Missing(path.to_path_buf()));
        }
        self.busy.store(false, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
        *self.loaded.lock().unwrap() = Some(path.to_path_buf());
        Ok(())
    }

    fn start(&self) -> Result<(), PlayerError> {
        if self.loaded.lock().unwrap().is_none() {
            return Err(PlayerError::NothingLoaded);
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
        self.busy.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    fn stop(&self) {
        self.busy.store(false, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
    }

    fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst) && !self.paused.load(Ordering::SeqCst)
    }
}
