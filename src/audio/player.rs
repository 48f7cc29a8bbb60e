use super::monitor::TrackEndMonitor;
use super::{AudioBackend, AudioConfig, Track};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("track file not found: {}", .0.display())]
    Missing(PathBuf),
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unsupported or corrupted audio in {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },
    #[error("audio output unavailable: {0}")]
    Output(String),
    #[error("no track loaded")]
    NothingLoaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

/// Why output halted without the track running out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `stop()` was called.
    User,
    /// Another track was loaded over this one.
    Replaced,
}

#[derive(Debug, Clone)]
pub enum PlayerEvent {
    /// The track bound for `generation` ran out on its own.
    TrackFinished { generation: u64, track: Track },
}

/// Playback bookkeeping shared with the end monitors.
#[derive(Debug, Default)]
pub(crate) struct Session {
    pub(crate) current_track: Option<Track>,
    pub(crate) paused: bool,
    pub(crate) generation: u64,
    pub(crate) stopped: Option<StopReason>,
}

pub(crate) fn lock(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The application's single playback session.
///
/// Every `load()` and `play()` bumps a generation token. Each `play()` arms a
/// [`TrackEndMonitor`] for the generation it created, so a monitor left over
/// from an earlier attempt retires instead of reporting a stale completion.
pub struct PlaybackEngine {
    backend: Arc<dyn AudioBackend>,
    session: Arc<Mutex<Session>>,
    events: mpsc::UnboundedSender<PlayerEvent>,
    poll_interval: Duration,
}

impl PlaybackEngine {
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        config: &AudioConfig,
        events: mpsc::UnboundedSender<PlayerEvent>,
    ) -> Self {
        Self {
            backend,
            session: Arc::new(Mutex::new(Session::default())),
            events,
            poll_interval: config.end_poll_interval,
        }
    }

    /// Bind `track` as the current source. On failure nothing changes and
    /// whatever was playing keeps playing.
    pub fn load(&mut self, track: &Track) -> Result<(), PlayerError> {
        self.backend.load(&track.file_path)?;

        let mut session = lock(&self.session);
        if session.current_track.is_some() && session.stopped.is_none() {
            session.stopped = Some(StopReason::Replaced);
        }
        session.current_track = Some(track.clone());
        session.paused = false;
        session.generation += 1;
        debug!("Loaded {} (generation {})", track.display_title(), session.generation);
        Ok(())
    }

    /// Resume if paused, otherwise start the loaded track from the top.
    pub fn play(&mut self) -> Result<(), PlayerError> {
        let (generation, track) = {
            let mut session = lock(&self.session);
            let track = session.current_track.clone().ok_or(PlayerError::NothingLoaded)?;

            if session.paused {
                self.backend.resume();
            } else {
                self.backend.start()?;
            }

            session.paused = false;
            session.stopped = None;
            session.generation += 1;
            (session.generation, track)
        };

        info!("Playing {} (generation {})", track.display_title(), generation);
        TrackEndMonitor::new(
            generation,
            track,
            Arc::clone(&self.session),
            Arc::clone(&self.backend),
            self.poll_interval,
            self.events.clone(),
        )
        .spawn();

        Ok(())
    }

    /// Suspend output. The armed monitor keeps waiting: a pause is not an end.
    /// A track that already ran out cannot be paused.
    pub fn pause(&mut self) {
        let mut session = lock(&self.session);
        if session.current_track.is_none()
            || session.paused
            || session.stopped.is_some()
            || !self.backend.is_busy()
        {
            return;
        }
        self.backend.pause();
        session.paused = true;
        debug!("Paused (generation {})", session.generation);
    }

    /// Halt output. The pending monitor of this generation retires without
    /// firing.
    pub fn stop(&mut self) {
        let mut session = lock(&self.session);
        self.backend.stop();
        session.paused = false;
        session.stopped = Some(StopReason::User);
        debug!("Stopped (generation {})", session.generation);
    }

    pub fn is_playing(&self) -> bool {
        let session = lock(&self.session);
        !session.paused && session.stopped.is_none() && self.backend.is_busy()
    }

    pub fn state(&self) -> PlaybackState {
        let session = lock(&self.session);
        if session.paused {
            PlaybackState::Paused
        } else if session.stopped.is_none() && self.backend.is_busy() {
            PlaybackState::Playing
        } else {
            PlaybackState::Stopped
        }
    }

    pub fn current_track(&self) -> Option<Track> {
        lock(&self.session).current_track.clone()
    }

    pub fn generation(&self) -> u64 {
        lock(&self.session).generation
    }

    /// Whether an event stamped with `generation` still describes the
    /// current playback attempt. Anything the user did since then wins.
    pub fn is_current(&self, generation: u64) -> bool {
        lock(&self.session).generation == generation
    }
}
