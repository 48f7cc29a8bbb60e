use super::PlayerError;
use std::path::Path;

/// The sound output the playback engine drives.
///
/// Backends report progress only through [`AudioBackend::is_busy`]; there is
/// no completion callback, which is why track ends are detected by polling.
pub trait AudioBackend: Send + Sync {
    /// Bind a new source, halting whatever was playing. Fails without side
    /// effects if the file cannot be opened or decoded.
    fn load(&self, path: &Path) -> Result<(), PlayerError>;

    /// Start the bound source from its beginning.
    fn start(&self) -> Result<(), PlayerError>;

    fn pause(&self);

    fn resume(&self);

    fn stop(&self);

    /// True while audio is being produced (not paused, not drained).
    fn is_busy(&self) -> bool;
}

#[cfg(feature = "audio")]
pub use self::rodio_backend::RodioBackend;

#[cfg(feature = "audio")]
mod rodio_backend {
    use super::AudioBackend;
    use crate::audio::PlayerError;
    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
    use std::fs::File;
    use std::io::{self, BufReader};
    use std::path::{Path, PathBuf};
    use std::sync::{Mutex, MutexGuard, PoisonError};
    use tracing::debug;

    pub struct RodioBackend {
        stream_handle: OutputStreamHandle,
        volume: f32,
        source: Mutex<Option<PathBuf>>,
        sink: Mutex<Option<Sink>>,
    }

    impl RodioBackend {
        /// Open the default output device.
        ///
        /// The returned `OutputStream` must outlive the backend; dropping it
        /// silences every sink created from the handle.
        pub fn try_default(volume: f32) -> Result<(OutputStream, Self), PlayerError> {
            let (stream, stream_handle) =
                OutputStream::try_default().map_err(|e| PlayerError::Output(e.to_string()))?;

            Ok((
                stream,
                Self {
                    stream_handle,
                    volume: volume.clamp(0.0, 1.0),
                    source: Mutex::new(None),
                    sink: Mutex::new(None),
                },
            ))
        }

        fn decode(path: &Path) -> Result<Decoder<BufReader<File>>, PlayerError> {
            let file = File::open(path).map_err(|source| match source.kind() {
                io::ErrorKind::NotFound => PlayerError::Missing(path.to_path_buf()),
                _ => PlayerError::Open {
                    path: path.to_path_buf(),
                    source,
                },
            })?;

            Decoder::new(BufReader::new(file)).map_err(|e| PlayerError::Decode {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        }

        fn sink(&self) -> MutexGuard<'_, Option<Sink>> {
            self.sink.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    impl AudioBackend for RodioBackend {
        fn load(&self, path: &Path) -> Result<(), PlayerError> {
            // Validate before touching the current sink so a bad file leaves
            // the previous track untouched
            Self::decode(path)?;

            if let Some(sink) = self.sink().take() {
                sink.stop();
            }
            *self.source.lock().unwrap_or_else(PoisonError::into_inner) = Some(path.to_path_buf());
            debug!("Bound source {}", path.display());
            Ok(())
        }

        fn start(&self) -> Result<(), PlayerError> {
            let path = self
                .source
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
                .ok_or(PlayerError::NothingLoaded)?;
            let source = Self::decode(&path)?;

            let sink = Sink::try_new(&self.stream_handle)
                .map_err(|e| PlayerError::Output(e.to_string()))?;
            sink.set_volume(self.volume);
            sink.append(source);

            // Replacing the old sink drops it, which stops its output
            *self.sink() = Some(sink);
            Ok(())
        }

        fn pause(&self) {
            if let Some(sink) = self.sink().as_ref() {
                sink.pause();
            }
        }

        fn resume(&self) {
            if let Some(sink) = self.sink().as_ref() {
                sink.play();
            }
        }

        fn stop(&self) {
            if let Some(sink) = self.sink().take() {
                sink.stop();
            }
        }

        fn is_busy(&self) -> bool {
            self.sink()
                .as_ref()
                .map(|sink| !sink.empty() && !sink.is_paused())
                .unwrap_or(false)
        }
    }
}
