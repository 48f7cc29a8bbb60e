pub mod backend;
pub mod monitor;
pub mod player;
pub mod playlist;
pub mod scanner;
pub mod track;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::AudioBackend;
#[cfg(feature = "audio")]
pub use backend::RodioBackend;
pub use monitor::{MonitorOutcome, TrackEndMonitor};
pub use player::{PlaybackEngine, PlaybackState, PlayerError, PlayerEvent, StopReason};
pub use playlist::{Playlist, PlaylistStore, StoreError};
pub use scanner::{MusicLibrary, MusicScanner};
pub use track::Track;

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub volume: f32,              // 0.0 to 1.0
    pub end_poll_interval: Duration,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            volume: 0.7,
            // The backend only exposes a busy flag, so completion is polled
            end_poll_interval: Duration::from_millis(500),
        }
    }
}

impl From<&crate::config::Config> for AudioConfig {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            volume: config.audio.volume.clamp(0.0, 1.0),
            end_poll_interval: Duration::from_millis(config.audio.end_poll_ms.max(1)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Flac,
    Ogg,
    Mp4,
    Wav,
    Unknown,
}

impl AudioFormat {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "mp3" => AudioFormat::Mp3,
            "flac" => AudioFormat::Flac,
            "ogg" | "oga" => AudioFormat::Ogg,
            "mp4" | "m4a" | "aac" => AudioFormat::Mp4,
            "wav" => AudioFormat::Wav,
            _ => AudioFormat::Unknown,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, AudioFormat::Unknown)
    }
}
