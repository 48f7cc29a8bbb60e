// TuneDeck library - music browsing and playback behind a terminal screen stack
// The binary wires these together; everything here is testable without a terminal

pub mod audio; // playback session, scanning, playlists
pub mod config; // settings file and defaults
pub mod devices; // bluetooth and output sink configuration
pub mod download; // background fetch and its status record
pub mod ui; // screens, widgets and the run loop

pub use audio::{PlaybackEngine, Track};
pub use config::Config;
