use super::AudioFormat;
use std::path::{Path, PathBuf};

/// One playable file in the library directory.
///
/// The file name doubles as the identifier: playlists reference tracks by it
/// and the download bridge matches placeholder entries against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub file_path: PathBuf,
    pub file_name: String,
    pub format: AudioFormat,
}

impl Track {
    pub fn new(file_path: PathBuf) -> Self {
        let file_name = file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let format = file_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(AudioFormat::from_extension)
            .unwrap_or(AudioFormat::Unknown);

        Self {
            file_path,
            file_name,
            format,
        }
    }

    /// Resolve a bare file name against the library directory.
    pub fn in_library(library_dir: &Path, file_name: &str) -> Self {
        Self::new(library_dir.join(file_name))
    }

    pub fn id(&self) -> &str {
        &self.file_name
    }

    pub fn display_title(&self) -> &str {
        if self.file_name.is_empty() {
            "Unknown"
        } else {
            &self.file_name
        }
    }

    pub fn is_playable(&self) -> bool {
        self.format.is_supported() && self.file_path.is_file()
    }
}
