use super::Track;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct MusicScanner {
    supported_extensions: Vec<String>,
}

impl MusicScanner {
    pub fn new() -> Self {
        Self {
            supported_extensions: ["mp3", "flac", "ogg", "oga", "mp4", "m4a", "aac", "wav"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }

    /// List the audio files directly inside `dir`, sorted by file name.
    ///
    /// The library is a flat folder, so subdirectories are not descended into.
    pub fn scan_directory<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<Track>> {
        let dir = dir.as_ref();
        if !dir.exists() {
            warn!("Library directory {} does not exist", dir.display());
            return Ok(Vec::new());
        }

        let mut tracks = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            // Hidden files include in-flight downloads (".name.part")
            let hidden = path
                .file_name()
                .and_then(|n| n.to_str())
                .map_or(true, |n| n.starts_with('.'));
            if hidden || !self.is_supported_file(path) {
                continue;
            }

            tracks.push(Track::new(path.to_path_buf()));
        }

        debug!("Scanned {}: {} tracks", dir.display(), tracks.len());
        Ok(tracks)
    }

    fn is_supported_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let normalized = ext.to_ascii_lowercase();
                self.supported_extensions.contains(&normalized)
            })
            .unwrap_or(false)
    }
}

impl Default for MusicScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// The library directory together with the scanner that lists it.
#[derive(Debug, Clone)]
pub struct MusicLibrary {
    dir: PathBuf,
    scanner: MusicScanner,
}

impl MusicLibrary {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            scanner: MusicScanner::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn scan(&self) -> Result<Vec<Track>> {
        self.scanner.scan_directory(&self.dir)
    }

    pub fn track(&self, file_name: &str) -> Track {
        Track::in_library(&self.dir, file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"not really audio").unwrap();
    }

    #[test]
    fn lists_audio_files_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["c.mp3", "a.mp3", "notes.txt", "b.FLAC", ".hidden.mp3", ".x.mp3.part"] {
            touch(dir.path(), name);
        }
        fs::create_dir(dir.path().join("nested")).unwrap();
        touch(&dir.path().join("nested"), "deep.mp3");

        let names: Vec<String> = MusicScanner::new()
            .scan_directory(dir.path())
            .unwrap()
            .into_iter()
            .map(|t| t.file_name)
            .collect();

        assert_eq!(names, vec!["a.mp3", "b.FLAC", "c.mp3"]);
    }

    #[test]
    fn empty_directory_yields_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let library = MusicLibrary::new(dir.path().to_path_buf());
        assert!(library.scan().unwrap().is_empty());
    }

    #[test]
    fn missing_directory_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let library = MusicLibrary::new(dir.path().join("gone"));
        assert!(library.scan().unwrap().is_empty());
    }
}
