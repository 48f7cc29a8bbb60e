use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

const PLAYLIST_EXTENSION: &str = "txt";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid playlist name {0:?}")]
    InvalidName(String),
    #[error("playlist {0:?} does not exist")]
    NotFound(String),
    #[error("playlist store I/O on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// A named, ordered list of track file names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    pub name: String,
    pub entries: Vec<String>,
}

impl Playlist {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One flat text file per playlist, one track file name per line.
/// Playlists only ever grow.
#[derive(Debug, Clone)]
pub struct PlaylistStore {
    dir: PathBuf,
}

impl PlaylistStore {
    pub fn new(dir: PathBuf) -> Result<Self, StoreError> {
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(io_err(&dir))?;
            info!("Created playlists directory: {}", dir.display());
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create an empty playlist. Returns `false` if it already existed.
    pub fn create(&self, name: &str) -> Result<bool, StoreError> {
        let path = self.path_for(name)?;
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => {
                info!("Created playlist '{}'", name);
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(io_err(&path)(e)),
        }
    }

    pub fn append(&self, name: &str, track_file: &str) -> Result<(), StoreError> {
        let track_file = track_file.trim();
        if track_file.is_empty() || track_file.contains(['\n', '\r']) {
            return Err(StoreError::InvalidName(track_file.to_string()));
        }

        let path = self.existing_path(name)?;
        let mut file = OpenOptions::new()
            .append(true)
            .open(&path)
            .map_err(io_err(&path))?;
        writeln!(file, "{}", track_file).map_err(io_err(&path))?;
        info!("Added '{}' to playlist '{}'", track_file, name);
        Ok(())
    }

    pub fn load(&self, name: &str) -> Result<Playlist, StoreError> {
        let path = self.existing_path(name)?;
        let content = fs::read_to_string(&path).map_err(io_err(&path))?;
        let entries = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Playlist {
            name: name.to_string(),
            entries,
        })
    }

    /// Playlist names, sorted.
    pub fn names(&self) -> Result<Vec<String>, StoreError> {
        let entries = fs::read_dir(&self.dir).map_err(io_err(&self.dir))?;

        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(PLAYLIST_EXTENSION))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }

    fn existing_path(&self, name: &str) -> Result<PathBuf, StoreError> {
        let path = self.path_for(name)?;
        if path.is_file() {
            Ok(path)
        } else {
            Err(StoreError::NotFound(name.to_string()))
        }
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, StoreError> {
        let trimmed = name.trim();
        let valid = !trimmed.is_empty()
            && !trimmed.starts_with('.')
            && !trimmed.contains(['/', '\\', '\n', '\r']);
        if !valid {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(format!("{}.{}", trimmed, PLAYLIST_EXTENSION)))
    }
}
