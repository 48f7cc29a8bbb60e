//! Background fetch of remote audio into the library directory.
//!
//! Runs on a dedicated OS thread with the blocking `reqwest` client and talks
//! to the UI only through the [`DownloadStatusCell`].

use super::{DownloadState, DownloadStatusCell};
use anyhow::{anyhow, Context, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use tracing::{error, info};

/// Start downloading `url` into `library_dir`.
pub fn spawn_fetch(
    url: String,
    library_dir: PathBuf,
    status: DownloadStatusCell,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("tunedeck-fetch".to_string())
        .spawn(move || {
            let Some(title) = title_from_url(&url) else {
                error!("Cannot derive a file name from {}", url);
                return;
            };

            status.publish(title.clone(), DownloadState::Downloading);
            info!("Fetching {} as '{}'", url, title);

            match fetch_into(&url, &library_dir, &title) {
                Ok(path) => {
                    info!("Download complete: {}", path.display());
                    status.publish(title, DownloadState::Complete);
                }
                Err(e) => {
                    error!("Download of {} failed: {:#}", url, e);
                    status.publish(title, DownloadState::Failed);
                }
            }
        })
}

/// The last non-empty path segment of `url`, percent-decoded, used as the
/// saved file name.
pub fn title_from_url(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let raw = parsed
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()?;
    let segment = urlencoding::decode(raw).ok()?;

    let title: String = segment
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    if title.starts_with('.') {
        None
    } else {
        Some(title)
    }
}

fn fetch_into(url: &str, library_dir: &Path, title: &str) -> Result<PathBuf> {
    fs::create_dir_all(library_dir)
        .with_context(|| format!("creating {}", library_dir.display()))?;

    let destination = library_dir.join(title);
    if destination.exists() {
        return Err(anyhow!("{} already exists", destination.display()));
    }

    // Hidden while incomplete so a library rescan never lists half a file
    let partial = library_dir.join(format!(".{}.part", title));
    let mut response = reqwest::blocking::get(url)?.error_for_status()?;
    let mut file =
        File::create(&partial).with_context(|| format!("creating {}", partial.display()))?;

    if let Err(e) = response.copy_to(&mut file) {
        let _ = fs::remove_file(&partial);
        return Err(e.into());
    }
    drop(file);

    fs::rename(&partial, &destination)
        .with_context(|| format!("moving download into {}", destination.display()))?;
    Ok(destination)
}
