use super::ScreenContext;
use crate::audio::testing::FakeBackend;
use crate::audio::{AudioConfig, MusicLibrary, PlaybackEngine, PlayerEvent, PlaylistStore};
use crate::devices::testing::FakeDevices;
use crate::download::DownloadStatusCell;
use crate::ui::widgets::StatusLine;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Everything a screen needs, backed by a temp directory and fakes.
pub(crate) struct Harness {
    _dir: tempfile::TempDir,
    pub(crate) backend: Arc<FakeBackend>,
    pub(crate) player: PlaybackEngine,
    pub(crate) events: mpsc::UnboundedReceiver<PlayerEvent>,
    pub(crate) library: MusicLibrary,
    pub(crate) playlists: PlaylistStore,
    pub(crate) downloads: DownloadStatusCell,
    pub(crate) devices: FakeDevices,
    pub(crate) status: StatusLine,
    pub(crate) now: Instant,
}

pub(crate) const NOTICE: Duration = Duration::from_secs(3);

impl Harness {
    pub(crate) fn with_tracks(names: &[&str]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let music = dir.path().join("music");
        fs::create_dir_all(&music).unwrap();
        for name in names {
            fs::write(music.join(name), b"fake audio").unwrap();
        }

        let backend = Arc::new(FakeBackend::default());
        let (tx, events) = mpsc::unbounded_channel();
        let player = PlaybackEngine::new(backend.clone(), &AudioConfig::default(), tx);
        let playlists = PlaylistStore::new(dir.path().join("playlists")).unwrap();

        Self {
            backend,
            player,
            events,
            library: MusicLibrary::new(music),
            playlists,
            downloads: DownloadStatusCell::new(),
            devices: FakeDevices::default(),
            status: StatusLine::new(Duration::from_secs(3)),
            now: Instant::now(),
            _dir: dir,
        }
    }

    pub(crate) fn ctx(&mut self) -> ScreenContext<'_> {
        ScreenContext {
            player: &mut self.player,
            library: &self.library,
            playlists: &self.playlists,
            downloads: &self.downloads,
            devices: &self.devices,
            status: &mut self.status,
            download_notice: NOTICE,
            now: self.now,
        }
    }

    pub(crate) fn path(&self, name: &str) -> PathBuf {
        self.library.dir().join(name)
    }

    pub(crate) fn add_file(&self, name: &str) {
        fs::write(self.path(name), b"fake audio").unwrap();
    }

    pub(crate) fn advance(&mut self, by: Duration) {
        self.now += by;
    }

    pub(crate) fn status(&self) -> Option<&str> {
        self.status.current(self.now)
    }
}
