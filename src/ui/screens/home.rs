use super::browser::{TrackBrowser, TrackEntry};
use super::{Screen, ScreenContext, Transition, View};
use crate::download::{DownloadBridge, DownloadUpdate};
use crate::ui::events::Key;
use crate::ui::widgets::Focus;
use ratatui::{layout::Rect, Frame};
use tracing::{debug, warn};

const DOWNLOADING: &str = "Downloading…";
const COMPLETE: &str = "Download Complete!";
const FAILED: &str = "Download Failed";

/// The library browser. Owns playback continuation and mirrors the
/// background download into its track list.
pub struct HomeScreen {
    browser: TrackBrowser,
    downloads: Option<DownloadBridge>,
}

impl HomeScreen {
    pub fn new() -> Self {
        Self {
            browser: TrackBrowser::new("Library"),
            downloads: None,
        }
    }

    pub fn browser(&self) -> &TrackBrowser {
        &self.browser
    }

    fn rescan(&mut self, ctx: &mut ScreenContext<'_>) -> usize {
        match ctx.library.scan() {
            Ok(tracks) => {
                let count = tracks.len();
                self.browser.set_tracks(tracks);
                count
            }
            Err(e) => {
                warn!("Library scan of {} failed: {:#}", ctx.library.dir().display(), e);
                ctx.notify(format!("Library scan failed: {e}"));
                self.browser.set_tracks(Vec::new());
                0
            }
        }
    }

    /// Apply one download update without moving the selection or focus.
    fn apply_download(&mut self, update: DownloadUpdate, ctx: &mut ScreenContext<'_>) {
        let tracks = &mut self.browser.tracks;
        let index = tracks.position(|entry| entry.track.id() == update.title());
        debug!("Download update {:?} (entry {:?})", update, index);

        let badge = match &update {
            DownloadUpdate::Progress(_) => Some(DOWNLOADING),
            DownloadUpdate::Completed(_) => Some(COMPLETE),
            DownloadUpdate::Failed(_) => Some(FAILED),
            DownloadUpdate::Revert(_) | DownloadUpdate::Remove(_) => None,
        };

        match (update, index) {
            (DownloadUpdate::Remove(_), Some(i)) => {
                // Also reached when the outcome was settled by a Home above
                let real_file = tracks.items()[i].track.file_path.is_file();
                if real_file {
                    // The title clashed with a file already in the library
                    if let Some(entry) = tracks.get_mut(i) {
                        entry.badge = None;
                    }
                } else {
                    tracks.remove(i);
                }
            }
            (DownloadUpdate::Revert(_), Some(i)) => {
                if let Some(entry) = tracks.get_mut(i) {
                    entry.badge = None;
                }
            }
            (DownloadUpdate::Revert(_) | DownloadUpdate::Remove(_), None) => {}
            (update, Some(i)) => {
                if let Some(entry) = tracks.get_mut(i) {
                    entry.badge = badge.map(str::to_string);
                }
                if let DownloadUpdate::Completed(title) = update {
                    ctx.notify(format!("Downloaded {title}"));
                }
            }
            (update, None) => {
                let title = update.title().to_string();
                tracks.push(TrackEntry {
                    track: ctx.library.track(&title),
                    badge: badge.map(str::to_string),
                });
                if let DownloadUpdate::Completed(title) = update {
                    ctx.notify(format!("Downloaded {title}"));
                }
            }
        }
    }
}

impl Default for HomeScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen for HomeScreen {
    fn title(&self) -> String {
        "Home".to_string()
    }

    fn focus(&self) -> Focus {
        self.browser.focus()
    }

    fn on_mount(&mut self, ctx: &mut ScreenContext<'_>) {
        let count = self.rescan(ctx);
        debug!("Home mounted with {} tracks", count);
        self.downloads = Some(DownloadBridge::new(
            ctx.downloads.clone(),
            ctx.download_notice,
        ));
    }

    fn on_key(&mut self, key: Key, ctx: &mut ScreenContext<'_>) -> Transition {
        match key {
            Key::Back => Transition::Pop,
            Key::Refresh => {
                let count = self.rescan(ctx);
                ctx.notify(format!("Library rescanned: {count} tracks"));
                Transition::Stay
            }
            key => self.browser.handle_key(key, ctx),
        }
    }

    fn on_track_end(&mut self, ctx: &mut ScreenContext<'_>) -> bool {
        self.browser.advance_on_end(ctx);
        true
    }

    fn on_tick(&mut self, ctx: &mut ScreenContext<'_>) {
        let updates = match self.downloads.as_mut() {
            Some(bridge) => bridge.poll(ctx.now),
            None => return,
        };
        for update in updates {
            self.apply_download(update, ctx);
        }
    }

    fn render(&mut self, f: &mut Frame, area: Rect, view: &View<'_>) {
        self.browser.render(f, area, view);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::DownloadState;
    use crate::ui::screens::testing::{Harness, NOTICE};
    use std::time::Duration;

    fn mounted(h: &mut Harness) -> HomeScreen {
        let mut home = HomeScreen::new();
        home.on_mount(&mut h.ctx());
        home
    }

    fn labels(home: &HomeScreen) -> Vec<String> {
        home.browser().entries().iter().map(TrackEntry::label).collect()
    }

    #[tokio::test]
    async fn refresh_picks_up_new_files_and_resets_selection() {
        let mut h = Harness::with_tracks(&["a.mp3", "b.mp3"]);
        let mut home = mounted(&mut h);
        home.on_key(Key::Down, &mut h.ctx());
        assert_eq!(home.browser().selected(), Some(1));

        h.add_file("c.mp3");
        home.on_key(Key::Refresh, &mut h.ctx());
        assert_eq!(labels(&home), vec!["a.mp3", "b.mp3", "c.mp3"]);
        assert_eq!(home.browser().selected(), Some(0));
        assert_eq!(h.status(), Some("Library rescanned: 3 tracks"));
    }

    #[tokio::test]
    async fn rescan_to_empty_pulls_focus_back_from_actions() {
        let mut h = Harness::with_tracks(&["a.mp3"]);
        let mut home = mounted(&mut h);
        home.on_key(Key::Enter, &mut h.ctx());
        assert_eq!(home.focus(), Focus::Secondary);

        std::fs::remove_file(h.path("a.mp3")).unwrap();
        home.on_key(Key::Refresh, &mut h.ctx());
        assert_eq!(home.focus(), Focus::Primary);
        assert_eq!(home.browser().selected(), None);
    }

    #[tokio::test]
    async fn download_cycle_never_duplicates_the_entry() {
        let mut h = Harness::with_tracks(&["a.mp3", "b.mp3"]);
        let mut home = mounted(&mut h);
        home.on_key(Key::Down, &mut h.ctx());

        h.downloads.publish("X.mp3", DownloadState::Downloading);
        home.on_tick(&mut h.ctx());
        home.on_tick(&mut h.ctx());
        assert_eq!(labels(&home), vec!["a.mp3", "b.mp3", "X.mp3 - Downloading…"]);

        h.add_file("X.mp3");
        h.downloads.publish("X.mp3", DownloadState::Complete);
        home.on_tick(&mut h.ctx());
        assert_eq!(labels(&home), vec!["a.mp3", "b.mp3", "X.mp3 - Download Complete!"]);
        assert_eq!(h.status(), Some("Downloaded X.mp3"));

        h.advance(NOTICE);
        home.on_tick(&mut h.ctx());
        assert_eq!(labels(&home), vec!["a.mp3", "b.mp3", "X.mp3"]);
        assert_eq!(h.downloads.snapshot().state, DownloadState::Idle);

        // Selection and focus were never touched
        assert_eq!(home.browser().selected(), Some(1));
        assert_eq!(home.focus(), Focus::Primary);

        h.advance(Duration::from_secs(10));
        home.on_tick(&mut h.ctx());
        assert_eq!(labels(&home).len(), 3);
    }

    #[tokio::test]
    async fn failed_download_placeholder_is_removed() {
        let mut h = Harness::with_tracks(&["a.mp3"]);
        let mut home = mounted(&mut h);

        h.downloads.publish("gone.mp3", DownloadState::Downloading);
        home.on_tick(&mut h.ctx());
        h.downloads.publish("gone.mp3", DownloadState::Failed);
        home.on_tick(&mut h.ctx());
        assert_eq!(labels(&home), vec!["a.mp3", "gone.mp3 - Download Failed"]);

        h.advance(NOTICE);
        home.on_tick(&mut h.ctx());
        assert_eq!(labels(&home), vec!["a.mp3"]);
        assert_eq!(home.browser().selected(), Some(0));
    }

    #[tokio::test]
    async fn failure_on_an_existing_title_keeps_the_real_track() {
        let mut h = Harness::with_tracks(&["a.mp3"]);
        let mut home = mounted(&mut h);

        h.downloads.publish("a.mp3", DownloadState::Failed);
        home.on_tick(&mut h.ctx());
        assert_eq!(labels(&home), vec!["a.mp3 - Download Failed"]);

        h.advance(NOTICE);
        home.on_tick(&mut h.ctx());
        assert_eq!(labels(&home), vec!["a.mp3"]);
    }

    #[tokio::test]
    async fn covered_home_settles_a_download_finished_above_it() {
        let mut h = Harness::with_tracks(&["a.mp3"]);
        let mut root = mounted(&mut h);
        h.downloads.publish("X.mp3", DownloadState::Downloading);
        root.on_tick(&mut h.ctx());
        assert_eq!(labels(&root), vec!["a.mp3", "X.mp3 - Downloading…"]);

        // A second Home on top sees the rest of the cycle
        let mut top = mounted(&mut h);
        h.add_file("X.mp3");
        h.downloads.publish("X.mp3", DownloadState::Complete);
        top.on_tick(&mut h.ctx());
        h.advance(NOTICE);
        top.on_tick(&mut h.ctx());
        assert_eq!(h.downloads.snapshot().state, DownloadState::Idle);

        for _ in 0..10 {
            root.on_tick(&mut h.ctx());
        }
        assert_eq!(labels(&root), vec!["a.mp3", "X.mp3"]);
    }

    #[tokio::test]
    async fn covered_home_drops_a_placeholder_that_failed_above_it() {
        let mut h = Harness::with_tracks(&["a.mp3"]);
        let mut root = mounted(&mut h);
        h.downloads.publish("X.mp3", DownloadState::Downloading);
        root.on_tick(&mut h.ctx());

        let mut top = mounted(&mut h);
        h.downloads.publish("X.mp3", DownloadState::Failed);
        top.on_tick(&mut h.ctx());
        h.advance(NOTICE);
        top.on_tick(&mut h.ctx());

        root.on_tick(&mut h.ctx());
        assert_eq!(labels(&root), vec!["a.mp3"]);
    }

    #[tokio::test]
    async fn owns_track_end_continuation() {
        let mut h = Harness::with_tracks(&["a.mp3", "b.mp3"]);
        let mut home = mounted(&mut h);
        assert!(home.on_track_end(&mut h.ctx()));
        assert_eq!(home.browser().selected(), Some(1));
    }
}
