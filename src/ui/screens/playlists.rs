use super::browser::TrackBrowser;
use super::{sidebar_key, Screen, ScreenContext, Transition, View};
use crate::ui::events::Key;
use crate::ui::widgets::{render_list, Focus, SelectList, SidebarItem};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    widgets::ListItem,
    Frame,
};
use tracing::warn;

/// Names of the playlists in the store.
pub struct PlaylistListScreen {
    sidebar: SelectList<SidebarItem>,
    playlists: SelectList<String>,
    focus: Focus,
}

impl PlaylistListScreen {
    pub fn new() -> Self {
        Self {
            sidebar: SelectList::with_selected(SidebarItem::ALL.to_vec(), 2),
            playlists: SelectList::new(Vec::new()),
            focus: Focus::Primary,
        }
    }

    pub fn names(&self) -> &[String] {
        self.playlists.items()
    }

    fn reload(&mut self, ctx: &mut ScreenContext<'_>) {
        match ctx.playlists.names() {
            Ok(names) => self.playlists.replace(names),
            Err(e) => {
                warn!("Listing playlists failed: {}", e);
                ctx.notify(format!("Cannot list playlists: {e}"));
                self.playlists.replace(Vec::new());
            }
        }
    }
}

impl Default for PlaylistListScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen for PlaylistListScreen {
    fn title(&self) -> String {
        "Playlists".to_string()
    }

    fn focus(&self) -> Focus {
        self.focus
    }

    fn on_mount(&mut self, ctx: &mut ScreenContext<'_>) {
        self.reload(ctx);
    }

    fn on_key(&mut self, key: Key, ctx: &mut ScreenContext<'_>) -> Transition {
        match (self.focus, key) {
            (_, Key::Back) => return Transition::Pop,
            (_, Key::Refresh) => self.reload(ctx),
            (Focus::Sidebar, Key::Right) => self.focus = Focus::Primary,
            (Focus::Sidebar, key) => {
                if let Some(transition) = sidebar_key(&mut self.sidebar, key) {
                    return transition;
                }
            }
            (_, Key::Up) => self.playlists.move_by(-1),
            (_, Key::Down) => self.playlists.move_by(1),
            (_, Key::Left) => self.focus = Focus::Sidebar,
            (_, Key::Enter) => {
                if let Some(name) = self.playlists.selected_item() {
                    return Transition::Push(Box::new(PlaylistSongsScreen::new(name.clone())));
                }
            }
            _ => {}
        }
        Transition::Stay
    }

    fn render(&mut self, f: &mut Frame, area: Rect, _view: &View<'_>) {
        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(16), Constraint::Min(20)])
            .split(area);

        render_list(
            f,
            panes[0],
            "Menu",
            &mut self.sidebar,
            self.focus == Focus::Sidebar,
            |_, item| ListItem::new(item.label()),
        );
        let title = if self.playlists.is_empty() {
            "Playlists (none yet)".to_string()
        } else {
            format!("Playlists ({})", self.playlists.len())
        };
        render_list(
            f,
            panes[1],
            &title,
            &mut self.playlists,
            self.focus == Focus::Primary,
            |_, name| ListItem::new(name.clone()),
        );
    }
}

/// Tracks of one playlist, with the same controls as Home.
pub struct PlaylistSongsScreen {
    name: String,
    browser: TrackBrowser,
}

impl PlaylistSongsScreen {
    pub fn new(name: String) -> Self {
        let browser = TrackBrowser::new(name.clone());
        Self { name, browser }
    }

    pub fn browser(&self) -> &TrackBrowser {
        &self.browser
    }
}

impl Screen for PlaylistSongsScreen {
    fn title(&self) -> String {
        self.name.clone()
    }

    fn focus(&self) -> Focus {
        self.browser.focus()
    }

    fn on_mount(&mut self, ctx: &mut ScreenContext<'_>) {
        match ctx.playlists.load(&self.name) {
            Ok(playlist) => {
                let tracks = playlist
                    .entries
                    .iter()
                    .map(|entry| ctx.library.track(entry))
                    .collect();
                self.browser.set_tracks(tracks);
            }
            Err(e) => {
                warn!("Loading playlist '{}' failed: {}", self.name, e);
                ctx.notify(format!("Cannot open {}: {e}", self.name));
            }
        }
    }

    fn on_key(&mut self, key: Key, ctx: &mut ScreenContext<'_>) -> Transition {
        match key {
            Key::Back => Transition::Pop,
            Key::Refresh => Transition::Stay,
            key => self.browser.handle_key(key, ctx),
        }
    }

    fn on_track_end(&mut self, ctx: &mut ScreenContext<'_>) -> bool {
        self.browser.advance_on_end(ctx);
        true
    }

    fn render(&mut self, f: &mut Frame, area: Rect, view: &View<'_>) {
        self.browser.render(f, area, view);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::screens::testing::Harness;
    use crate::ui::screens::{open, HomeScreen, ScreenStack};

    #[tokio::test]
    async fn opens_a_playlist_and_plays_through_it() {
        let mut h = Harness::with_tracks(&["a.mp3", "b.mp3", "c.mp3"]);
        h.playlists.create("road").unwrap();
        h.playlists.append("road", "c.mp3").unwrap();
        h.playlists.append("road", "a.mp3").unwrap();

        let mut stack = ScreenStack::new(Box::new(HomeScreen::new()), &mut h.ctx());
        stack.apply(open(SidebarItem::Playlists), &mut h.ctx());
        stack.handle_key(Key::Enter, &mut h.ctx());
        assert_eq!(stack.titles(), vec!["Home", "Playlists", "road"]);

        // Enter reveals the actions, Enter again plays the first entry
        stack.handle_key(Key::Enter, &mut h.ctx());
        stack.handle_key(Key::Enter, &mut h.ctx());
        assert_eq!(h.backend.loaded(), Some(h.path("c.mp3")));

        // The playlist, not the Home underneath, continues playback
        assert!(stack.dispatch_track_end(&mut h.ctx()));
        assert_eq!(h.backend.loaded(), Some(h.path("a.mp3")));
        assert!(stack.dispatch_track_end(&mut h.ctx()));
        assert_eq!(h.backend.loaded(), Some(h.path("c.mp3")));
    }

    #[tokio::test]
    async fn refresh_does_not_rescan_playlist_songs() {
        let mut h = Harness::with_tracks(&["a.mp3"]);
        h.playlists.create("one").unwrap();
        h.playlists.append("one", "a.mp3").unwrap();

        let mut songs = PlaylistSongsScreen::new("one".into());
        songs.on_mount(&mut h.ctx());
        h.playlists.append("one", "b.mp3").unwrap();
        songs.on_key(Key::Refresh, &mut h.ctx());
        assert_eq!(songs.browser().entries().len(), 1);
    }

    #[test]
    fn lists_store_names_and_reloads() {
        let mut h = Harness::with_tracks(&[]);
        let mut list = PlaylistListScreen::new();
        list.on_mount(&mut h.ctx());
        assert!(list.names().is_empty());
        assert!(matches!(list.on_key(Key::Enter, &mut h.ctx()), Transition::Stay));

        h.playlists.create("zeta").unwrap();
        h.playlists.create("alpha").unwrap();
        list.on_key(Key::Refresh, &mut h.ctx());
        assert_eq!(list.names(), ["alpha", "zeta"]);
    }
}
