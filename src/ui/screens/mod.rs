//! Screens and the navigation stack.
//!
//! Exactly one screen (the top of the stack) receives keys and timer ticks.
//! Track-end continuations are looked up at completion time: the topmost
//! screen that owns one handles it, so a screen never has to install or
//! uninstall anything when it is pushed or popped.

mod browser;
mod exit;
mod home;
mod playlists;
mod settings;

#[cfg(test)]
pub(crate) mod testing;

pub use browser::{PlayerAction, TrackBrowser, TrackEntry};
pub use exit::ExitConfirmScreen;
pub use home::HomeScreen;
pub use playlists::{PlaylistListScreen, PlaylistSongsScreen};
pub use settings::{SettingsOption, SettingsScreen};

use super::events::Key;
use super::widgets::{Focus, SelectList, SidebarItem, StatusLine};
use crate::audio::{MusicLibrary, PlaybackEngine, PlayerEvent, PlaylistStore};
use crate::devices::DeviceController;
use crate::download::DownloadStatusCell;
use ratatui::{layout::Rect, Frame};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Everything a screen may touch while handling an event.
pub struct ScreenContext<'a> {
    pub player: &'a mut PlaybackEngine,
    pub library: &'a MusicLibrary,
    pub playlists: &'a PlaylistStore,
    pub downloads: &'a DownloadStatusCell,
    pub devices: &'a dyn DeviceController,
    pub status: &'a mut StatusLine,
    pub download_notice: Duration,
    pub now: Instant,
}

impl ScreenContext<'_> {
    pub fn notify(&mut self, message: impl Into<String>) {
        self.status.set(message, self.now);
    }
}

/// Read-only facts screens need while drawing.
#[derive(Debug, Clone, Copy, Default)]
pub struct View<'a> {
    pub now_playing: Option<&'a Path>,
}

pub enum Transition {
    Stay,
    Push(Box<dyn Screen>),
    Pop,
    Quit,
}

pub trait Screen {
    fn title(&self) -> String;

    fn focus(&self) -> Focus;

    fn on_mount(&mut self, _ctx: &mut ScreenContext<'_>) {}

    fn on_key(&mut self, key: Key, ctx: &mut ScreenContext<'_>) -> Transition;

    /// Continue after a natural track end. Returns `false` if this screen
    /// has no playback continuation of its own.
    fn on_track_end(&mut self, _ctx: &mut ScreenContext<'_>) -> bool {
        false
    }

    fn on_tick(&mut self, _ctx: &mut ScreenContext<'_>) {}

    fn render(&mut self, f: &mut Frame, area: Rect, view: &View<'_>);
}

/// What a sidebar entry opens.
pub fn open(item: SidebarItem) -> Transition {
    match item {
        SidebarItem::Home => Transition::Push(Box::new(HomeScreen::new())),
        SidebarItem::Settings => Transition::Push(Box::new(SettingsScreen::new())),
        SidebarItem::Playlists => Transition::Push(Box::new(PlaylistListScreen::new())),
        SidebarItem::Exit => Transition::Push(Box::new(ExitConfirmScreen::new())),
    }
}

/// Keys for a focused sidebar. `None` means the key was not a sidebar key.
pub(crate) fn sidebar_key(sidebar: &mut SelectList<SidebarItem>, key: Key) -> Option<Transition> {
    match key {
        Key::Up => sidebar.move_by(-1),
        Key::Down => sidebar.move_by(1),
        Key::Enter => return sidebar.selected_item().copied().map(open),
        _ => return None,
    }
    Some(Transition::Stay)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// LIFO stack of screens. The root can never be popped.
pub struct ScreenStack {
    root: Box<dyn Screen>,
    above: Vec<Box<dyn Screen>>,
}

impl ScreenStack {
    pub fn new(mut root: Box<dyn Screen>, ctx: &mut ScreenContext<'_>) -> Self {
        root.on_mount(ctx);
        Self {
            root,
            above: Vec::new(),
        }
    }

    pub fn depth(&self) -> usize {
        1 + self.above.len()
    }

    pub fn top(&self) -> &dyn Screen {
        self.above.last().unwrap_or(&self.root).as_ref()
    }

    fn top_mut(&mut self) -> &mut dyn Screen {
        self.above.last_mut().unwrap_or(&mut self.root).as_mut()
    }

    pub fn titles(&self) -> Vec<String> {
        std::iter::once(&self.root)
            .chain(self.above.iter())
            .map(|screen| screen.title())
            .collect()
    }

    pub fn handle_key(&mut self, key: Key, ctx: &mut ScreenContext<'_>) -> Flow {
        let transition = self.top_mut().on_key(key, ctx);
        self.apply(transition, ctx)
    }

    pub fn apply(&mut self, transition: Transition, ctx: &mut ScreenContext<'_>) -> Flow {
        match transition {
            Transition::Stay => {}
            Transition::Push(mut screen) => {
                screen.on_mount(ctx);
                debug!("Push {} (depth {})", screen.title(), self.depth() + 1);
                self.above.push(screen);
            }
            Transition::Pop => match self.above.pop() {
                Some(screen) => debug!("Pop {} (depth {})", screen.title(), self.depth()),
                None => debug!("Ignoring pop of the root screen"),
            },
            Transition::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    /// Route an event from the playback engine. A track end only counts if
    /// nothing was loaded or played since it was detected; otherwise the
    /// user's action already decided what plays next.
    pub fn handle_player_event(
        &mut self,
        event: PlayerEvent,
        ctx: &mut ScreenContext<'_>,
    ) -> bool {
        match event {
            PlayerEvent::TrackFinished { generation, track } => {
                if !ctx.player.is_current(generation) {
                    debug!(
                        "Dropping stale end of {} (generation {})",
                        track.display_title(),
                        generation
                    );
                    return false;
                }
                info!("Finished {}", track.display_title());
                self.dispatch_track_end(ctx)
            }
        }
    }

    /// Hand a natural track end to the topmost screen that continues
    /// playback. Returns whether anyone did.
    fn dispatch_track_end(&mut self, ctx: &mut ScreenContext<'_>) -> bool {
        for screen in self.above.iter_mut().rev().chain(std::iter::once(&mut self.root)) {
            if screen.on_track_end(ctx) {
                debug!("Track end handled by {}", screen.title());
                return true;
            }
        }
        false
    }

    pub fn tick(&mut self, ctx: &mut ScreenContext<'_>) {
        self.top_mut().on_tick(ctx);
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, view: &View<'_>) {
        self.top_mut().render(f, area, view);
    }
}
