use super::{sidebar_key, ScreenContext, Transition, View};
use crate::audio::{PlaybackState, Track};
use crate::ui::events::Key;
use crate::ui::widgets::{render_list, sidebar, Focus, SelectList, SidebarItem};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::ListItem,
    Frame,
};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    Play,
    Pause,
    Next,
    Prev,
}

impl PlayerAction {
    pub const ALL: [PlayerAction; 4] = [
        PlayerAction::Play,
        PlayerAction::Pause,
        PlayerAction::Next,
        PlayerAction::Prev,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PlayerAction::Play => "Play",
            PlayerAction::Pause => "Pause",
            PlayerAction::Next => "Next",
            PlayerAction::Prev => "Prev",
        }
    }
}

/// A row in the track list. Download placeholders carry a badge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackEntry {
    pub track: Track,
    pub badge: Option<String>,
}

impl TrackEntry {
    pub fn plain(track: Track) -> Self {
        Self { track, badge: None }
    }

    pub fn label(&self) -> String {
        match &self.badge {
            Some(badge) => format!("{} - {}", self.track.display_title(), badge),
            None => self.track.display_title().to_string(),
        }
    }
}

/// Sidebar, track list and player actions: the three panes shared by Home
/// and the playlist song list.
///
/// Focus moves one pane at a time. Enter on a track reveals the actions;
/// Enter on an action runs it against the playback engine.
pub struct TrackBrowser {
    pub(crate) sidebar: SelectList<SidebarItem>,
    pub(crate) tracks: SelectList<TrackEntry>,
    pub(crate) actions: SelectList<PlayerAction>,
    pub(crate) actions_visible: bool,
    pub(crate) focus: Focus,
    list_title: String,
}

impl TrackBrowser {
    pub fn new(list_title: impl Into<String>) -> Self {
        Self {
            sidebar: sidebar(),
            tracks: SelectList::new(Vec::new()),
            actions: SelectList::new(PlayerAction::ALL.to_vec()),
            actions_visible: false,
            focus: Focus::Primary,
            list_title: list_title.into(),
        }
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn entries(&self) -> &[TrackEntry] {
        self.tracks.items()
    }

    pub fn selected(&self) -> Option<usize> {
        self.tracks.selected()
    }

    /// Replace the list; the selection returns to the first track.
    pub fn set_tracks(&mut self, tracks: Vec<Track>) {
        self.tracks
            .replace(tracks.into_iter().map(TrackEntry::plain).collect());
        if self.tracks.is_empty() {
            self.actions_visible = false;
            if self.focus == Focus::Secondary {
                self.focus = Focus::Primary;
            }
        }
    }

    pub fn handle_key(&mut self, key: Key, ctx: &mut ScreenContext<'_>) -> Transition {
        match self.focus {
            Focus::Sidebar => {
                if let Some(transition) = sidebar_key(&mut self.sidebar, key) {
                    return transition;
                }
                if key == Key::Right && !self.tracks.is_empty() {
                    self.focus = Focus::Primary;
                }
            }
            Focus::Primary => match key {
                Key::Up => self.tracks.move_by(-1),
                Key::Down => self.tracks.move_by(1),
                Key::Left => self.focus = Focus::Sidebar,
                Key::Enter if self.tracks.selected().is_some() => {
                    self.actions_visible = true;
                    self.focus = Focus::Secondary;
                }
                Key::Right if self.actions_visible => self.focus = Focus::Secondary,
                _ => {}
            },
            Focus::Secondary => match key {
                Key::Up => self.actions.move_by(-1),
                Key::Down => self.actions.move_by(1),
                Key::Left => self.focus = Focus::Primary,
                Key::Enter => {
                    if let Some(action) = self.actions.selected_item().copied() {
                        self.run(action, ctx);
                    }
                }
                _ => {}
            },
        }
        Transition::Stay
    }

    pub fn run(&mut self, action: PlayerAction, ctx: &mut ScreenContext<'_>) {
        match action {
            PlayerAction::Play => {
                let Some(index) = self.tracks.selected() else {
                    return;
                };
                let selected = &self.tracks.items()[index].track;
                let resumable = ctx.player.state() == PlaybackState::Paused
                    && ctx.player.current_track().as_ref() == Some(selected);
                if resumable {
                    self.resume(ctx);
                } else {
                    self.play_index(index, ctx);
                }
            }
            PlayerAction::Pause => {
                ctx.player.pause();
                if ctx.player.state() == PlaybackState::Paused {
                    ctx.notify("Paused");
                }
            }
            PlayerAction::Next => self.step_and_play(1, ctx),
            PlayerAction::Prev => self.step_and_play(-1, ctx),
        }
    }

    /// Natural end of the current track: move on, wrapping at the end.
    pub fn advance_on_end(&mut self, ctx: &mut ScreenContext<'_>) {
        self.step_and_play(1, ctx);
    }

    /// The cursor only stays on the new track if it actually loaded.
    fn step_and_play(&mut self, delta: isize, ctx: &mut ScreenContext<'_>) {
        let previous = self.tracks.selected();
        if let Some(index) = self.tracks.step(delta) {
            if !self.play_index(index, ctx) {
                if let Some(previous) = previous {
                    self.tracks.select(previous);
                }
            }
        }
    }

    fn resume(&mut self, ctx: &mut ScreenContext<'_>) {
        match ctx.player.play() {
            Ok(()) => ctx.notify("Resumed"),
            Err(e) => {
                warn!("Resume failed: {}", e);
                ctx.notify(format!("Cannot resume: {e}"));
            }
        }
    }

    fn play_index(&mut self, index: usize, ctx: &mut ScreenContext<'_>) -> bool {
        let Some(entry) = self.tracks.items().get(index) else {
            return false;
        };
        let track = entry.track.clone();

        match ctx.player.load(&track).and_then(|()| ctx.player.play()) {
            Ok(()) => {
                ctx.notify(format!("Playing {}", track.display_title()));
                true
            }
            Err(e) => {
                warn!("Cannot play {}: {}", track.display_title(), e);
                ctx.notify(format!("Cannot play {}: {e}", track.display_title()));
                false
            }
        }
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, view: &View<'_>) {
        let mut constraints = vec![Constraint::Length(16), Constraint::Min(20)];
        if self.actions_visible {
            constraints.push(Constraint::Length(14));
        }
        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(area);

        render_list(
            f,
            panes[0],
            "Menu",
            &mut self.sidebar,
            self.focus == Focus::Sidebar,
            |_, item| ListItem::new(item.label()),
        );

        let title = if self.tracks.is_empty() {
            format!("{} (empty, r to rescan)", self.list_title)
        } else {
            format!("{} ({})", self.list_title, self.tracks.len())
        };
        let now_playing = view.now_playing;
        render_list(
            f,
            panes[1],
            &title,
            &mut self.tracks,
            self.focus == Focus::Primary,
            |_, entry| {
                let current = now_playing == Some(entry.track.file_path.as_path());
                let style = if entry.badge.is_some() {
                    Style::default().fg(Color::Yellow)
                } else if current {
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                let prefix = if current { "♪ " } else { "  " };
                ListItem::new(Line::from(vec![
                    Span::raw(prefix),
                    Span::styled(entry.label(), style),
                ]))
            },
        );

        if self.actions_visible {
            render_list(
                f,
                panes[2],
                "Player",
                &mut self.actions,
                self.focus == Focus::Secondary,
                |_, action| ListItem::new(action.label()),
            );
        }
    }
}
