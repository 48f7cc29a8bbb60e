use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};
use std::time::{Duration, Instant};

/// A list with a selection cursor.
///
/// Up/Down movement clamps at the ends; `step` wraps around and is what
/// Next/Prev and auto-advance use. An empty list has no selection.
#[derive(Debug, Clone)]
pub struct SelectList<T> {
    items: Vec<T>,
    state: ListState,
}

impl<T> SelectList<T> {
    pub fn new(items: Vec<T>) -> Self {
        let mut list = Self {
            items: Vec::new(),
            state: ListState::default(),
        };
        list.replace(items);
        list
    }

    /// Start with `index` selected (clamped).
    pub fn with_selected(items: Vec<T>, index: usize) -> Self {
        let mut list = Self::new(items);
        list.select(index);
        list
    }

    /// Swap in new contents; selection goes back to the top.
    pub fn replace(&mut self, items: Vec<T>) {
        self.items = items;
        self.state = ListState::default();
        if !self.items.is_empty() {
            self.state.select(Some(0));
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn selected(&self) -> Option<usize> {
        self.state.selected().filter(|i| *i < self.items.len())
    }

    pub fn selected_item(&self) -> Option<&T> {
        self.selected().and_then(|i| self.items.get(i))
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    pub fn position(&self, pred: impl FnMut(&T) -> bool) -> Option<usize> {
        self.items.iter().position(pred)
    }

    pub fn select(&mut self, index: usize) {
        if self.items.is_empty() {
            self.state.select(None);
        } else {
            self.state.select(Some(index.min(self.items.len() - 1)));
        }
    }

    pub fn move_by(&mut self, delta: isize) {
        if self.items.is_empty() {
            return;
        }
        let current = self.selected().unwrap_or(0);
        let target = current.saturating_add_signed(delta).min(self.items.len() - 1);
        self.state.select(Some(target));
    }

    /// Move the selection by `delta` modulo the list length and return the
    /// new index. `None` on an empty list.
    pub fn step(&mut self, delta: isize) -> Option<usize> {
        if self.items.is_empty() {
            return None;
        }
        let len = self.items.len() as isize;
        let current = self.selected().unwrap_or(0) as isize;
        let target = (current + delta).rem_euclid(len) as usize;
        self.state.select(Some(target));
        Some(target)
    }

    /// Add to the end without moving the selection, unless the list was
    /// empty and now needs one.
    pub fn push(&mut self, item: T) {
        self.items.push(item);
        if self.state.selected().is_none() {
            self.state.select(Some(0));
        }
    }

    /// Remove `index`, keeping the cursor on the same item where possible.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index >= self.items.len() {
            return None;
        }
        let removed = self.items.remove(index);
        match self.selected_raw() {
            _ if self.items.is_empty() => self.state.select(None),
            Some(selected) if selected > index => self.state.select(Some(selected - 1)),
            Some(selected) => self.select(selected),
            None => {}
        }
        Some(removed)
    }

    fn selected_raw(&self) -> Option<usize> {
        self.state.selected()
    }

    pub fn state_mut(&mut self) -> &mut ListState {
        &mut self.state
    }
}

/// Which pane of a screen receives keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarItem {
    Home,
    Settings,
    Playlists,
    Exit,
}

impl SidebarItem {
    pub const ALL: [SidebarItem; 4] = [
        SidebarItem::Home,
        SidebarItem::Settings,
        SidebarItem::Playlists,
        SidebarItem::Exit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SidebarItem::Home => "Home",
            SidebarItem::Settings => "Settings",
            SidebarItem::Playlists => "Playlists",
            SidebarItem::Exit => "Exit",
        }
    }
}

pub fn sidebar() -> SelectList<SidebarItem> {
    SelectList::new(SidebarItem::ALL.to_vec())
}

/// Transient message for the status bar.
#[derive(Debug, Clone)]
pub struct StatusLine {
    message: Option<(String, Instant)>,
    lifetime: Duration,
}

impl StatusLine {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            message: None,
            lifetime,
        }
    }

    pub fn set(&mut self, message: impl Into<String>, now: Instant) {
        self.message = Some((message.into(), now));
    }

    pub fn current(&self, now: Instant) -> Option<&str> {
        self.message
            .as_ref()
            .filter(|(_, at)| now.saturating_duration_since(*at) < self.lifetime)
            .map(|(message, _)| message.as_str())
    }
}

pub fn pane_block(title: &str, focused: bool) -> Block<'_> {
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(title)
}

/// Render a labelled list, highlighting the cursor only when focused.
pub fn render_list<T>(
    f: &mut Frame,
    area: Rect,
    title: &str,
    list: &mut SelectList<T>,
    focused: bool,
    label: impl Fn(usize, &T) -> ListItem<'static>,
) {
    let items: Vec<ListItem> = list
        .items()
        .iter()
        .enumerate()
        .map(|(i, item)| label(i, item))
        .collect();

    let highlight = if focused {
        Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };

    let widget = List::new(items)
        .block(pane_block(title, focused))
        .highlight_style(highlight)
        .highlight_symbol("▶ ");

    f.render_stateful_widget(widget, area, list.state_mut());
}
