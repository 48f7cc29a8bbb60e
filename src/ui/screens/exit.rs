use super::{Screen, ScreenContext, Transition, View};
use crate::ui::events::Key;
use crate::ui::widgets::{render_list, Focus, SelectList};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    widgets::ListItem,
    Frame,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Yes,
    No,
}

/// Yes/No before quitting. No is preselected.
pub struct ExitConfirmScreen {
    choices: SelectList<Choice>,
}

impl ExitConfirmScreen {
    pub fn new() -> Self {
        Self {
            choices: SelectList::with_selected(vec![Choice::Yes, Choice::No], 1),
        }
    }
}

impl Default for ExitConfirmScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen for ExitConfirmScreen {
    fn title(&self) -> String {
        "Exit".to_string()
    }

    fn focus(&self) -> Focus {
        Focus::Primary
    }

    fn on_key(&mut self, key: Key, _ctx: &mut ScreenContext<'_>) -> Transition {
        match key {
            Key::Up | Key::Left => self.choices.move_by(-1),
            Key::Down | Key::Right => self.choices.move_by(1),
            Key::Back => return Transition::Pop,
            Key::Enter => {
                return match self.choices.selected_item() {
                    Some(Choice::Yes) => Transition::Quit,
                    _ => Transition::Pop,
                }
            }
            _ => {}
        }
        Transition::Stay
    }

    fn render(&mut self, f: &mut Frame, area: Rect, _view: &View<'_>) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(40),
                Constraint::Length(4),
                Constraint::Min(0),
            ])
            .split(area);
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(35),
                Constraint::Percentage(30),
                Constraint::Min(0),
            ])
            .split(rows[1]);

        render_list(
            f,
            cols[1],
            "Quit TuneDeck?",
            &mut self.choices,
            true,
            |_, choice| {
                ListItem::new(match choice {
                    Choice::Yes => "Yes",
                    Choice::No => "No",
                })
            },
        );
    }
}
