use super::{sidebar_key, Screen, ScreenContext, Transition, View};
use crate::devices::DeviceFlow;
use crate::ui::events::Key;
use crate::ui::widgets::{pane_block, render_list, sidebar, Focus, SelectList, SidebarItem};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{ListItem, Paragraph},
    Frame,
};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsOption {
    Bluetooth,
    AudioOutput,
}

impl SettingsOption {
    pub const ALL: [SettingsOption; 2] = [SettingsOption::Bluetooth, SettingsOption::AudioOutput];

    pub fn label(&self) -> &'static str {
        match self {
            SettingsOption::Bluetooth => "Bluetooth",
            SettingsOption::AudioOutput => "Audio Output",
        }
    }
}

pub struct SettingsScreen {
    sidebar: SelectList<SidebarItem>,
    options: SelectList<SettingsOption>,
    flow: Option<DeviceFlow>,
    focus: Focus,
}

impl SettingsScreen {
    pub fn new() -> Self {
        Self {
            sidebar: SelectList::with_selected(sidebar().items().to_vec(), 1),
            options: SelectList::new(SettingsOption::ALL.to_vec()),
            flow: None,
            focus: Focus::Primary,
        }
    }

    pub fn flow(&self) -> Option<&DeviceFlow> {
        self.flow.as_ref()
    }

    fn start_flow(&mut self, ctx: &mut ScreenContext<'_>) {
        let Some(option) = self.options.selected_item().copied() else {
            return;
        };
        let started = match option {
            SettingsOption::Bluetooth => DeviceFlow::bluetooth(ctx.devices),
            SettingsOption::AudioOutput => DeviceFlow::output(ctx.devices),
        };
        match started {
            Ok(flow) => {
                self.flow = Some(flow);
                self.focus = Focus::Secondary;
            }
            Err(e) => {
                warn!("{} unavailable: {:#}", option.label(), e);
                ctx.notify(format!("{} unavailable: {e}", option.label()));
            }
        }
    }

    fn feed_flow(&mut self, key: Key, ctx: &mut ScreenContext<'_>) {
        let Some(flow) = self.flow.take() else {
            self.focus = Focus::Primary;
            return;
        };
        let step = flow.handle(key, ctx.devices);
        if let Some(message) = step.message {
            ctx.notify(message);
        }
        match step.next {
            Some(next) => self.flow = Some(next),
            None => self.focus = Focus::Primary,
        }
    }
}

impl Default for SettingsScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen for SettingsScreen {
    fn title(&self) -> String {
        "Settings".to_string()
    }

    fn focus(&self) -> Focus {
        self.focus
    }

    fn on_key(&mut self, key: Key, ctx: &mut ScreenContext<'_>) -> Transition {
        // The device flow owns Esc while it has focus
        if self.focus == Focus::Secondary {
            self.feed_flow(key, ctx);
            return Transition::Stay;
        }
        if key == Key::Back {
            return Transition::Pop;
        }

        match self.focus {
            Focus::Sidebar => {
                if let Some(transition) = sidebar_key(&mut self.sidebar, key) {
                    return transition;
                }
                if key == Key::Right {
                    self.focus = Focus::Primary;
                }
            }
            Focus::Primary => match key {
                Key::Up => self.options.move_by(-1),
                Key::Down => self.options.move_by(1),
                Key::Left => self.focus = Focus::Sidebar,
                Key::Enter => self.start_flow(ctx),
                Key::Right if self.flow.is_some() => self.focus = Focus::Secondary,
                _ => {}
            },
            Focus::Secondary => {}
        }
        Transition::Stay
    }

    fn render(&mut self, f: &mut Frame, area: Rect, _view: &View<'_>) {
        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(16),
                Constraint::Length(20),
                Constraint::Min(24),
            ])
            .split(area);

        render_list(
            f,
            panes[0],
            "Menu",
            &mut self.sidebar,
            self.focus == Focus::Sidebar,
            |_, item| ListItem::new(item.label()),
        );
        render_list(
            f,
            panes[1],
            "Settings",
            &mut self.options,
            self.focus == Focus::Primary,
            |_, option| ListItem::new(option.label()),
        );

        let focused = self.focus == Focus::Secondary;
        let (title, lines) = match &self.flow {
            Some(flow) => {
                let (lines, selected) = flow.lines();
                let lines: Vec<Line> = lines
                    .into_iter()
                    .enumerate()
                    .map(|(i, text)| {
                        if Some(i) == selected {
                            Line::styled(
                                format!("▶ {text}"),
                                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                            )
                        } else {
                            Line::raw(format!("  {text}"))
                        }
                    })
                    .collect();
                (flow.title(), lines)
            }
            None => ("Devices", vec![Line::raw("Press Enter on an option")]),
        };
        f.render_widget(
            Paragraph::new(lines).block(pane_block(title, focused)),
            panes[2],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::screens::testing::Harness;

    #[test]
    fn opens_on_the_options_pane() {
        let screen = SettingsScreen::new();
        assert_eq!(screen.focus(), Focus::Primary);
        assert_eq!(screen.sidebar.selected_item(), Some(&SidebarItem::Settings));
    }

    #[test]
    fn audio_output_walks_to_volume_and_closes() {
        let mut h = Harness::with_tracks(&[]);
        let mut screen = SettingsScreen::new();

        screen.on_key(Key::Down, &mut h.ctx());
        screen.on_key(Key::Enter, &mut h.ctx());
        assert!(matches!(screen.flow(), Some(DeviceFlow::SinkSelect { .. })));
        assert_eq!(screen.focus(), Focus::Secondary);

        for key in [Key::Enter, Key::Char('3'), Key::Char('0'), Key::Enter] {
            screen.on_key(key, &mut h.ctx());
        }
        assert!(screen.flow().is_none());
        assert_eq!(screen.focus(), Focus::Primary);
        assert_eq!(h.status(), Some("Volume 30% on bluez_sink.AA_BB"));
    }

    #[test]
    fn esc_backs_out_of_the_flow_before_leaving() {
        let mut h = Harness::with_tracks(&[]);
        let mut screen = SettingsScreen::new();

        screen.on_key(Key::Enter, &mut h.ctx());
        screen.on_key(Key::Enter, &mut h.ctx());
        assert!(matches!(screen.flow(), Some(DeviceFlow::Pairing { .. })));

        assert!(matches!(screen.on_key(Key::Back, &mut h.ctx()), Transition::Stay));
        assert!(matches!(screen.flow(), Some(DeviceFlow::DeviceList { .. })));
        assert!(matches!(screen.on_key(Key::Back, &mut h.ctx()), Transition::Stay));
        assert_eq!(screen.focus(), Focus::Primary);
        assert!(matches!(screen.on_key(Key::Back, &mut h.ctx()), Transition::Pop));
    }
}
