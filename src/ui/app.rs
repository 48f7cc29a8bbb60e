use super::events::{map_key, Key};
use super::screens::{Flow, HomeScreen, ScreenContext, ScreenStack, View};
use super::widgets::StatusLine;
use super::TerminalManager;
use crate::audio::{
    AudioBackend, AudioConfig, MusicLibrary, PlaybackEngine, PlaybackState, PlayerEvent,
    PlaylistStore, Track,
};
use crate::config::Config;
use crate::devices::DeviceController;
use crate::download::DownloadStatusCell;
use anyhow::Result;
use crossterm::event::{self, Event};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::{sync::mpsc, time::sleep};
use tracing::{debug, info};

const INPUT_POLL: Duration = Duration::from_millis(50);
const FRAME_PAUSE: Duration = Duration::from_millis(16);

/// Shared services every screen works against.
struct Services {
    player: PlaybackEngine,
    library: MusicLibrary,
    playlists: PlaylistStore,
    downloads: DownloadStatusCell,
    devices: Box<dyn DeviceController>,
    status: StatusLine,
    download_notice: Duration,
}

impl Services {
    fn ctx(&mut self, now: Instant) -> ScreenContext<'_> {
        ScreenContext {
            player: &mut self.player,
            library: &self.library,
            playlists: &self.playlists,
            downloads: &self.downloads,
            devices: self.devices.as_ref(),
            status: &mut self.status,
            download_notice: self.download_notice,
            now,
        }
    }
}

pub struct App {
    terminal: TerminalManager,
    services: Services,
    player_events: mpsc::UnboundedReceiver<PlayerEvent>,
    stack: ScreenStack,
    tick: Duration,
    last_tick: Instant,
}

impl App {
    pub fn new(
        config: &Config,
        backend: Arc<dyn AudioBackend>,
        downloads: DownloadStatusCell,
        devices: Box<dyn DeviceController>,
    ) -> Result<Self> {
        let (events_tx, player_events) = mpsc::unbounded_channel();
        let player = PlaybackEngine::new(backend, &AudioConfig::from(config), events_tx);
        let library = MusicLibrary::new(config.library_dir.clone());
        let playlists = PlaylistStore::new(config.playlist_dir.clone())?;
        info!(
            "Library at {}, playlists at {}",
            library.dir().display(),
            playlists.dir().display()
        );

        let mut services = Services {
            player,
            library,
            playlists,
            downloads,
            devices,
            status: StatusLine::new(config.ui.status_lifetime()),
            download_notice: config.ui.download_notice(),
        };
        let stack = ScreenStack::new(Box::new(HomeScreen::new()), &mut services.ctx(Instant::now()));

        // Last, so earlier failures leave the terminal alone
        let terminal = TerminalManager::new()?;

        Ok(Self {
            terminal,
            services,
            player_events,
            stack,
            tick: config.ui.tick(),
            last_tick: Instant::now(),
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        loop {
            if event::poll(INPUT_POLL)? {
                if let Event::Key(key) = event::read()? {
                    if let Some(key) = map_key(key) {
                        if self.handle_key(key) == Flow::Quit {
                            break;
                        }
                    }
                }
            }

            self.drain_player_events();

            let now = Instant::now();
            if now.saturating_duration_since(self.last_tick) >= self.tick {
                self.stack.tick(&mut self.services.ctx(now));
                self.last_tick = now;
            }

            self.render()?;

            // Gives the end monitors their turn on the runtime
            sleep(FRAME_PAUSE).await;
        }

        info!("Shutting down");
        self.services.player.stop();
        Ok(())
    }

    fn handle_key(&mut self, key: Key) -> Flow {
        if key == Key::Quit {
            debug!("Quit key");
            return Flow::Quit;
        }
        self.stack.handle_key(key, &mut self.services.ctx(Instant::now()))
    }

    fn drain_player_events(&mut self) {
        while let Ok(event) = self.player_events.try_recv() {
            let mut ctx = self.services.ctx(Instant::now());
            if !self.stack.handle_player_event(event, &mut ctx) {
                debug!("Player event left playback as it was");
            }
        }
    }

    fn render(&mut self) -> Result<()> {
        let now = Instant::now();
        let breadcrumb = self.stack.titles().join(" › ");
        let current = self.services.player.current_track();
        let footer = now_playing_line(self.services.player.state(), current.as_ref());
        let status = self.services.status.current(now).unwrap_or("Ready").to_string();
        let view = View {
            now_playing: current.as_ref().map(|track| track.file_path.as_path()),
        };
        let stack = &mut self.stack;

        self.terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3), // Header
                    Constraint::Min(6),    // Active screen
                    Constraint::Length(3), // Now playing
                    Constraint::Length(3), // Status bar
                ])
                .split(f.area());

            render_header(f, chunks[0], &breadcrumb);
            stack.render(f, chunks[1], &view);
            render_bar(f, chunks[2], "Now Playing", &footer, Color::White);
            render_bar(f, chunks[3], "Status", &status, Color::Green);
        })
    }
}

fn now_playing_line(state: PlaybackState, track: Option<&Track>) -> String {
    match (state, track) {
        (PlaybackState::Playing, Some(track)) => format!("▶ {}", track.display_title()),
        (PlaybackState::Paused, Some(track)) => format!("⏸ {}", track.display_title()),
        (PlaybackState::Stopped, Some(track)) => format!("⏹ {}", track.display_title()),
        (_, None) => "Nothing playing".to_string(),
    }
}

fn render_header(f: &mut Frame, area: Rect, breadcrumb: &str) {
    let header = Paragraph::new(format!("TuneDeck  {breadcrumb}"))
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn render_bar(f: &mut Frame, area: Rect, title: &str, text: &str, color: Color) {
    let bar = Paragraph::new(text.to_string())
        .style(Style::default().fg(color))
        .block(Block::default().borders(Borders::ALL).title(title.to_string()));
    f.render_widget(bar, area);
}
