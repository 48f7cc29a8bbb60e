// TuneDeck - terminal music library browser and player
// Parses the command line, sets up logging, then either runs a playlist
// subcommand or hands the terminal to the screen stack

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tunedeck::{
    audio::{MusicLibrary, PlaylistStore},
    config::Config,
    devices::SystemDeviceController,
    download::DownloadStatusCell,
    ui::App,
};

#[derive(Parser)]
#[command(name = "tunedeck", version)]
#[command(about = "Browse a music folder and play it from the terminal")]
struct Args {
    /// Debug-level logging
    #[arg(long)]
    dev: bool,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Music directory, overriding the config file
    #[arg(long, value_name = "DIR")]
    library: Option<PathBuf>,

    /// Download a track into the library in the background (repeatable)
    #[arg(long = "fetch", value_name = "URL")]
    fetch: Vec<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Manage playlists without starting the UI
    Playlist {
        #[command(subcommand)]
        action: PlaylistCommand,
    },
}

#[derive(Subcommand)]
enum PlaylistCommand {
    /// Create an empty playlist (no-op if it exists)
    Create { name: String },
    /// Append a library track to a playlist
    Add { name: String, track: String },
    /// List playlist names
    List,
    /// Print a playlist's tracks
    Show { name: String },
}

fn init_logging(log_dir: &Path, dev: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(log_dir, "tunedeck.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let default_filter = if dev { "debug" } else { "info,tunedeck=debug" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let subscriber = tracing_subscriber::fmt()
        .with_writer(file_writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_env_filter(filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(guard)
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(library) = &args.library {
        config.library_dir = library.clone();
    }
    Ok(config)
}

fn run_playlist_command(config: &Config, action: PlaylistCommand) -> Result<()> {
    let store = PlaylistStore::new(config.playlist_dir.clone())?;

    match action {
        PlaylistCommand::Create { name } => {
            if store.create(&name)? {
                println!("Created playlist '{name}'");
            } else {
                println!("Playlist '{name}' already exists");
            }
        }
        PlaylistCommand::Add { name, track } => {
            let library = MusicLibrary::new(config.library_dir.clone());
            if !library.track(&track).is_playable() {
                bail!(
                    "'{}' is not a playable file in {}",
                    track,
                    library.dir().display()
                );
            }
            store.append(&name, &track)?;
            println!("Added '{track}' to '{name}'");
        }
        PlaylistCommand::List => {
            for name in store.names()? {
                println!("{name}");
            }
        }
        PlaylistCommand::Show { name } => {
            let playlist = store.load(&name)?;
            if playlist.is_empty() {
                println!("(empty)");
            }
            for (i, entry) in playlist.entries.iter().enumerate() {
                println!("{:>3}. {}", i + 1, entry);
            }
        }
    }
    Ok(())
}

#[cfg(feature = "fetch")]
fn start_fetches(urls: &[String], config: &Config, downloads: &DownloadStatusCell) -> Result<()> {
    // One worker at a time: the status record describes a single download
    if urls.is_empty() {
        return Ok(());
    }
    let urls = urls.to_vec();
    let library_dir = config.library_dir.clone();
    let status = downloads.clone();
    std::thread::Builder::new()
        .name("tunedeck-fetch-queue".to_string())
        .spawn(move || {
            for url in urls {
                match tunedeck::download::fetch::spawn_fetch(url, library_dir.clone(), status.clone())
                {
                    Ok(handle) => {
                        if handle.join().is_err() {
                            tracing::error!("Fetch worker panicked");
                        }
                    }
                    Err(e) => tracing::error!("Cannot start fetch worker: {}", e),
                }
            }
        })
        .context("starting fetch queue")?;
    Ok(())
}

#[cfg(not(feature = "fetch"))]
fn start_fetches(urls: &[String], _config: &Config, _downloads: &DownloadStatusCell) -> Result<()> {
    if !urls.is_empty() {
        bail!("--fetch needs a build with the `fetch` feature");
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    if let Some(Command::Playlist { action }) = args.command {
        return run_playlist_command(&config, action);
    }

    let _log_guard = init_logging(&config.log_dir, args.dev)?;
    info!("TuneDeck starting (library {})", config.library_dir.display());
    if !config.library_dir.is_dir() {
        warn!("Library directory {} does not exist yet", config.library_dir.display());
    }

    #[cfg(feature = "audio")]
    let (_stream, backend) = {
        let (stream, backend) = tunedeck::audio::RodioBackend::try_default(config.audio.volume)
            .context("opening the default audio output")?;
        let backend: std::sync::Arc<dyn tunedeck::audio::AudioBackend> = std::sync::Arc::new(backend);
        (stream, backend)
    };
    #[cfg(not(feature = "audio"))]
    let backend: std::sync::Arc<dyn tunedeck::audio::AudioBackend> = {
        bail!("this build has no audio output; rebuild with the `audio` feature");
    };

    let downloads = DownloadStatusCell::new();
    start_fetches(&args.fetch, &config, &downloads)?;

    let mut app = App::new(
        &config,
        backend,
        downloads,
        Box::new(SystemDeviceController),
    )?;
    app.run().await?;

    info!("TuneDeck exited cleanly");
    Ok(())
}
