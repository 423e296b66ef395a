use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use snake_board::config::AppConfig;
use snake_board::modes::{PlayMode, ScoresMode};
use snake_board::prefs::Preferences;
use snake_board::store::{FileStore, KeyValueStore, ScoreStore};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "snake_board")]
#[command(version, about = "Snake with a local or remote leaderboard")]
struct Cli {
    /// What to run
    #[arg(long, default_value = "play")]
    mode: Mode,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where the leaderboard, player name and preferences are kept
    #[arg(long, default_value = ".snake_board")]
    data_dir: PathBuf,

    /// Tiles per side of the board, overriding the config file
    #[arg(long)]
    grid_size: Option<usize>,

    /// Set the current player before starting
    #[arg(long)]
    player: Option<String>,

    /// Number of leaderboard rows printed in scores mode
    #[arg(long, default_value = "10")]
    limit: usize,
}

#[derive(Clone, ValueEnum)]
enum Mode {
    /// Play snake with keyboard controls
    Play,
    /// Print the leaderboard and exit
    Scores,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AppConfig::default(),
    };
    if let Some(grid_size) = cli.grid_size {
        config.game.grid_size = grid_size;
    }
    config.validate().context("Invalid configuration")?;

    let kv = FileStore::open(&cli.data_dir)
        .with_context(|| format!("Failed to open data dir {}", cli.data_dir.display()))?;

    match cli.mode {
        Mode::Play => init_file_logging(kv.dir())?,
        Mode::Scores => init_stderr_logging(),
    }

    let kv: Arc<dyn KeyValueStore> = Arc::new(kv);
    let store = Arc::new(
        ScoreStore::init(&config.leaderboard, Arc::clone(&kv))
            .context("Failed to open leaderboard")?,
    );
    if let Some(player) = &cli.player {
        store.set_current_player(player);
    }

    match cli.mode {
        Mode::Play => {
            let prefs = Preferences::load(kv, config.game.base_speed_ms);
            let mut play_mode = PlayMode::new(config.game, store, prefs);
            play_mode.run().await?;
        }
        Mode::Scores => {
            let mut stdout = std::io::stdout().lock();
            ScoresMode::new(&store, cli.limit).run(&mut stdout).await?;
        }
    }

    Ok(())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| "snake_board=info".into())
}

/// The TUI owns the terminal, so logs go to a file next to the data
fn init_file_logging(dir: &Path) -> Result<()> {
    let path = dir.join("snake_board.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}
