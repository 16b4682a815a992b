mod assets;
mod audio;
mod body;
mod config;
mod core;
mod input;
mod render;
mod spawn;
mod types;
mod ui;

use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::{Context, Result, anyhow};
use clap::Parser;

use crate::config::Settings;

#[derive(Parser, Debug)]
#[command(about = "Bouncing, splitting, draggable circles in the terminal", version)]
struct Args {
    /// TOML settings file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Image drawn behind the circles
    #[arg(long)]
    background: Option<PathBuf>,
    #[arg(long)]
    fps: Option<u32>,
    /// Start with the population cap disabled
    #[arg(long)]
    infinite: bool,
    /// No bell on ground impact
    #[arg(long)]
    mute: bool,
    /// Write logs to this file
    #[arg(long)]
    log: Option<PathBuf>,
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,
}

impl Args {
    fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        if let Some(background) = &self.background {
            settings.display.background = Some(background.clone());
        }
        if let Some(fps) = self.fps {
            settings.display.fps = fps;
        }
        if self.infinite {
            settings.population.infinite = true;
        }
        if self.mute {
            settings.display.sound = false;
        }
        settings.validate()?;
        Ok(settings)
    }
}

fn init_logging(path: &Path, level: tracing::Level) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(level)
        .try_init()
        .map_err(|err| anyhow!(err))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let settings = args.settings()?;
    if let Some(path) = &args.log {
        init_logging(path, args.log_level)?;
    }
    tracing::info!(?settings, "starting");
    ui::run(settings)
}
