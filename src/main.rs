use std::fs::File;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ascii3d::{
    config::ViewerConfig,
    engine::Engine,
    mesh::loader::MeshSlot,
    player::{canvas_size, Player},
    snapshot::render_snapshot,
    types::GridSize,
};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

#[derive(Parser, Debug)]
#[command(name = "ascii3d")]
#[command(about = "Software 3D mesh renderer for the terminal", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.config/ascii3d/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to this file (filter with RUST_LOG)
    #[arg(long, global = true)]
    log: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Spin a mesh interactively in the terminal
    View {
        /// Mesh file (OBJ-style `v`/`f` lines)
        model: PathBuf,
    },
    /// Render without a terminal and print the final grid
    Snapshot {
        model: PathBuf,
        #[arg(long, default_value_t = 1)]
        frames: u64,
        #[arg(long, default_value_t = 80)]
        width: u16,
        #[arg(long, default_value_t = 40)]
        height: u16,
        /// Print JSON instead of plain text
        #[arg(long)]
        json: bool,
    },
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let interactive = matches!(cli.command, Command::View { .. });
    init_logging(cli.log.as_deref(), !interactive)?;

    let config = ViewerConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::View { model } => view(&model, config),
        Command::Snapshot {
            model,
            frames,
            width,
            height,
            json,
        } => snapshot(&model, config, GridSize::new(width, height), frames, json),
    }
}

/// Logs go to `--log` if given. Otherwise headless runs log to stderr and
/// the interactive viewer, which owns the terminal, does not log at all.
fn init_logging(log: Option<&Path>, stderr_fallback: bool) -> Result<()> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if let Some(path) = log {
        let file =
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else if stderr_fallback {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

fn view(model: &Path, config: ViewerConfig) -> Result<()> {
    let (term_w, term_h) = crossterm::terminal::size()?;
    let mut engine = Engine::new(&config, canvas_size(term_w, term_h));
    // Loads in the background; the viewer starts spinning the ground plane
    // straight away and picks the mesh up when it lands.
    engine.add_mesh(MeshSlot::spawn_load(model));

    let mut player = Player::new(engine, config);
    player.play()
}

fn snapshot(
    model: &Path,
    config: ViewerConfig,
    size: GridSize,
    frames: u64,
    json: bool,
) -> Result<()> {
    let mut slot = MeshSlot::spawn_load(model);
    slot.wait()
        .with_context(|| format!("Failed to load {}", model.display()))?;

    let mut engine = Engine::new(&config, size);
    engine.add_mesh(slot);
    let shot = render_snapshot(&mut engine, frames);

    if json {
        println!("{}", serde_json::to_string_pretty(&shot)?);
    } else {
        println!("{}", shot.text());
    }
    eprintln!(
        "Rendered {} frames of {} ({} faces drawn)",
        shot.frames,
        model.display(),
        shot.drawn_faces,
    );
    Ok(())
}
