//! Segring CLI
//!
//! Inspect segment allocations and simulate indicator runs frame by frame.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use segring::SegmentedProgress;
use segring_animation::AnimationScheduler;
use segring_core::{allocate, IndicatorConfig, ProgressConfig};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod frames;

use frames::{Frame, FrameRecorder};

/// Upper bound on simulated frames, in case a config never settles
const MAX_FRAMES: usize = 100_000;

#[derive(Parser)]
#[command(name = "segring")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Segmented circular progress indicator", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print how a progress value is split across segments
    Allocate {
        /// Overall progress
        #[arg(short, long, allow_negative_numbers = true)]
        progress: f64,

        /// Number of segments
        #[arg(short, long, default_value = "3")]
        segments: usize,

        /// Value that counts as complete
        #[arg(short, long, default_value = "100")]
        max: f64,
    },

    /// Run an indicator against a fixed frame clock and print every frame
    Simulate {
        /// Progress configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Overall progress
        #[arg(short, long, allow_negative_numbers = true)]
        progress: f64,

        /// Frames per second
        #[arg(long, default_value = "60")]
        fps: f64,

        /// Print frames as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Write a default configuration file
    Init {
        /// Output path
        #[arg(default_value = "segring.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Allocate {
            progress,
            segments,
            max,
        } => cmd_allocate(progress, segments, max),

        Commands::Simulate {
            config,
            progress,
            fps,
            json,
        } => cmd_simulate(config.as_deref(), progress, fps, json),

        Commands::Init { path, force } => cmd_init(&path, force),
    }
}

fn cmd_allocate(progress: f64, segments: usize, max: f64) -> Result<()> {
    if segments == 0 {
        anyhow::bail!("--segments must be at least 1");
    }

    let targets = allocate(Some(progress), max, segments);
    debug!("Allocated {} across {} segments", progress, segments);

    for (i, target) in targets.iter().enumerate() {
        println!("segment {}: {:.4}", i, target);
    }
    println!("total: {:.4}", targets.sum());

    Ok(())
}

fn cmd_simulate(config: Option<&Path>, progress: f64, fps: f64, json: bool) -> Result<()> {
    if !(fps > 0.0) || !fps.is_finite() {
        anyhow::bail!("--fps must be a positive number, got {}", fps);
    }

    let config = match config {
        Some(path) => ProgressConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => default_config(),
    };
    info!(
        "Simulating {} segments at {} fps (progress {})",
        config.segments, fps, progress
    );

    let scheduler = AnimationScheduler::new();
    let recorder = Arc::new(FrameRecorder::default());
    let mut indicator = SegmentedProgress::new(config, scheduler.handle())
        .with_observer(recorder.clone());

    indicator.run(progress);

    let dt = 1000.0 / fps;
    let mut time_ms = 0.0;
    for _ in 0..MAX_FRAMES {
        let active = scheduler.advance(dt);
        time_ms += dt;

        let frame = Frame::capture(time_ms, &indicator, &scheduler, &recorder);
        if json {
            println!("{}", serde_json::to_string(&frame)?);
        } else {
            println!("{frame}");
        }

        if !active {
            info!("Settled after {:.1}ms", time_ms);
            return Ok(());
        }
    }

    warn!("Stopped after {} frames without settling", MAX_FRAMES);
    Ok(())
}

fn cmd_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let content = default_config()
        .to_toml()
        .context("Failed to serialize default config")?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Wrote default configuration to {}", path.display());
    Ok(())
}

/// Configuration used when none is given: radius 100 with the indicator shown
fn default_config() -> ProgressConfig {
    let mut config = ProgressConfig::new(100.0);
    config.indicator = Some(IndicatorConfig {
        show: true,
        radius: 12.0,
        stroke_width: 4.0,
        ..Default::default()
    });
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_simulate() {
        let cli = Cli::try_parse_from(["segring", "simulate", "-p", "75", "--json"]).unwrap();
        match cli.command {
            Commands::Simulate {
                config,
                progress,
                fps,
                json,
            } => {
                assert!(config.is_none());
                assert_eq!(progress, 75.0);
                assert_eq!(fps, 60.0);
                assert!(json);
            }
            _ => panic!("expected simulate"),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = default_config();
        config.validate().unwrap();

        let parsed = ProgressConfig::from_toml_str(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_simulate_rejects_bad_fps() {
        assert!(cmd_simulate(None, 50.0, 0.0, false).is_err());
        assert!(cmd_simulate(None, 50.0, f64::NAN, false).is_err());
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let path = std::env::temp_dir().join(format!("segring-init-{}.toml", std::process::id()));
        cmd_init(&path, true).unwrap();
        assert!(cmd_init(&path, false).is_err());

        let loaded = ProgressConfig::load(&path).unwrap();
        assert_eq!(loaded, default_config());
        fs::remove_file(&path).unwrap();
    }
}
