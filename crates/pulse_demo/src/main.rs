//! Pulse demo
//!
//! Runs one pulse session on a headless event loop, renders every redraw
//! into a recording surface and reports what was drawn.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pulse_animation::{
    PulseConfig, PulseEngine, PulseHost, PulseListener, PulseShape, PulseTarget, StaticTarget,
};
use pulse_core::{ImageId, Rect, RecordingContext};
use pulse_platform::{ControlFlow, EventLoop};

mod surface;

use surface::{FrameStats, RecordingSurface};

#[derive(Parser, Debug)]
#[command(name = "pulse-demo")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run a pulse session against a recording surface", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// TOML file with pulse settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Session duration in milliseconds
    #[arg(long)]
    duration: Option<u64>,

    /// Lifetime of each pulse in milliseconds
    #[arg(long)]
    lifetime: Option<u64>,

    /// Minimum gap between spawns in milliseconds
    #[arg(long)]
    interval: Option<u64>,

    /// Scale reached at the end of a pulse's life
    #[arg(long)]
    max_scale: Option<f32>,

    /// Pulse the target's rectangle instead of a circle
    #[arg(long)]
    outline: bool,

    /// Target bounds as x,y,width,height
    #[arg(long, value_parser = parse_rect, default_value = "40,100,96,48")]
    target: Rect,

    /// Suspend spawning this many milliseconds into the session
    #[arg(long)]
    suspend_after: Option<u64>,

    /// Print the resolved configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = resolve_config(&cli)?;
    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    run_session(config, cli.target, cli.suspend_after)
}

/// Config file (or defaults) with command-line overrides applied
fn resolve_config(cli: &Cli) -> Result<PulseConfig> {
    let mut config = match &cli.config {
        Some(path) => PulseConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => PulseConfig::default(),
    };

    if let Some(duration) = cli.duration {
        config.duration_ms = duration;
    }
    if let Some(lifetime) = cli.lifetime {
        config.lifetime_ms = lifetime;
    }
    if let Some(interval) = cli.interval {
        config.spawn_interval_ms = interval;
    }
    if let Some(max_scale) = cli.max_scale {
        config.max_scale = max_scale;
    }
    if cli.outline {
        config.shape = PulseShape::Outline;
    }

    config.validate().context("Invalid pulse configuration")?;
    Ok(config)
}

fn parse_rect(value: &str) -> std::result::Result<Rect, String> {
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<f32>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid number in '{}': {}", value, e))?;

    match parts.as_slice() {
        [x, y, width, height] => Ok(Rect::new(*x, *y, *width, *height)),
        _ => Err(format!(
            "expected x,y,width,height but got {} values",
            parts.len()
        )),
    }
}

fn run_session(config: PulseConfig, bounds: Rect, suspend_after: Option<u64>) -> Result<()> {
    let event_loop = EventLoop::new();
    let surface = Arc::new(RecordingSurface::new());
    let host: Arc<dyn PulseHost> = surface.clone();

    let engine = PulseEngine::builder(Arc::new(event_loop.proxy()))
        .config(config)
        .host(&host)
        .build()?;

    let finished = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&finished);
    let listener: Arc<dyn PulseListener> =
        Arc::new(move |target: Option<Arc<dyn PulseTarget>>| {
            match target {
                Some(target) => info!("Pulse finished around {:?}", target.bounds()),
                None => info!("Pulse finished; target already released"),
            }
            flag.store(true, Ordering::SeqCst);
        });
    engine.set_finished_listener(&listener);

    let target: Arc<dyn PulseTarget> =
        Arc::new(StaticTarget::new(bounds).with_snapshot(ImageId(1)));
    let started = engine.now_ms();
    let session = engine
        .attach(&target)
        .with_context(|| format!("Failed to attach to {:?}", bounds))?;
    info!("Started session {} on {:?}", session, bounds);

    let mut ctx = RecordingContext::new();
    let mut stats = FrameStats::default();
    let mut suspended = false;

    event_loop.run(|| {
        if let Some(after) = suspend_after {
            if !suspended && engine.now_ms().saturating_sub(started) >= after {
                engine.suspend_spawning();
                suspended = true;
                info!("Suspended spawning after {}ms", after);
            }
        }

        if surface.take_dirty() {
            ctx.clear();
            engine.draw(&mut ctx);
            stats.record(ctx.commands());
        }

        if finished.load(Ordering::SeqCst) {
            ControlFlow::Exit
        } else {
            ControlFlow::Continue
        }
    });

    let elapsed = engine.now_ms().saturating_sub(started);
    debug!("{:?}", stats);

    println!("session          {}", session);
    println!("elapsed          {}ms", elapsed);
    println!("pulses spawned   {}", engine.spawned_count());
    println!("frames rendered  {}", stats.frames);
    println!("redraw requests  {}", surface.redraw_requests());
    println!("peak live pulses {}", stats.peak_pulses);
    println!("strokes drawn    {}", stats.strokes);
    if let Some(alpha) = stats.min_alpha {
        println!("min stroke alpha {:.3}", alpha);
    }

    Ok(())
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
    fn test_parse_rect() {
        assert_eq!(
            parse_rect("1, 2.5,30,40").unwrap(),
            Rect::new(1.0, 2.5, 30.0, 40.0)
        );
        assert!(parse_rect("1,2,3").is_err());
        assert!(parse_rect("1,2,three,4").is_err());
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from([
            "pulse-demo",
            "--duration",
            "200",
            "--interval",
            "50",
            "--outline",
            "--target",
            "0,0,10,10",
        ]);
        let config = resolve_config(&cli).unwrap();

        assert_eq!(config.duration_ms, 200);
        assert_eq!(config.spawn_interval_ms, 50);
        assert_eq!(config.lifetime_ms, 900);
        assert_eq!(config.shape, PulseShape::Outline);
        assert_eq!(cli.target, Rect::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn test_invalid_override() {
        let cli = Cli::parse_from(["pulse-demo", "--max-scale", "0.5"]);
        assert!(resolve_config(&cli).is_err());
    }

    #[test]
    fn test_short_session() {
        let config = PulseConfig {
            duration_ms: 40,
            lifetime_ms: 30,
            spawn_interval_ms: 10,
            tick_interval_ms: 2,
            ..Default::default()
        };
        run_session(config, Rect::new(0.0, 0.0, 20.0, 20.0), Some(15)).unwrap();
    }
}
