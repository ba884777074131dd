use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use perceive_scene::{DetectionEvent, Runner, Scenario, SensorSummary};

#[derive(Parser)]
#[command(name = "perceive", about = "Run agent perception scenarios")]
struct Cli {
    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Step a scenario and print every detection
    Run {
        /// Scenario TOML file
        scenario: PathBuf,

        /// Number of frames (defaults to the scenario's run.frames)
        #[arg(long)]
        frames: Option<u64>,

        /// Seconds per frame (defaults to the scenario's run.dt)
        #[arg(long)]
        dt: Option<f64>,

        /// Emit JSON lines instead of text
        #[arg(long)]
        json: bool,
    },

    /// Validate a scenario without running it
    Check {
        /// Scenario TOML file
        scenario: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Run {
            scenario,
            frames,
            dt,
            json,
        } => cmd_run(scenario, *frames, *dt, *json),
        Commands::Check { scenario } => cmd_check(scenario),
    }
}

fn load(path: &Path) -> Result<Scenario> {
    Scenario::load(path).with_context(|| format!("failed to load scenario {}", path.display()))
}

fn cmd_run(path: &Path, frames: Option<u64>, dt: Option<f64>, json: bool) -> Result<()> {
    let scenario = load(path)?;
    let frames = frames.unwrap_or(scenario.run.frames);
    let dt = dt.unwrap_or(scenario.run.dt);
    if !(dt.is_finite() && dt > 0.0) {
        bail!("--dt must be a positive number of seconds, got {dt}");
    }

    let mut runner = Runner::new(&scenario).context("failed to build scenario")?;
    tracing::info!(frames, dt, "running {}", path.display());
    let events = runner.run(frames, dt);
    let summary = runner.summary();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if json {
        write_json(&mut out, &events, &summary)?;
    } else {
        write_text(&mut out, &events, &summary, runner.time())?;
    }
    Ok(())
}

fn write_json(out: &mut impl Write, events: &[DetectionEvent], summary: &[SensorSummary]) -> Result<()> {
    for event in events {
        let line = serde_json::to_string(event).context("failed to serialize event")?;
        writeln!(out, "{line}")?;
    }
    let line = serde_json::to_string(&serde_json::json!({ "summary": summary }))
        .context("failed to serialize summary")?;
    writeln!(out, "{line}")?;
    Ok(())
}

fn write_text(
    out: &mut impl Write,
    events: &[DetectionEvent],
    summary: &[SensorSummary],
    end_time: f64,
) -> Result<()> {
    if events.is_empty() {
        writeln!(out, "(no detections)")?;
    }
    for e in events {
        let source = if e.first_hand { "" } else { ", reported" };
        writeln!(
            out,
            "frame {:>5}  t={:>8.3}  {} -> {}: {} ({}{source})",
            e.frame, e.time, e.sensor, e.signal, e.awareness, e.kind.as_str()
        )?;
    }

    writeln!(out, "--- memory at t={end_time:.3} ---")?;
    for sensor in summary {
        writeln!(out, "{}: alertness={}", sensor.sensor, sensor.alertness)?;
        for belief in &sensor.beliefs {
            writeln!(
                out,
                "  {} {} (last sensed t={:.3})",
                belief.signal, belief.awareness, belief.last_sensed
            )?;
        }
    }
    writeln!(out, "detections: {}", events.len())?;
    Ok(())
}

fn cmd_check(path: &Path) -> Result<()> {
    let scenario = load(path)?;
    let cones: usize = scenario.sensors.iter().map(|s| s.cones.len()).sum();

    println!("scenario:   {}", path.display());
    println!("sensors:    {}", scenario.sensors.len());
    println!("cones:      {cones}");
    println!("signals:    {}", scenario.signals.len());
    println!("obstacles:  {}", scenario.obstacles.len());
    println!(
        "run:        {} frames x {}s (seed {})",
        scenario.run.frames, scenario.run.dt, scenario.run.seed
    );
    println!("ok");
    Ok(())
}
