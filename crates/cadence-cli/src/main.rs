use std::time::Duration;

use cadence_clock::{tick_period, IntervalLogger};
use cadence_core::{CadenceConfig, CadenceError, ClockKind};
use cadence_scheduler::{driver, Scheduler};
use clap::{Parser, ValueEnum};
use tracing::info;

mod score;

/// Play a demo drum pattern against a cadence clock.
#[derive(Debug, Parser)]
#[command(name = "cadence", version, about)]
struct Cli {
    /// Config file (default: $CADENCE_CONFIG or ~/.cadence/cadence.toml).
    #[arg(long)]
    config: Option<String>,

    /// Clock to drive the scheduler with; overrides the config file.
    #[arg(long, value_enum)]
    clock: Option<ClockArg>,

    /// Ticks per second; overrides the config file.
    #[arg(long)]
    rate: Option<f64>,

    /// Seconds of clock time to play.
    #[arg(long, default_value_t = 4.0)]
    duration: f64,

    /// Print fired events as JSON lines.
    #[arg(long)]
    json: bool,

    /// Record tick intervals and print statistics at the end.
    #[arg(long)]
    log_intervals: bool,
}

impl Cli {
    /// Check numeric flags before anything is built from them. Returns the
    /// playback duration.
    fn validate(&self) -> cadence_core::Result<Duration> {
        if let Some(rate) = self.rate {
            tick_period(rate).map_err(|e| {
                CadenceError::InvalidArgument(format!("--rate {rate}: {e}"))
            })?;
        }
        if self.duration.is_nan() || self.duration < 0.0 {
            return Err(CadenceError::InvalidArgument(format!(
                "--duration must be a non-negative number, got {}",
                self.duration
            )));
        }
        Duration::try_from_secs_f64(self.duration).map_err(|_| {
            CadenceError::InvalidArgument(format!("--duration {} is too large", self.duration))
        })
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ClockArg {
    Offline,
    Realtime,
    Frame,
}

impl From<ClockArg> for ClockKind {
    fn from(arg: ClockArg) -> Self {
        match arg {
            ClockArg::Offline => ClockKind::Offline,
            ClockArg::Realtime => ClockKind::Realtime,
            ClockArg::Frame => ClockKind::Frame,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "cadence_cli=info,cadence_scheduler=info,cadence_clock=info".into()
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let duration = cli.validate()?;

    // load config: --config > CADENCE_CONFIG env > ~/.cadence/cadence.toml
    let config_path = cli.config.clone().or_else(|| std::env::var("CADENCE_CONFIG").ok());
    let mut config = CadenceConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::warn!(code = e.code(), "Config load failed ({}), using defaults", e);
        CadenceConfig::default()
    });
    if let Some(clock) = cli.clock {
        config.clock.kind = clock.into();
    }
    if cli.rate.is_some() {
        config.clock.rate = cli.rate;
    }

    let mut scheduler = Scheduler::from_config(&config.clock)?;
    info!(
        kind = ?config.clock.kind,
        rate = scheduler.clock().rate(),
        duration = cli.duration,
        "playing drum pattern"
    );

    let logger = (cli.log_intervals || config.logger.enabled)
        .then(|| IntervalLogger::new(config.logger.capacity));
    if let Some(ref logger) = logger {
        let observer = logger.clone();
        scheduler.on_tick(move |tick| observer.log(tick));
    }

    scheduler.schedule_all(score::drum_pattern(cli.json))?;

    let scheduler = match config.clock.kind {
        ClockKind::Offline => render_offline(scheduler, cli.duration),
        ClockKind::Realtime | ClockKind::Frame => play_realtime(scheduler, duration).await?,
    };

    info!(pending = scheduler.pending(), "playback finished");
    if let Some(stats) = logger.as_ref().and_then(IntervalLogger::stats) {
        if cli.json {
            println!("{}", serde_json::to_string(&stats)?);
        } else {
            println!(
                "tick intervals: n={} min={:.6}s max={:.6}s mean={:.6}s",
                stats.count, stats.min, stats.max, stats.mean
            );
        }
    }
    Ok(())
}

/// Step the clock as fast as possible until `duration` seconds of clock time pass.
fn render_offline(mut scheduler: Scheduler, duration: f64) -> Scheduler {
    let start = scheduler.now();
    while scheduler.now() - start < duration {
        if scheduler.advance().is_none() {
            break;
        }
    }
    scheduler
}

/// Run the timer driver in the background for `duration` of wall-clock time.
async fn play_realtime(scheduler: Scheduler, duration: Duration) -> anyhow::Result<Scheduler> {
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let handle = tokio::spawn(driver::run(scheduler, shutdown_rx));

    tokio::select! {
        _ = tokio::time::sleep(duration) => {}
        _ = tokio::signal::ctrl_c() => info!("interrupted"),
    }

    // signal driver to stop
    let _ = shutdown_tx.send(true);
    Ok(handle.await??)
}
