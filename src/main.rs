use anyhow::{Context, Result};
use clap::Parser;
use coordinate_clicker::menu::{Console, MenuChoice};
use coordinate_clicker::{
    ClickLoop, Config, CoordinateRecorder, CoordinateStore, EnigoClicker, HotkeyController,
    HotkeyManager, ListenOutcome, RdevEventSource,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Record mouse click positions and replay them on a loop.
#[derive(Parser, Debug)]
#[command(name = "coordclick", version, about)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Coordinates file to save recordings to and replay from
    #[arg(short, long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Default click interval in seconds
    #[arg(short, long, value_name = "SECONDS")]
    interval: Option<f64>,

    /// Log every click
    #[arg(short, long)]
    verbose: bool,

    /// Write the effective configuration to PATH and exit
    #[arg(long, value_name = "PATH")]
    write_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli)?;

    if let Some(path) = &cli.write_config {
        config.save_to_file(path)?;
        println!("Configuration written to {}", path.display());
        return Ok(());
    }

    let mut console = Console::stdio();
    console.print_banner()?;

    loop {
        let result = match console.read_choice()? {
            MenuChoice::Record => record(&mut console, &config).await,
            MenuChoice::ReplaySaved => replay_saved(&mut console, &config).await,
            MenuChoice::ReplayManual => replay_manual(&mut console, &config).await,
            MenuChoice::Exit => break,
        };

        if let Err(e) = result {
            error!("{e:#}");
            console.error(&format!("Error: {e:#}"))?;
        }
    }

    console.info("\nExiting")?;
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if let Some(file) = &cli.file {
        config.coordinates_file = file.clone();
    }
    if let Some(seconds) = cli.interval {
        config.default_interval = Duration::try_from_secs_f64(seconds)
            .with_context(|| format!("invalid --interval {seconds}"))?;
    }

    config.validate()?;
    Ok(config)
}

async fn record<R: BufRead, W: Write>(console: &mut Console<R, W>, config: &Config) -> Result<()> {
    console.info(&format!(
        "\n=== Recording ===\nClick every position to replay. Press {} to finish.",
        config.record_cancel_key.to_uppercase()
    ))?;

    let cancel_key = config.record_cancel_key.clone();
    let coordinates = tokio::task::spawn_blocking(move || -> coordinate_clicker::Result<_> {
        let mut recorder = CoordinateRecorder::with_cancel_key(RdevEventSource::new(), &cancel_key);
        recorder.start_recording()?;
        Ok(recorder.into_coordinates())
    })
    .await
    .context("recording task failed")??;

    if coordinates.is_empty() {
        console.info("No coordinates recorded")?;
        return Ok(());
    }

    console.print_points("Recorded", &coordinates)?;
    if console.confirm("Save these coordinates?")? {
        coordinates
            .save(&config.coordinates_file)
            .with_context(|| format!("saving {}", config.coordinates_file.display()))?;
        console.info(&format!(
            "Coordinates saved to {}",
            config.coordinates_file.display()
        ))?;
    }
    Ok(())
}

async fn replay_saved<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    config: &Config,
) -> Result<()> {
    let coordinates = CoordinateStore::load(&config.coordinates_file)
        .with_context(|| format!("loading {}", config.coordinates_file.display()))?;

    if coordinates.is_empty() {
        console.error(&format!(
            "No saved coordinates found in {}",
            config.coordinates_file.display()
        ))?;
        return Ok(());
    }

    console.print_points("Loaded", &coordinates)?;
    let interval = console.read_interval(config.default_interval)?;
    run_session(console, config, &coordinates, interval).await
}

async fn replay_manual<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    config: &Config,
) -> Result<()> {
    let entry = console.read_points()?;
    if entry.coordinates.is_empty() {
        console.error("No coordinates entered")?;
        return Ok(());
    }

    let interval = console.read_interval(config.default_interval)?;
    run_session(console, config, &entry.coordinates, interval).await
}

async fn run_session<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    config: &Config,
    coordinates: &CoordinateStore,
    interval: Duration,
) -> Result<()> {
    let clicker = Arc::new(EnigoClicker::new(config.clicker_options())?);
    let click_loop = Arc::new(ClickLoop::new(coordinates, interval, clicker));

    let mut hotkeys = HotkeyManager::new();
    hotkeys.register_bindings(&config.hotkeys)?;
    let actions = hotkeys.start_listener(&RdevEventSource::new())?;
    console.print_hotkeys(&config.hotkeys)?;

    let controller = HotkeyController::new(Arc::clone(&click_loop));
    let outcome = controller.listen(actions).await;

    let report = click_loop.wait().await?;
    info!(?outcome, clicks = report.clicks, cycles = report.cycles, "Session ended");

    let verb = match outcome {
        ListenOutcome::Cancelled => "Cancelled",
        _ => "Stopped",
    };
    console.info(&format!(
        "{verb} after {} click(s), {} full pass(es)",
        report.clicks, report.cycles
    ))?;
    Ok(())
}
