// Kbfn CLI
// Grabs one keyboard and runs its events through the configured layer pipeline

use anyhow::{Context, Result};
use clap::Parser;
use kbfn_core::input::{find_device, list_devices, DeviceError, EventSource, ReadOutcome, Shutdown};
use kbfn_core::{Config, Pipeline, VirtualSink, DEFAULT_VIRTUAL_NAME};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::path::PathBuf;
use std::thread;
use std::time::SystemTime;

/// Layered keyboard remapper with dual-role keys
#[derive(Parser, Debug)]
#[command(name = "kbfn")]
#[command(version)]
#[command(about = "Layered keyboard remapper with dual-role keys", long_about = None)]
struct Args {
    /// TOML configuration file (defaults to $XDG_CONFIG_HOME/kbfn/config.toml)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Device display name or /dev/input path, overriding the config
    #[arg(short, long, value_name = "DEVICE")]
    device: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Validate config and exit
    #[arg(long)]
    check_config: bool,

    /// List available keyboard devices
    #[arg(long)]
    list_devices: bool,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

/// Load the configuration and apply command-line overrides
fn load_config(args: &Args) -> Result<Config> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => Config::default_path()
            .context("cannot determine the config directory; pass --config")?,
    };

    let mut config = Config::from_toml_path(&path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    if let Some(device) = &args.device {
        config.device = Some(device.clone());
    }
    config.device_name()?;

    log::info!("loaded configuration from {}", path.display());
    Ok(config)
}

fn print_devices() {
    let devices = list_devices();
    println!("Found {} keyboard device(s):", devices.len());
    for device in &devices {
        match &device.path {
            Some(path) => println!("  {}: {} ({})", device.index, device.name, path),
            None => println!("  {}: {}", device.index, device.name),
        }
    }
}

/// Request shutdown on the first SIGINT or SIGTERM
fn spawn_signal_handler(shutdown: Shutdown) -> Result<()> {
    let mut signals =
        Signals::new([SIGINT, SIGTERM]).context("failed to install signal handlers")?;

    thread::spawn(move || {
        if let Some(signal) = signals.forever().next() {
            log::info!("received signal {}, shutting down", signal);
            shutdown.request();
        }
    });
    Ok(())
}

/// Pump events from one grabbed device until shutdown or device failure.
///
/// The virtual device and the pipeline live exactly as long as the grab,
/// so every reconnect starts from clean layer state.
fn run_session(config: &Config, mut source: EventSource) -> Result<(), DeviceError> {
    let sink = VirtualSink::new(DEFAULT_VIRTUAL_NAME)?;
    let mut pipeline = Pipeline::build(&config.layers, sink);
    log::info!("remapping '{}'", source.name());

    loop {
        let timeout = pipeline
            .next_deadline()
            .map(|deadline| deadline.duration_since(SystemTime::now()).unwrap_or_default());

        match source.read_batch(timeout)? {
            ReadOutcome::Batch(events) => pipeline.process_batch(events)?,
            ReadOutcome::Timeout => {
                pipeline.tick(SystemTime::now())?;
            }
            ReadOutcome::Closed => return Ok(()),
        }
    }
}

/// Discovery loop: find the device, run a session, start over if it is lost
fn serve(config: &Config, shutdown: &Shutdown) -> Result<()> {
    let wanted = config.device_name()?;

    while !shutdown.is_requested() {
        let session = find_device(wanted)
            .and_then(|device| EventSource::open(device, shutdown.clone()))
            .and_then(|source| run_session(config, source));

        match session {
            Ok(()) => break,
            Err(e) if e.is_recoverable() => {
                log::warn!("{}; retrying in {:?}", e, config.retry_interval);
                shutdown.wait_timeout(config.retry_interval);
            }
            Err(e) => return Err(e).context("cannot continue remapping"),
        }
    }

    log::info!("stopped");
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    // Handle list-devices flag (doesn't require config)
    if args.list_devices {
        print_devices();
        return Ok(());
    }

    // Configuration problems are fatal before any device is touched
    let config = load_config(&args)?;
    if args.check_config {
        println!("Configuration is valid");
        return Ok(());
    }

    let shutdown = Shutdown::new().context("failed to create shutdown handle")?;
    spawn_signal_handler(shutdown.clone())?;
    serve(&config, &shutdown)
}
