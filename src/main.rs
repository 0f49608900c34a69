//! band-dump CLI
//!
//! Records wearable sensor sessions into JSON reports.

use band_sensor_dump::{
    config::Config,
    report::{list_reports, read_report, OutboxComposer, ReportFile, ReportSender, ReportWriter},
    DeviceInfo, Recorder, SessionError, SimulatedBandManager, VERSION,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "band-dump")]
#[command(version = VERSION)]
#[command(about = "Record wearable sensor sessions into JSON reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List discoverable bands
    Devices,

    /// Record a session until Ctrl+C (or until --duration elapses)
    Record {
        /// Band to record from (defaults to the first one found)
        #[arg(long)]
        device: Option<String>,

        /// Exercise label stored in the report and used in its file name
        #[arg(long, short)]
        exercise: Option<String>,

        /// Stop automatically after this many seconds
        #[arg(long)]
        duration: Option<u64>,

        /// Compose a mail with the report attached once it is written
        #[arg(long)]
        send_to: Option<String>,
    },

    /// List written reports
    Reports {
        /// Report directory (defaults to the configured one)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Compose a mail with reports attached
    Send {
        /// Recipient address (defaults to the configured one)
        #[arg(long)]
        to: Option<String>,

        /// Reports to attach (defaults to every report in the report directory)
        files: Vec<PathBuf>,
    },

    /// Show configuration, or update it with the --set-* options
    Config {
        /// Default recipient for `send`
        #[arg(long)]
        set_recipient: Option<String>,

        /// Label used when `record` is not given one
        #[arg(long)]
        set_exercise: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Devices => cmd_devices().await,
        Commands::Record {
            device,
            exercise,
            duration,
            send_to,
        } => cmd_record(device, exercise, duration, send_to).await,
        Commands::Reports { dir } => cmd_reports(dir),
        Commands::Send { to, files } => cmd_send(to, files).await,
        Commands::Config {
            set_recipient,
            set_exercise,
        } => cmd_config(set_recipient, set_exercise),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config() -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config, using defaults: {e}");
            Config::default()
        }
    }
}

fn recorder_for(config: &Config) -> Recorder {
    let manager = Arc::new(SimulatedBandManager::new(config.simulation.clone()));
    Recorder::new(manager, config.timeouts())
}

/// Report a session error and exit. Precondition violations are bugs.
fn exit_with(e: SessionError) -> ! {
    if e.is_precondition_violation() {
        eprintln!("Internal error: {e}");
        std::process::exit(2);
    }
    eprintln!("Error: {e}");
    std::process::exit(1);
}

async fn cmd_devices() {
    let config = load_config();
    let recorder = recorder_for(&config);

    println!("Getting band info");
    let devices = match recorder.list_devices().await {
        Ok(devices) => devices,
        Err(e) => exit_with(e),
    };
    if devices.is_empty() {
        println!("no bands found");
        std::process::exit(1);
    }
    for device in &devices {
        println!("  {} ({})", device.name, device.address);
    }
}

/// Select the band named `name`, or the first one found.
async fn choose_device(
    recorder: &mut Recorder,
    name: Option<&str>,
) -> Result<DeviceInfo, SessionError> {
    let Some(name) = name else {
        return recorder.discover().await.cloned();
    };
    let device = recorder
        .list_devices()
        .await?
        .into_iter()
        .find(|d| d.name == name)
        .ok_or(SessionError::NoDeviceFound)?;
    Ok(recorder.select(device).clone())
}

async fn cmd_record(
    device: Option<String>,
    exercise: Option<String>,
    duration: Option<u64>,
    send_to: Option<String>,
) {
    println!("band-dump v{VERSION}");
    println!();

    let config = load_config();
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }
    let exercise = exercise.or_else(|| config.default_exercise.clone());

    // Installed first so Ctrl+C while connecting still ends in a clean stop.
    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone());

    let mut recorder = recorder_for(&config);

    println!("Getting band info");
    let device = match choose_device(&mut recorder, device.as_deref()).await {
        Ok(device) => device,
        Err(SessionError::NoDeviceFound) => {
            // Recording stays disabled without a band.
            println!("no bands found");
            std::process::exit(1);
        }
        Err(e) => exit_with(e),
    };
    println!("Using Band {}", device.name);
    if !running.load(Ordering::SeqCst) {
        println!("Interrupted");
        return;
    }

    println!("Connecting to Band {}", device.name);
    if let Err(e) = recorder.start().await {
        exit_with(e);
    }
    println!("Band {} connected", device.name);
    println!("Collecting sensor data for {}", device.name);
    match duration {
        Some(secs) => println!("Stopping after {secs}s (or Ctrl+C)"),
        None => println!("Press Ctrl+C to stop"),
    }
    println!();

    let deadline = duration.map(|secs| Instant::now() + Duration::from_secs(secs));
    let mut last_status = Instant::now();
    while running.load(Ordering::SeqCst) && deadline.map_or(true, |d| Instant::now() < d) {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if last_status.elapsed() >= Duration::from_secs(1) {
            println!("{}", recorder.counters().status_line());
            last_status = Instant::now();
        }
    }

    println!();
    let completed = match recorder.stop().await {
        Ok(completed) => completed,
        Err(e) => exit_with(e),
    };
    println!("Completed sensor data collection");
    for e in &completed.teardown_errors {
        eprintln!("Warning: {e}");
    }
    println!(
        "Collected {} accelerometer readings",
        completed.recording.accelerometer.len()
    );

    let writer = ReportWriter::new(&config.report_dir);
    let file = match writer.write_today(exercise.as_deref(), &completed.recording) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Error writing report: {e}");
            std::process::exit(1);
        }
    };
    println!("Saved {} ({} readings)", file.name, completed.recording.total());

    if let Some(to) = send_to {
        send_reports(&config, &[file], &to).await;
    }
}

fn cmd_reports(dir: Option<PathBuf>) {
    let config = load_config();
    let dir = dir.unwrap_or(config.report_dir);

    let reports = match list_reports(&dir) {
        Ok(reports) => reports,
        Err(e) => {
            eprintln!("Error reading reports: {e}");
            std::process::exit(1);
        }
    };
    if reports.is_empty() {
        println!("No reports found in {dir:?}");
        println!("Run 'band-dump record' to collect a session.");
        return;
    }

    println!("Found {} report(s) in {:?}", reports.len(), dir);
    for report in &reports {
        match read_report(&report.path) {
            Ok(doc) => println!(
                "  {}  exercise: {}, accelerometer: {}, heart rate: {}",
                report.name,
                doc.exercise,
                doc.accelerometer.len(),
                doc.heart_rate.len()
            ),
            Err(e) => println!("  {}  (unreadable: {e})", report.name),
        }
    }
}

async fn cmd_send(to: Option<String>, files: Vec<PathBuf>) {
    let config = load_config();

    let Some(to) = to.or_else(|| config.recipient.clone()) else {
        eprintln!("Error: No recipient. Pass --to or set \"recipient\" in {:?}", Config::config_path());
        std::process::exit(1);
    };

    let reports = if files.is_empty() {
        match list_reports(&config.report_dir) {
            Ok(reports) => reports,
            Err(e) => {
                eprintln!("Error reading reports: {e}");
                std::process::exit(1);
            }
        }
    } else {
        let mut reports = Vec::with_capacity(files.len());
        for path in files {
            if !path.is_file() {
                eprintln!("Error: {path:?} is not a file");
                std::process::exit(1);
            }
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            reports.push(ReportFile { path, name });
        }
        reports
    };

    send_reports(&config, &reports, &to).await;
}

async fn send_reports(config: &Config, reports: &[ReportFile], to: &str) {
    let sender = ReportSender::new(OutboxComposer::new(&config.outbox_dir));
    match sender.send_today(reports, to).await {
        Ok(message) => println!(
            "Composed \"{}\" to {} with {} attachment(s) in {:?}",
            message.subject,
            message.to,
            message.attachments.len(),
            config.outbox_dir
        ),
        Err(e) => {
            eprintln!("Error sending reports: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_config(set_recipient: Option<String>, set_exercise: Option<String>) {
    let mut config = load_config();

    if set_recipient.is_some() || set_exercise.is_some() {
        if set_recipient.is_some() {
            config.recipient = set_recipient;
        }
        if set_exercise.is_some() {
            config.default_exercise = set_exercise;
        }
        if let Err(e) = config.save() {
            eprintln!("Error saving config: {e}");
            std::process::exit(1);
        }
        println!("Saved {:?}", Config::config_path());
        println!();
    }

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");
}
