// src/main.rs

//! ecreader entry-point.
//!
//! 1. Parse arguments; help and version never touch the driver
//! 2. Load `ecreader.toml` & set up structured logging
//! 3. Validate the monitor interval
//! 4. Open PawnIO, load the EC module, look up `Access_EC`
//! 5. Run the command, print statistics, close the driver

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use clap::{CommandFactory, Parser, error::ErrorKind};
use fern::Dispatch;
use log::LevelFilter;
use std::{
    path::{Path, PathBuf},
    process::{self, ExitCode},
    thread,
};

use ecreader::{
    EcError, EcProtocol, Session,
    cli::{Action, Cli, format_reads, version_line},
    comms::{self, EcMutexGuard, SystemMutex},
    config::{self, CONFIG_FILE, model::LoggingConfig},
    render::{GridRenderer, stdout_console},
    scanner::{MonitorInterval, StopSignal, install_ctrl_handler, run_monitor, scan_all},
};

// ───── helpers ──────────────────────────────────────────────────────────────

/// Directory that contains the running executable.
fn exe_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("cannot determine executable path")?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow!("executable must live in some directory"))
}

/// Configure global logging: stderr always, a file next to the exe on demand.
fn setup_logging(exe_dir: &Path, logging: &LoggingConfig, verbose: bool) -> Result<(), fern::InitError> {
    let level = if verbose { LevelFilter::Debug } else { logging.level_filter() };

    let log_path = logging.enable.then(|| exe_dir.join(logging.file_name()));

    let mut dispatch = Dispatch::new()
        .format(|out, msg, record| {
            out.finish(format_args!(
                "[{}][{:5}][{}][pid={}][tid={:?}] {}",
                Local::now().to_rfc3339(),
                record.level(),
                record.target(),
                process::id(),
                thread::current().id(),
                msg
            ))
        })
        .level(level)
        .chain(std::io::stderr());

    if let Some(path) = log_path {
        dispatch = dispatch.chain(fern::log_file(path)?);
    }

    dispatch.apply()?;
    Ok(())
}

fn print_driver_hints() {
    eprintln!("Possible causes:");
    eprintln!("1. PawnIO driver not installed. Get from https://pawnio.eu");
    eprintln!("2. Not running as Administrator");
    eprintln!("3. Driver service not started. Run 'sc query pawnio' to validate.");
}

// ───── command logic ────────────────────────────────────────────────────────

fn run(cli: Cli) -> Result<()> {
    // 1 ─ Commands that need no hardware
    let action = cli.action().map_err(anyhow::Error::msg)?;
    match action {
        Action::Usage => {
            Cli::command().print_long_help()?;
            return Ok(());
        }
        Action::Version => {
            println!("{}", version_line());
            return Ok(());
        }
        _ => {}
    }

    // 2 ─ Config & logging
    let exe_dir = exe_dir()?;
    let cfg = config::load_or_default(&exe_dir.join(CONFIG_FILE))
        .with_context(|| format!("failed to load {CONFIG_FILE}"))?;
    setup_logging(&exe_dir, &cfg.logging, cli.verbose).context("logging setup failed")?;

    // 3 ─ Interval check happens before any hardware access
    let interval = match (cli.interval, &action) {
        (Some(secs), _) => MonitorInterval::from_secs(secs)?,
        (None, Action::Monitor) => MonitorInterval::new(cfg.reader.interval)?,
        (None, _) => MonitorInterval::default(),
    };

    // 4 ─ Driver, module, mutex
    let mut channel = comms::open_driver()?;
    if let Err(e) = channel.load_module_file(&exe_dir.join(&cfg.reader.module)) {
        channel.close();
        return Err(e.into());
    }
    log::debug!("{} loaded", cfg.reader.module);

    let session = Session::new();
    if !matches!(action, Action::Read(_)) {
        session.suppress_always();
    }
    let mutex = EcMutexGuard::new(SystemMutex::open());
    let mut ec = EcProtocol::new(channel, mutex, &session);

    // 5 ─ Command
    let format = cli.format(cfg.reader.decimal);
    let renderer = GridRenderer::new(format);
    let outcome: Result<()> = match action {
        Action::Read(registers) => {
            let reads: Vec<_> = registers.iter().map(|&r| ec.read_register(r)).collect();
            println!("{}", format_reads(&reads, format));
            Ok(())
        }
        Action::Dump => {
            let snapshot = scan_all(&mut ec);
            renderer.render_dump(&mut stdout_console(), &snapshot).map_err(Into::into)
        }
        Action::Monitor => {
            let stop = StopSignal::new();
            if !install_ctrl_handler(&stop) {
                log::debug!("no console control handler, Ctrl+C terminates immediately");
            }
            run_monitor(&mut ec, &renderer, &mut stdout_console(), interval, &stop, None)
                .map(|_| ())
                .map_err(Into::into)
        }
        Action::Usage | Action::Version => Ok(()),
    };

    if cli.stats {
        println!("\n{}", session.counters().report(ec.has_mutex()));
    }
    ec.ports_mut().close();
    outcome
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let benign = matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion);
            let _ = e.print();
            return if benign { ExitCode::SUCCESS } else { ExitCode::FAILURE };
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            if matches!(e.downcast_ref(), Some(EcError::DriverUnavailable(_))) {
                print_driver_hints();
            }
            ExitCode::FAILURE
        }
    }
}
