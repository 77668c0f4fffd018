//! `devmon run` - start the workers and reporter, wait for Ctrl+C, tear down.

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use crate::core::device_monitor::{
    DeviceKind, FileSource, LineSource, MemorySource, ParsePolicy, ShutdownSummary, Supervisor,
    WorkerOutcome,
};
use crate::core::MonitorConfig;

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = resolve_config(matches)?;
    let demo = matches.get_flag("demo");
    let once = matches.get_flag("once");

    let source: Arc<dyn LineSource> = if demo {
        Arc::new(MemorySource::demo())
    } else {
        Arc::new(FileSource::new(&config.source_dir))
    };

    println!("{}", "Measurement process started".cyan().bold());
    if demo {
        println!("{}", "DEMO MODE - using built-in sample readings".yellow());
    } else {
        println!(
            "{}",
            format!("Reading device files from {:?}", config.source_dir).dimmed()
        );
    }

    let mut supervisor_config = config.supervisor_config();
    if once {
        supervisor_config.reporter.max_cycles = Some(1);
    }

    let supervisor = Supervisor::initialize(&config.devices, supervisor_config, source)
        .context("Failed to initialize devices")?;

    for (device, reason) in supervisor.failed_devices() {
        println!(
            "{}",
            format!("⚠️  {} worker not started: {}", device, reason).yellow()
        );
    }

    // Tear down even when the stop handler could not be installed.
    let waited = wait_for_stop(&supervisor, once);

    println!("{}", "Shutting down...".yellow().bold());
    let summary = supervisor.deinitialize();
    print_summary(&summary);
    println!("{}", "Measurement process terminated".cyan().bold());

    waited
}

/// Load the config file (explicit or default) and apply command-line overrides.
fn resolve_config(matches: &ArgMatches) -> Result<MonitorConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => MonitorConfig::load_from(Path::new(path))?,
        None => MonitorConfig::load()?,
    };

    if let Some(dir) = matches.get_one::<String>("source-dir") {
        config.source_dir = PathBuf::from(dir);
    }

    if let Some(&period) = matches.get_one::<u64>("period") {
        config.report_period_secs = period;
    }

    if let Some(devices) = matches.get_many::<String>("devices") {
        config.devices = devices
            .map(|d| d.parse::<DeviceKind>().map_err(anyhow::Error::msg))
            .collect::<Result<Vec<_>>>()?;
    }

    if let Some(policy) = matches.get_one::<String>("parse-policy") {
        config.parse_policy = policy
            .parse::<ParsePolicy>()
            .map_err(anyhow::Error::msg)?;
    }

    if matches.get_flag("no-budget") {
        config.run_budget_secs = None;
    }

    config.validate()?;
    Ok(config)
}

/// Block until Ctrl+C, or until the first report when `once` is set.
fn wait_for_stop(supervisor: &Supervisor, once: bool) -> Result<()> {
    let (stop_tx, stop_rx) = mpsc::channel::<()>();

    ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    })
    .map_err(|e| anyhow::anyhow!("Failed to set Ctrl+C handler: {}", e))?;

    println!("{}", "Press Ctrl+C to stop monitoring".dimmed());

    let reports = supervisor.subscribe_reports();

    loop {
        if once && reports.borrow().is_some() {
            return Ok(());
        }

        match stop_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return Ok(()),
            Err(RecvTimeoutError::Timeout) => {}
        }
    }
}

fn print_summary(summary: &ShutdownSummary) {
    println!();
    println!("{}", "Summary".bold());
    println!(
        "  {} report cycle(s), {} reading(s) stored",
        summary.report_cycles,
        summary.drained.total()
    );

    for report in &summary.workers {
        let line = format!(
            "  {}: {} accepted, {} malformed - {}",
            report.device, report.accepted, report.parse_failures, report.outcome
        );
        if report.outcome == WorkerOutcome::Exhausted {
            println!("{}", line.green());
        } else {
            println!("{}", line.yellow());
        }
    }
}
