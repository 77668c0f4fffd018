use crate::core::MonitorConfig;
use anyhow::{Context, Result};
use colored::Colorize;

pub fn execute(matches: &clap::ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("show", _)) => handle_show(),
        Some(("path", _)) => handle_path(),
        Some(("init", sub_matches)) => handle_init(sub_matches),
        _ => {
            println!("Use 'devmon config --help' for more information.");
            Ok(())
        }
    }
}

/// Print the effective configuration as JSON
fn handle_show() -> Result<()> {
    let config = MonitorConfig::load()?;
    let json = serde_json::to_string_pretty(&config).context("Failed to serialize config")?;
    println!("{}", json);
    Ok(())
}

fn handle_path() -> Result<()> {
    println!("{}", MonitorConfig::get_config_path()?.display());
    Ok(())
}

/// Write the default configuration to the default location
fn handle_init(matches: &clap::ArgMatches) -> Result<()> {
    let path = MonitorConfig::get_config_path()?;
    let force = matches.get_flag("force");

    if path.exists() && !force {
        println!(
            "{}",
            format!("Config already exists at {:?}", path).yellow()
        );
        println!("{}", "Use --force to overwrite it.".dimmed());
        return Ok(());
    }

    MonitorConfig::default().save_to(&path)?;
    println!(
        "{} {}",
        "Config written to".green().bold(),
        path.display().to_string().cyan()
    );
    Ok(())
}
