use anyhow::Result;
use clap::{Arg, ArgAction, Command};

use devmon::commands;

fn build_cli() -> Command {
    Command::new("devmon")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Monitor line-based device measurements with per-device safety thresholds")
        .disable_version_flag(true)
        .arg(
            Arg::new("version")
                .short('v')
                .short_alias('V')
                .long("version")
                .help("Print version information")
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("run")
                .about("Start monitoring the configured devices until Ctrl+C")
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .value_name("FILE")
                        .help("Configuration file (defaults to the user config directory)"),
                )
                .arg(
                    Arg::new("source-dir")
                        .short('s')
                        .long("source-dir")
                        .value_name("DIR")
                        .help("Directory holding temperature_device.txt and humidity_device.txt"),
                )
                .arg(
                    Arg::new("period")
                        .short('p')
                        .long("period")
                        .value_name("SECS")
                        .help("Seconds between two reports")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("devices")
                        .short('d')
                        .long("devices")
                        .value_name("LIST")
                        .help("Comma-separated devices to monitor (temperature,humidity)")
                        .value_delimiter(','),
                )
                .arg(
                    Arg::new("parse-policy")
                        .long("parse-policy")
                        .value_name("POLICY")
                        .help("What to do with malformed lines")
                        .value_parser(["skip", "abort", "zero"]),
                )
                .arg(
                    Arg::new("no-budget")
                        .long("no-budget")
                        .help("Keep reporting until Ctrl+C instead of stopping after the run budget")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("demo")
                        .long("demo")
                        .help("Use built-in sample readings instead of device files")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("once")
                        .long("once")
                        .help("Stop after the first report")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Inspect or create the configuration file")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(Command::new("show").about("Print the effective configuration"))
                .subcommand(Command::new("path").about("Print the configuration file path"))
                .subcommand(
                    Command::new("init")
                        .about("Write the default configuration file")
                        .arg(
                            Arg::new("force")
                                .long("force")
                                .help("Overwrite an existing file")
                                .action(ArgAction::SetTrue),
                        ),
                ),
        )
        .subcommand(Command::new("version").about("Shows version information"))
}

fn main() -> Result<()> {
    devmon::init_logging();

    let matches = build_cli().get_matches();

    if matches.get_flag("version") {
        return commands::version();
    }

    match matches.subcommand() {
        Some(("run", sub_matches)) => commands::run(sub_matches)?,
        Some(("config", sub_matches)) => commands::config::execute(sub_matches)?,
        Some(("version", _)) => commands::version()?,
        _ => {
            println!("Welcome to devmon!");
            println!("Use 'devmon --help' for more information.");
        }
    }

    Ok(())
}
