use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::Parser;
use log::{error, info, warn};

use rusty_sieve::cli::{self, CliArgs, Command};
use rusty_sieve::export::sheets::sheets_to_csv;
use rusty_sieve::{logging, output_dir, pipeline, AppConfig};

fn main() -> ExitCode {
    let args = CliArgs::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> anyhow::Result<()> {
    let mut config = AppConfig::load(&args.config)?;
    args.command.apply_overrides(&mut config);
    logging::init(&config.logging, args.verbose)?;

    match args.command {
        Command::Run { input, json, .. } => {
            let Some(input) = cli::resolve_input(input) else {
                bail!("No input workbook given");
            };
            let summary = pipeline::run(&config, &input)
                .with_context(|| format!("Processing {} failed", input.display()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                for condition in &summary.conditions {
                    println!(
                        "{:<20} {:>6} records  {}",
                        condition.id,
                        condition.records,
                        condition.file.display()
                    );
                }
                println!("Workbook: {}", summary.workbook.display());
            }
        }
        Command::Clean { .. } => {
            let dir = &config.output.directory;
            if dir.is_dir() {
                let removed = output_dir::clear(dir)?;
                println!("Removed {removed} entries from {}", dir.display());
            } else {
                info!("Nothing to clean, {} does not exist", dir.display());
            }
        }
        Command::InitConfig { path } => {
            if path.exists() {
                warn!("Overwriting existing configuration {}", path.display());
            }
            AppConfig::default().save(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
        Command::ToCsv { input, .. } => {
            let report = sheets_to_csv(&input, &config.output.directory)
                .with_context(|| format!("Converting {} failed", input.display()))?;
            for path in &report.written {
                println!("{}", path.display());
            }
            if !report.failed.is_empty() {
                bail!(
                    "{} of {} sheets could not be converted",
                    report.failed.len(),
                    report.failed.len() + report.written.len()
                );
            }
        }
    }
    Ok(())
}
