use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{AppConfig, DEFAULT_CONFIG_FILE};

#[derive(Parser, Debug, Clone)]
#[command(name = "rusty-sieve")]
#[command(about = "Split a workbook's master table into one result set per filter condition")]
#[command(version)]
pub struct CliArgs {
    /// YAML configuration file (defaults apply when it does not exist)
    #[arg(long, short = 'c', value_name = "PATH", default_value = DEFAULT_CONFIG_FILE, global = true)]
    pub config: PathBuf,

    /// Log at debug level (RUST_LOG still takes precedence)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Load, filter and export a workbook
    Run {
        /// Input workbook (.xlsx); prompts with a file dialog when omitted
        /// and the `dialog` feature is enabled
        input: Option<PathBuf>,

        /// Output directory (overrides `output.directory`)
        #[arg(long, short = 'o', value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Do not clear the output directory before running
        #[arg(long)]
        keep_previous: bool,

        /// Print the run summary as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Remove everything inside the output directory
    Clean {
        #[arg(long, short = 'o', value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Write the default configuration to PATH
    InitConfig { path: PathBuf },

    /// Convert every sheet of a workbook to `<sheet>.csv`
    ToCsv {
        input: PathBuf,

        #[arg(long, short = 'o', value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },
}

impl Command {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        match self {
            Command::Run {
                output_dir,
                keep_previous,
                ..
            } => {
                if let Some(dir) = output_dir {
                    config.output.directory = dir.clone();
                }
                if *keep_previous {
                    config.output.clean_before_run = false;
                }
            }
            Command::Clean { output_dir } | Command::ToCsv { output_dir, .. } => {
                if let Some(dir) = output_dir {
                    config.output.directory = dir.clone();
                }
            }
            Command::InitConfig { .. } => {}
        }
    }
}

/// Resolve the input workbook of `run`: the argument, else a file dialog.
#[cfg(feature = "dialog")]
pub fn resolve_input(input: Option<PathBuf>) -> Option<PathBuf> {
    input.or_else(|| {
        rfd::FileDialog::new()
            .set_title("Select the workbook to process")
            .add_filter("Excel workbook", &["xlsx", "xlsm", "xls"])
            .pick_file()
    })
}

/// Resolve the input workbook of `run`. Without the `dialog` feature the
/// argument is required.
#[cfg(not(feature = "dialog"))]
pub fn resolve_input(input: Option<PathBuf>) -> Option<PathBuf> {
    input
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_parses_overrides() {
        let args = CliArgs::try_parse_from([
            "rusty-sieve",
            "run",
            "input.xlsx",
            "--output-dir",
            "out",
            "--keep-previous",
            "-v",
        ])
        .unwrap();
        assert!(args.verbose);
        assert_eq!(args.config, PathBuf::from("config.yaml"));

        let mut config = AppConfig::default();
        args.command.apply_overrides(&mut config);
        assert_eq!(config.output.directory, PathBuf::from("out"));
        assert!(!config.output.clean_before_run);
        assert_eq!(
            args.command,
            Command::Run {
                input: Some(PathBuf::from("input.xlsx")),
                output_dir: Some(PathBuf::from("out")),
                keep_previous: true,
                json: false,
            }
        );
    }

    #[test]
    fn no_overrides_keep_config() {
        let args = CliArgs::try_parse_from(["rusty-sieve", "--config", "my.yaml", "clean"]).unwrap();
        assert_eq!(args.config, PathBuf::from("my.yaml"));
        let mut config = AppConfig::default();
        args.command.apply_overrides(&mut config);
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn to_csv_requires_input() {
        assert!(CliArgs::try_parse_from(["rusty-sieve", "to-csv"]).is_err());
        let args = CliArgs::try_parse_from(["rusty-sieve", "to-csv", "book.xlsx"]).unwrap();
        assert!(matches!(args.command, Command::ToCsv { .. }));
    }

    #[test]
    fn init_config_takes_a_path() {
        let args = CliArgs::try_parse_from(["rusty-sieve", "init-config", "conf/app.yaml"]).unwrap();
        assert_eq!(
            args.command,
            Command::InitConfig {
                path: PathBuf::from("conf/app.yaml")
            }
        );
    }
}
