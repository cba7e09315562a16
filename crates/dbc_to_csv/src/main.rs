use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::debug;
use shared::{ConvertConfig, DEFAULT_TEMP_FILE, TextEncoding, dbc_to_csv, describe_dbc};

mod interface;

use interface::Interface;

#[derive(Parser)]
#[command(name = "dbc_to_csv", version)]
#[command(about = "Convert DATASUS .dbc files to CSV", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Where the decompressed DBF is written during a run
    #[arg(long, global = true, env = "DBC2CSV_TEMP_FILE", default_value = DEFAULT_TEMP_FILE)]
    temp_file: PathBuf,

    /// Replace invalid UTF-8 in text fields instead of failing
    #[arg(long, global = true, env = "DBC2CSV_LOSSY")]
    lossy: bool,

    /// Hide the progress bar and status lines
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a DBC file to CSV, appending when the CSV already exists
    #[command(arg_required_else_help = true)]
    DbcToCsv {
        /// The DBC file to read
        dbc_file: PathBuf,
        /// The CSV file to create or append to
        csv_file: PathBuf,
    },
    /// Print the fields and row count of a DBC file
    #[command(arg_required_else_help = true)]
    Describe {
        /// The DBC file to read
        dbc_file: PathBuf,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    fn config(&self) -> ConvertConfig {
        ConvertConfig {
            temp_path: self.temp_file.clone(),
            encoding: if self.lossy {
                TextEncoding::Utf8Lossy
            } else {
                TextEncoding::Utf8
            },
            show_progress: !self.quiet,
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = cli.config();
    let interface = Interface::new(!cli.quiet);
    debug!("Using {:?}", config);

    let result = match &cli.command {
        Commands::DbcToCsv { dbc_file, csv_file } => {
            run_convert(&interface, &config, dbc_file, csv_file)
        }
        Commands::Describe { dbc_file, json } => run_describe(&interface, &config, dbc_file, *json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            interface.error("Failed", &e);
            ExitCode::FAILURE
        }
    }
}

fn run_convert(
    interface: &Interface,
    config: &ConvertConfig,
    dbc_file: &Path,
    csv_file: &Path,
) -> Result<()> {
    interface.status(
        "Converting",
        &format!("{} -> {}", dbc_file.display(), csv_file.display()),
    );

    let summary = dbc_to_csv(dbc_file, csv_file, config)
        .with_context(|| format!("converting {}", dbc_file.display()))?;

    interface.export_convert_summary(&summary);
    Ok(())
}

fn run_describe(
    interface: &Interface,
    config: &ConvertConfig,
    dbc_file: &Path,
    json: bool,
) -> Result<()> {
    let summary = describe_dbc(dbc_file, config)
        .with_context(|| format!("describing {}", dbc_file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        interface.export_file_summary(&summary, &dbc_file.display().to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_convert_defaults() {
        let cli = Cli::try_parse_from(["dbc_to_csv", "dbc-to-csv", "in.dbc", "out.csv"]).unwrap();
        match &cli.command {
            Commands::DbcToCsv { dbc_file, csv_file } => {
                assert_eq!(dbc_file, &PathBuf::from("in.dbc"));
                assert_eq!(csv_file, &PathBuf::from("out.csv"));
            }
            _ => panic!("expected dbc-to-csv"),
        }

        let config = cli.config();
        assert_eq!(config.encoding, TextEncoding::Utf8);
        assert!(config.show_progress);
    }

    #[test]
    fn test_parse_global_options() {
        let cli = Cli::try_parse_from([
            "dbc_to_csv",
            "dbc-to-csv",
            "in.dbc",
            "out.csv",
            "--lossy",
            "-q",
            "--temp-file",
            "/tmp/other.dbf",
        ])
        .unwrap();

        let config = cli.config();
        assert_eq!(config.encoding, TextEncoding::Utf8Lossy);
        assert!(!config.show_progress);
        assert_eq!(config.temp_path, PathBuf::from("/tmp/other.dbf"));
    }

    #[test]
    fn test_parse_requires_both_paths() {
        assert!(Cli::try_parse_from(["dbc_to_csv", "dbc-to-csv", "in.dbc"]).is_err());
    }

    #[test]
    fn test_parse_describe() {
        let cli = Cli::try_parse_from(["dbc_to_csv", "describe", "in.dbc", "--json"]).unwrap();
        assert!(matches!(cli.command, Commands::Describe { json: true, .. }));
    }
}
