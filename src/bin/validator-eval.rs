//! Print the first few scores a saved model assigns to rows of a CSV.

use std::path::PathBuf;

use clap::Parser;
use clap::error::ErrorKind;
use validator_pipeline::{config, evaluate::evaluate_file, logging};

const USAGE: &str = "Usage: validator-eval <model.json> <data.csv>";

#[derive(Debug, Parser)]
#[command(name = "validator-eval")]
#[command(about = "Score a CSV with a saved model and print the first rows")]
#[command(version)]
struct Cli {
    /// Model file written by validator-train
    model_path: PathBuf,

    /// CSV with a header row and f*-prefixed feature columns
    data_path: PathBuf,

    /// Extra arguments are accepted and ignored
    #[arg(hide = true)]
    extra: Vec<String>,

    /// Settings file (defaults to config.toml in the application directory)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(_) => {
            println!("{USAGE}");
            std::process::exit(1);
        }
    };
    if let Err(err) = run(cli) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let settings = config::load(cli.config.as_deref()).map_err(|err| err.to_string())?;
    if let Err(err) = logging::init(&settings.logging) {
        eprintln!("Logging disabled: {err}");
    }
    if !cli.extra.is_empty() {
        tracing::debug!(extra = ?cli.extra, "Ignoring extra arguments");
    }
    let report = evaluate_file(
        &cli.model_path,
        &cli.data_path,
        settings.evaluate.preview_rows,
    )
    .map_err(|err| err.to_string())?;
    println!("{report}");
    Ok(())
}
