//! Copy a trained model artifact into its deployment location.

use std::path::PathBuf;

use clap::Parser;
use validator_pipeline::{config, deploy::deploy_artifact, logging};

#[derive(Debug, Parser)]
#[command(name = "validator-deploy")]
#[command(about = "Copy a model artifact to its deployment path")]
#[command(version)]
struct Cli {
    /// Model file to copy
    #[arg(long)]
    src: PathBuf,

    /// Destination file, or an existing directory to copy into
    #[arg(long)]
    dest: PathBuf,

    /// Settings file (defaults to config.toml in the application directory)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
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
    let report = deploy_artifact(&cli.src, &cli.dest).map_err(|err| err.to_string())?;
    println!("Copied {} to {}", report.src.display(), report.dest.display());
    Ok(())
}
