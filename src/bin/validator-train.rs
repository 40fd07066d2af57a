//! Train the validator classifier on a labelled CSV and save it as JSON.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "validator-train")]
#[command(about = "Fit a gradient-boosted validator model on a labelled CSV")]
#[command(version)]
struct Cli {
    /// CSV with f*-prefixed feature columns and a 0/1 `label` column
    #[arg(long)]
    data: PathBuf,

    /// Where to write the model file
    #[arg(long)]
    out: PathBuf,

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

#[cfg(feature = "training")]
fn run(cli: Cli) -> Result<(), String> {
    use validator_pipeline::training::{TrainRequest, train_file};
    use validator_pipeline::{config, logging};

    let settings = config::load(cli.config.as_deref()).map_err(|err| err.to_string())?;
    if let Err(err) = logging::init(&settings.logging) {
        eprintln!("Logging disabled: {err}");
    }
    let request = TrainRequest {
        data_path: cli.data,
        out_path: cli.out,
        settings: settings.train,
    };
    let report = train_file(&request).map_err(|err| err.to_string())?;
    println!("Model trained and saved to {}", report.out_path.display());
    if let Some(auc) = report.auc {
        println!("Test AUC: {auc}");
    }
    Ok(())
}

#[cfg(not(feature = "training"))]
fn run(_cli: Cli) -> Result<(), String> {
    Err("Training support is not compiled in. Rebuild with `--features training` to run training.".into())
}
