//! meme-sorter - analyze a folder of memes and archive the interesting ones.

use clap::Parser;
use meme_sorter_lib::{AppConfig, ConfigFile};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "meme-sorter", version, about)]
struct Cli {
    /// Folder of images to analyze (or a single image)
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Folder that receives copies of detected memes
    #[arg(short, long)]
    dest: Option<PathBuf>,

    /// Where to write the JSON results
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML config file; flags override its paths
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "meme_sorter=debug,meme_sorter_lib=debug"
    } else {
        "meme_sorter=info,meme_sorter_lib=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let file = match cli.config.as_deref().map(ConfigFile::load).transpose() {
        Ok(file) => file.unwrap_or_default(),
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let config = match AppConfig::resolve(file, cli.source, cli.dest, cli.output) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match meme_sorter_lib::run(&config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Error during meme analysis ({}): {}", e.kind, e);
            ExitCode::FAILURE
        }
    }
}
