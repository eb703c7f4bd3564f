mod browser;
mod config;
mod constants;
mod coordinator;
mod errors;
mod extractor;
mod imports;
mod macros;
mod scheduler;
mod sink;
mod transfer;
mod types;
mod utils;

use clap::Parser;
use directories::ProjectDirs;
use std::env;
use std::process;
use std::sync::Arc;

use crate::config::Config;
use crate::imports::*;
use crate::scheduler::{run_once, run_scheduler};
use crate::types::Options;

#[derive(Parser, Debug)]
pub struct CliArgs {
    /// Logging verbosity level (valid values: off, error, warn, info, debug, trace)
    #[clap(short, long, value_name = "LEVEL", default_value = "info")]
    verbosity: log::LevelFilter,

    #[clap(flatten)]
    options: Options,
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let cli_args = CliArgs::parse();
    if env::var(env_logger::DEFAULT_FILTER_ENV).is_ok() {
        env_logger::init();
    } else {
        env_logger::builder()
            .filter(Some(env!("CARGO_PKG_NAME")), cli_args.verbosity)
            .format_timestamp(None)
            .format_target(false)
            .init();
    }
    let inner = async {
        let project_dirs = ProjectDirs::from("io", "farescrape", env!("CARGO_PKG_NAME"))
            .ok_or_else(|| anyhow!("Could not get project directories"))?;
        let config = Arc::new(Config::load(&cli_args.options, project_dirs.data_local_dir())?);
        if cli_args.options.once {
            let result = run_once(config).await;
            if !result.is_success() {
                warn!("Cycle finished with failures: {}", result);
                process::exit(1);
            }
        } else {
            run_scheduler(config).await?;
        }
        Ok(()) as Result<()>
    };
    if let Err(error) = inner.await {
        error!("{:?}", error);
        process::exit(1);
    }
}
