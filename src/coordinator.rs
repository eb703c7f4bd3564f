use ::std::sync::atomic::{AtomicBool, Ordering};
use ::std::sync::Arc;
use ::tokio::time::Instant;

use crate::config::Config;
use crate::extractor::Extract;
use crate::imports::*;
use crate::sink::CsvSink;
use crate::transfer::Push;
use crate::types::*;
use crate::utils::*;

/// One full collection cycle: every destination in catalog order, then one transfer
/// attempt. A failing destination never halts the cycle.
pub async fn run_cycle<E: Extract, P: Push>(
    config: Arc<Config>,
    extractor: E,
    sink: CsvSink,
    transfer: Option<P>,
    shutdown: Arc<AtomicBool>,
) -> RunResult {
    let started = Instant::now();
    let travel_dates = config.search_dates(today_paris());
    info!("Cycle started: {} destinations, {} travel dates", config.destinations.len(), travel_dates.len());
    let mut succeeded = 0;
    let mut failed: Vec<(Destination, String)> = Vec::new();
    let mut records_written = 0;
    for (index, destination) in config.destinations.iter().enumerate() {
        if shutdown.load(Ordering::SeqCst) {
            // Honor the interrupt after the in-flight extraction, not mid-session.
            warn!("Interrupt received, abandoning {} remaining destinations", config.destinations.len() - index);
            for abandoned in &config.destinations[index..] {
                failed.push((abandoned.clone(), "interrupted".to_string()));
            }
            break;
        }
        if started.elapsed() >= config.cycle_budget {
            // Fail forward: the transfer step still runs with whatever was collected.
            warn!(
                "Cycle budget of {:?} exceeded, abandoning {} remaining destinations",
                config.cycle_budget,
                config.destinations.len() - index
            );
            for abandoned in &config.destinations[index..] {
                failed.push((abandoned.clone(), "cycle budget exceeded".to_string()));
            }
            break;
        }
        if index > 0 {
            sleep_jitter(config.scraping.min_delay_ms, config.scraping.max_delay_ms).await;
        }
        info!("Extracting {}", destination);
        match extractor.extract(destination, &travel_dates).await {
            Ok(records) => match sink.append(&records) {
                Ok(count) => {
                    info!("{}: {} records appended", destination, count);
                    records_written += count;
                    succeeded += 1;
                }
                Err(error) => {
                    error!("{}: sink failure: {}", destination, error);
                    failed.push((destination.clone(), error.to_string()));
                }
            },
            Err(error) => {
                error!("{}: extraction failed: {}", destination, error);
                failed.push((destination.clone(), error.to_string()));
            }
        }
    }
    let transfer = run_transfer(&sink, transfer.as_ref()).await;
    let result =
        RunResult { attempted: config.destinations.len(), succeeded, failed, records_written, transfer };
    info!("Cycle finished in {:?}: {}", started.elapsed(), result);
    result
}

/// Runs whenever a dataset exists on disk, even if this cycle appended nothing, so a
/// transfer that failed last cycle is retried at the next one.
async fn run_transfer<P: Push>(sink: &CsvSink, transfer: Option<&P>) -> TransferOutcome {
    let Some(transfer) = transfer else {
        info!("No remote transfer configured, skipping transfer");
        return TransferOutcome::Skipped;
    };
    if !sink.path().exists() {
        info!("No dataset collected yet, skipping transfer");
        return TransferOutcome::Skipped;
    }
    match transfer.push(&[sink.path().to_path_buf()]).await {
        Ok(()) => {
            info!("Transfer completed");
            TransferOutcome::Completed
        }
        Err(error) => {
            error!("Transfer failed: {}", error);
            TransferOutcome::Failed(error.to_string())
        }
    }
}
