use ::std::sync::atomic::{AtomicBool, Ordering};
use ::std::sync::Arc;
use ::time::PrimitiveDateTime;
use ::tokio::signal;
use ::tokio::task::JoinError;

use crate::browser::WebDriverProvider;
use crate::config::Config;
use crate::coordinator::run_cycle;
use crate::extractor::GoogleFlightsExtractor;
use crate::imports::*;
use crate::sink::CsvSink;
use crate::transfer::SftpTransfer;
use crate::types::RunResult;
use crate::utils::*;

pub async fn run_once(config: Arc<Config>) -> RunResult {
    collection_cycle(config, Arc::new(AtomicBool::new(false))).await
}

/// Cycles never overlap: a trigger that arrives while a cycle is still running is
/// deferred until that cycle finishes, then fires immediately.
pub async fn run_scheduler(config: Arc<Config>) -> Result<()> {
    info!(
        "Scheduler started, collecting at {}",
        config.schedule_times.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(", ")
    );
    // One collection runs immediately at startup.
    let mut last_trigger = now_paris();
    if matches!(supervised_cycle(&config).await, CycleEnd::Interrupted) {
        info!("Scheduler stopped");
        return Ok(());
    }
    loop {
        let next = next_trigger(&config.schedule_times, last_trigger);
        let now = now_paris();
        if next > now {
            info!("Next collection at {}", format_timestamp(next));
            tokio::select! {
                _ = tokio::time::sleep((next - now).unsigned_abs()) => {}
                _ = signal::ctrl_c() => {
                    info!("Interrupt received, scheduler stopped");
                    return Ok(());
                }
            }
        } else {
            info!("Trigger {} was deferred by the previous cycle, running now", format_timestamp(next));
        }
        last_trigger = next;
        if matches!(supervised_cycle(&config).await, CycleEnd::Interrupted) {
            info!("Scheduler stopped");
            return Ok(());
        }
    }
}

enum CycleEnd {
    Continue,
    Interrupted,
}

/// The cycle runs in its own task so an unhandled error is caught here instead of
/// taking down the long-running process.
async fn supervised_cycle(config: &Arc<Config>) -> CycleEnd {
    let shutdown = Arc::new(AtomicBool::new(false));
    let mut handle = tokio::spawn(collection_cycle(config.clone(), shutdown.clone()));
    tokio::select! {
        outcome = &mut handle => {
            if recover_from_crash(&outcome) {
                tokio::time::sleep(config.recovery_delay).await;
            }
            CycleEnd::Continue
        }
        _ = signal::ctrl_c() => {
            info!("Interrupt received, finishing the current extraction before exiting");
            shutdown.store(true, Ordering::SeqCst);
            let outcome = handle.await;
            recover_from_crash(&outcome);
            CycleEnd::Interrupted
        }
    }
}

fn recover_from_crash(outcome: &Result<RunResult, JoinError>) -> bool {
    match outcome {
        Ok(_) => false,
        Err(join_error) => {
            error!("Cycle crashed with an unhandled error, scheduler continues: {}", join_error);
            true
        }
    }
}

async fn collection_cycle(config: Arc<Config>, shutdown: Arc<AtomicBool>) -> RunResult {
    let extractor =
        GoogleFlightsExtractor::new(WebDriverProvider::new(&config.webdriver_url), config.scraping.clone());
    let sink = CsvSink::new(config.dataset_path());
    let transfer = config.sftp.clone().map(SftpTransfer::new);
    run_cycle(config, extractor, sink, transfer, shutdown).await
}

/// The earliest scheduled instant strictly after `after`. Candidates are Paris
/// wall-clock times, so the trigger stays on the configured local time across DST
/// transitions.
pub fn next_trigger(schedule_times: &[Time], after: OffsetDateTime) -> OffsetDateTime {
    (0..=2)
        .flat_map(|days| {
            let date = after
                .to_timezone(timezones::db::europe::PARIS)
                .date()
                .saturating_add(time::Duration::days(days));
            schedule_times.iter().filter_map(move |&t| paris_wall_clock(date, t))
        })
        .filter(|&candidate| candidate > after)
        .min()
        .expect("schedule has at least one time of day")
}

/// The instant at which the Paris wall clock reads the given date and time. `None` for
/// times skipped by a spring-forward transition; the post-transition occurrence for
/// times that happen twice.
fn paris_wall_clock(date: Date, time: Time) -> Option<OffsetDateTime> {
    let wall = PrimitiveDateTime::new(date, time);
    let mut offset = wall.assume_utc().to_timezone(timezones::db::europe::PARIS).offset();
    for _ in 0..2 {
        let candidate = wall.assume_offset(offset);
        let local = candidate.to_timezone(timezones::db::europe::PARIS);
        if local.date() == date && local.time() == time {
            return Some(candidate);
        }
        offset = local.offset();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime, time};

    const SCHEDULE: &[Time] = &[time!(8:00), time!(14:00), time!(20:00)];

    #[test]
    fn test_next_trigger_same_day() {
        assert_eq!(
            next_trigger(SCHEDULE, datetime!(2026-08-23 07:15 +02:00)),
            datetime!(2026-08-23 08:00 +02:00)
        );
        assert_eq!(
            next_trigger(SCHEDULE, datetime!(2026-08-23 09:30 +02:00)),
            datetime!(2026-08-23 14:00 +02:00)
        );
    }

    #[test]
    fn test_next_trigger_is_strictly_after() {
        assert_eq!(
            next_trigger(SCHEDULE, datetime!(2026-08-23 08:00 +02:00)),
            datetime!(2026-08-23 14:00 +02:00)
        );
    }

    #[test]
    fn test_next_trigger_rolls_over_to_next_day() {
        assert_eq!(
            next_trigger(SCHEDULE, datetime!(2026-08-23 20:00 +02:00)),
            datetime!(2026-08-24 08:00 +02:00)
        );
        assert_eq!(
            next_trigger(SCHEDULE, datetime!(2026-08-23 23:59 +02:00)),
            datetime!(2026-08-24 08:00 +02:00)
        );
    }

    #[test]
    fn test_deferred_trigger_computed_from_last_trigger_not_now() {
        // A cycle triggered at 08:00 that ran past 14:00 must still yield the 14:00
        // trigger so the deferred cycle runs immediately after the previous one.
        let deferred = next_trigger(SCHEDULE, datetime!(2026-08-23 08:00 +02:00));
        assert_eq!(deferred, datetime!(2026-08-23 14:00 +02:00));
        assert!(deferred < datetime!(2026-08-23 15:27 +02:00));
    }

    #[test]
    fn test_single_time_schedule_advances_a_full_day() {
        assert_eq!(
            next_trigger(&[time!(12:00)], datetime!(2026-08-23 12:00 +02:00)),
            datetime!(2026-08-24 12:00 +02:00)
        );
    }

    #[test]
    fn test_trigger_tracks_local_time_across_fall_back() {
        // Paris leaves DST on 2026-10-25; the 08:00 trigger must land on 08:00 local
        // (+01:00), not on the previous trigger's +02:00 offset.
        assert_eq!(
            next_trigger(SCHEDULE, datetime!(2026-10-24 20:00 +02:00)),
            datetime!(2026-10-25 08:00 +01:00)
        );
    }

    #[test]
    fn test_trigger_skipped_by_spring_forward_gap() {
        // Paris enters DST on 2027-03-28; 02:30 does not exist on that day, so the
        // next occurrence is the following day at the new offset.
        assert_eq!(
            next_trigger(&[time!(2:30)], datetime!(2027-03-27 03:00 +01:00)),
            datetime!(2027-03-29 02:30 +02:00)
        );
    }

    #[test]
    fn test_paris_wall_clock_offsets() {
        assert_eq!(paris_wall_clock(date!(2026 - 08 - 23), time!(8:00)), Some(datetime!(2026-08-23 08:00 +02:00)));
        assert_eq!(paris_wall_clock(date!(2027 - 01 - 15), time!(8:00)), Some(datetime!(2027-01-15 08:00 +01:00)));
        assert_eq!(paris_wall_clock(date!(2027 - 03 - 28), time!(2:30)), None);
    }
}
