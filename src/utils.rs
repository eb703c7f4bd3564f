use rand::Rng;
use time::format_description::FormatItem;

use crate::imports::*;
use crate::macros::*;

const ISO8601_DATE_FORMAT: &[FormatItem] = format_description!("[year]-[month]-[day]");
const TIMESTAMP_FORMAT: &[FormatItem] = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

pub fn now_paris() -> OffsetDateTime {
    OffsetDateTime::now_utc().to_timezone(timezones::db::europe::PARIS)
}

pub fn today_paris() -> Date {
    now_paris().date()
}

pub fn format_iso8601_date(date: Date) -> String {
    date.format(ISO8601_DATE_FORMAT).expect("iso8601 date to format")
}

pub fn format_timestamp(datetime: OffsetDateTime) -> String {
    datetime.format(TIMESTAMP_FORMAT).expect("timestamp to format")
}

pub fn parse_time_of_day(input: &str) -> Result<Time> {
    let inner = || {
        let mut parts = input.split(':');
        let hour: u8 = parts.next().ok_or_else(|| anyhow!("Missing hour"))?.parse()?;
        let minute: u8 = parts.next().ok_or_else(|| anyhow!("Missing minute"))?.parse()?;
        ensure!(parts.next().is_none(), "Should have only two parts separated by ':'");
        Ok(Time::from_hms(hour, minute, 0)?) as Result<_>
    };
    inner().with_context(|| format!("Invalid time of day (expect HH:MM): {:?}", input))
}

pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned: String = text.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

pub async fn sleep_jitter(min_ms: u64, max_ms: u64) {
    let ms = if max_ms > min_ms { rand::thread_rng().gen_range(min_ms..=max_ms) } else { min_ms };
    tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
}

pub fn clean_text(text: &str) -> String {
    regex!(r"\s+").replace_all(text, " ").trim().to_string()
}
