use const_format::concatcp;

use crate::imports::*;
use crate::types::*;

pub const GOOGLE_FLIGHTS_BASE_URL: &str = "https://www.google.com/travel/flights";
pub const GOOGLE_FLIGHTS_SEARCH_URL: &str = concatcp!(GOOGLE_FLIGHTS_BASE_URL, "?hl=fr&curr=EUR");

pub const DATASET_FILENAME: &str = "vols_data.csv";

pub const FLIGHT_CARD_SELECTOR: &str = "[data-testid='flight-card']";

pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

// Times of day are Europe/Paris.
pub const DEFAULT_SCHEDULE_TIMES: &[&str] = &["08:00", "14:00", "20:00"];

pub const DEFAULT_RESULTS_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MIN_DELAY_MS: u64 = 2_000;
pub const DEFAULT_MAX_DELAY_MS: u64 = 6_000;
pub const DEFAULT_MAX_RESULTS_PER_SEARCH: usize = 10;
pub const DEFAULT_MONTHS_AHEAD: u32 = 12;
pub const DEFAULT_CYCLE_BUDGET_MINS: u64 = 120;
pub const DEFAULT_RECOVERY_DELAY_SECS: u64 = 300;
pub const DEFAULT_SFTP_PORT: u16 = 22;

pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
];

pub static DEFAULT_DESTINATIONS: Lazy<Vec<Destination>> = Lazy::new(|| {
    [
        // Europe
        ("Paris", "Londres", "CDG", "LHR"),
        ("Paris", "Berlin", "CDG", "BER"),
        ("Paris", "Rome", "CDG", "FCO"),
        ("Paris", "Madrid", "CDG", "MAD"),
        ("Paris", "Amsterdam", "CDG", "AMS"),
        // North America
        ("Paris", "New York", "CDG", "JFK"),
        ("Paris", "Los Angeles", "CDG", "LAX"),
        ("Paris", "Montreal", "CDG", "YUL"),
        ("Paris", "Toronto", "CDG", "YYZ"),
        // Asia
        ("Paris", "Tokyo", "CDG", "NRT"),
        ("Paris", "Bangkok", "CDG", "BKK"),
        ("Paris", "Singapour", "CDG", "SIN"),
        ("Paris", "Dubai", "CDG", "DXB"),
        // Africa
        ("Paris", "Casablanca", "CDG", "CMN"),
        ("Paris", "Tunis", "CDG", "TUN"),
        ("Paris", "Alger", "CDG", "ALG"),
    ]
    .iter()
    .map(|&(origin, destination, origin_code, destination_code)| Destination {
        origin: origin.to_string(),
        destination: destination.to_string(),
        origin_code: origin_code.to_string(),
        destination_code: destination_code.to_string(),
    })
    .collect()
});
