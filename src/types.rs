use crate::constants::*;
use crate::imports::*;
use ::clap::Args;
use ::serde::{Deserialize, Serialize};
use ::std::fmt;

#[derive(Args, Debug)]
pub struct Options {
    /// Run exactly one collection cycle and exit
    #[clap(long)]
    pub once: bool,

    /// Path to the JSON configuration file
    #[clap(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory where the dataset is written (defaults to the platform data directory)
    #[clap(short, long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// URL of the WebDriver server driving the browser
    #[clap(long, value_name = "URL", env = "FARESCRAPE_WEBDRIVER_URL", default_value_t = DEFAULT_WEBDRIVER_URL.to_string())]
    pub webdriver_url: String,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Destination {
    pub origin: String,
    pub destination: String,
    pub origin_code: String,
    pub destination_code: String,
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} → {} ({}-{})", self.origin, self.destination, self.origin_code, self.destination_code)
    }
}

/// The serialized names and field order are the dataset's CSV header and must not
/// change. Unextracted fields are `None` and serialize as empty cells.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FlightRecord {
    #[serde(rename = "date_collecte")]
    pub collected_at: String,
    #[serde(rename = "depart")]
    pub origin: String,
    #[serde(rename = "arrivee")]
    pub destination: String,
    #[serde(rename = "date_depart")]
    pub travel_date: String,
    #[serde(rename = "prix")]
    pub price: Option<f64>,
    #[serde(rename = "compagnie")]
    pub airline: Option<String>,
    #[serde(rename = "heure_depart")]
    pub departure_time: Option<String>,
    #[serde(rename = "heure_arrivee")]
    pub arrival_time: Option<String>,
    #[serde(rename = "duree_vol")]
    pub duration: Option<String>,
    #[serde(rename = "escales")]
    pub stops: Option<String>,
    #[serde(rename = "url_source")]
    pub source_url: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TransferOutcome {
    Completed,
    Failed(String),
    Skipped,
}

#[derive(Debug)]
pub struct RunResult {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: Vec<(Destination, String)>,
    pub records_written: usize,
    pub transfer: TransferOutcome,
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && !matches!(self.transfer, TransferOutcome::Failed(_))
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} attempted, {} succeeded, {} failed, {} records written, transfer {}",
            self.attempted,
            self.succeeded,
            self.failed.len(),
            self.records_written,
            match &self.transfer {
                TransferOutcome::Completed => "completed".to_string(),
                TransferOutcome::Failed(reason) => format!("failed ({})", reason),
                TransferOutcome::Skipped => "skipped".to_string(),
            }
        )
    }
}
