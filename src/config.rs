use ::serde::Deserialize;
use ::std::env;

use crate::constants::*;
use crate::imports::*;
use crate::types::*;
use crate::utils::*;

pub const SFTP_PASSWORD_ENV: &str = "FARESCRAPE_SFTP_PASSWORD";

#[derive(Clone, Debug, Deserialize)]
pub struct SftpConfig {
    pub host: String,
    #[serde(default = "default_sftp_port")]
    pub port: u16,
    pub username: String,
    /// May be omitted from the file and supplied via `FARESCRAPE_SFTP_PASSWORD` instead.
    #[serde(default)]
    pub password: Option<String>,
    pub remote_dir: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub results_timeout_secs: u64,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub max_results_per_search: usize,
    pub months_ahead: u32,
}

impl Default for ScrapeConfig {
    fn default() -> ScrapeConfig {
        ScrapeConfig {
            results_timeout_secs: DEFAULT_RESULTS_TIMEOUT_SECS,
            min_delay_ms: DEFAULT_MIN_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            max_results_per_search: DEFAULT_MAX_RESULTS_PER_SEARCH,
            months_ahead: DEFAULT_MONTHS_AHEAD,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default = "default_destinations")]
    destinations: Vec<Destination>,
    #[serde(default = "default_schedule_times")]
    schedule_times: Vec<String>,
    #[serde(default)]
    scraping: ScrapeConfig,
    #[serde(default = "default_cycle_budget_mins")]
    cycle_budget_mins: u64,
    #[serde(default = "default_recovery_delay_secs")]
    recovery_delay_secs: u64,
    #[serde(default)]
    sftp: Option<SftpConfig>,
}

impl Default for RawConfig {
    fn default() -> RawConfig {
        RawConfig {
            destinations: default_destinations(),
            schedule_times: default_schedule_times(),
            scraping: ScrapeConfig::default(),
            cycle_budget_mins: default_cycle_budget_mins(),
            recovery_delay_secs: default_recovery_delay_secs(),
            sftp: None,
        }
    }
}

fn default_destinations() -> Vec<Destination> {
    DEFAULT_DESTINATIONS.clone()
}

fn default_schedule_times() -> Vec<String> {
    DEFAULT_SCHEDULE_TIMES.iter().map(|s| s.to_string()).collect()
}

fn default_cycle_budget_mins() -> u64 {
    DEFAULT_CYCLE_BUDGET_MINS
}

fn default_recovery_delay_secs() -> u64 {
    DEFAULT_RECOVERY_DELAY_SECS
}

fn default_sftp_port() -> u16 {
    DEFAULT_SFTP_PORT
}

#[derive(Debug)]
pub struct Config {
    pub destinations: Vec<Destination>,
    pub schedule_times: Vec<Time>,
    pub scraping: ScrapeConfig,
    pub cycle_budget: std::time::Duration,
    pub recovery_delay: std::time::Duration,
    pub sftp: Option<SftpConfig>,
    pub data_dir: PathBuf,
    pub webdriver_url: String,
}

impl Config {
    pub fn load(options: &Options, default_data_dir: &Path) -> Result<Config> {
        let raw = match &options.config {
            Some(path) => {
                let contents =
                    fs::read_to_string(path).with_context(|| format!("Failed to read config file: {:?}", path))?;
                serde_json::from_str::<RawConfig>(&contents)
                    .with_context(|| format!("Failed to parse config file: {:?}", path))?
            }
            None => RawConfig::default(),
        };
        Config::from_raw(raw, options, default_data_dir)
    }

    fn from_raw(raw: RawConfig, options: &Options, default_data_dir: &Path) -> Result<Config> {
        ensure!(!raw.destinations.is_empty(), "Destination catalog must not be empty");
        ensure!(!raw.schedule_times.is_empty(), "Schedule must have at least one time of day");
        ensure!(
            raw.scraping.min_delay_ms <= raw.scraping.max_delay_ms,
            "min_delay_ms must not exceed max_delay_ms"
        );
        let schedule_times =
            raw.schedule_times.iter().map(|s| parse_time_of_day(s)).collect::<Result<Vec<Time>>>()?;
        let sftp = match raw.sftp {
            Some(mut sftp) => {
                if let Ok(password) = env::var(SFTP_PASSWORD_ENV) {
                    sftp.password = Some(password);
                }
                ensure!(
                    sftp.password.is_some(),
                    "SFTP is configured but no password was given (set {} or the config file's sftp.password)",
                    SFTP_PASSWORD_ENV
                );
                Some(sftp)
            }
            None => None,
        };
        Ok(Config {
            destinations: raw.destinations,
            schedule_times,
            scraping: raw.scraping,
            cycle_budget: std::time::Duration::from_secs(raw.cycle_budget_mins * 60),
            recovery_delay: std::time::Duration::from_secs(raw.recovery_delay_secs),
            sftp,
            data_dir: options.data_dir.clone().unwrap_or_else(|| default_data_dir.to_path_buf()),
            webdriver_url: options.webdriver_url.clone(),
        })
    }

    pub fn dataset_path(&self) -> PathBuf {
        self.data_dir.join(DATASET_FILENAME)
    }

    /// One travel date roughly per month over the configured horizon.
    pub fn search_dates(&self, today: Date) -> Vec<Date> {
        (1..=self.scraping.months_ahead)
            .filter_map(|month| today.checked_add(time::Duration::days(30 * i64::from(month))))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, time};

    fn test_options() -> Options {
        Options { once: true, config: None, data_dir: None, webdriver_url: DEFAULT_WEBDRIVER_URL.to_string() }
    }

    #[test]
    fn test_defaults_without_config_file() -> Result<()> {
        let config = Config::from_raw(RawConfig::default(), &test_options(), Path::new("/tmp/data"))?;
        assert_eq!(config.destinations.len(), 16);
        assert_eq!(config.schedule_times, vec![time!(8:00), time!(14:00), time!(20:00)]);
        assert_eq!(config.scraping.max_results_per_search, 10);
        assert!(config.sftp.is_none());
        assert_eq!(config.dataset_path(), PathBuf::from("/tmp/data/vols_data.csv"));
        Ok(())
    }

    #[test]
    fn test_parse_config_file_overrides() -> Result<()> {
        let raw: RawConfig = serde_json::from_str(
            r#"{
                "destinations": [
                    {"origin": "Paris", "destination": "Londres", "origin_code": "CDG", "destination_code": "LHR"}
                ],
                "schedule_times": ["06:30"],
                "scraping": {"months_ahead": 2},
                "sftp": {"host": "example.org", "username": "pi", "password": "s3cret", "remote_dir": "/srv/vols"}
            }"#,
        )?;
        let config = Config::from_raw(raw, &test_options(), Path::new("/tmp/data"))?;
        assert_eq!(config.destinations.len(), 1);
        assert_eq!(config.schedule_times, vec![time!(6:30)]);
        assert_eq!(config.scraping.months_ahead, 2);
        assert_eq!(config.scraping.max_results_per_search, 10);
        let sftp = config.sftp.expect("sftp config");
        assert_eq!(sftp.port, 22);
        assert_eq!(sftp.remote_dir, "/srv/vols");
        Ok(())
    }

    #[test]
    fn test_invalid_schedule_time_is_rejected() {
        let raw: RawConfig = serde_json::from_str(r#"{"schedule_times": ["8h00"]}"#).unwrap();
        assert!(Config::from_raw(raw, &test_options(), Path::new("/tmp/data")).is_err());
    }

    #[test]
    fn test_empty_catalog_is_rejected() {
        let raw: RawConfig = serde_json::from_str(r#"{"destinations": []}"#).unwrap();
        assert!(Config::from_raw(raw, &test_options(), Path::new("/tmp/data")).is_err());
    }

    #[test]
    fn test_search_dates_are_monthly_and_ascending() {
        let mut raw = RawConfig::default();
        raw.scraping.months_ahead = 3;
        let config = Config::from_raw(raw, &test_options(), Path::new("/tmp/data")).unwrap();
        let dates = config.search_dates(date!(2026 - 01 - 15));
        assert_eq!(dates, vec![date!(2026 - 02 - 14), date!(2026 - 03 - 16), date!(2026 - 04 - 15)]);
    }
}
