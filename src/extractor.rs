use ::scraper::{ElementRef, Html, Selector};
use ::std::time::Duration;

use crate::browser::*;
use crate::config::ScrapeConfig;
use crate::constants::*;
use crate::errors::ExtractionError;
use crate::imports::*;
use crate::macros::*;
use crate::types::*;
use crate::utils::*;

/// Extraction seam used by the run coordinator.
#[allow(async_fn_in_trait)]
pub trait Extract: Send + Sync {
    async fn extract(
        &self,
        destination: &Destination,
        travel_dates: &[Date],
    ) -> Result<Vec<FlightRecord>, ExtractionError>;
}

pub struct GoogleFlightsExtractor<P> {
    provider: P,
    scraping: ScrapeConfig,
}

impl<P: BrowserProvider> GoogleFlightsExtractor<P> {
    pub fn new(provider: P, scraping: ScrapeConfig) -> GoogleFlightsExtractor<P> {
        GoogleFlightsExtractor { provider, scraping }
    }

    /// A failing travel date is skipped; the destination fails only when every date
    /// failed.
    async fn extract_with(
        &self,
        browser: &P::Session,
        destination: &Destination,
        travel_dates: &[Date],
    ) -> Result<Vec<FlightRecord>, ExtractionError> {
        let mut records = Vec::new();
        let mut last_error = None;
        for &travel_date in travel_dates {
            match self.extract_date(browser, destination, travel_date).await {
                Ok(parsed) => {
                    let date = format_iso8601_date(travel_date);
                    debug!("Parsed {} listings for {} on {}", parsed.len(), destination, date);
                    records.extend(parsed);
                }
                Err(error @ ExtractionError::Session(_)) => {
                    // The session is gone; the remaining dates cannot be queried.
                    if records.is_empty() {
                        return Err(error);
                    }
                    warn!("{}: session lost, keeping {} records: {}", destination, records.len(), error);
                    return Ok(records);
                }
                Err(error) => {
                    warn!("{} on {}: {}", destination, format_iso8601_date(travel_date), error);
                    last_error = Some(error);
                }
            }
        }
        match last_error {
            Some(error) if records.is_empty() => Err(error),
            _ => Ok(records),
        }
    }

    async fn extract_date(
        &self,
        browser: &P::Session,
        destination: &Destination,
        travel_date: Date,
    ) -> Result<Vec<FlightRecord>, ExtractionError> {
        let timeout_secs = self.scraping.results_timeout_secs;
        let url = build_search_url(destination, travel_date);
        debug!("Navigating to {:?}", url);
        browser.navigate(&url).await.map_err(session_failure)?;
        sleep_jitter(self.scraping.min_delay_ms, self.scraping.max_delay_ms).await;
        let ready = browser
            .wait_for(FLIGHT_CARD_SELECTOR, Duration::from_secs(timeout_secs))
            .await
            .map_err(session_failure)?;
        let html = browser.page_html().await.map_err(session_failure)?;
        if !ready {
            return Err(classify_unready_page(&html, &url, timeout_secs));
        }
        parse_results(
            &html,
            destination,
            travel_date,
            &url,
            &format_timestamp(now_paris()),
            self.scraping.max_results_per_search,
        )
    }
}

impl<P: BrowserProvider> Extract for GoogleFlightsExtractor<P> {
    async fn extract(
        &self,
        destination: &Destination,
        travel_dates: &[Date],
    ) -> Result<Vec<FlightRecord>, ExtractionError> {
        let browser = self.provider.acquire().await.map_err(session_failure)?;
        // The session is scoped to this call: released on every exit path.
        let result = self.extract_with(&browser, destination, travel_dates).await;
        if let Err(error) = browser.close().await {
            warn!("Failed to release browser session: {:#}", error);
        }
        result
    }
}

fn session_failure(error: anyhow::Error) -> ExtractionError {
    ExtractionError::Session(format!("{:#}", error))
}

pub fn build_search_url(destination: &Destination, travel_date: Date) -> String {
    format!(
        "{}&tfs={}_{}_{}",
        GOOGLE_FLIGHTS_SEARCH_URL,
        destination.origin_code,
        destination.destination_code,
        format_iso8601_date(travel_date)
    )
}

/// Classify a results view that never became ready within the timeout.
fn classify_unready_page(html: &str, url: &str, timeout_secs: u64) -> ExtractionError {
    if regex!(r"(?i)unusual traffic|captcha|trafic inhabituel|not a robot").is_match(html) {
        ExtractionError::Blocked { url: url.to_string() }
    } else if regex!(r"(?i)aucun vol|no flights|aucun résultat").is_match(html) {
        ExtractionError::NoResults { url: url.to_string() }
    } else {
        ExtractionError::Timeout { url: url.to_string(), timeout_secs }
    }
}

/// Listings with unparseable fields are retained with those fields unset, not dropped.
fn parse_results(
    html: &str,
    destination: &Destination,
    travel_date: Date,
    url: &str,
    collected_at: &str,
    max_results: usize,
) -> Result<Vec<FlightRecord>, ExtractionError> {
    let document = Html::parse_document(html);
    let cards: Vec<ElementRef> = document.select(selector!(FLIGHT_CARD_SELECTOR)).collect();
    if cards.is_empty() {
        return Err(ExtractionError::ParseFailure(format!(
            "results view was ready but no listings were found in the page source for {}",
            url
        )));
    }
    Ok(cards
        .iter()
        .take(max_results)
        .map(|card| parse_card(card, destination, travel_date, url, collected_at))
        .collect())
}

fn parse_card(
    card: &ElementRef,
    destination: &Destination,
    travel_date: Date,
    url: &str,
    collected_at: &str,
) -> FlightRecord {
    let times: Vec<String> = card
        .select(selector!("[data-testid='departure-time'], [data-testid='arrival-time']"))
        .map(|elem| element_text(&elem))
        .filter(|text| !text.is_empty())
        .collect();
    FlightRecord {
        collected_at: collected_at.to_string(),
        origin: destination.origin.clone(),
        destination: destination.destination.clone(),
        travel_date: format_iso8601_date(travel_date),
        price: card_text(card, selector!("[data-testid='price']")).and_then(|text| parse_price(&text)),
        airline: card_text(card, selector!("[data-testid='airline']")),
        departure_time: times.first().cloned(),
        arrival_time: times.get(1).cloned(),
        duration: card_text(card, selector!("[data-testid='duration']")),
        stops: card_text(card, selector!("[data-testid='stops']")),
        source_url: url.to_string(),
    }
}

fn card_text(card: &ElementRef, selector: &Selector) -> Option<String> {
    card.select(selector).map(|elem| element_text(&elem)).find(|text| !text.is_empty())
}

fn element_text(elem: &ElementRef) -> String {
    clean_text(&elem.text().collect::<Vec<_>>().join(" "))
}
