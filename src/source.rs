use crate::config::FetchConfig;
use crate::types::PricePoint;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::{io::ErrorKind, path::PathBuf, thread, time::Duration};
use thiserror::Error;

/// Failure to obtain a price series for a single ticker.
///
/// None of these abort a batch: the affected ticker is reported with
/// undefined statistics and the remaining tickers proceed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no data for {ticker} in the requested range")]
    DataUnavailable { ticker: String },

    #[error("transport failure for {ticker}: {reason}")]
    Transport { ticker: String, reason: String },

    #[error("malformed price data for {ticker}: {reason}")]
    Parse { ticker: String, reason: String },
}

/// Provider of historical daily adjusted-close prices.
pub trait PriceSource: Send + Sync {
    /// Fetch the price history of `ticker` between `start` and `end`
    /// (inclusive), ascending by date.
    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, FetchError>;
}

/// Remote CSV endpoint queried over HTTP, stooq-style:
/// `{base_url}?s={ticker}&d1={start}&d2={end}&i=d`.
///
/// Transport failures are retried with a bounded attempt count and a
/// doubling backoff.
pub struct HttpSource {
    client: reqwest::blocking::Client,
    base_url: String,
    max_attempts: usize,
    backoff: Duration,
}

impl HttpSource {
    pub fn new(cfg: &FetchConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: cfg.base_url.clone(),
            max_attempts: cfg.max_attempts,
            backoff: Duration::from_millis(cfg.backoff_ms),
        })
    }

    fn get_with_retry(&self, ticker: &str, url: &str) -> Result<String, FetchError> {
        let mut delay = self.backoff;
        let mut last_reason = String::new();

        for attempt in 1..=self.max_attempts {
            match self.try_get(url) {
                Ok(body) => return Ok(body),
                Err(reason) => {
                    last_reason = reason;
                    if attempt < self.max_attempts {
                        log::warn!(
                            "attempt {attempt}/{} for {ticker} failed: {last_reason}; retrying in {delay:?}",
                            self.max_attempts
                        );
                        thread::sleep(delay);
                        delay *= 2;
                    }
                }
            }
        }

        Err(FetchError::Transport {
            ticker: ticker.to_string(),
            reason: last_reason,
        })
    }

    fn try_get(&self, url: &str) -> Result<String, String> {
        let response = self.client.get(url).send().map_err(|e| e.to_string())?;
        let response = response.error_for_status().map_err(|e| e.to_string())?;
        response.text().map_err(|e| e.to_string())
    }
}

impl PriceSource for HttpSource {
    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, FetchError> {
        let url = format!(
            "{}?s={}&d1={}&d2={}&i=d",
            self.base_url,
            ticker.to_lowercase(),
            start.format("%Y%m%d"),
            end.format("%Y%m%d"),
        );

        let body = self.get_with_retry(ticker, &url)?;
        let series = parse_price_csv(ticker, body.as_bytes())?;
        if series.is_empty() {
            return Err(FetchError::DataUnavailable {
                ticker: ticker.to_string(),
            });
        }
        Ok(series)
    }
}

/// Directory of per-ticker CSV files (`{dir}/{ticker}.csv`) with the same
/// schema as the remote endpoint. Used for offline runs and tests.
pub struct CsvDirSource {
    dir: PathBuf,
}

impl CsvDirSource {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }
}

impl PriceSource for CsvDirSource {
    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, FetchError> {
        let file = self.dir.join(format!("{ticker}.csv"));
        let data = std::fs::read(&file).map_err(|error| match error.kind() {
            ErrorKind::NotFound => FetchError::DataUnavailable {
                ticker: ticker.to_string(),
            },
            _ => FetchError::Transport {
                ticker: ticker.to_string(),
                reason: format!("failed to read {file:?}: {error}"),
            },
        })?;

        let mut series = parse_price_csv(ticker, &data)?;
        series.retain(|point| point.date >= start && point.date <= end);
        if series.is_empty() {
            return Err(FetchError::DataUnavailable {
                ticker: ticker.to_string(),
            });
        }
        Ok(series)
    }
}

/// Parse a daily-prices CSV body into an ascending price series.
///
/// Requires a header row with a date column and a close column (an adjusted
/// close column takes precedence). A body without these columns, such as the
/// endpoint's "No data" placeholder, yields an empty series. Rows with an
/// empty date or close field are skipped.
fn parse_price_csv(ticker: &str, data: &[u8]) -> Result<Vec<PricePoint>, FetchError> {
    let parse_err = |reason: String| FetchError::Parse {
        ticker: ticker.to_string(),
        reason,
    };

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(data);
    let headers = reader
        .headers()
        .map_err(|e| parse_err(e.to_string()))?
        .clone();

    let find = |names: &[&str]| {
        headers
            .iter()
            .position(|header| names.iter().any(|name| header.trim().eq_ignore_ascii_case(name)))
    };
    let date_idx = find(&["date"]);
    let close_idx = find(&["adj close", "adj_close"]).or_else(|| find(&["close"]));
    let (date_idx, close_idx) = match (date_idx, close_idx) {
        (Some(date_idx), Some(close_idx)) => (date_idx, close_idx),
        _ => return Ok(Vec::new()),
    };

    let mut series = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| parse_err(e.to_string()))?;

        let date = record.get(date_idx).unwrap_or_default().trim();
        let close = record.get(close_idx).unwrap_or_default().trim();
        if date.is_empty() || close.is_empty() {
            continue;
        }

        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| parse_err(format!("invalid date {date:?}: {e}")))?;
        let adj_close: f64 = close
            .parse()
            .map_err(|e| parse_err(format!("invalid close {close:?}: {e}")))?;

        series.push(PricePoint { date, adj_close });
    }

    series.sort_by_key(|point| point.date);
    Ok(series)
}
