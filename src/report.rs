use crate::fetch::FetchOutcome;
use crate::stats;
use crate::types::{ReturnPoint, TickerStats};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Rendering of an undefined statistic or a missing date, used only at this
/// output boundary.
const NOT_AVAILABLE: &str = "N/A";

struct TickerReport {
    returns: Vec<ReturnPoint>,
    stats: TickerStats,
}

/// Per-ticker return series and statistics, keyed by ticker in sorted order.
pub struct Report {
    tickers: BTreeMap<String, TickerReport>,
}

impl Report {
    /// Build a report from the fetch results of a whole batch.
    ///
    /// Tickers that failed to fetch are kept, with an empty return series
    /// and all statistics undefined.
    pub fn from_batch(batch: Vec<(String, FetchOutcome)>) -> Self {
        let mut tickers = BTreeMap::new();
        for (ticker, outcome) in batch {
            let returns = match outcome {
                Ok(prices) => stats::compute_returns(&prices),
                Err(_) => Vec::new(),
            };
            let values: Vec<f64> = returns.iter().map(|point| point.value).collect();
            tickers.insert(
                ticker,
                TickerReport {
                    returns,
                    stats: stats::summarize(&values),
                },
            );
        }
        Self { tickers }
    }

    /// Write the per-ticker statistics table.
    pub fn write_stats_table<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let mut writer =
            csv::Writer::from_path(file).with_context(|| format!("failed to create {file:?}"))?;

        writer.write_record(["ticker", "mean", "variance", "autocor_1", "autocor_5", "autocor_10"])?;
        for (ticker, report) in &self.tickers {
            let stats = &report.stats;
            writer.write_record([
                ticker.clone(),
                format_stat(stats.mean),
                format_stat(stats.variance),
                format_stat(stats.autocor_1),
                format_stat(stats.autocor_5),
                format_stat(stats.autocor_10),
            ])?;
        }

        writer.flush().context("failed to flush stats table")?;
        Ok(())
    }

    /// Write the date-aligned wide table of daily returns.
    ///
    /// Rows are the ascending union of all return dates; tickers are joined
    /// by calendar date, never by index, so gaps in one ticker's history
    /// show up as `N/A` rather than shifting its column.
    pub fn write_returns_wide<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let mut writer =
            csv::Writer::from_path(file).with_context(|| format!("failed to create {file:?}"))?;

        let dates: BTreeSet<NaiveDate> = self
            .tickers
            .values()
            .flat_map(|report| report.returns.iter().map(|point| point.date))
            .collect();
        let by_date: Vec<BTreeMap<NaiveDate, f64>> = self
            .tickers
            .values()
            .map(|report| {
                report
                    .returns
                    .iter()
                    .map(|point| (point.date, point.value))
                    .collect()
            })
            .collect();

        let mut header = vec!["date".to_string()];
        header.extend(self.tickers.keys().cloned());
        writer.write_record(&header)?;

        for date in dates {
            let mut row = vec![date.to_string()];
            for returns in &by_date {
                row.push(match returns.get(&date) {
                    Some(value) => value.to_string(),
                    None => NOT_AVAILABLE.to_string(),
                });
            }
            writer.write_record(&row)?;
        }

        writer.flush().context("failed to flush returns table")?;
        Ok(())
    }
}

fn format_stat(stat: Option<f64>) -> String {
    match stat {
        Some(value) => value.to_string(),
        None => NOT_AVAILABLE.to_string(),
    }
}
