//! Price and return series data types.

use chrono::NaiveDate;

/// Single daily observation of a ticker's adjusted closing price.
///
/// The price is expected to be positive, but this is not enforced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub adj_close: f64,
}

/// Daily simple return derived from two consecutive price points.
///
/// Dated by the later of the two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Descriptive statistics of a single ticker's return series.
///
/// `None` marks a statistic that is undefined for the input: an empty series,
/// fewer points than the lag requires, or a zero-variance term. Undefined
/// values are rendered as `N/A` at the output boundary, never as a zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickerStats {
    pub mean: Option<f64>,
    pub variance: Option<f64>,
    pub autocor_1: Option<f64>,
    pub autocor_5: Option<f64>,
    pub autocor_10: Option<f64>,
}
