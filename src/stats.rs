use crate::types::{PricePoint, ReturnPoint, TickerStats};

/// Compute the daily simple returns of a price series.
///
/// Each return is the relative change between two consecutive adjusted
/// closes, dated by the later point. A series with fewer than 2 points
/// yields an empty return series, never an error.
pub fn compute_returns(prices: &[PricePoint]) -> Vec<ReturnPoint> {
    prices
        .windows(2)
        .map(|pair| ReturnPoint {
            date: pair[1].date,
            value: pair[1].adj_close / pair[0].adj_close - 1.0,
        })
        .collect()
}

/// Arithmetic mean; `None` iff the slice is empty.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Variance with the (n-1) denominator if `sample`, else n.
///
/// `None` iff the slice is empty or `sample` is set and n == 1.
pub fn variance(values: &[f64], sample: bool) -> Option<f64> {
    let n_vals = values.len();
    if n_vals == 0 || (sample && n_vals == 1) {
        return None;
    }
    let mean = mean(values)?;
    let diff_2_sum: f64 = values.iter().map(|&val| (val - mean).powi(2)).sum();
    let denom = if sample { n_vals - 1 } else { n_vals };
    Some(diff_2_sum / denom as f64)
}

/// Lag-k autocorrelation of a series.
///
/// Correlates the head `values[..n - lag]` against the tail `values[lag..]`.
/// The two halves are treated as independent samples, each with its own mean
/// and sample variance. This matches the report format this tool replaces,
/// not the usual shared-mean estimator, and must stay that way for output
/// compatibility.
///
/// `None` iff `n <= lag`, either half has fewer than 2 points, or either
/// half's variance is zero.
pub fn autocorrelation(values: &[f64], lag: usize) -> Option<f64> {
    let n_vals = values.len();
    if n_vals <= lag {
        return None;
    }
    let head = &values[..n_vals - lag];
    let tail = &values[lag..];

    let head_mean = mean(head)?;
    let tail_mean = mean(tail)?;
    let head_var = variance(head, true)?;
    let tail_var = variance(tail, true)?;
    if head_var == 0.0 || tail_var == 0.0 {
        return None;
    }

    let cov_sum: f64 = head
        .iter()
        .zip(tail)
        .map(|(&a, &b)| (a - head_mean) * (b - tail_mean))
        .sum();

    Some(cov_sum / ((tail.len() - 1) as f64 * head_var.sqrt() * tail_var.sqrt()))
}

/// Summarize a return series with the statistics reported per ticker.
pub fn summarize(values: &[f64]) -> TickerStats {
    TickerStats {
        mean: mean(values),
        variance: variance(values, true),
        autocor_1: autocorrelation(values, 1),
        autocor_5: autocorrelation(values, 5),
        autocor_10: autocorrelation(values, 10),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(i: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2010, 1, 1).unwrap() + chrono::Days::new(i)
    }

    fn series(closes: &[f64]) -> Vec<PricePoint> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &adj_close)| PricePoint {
                date: day(i as u64),
                adj_close,
            })
            .collect()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn returns_length_is_input_length_minus_one() {
        for n in 0..6 {
            let prices = series(&vec![10.0; n]);
            assert_eq!(compute_returns(&prices).len(), n.saturating_sub(1));
        }
    }

    #[test]
    fn returns_are_dated_by_the_later_point() {
        let returns = compute_returns(&series(&[10.0, 11.0, 9.9]));
        assert_eq!(returns[0].date, day(1));
        assert_eq!(returns[1].date, day(2));
    }

    #[test]
    fn mean_of_empty_is_undefined() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[5.0]), Some(5.0));
    }

    #[test]
    fn sample_variance_needs_two_points() {
        assert_eq!(variance(&[], true), None);
        assert_eq!(variance(&[3.0], true), None);
        assert_close(variance(&[1.0, 2.0, 3.0], true).unwrap(), 1.0);
    }

    #[test]
    fn population_variance_is_defined_for_one_point() {
        assert_close(variance(&[3.0], false).unwrap(), 0.0);
        assert_close(variance(&[1.0, 2.0, 3.0], false).unwrap(), 2.0 / 3.0);
    }

    #[test]
    fn autocorrelation_needs_more_points_than_lag() {
        let values = [0.1, -0.2, 0.3];
        assert_eq!(autocorrelation(&values, 3), None);
        assert_eq!(autocorrelation(&values, 10), None);
    }

    #[test]
    fn autocorrelation_of_flat_series_is_undefined() {
        assert_eq!(autocorrelation(&[0.5, 0.5, 0.5, 0.5], 1), None);
    }

    #[test]
    fn autocorrelation_with_single_point_halves_is_undefined() {
        // lag = n - 1 leaves one point per half, so the sample variances
        // are undefined.
        assert_eq!(autocorrelation(&[0.1, -0.2], 1), None);
    }

    #[test]
    fn prices_round_trip_through_returns() {
        let closes = [10.0, 11.0, 9.9, 9.9, 12.3, 8.75];
        let returns = compute_returns(&series(&closes));

        let mut rebuilt = closes[0];
        for (point, &expected) in returns.iter().zip(&closes[1..]) {
            rebuilt *= 1.0 + point.value;
            assert_close(rebuilt, expected);
        }
    }

    #[test]
    fn known_price_series_end_to_end() {
        let returns = compute_returns(&series(&[10.0, 11.0, 9.9, 9.9]));
        let values: Vec<f64> = returns.iter().map(|point| point.value).collect();

        assert_close(values[0], 0.1);
        assert_close(values[1], -0.1);
        assert_close(values[2], 0.0);

        let stats = summarize(&values);
        assert_close(stats.mean.unwrap(), 0.0);
        assert_close(stats.variance.unwrap(), 0.01);
        // Halves [0.1, -0.1] and [-0.1, 0.0] are perfectly anti-correlated
        // under the two-sample formula.
        assert_close(stats.autocor_1.unwrap(), -1.0);
        assert_eq!(stats.autocor_5, None);
        assert_eq!(stats.autocor_10, None);
    }

    #[test]
    fn empty_series_is_all_undefined() {
        assert_eq!(summarize(&[]), TickerStats::default());
    }
}
