use crate::source::{FetchError, PriceSource};
use crate::types::PricePoint;
use chrono::NaiveDate;
use std::thread;

/// How the per-ticker fetches are scheduled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FetchMode {
    /// One worker thread per ticker, joined before any result is read.
    Threaded,
    /// Plain loop over the tickers.
    Sequential,
}

pub type FetchOutcome = Result<Vec<PricePoint>, FetchError>;

/// Fetch the price history of every ticker.
///
/// Returns one slot per ticker, in input order, populated exactly once.
/// Failed tickers stay in the output as `Err`; they never abort the batch.
pub fn fetch_batch(
    source: &dyn PriceSource,
    tickers: &[String],
    start: NaiveDate,
    end: NaiveDate,
    mode: FetchMode,
) -> Vec<(String, FetchOutcome)> {
    match mode {
        FetchMode::Sequential => tickers
            .iter()
            .map(|ticker| (ticker.clone(), source.fetch(ticker, start, end)))
            .collect(),

        FetchMode::Threaded => thread::scope(|scope| {
            let handles: Vec<_> = tickers
                .iter()
                .map(|ticker| scope.spawn(move || source.fetch(ticker, start, end)))
                .collect();

            tickers
                .iter()
                .zip(handles)
                .map(|(ticker, handle)| {
                    let outcome = handle.join().unwrap_or_else(|_| {
                        Err(FetchError::Transport {
                            ticker: ticker.clone(),
                            reason: "fetch worker panicked".to_string(),
                        })
                    });
                    (ticker.clone(), outcome)
                })
                .collect()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubSource;

    impl PriceSource for StubSource {
        fn fetch(
            &self,
            ticker: &str,
            start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<PricePoint>, FetchError> {
            match ticker {
                "AAA" => Ok(vec![PricePoint {
                    date: start,
                    adj_close: 10.0,
                }]),
                _ => Err(FetchError::DataUnavailable {
                    ticker: ticker.to_string(),
                }),
            }
        }
    }

    fn run(mode: FetchMode) -> Vec<(String, FetchOutcome)> {
        let tickers = vec!["AAA".to_string(), "BBB".to_string(), "AAA".to_string()];
        let start = NaiveDate::from_ymd_opt(2010, 1, 4).unwrap();
        let end = NaiveDate::from_ymd_opt(2010, 7, 1).unwrap();
        fetch_batch(&StubSource, &tickers, start, end, mode)
    }

    #[test]
    fn one_slot_per_ticker_in_input_order() {
        for mode in [FetchMode::Threaded, FetchMode::Sequential] {
            let batch = run(mode);
            let tickers: Vec<&str> = batch.iter().map(|(ticker, _)| ticker.as_str()).collect();
            assert_eq!(tickers, ["AAA", "BBB", "AAA"]);
        }
    }

    #[test]
    fn failed_tickers_do_not_abort_the_batch() {
        let batch = run(FetchMode::Threaded);
        assert!(batch[0].1.is_ok());
        assert!(matches!(
            batch[1].1,
            Err(FetchError::DataUnavailable { .. })
        ));
        assert!(batch[2].1.is_ok());
    }
}
