//! Backtest report generation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Portfolio value at the open of one simulated trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyValue {
    pub date: NaiveDate,
    pub value: f64,
}

/// Complete backtest report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Cash the simulation started with
    pub starting_cash: f64,
    /// Portfolio value after the last calendar day
    pub final_value: f64,
    /// Total return percentage over the window
    pub return_pct: f64,
    /// Day-by-day portfolio values
    pub daily_values: Vec<DailyValue>,
    /// Reference index symbol used for comparison
    pub benchmark_symbol: String,
    /// Benchmark percentage change over the same window, when resolvable
    pub benchmark_return_pct: Option<f64>,
}

impl BacktestReport {
    /// Generate the text summary: one line per simulated day, the final
    /// change, and the benchmark comparison.
    pub fn summary(&self) -> String {
        let mut s = String::new();

        for daily in &self.daily_values {
            s.push_str(&format!(
                "Portfolio value on {}: ${:.2}\n",
                daily.date.format("%Y-%m-%d"),
                daily.value
            ));
        }

        s.push_str(&format!("Portfolio change: {:.4}%\n", self.return_pct));

        match self.benchmark_return_pct {
            Some(pct) => s.push_str(&format!(
                "{} change during backtesting window: {:.4}%\n",
                self.benchmark_symbol, pct
            )),
            None => s.push_str(&format!(
                "{} benchmark unavailable for the backtesting window\n",
                self.benchmark_symbol
            )),
        }

        s
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_lines() {
        let report = BacktestReport {
            starting_cash: 10_000.0,
            final_value: 10_250.0,
            return_pct: 2.5,
            daily_values: vec![
                DailyValue {
                    date: NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
                    value: 10_000.0,
                },
                DailyValue {
                    date: NaiveDate::from_ymd_opt(2024, 1, 9).unwrap(),
                    value: 10_250.0,
                },
            ],
            benchmark_symbol: "SPY".to_string(),
            benchmark_return_pct: Some(1.25),
        };

        let summary = report.summary();
        assert!(summary.contains("Portfolio value on 2024-01-08: $10000.00"));
        assert!(summary.contains("Portfolio change: 2.5000%"));
        assert!(summary.contains("SPY change during backtesting window: 1.2500%"));
    }

    #[test]
    fn test_summary_without_benchmark() {
        let report = BacktestReport {
            starting_cash: 10_000.0,
            final_value: 10_000.0,
            return_pct: 0.0,
            daily_values: vec![],
            benchmark_symbol: "SPY".to_string(),
            benchmark_return_pct: None,
        };

        assert!(report.summary().contains("benchmark unavailable"));
    }
}
