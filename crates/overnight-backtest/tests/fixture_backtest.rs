//! End-to-end simulation against a known fixture: five trading days, one
//! ratable symbol, benchmark index. The day-by-day portfolio values are
//! recomputed independently from the raw bars and compared to the
//! simulator's output.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use overnight_backtest::{BacktestConfig, BacktestSimulator};
use overnight_core::error::DataError;
use overnight_core::traits::MarketData;
use overnight_core::types::{Asset, Bar};
use overnight_engine::{PositionSizer, RatingConfig, RatingEngine, SizingConfig};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default, Clone)]
struct FixtureData {
    assets: Vec<Asset>,
    bars: HashMap<String, Vec<Bar>>,
    calendar: Vec<NaiveDate>,
}

#[async_trait]
impl MarketData for FixtureData {
    async fn list_assets(&self) -> Result<Vec<Asset>, DataError> {
        Ok(self.assets.clone())
    }

    async fn daily_bars(
        &self,
        symbols: &[String],
        limit: usize,
        end: Option<DateTime<Utc>>,
    ) -> Result<HashMap<String, Vec<Bar>>, DataError> {
        let cutoff = end.map(|e| e.timestamp_millis()).unwrap_or(i64::MAX);
        let mut out = HashMap::new();
        for symbol in symbols {
            if let Some(bars) = self.bars.get(symbol) {
                let eligible: Vec<Bar> = bars
                    .iter()
                    .filter(|b| b.timestamp <= cutoff)
                    .copied()
                    .collect();
                let start = eligible.len().saturating_sub(limit);
                out.insert(symbol.clone(), eligible[start..].to_vec());
            }
        }
        Ok(out)
    }

    async fn trading_calendar(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>, DataError> {
        Ok(self
            .calendar
            .iter()
            .filter(|d| **d >= start && **d <= end)
            .copied()
            .collect())
    }

    fn name(&self) -> &str {
        "fixture"
    }
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

fn bar_on(day: u32, open: f64, close: f64, volume: f64) -> Bar {
    let ts = date(day)
        .and_hms_opt(21, 0, 0)
        .unwrap()
        .and_utc()
        .timestamp_millis();
    Bar::new(ts, open, close + 0.5, open - 0.5, close, volume)
}

/// Daily closes for the single ratable symbol: rising $1/day so every
/// five-bar window shows positive momentum. Opens sit $0.50 below the
/// close. Bars run Jan 2 through Jan 12; the simulated calendar is the
/// trading week Jan 8 through Jan 12.
const AAA_CLOSES: [f64; 11] = [
    30.0, 31.0, 32.0, 33.0, 34.0, 35.0, 36.0, 37.0, 38.0, 39.0, 40.0,
];
const AAA_VOLUMES: [f64; 11] = [
    1000.0, 1200.0, 1500.0, 1300.0, 2000.0, 2600.0, 2100.0, 3000.0, 3900.0, 4200.0, 4600.0,
];

fn fixture() -> FixtureData {
    let mut data = FixtureData::default();
    data.calendar = (8..=12).map(date).collect();

    data.assets.push(Asset {
        symbol: "AAA".to_string(),
        tradable: true,
    });
    data.bars.insert(
        "AAA".to_string(),
        (2..=12)
            .zip(AAA_CLOSES.iter().zip(&AAA_VOLUMES))
            .map(|(d, (&c, &v))| bar_on(d, c - 0.5, c, v))
            .collect(),
    );

    // Benchmark index: priced far outside the ratable range, so it never
    // competes with AAA for the allocation.
    data.assets.push(Asset {
        symbol: "SPY".to_string(),
        tradable: true,
    });
    data.bars.insert(
        "SPY".to_string(),
        (2..=12)
            .enumerate()
            .map(|(i, d)| bar_on(d, 400.0 + i as f64, 400.0 + i as f64, 1_000_000.0))
            .collect(),
    );

    data
}

fn simulator(data: FixtureData) -> BacktestSimulator {
    let data = Arc::new(data);
    let engine = RatingEngine::new(RatingConfig::default(), data.clone()).unwrap();
    BacktestSimulator::new(
        BacktestConfig::default(),
        engine,
        PositionSizer::new(SizingConfig::default()),
        data,
    )
}

/// Reference portfolio walk computed directly from the bar arrays: with a
/// single ratable symbol the whole cash balance goes to it each day, floored
/// to whole shares at that day's close, and is valued back at the next
/// day's open.
fn reference_values(starting_cash: f64) -> (Vec<f64>, f64) {
    let mut cash = starting_cash;
    let mut shares = 0u64;
    let mut values = Vec::new();

    for k in 0..5usize {
        let bar_index = 6 + k; // Jan 8 is the 7th bar (index 6)
        let open = AAA_CLOSES[bar_index] - 0.5;
        cash += shares as f64 * open;
        shares = 0;
        values.push(cash);

        if k < 4 {
            let close = AAA_CLOSES[bar_index];
            shares = (cash / close).floor() as u64;
            cash -= shares as f64 * close;
        }
    }

    (values, cash)
}

#[tokio::test]
async fn test_five_day_fixture_matches_reference() {
    let report = simulator(fixture())
        .run(10_000.0, date(8), date(12))
        .await
        .unwrap();

    let (expected_values, expected_final) = reference_values(10_000.0);

    assert_eq!(report.daily_values.len(), 5);
    for (daily, expected) in report.daily_values.iter().zip(&expected_values) {
        let tolerance = expected * 0.0001; // 0.01%
        assert!(
            (daily.value - expected).abs() <= tolerance,
            "value on {} was {}, expected {}",
            daily.date,
            daily.value,
            expected
        );
    }

    let tolerance = expected_final * 0.0001;
    assert!((report.final_value - expected_final).abs() <= tolerance);

    let expected_return = (expected_final - 10_000.0) / 10_000.0 * 100.0;
    assert!((report.return_pct - expected_return).abs() <= 0.01);
}

#[tokio::test]
async fn test_benchmark_comparison_uses_window_endpoints() {
    let report = simulator(fixture())
        .run(10_000.0, date(8), date(12))
        .await
        .unwrap();

    // SPY closes 406 on Jan 8 and 410 on Jan 12.
    let expected = (410.0 - 406.0) / 406.0 * 100.0;
    let actual = report.benchmark_return_pct.expect("benchmark should resolve");
    assert!((actual - expected).abs() < 1e-9);
}

#[tokio::test]
async fn test_summary_prints_per_day_values_and_change() {
    let report = simulator(fixture())
        .run(10_000.0, date(8), date(12))
        .await
        .unwrap();

    let summary = report.summary();
    assert!(summary.contains("Portfolio value on 2024-01-08: $10000.00"));
    assert!(summary.contains("Portfolio value on 2024-01-12"));
    assert!(summary.contains("Portfolio change: "));
    assert!(summary.contains("SPY change during backtesting window"));
}
