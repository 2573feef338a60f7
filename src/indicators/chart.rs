use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{bollinger_series, ema_series, macd_series, rsi_series, BollingerOutput, MACDOutput};
use crate::types::{closes, Candle};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    pub ema_periods: Vec<usize>,
    pub rsi_period: usize,
    pub bollinger_period: usize,
    pub bollinger_std_dev: Decimal,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            ema_periods: vec![20, 50],
            rsi_period: super::DEFAULT_RSI_PERIOD,
            bollinger_period: super::DEFAULT_BOLLINGER_PERIOD,
            bollinger_std_dev: dec!(2),
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
        }
    }
}

impl IndicatorParams {
    /// History needed before the first displayed point has settled values.
    pub fn longest_period(&self) -> usize {
        let ema = self.ema_periods.iter().copied().max().unwrap_or(0);
        ema.max(self.rsi_period)
            .max(self.bollinger_period)
            .max(self.macd_slow + self.macd_signal)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EmaLine {
    pub period: usize,
    pub values: Vec<Decimal>,
}

/// Indicator overlays aligned with the displayed candles.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSeries {
    pub times: Vec<DateTime<Utc>>,
    pub closes: Vec<Decimal>,
    pub ema: Vec<EmaLine>,
    pub rsi: Vec<Option<Decimal>>,
    pub bollinger: Vec<Option<BollingerOutput>>,
    pub macd: Vec<MACDOutput>,
}

fn tail<T: Clone>(values: &[T], len: usize) -> Vec<T> {
    values[values.len().saturating_sub(len)..].to_vec()
}

impl ChartSeries {
    /// Computes every indicator over the full `candles` history (display range
    /// plus warm-up), then keeps only the last `display_len` points.
    ///
    /// `candles` must be in ascending time order.
    pub fn build(candles: &[Candle], display_len: usize, params: &IndicatorParams) -> Self {
        let prices = closes(candles);
        let times: Vec<DateTime<Utc>> = candles.iter().map(|c| c.time).collect();

        let ema = params
            .ema_periods
            .iter()
            .map(|&period| EmaLine {
                period,
                values: tail(&ema_series(&prices, period), display_len),
            })
            .collect();

        Self {
            times: tail(&times, display_len),
            closes: tail(&prices, display_len),
            ema,
            rsi: tail(&rsi_series(&prices, params.rsi_period), display_len),
            bollinger: tail(
                &bollinger_series(&prices, params.bollinger_period, params.bollinger_std_dev),
                display_len,
            ),
            macd: tail(
                &macd_series(&prices, params.macd_fast, params.macd_slow, params.macd_signal),
                display_len,
            ),
        }
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn latest_rsi(&self) -> Option<Decimal> {
        self.rsi.last().copied().flatten()
    }

    pub fn latest_bollinger(&self) -> Option<BollingerOutput> {
        self.bollinger.last().copied().flatten()
    }

    pub fn latest_macd(&self) -> Option<MACDOutput> {
        self.macd.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn candles(n: usize) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| {
                let close = Decimal::from(100 + (i % 7) as i64 * 3);
                Candle {
                    time: start + Duration::days(i as i64),
                    open: close,
                    high: close + dec!(1),
                    low: close - dec!(1),
                    close,
                    volume: None,
                }
            })
            .collect()
    }

    #[test]
    fn test_display_slice_drops_warmup() {
        let history = candles(120);
        let params = IndicatorParams::default();
        let chart = ChartSeries::build(&history, 30, &params);

        assert_eq!(chart.len(), 30);
        assert_eq!(chart.times[0], history[90].time);
        assert_eq!(chart.ema.len(), 2);
        assert!(chart.ema.iter().all(|line| line.values.len() == 30));
        assert_eq!(chart.rsi.len(), 30);
        assert_eq!(chart.macd.len(), 30);
        // Warm-up covers the longest window, so every displayed slot has a value
        assert!(chart.rsi.iter().all(Option::is_some));
        assert!(chart.bollinger.iter().all(Option::is_some));
    }

    #[test]
    fn test_slice_matches_full_computation() {
        let history = candles(80);
        let params = IndicatorParams::default();
        let chart = ChartSeries::build(&history, 10, &params);

        let full = rsi_series(&closes(&history), params.rsi_period);
        assert_eq!(chart.rsi, full[70..].to_vec());
        assert_eq!(chart.latest_rsi(), full[79]);
    }

    #[test]
    fn test_short_history() {
        let chart = ChartSeries::build(&candles(5), 30, &IndicatorParams::default());
        assert_eq!(chart.len(), 5);
        assert_eq!(chart.latest_rsi(), None);
        assert_eq!(chart.latest_bollinger(), None);
        assert!(chart.latest_macd().is_some());
    }

    #[test]
    fn test_longest_period() {
        assert_eq!(IndicatorParams::default().longest_period(), 50);
        let params = IndicatorParams {
            ema_periods: vec![],
            ..IndicatorParams::default()
        };
        assert_eq!(params.longest_period(), 35);
    }
}
