#![allow(dead_code)]
use rust_decimal::Decimal;
use serde::Serialize;

use super::ema::ema_series;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MACDOutput {
    pub macd_line: Decimal,
    pub signal_line: Decimal,
    pub histogram: Decimal,
}

impl MACDOutput {
    pub fn trend(&self) -> MACDTrend {
        let (macd, signal, hist) = (self.macd_line, self.signal_line, self.histogram);
        if macd > Decimal::ZERO && signal > Decimal::ZERO && hist > Decimal::ZERO {
            MACDTrend::StrongBullish
        } else if macd > Decimal::ZERO && hist > Decimal::ZERO {
            MACDTrend::Bullish
        } else if macd < Decimal::ZERO && signal < Decimal::ZERO && hist < Decimal::ZERO {
            MACDTrend::StrongBearish
        } else if macd < Decimal::ZERO && hist < Decimal::ZERO {
            MACDTrend::Bearish
        } else {
            MACDTrend::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MACDTrend {
    StrongBullish,
    Bullish,
    Neutral,
    Bearish,
    StrongBearish,
}

impl MACDTrend {
    pub fn is_bullish(&self) -> bool {
        matches!(self, MACDTrend::StrongBullish | MACDTrend::Bullish)
    }

    pub fn is_bearish(&self) -> bool {
        matches!(self, MACDTrend::StrongBearish | MACDTrend::Bearish)
    }
}

/// MACD line, signal line and histogram at every index.
pub fn macd_series(
    prices: &[Decimal],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> Vec<MACDOutput> {
    let fast = ema_series(prices, fast_period);
    let slow = ema_series(prices, slow_period);
    let macd_line: Vec<Decimal> = fast.iter().zip(&slow).map(|(f, s)| *f - *s).collect();
    let signal = ema_series(&macd_line, signal_period);

    macd_line
        .iter()
        .zip(&signal)
        .map(|(m, s)| MACDOutput {
            macd_line: *m,
            signal_line: *s,
            histogram: *m - *s,
        })
        .collect()
}
