use rust_decimal::Decimal;
use serde::Serialize;

use super::{sma, stddev};

pub const DEFAULT_BOLLINGER_PERIOD: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BollingerOutput {
    pub upper: Decimal,
    pub middle: Decimal,
    pub lower: Decimal,
}

impl BollingerOutput {
    /// Band width relative to the middle band, in percent.
    pub fn bandwidth(&self) -> Option<Decimal> {
        if self.middle.is_zero() {
            return None;
        }
        Some((self.upper - self.lower) / self.middle * Decimal::from(100))
    }

    pub fn position(&self, price: Decimal) -> BollingerPosition {
        let range = self.upper - self.lower;
        let percent_b = if range.is_zero() {
            Decimal::new(5, 1)
        } else {
            (price - self.lower) / range
        };

        if price >= self.upper && !range.is_zero() {
            BollingerPosition::AboveUpper
        } else if price <= self.lower && !range.is_zero() {
            BollingerPosition::BelowLower
        } else if percent_b > Decimal::new(8, 1) {
            BollingerPosition::UpperHalf
        } else if percent_b < Decimal::new(2, 1) {
            BollingerPosition::LowerHalf
        } else {
            BollingerPosition::Middle
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerPosition {
    AboveUpper,
    UpperHalf,
    Middle,
    LowerHalf,
    BelowLower,
}

impl BollingerPosition {
    pub fn is_extreme(&self) -> bool {
        matches!(self, BollingerPosition::AboveUpper | BollingerPosition::BelowLower)
    }
}

/// SMA of the `period` closes ending at each index, plus and minus
/// `std_dev_multiplier` population standard deviations. No value before `period`.
pub fn bollinger_series(
    prices: &[Decimal],
    period: usize,
    std_dev_multiplier: Decimal,
) -> Vec<Option<BollingerOutput>> {
    let mut out = vec![None; prices.len()];
    if period == 0 {
        return out;
    }

    for i in period..prices.len() {
        let window = &prices[..=i];
        if let (Some(middle), Some(sd)) = (sma(window, period), stddev(window, period)) {
            let deviation = sd * std_dev_multiplier;
            out[i] = Some(BollingerOutput {
                upper: middle + deviation,
                middle,
                lower: middle - deviation,
            });
        }
    }
    out
}
