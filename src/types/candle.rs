use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Daily BTC-USD candle as served by the price endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    #[serde(default)]
    pub volume: Option<Decimal>,
}

impl Candle {
    pub fn to_sample(&self) -> PriceSample {
        PriceSample {
            timestamp: self.time,
            closing_price: self.close,
        }
    }
}

/// A closing price observed at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub timestamp: DateTime<Utc>,
    pub closing_price: Decimal,
}

impl PriceSample {
    pub fn new(timestamp: DateTime<Utc>, closing_price: Decimal) -> Self {
        Self {
            timestamp,
            closing_price,
        }
    }
}

pub fn closes(candles: &[Candle]) -> Vec<Decimal> {
    candles.iter().map(|c| c.close).collect()
}

pub fn price_samples(candles: &[Candle]) -> Vec<PriceSample> {
    candles.iter().map(Candle::to_sample).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticker {
    pub price: Decimal,
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
    pub volume_24h: Decimal,
    pub bid: Decimal,
    pub ask: Decimal,
}

impl Ticker {
    pub fn spread(&self) -> Decimal {
        self.ask - self.bid
    }
}
