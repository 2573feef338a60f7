use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Next-day price direction. Encoded on the wire as `1` (up) and `-1` (down).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Direction::Up),
            // 0 is the legacy "not up" encoding
            -1 | 0 => Some(Direction::Down),
            _ => None,
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            Direction::Up => 1,
            Direction::Down => -1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl Serialize for Direction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.code())
    }
}

impl<'de> Deserialize<'de> for Direction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = i64::deserialize(deserializer)?;
        Direction::from_code(code).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid price_direction {}, expected 1 or -1", code))
        })
    }
}

/// Parses RFC 3339, falling back to offset-less timestamps read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
}

/// A stored model prediction for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: i64,
    pub prediction_date: NaiveDate,
    #[serde(rename = "price_direction")]
    pub direction: Direction,
    pub confidence_score: Decimal,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Pending,
    Correct,
    Incorrect,
}

impl Outcome {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Outcome::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Pending => "PENDING",
            Outcome::Correct => "CORRECT",
            Outcome::Incorrect => "INCORRECT",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A prediction judged against realized closes. Recomputed on every refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluatedPrediction {
    pub prediction: PredictionRecord,
    pub outcome: Outcome,
    pub actual_direction: Option<Direction>,
    pub prior_closing_price: Option<Decimal>,
    pub target_closing_price: Option<Decimal>,
}

impl EvaluatedPrediction {
    pub fn pending(prediction: PredictionRecord) -> Self {
        Self {
            prediction,
            outcome: Outcome::Pending,
            actual_direction: None,
            prior_closing_price: None,
            target_closing_price: None,
        }
    }

    /// Day-over-day change of the closes used for judging, in percent.
    pub fn price_change_pct(&self) -> Option<Decimal> {
        match (self.prior_closing_price, self.target_closing_price) {
            (Some(prior), Some(target)) if !prior.is_zero() => {
                Some((target - prior) / prior * Decimal::from(100))
            }
            _ => None,
        }
    }
}
