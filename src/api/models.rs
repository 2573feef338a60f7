use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::PredictionRecord;

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HistoryResponse {
    #[serde(default)]
    pub predictions: Vec<PredictionRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TomorrowResponse {
    pub has_prediction: bool,
    #[serde(default)]
    pub prediction: Option<PredictionRecord>,
}

/// Most recent stored prediction, whatever its date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestPrediction {
    pub has_prediction: bool,
    #[serde(default)]
    pub prediction: Option<PredictionRecord>,
    #[serde(default)]
    pub is_future_prediction: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub message: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub name: String,
    pub version: String,
    pub system_time: String,
    pub current_date: NaiveDate,
    pub has_tomorrow_prediction: bool,
    #[serde(default)]
    pub latest_prediction_date: Option<NaiveDate>,
    pub status: String,
}

impl SystemStatus {
    pub fn is_online(&self) -> bool {
        self.status == "online"
    }
}

/// One run of the prediction workflow dispatched by `generate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub id: i64,
    pub name: String,
    /// `queued`, `in_progress` or `completed`.
    pub status: String,
    #[serde(default)]
    pub conclusion: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub html_url: String,
    pub run_number: i64,
    pub event: String,
    #[serde(default)]
    pub display_title: Option<String>,
}

impl WorkflowRun {
    pub fn is_finished(&self) -> bool {
        self.status == "completed"
    }

    pub fn outcome(&self) -> &str {
        match (self.is_finished(), self.conclusion.as_deref()) {
            (true, Some(conclusion)) => conclusion,
            (true, None) => "unknown",
            (false, _) => &self.status,
        }
    }
}

/// Recent prediction workflow runs, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStatus {
    #[serde(default)]
    pub workflow_runs: Vec<WorkflowRun>,
    pub repository: String,
    pub actions_url: String,
}

impl WorkflowStatus {
    pub fn latest(&self) -> Option<&WorkflowRun> {
        self.workflow_runs.first()
    }
}

/// Half-open time range for candle requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandleRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CandleRange {
    pub fn trailing_days(end: DateTime<Utc>, days: i64) -> Self {
        Self {
            start: end - chrono::Duration::days(days),
            end,
        }
    }
}
