pub mod client;
pub mod error;
pub mod models;

pub use client::*;
pub use error::*;
pub use models::*;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::types::{Candle, PredictionRecord, Ticker};

/// Prediction and price backend consumed by the dashboard.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PredictionApi: Send + Sync {
    /// Predictions dated within the last `days` days, newest first.
    async fn prediction_history(&self, days: u32) -> ApiResult<Vec<PredictionRecord>>;
    async fn tomorrow_prediction(&self) -> ApiResult<Option<PredictionRecord>>;
    async fn latest_prediction(&self) -> ApiResult<LatestPrediction>;
    async fn generate_prediction(&self) -> ApiResult<GenerateResponse>;
    /// Recent runs of the workflow that `generate_prediction` dispatches.
    async fn workflow_status(&self) -> ApiResult<WorkflowStatus>;
    async fn system_status(&self) -> ApiResult<SystemStatus>;
    /// Daily candles inside `range`, oldest first.
    async fn daily_candles(&self, range: CandleRange) -> ApiResult<Vec<Candle>>;
    async fn ticker(&self) -> ApiResult<Ticker>;
}
