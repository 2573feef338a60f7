use async_trait::async_trait;
use chrono::Duration;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::models::{HistoryResponse, TomorrowResponse};
use super::{
    ApiError, ApiResult, CandleRange, GenerateResponse, LatestPrediction, PredictionApi, SystemStatus,
    WorkflowStatus,
};
use crate::config::ApiSettings;
use crate::types::{Candle, PredictionRecord, Ticker};

/// The upstream exchange returns at most this many candles per request.
const MAX_CANDLES_PER_REQUEST: i64 = 300;
const DAILY_GRANULARITY_SECS: u32 = 86_400;

/// Splits `range` into consecutive windows no longer than one request allows.
pub fn batch_windows(range: CandleRange) -> Vec<CandleRange> {
    let mut windows = Vec::new();
    let mut start = range.start;
    while start < range.end {
        let end = (start + Duration::days(MAX_CANDLES_PER_REQUEST)).min(range.end);
        windows.push(CandleRange { start, end });
        start = end;
    }
    windows
}

/// Joins paged batches into one ascending series. Upstream serves each batch
/// newest first, and adjacent batches share their boundary candle.
pub fn merge_batches(batches: Vec<Vec<Candle>>) -> Vec<Candle> {
    let mut all_candles: Vec<Candle> = batches.into_iter().flatten().collect();
    all_candles.sort_by_key(|c| c.time);
    all_candles.dedup_by_key(|c| c.time);
    all_candles
}

#[derive(Debug, Clone)]
pub struct PredictionApiClient {
    client: Client,
    base_url: String,
}

impl PredictionApiClient {
    pub fn new(settings: &ApiSettings) -> ApiResult<Self> {
        let base_url = settings.base_url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ApiError::InvalidUrl(settings.base_url.clone()));
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(ApiError::Status { status, body });
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        debug!("GET {}", path);
        self.send(self.client.get(self.url(path))).await
    }

    async fn candle_batch(&self, window: CandleRange) -> ApiResult<Vec<Candle>> {
        let request = self.client.get(self.url("/api/bitcoin/historical")).query(&[
            ("granularity", DAILY_GRANULARITY_SECS.to_string()),
            ("start", window.start.to_rfc3339()),
            ("end", window.end.to_rfc3339()),
        ]);
        self.send(request).await
    }
}

#[async_trait]
impl PredictionApi for PredictionApiClient {
    async fn prediction_history(&self, days: u32) -> ApiResult<Vec<PredictionRecord>> {
        let request = self
            .client
            .get(self.url("/api/predictions/history"))
            .query(&[("days", days)]);
        let resp: HistoryResponse = self.send(request).await?;
        debug!("Fetched {} predictions for the last {} days", resp.predictions.len(), days);
        Ok(resp.predictions)
    }

    async fn tomorrow_prediction(&self) -> ApiResult<Option<PredictionRecord>> {
        let resp: TomorrowResponse = self.get("/api/prediction/tomorrow").await?;
        Ok(if resp.has_prediction { resp.prediction } else { None })
    }

    async fn latest_prediction(&self) -> ApiResult<LatestPrediction> {
        self.get("/api/prediction/latest").await
    }

    async fn generate_prediction(&self) -> ApiResult<GenerateResponse> {
        info!("Requesting a new prediction from {}", self.base_url());
        self.send(self.client.post(self.url("/api/prediction/generate")))
            .await
    }

    async fn workflow_status(&self) -> ApiResult<WorkflowStatus> {
        self.get("/api/prediction/workflow-status").await
    }

    async fn system_status(&self) -> ApiResult<SystemStatus> {
        self.get("/api/system/status").await
    }

    /// Pages through the range in exchange-sized batches.
    async fn daily_candles(&self, range: CandleRange) -> ApiResult<Vec<Candle>> {
        let windows = batch_windows(range);
        let mut batches = Vec::with_capacity(windows.len());

        for (i, window) in windows.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
            }
            let batch = self.candle_batch(*window).await?;
            debug!("Fetched {} candles from {} to {}", batch.len(), window.start, window.end);
            batches.push(batch);
        }

        Ok(merge_batches(batches))
    }

    async fn ticker(&self) -> ApiResult<Ticker> {
        self.get("/api/bitcoin/realtime").await
    }
}
