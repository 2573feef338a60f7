use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use crate::evaluation::{aggregate_accuracy, evaluate_all, AccuracyReport};
use crate::indicators::{ChartSeries, IndicatorParams};
use crate::types::{price_samples, Candle, EvaluatedPrediction, PredictionRecord};

/// Everything one refresh computed. Replaced wholesale, never patched.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub generation: u64,
    pub fetched_at: DateTime<Utc>,
    pub today: NaiveDate,
    pub evaluated: Vec<EvaluatedPrediction>,
    pub report: AccuracyReport,
    pub tomorrow: Option<PredictionRecord>,
    pub chart: ChartSeries,
    pub latest_close: Option<Decimal>,
}

impl DashboardSnapshot {
    /// `candles` must be ascending and include the indicator warm-up window.
    pub fn build(
        generation: u64,
        fetched_at: DateTime<Utc>,
        predictions: &[PredictionRecord],
        candles: &[Candle],
        tomorrow: Option<PredictionRecord>,
        chart_days: usize,
        params: &IndicatorParams,
    ) -> Self {
        let today = fetched_at.date_naive();
        let samples = price_samples(candles);
        let evaluated = evaluate_all(predictions, &samples, today);
        let report = aggregate_accuracy(&evaluated);

        Self {
            generation,
            fetched_at,
            today,
            evaluated,
            report,
            tomorrow,
            chart: ChartSeries::build(candles, chart_days, params),
            latest_close: candles.last().map(|c| c.close),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub enum DashboardEvent {
    Refreshed {
        generation: u64,
        resolved: u64,
        accuracy: Decimal,
    },
    RefreshFailed {
        generation: u64,
        error: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct DashboardData {
    pub snapshot: Option<DashboardSnapshot>,
    pub applied_generation: u64,
    pub last_error: Option<String>,
    pub last_error_at: Option<DateTime<Utc>>,
}

/// Latest dashboard snapshot, shared between the refresh loop and readers.
///
/// Each refresh claims a generation before it fetches. Results are applied only
/// when newer than what is already shown, so a slow refresh finishing late can
/// never replace fresher data.
#[derive(Clone)]
pub struct DashboardState {
    inner: Arc<RwLock<DashboardData>>,
    next_generation: Arc<AtomicU64>,
    pub tx: broadcast::Sender<DashboardEvent>,
}

impl DashboardState {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(32);
        Self {
            inner: Arc::new(RwLock::new(DashboardData::default())),
            next_generation: Arc::new(AtomicU64::new(0)),
            tx,
        }
    }

    pub fn begin_refresh(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Returns false when a newer snapshot is already applied.
    pub async fn apply(&self, snapshot: DashboardSnapshot) -> bool {
        let mut data = self.inner.write().await;
        if snapshot.generation <= data.applied_generation {
            debug!(
                "Discarding stale refresh {} (showing {})",
                snapshot.generation, data.applied_generation
            );
            return false;
        }

        let event = DashboardEvent::Refreshed {
            generation: snapshot.generation,
            resolved: snapshot.report.overall.resolved,
            accuracy: snapshot.report.total_accuracy(),
        };
        data.applied_generation = snapshot.generation;
        data.snapshot = Some(snapshot);
        data.last_error = None;
        data.last_error_at = None;

        let _ = self.tx.send(event);
        true
    }

    /// Keeps the previous snapshot on screen and records why the refresh failed.
    pub async fn record_failure(&self, generation: u64, error: String) -> bool {
        let mut data = self.inner.write().await;
        if generation <= data.applied_generation {
            return false;
        }

        data.last_error = Some(error.clone());
        data.last_error_at = Some(Utc::now());

        let _ = self.tx.send(DashboardEvent::RefreshFailed { generation, error });
        true
    }

    pub async fn snapshot(&self) -> Option<DashboardSnapshot> {
        self.inner.read().await.snapshot.clone()
    }

    pub async fn last_error(&self) -> Option<String> {
        self.inner.read().await.last_error.clone()
    }

    #[cfg(test)]
    pub async fn get_data(&self) -> DashboardData {
        self.inner.read().await.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.tx.subscribe()
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, Outcome};
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn candle(day: u32, close: Decimal) -> Candle {
        Candle {
            time: Utc.with_ymd_and_hms(2025, 5, day, 0, 0, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: None,
        }
    }

    fn record(day: u32, direction: Direction) -> PredictionRecord {
        PredictionRecord {
            id: day as i64,
            prediction_date: NaiveDate::from_ymd_opt(2025, 5, day).unwrap(),
            direction,
            confidence_score: dec!(0.7),
            created_at: Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap(),
        }
    }

    fn snapshot(generation: u64) -> DashboardSnapshot {
        let fetched_at = Utc.with_ymd_and_hms(2025, 5, 12, 9, 30, 0).unwrap();
        DashboardSnapshot::build(
            generation,
            fetched_at,
            &[record(11, Direction::Up), record(12, Direction::Down)],
            &[candle(10, dec!(100)), candle(11, dec!(110))],
            None,
            30,
            &IndicatorParams::default(),
        )
    }

    #[test]
    fn test_snapshot_build() {
        let snap = snapshot(1);
        assert_eq!(snap.today, NaiveDate::from_ymd_opt(2025, 5, 12).unwrap());
        assert_eq!(snap.evaluated[0].outcome, Outcome::Correct);
        assert_eq!(snap.evaluated[1].outcome, Outcome::Pending);
        assert_eq!(snap.report.overall.resolved, 1);
        assert_eq!(snap.report.current_streak, 1);
        assert_eq!(snap.latest_close, Some(dec!(110)));
        assert_eq!(snap.chart.len(), 2);
    }

    #[test]
    fn test_today_is_utc_date() {
        // 23:30 UTC is already the next day in UTC+1, but today stays the UTC date
        let late = Utc.with_ymd_and_hms(2025, 5, 11, 23, 30, 0).unwrap();
        let snap = DashboardSnapshot::build(
            1,
            late,
            &[record(11, Direction::Up)],
            &[candle(10, dec!(100)), candle(11, dec!(110))],
            None,
            30,
            &IndicatorParams::default(),
        );
        assert_eq!(snap.evaluated[0].outcome, Outcome::Pending);

        let snap = DashboardSnapshot::build(
            1,
            late + Duration::hours(1),
            &[record(11, Direction::Up)],
            &[candle(10, dec!(100)), candle(11, dec!(110))],
            None,
            30,
            &IndicatorParams::default(),
        );
        assert_eq!(snap.evaluated[0].outcome, Outcome::Correct);
    }

    #[tokio::test]
    async fn test_generations_increase() {
        let state = DashboardState::new();
        assert_eq!(state.begin_refresh(), 1);
        assert_eq!(state.begin_refresh(), 2);
        assert_eq!(state.clone().begin_refresh(), 3);
    }

    #[tokio::test]
    async fn test_stale_refresh_is_discarded() {
        let state = DashboardState::new();
        let mut events = state.subscribe();
        let older = state.begin_refresh();
        let newer = state.begin_refresh();

        assert!(state.apply(snapshot(newer)).await);
        assert!(!state.apply(snapshot(older)).await);
        assert!(!state.record_failure(older, "timed out".to_string()).await);

        assert_eq!(state.snapshot().await.unwrap().generation, newer);
        assert_eq!(state.last_error().await, None);

        match events.recv().await.unwrap() {
            DashboardEvent::Refreshed { generation, resolved, .. } => {
                assert_eq!(generation, newer);
                assert_eq!(resolved, 1);
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_snapshot() {
        let state = DashboardState::new();
        let first = state.begin_refresh();
        assert!(state.apply(snapshot(first)).await);

        let second = state.begin_refresh();
        assert!(state.record_failure(second, "HTTP error".to_string()).await);

        let data = state.get_data().await;
        assert_eq!(data.applied_generation, first);
        assert_eq!(data.snapshot.unwrap().generation, first);
        assert_eq!(data.last_error.as_deref(), Some("HTTP error"));
        assert!(data.last_error_at.is_some());

        // A later success clears the error
        let third = state.begin_refresh();
        assert!(state.apply(snapshot(third)).await);
        assert_eq!(state.last_error().await, None);
    }
}
