use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::{DashboardSnapshot, DashboardState};
use crate::api::{CandleRange, PredictionApi};
use crate::config::Settings;

/// Refetches predictions and candles and republishes the dashboard snapshot.
///
/// There is no automatic retry: a failed refresh is recorded on the state and
/// the next tick, or a manual `refresh_now`, tries again.
pub struct DashboardRefresher {
    api: Arc<dyn PredictionApi>,
    state: DashboardState,
    settings: Settings,
}

impl DashboardRefresher {
    pub fn new(api: Arc<dyn PredictionApi>, state: DashboardState, settings: Settings) -> Self {
        Self { api, state, settings }
    }

    #[cfg(test)]
    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Days of candles covering both the scored predictions and the chart warm-up.
    fn candle_days(&self) -> i64 {
        let d = &self.settings.dashboard;
        let chart = d.chart_days as i64 + d.warmup_days as i64;
        // One extra day for the prior close of the oldest prediction
        let scoring = d.history_days as i64 + 2;
        chart.max(scoring)
    }

    async fn fetch_snapshot(&self, generation: u64) -> Result<DashboardSnapshot> {
        let now = Utc::now();
        let range = CandleRange::trailing_days(now, self.candle_days());
        let history_days = self.settings.dashboard.history_days;

        let (predictions, candles, tomorrow) = tokio::try_join!(
            self.api.prediction_history(history_days),
            self.api.daily_candles(range),
            self.api.tomorrow_prediction(),
        )?;
        debug!(
            "Refresh {} fetched {} predictions and {} candles",
            generation,
            predictions.len(),
            candles.len()
        );

        Ok(DashboardSnapshot::build(
            generation,
            now,
            &predictions,
            &candles,
            tomorrow,
            self.settings.dashboard.chart_days as usize,
            &self.settings.indicators,
        ))
    }

    /// Runs one refresh. Returns the generation it claimed, whether or not a
    /// newer refresh overtook it.
    pub async fn refresh_now(&self) -> Result<u64> {
        let generation = self.state.begin_refresh();

        match self.fetch_snapshot(generation).await {
            Ok(snapshot) => {
                let report = snapshot.report.clone();
                if self.state.apply(snapshot).await {
                    info!(
                        "Dashboard refreshed: {} predictions, {} resolved, accuracy {:.1}%, streak {}",
                        report.total,
                        report.overall.resolved,
                        report.overall.accuracy_pct(),
                        report.current_streak
                    );
                }
                Ok(generation)
            }
            Err(e) => {
                self.state.record_failure(generation, e.to_string()).await;
                Err(e)
            }
        }
    }

    /// Refreshes on the configured interval until `shutdown` flips to true or
    /// its sender is dropped. The first refresh runs immediately.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let period = Duration::from_secs(self.settings.dashboard.refresh_interval_secs);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Refreshing dashboard every {}s", period.as_secs());

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.refresh_now().await {
                        warn!("Dashboard refresh failed: {:#}", e);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Dashboard refresher stopped");
    }
}
