use serde::{Deserialize, Serialize};

use crate::indicators::IndicatorParams;

/// Upper bound on any day-count window, keeps date arithmetic in range.
pub const MAX_LOOKBACK_DAYS: u32 = 3650;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub dashboard: DashboardSettings,
    pub indicators: IndicatorParams,
}

impl Settings {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        // API validation
        if self.api.base_url.trim().is_empty() {
            errors.push("api.base_url must not be empty".to_string());
        }
        if self.api.timeout_secs == 0 {
            errors.push("api.timeout_secs must be > 0".to_string());
        }

        // Dashboard validation
        if self.dashboard.history_days == 0 {
            errors.push("dashboard.history_days must be > 0".to_string());
        }
        if self.dashboard.refresh_interval_secs == 0 {
            errors.push("dashboard.refresh_interval_secs must be > 0".to_string());
        }
        if self.dashboard.chart_days == 0 {
            errors.push("dashboard.chart_days must be > 0".to_string());
        }
        for (name, days) in [
            ("history_days", self.dashboard.history_days),
            ("warmup_days", self.dashboard.warmup_days),
            ("chart_days", self.dashboard.chart_days),
        ] {
            if days > MAX_LOOKBACK_DAYS {
                errors.push(format!("dashboard.{} must be <= {}", name, MAX_LOOKBACK_DAYS));
            }
        }

        // Indicator validation
        let ind = &self.indicators;
        if ind.ema_periods.iter().any(|p| *p == 0) {
            errors.push("indicators.ema_periods must all be > 0".to_string());
        }
        if ind.rsi_period == 0 {
            errors.push("indicators.rsi_period must be > 0".to_string());
        }
        if ind.bollinger_period == 0 {
            errors.push("indicators.bollinger_period must be > 0".to_string());
        }
        if ind.bollinger_std_dev.is_sign_negative() || ind.bollinger_std_dev.is_zero() {
            errors.push("indicators.bollinger_std_dev must be > 0".to_string());
        }
        if ind.macd_fast == 0 || ind.macd_signal == 0 {
            errors.push("indicators.macd periods must be > 0".to_string());
        }
        if ind.macd_fast >= ind.macd_slow {
            errors.push("indicators.macd_fast must be < macd_slow".to_string());
        }
        if (self.dashboard.warmup_days as usize) < ind.longest_period() {
            errors.push(format!(
                "dashboard.warmup_days must cover the longest indicator window ({} days)",
                ind.longest_period()
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    /// Trailing window of predictions to score.
    pub history_days: u32,
    pub refresh_interval_secs: u64,
    /// Extra candles fetched ahead of the chart so indicators have settled.
    pub warmup_days: u32,
    pub chart_days: u32,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            history_days: 30,
            refresh_interval_secs: 60,
            warmup_days: 60,
            chart_days: 90,
        }
    }
}
