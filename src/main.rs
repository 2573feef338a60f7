mod api;
mod config;
mod dashboard;
mod evaluation;
mod indicators;
mod types;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{error, info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use api::{ApiError, CandleRange, PredictionApi, PredictionApiClient};
use config::{Settings, MAX_LOOKBACK_DAYS};
use dashboard::{DashboardRefresher, DashboardSnapshot, DashboardState};
use evaluation::{aggregate_accuracy, evaluate_all};
use indicators::{BollingerOutput, ChartSeries, RSIZone};
use types::{price_samples, EvaluatedPrediction, PredictionRecord};

#[derive(Parser)]
#[command(name = "btc-dashboard")]
#[command(version = "0.1.0")]
#[command(about = "Scores Bitcoin direction predictions against daily closes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Score recent predictions and print accuracy statistics
    Evaluate {
        /// Days of prediction history (default: dashboard.history_days)
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=MAX_LOOKBACK_DAYS as i64))]
        days: Option<u32>,
    },
    /// Print the latest indicator values for the daily chart
    Indicators {
        /// Days to display (default: dashboard.chart_days)
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=MAX_LOOKBACK_DAYS as i64))]
        days: Option<u32>,
    },
    /// Show the prediction for tomorrow, if one exists
    Tomorrow,
    /// Show the most recent prediction
    Latest,
    /// Trigger generation of a new prediction on the backend
    Generate,
    /// Show recent runs of the prediction workflow
    Workflow,
    /// Show backend status
    Status,
    /// Show the current BTC-USD ticker
    Ticker,
    /// Keep the dashboard refreshed until Ctrl+C
    Watch {
        /// Refresh interval in seconds (default: dashboard.refresh_interval_secs)
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..=86_400))]
        interval: Option<u64>,
    },
    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut settings = config::load(&cli.config)?;
    let client = PredictionApiClient::new(&settings.api)
        .with_context(|| format!("creating client for {}", settings.api.base_url))?;

    let result = match cli.command {
        Commands::Evaluate { days } => {
            let days = days.unwrap_or(settings.dashboard.history_days);
            evaluate(&client, days).await
        }
        Commands::Indicators { days } => {
            if let Some(days) = days {
                settings.dashboard.chart_days = days;
            }
            show_indicators(&client, &settings).await
        }
        Commands::Tomorrow => show_tomorrow(&client).await,
        Commands::Latest => show_latest(&client).await,
        Commands::Generate => generate(&client).await,
        Commands::Workflow => show_workflow(&client).await,
        Commands::Status => show_status(&client).await,
        Commands::Ticker => show_ticker(&client).await,
        Commands::Watch { interval } => {
            if let Some(secs) = interval {
                settings.dashboard.refresh_interval_secs = secs;
            }
            watch_dashboard(client, settings).await
        }
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&settings)?);
            Ok(())
        }
    };

    if let Err(e) = &result {
        error!("{:#}", e);
        if e.downcast_ref::<ApiError>().is_some_and(ApiError::is_transient) {
            error!("Backend unreachable or failing, retry the command later");
        }
    }
    result
}

async fn evaluate(client: &PredictionApiClient, days: u32) -> Result<()> {
    info!("Evaluating predictions from the last {} days", days);

    let predictions = client.prediction_history(days).await?;
    let range = CandleRange::trailing_days(Utc::now(), days as i64 + 2);
    let candles = client.daily_candles(range).await?;

    let today = Utc::now().date_naive();
    let evaluated = evaluate_all(&predictions, &price_samples(&candles), today);

    print_predictions(&evaluated);
    aggregate_accuracy(&evaluated).print_summary();
    Ok(())
}

fn print_predictions(evaluated: &[EvaluatedPrediction]) {
    println!("\n=== Predictions ===");
    if evaluated.is_empty() {
        println!("No predictions in range");
        return;
    }

    for e in evaluated {
        let p = &e.prediction;
        let actual = e
            .actual_direction
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        let change = e
            .price_change_pct()
            .map(|c| format!("{:+.2}%", c))
            .unwrap_or_default();
        println!(
            "{} | {:<4} | conf {:>5.1}% | actual {:<4} {:>8} | {}",
            p.prediction_date,
            p.direction,
            p.confidence_score * Decimal::from(100),
            actual,
            change,
            e.outcome
        );
    }
}

fn print_prediction(prediction: &PredictionRecord) {
    println!(
        "{}: {} with {:.1}% confidence (generated {})",
        prediction.prediction_date,
        prediction.direction,
        prediction.confidence_score * Decimal::from(100),
        prediction.created_at.format("%Y-%m-%d %H:%M UTC")
    );
}

async fn show_indicators(client: &PredictionApiClient, settings: &Settings) -> Result<()> {
    let display_days = settings.dashboard.chart_days;
    let fetch_days = display_days as i64 + settings.dashboard.warmup_days as i64;
    let candles = client
        .daily_candles(CandleRange::trailing_days(Utc::now(), fetch_days))
        .await?;
    info!(
        "Computing indicators over {} candles ({} displayed)",
        candles.len(),
        display_days
    );

    let chart = ChartSeries::build(&candles, display_days as usize, &settings.indicators);
    print_chart(&chart);
    Ok(())
}

fn print_chart(chart: &ChartSeries) {
    println!("\n=== BTC-USD Daily Indicators ===");
    let (Some(close), Some(time)) = (chart.closes.last(), chart.times.last()) else {
        println!("No candles available");
        return;
    };

    println!("Last Close:   ${:.2} ({})", close, time.format("%Y-%m-%d"));
    for line in &chart.ema {
        if let Some(value) = line.values.last() {
            println!("EMA({:>3}):     ${:.2}", line.period, value);
        }
    }

    match chart.latest_rsi() {
        Some(rsi) => println!("RSI:          {:.1} ({})", rsi, RSIZone::classify(rsi).as_str()),
        None => println!("RSI:          insufficient history"),
    }

    match chart.latest_bollinger() {
        Some(bands @ BollingerOutput { upper, middle, lower }) => {
            println!("Bollinger:    ${:.2} / ${:.2} / ${:.2}", upper, middle, lower);
            if let Some(width) = bands.bandwidth() {
                let position = bands.position(*close);
                println!("  Bandwidth:  {:.2}% | close {:?}", width, position);
                if position.is_extreme() {
                    println!("  Close is outside the bands");
                }
            }
        }
        None => println!("Bollinger:    insufficient history"),
    }

    if let Some(macd) = chart.latest_macd() {
        println!(
            "MACD:         {:.2} | signal {:.2} | hist {:.2} ({:?})",
            macd.macd_line,
            macd.signal_line,
            macd.histogram,
            macd.trend()
        );
    }
}

async fn show_tomorrow(client: &PredictionApiClient) -> Result<()> {
    println!("\n=== Tomorrow's Prediction ===");
    match client.tomorrow_prediction().await? {
        Some(prediction) => print_prediction(&prediction),
        None => println!("No prediction for tomorrow yet"),
    }
    Ok(())
}

async fn show_latest(client: &PredictionApiClient) -> Result<()> {
    let latest = client.latest_prediction().await?;

    println!("\n=== Latest Prediction ===");
    match latest.prediction {
        Some(prediction) if latest.has_prediction => {
            print_prediction(&prediction);
            if latest.is_future_prediction == Some(true) {
                println!("(future date, not yet resolvable)");
            }
        }
        _ => println!("No predictions stored"),
    }
    Ok(())
}

async fn generate(client: &PredictionApiClient) -> Result<()> {
    let resp = client.generate_prediction().await?;
    info!("Prediction generation: {} ({})", resp.message, resp.status);
    info!("Run `btc-dashboard workflow` to follow its progress");
    Ok(())
}

async fn show_workflow(client: &PredictionApiClient) -> Result<()> {
    let status = client.workflow_status().await?;

    println!("\n=== Prediction Workflow ({}) ===", status.repository);
    if status.workflow_runs.is_empty() {
        println!("No recent runs");
    }
    for run in &status.workflow_runs {
        println!(
            "#{:<5} {} | {:<11} | {}",
            run.run_number,
            run.created_at.format("%Y-%m-%d %H:%M UTC"),
            run.outcome(),
            run.html_url
        );
    }
    if let Some(run) = status.latest() {
        if !run.is_finished() {
            info!("Latest run still {}, check again shortly", run.status);
        }
    }
    println!("All runs: {}", status.actions_url);
    Ok(())
}

async fn show_status(client: &PredictionApiClient) -> Result<()> {
    let status = client.system_status().await?;

    println!("\n=== {} v{} ===", status.name, status.version);
    println!("Status:            {}", status.status);
    if !status.is_online() {
        warn!("Backend reports status '{}'", status.status);
    }
    println!("Server Time:       {}", status.system_time);
    println!("Current Date:      {}", status.current_date);
    println!("Tomorrow Ready:    {}", if status.has_tomorrow_prediction { "yes" } else { "no" });
    match status.latest_prediction_date {
        Some(date) => println!("Latest Prediction: {}", date),
        None => println!("Latest Prediction: none"),
    }
    Ok(())
}

async fn show_ticker(client: &PredictionApiClient) -> Result<()> {
    let ticker = client.ticker().await?;
    println!(
        "BTC-USD: ${:.2} | bid ${:.2} / ask ${:.2} | spread ${:.2} | 24h vol {:.2} BTC",
        ticker.price,
        ticker.bid,
        ticker.ask,
        ticker.spread(),
        ticker.volume_24h
    );
    Ok(())
}

async fn watch_dashboard(client: PredictionApiClient, settings: Settings) -> Result<()> {
    let state = DashboardState::new();
    let refresher = Arc::new(DashboardRefresher::new(Arc::new(client), state.clone(), settings));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut events = state.subscribe();

    let task = {
        let refresher = Arc::clone(&refresher);
        tokio::spawn(async move { refresher.run(shutdown_rx).await })
    };

    info!("Press Ctrl+C to stop");

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Ok(dashboard::DashboardEvent::Refreshed { .. }) => {
                        if let Some(snapshot) = state.snapshot().await {
                            print_snapshot(&snapshot);
                        }
                    }
                    Ok(dashboard::DashboardEvent::RefreshFailed { error, .. }) => {
                        error!("Refresh failed, showing previous data: {}", error);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Display fell behind by {} refreshes", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down...");
                break;
            }
        }
    }

    let _ = shutdown_tx.send(true);
    task.await?;
    Ok(())
}

fn print_snapshot(snapshot: &DashboardSnapshot) {
    println!(
        "\n--- Refresh #{} at {} ---",
        snapshot.generation,
        snapshot.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if let Some(close) = snapshot.latest_close {
        println!("Last Close: ${:.2}", close);
    }
    match &snapshot.tomorrow {
        Some(p) => print_prediction(p),
        None => println!("No prediction for tomorrow yet"),
    }
    snapshot.report.print_summary();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_workflow_command() {
        let cli = Cli::try_parse_from(["btc-dashboard", "workflow"]).unwrap();
        assert!(matches!(cli.command, Commands::Workflow));
        assert_eq!(cli.config, "config.toml");
    }

    #[test]
    fn test_day_arguments_are_bounded() {
        let cli = Cli::try_parse_from(["btc-dashboard", "evaluate", "--days", "3650"]).unwrap();
        assert!(matches!(cli.command, Commands::Evaluate { days: Some(3650) }));

        assert!(Cli::try_parse_from(["btc-dashboard", "evaluate", "--days", "4294967295"]).is_err());
        assert!(Cli::try_parse_from(["btc-dashboard", "indicators", "--days", "0"]).is_err());
        assert!(Cli::try_parse_from(["btc-dashboard", "watch", "--interval", "0"]).is_err());
    }
}
