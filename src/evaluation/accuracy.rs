use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Direction, EvaluatedPrediction, Outcome};

/// Hit-rate counters for one slice of predictions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AccuracyStats {
    pub resolved: u64,
    pub correct: u64,
    pub incorrect: u64,
    /// `correct / resolved`, zero when nothing has resolved yet.
    pub accuracy: Decimal,
}

impl AccuracyStats {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Correct => self.correct += 1,
            Outcome::Incorrect => self.incorrect += 1,
            Outcome::Pending => return,
        }
        self.resolved += 1;
        self.accuracy = Decimal::from(self.correct) / Decimal::from(self.resolved);
    }

    pub fn has_resolved(&self) -> bool {
        self.resolved > 0
    }

    pub fn accuracy_pct(&self) -> Decimal {
        self.accuracy * Decimal::from(100)
    }

    fn display(&self) -> String {
        if self.has_resolved() {
            format!("{:.1}% ({}/{})", self.accuracy_pct(), self.correct, self.resolved)
        } else {
            "N/A".to_string()
        }
    }
}

/// Aggregate accuracy of a batch of evaluated predictions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccuracyReport {
    pub total: u64,
    pub pending: u64,
    pub overall: AccuracyStats,
    pub up: AccuracyStats,
    pub down: AccuracyStats,
    /// Consecutive correct calls counting back from the latest resolved date.
    pub current_streak: u64,
    /// Mean confidence over every prediction, pending ones included.
    pub average_confidence: Decimal,
}

impl AccuracyReport {
    pub fn has_resolved(&self) -> bool {
        self.overall.has_resolved()
    }

    pub fn total_accuracy(&self) -> Decimal {
        self.overall.accuracy
    }

    pub fn print_summary(&self) {
        println!("\n{}", "=".repeat(60));
        println!("                  PREDICTION ACCURACY");
        println!("{}", "=".repeat(60));
        println!("Predictions:        {} ({} pending)", self.total, self.pending);
        println!("Overall Accuracy:   {}", self.overall.display());
        println!("{}", "-".repeat(60));
        println!("BY DIRECTION");
        println!("  Up Calls:         {}", self.up.display());
        println!("  Down Calls:       {}", self.down.display());
        println!("{}", "-".repeat(60));
        println!("Current Streak:     {}", self.current_streak);
        println!("Avg Confidence:     {:.1}%", self.average_confidence * Decimal::from(100));
        println!("{}", "=".repeat(60));
    }
}

pub fn aggregate_accuracy(evaluated: &[EvaluatedPrediction]) -> AccuracyReport {
    let mut report = AccuracyReport {
        total: evaluated.len() as u64,
        ..AccuracyReport::default()
    };

    let mut confidence_sum = Decimal::ZERO;
    for e in evaluated {
        confidence_sum += e.prediction.confidence_score;
        if e.outcome == Outcome::Pending {
            report.pending += 1;
            continue;
        }
        report.overall.record(e.outcome);
        match e.prediction.direction {
            Direction::Up => report.up.record(e.outcome),
            Direction::Down => report.down.record(e.outcome),
        }
    }

    if !evaluated.is_empty() {
        report.average_confidence = confidence_sum / Decimal::from(report.total);
    }
    report.current_streak = current_streak(evaluated);
    report
}

fn current_streak(evaluated: &[EvaluatedPrediction]) -> u64 {
    let mut resolved: Vec<&EvaluatedPrediction> =
        evaluated.iter().filter(|e| e.outcome.is_resolved()).collect();
    resolved.sort_by(|a, b| b.prediction.prediction_date.cmp(&a.prediction.prediction_date));

    resolved
        .iter()
        .take_while(|e| e.outcome == Outcome::Correct)
        .count() as u64
}
