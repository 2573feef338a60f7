use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::types::{Direction, EvaluatedPrediction, Outcome, PredictionRecord, PriceSample};

/// Samples further than this from a day's midnight never stand in for that day.
pub const NEAREST_SAMPLE_TOLERANCE_HOURS: i64 = 24;

fn utc_midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Closing price of the sample nearest to `date` at 00:00 UTC.
///
/// Returns `None` unless the nearest sample lies strictly within 24 hours.
/// Equidistant samples resolve to the earlier one, regardless of input order.
pub fn nearest_sample(series: &[PriceSample], date: NaiveDate) -> Option<Decimal> {
    let target = utc_midnight(date);
    let tolerance = Duration::hours(NEAREST_SAMPLE_TOLERANCE_HOURS);

    series
        .iter()
        .map(|s| ((s.timestamp - target).abs(), s))
        .filter(|(distance, _)| *distance < tolerance)
        .min_by(|(da, a), (db, b)| da.cmp(db).then(a.timestamp.cmp(&b.timestamp)))
        .map(|(_, s)| s.closing_price)
}

/// Judge one prediction against the realized closes.
///
/// `today` must already be the UTC calendar date. Predictions for today or later,
/// and predictions whose closes are not in the series yet, stay `Pending`.
pub fn evaluate_prediction(
    prediction: &PredictionRecord,
    series: &[PriceSample],
    today: NaiveDate,
) -> EvaluatedPrediction {
    let target_date = prediction.prediction_date;
    if target_date >= today {
        return EvaluatedPrediction::pending(prediction.clone());
    }

    let prior_date = target_date - Duration::days(1);
    let (target, prior) = match (
        nearest_sample(series, target_date),
        nearest_sample(series, prior_date),
    ) {
        (Some(target), Some(prior)) => (target, prior),
        _ => {
            debug!("No closes within tolerance for prediction {} ({})", prediction.id, target_date);
            return EvaluatedPrediction::pending(prediction.clone());
        }
    };

    // Unchanged closes count as down
    let actual = if target > prior { Direction::Up } else { Direction::Down };
    let outcome = if actual == prediction.direction {
        Outcome::Correct
    } else {
        Outcome::Incorrect
    };

    EvaluatedPrediction {
        prediction: prediction.clone(),
        outcome,
        actual_direction: Some(actual),
        prior_closing_price: Some(prior),
        target_closing_price: Some(target),
    }
}

pub fn evaluate_all(
    predictions: &[PredictionRecord],
    series: &[PriceSample],
    today: NaiveDate,
) -> Vec<EvaluatedPrediction> {
    predictions
        .iter()
        .map(|p| evaluate_prediction(p, series, today))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    fn sample(d: u32, hour: u32, price: Decimal) -> PriceSample {
        PriceSample::new(Utc.with_ymd_and_hms(2025, 5, d, hour, 0, 0).unwrap(), price)
    }

    fn prediction(d: u32, direction: Direction) -> PredictionRecord {
        PredictionRecord {
            id: d as i64,
            prediction_date: day(d),
            direction,
            confidence_score: dec!(0.6),
            created_at: Utc.with_ymd_and_hms(2025, 5, d - 1, 23, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_up_prediction_correct() {
        let series = vec![sample(10, 0, dec!(100)), sample(11, 0, dec!(110))];
        let result = evaluate_prediction(&prediction(11, Direction::Up), &series, day(12));

        assert_eq!(result.outcome, Outcome::Correct);
        assert_eq!(result.actual_direction, Some(Direction::Up));
        assert_eq!(result.prior_closing_price, Some(dec!(100)));
        assert_eq!(result.target_closing_price, Some(dec!(110)));
    }

    #[test]
    fn test_down_prediction_incorrect() {
        let series = vec![sample(10, 0, dec!(100)), sample(11, 0, dec!(110))];
        let result = evaluate_prediction(&prediction(11, Direction::Down), &series, day(12));

        assert_eq!(result.outcome, Outcome::Incorrect);
        assert_eq!(result.actual_direction, Some(Direction::Up));
    }

    #[test]
    fn test_today_and_future_are_pending() {
        let series = vec![
            sample(10, 0, dec!(100)),
            sample(11, 0, dec!(110)),
            sample(12, 0, dec!(120)),
        ];
        for d in [12, 13, 20] {
            let result = evaluate_prediction(&prediction(d, Direction::Up), &series, day(12));
            assert_eq!(result.outcome, Outcome::Pending);
            assert_eq!(result.actual_direction, None);
            assert_eq!(result.target_closing_price, None);
        }
    }

    #[test]
    fn test_missing_prior_close_is_pending() {
        let series = vec![sample(8, 0, dec!(100)), sample(11, 0, dec!(110))];
        let result = evaluate_prediction(&prediction(11, Direction::Up), &series, day(12));
        assert_eq!(result.outcome, Outcome::Pending);
    }

    #[test]
    fn test_missing_target_close_is_pending() {
        let series = vec![sample(10, 0, dec!(100))];
        let result = evaluate_prediction(&prediction(11, Direction::Down), &series, day(15));
        assert_eq!(result.outcome, Outcome::Pending);
    }

    #[test]
    fn test_equal_closes_count_as_down() {
        let series = vec![sample(10, 0, dec!(100)), sample(11, 0, dec!(100))];

        let up = evaluate_prediction(&prediction(11, Direction::Up), &series, day(12));
        assert_eq!(up.actual_direction, Some(Direction::Down));
        assert_eq!(up.outcome, Outcome::Incorrect);

        let down = evaluate_prediction(&prediction(11, Direction::Down), &series, day(12));
        assert_eq!(down.outcome, Outcome::Correct);
    }

    #[test]
    fn test_offset_timestamps_within_tolerance() {
        // Exchange candles stamped a few hours off midnight still resolve
        let series = vec![sample(10, 4, dec!(200)), sample(11, 4, dec!(190))];
        let result = evaluate_prediction(&prediction(11, Direction::Down), &series, day(12));
        assert_eq!(result.outcome, Outcome::Correct);
    }

    #[test]
    fn test_nearest_sample_tolerance_is_strict() {
        let series = vec![sample(11, 0, dec!(110))];
        // Exactly 24h away from May 10 midnight
        assert_eq!(nearest_sample(&series, day(10)), None);
        assert_eq!(nearest_sample(&series, day(11)), Some(dec!(110)));

        let late = vec![PriceSample::new(
            Utc.with_ymd_and_hms(2025, 5, 11, 23, 59, 59).unwrap(),
            dec!(111),
        )];
        assert_eq!(nearest_sample(&late, day(11)), Some(dec!(111)));
    }

    #[test]
    fn test_nearest_sample_picks_closest() {
        let series = vec![
            sample(11, 20, dec!(3)),
            sample(11, 2, dec!(1)),
            sample(10, 21, dec!(2)),
        ];
        assert_eq!(nearest_sample(&series, day(11)), Some(dec!(1)));
    }

    #[test]
    fn test_nearest_sample_tie_prefers_earlier() {
        let earlier = sample(10, 18, dec!(1));
        let later = sample(11, 6, dec!(2));

        assert_eq!(nearest_sample(&[earlier, later], day(11)), Some(dec!(1)));
        assert_eq!(nearest_sample(&[later, earlier], day(11)), Some(dec!(1)));
    }

    #[test]
    fn test_nearest_sample_empty_series() {
        assert_eq!(nearest_sample(&[], day(11)), None);
    }

    #[test]
    fn test_evaluate_all_preserves_order() {
        let series = vec![
            sample(9, 0, dec!(90)),
            sample(10, 0, dec!(100)),
            sample(11, 0, dec!(95)),
        ];
        let predictions = vec![
            prediction(12, Direction::Up),
            prediction(11, Direction::Down),
            prediction(10, Direction::Down),
        ];
        let results = evaluate_all(&predictions, &series, day(12));

        let outcomes: Vec<Outcome> = results.iter().map(|r| r.outcome).collect();
        assert_eq!(outcomes, vec![Outcome::Pending, Outcome::Correct, Outcome::Incorrect]);
        assert_eq!(results[0].prediction.id, 12);
    }
}
