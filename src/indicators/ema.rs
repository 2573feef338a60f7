use rust_decimal::Decimal;

/// Exponential moving average seeded with the first price it sees.
#[derive(Debug, Clone)]
pub struct EMA {
    multiplier: Decimal,
    value: Option<Decimal>,
}

impl EMA {
    pub fn new(period: usize) -> Self {
        let multiplier = Decimal::from(2) / Decimal::from(period as u32 + 1);
        Self {
            multiplier,
            value: None,
        }
    }

    pub fn update(&mut self, price: Decimal) -> Decimal {
        let next = match self.value {
            Some(prev) => (price - prev) * self.multiplier + prev,
            None => price,
        };
        self.value = Some(next);
        next
    }
}

/// EMA at every index of `prices`. Shorter inputs than `period` are still
/// averaged; the early values just lean harder on the seed.
pub fn ema_series(prices: &[Decimal], period: usize) -> Vec<Decimal> {
    if period == 0 {
        return Vec::new();
    }
    let mut ema = EMA::new(period);
    prices.iter().map(|p| ema.update(*p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_constant_series_is_flat() {
        let prices = vec![dec!(42.5); 40];
        let ema = ema_series(&prices, 14);
        assert_eq!(ema.len(), 40);
        assert!(ema.iter().all(|v| *v == dec!(42.5)));
    }

    #[test]
    fn test_seed_and_recurrence() {
        // period 3 -> k = 0.5
        let ema = ema_series(&[dec!(10), dec!(20), dec!(20)], 3);
        assert_eq!(ema, vec![dec!(10), dec!(15), dec!(17.5)]);
    }

    #[test]
    fn test_short_input_still_defined() {
        let ema = ema_series(&[dec!(1), dec!(3)], 50);
        assert_eq!(ema.len(), 2);
        assert_eq!(ema[0], dec!(1));
        assert!(ema[1] > dec!(1) && ema[1] < dec!(3));
    }

    #[test]
    fn test_empty_and_zero_period() {
        assert!(ema_series(&[], 10).is_empty());
        assert!(ema_series(&[dec!(1)], 0).is_empty());
    }

    #[test]
    fn test_streaming_matches_series() {
        let prices = vec![dec!(5), dec!(7), dec!(6), dec!(9)];
        let mut ema = EMA::new(4);
        let streamed: Vec<Decimal> = prices.iter().map(|p| ema.update(*p)).collect();
        assert_eq!(streamed, ema_series(&prices, 4));
    }
}
