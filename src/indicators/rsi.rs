use rust_decimal::Decimal;

pub const DEFAULT_RSI_PERIOD: usize = 14;

/// Relative strength index from plain sums of the trailing `period` price changes.
///
/// This is not Wilder's smoothed RSI. A window without losses divides by one
/// instead of zero, so quiet uptrends read high but never exactly 100.
/// Indices before `period` have no value.
pub fn rsi_series(prices: &[Decimal], period: usize) -> Vec<Option<Decimal>> {
    let mut out = vec![None; prices.len()];
    if period == 0 {
        return out;
    }

    let hundred = Decimal::from(100);
    for i in period..prices.len() {
        let mut gains = Decimal::ZERO;
        let mut losses = Decimal::ZERO;
        for j in (i + 1 - period)..=i {
            let change = prices[j] - prices[j - 1];
            if change > Decimal::ZERO {
                gains += change;
            } else {
                losses -= change;
            }
        }
        if losses.is_zero() {
            losses = Decimal::ONE;
        }
        let rs = gains / losses;
        out[i] = Some(hundred - hundred / (Decimal::ONE + rs));
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RSIZone {
    Oversold,
    BearishNeutral,
    BullishNeutral,
    Overbought,
}

impl RSIZone {
    pub fn classify(value: Decimal) -> Self {
        if value < Decimal::from(30) {
            RSIZone::Oversold
        } else if value > Decimal::from(70) {
            RSIZone::Overbought
        } else if value < Decimal::from(50) {
            RSIZone::BearishNeutral
        } else {
            RSIZone::BullishNeutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RSIZone::Oversold => "oversold",
            RSIZone::BearishNeutral => "bearish",
            RSIZone::BullishNeutral => "bullish",
            RSIZone::Overbought => "overbought",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_warmup_indices_are_empty() {
        let prices: Vec<Decimal> = (1..=20).map(Decimal::from).collect();
        let rsi = rsi_series(&prices, 14);
        assert_eq!(rsi.len(), 20);
        assert!(rsi[..14].iter().all(Option::is_none));
        assert!(rsi[14..].iter().all(Option::is_some));
    }

    #[test]
    fn test_rising_series_approaches_100() {
        let mut prices = Vec::new();
        let mut price = dec!(100);
        for _ in 0..80 {
            prices.push(price);
            price *= dec!(1.1);
        }
        let rsi: Vec<Decimal> = rsi_series(&prices, 14).into_iter().flatten().collect();

        assert!(rsi.windows(2).all(|w| w[1] >= w[0]));
        assert!(*rsi.last().unwrap() > dec!(99.9));
        assert!(rsi.iter().all(|v| *v < dec!(100)));
    }

    #[test]
    fn test_known_value() {
        // Two gains of 2 and one loss of 1 in the window: RS = 4, RSI = 80
        let prices = vec![dec!(10), dec!(12), dec!(11), dec!(13)];
        let rsi = rsi_series(&prices, 3);
        assert_eq!(rsi[3], Some(dec!(80)));
    }

    #[test]
    fn test_falling_series_is_low() {
        let prices: Vec<Decimal> = (0..30).map(|i| Decimal::from(100 - i)).collect();
        let rsi = rsi_series(&prices, 14);
        assert_eq!(rsi[20], Some(Decimal::ZERO));
        assert_eq!(RSIZone::classify(Decimal::ZERO), RSIZone::Oversold);
    }

    #[test]
    fn test_zero_period() {
        let rsi = rsi_series(&[dec!(1), dec!(2)], 0);
        assert_eq!(rsi, vec![None, None]);
    }

    #[test]
    fn test_zones() {
        assert_eq!(RSIZone::classify(dec!(75)), RSIZone::Overbought);
        assert_eq!(RSIZone::classify(dec!(55)), RSIZone::BullishNeutral);
        assert_eq!(RSIZone::classify(dec!(45)), RSIZone::BearishNeutral);
    }
}
