use std::collections::HashMap;

use rust_decimal::Decimal;

/// Conversion-rate source for pairs whose maker and taker quote in
/// different assets (e.g. USD vs USDT). Identity when the assets match.
pub trait RateOracle: Send + Sync {
    fn convert_token_value(&self, amount: Decimal, from: &str, to: &str) -> Decimal;
}

/// Static rate table. Rates are stored per (from, to) edge; the reverse
/// edge is derived. Unknown edges convert at par.
#[derive(Debug, Default)]
pub struct FixedRateOracle {
    rates: HashMap<(String, String), Decimal>,
}

impl FixedRateOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(mut self, from: &str, to: &str, rate: Decimal) -> Self {
        self.rates
            .insert((from.to_string(), to.to_string()), rate);
        self
    }
}

impl RateOracle for FixedRateOracle {
    fn convert_token_value(&self, amount: Decimal, from: &str, to: &str) -> Decimal {
        if from == to {
            return amount;
        }
        if let Some(rate) = self.rates.get(&(from.to_string(), to.to_string())) {
            return amount * rate;
        }
        if let Some(rate) = self.rates.get(&(to.to_string(), from.to_string())) {
            if !rate.is_zero() {
                return amount / rate;
            }
        }
        amount
    }
}
