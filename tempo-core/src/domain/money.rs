use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::Duration;

/// A monetary amount in minor units (hundredths) of a currency.
///
/// The core only produces raw amount/currency pairs; locale-aware formatting
/// is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    pub minor_units: i64,
    pub currency: String,
}

impl Money {
    pub fn new(minor_units: i64, currency: impl Into<String>) -> Self {
        Self {
            minor_units,
            currency: currency.into(),
        }
    }

    /// Amount earned for `duration` at this hourly rate, rounded half-up to
    /// the nearest minor unit.
    pub fn for_duration(&self, duration: Duration) -> Money {
        let seconds = i128::from(duration.whole_seconds());
        let scaled = seconds * i128::from(self.minor_units) * 2 + 3600;
        let minor_units = scaled.div_euclid(7200) as i64;
        Money::new(minor_units, self.currency.clone())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.minor_units < 0 { "-" } else { "" };
        let abs = self.minor_units.unsigned_abs();
        write!(f, "{}{}.{:02} {}", sign, abs / 100, abs % 100, self.currency)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyParseError {
    #[error("expected '<amount> <currency>', got '{0}'")]
    Shape(String),
    #[error("invalid amount '{0}'")]
    Amount(String),
    #[error("invalid currency code '{0}'")]
    Currency(String),
}

impl FromStr for Money {
    type Err = MoneyParseError;

    /// Parses `"10.50 USD"` style strings. At most two decimal places are
    /// accepted and the currency must be three ASCII letters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let (Some(amount), Some(currency), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(MoneyParseError::Shape(s.to_string()));
        };

        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(MoneyParseError::Currency(currency.to_string()));
        }

        let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));
        if whole.is_empty()
            || fraction.len() > 2
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(MoneyParseError::Amount(amount.to_string()));
        }

        let whole: i64 = whole
            .parse()
            .map_err(|_| MoneyParseError::Amount(amount.to_string()))?;
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().unwrap_or(0) * 10,
            _ => fraction.parse::<i64>().unwrap_or(0),
        };

        let minor_units = whole
            .checked_mul(100)
            .and_then(|units| units.checked_add(fraction))
            .ok_or_else(|| MoneyParseError::Amount(amount.to_string()))?;

        Ok(Money::new(minor_units, currency.to_ascii_uppercase()))
    }
}

/// Sales summed per currency code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sales(BTreeMap<String, i64>);

impl Sales {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, money: &Money) {
        *self.0.entry(money.currency.clone()).or_insert(0) += money.minor_units;
    }

    pub fn merge(&mut self, other: &Sales) {
        for (currency, amount) in &other.0 {
            *self.0.entry(currency.clone()).or_insert(0) += amount;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|amount| *amount == 0)
    }

    pub fn get(&self, currency: &str) -> i64 {
        self.0.get(currency).copied().unwrap_or(0)
    }

    /// Amounts ordered by currency code.
    pub fn amounts(&self) -> impl Iterator<Item = Money> + '_ {
        self.0
            .iter()
            .map(|(currency, amount)| Money::new(*amount, currency.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_amount_with_currency() {
        assert_eq!("10.50 usd".parse::<Money>(), Ok(Money::new(1050, "USD")));
        assert_eq!("10 EUR".parse::<Money>(), Ok(Money::new(1000, "EUR")));
        assert_eq!("0.5 EUR".parse::<Money>(), Ok(Money::new(50, "EUR")));
    }

    #[test]
    fn rejects_malformed_amounts() {
        assert!(matches!(
            "10.505 USD".parse::<Money>(),
            Err(MoneyParseError::Amount(_))
        ));
        assert!(matches!(
            "ten USD".parse::<Money>(),
            Err(MoneyParseError::Amount(_))
        ));
        assert!(matches!(
            "10 DOLLARS".parse::<Money>(),
            Err(MoneyParseError::Currency(_))
        ));
        assert!(matches!("10".parse::<Money>(), Err(MoneyParseError::Shape(_))));
        assert!(matches!(
            "99999999999999999 USD".parse::<Money>(),
            Err(MoneyParseError::Amount(_))
        ));
    }

    #[test]
    fn sales_for_duration_round_half_up() {
        let rate = Money::new(1000, "USD");
        assert_eq!(rate.for_duration(Duration::minutes(105)).minor_units, 1750);
        // 1 second at 10.00/h is 0.2777 cents
        assert_eq!(rate.for_duration(Duration::seconds(1)).minor_units, 0);
        // 18 seconds at 1.00/h is exactly half a cent
        let cheap = Money::new(100, "USD");
        assert_eq!(cheap.for_duration(Duration::seconds(18)).minor_units, 1);
    }

    #[test]
    fn display_formats_two_decimals() {
        assert_eq!(Money::new(1750, "USD").to_string(), "17.50 USD");
        assert_eq!(Money::new(-5, "EUR").to_string(), "-0.05 EUR");
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_string(&Money::new(1050, "USD")).unwrap();
        assert_eq!(json, r#"{"minorUnits":1050,"currency":"USD"}"#);
    }

    #[test]
    fn sales_sum_per_currency() {
        let mut sales = Sales::new();
        sales.add(&Money::new(100, "USD"));
        sales.add(&Money::new(250, "EUR"));
        sales.add(&Money::new(50, "USD"));
        assert_eq!(sales.get("USD"), 150);
        assert_eq!(sales.get("EUR"), 250);
        let currencies: Vec<_> = sales.amounts().map(|m| m.currency).collect();
        assert_eq!(currencies, vec!["EUR", "USD"]);
    }
}
