// Numeric coercion helpers shared by models and services

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

/// Clamp a decimal to zero from below.
pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// Sum that stops at the representable bounds instead of panicking.
pub fn saturating_sum(values: impl IntoIterator<Item = Decimal>) -> Decimal {
    values
        .into_iter()
        .fold(Decimal::ZERO, |acc, v| acc.saturating_add(v))
}

/// Sum that reports overflow as `None`.
pub fn checked_sum(values: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
}

/// Coerce an arbitrary JSON value into a non-negative amount.
///
/// Numbers and numeric strings keep their value, negatives clamp to zero and
/// everything else (null, booleans, garbage strings, non-finite floats) is 0.
pub fn coerce_amount(value: &Value) -> Decimal {
    let parsed = match value {
        Value::Number(n) => parse_decimal(&n.to_string())
            .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
        Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    };
    non_negative(parsed.unwrap_or(Decimal::ZERO))
}

/// Like [`coerce_amount`], additionally capped at 100.
pub fn coerce_percent(value: &Value) -> Decimal {
    coerce_amount(value).min(dec!(100))
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
        .or_else(|| {
            raw.parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .and_then(Decimal::from_f64)
        })
}

pub fn de_amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(coerce_amount(&raw))
}

pub fn de_percent<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(coerce_percent(&raw))
}

/// Optional percent: absent, null or malformed input yields `None`.
pub fn de_opt_percent<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(match &raw {
        Value::Number(_) => Some(coerce_percent(&raw)),
        Value::String(s) if parse_decimal(s.trim()).is_some() => Some(coerce_percent(&raw)),
        _ => None,
    })
}

/// Optional amount for partial updates: absent or null stays `None`.
pub fn de_opt_amount<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(match raw {
        Value::Null => None,
        other => Some(coerce_amount(&other)),
    })
}

pub fn de_opt_percent_update<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(match raw {
        Value::Null => None,
        other => Some(coerce_percent(&other)),
    })
}
