//! Decimal quantities and their TEXT storage.
//!
//! Volumes, masses, levels and gauge values are persisted as `Decimal`
//! strings. Sums are taken over decimals and converted to `f64` only when
//! handed back to callers.

use crate::error::{Error, Result};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Decimal places kept for every stored quantity.
pub const QUANTITY_DP: u32 = 6;

/// `None` for NaN, infinities and magnitudes a `Decimal` cannot hold.
pub fn decimal(value: f64) -> Option<Decimal> {
    Decimal::from_f64(value).map(|d| d.round_dp(QUANTITY_DP).normalize())
}

pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

pub fn to_text(value: f64) -> Result<String> {
    decimal(value)
        .map(|d| d.to_string())
        .ok_or_else(|| Error::Validation(format!("{value} is not a storable quantity")))
}

pub fn to_text_opt(value: Option<f64>) -> Result<Option<String>> {
    value.map(to_text).transpose()
}

pub fn parse(text: &str) -> Result<Decimal> {
    Decimal::from_str(text).map_err(|e| Error::Corrupt(format!("stored quantity {text:?}: {e}")))
}

pub fn from_text(text: &str) -> Result<f64> {
    parse(text).map(to_f64)
}

pub fn from_text_opt(text: Option<&str>) -> Result<Option<f64>> {
    text.map(from_text).transpose()
}
