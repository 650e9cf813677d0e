//! Unit normalization for iftop magnitudes
//!
//! iftop prints rates as `12.3Mb` (bits per second) and cumulative totals as
//! `4.56KB` (bytes). Multipliers are decimal (`K` = 1000), and the final
//! letter is case-sensitive: `b` for bits, `B` for bytes.

use std::fmt;

use thiserror::Error;

/// Errors that can occur while normalizing a magnitude
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UnitError {
    /// The input was empty or whitespace only
    #[error("Empty magnitude")]
    Empty,

    /// The numeric part could not be parsed
    #[error("Invalid number in magnitude '{0}'")]
    InvalidNumber(String),

    /// The suffix is not one of `b`/`B` with an optional `K`/`M`/`G`/`T` prefix
    #[error("Unknown unit suffix in magnitude '{0}'")]
    UnknownSuffix(String),
}

/// First value past `u64::MAX` (2^64), exactly representable as `f64`
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

/// Result type for unit normalization
pub type UnitResult<T> = std::result::Result<T, UnitError>;

/// Base unit a magnitude is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// Bits (lowercase `b`), used for rates
    Bits,
    /// Bytes (uppercase `B`), used for cumulative totals
    Bytes,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bits => write!(f, "b"),
            Self::Bytes => write!(f, "B"),
        }
    }
}

/// A normalized magnitude: an integer count of the base unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Quantity {
    /// Value in the base unit (bits or bytes), rounded to the nearest integer
    pub value: u64,
    /// Base unit
    pub kind: UnitKind,
}

impl Quantity {
    /// Parses a magnitude such as `1.5Mb`, `980Kb`, `0b` or `2.3MB`.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError`] if the number or the suffix is not recognized.
    pub fn parse(text: &str) -> UnitResult<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(UnitError::Empty);
        }

        let kind = match text.chars().last() {
            Some('b') => UnitKind::Bits,
            Some('B') => UnitKind::Bytes,
            _ => return Err(UnitError::UnknownSuffix(text.to_string())),
        };
        let rest = &text[..text.len() - 1];

        let (number, multiplier) = match rest.chars().last() {
            Some('K') => (&rest[..rest.len() - 1], 1e3),
            Some('M') => (&rest[..rest.len() - 1], 1e6),
            Some('G') => (&rest[..rest.len() - 1], 1e9),
            Some('T') => (&rest[..rest.len() - 1], 1e12),
            Some(c) if c.is_ascii_digit() || c == '.' => (rest, 1.0),
            _ => return Err(UnitError::UnknownSuffix(text.to_string())),
        };

        if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit() || c == '.') {
            return Err(UnitError::InvalidNumber(text.to_string()));
        }
        let number: f64 = number
            .parse()
            .map_err(|_| UnitError::InvalidNumber(text.to_string()))?;

        let value = (number * multiplier).round();
        if !value.is_finite() || value >= U64_LIMIT {
            return Err(UnitError::InvalidNumber(text.to_string()));
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let value = value as u64;
        Ok(Self { value, kind })
    }

    /// Parses a magnitude and checks it is expressed in `expected`
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::UnknownSuffix`] when the unit kind differs.
    pub fn parse_as(text: &str, expected: UnitKind) -> UnitResult<u64> {
        let quantity = Self::parse(text)?;
        if quantity.kind != expected {
            return Err(UnitError::UnknownSuffix(text.trim().to_string()));
        }
        Ok(quantity.value)
    }
}

/// Converts a magnitude to its numeric value in the base unit.
///
/// `to_numeric("1.5Mb") == to_numeric("1500Kb") == Ok(1_500_000)`.
///
/// # Errors
///
/// Returns [`UnitError`] for anything that is not a valid iftop magnitude.
pub fn to_numeric(text: &str) -> UnitResult<u64> {
    Quantity::parse(text).map(|q| q.value)
}
