//! # Coins and Rate Sets
//!
//! A [`RateSet`] is the price a provider charges, expressed as an ordered
//! list of [`Coin`]s in one or more denominations.
//!
//! # Examples
//!
//! ```
//! use provider_directory::domain::value_objects::coin::{Coin, RateSet};
//!
//! let rates: RateSet = "10uarkeo,5UATOM".parse().unwrap();
//! assert_eq!(rates.len(), 2);
//! assert_eq!(rates.to_string(), "10uarkeo,5UATOM");
//! assert_eq!(rates.normalized().to_string(), "10uarkeo,5uatom");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while parsing or converting rates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateError {
    /// The amount does not fit the storage integer type.
    #[error("amount {amount}{denom} exceeds the storable range")]
    AmountOutOfRange {
        /// Denomination of the offending coin.
        denom: String,
        /// The amount that could not be converted.
        amount: u128,
    },

    /// A coin string could not be parsed.
    #[error("invalid coin '{0}'")]
    InvalidCoin(String),
}

/// A single (denomination, amount) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    /// Currency denomination, e.g. `uarkeo`.
    pub denom: String,
    /// Non-negative integer amount in the smallest unit of `denom`.
    pub amount: u128,
}

impl Coin {
    /// Creates a coin.
    #[must_use]
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    /// Returns a copy with the denomination lower-cased.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            denom: self.denom.to_lowercase(),
            amount: self.amount,
        }
    }

    /// Converts the amount to the signed 64-bit integer used for storage.
    ///
    /// # Errors
    ///
    /// Returns [`RateError::AmountOutOfRange`] if the amount exceeds `i64::MAX`.
    pub fn amount_i64(&self) -> Result<i64, RateError> {
        i64::try_from(self.amount).map_err(|_| RateError::AmountOutOfRange {
            denom: self.denom.clone(),
            amount: self.amount,
        })
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl FromStr for Coin {
    type Err = RateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| RateError::InvalidCoin(s.to_string()))?;
        let (amount, denom) = s.split_at(split);
        if amount.is_empty() || denom.is_empty() {
            return Err(RateError::InvalidCoin(s.to_string()));
        }
        let amount = amount
            .parse::<u128>()
            .map_err(|_| RateError::InvalidCoin(s.to_string()))?;
        Ok(Self::new(denom, amount))
    }
}

/// An ordered collection of coins forming a price.
///
/// Order is preserved as given. Denominations are not deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateSet(Vec<Coin>);

impl RateSet {
    /// Creates an empty rate set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a coin.
    pub fn push(&mut self, coin: Coin) {
        self.0.push(coin);
    }

    /// Returns the number of coins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the set has no coins.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the coins in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Coin> {
        self.0.iter()
    }

    /// Returns the coins as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Coin] {
        &self.0
    }

    /// Returns a copy with every denomination lower-cased.
    #[must_use]
    pub fn normalized(&self) -> Self {
        self.0.iter().map(Coin::normalized).collect()
    }

    /// Returns the amount for a denomination, if present.
    ///
    /// When a denomination appears more than once the last entry wins.
    #[must_use]
    pub fn amount_of(&self, denom: &str) -> Option<u128> {
        self.0
            .iter()
            .rev()
            .find(|c| c.denom.eq_ignore_ascii_case(denom))
            .map(|c| c.amount)
    }
}

impl FromIterator<Coin> for RateSet {
    fn from_iter<I: IntoIterator<Item = Coin>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<Coin>> for RateSet {
    fn from(coins: Vec<Coin>) -> Self {
        Self(coins)
    }
}

impl IntoIterator for RateSet {
    type Item = Coin;
    type IntoIter = std::vec::IntoIter<Coin>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a RateSet {
    type Item = &'a Coin;
    type IntoIter = std::slice::Iter<'a, Coin>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for RateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, coin) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{coin}")?;
        }
        Ok(())
    }
}

impl FromStr for RateSet {
    type Err = RateError;

    /// Parses `"10uarkeo,5uatom"`. An empty or blank string is an empty set.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(Coin::from_str)
            .collect()
    }
}
