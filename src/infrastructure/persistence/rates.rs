//! # Rate Set Serialization
//!
//! Flattens a [`RateSet`] into rows and a multi-row `INSERT ... VALUES`
//! statement for a bulk insert.

use crate::domain::value_objects::{RateError, RateKind, RateSet};
use sqlx::{Postgres, QueryBuilder};

/// One stored rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateRow {
    /// Owning provider id.
    pub provider_id: i64,
    /// Lower-cased denomination.
    pub denom: String,
    /// Amount.
    pub amount: i64,
}

/// A bulk insert of rates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RateInsert {
    /// Rows in insertion order.
    pub rows: Vec<RateRow>,
}

impl RateInsert {
    /// Returns true if there is nothing to insert.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `INSERT` statement into the table for `kind`, one value group per row
    /// with its own placeholders (`($1, $2, $3), ($4, $5, $6)`).
    ///
    /// Returns `None` when there are no rows, since an insert without value
    /// groups is malformed.
    #[must_use]
    pub fn statement(&self, kind: RateKind) -> Option<QueryBuilder<'static, Postgres>> {
        if self.is_empty() {
            return None;
        }
        let mut builder = QueryBuilder::new(format!(
            "INSERT INTO {} (provider_id, token_name, token_amount) ",
            kind.table()
        ));
        builder.push_values(&self.rows, |mut group, row| {
            group
                .push_bind(row.provider_id)
                .push_bind(row.denom.clone())
                .push_bind(row.amount);
        });
        Some(builder)
    }
}

/// Builds the bulk-insert rows for `rates` owned by `provider_id`.
///
/// Denominations are lower-cased and amounts converted to `i64`.
///
/// # Errors
///
/// Returns [`RateError::AmountOutOfRange`] if an amount exceeds `i64::MAX`.
///
/// # Examples
///
/// ```
/// use provider_directory::domain::value_objects::{RateKind, RateSet};
/// use provider_directory::infrastructure::persistence::rates::build_insert_args;
///
/// let rates: RateSet = "10UARKEO,3uatom".parse().unwrap();
/// let insert = build_insert_args(7, &rates).unwrap();
/// let statement = insert.statement(RateKind::Subscription).unwrap();
/// assert!(statement.sql().ends_with("VALUES ($1, $2, $3), ($4, $5, $6)"));
/// assert_eq!(insert.rows[0].denom, "uarkeo");
/// ```
pub fn build_insert_args(provider_id: i64, rates: &RateSet) -> Result<RateInsert, RateError> {
    let rows = rates
        .iter()
        .map(|coin| {
            Ok(RateRow {
                provider_id,
                denom: coin.denom.to_lowercase(),
                amount: coin.amount_i64()?,
            })
        })
        .collect::<Result<Vec<_>, RateError>>()?;

    Ok(RateInsert { rows })
}
