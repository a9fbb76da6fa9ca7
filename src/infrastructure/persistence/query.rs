//! # Provider Search Query Composer
//!
//! Turns [`ProviderSearchParams`] into one parameterized PostgreSQL statement
//! over the `providers_v` view.
//!
//! Composition is a pure function: each optional criterion maps to at most
//! one predicate, predicates are folded in a fixed order into the `WHERE`
//! clause, and the metadata join is emitted once, only when a predicate
//! reads `provider_metadata`.
//!
//! # Examples
//!
//! ```
//! use provider_directory::domain::value_objects::ProviderSearchParams;
//! use provider_directory::infrastructure::persistence::query::{compose_search, SqlArg};
//!
//! let params = ProviderSearchParams::new()
//!     .with_service("rpc")
//!     .with_min_free_rate_limit(10);
//! let query = compose_search(&params).unwrap();
//!
//! assert_eq!(query.sql().matches("LEFT JOIN provider_metadata").count(), 1);
//! assert!(query.sql().contains("provider_metadata.free_rate_limit >= $2"));
//! assert_eq!(query.args(), [SqlArg::Text("rpc".into()), SqlArg::BigInt(10)]);
//! ```

use crate::domain::value_objects::{ProviderSearchParams, ProviderSortKey};
use sqlx::{Postgres, QueryBuilder};
use std::fmt;
use thiserror::Error;

/// Fixed projection of a provider search. Nullable columns are coalesced so
/// result rows never carry nulls.
pub const PROVIDER_SEARCH_COLUMNS: &str = "p.id, \
p.created, \
p.updated, \
p.pubkey, \
p.service, \
coalesce(p.status, 'OFFLINE') AS status, \
coalesce(p.metadata_uri, '') AS metadata_uri, \
coalesce(p.metadata_nonce, 0) AS metadata_nonce, \
coalesce(p.subscription_rate, 0) AS subscription_rate, \
coalesce(p.paygo_rate, 0) AS paygo_rate, \
coalesce(p.min_contract_duration, 0) AS min_contract_duration, \
coalesce(p.max_contract_duration, 0) AS max_contract_duration, \
coalesce(p.settlement_duration, 0) AS settlement_duration, \
coalesce(p.bond, 0) AS bond";

const METADATA_JOIN: &str = "LEFT JOIN provider_metadata \
ON p.id = provider_metadata.provider_id AND p.metadata_nonce = provider_metadata.nonce";

/// Errors raised while composing a search.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The sort key is not one of the recognized values.
    #[error("not a valid sortKey '{0}'")]
    InvalidSortKey(String),
}

/// A bound statement argument.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlArg {
    /// `TEXT` value.
    Text(String),
    /// `BIGINT` value.
    BigInt(i64),
    /// `DOUBLE PRECISION` value.
    Double(f64),
}

impl fmt::Display for SqlArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(v) => write!(f, "'{v}'"),
            Self::BigInt(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
        }
    }
}

/// A composed search statement.
///
/// Wraps the [`QueryBuilder`] holding the statement text and its bound
/// values, plus a copy of those values in placeholder order for logging.
pub struct SearchQuery {
    builder: QueryBuilder<'static, Postgres>,
    args: Vec<SqlArg>,
}

impl SearchQuery {
    /// Statement text with `$n` placeholders.
    #[must_use]
    pub fn sql(&self) -> &str {
        self.builder.sql()
    }

    /// Bound values in placeholder order.
    #[must_use]
    pub fn args(&self) -> &[SqlArg] {
        &self.args
    }

    /// Returns true if the statement joins the metadata snapshot table.
    #[must_use]
    pub fn joins_metadata(&self) -> bool {
        self.sql().contains(METADATA_JOIN)
    }

    /// Consumes the query, returning the builder ready to execute.
    #[must_use]
    pub fn into_builder(self) -> QueryBuilder<'static, Postgres> {
        self.builder
    }
}

impl fmt::Debug for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchQuery")
            .field("sql", &self.sql())
            .field("args", &self.args)
            .finish()
    }
}

/// A single `column <op> $n` filter.
#[derive(Debug, Clone, PartialEq)]
struct Predicate {
    column: String,
    op: &'static str,
    arg: SqlArg,
    reads_metadata: bool,
}

impl Predicate {
    fn provider(column: &str, op: &'static str, arg: SqlArg) -> Self {
        Self {
            column: column.to_string(),
            op,
            arg,
            reads_metadata: false,
        }
    }

    fn metadata(column: impl Into<String>, op: &'static str, arg: SqlArg) -> Self {
        Self {
            column: column.into(),
            op,
            arg,
            reads_metadata: true,
        }
    }
}

/// Predicates for the given criteria, in their fixed order.
fn predicates(params: &ProviderSearchParams) -> Vec<Predicate> {
    let checks: [Option<Predicate>; 9] = [
        params
            .pubkey
            .as_ref()
            .map(|v| Predicate::provider("p.pubkey", "=", SqlArg::Text(v.clone()))),
        params
            .service
            .as_ref()
            .map(|v| Predicate::provider("p.service", "=", SqlArg::Text(v.clone()))),
        // earthdistance's point operator expects (longitude, latitude)
        params.near.map(|geo| {
            Predicate::metadata(
                format!("provider_metadata.location<@>point{}", geo.coordinates.to_point()),
                "<=",
                SqlArg::Double(geo.max_distance),
            )
        }),
        params.min_free_rate_limit.map(|v| {
            Predicate::metadata("provider_metadata.free_rate_limit", ">=", SqlArg::BigInt(v))
        }),
        params.min_paygo_rate_limit.map(|v| {
            Predicate::metadata("provider_metadata.paygo_rate_limit", ">=", SqlArg::BigInt(v))
        }),
        params.min_subscribe_rate_limit.map(|v| {
            Predicate::metadata(
                "provider_metadata.subscribe_rate_limit",
                ">=",
                SqlArg::BigInt(v),
            )
        }),
        params
            .min_provider_age
            .map(|v| Predicate::provider("p.age", ">=", SqlArg::BigInt(v))),
        params
            .min_open_contracts
            .map(|v| Predicate::provider("p.contract_count", ">=", SqlArg::BigInt(v))),
        params
            .min_validator_payments
            .map(|v| Predicate::provider("p.total_paid", ">=", SqlArg::BigInt(v))),
    ];
    checks.into_iter().flatten().collect()
}

fn order_by(key: ProviderSortKey) -> Option<&'static str> {
    match key {
        ProviderSortKey::None => None,
        ProviderSortKey::Age => Some("p.created ASC"),
        ProviderSortKey::ContractCount => Some("p.contract_count DESC"),
        ProviderSortKey::AmountPaid => Some("p.total_paid DESC"),
    }
}

/// Composes the search statement for `params`.
///
/// # Errors
///
/// Returns [`QueryError::InvalidSortKey`] if `params.sort_key` is not a
/// recognized key; no statement is produced.
pub fn compose_search(params: &ProviderSearchParams) -> Result<SearchQuery, QueryError> {
    let sort: ProviderSortKey = params
        .sort_key
        .parse()
        .map_err(|_| QueryError::InvalidSortKey(params.sort_key.clone()))?;

    let predicates = predicates(params);

    let mut builder =
        QueryBuilder::new(format!("SELECT {PROVIDER_SEARCH_COLUMNS} FROM providers_v p"));
    if predicates.iter().any(|p| p.reads_metadata) {
        builder.push(" ").push(METADATA_JOIN);
    }

    let mut args = Vec::with_capacity(predicates.len());
    if !predicates.is_empty() {
        builder.push(" WHERE ");
        let mut clauses = builder.separated(" AND ");
        for predicate in predicates {
            clauses.push(format_args!("{} {} ", predicate.column, predicate.op));
            match &predicate.arg {
                SqlArg::Text(v) => clauses.push_bind_unseparated(v.clone()),
                SqlArg::BigInt(v) => clauses.push_bind_unseparated(*v),
                SqlArg::Double(v) => clauses.push_bind_unseparated(*v),
            };
            args.push(predicate.arg);
        }
    }
    if let Some(order) = order_by(sort) {
        builder.push(" ORDER BY ").push(order);
    }

    Ok(SearchQuery { builder, args })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Coordinates;

    #[test]
    fn no_filters_selects_everything() {
        let query = compose_search(&ProviderSearchParams::new()).unwrap();
        assert_eq!(
            query.sql(),
            format!("SELECT {PROVIDER_SEARCH_COLUMNS} FROM providers_v p")
        );
        assert!(query.args().is_empty());
        assert!(!query.joins_metadata());
    }

    #[test]
    fn service_and_free_rate_limit() {
        let params = ProviderSearchParams::new()
            .with_service("rpc")
            .with_min_free_rate_limit(10);
        let query = compose_search(&params).unwrap();

        assert_eq!(query.sql().matches("JOIN").count(), 1);
        assert!(query.joins_metadata());
        assert!(query.sql().ends_with(
            " WHERE p.service = $1 AND provider_metadata.free_rate_limit >= $2"
        ));
        assert_eq!(
            query.args(),
            vec![SqlArg::Text("rpc".to_string()), SqlArg::BigInt(10)]
        );
    }

    #[test]
    fn non_metadata_filters_do_not_join() {
        let params = ProviderSearchParams::new()
            .with_pubkey("pk")
            .with_service("rpc")
            .with_min_provider_age(3600)
            .with_min_open_contracts(2)
            .with_min_validator_payments(100);
        let query = compose_search(&params).unwrap();

        assert!(!query.sql().contains("JOIN"));
        assert!(query.sql().contains(
            "WHERE p.pubkey = $1 AND p.service = $2 AND p.age >= $3 \
             AND p.contract_count >= $4 AND p.total_paid >= $5"
        ));
        assert_eq!(query.args().len(), 5);
    }

    #[test]
    fn all_metadata_filters_join_once() {
        let params = ProviderSearchParams::new()
            .with_max_distance(Coordinates::new(1.0, 2.0).unwrap(), 10.0)
            .with_min_free_rate_limit(1)
            .with_min_paygo_rate_limit(2)
            .with_min_subscribe_rate_limit(3);
        let query = compose_search(&params).unwrap();

        assert_eq!(query.sql().matches("LEFT JOIN provider_metadata").count(), 1);
    }

    #[test]
    fn every_filter_gets_its_own_placeholder() {
        let params = ProviderSearchParams::new()
            .with_pubkey("pk")
            .with_service("rpc")
            .with_max_distance(Coordinates::new(1.0, 2.0).unwrap(), 10.0)
            .with_min_free_rate_limit(1)
            .with_min_paygo_rate_limit(2)
            .with_min_subscribe_rate_limit(3)
            .with_min_provider_age(4)
            .with_min_open_contracts(5)
            .with_min_validator_payments(6)
            .with_sort(ProviderSortKey::AmountPaid);
        let query = compose_search(&params).unwrap();

        assert_eq!(query.args().len(), 9);
        for n in 1..=9 {
            assert_eq!(query.sql().matches(&format!("${n}")).count(), 1, "${n}");
        }
        assert!(!query.sql().contains("$10"));
        assert!(query.sql().ends_with("p.total_paid >= $9 ORDER BY p.total_paid DESC"));
    }

    #[test]
    fn subscribe_limit_uses_its_own_value() {
        let params = ProviderSearchParams::new().with_min_subscribe_rate_limit(42);
        let query = compose_search(&params).unwrap();

        assert!(
            query
                .sql()
                .contains("provider_metadata.subscribe_rate_limit >= $1")
        );
        assert!(!query.sql().contains("paygo_rate_limit"));
        assert_eq!(query.args(), vec![SqlArg::BigInt(42)]);
    }

    #[test]
    fn paygo_limit_alone_does_not_filter_subscribe() {
        let params = ProviderSearchParams::new().with_min_paygo_rate_limit(7);
        let query = compose_search(&params).unwrap();

        assert!(query.sql().contains("provider_metadata.paygo_rate_limit >= $1"));
        assert!(!query.sql().contains("subscribe_rate_limit"));
    }

    #[test]
    fn distance_embeds_longitude_first() {
        let params = ProviderSearchParams::new()
            .with_max_distance(Coordinates::new(40.0, -73.0).unwrap(), 25.0);
        let query = compose_search(&params).unwrap();

        assert!(
            query
                .sql()
                .contains("provider_metadata.location<@>point(-73.00000,40.00000) <= $1")
        );
        assert_eq!(query.args(), vec![SqlArg::Double(25.0)]);
    }

    #[test]
    fn sort_keys() {
        let cases = [
            (ProviderSortKey::Age, "ORDER BY p.created ASC"),
            (ProviderSortKey::ContractCount, "ORDER BY p.contract_count DESC"),
            (ProviderSortKey::AmountPaid, "ORDER BY p.total_paid DESC"),
        ];
        for (key, expected) in cases {
            let query = compose_search(&ProviderSearchParams::new().with_sort(key)).unwrap();
            assert!(query.sql().ends_with(expected), "{key:?}: {}", query.sql());
        }

        let query =
            compose_search(&ProviderSearchParams::new().with_sort(ProviderSortKey::None)).unwrap();
        assert!(!query.sql().contains("ORDER BY"));
    }

    #[test]
    fn order_follows_where() {
        let params = ProviderSearchParams::new()
            .with_service("rpc")
            .with_sort(ProviderSortKey::Age);
        let query = compose_search(&params).unwrap();
        assert!(query.sql().ends_with("WHERE p.service = $1 ORDER BY p.created ASC"));
    }

    #[test]
    fn unknown_sort_key_is_rejected() {
        let params = ProviderSearchParams::new().with_sort_key("height");
        assert_eq!(
            compose_search(&params).unwrap_err(),
            QueryError::InvalidSortKey("height".to_string())
        );
    }

    #[test]
    fn projection_never_yields_nulls() {
        for column in [
            "status",
            "metadata_uri",
            "metadata_nonce",
            "subscription_rate",
            "paygo_rate",
            "min_contract_duration",
            "max_contract_duration",
            "bond",
        ] {
            assert!(
                PROVIDER_SEARCH_COLUMNS.contains(&format!("coalesce(p.{column}")),
                "{column} is not coalesced"
            );
        }
        assert!(PROVIDER_SEARCH_COLUMNS.contains("coalesce(p.status, 'OFFLINE')"));
    }
}
