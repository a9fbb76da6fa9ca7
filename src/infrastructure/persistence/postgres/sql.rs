//! Statements used by the PostgreSQL store.
//!
//! Rate statements are rendered per [`RateKind`] since both rate tables
//! share a layout.

use crate::domain::value_objects::RateKind;

pub(crate) const INSERT_PROVIDER: &str = r#"
    INSERT INTO providers (pubkey, service, bond)
    VALUES ($1, $2, $3)
    RETURNING id, created, updated
"#;

pub(crate) const UPSERT_PROVIDER: &str = r#"
    INSERT INTO providers (
        pubkey, service, bond, metadata_uri, metadata_nonce, status,
        min_contract_duration, max_contract_duration, settlement_duration
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
    ON CONFLICT (pubkey, service) DO UPDATE SET
        bond = EXCLUDED.bond,
        metadata_uri = EXCLUDED.metadata_uri,
        metadata_nonce = EXCLUDED.metadata_nonce,
        status = EXCLUDED.status,
        min_contract_duration = EXCLUDED.min_contract_duration,
        max_contract_duration = EXCLUDED.max_contract_duration,
        settlement_duration = EXCLUDED.settlement_duration,
        updated = clock_timestamp()
    RETURNING id, created, updated
"#;

pub(crate) const FIND_PROVIDER: &str = r#"
    SELECT id, created, updated, pubkey, service,
           coalesce(bond, 0) AS bond,
           coalesce(metadata_uri, '') AS metadata_uri,
           coalesce(metadata_nonce, 0) AS metadata_nonce,
           coalesce(status, 'OFFLINE') AS status,
           coalesce(min_contract_duration, 0) AS min_contract_duration,
           coalesce(max_contract_duration, 0) AS max_contract_duration,
           coalesce(settlement_duration, 0) AS settlement_duration
    FROM providers
    WHERE pubkey = $1 AND service = $2
"#;

pub(crate) const UPSERT_PROVIDER_METADATA: &str = r#"
    INSERT INTO provider_metadata (
        provider_id, nonce, moniker, website, description, location,
        free_rate_limit, subscribe_rate_limit, paygo_rate_limit
    ) VALUES ($1, $2, $3, $4, $5, $6::point, $7, $8, $9)
    ON CONFLICT (provider_id, nonce) DO UPDATE SET nonce = EXCLUDED.nonce
    RETURNING id, created, updated
"#;

pub(crate) const FIND_PROVIDER_METADATA: &str = r#"
    SELECT id, created, updated, provider_id, nonce,
           coalesce(moniker, '') AS moniker,
           coalesce(website, '') AS website,
           coalesce(description, '') AS description,
           location[0] AS longitude,
           location[1] AS latitude,
           coalesce(free_rate_limit, 0) AS free_rate_limit,
           coalesce(subscribe_rate_limit, 0) AS subscribe_rate_limit,
           coalesce(paygo_rate_limit, 0) AS paygo_rate_limit
    FROM provider_metadata
    WHERE provider_id = $1 AND nonce = $2
"#;

pub(crate) const UPSERT_VALIDATOR_PAYOUT_EVENT: &str = r#"
    INSERT INTO validator_payout_events (validator, height, reward)
    VALUES ($1, $2, $3)
    ON CONFLICT (validator, height) DO UPDATE SET
        reward = EXCLUDED.reward,
        updated = clock_timestamp()
    RETURNING id, created, updated
"#;

pub(crate) const INSERT_BOND_PROVIDER_EVENT: &str = r#"
    INSERT INTO provider_bond_events (provider_id, height, txid, bond_rel, bond_abs)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING id, created, updated
"#;

pub(crate) const INSERT_MOD_PROVIDER_EVENT: &str = r#"
    INSERT INTO provider_mod_events (
        provider_id, height, txid, metadata_uri, metadata_nonce, status,
        min_contract_duration, max_contract_duration, settlement_duration,
        subscription_rate, paygo_rate
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
    RETURNING id, created, updated
"#;

/// Removes every rate of `kind` for the provider identified by `($1, $2)`.
pub(crate) fn delete_rates(kind: RateKind) -> String {
    format!(
        "DELETE FROM {} WHERE provider_id = \
         (SELECT id FROM providers WHERE pubkey = $1 AND service = $2)",
        kind.table()
    )
}

/// Selects every rate of `kind` for provider id `$1`, in insertion order.
pub(crate) fn find_rates(kind: RateKind) -> String {
    format!(
        "SELECT id, provider_id, token_name, token_amount FROM {} \
         WHERE provider_id = $1 ORDER BY id",
        kind.table()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_statements_use_kind_table() {
        assert!(
            delete_rates(RateKind::Subscription)
                .starts_with("DELETE FROM provider_subscriber_rates")
        );
        assert!(find_rates(RateKind::PayAsYouGo).contains("FROM provider_pay_as_you_go_rates"));
    }

    #[test]
    fn metadata_location_is_cast_to_point() {
        assert!(UPSERT_PROVIDER_METADATA.contains("$6::point"));
    }
}
