//! # PostgreSQL Directory Store
//!
//! PostgreSQL implementation of [`ProviderRepository`] and
//! [`EventRepository`] using sqlx.
//!
//! Every operation acquires one pooled connection and returns it to the
//! pool when the connection guard drops, on success and on every error path.
//! Provider upserts run inside a transaction on that connection that is
//! committed only after every step succeeds.

use super::sql;
use crate::domain::entities::{Entity, Provider, ProviderMetadata, ProviderMetadataSnapshot};
use crate::domain::events::{BondProviderEvent, ModProviderEvent, ValidatorPayoutEvent};
use crate::domain::value_objects::{
    Coin, Coordinates, ProviderKey, ProviderSearchParams, ProviderStatus, RateKind, RateSet,
    parse_coordinates,
};
use crate::infrastructure::persistence::query::compose_search;
use crate::infrastructure::persistence::rates::build_insert_args;
use crate::infrastructure::persistence::traits::{
    EventRepository, ProviderRepository, StoreError, StoreResult, UpsertStep,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnection, PgRow};
use sqlx::types::Json;
use sqlx::{Connection, PgPool, Postgres, Row};
use tracing::{debug, info, warn};

/// PostgreSQL implementation of the directory repositories.
///
/// # Examples
///
/// ```no_run
/// use provider_directory::infrastructure::persistence::postgres::PostgresDirectoryStore;
/// use sqlx::PgPool;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = PgPool::connect("postgres://localhost/directory").await?;
/// let store = PostgresDirectoryStore::new(pool);
/// store.migrate().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PostgresDirectoryStore {
    pool: PgPool,
}

impl PostgresDirectoryStore {
    /// Creates a store over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Applies the bundled schema migrations.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Query` if a migration fails.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::query(format!("error running migrations: {e}")))
    }

    async fn acquire(&self) -> StoreResult<PoolConnection<Postgres>> {
        self.pool
            .acquire()
            .await
            .map_err(|e| StoreError::connection(format!("error obtaining db connection: {e}")))
    }

    /// Steps 1 to 5 of the upsert, run on an open transaction.
    async fn apply_upsert(
        tx: &mut PgConnection,
        provider: &Provider,
        key: &ProviderKey,
        bond: Decimal,
        nonce: i64,
    ) -> StoreResult<Entity> {
        let row = sqlx::query(sql::UPSERT_PROVIDER)
            .bind(&provider.pubkey)
            .bind(&provider.service)
            .bind(bond)
            .bind(&provider.metadata_uri)
            .bind(nonce)
            .bind(provider.status.as_str())
            .bind(provider.min_contract_duration)
            .bind(provider.max_contract_duration)
            .bind(provider.settlement_duration)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                StoreError::write(UpsertStep::UpsertProvider, key.clone(), None, e.to_string())
            })?;
        let entity = entity_from_row(&row).map_err(|e| {
            StoreError::write(UpsertStep::UpsertProvider, key.clone(), None, e.to_string())
        })?;

        for (kind, step) in [
            (RateKind::Subscription, UpsertStep::DeleteSubscriptionRates),
            (RateKind::PayAsYouGo, UpsertStep::DeletePayAsYouGoRates),
        ] {
            sqlx::query(&sql::delete_rates(kind))
                .bind(&provider.pubkey)
                .bind(&provider.service)
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::write(step, key.clone(), Some(entity), e.to_string()))?;
        }

        for (kind, rates, step) in [
            (
                RateKind::Subscription,
                &provider.subscription_rate,
                UpsertStep::InsertSubscriptionRates,
            ),
            (
                RateKind::PayAsYouGo,
                &provider.pay_as_you_go_rate,
                UpsertStep::InsertPayAsYouGoRates,
            ),
        ] {
            let insert = build_insert_args(entity.id, rates)
                .map_err(|e| StoreError::write(step, key.clone(), Some(entity), e.to_string()))?;
            let Some(mut statement) = insert.statement(kind) else {
                continue;
            };
            statement
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::write(step, key.clone(), Some(entity), e.to_string()))?;
        }

        Ok(entity)
    }

    async fn find_rates(
        conn: &mut PgConnection,
        provider_id: i64,
        kind: RateKind,
    ) -> StoreResult<RateSet> {
        let rows = sqlx::query(&sql::find_rates(kind))
            .bind(provider_id)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| StoreError::query(format!("failed to query {kind} rates: {e}")))?;

        rows.iter()
            .map(|row| -> StoreResult<Coin> {
                let denom: String = row.try_get("token_name").map_err(scan_error)?;
                let amount: i64 = row.try_get("token_amount").map_err(scan_error)?;
                let amount = u128::try_from(amount).map_err(|_| {
                    StoreError::serialization(format!("negative {kind} rate {amount}{denom}"))
                })?;
                Ok(Coin::new(denom, amount))
            })
            .collect()
    }
}

#[async_trait]
impl ProviderRepository for PostgresDirectoryStore {
    async fn insert_provider(&self, provider: &Provider) -> StoreResult<Entity> {
        let bond = provider
            .bond_i64()
            .map_err(|e| StoreError::validation(format!("error converting bond to int64: {e}")))?;
        let mut conn = self.acquire().await?;

        let row = sqlx::query(sql::INSERT_PROVIDER)
            .bind(&provider.pubkey)
            .bind(&provider.service)
            .bind(bond)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| {
                StoreError::query(format!("error inserting provider {}: {e}", provider.key()))
            })?;
        entity_from_row(&row)
    }

    async fn upsert_provider(&self, provider: &Provider) -> StoreResult<Entity> {
        let key = provider.key();
        let bond = provider
            .bond_decimal()
            .map_err(|e| StoreError::validation(format!("provider {key}: {e}")))?;
        let nonce = i64::try_from(provider.metadata_nonce).map_err(|_| {
            StoreError::validation(format!(
                "provider {key}: metadata nonce {} out of range",
                provider.metadata_nonce
            ))
        })?;

        let mut conn = self.acquire().await?;
        let mut tx = conn
            .begin()
            .await
            .map_err(|e| StoreError::write(UpsertStep::Begin, key.clone(), None, e.to_string()))?;

        match Self::apply_upsert(&mut tx, provider, &key, bond, nonce).await {
            Ok(entity) => {
                tx.commit().await.map_err(|e| {
                    StoreError::write(UpsertStep::Commit, key.clone(), Some(entity), e.to_string())
                })?;
                info!(provider = %key, id = entity.id, "provider upserted");
                Ok(entity)
            }
            Err(err) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(provider = %key, error = %rollback, "rollback failed");
                }
                warn!(provider = %key, step = ?err.failed_step(), "provider upsert rolled back");
                Err(err)
            }
        }
    }

    async fn find_provider(&self, key: &ProviderKey) -> StoreResult<Option<Provider>> {
        let mut conn = self.acquire().await?;

        let row = sqlx::query(sql::FIND_PROVIDER)
            .bind(&key.pubkey)
            .bind(&key.service)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| StoreError::query(format!("error selecting provider {key}: {e}")))?;
        let Some(row) = row else {
            return Ok(None);
        };

        let mut provider = provider_from_row(&row)?;
        let id: i64 = row.try_get("id").map_err(scan_error)?;
        provider.subscription_rate = Self::find_rates(&mut conn, id, RateKind::Subscription).await?;
        provider.pay_as_you_go_rate = Self::find_rates(&mut conn, id, RateKind::PayAsYouGo).await?;

        Ok(Some(provider))
    }

    async fn search_providers(&self, params: &ProviderSearchParams) -> StoreResult<Vec<Provider>> {
        let query = compose_search(params)?;
        debug!(sql = query.sql(), args = ?query.args(), "provider search");

        let mut conn = self.acquire().await?;
        let mut builder = query.into_builder();
        let rows: Vec<ProviderSearchRow> = builder
            .build_query_as()
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| StoreError::query(format!("error searching providers: {e}")))?;

        rows.into_iter().map(ProviderSearchRow::into_provider).collect()
    }

    async fn upsert_provider_metadata(
        &self,
        provider_id: i64,
        nonce: i64,
        metadata: &ProviderMetadata,
    ) -> StoreResult<Entity> {
        let c = &metadata.configuration;
        let location = match parse_coordinates(&c.location) {
            Ok(coordinates) => Some(coordinates.to_point()),
            Err(e) => {
                warn!(
                    provider_id,
                    nonce,
                    location = %c.location,
                    error = %e,
                    "storing metadata without location"
                );
                None
            }
        };

        let mut conn = self.acquire().await?;
        let row = sqlx::query(sql::UPSERT_PROVIDER_METADATA)
            .bind(provider_id)
            .bind(nonce)
            .bind(&c.moniker)
            .bind(&c.website)
            .bind(&c.description)
            .bind(location)
            .bind(c.free_tier_rate_limit)
            .bind(c.subscribe_tier_rate_limit)
            .bind(c.paygo_tier_rate_limit)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| {
                StoreError::query(format!(
                    "error upserting metadata for provider {provider_id} nonce {nonce}: {e}"
                ))
            })?;
        entity_from_row(&row)
    }

    async fn find_provider_metadata(
        &self,
        provider_id: i64,
        nonce: i64,
    ) -> StoreResult<Option<ProviderMetadataSnapshot>> {
        let mut conn = self.acquire().await?;
        let row = sqlx::query(sql::FIND_PROVIDER_METADATA)
            .bind(provider_id)
            .bind(nonce)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| {
                StoreError::query(format!(
                    "error selecting metadata for provider {provider_id} nonce {nonce}: {e}"
                ))
            })?;
        row.as_ref().map(metadata_from_row).transpose()
    }
}

#[async_trait]
impl EventRepository for PostgresDirectoryStore {
    async fn upsert_validator_payout_event(
        &self,
        event: &ValidatorPayoutEvent,
        height: i64,
    ) -> StoreResult<Entity> {
        let reward = event
            .reward()
            .map_err(|e| StoreError::validation(e.to_string()))?;
        let mut conn = self.acquire().await?;

        let row = sqlx::query(sql::UPSERT_VALIDATOR_PAYOUT_EVENT)
            .bind(&event.validator)
            .bind(height)
            .bind(reward)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| {
                StoreError::query(format!(
                    "error upserting payout for {} at height {height}: {e}",
                    event.validator
                ))
            })?;
        entity_from_row(&row)
    }

    async fn insert_bond_provider_event(
        &self,
        provider_id: i64,
        event: &BondProviderEvent,
        height: i64,
        tx_id: &str,
    ) -> StoreResult<Entity> {
        let (bond_rel, bond_abs) = event
            .amounts()
            .map_err(|e| StoreError::validation(e.to_string()))?;
        let mut conn = self.acquire().await?;

        let row = sqlx::query(sql::INSERT_BOND_PROVIDER_EVENT)
            .bind(provider_id)
            .bind(height)
            .bind(tx_id)
            .bind(bond_rel)
            .bind(bond_abs)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| {
                StoreError::query(format!(
                    "error inserting bond event for {} tx {tx_id}: {e}",
                    event.provider
                ))
            })?;
        entity_from_row(&row)
    }

    async fn insert_mod_provider_event(
        &self,
        provider_id: i64,
        event: &ModProviderEvent,
    ) -> StoreResult<Entity> {
        let nonce = i64::try_from(event.metadata_nonce).map_err(|_| {
            StoreError::validation(format!(
                "metadata nonce {} out of range",
                event.metadata_nonce
            ))
        })?;
        let mut conn = self.acquire().await?;

        let row = sqlx::query(sql::INSERT_MOD_PROVIDER_EVENT)
            .bind(provider_id)
            .bind(event.height)
            .bind(&event.tx_id)
            .bind(&event.metadata_uri)
            .bind(nonce)
            .bind(event.status.as_str())
            .bind(event.min_contract_duration)
            .bind(event.max_contract_duration)
            .bind(event.settlement_duration)
            .bind(Json(&event.subscription_rate))
            .bind(Json(&event.pay_as_you_go_rate))
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| {
                StoreError::query(format!(
                    "error inserting mod event for {} tx {}: {e}",
                    event.provider, event.tx_id
                ))
            })?;
        entity_from_row(&row)
    }
}

/// Row of a provider search.
#[derive(Debug, sqlx::FromRow)]
struct ProviderSearchRow {
    id: i64,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
    pubkey: String,
    service: String,
    status: String,
    metadata_uri: String,
    metadata_nonce: i64,
    min_contract_duration: i64,
    max_contract_duration: i64,
    settlement_duration: i64,
    bond: Decimal,
}

impl ProviderSearchRow {
    fn into_provider(self) -> StoreResult<Provider> {
        let status = ProviderStatus::from_stored(&self.status)
            .map_err(|e| StoreError::serialization(e.to_string()))?;
        let metadata_nonce = u64::try_from(self.metadata_nonce).map_err(|_| {
            StoreError::serialization(format!("negative metadata nonce {}", self.metadata_nonce))
        })?;

        Ok(Provider {
            entity: Some(Entity::new(self.id, self.created, self.updated)),
            pubkey: self.pubkey,
            service: self.service,
            bond: self.bond.normalize().to_string(),
            metadata_uri: self.metadata_uri,
            metadata_nonce,
            status,
            min_contract_duration: self.min_contract_duration,
            max_contract_duration: self.max_contract_duration,
            settlement_duration: self.settlement_duration,
            subscription_rate: RateSet::new(),
            pay_as_you_go_rate: RateSet::new(),
        })
    }
}

fn scan_error(e: sqlx::Error) -> StoreError {
    StoreError::serialization(format!("failed to scan row: {e}"))
}

fn entity_from_row(row: &PgRow) -> StoreResult<Entity> {
    Ok(Entity::new(
        row.try_get("id").map_err(scan_error)?,
        row.try_get("created").map_err(scan_error)?,
        row.try_get("updated").map_err(scan_error)?,
    ))
}

fn provider_from_row(row: &PgRow) -> StoreResult<Provider> {
    let status: String = row.try_get("status").map_err(scan_error)?;
    let nonce: i64 = row.try_get("metadata_nonce").map_err(scan_error)?;
    let bond: Decimal = row.try_get("bond").map_err(scan_error)?;

    Ok(Provider {
        entity: Some(entity_from_row(row)?),
        pubkey: row.try_get("pubkey").map_err(scan_error)?,
        service: row.try_get("service").map_err(scan_error)?,
        bond: bond.normalize().to_string(),
        metadata_uri: row.try_get("metadata_uri").map_err(scan_error)?,
        metadata_nonce: u64::try_from(nonce)
            .map_err(|_| StoreError::serialization(format!("negative metadata nonce {nonce}")))?,
        status: ProviderStatus::from_stored(&status)
            .map_err(|e| StoreError::serialization(e.to_string()))?,
        min_contract_duration: row.try_get("min_contract_duration").map_err(scan_error)?,
        max_contract_duration: row.try_get("max_contract_duration").map_err(scan_error)?,
        settlement_duration: row.try_get("settlement_duration").map_err(scan_error)?,
        subscription_rate: RateSet::new(),
        pay_as_you_go_rate: RateSet::new(),
    })
}

fn metadata_from_row(row: &PgRow) -> StoreResult<ProviderMetadataSnapshot> {
    let longitude: Option<f64> = row.try_get("longitude").map_err(scan_error)?;
    let latitude: Option<f64> = row.try_get("latitude").map_err(scan_error)?;
    let location = match (latitude, longitude) {
        (Some(lat), Some(lon)) => Some(
            Coordinates::new(lat, lon).map_err(|e| StoreError::serialization(e.to_string()))?,
        ),
        _ => None,
    };

    Ok(ProviderMetadataSnapshot {
        entity: entity_from_row(row)?,
        provider_id: row.try_get("provider_id").map_err(scan_error)?,
        nonce: row.try_get("nonce").map_err(scan_error)?,
        moniker: row.try_get("moniker").map_err(scan_error)?,
        website: row.try_get("website").map_err(scan_error)?,
        description: row.try_get("description").map_err(scan_error)?,
        location,
        free_rate_limit: row.try_get("free_rate_limit").map_err(scan_error)?,
        subscribe_rate_limit: row.try_get("subscribe_rate_limit").map_err(scan_error)?,
        paygo_rate_limit: row.try_get("paygo_rate_limit").map_err(scan_error)?,
    })
}
