//! # In-Memory Directory Store
//!
//! In-memory implementation of [`ProviderRepository`] and
//! [`EventRepository`] for testing without a database.
//!
//! The store mirrors the PostgreSQL schema closely enough that search,
//! rate replacement and metadata snapshots behave the same: rates are
//! lower-cased on write and read back in insertion order, search results
//! carry no rate sets, and the derived `age`, `contract_count` and
//! `total_paid` columns are computed from recorded contracts.
//!
//! Upserts are staged on a copy of the state and swapped in only when every
//! step succeeds.

use crate::domain::entities::{Entity, Provider, ProviderMetadata, ProviderMetadataSnapshot};
use crate::domain::events::{BondProviderEvent, ModProviderEvent, ValidatorPayoutEvent};
use crate::domain::value_objects::{
    Coin, ProviderKey, ProviderSearchParams, ProviderSortKey, RateKind, RateSet,
    parse_coordinates,
};
use crate::infrastructure::persistence::query::QueryError;
use crate::infrastructure::persistence::rates::build_insert_args;
use crate::infrastructure::persistence::traits::{
    EventRepository, ProviderRepository, StoreError, StoreResult, UpsertStep,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// A provider row. `metadata_nonce` is `None` for rows created by
/// `insert_provider`, which never joins a metadata snapshot.
#[derive(Debug, Clone)]
struct ProviderRecord {
    provider: Provider,
    metadata_nonce: Option<i64>,
}

#[derive(Debug, Clone)]
struct RateRecord {
    id: i64,
    provider_id: i64,
    coin: Coin,
}

#[derive(Debug, Clone, Copy)]
struct ContractRecord {
    provider_id: i64,
    open: bool,
    paid: i64,
}

#[derive(Debug, Clone)]
struct PayoutRecord {
    entity: Entity,
    reward: Decimal,
}

#[derive(Debug, Clone)]
struct BondEventRecord {
    provider_id: i64,
    height: i64,
    tx_id: String,
    bond_rel: Decimal,
    bond_abs: Decimal,
}

#[derive(Debug, Clone)]
struct ModEventRecord {
    provider_id: i64,
    event: ModProviderEvent,
}

#[derive(Debug, Clone, Default)]
struct DirectoryState {
    next_id: i64,
    last_timestamp: Option<DateTime<Utc>>,
    /// Provider rows by id; rate sets live in the rate tables.
    providers: BTreeMap<i64, ProviderRecord>,
    keys: HashMap<ProviderKey, i64>,
    subscription_rates: Vec<RateRecord>,
    pay_as_you_go_rates: Vec<RateRecord>,
    metadata: HashMap<(i64, i64), ProviderMetadataSnapshot>,
    contracts: Vec<ContractRecord>,
    payouts: HashMap<(String, i64), PayoutRecord>,
    bond_events: Vec<BondEventRecord>,
    mod_events: Vec<ModEventRecord>,
}

impl DirectoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Wall-clock time, forced strictly past the previous write.
    fn now(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let now = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(now);
        now
    }

    fn rates(&self, kind: RateKind) -> &Vec<RateRecord> {
        match kind {
            RateKind::Subscription => &self.subscription_rates,
            RateKind::PayAsYouGo => &self.pay_as_you_go_rates,
        }
    }

    fn rates_mut(&mut self, kind: RateKind) -> &mut Vec<RateRecord> {
        match kind {
            RateKind::Subscription => &mut self.subscription_rates,
            RateKind::PayAsYouGo => &mut self.pay_as_you_go_rates,
        }
    }

    fn rate_set(&self, provider_id: i64, kind: RateKind) -> RateSet {
        let mut rows: Vec<&RateRecord> = self
            .rates(kind)
            .iter()
            .filter(|r| r.provider_id == provider_id)
            .collect();
        rows.sort_by_key(|r| r.id);
        rows.into_iter().map(|r| r.coin.clone()).collect()
    }

    /// Steps 1 to 5 of the upsert, applied to a staged copy.
    fn apply_upsert(
        &mut self,
        provider: &Provider,
        key: &ProviderKey,
        bond: Decimal,
        nonce: i64,
    ) -> StoreResult<Entity> {
        let now = self.now();
        let entity = match self.keys.get(key).copied() {
            Some(id) => {
                let created = self
                    .providers
                    .get(&id)
                    .and_then(|r| r.provider.entity)
                    .map_or(now, |e| e.created);
                Entity::new(id, created, now)
            }
            None => {
                let id = self.next_id();
                self.keys.insert(key.clone(), id);
                Entity::new(id, now, now)
            }
        };

        let mut row = provider.without_entity();
        row.entity = Some(entity);
        row.bond = bond.normalize().to_string();
        row.subscription_rate = RateSet::new();
        row.pay_as_you_go_rate = RateSet::new();
        self.providers.insert(
            entity.id,
            ProviderRecord {
                provider: row,
                metadata_nonce: Some(nonce),
            },
        );

        for kind in [RateKind::Subscription, RateKind::PayAsYouGo] {
            self.rates_mut(kind).retain(|r| r.provider_id != entity.id);
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
            for row in insert.rows {
                let id = self.next_id();
                let amount = u128::try_from(row.amount).unwrap_or_default();
                self.rates_mut(kind).push(RateRecord {
                    id,
                    provider_id: row.provider_id,
                    coin: Coin::new(row.denom, amount),
                });
            }
        }

        Ok(entity)
    }

    fn matches(
        &self,
        record: &ProviderRecord,
        params: &ProviderSearchParams,
        now: DateTime<Utc>,
    ) -> bool {
        let provider = &record.provider;
        let Some(entity) = provider.entity else {
            return false;
        };
        if params.pubkey.as_ref().is_some_and(|v| *v != provider.pubkey) {
            return false;
        }
        if params.service.as_ref().is_some_and(|v| *v != provider.service) {
            return false;
        }

        if params.needs_metadata() {
            let Some(meta) = record
                .metadata_nonce
                .and_then(|nonce| self.metadata.get(&(entity.id, nonce)))
            else {
                return false;
            };
            if let Some(geo) = params.near {
                let within = meta
                    .location
                    .is_some_and(|loc| loc.distance_miles(&geo.coordinates) <= geo.max_distance);
                if !within {
                    return false;
                }
            }
            let limits = [
                (params.min_free_rate_limit, meta.free_rate_limit),
                (params.min_paygo_rate_limit, meta.paygo_rate_limit),
                (params.min_subscribe_rate_limit, meta.subscribe_rate_limit),
            ];
            if limits.iter().any(|(min, v)| min.is_some_and(|min| *v < min)) {
                return false;
            }
        }

        let derived = [
            (params.min_provider_age, self.age(entity, now)),
            (params.min_open_contracts, self.contract_count(entity.id)),
            (params.min_validator_payments, self.total_paid(entity.id)),
        ];
        !derived.iter().any(|(min, v)| min.is_some_and(|min| *v < min))
    }

    fn age(&self, entity: Entity, now: DateTime<Utc>) -> i64 {
        (now - entity.created).num_seconds()
    }

    fn contract_count(&self, provider_id: i64) -> i64 {
        let open = self
            .contracts
            .iter()
            .filter(|c| c.provider_id == provider_id && c.open)
            .count();
        i64::try_from(open).unwrap_or(i64::MAX)
    }

    /// Sum of payments, clamped at `i64::MAX`.
    fn total_paid(&self, provider_id: i64) -> i64 {
        self.contracts
            .iter()
            .filter(|c| c.provider_id == provider_id)
            .fold(0_i64, |total, c| total.saturating_add(c.paid))
    }
}

/// In-memory implementation of the directory repositories.
///
/// Uses a thread-safe state behind `Arc<RwLock<_>>`. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectoryStore {
    state: Arc<RwLock<DirectoryState>>,
}

impl InMemoryDirectoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of providers in the store.
    pub async fn len(&self) -> usize {
        self.state.read().await.providers.len()
    }

    /// Returns true if the store holds no providers.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Clears all data from the store.
    pub async fn clear(&self) {
        *self.state.write().await = DirectoryState::default();
    }

    /// Records a contract against a provider, feeding the derived
    /// `contract_count` and `total_paid` search columns.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` if `paid` is negative and
    /// `StoreError::Query` if the provider does not exist.
    pub async fn record_contract(
        &self,
        key: &ProviderKey,
        open: bool,
        paid: i64,
    ) -> StoreResult<()> {
        if paid < 0 {
            return Err(StoreError::validation(format!(
                "contract for {key}: negative payment {paid}"
            )));
        }
        let mut state = self.state.write().await;
        let provider_id = state
            .keys
            .get(key)
            .copied()
            .ok_or_else(|| StoreError::query(format!("no provider {key} for contract")))?;
        state.contracts.push(ContractRecord {
            provider_id,
            open,
            paid,
        });
        Ok(())
    }

    /// Returns the recorded reward for a validator at a height.
    pub async fn validator_reward(&self, validator: &str, height: i64) -> Option<Decimal> {
        let state = self.state.read().await;
        state
            .payouts
            .get(&(validator.to_string(), height))
            .map(|p| p.reward)
    }

    /// Returns the `(height, tx id, relative, absolute)` bond changes recorded
    /// for a provider, oldest first.
    pub async fn bond_events(&self, provider_id: i64) -> Vec<(i64, String, Decimal, Decimal)> {
        let state = self.state.read().await;
        state
            .bond_events
            .iter()
            .filter(|e| e.provider_id == provider_id)
            .map(|e| (e.height, e.tx_id.clone(), e.bond_rel, e.bond_abs))
            .collect()
    }

    /// Returns the modification events recorded for a provider, oldest first.
    pub async fn mod_events(&self, provider_id: i64) -> Vec<ModProviderEvent> {
        let state = self.state.read().await;
        state
            .mod_events
            .iter()
            .filter(|e| e.provider_id == provider_id)
            .map(|e| e.event.clone())
            .collect()
    }
}

#[async_trait]
impl ProviderRepository for InMemoryDirectoryStore {
    async fn insert_provider(&self, provider: &Provider) -> StoreResult<Entity> {
        let bond = provider
            .bond_i64()
            .map_err(|e| StoreError::validation(format!("error converting bond to int64: {e}")))?;
        let key = provider.key();

        let mut state = self.state.write().await;
        if state.keys.contains_key(&key) {
            return Err(StoreError::query(format!(
                "error inserting provider {key}: duplicate key"
            )));
        }
        let now = state.now();
        let entity = Entity::new(state.next_id(), now, now);
        let mut row =
            Provider::new(&provider.pubkey, &provider.service).with_bond(bond.to_string());
        row.entity = Some(entity);
        state.keys.insert(key, entity.id);
        state.providers.insert(
            entity.id,
            ProviderRecord {
                provider: row,
                metadata_nonce: None,
            },
        );
        Ok(entity)
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

        let mut state = self.state.write().await;
        let mut staged = state.clone();
        match staged.apply_upsert(provider, &key, bond, nonce) {
            Ok(entity) => {
                *state = staged;
                info!(provider = %key, id = entity.id, "provider upserted");
                Ok(entity)
            }
            Err(err) => {
                warn!(provider = %key, step = ?err.failed_step(), "provider upsert rolled back");
                Err(err)
            }
        }
    }

    async fn find_provider(&self, key: &ProviderKey) -> StoreResult<Option<Provider>> {
        let state = self.state.read().await;
        let Some(id) = state.keys.get(key).copied() else {
            return Ok(None);
        };
        let Some(record) = state.providers.get(&id) else {
            return Ok(None);
        };

        let mut provider = record.provider.clone();
        provider.subscription_rate = state.rate_set(id, RateKind::Subscription);
        provider.pay_as_you_go_rate = state.rate_set(id, RateKind::PayAsYouGo);
        Ok(Some(provider))
    }

    async fn search_providers(&self, params: &ProviderSearchParams) -> StoreResult<Vec<Provider>> {
        let sort: ProviderSortKey = params
            .sort_key
            .parse()
            .map_err(|_| QueryError::InvalidSortKey(params.sort_key.clone()))?;

        let state = self.state.read().await;
        let now = Utc::now();
        let mut found: Vec<Provider> = state
            .providers
            .values()
            .filter(|r| state.matches(r, params, now))
            .map(|r| r.provider.clone())
            .collect();

        let id_of = |p: &Provider| p.entity.map_or(0, |e| e.id);
        match sort {
            ProviderSortKey::None => {}
            ProviderSortKey::Age => {
                found.sort_by_key(|p| p.entity.map(|e| e.created));
            }
            ProviderSortKey::ContractCount => {
                found.sort_by_key(|p| std::cmp::Reverse(state.contract_count(id_of(p))));
            }
            ProviderSortKey::AmountPaid => {
                found.sort_by_key(|p| std::cmp::Reverse(state.total_paid(id_of(p))));
            }
        }
        Ok(found)
    }

    async fn upsert_provider_metadata(
        &self,
        provider_id: i64,
        nonce: i64,
        metadata: &ProviderMetadata,
    ) -> StoreResult<Entity> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.metadata.get(&(provider_id, nonce)) {
            return Ok(existing.entity);
        }
        if !state.providers.contains_key(&provider_id) {
            return Err(StoreError::query(format!(
                "error upserting metadata for provider {provider_id} nonce {nonce}: \
                 no such provider"
            )));
        }

        let c = &metadata.configuration;
        let location = match parse_coordinates(&c.location) {
            Ok(coordinates) => Some(coordinates),
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

        let now = state.now();
        let entity = Entity::new(state.next_id(), now, now);
        state.metadata.insert(
            (provider_id, nonce),
            ProviderMetadataSnapshot {
                entity,
                provider_id,
                nonce,
                moniker: c.moniker.clone(),
                website: c.website.clone(),
                description: c.description.clone(),
                location,
                free_rate_limit: c.free_tier_rate_limit,
                subscribe_rate_limit: c.subscribe_tier_rate_limit,
                paygo_rate_limit: c.paygo_tier_rate_limit,
            },
        );
        Ok(entity)
    }

    async fn find_provider_metadata(
        &self,
        provider_id: i64,
        nonce: i64,
    ) -> StoreResult<Option<ProviderMetadataSnapshot>> {
        let state = self.state.read().await;
        Ok(state.metadata.get(&(provider_id, nonce)).cloned())
    }
}

#[async_trait]
impl EventRepository for InMemoryDirectoryStore {
    async fn upsert_validator_payout_event(
        &self,
        event: &ValidatorPayoutEvent,
        height: i64,
    ) -> StoreResult<Entity> {
        let reward = event
            .reward()
            .map_err(|e| StoreError::validation(e.to_string()))?;

        let mut state = self.state.write().await;
        let now = state.now();
        let slot = (event.validator.clone(), height);
        let entity = match state.payouts.get(&slot) {
            Some(existing) => Entity::new(existing.entity.id, existing.entity.created, now),
            None => Entity::new(state.next_id(), now, now),
        };
        state.payouts.insert(slot, PayoutRecord { entity, reward });
        Ok(entity)
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

        let mut state = self.state.write().await;
        let now = state.now();
        let entity = Entity::new(state.next_id(), now, now);
        state.bond_events.push(BondEventRecord {
            provider_id,
            height,
            tx_id: tx_id.to_string(),
            bond_rel,
            bond_abs,
        });
        Ok(entity)
    }

    async fn insert_mod_provider_event(
        &self,
        provider_id: i64,
        event: &ModProviderEvent,
    ) -> StoreResult<Entity> {
        if i64::try_from(event.metadata_nonce).is_err() {
            return Err(StoreError::validation(format!(
                "metadata nonce {} out of range",
                event.metadata_nonce
            )));
        }

        let mut state = self.state.write().await;
        let now = state.now();
        let entity = Entity::new(state.next_id(), now, now);
        state.mod_events.push(ModEventRecord {
            provider_id,
            event: event.clone(),
        });
        Ok(entity)
    }
}
