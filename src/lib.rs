//! # Provider Directory
//!
//! Persistence and search for a marketplace directory of bonded service
//! providers.
//!
//! Providers are identified by `(pubkey, service)` and advertise a bond,
//! contract terms and two rate sets (subscription and pay-as-you-go). The
//! store writes a provider and both of its rate sets atomically, looks
//! providers up with their rates, and searches them by service, location,
//! advertised rate limits and on-chain history.
//!
//! ## Layout
//!
//! - [`domain`]: providers, metadata snapshots, rate sets, coordinates,
//!   search criteria and on-chain events
//! - [`infrastructure::persistence`]: repository traits, the search query
//!   composer, and the PostgreSQL and in-memory stores
//! - [`config`]: layered settings (defaults, TOML file, `DIRECTORY__*` env)
//! - [`telemetry`]: `tracing` subscriber setup
//!
//! ## Example
//!
//! ```no_run
//! use provider_directory::config::DirectoryConfig;
//! use provider_directory::domain::value_objects::ProviderSearchParams;
//! use provider_directory::infrastructure::persistence::ProviderRepository;
//! use provider_directory::infrastructure::persistence::postgres::PostgresDirectoryStore;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DirectoryConfig::load(None)?;
//! let store = PostgresDirectoryStore::new(config.database.connect().await?);
//! let providers = store
//!     .search_providers(&ProviderSearchParams::new().with_service("btc-mainnet-fullnode"))
//!     .await?;
//! println!("{} providers", providers.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod telemetry;
