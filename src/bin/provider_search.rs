//! Provider directory command-line tool.
//!
//! Configuration comes from `.env`, an optional TOML file and `DIRECTORY__*`
//! environment variables.
//!
//! Usage:
//!   provider_search migrate                 - Apply the schema migrations
//!   provider_search find <pubkey> <service> - Print one provider with its rates
//!   provider_search search [filters]        - Search providers

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use provider_directory::config::DirectoryConfig;
use provider_directory::domain::value_objects::{
    ProviderKey, ProviderSearchParams, parse_coordinates,
};
use provider_directory::infrastructure::persistence::ProviderRepository;
use provider_directory::infrastructure::persistence::postgres::PostgresDirectoryStore;
use provider_directory::telemetry::init_tracing;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "provider_search", version, about = "Query the provider directory")]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, env = "DIRECTORY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply the bundled schema migrations.
    Migrate,
    /// Look up one provider by key.
    Find {
        /// Provider public key.
        pubkey: String,
        /// Service name.
        service: String,
    },
    /// Search providers.
    Search(SearchArgs),
}

#[derive(Debug, Args)]
struct SearchArgs {
    #[arg(long)]
    pubkey: Option<String>,
    #[arg(long)]
    service: Option<String>,
    /// Reference position as "<latitude>,<longitude>".
    #[arg(long, requires = "max_distance")]
    near: Option<String>,
    /// Radius around --near, in miles.
    #[arg(long, requires = "near")]
    max_distance: Option<f64>,
    #[arg(long)]
    min_free_rate_limit: Option<i64>,
    #[arg(long)]
    min_paygo_rate_limit: Option<i64>,
    #[arg(long)]
    min_subscribe_rate_limit: Option<i64>,
    /// Minimum provider age in seconds.
    #[arg(long)]
    min_provider_age: Option<i64>,
    #[arg(long)]
    min_open_contracts: Option<i64>,
    #[arg(long)]
    min_validator_payments: Option<i64>,
    /// One of: age, contract_count, amount_paid.
    #[arg(long, default_value = "")]
    sort: String,
}

impl SearchArgs {
    fn into_params(self) -> Result<ProviderSearchParams> {
        let mut params = ProviderSearchParams::new().with_sort_key(self.sort);
        params.pubkey = self.pubkey;
        params.service = self.service;
        params.min_free_rate_limit = self.min_free_rate_limit;
        params.min_paygo_rate_limit = self.min_paygo_rate_limit;
        params.min_subscribe_rate_limit = self.min_subscribe_rate_limit;
        params.min_provider_age = self.min_provider_age;
        params.min_open_contracts = self.min_open_contracts;
        params.min_validator_payments = self.min_validator_payments;

        if let (Some(near), Some(distance)) = (self.near, self.max_distance) {
            let coordinates = parse_coordinates(&near).context("invalid --near")?;
            params = params.with_max_distance(coordinates, distance);
        }
        Ok(params)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = DirectoryConfig::load(cli.config.as_deref()).context("loading configuration")?;
    init_tracing(&config.log)?;

    let pool = config.database.connect().await?;
    let store = PostgresDirectoryStore::new(pool);

    match cli.command {
        Command::Migrate => {
            store.migrate().await?;
            info!("migrations applied");
        }
        Command::Find { pubkey, service } => {
            let key = ProviderKey::new(pubkey, service);
            match store.find_provider(&key).await? {
                Some(provider) => println!("{}", serde_json::to_string_pretty(&provider)?),
                None => anyhow::bail!("provider {key} not found"),
            }
        }
        Command::Search(args) => {
            let providers = store.search_providers(&args.into_params()?).await?;
            println!("{}", serde_json::to_string_pretty(&providers)?);
        }
    }
    Ok(())
}
