//! # Seed
//!
//! Operator tool for the catalog stored in the KV store.
//!
//! ```sh
//! navsite-seed import sites.json --redis-url redis://127.0.0.1/
//! navsite-seed export backup.json
//! navsite-seed icons --network restricted
//! ```

use std::{path::Path, time::Duration};

use anyhow::{Context, Error};
use catalog::{SITES_KEY, SiteData, get_catalog, get_catalog_remote, normalize, write_catalog};
use clap::ValueEnum;
use favicon::{
    Classification, Classifier, HttpLoader, HttpProbe, Resolver,
    network::{DEFAULT_PROBE_TIMEOUT, DEFAULT_PROBE_URL},
};
use redis::AsyncCommands;
use reqwest::Client;
use tracing::info;

pub mod report;

use report::{audit_icons, print_report};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    /// Probe once and decide.
    Auto,
    Open,
    Restricted,
}

pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

pub async fn load_source(source: &str) -> Result<SiteData, Error> {
    if is_remote(source) {
        get_catalog_remote(source).await
    } else {
        get_catalog(source)
    }
}

pub async fn import(source: &str, redis_url: &str) -> Result<(), Error> {
    let mut data = load_source(source).await?;
    normalize(&mut data);

    let json = serde_json::to_string(&data)?;
    let mut connection = redis::Client::open(redis_url)?
        .get_multiplexed_async_connection()
        .await
        .with_context(|| format!("Failed to connect to {redis_url}"))?;

    let () = connection.set(SITES_KEY, json).await?;

    println!("Imported {} categories, {} sites", data.categories.len(), data.sites().count());
    Ok(())
}

pub async fn export(path: &Path, redis_url: Option<&str>) -> Result<(), Error> {
    let data = match redis_url {
        Some(redis_url) => {
            let mut connection = redis::Client::open(redis_url)?
                .get_multiplexed_async_connection()
                .await
                .with_context(|| format!("Failed to connect to {redis_url}"))?;

            let stored: Option<String> = connection.get(SITES_KEY).await?;

            match stored {
                Some(json) => serde_json::from_str(&json).context("Stored catalog is unreadable")?,
                None => {
                    info!("Nothing stored under {SITES_KEY}, exporting defaults");
                    SiteData::default()
                }
            }
        }
        None => SiteData::default(),
    };

    write_catalog(path, &data)?;

    println!("Exported {} sites to {}", data.sites().count(), path.display());
    Ok(())
}

pub async fn icons(source: Option<&str>, network: Network, timeout_ms: u64) -> Result<(), Error> {
    let data = match source {
        Some(source) => load_source(source).await?,
        None => SiteData::default(),
    };

    let client = reqwest_client()?;
    let probe = HttpProbe::new(client.clone(), DEFAULT_PROBE_URL);

    let classification = match network {
        Network::Auto => Classifier::new(probe, DEFAULT_PROBE_TIMEOUT).classify().await,
        Network::Open => Classification::Open,
        Network::Restricted => Classification::Restricted,
    };
    println!("Network: {classification}\n");

    let resolver = Resolver::new(HttpLoader::new(client), Duration::from_millis(timeout_ms));
    let reports = audit_icons(&data, &resolver, classification, true).await?;

    print_report(&reports);
    Ok(())
}

fn reqwest_client() -> Result<Client, Error> {
    Ok(Client::builder()
        .user_agent(concat!("navsite-seed/", env!("CARGO_PKG_VERSION")))
        .build()?)
}
