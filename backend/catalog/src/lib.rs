//! # Catalog
//!
//! The document behind the navigation site: categories of link cards plus a
//! row of friend links. The server stores it wholesale under a single KV key
//! and the seed tool moves it between files, URLs and the KV store.

use std::{fs, path::Path};

use anyhow::{Context, Error};

pub mod defaults;
pub mod filter;
pub mod models;
pub mod remote;

pub use filter::filter;
pub use models::{Category, FriendLink, Site, SiteData, normalize};
pub use remote::get_catalog_remote;

/// KV key holding the whole catalog as one JSON document.
pub const SITES_KEY: &str = "sites";

pub fn get_catalog(path: impl AsRef<Path>) -> Result<SiteData, Error> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    serde_json::from_slice(&data).with_context(|| format!("Invalid catalog in {}", path.display()))
}

pub fn write_catalog(path: impl AsRef<Path>, data: &SiteData) -> Result<(), Error> {
    let path = path.as_ref();
    let json = serde_json::to_vec_pretty(data)?;

    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
