use anyhow::{Context, Error, bail};
use reqwest::get;

use crate::models::SiteData;

pub async fn get_catalog_remote(url: &str) -> Result<SiteData, Error> {
    let response = get(url).await.with_context(|| format!("Failed to fetch {url}"))?;

    if !response.status().is_success() {
        bail!("Fetching {url} returned {}", response.status());
    }

    let bytes = response.bytes().await?;

    serde_json::from_slice(&bytes).with_context(|| format!("Invalid catalog from {url}"))
}
