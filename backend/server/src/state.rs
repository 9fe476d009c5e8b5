use std::sync::Arc;

use anyhow::Error;
use catalog::{SiteData, normalize};
use favicon::{Classifier, HttpLoader, HttpProbe, Resolver};
use reqwest::Client;
use tracing::warn;

use super::{
    config::Config,
    database::{Kv, SITES_KEY},
    error::AppError,
};

pub struct AppState {
    pub config: Config,
    pub kv: Kv,
    pub classifier: Classifier<HttpProbe>,
    pub resolver: Resolver<HttpLoader>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Arc<Self>, Error> {
        let kv = Kv::connect(config.redis_url.as_deref()).await?;

        Self::build(config, kv)
    }

    pub fn build(config: Config, kv: Kv) -> Result<Arc<Self>, Error> {
        let client = Client::builder()
            .user_agent(concat!("navsite/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let probe = HttpProbe::new(client.clone(), config.probe_url.clone());
        let classifier = match config.network {
            Some(classification) => Classifier::preset(probe, classification),
            None => Classifier::new(probe, config.probe_timeout),
        };

        let resolver = Resolver::new(HttpLoader::new(client), config.icon_timeout);

        Ok(Arc::new(Self {
            config,
            kv,
            classifier,
            resolver,
        }))
    }

    /// Stored catalog, or the built-in one when nothing usable is stored.
    pub async fn load_sites(&self) -> Result<SiteData, AppError> {
        let Some(json) = self.kv.get(SITES_KEY).await? else {
            return Ok(SiteData::default());
        };

        match serde_json::from_str(&json) {
            Ok(data) => Ok(data),
            Err(e) => {
                warn!("Stored catalog is unreadable, serving defaults: {e}");
                Ok(SiteData::default())
            }
        }
    }

    pub async fn store_sites(&self, mut data: SiteData) -> Result<SiteData, AppError> {
        if !self.kv.is_enabled() {
            return Err(AppError::StorageNotConfigured);
        }

        normalize(&mut data);

        let json = serde_json::to_string(&data).map_err(|e| AppError::InternalError(e.into()))?;
        self.kv.put(SITES_KEY, json).await?;

        Ok(data)
    }
}
