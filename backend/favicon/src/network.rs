//! Network environment classification.
//!
//! One request to a resource that is only reachable from unrestricted
//! networks. Any answer at all means `open`; an error or the timeout means
//! `restricted`. The probe cannot tell a blocked network from a resource that
//! is briefly down, so the label only picks which provider ordering is likely
//! faster.

use std::{fmt, future::Future, str::FromStr, time::Duration};

use reqwest::Client;
use serde::Serialize;
use tokio::{sync::OnceCell, time::timeout};
use tracing::{debug, info};

pub const DEFAULT_PROBE_URL: &str = "https://www.google.com/favicon.ico";
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(2000);

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Restricted,
    Open,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Restricted => write!(f, "restricted"),
            Classification::Open => write!(f, "open"),
        }
    }
}

impl FromStr for Classification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "restricted" => Ok(Classification::Restricted),
            "open" => Ok(Classification::Open),
            other => Err(format!("unknown network classification '{other}'")),
        }
    }
}

pub trait Probe {
    /// Whether the probe resource answered. Errors are the signal, not a
    /// failure, so this never returns one.
    fn reach(&self) -> impl Future<Output = bool> + Send;
}

pub struct HttpProbe {
    client: Client,
    url: String,
}

impl HttpProbe {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl Probe for HttpProbe {
    fn reach(&self) -> impl Future<Output = bool> + Send {
        async move {
            match self.client.get(&self.url).send().await {
                Ok(response) => {
                    debug!(url = %self.url, status = %response.status(), "Probe answered");
                    true
                }
                Err(e) => {
                    debug!(url = %self.url, "Probe failed: {e}");
                    false
                }
            }
        }
    }
}

/// Memoized classification. The first [`Classifier::classify`] runs the probe;
/// every later call, concurrent ones included, gets the cached answer.
pub struct Classifier<P> {
    probe: P,
    timeout: Duration,
    classification: OnceCell<Classification>,
}

impl<P: Probe + Sync> Classifier<P> {
    pub fn new(probe: P, timeout: Duration) -> Self {
        Self {
            probe,
            timeout,
            classification: OnceCell::new(),
        }
    }

    /// A classifier that never probes, for operators who already know the
    /// network.
    pub fn preset(probe: P, classification: Classification) -> Self {
        Self {
            probe,
            timeout: DEFAULT_PROBE_TIMEOUT,
            classification: OnceCell::new_with(Some(classification)),
        }
    }

    pub async fn classify(&self) -> Classification {
        *self
            .classification
            .get_or_init(|| async {
                let reached = timeout(self.timeout, self.probe.reach())
                    .await
                    .unwrap_or(false);

                let classification = if reached {
                    Classification::Open
                } else {
                    Classification::Restricted
                };

                info!("Network classified as {classification}");
                classification
            })
            .await
    }

    pub fn cached(&self) -> Option<Classification> {
        self.classification.get().copied()
    }
}
