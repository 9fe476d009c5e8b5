use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::{Host, Url};

use crate::{error::IconError, network::Classification};

/// Characters left alone by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// A link whose icon we want, parsed once.
#[derive(Debug, Clone)]
pub struct Target {
    url: Url,
    host: String,
}

impl Target {
    pub fn parse(raw: &str) -> Result<Self, IconError> {
        let url = Url::parse(raw.trim()).map_err(|_| IconError::InvalidTarget(raw.to_string()))?;

        let host = match url.host_str() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => return Err(IconError::InvalidTarget(raw.to_string())),
        };

        Ok(Self { url, host })
    }

    pub fn href(&self) -> &str {
        self.url.as_str()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn domain(&self, provider: &'static str) -> Result<&str, IconError> {
        match self.url.host() {
            Some(Host::Domain(domain)) => Ok(domain),
            _ => Err(IconError::NotADomain {
                provider,
                host: self.host.clone(),
            }),
        }
    }
}

#[derive(Clone, Copy)]
pub struct Provider {
    pub name: &'static str,
    build: fn(&Target) -> Result<String, IconError>,
}

impl Provider {
    pub fn build(&self, target: &Target) -> Result<String, IconError> {
        (self.build)(target)
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider").field("name", &self.name).finish()
    }
}

impl PartialEq for Provider {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Provider {}

pub const BQB: Provider = Provider {
    name: "bqb.cool",
    build: bqb,
};

pub const DUCKDUCKGO: Provider = Provider {
    name: "DuckDuckGo",
    build: duckduckgo,
};

pub const FAVICONE: Provider = Provider {
    name: "Favicone",
    build: favicone,
};

pub const DIRECT: Provider = Provider {
    name: "Direct",
    build: direct,
};

pub const GOOGLE: Provider = Provider {
    name: "Google",
    build: google,
};

fn bqb(target: &Target) -> Result<String, IconError> {
    Ok(format!(
        "https://icon.bqb.cool?url={}",
        utf8_percent_encode(target.href(), URI_COMPONENT)
    ))
}

fn duckduckgo(target: &Target) -> Result<String, IconError> {
    let domain = target.domain("DuckDuckGo")?;

    Ok(format!("https://icons.duckduckgo.com/ip3/{domain}.ico"))
}

fn favicone(target: &Target) -> Result<String, IconError> {
    let domain = target.domain("Favicone")?;

    Ok(format!("https://favicone.com/{domain}?s=64"))
}

fn direct(target: &Target) -> Result<String, IconError> {
    Ok(format!("https://{}/favicon.ico", target.host()))
}

fn google(target: &Target) -> Result<String, IconError> {
    let domain = target.domain("Google")?;

    Ok(format!("https://www.google.com/s2/favicons?domain={domain}&sz=64"))
}

pub const RESTRICTED_ORDER: [Provider; 5] = [BQB, DUCKDUCKGO, FAVICONE, DIRECT, GOOGLE];

pub const OPEN_ORDER: [Provider; 5] = [GOOGLE, DUCKDUCKGO, BQB, DIRECT, FAVICONE];

pub fn providers(classification: Classification) -> &'static [Provider] {
    match classification {
        Classification::Restricted => &RESTRICTED_ORDER,
        Classification::Open => &OPEN_ORDER,
    }
}
