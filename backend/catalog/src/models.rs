use std::sync::LazyLock;

use favicon::{Classification, IconMarkup};
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

pub use favicon::DEFAULT_GLYPH;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SiteData {
    pub categories: Vec<Category>,
    #[serde(default)]
    pub friend_links: Vec<FriendLink>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub sites: Vec<Site>,
}

/// One link card.
///
/// `icon` is the glyph shown when no icon image can be loaded, so it is
/// always present after [`normalize`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub name: String,
    #[serde(default)]
    pub desc: String,
    pub url: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default = "default_glyph")]
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub color: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FriendLink {
    pub name: String,
    pub url: String,
}

fn default_glyph() -> String {
    DEFAULT_GLYPH.to_string()
}

impl Site {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            desc: String::new(),
            url: url.into(),
            domain: String::new(),
            icon: default_glyph(),
            icon_url: None,
            color: String::new(),
        }
    }

    /// Explicit icon override, ignoring blank values.
    pub fn explicit_icon(&self) -> Option<&str> {
        self.icon_url.as_deref().filter(|url| !url.trim().is_empty())
    }

    pub fn icon_markup(&self, classification: Classification) -> IconMarkup {
        IconMarkup::new(&self.url, self.explicit_icon(), &self.icon, classification)
    }
}

impl SiteData {
    pub fn sites(&self) -> impl Iterator<Item = &Site> {
        self.categories.iter().flat_map(|category| category.sites.iter())
    }
}

pub fn collapse_whitespace(input: &str) -> String {
    WHITESPACE.replace_all(input.trim(), " ").into_owned()
}

pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .host_str()
        .filter(|host| !host.is_empty())
        .map(str::to_string)
}

pub fn normalize(data: &mut SiteData) {
    for category in &mut data.categories {
        category.title = collapse_whitespace(&category.title);

        for site in &mut category.sites {
            normalize_site(site);
        }
    }

    for link in &mut data.friend_links {
        link.name = collapse_whitespace(&link.name);
        link.url = link.url.trim().to_string();
    }
}

fn normalize_site(site: &mut Site) {
    site.name = collapse_whitespace(&site.name);
    site.desc = collapse_whitespace(&site.desc);
    site.url = site.url.trim().to_string();

    if site.domain.trim().is_empty() {
        if let Some(host) = host_of(&site.url) {
            site.domain = host;
        }
    }

    if site.icon.trim().is_empty() {
        site.icon = default_glyph();
    } else {
        site.icon = site.icon.trim().to_string();
    }

    if site.explicit_icon().is_none() {
        site.icon_url = None;
    }
}
