use crate::{
    DEFAULT_GLYPH,
    cascade::{Plan, build_candidates},
    network::Classification,
};

/// What the page renders for one icon. `Image` starts at `primary` and the
/// browser walks `fallbacks` on error, ending at `glyph`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconMarkup {
    Image {
        primary: String,
        fallbacks: Vec<String>,
        glyph: String,
    },
    Glyph(String),
}

impl IconMarkup {
    pub fn new(
        url: &str,
        explicit: Option<&str>,
        glyph: &str,
        classification: Classification,
    ) -> Self {
        let glyph = match glyph.trim() {
            "" => DEFAULT_GLYPH.to_string(),
            glyph => glyph.to_string(),
        };

        let Plan::Candidates(candidates) = build_candidates(url, explicit, classification) else {
            return IconMarkup::Glyph(glyph);
        };

        let mut urls = candidates.into_iter().map(|candidate| candidate.url);

        match urls.next() {
            Some(primary) => IconMarkup::Image {
                primary,
                fallbacks: urls.collect(),
                glyph,
            },
            None => IconMarkup::Glyph(glyph),
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, IconMarkup::Image { .. })
    }

    pub fn primary(&self) -> &str {
        match self {
            IconMarkup::Image { primary, .. } => primary,
            IconMarkup::Glyph(_) => "",
        }
    }

    pub fn glyph(&self) -> &str {
        match self {
            IconMarkup::Image { glyph, .. } | IconMarkup::Glyph(glyph) => glyph,
        }
    }

    /// Remaining sources as a JSON array for a `data-fallbacks` attribute.
    pub fn fallbacks_json(&self) -> String {
        match self {
            IconMarkup::Image { fallbacks, .. } => {
                serde_json::to_string(fallbacks).unwrap_or_else(|_| "[]".to_string())
            }
            IconMarkup::Glyph(_) => "[]".to_string(),
        }
    }
}
