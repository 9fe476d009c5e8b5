//! # Favicon
//!
//! Picks a working icon for an arbitrary external link even though the public
//! favicon services are unreliable and answer differently depending on where
//! the visitor sits.
//!
//! ## Pieces
//!
//! - [`network`]: one-shot reachability probe that labels the network as
//!   `open` or `restricted`, memoized for the life of the process.
//! - [`provider`]: the icon services and the two orderings, one per
//!   classification, with the historically faster services first.
//! - [`cascade`]: builds the ordered candidate list for a link and walks it as
//!   loads fail. A load that "succeeds" with a sub-2px image counts as a
//!   failure. Every walk ends at an accepted image or at the site's glyph.
//! - [`resolve`]: drives a cascade against real HTTP with a per-candidate
//!   timeout.
//! - [`markup`]: the shape the page template renders: a primary source, the
//!   remaining fallbacks, and the glyph.
//!
//! ## Orderings
//!
//! | # | restricted | open |
//! |---|------------|------|
//! | 1 | bqb.cool   | Google |
//! | 2 | DuckDuckGo | DuckDuckGo |
//! | 3 | Favicone   | bqb.cool |
//! | 4 | Direct     | Direct |
//! | 5 | Google     | Favicone |
//!
//! An explicit icon set by the catalog author always goes first.

pub mod cascade;
pub mod error;
pub mod markup;
pub mod network;
pub mod provider;
pub mod resolve;

#[cfg(test)]
mod testing;

pub use cascade::{Candidate, Cursor, LoadEvent, Plan, Source, Step, build_candidates};
pub use error::IconError;
pub use markup::IconMarkup;
pub use network::{Classification, Classifier, HttpProbe, Probe};
pub use resolve::{HttpLoader, ImageLoader, Resolution, Resolver};

pub const DEFAULT_GLYPH: &str = "🔗";
