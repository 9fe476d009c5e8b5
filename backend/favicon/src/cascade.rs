//! Candidate construction and the per-icon fallback state machine.

use std::fmt;

use tracing::debug;

use crate::{
    DEFAULT_GLYPH,
    network::Classification,
    provider::{Target, providers},
};

/// Loads narrower or shorter than this are placeholder responses.
pub const MIN_ICON_DIMENSION: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Explicit,
    Provider(&'static str),
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Explicit => write!(f, "explicit"),
            Source::Provider(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub source: Source,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Candidates(Vec<Candidate>),
    /// Nothing to load; show the glyph straight away.
    Glyph,
}

impl Plan {
    pub fn urls(&self) -> Vec<&str> {
        match self {
            Plan::Candidates(candidates) => candidates.iter().map(|c| c.url.as_str()).collect(),
            Plan::Glyph => Vec::new(),
        }
    }
}

/// `[explicit?] ++ providers(classification)`, one URL per provider in order.
///
/// An unparseable target yields [`Plan::Glyph`] even when an explicit icon is
/// set. Providers that cannot build a URL for this target are skipped.
pub fn build_candidates(
    target: &str,
    explicit: Option<&str>,
    classification: Classification,
) -> Plan {
    let target = match Target::parse(target) {
        Ok(target) => target,
        Err(e) => {
            debug!("No icon candidates: {e}");
            return Plan::Glyph;
        }
    };

    let mut candidates = Vec::new();

    if let Some(url) = explicit.map(str::trim).filter(|url| !url.is_empty()) {
        candidates.push(Candidate {
            source: Source::Explicit,
            url: url.to_string(),
        });
    }

    for provider in providers(classification) {
        match provider.build(&target) {
            Ok(url) => candidates.push(Candidate {
                source: Source::Provider(provider.name),
                url,
            }),
            Err(e) => debug!("Skipping {}: {e}", provider.name),
        }
    }

    if candidates.is_empty() {
        Plan::Glyph
    } else {
        Plan::Candidates(candidates)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadEvent {
    Failed,
    TimedOut,
    Loaded { width: u32, height: u32 },
}

impl LoadEvent {
    pub fn is_usable(&self) -> bool {
        matches!(
            self,
            LoadEvent::Loaded { width, height }
                if *width >= MIN_ICON_DIMENSION && *height >= MIN_ICON_DIMENSION
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Load this candidate next.
    Try(Candidate),
    /// Final: this candidate rendered.
    Accepted(Candidate),
    /// Final: everything failed, show the glyph.
    Glyph(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Loading,
    Accepted,
    Exhausted,
}

/// Resolution state of one rendered icon.
#[derive(Debug, Clone)]
pub struct Cursor {
    candidates: Vec<Candidate>,
    glyph: String,
    index: usize,
    failures: usize,
    state: State,
}

impl Cursor {
    pub fn new(plan: Plan, glyph: impl Into<String>) -> Self {
        let candidates = match plan {
            Plan::Candidates(candidates) => candidates,
            Plan::Glyph => Vec::new(),
        };

        let mut glyph = glyph.into();
        if glyph.trim().is_empty() {
            glyph = DEFAULT_GLYPH.to_string();
        }

        let state = if candidates.is_empty() {
            State::Exhausted
        } else {
            State::Loading
        };

        Self {
            candidates,
            glyph,
            index: 0,
            failures: 0,
            state,
        }
    }

    /// What the icon should show right now.
    pub fn step(&self) -> Step {
        match self.state {
            State::Loading => Step::Try(self.candidates[self.index].clone()),
            State::Accepted => Step::Accepted(self.candidates[self.index].clone()),
            State::Exhausted => Step::Glyph(self.glyph.clone()),
        }
    }

    /// Feeds the outcome of loading the current candidate. Events arriving
    /// after a final step change nothing.
    pub fn on_event(&mut self, event: LoadEvent) -> Step {
        if self.state != State::Loading {
            return self.step();
        }

        if event.is_usable() {
            self.state = State::Accepted;
        } else {
            self.failures += 1;

            if self.index + 1 < self.candidates.len() {
                self.index += 1;
            } else {
                self.state = State::Exhausted;
            }
        }

        self.step()
    }

    pub fn current(&self) -> Option<&Candidate> {
        match self.state {
            State::Exhausted => None,
            _ => self.candidates.get(self.index),
        }
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn glyph(&self) -> &str {
        &self.glyph
    }

    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn is_terminal(&self) -> bool {
        self.state != State::Loading
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{OPEN_ORDER, RESTRICTED_ORDER};

    const TARGET: &str = "https://naiixi.com/signupbyemail.aspx?MemberCode=9e84";
    const EXPLICIT: &str = "https://aa.duangks.com/icon/TKV.png";

    fn candidates(plan: Plan) -> Vec<Candidate> {
        match plan {
            Plan::Candidates(candidates) => candidates,
            Plan::Glyph => panic!("expected candidates"),
        }
    }

    fn sources(candidates: &[Candidate]) -> Vec<Source> {
        candidates.iter().map(|c| c.source).collect()
    }

    #[test]
    fn follows_provider_order_per_classification() {
        for (classification, order) in [
            (Classification::Restricted, &RESTRICTED_ORDER),
            (Classification::Open, &OPEN_ORDER),
        ] {
            let built = candidates(build_candidates(TARGET, None, classification));
            let expected: Vec<Source> = order.iter().map(|p| Source::Provider(p.name)).collect();

            assert_eq!(sources(&built), expected);
        }

        assert_ne!(
            build_candidates(TARGET, None, Classification::Restricted),
            build_candidates(TARGET, None, Classification::Open)
        );
    }

    #[test]
    fn explicit_icon_leads_and_rest_is_unchanged() {
        for classification in [Classification::Restricted, Classification::Open] {
            let plain = candidates(build_candidates(TARGET, None, classification));
            let with_explicit =
                candidates(build_candidates(TARGET, Some(EXPLICIT), classification));

            assert_eq!(with_explicit[0].source, Source::Explicit);
            assert_eq!(with_explicit[0].url, EXPLICIT);
            assert_eq!(with_explicit[1..], plain[..]);
        }
    }

    #[test]
    fn blank_explicit_icon_is_ignored() {
        let built = candidates(build_candidates(TARGET, Some("  "), Classification::Open));

        assert_eq!(built[0].source, Source::Provider("Google"));
    }

    #[test]
    fn invalid_target_goes_straight_to_glyph() {
        let plan = build_candidates("not a url", Some(EXPLICIT), Classification::Open);
        assert_eq!(plan, Plan::Glyph);

        let cursor = Cursor::new(plan, "🍦");
        assert!(cursor.is_terminal());
        assert_eq!(cursor.current(), None);
        assert_eq!(cursor.failures(), 0);
        assert_eq!(cursor.step(), Step::Glyph("🍦".to_string()));
    }

    #[test]
    fn ip_hosts_skip_domain_services() {
        let built = candidates(build_candidates(
            "http://10.0.0.1/panel",
            None,
            Classification::Restricted,
        ));

        assert_eq!(
            sources(&built),
            [Source::Provider("bqb.cool"), Source::Provider("Direct")]
        );
    }

    #[test]
    fn accepts_first_usable_load_after_failures() {
        let plan = build_candidates(TARGET, Some(EXPLICIT), Classification::Restricted);
        let all = candidates(plan.clone());

        for k in 0..all.len() {
            let mut cursor = Cursor::new(plan.clone(), "🔗");

            for _ in 0..k {
                assert!(matches!(cursor.on_event(LoadEvent::Failed), Step::Try(_)));
            }

            let step = cursor.on_event(LoadEvent::Loaded {
                width: 64,
                height: 64,
            });

            assert_eq!(step, Step::Accepted(all[k].clone()));
            assert_eq!(cursor.failures(), k);
            assert!(cursor.is_terminal());
        }
    }

    #[test]
    fn tiny_images_count_as_failures() {
        let plan = build_candidates(TARGET, None, Classification::Open);
        let total = plan.urls().len();
        let mut cursor = Cursor::new(plan, "☁️");

        let mut last = cursor.step();
        for _ in 0..total {
            last = cursor.on_event(LoadEvent::Loaded {
                width: 1,
                height: 1,
            });
        }

        assert_eq!(last, Step::Glyph("☁️".to_string()));
        assert_eq!(cursor.failures(), total);
    }

    #[test]
    fn one_thin_dimension_is_enough_to_reject() {
        assert!(!LoadEvent::Loaded { width: 64, height: 1 }.is_usable());
        assert!(!LoadEvent::Loaded { width: 0, height: 64 }.is_usable());
        assert!(LoadEvent::Loaded { width: 2, height: 2 }.is_usable());
        assert!(!LoadEvent::TimedOut.is_usable());
    }

    #[test]
    fn exhaustion_ends_at_glyph() {
        let plan = build_candidates(TARGET, Some(EXPLICIT), Classification::Open);
        let total = plan.urls().len();
        let mut cursor = Cursor::new(plan, "💍");

        for i in 0..total {
            let event = if i % 2 == 0 {
                LoadEvent::Failed
            } else {
                LoadEvent::TimedOut
            };
            let step = cursor.on_event(event);

            if i + 1 < total {
                assert!(matches!(step, Step::Try(_)));
            } else {
                assert_eq!(step, Step::Glyph("💍".to_string()));
            }
        }

        assert_eq!(cursor.failures(), total);
        assert_eq!(cursor.current(), None);
    }

    #[test]
    fn late_events_do_not_reopen_a_final_icon() {
        let plan = build_candidates(TARGET, None, Classification::Open);
        let mut cursor = Cursor::new(plan, "🔗");

        let accepted = cursor.on_event(LoadEvent::Loaded {
            width: 32,
            height: 32,
        });
        let again = cursor.on_event(LoadEvent::Failed);

        assert_eq!(accepted, again);
        assert_eq!(cursor.failures(), 0);
    }

    #[test]
    fn blank_glyph_falls_back_to_default() {
        let cursor = Cursor::new(Plan::Glyph, " ");

        assert_eq!(cursor.glyph(), DEFAULT_GLYPH);
    }
}
