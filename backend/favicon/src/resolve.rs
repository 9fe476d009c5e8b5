use std::{future::Future, io, time::Duration};

use image::ImageReader;
use reqwest::Client;
use tokio::time::timeout;
use tracing::debug;

use crate::{
    cascade::{Candidate, Cursor, LoadEvent, Step, build_candidates},
    network::Classification,
};

pub const DEFAULT_ICON_TIMEOUT: Duration = Duration::from_millis(4000);

/// Most of a candidate body read while looking for image dimensions.
pub const MAX_ICON_BYTES: usize = 1024 * 1024;

pub trait ImageLoader {
    fn load(&self, url: &str) -> impl Future<Output = LoadEvent> + Send;
}

/// Fetches a candidate and reads its pixel dimensions.
pub struct HttpLoader {
    client: Client,
}

impl HttpLoader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl ImageLoader for HttpLoader {
    fn load(&self, url: &str) -> impl Future<Output = LoadEvent> + Send {
        async move {
            let mut response = match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => response,
                Ok(response) => {
                    debug!("{url} answered {}", response.status());
                    return LoadEvent::Failed;
                }
                Err(e) => {
                    debug!("{url} unreachable: {e}");
                    return LoadEvent::Failed;
                }
            };

            if response
                .content_length()
                .is_some_and(|length| length > MAX_ICON_BYTES as u64)
            {
                debug!("{url} declares a body over {MAX_ICON_BYTES} bytes");
                return LoadEvent::Failed;
            }

            let mut body = Vec::new();

            loop {
                match response.chunk().await {
                    Ok(Some(chunk)) => {
                        body.extend_from_slice(&chunk);

                        // headers are enough, the rest of the body is never read
                        if let Some((width, height)) = dimensions(&body) {
                            return LoadEvent::Loaded { width, height };
                        }

                        if body.len() > MAX_ICON_BYTES {
                            debug!("{url} sent over {MAX_ICON_BYTES} bytes without an image header");
                            return LoadEvent::Failed;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        debug!("{url} body failed: {e}");
                        return LoadEvent::Failed;
                    }
                }
            }

            debug!("{url} is not a decodable image");
            LoadEvent::Failed
        }
    }
}

pub fn dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    ImageReader::new(io::Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Icon { candidate: Candidate, failures: usize },
    Glyph { glyph: String, failures: usize },
}

/// Walks a [`Cursor`] to its final step. Each candidate gets `timeout` to
/// settle; a hang counts as a failure so the walk always finishes.
pub struct Resolver<L> {
    loader: L,
    timeout: Duration,
}

impl<L: ImageLoader + Sync> Resolver<L> {
    pub fn new(loader: L, timeout: Duration) -> Self {
        Self { loader, timeout }
    }

    pub async fn resolve(&self, mut cursor: Cursor) -> Resolution {
        let mut step = cursor.step();

        loop {
            match step {
                Step::Try(candidate) => {
                    let event = timeout(self.timeout, self.loader.load(&candidate.url))
                        .await
                        .unwrap_or(LoadEvent::TimedOut);

                    debug!(source = %candidate.source, url = %candidate.url, ?event, "Icon candidate settled");
                    step = cursor.on_event(event);
                }
                Step::Accepted(candidate) => {
                    return Resolution::Icon {
                        candidate,
                        failures: cursor.failures(),
                    };
                }
                Step::Glyph(glyph) => {
                    return Resolution::Glyph {
                        glyph,
                        failures: cursor.failures(),
                    };
                }
            }
        }
    }

    pub async fn resolve_site(
        &self,
        url: &str,
        explicit: Option<&str>,
        glyph: &str,
        classification: Classification,
    ) -> Resolution {
        let plan = build_candidates(url, explicit, classification);

        self.resolve(Cursor::new(plan, glyph)).await
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };

    use tokio::time::sleep;

    use super::*;
    use crate::{cascade::Source, testing};

    const TARGET: &str = "https://mojie.app/register";
    const EXPLICIT: &str = "https://cdn.example.com/mojie.png";
    const GOOGLE: &str = "https://www.google.com/s2/favicons?domain=mojie.app&sz=64";

    enum Behavior {
        Answer(LoadEvent),
        Hang,
    }

    /// Loader answering per URL; unknown URLs fail.
    #[derive(Default)]
    struct ScriptedLoader {
        script: HashMap<String, Behavior>,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedLoader {
        fn with(mut self, url: &str, behavior: Behavior) -> Self {
            self.script.insert(url.to_string(), behavior);
            self
        }
    }

    impl ImageLoader for ScriptedLoader {
        fn load(&self, url: &str) -> impl Future<Output = LoadEvent> + Send {
            async move {
                self.seen.lock().unwrap().push(url.to_string());

                match self.script.get(url) {
                    Some(Behavior::Answer(event)) => *event,
                    Some(Behavior::Hang) => {
                        sleep(Duration::from_secs(3600)).await;
                        LoadEvent::Failed
                    }
                    None => LoadEvent::Failed,
                }
            }
        }
    }

    fn ok() -> Behavior {
        Behavior::Answer(LoadEvent::Loaded {
            width: 32,
            height: 32,
        })
    }

    #[tokio::test]
    async fn explicit_icon_wins_when_it_loads() {
        let loader = ScriptedLoader::default().with(EXPLICIT, ok());
        let resolver = Resolver::new(loader, DEFAULT_ICON_TIMEOUT);

        let resolution = resolver
            .resolve_site(TARGET, Some(EXPLICIT), "💍", Classification::Open)
            .await;

        assert_eq!(
            resolution,
            Resolution::Icon {
                candidate: Candidate {
                    source: Source::Explicit,
                    url: EXPLICIT.to_string(),
                },
                failures: 0,
            }
        );
    }

    #[tokio::test]
    async fn falls_through_to_the_first_working_provider() {
        let loader = ScriptedLoader::default().with(GOOGLE, ok());
        let seen = loader.seen.clone();
        let resolver = Resolver::new(loader, DEFAULT_ICON_TIMEOUT);

        let resolution = resolver
            .resolve_site(TARGET, Some(EXPLICIT), "💍", Classification::Open)
            .await;

        match resolution {
            Resolution::Icon { candidate, failures } => {
                assert_eq!(candidate.url, GOOGLE);
                assert_eq!(failures, 1);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(*seen.lock().unwrap(), [EXPLICIT, GOOGLE]);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_candidate_times_out_and_advances() {
        let loader = ScriptedLoader::default()
            .with(EXPLICIT, Behavior::Hang)
            .with(GOOGLE, ok());
        let resolver = Resolver::new(loader, Duration::from_millis(250));

        let resolution = resolver
            .resolve_site(TARGET, Some(EXPLICIT), "💍", Classification::Open)
            .await;

        assert!(matches!(
            resolution,
            Resolution::Icon { ref candidate, failures: 1 } if candidate.url == GOOGLE
        ));
    }

    #[tokio::test]
    async fn degenerate_everywhere_ends_at_glyph() {
        let plan = build_candidates(TARGET, None, Classification::Restricted);
        let urls: Vec<String> = plan.urls().into_iter().map(str::to_string).collect();

        let mut loader = ScriptedLoader::default();
        for url in &urls {
            loader = loader.with(
                url,
                Behavior::Answer(LoadEvent::Loaded {
                    width: 1,
                    height: 1,
                }),
            );
        }
        let resolver = Resolver::new(loader, DEFAULT_ICON_TIMEOUT);

        let resolution = resolver.resolve(Cursor::new(plan, "🔗")).await;

        assert_eq!(
            resolution,
            Resolution::Glyph {
                glyph: "🔗".to_string(),
                failures: urls.len(),
            }
        );
    }

    #[tokio::test]
    async fn invalid_target_never_loads_anything() {
        let loader = ScriptedLoader::default();
        let seen = loader.seen.clone();
        let resolver = Resolver::new(loader, DEFAULT_ICON_TIMEOUT);

        let resolution = resolver
            .resolve_site("not a url", None, "🆓", Classification::Open)
            .await;

        assert_eq!(
            resolution,
            Resolution::Glyph {
                glyph: "🆓".to_string(),
                failures: 0,
            }
        );
        assert!(seen.lock().unwrap().is_empty());
    }

    const SIXTEEN_MIB: usize = 16 * 1024 * 1024;

    #[tokio::test]
    async fn http_loader_reads_a_served_png() {
        let origin = testing::serve("200 OK", testing::png(16, 8), true, 0).await;

        let event = HttpLoader::new(Client::new()).load(&origin.url).await;

        assert_eq!(event, LoadEvent::Loaded { width: 16, height: 8 });
    }

    #[tokio::test]
    async fn http_loader_fails_on_error_status() {
        let origin = testing::serve("404 Not Found", testing::png(16, 16), true, 0).await;

        let event = HttpLoader::new(Client::new()).load(&origin.url).await;

        assert_eq!(event, LoadEvent::Failed);
    }

    #[tokio::test]
    async fn http_loader_fails_on_html_body() {
        let origin = testing::serve("200 OK", b"<html>blocked</html>".to_vec(), true, 0).await;

        let event = HttpLoader::new(Client::new()).load(&origin.url).await;

        assert_eq!(event, LoadEvent::Failed);
    }

    #[tokio::test]
    async fn http_loader_refuses_declared_oversize_bodies() {
        let origin =
            testing::serve("200 OK", testing::png(16, 16), true, MAX_ICON_BYTES + 1).await;

        let event = HttpLoader::new(Client::new()).load(&origin.url).await;

        assert_eq!(event, LoadEvent::Failed);
    }

    #[tokio::test]
    async fn http_loader_stops_reading_once_dimensions_are_known() {
        let origin = testing::serve("200 OK", testing::png(16, 16), false, 4 * SIXTEEN_MIB).await;

        let event = HttpLoader::new(Client::new()).load(&origin.url).await;

        assert_eq!(event, LoadEvent::Loaded { width: 16, height: 16 });
        assert!(origin.written() < SIXTEEN_MIB, "read {} bytes", origin.written());
    }

    #[tokio::test]
    async fn http_loader_gives_up_on_endless_junk() {
        let origin = testing::serve(
            "200 OK",
            b"<html>blocked</html>".to_vec(),
            false,
            4 * SIXTEEN_MIB,
        )
        .await;

        let event = HttpLoader::new(Client::new()).load(&origin.url).await;

        assert_eq!(event, LoadEvent::Failed);
        assert!(origin.written() < SIXTEEN_MIB, "read {} bytes", origin.written());
    }

    #[test]
    fn reads_png_dimensions() {
        let png = testing::png(16, 8);

        assert_eq!(dimensions(&png), Some((16, 8)));
        assert_eq!(dimensions(b"<html>blocked</html>"), None);
    }
}
