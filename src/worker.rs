//! The offline cache interceptor and its lifecycle handlers.
//!
//! Each request goes through
//! `Intercepted -> {Cache | Network + write-back | Fallback | propagated error}`,
//! or is bypassed when its origin is not intercepted. There are no retries
//! inside a single interception; queued API requests are retried only by
//! background sync.

use std::sync::Arc;

use futures::future::try_join_all;
use serde::Serialize;
use tokio_util::task::TaskTracker;

use crate::config::WorkerConfig;
use crate::error::{Error, Result};
use crate::http::{Destination, Request, RequestKey, RequestMode, Response};
use crate::network::Fetcher;
use crate::routing::{Partition, Router};
use crate::store::CacheStore;
use crate::sync::{SyncReport, replay_partition};

/// Body of the synthesized response for API requests made while offline.
#[derive(Debug, Serialize)]
struct OfflineBody<'a> {
    error: &'a str,
    message: &'a str,
}

/// The 503 JSON response served for uncached API requests while offline.
///
/// # Errors
///
/// Returns an error if the body cannot be serialized.
pub fn offline_api_response() -> Result<Response> {
    Response::json(
        503,
        &OfflineBody {
            error: "Offline",
            message: "This content is not available offline",
        },
    )
}

/// Lifecycle events delivered by the host.
#[derive(Debug, Clone)]
pub enum Event {
    /// A new version is being installed.
    Install,
    /// The installed version takes control.
    Activate,
    /// The page issued a request.
    Fetch(Request),
    /// Connectivity returned; the payload is the sync tag.
    Sync(String),
}

/// How an intercepted request was answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Origin not intercepted; the host should perform the request itself.
    Bypass,
    /// Served from a partition without touching the network.
    Cache(Response),
    /// Served from the network.
    Network(Response),
    /// Network failed; served an offline substitute.
    Fallback(Response),
}

impl FetchOutcome {
    /// The response handed to the page, if the request was intercepted.
    #[must_use]
    pub const fn response(&self) -> Option<&Response> {
        match self {
            Self::Bypass => None,
            Self::Cache(r) | Self::Network(r) | Self::Fallback(r) => Some(r),
        }
    }

    /// Consumes the outcome, returning the response.
    #[must_use]
    pub fn into_response(self) -> Option<Response> {
        match self {
            Self::Bypass => None,
            Self::Cache(r) | Self::Network(r) | Self::Fallback(r) => Some(r),
        }
    }

    /// Short label for logs and CLI output.
    #[must_use]
    pub const fn source(&self) -> &'static str {
        match self {
            Self::Bypass => "bypass",
            Self::Cache(_) => "cache",
            Self::Network(_) => "network",
            Self::Fallback(_) => "fallback",
        }
    }
}

/// Result of handling one [`Event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Number of manifest entries cached.
    Installed(usize),
    /// Names of the partitions deleted.
    Activated(Vec<String>),
    /// Answer to an intercepted request.
    Fetched(FetchOutcome),
    /// Sync report, or `None` when the tag was not ours.
    Synced(Option<SyncReport>),
}

/// Offline cache interceptor over an injected store and network.
pub struct ServiceWorker<S, F> {
    config: WorkerConfig,
    router: Router,
    store: Arc<S>,
    fetcher: F,
    writes: TaskTracker,
}

impl<S, F> ServiceWorker<S, F>
where
    S: CacheStore + 'static,
    F: Fetcher,
{
    /// Creates a worker with the default routing rules.
    #[must_use]
    pub fn new(config: WorkerConfig, store: S, fetcher: F) -> Self {
        Self::with_shared_store(config, Arc::new(store), fetcher)
    }

    /// Creates a worker over a store the caller keeps a handle to.
    #[must_use]
    pub fn with_shared_store(config: WorkerConfig, store: Arc<S>, fetcher: F) -> Self {
        Self {
            config,
            router: Router::default(),
            store,
            fetcher,
            writes: TaskTracker::new(),
        }
    }

    /// Replaces the routing rules.
    #[must_use]
    pub fn with_router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    /// Returns the worker configuration.
    #[must_use]
    pub const fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Returns the cache store.
    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Dispatches a lifecycle event to its handler.
    ///
    /// # Errors
    ///
    /// Propagates the handler's error.
    pub async fn handle_event(&self, event: Event) -> Result<EventOutcome> {
        match event {
            Event::Install => self.install().await.map(EventOutcome::Installed),
            Event::Activate => self.activate().await.map(EventOutcome::Activated),
            Event::Fetch(request) => self.handle_fetch(request).await.map(EventOutcome::Fetched),
            Event::Sync(tag) => self.sync(&tag).await.map(EventOutcome::Synced),
        }
    }

    /// Pre-populates the static partition with the app shell manifest.
    ///
    /// All manifest entries are fetched before anything is written; if any
    /// of them fails or returns a non-2xx status, nothing is cached. A store
    /// write failing midway removes the entries written before it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Install`] naming the first entry that failed.
    pub async fn install(&self) -> Result<usize> {
        let name = &self.config.static_cache;
        self.store.open(name).await?;
        log::info!("Opened cache {name}");

        let requests: Vec<Request> = self
            .config
            .precache_urls()?
            .into_iter()
            .map(|url| Request::get(url).with_mode(RequestMode::Cors))
            .collect();

        let responses = try_join_all(requests.iter().map(|request| async move {
            match self.fetcher.fetch(request).await {
                Ok(response) if response.is_ok() => Ok(response),
                Ok(response) => Err(Error::Install {
                    url: request.url.to_string(),
                    reason: format!("HTTP {}", response.status),
                }),
                Err(e) => Err(Error::Install {
                    url: request.url.to_string(),
                    reason: e.to_string(),
                }),
            }
        }))
        .await?;

        let mut written = Vec::with_capacity(requests.len());
        for (request, response) in requests.iter().zip(&responses) {
            if let Err(e) = self.store.put(name, request, response).await {
                log::error!("Failed to cache {} in {name}: {e}", request.url);
                self.discard(name, &written).await;
                return Err(e);
            }
            written.push(request.key());
        }
        log::info!("Cached {} app shell resource(s) in {name}", responses.len());
        Ok(responses.len())
    }

    /// Deletes every partition except the current static version and the API partition.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot list or delete partitions.
    pub async fn activate(&self) -> Result<Vec<String>> {
        let keep = self.config.retained_partitions();
        let mut deleted = Vec::new();
        for name in self.store.partitions().await? {
            if keep.contains(&name.as_str()) {
                continue;
            }
            log::info!("Deleting old cache: {name}");
            if self.store.delete_partition(&name).await? {
                deleted.push(name);
            }
        }
        Ok(deleted)
    }

    /// Answers an intercepted request: cache first, then network, then fallback.
    ///
    /// Only `GET` requests are served from or written to partitions.
    ///
    /// # Errors
    ///
    /// Returns the network error for requests with no fallback, and
    /// [`Error::FallbackMissing`] when the offline page or placeholder image
    /// was never cached.
    pub async fn handle_fetch(&self, request: Request) -> Result<FetchOutcome> {
        if !self.config.is_intercepted_origin(&request.origin()) {
            log::trace!("Not intercepting {}", request.url);
            return Ok(FetchOutcome::Bypass);
        }

        if request.is_get() {
            if let Some(hit) = self.store.match_any(&request.key()).await? {
                log::debug!("Cache hit: {}", request.url);
                return Ok(FetchOutcome::Cache(hit));
            }
        }

        match self.fetcher.fetch(&request).await {
            Ok(response) => {
                if request.is_get() && response.is_cacheable() {
                    self.write_back(request, response.clone());
                }
                Ok(FetchOutcome::Network(response))
            }
            Err(e) => {
                log::info!("Network failed: {} ({e})", request.url);
                self.fallback(&request, e).await
            }
        }
    }

    /// Replays queued API requests when `tag` is the configured sync tag.
    ///
    /// Returns `None` for any other tag.
    ///
    /// # Errors
    ///
    /// Returns an error only if the API partition cannot be enumerated;
    /// per-entry failures are logged and counted in the report.
    pub async fn sync(&self, tag: &str) -> Result<Option<SyncReport>> {
        if tag != self.config.sync_tag {
            log::debug!("Ignoring sync tag {tag}");
            return Ok(None);
        }
        let report = replay_partition(
            self.store.as_ref(),
            &self.fetcher,
            &self.config.api_cache,
            self.config.sync_concurrency,
        )
        .await?;
        log::info!(
            "Background sync finished: {} replayed, {} still queued",
            report.replayed,
            report.failed
        );
        Ok(Some(report))
    }

    /// Waits for every background cache write started so far.
    pub async fn settle(&self) {
        self.writes.close();
        self.writes.wait().await;
        self.writes.reopen();
    }

    /// Stores a copy of a network response in its routed partition, off the
    /// response path. Failures are logged.
    fn write_back(&self, request: Request, response: Response) {
        let partition = self.router.route(&request.url);
        let name = self.config.partition_name(partition).to_string();
        let store = Arc::clone(&self.store);
        self.writes.spawn(async move {
            match store.put(&name, &request, &response).await {
                Ok(()) => log::debug!("Cached {} in {name}", request.url),
                Err(e) => log::warn!("Failed to cache {} in {name}: {e}", request.url),
            }
        });
    }

    /// Best-effort removal of entries written by an install that failed.
    async fn discard(&self, name: &str, keys: &[RequestKey]) {
        for key in keys {
            if let Err(e) = self.store.delete(name, key).await {
                log::warn!("Failed to remove {key} from {name}: {e}");
            }
        }
    }

    async fn fallback(&self, request: &Request, error: Error) -> Result<FetchOutcome> {
        match request.destination {
            Destination::Document => self.cached_fallback(&self.config.offline_page).await,
            Destination::Image => self.cached_fallback(&self.config.placeholder_image).await,
            Destination::Other if request.url.as_str().contains("/api/") => {
                if request.is_get() {
                    let api = self.config.partition_name(Partition::Api);
                    if let Some(hit) = self.store.match_in(api, &request.key()).await? {
                        return Ok(FetchOutcome::Fallback(hit));
                    }
                }
                Ok(FetchOutcome::Fallback(offline_api_response()?))
            }
            Destination::Other => Err(error),
        }
    }

    async fn cached_fallback(&self, path: &str) -> Result<FetchOutcome> {
        let url = self.config.resolve(path)?;
        self.store
            .match_any(&RequestKey::get(&url))
            .await?
            .map(FetchOutcome::Fallback)
            .ok_or_else(|| Error::FallbackMissing(url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ResponseType;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    /// Fetcher answering from a fixed table keyed by URL; unknown URLs fail
    /// as if offline.
    #[derive(Default)]
    struct ScriptedFetcher {
        responses: Mutex<HashMap<String, Response>>,
        calls: AtomicUsize,
    }

    impl ScriptedFetcher {
        fn respond(&self, url: &str, response: Response) {
            self.responses
                .lock()
                .unwrap()
                .insert(url.to_string(), response);
        }

        fn go_offline(&self) {
            self.responses.lock().unwrap().clear();
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Fetcher for ScriptedFetcher {
        async fn fetch(&self, request: &Request) -> Result<Response> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .get(request.url.as_str())
                .cloned()
                .ok_or_else(|| Error::Network("offline".to_string()))
        }
    }

    /// Memory store with injectable faults: `put` can start failing after a
    /// number of successful calls, and `match_any` can be made to miss so the
    /// partition-scoped lookups run on their own.
    #[derive(Default)]
    struct FaultyStore {
        inner: MemoryStore,
        puts_before_failure: Option<usize>,
        puts: AtomicUsize,
        miss_on_match_any: bool,
    }

    #[async_trait]
    impl CacheStore for FaultyStore {
        async fn partitions(&self) -> Result<Vec<String>> {
            self.inner.partitions().await
        }

        async fn open(&self, partition: &str) -> Result<()> {
            self.inner.open(partition).await
        }

        async fn delete_partition(&self, partition: &str) -> Result<bool> {
            self.inner.delete_partition(partition).await
        }

        async fn match_in(&self, partition: &str, key: &RequestKey) -> Result<Option<Response>> {
            self.inner.match_in(partition, key).await
        }

        async fn put(&self, partition: &str, request: &Request, response: &Response) -> Result<()> {
            let n = self.puts.fetch_add(1, Ordering::SeqCst);
            if self.puts_before_failure.is_some_and(|limit| n >= limit) {
                return Err(Error::Io(std::io::Error::other("no space left on device")));
            }
            self.inner.put(partition, request, response).await
        }

        async fn delete(&self, partition: &str, key: &RequestKey) -> Result<bool> {
            self.inner.delete(partition, key).await
        }

        async fn requests(&self, partition: &str) -> Result<Vec<Request>> {
            self.inner.requests(partition).await
        }

        async fn match_any(&self, key: &RequestKey) -> Result<Option<Response>> {
            if self.miss_on_match_any {
                return Ok(None);
            }
            self.inner.match_any(key).await
        }
    }

    const ORIGIN: &str = "http://localhost:5000";

    fn url(path: &str) -> Url {
        Url::parse(ORIGIN).unwrap().join(path).unwrap()
    }

    fn worker(precache: &[&str]) -> ServiceWorker<MemoryStore, ScriptedFetcher> {
        let config = WorkerConfig::default().with_precache(precache.iter().copied());
        ServiceWorker::new(config, MemoryStore::new(), ScriptedFetcher::default())
    }

    #[tokio::test]
    async fn install_caches_manifest() {
        let sw = worker(&["/", "/offline.html"]);
        sw.fetcher.respond("http://localhost:5000/", Response::new(200, "<html>home</html>"));
        sw.fetcher.respond("http://localhost:5000/offline.html", Response::new(200, "<html>offline</html>"));

        assert_eq!(sw.install().await.unwrap(), 2);
        assert_eq!(sw.store().len("drcare-v1.1").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn install_is_all_or_nothing() {
        let sw = worker(&["/", "/offline.html", "/static/styles.css"]);
        sw.fetcher.respond("http://localhost:5000/", Response::new(200, "home"));
        sw.fetcher.respond("http://localhost:5000/offline.html", Response::new(404, ""));
        sw.fetcher.respond("http://localhost:5000/static/styles.css", Response::new(200, "a{}"));

        let err = sw.install().await.unwrap_err();
        assert!(matches!(err, Error::Install { ref url, .. } if url.ends_with("/offline.html")));
        assert_eq!(sw.store().len("drcare-v1.1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn install_fails_when_entry_unreachable() {
        let sw = worker(&["/", "https://cdn.tailwindcss.com"]);
        sw.fetcher.respond("http://localhost:5000/", Response::new(200, "home"));

        assert!(matches!(sw.install().await, Err(Error::Install { .. })));
        assert_eq!(sw.store().len("drcare-v1.1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn install_removes_partial_writes_when_store_fails() {
        let config = WorkerConfig::default().with_precache(["/", "/offline.html", "/static/styles.css"]);
        let store = FaultyStore {
            puts_before_failure: Some(2),
            ..FaultyStore::default()
        };
        let sw = ServiceWorker::new(config, store, ScriptedFetcher::default());
        for path in ["/", "/offline.html", "/static/styles.css"] {
            sw.fetcher.respond(url(path).as_str(), Response::new(200, path));
        }

        assert!(matches!(sw.install().await, Err(Error::Io(_))));
        assert_eq!(sw.store().len("drcare-v1.1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn activate_keeps_only_current_static_and_api() {
        let sw = worker(&[]);
        for name in ["drcare-v1.0", "drcare-v1.1", "drcare-api-v1", "drcare-images-v1", "other"] {
            sw.store().open(name).await.unwrap();
        }

        let deleted = sw.activate().await.unwrap();

        assert_eq!(deleted, vec!["drcare-v1.0", "drcare-images-v1", "other"]);
        assert_eq!(
            sw.store().partitions().await.unwrap(),
            vec!["drcare-v1.1", "drcare-api-v1"]
        );
    }

    #[tokio::test]
    async fn foreign_origin_is_bypassed() {
        let sw = worker(&[]);
        let request = Request::get(Url::parse("https://analytics.example/collect").unwrap());

        let outcome = sw.handle_fetch(request).await.unwrap();

        assert_eq!(outcome, FetchOutcome::Bypass);
        assert_eq!(sw.fetcher.calls(), 0);
        assert!(sw.store().partitions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cache_hit_skips_network() {
        let sw = worker(&[]);
        let request = Request::get(url("/static/styles.css"));
        sw.store()
            .put("drcare-v1.1", &request, &Response::new(200, "cached"))
            .await
            .unwrap();
        sw.fetcher.respond(request.url.as_str(), Response::new(200, "fresh"));

        let outcome = sw.handle_fetch(request).await.unwrap();

        assert_eq!(outcome.source(), "cache");
        assert_eq!(outcome.response().unwrap().body, "cached");
        assert_eq!(sw.fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn api_response_is_written_through() {
        let sw = worker(&[]);
        let request = Request::get(url("/api/appointments/12"));
        let body = Response::new(200, "{\"id\":12}").with_header("Content-Type", "application/json");
        sw.fetcher.respond(request.url.as_str(), body.clone());

        let outcome = sw.handle_fetch(request.clone()).await.unwrap();
        sw.settle().await;

        assert_eq!(outcome, FetchOutcome::Network(body.clone()));
        let cached = sw.store().match_in("drcare-api-v1", &request.key()).await.unwrap();
        assert_eq!(cached, Some(body));
    }

    #[tokio::test]
    async fn responses_route_to_partitions() {
        let sw = worker(&[]);
        for path in ["/appointments", "/static/icons/logo.png", "/doctors"] {
            sw.fetcher.respond(url(path).as_str(), Response::new(200, path));
            sw.handle_fetch(Request::get(url(path))).await.unwrap();
        }
        sw.settle().await;

        assert_eq!(sw.store().len("drcare-api-v1").await.unwrap(), 1);
        assert_eq!(sw.store().len("drcare-images-v1").await.unwrap(), 1);
        assert_eq!(sw.store().len("drcare-v1.1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn uncacheable_responses_are_not_written() {
        let sw = worker(&[]);
        let cdn = "https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/css/bootstrap.min.css";
        sw.fetcher.respond(cdn, Response::opaque());
        sw.fetcher.respond(url("/missing").as_str(), Response::new(404, "nope"));
        sw.fetcher.respond(url("/created").as_str(), Response::new(201, "made"));

        let outcome = sw.handle_fetch(Request::get(Url::parse(cdn).unwrap())).await.unwrap();
        assert_eq!(outcome.response().unwrap().kind, ResponseType::Opaque);
        let outcome = sw.handle_fetch(Request::get(url("/missing"))).await.unwrap();
        assert_eq!(outcome.response().unwrap().status, 404);
        sw.handle_fetch(Request::get(url("/created"))).await.unwrap();
        sw.settle().await;

        assert!(sw.store().partitions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn offline_navigation_serves_offline_page() {
        let sw = worker(&["/offline.html"]);
        let page = Response::new(200, "<html>You are offline</html>");
        sw.fetcher.respond(url("/offline.html").as_str(), page.clone());
        sw.install().await.unwrap();
        sw.fetcher.go_offline();

        let outcome = sw.handle_fetch(Request::navigate(url("/dashboard"))).await.unwrap();

        assert_eq!(outcome, FetchOutcome::Fallback(page));
    }

    #[tokio::test]
    async fn offline_navigation_without_offline_page_fails() {
        let sw = worker(&[]);
        let err = sw.handle_fetch(Request::navigate(url("/dashboard"))).await.unwrap_err();
        assert!(matches!(err, Error::FallbackMissing(ref u) if u.ends_with("/offline.html")));
    }

    #[tokio::test]
    async fn offline_image_serves_placeholder() {
        let sw = worker(&[]);
        let placeholder = Response::new(200, &b"\x89PNG"[..]);
        sw.store()
            .put("drcare-images-v1", &Request::get(url("/static/icons/placeholder.png")), &placeholder)
            .await
            .unwrap();

        let outcome = sw.handle_fetch(Request::image(url("/uploads/xray.jpg"))).await.unwrap();

        assert_eq!(outcome, FetchOutcome::Fallback(placeholder));
    }

    #[tokio::test]
    async fn offline_api_without_cache_is_503_json() {
        let sw = worker(&[]);

        let outcome = sw.handle_fetch(Request::get(url("/api/foo"))).await.unwrap();

        let FetchOutcome::Fallback(response) = outcome else {
            panic!("expected fallback, got {outcome:?}");
        };
        assert_eq!(response.status, 503);
        assert_eq!(response.header("Content-Type"), Some("application/json"));
        assert_eq!(
            response.body,
            r#"{"error":"Offline","message":"This content is not available offline"}"#
        );
    }

    #[tokio::test]
    async fn offline_api_served_from_api_partition() {
        let store = FaultyStore {
            miss_on_match_any: true,
            ..FaultyStore::default()
        };
        let sw = ServiceWorker::new(WorkerConfig::default(), store, ScriptedFetcher::default());
        let request = Request::get(url("/api/appointments/5"));
        let cached = Response::new(200, "{\"id\":5}");
        sw.store().put("drcare-api-v1", &request, &cached).await.unwrap();

        let outcome = sw.handle_fetch(request).await.unwrap();

        assert_eq!(outcome, FetchOutcome::Fallback(cached));
        assert_eq!(sw.fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn post_requests_always_reach_the_network() {
        let sw = worker(&[]);
        let target = url("/appointments/book");
        sw.fetcher.respond(target.as_str(), Response::new(200, "booked"));

        for body in ["slot=1", "slot=2"] {
            let request = Request::get(target.clone())
                .with_method("POST")
                .with_body(body.as_bytes().to_vec());
            let outcome = sw.handle_fetch(request).await.unwrap();
            assert_eq!(outcome.source(), "network");
        }
        sw.settle().await;

        assert_eq!(sw.fetcher.calls(), 2);
        assert!(sw.store().partitions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn offline_post_ignores_queued_entry() {
        let sw = worker(&[]);
        let booking = Request::get(url("/api/appointments"))
            .with_method("POST")
            .with_body(&b"slot=1"[..]);
        sw.store()
            .put("drcare-api-v1", &booking, &Response::new(200, "queued"))
            .await
            .unwrap();

        let outcome = sw.handle_fetch(booking).await.unwrap();

        assert_eq!(sw.fetcher.calls(), 1);
        assert_eq!(outcome.into_response().unwrap().status, 503);
    }

    #[tokio::test]
    async fn offline_other_request_propagates_error() {
        let sw = worker(&[]);
        let err = sw.handle_fetch(Request::get(url("/static/app.js"))).await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }

    #[tokio::test]
    async fn sync_replays_and_dequeues() {
        let sw = worker(&[]);
        let ok = Request::get(url("/api/book")).with_method("POST");
        let failing = Request::get(url("/api/cancel")).with_method("POST");
        for req in [&ok, &failing] {
            sw.store().put("drcare-api-v1", req, &Response::new(200, "")).await.unwrap();
        }
        sw.fetcher.respond(ok.url.as_str(), Response::new(200, "booked"));

        let report = sw.sync("background-sync-appointments").await.unwrap().unwrap();

        assert_eq!(report, SyncReport { replayed: 1, failed: 1 });
        assert_eq!(sw.store().requests("drcare-api-v1").await.unwrap(), vec![failing]);
    }

    #[tokio::test]
    async fn sync_ignores_other_tags() {
        let sw = worker(&[]);
        sw.store()
            .put("drcare-api-v1", &Request::get(url("/api/x")), &Response::new(200, ""))
            .await
            .unwrap();

        assert_eq!(sw.sync("something-else").await.unwrap(), None);
        assert_eq!(sw.fetcher.calls(), 0);
        assert_eq!(sw.store().len("drcare-api-v1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn events_dispatch_to_handlers() {
        let sw = worker(&["/"]);
        sw.fetcher.respond("http://localhost:5000/", Response::new(200, "home"));

        assert_eq!(sw.handle_event(Event::Install).await.unwrap(), EventOutcome::Installed(1));
        assert_eq!(sw.handle_event(Event::Activate).await.unwrap(), EventOutcome::Activated(vec![]));
        let fetched = sw.handle_event(Event::Fetch(Request::navigate(url("/")))).await.unwrap();
        assert!(matches!(fetched, EventOutcome::Fetched(FetchOutcome::Cache(_))));
        let synced = sw.handle_event(Event::Sync("other".to_string())).await.unwrap();
        assert_eq!(synced, EventOutcome::Synced(None));
    }
}
