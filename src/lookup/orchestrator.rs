//! Lookup orchestration.
//!
//! Pipeline:   classify → resolve → enrich → assemble (fail-fast)
//! Controller: Idle → Loading → {Success, Failed}, re-entering Loading on
//! every search. Each search takes a sequence number; a result is only
//! committed while its number is still the latest one issued.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::enricher::CountryEnricher;
use super::providers::HttpServices;
use super::query::classify;
use super::resolver::GeolocationResolver;
use super::types::{LookupError, SearchQuery};
use super::view::{assemble, ViewModel};
use crate::config::Config;

// ─── Pipeline ───────────────────────────────────────────────────

pub struct LookupPipeline {
    resolver: GeolocationResolver,
    enricher: CountryEnricher,
}

impl LookupPipeline {
    pub fn new(resolver: GeolocationResolver, enricher: CountryEnricher) -> Self {
        Self { resolver, enricher }
    }

    /// Wire the pipeline to the real HTTP services.
    pub fn from_config(config: &Config) -> Self {
        let services = HttpServices::from_config(config);
        Self::new(
            GeolocationResolver::new(Arc::new(services.geolocation), Arc::new(services.places)),
            CountryEnricher::new(Arc::new(services.countries)),
        )
    }

    /// Run one search from raw input. Blocks on network I/O.
    pub fn run(&self, raw: &str) -> Result<ViewModel, LookupError> {
        self.run_query(&classify(raw))
    }

    pub fn run_query(&self, query: &SearchQuery) -> Result<ViewModel, LookupError> {
        let geo = self.resolver.resolve(query)?;
        debug!(ip = %geo.ip, country = %geo.country_code, "location resolved");
        let country = self.enricher.enrich(&geo.country_code)?;
        Ok(assemble(geo, country))
    }
}

// ─── Controller ─────────────────────────────────────────────────

/// What the view layer renders.
#[derive(Debug, Clone)]
pub enum SearchState {
    Idle,
    Loading { seq: u64, query: SearchQuery },
    Success { seq: u64, view: Arc<ViewModel> },
    Failed { seq: u64, error: LookupError },
}

impl SearchState {
    pub fn seq(&self) -> Option<u64> {
        match self {
            Self::Idle => None,
            Self::Loading { seq, .. } | Self::Success { seq, .. } | Self::Failed { seq, .. } => Some(*seq),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }
}

/// Outcome of a finished pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    Committed,
    /// A newer search started first; the result was dropped.
    Superseded,
}

struct Shared {
    pipeline: LookupPipeline,
    latest: AtomicU64,
    state: watch::Sender<SearchState>,
}

impl Shared {
    /// Write `next` only if `seq` is still the newest search. The check
    /// runs under the channel's lock, so it cannot interleave with a
    /// newer search's write.
    fn publish(&self, seq: u64, next: SearchState) -> bool {
        self.state.send_if_modified(|state| {
            if self.latest.load(Ordering::SeqCst) != seq {
                return false;
            }
            *state = next;
            true
        })
    }
}

/// Owns the search state machine. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SearchController {
    shared: Arc<Shared>,
}

impl SearchController {
    /// A controller in `Idle`, waiting for its first search.
    pub fn new(pipeline: LookupPipeline) -> Self {
        let (state, _) = watch::channel(SearchState::Idle);
        Self {
            shared: Arc::new(Shared {
                pipeline,
                latest: AtomicU64::new(0),
                state,
            }),
        }
    }

    /// A controller that immediately looks up the caller's own address.
    /// Must be called inside a tokio runtime.
    pub fn launch(pipeline: LookupPipeline) -> (Self, JoinHandle<Commit>) {
        let controller = Self::new(pipeline);
        let initial = controller.search("");
        (controller, initial)
    }

    /// Read-only view of state changes.
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.shared.state.subscribe()
    }

    pub fn snapshot(&self) -> SearchState {
        self.shared.state.borrow().clone()
    }

    /// Start a search, superseding any earlier one. Must be called inside
    /// a tokio runtime.
    pub fn search(&self, raw: &str) -> JoinHandle<Commit> {
        let query = classify(raw);
        let seq = self.shared.latest.fetch_add(1, Ordering::SeqCst) + 1;
        info!(seq, query = %query, "search started");
        self.shared.publish(seq, SearchState::Loading { seq, query: query.clone() });

        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            let worker = Arc::clone(&shared);
            let outcome = tokio::task::spawn_blocking(move || worker.pipeline.run_query(&query))
                .await
                .unwrap_or_else(|e| Err(LookupError::NetworkFailure(format!("lookup task failed: {}", e))));

            let next = match outcome {
                Ok(view) => SearchState::Success { seq, view: Arc::new(view) },
                Err(error) => {
                    warn!(seq, kind = error.kind(), error = %error, "search failed");
                    SearchState::Failed { seq, error }
                }
            };

            if shared.publish(seq, next) {
                info!(seq, "search committed");
                Commit::Committed
            } else {
                debug!(seq, latest = shared.latest.load(Ordering::SeqCst), "stale search result dropped");
                Commit::Superseded
            }
        })
    }
}
