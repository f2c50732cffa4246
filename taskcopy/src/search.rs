//! Incremental project search backing the autocomplete prompts.
//!
//! Every keystroke is [`submit`](IncrementalSearch::submit)ted as a new
//! query; [`latest`](IncrementalSearch::latest) resolves with the options
//! for the most recent one only.
//!
//! # Cancellation
//!
//! Each submission takes a ticket from a monotonic generation counter.
//! A non-empty query waits out the settle delay first and is dropped
//! without a network call if a newer submission arrived meanwhile. A search
//! that is already in flight is allowed to finish, but its result is
//! published with its ticket and `latest()` only accepts the ticket that
//! matches the current generation, so stale results are never observed.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use taskcopy_proto::form::{FormValue, Params};
use taskcopy_proto::records::{Phid, Project, SearchPage};
use tokio::sync::watch;

use crate::conduit::{ConduitClient, ConduitError, PROJECT_SEARCH};
use crate::transport::Transport;

/// Default quiet period before a query hits the network.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(200);

/// A selectable search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOption {
    /// Label shown in the picker.
    pub display_name: String,
    /// PHID used for every later API call.
    pub id: Phid,
}

impl From<Project> for SearchOption {
    fn from(project: Project) -> Self {
        Self {
            display_name: project.display_name(),
            id: project.phid,
        }
    }
}

/// Something that can look up projects by free text.
pub trait ProjectSearch: Send + Sync + 'static {
    /// Projects matching `query`, best match first.
    fn search_projects(
        &self,
        query: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Project>, ConduitError>> + Send;
}

impl<T: Transport + 'static> ProjectSearch for ConduitClient<T> {
    async fn search_projects(&self, query: &str) -> Result<Vec<Project>, ConduitError> {
        let params = Params::new()
            .with("constraints", FormValue::map([("query", query)]))
            .with("order", "relevance");
        let page: SearchPage<Project> = self.call(PROJECT_SEARCH, &params).await?;
        Ok(page.data)
    }
}

type SearchResult = Result<Vec<SearchOption>, ConduitError>;

struct Delivery {
    ticket: u64,
    result: SearchResult,
}

/// Debounced, switch-to-latest search stream.
///
/// Share one instance between prompts that run one after another, or make
/// a fresh one per prompt; results never leak between submissions either
/// way. Requires a tokio runtime.
pub struct IncrementalSearch<S> {
    source: Arc<S>,
    settle_delay: Duration,
    generation: Arc<AtomicU64>,
    results: Arc<watch::Sender<Option<Delivery>>>,
}

impl<S: ProjectSearch> IncrementalSearch<S> {
    /// Creates a search stream over `source`.
    pub fn new(source: Arc<S>, settle_delay: Duration) -> Self {
        let (results, _) = watch::channel(None);
        Self {
            source,
            settle_delay,
            generation: Arc::new(AtomicU64::new(0)),
            results: Arc::new(results),
        }
    }

    /// Ticket of the newest submission (0 before the first one).
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Makes `query` the newest input. Returns immediately.
    pub fn submit(&self, query: &str) {
        if query.trim().is_empty() {
            self.results.send_modify(|slot| {
                let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                tracing::trace!(ticket, "blank query, no search");
                *slot = Some(Delivery {
                    ticket,
                    result: Ok(Vec::new()),
                });
            });
            return;
        }

        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let source = Arc::clone(&self.source);
        let generation = Arc::clone(&self.generation);
        let results = Arc::clone(&self.results);
        let settle_delay = self.settle_delay;
        let query = query.to_string();

        tokio::spawn(async move {
            tokio::time::sleep(settle_delay).await;
            if generation.load(Ordering::SeqCst) != ticket {
                tracing::trace!(ticket, "query superseded while settling");
                return;
            }

            tracing::debug!(ticket, %query, "searching projects");
            let result = source.search_projects(&query).await.map(|projects| {
                projects
                    .into_iter()
                    .filter(|p| !p.phid.as_str().is_empty())
                    .map(SearchOption::from)
                    .collect()
            });

            // Checked under the channel lock so a newer blank submission
            // cannot be overwritten.
            let published = results.send_if_modified(|slot| {
                if generation.load(Ordering::SeqCst) != ticket {
                    return false;
                }
                *slot = Some(Delivery { ticket, result });
                true
            });
            if !published {
                tracing::debug!(ticket, %query, "discarding stale search result");
            }
        });
    }

    /// Options for the newest submission.
    ///
    /// Waits until the result for the current generation is published. If
    /// another query is submitted while waiting, waits for that one
    /// instead.
    ///
    /// # Errors
    ///
    /// Returns the [`ConduitError`] of the newest search if it failed.
    pub async fn latest(&self) -> SearchResult {
        let mut rx = self.results.subscribe();
        loop {
            {
                let wanted = self.generation.load(Ordering::SeqCst);
                let current = rx.borrow_and_update();
                if let Some(delivery) = current.as_ref()
                    && delivery.ticket == wanted
                {
                    return delivery.result.clone();
                }
            }
            if rx.changed().await.is_err() {
                return Ok(Vec::new());
            }
        }
    }
}
