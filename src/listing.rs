use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

use crate::classify::Accept;
use crate::models::{FileRecord, ListQuery, ListResponse};
use crate::query;
use crate::transport::{Transport, TransportError};

pub const DEFAULT_ENDPOINT: &str = "/files";

#[derive(Debug, Error)]
pub enum ListingError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Invalid listing response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid listing query: {0}")]
    Encode(#[from] serde_qs::Error),
}

/// Snapshot of the loaded page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingState {
    /// Records in server order.
    pub files: Vec<FileRecord>,
    /// Pagination total declared by the server; may exceed `files.len()`.
    pub total: u64,
    pub loading: bool,
    /// Message of the last failed fetch. A failed fetch also empties `files`,
    /// so this is the only way to tell failure from an empty collection.
    pub error: Option<String>,
}

/// Which completion wins when several loads overlap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseOrdering {
    /// Every completion is applied; the last one to finish wins.
    #[default]
    LastCompleted,
    /// Only the most recently issued load is applied; older completions are
    /// discarded.
    LatestIssued,
}

struct Page {
    files: Vec<FileRecord>,
    total: u64,
}

/// Read path: fetches a page of file records and serves filtered views of it.
pub struct FileListing {
    transport: Arc<dyn Transport>,
    endpoint: String,
    ordering: ResponseOrdering,
    state: watch::Sender<ListingState>,
    last_query: watch::Sender<ListQuery>,
    issued: AtomicU64,
}

/// Clears `loading` when a load finishes, fails, or is dropped mid-flight.
struct LoadingGuard<'a> {
    listing: &'a FileListing,
    ticket: u64,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.listing.is_current(self.ticket) {
            self.listing.state.send_modify(|s| s.loading = false);
        }
    }
}

impl FileListing {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            ordering: ResponseOrdering::default(),
            state: watch::channel(ListingState::default()).0,
            last_query: watch::channel(ListQuery::default()).0,
            issued: AtomicU64::new(0),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_ordering(mut self, ordering: ResponseOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Fetch a page and replace the snapshot with it.
    ///
    /// Failures never reach the caller: the snapshot is emptied, `error` is
    /// set, and the failure is logged.
    pub async fn load_files(&self, query: ListQuery) {
        let ticket = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        self.last_query.send_replace(query.clone());
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });
        let _guard = LoadingGuard {
            listing: self,
            ticket,
        };

        let result = self.fetch(&query).await;

        if !self.is_current(ticket) {
            tracing::debug!(ticket, "Discarding stale listing response");
            return;
        }

        match result {
            Ok(page) => {
                tracing::debug!(
                    count = page.files.len(),
                    total = page.total,
                    "Loaded files"
                );
                self.state.send_modify(|s| {
                    s.files = page.files;
                    s.total = page.total;
                });
            }
            Err(e) => {
                tracing::error!(error = %e, ?query, "Failed to load files");
                self.state.send_modify(|s| {
                    s.files.clear();
                    s.total = 0;
                    s.error = Some(e.to_string());
                });
            }
        }
    }

    /// Re-issue the most recent query (the default query if none was made).
    pub async fn reload(&self) {
        let query = self.last_query.borrow().clone();
        self.load_files(query).await;
    }

    async fn fetch(&self, query: &ListQuery) -> Result<Page, ListingError> {
        let encoded = serde_qs::to_string(query)?;
        let body = self.transport.get(&self.endpoint, &encoded).await?;
        let response: ListResponse = serde_json::from_slice(&body)?;

        Ok(Page {
            files: response.files.unwrap_or_default(),
            total: response
                .pagination
                .and_then(|p| p.total)
                .unwrap_or_default(),
        })
    }

    fn is_current(&self, ticket: u64) -> bool {
        match self.ordering {
            ResponseOrdering::LastCompleted => true,
            ResponseOrdering::LatestIssued => self.issued.load(Ordering::SeqCst) == ticket,
        }
    }

    // ========================================================================
    // Snapshot access
    // ========================================================================

    pub fn state(&self) -> ListingState {
        self.state.borrow().clone()
    }

    pub fn files(&self) -> Vec<FileRecord> {
        self.state.borrow().files.clone()
    }

    pub fn total(&self) -> u64 {
        self.state.borrow().total
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn last_query(&self) -> ListQuery {
        self.last_query.borrow().clone()
    }

    /// Receiver that observes every snapshot change, for recomputing views.
    pub fn subscribe(&self) -> watch::Receiver<ListingState> {
        self.state.subscribe()
    }

    // ========================================================================
    // Views (recomputed from the current snapshot on every call)
    // ========================================================================

    pub fn filter_by_category(&self, category: &str) -> Vec<FileRecord> {
        let state = self.state.borrow();
        query::filter_by_category(&state.files, category)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn filter_by_type(&self, accept: &Accept) -> Vec<FileRecord> {
        let state = self.state.borrow();
        query::filter_by_type(&state.files, accept)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn search_files(&self, keyword: &str) -> Vec<FileRecord> {
        let state = self.state.borrow();
        query::search_files(&state.files, keyword)
            .into_iter()
            .cloned()
            .collect()
    }
}
