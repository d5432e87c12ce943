//! Server state.
//!
//! One [`ServerState`] is constructed at startup and shared by reference
//! between the read loop and every spawned handler task. Documents are
//! replaced wholesale on change; derived declaration views are recomputed
//! from a text snapshot inside each handler, never cached here.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use seltab_scrape::{Fetcher, SelectorStore};

use crate::cancel::CancelRegistry;
use crate::config::SeltabConfig;

/// An open document.
#[derive(Debug, Clone)]
pub struct Document {
    /// The document URI.
    pub uri: String,
    /// The full document text.
    pub text: String,
    /// Monotonic revision, bumped on every open/change/save. Used to drop
    /// diagnostics computed against superseded text.
    pub revision: u64,
}

/// Shared server state.
pub struct ServerState {
    documents: RwLock<FxHashMap<String, Document>>,
    revision_counter: AtomicU64,
    store: SelectorStore,
    fetcher: Box<dyn Fetcher>,
    config: SeltabConfig,
    cancels: CancelRegistry,
    shutdown: AtomicBool,
}

impl ServerState {
    /// Creates the state.
    #[must_use]
    pub fn new(store: SelectorStore, fetcher: Box<dyn Fetcher>, config: SeltabConfig) -> Self {
        Self {
            documents: RwLock::new(FxHashMap::default()),
            revision_counter: AtomicU64::new(1),
            store,
            fetcher,
            config,
            cancels: CancelRegistry::new(),
            shutdown: AtomicBool::new(false),
        }
    }

    /// Inserts or replaces a document and returns its new revision.
    pub fn set_document(&self, uri: &str, text: String) -> u64 {
        let revision = self.revision_counter.fetch_add(1, Ordering::Relaxed);
        self.documents.write().insert(
            uri.to_string(),
            Document {
                uri: uri.to_string(),
                text,
                revision,
            },
        );
        revision
    }

    /// Removes a document.
    pub fn remove_document(&self, uri: &str) {
        self.documents.write().remove(uri);
    }

    /// Returns a snapshot of the document.
    #[must_use]
    pub fn document(&self, uri: &str) -> Option<Document> {
        self.documents.read().get(uri).cloned()
    }

    /// Returns the document's current revision, if it is open.
    #[must_use]
    pub fn document_revision(&self, uri: &str) -> Option<u64> {
        self.documents.read().get(uri).map(|doc| doc.revision)
    }

    /// The selector cache.
    #[must_use]
    pub fn store(&self) -> &SelectorStore {
        &self.store
    }

    /// The page fetcher.
    #[must_use]
    pub fn fetcher(&self) -> &dyn Fetcher {
        self.fetcher.as_ref()
    }

    /// The loaded configuration.
    #[must_use]
    pub fn config(&self) -> &SeltabConfig {
        &self.config
    }

    /// The cancellation registry.
    #[must_use]
    pub fn cancels(&self) -> &CancelRegistry {
        &self.cancels
    }

    /// Flags that `shutdown` was received.
    pub fn set_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// True once `shutdown` was received.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Resolves the effective ignore-list for a declaration: its own list
    /// when present, the configured one otherwise.
    #[must_use]
    pub fn effective_ignores(&self, declared: &[String]) -> Vec<String> {
        if declared.is_empty() {
            self.config.ignore_elements.clone()
        } else {
            declared.to_vec()
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;
    use seltab_scrape::FetchError;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    /// A fetcher answering every URL with one canned page, counting calls.
    pub struct CannedFetcher {
        body: String,
        pub calls: Arc<AtomicUsize>,
    }

    impl CannedFetcher {
        pub fn new(body: &str) -> Self {
            Self {
                body: body.to_string(),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl Fetcher for CannedFetcher {
        async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.body.clone())
        }
    }

    /// Builds a state over a temp-dir cache and a canned page.
    pub async fn canned_state(dir: &tempfile::TempDir, page: &str) -> Arc<ServerState> {
        let (state, _calls) = canned_state_with_calls(dir, page).await;
        state
    }

    /// Like [`canned_state`], also exposing the fetch-call counter.
    pub async fn canned_state_with_calls(
        dir: &tempfile::TempDir,
        page: &str,
    ) -> (Arc<ServerState>, Arc<AtomicUsize>) {
        let store = SelectorStore::open(&dir.path().join("selectors.sqlite"))
            .await
            .expect("open store");
        let fetcher = CannedFetcher::new(page);
        let calls = Arc::clone(&fetcher.calls);
        let state = Arc::new(ServerState::new(
            store,
            Box::new(fetcher),
            SeltabConfig {
                cache_path: dir.path().join("selectors.sqlite"),
                ..SeltabConfig::default()
            },
        ));
        (state, calls)
    }
}
