//! The cancellation registry.
//!
//! One cancellation token per in-flight request id. Registration happens
//! before the handler task starts; removal happens when the handler
//! finishes or when a `$/cancelRequest` arrives, whichever comes first.
//! Removal is idempotent: double-cancel and double-complete are no-ops.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio_util::sync::CancellationToken;

use crate::protocol::RequestId;

/// Tracks the cancellation handle of every in-flight request.
#[derive(Debug, Default)]
pub struct CancelRegistry {
    inner: Mutex<FxHashMap<RequestId, CancellationToken>>,
}

impl CancelRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh token for `id` and returns it. A lingering entry
    /// under the same id (a client reusing ids) is replaced.
    pub fn register(&self, id: RequestId) -> CancellationToken {
        let token = CancellationToken::new();
        self.inner.lock().insert(id, token.clone());
        token
    }

    /// Cancels the request with this id and removes its entry. Unknown
    /// ids (already completed or never seen) are a silent no-op.
    pub fn cancel(&self, id: &RequestId) {
        if let Some(token) = self.inner.lock().remove(id) {
            token.cancel();
        }
    }

    /// Removes the entry for a finished request. Idempotent.
    pub fn complete(&self, id: &RequestId) {
        self.inner.lock().remove(id);
    }

    /// The number of in-flight requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// True when no request is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: i64) -> RequestId {
        RequestId::Number(n)
    }

    #[test]
    fn cancel_fires_the_registered_token() {
        let registry = CancelRegistry::new();
        let token = registry.register(id(1));
        assert!(!token.is_cancelled());

        registry.cancel(&id(1));
        assert!(token.is_cancelled());
        assert!(registry.is_empty());
    }

    #[test]
    fn cancel_of_unknown_or_completed_id_is_a_no_op() {
        let registry = CancelRegistry::new();
        registry.cancel(&id(42));

        let token = registry.register(id(7));
        registry.complete(&id(7));
        registry.cancel(&id(7));
        assert!(!token.is_cancelled(), "completed request must not be cancelled");
    }

    #[test]
    fn complete_is_idempotent() {
        let registry = CancelRegistry::new();
        registry.register(id(1));
        registry.complete(&id(1));
        registry.complete(&id(1));
        assert!(registry.is_empty());
    }

    #[test]
    fn concurrent_requests_track_independently() {
        let registry = CancelRegistry::new();
        let first = registry.register(id(1));
        let second = registry.register(id(2));
        assert_eq!(registry.len(), 2);

        registry.cancel(&id(1));
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert_eq!(registry.len(), 1);
    }
}
