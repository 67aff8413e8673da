//! Session Notifier
//!
//! Callback invoked when the client determines the session is unrecoverable.
//! The surrounding application uses it to clear session state and route the
//! user back to sign-in. Invoked exactly once per failed-refresh episode.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Session invalidation callback interface.
pub trait SessionNotifier: Send + Sync {
    /// The session can no longer be restored; the user must sign in again.
    fn session_invalidated(&self);
}

impl<F> SessionNotifier for F
where
    F: Fn() + Send + Sync,
{
    fn session_invalidated(&self) {
        self()
    }
}

/// No-op notifier.
pub struct NoOpSessionNotifier;

impl SessionNotifier for NoOpSessionNotifier {
    fn session_invalidated(&self) {}
}

/// Counting notifier for testing.
#[derive(Default)]
pub struct CountingSessionNotifier {
    invocations: AtomicUsize,
}

impl CountingSessionNotifier {
    /// Create new counting notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times the session was invalidated.
    pub fn count(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

impl SessionNotifier for CountingSessionNotifier {
    fn session_invalidated(&self) {
        self.invocations.fetch_add(1, Ordering::SeqCst);
    }
}
