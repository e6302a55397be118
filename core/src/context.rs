//! Cancellation and deadlines for a round trip.
//!
//! A `Context` is cheap to clone. Deriving a context keeps every parent's
//! cancellation signal, so canceling a parent cancels all its children. A
//! derived deadline never extends the parent's.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::TransportError;

#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    signals: Vec<Arc<AtomicBool>>,
}

/// Cancels the context returned alongside it by [`Context::with_cancel`].
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl Context {
    /// A context that never ends.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        };
        Self {
            deadline: Some(deadline),
            signals: self.signals.clone(),
        }
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let flag = Arc::new(AtomicBool::new(false));
        let mut signals = self.signals.clone();
        signals.push(Arc::clone(&flag));
        (
            Self {
                deadline: self.deadline,
                signals,
            },
            CancelHandle(flag),
        )
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline, zero once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_canceled(&self) -> bool {
        self.signals.iter().any(|flag| flag.load(Ordering::SeqCst))
    }

    pub fn is_expired(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    pub fn is_done(&self) -> bool {
        self.is_canceled() || self.is_expired()
    }

    /// `Err` with the reason once the context has ended. Cancellation wins
    /// over an expired deadline.
    pub fn check(&self) -> Result<(), TransportError> {
        if self.is_canceled() {
            return Err(TransportError::Canceled);
        }
        if self.is_expired() {
            return Err(TransportError::DeadlineExceeded);
        }
        Ok(())
    }
}
