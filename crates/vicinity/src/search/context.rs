use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use super::{Result, SearchError};

/// Cancellation and deadline carried through a single search.
///
/// Checked before and after every storage round trip, so a cancelled search
/// stops widening its radius at the next step.
#[derive(Debug, Clone, Default)]
pub struct SearchContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl SearchContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tie the search to an externally owned token.
    #[must_use]
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn check(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(SearchError::Cancelled);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(SearchError::DeadlineExceeded);
        }
        Ok(())
    }
}
