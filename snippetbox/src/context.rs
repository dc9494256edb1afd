//! Request-scoped cancellation and deadlines for store operations

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::errors::ModelError;

/// Cancellation signal and optional deadline carried from the caller's request.
///
/// Cloning shares the same token, so cancelling any clone cancels them all.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the caller's own token, e.g. one tied to the client connection
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// A context cancelled together with this one but not the other way round
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True once the token fired or the deadline passed
    pub fn is_done(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|at| Instant::now() >= at)
    }

    /// Drives `fut` unless the context is cancelled or times out first.
    ///
    /// The losing future is dropped, which returns any pooled connection it held.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, ModelError>
    where
        F: Future<Output = Result<T, ModelError>>,
    {
        if self.is_done() {
            return Err(ModelError::Cancelled);
        }

        let deadline = async {
            match self.deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                tracing::debug!("Request cancelled before completion");
                Err(ModelError::Cancelled)
            }
            _ = deadline => {
                tracing::debug!("Request deadline exceeded");
                Err(ModelError::Cancelled)
            }
            result = fut => result,
        }
    }
}
