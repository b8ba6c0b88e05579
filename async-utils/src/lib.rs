//! Cancellation helpers for request/response flows where only the newest
//! request matters.
//!
//! - [`OrCancelExt`] races a future against a [`CancellationToken`].
//! - [`LatestRequest`] hands out one token per request and cancels the
//!   previous token whenever a newer request begins.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Mutex;
use std::sync::PoisonError;
pub use tokio_util::sync::CancellationToken;

/// The future lost the race against its cancellation token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Superseded;

impl std::fmt::Display for Superseded {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("request superseded by a newer one")
    }
}

impl std::error::Error for Superseded {}

/// Extension trait for making futures cancellable.
#[async_trait]
pub trait OrCancelExt: Sized {
    type Output;

    /// Resolve to `Ok(output)` if the future finishes first, or
    /// `Err(Superseded)` once `token` is cancelled.
    async fn or_cancel(self, token: &CancellationToken) -> Result<Self::Output, Superseded>;
}

#[async_trait]
impl<F> OrCancelExt for F
where
    F: Future + Send,
    F::Output: Send,
{
    type Output = F::Output;

    async fn or_cancel(self, token: &CancellationToken) -> Result<Self::Output, Superseded> {
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(Superseded),
            res = self => Ok(res),
        }
    }
}

/// Issues a fresh token per request and cancels the one before it.
#[derive(Debug, Default)]
pub struct LatestRequest {
    current: Mutex<CancellationToken>,
}

impl LatestRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request: cancel the in-flight one and return the token
    /// guarding the new one.
    pub fn begin(&self) -> CancellationToken {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        current.cancel();
        *current = CancellationToken::new();
        current.clone()
    }
}
