// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Externally triggered cancellation of in-flight requests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

// =============================================================================
// CancellationToken
// =============================================================================

/// A cloneable handle that releases waiting operations when cancelled.
///
/// Operations issued with a token race their response against
/// [`cancelled`](Self::cancelled) and return
/// [`ProxyError::Cancelled`](crate::error::ProxyError::Cancelled) if the token
/// fires first. Cancellation is sticky: once cancelled, a token stays
/// cancelled and every later wait returns immediately.
///
/// # Example
///
/// ```ignore
/// let token = CancellationToken::new();
/// let pending = method.invoke_with(vec![], &token);
/// token.cancel();
/// assert_eq!(pending.await.unwrap_err().kind(), ErrorKind::Cancelled);
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    sender: broadcast::Sender<()>,
    cancelled: AtomicBool,
}

impl CancellationToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self {
            inner: Arc::new(Inner {
                sender,
                cancelled: AtomicBool::new(false),
            }),
        }
    }

    /// Cancels the token, waking every waiter. Later calls do nothing.
    pub fn cancel(&self) {
        if self
            .inner
            .cancelled
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let _ = self.inner.sender.send(());
        }
    }

    /// Returns `true` once the token has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves when the token is cancelled.
    pub async fn cancelled(&self) {
        // Subscribe before checking the flag so a concurrent cancel is not lost.
        let mut receiver = self.inner.sender.subscribe();
        if self.is_cancelled() {
            return;
        }
        let _ = receiver.recv().await;
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_cancel_wakes_waiter() {
        let token = CancellationToken::new();
        let waiter = {
            let token = token.clone();
            tokio::spawn(async move { token.cancelled().await })
        };
        tokio::task::yield_now().await;
        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter released")
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancel_is_sticky() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
        tokio::time::timeout(Duration::from_millis(100), token.cancelled())
            .await
            .expect("already cancelled resolves immediately");
    }
}
