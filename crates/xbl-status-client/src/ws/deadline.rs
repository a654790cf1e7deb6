// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Single deadline shared by every step of one fetch.
//!
//! Connect, receive and close all wait on the same token, so time spent in
//! a slow handshake is no longer available for receiving.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use super::FetchError;

/// Stand-in expiry for timeouts too large to add to the current instant.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Cloneable view of a [`Deadline`], handed to the receiver task.
#[derive(Debug, Clone)]
pub(crate) struct DeadlineToken {
    token: CancellationToken,
    expires_at: Instant,
}

impl DeadlineToken {
    /// Resolves when the deadline elapses or the caller cancels.
    pub(crate) fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    pub(crate) fn has_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// Classify a cancellation observed while receiving.
    pub(crate) fn receive_error(&self) -> FetchError {
        if self.has_expired() {
            FetchError::Timeout
        } else {
            FetchError::Cancelled
        }
    }
}

/// Deadline armed once per fetch.
///
/// Dropping it cancels the token, so a fetch that is itself dropped still
/// releases its receiver task and socket.
#[derive(Debug)]
pub(crate) struct Deadline {
    handle: DeadlineToken,
    timer: JoinHandle<()>,
}

impl Deadline {
    /// Arm a deadline `timeout` from now, also cancelled with `parent`.
    pub(crate) fn arm(timeout: Duration, parent: &CancellationToken) -> Self {
        let token = parent.child_token();
        let now = Instant::now();
        let expires_at = now
            .checked_add(timeout)
            .unwrap_or_else(|| now + FAR_FUTURE);

        let timer_token = token.clone();
        let timer = tokio::spawn(async move {
            tokio::select! {
                () = sleep_until(expires_at) => timer_token.cancel(),
                () = timer_token.cancelled() => {}
            }
        });

        Self {
            handle: DeadlineToken { token, expires_at },
            timer,
        }
    }

    pub(crate) fn token(&self) -> &DeadlineToken {
        &self.handle
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        self.handle.token.cancel();
        self.timer.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deadline_expires() {
        let deadline = Deadline::arm(Duration::from_millis(20), &CancellationToken::new());
        assert!(!deadline.token().has_expired());

        deadline.token().cancelled().await;
        assert!(deadline.token().has_expired());
        assert_eq!(deadline.token().receive_error(), FetchError::Timeout);
    }

    #[tokio::test]
    async fn test_parent_cancel_is_not_timeout() {
        let parent = CancellationToken::new();
        let deadline = Deadline::arm(Duration::from_secs(30), &parent);

        parent.cancel();
        deadline.token().cancelled().await;
        assert!(!deadline.token().has_expired());
        assert_eq!(deadline.token().receive_error(), FetchError::Cancelled);
    }

    #[tokio::test]
    async fn test_unbounded_timeout_does_not_overflow() {
        let deadline = Deadline::arm(Duration::MAX, &CancellationToken::new());
        assert!(!deadline.token().has_expired());
        assert!(!deadline.token().token.is_cancelled());
    }

    #[tokio::test]
    async fn test_drop_cancels_token() {
        let deadline = Deadline::arm(Duration::from_secs(30), &CancellationToken::new());
        let token = deadline.token().clone();

        drop(deadline);
        assert!(token.token.is_cancelled());
        assert!(!token.has_expired());
    }

    #[tokio::test]
    async fn test_deadline_does_not_cancel_parent() {
        let parent = CancellationToken::new();
        let deadline = Deadline::arm(Duration::from_millis(1), &parent);

        deadline.token().cancelled().await;
        assert!(!parent.is_cancelled());
    }
}
