//! Cancellation tokens and pending-call handles.
//!
//! Every outstanding request is represented by a [`Call`]: a oneshot
//! receiver for the completion plus the [`CancellationToken`] that owns the
//! background task. The caller observes the completion on whatever task
//! awaits or polls the `Call`, so results always land on the caller's own
//! execution context.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::Poll;

use tokio::sync::oneshot;
use tokio::task::AbortHandle;

struct TokenState {
  cancelled: AtomicBool,
  /// Underlying transport task, dropped once the call completes
  task: Mutex<Option<AbortHandle>>,
}

/// Handle representing one in-flight unit of work.
///
/// The flag moves from `false` to `true` exactly once. Cancelling aborts the
/// owned task (if it is still attached) and any further `cancel()` is a no-op.
#[derive(Clone)]
pub struct CancellationToken {
  state: Arc<TokenState>,
}

impl CancellationToken {
  pub fn new() -> Self {
    Self {
      state: Arc::new(TokenState {
        cancelled: AtomicBool::new(false),
        task: Mutex::new(None),
      }),
    }
  }

  /// Cancel the token.
  ///
  /// Returns `true` if this call performed the transition, `false` if the
  /// token had already been cancelled.
  pub fn cancel(&self) -> bool {
    if self.state.cancelled.swap(true, Ordering::SeqCst) {
      return false;
    }

    if let Some(handle) = self.task().take() {
      handle.abort();
    }
    true
  }

  pub fn is_cancelled(&self) -> bool {
    self.state.cancelled.load(Ordering::SeqCst)
  }

  /// Attach the task doing the work. A token that is already cancelled
  /// aborts the task immediately.
  pub(crate) fn attach(&self, handle: AbortHandle) {
    let mut task = self.task();
    if self.is_cancelled() {
      handle.abort();
    } else {
      *task = Some(handle);
    }
  }

  /// Drop the task reference once the work has finished.
  pub(crate) fn release(&self) {
    self.task().take();
  }

  fn task(&self) -> MutexGuard<'_, Option<AbortHandle>> {
    self
      .state
      .task
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}

impl Default for CancellationToken {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for CancellationToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CancellationToken")
      .field("cancelled", &self.is_cancelled())
      .finish_non_exhaustive()
  }
}

/// A pending completion.
///
/// Resolves to `Some(value)` when the work finished and the token was not
/// cancelled, `None` otherwise. A cancelled call never yields its value,
/// even if the background task had already produced it.
pub struct Call<T> {
  token: CancellationToken,
  rx: oneshot::Receiver<T>,
}

impl<T: Send + 'static> Call<T> {
  /// Run `future` on the tokio runtime under a fresh token.
  pub(crate) fn spawn<F>(future: F) -> Self
  where
    F: Future<Output = T> + Send + 'static,
  {
    let token = CancellationToken::new();
    let (tx, rx) = oneshot::channel();

    let guard = token.clone();
    let handle = tokio::spawn(async move {
      let value = future.await;
      if !guard.is_cancelled() {
        // Receiver may have been dropped
        let _ = tx.send(value);
      }
      guard.release();
    });
    token.attach(handle.abort_handle());

    Self { token, rx }
  }

  /// Transform the completion value, keeping the same token.
  pub fn map<U, F>(self, f: F) -> Call<U>
  where
    U: Send + 'static,
    F: FnOnce(T) -> U + Send + 'static,
  {
    let Call { token, rx } = self;
    let (tx, out) = oneshot::channel();

    let guard = token.clone();
    tokio::spawn(async move {
      if let Ok(value) = rx.await {
        if !guard.is_cancelled() {
          let _ = tx.send(f(value));
        }
      }
    });

    Call { token, rx: out }
  }
}

impl<T> Call<T> {
  pub fn token(&self) -> &CancellationToken {
    &self.token
  }

  pub fn cancel(&self) -> bool {
    self.token.cancel()
  }

  pub fn is_cancelled(&self) -> bool {
    self.token.is_cancelled()
  }

  /// Wait for the completion.
  pub async fn outcome(self) -> Option<T> {
    let Call { token, rx } = self;
    let value = rx.await.ok()?;
    if token.is_cancelled() {
      return None;
    }
    Some(value)
  }

  /// Poll for the completion without blocking.
  ///
  /// Returns `Poll::Pending` while the work is running. After a value has
  /// been returned once, later polls yield `Poll::Ready(None)`.
  pub fn try_outcome(&mut self) -> Poll<Option<T>> {
    match self.rx.try_recv() {
      Ok(value) if !self.token.is_cancelled() => Poll::Ready(Some(value)),
      Ok(_) => Poll::Ready(None),
      Err(oneshot::error::TryRecvError::Empty) if self.token.is_cancelled() => Poll::Ready(None),
      Err(oneshot::error::TryRecvError::Empty) => Poll::Pending,
      Err(oneshot::error::TryRecvError::Closed) => Poll::Ready(None),
    }
  }
}

impl<T> fmt::Debug for Call<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Call")
      .field("token", &self.token)
      .finish_non_exhaustive()
  }
}
