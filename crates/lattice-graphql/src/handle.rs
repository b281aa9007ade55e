//! Cancellation handles and runtime management for spawned requests.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::oneshot;

/// Unique identifier for a spawned request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl RequestId {
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The numeric value of this ID.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A handle to a pending request that can be cancelled.
///
/// Dropping the handle does not cancel the request.
#[derive(Clone)]
pub struct RequestHandle {
    /// The unique ID of this request.
    pub id: RequestId,
    cancel_tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl RequestHandle {
    pub(crate) fn new(id: RequestId) -> (Self, oneshot::Receiver<()>) {
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let handle = Self {
            id,
            cancel_tx: Arc::new(Mutex::new(Some(cancel_tx))),
        };
        (handle, cancel_rx)
    }

    /// Cancel the pending request.
    ///
    /// Returns `true` if the cancellation took effect; the completion
    /// callback will then receive `ResponseError::Cancelled`. Returns `false`
    /// if the request already completed or was already cancelled.
    pub fn cancel(&self) -> bool {
        if let Some(tx) = self.cancel_tx.lock().take() {
            tx.send(()).is_ok()
        } else {
            false
        }
    }

    /// Check if the request is still pending.
    pub fn is_pending(&self) -> bool {
        self.cancel_tx.lock().is_some()
    }

    /// Mark the request as finished.
    ///
    /// Returns `false` if a cancellation got in first.
    pub(crate) fn finish(&self) -> bool {
        self.cancel_tx.lock().take().is_some()
    }
}

impl std::fmt::Debug for RequestHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestHandle")
            .field("id", &self.id)
            .field("pending", &self.is_pending())
            .finish()
    }
}

/// Runtime management for spawned requests.
///
/// Requests run on the caller's tokio runtime when there is one. Outside a
/// runtime a shared background runtime is created on first use.
pub mod runtime {
    use std::sync::OnceLock;
    use tokio::runtime::{Handle, Runtime};

    static RUNTIME: OnceLock<Runtime> = OnceLock::new();

    /// Initialize the shared runtime.
    ///
    /// # Panics
    ///
    /// Panics if the runtime cannot be created.
    pub fn init() -> &'static Runtime {
        RUNTIME.get_or_init(|| {
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .thread_name("lattice-graphql")
                .enable_all()
                .build()
                .expect("Failed to create tokio runtime")
        })
    }

    /// Spawn a future on the current runtime, or the shared one.
    pub fn spawn<F>(future: F) -> tokio::task::JoinHandle<F::Output>
    where
        F: std::future::Future + Send + 'static,
        F::Output: Send + 'static,
    {
        match Handle::try_current() {
            Ok(handle) => handle.spawn(future),
            Err(_) => init().spawn(future),
        }
    }
}
