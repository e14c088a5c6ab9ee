use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::http::error::ApiError;
use crate::http::service::Delegate;

/// Handle to a request scheduled by [`ApiService::exec`](crate::http::ApiService::exec).
///
/// Whichever of completion and [`cancel`](ApiTask::cancel) happens first
/// settles the task; the delegate is notified exactly once.
pub struct ApiTask<T> {
    identifier: String,
    handle: JoinHandle<()>,
    settled: Arc<AtomicBool>,
    delegate: Arc<dyn Delegate<T>>,
}

impl<T: Send + 'static> ApiTask<T> {
    pub(crate) fn new(
        identifier: String,
        handle: JoinHandle<()>,
        settled: Arc<AtomicBool>,
        delegate: Arc<dyn Delegate<T>>,
    ) -> Self {
        ApiTask {
            identifier,
            handle,
            settled,
            delegate,
        }
    }

    /// Identifier the task was scheduled under.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// True once the worker has stopped, whether it completed or was aborted.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Abort the request and report [`ApiError::Cancelled`] to the delegate.
    ///
    /// Returns `false` if the task had already been settled.
    pub fn cancel(&self) -> bool {
        if self.settled.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.handle.abort();
        log::warn!("{}: cancelled", self.identifier);

        let delegate = Arc::clone(&self.delegate);
        let identifier = self.identifier.clone();
        self.delegate.dispatch(Box::new(move || {
            delegate.did_fail(ApiError::Cancelled, &identifier, None);
        }));
        true
    }

    /// Wait until the worker is done and the delegate has been notified.
    pub async fn join(self) -> Result<(), ApiError> {
        match self.handle.await {
            Ok(()) => Ok(()),
            Err(e) if e.is_cancelled() => Err(ApiError::Cancelled),
            Err(e) => Err(ApiError::Io(format!("worker failed: {e}"))),
        }
    }
}

impl<T> std::fmt::Debug for ApiTask<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiTask")
            .field("identifier", &self.identifier)
            .field("settled", &self.settled.load(Ordering::Acquire))
            .finish()
    }
}
