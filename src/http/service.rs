use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use reqwest::Client;
use tokio::runtime::{Builder, Runtime};
use uuid::Uuid;

use crate::codec::Entity;
use crate::config::ClientConfig;
use crate::http::error::ApiError;
use crate::http::request::ApiRequest;
use crate::http::response::ApiResponse;
use crate::http::task::ApiTask;

/// Receives the outcome of every request an [`ApiService`] executes.
pub trait Delegate<T>: Send + Sync {
    /// Run a notification on the thread the delegate wants it on.
    ///
    /// The default runs it straight away on the worker that finished the
    /// request. UI-style callers forward it to their own event loop.
    fn dispatch(&self, notify: Box<dyn FnOnce() + Send>) {
        notify();
    }

    fn did_receive_response(&self, response: ApiResponse<T>, exec_time: Duration, id: &str);

    /// `status` is set when the server answered with a non-success code.
    fn did_fail(&self, error: ApiError, id: &str, status: Option<u16>);
}

/// Executes requests on a worker pool and reports results to a [`Delegate`].
///
/// Call [`prepare`](ApiService::prepare) before the first
/// [`exec`](ApiService::exec); [`release`](ApiService::release) stops the
/// pool and reports every request still in flight as
/// [`ApiError::Cancelled`].
pub struct ApiService<T: Entity + Send> {
    client: Client,
    config: ClientConfig,
    delegate: Arc<dyn Delegate<T>>,
    runtime: Option<Runtime>,
    pending: Mutex<Vec<Pending<T>>>,
}

/// A scheduled request that has not reported to the delegate yet.
struct Pending<T> {
    id: String,
    settled: Arc<AtomicBool>,
    delegate: Arc<dyn Delegate<T>>,
}

impl<T: Entity + Send> ApiService<T> {
    /// Create a new service; no worker threads are started yet.
    ///
    /// Timeouts are applied per request and cover connecting as well as
    /// reading the response.
    pub fn new(delegate: Arc<dyn Delegate<T>>, config: ClientConfig) -> Result<Self, ApiError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            config,
            delegate,
            runtime: None,
            pending: Mutex::new(vec![]),
        })
    }

    /// Replace the delegate used for requests scheduled from now on.
    pub fn set_delegate(&mut self, delegate: Arc<dyn Delegate<T>>) {
        self.delegate = delegate;
    }

    /// Settings every request is executed with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Start the worker pool. Calling it again while prepared does nothing.
    pub fn prepare(&mut self) -> Result<(), ApiError> {
        if self.runtime.is_none() {
            let runtime = Builder::new_multi_thread()
                .thread_name("api-service-worker")
                .enable_all()
                .build()
                .map_err(|e| ApiError::Io(format!("failed to start workers: {e}")))?;
            self.runtime = Some(runtime);
        }
        Ok(())
    }

    /// Stop the worker pool without waiting for running requests.
    ///
    /// Requests that have not finished are reported to the delegate as
    /// [`ApiError::Cancelled`].
    pub fn release(&mut self) {
        self.shutdown();
    }

    /// Schedule `request`; `id` tags it in logs and delegate callbacks.
    pub fn exec(&self, request: ApiRequest<T>, id: &str) -> Result<ApiTask<T>, ApiError> {
        let runtime = self.runtime.as_ref().ok_or(ApiError::NotPrepared)?;

        let settled = Arc::new(AtomicBool::new(false));
        let worker_settled = Arc::clone(&settled);
        let delegate = Arc::clone(&self.delegate);
        let client = self.client.clone();
        let config = self.config.clone();
        let identifier = id.to_string();
        let started = Instant::now();

        if let Ok(mut pending) = self.pending.lock() {
            pending.retain(|p| !p.settled.load(Ordering::Acquire));
            pending.push(Pending {
                id: id.to_string(),
                settled: Arc::clone(&settled),
                delegate: Arc::clone(&self.delegate),
            });
        }

        let handle = runtime.spawn(async move {
            let result = request.execute(&client, &config).await;
            let exec_time = started.elapsed();
            if worker_settled.swap(true, Ordering::AcqRel) {
                return;
            }
            notify(delegate, result, exec_time, identifier);
        });

        Ok(ApiTask::new(
            id.to_string(),
            handle,
            settled,
            Arc::clone(&self.delegate),
        ))
    }

    /// Schedule `request` under a freshly generated identifier.
    pub fn exec_with_generated_id(&self, request: ApiRequest<T>) -> Result<ApiTask<T>, ApiError> {
        self.exec(request, &Uuid::new_v4().to_string())
    }

    fn shutdown(&mut self) {
        let Some(runtime) = self.runtime.take() else {
            return;
        };

        let pending = match self.pending.get_mut() {
            Ok(pending) => std::mem::take(pending),
            Err(poisoned) => std::mem::take(poisoned.into_inner()),
        };
        for Pending {
            id,
            settled,
            delegate,
        } in pending
        {
            if settled.swap(true, Ordering::AcqRel) {
                continue;
            }
            log::warn!("{}: cancelled on release", id);
            let target = Arc::clone(&delegate);
            delegate.dispatch(Box::new(move || {
                target.did_fail(ApiError::Cancelled, &id, None);
            }));
        }

        runtime.shutdown_background();
    }
}

impl<T: Entity + Send> Drop for ApiService<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn notify<T: Send + 'static>(
    delegate: Arc<dyn Delegate<T>>,
    result: Result<ApiResponse<T>, ApiError>,
    exec_time: Duration,
    id: String,
) {
    let target = Arc::clone(&delegate);
    delegate.dispatch(Box::new(move || match result {
        Ok(response) => {
            log::info!("{}: {}ms", id, exec_time.as_millis());
            target.did_receive_response(response, exec_time, &id);
        }
        Err(error) => {
            log::error!("{}: {}", id, error);
            let status = error.status();
            target.did_fail(error, &id, status);
        }
    }));
}
