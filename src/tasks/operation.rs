//! Background Operations
//!
//! Runs one API client operation off the caller's loop and delivers exactly
//! one terminal outcome, either through callbacks fired from the worker or
//! through the returned [`TaskHandle`].

use std::future::Future;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::models::ApiResponse;

// == Outcome ==
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome<T> {
    Success(T),
    /// `fallback` carries the failed response's placeholder payload, if the
    /// operation produced one.
    Failed { message: String, fallback: Option<T> },
}

impl<T> TaskOutcome<T> {
    pub fn from_response(response: ApiResponse<T>) -> Self {
        if response.success {
            TaskOutcome::Success(response.data)
        } else {
            TaskOutcome::Failed {
                message: response
                    .error_message
                    .unwrap_or_else(|| "Unknown error".to_string()),
                fallback: Some(response.data),
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            TaskOutcome::Success(value) => Some(value),
            TaskOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            TaskOutcome::Success(_) => None,
            TaskOutcome::Failed { message, .. } => Some(message),
        }
    }
}

// == Callbacks ==
type SuccessCallback<T> = Box<dyn FnOnce(&T) + Send>;
type ErrorCallback = Box<dyn FnOnce(&str) + Send>;
type CompleteCallback = Box<dyn FnOnce() + Send>;

/// Optional hooks invoked on the worker once the operation settles.
///
/// Either `on_success` or `on_error` fires, then `on_complete`.
pub struct TaskCallbacks<T> {
    on_success: Option<SuccessCallback<T>>,
    on_error: Option<ErrorCallback>,
    on_complete: Option<CompleteCallback>,
}

impl<T> TaskCallbacks<T> {
    pub fn new() -> Self {
        Self {
            on_success: None,
            on_error: None,
            on_complete: None,
        }
    }

    pub fn on_success(mut self, f: impl FnOnce(&T) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnOnce(&str) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    fn dispatch(self, outcome: &TaskOutcome<T>) {
        match outcome {
            TaskOutcome::Success(value) => {
                if let Some(f) = self.on_success {
                    f(value);
                }
            }
            TaskOutcome::Failed { message, .. } => {
                if let Some(f) = self.on_error {
                    f(message);
                }
            }
        }
        if let Some(f) = self.on_complete {
            f();
        }
    }
}

impl<T> Default for TaskCallbacks<T> {
    fn default() -> Self {
        Self::new()
    }
}

// == Handle ==
/// Handle to a running operation.
pub struct TaskHandle<T> {
    receiver: oneshot::Receiver<TaskOutcome<T>>,
    join: JoinHandle<()>,
}

impl<T> TaskHandle<T> {
    /// Whether the worker has finished, callbacks included.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Takes the outcome if it is ready. Returns it at most once.
    pub fn try_outcome(&mut self) -> Option<TaskOutcome<T>> {
        self.receiver.try_recv().ok()
    }

    /// Waits for the outcome.
    pub async fn outcome(self) -> TaskOutcome<T> {
        match self.receiver.await {
            Ok(outcome) => outcome,
            Err(_) => {
                let message = match self.join.await {
                    Err(e) => format!("Task failed: {e}"),
                    Ok(()) => "Task ended without an outcome".to_string(),
                };
                TaskOutcome::Failed {
                    message,
                    fallback: None,
                }
            }
        }
    }
}

/// Spawns `operation` on the runtime.
///
/// A panicking operation settles as `Failed` with no fallback.
pub fn spawn_operation<T, F>(operation: F, callbacks: TaskCallbacks<T>) -> TaskHandle<T>
where
    T: Send + 'static,
    F: Future<Output = ApiResponse<T>> + Send + 'static,
{
    let (sender, receiver) = oneshot::channel();

    let join = tokio::spawn(async move {
        let outcome = match tokio::spawn(operation).await {
            Ok(response) => TaskOutcome::from_response(response),
            Err(e) => {
                warn!("Background operation failed: {}", e);
                TaskOutcome::Failed {
                    message: format!("Operation failed: {e}"),
                    fallback: None,
                }
            }
        };

        callbacks.dispatch(&outcome);
        if sender.send(outcome).is_err() {
            debug!("Operation outcome dropped, handle no longer held");
        }
    });

    TaskHandle { receiver, join }
}
