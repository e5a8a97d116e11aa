//! One-shot background loading of the classifier.
//!
//! Loading memory-maps and optimizes the model, which can take a noticeable
//! amount of time. [`ClassifierHandle::spawn`] runs it on the blocking pool and
//! publishes the outcome through a watch channel, so callers can either check
//! the status without waiting or suspend until loading has finished.

use crate::error::ClassifierError;
use crate::inference::classifier::{Classifier, ClassifierConfig};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

/// Observable status of the classifier.
#[derive(Debug, Clone)]
pub enum LoadStatus {
    Loading,
    Ready(Arc<Classifier>),
    Failed(Arc<ClassifierError>),
}

impl LoadStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadStatus::Loading)
    }
}

/// Cheaply cloneable handle to a classifier that may still be loading.
#[derive(Debug, Clone)]
pub struct ClassifierHandle {
    status: watch::Receiver<LoadStatus>,
}

impl ClassifierHandle {
    /// Start loading the classifier described by `config`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: ClassifierConfig) -> Self {
        Self::spawn_with(move || Classifier::load(&config))
    }

    /// Start an arbitrary loader on the blocking pool.
    pub fn spawn_with<F>(load: F) -> Self
    where
        F: FnOnce() -> Result<Classifier, ClassifierError> + Send + 'static,
    {
        let (tx, rx) = watch::channel(LoadStatus::Loading);
        tokio::task::spawn_blocking(move || {
            let status = match panic::catch_unwind(AssertUnwindSafe(load))
                .unwrap_or_else(|payload| Err(ClassifierError::ModelLoad(panic_message(payload))))
            {
                Ok(classifier) => {
                    info!(
                        "Classifier ready with {} labels",
                        classifier.labels().len()
                    );
                    LoadStatus::Ready(Arc::new(classifier))
                }
                Err(e) => {
                    error!("Classifier failed to load: {}", e);
                    LoadStatus::Failed(Arc::new(e))
                }
            };
            // Nobody listening is fine; the handle was dropped.
            let _ = tx.send(status);
        });
        Self { status: rx }
    }

    /// A handle around an already built classifier.
    pub fn ready(classifier: Classifier) -> Self {
        let (_tx, rx) = watch::channel(LoadStatus::Ready(Arc::new(classifier)));
        Self { status: rx }
    }

    /// Current status, without waiting.
    pub fn status(&self) -> LoadStatus {
        self.status.borrow().clone()
    }

    /// The classifier, or the reason it cannot be used right now.
    ///
    /// Returns [`ClassifierError::ModelNotReady`] while loading is in progress.
    pub fn current(&self) -> Result<Arc<Classifier>, Arc<ClassifierError>> {
        match self.status() {
            LoadStatus::Ready(classifier) => Ok(classifier),
            LoadStatus::Failed(e) => Err(e),
            LoadStatus::Loading => Err(Arc::new(ClassifierError::ModelNotReady)),
        }
    }

    /// Suspend until loading has finished, then return the final status.
    pub async fn wait_ready(&self) -> LoadStatus {
        let mut rx = self.status.clone();
        let waited = rx
            .wait_for(|status| !status.is_loading())
            .await
            .map(|status| status.clone());
        match waited {
            Ok(status) => status,
            // The loader task died without reporting.
            Err(_) => LoadStatus::Failed(Arc::new(ClassifierError::ModelLoad(
                "loader task exited before completing".to_string(),
            ))),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("loader panicked: {detail}")
}
