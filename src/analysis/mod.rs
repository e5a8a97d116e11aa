//! Confidence-gated analysis controller.
//!
//! The controller owns one capture cycle at a time:
//!
//! ```text
//! Idle ──capture──▶ Captured ──analyze──▶ Classifying ──┬─▶ Rejected(not detected)
//!                                                        ├─▶ Failed(reason)
//!                                                        └─▶ DiagnosticPending ──settle──┬─▶ Completed
//!                                                                                        └─▶ Failed(transport)
//! ```
//!
//! A new capture replaces the current cycle from any state. The classification
//! and diagnostic tasks of an abandoned cycle keep running, but their handles
//! are dropped with the cycle so their results can never reach a newer one.
//!
//! Both tasks are owned by the controller rather than by the future awaiting
//! them. If `analyze` is cancelled while classifying, [`settle`] picks the
//! cycle up where it stopped.
//!
//! [`settle`]: AnalysisController::settle

pub mod state;

use crate::config::AnalysisConfig;
use crate::error::ConfigError;
use crate::diagnostic::messages::DiagnosticResult;
use crate::diagnostic::DiagnosticClient;
use crate::error::{AnalysisError, ClassifierError, DiagnosticError};
use crate::inference::loader::{ClassifierHandle, LoadStatus};
use crate::types::RankedResult;
use image::DynamicImage;
use state::{AnalysisState, FailureReason, RejectReason};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

type ClassifyTask = JoinHandle<Result<RankedResult, ClassifierError>>;
type DiagnosticTask = JoinHandle<Result<DiagnosticResult, DiagnosticError>>;

/// Single-flight state machine from captured photo to diagnostic.
pub struct AnalysisController {
    classifier: ClassifierHandle,
    diagnostics: Arc<DiagnosticClient>,
    config: AnalysisConfig,
    state: AnalysisState,
    image: Option<Arc<DynamicImage>>,
    ranked: Option<RankedResult>,
    classifying: Option<ClassifyTask>,
    pending: Option<DiagnosticTask>,
}

impl AnalysisController {
    /// Build a controller in `Idle`.
    ///
    /// Fails if `config` does not pass [`AnalysisConfig::validate`].
    pub fn new(
        classifier: ClassifierHandle,
        diagnostics: Arc<DiagnosticClient>,
        config: AnalysisConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            classifier,
            diagnostics,
            config,
            state: AnalysisState::Idle,
            image: None,
            ranked: None,
            classifying: None,
            pending: None,
        })
    }

    pub fn state(&self) -> &AnalysisState {
        &self.state
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn captured_image(&self) -> Option<&DynamicImage> {
        self.image.as_deref()
    }

    /// Ranked predictions of the current cycle, once classification ran.
    pub fn predictions(&self) -> Option<&RankedResult> {
        self.ranked.as_ref()
    }

    fn transition(&mut self, next: AnalysisState) {
        info!("Analysis state: {} -> {}", self.state, next);
        self.state = next;
    }

    /// Drop everything belonging to the current cycle.
    fn abandon_cycle(&mut self) {
        if self.classifying.take().is_some() {
            debug!("Abandoning in-flight classification");
        }
        if self.pending.take().is_some() {
            debug!("Abandoning in-flight diagnostic request");
        }
        self.ranked = None;
        self.image = None;
    }

    /// Start a new cycle with a decoded image.
    pub fn capture(&mut self, image: DynamicImage) -> &AnalysisState {
        self.abandon_cycle();
        self.image = Some(Arc::new(image));
        self.transition(AnalysisState::Captured);
        &self.state
    }

    /// Start a new cycle from encoded image bytes.
    ///
    /// A decode failure ends the new cycle immediately; the user has to
    /// capture again.
    pub fn capture_bytes(&mut self, bytes: &[u8]) -> &AnalysisState {
        match image::load_from_memory(bytes) {
            Ok(image) => self.capture(image),
            Err(e) => {
                warn!("Failed to decode captured image: {}", e);
                self.abandon_cycle();
                let reason = FailureReason::from(&ClassifierError::ImageDecode(e));
                self.transition(AnalysisState::Failed(reason));
                &self.state
            }
        }
    }

    /// Return to `Idle`, discarding the current cycle.
    pub fn reset(&mut self) {
        self.abandon_cycle();
        self.transition(AnalysisState::Idle);
    }

    /// Classify the captured image and, if a plant was detected, dispatch the
    /// diagnostic request.
    ///
    /// Returns once the cycle is `Rejected`, `Failed` or `DiagnosticPending`.
    /// Use [`settle`](Self::settle) to wait for the diagnostic.
    pub async fn analyze(&mut self) -> Result<&AnalysisState, AnalysisError> {
        if self.state.is_in_flight() {
            warn!("Analysis requested while {} is in progress", self.state.name());
            return Err(AnalysisError::Busy);
        }
        let image = match (&self.state, &self.image) {
            (AnalysisState::Captured, Some(image)) => Arc::clone(image),
            _ => return Err(AnalysisError::NothingCaptured),
        };

        let classifier = match self.classifier.status() {
            LoadStatus::Ready(classifier) => classifier,
            LoadStatus::Loading => {
                self.transition(AnalysisState::Failed(FailureReason::ModelNotReady));
                return Ok(&self.state);
            }
            LoadStatus::Failed(e) => {
                self.transition(AnalysisState::Failed(FailureReason::from(e.as_ref())));
                return Ok(&self.state);
            }
        };

        let top_k = self.config.top_k;
        self.classifying = Some(tokio::task::spawn_blocking(move || {
            classifier.classify(&image, top_k)
        }));
        self.transition(AnalysisState::Classifying);
        self.finish_classification().await;
        Ok(&self.state)
    }

    /// Await the classification task and apply the detection policy.
    ///
    /// The task handle stays in the controller until it has produced a result,
    /// so dropping this future part way leaves the cycle resumable.
    async fn finish_classification(&mut self) {
        let Some(task) = self.classifying.as_mut() else {
            if self.state == AnalysisState::Classifying {
                self.transition(AnalysisState::Failed(FailureReason::Inference(
                    "classification task was lost".to_string(),
                )));
            }
            return;
        };
        let outcome = task.await;
        self.classifying = None;

        let ranked = match outcome {
            Ok(Ok(ranked)) => ranked,
            Ok(Err(e)) => {
                warn!("Classification failed: {}", e);
                self.transition(AnalysisState::Failed(FailureReason::from(&e)));
                return;
            }
            Err(e) => {
                warn!("Classification task failed: {}", e);
                self.transition(AnalysisState::Failed(FailureReason::Inference(
                    e.to_string(),
                )));
                return;
            }
        };

        let best = ranked.best().cloned();
        self.ranked = Some(ranked);

        match (best, self.image.clone()) {
            (Some(best), Some(image)) if self.config.is_detected(best.confidence) => {
                let label = best.label.clone();
                let diagnostics = Arc::clone(&self.diagnostics);
                let species = label.clone();
                debug!("Dispatching diagnostic request for {}", species);
                self.pending = Some(tokio::spawn(async move {
                    diagnostics.diagnose(&image, &species).await
                }));
                self.transition(AnalysisState::DiagnosticPending {
                    label,
                    confidence: best.confidence,
                });
            }
            (best, _) => {
                self.transition(AnalysisState::Rejected(RejectReason::NotDetected { best }));
            }
        }
    }

    /// Wait for in-flight work, if any, and apply its outcome.
    ///
    /// Finishes a classification left behind by a cancelled
    /// [`analyze`](Self::analyze), then waits for the diagnostic it dispatched.
    /// Returns the current state unchanged when nothing is in flight.
    pub async fn settle(&mut self) -> &AnalysisState {
        if self.state == AnalysisState::Classifying {
            self.finish_classification().await;
        }
        let (label, confidence) = match &self.state {
            AnalysisState::DiagnosticPending { label, confidence } => (label.clone(), *confidence),
            _ => return &self.state,
        };
        let Some(task) = self.pending.take() else {
            let reason = FailureReason::Transport {
                label,
                confidence,
                message: "diagnostic request was lost".to_string(),
            };
            self.transition(AnalysisState::Failed(reason));
            return &self.state;
        };

        let next = match task.await {
            Ok(Ok(diagnostic)) => AnalysisState::Completed {
                label,
                confidence,
                diagnostic,
            },
            Ok(Err(e)) => {
                warn!("Diagnostic request failed: {}", e);
                AnalysisState::Failed(FailureReason::transport(label, confidence, &e))
            }
            Err(e) => AnalysisState::Failed(FailureReason::Transport {
                label,
                confidence,
                message: format!("diagnostic task failed: {e}"),
            }),
        };
        self.transition(next);
        &self.state
    }

    /// Analyze and, when a diagnostic was dispatched, wait for it.
    pub async fn run_cycle(&mut self) -> Result<&AnalysisState, AnalysisError> {
        self.analyze().await?;
        Ok(self.settle().await)
    }
}

impl std::fmt::Debug for AnalysisController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisController")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("has_image", &self.image.is_some())
            .field("classifying", &self.classifying.is_some())
            .field("pending", &self.pending.is_some())
            .finish()
    }
}
