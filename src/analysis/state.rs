//! States of a single analysis cycle.

use crate::diagnostic::messages::DiagnosticResult;
use crate::error::{ClassifierError, DiagnosticError};
use crate::types::Prediction;
use std::fmt;

/// Why a classified capture was not forwarded for diagnosis.
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    /// The best confidence was below the detection threshold, or there were
    /// no predictions at all.
    NotDetected { best: Option<Prediction> },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::NotDetected { .. } => write!(f, "not detected"),
        }
    }
}

/// Why a cycle ended in failure.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    /// Analysis was triggered before the model finished loading.
    ModelNotReady,
    /// A label or model asset is missing or unreadable.
    AssetLoad(String),
    /// The model could not be loaded.
    ModelLoad(String),
    /// The forward pass failed.
    Inference(String),
    /// The captured image could not be decoded.
    ImageDecode(String),
    /// The diagnostic request failed in transit. The classification that
    /// triggered it is kept.
    Transport {
        label: String,
        confidence: f32,
        message: String,
    },
}

impl From<&ClassifierError> for FailureReason {
    fn from(err: &ClassifierError) -> Self {
        match err {
            ClassifierError::ModelNotReady => FailureReason::ModelNotReady,
            ClassifierError::AssetLoad { .. } => FailureReason::AssetLoad(err.to_string()),
            ClassifierError::ModelLoad(_) | ClassifierError::InvalidOperation(_) => {
                FailureReason::ModelLoad(err.to_string())
            }
            ClassifierError::ImageDecode(e) => FailureReason::ImageDecode(e.to_string()),
            ClassifierError::Inference(_) | ClassifierError::InvalidInput(_) => {
                FailureReason::Inference(err.to_string())
            }
        }
    }
}

impl FailureReason {
    pub(crate) fn transport(label: String, confidence: f32, err: &DiagnosticError) -> Self {
        FailureReason::Transport {
            label,
            confidence,
            message: err.to_string(),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::ModelNotReady => write!(f, "Model not ready yet."),
            FailureReason::AssetLoad(msg) | FailureReason::ModelLoad(msg) => {
                write!(f, "Error loading model: {}", msg)
            }
            FailureReason::Inference(msg) => write!(f, "Error running model: {}", msg),
            FailureReason::ImageDecode(msg) => write!(f, "Could not load selected image: {}", msg),
            FailureReason::Transport { message, .. } => {
                write!(f, "AI analysis failed: {}", message)
            }
        }
    }
}

/// The live state of the analysis controller.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisState {
    Idle,
    Captured,
    Classifying,
    Rejected(RejectReason),
    DiagnosticPending {
        label: String,
        confidence: f32,
    },
    Completed {
        label: String,
        confidence: f32,
        diagnostic: DiagnosticResult,
    },
    Failed(FailureReason),
}

impl AnalysisState {
    /// Whether a cycle is currently running.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            AnalysisState::Classifying | AnalysisState::DiagnosticPending { .. }
        )
    }

    /// Whether the cycle has reached an end state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AnalysisState::Rejected(_) | AnalysisState::Completed { .. } | AnalysisState::Failed(_)
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            AnalysisState::Idle => "Idle",
            AnalysisState::Captured => "Captured",
            AnalysisState::Classifying => "Classifying",
            AnalysisState::Rejected(_) => "Rejected",
            AnalysisState::DiagnosticPending { .. } => "DiagnosticPending",
            AnalysisState::Completed { .. } => "Completed",
            AnalysisState::Failed(_) => "Failed",
        }
    }

    /// Message to show the user, if the state calls for one.
    pub fn user_message(&self) -> Option<String> {
        match self {
            AnalysisState::Rejected(RejectReason::NotDetected { .. }) => {
                Some("Plant not detected. Please retake.".to_string())
            }
            AnalysisState::Failed(reason) => Some(reason.to_string()),
            AnalysisState::Completed { diagnostic, .. } => Some(diagnostic.care_tips().to_string()),
            _ => None,
        }
    }
}

impl fmt::Display for AnalysisState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisState::Rejected(reason) => write!(f, "Rejected({})", reason),
            AnalysisState::DiagnosticPending { label, confidence }
            | AnalysisState::Completed {
                label, confidence, ..
            } => write!(f, "{}({}, {:.2})", self.name(), label, confidence),
            AnalysisState::Failed(reason) => write!(f, "Failed({})", reason),
            _ => write!(f, "{}", self.name()),
        }
    }
}
