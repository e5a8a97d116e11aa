//! Error types for the plant care runner.
//!
//! Three families of errors exist, matching the three layers of the crate:
//!
//! - [`ClassifierError`] covers asset loading, model loading, tensor
//!   construction and inference. These are raised by the on-device pipeline.
//! - [`DiagnosticError`] covers the HTTP exchange with the remote diagnostic
//!   service. Every variant is a transport failure from the point of view of
//!   the analysis controller.
//! - [`AnalysisError`] covers calls the controller refuses outright without
//!   changing its state.
//!
//! A confidence below the detection threshold is not an error; it is the
//! normal `Rejected` outcome of an analysis cycle.

use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Represents all errors raised by the on-device classification pipeline.
#[derive(Error, Debug)]
pub enum ClassifierError {
    /// A bundled asset (label file or model file) is missing or unreadable.
    ///
    /// This is fatal to classifier construction and must be surfaced
    /// separately from a normal "not detected" outcome.
    #[error("Failed to load asset {}: {source}", .path.display())]
    AssetLoad {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The model file was readable but could not be turned into a runnable
    /// model.
    ///
    /// This error occurs when:
    /// - The file is not a model the runtime understands
    /// - The model rejects the `[1, S, S, 3]` input shape
    /// - The model's output length disagrees with the label table
    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    /// Classification was requested before the model finished loading.
    #[error("Model is not ready yet")]
    ModelNotReady,

    /// The forward pass failed or produced an unusable output.
    #[error("Failed to run model: {0}")]
    Inference(String),

    /// The input image could not be decoded.
    #[error("Failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The provided input is invalid (e.g. a zero target size).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An operation was attempted that the current build or configuration
    /// does not support.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Errors raised while talking to the diagnostic service.
#[derive(Debug)]
pub enum DiagnosticError {
    Server { status_code: u16, message: String },
    Config(String),
    Network(reqwest::Error),
    Json(serde_json::Error),
    Encode(image::ImageError),
}

impl fmt::Display for DiagnosticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticError::Server {
                status_code,
                message,
            } => {
                write!(f, "Server error {}: {}", status_code, message)
            }
            DiagnosticError::Config(msg) => write!(f, "Configuration error: {}", msg),
            DiagnosticError::Network(e) => write!(f, "Network error: {}", e),
            DiagnosticError::Json(e) => write!(f, "JSON error: {}", e),
            DiagnosticError::Encode(e) => write!(f, "Image encoding error: {}", e),
        }
    }
}

impl Error for DiagnosticError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DiagnosticError::Network(e) => Some(e),
            DiagnosticError::Json(e) => Some(e),
            DiagnosticError::Encode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for DiagnosticError {
    fn from(err: reqwest::Error) -> Self {
        DiagnosticError::Network(err)
    }
}

impl From<serde_json::Error> for DiagnosticError {
    fn from(err: serde_json::Error) -> Self {
        DiagnosticError::Json(err)
    }
}

impl From<image::ImageError> for DiagnosticError {
    fn from(err: image::ImageError) -> Self {
        DiagnosticError::Encode(err)
    }
}

/// Calls the analysis controller refuses without touching its state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// A cycle is already classifying or waiting on the diagnostic service.
    #[error("An analysis is already in progress")]
    Busy,

    /// There is no freshly captured image waiting to be analyzed.
    #[error("No captured image awaiting analysis")]
    NothingCaptured,
}

/// Errors raised when validating an [`AnalysisConfig`](crate::AnalysisConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("detection threshold must be within [0, 1], got {0}")]
    Threshold(f32),

    #[error("top_k must be at least 1")]
    TopK,

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
