//! On-device plant species classification with confidence-gated diagnostics.
//!
//! A captured photo is resized into a raw-pixel `[1, 224, 224, 3]` tensor,
//! run through a species model, and ranked against the label table. When the
//! best confidence clears the detection threshold, the photo and species are
//! sent to a remote diagnostic service for care recommendations.
//!
//! The [`AnalysisController`] drives one capture at a time through that
//! pipeline and exposes the outcome as an explicit [`AnalysisState`].

pub mod analysis;
pub mod backends;
mod config;
pub mod diagnostic;
mod error;
pub mod inference;
pub mod labels;
pub mod types;

pub use analysis::state::{AnalysisState, FailureReason, RejectReason};
pub use analysis::AnalysisController;
pub use backends::{BackendConfig, InferenceBackend};
pub use config::{AnalysisConfig, DEFAULT_DETECTION_THRESHOLD, DEFAULT_INPUT_SIZE, DEFAULT_TOP_K};
pub use diagnostic::messages::{DiagnosticResult, HealthStatus, ProcessResponse, UrgencyLevel};
pub use diagnostic::DiagnosticClient;
pub use error::{AnalysisError, ClassifierError, ConfigError, DiagnosticError};
pub use inference::classifier::{Classifier, ClassifierConfig};
pub use inference::loader::{ClassifierHandle, LoadStatus};
pub use inference::model::ModelRuntime;
pub use inference::tensor::ImageTensor;
pub use labels::LabelTable;
pub use types::{Prediction, RankedResult};
