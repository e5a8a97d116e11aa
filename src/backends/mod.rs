//! Backend abstraction for on-device inference
//!
//! This module provides a trait-based abstraction over the engine that runs
//! the species model:
//!
//! - **TFLite Backend**: a `.tflite` file executed with `tract`, loaded from a
//!   read-only memory map
//!
//! Additional engines can be plugged in by implementing `InferenceBackend` and
//! handing the result to [`ModelRuntime::from_backend`](crate::ModelRuntime::from_backend).

use crate::config::DEFAULT_INPUT_SIZE;
use crate::error::ClassifierError;
use crate::inference::tensor::ImageTensor;
use std::path::PathBuf;

/// Configuration for different backend types
#[derive(Debug, Clone)]
pub enum BackendConfig {
    /// TensorFlow Lite flatbuffer model
    Tflite {
        /// Path to the .tflite file
        path: PathBuf,
        /// Side length of the square RGB input
        input_size: u32,
    },
}

impl BackendConfig {
    pub fn tflite<P: Into<PathBuf>>(path: P) -> Self {
        BackendConfig::Tflite {
            path: path.into(),
            input_size: DEFAULT_INPUT_SIZE,
        }
    }
}

/// Trait for inference backends
///
/// Implementations must be usable from several threads at once: `run` takes
/// `&self` and must not mutate shared state.
pub trait InferenceBackend: Send + Sync {
    /// Run a forward pass and return the raw output vector, unmodified.
    fn run(&self, tensor: &ImageTensor) -> Result<Vec<f32>, ClassifierError>;

    /// Length of the output vector, when the model declares it statically.
    fn output_len(&self) -> Option<usize>;

    /// Side length of the square input the model expects.
    fn input_size(&self) -> u32;
}

#[cfg(feature = "tflite")]
pub mod tflite;

/// Factory function to create the appropriate backend
pub fn create_backend(
    config: BackendConfig,
) -> Result<Box<dyn InferenceBackend>, ClassifierError> {
    match config {
        #[cfg(feature = "tflite")]
        BackendConfig::Tflite { path, input_size } => {
            use tflite::TfliteBackend;
            Ok(Box::new(TfliteBackend::load(&path, input_size)?))
        }
        #[cfg(not(feature = "tflite"))]
        BackendConfig::Tflite { .. } => Err(ClassifierError::InvalidOperation(
            "TFLite backend not enabled. Enable the 'tflite' feature.".to_string(),
        )),
    }
}
