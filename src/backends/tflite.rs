//! TFLite backend implementation
//!
//! The model file is memory-mapped read-only, parsed by `tract-tflite`, pinned
//! to a `f32 [1, S, S, 3]` input and optimized once. The resulting plan is
//! immutable and shared across calls.

use super::InferenceBackend;
use crate::error::ClassifierError;
use crate::inference::tensor::ImageTensor;
use memmap2::Mmap;
use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};
use tract_tflite::prelude::*;

/// TFLite backend running a `tract` plan
pub struct TfliteBackend {
    plan: TypedRunnableModel<TypedModel>,
    input_size: u32,
    output_len: Option<usize>,
}

impl TfliteBackend {
    /// Load and optimize a `.tflite` model
    pub fn load(path: &Path, input_size: u32) -> Result<Self, ClassifierError> {
        if input_size == 0 {
            return Err(ClassifierError::InvalidInput(
                "input size must be non-zero".to_string(),
            ));
        }

        let file = File::open(path).map_err(|source| ClassifierError::AssetLoad {
            path: path.to_path_buf(),
            source,
        })?;
        // SAFETY: the map is read-only and dropped before this function returns;
        // model assets are not modified while the process runs.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|source| ClassifierError::AssetLoad {
            path: path.to_path_buf(),
            source,
        })?;
        if mmap.is_empty() {
            return Err(ClassifierError::ModelLoad(format!(
                "model file '{}' is empty",
                path.display()
            )));
        }
        debug!("Mapped {} bytes from {}", mmap.len(), path.display());

        let mut cursor = Cursor::new(&mmap[..]);
        let model = tract_tflite::tflite()
            .model_for_read(&mut cursor)
            .map_err(|e| ClassifierError::ModelLoad(format!("TFLite parse error: {e}")))?;

        let side = input_size as usize;
        let fact = TypedFact::dt_shape(f32::datum_type(), tvec!(1, side, side, 3));
        let model = model
            .with_input_fact(0, fact)
            .and_then(|m| m.into_optimized())
            .map_err(|e| ClassifierError::ModelLoad(format!("Failed to prepare model: {e}")))?;

        let output_len = model
            .output_fact(0)
            .ok()
            .and_then(|fact| fact.shape.as_concrete().map(|dims| dims.iter().product()));

        let plan = model
            .into_runnable()
            .map_err(|e| ClassifierError::ModelLoad(format!("Failed to build plan: {e}")))?;

        info!(
            "Loaded TFLite model {} (input {}x{}, outputs {:?})",
            path.display(),
            input_size,
            input_size,
            output_len
        );

        Ok(Self {
            plan,
            input_size,
            output_len,
        })
    }
}

impl InferenceBackend for TfliteBackend {
    fn run(&self, tensor: &ImageTensor) -> Result<Vec<f32>, ClassifierError> {
        if tensor.size() != self.input_size {
            return Err(ClassifierError::Inference(format!(
                "tensor is {}x{}, model expects {}x{}",
                tensor.size(),
                tensor.size(),
                self.input_size,
                self.input_size
            )));
        }

        let input = Tensor::from_shape::<f32>(&tensor.shape(), tensor.as_slice())
            .map_err(|e| ClassifierError::Inference(format!("Failed to shape input: {e}")))?;

        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| ClassifierError::Inference(format!("Failed to run TFLite model: {e}")))?;

        let first = outputs
            .first()
            .ok_or_else(|| ClassifierError::Inference("Model produced no outputs".to_string()))?;
        let view = first
            .to_array_view::<f32>()
            .map_err(|e| ClassifierError::Inference(format!("Output is not f32: {e}")))?;

        Ok(view.iter().copied().collect())
    }

    fn output_len(&self) -> Option<usize> {
        self.output_len
    }

    fn input_size(&self) -> u32 {
        self.input_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.tflite");

        match TfliteBackend::load(&path, 224) {
            Err(ClassifierError::AssetLoad { path: p, .. }) => assert_eq!(p, path),
            Err(other) => panic!("Expected AssetLoad, got {:?}", other),
            Ok(_) => panic!("Expected AssetLoad, got a backend"),
        }
    }

    #[test]
    fn test_empty_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.tflite");
        std::fs::write(&path, b"").unwrap();

        match TfliteBackend::load(&path, 224) {
            Err(ClassifierError::ModelLoad(msg)) => assert!(msg.contains("empty")),
            Err(other) => panic!("Expected ModelLoad, got {:?}", other),
            Ok(_) => panic!("Expected ModelLoad, got a backend"),
        }
    }
}
