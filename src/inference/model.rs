use crate::backends::{create_backend, BackendConfig, InferenceBackend};
use crate::error::ClassifierError;
use crate::inference::tensor::ImageTensor;

/// Loaded species model that abstracts over different backends
///
/// The runtime exposes the model output exactly as produced. It is read-only
/// after construction and can be shared between threads.
pub struct ModelRuntime {
    backend: Box<dyn InferenceBackend>,
}

impl ModelRuntime {
    /// Load a model using the backend selected by `config`
    pub fn load(config: BackendConfig) -> Result<Self, ClassifierError> {
        let backend = create_backend(config)?;
        Ok(Self { backend })
    }

    /// Wrap an already constructed backend
    pub fn from_backend(backend: Box<dyn InferenceBackend>) -> Self {
        Self { backend }
    }

    /// Run a forward pass on the provided tensor
    pub fn run(&self, tensor: &ImageTensor) -> Result<Vec<f32>, ClassifierError> {
        self.backend.run(tensor)
    }

    /// Get the statically known output length
    pub fn output_len(&self) -> Option<usize> {
        self.backend.output_len()
    }

    /// Get input size
    pub fn input_size(&self) -> u32 {
        self.backend.input_size()
    }
}

impl std::fmt::Debug for ModelRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRuntime")
            .field("backend", &"<backend>")
            .field("input_size", &self.input_size())
            .field("output_len", &self.output_len())
            .finish()
    }
}
