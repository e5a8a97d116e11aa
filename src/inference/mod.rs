pub mod classifier;
pub mod loader;
pub mod model;
pub mod tensor;
