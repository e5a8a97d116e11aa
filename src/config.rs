//! Policy parameters for the analysis controller.

use crate::error::ConfigError;
use serde::Deserialize;

/// Minimum best-class confidence required to treat a photo as a detected plant.
pub const DEFAULT_DETECTION_THRESHOLD: f32 = 0.55;

/// Number of predictions retained after ranking.
pub const DEFAULT_TOP_K: usize = 3;

/// Side length of the square model input, in pixels.
pub const DEFAULT_INPUT_SIZE: u32 = 224;

/// Detection policy applied by the [`AnalysisController`](crate::AnalysisController).
///
/// Both fields can be overridden per deployment; missing fields keep their
/// defaults when deserializing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Inclusive lower bound on the best confidence (0.0 to 1.0)
    pub detection_threshold: f32,
    /// Number of ranked predictions kept per classification
    pub top_k: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            detection_threshold: DEFAULT_DETECTION_THRESHOLD,
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl AnalysisConfig {
    pub fn with_detection_threshold(mut self, threshold: f32) -> Self {
        self.detection_threshold = threshold;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.detection_threshold) {
            return Err(ConfigError::Threshold(self.detection_threshold));
        }
        if self.top_k == 0 {
            return Err(ConfigError::TopK);
        }
        Ok(())
    }

    /// Whether `confidence` clears the detection threshold.
    pub fn is_detected(&self, confidence: f32) -> bool {
        confidence >= self.detection_threshold
    }
}
