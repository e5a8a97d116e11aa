//! Species classifier.
//!
//! Composes the tensor builder, the model runtime and the label table into a
//! single `classify` call returning ranked predictions.

use crate::backends::BackendConfig;
use crate::config::DEFAULT_TOP_K;
use crate::error::ClassifierError;
use crate::inference::model::ModelRuntime;
use crate::inference::tensor::ImageTensor;
use crate::labels::LabelTable;
use crate::types::{Prediction, RankedResult};
use image::DynamicImage;
use std::cmp::Ordering;
use std::path::PathBuf;
use tracing::debug;

/// Where to find the model and label assets.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub backend: BackendConfig,
    pub labels_path: PathBuf,
}

impl ClassifierConfig {
    /// A TFLite model with its label file, at the default input size.
    pub fn tflite<M: Into<PathBuf>, L: Into<PathBuf>>(model_path: M, labels_path: L) -> Self {
        Self {
            backend: BackendConfig::tflite(model_path),
            labels_path: labels_path.into(),
        }
    }
}

#[derive(Debug)]
pub struct Classifier {
    runtime: ModelRuntime,
    labels: LabelTable,
}

impl Classifier {
    /// Load the label table, then the model.
    ///
    /// A model whose declared output length differs from the number of labels
    /// is rejected here instead of failing on every call.
    pub fn load(config: &ClassifierConfig) -> Result<Self, ClassifierError> {
        let labels = LabelTable::load(&config.labels_path)?;
        let runtime = ModelRuntime::load(config.backend.clone())?;
        Self::new(runtime, labels)
    }

    pub fn new(runtime: ModelRuntime, labels: LabelTable) -> Result<Self, ClassifierError> {
        if let Some(len) = runtime.output_len() {
            if len != labels.len() {
                return Err(ClassifierError::ModelLoad(format!(
                    "model has {} outputs but the label table has {} entries",
                    len,
                    labels.len()
                )));
            }
        }
        Ok(Self { runtime, labels })
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn runtime(&self) -> &ModelRuntime {
        &self.runtime
    }

    /// Classify with the default top-K.
    pub fn classify_default(&self, image: &DynamicImage) -> Result<RankedResult, ClassifierError> {
        self.classify(image, DEFAULT_TOP_K)
    }

    pub fn classify(
        &self,
        image: &DynamicImage,
        top_k: usize,
    ) -> Result<RankedResult, ClassifierError> {
        let tensor = ImageTensor::from_image_with_size(image, self.runtime.input_size())?;
        let probabilities = self.runtime.run(&tensor)?;
        let ranked = Self::rank(&self.labels, &probabilities, top_k)?;
        debug!("{}", ranked);
        Ok(ranked)
    }

    /// Pair each output with its label, clamp to `[0, 1]`, sort and truncate.
    ///
    /// The sort is stable, so equal confidences stay in label order.
    pub fn rank(
        labels: &LabelTable,
        probabilities: &[f32],
        top_k: usize,
    ) -> Result<RankedResult, ClassifierError> {
        if probabilities.len() != labels.len() {
            return Err(ClassifierError::Inference(format!(
                "model returned {} values for {} labels",
                probabilities.len(),
                labels.len()
            )));
        }

        let mut predictions: Vec<Prediction> = labels
            .iter()
            .zip(probabilities)
            .enumerate()
            .map(|(index, (label, &p))| Prediction {
                index,
                label: label.to_string(),
                confidence: clamp_confidence(p),
            })
            .collect();

        predictions.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
        });
        predictions.truncate(top_k);

        Ok(RankedResult::new(predictions))
    }
}

fn clamp_confidence(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        // `+ 0.0` folds a negative zero into positive zero.
        value.clamp(0.0, 1.0) + 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::FixedBackend;
    use image::{Rgb, RgbImage};

    fn labels(names: &[&str]) -> LabelTable {
        LabelTable::from_labels(names.iter().copied())
    }

    fn leaf() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(300, 200, Rgb([40, 160, 60])))
    }

    fn ranked_pairs(result: &RankedResult) -> Vec<(&str, f32)> {
        result
            .iter()
            .map(|p| (p.label.as_str(), p.confidence))
            .collect()
    }

    #[test]
    fn test_rose_tulip_scenario() {
        let classifier = Classifier::new(
            ModelRuntime::from_backend(Box::new(FixedBackend::new(vec![0.2, 0.8]))),
            labels(&["Rose", "Tulip"]),
        )
        .unwrap();

        let result = classifier.classify(&leaf(), 3).unwrap();
        assert_eq!(ranked_pairs(&result), vec![("Tulip", 0.8), ("Rose", 0.2)]);
        assert_eq!(result.best().unwrap().index, 1);
    }

    #[test]
    fn test_truncates_to_top_k() {
        let table = labels(&["A", "B", "C", "D", "E"]);
        let result = Classifier::rank(&table, &[0.1, 0.5, 0.05, 0.3, 0.05], 3).unwrap();

        assert_eq!(result.len(), 3);
        assert_eq!(
            ranked_pairs(&result),
            vec![("B", 0.5), ("D", 0.3), ("A", 0.1)]
        );
    }

    #[test]
    fn test_ties_keep_label_order() {
        let table = labels(&["Fern", "Ivy", "Moss", "Palm"]);
        let result = Classifier::rank(&table, &[0.25, 0.25, 0.25, 0.25], 4).unwrap();

        let indices: Vec<usize> = result.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);

        let result = Classifier::rank(&table, &[0.1, 0.4, 0.1, 0.4], 3).unwrap();
        let indices: Vec<usize> = result.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![1, 3, 0]);
    }

    #[test]
    fn test_output_is_sorted_non_increasing() {
        let table = LabelTable::from_labels((0..50).map(|i| format!("species-{i}")));
        let probabilities: Vec<f32> = (0..50).map(|i| ((i * 37) % 50) as f32 / 50.0).collect();

        for top_k in [1, 3, 10, 50, 80] {
            let result = Classifier::rank(&table, &probabilities, top_k).unwrap();
            assert_eq!(result.len(), top_k.min(50));
            for pair in result.as_slice().windows(2) {
                assert!(pair[0].confidence >= pair[1].confidence);
                if pair[0].confidence == pair[1].confidence {
                    assert!(pair[0].index < pair[1].index);
                }
            }
        }
    }

    #[test]
    fn test_fewer_labels_than_top_k() {
        let result = Classifier::rank(&labels(&["Only"]), &[0.9], 3).unwrap();
        assert_eq!(ranked_pairs(&result), vec![("Only", 0.9)]);

        let empty = Classifier::rank(&LabelTable::default(), &[], 3).unwrap();
        assert!(empty.is_empty());
        assert!(empty.best().is_none());
    }

    #[test]
    fn test_confidences_are_clamped() {
        let table = labels(&["Low", "High", "Broken", "Negative"]);
        let result = Classifier::rank(&table, &[0.3, 1.7, f32::NAN, -0.0], 4).unwrap();

        assert_eq!(
            ranked_pairs(&result),
            vec![("High", 1.0), ("Low", 0.3), ("Broken", 0.0), ("Negative", 0.0)]
        );
        assert!(result.iter().all(|p| (0.0..=1.0).contains(&p.confidence)));
    }

    #[test]
    fn test_length_mismatch_is_inference_error() {
        let classifier = Classifier {
            runtime: ModelRuntime::from_backend(Box::new(
                FixedBackend::new(vec![0.5, 0.5, 0.0]).without_declared_len(),
            )),
            labels: labels(&["Rose", "Tulip"]),
        };

        assert!(matches!(
            classifier.classify(&leaf(), 3),
            Err(ClassifierError::Inference(_))
        ));
    }

    #[test]
    fn test_declared_length_checked_at_construction() {
        let result = Classifier::new(
            ModelRuntime::from_backend(Box::new(FixedBackend::new(vec![0.5, 0.5, 0.0]))),
            labels(&["Rose", "Tulip"]),
        );
        assert!(matches!(result, Err(ClassifierError::ModelLoad(_))));
    }

    #[test]
    fn test_backend_errors_propagate() {
        let classifier = Classifier::new(
            ModelRuntime::from_backend(Box::new(FixedBackend::failing("interpreter crashed"))),
            labels(&["Rose", "Tulip"]),
        )
        .unwrap();

        match classifier.classify(&leaf(), 3) {
            Err(ClassifierError::Inference(msg)) => assert!(msg.contains("interpreter crashed")),
            other => panic!("Expected Inference error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_reports_missing_labels() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClassifierConfig::tflite(
            dir.path().join("model.tflite"),
            dir.path().join("labels.txt"),
        );

        assert!(matches!(
            Classifier::load(&config),
            Err(ClassifierError::AssetLoad { .. })
        ));
    }
}
