//! Common types shared by the classifier and the analysis controller.
//!
//! These are the values that flow out of the on-device pipeline: a single
//! [`Prediction`] per class, and the [`RankedResult`] the classifier returns
//! after sorting and truncating them.

use serde::Serialize;
use std::fmt;

/// A single class prediction.
///
/// `index` is the position of the class in the label table and in the model
/// output vector. The confidence is always within `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Index of the class in the label table
    pub index: usize,
    /// Species name from the label table
    pub label: String,
    /// Model-assigned probability (0.0 to 1.0)
    pub confidence: f32,
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={:.2}%", self.label, self.confidence * 100.0)
    }
}

/// Predictions sorted by descending confidence and truncated to top-K.
///
/// Equal confidences keep ascending label-index order, so the ranking is
/// deterministic for a given model output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RankedResult {
    predictions: Vec<Prediction>,
}

impl RankedResult {
    pub(crate) fn new(predictions: Vec<Prediction>) -> Self {
        Self { predictions }
    }

    /// The highest ranked prediction, if any.
    pub fn best(&self) -> Option<&Prediction> {
        self.predictions.first()
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Prediction> {
        self.predictions.iter()
    }

    pub fn as_slice(&self) -> &[Prediction] {
        &self.predictions
    }

    pub fn into_vec(self) -> Vec<Prediction> {
        self.predictions
    }
}

impl<'a> IntoIterator for &'a RankedResult {
    type Item = &'a Prediction;
    type IntoIter = std::slice::Iter<'a, Prediction>;

    fn into_iter(self) -> Self::IntoIter {
        self.predictions.iter()
    }
}

impl fmt::Display for RankedResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Classification results: ")?;
        for prediction in &self.predictions {
            write!(f, "{} ", prediction)?;
        }
        Ok(())
    }
}
