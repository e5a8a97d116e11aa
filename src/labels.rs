//! Species label table.
//!
//! The label file is plain UTF-8 text with one label per line. Line order is
//! the only contract: label `i` names model output `i`.

use crate::error::ClassifierError;
use std::ops::Index;
use std::path::Path;
use tracing::debug;

/// Ordered, immutable list of species names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    labels: Vec<String>,
}

impl LabelTable {
    /// Load a label table from a text file.
    ///
    /// Surrounding whitespace is stripped and empty lines are dropped.
    /// Duplicates are kept.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|source| ClassifierError::AssetLoad {
                path: path.to_path_buf(),
                source,
            })?;
        let table = Self::parse(&contents);
        debug!("Loaded {} labels from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn parse(contents: &str) -> Self {
        let labels = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { labels }
    }

    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

impl Index<usize> for LabelTable {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.labels[index]
    }
}
