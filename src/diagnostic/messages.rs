//! Message types for the remote diagnostic service.
//!
//! The service answers `POST /process-image` with a status envelope wrapping
//! an optional data object. Every field on the wire may be missing, and
//! consumers must cope with that; nothing here is required at deserialization
//! time. Unknown fields are ignored.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Shown when the service returned neither care recommendations nor an error.
pub const NO_TIPS_MESSAGE: &str = "No AI care tips received. Please try again.";

/// Top-level response envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessResponse {
    /// "success" or "error"
    pub status: Option<String>,
    /// Human readable status message
    pub message: Option<String>,
    /// Payload, present on success
    pub data: Option<ProcessData>,
}

/// Payload of a processed image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessData {
    /// Species name as received by the server
    pub species_name: Option<String>,
    /// Structured diagnostic
    pub diagnostic: Option<DiagnosticResult>,
    /// Name under which the server stored the upload
    pub filename: Option<String>,
    /// Size of the uploaded image in bytes
    pub size_bytes: Option<u64>,
    /// Decoded width of the uploaded image
    pub width: Option<u32>,
    /// Decoded height of the uploaded image
    pub height: Option<u32>,
    /// Server timestamp (ISO 8601)
    pub received_at: Option<String>,
}

/// Structured care diagnostic for a validated species.
///
/// The absence of `care_recommendations` and the presence of `error` usually
/// go together but are not exclusive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticResult {
    pub validated_species: Option<String>,
    pub visible_symptoms: Option<Vec<String>>,
    pub likely_causes: Option<Vec<String>>,
    pub care_recommendations: Option<String>,
    pub urgency_level: Option<String>,
    pub error: Option<String>,
    /// Unparsed model output, sent when the server could not structure it
    pub raw_output: Option<String>,
}

impl DiagnosticResult {
    /// Text to show the user: care recommendations, else the error, else a
    /// generic fallback.
    pub fn care_tips(&self) -> &str {
        self.care_recommendations
            .as_deref()
            .or(self.error.as_deref())
            .unwrap_or(NO_TIPS_MESSAGE)
    }

    pub fn symptoms(&self) -> &[String] {
        self.visible_symptoms.as_deref().unwrap_or_default()
    }

    pub fn causes(&self) -> &[String] {
        self.likely_causes.as_deref().unwrap_or_default()
    }

    /// The urgency tag, if it is one of the known levels.
    pub fn urgency(&self) -> Option<UrgencyLevel> {
        self.urgency_level.as_deref().and_then(UrgencyLevel::parse)
    }
}

/// Urgency tag attached to a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrgencyLevel {
    /// Plant looks generally fine, at most cosmetic issues
    Low,
    /// Moderate stress that should be fixed soon
    Medium,
    /// Serious danger or rapid decline
    High,
}

impl UrgencyLevel {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "low" => Some(UrgencyLevel::Low),
            "medium" => Some(UrgencyLevel::Medium),
            "high" => Some(UrgencyLevel::High),
            _ => None,
        }
    }
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            UrgencyLevel::Low => "low",
            UrgencyLevel::Medium => "medium",
            UrgencyLevel::High => "high",
        };
        write!(f, "{}", tag)
    }
}

/// Response to `GET /health`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HealthStatus {
    pub status: Option<String>,
    pub server: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.as_deref() == Some("healthy")
    }
}
