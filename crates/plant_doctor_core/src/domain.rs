//! crates/plant_doctor_core/src/domain.rs
//!
//! Defines the core data structures for the application.
//! The serde attributes pin the persisted JSON shape (camelCase fields and the
//! provider's status literals), so blobs written by earlier clients still load.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identifier of an `AnalysisRecord`. New records get a v4 UUID, but
/// any string read back from storage is accepted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Overall health verdict returned by the vision provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum HealthStatus {
    Healthy,
    #[serde(rename = "Disease Detected")]
    DiseaseDetected,
    Warning,
}

/// How serious the detected problem is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
}

/// A single plant diagnosis. Never mutated after construction; History and
/// Collection hold copies that share the same `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub id: RecordId,
    /// Creation time in epoch milliseconds.
    pub timestamp: i64,
    /// The photographed image as a self-contained data URI.
    pub image_url: String,
    pub plant_name: String,
    pub health_status: HealthStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disease_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub description: String,
    pub treatment_steps: Vec<String>,
    pub preventive_tips: Vec<String>,
    pub severity: Severity,
}

// Represents how demanding a library plant is to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum CareLevel {
    Easy,
    Moderate,
    Challenging,
}

/// An entry of the static plant encyclopedia.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct LibraryPlant {
    pub id: String,
    pub name: String,
    pub scientific_name: String,
    pub category: String,
    pub care_level: CareLevel,
    pub light: String,
    pub water: String,
    pub soil: String,
    pub common_issues: Vec<String>,
    pub description: String,
    pub image: String,
}
