//! crates/plant_doctor_core/src/diagnosis.rs
//!
//! The Diagnosis Requester: turns an encoded image into an `AnalysisRecord`
//! by delegating to the `VisionAnalysisService` port and validating the
//! provider's JSON against a fixed schema before anything reaches the domain.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::domain::{AnalysisRecord, HealthStatus, RecordId, Severity};
use crate::ports::{PortError, VisionAnalysisService};

/// The fixed instruction sent alongside every image.
pub const ANALYSIS_INSTRUCTION: &str = "Analyze this plant image.
1. Identify the plant species.
2. Determine if it is healthy or diseased.
3. If diseased, identify the disease and provide treatment steps.
4. Provide long-term preventive care tips.
Return the analysis in structured JSON format.";

/// The only failure message a user ever sees for a diagnosis.
pub const ANALYSIS_FAILED_MESSAGE: &str =
    "We couldn't analyze the image. Please try again with a clearer photo.";

const DEFAULT_MIME_TYPE: &str = "image/jpeg";

//=========================================================================================
// Error Type
//=========================================================================================

/// Any failure between submitting an image and receiving a schema-conforming
/// response. The cause is kept for logs only; `Display` is the generic message.
#[derive(Debug, thiserror::Error)]
#[error("{}", ANALYSIS_FAILED_MESSAGE)]
pub struct AnalysisError {
    detail: String,
}

impl AnalysisError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }

    /// The underlying cause, for logging.
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl From<PortError> for AnalysisError {
    fn from(e: PortError) -> Self {
        Self::new(e.to_string())
    }
}

//=========================================================================================
// Encoded Image
//=========================================================================================

/// An image payload as captured from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    bytes: Vec<u8>,
    mime_type: String,
}

impl EncodedImage {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self::new(bytes, DEFAULT_MIME_TYPE)
    }

    /// Parses a browser-style `data:<mime>;base64,<payload>` URI.
    pub fn from_data_uri(uri: &str) -> Result<Self, AnalysisError> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| AnalysisError::new("image is not a data URI"))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| AnalysisError::new("data URI has no payload"))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| AnalysisError::new("data URI is not base64 encoded"))?;
        let mime_type = if mime_type.is_empty() {
            DEFAULT_MIME_TYPE
        } else {
            mime_type
        };
        let bytes = BASE64_STANDARD
            .decode(payload.trim())
            .map_err(|e| AnalysisError::new(format!("invalid base64 image payload: {}", e)))?;
        Ok(Self::new(bytes, mime_type))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_base64(&self) -> String {
        BASE64_STANDARD.encode(&self.bytes)
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}

//=========================================================================================
// Provider Response Schema
//=========================================================================================

/// The JSON Schema the provider is asked to conform to.
pub fn diagnosis_response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "plantName": {
                "type": "string",
                "description": "Common name of the plant identified"
            },
            "healthStatus": {
                "type": "string",
                "enum": ["Healthy", "Disease Detected", "Warning"]
            },
            "diseaseName": {
                "type": "string",
                "description": "Scientific or common name of the disease"
            },
            "confidence": {
                "type": "number",
                "description": "Confidence level between 0 and 1"
            },
            "description": {
                "type": "string",
                "description": "Short description of the plant's current state"
            },
            "treatmentSteps": {
                "type": "array",
                "items": { "type": "string" },
                "description": "List of actionable steps to treat the plant"
            },
            "preventiveTips": {
                "type": "array",
                "items": { "type": "string" },
                "description": "List of tips to prevent future issues"
            },
            "severity": {
                "type": "string",
                "enum": ["Low", "Medium", "High", "None"]
            }
        },
        "required": [
            "plantName",
            "healthStatus",
            "description",
            "treatmentSteps",
            "preventiveTips",
            "severity"
        ]
    })
}

/// A provider response that passed schema validation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDiagnosis {
    pub plant_name: String,
    pub health_status: HealthStatus,
    #[serde(default)]
    pub disease_name: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    pub description: String,
    pub treatment_steps: Vec<String>,
    pub preventive_tips: Vec<String>,
    pub severity: Severity,
}

impl ProviderDiagnosis {
    /// Parses and validates the provider's raw JSON text.
    ///
    /// Status and severity combinations are accepted as given, and
    /// `confidence` is not range-checked.
    pub fn parse(raw: &str) -> Result<Self, AnalysisError> {
        let diagnosis: Self = serde_json::from_str(raw.trim())
            .map_err(|e| AnalysisError::new(format!("provider response rejected: {}", e)))?;
        if diagnosis.plant_name.trim().is_empty() {
            return Err(AnalysisError::new("provider response has an empty plantName"));
        }
        Ok(diagnosis)
    }

    pub fn into_record(self, id: RecordId, timestamp: i64, image_url: String) -> AnalysisRecord {
        AnalysisRecord {
            id,
            timestamp,
            image_url,
            plant_name: self.plant_name,
            health_status: self.health_status,
            disease_name: self.disease_name,
            confidence: self.confidence,
            description: self.description,
            treatment_steps: self.treatment_steps,
            preventive_tips: self.preventive_tips,
            severity: self.severity,
        }
    }
}

//=========================================================================================
// The Requester
//=========================================================================================

/// Invokes the vision collaborator and normalizes its output. Performs no
/// retries and never touches the Retention Store.
#[derive(Clone)]
pub struct DiagnosisRequester {
    vision: Arc<dyn VisionAnalysisService>,
}

impl DiagnosisRequester {
    pub fn new(vision: Arc<dyn VisionAnalysisService>) -> Self {
        Self { vision }
    }

    pub async fn analyze(&self, image: &EncodedImage) -> Result<AnalysisRecord, AnalysisError> {
        if image.is_empty() {
            return Err(AnalysisError::new("image payload is empty"));
        }

        let raw = self
            .vision
            .analyze_image(image, ANALYSIS_INSTRUCTION)
            .await
            .map_err(|e| {
                warn!("Vision provider call failed: {}", e);
                AnalysisError::from(e)
            })?;

        let diagnosis = ProviderDiagnosis::parse(&raw).map_err(|e| {
            warn!("Vision provider returned an invalid diagnosis: {}", e.detail());
            e
        })?;

        let record = diagnosis.into_record(
            RecordId::generate(),
            Utc::now().timestamp_millis(),
            image.to_data_uri(),
        );
        info!(
            record_id = %record.id,
            plant = %record.plant_name,
            status = ?record.health_status,
            "Diagnosis completed"
        );
        Ok(record)
    }
}
