use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::canonical::FieldSource;
use crate::models::field::FieldDescriptor;
use crate::oracle::OracleSourceType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Profile,
    Preferences,
    Resume,
    Correction,
    Unknown,
}

impl From<OracleSourceType> for SourceType {
    fn from(source: OracleSourceType) -> Self {
        match source {
            OracleSourceType::Profile => SourceType::Profile,
            OracleSourceType::Preferences => SourceType::Preferences,
            OracleSourceType::Resume => SourceType::Resume,
            OracleSourceType::Unknown => SourceType::Unknown,
        }
    }
}

impl From<FieldSource> for SourceType {
    fn from(source: FieldSource) -> Self {
        match source {
            FieldSource::Profile(_) => SourceType::Profile,
            FieldSource::Preferences(_) => SourceType::Preferences,
            FieldSource::None => SourceType::Unknown,
        }
    }
}

/// The final answer for one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub field_id: String,
    pub value: Option<String>,
    pub autofill: bool,
    pub confidence: f64,
    pub source_type: SourceType,
    pub source_ref: Option<String>,
}

impl Decision {
    /// The universal safe default: no value, nothing filled.
    pub fn unresolved(field_id: &str, confidence: f64) -> Self {
        Self {
            field_id: field_id.to_string(),
            value: None,
            autofill: false,
            confidence: confidence.clamp(0.0, 1.0),
            source_type: SourceType::Unknown,
            source_ref: None,
        }
    }

    pub fn autofilled(
        field_id: &str,
        value: String,
        confidence: f64,
        source_type: SourceType,
        source_ref: Option<String>,
    ) -> Self {
        Self {
            field_id: field_id.to_string(),
            value: Some(value),
            autofill: true,
            confidence: confidence.clamp(0.0, 1.0),
            source_type,
            source_ref,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobInfo {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnswerRequest {
    #[serde(default)]
    pub job_info: Option<JobInfo>,
    #[serde(default)]
    pub profile: Map<String, Value>,
    #[serde(default)]
    pub preferences: Map<String, Value>,
    #[serde(default)]
    pub resume_id: Option<Uuid>,
    pub fields: Vec<FieldDescriptor>,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub answers: Vec<Decision>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let req: AnswerRequest =
            serde_json::from_str(r#"{"fields": [{"id": "f1", "label": "Email"}]}"#).unwrap();
        assert!(req.job_info.is_none());
        assert!(req.profile.is_empty());
        assert!(req.resume_id.is_none());
        assert_eq!(req.fields[0].label, "Email");
    }

    #[test]
    fn test_decision_wire_format() {
        let json = serde_json::to_value(Decision::unresolved("f1", 0.3)).unwrap();
        assert_eq!(json["value"], Value::Null);
        assert_eq!(json["autofill"], false);
        assert_eq!(json["source_type"], "unknown");
    }
}
