//! Wire format of the remote scoring backend.

use crate::core::{confidence, AssessmentSource, Factor, PatientData, RiskAssessment};
use crate::utils::error::{Result, TriageError};
use serde::Serialize;
use serde_json::Value;

pub const PREDICT_PATH: &str = "/api/predict";
pub const PARSE_DOCUMENT_PATH: &str = "/api/parse-emr";

pub const DEFAULT_DEPARTMENT: &str = "General Care";
pub const DEFAULT_WAIT_TIME: &str = "TBD";

const FACTOR_TOP_VALUE: i32 = 85;
const FACTOR_STEP: i32 = 12;
const FACTOR_FLOOR: i32 = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiPatientData {
    pub age: u32,
    pub gender: String,
    pub symptoms: Vec<String>,
    pub blood_pressure: String,
    pub heart_rate: u32,
    pub temperature: f64,
    pub pre_existing_conditions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictRequest {
    pub patient_data: ApiPatientData,
}

impl From<&PatientData> for ApiPatientData {
    fn from(patient: &PatientData) -> Self {
        Self {
            age: patient.age,
            gender: patient.gender.title_case().to_string(),
            symptoms: patient.symptoms.iter().map(|s| to_remote_token(s)).collect(),
            blood_pressure: format!("{}/{}", patient.systolic, patient.diastolic),
            heart_rate: patient.heart_rate,
            temperature: patient.temperature,
            pre_existing_conditions: patient.conditions.iter().map(|c| to_remote_token(c)).collect(),
        }
    }
}

impl From<&PatientData> for PredictRequest {
    fn from(patient: &PatientData) -> Self {
        Self {
            patient_data: ApiPatientData::from(patient),
        }
    }
}

/// Remote vocabulary uses underscore-separated identifiers.
fn to_remote_token(id: &str) -> String {
    id.replace('-', "_")
}

/// Synthetic magnitude for the factor at `index`: 85, 73, 61, ... never below 20.
pub fn synthetic_factor_value(index: usize) -> u8 {
    let index = i32::try_from(index).unwrap_or(i32::MAX / FACTOR_STEP);
    (FACTOR_TOP_VALUE - index.saturating_mul(FACTOR_STEP)).max(FACTOR_FLOOR) as u8
}

/// Reconcile a successful predict response with the local rule signal.
///
/// Only a missing `risk_analysis` object is an error; every other missing or
/// ill-typed field is defaulted.
pub fn interpret_prediction(patient: &PatientData, body: &Value) -> Result<RiskAssessment> {
    let analysis = body
        .get("risk_analysis")
        .filter(|v| v.is_object())
        .ok_or_else(|| TriageError::MalformedResponse {
            message: "response has no risk_analysis object".to_string(),
        })?;
    let recommendation = body.get("triage_recommendation");

    let score_pct = confidence::to_percent(confidence::json_number(analysis.get("risk_score")));
    let confidence_field_pct =
        confidence::to_percent(confidence::json_number(analysis.get("confidence")));
    let remote_pct = if score_pct > 0 {
        score_pct
    } else {
        confidence_field_pct
    };
    let blended = confidence::blend(patient, remote_pct);

    let raw_level = analysis
        .get("risk_level")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let level = confidence::normalize_level(raw_level, blended);

    tracing::debug!(
        raw_level,
        remote_pct,
        blended,
        normalized = %level,
        "Interpreted remote prediction"
    );

    let factors = string_list(analysis.get("critical_factors"))
        .into_iter()
        .enumerate()
        .map(|(index, label)| Factor::new(label.clone(), synthetic_factor_value(index), label))
        .collect();

    let guidance = string_list(recommendation.and_then(|r| r.get("immediate_actions")));

    let department = recommendation
        .and_then(|r| r.get("department"))
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_DEPARTMENT)
        .to_string();
    let wait_time = recommendation
        .and_then(|r| r.get("estimated_wait_time"))
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_WAIT_TIME)
        .to_string();

    Ok(RiskAssessment {
        level,
        confidence: blended,
        source: AssessmentSource::RemoteModel,
        factors,
        guidance,
        department,
        wait_time,
    })
}

/// String entries of a JSON array; anything else yields an empty list.
fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Gender, RiskLevel};
    use serde_json::json;

    fn low_risk_patient() -> PatientData {
        PatientData {
            age: 34,
            gender: Gender::Female,
            systolic: 118,
            diastolic: 76,
            heart_rate: 68,
            temperature: 98.4,
            ..PatientData::default()
        }
        .with_symptoms(["headache"])
    }

    #[test]
    fn test_request_payload_shape() {
        let patient = PatientData::default()
            .with_symptoms(["chest-pain", "shortness-of-breath"])
            .with_conditions(["heart-disease"]);
        let request = PredictRequest::from(&patient);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value,
            json!({
                "patient_data": {
                    "age": 45,
                    "gender": "Male",
                    "symptoms": ["chest_pain", "shortness_of_breath"],
                    "blood_pressure": "120/80",
                    "heart_rate": 72,
                    "temperature": 98.6,
                    "pre_existing_conditions": ["heart_disease"]
                }
            })
        );
    }

    #[test]
    fn test_synthetic_factor_values() {
        let values: Vec<u8> = (0..8).map(synthetic_factor_value).collect();
        assert_eq!(values, vec![85, 73, 61, 49, 37, 25, 20, 20]);
        assert_eq!(synthetic_factor_value(usize::MAX), 20);
    }

    #[test]
    fn test_interpret_blends_and_downgrades() {
        let body = json!({
            "success": true,
            "risk_analysis": {
                "risk_level": "high",
                "risk_score": 0.82,
                "confidence": 0.9,
                "critical_factors": ["Hypertension", "Age"]
            },
            "triage_recommendation": {
                "priority": 1,
                "department": "Cardiology",
                "estimated_wait_time": "Immediate",
                "immediate_actions": ["Call a nurse"]
            },
            "timestamp": "2026-01-01T00:00:00Z"
        });

        let result = interpret_prediction(&low_risk_patient(), &body).unwrap();
        assert_eq!(result.confidence, 27);
        assert_eq!(result.level, RiskLevel::Medium);
        assert_eq!(result.source, AssessmentSource::RemoteModel);
        assert_eq!(result.factors[0], Factor::new("Hypertension", 85, "Hypertension"));
        assert_eq!(result.factors[1].value, 73);
        assert_eq!(result.guidance, vec!["Call a nurse".to_string()]);
        assert_eq!(result.department, "Cardiology");
        assert_eq!(result.wait_time, "Immediate");
    }

    #[test]
    fn test_zero_risk_score_falls_back_to_confidence_field() {
        let body = json!({
            "risk_analysis": {"risk_level": "low", "risk_score": 0, "confidence": 0.5}
        });
        // local 3, remote 50 -> round(2.1 + 15.0)
        let result = interpret_prediction(&low_risk_patient(), &body).unwrap();
        assert_eq!(result.confidence, 17);
        assert_eq!(result.level, RiskLevel::Low);
    }

    #[test]
    fn test_missing_recommendation_uses_defaults() {
        let body = json!({
            "risk_analysis": {
                "risk_level": "medium",
                "risk_score": 4500,
                "critical_factors": "not a list"
            },
            "triage_recommendation": {"immediate_actions": [1, 2]}
        });

        let result = interpret_prediction(&low_risk_patient(), &body).unwrap();
        assert!(result.factors.is_empty());
        assert!(result.guidance.is_empty());
        assert_eq!(result.department, DEFAULT_DEPARTMENT);
        assert_eq!(result.wait_time, DEFAULT_WAIT_TIME);
        // remote 45, local 3 -> round(2.1 + 13.5) = 16, MEDIUM with <= 20 is LOW
        assert_eq!(result.confidence, 16);
        assert_eq!(result.level, RiskLevel::Low);
    }

    #[test]
    fn test_missing_risk_analysis_is_malformed() {
        let err = interpret_prediction(&low_risk_patient(), &json!({"detail": "boom"})).unwrap_err();
        assert!(matches!(err, TriageError::MalformedResponse { .. }));
    }
}
