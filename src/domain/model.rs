use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

pub const CHEST_PAIN: &str = "chest-pain";
pub const SHORTNESS_OF_BREATH: &str = "shortness-of-breath";
pub const HEART_DISEASE: &str = "heart-disease";
pub const ASTHMA: &str = "asthma";

pub const AGE_RANGE: (u32, u32) = (0, 120);
pub const SYSTOLIC_RANGE: (u32, u32) = (0, 300);
pub const DIASTOLIC_RANGE: (u32, u32) = (0, 200);
pub const HEART_RATE_RANGE: (u32, u32) = (0, 250);
pub const TEMPERATURE_RANGE: (f64, f64) = (90.0, 110.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    #[serde(alias = "Male")]
    Male,
    #[serde(alias = "Female")]
    Female,
    #[serde(alias = "Other")]
    Other,
}

impl Gender {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            "other" => Some(Gender::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }

    /// Capitalized form used by the remote scorer ("Male", "Female", "Other").
    pub fn title_case(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

/// Vital signs, symptoms and history for one patient.
///
/// Numeric fields are expected to be inside their clamp ranges before any
/// scoring runs; use [`PatientData::clamped`] on untrusted input.
/// Fields missing from a JSON record take the intake defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct PatientData {
    pub age: u32,
    pub gender: Gender,
    pub symptoms: BTreeSet<String>,
    pub systolic: u32,
    pub diastolic: u32,
    pub heart_rate: u32,
    pub temperature: f64,
    pub conditions: BTreeSet<String>,
}

impl Default for PatientData {
    fn default() -> Self {
        Self {
            age: 45,
            gender: Gender::Male,
            symptoms: BTreeSet::new(),
            systolic: 120,
            diastolic: 80,
            heart_rate: 72,
            temperature: 98.6,
            conditions: BTreeSet::new(),
        }
    }
}

impl PatientData {
    /// Parse a complete patient record.
    ///
    /// Unlike [`PartialPatientData::from_json`], a wrong-typed or unknown key is
    /// an error instead of being dropped, so a vital is never silently replaced
    /// by its default.
    pub fn from_record_json(content: &str) -> Result<Self> {
        let patient: PatientData = serde_json::from_str(content)?;
        Ok(patient.clamped())
    }

    pub fn from_record_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_record_json(&content)
    }

    pub fn clamped(mut self) -> Self {
        self.age = self.age.clamp(AGE_RANGE.0, AGE_RANGE.1);
        self.systolic = self.systolic.clamp(SYSTOLIC_RANGE.0, SYSTOLIC_RANGE.1);
        self.diastolic = self.diastolic.clamp(DIASTOLIC_RANGE.0, DIASTOLIC_RANGE.1);
        self.heart_rate = self.heart_rate.clamp(HEART_RATE_RANGE.0, HEART_RATE_RANGE.1);
        self.temperature = clamp_temperature(self.temperature);
        self
    }

    pub fn has_symptom(&self, id: &str) -> bool {
        self.symptoms.contains(id)
    }

    pub fn has_condition(&self, id: &str) -> bool {
        self.conditions.contains(id)
    }

    pub fn with_symptoms<I, S>(mut self, symptoms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.symptoms = symptoms.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_conditions<I, S>(mut self, conditions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conditions = conditions.into_iter().map(Into::into).collect();
        self
    }
}

fn clamp_temperature(value: f64) -> f64 {
    if value.is_nan() {
        return TEMPERATURE_RANGE.0;
    }
    value.clamp(TEMPERATURE_RANGE.0, TEMPERATURE_RANGE.1)
}

/// Whatever subset of [`PatientData`] a document parser managed to extract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialPatientData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<BTreeSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub systolic: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diastolic: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<BTreeSet<String>>,
}

impl PartialPatientData {
    /// Keep recognized, well-typed fields from a parser response and drop the rest.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        let int_field = |key: &str, range: (u32, u32)| {
            obj.get(key)
                .and_then(as_integer)
                .map(|n| n.clamp(range.0 as i64, range.1 as i64) as u32)
        };

        Self {
            age: int_field("age", AGE_RANGE),
            gender: obj.get("gender").and_then(|v| v.as_str()).and_then(Gender::parse),
            symptoms: obj.get("symptoms").and_then(string_set),
            systolic: int_field("systolic", SYSTOLIC_RANGE),
            diastolic: int_field("diastolic", DIASTOLIC_RANGE),
            heart_rate: int_field("heartRate", HEART_RATE_RANGE),
            temperature: obj
                .get("temperature")
                .and_then(|v| v.as_f64())
                .filter(|t| t.is_finite())
                .map(clamp_temperature),
            conditions: obj.get("conditions").and_then(string_set),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlay every extracted field onto `base`.
    pub fn merge_into(&self, mut base: PatientData) -> PatientData {
        if let Some(age) = self.age {
            base.age = age;
        }
        if let Some(gender) = self.gender {
            base.gender = gender;
        }
        if let Some(symptoms) = &self.symptoms {
            base.symptoms = symptoms.clone();
        }
        if let Some(systolic) = self.systolic {
            base.systolic = systolic;
        }
        if let Some(diastolic) = self.diastolic {
            base.diastolic = diastolic;
        }
        if let Some(heart_rate) = self.heart_rate {
            base.heart_rate = heart_rate;
        }
        if let Some(temperature) = self.temperature {
            base.temperature = temperature;
        }
        if let Some(conditions) = &self.conditions {
            base.conditions = conditions.clone();
        }
        base.clamped()
    }
}

fn as_integer(value: &serde_json::Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
}

fn string_set(value: &serde_json::Value) -> Option<BTreeSet<String>> {
    let items = value.as_array()?;
    let set: BTreeSet<String> = items
        .iter()
        .filter_map(|item| item.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if set.is_empty() {
        None
    } else {
        Some(set)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "HIGH" => Some(RiskLevel::High),
            "MEDIUM" => Some(RiskLevel::Medium),
            "LOW" => Some(RiskLevel::Low),
            _ => None,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::High => "HIGH",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::Low => "LOW",
        };
        f.write_str(label)
    }
}

/// Which signal produced an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssessmentSource {
    #[serde(rename = "ML Model")]
    RuleModel,
    #[serde(rename = "Safety Rule Override")]
    SafetyOverride,
    #[serde(rename = "SLM Model")]
    RemoteModel,
}

impl fmt::Display for AssessmentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AssessmentSource::RuleModel => "ML Model",
            AssessmentSource::SafetyOverride => "Safety Rule Override",
            AssessmentSource::RemoteModel => "SLM Model",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Factor {
    pub label: String,
    pub value: u8,
    pub detail: String,
}

impl Factor {
    pub fn new(label: impl Into<String>, value: u8, detail: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub confidence: u8,
    pub source: AssessmentSource,
    pub factors: Vec<Factor>,
    pub guidance: Vec<String>,
    pub department: String,
    pub wait_time: String,
}
