//! Deterministic, explainable rule-based risk scoring.
//!
//! Every vital sign is interpreted independently into an additive integer
//! score. Signals that contribute emit a [`Factor`]; the final level is picked
//! from score thresholds, with a hard safety override for a hypertensive
//! crisis combined with chest pain.

use crate::core::{AssessmentSource, Factor, PatientData, RiskAnalyzer, RiskAssessment, RiskLevel};
use crate::domain::model::{ASTHMA, CHEST_PAIN, HEART_DISEASE, SHORTNESS_OF_BREATH};
use async_trait::async_trait;

pub const MAX_FACTORS: usize = 5;

const HIGH_SCORE_THRESHOLD: u32 = 120;
const MEDIUM_SCORE_THRESHOLD: u32 = 60;

const HIGH_GUIDANCE: [&str; 4] = [
    "Sit or lie down immediately",
    "Avoid physical exertion",
    "Alert staff if pain worsens",
    "Do not eat or drink",
];

const MEDIUM_GUIDANCE: [&str; 4] = [
    "Rest in a comfortable position",
    "Stay hydrated with water",
    "Report any new symptoms",
    "Avoid strenuous activity",
];

const LOW_GUIDANCE: [&str; 4] = [
    "Continue normal activities",
    "Stay hydrated",
    "Take over-the-counter medication if needed",
    "Return if symptoms worsen",
];

/// Score a patient with the local rule set. Pure and total.
pub fn score(patient: &PatientData) -> RiskAssessment {
    let mut total: u32 = 0;
    let mut factors = Vec::with_capacity(6);

    // Blood pressure
    if patient.systolic >= 180 || patient.diastolic >= 110 {
        total += 85;
        factors.push(Factor::new("Blood Pressure", 85, "Critically High"));
    } else if patient.systolic >= 140 || patient.diastolic >= 90 {
        total += 50;
        factors.push(Factor::new("Blood Pressure", 50, "Elevated"));
    } else {
        factors.push(Factor::new("Blood Pressure", 10, "Normal"));
    }

    // Age
    let age_detail = format!("{} years", patient.age);
    if patient.age >= 65 {
        total += 45;
        factors.push(Factor::new("Age", 45, age_detail));
    } else if patient.age >= 50 {
        total += 25;
        factors.push(Factor::new("Age", 25, age_detail));
    } else {
        factors.push(Factor::new("Age", 10, age_detail));
    }

    let chest_pain = patient.has_symptom(CHEST_PAIN);
    if chest_pain {
        total += 30;
        factors.push(Factor::new("Chest Pain Symptom", 30, "Present"));
    }

    let heart_disease = patient.has_condition(HEART_DISEASE);
    if heart_disease {
        total += 25;
        factors.push(Factor::new("Heart Disease History", 25, "Pre-existing"));
    }

    if patient.heart_rate > 100 || patient.heart_rate < 50 {
        total += 20;
        let detail = if patient.heart_rate > 100 { "Elevated" } else { "Low" };
        factors.push(Factor::new("Heart Rate", 20, detail));
    }

    if patient.temperature >= 102.0 {
        total += 15;
        factors.push(Factor::new("Temperature", 15, "High Fever"));
    } else if patient.temperature >= 100.0 {
        total += 8;
        factors.push(Factor::new("Temperature", 8, "Mild Fever"));
    }

    // Symptom and condition counts only move the score.
    let other_symptoms = patient
        .symptoms
        .iter()
        .filter(|s| s.as_str() != CHEST_PAIN)
        .count();
    if other_symptoms >= 3 {
        total += 15;
    } else if other_symptoms >= 1 {
        total += 5;
    }

    if patient.conditions.len() >= 2 {
        total += 10;
    }

    rank_factors(&mut factors);

    let safety_override = patient.systolic >= 180 && chest_pain;
    let (level, confidence, source) = if safety_override || total >= HIGH_SCORE_THRESHOLD {
        let source = if safety_override {
            AssessmentSource::SafetyOverride
        } else {
            AssessmentSource::RuleModel
        };
        (RiskLevel::High, capped(82 + total / 20, 96), source)
    } else if total >= MEDIUM_SCORE_THRESHOLD {
        (
            RiskLevel::Medium,
            capped(70 + total / 15, 92),
            AssessmentSource::RuleModel,
        )
    } else {
        (
            RiskLevel::Low,
            capped(75 + (100 - total) / 10, 95),
            AssessmentSource::RuleModel,
        )
    };

    tracing::debug!(
        score = total,
        risk_level = %level,
        override_applied = safety_override,
        "Rule-based scoring complete"
    );

    RiskAssessment {
        level,
        confidence,
        source,
        factors,
        guidance: guidance_for(level),
        department: department_for(level, patient, chest_pain, heart_disease).to_string(),
        wait_time: wait_time_for(level).to_string(),
    }
}

/// Sort descending by value, keeping evaluation order on ties, and keep the top entries.
pub fn rank_factors(factors: &mut Vec<Factor>) {
    factors.sort_by(|a, b| b.value.cmp(&a.value));
    factors.truncate(MAX_FACTORS);
}

pub fn guidance_for(level: RiskLevel) -> Vec<String> {
    let lines: &[&str] = match level {
        RiskLevel::High => &HIGH_GUIDANCE,
        RiskLevel::Medium => &MEDIUM_GUIDANCE,
        RiskLevel::Low => &LOW_GUIDANCE,
    };
    lines.iter().map(|s| s.to_string()).collect()
}

fn department_for(
    level: RiskLevel,
    patient: &PatientData,
    chest_pain: bool,
    heart_disease: bool,
) -> &'static str {
    if level == RiskLevel::High {
        "EMERGENCY"
    } else if chest_pain || heart_disease {
        "CARDIOLOGY"
    } else if patient.has_symptom(SHORTNESS_OF_BREATH) || patient.has_condition(ASTHMA) {
        "PULMONOLOGY"
    } else {
        "GENERAL MEDICINE"
    }
}

pub fn wait_time_for(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::High => "<15 minutes",
        RiskLevel::Medium => "30-45 minutes",
        RiskLevel::Low => "1-2 hours",
    }
}

fn capped(value: u32, cap: u32) -> u8 {
    value.min(cap) as u8
}

/// Rules-only analyzer for when no backend should be contacted.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineAnalyzer;

#[async_trait]
impl RiskAnalyzer for OfflineAnalyzer {
    async fn analyze(&self, patient: &PatientData) -> RiskAssessment {
        score(patient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Gender;

    fn patient(age: u32, systolic: u32, diastolic: u32, heart_rate: u32, temperature: f64) -> PatientData {
        PatientData {
            age,
            gender: Gender::Other,
            systolic,
            diastolic,
            heart_rate,
            temperature,
            ..PatientData::default()
        }
    }

    #[test]
    fn test_chest_pain_with_crisis_pressure_is_safety_override() {
        let p = patient(30, 182, 112, 70, 98.6).with_symptoms(["chest-pain"]);
        let result = score(&p);

        assert_eq!(result.level, RiskLevel::High);
        assert_eq!(result.source, AssessmentSource::SafetyOverride);
        assert_eq!(result.department, "EMERGENCY");
    }

    #[test]
    fn test_high_score_without_override_reports_rule_model() {
        // 50 (pressure) + 45 (age) + 25 (heart disease) = 120
        let p = patient(70, 150, 95, 80, 98.6).with_conditions(["heart-disease"]);
        let result = score(&p);

        assert_eq!(result.level, RiskLevel::High);
        assert_eq!(result.source, AssessmentSource::RuleModel);
        assert_eq!(result.confidence, 88);
    }

    #[test]
    fn test_medium_band_confidence_and_wait() {
        // 50 + 25 + 8 + 15 = 98
        let p = patient(52, 145, 92, 88, 101.2)
            .with_symptoms(["fever", "headache", "fatigue"])
            .with_conditions(["diabetes"]);
        let result = score(&p);

        assert_eq!(result.level, RiskLevel::Medium);
        assert_eq!(result.confidence, 76);
        assert_eq!(result.wait_time, "30-45 minutes");
        assert_eq!(result.department, "GENERAL MEDICINE");
        assert_eq!(result.guidance[0], "Rest in a comfortable position");
    }

    #[test]
    fn test_low_band_confidence() {
        let p = patient(34, 118, 76, 68, 98.4).with_symptoms(["headache"]);
        let result = score(&p);

        assert_eq!(result.level, RiskLevel::Low);
        // score 5 -> 75 + 95 / 10
        assert_eq!(result.confidence, 84);
    }

    #[test]
    fn test_low_heart_rate_detail() {
        let result = score(&patient(40, 120, 80, 45, 98.6));
        let hr = result
            .factors
            .iter()
            .find(|f| f.label == "Heart Rate")
            .unwrap();
        assert_eq!(hr.detail, "Low");
    }

    #[test]
    fn test_factor_ties_keep_evaluation_order() {
        let result = score(&patient(34, 118, 76, 68, 98.4));
        assert_eq!(result.factors[0].label, "Blood Pressure");
        assert_eq!(result.factors[1].label, "Age");
    }

    #[test]
    fn test_factors_are_capped_and_sorted() {
        let p = patient(80, 190, 120, 130, 103.0)
            .with_symptoms(["chest-pain"])
            .with_conditions(["heart-disease"]);
        let result = score(&p);

        assert_eq!(result.factors.len(), MAX_FACTORS);
        assert!(result.factors.windows(2).all(|w| w[0].value >= w[1].value));
        assert!(result.factors.iter().all(|f| f.label != "Temperature"));
    }

    #[test]
    fn test_department_routing_below_high() {
        let cardio = score(&patient(30, 120, 80, 70, 98.6).with_conditions(["heart-disease"]));
        assert_eq!(cardio.department, "CARDIOLOGY");

        let pulmo = score(&patient(30, 120, 80, 70, 98.6).with_conditions(["asthma"]));
        assert_eq!(pulmo.department, "PULMONOLOGY");

        let breath = score(&patient(30, 120, 80, 70, 98.6).with_symptoms(["shortness-of-breath"]));
        assert_eq!(breath.department, "PULMONOLOGY");
    }

    #[tokio::test]
    async fn test_offline_analyzer_matches_rules() {
        let p = patient(52, 145, 92, 88, 101.2).with_symptoms(["fever"]);
        let analyzer = OfflineAnalyzer;
        assert_eq!(RiskAnalyzer::analyze(&analyzer, &p).await, score(&p));
    }

    #[test]
    fn test_pulse_sweep_never_exceeds_factor_cap() {
        for hr in (0..=250).step_by(10) {
            for systolic in (0..=300).step_by(25) {
                let result = score(
                    &patient(66, systolic, 80, hr, 101.0)
                        .with_symptoms(["chest-pain", "nausea", "dizziness", "fatigue"])
                        .with_conditions(["heart-disease", "diabetes"]),
                );
                assert!(result.factors.len() <= MAX_FACTORS);
                assert!(result.factors.windows(2).all(|w| w[0].value >= w[1].value));
                assert!(result.confidence <= 100);
            }
        }
    }
}
