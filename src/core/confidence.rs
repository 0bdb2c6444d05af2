//! Scale coercion and rule/remote blending for confidence percentages.

use crate::core::{PatientData, RiskLevel};
use crate::domain::model::{CHEST_PAIN, HEART_DISEASE, SHORTNESS_OF_BREATH};

const CRITICAL_SYMPTOMS: [&str; 2] = [CHEST_PAIN, SHORTNESS_OF_BREATH];

const LOCAL_WEIGHT: f64 = 0.7;
const REMOTE_WEIGHT: f64 = 0.3;

/// Coerce a 0–1 fraction, a 0–100 percentage or an accidental 0–10000 value
/// into a whole percentage.
pub fn to_percent(raw: f64) -> u8 {
    if !raw.is_finite() {
        return 0;
    }
    let mut pct = raw;
    if pct <= 1.0 {
        pct *= 100.0;
    } else if pct > 100.0 && pct <= 10_000.0 {
        pct /= 100.0;
    }
    pct.clamp(0.0, 100.0).round() as u8
}

/// Numeric view of a loosely typed JSON field. Numeric strings are accepted;
/// everything else, including a missing field, is NaN.
pub fn json_number(value: Option<&serde_json::Value>) -> f64 {
    match value {
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Percent-native rule score used as the blending anchor.
///
/// Weighted independently of [`crate::core::scoring::score`]; the two do not agree.
pub fn rule_based_percent(patient: &PatientData) -> u8 {
    let mut score: u32 = 0;

    if patient.systolic >= 180 || patient.diastolic >= 110 {
        score += 35;
    } else if patient.systolic >= 140 || patient.diastolic >= 90 {
        score += 22;
    } else if patient.systolic >= 120 || patient.diastolic >= 80 {
        score += 10;
    }

    if patient.age >= 65 {
        score += 15;
    } else if patient.age >= 50 {
        score += 8;
    }

    if patient.heart_rate > 120 || patient.heart_rate < 50 {
        score += 14;
    } else if patient.heart_rate > 100 || patient.heart_rate < 60 {
        score += 8;
    }

    if patient.temperature >= 103.0 {
        score += 12;
    } else if patient.temperature >= 100.4 {
        score += 6;
    } else if patient.temperature <= 95.0 {
        score += 8;
    }

    if CRITICAL_SYMPTOMS.iter().any(|s| patient.has_symptom(s)) {
        score += 20;
    }
    score += (patient.symptoms.len() as u32 * 3).min(12);

    if patient.has_condition(HEART_DISEASE) {
        score += 8;
    }
    score += (patient.conditions.len() as u32 * 4).min(10);

    score.clamp(1, 99) as u8
}

/// Combine the remote percentage with the local rule percentage.
///
/// A saturated remote value (≥99 or ≤1) is ignored in favor of the local score.
pub fn blend(patient: &PatientData, remote_pct: u8) -> u8 {
    let local = rule_based_percent(patient);
    if remote_pct >= 99 || remote_pct <= 1 {
        tracing::debug!(remote_pct, local, "Remote score saturated, using rule-based percent");
        return local;
    }
    let mixed = (local as f64 * LOCAL_WEIGHT + remote_pct as f64 * REMOTE_WEIGHT).round();
    mixed.clamp(1.0, 99.0) as u8
}

/// Parse a remote risk label, downgrading severe labels that arrive with low confidence.
pub fn normalize_level(raw_level: &str, confidence_pct: u8) -> RiskLevel {
    match RiskLevel::parse(raw_level) {
        Some(RiskLevel::Medium) if confidence_pct <= 20 => RiskLevel::Low,
        Some(RiskLevel::High) if confidence_pct <= 40 => RiskLevel::Medium,
        Some(level) => level,
        None if confidence_pct >= 67 => RiskLevel::High,
        None if confidence_pct >= 34 => RiskLevel::Medium,
        None => RiskLevel::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_percent_scales() {
        assert_eq!(to_percent(0.82), 82);
        assert_eq!(to_percent(1.0), 100);
        assert_eq!(to_percent(0.0), 0);
        assert_eq!(to_percent(57.4), 57);
        assert_eq!(to_percent(8250.0), 83);
        assert_eq!(to_percent(20000.0), 100);
        assert_eq!(to_percent(-3.0), 0);
        assert_eq!(to_percent(f64::NAN), 0);
        assert_eq!(to_percent(f64::INFINITY), 0);
    }

    #[test]
    fn test_to_percent_idempotent_on_whole_percentages() {
        for x in 0..=100u8 {
            let once = to_percent(x as f64);
            assert_eq!(to_percent(once as f64), once, "x = {}", x);
        }
    }

    #[test]
    fn test_json_number_coercion() {
        assert_eq!(json_number(Some(&json!(0.5))), 0.5);
        assert_eq!(json_number(Some(&json!("72"))), 72.0);
        assert!(json_number(Some(&json!("high"))).is_nan());
        assert!(json_number(Some(&json!(null))).is_nan());
        assert!(json_number(None).is_nan());
    }

    #[test]
    fn test_rule_based_percent_caps_at_99() {
        let p = PatientData {
            age: 68,
            systolic: 185,
            diastolic: 115,
            heart_rate: 118,
            temperature: 99.8,
            ..PatientData::default()
        }
        .with_symptoms(["chest-pain", "shortness-of-breath", "dizziness"])
        .with_conditions(["hypertension", "heart-disease"]);

        assert_eq!(rule_based_percent(&p), 99);
    }

    #[test]
    fn test_rule_based_percent_floor_is_one() {
        let p = PatientData {
            age: 30,
            systolic: 110,
            diastolic: 70,
            heart_rate: 70,
            temperature: 98.6,
            ..PatientData::default()
        };
        assert_eq!(rule_based_percent(&p), 1);
    }

    #[test]
    fn test_blend_weights_local_signal() {
        // local = 3 (one symptom), remote = 82
        let p = PatientData {
            age: 34,
            systolic: 118,
            diastolic: 76,
            heart_rate: 68,
            temperature: 98.4,
            ..PatientData::default()
        }
        .with_symptoms(["headache"]);

        assert_eq!(blend(&p, 82), 27);
        assert_eq!(blend(&p, 99), 3);
        assert_eq!(blend(&p, 1), 3);
    }

    #[test]
    fn test_blend_stays_in_bounds() {
        let quiet = PatientData::default();
        let loud = PatientData {
            systolic: 200,
            age: 90,
            heart_rate: 140,
            temperature: 104.0,
            ..PatientData::default()
        }
        .with_symptoms(["chest-pain", "fatigue", "nausea", "dizziness"])
        .with_conditions(["heart-disease", "diabetes", "asthma"]);

        for remote in 0..=100u8 {
            for p in [&quiet, &loud] {
                let pct = blend(p, remote);
                assert!((1..=99).contains(&pct), "remote {} gave {}", remote, pct);
            }
        }
    }

    #[test]
    fn test_normalize_level_downgrades() {
        assert_eq!(normalize_level("MEDIUM", 15), RiskLevel::Low);
        assert_eq!(normalize_level("HIGH", 35), RiskLevel::Medium);
        assert_eq!(normalize_level("bogus", 80), RiskLevel::High);
        assert_eq!(normalize_level(" high ", 75), RiskLevel::High);
        assert_eq!(normalize_level("medium", 21), RiskLevel::Medium);
        assert_eq!(normalize_level("low", 90), RiskLevel::Low);
        assert_eq!(normalize_level("", 50), RiskLevel::Medium);
        assert_eq!(normalize_level("unknown", 33), RiskLevel::Low);
    }
}
