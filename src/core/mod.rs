pub mod client;
pub mod confidence;
pub mod failover;
pub mod payload;
pub mod resolver;
pub mod scoring;

pub use crate::domain::model::{
    AssessmentSource, Factor, Gender, PartialPatientData, PatientData, RiskAssessment, RiskLevel,
};
pub use crate::domain::ports::{ConfigProvider, RiskAnalyzer};
pub use crate::utils::error::Result;
