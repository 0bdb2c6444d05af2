pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};
pub use config::{BackendSettings, TomlConfig};

pub use core::client::RiskClient;
pub use core::resolver::EndpointResolver;
pub use core::scoring::{score, OfflineAnalyzer};
pub use domain::model::{
    AssessmentSource, Factor, Gender, PartialPatientData, PatientData, RiskAssessment, RiskLevel,
};
pub use domain::ports::{ConfigProvider, RiskAnalyzer};
pub use utils::error::{Result, TriageError};
