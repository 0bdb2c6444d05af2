use crate::domain::model::{PatientData, RiskAssessment};
use async_trait::async_trait;
use std::time::Duration;

pub trait ConfigProvider: Send + Sync {
    /// Operator-configured backend base URL, probed first.
    fn preferred_base_url(&self) -> &str;
    /// Well-known addresses tried after the preferred one.
    fn fallback_base_urls(&self) -> &[String];
    fn request_timeout(&self) -> Duration;
}

/// Anything that turns a patient record into a triage decision.
///
/// Implementations never fail: a best-effort assessment is always returned.
#[async_trait]
pub trait RiskAnalyzer: Send + Sync {
    async fn analyze(&self, patient: &PatientData) -> RiskAssessment;
}
