use crate::core::failover::{self, Attempt};
use crate::core::payload::{self, PredictRequest, PARSE_DOCUMENT_PATH, PREDICT_PATH};
use crate::core::resolver::EndpointResolver;
use crate::core::{scoring, ConfigProvider, PartialPatientData, PatientData, RiskAnalyzer, RiskAssessment};
use crate::utils::error::{Result, TriageError};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Statuses on which a predict call moves on to the next candidate.
const PREDICT_SKIP_STATUSES: [StatusCode; 3] = [
    StatusCode::NOT_FOUND,
    StatusCode::METHOD_NOT_ALLOWED,
    StatusCode::UNPROCESSABLE_ENTITY,
];

pub fn build_http_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()?;
    Ok(client)
}

/// Remote-first risk scoring with a local rule-based safety net.
pub struct RiskClient {
    client: Client,
    resolver: Arc<EndpointResolver>,
}

impl RiskClient {
    pub fn new(client: Client, resolver: Arc<EndpointResolver>) -> Self {
        Self { client, resolver }
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let client = build_http_client(config.request_timeout())?;
        let resolver = EndpointResolver::new(
            client.clone(),
            config.preferred_base_url(),
            config.fallback_base_urls(),
        );
        Ok(Self::new(client, Arc::new(resolver)))
    }

    pub fn resolver(&self) -> &EndpointResolver {
        &self.resolver
    }

    /// Score a patient, preferring the remote model and falling back to the
    /// local rules on any failure. Never returns an error.
    pub async fn analyze(&self, patient: &PatientData) -> RiskAssessment {
        match self.analyze_remote(patient).await {
            Ok(assessment) => {
                tracing::info!(
                    "Remote assessment: {} ({}%) -> {}",
                    assessment.level,
                    assessment.confidence,
                    assessment.department
                );
                assessment
            }
            Err(e) => {
                tracing::warn!("Remote scoring unavailable, using rule-based fallback: {}", e);
                scoring::score(patient)
            }
        }
    }

    /// The remote path on its own, with every failure surfaced.
    pub async fn analyze_remote(&self, patient: &PatientData) -> Result<RiskAssessment> {
        let request = PredictRequest::from(patient);
        let bases = self.resolver.ordered_bases().await;

        let client = &self.client;
        let request = &request;
        let response = failover::first_accepted(&bases, move |base| async move {
            let url = format!("{}{}", base, PREDICT_PATH);
            match client.post(&url).json(request).send().await {
                Ok(response) if PREDICT_SKIP_STATUSES.contains(&response.status()) => {
                    Attempt::Skip(TriageError::EndpointUnavailable {
                        url,
                        status: response.status().as_u16(),
                    })
                }
                Ok(response) => Attempt::Accept(response),
                Err(e) => Attempt::from_error(e.into()),
            }
        })
        .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TriageError::UnexpectedStatus {
                url: response.url().to_string(),
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body: Value = response.json().await?;
        payload::interpret_prediction(patient, &body)
    }

    /// Send a document to the parser and keep the fields it recognized.
    pub async fn upload_document(
        &self,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<PartialPatientData> {
        let bases = self.resolver.ordered_bases().await;
        tracing::debug!("Uploading {} ({} bytes)", file_name, contents.len());

        let client = &self.client;
        let contents = &contents;
        let response = failover::first_accepted(&bases, move |base| async move {
            let url = format!("{}{}", base, PARSE_DOCUMENT_PATH);
            let part = Part::bytes(contents.clone()).file_name(file_name.to_string());
            let form = Form::new().part("file", part);

            match client.post(&url).multipart(form).send().await {
                Ok(response) if response.status().is_success() => Attempt::Accept(response),
                Ok(response) if response.status() == StatusCode::NOT_FOUND => {
                    Attempt::Skip(TriageError::EndpointUnavailable { url, status: 404 })
                }
                Ok(response) => Attempt::Fail(upload_error(response).await),
                Err(e) => Attempt::from_error(e.into()),
            }
        })
        .await?;

        let body: Value = response.json().await?;
        let partial = PartialPatientData::from_json(&body);
        if partial.is_empty() {
            tracing::warn!("Parser returned no recognized patient fields for {}", file_name);
        }
        Ok(partial)
    }

    pub async fn upload_document_path(&self, path: impl AsRef<Path>) -> Result<PartialPatientData> {
        let path = path.as_ref();
        let contents = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document");
        self.upload_document(file_name, contents).await
    }
}

#[async_trait]
impl RiskAnalyzer for RiskClient {
    async fn analyze(&self, patient: &PatientData) -> RiskAssessment {
        RiskClient::analyze(self, patient).await
    }
}

async fn upload_error(response: Response) -> TriageError {
    let status = response.status();
    let fallback = status
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_string();

    let detail = match response.json::<Value>().await {
        Ok(body) => body
            .get("detail")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .unwrap_or(fallback),
        Err(_) => fallback,
    };

    TriageError::UploadFailed {
        status: status.as_u16(),
        detail,
    }
}
