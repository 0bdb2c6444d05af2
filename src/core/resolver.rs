//! Discovery of a live scoring backend among candidate base URLs.

use reqwest::Client;
use std::collections::HashSet;
use std::sync::OnceLock;

pub const DEFAULT_PREFERRED_BASE: &str = "http://localhost:8000";

pub const DEFAULT_FALLBACK_BASES: [&str; 4] = [
    "http://127.0.0.1:8000",
    "http://localhost:8000",
    "http://127.0.0.1:8001",
    "http://localhost:8001",
];

pub const MODEL_STATUS_PATH: &str = "/api/model-status";

/// JSON keys that mark a backend as able to score.
const READINESS_FIELDS: [&str; 1] = ["predictor_ready"];

/// Holds the candidate list and the memoized known-good base.
///
/// Once a candidate passes the liveness probe it is cached for the lifetime
/// of the resolver; there is no expiry. Concurrent first calls may each probe,
/// and whichever finishes first is kept.
#[derive(Debug)]
pub struct EndpointResolver {
    client: Client,
    preferred: String,
    candidates: Vec<String>,
    resolved: OnceLock<String>,
}

impl EndpointResolver {
    pub fn new<I, S>(client: Client, preferred: &str, fallbacks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let preferred = normalize_base(preferred);
        let mut seen = HashSet::new();
        let candidates: Vec<String> = std::iter::once(preferred.clone())
            .chain(fallbacks.into_iter().map(|b| normalize_base(b.as_ref())))
            .filter(|b| !b.is_empty() && seen.insert(b.clone()))
            .collect();

        tracing::debug!("Endpoint candidates: {:?}", candidates);

        Self {
            client,
            preferred,
            candidates,
            resolved: OnceLock::new(),
        }
    }

    pub fn with_default_fallbacks(client: Client, preferred: &str) -> Self {
        Self::new(client, preferred, DEFAULT_FALLBACK_BASES)
    }

    pub fn preferred(&self) -> &str {
        &self.preferred
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// The memoized base, if a probe has already succeeded.
    pub fn resolved(&self) -> Option<&str> {
        self.resolved.get().map(String::as_str)
    }

    /// Return the first candidate that passes the liveness probe.
    ///
    /// Falls back to the preferred base, unmemoized, when nothing answers.
    pub async fn resolve(&self) -> String {
        if let Some(base) = self.resolved.get() {
            return base.clone();
        }

        for base in &self.candidates {
            if self.probe(base).await {
                let winner = self.resolved.get_or_init(|| base.clone());
                tracing::info!("Resolved scoring backend: {}", winner);
                return winner.clone();
            }
        }

        tracing::warn!(
            "No scoring backend passed the liveness probe, using preferred {}",
            self.preferred
        );
        self.preferred.clone()
    }

    /// Resolved (or preferred) base first, then every candidate once.
    pub async fn ordered_bases(&self) -> Vec<String> {
        let first = self.resolve().await;
        let mut seen = HashSet::new();
        std::iter::once(first)
            .chain(self.candidates.iter().cloned())
            .filter(|b| seen.insert(b.clone()))
            .collect()
    }

    async fn probe(&self, base: &str) -> bool {
        let url = format!("{}{}", base, MODEL_STATUS_PATH);
        tracing::debug!("Probing {}", url);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Probe of {} failed: {}", base, e);
                return false;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("Probe of {} returned {}", base, response.status());
            return false;
        }

        match response.json::<serde_json::Value>().await {
            Ok(body) => is_ready_body(&body),
            Err(e) => {
                tracing::debug!("Probe of {} returned a non-JSON body: {}", base, e);
                false
            }
        }
    }
}

/// A readiness body is a JSON object carrying one of the known readiness keys.
/// The key's value is not inspected: a backend that reports `false` is still
/// the right host, and predict calls will surface its state.
fn is_ready_body(body: &serde_json::Value) -> bool {
    body.as_object()
        .map(|obj| READINESS_FIELDS.iter().any(|field| obj.contains_key(*field)))
        .unwrap_or(false)
}

fn normalize_base(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}
