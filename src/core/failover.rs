//! Ordered traversal over candidate backend bases.
//!
//! Each attempt reports a typed outcome; the walk stops at the first
//! [`Attempt::Accept`] or [`Attempt::Fail`] and moves on after
//! [`Attempt::Skip`]. Candidates are tried one at a time, never in parallel.

use crate::utils::error::{Result, TriageError};
use std::future::Future;

#[derive(Debug)]
pub enum Attempt<T> {
    /// Use this result and stop.
    Accept(T),
    /// This candidate cannot serve the request; try the next one.
    Skip(TriageError),
    /// Authoritative failure; stop without trying the remaining candidates.
    Fail(TriageError),
}

impl<T> Attempt<T> {
    /// Classify an error: retryable errors skip, the rest fail the walk.
    pub fn from_error(error: TriageError) -> Self {
        if error.is_retryable() {
            Attempt::Skip(error)
        } else {
            Attempt::Fail(error)
        }
    }
}

pub async fn first_accepted<T, F, Fut>(bases: &[String], mut attempt: F) -> Result<T>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Attempt<T>>,
{
    let mut last_error: Option<TriageError> = None;

    for (index, base) in bases.iter().enumerate() {
        tracing::debug!("Trying candidate {}/{}: {}", index + 1, bases.len(), base);
        match attempt(base.clone()).await {
            Attempt::Accept(value) => return Ok(value),
            Attempt::Fail(error) => {
                tracing::debug!("Candidate {} failed authoritatively: {}", base, error);
                return Err(error);
            }
            Attempt::Skip(error) => {
                tracing::debug!("Skipping candidate {}: {}", base, error);
                last_error = Some(error);
            }
        }
    }

    Err(TriageError::CandidatesExhausted {
        attempted: bases.len(),
        last_error: last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no candidate endpoints configured".to_string()),
    })
}
