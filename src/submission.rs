//! Report submission backends.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::{attachments::Attachment, category::Category, notify::Toast};

/// Snapshot of a validated draft handed to the submitter.
#[derive(Clone, Debug, Serialize)]
pub struct ReportPayload {
    pub location: String,
    pub category: Category,
    pub description: String,
    pub attachments: Vec<Attachment>,
}

/// Proof that a report was accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub id: Uuid,
    pub submitted_at: DateTime<Local>,
    /// Size of the serialized payload.
    pub payload_bytes: usize,
}

/// Failure of one submission attempt.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("submission rejected: {0}")]
    Rejected(String),
}

impl SubmitError {
    pub fn toast(&self) -> Toast {
        Toast::destructive(
            "Falha no envio",
            "Não foi possível enviar sua solicitação. Tente novamente.",
        )
    }
}

/// Delivers a report somewhere.
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, report: &ReportPayload) -> Result<SubmissionReceipt, SubmitError>;
}

/// Stands in for a network call: waits a fixed delay, then succeeds
/// (or fails when `fail` is set).
pub struct SimulatedSubmitter {
    delay: Duration,
    fail: bool,
}

impl SimulatedSubmitter {
    pub fn new(delay: Duration, fail: bool) -> Self {
        Self { delay, fail }
    }
}

#[async_trait]
impl Submitter for SimulatedSubmitter {
    async fn submit(&self, report: &ReportPayload) -> Result<SubmissionReceipt, SubmitError> {
        let body = serde_json::to_vec(report).map_err(|e| SubmitError::Rejected(e.to_string()))?;
        tracing::info!(
            "simulated submit: {} bytes, {} attachments",
            body.len(),
            report.attachments.len()
        );
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(SubmitError::Rejected("simulated failure".into()));
        }
        Ok(SubmissionReceipt {
            id: Uuid::new_v4(),
            submitted_at: Local::now(),
            payload_bytes: body.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ReportPayload {
        ReportPayload {
            location: "Rua A, 100".into(),
            category: Category::Buraco,
            description: "Pothole in front of house number 12".into(),
            attachments: vec![Attachment::new("a.jpg", 10, "/tmp/a.jpg")],
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_submit_waits_for_delay() {
        let s = SimulatedSubmitter::new(Duration::from_millis(2000), false);
        let started = tokio::time::Instant::now();
        let receipt = s.submit(&payload()).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(2000));
        assert!(receipt.payload_bytes > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_failure() {
        let s = SimulatedSubmitter::new(Duration::from_millis(10), true);
        assert!(matches!(
            s.submit(&payload()).await,
            Err(SubmitError::Rejected(_))
        ));
    }

    #[test]
    fn test_payload_serializes_category_value() {
        let json = serde_json::to_value(payload()).unwrap();
        assert_eq!(json["category"], "buraco");
        assert_eq!(json["attachments"][0]["name"], "a.jpg");
    }
}
