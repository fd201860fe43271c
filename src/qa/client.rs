//! Client for the document-QA collaborator service. The collaborator owns the
//! whole retrieval pipeline (PDF text extraction, embeddings, hosted model)
//! and exposes two endpoints: `POST {base}/documents` taking raw PDF bytes
//! (filename as a query parameter) and `POST {base}/questions` taking a JSON
//! question. Its vector store is one global, append-only store with no
//! isolation between ingestions.
//!
//! Calls are long-latency, request-scoped and never retried here.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::info;

use crate::error::ApiError;
use crate::qa::dto::{IngestReceipt, QaAnswer};

#[derive(Debug, Error)]
pub enum QaError {
    #[error("Document QA service is not configured")]
    Unconfigured,
    /// The collaborator refused the request, e.g. no document was ingested
    /// before asking a question.
    #[error("{0}")]
    Rejected(String),
    #[error("document QA request failed")]
    Transport(#[source] reqwest::Error),
}

impl From<QaError> for ApiError {
    fn from(err: QaError) -> Self {
        match err {
            QaError::Rejected(msg) => ApiError::BadRequest(msg),
            QaError::Transport(e) => ApiError::Internal(e.into()),
            unconfigured => ApiError::ServiceUnavailable(unconfigured.to_string()),
        }
    }
}

#[async_trait]
pub trait QaClient: Send + Sync {
    async fn ingest_pdf(&self, filename: &str, body: Bytes) -> Result<IngestReceipt, QaError>;
    async fn ask(&self, question: &str) -> Result<QaAnswer, QaError>;
}

#[derive(Clone)]
pub struct HttpQaClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpQaClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

async fn rejection(resp: reqwest::Response, fallback: &str) -> QaError {
    let detail = resp
        .json::<ErrorBody>()
        .await
        .map(|b| b.detail)
        .unwrap_or_else(|_| fallback.to_string());
    QaError::Rejected(detail)
}

#[async_trait]
impl QaClient for HttpQaClient {
    async fn ingest_pdf(&self, filename: &str, body: Bytes) -> Result<IngestReceipt, QaError> {
        let resp = self
            .http
            .post(format!("{}/documents", self.base_url))
            .query(&[("filename", filename)])
            .header(reqwest::header::CONTENT_TYPE, "application/pdf")
            .body(body)
            .send()
            .await
            .map_err(QaError::Transport)?;

        if resp.status() == StatusCode::BAD_REQUEST {
            return Err(rejection(resp, "Document was rejected").await);
        }
        resp.error_for_status().map_err(QaError::Transport)?;

        info!(filename = %filename, "pdf ingested");
        Ok(IngestReceipt {
            message: "PDF processed successfully".into(),
            filename: filename.to_string(),
        })
    }

    async fn ask(&self, question: &str) -> Result<QaAnswer, QaError> {
        let resp = self
            .http
            .post(format!("{}/questions", self.base_url))
            .json(&json!({ "question": question }))
            .send()
            .await
            .map_err(QaError::Transport)?;

        if resp.status() == StatusCode::BAD_REQUEST {
            return Err(
                rejection(resp, "No vector database found. Upload and process a PDF first.").await,
            );
        }
        let resp = resp.error_for_status().map_err(QaError::Transport)?;

        resp.json::<QaAnswer>().await.map_err(QaError::Transport)
    }
}

/// Placeholder used when `QA_SERVICE_URL` is unset; every call answers 503.
#[derive(Clone, Default)]
pub struct QaDisabled;

#[async_trait]
impl QaClient for QaDisabled {
    async fn ingest_pdf(&self, _filename: &str, _body: Bytes) -> Result<IngestReceipt, QaError> {
        Err(QaError::Unconfigured)
    }

    async fn ask(&self, _question: &str) -> Result<QaAnswer, QaError> {
        Err(QaError::Unconfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode as HttpStatus;
    use axum::response::IntoResponse;

    #[tokio::test]
    async fn disabled_client_reports_unconfigured() {
        let client = QaDisabled;
        assert!(matches!(
            client.ingest_pdf("a.pdf", Bytes::from_static(b"%PDF")).await,
            Err(QaError::Unconfigured)
        ));
        assert!(matches!(
            client.ask("anything").await,
            Err(QaError::Unconfigured)
        ));
    }

    #[test]
    fn qa_errors_map_to_expected_statuses() {
        let unconfigured: ApiError = QaError::Unconfigured.into();
        assert_eq!(
            unconfigured.into_response().status(),
            HttpStatus::SERVICE_UNAVAILABLE
        );

        let rejected: ApiError = QaError::Rejected("no documents".into()).into();
        assert_eq!(rejected.into_response().status(), HttpStatus::BAD_REQUEST);
    }
}
