use serde::{Deserialize, Serialize};

/// Confirmation returned after a PDF has been ingested by the collaborator.
#[derive(Debug, Serialize, Deserialize)]
pub struct IngestReceipt {
    pub message: String,
    pub filename: String,
}

/// Answer produced by the collaborator's retrieval pipeline.
#[derive(Debug, Serialize, Deserialize)]
pub struct QaAnswer {
    pub question: String,
    pub answer: String,
    pub sources: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AskForm {
    pub question: String,
}
