//! services/client/src/adapters/protocol.rs
//!
//! Defines the JSON bodies exchanged with the analysis backend.

use docchat_core::domain::{Answer, DocumentId, DocumentReceipt, SummaryScope};
use serde::{Deserialize, Serialize};

//=========================================================================================
// Requests Sent FROM the Client TO the Backend
//=========================================================================================
// NOTE: Uploads are multipart forms (`file`, `user_id`, optional `chunk_size` and
// `overlap`), not part of these types.
//=========================================================================================

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest<'a> {
    pub question: &'a str,
    pub document_id: &'a DocumentId,
}

/// Exactly one of `page` or `whole` is set.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeRequest<'a> {
    pub document_id: &'a DocumentId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whole: Option<bool>,
}

impl<'a> SummarizeRequest<'a> {
    pub fn new(document_id: &'a DocumentId, scope: SummaryScope) -> Self {
        match scope {
            SummaryScope::Page(page) => Self { document_id, page: Some(page), whole: None },
            SummaryScope::Whole => Self { document_id, page: None, whole: Some(true) },
        }
    }
}

//=========================================================================================
// Responses Sent FROM the Backend TO the Client
//=========================================================================================

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub document_id: DocumentId,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub num_chunks: Option<u32>,
}

impl From<UploadResponse> for DocumentReceipt {
    fn from(response: UploadResponse) -> Self {
        Self {
            document_id: response.document_id,
            filename: response.filename,
            chunk_count: response.num_chunks,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct AskResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Option<Vec<String>>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl From<AskResponse> for Answer {
    fn from(response: AskResponse) -> Self {
        Self {
            text: response.answer,
            sources: response.sources.unwrap_or_default(),
            confidence: response.confidence,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct SummaryResponse {
    pub summary: String,
}

/// The optional structured body of a non-success response.
#[derive(Deserialize, Debug, Default)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
}
