//! services/client/src/adapters/http.rs
//!
//! This module contains the HTTP adapter for the analysis backend. It implements
//! every service port from the `core` crate over a single `reqwest` client.

use crate::adapters::protocol::{
    AskRequest, AskResponse, ErrorBody, SummarizeRequest, SummaryResponse, UploadResponse,
};
use crate::config::{ChunkingOptions, Config};
use async_trait::async_trait;
use bytes::Bytes;
use docchat_core::domain::{Answer, CandidateFile, DocumentId, DocumentReceipt, SummaryScope};
use docchat_core::ports::{
    DocumentContentService, DocumentUploadService, PortError, PortResult, QuestionAnsweringService,
    SummaryService,
};
use reqwest::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that reaches the analysis backend over HTTP.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    chunking: ChunkingOptions,
}

impl HttpBackend {
    /// Creates a new `HttpBackend` from an already configured client.
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            chunking: ChunkingOptions::default(),
        }
    }

    /// Builds the client (including the optional timeout) from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let mut backend = Self::new(builder.build()?, config.backend_url.clone());
        backend.chunking = config.chunking;
        Ok(backend)
    }

    pub fn with_chunking(mut self, chunking: ChunkingOptions) -> Self {
        self.chunking = chunking;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Turns a non-success response into `PortError::Rejected`, keeping any `detail`.
    async fn check(response: Response) -> PortResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .unwrap_or_default()
            .detail;
        warn!("Backend responded with HTTP {} (detail: {:?})", status.as_u16(), detail);
        Err(PortError::Rejected { status: status.as_u16(), detail })
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> PortResult<T> {
        let response = Self::check(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| PortError::Unexpected(format!("Malformed backend response: {}", e)))
    }
}

fn transport(e: reqwest::Error) -> PortError {
    if e.is_timeout() {
        PortError::Transport(format!("Request timed out: {}", e))
    } else {
        PortError::Transport(e.to_string())
    }
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl DocumentUploadService for HttpBackend {
    async fn upload_document(&self, file: &CandidateFile, caller_id: &str) -> PortResult<DocumentReceipt> {
        debug!("Uploading '{}' ({} bytes)", file.filename, file.byte_size());
        let part = multipart::Part::bytes(file.bytes.to_vec())
            .file_name(file.filename.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| PortError::Unexpected(format!("Invalid MIME type: {}", e)))?;

        let mut form = multipart::Form::new()
            .part("file", part)
            .text("user_id", caller_id.to_string());
        if let Some(chunk_size) = self.chunking.chunk_size {
            form = form.text("chunk_size", chunk_size.to_string());
        }
        if let Some(overlap) = self.chunking.overlap {
            form = form.text("overlap", overlap.to_string());
        }

        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;

        let body: UploadResponse = Self::read_json(response).await?;
        Ok(body.into())
    }
}

#[async_trait]
impl QuestionAnsweringService for HttpBackend {
    async fn ask(&self, question: &str, document_id: &DocumentId) -> PortResult<Answer> {
        let response = self
            .client
            .post(self.endpoint("ask"))
            .json(&AskRequest { question, document_id })
            .send()
            .await
            .map_err(transport)?;

        let body: AskResponse = Self::read_json(response).await?;
        Ok(body.into())
    }
}

#[async_trait]
impl SummaryService for HttpBackend {
    async fn summarize(&self, document_id: &DocumentId, scope: SummaryScope) -> PortResult<String> {
        let response = self
            .client
            .post(self.endpoint("summarize"))
            .json(&SummarizeRequest::new(document_id, scope))
            .send()
            .await
            .map_err(transport)?;

        let body: SummaryResponse = Self::read_json(response).await?;
        Ok(body.summary)
    }
}

#[async_trait]
impl DocumentContentService for HttpBackend {
    async fn fetch_document(&self, document_id: &DocumentId) -> PortResult<Bytes> {
        let response = self
            .client
            .get(self.endpoint(&format!("documents/{}", document_id)))
            .send()
            .await
            .map_err(transport)?;

        let response = Self::check(response).await?;
        response.bytes().await.map_err(transport)
    }
}
