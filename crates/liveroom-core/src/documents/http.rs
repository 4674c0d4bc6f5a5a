//! REST client for the classroom document service.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use liveroom_common::LiveError;
use liveroom_config::DocumentsConfig;

use super::service::DocumentService;
use super::types::{DocumentSlot, NavigationAction, PresentationState, SlotUpload};

/// Document service over HTTP, authenticated with a bearer token.
pub struct HttpDocumentService {
    base_url: String,
    access_token: Option<String>,
    http: reqwest::Client,
}

impl std::fmt::Debug for HttpDocumentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDocumentService")
            .field("base_url", &self.base_url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    document: Option<DocumentSlot>,
    #[serde(default)]
    message: Option<String>,
}

impl HttpDocumentService {
    pub fn new(config: &DocumentsConfig) -> Result<Self, LiveError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| LiveError::Document(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => request.header("Authorization", format!("Bearer {token}")),
            None => request,
        }
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, LiveError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| LiveError::Document(format!("request failed: {e}")))?;
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(LiveError::NotAuthorized(format!("document service: HTTP {status}")));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LiveError::Document(format!("HTTP {status}: {text}")));
        }
        Ok(response)
    }
}

fn mime_for(file_name: &str) -> &'static str {
    match file_name.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("pdf") => "application/pdf",
        Some("ppt") => "application/vnd.ms-powerpoint",
        Some("pptx") => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl DocumentService for HttpDocumentService {
    async fn list_slots(&self, room_id: &str) -> Result<Vec<DocumentSlot>, LiveError> {
        debug!(room = %room_id, "Listing document slots");
        let response = self
            .execute(self.http.get(self.url(&format!("/api/documents/slots/{room_id}"))))
            .await?;
        response
            .json()
            .await
            .map_err(|e| LiveError::Document(format!("bad slot list: {e}")))
    }

    async fn upload_slot(
        &self,
        room_id: &str,
        upload: SlotUpload,
    ) -> Result<DocumentSlot, LiveError> {
        debug!(room = %room_id, file = %upload.file_name, size = upload.bytes.len(), "Uploading document");
        let part = reqwest::multipart::Part::bytes(upload.bytes)
            .file_name(upload.file_name.clone())
            .mime_str(mime_for(&upload.file_name))
            .map_err(|e| LiveError::Document(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("documentType", upload.document_type)
            .text("isPresentation", upload.is_presentation.to_string());

        let response = self
            .execute(
                self.http
                    .post(self.url(&format!("/api/documents/slots/{room_id}/upload")))
                    .multipart(form),
            )
            .await?;
        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| LiveError::Document(format!("bad upload response: {e}")))?;
        match (body.success, body.document) {
            (true, Some(document)) => Ok(document),
            _ => Err(LiveError::Document(
                body.message.unwrap_or_else(|| "upload failed".to_string()),
            )),
        }
    }

    async fn delete_slot(&self, slot_id: &str) -> Result<(), LiveError> {
        debug!(slot = %slot_id, "Deleting document");
        self.execute(self.http.delete(self.url(&format!("/api/documents/{slot_id}"))))
            .await?;
        Ok(())
    }

    async fn navigate(
        &self,
        slot_id: &str,
        page: u32,
        action: NavigationAction,
    ) -> Result<(), LiveError> {
        debug!(slot = %slot_id, page, action = action.as_str(), "Persisting navigation");
        let page = page.to_string();
        self.execute(
            self.http
                .post(self.url(&format!("/api/documents/{slot_id}/presentation/navigate")))
                .query(&[("currentPage", page.as_str()), ("action", action.as_str())]),
        )
        .await?;
        Ok(())
    }

    async fn presentation_state(&self, slot_id: &str) -> Result<PresentationState, LiveError> {
        let response = self
            .execute(
                self.http
                    .get(self.url(&format!("/api/documents/{slot_id}/presentation/state"))),
            )
            .await?;
        response
            .json()
            .await
            .map_err(|e| LiveError::Document(format!("bad presentation state: {e}")))
    }
}
