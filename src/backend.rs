//! The conversion backend contract and its HTTP implementation.
//!
//! ```text
//! POST   /convert/           multipart(file, language) → {id}
//! GET    /conversions/       → [{id, filename, language, status?}]
//! DELETE /conversions/{id}   → 2xx | 404 (already gone) | error
//! GET    /download/{id}      → artifact bytes
//! ```
//!
//! Every request carries the session's bearer token. Nothing here retries:
//! a failed call is reported once and the caller decides what to do.

use crate::config::ClientConfig;
use crate::document::DocumentFile;
use crate::error::{DirectoryError, UploadError};
use crate::job::{ConversionJob, JobId, JobRecord, SubmitResponse};
use crate::language::LanguageCode;
use crate::session::IdentityContext;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use std::pin::Pin;
use std::time::Duration;
use tokio_stream::Stream;
use tracing::{debug, info, warn};

/// Chunks of a downloaded artifact.
pub type ArtifactStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, DirectoryError>> + Send>>;

/// Remote side of the conversion service.
#[async_trait]
pub trait ConversionBackend: Send + Sync {
    /// Upload a document for conversion into `language`.
    async fn submit(
        &self,
        identity: &IdentityContext,
        file: &DocumentFile,
        language: &LanguageCode,
    ) -> Result<JobId, UploadError>;

    /// The user's jobs in server order.
    async fn list(&self, identity: &IdentityContext) -> Result<Vec<ConversionJob>, DirectoryError>;

    /// Delete a job. A job that no longer exists counts as deleted.
    async fn delete(&self, identity: &IdentityContext, id: &JobId) -> Result<(), DirectoryError>;

    /// Open the artifact of a finished job.
    async fn fetch_artifact(
        &self,
        identity: &IdentityContext,
        id: &JobId,
    ) -> Result<ArtifactStream, DirectoryError>;
}

/// [`ConversionBackend`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    config: ClientConfig,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(config: ClientConfig) -> Result<Self, DirectoryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| DirectoryError::Request {
                url: config.base().to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn job_url(&self, id: &JobId) -> String {
        self.config.endpoint(&format!("/conversions/{}", id))
    }
}

#[async_trait]
impl ConversionBackend for HttpBackend {
    async fn submit(
        &self,
        identity: &IdentityContext,
        file: &DocumentFile,
        language: &LanguageCode,
    ) -> Result<JobId, UploadError> {
        let url = self.config.endpoint("/convert/");
        info!(
            "Uploading {} ({} bytes, language {})",
            file.name(),
            file.len(),
            language
        );

        let part = Part::bytes(file.bytes().to_vec())
            .file_name(file.name().to_string())
            .mime_str(file.content_type())
            .map_err(|e| UploadError::Request {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        let form = Form::new()
            .part("file", part)
            .text("language", language.to_string());

        let response = self
            .client
            .post(&url)
            .bearer_auth(&identity.bearer_token)
            .timeout(Duration::from_secs(self.config.upload_timeout_secs))
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Request {
                url: url.clone(),
                reason: if e.is_timeout() {
                    format!("timed out after {}s", self.config.upload_timeout_secs)
                } else {
                    e.to_string()
                },
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Status {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }

        let body: SubmitResponse = response.json().await.map_err(|e| UploadError::Decode {
            detail: e.to_string(),
        })?;
        info!("Conversion created: {}", body.id);
        Ok(body.id)
    }

    async fn list(&self, identity: &IdentityContext) -> Result<Vec<ConversionJob>, DirectoryError> {
        let url = self.config.endpoint("/conversions/");
        let response = self
            .client
            .get(&url)
            .bearer_auth(&identity.bearer_token)
            .send()
            .await
            .map_err(|e| DirectoryError::Request {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let records: Vec<JobRecord> =
            response.json().await.map_err(|e| DirectoryError::Decode {
                detail: e.to_string(),
            })?;
        debug!("Fetched {} conversions", records.len());
        Ok(records.into_iter().map(ConversionJob::from).collect())
    }

    async fn delete(&self, identity: &IdentityContext, id: &JobId) -> Result<(), DirectoryError> {
        let url = self.job_url(id);
        let response = self
            .client
            .delete(&url)
            .bearer_auth(&identity.bearer_token)
            .send()
            .await
            .map_err(|e| DirectoryError::Request {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        match response.status() {
            s if s.is_success() => {
                info!("Deleted conversion {}", id);
                Ok(())
            }
            StatusCode::NOT_FOUND => {
                debug!("Conversion {} already gone", id);
                Ok(())
            }
            s => {
                warn!("Delete of {} failed: HTTP {}", id, s);
                Err(DirectoryError::Status {
                    url,
                    status: s.as_u16(),
                })
            }
        }
    }

    async fn fetch_artifact(
        &self,
        identity: &IdentityContext,
        id: &JobId,
    ) -> Result<ArtifactStream, DirectoryError> {
        let url = format!("{}/{}", self.config.download_base(), id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&identity.bearer_token)
            .send()
            .await
            .map_err(|e| DirectoryError::Request {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let stream = response.bytes_stream().map(move |chunk| {
            chunk
                .map(|b| b.to_vec())
                .map_err(|e| DirectoryError::Request {
                    url: url.clone(),
                    reason: e.to_string(),
                })
        });
        Ok(Box::pin(stream))
    }
}

/// Pull FastAPI's `{"detail": ...}` out of an error body, else the raw text.
fn error_detail(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct Detail {
        detail: serde_json::Value,
    }
    match serde_json::from_str::<Detail>(body) {
        Ok(Detail {
            detail: serde_json::Value::String(s),
        }) => s,
        Ok(Detail { detail }) => detail.to_string(),
        Err(_) if body.chars().count() > 200 => {
            format!("{}\u{2026}", body.chars().take(199).collect::<String>())
        }
        Err(_) => body.to_string(),
    }
}
