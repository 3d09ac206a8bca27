//! Conversion jobs as tracked by the client.

use crate::language::LanguageCode;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Backend-assigned job identifier.
///
/// Opaque to the client. The backend currently numbers jobs, so integers
/// are accepted on the wire and kept in their decimal form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for JobId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => JobId(s),
            RawId::Unsigned(n) => JobId(n.to_string()),
            RawId::Signed(n) => JobId(n.to_string()),
        })
    }
}

/// Lifecycle of a job as far as the client can tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Submitted,
    Ready,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Submitted => "submitted",
            JobStatus::Ready => "ready",
            JobStatus::Failed => "failed",
        }
    }
}

/// One submitted-document-to-artifact task.
///
/// Identifier, filename and language are fixed at creation; there is no
/// edit operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionJob {
    id: JobId,
    filename: String,
    language: LanguageCode,
    status: JobStatus,
}

impl ConversionJob {
    pub fn new(id: JobId, filename: impl Into<String>, language: LanguageCode, status: JobStatus) -> Self {
        Self {
            id,
            filename: filename.into(),
            language,
            status,
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn language(&self) -> &LanguageCode {
        &self.language
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn is_ready(&self) -> bool {
        self.status == JobStatus::Ready
    }
}

/// One entry of `GET /conversions/`.
///
/// `status` is optional: when the backend omits it, listing membership
/// means the conversion finished (the backend converts inside the submit
/// call).
#[derive(Debug, Clone, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub filename: String,
    pub language: LanguageCode,
    #[serde(default)]
    pub status: Option<JobStatus>,
}

impl From<JobRecord> for ConversionJob {
    fn from(r: JobRecord) -> Self {
        ConversionJob {
            id: r.id,
            filename: r.filename,
            language: r.language,
            status: r.status.unwrap_or(JobStatus::Ready),
        }
    }
}

/// Body of a successful `POST /convert/`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    pub id: JobId,
}
