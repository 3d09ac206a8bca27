//! Error types for the pdf2audio-client library.
//!
//! The taxonomy follows where a failure is reported to the user:
//!
//! * [`ValidationError`] — a client-side shape check failed (weak secret,
//!   wrong file type). Raised before any network use and shown next to the
//!   offending field.
//!
//! * [`AuthError`] — the identity provider rejected the credentials or the
//!   federated flow. Shown as a transient message; the session is untouched.
//!
//! * [`DirectoryError`] / [`UploadError`] — a call to the conversion backend
//!   failed. Shown as an alert; local state is rolled back to its pre-call
//!   value and nothing is retried automatically.
//!
//! [`ClientError`] wraps all of them for the top-level entry points. Use
//! [`ClientError::notice`] to turn any of them into a [`Notice`].

use std::path::PathBuf;
use thiserror::Error;

/// A client-side shape check failed. No request was sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Identifier (email) was empty.
    #[error("An email address is required.")]
    EmptyIdentifier,

    /// Secret is shorter than the minimum length.
    #[error("Password should be at least {min} characters or longer (got {actual}).")]
    SecretTooShort { min: usize, actual: usize },

    /// Secret has no upper-case character.
    #[error("Your password should have at least one upper case character.")]
    SecretMissingUppercase,

    /// The selected file is not an accepted document type.
    #[error("'{name}' is not a supported document. Accepted: {accepted}")]
    UnsupportedFile { name: String, accepted: String },

    /// `submit` was called with no file in the draft.
    #[error("Please select a file.")]
    NoFileSelected,

    /// An empty language code was chosen.
    #[error("A target language is required.")]
    EmptyLanguage,
}

impl ValidationError {
    /// Name of the input field the error belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::EmptyIdentifier => "email",
            ValidationError::SecretTooShort { .. } | ValidationError::SecretMissingUppercase => {
                "password"
            }
            ValidationError::UnsupportedFile { .. } | ValidationError::NoFileSelected => "file",
            ValidationError::EmptyLanguage => "language",
        }
    }
}

/// The identity provider rejected a request.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// Credentials or account creation rejected by the provider.
    #[error("Authentication rejected: {reason}")]
    Rejected { reason: String },

    /// No federated credential / interactive flow is available.
    #[error("Federated sign-in unavailable: {reason}")]
    FederatedUnavailable { reason: String },

    /// The provider could not be reached.
    #[error("Identity provider unreachable: {reason}")]
    Transport { reason: String },

    /// The provider answered with something we could not decode.
    #[error("Unexpected identity provider response: {detail}")]
    Decode { detail: String },
}

/// A job listing or delete call failed.
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    /// No authenticated session to attribute the call to.
    #[error("Sign in to access your conversions.")]
    Unauthenticated,

    /// Transport-level failure (connection refused, timeout, …).
    #[error("Request to '{url}' failed: {reason}")]
    Request { url: String, reason: String },

    /// Backend answered with a non-success status.
    #[error("Backend returned HTTP {status} for '{url}'")]
    Status { url: String, status: u16 },

    /// Body did not match the expected shape.
    #[error("Could not decode conversion list: {detail}")]
    Decode { detail: String },
}

/// A document submission failed.
#[derive(Debug, Clone, Error)]
pub enum UploadError {
    /// No authenticated session to attribute the upload to.
    #[error("Sign in to convert documents.")]
    Unauthenticated,

    /// Transport-level failure.
    #[error("Upload to '{url}' failed: {reason}")]
    Request { url: String, reason: String },

    /// Backend answered with a non-success status.
    #[error("Conversion rejected with HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    /// Response body did not contain a job identifier.
    #[error("Could not decode conversion response: {detail}")]
    Decode { detail: String },
}

/// All errors returned by the pdf2audio-client library.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    /// An operation is not allowed in the current workflow state.
    #[error("Cannot {op} while the draft is {state}")]
    InvalidTransition {
        op: &'static str,
        state: &'static str,
    },

    /// The artifact link was revoked by a delete.
    #[error("Conversion {id} was deleted; its download link is no longer valid")]
    ArtifactRevoked { id: String },

    /// Could not read a document or write an artifact.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// How a failure is presented to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Shown next to the input field it refers to.
    Inline { field: &'static str, message: String },
    /// Short-lived message (toast).
    Toast { message: String },
    /// Blocking alert the user must acknowledge.
    Alert { message: String },
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Inline { message, .. } | Notice::Toast { message } | Notice::Alert { message } => {
                message
            }
        }
    }
}

impl ClientError {
    /// Project the error onto the notice the user should see.
    pub fn notice(&self) -> Notice {
        match self {
            ClientError::Validation(v) => Notice::Inline {
                field: v.field(),
                message: v.to_string(),
            },
            ClientError::Auth(e) => Notice::Toast {
                message: e.to_string(),
            },
            ClientError::InvalidTransition { .. } => Notice::Toast {
                message: self.to_string(),
            },
            _ => Notice::Alert {
                message: self.to_string(),
            },
        }
    }

    /// True when the failure was detected before any request was made.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ClientError::Validation(_)
                | ClientError::InvalidTransition { .. }
                | ClientError::InvalidConfig(_)
        )
    }
}
