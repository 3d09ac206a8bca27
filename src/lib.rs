//! # pdf2audio-client
//!
//! Client-side session and job-lifecycle orchestration for a PDF-to-audio
//! conversion service.
//!
//! The backend takes a PDF, reads it (OCR where needed) and synthesises an
//! audio file in the chosen language. This crate is everything the client
//! needs around that: who the user is, which views they may see, the state
//! of the document they are submitting, the list of their conversions, and
//! the links to the produced audio.
//!
//! ## Components
//!
//! ```text
//! IdentityProvider ──▶ IdentityGate ──▶ watch<Session> ──┬──▶ RouteGuard
//!                                                        ├──▶ ConversionWorkflow ──┐
//!                                                        └──▶ JobDirectory ◀───────┘ reconcile
//!                                                                  ▲
//!                                                    ArtifactAccess┘ delete / locate / download
//! ```
//!
//! 1. [`IdentityGate`] — owns the [`Session`]; sign-up, sign-in, sign-out.
//! 2. [`RouteGuard`]   — waits, admits, or redirects once to the sign-in page.
//! 3. [`JobDirectory`] — the user's jobs in server order; prunes on delete.
//! 4. [`ConversionWorkflow`] — `Empty → Selected → Submitting → Ready | Failed`.
//! 5. [`ArtifactAccess`] — download links, downloads, deletes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2audio_client::{
//!     ClientConfig, ConversionWorkflow, DocumentFile, FirebaseConfig,
//!     FirebaseIdentityProvider, HttpBackend, IdentityGate, JobDirectory,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::default();
//!     let provider = Arc::new(FirebaseIdentityProvider::new(FirebaseConfig::new("api-key"))?);
//!     let gate = IdentityGate::start(provider);
//!     gate.wait_resolved().await?;
//!     gate.authenticate("me@example.com", "Secret1").await?;
//!
//!     let backend = Arc::new(HttpBackend::new(config.clone())?);
//!     let workflow = ConversionWorkflow::new(backend.clone(), gate.subscribe(), &config);
//!     workflow.select_file(DocumentFile::from_path("report.pdf").await?)?;
//!     workflow.choose_language("fr")?;
//!     workflow.submit().await?;
//!
//!     let directory = JobDirectory::new(backend, gate.subscribe());
//!     for job in directory.list().await? {
//!         println!("{} {} {}", job.id(), job.filename(), job.language().language());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2audio` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2audio-client = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod artifact;
pub mod backend;
pub mod config;
pub mod directory;
pub mod document;
pub mod error;
pub mod firebase;
pub mod identity;
pub mod job;
pub mod language;
pub mod routes;
pub mod session;
pub mod view;
pub mod workflow;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use artifact::{locate, ArtifactAccess};
pub use backend::{ArtifactStream, ConversionBackend, HttpBackend};
pub use config::{ClientConfig, ClientConfigBuilder, FirebaseConfig};
pub use directory::JobDirectory;
pub use document::DocumentFile;
pub use error::{AuthError, ClientError, DirectoryError, Notice, UploadError, ValidationError};
pub use firebase::FirebaseIdentityProvider;
pub use identity::{
    validate_secret, IdentityGate, IdentityProvider, IdentityStream, SessionWatch, MIN_SECRET_LEN,
};
pub use job::{ConversionJob, JobId, JobStatus};
pub use language::{Language, LanguageCode};
pub use routes::{GuardDecision, Navigator, Route, RouteGuard};
pub use session::{IdentityContext, Principal, Session, SessionStatus};
pub use view::{NoopObserver, Observer, ViewObserver, ViewScope};
pub use workflow::{ConversionWorkflow, SubmitOutcome, WorkflowState};
