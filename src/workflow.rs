//! Per-draft conversion workflow.
//!
//! ```text
//!            select_file            submit             Ok
//!  Empty ───────────────▶ Selected ────────▶ Submitting ────▶ Ready { job_id }
//!                           ▲  │                  │
//!             select_file ──┘  │                  └── Err ──▶ Failed { reason }
//!                              │                               │
//!                              └───────── submit (retry) ◀─────┘
//! ```
//!
//! Each [`ConversionWorkflow`] owns exactly one draft, so two upload
//! surfaces never share a selection. Clones share the draft; that is how a
//! second click on "Convert" reaches the same `Submitting` guard and turns
//! into a no-op instead of a second job.

use crate::backend::ConversionBackend;
use crate::config::ClientConfig;
use crate::document::{self, DocumentFile};
use crate::error::{ClientError, UploadError, ValidationError};
use crate::identity::SessionWatch;
use crate::job::JobId;
use crate::language::LanguageCode;
use crate::view::{NoopObserver, Observer, ViewScope};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Where a draft is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    /// No file selected.
    Empty,
    /// A file is selected and can be submitted.
    Selected,
    /// Upload and remote conversion in progress.
    Submitting,
    /// The backend produced `job_id`. The file selection has been cleared.
    Ready { job_id: JobId },
    /// The last submission failed. The file selection is kept for a retry.
    Failed { reason: String },
}

impl WorkflowState {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowState::Empty => "empty",
            WorkflowState::Selected => "selected",
            WorkflowState::Submitting => "submitting",
            WorkflowState::Ready { .. } => "ready",
            WorkflowState::Failed { .. } => "failed",
        }
    }
}

/// Result of a [`ConversionWorkflow::submit`] call that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The backend accepted the document as `job_id`.
    Submitted { job_id: JobId },
    /// A submission of this draft was already in flight; nothing was sent.
    AlreadySubmitting,
}

#[derive(Debug)]
struct Draft {
    file: Option<DocumentFile>,
    language: LanguageCode,
    state: WorkflowState,
}

struct Inner {
    backend: Arc<dyn ConversionBackend>,
    session: SessionWatch,
    accepted_extensions: Vec<String>,
    default_language: LanguageCode,
    draft: Mutex<Draft>,
    scope: ViewScope,
    observer: Observer,
}

/// One upload surface's submission state machine.
#[derive(Clone)]
pub struct ConversionWorkflow {
    inner: Arc<Inner>,
}

impl ConversionWorkflow {
    pub fn new(
        backend: Arc<dyn ConversionBackend>,
        session: SessionWatch,
        config: &ClientConfig,
    ) -> Self {
        Self::with_view(
            backend,
            session,
            config,
            ViewScope::new(),
            Arc::new(NoopObserver),
        )
    }

    /// Create a workflow bound to a view's lifetime and observer.
    pub fn with_view(
        backend: Arc<dyn ConversionBackend>,
        session: SessionWatch,
        config: &ClientConfig,
        scope: ViewScope,
        observer: Observer,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                session,
                accepted_extensions: config.accepted_extensions.clone(),
                default_language: config.default_language.clone(),
                draft: Mutex::new(Draft {
                    file: None,
                    language: config.default_language.clone(),
                    state: WorkflowState::Empty,
                }),
                scope,
                observer,
            }),
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.lock().state.clone()
    }

    pub fn language(&self) -> LanguageCode {
        self.lock().language.clone()
    }

    /// Name of the selected file, if any.
    pub fn selected_file(&self) -> Option<String> {
        self.lock().file.as_ref().map(|f| f.name().to_string())
    }

    /// Job produced by the last successful submission.
    pub fn ready_job(&self) -> Option<JobId> {
        match self.lock().state {
            WorkflowState::Ready { ref job_id } => Some(job_id.clone()),
            _ => None,
        }
    }

    pub fn scope(&self) -> &ViewScope {
        &self.inner.scope
    }

    /// Stop delivering updates. In-flight requests still complete and
    /// settle the draft into `Ready` or `Failed`; only the observer calls
    /// are dropped.
    pub fn unmount(&self) {
        self.inner.scope.unmount();
    }

    /// Select the document to convert, replacing an unsubmitted selection.
    ///
    /// Files with an unaccepted type are rejected here, before any upload.
    pub fn select_file(&self, file: DocumentFile) -> Result<(), ClientError> {
        let state = {
            let mut draft = self.lock();
            if draft.state == WorkflowState::Submitting {
                return Err(ClientError::InvalidTransition {
                    op: "select a file",
                    state: draft.state.name(),
                });
            }
            document::accept(&file, &self.inner.accepted_extensions)?;
            debug!("Selected {} ({} bytes)", file.name(), file.len());
            draft.file = Some(file);
            draft.state = WorkflowState::Selected;
            draft.state.clone()
        };
        self.publish(&state);
        Ok(())
    }

    /// Choose the target language for the next submission. Local only.
    pub fn choose_language(&self, code: impl Into<LanguageCode>) -> Result<(), ClientError> {
        let code = code.into();
        if code.is_empty() {
            return Err(ValidationError::EmptyLanguage.into());
        }
        debug!("Language set to {} ({})", code, code.language().name());
        self.lock().language = code;
        Ok(())
    }

    /// Discard the draft and start over.
    pub fn reset(&self) -> Result<(), ClientError> {
        {
            let mut draft = self.lock();
            if draft.state == WorkflowState::Submitting {
                return Err(ClientError::InvalidTransition {
                    op: "reset",
                    state: draft.state.name(),
                });
            }
            draft.file = None;
            draft.language = self.inner.default_language.clone();
            draft.state = WorkflowState::Empty;
        }
        self.publish(&WorkflowState::Empty);
        Ok(())
    }

    /// Upload the selected file.
    ///
    /// Not re-entrant: while a submission of this draft is in flight,
    /// further calls return [`SubmitOutcome::AlreadySubmitting`] and send
    /// nothing. A failed submission keeps the file, so calling `submit`
    /// again retries it.
    pub async fn submit(&self) -> Result<SubmitOutcome, ClientError> {
        let (file, language, identity) = {
            let mut draft = self.lock();
            match draft.state {
                WorkflowState::Submitting => {
                    debug!("Submission already in flight, ignoring");
                    return Ok(SubmitOutcome::AlreadySubmitting);
                }
                WorkflowState::Selected | WorkflowState::Failed { .. } => {}
                WorkflowState::Empty | WorkflowState::Ready { .. } => {
                    return Err(ValidationError::NoFileSelected.into());
                }
            }
            let Some(file) = draft.file.clone() else {
                return Err(ValidationError::NoFileSelected.into());
            };
            let Some(identity) = self.inner.session.borrow().identity() else {
                return Err(UploadError::Unauthenticated.into());
            };
            draft.state = WorkflowState::Submitting;
            (file, draft.language.clone(), identity)
        };
        self.publish(&WorkflowState::Submitting);

        let start = Instant::now();
        let result = self
            .inner
            .backend
            .submit(&identity, &file, &language)
            .await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        if !self.inner.scope.is_mounted() {
            debug!("View unmounted, not reporting submission result for {}", file.name());
        }

        match result {
            Ok(job_id) => {
                info!(
                    "Conversion of {} ready as {} in {}ms",
                    file.name(),
                    job_id,
                    elapsed_ms
                );
                let state = WorkflowState::Ready {
                    job_id: job_id.clone(),
                };
                {
                    let mut draft = self.lock();
                    draft.file = None;
                    draft.state = state.clone();
                }
                self.publish(&state);
                Ok(SubmitOutcome::Submitted { job_id })
            }
            Err(e) => {
                warn!("Conversion of {} failed after {}ms: {}", file.name(), elapsed_ms, e);
                let state = WorkflowState::Failed {
                    reason: e.to_string(),
                };
                self.lock().state = state.clone();
                self.publish(&state);
                let err = ClientError::from(e);
                if self.inner.scope.is_mounted() {
                    self.inner.observer.on_notice(&err.notice());
                }
                Err(err)
            }
        }
    }

    fn publish(&self, state: &WorkflowState) {
        if self.inner.scope.is_mounted() {
            self.inner.observer.on_workflow_state(state);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Draft> {
        self.inner.draft.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
