//! Shared fakes for the integration tests.
//!
//! `FakeProvider` is driven by hand through an mpsc sender, so a test decides
//! exactly when the identity provider "reports". `FakeBackend` keeps jobs in
//! memory, counts calls, and can hold a submission open until released.

#![allow(dead_code)]

use async_trait::async_trait;
use pdf2audio_client::{
    ArtifactStream, AuthError, ConversionBackend, ConversionJob, DirectoryError, DocumentFile,
    IdentityContext, IdentityGate, IdentityProvider, IdentityStream, JobId, JobStatus,
    LanguageCode, Notice, Principal, UploadError, ViewObserver, WorkflowState,
};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Notify};
use tokio_stream::wrappers::UnboundedReceiverStream;

// ── Identity ─────────────────────────────────────────────────────────────────

pub fn principal(uid: &str) -> Principal {
    Principal {
        uid: uid.to_string(),
        email: Some(format!("{uid}@example.com")),
        id_token: format!("token-{uid}"),
    }
}

pub struct FakeProvider {
    feed: Mutex<Option<mpsc::UnboundedReceiver<Option<Principal>>>>,
    pub calls: AtomicUsize,
    pub sign_out_calls: AtomicUsize,
    pub reject: AtomicBool,
    pub fail_sign_out: AtomicBool,
}

impl FakeProvider {
    /// The provider plus the sender that plays its change notifications.
    pub fn new() -> (Arc<Self>, mpsc::UnboundedSender<Option<Principal>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let provider = Arc::new(Self {
            feed: Mutex::new(Some(rx)),
            calls: AtomicUsize::new(0),
            sign_out_calls: AtomicUsize::new(0),
            reject: AtomicBool::new(false),
            fail_sign_out: AtomicBool::new(false),
        });
        (provider, tx)
    }

    fn answer(&self, identifier: &str) -> Result<Principal, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.reject.load(Ordering::SeqCst) {
            return Err(AuthError::Rejected {
                reason: "INVALID_LOGIN_CREDENTIALS".into(),
            });
        }
        let uid = identifier.split('@').next().unwrap_or(identifier);
        Ok(principal(uid))
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    async fn create_account(&self, identifier: &str, _secret: &str) -> Result<Principal, AuthError> {
        self.answer(identifier)
    }

    async fn authenticate(&self, identifier: &str, _secret: &str) -> Result<Principal, AuthError> {
        self.answer(identifier)
    }

    async fn authenticate_federated(&self) -> Result<Principal, AuthError> {
        self.answer("google-user")
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(AuthError::Transport {
                reason: "connection reset".into(),
            });
        }
        Ok(())
    }

    fn subscribe(&self) -> IdentityStream {
        match self.feed.lock().unwrap().take() {
            Some(rx) => Box::pin(UnboundedReceiverStream::new(rx)),
            None => Box::pin(futures::stream::empty()),
        }
    }
}

/// A gate whose provider has already reported `uid` as signed in.
pub async fn signed_in_gate(
    uid: &str,
) -> (
    IdentityGate,
    Arc<FakeProvider>,
    mpsc::UnboundedSender<Option<Principal>>,
) {
    let (provider, tx) = FakeProvider::new();
    let gate = IdentityGate::start(provider.clone());
    tx.send(Some(principal(uid))).unwrap();
    let session = gate.wait_resolved().await.unwrap();
    assert!(session.is_authenticated());
    (gate, provider, tx)
}

/// A gate whose provider has reported nobody signed in.
pub async fn anonymous_gate() -> (
    IdentityGate,
    Arc<FakeProvider>,
    mpsc::UnboundedSender<Option<Principal>>,
) {
    let (provider, tx) = FakeProvider::new();
    let gate = IdentityGate::start(provider.clone());
    tx.send(None).unwrap();
    gate.wait_resolved().await.unwrap();
    (gate, provider, tx)
}

// ── Backend ──────────────────────────────────────────────────────────────────

pub fn job(id: &str, filename: &str, language: &str) -> ConversionJob {
    ConversionJob::new(
        JobId::new(id),
        filename,
        LanguageCode::new(language),
        JobStatus::Ready,
    )
}

pub fn pdf(name: &str) -> DocumentFile {
    DocumentFile::new(name, b"%PDF-1.4\n%test\n".to_vec())
}

pub struct FakeBackend {
    jobs: Mutex<Vec<ConversionJob>>,
    next_id: AtomicU64,
    pub submits: AtomicUsize,
    pub lists: AtomicUsize,
    pub deletes: AtomicUsize,
    pub fail_submit: AtomicBool,
    pub fail_list: AtomicBool,
    pub fail_delete: AtomicBool,
    hold_submit: AtomicBool,
    /// Notified when a submission reaches the backend.
    pub entered: Notify,
    /// Notify once to let a held submission finish.
    pub release: Notify,
    pub artifact: Vec<u8>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Self::with_jobs(Vec::new())
    }

    pub fn with_jobs(jobs: Vec<ConversionJob>) -> Arc<Self> {
        Arc::new(Self {
            jobs: Mutex::new(jobs),
            next_id: AtomicU64::new(7),
            submits: AtomicUsize::new(0),
            lists: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
            fail_submit: AtomicBool::new(false),
            fail_list: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            hold_submit: AtomicBool::new(false),
            entered: Notify::new(),
            release: Notify::new(),
            artifact: b"RIFF....WAVEfmt fake audio payload".to_vec(),
        })
    }

    /// Make every submission wait for [`FakeBackend::release`].
    pub fn hold_submissions(&self) {
        self.hold_submit.store(true, Ordering::SeqCst);
    }

    pub fn stored_ids(&self) -> Vec<String> {
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .map(|j| j.id().to_string())
            .collect()
    }
}

#[async_trait]
impl ConversionBackend for FakeBackend {
    async fn submit(
        &self,
        _identity: &IdentityContext,
        file: &DocumentFile,
        language: &LanguageCode,
    ) -> Result<JobId, UploadError> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        if self.hold_submit.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(UploadError::Status {
                status: 500,
                detail: "tts engine crashed".into(),
            });
        }
        let id = JobId::new(self.next_id.fetch_add(1, Ordering::SeqCst).to_string());
        self.jobs.lock().unwrap().push(ConversionJob::new(
            id.clone(),
            file.name(),
            language.clone(),
            JobStatus::Ready,
        ));
        Ok(id)
    }

    async fn list(&self, _identity: &IdentityContext) -> Result<Vec<ConversionJob>, DirectoryError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(DirectoryError::Request {
                url: "http://fake/conversions/".into(),
                reason: "connection refused".into(),
            });
        }
        Ok(self.jobs.lock().unwrap().clone())
    }

    async fn delete(&self, _identity: &IdentityContext, id: &JobId) -> Result<(), DirectoryError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(DirectoryError::Status {
                url: format!("http://fake/conversions/{id}"),
                status: 500,
            });
        }
        // Already gone counts as deleted.
        self.jobs.lock().unwrap().retain(|j| j.id() != id);
        Ok(())
    }

    async fn fetch_artifact(
        &self,
        _identity: &IdentityContext,
        id: &JobId,
    ) -> Result<ArtifactStream, DirectoryError> {
        if !self.jobs.lock().unwrap().iter().any(|j| j.id() == id) {
            return Err(DirectoryError::Status {
                url: format!("http://fake/download/{id}"),
                status: 404,
            });
        }
        let (head, tail) = self.artifact.split_at(self.artifact.len() / 2);
        let chunks: Vec<Result<Vec<u8>, DirectoryError>> = vec![Ok(head.to_vec()), Ok(tail.to_vec())];
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}

// ── Observer ─────────────────────────────────────────────────────────────────

/// Records every observer call.
#[derive(Default)]
pub struct Recorder {
    pub states: Mutex<Vec<WorkflowState>>,
    pub lists: Mutex<Vec<Vec<String>>>,
    pub notices: Mutex<Vec<Notice>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn state_names(&self) -> Vec<&'static str> {
        self.states.lock().unwrap().iter().map(|s| s.name()).collect()
    }
}

impl ViewObserver for Recorder {
    fn on_workflow_state(&self, state: &WorkflowState) {
        self.states.lock().unwrap().push(state.clone());
    }

    fn on_directory_changed(&self, jobs: &[ConversionJob]) {
        self.lists
            .lock()
            .unwrap()
            .push(jobs.iter().map(|j| j.id().to_string()).collect());
    }

    fn on_notice(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }
}
