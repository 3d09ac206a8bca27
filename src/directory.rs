//! The client-side list of the user's conversion jobs.
//!
//! The list is owned by the view that fetched it. It mirrors the backend:
//! entries appear only when a fetch returns them and disappear only when the
//! backend confirmed the delete, so the view never shows something that
//! did not happen server-side.

use crate::backend::ConversionBackend;
use crate::error::{ClientError, DirectoryError};
use crate::identity::SessionWatch;
use crate::job::{ConversionJob, JobId};
use crate::session::IdentityContext;
use crate::view::{NoopObserver, Observer, ViewScope};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

/// Authoritative client-side list of conversion jobs.
pub struct JobDirectory {
    backend: Arc<dyn ConversionBackend>,
    session: SessionWatch,
    jobs: Mutex<Vec<ConversionJob>>,
    scope: ViewScope,
    observer: Observer,
}

impl JobDirectory {
    pub fn new(backend: Arc<dyn ConversionBackend>, session: SessionWatch) -> Self {
        Self {
            backend,
            session,
            jobs: Mutex::new(Vec::new()),
            scope: ViewScope::new(),
            observer: Arc::new(NoopObserver),
        }
    }

    /// Tie the directory to a view's lifetime.
    pub fn with_scope(mut self, scope: ViewScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = observer;
        self
    }

    pub fn backend(&self) -> &Arc<dyn ConversionBackend> {
        &self.backend
    }

    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    /// Identity of the current session, if signed in.
    pub fn identity(&self) -> Option<IdentityContext> {
        self.session.borrow().identity()
    }

    /// Snapshot of the in-memory list.
    pub fn jobs(&self) -> Vec<ConversionJob> {
        self.lock().clone()
    }

    pub fn get(&self, id: &JobId) -> Option<ConversionJob> {
        self.lock().iter().find(|j| j.id() == id).cloned()
    }

    pub fn contains(&self, id: &JobId) -> bool {
        self.lock().iter().any(|j| j.id() == id)
    }

    /// Fetch the list fresh from the backend, in server order.
    ///
    /// On failure the in-memory list is left as it was.
    pub async fn list(&self) -> Result<Vec<ConversionJob>, DirectoryError> {
        let identity = self.require_identity()?;
        let fetched = match self.backend.list(&identity).await {
            Ok(jobs) => dedup_by_id(jobs),
            Err(e) => {
                warn!("Failed to fetch conversions: {}", e);
                self.alert(&e);
                return Err(e);
            }
        };

        if !self.scope.is_mounted() {
            debug!("View unmounted, discarding {} fetched conversions", fetched.len());
            return Ok(fetched);
        }

        *self.lock() = fetched.clone();
        self.observer.on_directory_changed(&fetched);
        Ok(fetched)
    }

    /// Delete a job remotely, then drop it from the list.
    ///
    /// Returns `true` when the backend confirmed the delete. An id not in
    /// the list is a no-op that sends nothing and returns `false`. The
    /// delete is attempted once; on failure the list is unchanged and the
    /// error is returned.
    pub async fn remove(&self, id: &JobId) -> Result<bool, DirectoryError> {
        if !self.contains(id) {
            debug!("Conversion {} not listed, nothing to remove", id);
            return Ok(false);
        }
        let identity = self.require_identity()?;

        if let Err(e) = self.backend.delete(&identity, id).await {
            warn!("Failed to delete conversion {}: {}", id, e);
            self.alert(&e);
            return Err(e);
        }

        if !self.scope.is_mounted() {
            debug!("View unmounted, not pruning {}", id);
            return Ok(true);
        }

        let snapshot = {
            let mut jobs = self.lock();
            let before = jobs.len();
            jobs.retain(|j| j.id() != id);
            (jobs.len() != before).then(|| jobs.clone())
        };
        if let Some(jobs) = snapshot {
            info!("Removed conversion {}", id);
            self.observer.on_directory_changed(&jobs);
        }
        Ok(true)
    }

    /// Make sure a freshly submitted job shows up; refetches if it is
    /// not listed yet.
    pub async fn reconcile(&self, id: &JobId) -> Result<(), DirectoryError> {
        if self.contains(id) {
            return Ok(());
        }
        debug!("Conversion {} not listed yet, refreshing", id);
        self.list().await.map(|_| ())
    }

    fn require_identity(&self) -> Result<IdentityContext, DirectoryError> {
        self.identity().ok_or(DirectoryError::Unauthenticated)
    }

    fn alert(&self, e: &DirectoryError) {
        if self.scope.is_mounted() {
            self.observer
                .on_notice(&ClientError::from(e.clone()).notice());
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ConversionJob>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keep the first occurrence of every id, preserving order.
fn dedup_by_id(jobs: Vec<ConversionJob>) -> Vec<ConversionJob> {
    let mut seen = HashSet::with_capacity(jobs.len());
    jobs.into_iter()
        .filter(|j| seen.insert(j.id().clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobStatus;
    use crate::language::LanguageCode;

    fn job(id: &str, name: &str) -> ConversionJob {
        ConversionJob::new(JobId::new(id), name, LanguageCode::new("en"), JobStatus::Ready)
    }

    #[test]
    fn dedup_keeps_first_and_order() {
        let out = dedup_by_id(vec![
            job("3", "c.pdf"),
            job("1", "a.pdf"),
            job("3", "dup.pdf"),
            job("2", "b.pdf"),
        ]);
        let ids: Vec<&str> = out.iter().map(|j| j.id().as_str()).collect();
        assert_eq!(ids, ["3", "1", "2"]);
        assert_eq!(out[0].filename(), "c.pdf");
    }
}
