//! Locating, downloading and deleting conversion artifacts.
//!
//! Artifacts are plain downloads addressed by job id; the client composes
//! the link and never parses the artifact itself. Once a job is deleted
//! through here its link is revoked, even though the file may linger on the
//! server for a moment.

use crate::directory::JobDirectory;
use crate::error::{ClientError, DirectoryError};
use crate::job::{ConversionJob, JobId};
use futures::StreamExt;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Compose the download link for `id` under `base`.
///
/// Pure string composition; does not check that the artifact exists.
pub fn locate(base: &str, id: &JobId) -> String {
    format!("{}/{}", base.trim_end_matches('/'), id)
}

/// Link resolution, download and delete for one directory.
pub struct ArtifactAccess {
    base: String,
    directory: Arc<JobDirectory>,
    revoked: Mutex<HashSet<JobId>>,
}

impl ArtifactAccess {
    /// `download_base` is usually [`crate::ClientConfig::download_base`].
    pub fn new(download_base: impl Into<String>, directory: Arc<JobDirectory>) -> Self {
        Self {
            base: download_base.into(),
            directory,
            revoked: Mutex::new(HashSet::new()),
        }
    }

    /// Download link for `id`. Only meaningful once the job is ready.
    pub fn locate(&self, id: &JobId) -> String {
        locate(&self.base, id)
    }

    /// The link to offer for `job`: none unless the job is ready and was
    /// not deleted through this access point.
    pub fn link_for(&self, job: &ConversionJob) -> Option<String> {
        if !job.is_ready() || self.is_revoked(job.id()) {
            return None;
        }
        Some(self.locate(job.id()))
    }

    pub fn is_revoked(&self, id: &JobId) -> bool {
        self.revoked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }

    /// Delete through the directory, refreshing it first if `id` is not
    /// listed yet. The link is revoked only once the backend confirmed the
    /// delete; returns whether it did.
    pub async fn delete(&self, id: &JobId) -> Result<bool, DirectoryError> {
        self.directory.reconcile(id).await?;
        if !self.directory.remove(id).await? {
            debug!("Conversion {} not found, nothing deleted", id);
            return Ok(false);
        }
        self.revoked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone());
        debug!("Revoked download link for {}", id);
        Ok(true)
    }

    /// Stream the artifact of `id` into `dest`.
    ///
    /// Written to a sibling `.part` file and renamed into place, so `dest`
    /// never holds a partial artifact. Returns the number of bytes written.
    pub async fn download(&self, id: &JobId, dest: impl AsRef<Path>) -> Result<u64, ClientError> {
        if self.is_revoked(id) {
            return Err(ClientError::ArtifactRevoked { id: id.to_string() });
        }
        let identity = self
            .directory
            .identity()
            .ok_or(DirectoryError::Unauthenticated)?;
        let dest = dest.as_ref();

        let mut chunks = self
            .directory
            .backend()
            .fetch_artifact(&identity, id)
            .await
            .inspect_err(|e| warn!("Download of {} failed: {}", id, e))?;

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_err(parent, e))?;
        }

        let tmp = part_path(dest);
        let mut file = tokio::fs::File::create(&tmp)
            .await
            .map_err(|e| io_err(&tmp, e))?;

        let mut written = 0u64;
        while let Some(chunk) = chunks.next().await {
            let chunk = match chunk {
                Ok(c) => c,
                Err(e) => {
                    drop(file);
                    let _ = tokio::fs::remove_file(&tmp).await;
                    warn!("Download of {} interrupted: {}", id, e);
                    return Err(e.into());
                }
            };
            file.write_all(&chunk).await.map_err(|e| io_err(&tmp, e))?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| io_err(&tmp, e))?;
        drop(file);

        tokio::fs::rename(&tmp, dest)
            .await
            .map_err(|e| io_err(dest, e))?;
        info!("Downloaded {} ({} bytes) to {}", id, written, dest.display());
        Ok(written)
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "artifact".into());
    name.push(".part");
    dest.with_file_name(name)
}

fn io_err(path: &Path, source: std::io::Error) -> ClientError {
    ClientError::Io {
        path: path.to_path_buf(),
        source,
    }
}
