//! Identity gate: the single owner of the current [`Session`].
//!
//! The gate keeps one subscription to the identity provider's change stream
//! for its whole lifetime. A background task drains that stream in order and
//! writes each notification into a `watch` cell; every other component only
//! reads the cell.
//!
//! ```text
//! provider.subscribe() ──▶ listener task ──▶ watch<Session> ──▶ readers
//!                                              ▲
//!            register / authenticate / sign_out (local, once resolved)
//! ```
//!
//! The explicit calls apply their outcome locally so the UI does not lag
//! behind the provider, but only after the provider has reported at least
//! once. Before that the session stays `Unresolved`, and the next
//! notification always wins.

use crate::error::{AuthError, ClientError, ValidationError};
use crate::session::{IdentityContext, Principal, Session};
use async_trait::async_trait;
use futures::StreamExt;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::Stream;
use tracing::{debug, info, warn};

/// Minimum secret length accepted by [`IdentityGate::register`].
pub const MIN_SECRET_LEN: usize = 6;

/// Ordered stream of identity changes; `None` means signed out.
pub type IdentityStream = Pin<Box<dyn Stream<Item = Option<Principal>> + Send>>;

/// Read side of the session cell handed to other components.
pub type SessionWatch = watch::Receiver<Session>;

/// The external identity provider (email/password and federated sign-in).
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn create_account(&self, identifier: &str, secret: &str) -> Result<Principal, AuthError>;

    async fn authenticate(&self, identifier: &str, secret: &str) -> Result<Principal, AuthError>;

    /// Provider-controlled interactive flow.
    async fn authenticate_federated(&self) -> Result<Principal, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Change notifications. Must yield the current principal (or `None`)
    /// at least once right after subscribing.
    fn subscribe(&self) -> IdentityStream;
}

/// Client-side password policy, checked before any request.
pub fn validate_secret(secret: &str) -> Result<(), ValidationError> {
    let len = secret.chars().count();
    if len < MIN_SECRET_LEN {
        return Err(ValidationError::SecretTooShort {
            min: MIN_SECRET_LEN,
            actual: len,
        });
    }
    if !secret.chars().any(|c| c.is_uppercase()) {
        return Err(ValidationError::SecretMissingUppercase);
    }
    Ok(())
}

/// Holds the current [`Session`] and exposes sign-in, sign-up and sign-out.
pub struct IdentityGate {
    provider: Arc<dyn IdentityProvider>,
    cell: Arc<watch::Sender<Session>>,
    listener: JoinHandle<()>,
}

impl IdentityGate {
    /// Subscribe to `provider` and start the listener task.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(provider: Arc<dyn IdentityProvider>) -> Self {
        let (tx, _rx) = watch::channel(Session::unresolved());
        let cell = Arc::new(tx);
        let mut changes = provider.subscribe();

        let writer = Arc::clone(&cell);
        let listener = tokio::spawn(async move {
            while let Some(principal) = changes.next().await {
                debug!(
                    "Identity change: {}",
                    principal
                        .as_ref()
                        .map(|p| p.uid.as_str())
                        .unwrap_or("<signed out>")
                );
                writer.send_replace(Session::from_notification(principal));
            }
            debug!("Identity change stream closed");
        });

        Self {
            provider,
            cell,
            listener,
        }
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> Session {
        self.cell.borrow().clone()
    }

    /// Receiver that observes every session change.
    pub fn subscribe(&self) -> SessionWatch {
        self.cell.subscribe()
    }

    /// False until the provider has reported for the first time.
    pub fn is_resolved(&self) -> bool {
        self.cell.borrow().is_resolved()
    }

    /// Wait until the provider has reported, then return the session.
    pub async fn wait_resolved(&self) -> Result<Session, ClientError> {
        let mut rx = self.cell.subscribe();
        let session = rx
            .wait_for(|s| s.is_resolved())
            .await
            .map_err(|e| ClientError::Internal(format!("session cell closed: {e}")))?;
        Ok(session.clone())
    }

    /// Identity for backend calls, if signed in.
    pub fn identity(&self) -> Option<IdentityContext> {
        self.cell.borrow().identity()
    }

    /// Create an account. The secret must be at least [`MIN_SECRET_LEN`]
    /// characters and contain an upper-case letter.
    pub async fn register(&self, identifier: &str, secret: &str) -> Result<Session, ClientError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(ValidationError::EmptyIdentifier.into());
        }
        validate_secret(secret)?;

        let principal = self
            .provider
            .create_account(identifier, secret)
            .await
            .inspect_err(|e| warn!("Registration failed for {}: {}", identifier, e))?;
        info!("Registered {}", identifier);
        Ok(self.apply_local(Session::authenticated(principal)))
    }

    /// Sign in with email and password. Validation is left to the provider.
    pub async fn authenticate(&self, identifier: &str, secret: &str) -> Result<Session, ClientError> {
        let principal = self
            .provider
            .authenticate(identifier.trim(), secret)
            .await
            .inspect_err(|e| warn!("Sign-in failed for {}: {}", identifier, e))?;
        info!("Signed in {}", identifier);
        Ok(self.apply_local(Session::authenticated(principal)))
    }

    /// Sign in through the federated provider.
    pub async fn authenticate_with_federated_provider(&self) -> Result<Session, ClientError> {
        let principal = self
            .provider
            .authenticate_federated()
            .await
            .inspect_err(|e| warn!("Federated sign-in failed: {}", e))?;
        info!("Signed in {} via federated provider", principal.uid);
        Ok(self.apply_local(Session::authenticated(principal)))
    }

    /// Sign out. Never leaves the session authenticated, even when the
    /// provider call fails.
    pub async fn sign_out(&self) {
        if let Err(e) = self.provider.sign_out().await {
            warn!("Remote sign-out failed, signing out locally: {}", e);
        }
        self.cell.send_if_modified(|s| {
            if s.is_authenticated() {
                *s = Session::anonymous();
                true
            } else {
                false
            }
        });
        info!("Signed out");
    }

    /// Apply an optimistic result; ignored while unresolved.
    fn apply_local(&self, session: Session) -> Session {
        self.cell.send_if_modified(|current| {
            if current.is_resolved() && *current != session {
                *current = session.clone();
                true
            } else {
                false
            }
        });
        session
    }
}

impl Drop for IdentityGate {
    fn drop(&mut self) {
        self.listener.abort();
    }
}
