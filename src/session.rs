//! The authenticated principal as seen by the client.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Resolution state of a [`Session`].
///
/// `Unresolved` and `Anonymous` are deliberately distinct: a session that has
/// not heard from the identity provider yet may still turn out to be signed
/// in, so nothing may redirect on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Unresolved,
    Authenticated,
    Anonymous,
}

/// A signed-in user as reported by the identity provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Provider-assigned user id.
    pub uid: String,
    /// Email / display identifier.
    pub email: Option<String>,
    /// Opaque bearer token attached to backend calls.
    pub id_token: String,
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .field("id_token", &"<redacted>")
            .finish()
    }
}

/// Identity attached to every outbound backend call.
#[derive(Clone, PartialEq, Eq)]
pub struct IdentityContext {
    pub uid: String,
    pub bearer_token: String,
}

impl fmt::Debug for IdentityContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityContext")
            .field("uid", &self.uid)
            .finish_non_exhaustive()
    }
}

/// Client-side view of the current authentication principal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    status: SessionStatus,
    principal: Option<Principal>,
}

impl Session {
    /// The state at process start, before the provider has reported.
    pub fn unresolved() -> Self {
        Self::default()
    }

    pub fn anonymous() -> Self {
        Self {
            status: SessionStatus::Anonymous,
            principal: None,
        }
    }

    pub fn authenticated(principal: Principal) -> Self {
        Self {
            status: SessionStatus::Authenticated,
            principal: Some(principal),
        }
    }

    /// Session for a provider notification (`None` = signed out).
    pub fn from_notification(principal: Option<Principal>) -> Self {
        match principal {
            Some(p) => Self::authenticated(p),
            None => Self::anonymous(),
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.status != SessionStatus::Unresolved
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }

    /// Email of the signed-in user, if any.
    pub fn email(&self) -> Option<&str> {
        self.principal.as_ref().and_then(|p| p.email.as_deref())
    }

    /// Identity for backend calls; `None` unless authenticated.
    pub fn identity(&self) -> Option<IdentityContext> {
        match (self.status, &self.principal) {
            (SessionStatus::Authenticated, Some(p)) => Some(IdentityContext {
                uid: p.uid.clone(),
                bearer_token: p.id_token.clone(),
            }),
            _ => None,
        }
    }
}
