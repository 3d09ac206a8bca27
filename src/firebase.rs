//! [`IdentityProvider`] backed by the Firebase Identity Toolkit REST API.
//!
//! The REST API is stateless, so the provider keeps the signed-in principal
//! itself and fans every change out to its subscribers. Nothing is persisted:
//! a new process starts signed out and reports `None` to the first
//! subscriber immediately.

use crate::config::FirebaseConfig;
use crate::error::AuthError;
use crate::identity::{IdentityProvider, IdentityStream};
use crate::session::Principal;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info};

/// Identity provider speaking the Identity Toolkit `accounts:*` endpoints.
pub struct FirebaseIdentityProvider {
    config: FirebaseConfig,
    client: reqwest::Client,
    state: Mutex<Fanout>,
}

/// Current principal and live subscribers, updated together so every
/// subscriber sees changes in the order `current` records them.
#[derive(Default)]
struct Fanout {
    current: Option<Principal>,
    subscribers: Vec<mpsc::UnboundedSender<Option<Principal>>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IdpRequest {
    post_body: String,
    request_uri: &'static str,
    return_secure_token: bool,
    return_idp_credential: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    id_token: String,
    local_id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl FirebaseIdentityProvider {
    pub fn new(config: FirebaseConfig) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs()))
            .build()
            .map_err(|e| AuthError::Transport {
                reason: e.to_string(),
            })?;
        Ok(Self {
            config,
            client,
            state: Mutex::new(Fanout::default()),
        })
    }

    fn url(&self, method: &str) -> String {
        format!(
            "{}/accounts:{}?key={}",
            self.config.endpoint(),
            method,
            self.config.api_key
        )
    }

    async fn call<B: Serialize + ?Sized>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<Principal, AuthError> {
        debug!("Identity Toolkit call: accounts:{}", method);
        let response = self
            .client
            .post(self.url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| AuthError::Transport {
                reason: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| AuthError::Transport {
            reason: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(AuthError::Rejected {
                reason: rejection_reason(&text, status.as_u16()),
            });
        }

        let principal = parse_token_response(&text)?;
        self.notify(Some(principal.clone()));
        Ok(principal)
    }

    /// Record the new principal and push it to every live subscriber.
    fn notify(&self, principal: Option<Principal>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .subscribers
            .retain(|tx| tx.send(principal.clone()).is_ok());
        state.current = principal;
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentityProvider {
    async fn create_account(&self, identifier: &str, secret: &str) -> Result<Principal, AuthError> {
        let principal = self
            .call(
                "signUp",
                &PasswordRequest {
                    email: identifier,
                    password: secret,
                    return_secure_token: true,
                },
            )
            .await?;
        info!("Account created: {}", principal.uid);
        Ok(principal)
    }

    async fn authenticate(&self, identifier: &str, secret: &str) -> Result<Principal, AuthError> {
        self.call(
            "signInWithPassword",
            &PasswordRequest {
                email: identifier,
                password: secret,
                return_secure_token: true,
            },
        )
        .await
    }

    async fn authenticate_federated(&self) -> Result<Principal, AuthError> {
        let (provider, token) = match (
            self.config.federated_provider.as_deref(),
            self.config.federated_id_token.as_deref(),
        ) {
            (Some(p), Some(t)) if !p.is_empty() && !t.is_empty() => (p, t),
            _ => {
                return Err(AuthError::FederatedUnavailable {
                    reason: "no federated provider credential configured".into(),
                })
            }
        };
        self.call(
            "signInWithIdp",
            &IdpRequest {
                post_body: format!("id_token={token}&providerId={provider}"),
                request_uri: "http://localhost",
                return_secure_token: true,
                return_idp_credential: true,
            },
        )
        .await
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        // Identity Toolkit tokens are bearer tokens; dropping them is the
        // sign-out.
        self.notify(None);
        Ok(())
    }

    fn subscribe(&self) -> IdentityStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if tx.send(state.current.clone()).is_ok() {
            state.subscribers.push(tx);
        }
        Box::pin(UnboundedReceiverStream::new(rx))
    }
}

fn parse_token_response(body: &str) -> Result<Principal, AuthError> {
    let token: TokenResponse = serde_json::from_str(body).map_err(|e| AuthError::Decode {
        detail: e.to_string(),
    })?;
    Ok(Principal {
        uid: token.local_id,
        email: token.email,
        id_token: token.id_token,
    })
}

/// Extract the provider's error code (`EMAIL_EXISTS`, `INVALID_PASSWORD`, …).
fn rejection_reason(body: &str, status: u16) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| format!("HTTP {status}"))
}
