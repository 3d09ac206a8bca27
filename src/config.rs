//! Configuration types for the conversion client.
//!
//! All client behaviour is controlled through [`ClientConfig`], built via its
//! [`ClientConfigBuilder`]. The identity provider has its own
//! [`FirebaseConfig`] because it talks to a different host with different
//! credentials.

use crate::error::ClientError;
use crate::language::LanguageCode;
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Address of the conversion backend used during local development.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Configuration for the conversion backend client.
///
/// Built via [`ClientConfig::builder()`] or using [`ClientConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2audio_client::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("https://tts.example.com")
///     .default_language("fr")
///     .build()
///     .unwrap();
/// assert_eq!(config.download_base(), "https://tts.example.com/download");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Root address of the conversion backend. Default: `http://localhost:8000`.
    pub base_url: String,

    /// Base address artifact links are composed from.
    /// If None, `{base_url}/download` is used.
    pub download_base: Option<String>,

    /// Timeout for listing, deleting and downloading, in seconds. Default: 30.
    pub request_timeout_secs: u64,

    /// Timeout for `POST /convert/`, in seconds. Default: 600.
    ///
    /// The backend runs OCR and speech synthesis before it answers, so a
    /// submission of a long document can take minutes.
    pub upload_timeout_secs: u64,

    /// Language a fresh draft starts with. Default: `en`.
    pub default_language: LanguageCode,

    /// File extensions the selection surface accepts (lower-case, no dot).
    /// Default: `["pdf"]`.
    pub accepted_extensions: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            download_base: None,
            request_timeout_secs: 30,
            upload_timeout_secs: 600,
            default_language: LanguageCode::new("en"),
            accepted_extensions: vec!["pdf".to_string()],
        }
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Base address without a trailing slash.
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Base address artifact links are composed from.
    pub fn download_base(&self) -> String {
        match self.download_base {
            Some(ref b) => b.trim_end_matches('/').to_string(),
            None => format!("{}/download", self.base()),
        }
    }

    /// Absolute URL for a backend path such as `/conversions/`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base(), path)
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn download_base(mut self, url: impl Into<String>) -> Self {
        self.config.download_base = Some(url.into());
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn upload_timeout_secs(mut self, secs: u64) -> Self {
        self.config.upload_timeout_secs = secs;
        self
    }

    pub fn default_language(mut self, code: impl Into<String>) -> Self {
        self.config.default_language = LanguageCode::new(code);
        self
    }

    pub fn accepted_extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.accepted_extensions = exts
            .into_iter()
            .map(|e| e.into().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, ClientError> {
        let c = &self.config;
        parse_http_url(&c.base_url)?;
        if let Some(ref b) = c.download_base {
            parse_http_url(b)?;
        }
        if c.request_timeout_secs == 0 || c.upload_timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "Timeouts must be ≥ 1 second".into(),
            ));
        }
        if c.default_language.is_empty() {
            return Err(ClientError::InvalidConfig(
                "Default language must not be empty".into(),
            ));
        }
        if c.accepted_extensions.is_empty() {
            return Err(ClientError::InvalidConfig(
                "At least one accepted file extension is required".into(),
            ));
        }
        Ok(self.config)
    }
}

fn parse_http_url(raw: &str) -> Result<Url, ClientError> {
    let url = Url::parse(raw)
        .map_err(|e| ClientError::InvalidConfig(format!("'{raw}' is not a valid URL: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ClientError::InvalidConfig(format!(
            "'{raw}' must use http or https, got '{other}'"
        ))),
    }
}

/// Default Identity Toolkit REST endpoint.
pub const DEFAULT_IDENTITY_ENDPOINT: &str = "https://identitytoolkit.googleapis.com/v1";

/// Configuration for [`crate::firebase::FirebaseIdentityProvider`].
#[derive(Clone, Default)]
pub struct FirebaseConfig {
    /// Web API key of the Firebase project.
    pub api_key: String,

    /// REST endpoint. If None, [`DEFAULT_IDENTITY_ENDPOINT`].
    pub endpoint: Option<String>,

    /// Federated provider id, e.g. `google.com`.
    pub federated_provider: Option<String>,

    /// OAuth id token obtained from the federated provider's own flow.
    ///
    /// A terminal has no popup window; the credential has to be obtained
    /// out of band and handed in here.
    pub federated_id_token: Option<String>,

    /// Request timeout in seconds. Default (when 0): 30.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for FirebaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseConfig")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("federated_provider", &self.federated_provider)
            .field(
                "federated_id_token",
                &self.federated_id_token.as_ref().map(|_| "<redacted>"),
            )
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl FirebaseConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or(DEFAULT_IDENTITY_ENDPOINT)
            .trim_end_matches('/')
    }

    pub fn timeout_secs(&self) -> u64 {
        if self.timeout_secs == 0 {
            30
        } else {
            self.timeout_secs
        }
    }
}
