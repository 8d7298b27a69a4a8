//! Client configuration

/// Configuration for the HTTP client
///
/// The bearer credential is carried here explicitly; nothing reads ambient
/// storage behind the caller's back.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL, e.g. "http://localhost:3000"
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout: u64,
    /// Opaque bearer credential supplied by the auth collaborator
    pub token: Option<String>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: 30,
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }
}
