//! External document service configuration.

use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
    /// Base URL of the document REST service.
    pub api_base_url: String,
    /// Bearer token sent with every request.
    pub access_token: Option<String>,
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for DocumentsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentsConfig")
            .field("api_base_url", &self.api_base_url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8088".into(),
            access_token: None,
            request_timeout_secs: 30,
        }
    }
}
