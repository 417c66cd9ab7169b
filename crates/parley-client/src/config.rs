//! Client configuration, resolved once at startup.
//!
//! Supports overriding the backend base URL and the chat path through
//! `PARLEY_API_BASE_URL` and `PARLEY_API_CHAT_PATH`. Nothing else in the
//! client reads the environment.

use std::env;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_CHAT_PATH: &str = "/v1/chat";

const BASE_URL_ENV: &str = "PARLEY_API_BASE_URL";
const CHAT_PATH_ENV: &str = "PARLEY_API_CHAT_PATH";

/// Resolved backend endpoints. Construct once and pass by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Normalized base URL, no trailing slash.
    pub base_url: String,
    /// Path of the chat endpoint, with a leading slash.
    pub chat_path: String,
}

impl ApiConfig {
    /// Builds a config from optional overrides, falling back to defaults.
    pub fn resolve(base_url: Option<&str>, chat_path: Option<&str>) -> Self {
        let base_url = base_url
            .and_then(normalize_base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let chat_path = chat_path
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(ensure_leading_slash)
            .unwrap_or_else(|| DEFAULT_CHAT_PATH.to_string());
        Self {
            base_url,
            chat_path,
        }
    }

    /// Reads overrides from the environment.
    pub fn from_env() -> Self {
        let base_url = env::var(BASE_URL_ENV).ok();
        let chat_path = env::var(CHAT_PATH_ENV).ok();
        Self::resolve(base_url.as_deref(), chat_path.as_deref())
    }

    /// Full URL of the chat endpoint.
    pub fn chat_endpoint(&self) -> String {
        format!("{}{}", self.base_url, self.chat_path)
    }

    /// Full URL of the conversation-list endpoint.
    pub fn conversations_endpoint(&self) -> String {
        format!("{}/v1/conversas", self.base_url)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::resolve(None, None)
    }
}

/// Normalizes a base URL override: absolute http(s) URLs are reduced to
/// origin plus path, anything else just loses its trailing slash. Empty
/// overrides are ignored.
fn normalize_base_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(url) = reqwest::Url::parse(trimmed) {
        if matches!(url.scheme(), "http" | "https") {
            let origin = url.origin().ascii_serialization();
            let path = url.path().trim_end_matches('/');
            return Some(format!("{origin}{path}"));
        }
    }
    Some(trimmed.trim_end_matches('/').to_string())
}

fn ensure_leading_slash(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}
