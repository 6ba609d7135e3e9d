//! Bearer token storage.
//!
//! The backend authenticates every call with a JWT. The token is kept in an
//! `auth_token` file next to leadboard.toml, and `LEADBOARD_TOKEN` overrides
//! it when set.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use tracing::{debug, warn};

pub const TOKEN_ENV: &str = "LEADBOARD_TOKEN";
const TOKEN_FILE: &str = "auth_token";

/// Provides the bearer credential for backend requests.
pub trait TokenSource: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// A fixed token, mostly for tests and one-shot commands.
#[derive(Debug, Clone)]
pub struct StaticToken(pub Option<String>);

impl TokenSource for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        self.0.clone()
    }
}

#[derive(Deserialize)]
struct Claims {
    exp: Option<i64>,
}

/// Whether `token` is a decodable JWT that has not expired.
///
/// Only the payload segment is inspected; the signature is the backend's
/// concern. A token without an `exp` claim never expires.
pub fn is_token_valid(token: &str) -> bool {
    is_token_valid_at(token, chrono::Utc::now().timestamp())
}

fn is_token_valid_at(token: &str, now: i64) -> bool {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_sig)) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    let Ok(bytes) = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')) else {
        return false;
    };
    match serde_json::from_slice::<Claims>(&bytes) {
        Ok(Claims { exp: Some(exp) }) => exp > now,
        Ok(Claims { exp: None }) => true,
        Err(_) => false,
    }
}

/// File-backed token store with an environment override.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store next to a config file. For the default config this is
    /// `<config dir>/leadboard/auth_token`.
    pub fn beside(config_path: &Path) -> Self {
        let dir = config_path.parent().unwrap_or_else(|| Path::new("."));
        Self::new(dir.join(TOKEN_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&self.path, token.trim())
            .with_context(|| format!("Failed to write token file: {}", self.path.display()))?;
        Ok(())
    }

    /// Remove the stored token. Returns false if there was none.
    pub fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.path)
            .with_context(|| format!("Failed to remove token file: {}", self.path.display()))?;
        Ok(true)
    }

    /// Load a valid token. An expired stored token is deleted.
    pub fn load(&self) -> Option<String> {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            let token = token.trim().to_string();
            if !token.is_empty() {
                if !is_token_valid(&token) {
                    warn!("{} holds an invalid or expired token", TOKEN_ENV);
                    return None;
                }
                return Some(token);
            }
        }

        let token = std::fs::read_to_string(&self.path).ok()?;
        let token = token.trim().to_string();
        if is_token_valid(&token) {
            return Some(token);
        }

        debug!(path = %self.path.display(), "removing invalid stored token");
        if let Err(e) = self.clear() {
            warn!("failed to remove stale token: {:#}", e);
        }
        None
    }
}

impl TokenSource for FileTokenStore {
    fn bearer_token(&self) -> Option<String> {
        self.load()
    }
}

#[cfg(test)]
pub(crate) fn test_jwt(exp: Option<i64>) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = match exp {
        Some(exp) => serde_json::json!({"sub": "admin", "exp": exp}),
        None => serde_json::json!({"sub": "admin"}),
    };
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.signature", header, payload)
}
