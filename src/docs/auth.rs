//! Service-account authentication for the Docs API.
//!
//! A signed RS256 JWT is exchanged at the key's token URI for a short-lived bearer token.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ArchiveError, Result};

pub const DOCUMENTS_SCOPE: &str = "https://www.googleapis.com/auth/documents";
const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const ASSERTION_LIFETIME_SECS: u64 = 3600;
const REFRESH_MARGIN_SECS: u64 = 60;

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ArchiveError::document("credentials", format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&raw)
            .map_err(|e| ArchiveError::document("credentials", format!("{}: {}", path.display(), e)))
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Debug, Clone)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: u64,
}

impl AccessToken {
    fn is_fresh(&self, now: u64) -> bool {
        now + REFRESH_MARGIN_SECS < self.expires_at
    }
}

/// Where bearer tokens come from.
pub enum TokenSource {
    /// A pre-issued token, used as-is.
    Fixed(String),
    ServiceAccount {
        key: ServiceAccountKey,
        cached: Option<AccessToken>,
    },
}

impl TokenSource {
    pub fn service_account(key: ServiceAccountKey) -> Self {
        TokenSource::ServiceAccount { key, cached: None }
    }

    /// Current bearer token, exchanging a fresh assertion when the cached one is near expiry.
    pub fn bearer(&mut self, http: &reqwest::blocking::Client) -> Result<String> {
        match self {
            TokenSource::Fixed(token) => Ok(token.clone()),
            TokenSource::ServiceAccount { key, cached } => {
                let now = now_secs();
                if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
                    return Ok(token.value.clone());
                }
                let token = fetch_access_token(http, key, now)?;
                let value = token.value.clone();
                *cached = Some(token);
                Ok(value)
            }
        }
    }
}

fn sign_assertion(key: &ServiceAccountKey, now: u64) -> Result<String> {
    let claims = Claims {
        iss: &key.client_email,
        scope: DOCUMENTS_SCOPE,
        aud: &key.token_uri,
        iat: now,
        exp: now + ASSERTION_LIFETIME_SECS,
    };
    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| ArchiveError::document("authenticate", e))?;
    jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &signing_key)
        .map_err(|e| ArchiveError::document("authenticate", e))
}

pub fn fetch_access_token(
    http: &reqwest::blocking::Client,
    key: &ServiceAccountKey,
    now: u64,
) -> Result<AccessToken> {
    let assertion = sign_assertion(key, now)?;
    debug!(client = %key.client_email, "Exchanging service-account assertion");

    let response: TokenResponse = http
        .post(&key.token_uri)
        .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
        .send()
        .and_then(|r| r.error_for_status())
        .and_then(|r| r.json())
        .map_err(|e| ArchiveError::document("authenticate", e))?;

    Ok(AccessToken {
        value: response.access_token,
        expires_at: now + response.expires_in,
    })
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
