//! Access tokens for the Sheets API.
//!
//! [`ServiceAccountTokens`] implements the OAuth 2.0 JWT-bearer grant:
//!
//! 1. Sign an RS256 assertion (`iss`, `scope`, `aud`, `iat`, `exp`).
//! 2. POST it to the token URI as `grant_type=…jwt-bearer`.
//! 3. Cache the returned token until shortly before it expires.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use staffsync_core::config::ServiceAccountConfig;

use crate::error::GridError;

pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

/// Supplies a bearer token for each Sheets request.
pub trait TokenSource: Send + Sync {
    fn access_token(&self) -> Result<String, GridError>;
}

/// A fixed token, for tests and pre-authorized environments.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl TokenSource for StaticToken {
    fn access_token(&self) -> Result<String, GridError> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    refresh_after: DateTime<Utc>,
}

/// Mints and caches tokens from a service-account credential set.
pub struct ServiceAccountTokens {
    agent: ureq::Agent,
    credentials: ServiceAccountConfig,
    key: EncodingKey,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokens {
    /// Parse the PEM key up front so a bad credential fails at startup.
    pub fn new(credentials: ServiceAccountConfig) -> Result<Self, GridError> {
        let key = EncodingKey::from_rsa_pem(credentials.private_key.as_bytes())
            .map_err(|err| GridError::Auth(format!("invalid service account key: {err}")))?;
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();
        Ok(Self {
            agent,
            credentials,
            key,
            cached: Mutex::new(None),
        })
    }

    fn sign_assertion(&self, now: DateTime<Utc>) -> Result<String, GridError> {
        let claims = AssertionClaims {
            iss: &self.credentials.client_email,
            scope: SPREADSHEETS_SCOPE,
            aud: &self.credentials.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };
        encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|err| GridError::Auth(format!("failed to sign assertion: {err}")))
    }

    fn exchange(&self, now: DateTime<Utc>) -> Result<CachedToken, GridError> {
        let assertion = self.sign_assertion(now)?;
        let response = self
            .agent
            .post(&self.credentials.token_uri)
            .send_form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", &assertion)])
            .map_err(|err| match GridError::from(err) {
                GridError::Api { status, message } => {
                    GridError::Auth(format!("token endpoint returned {status}: {message}"))
                }
                other => other,
            })?;
        let body: TokenResponse = response
            .into_json()
            .map_err(|err| GridError::Decode(format!("token response: {err}")))?;
        let lifetime = (body.expires_in - REFRESH_MARGIN_SECS).max(0);
        tracing::debug!("minted sheets access token valid for {}s", body.expires_in);
        Ok(CachedToken {
            token: body.access_token,
            refresh_after: now + chrono::Duration::seconds(lifetime),
        })
    }
}

impl TokenSource for ServiceAccountTokens {
    fn access_token(&self) -> Result<String, GridError> {
        let now = Utc::now();
        let mut cached = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = cached.as_ref() {
            if now < token.refresh_after {
                return Ok(token.token.clone());
            }
        }
        let fresh = self.exchange(now)?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}
