use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::SheetError;
use crate::config::ConfigError;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const ASSERTION_LIFETIME_SECS: u64 = 3600;
// Refresh this long before the token actually expires.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

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
    expires_in: u64,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Service-account authenticator for the Sheets API.
///
/// Signs a JWT assertion with the account's RSA key and trades it for a
/// bearer token at the Google OAuth endpoint. Tokens are cached behind an
/// `RwLock` and refreshed with a safety margin before expiry.
pub(super) struct ServiceAccountAuth {
    email: String,
    key: EncodingKey,
    http: reqwest::Client,
    cached: RwLock<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    /// Validates the private key eagerly so a malformed PEM fails startup
    /// instead of the first request.
    pub fn new(email: &str, private_key_pem: &str) -> Result<Self, ConfigError> {
        let key =
            EncodingKey::from_rsa_pem(private_key_pem.as_bytes()).map_err(|err| {
                ConfigError::Invalid {
                    var: "SERVICE_ACCOUNT_PRIVATE_KEY".into(),
                    reason: err.to_string(),
                }
            })?;

        Ok(Self {
            email: email.to_string(),
            key,
            http: reqwest::Client::new(),
            cached: RwLock::new(None),
        })
    }

    /// Returns a bearer token valid for at least [`EXPIRY_MARGIN`].
    pub async fn bearer_token(&self) -> Result<String, SheetError> {
        if let Some(cached) = self.cached.read().await.as_ref() {
            if cached.expires_at > Instant::now() + EXPIRY_MARGIN {
                return Ok(cached.access_token.clone());
            }
        }

        let mut slot = self.cached.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(cached) = slot.as_ref() {
            if cached.expires_at > Instant::now() + EXPIRY_MARGIN {
                return Ok(cached.access_token.clone());
            }
        }

        let token = self.fetch_token().await?;
        let access_token = token.access_token.clone();
        *slot = Some(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        Ok(access_token)
    }

    async fn fetch_token(&self) -> Result<TokenResponse, SheetError> {
        let assertion = self.signed_assertion()?;

        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|err| SheetError::Auth(err.to_string()))?;

        if !response.status().is_success() {
            return Err(SheetError::Auth(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|err| SheetError::Auth(err.to_string()))
    }

    fn signed_assertion(&self) -> Result<String, SheetError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|err| SheetError::Auth(err.to_string()))?
            .as_secs();

        let claims = Claims {
            iss: &self.email,
            scope: SCOPE,
            aud: TOKEN_URL,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|err| SheetError::Auth(err.to_string()))
    }
}
