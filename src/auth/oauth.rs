//! OAuth refresh token authenticator
//!
//! Exchanges a long-lived refresh token for short-lived access tokens and
//! renews them at half of their advertised lifetime.

use super::authenticator::{probe, set_bearer, Authenticator, ProbeTarget};
use super::login::json_post;
use super::types::AccessToken;
use crate::error::{Error, Result};
use crate::http::{DumpClient, HttpTransport};
use crate::types::DumpFormat;
use async_trait::async_trait;
use chrono::Duration;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

const TOKEN_PATH: &str = "api/oauth2";

/// Signs requests with access tokens obtained from a refresh token
pub struct OAuthAuthenticator {
    refresh_token: String,
    host: RwLock<String>,
    access_token: RwLock<Option<AccessToken>>,
    transport: Arc<dyn HttpTransport>,
}

impl OAuthAuthenticator {
    /// Create an authenticator from a refresh token
    pub fn new(refresh_token: impl Into<String>) -> Self {
        Self::with_transport(refresh_token, Arc::new(DumpClient::default()))
    }

    /// Create an authenticator using a custom transport for token exchanges
    pub fn with_transport(refresh_token: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            refresh_token: refresh_token.into(),
            host: RwLock::new(String::new()),
            access_token: RwLock::new(None),
            transport,
        }
    }

    /// Current access token, if one was obtained
    pub async fn access_token(&self) -> Option<AccessToken> {
        self.access_token.read().await.clone()
    }

    /// Get a valid access token, exchanging the refresh token if necessary
    async fn get_or_refresh_token(&self) -> Result<String> {
        {
            let cached = self.access_token.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.is_expired() {
                    return Ok(token.token.clone());
                }
            }
        }

        let mut cached = self.access_token.write().await;

        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.token.clone());
            }
        }

        let fresh = self.exchange_refresh_token().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    /// POST the refresh token to the token endpoint
    async fn exchange_refresh_token(&self) -> Result<AccessToken> {
        let host = self.host.read().await.clone();
        if host.is_empty() {
            return Err(Error::config("missing host information"));
        }

        let request = json_post(
            &host,
            TOKEN_PATH,
            &json!({
                "grant_type": "refresh_token",
                "refresh_token": self.refresh_token,
            }),
        )?;
        let response = self.transport.execute(request).await?;
        let status = response.status();
        let body = response.bytes().await?;
        if status != StatusCode::OK {
            return Err(Error::auth_failed(
                status.as_u16(),
                String::from_utf8_lossy(&body),
            ));
        }

        let session: Value = serde_json::from_slice(&body)
            .map_err(|e| Error::protocol(format!("failed to load response JSON: {e}")))?;
        let token = session
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::protocol(String::from_utf8_lossy(&body)))?;
        let ttl = parse_expires_in(session.get("expires_in"))?;

        debug!("Access token obtained, valid for {}s", ttl.num_seconds());
        AccessToken::at_half_life(token, ttl)
    }
}

/// Parse the token lifetime, given in seconds as a number or a string
fn parse_expires_in(value: Option<&Value>) -> Result<Duration> {
    let seconds = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    let ttl = seconds
        .filter(|secs| secs.is_finite() && *secs >= 0.0 && secs * 1000.0 < i64::MAX as f64)
        .and_then(|secs| Duration::try_milliseconds((secs * 1000.0) as i64));
    match ttl {
        Some(ttl) => Ok(ttl),
        None => Err(Error::protocol(format!(
            "failed to parse token duration: {}",
            value.map_or_else(|| "missing".to_string(), Value::to_string)
        ))),
    }
}

#[async_trait]
impl Authenticator for OAuthAuthenticator {
    async fn sign(&self, request: &mut reqwest::Request) -> Result<()> {
        let token = self.get_or_refresh_token().await?;
        set_bearer(request, &token)
    }

    async fn set_host(&self, host: &str) {
        *self.host.write().await = host.to_string();
    }

    async fn can_authenticate(&self) -> Result<()> {
        let host = self.host.read().await.clone();
        probe(self, self.transport.as_ref(), &host, ProbeTarget::Account).await
    }

    fn enable_dump(&self, format: DumpFormat) {
        self.transport.enable_dump(format);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for OAuthAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthAuthenticator")
            .field("refresh_token", &"[redacted]")
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_expires_in() {
        assert_eq!(
            parse_expires_in(Some(&json!(3600))).unwrap(),
            Duration::seconds(3600)
        );
        assert_eq!(
            parse_expires_in(Some(&json!("7200"))).unwrap(),
            Duration::seconds(7200)
        );
        assert_eq!(
            parse_expires_in(Some(&json!(1.5))).unwrap(),
            Duration::milliseconds(1500)
        );
    }

    #[test]
    fn test_parse_expires_in_invalid() {
        assert!(matches!(parse_expires_in(None), Err(Error::Protocol { .. })));
        assert!(parse_expires_in(Some(&json!("soon"))).is_err());
        assert!(parse_expires_in(Some(&json!(null))).is_err());
        assert!(parse_expires_in(Some(&json!(-10))).is_err());
        assert!(parse_expires_in(Some(&json!(1e300))).is_err());
        assert!(parse_expires_in(Some(&json!(1e17))).is_err());
    }
}
