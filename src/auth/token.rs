//! Authenticators with fixed credentials
//!
//! Neither refreshes anything: the stored credential is attached as-is.

use super::authenticator::{probe, set_bearer, Authenticator, ProbeTarget};
use crate::config::RllConfig;
use crate::error::Result;
use crate::http::{DumpClient, HttpTransport};
use crate::types::{DumpFormat, PROXY_SECRET_HEADER};
use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::Request;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Signs requests with a pre-obtained OAuth access token
pub struct TokenAuthenticator {
    token: String,
    // Only used by can_authenticate
    host: RwLock<String>,
    transport: Arc<dyn HttpTransport>,
}

impl TokenAuthenticator {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_transport(token, Arc::new(DumpClient::default()))
    }

    pub fn with_transport(token: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            token: token.into(),
            host: RwLock::new(String::new()),
            transport,
        }
    }
}

#[async_trait]
impl Authenticator for TokenAuthenticator {
    async fn sign(&self, request: &mut Request) -> Result<()> {
        set_bearer(request, &self.token)
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

impl fmt::Debug for TokenAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuthenticator")
            .field("token", &"[redacted]")
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

/// Signs requests relayed through the local RightLink agent
///
/// The agent holds the real credentials; requests only need to prove they
/// come from the instance by presenting the shared secret.
pub struct ProxySecretAuthenticator {
    secret: String,
    host: RwLock<String>,
    transport: Arc<dyn HttpTransport>,
}

impl ProxySecretAuthenticator {
    pub fn new(secret: impl Into<String>) -> Self {
        Self::with_transport(secret, Arc::new(DumpClient::default()))
    }

    pub fn with_transport(secret: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            secret: secret.into(),
            host: RwLock::new(String::new()),
            transport,
        }
    }

    /// Authenticator bound to the agent described by `config`
    pub fn from_rll_config(config: &RllConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            host: RwLock::new(config.host()),
            transport: Arc::new(DumpClient::default()),
        }
    }
}

#[async_trait]
impl Authenticator for ProxySecretAuthenticator {
    async fn sign(&self, request: &mut Request) -> Result<()> {
        let mut value = HeaderValue::from_str(&self.secret)?;
        value.set_sensitive(true);
        request.headers_mut().insert(PROXY_SECRET_HEADER, value);
        Ok(())
    }

    async fn set_host(&self, host: &str) {
        *self.host.write().await = host.to_string();
    }

    async fn can_authenticate(&self) -> Result<()> {
        let host = self.host.read().await.clone();
        probe(self, self.transport.as_ref(), &host, ProbeTarget::Instance).await
    }

    fn enable_dump(&self, format: DumpFormat) {
        self.transport.enable_dump(format);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for ProxySecretAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxySecretAuthenticator")
            .field("secret", &"[redacted]")
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}
