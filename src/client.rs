//! API client
//!
//! Thin wrapper binding a host, an authenticator and a transport together so
//! callers can issue signed requests without wiring each piece themselves.

use crate::auth::{Authenticator, ProxySecretAuthenticator};
use crate::config::{ClientConfig, RllConfig};
use crate::error::Result;
use crate::http::{endpoint, DumpClient, HttpTransport};
use crate::types::{DumpFormat, API_VERSION, API_VERSION_HEADER};
use reqwest::header::HeaderValue;
use reqwest::{Method, Request, Response};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Signed API client
pub struct Api {
    host: String,
    auth: Option<Arc<dyn Authenticator>>,
    transport: DumpClient,
}

impl Api {
    /// Create a client for `host`, binding the authenticator to it
    pub async fn new(host: impl Into<String>, auth: Option<Arc<dyn Authenticator>>) -> Self {
        let host = host.into();
        if let Some(auth) = &auth {
            auth.set_host(&host).await;
        }
        Self {
            host,
            auth,
            transport: DumpClient::default(),
        }
    }

    /// Create a client and check its credentials are accepted
    pub async fn connect(host: impl Into<String>, auth: Arc<dyn Authenticator>) -> Result<Self> {
        let api = Self::new(host, Some(auth)).await;
        if let Some(auth) = &api.auth {
            auth.can_authenticate().await?;
        }
        Ok(api)
    }

    /// Create a client proxied through the local RightLink agent
    pub async fn from_rll_config(path: impl AsRef<Path>) -> Result<Self> {
        let config = RllConfig::load(path)?;
        let auth: Arc<dyn Authenticator> =
            Arc::new(ProxySecretAuthenticator::from_rll_config(&config));
        Ok(Self::new(config.host(), Some(auth)).await)
    }

    /// Create a client from a configuration document
    pub async fn from_config(config: &ClientConfig) -> Result<Self> {
        let (host, auth) = config.resolve()?;
        let mut api = Self::new(host, Some(auth)).await;
        api.transport = DumpClient::new(config.dump);
        Ok(api)
    }

    /// Host requests are sent to
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Authenticator signing requests, if any
    pub fn auth(&self) -> Option<&Arc<dyn Authenticator>> {
        self.auth.as_ref()
    }

    /// Dump requests and responses, including the authenticator's own
    pub fn enable_dump(&self, format: DumpFormat) {
        self.transport.enable_dump(format);
        if let Some(auth) = &self.auth {
            auth.enable_dump(format);
        }
    }

    /// Build an unsigned request for `path` on the client host
    pub fn build_request(&self, method: Method, path: &str) -> Result<Request> {
        let url = endpoint(&self.host, path.trim_start_matches('/'))?;
        let mut request = Request::new(method, url);
        request
            .headers_mut()
            .insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));
        Ok(request)
    }

    /// Sign and send a request
    pub async fn send(&self, mut request: Request) -> Result<Response> {
        if let Some(auth) = &self.auth {
            auth.sign(&mut request).await?;
        }
        debug!("{} {}", request.method(), request.url());
        self.transport.execute(request).await
    }

    /// Signed GET of `path`
    pub async fn get(&self, path: &str) -> Result<Response> {
        let request = self.build_request(Method::GET, path)?;
        self.send(request).await
    }
}

impl fmt::Debug for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Api")
            .field("host", &self.host)
            .field("auth", &self.auth)
            .field("transport", &self.transport)
            .finish()
    }
}
