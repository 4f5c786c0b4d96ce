//! Self-Service authenticator
//!
//! Self-Service runs on its own hosts and keeps its own session on top of
//! the core API credentials. This authenticator wraps the core one: it
//! bootstraps the Self-Service session with a request signed by the inner
//! authenticator, then delegates signing of every request to it.

use super::authenticator::{expect_ok, Authenticator};
use super::types::session_deadline;
use crate::error::{Error, Result};
use crate::http::{endpoint, rebind_host, DumpClient, HttpTransport};
use crate::types::{DumpFormat, API_VERSION_HEADER, SELF_SERVICE_API_VERSION};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Method, Request};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

const HOST_SEGMENT: &str = "selfservice";

/// Wraps another authenticator and maintains a Self-Service session
pub struct SelfServiceAuthenticator {
    inner: Arc<dyn Authenticator>,
    account_id: u64,
    // Self-Service host derived from the core host
    host: RwLock<String>,
    refresh_at: RwLock<Option<DateTime<Utc>>>,
    transport: Arc<dyn HttpTransport>,
}

impl SelfServiceAuthenticator {
    /// Wrap `inner`, unless it already is a Self-Service authenticator
    pub fn wrap(inner: Arc<dyn Authenticator>, account_id: u64) -> Arc<dyn Authenticator> {
        Self::wrap_with_transport(inner, account_id, Arc::new(DumpClient::default()))
    }

    /// Same as [`wrap`](Self::wrap) with a custom transport for the bootstrap request
    pub fn wrap_with_transport(
        inner: Arc<dyn Authenticator>,
        account_id: u64,
        transport: Arc<dyn HttpTransport>,
    ) -> Arc<dyn Authenticator> {
        if inner.as_any().is::<Self>() {
            return inner;
        }
        Arc::new(Self {
            inner,
            account_id,
            host: RwLock::new(String::new()),
            refresh_at: RwLock::new(None),
            transport,
        })
    }

    /// Host the Self-Service session lives on
    pub async fn host(&self) -> String {
        self.host.read().await.clone()
    }

    /// Deadline of the current Self-Service session
    pub async fn refresh_at(&self) -> Option<DateTime<Utc>> {
        *self.refresh_at.read().await
    }

    async fn ensure_session(&self) -> Result<()> {
        {
            let refresh_at = self.refresh_at.read().await;
            if refresh_at.is_some_and(|at| Utc::now() <= at) {
                return Ok(());
            }
        }

        let mut refresh_at = self.refresh_at.write().await;
        if refresh_at.is_some_and(|at| Utc::now() <= at) {
            return Ok(());
        }

        let host = self.host().await;
        if host.is_empty() {
            return Err(Error::config("missing host information"));
        }
        let path = format!("api/catalog/new_session?account_id={}", self.account_id);
        let mut request = Request::new(Method::GET, endpoint(&host, &path)?);
        self.inner.sign(&mut request).await?;
        request
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let response = self.transport.execute(request).await?;
        debug!(
            "Self-Service session bootstrapped on {} ({})",
            host,
            response.status()
        );
        *refresh_at = Some(session_deadline());
        Ok(())
    }
}

/// Compute the Self-Service host from a core API host
///
/// The second to last dash separated part of the first label is replaced,
/// e.g. `us-3.rightscale.com` becomes `selfservice-3.rightscale.com`. Hosts
/// whose first label has no dash are returned unchanged.
pub fn self_service_host(host: &str) -> String {
    let (prefix, rest) = match host.split_once('.') {
        Some((prefix, rest)) => (prefix, Some(rest)),
        None => (host, None),
    };
    let mut parts: Vec<&str> = prefix.split('-').collect();
    if parts.len() < 2 {
        return host.to_string();
    }
    let index = parts.len() - 2;
    parts[index] = HOST_SEGMENT;
    let prefix = parts.join("-");
    match rest {
        Some(rest) => format!("{prefix}.{rest}"),
        None => prefix,
    }
}

#[async_trait]
impl Authenticator for SelfServiceAuthenticator {
    async fn sign(&self, request: &mut Request) -> Result<()> {
        self.ensure_session().await?;
        self.inner.sign(request).await?;
        request.headers_mut().insert(
            API_VERSION_HEADER,
            HeaderValue::from_static(SELF_SERVICE_API_VERSION),
        );
        rebind_host(request.url_mut(), &self.host().await)
    }

    async fn set_host(&self, host: &str) {
        self.inner.set_host(host).await;
        *self.host.write().await = self_service_host(host);
    }

    async fn can_authenticate(&self) -> Result<()> {
        let host = self.host().await;
        if host.is_empty() {
            return Err(Error::config("missing host information"));
        }
        let path = format!(
            "api/catalog/accounts/{}/user_preferences",
            self.account_id
        );
        let mut request = Request::new(Method::GET, endpoint(&host, &path)?);
        request.headers_mut().insert(
            API_VERSION_HEADER,
            HeaderValue::from_static(SELF_SERVICE_API_VERSION),
        );
        self.sign(&mut request).await?;
        expect_ok(self.transport.execute(request).await?).await
    }

    fn enable_dump(&self, format: DumpFormat) {
        self.transport.enable_dump(format);
        self.inner.enable_dump(format);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for SelfServiceAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelfServiceAuthenticator")
            .field("inner", &self.inner)
            .field("account_id", &self.account_id)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}
