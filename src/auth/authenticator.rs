//! Authenticator capability
//!
//! Every credential strategy implements [`Authenticator`]. Callers hold one
//! as `Arc<dyn Authenticator>` and call [`Authenticator::sign`] once per
//! outgoing request; the strategy decides on its own whether its session or
//! token needs refreshing first.

use crate::error::{Error, Result};
use crate::http::{endpoint, HttpTransport};
use crate::types::{DumpFormat, API_VERSION, API_VERSION_HEADER};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION, COOKIE};
use reqwest::{Method, Request, StatusCode};
use std::any::Any;
use std::fmt;

/// Signs outgoing requests and manages its own credential lifecycle
#[async_trait]
pub trait Authenticator: Send + Sync + fmt::Debug {
    /// Add the authentication headers/cookies to `request`
    ///
    /// May perform a login or token exchange first. Only headers and the
    /// target host are touched, never the body.
    async fn sign(&self, request: &mut Request) -> Result<()>;

    /// Bind the host used for future logins
    async fn set_host(&self, host: &str);

    /// Make a probe request and fail if the credentials are not accepted
    async fn can_authenticate(&self) -> Result<()>;

    /// Set the format used to dump the authenticator's own requests
    fn enable_dump(&self, format: DumpFormat);

    /// Concrete type access, used to avoid redundant wrapping
    fn as_any(&self) -> &dyn Any;
}

/// Endpoint class hit by [`probe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeTarget {
    /// `GET api/sessions`, for user and OAuth credentials
    Account,
    /// `GET api/user_data`, for instance credentials
    Instance,
}

impl ProbeTarget {
    pub fn path(self) -> &'static str {
        match self {
            ProbeTarget::Account => "api/sessions",
            ProbeTarget::Instance => "api/user_data",
        }
    }
}

/// Sign and send a probe request to `host`, expecting a 200
pub(crate) async fn probe(
    auth: &dyn Authenticator,
    transport: &dyn HttpTransport,
    host: &str,
    target: ProbeTarget,
) -> Result<()> {
    if host.is_empty() {
        return Err(Error::config("missing host information"));
    }
    let mut request = Request::new(Method::GET, endpoint(host, target.path())?);
    request
        .headers_mut()
        .insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));
    auth.sign(&mut request).await?;
    expect_ok(transport.execute(request).await?).await
}

/// Turn any non-200 response into an authentication failure
pub(crate) async fn expect_ok(response: reqwest::Response) -> Result<()> {
    let status = response.status();
    if status == StatusCode::OK {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::auth_failed(status.as_u16(), body))
}

/// Set `Authorization: Bearer <token>`
pub(crate) fn set_bearer(request: &mut Request, token: &str) -> Result<()> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
    value.set_sensitive(true);
    request.headers_mut().insert(AUTHORIZATION, value);
    Ok(())
}

/// Append `cookies` to the request's `Cookie` header
pub(crate) fn add_cookies(request: &mut Request, cookies: &str) -> Result<()> {
    let value = match request.headers().get(COOKIE) {
        Some(existing) => format!("{}; {cookies}", String::from_utf8_lossy(existing.as_bytes())),
        None => cookies.to_string(),
    };
    let mut value = HeaderValue::from_str(&value)?;
    value.set_sensitive(true);
    request.headers_mut().insert(COOKIE, value);
    Ok(())
}
