//! Cookie session authenticator
//!
//! Used by both the password and the instance token credentials. A session
//! is created by the login builder's request and kept for two hours; every
//! signed request carries the session cookies and the account header.

use super::authenticator::{add_cookies, probe, Authenticator, ProbeTarget};
use super::login::{InstanceLogin, LoginRequestBuilder, PasswordLogin};
use super::types::{Session, SessionCookie};
use crate::error::{Error, Result};
use crate::http::{extract_redirect_host, rebind_host, DumpClient, HttpTransport};
use crate::types::{DumpFormat, ACCOUNT_HEADER};
use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::{Request, Response, StatusCode};
use std::any::Any;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Signs requests with a global session cookie
pub struct CookieAuthenticator {
    builder: Box<dyn LoginRequestBuilder>,
    account_id: u64,
    host: RwLock<String>,
    session: RwLock<Option<Session>>,
    transport: Arc<dyn HttpTransport>,
}

impl CookieAuthenticator {
    /// Create an authenticator logging in with the given builder
    pub fn new(builder: Box<dyn LoginRequestBuilder>, account_id: u64) -> Self {
        Self::with_transport(builder, account_id, Arc::new(DumpClient::default()))
    }

    /// Create an authenticator using a custom transport for its logins
    pub fn with_transport(
        builder: Box<dyn LoginRequestBuilder>,
        account_id: u64,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            builder,
            account_id,
            host: RwLock::new(String::new()),
            session: RwLock::new(None),
            transport,
        }
    }

    /// Authenticator creating sessions from an email and password
    pub fn password(email: impl Into<String>, password: impl Into<String>, account_id: u64) -> Self {
        Self::new(
            Box::new(PasswordLogin::new(email, password, account_id)),
            account_id,
        )
    }

    /// Authenticator creating sessions from an instance API token
    pub fn instance(token: impl Into<String>, account_id: u64) -> Self {
        Self::new(Box::new(InstanceLogin::new(token, account_id)), account_id)
    }

    /// Currently bound host, updated when a login is redirected
    pub async fn host(&self) -> String {
        self.host.read().await.clone()
    }

    /// Current session, if one was established
    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    /// Get the session cookie header, logging in if necessary
    async fn cookie_header(&self, request: &mut Request) -> Result<Option<String>> {
        {
            let session = self.session.read().await;
            if let Some(session) = session.as_ref() {
                if !session.is_expired() {
                    return Ok(session.cookie_header());
                }
            }
        }

        let mut session = self.session.write().await;

        // Another caller may have refreshed while we waited for the lock
        if let Some(current) = session.as_ref() {
            if !current.is_expired() {
                return Ok(current.cookie_header());
            }
        }

        let fresh = self.login(request).await?;
        let header = fresh.cookie_header();
        *session = Some(fresh);
        Ok(header)
    }

    /// Run the login, following one redirect to another host
    ///
    /// `request` follows the redirect only when it targets the login host.
    async fn login(&self, request: &mut Request) -> Result<Session> {
        let host = self.host().await;
        let login = self.builder.build_login_request(&host)?;
        let login_authority = login.url().authority().to_string();
        let mut response = self.transport.execute(login).await?;

        if let Some(redirect) = extract_redirect_host(&response)? {
            info!("Login redirected from {} to {}", host, redirect);
            let login = self.builder.build_login_request(&redirect)?;
            if request.url().authority() == login_authority {
                rebind_host(request.url_mut(), &redirect)?;
            }
            *self.host.write().await = redirect;
            response = self.transport.execute(login).await?;
        }

        let session = establish(response).await?;
        debug!(
            "Session established with {} cookie(s), refresh at {}",
            session.cookies.len(),
            session.refresh_at
        );
        Ok(session)
    }
}

/// Build the session from a login response, which must be a 204
async fn establish(response: Response) -> Result<Session> {
    let status = response.status();
    if status != StatusCode::NO_CONTENT {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::auth_failed(status.as_u16(), body));
    }
    let cookies = response
        .cookies()
        .map(|c| SessionCookie::new(c.name(), c.value()))
        .collect();
    Ok(Session::started_now(cookies))
}

#[async_trait]
impl Authenticator for CookieAuthenticator {
    async fn sign(&self, request: &mut Request) -> Result<()> {
        if let Some(cookies) = self.cookie_header(request).await? {
            add_cookies(request, &cookies)?;
        }
        request
            .headers_mut()
            .insert(ACCOUNT_HEADER, HeaderValue::from(self.account_id));
        Ok(())
    }

    async fn set_host(&self, host: &str) {
        *self.host.write().await = host.to_string();
    }

    async fn can_authenticate(&self) -> Result<()> {
        let target = if self.builder.is_instance() {
            ProbeTarget::Instance
        } else {
            ProbeTarget::Account
        };
        let host = self.host().await;
        probe(self, self.transport.as_ref(), &host, target).await
    }

    fn enable_dump(&self, format: DumpFormat) {
        self.transport.enable_dump(format);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl std::fmt::Debug for CookieAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieAuthenticator")
            .field("builder", &self.builder)
            .field("account_id", &self.account_id)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use reqwest::{Method, Url};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_refresh_moves_deadline_forward() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/sessions"))
            .respond_with(ResponseTemplate::new(204).insert_header("set-cookie", "rs_gbl=abc"))
            .expect(2)
            .mount(&mock_server)
            .await;

        let auth = CookieAuthenticator::password("a@b.c", "pw", 1);
        auth.set_host(&mock_server.address().to_string()).await;

        let url = Url::parse("https://h/api/x").unwrap();
        auth.sign(&mut Request::new(Method::GET, url.clone())).await.unwrap();
        let first = auth.session().await.unwrap().refresh_at;

        // Force the next sign to log in again
        if let Some(session) = auth.session.write().await.as_mut() {
            session.refresh_at = Utc::now() - chrono::Duration::seconds(1);
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        auth.sign(&mut Request::new(Method::GET, url)).await.unwrap();
        let second = auth.session().await.unwrap().refresh_at;
        assert!(second > first);
    }
}
