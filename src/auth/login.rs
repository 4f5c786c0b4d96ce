//! Login request builders
//!
//! Pure factories turning stored credentials into the session login request
//! for a given host. The cookie signer owns one and calls it on every
//! refresh, and again against the new host when a login is redirected.

use crate::error::Result;
use crate::http::endpoint;
use crate::types::{API_VERSION, API_VERSION_HEADER, DEFAULT_HOST};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Method, Request};
use serde_json::{json, Value};
use std::fmt;

/// Builds the HTTP login request for a host
pub trait LoginRequestBuilder: Send + Sync + fmt::Debug {
    /// Build the login request; an empty host means the default host
    fn build_login_request(&self, host: &str) -> Result<Request>;

    /// Whether the credentials are instance-facing
    fn is_instance(&self) -> bool {
        false
    }
}

/// Session login from a user's email and password
pub struct PasswordLogin {
    email: String,
    password: String,
    account_id: u64,
}

impl PasswordLogin {
    pub fn new(email: impl Into<String>, password: impl Into<String>, account_id: u64) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            account_id,
        }
    }
}

impl LoginRequestBuilder for PasswordLogin {
    fn build_login_request(&self, host: &str) -> Result<Request> {
        json_post(
            or_default(host),
            "api/sessions",
            &json!({
                "email": self.email,
                "password": self.password,
                "account_href": account_href(self.account_id),
            }),
        )
    }
}

impl fmt::Debug for PasswordLogin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordLogin")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .field("account_id", &self.account_id)
            .finish()
    }
}

/// Session login from an instance API token
pub struct InstanceLogin {
    token: String,
    account_id: u64,
}

impl InstanceLogin {
    pub fn new(token: impl Into<String>, account_id: u64) -> Self {
        Self {
            token: token.into(),
            account_id,
        }
    }
}

impl LoginRequestBuilder for InstanceLogin {
    fn build_login_request(&self, host: &str) -> Result<Request> {
        json_post(
            or_default(host),
            "api/session/instance",
            &json!({
                "instance_token": self.token,
                "account_href": account_href(self.account_id),
            }),
        )
    }

    fn is_instance(&self) -> bool {
        true
    }
}

impl fmt::Debug for InstanceLogin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceLogin")
            .field("token", &"[redacted]")
            .field("account_id", &self.account_id)
            .finish()
    }
}

/// Build a versioned JSON `POST` to `path` on `host`
pub(crate) fn json_post(host: &str, path: &str, body: &Value) -> Result<Request> {
    let mut request = Request::new(Method::POST, endpoint(host, path)?);
    let headers = request.headers_mut();
    headers.insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    *request.body_mut() = Some(serde_json::to_vec(body)?.into());
    Ok(request)
}

fn or_default(host: &str) -> &str {
    if host.is_empty() {
        DEFAULT_HOST
    } else {
        host
    }
}

fn account_href(account_id: u64) -> String {
    format!("/api/accounts/{account_id}")
}
