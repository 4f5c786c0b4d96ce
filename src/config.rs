//! Client configuration
//!
//! `ClientConfig` describes which credentials to use and how, and is loaded
//! from YAML (or JSON). `RllConfig` is the key=value file written by the
//! RightLink agent holding the proxy port and shared secret.

use crate::auth::{
    Authenticator, CookieAuthenticator, InstanceLogin, OAuthAuthenticator, PasswordLogin,
    ProxySecretAuthenticator, SelfServiceAuthenticator, TokenAuthenticator,
};
use crate::error::{Error, Result};
use crate::http::{DumpClient, HttpTransport};
use crate::types::{DumpFormat, DEFAULT_HOST};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Default location of the RightLink proxy configuration
pub const RLL_SECRET_PATH: &str = "/var/run/rightlink/secret";

const RLL_PORT_KEY: &str = "RS_RLL_PORT";
const RLL_SECRET_KEY: &str = "RS_RLL_SECRET";

// ============================================================================
// Client Config
// ============================================================================

/// Complete client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API host, e.g. "us-3.rightscale.com"
    #[serde(default)]
    pub host: String,

    /// Account used by session credentials and Self-Service
    #[serde(default)]
    pub account_id: Option<u64>,

    /// Request/response dump format
    #[serde(default)]
    pub dump: DumpFormat,

    /// Wrap the authenticator to also create Self-Service sessions
    #[serde(default)]
    pub self_service: bool,

    /// Credentials to authenticate with
    pub credentials: CredentialConfig,
}

/// Credential source
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialConfig {
    /// Email and password session
    Password { email: String, password: String },

    /// Instance API token session
    Instance { token: String },

    /// OAuth refresh token
    #[serde(rename = "oauth")]
    OAuth { refresh_token: String },

    /// Pre-obtained OAuth access token
    AccessToken { token: String },

    /// Requests proxied by the local RightLink agent
    ProxySecret {
        #[serde(default = "default_secret_file")]
        secret_file: PathBuf,
    },
}

fn default_secret_file() -> PathBuf {
    PathBuf::from(RLL_SECRET_PATH)
}

impl fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password { email, .. } => f
                .debug_struct("Password")
                .field("email", email)
                .field("password", &"[redacted]")
                .finish(),
            Self::Instance { .. } => f.debug_struct("Instance").finish_non_exhaustive(),
            Self::OAuth { .. } => f.debug_struct("OAuth").finish_non_exhaustive(),
            Self::AccessToken { .. } => f.debug_struct("AccessToken").finish_non_exhaustive(),
            Self::ProxySecret { secret_file } => f
                .debug_struct("ProxySecret")
                .field("secret_file", secret_file)
                .finish(),
        }
    }
}

impl ClientConfig {
    /// Create a config for the given host and credentials
    pub fn new(host: impl Into<String>, credentials: CredentialConfig) -> Self {
        Self {
            host: host.into(),
            account_id: None,
            dump: DumpFormat::None,
            self_service: false,
            credentials,
        }
    }

    /// Parse a YAML (or JSON) document
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_yaml_str(&fs::read_to_string(path)?)
    }

    /// Build the authenticator and work out the host it targets
    ///
    /// The proxy secret credentials take their host from the agent's
    /// configuration; all others use `host`, defaulting to the main shard.
    pub fn resolve(&self) -> Result<(String, Arc<dyn Authenticator>)> {
        let host = if self.host.is_empty() {
            DEFAULT_HOST.to_string()
        } else {
            self.host.clone()
        };

        let (host, auth): (String, Arc<dyn Authenticator>) = match &self.credentials {
            CredentialConfig::Password { email, password } => {
                let account_id = self.require_account()?;
                let builder = PasswordLogin::new(email.clone(), password.clone(), account_id);
                let auth = CookieAuthenticator::with_transport(
                    Box::new(builder),
                    account_id,
                    self.transport(),
                );
                (host, Arc::new(auth))
            }
            CredentialConfig::Instance { token } => {
                let account_id = self.require_account()?;
                let builder = InstanceLogin::new(token.clone(), account_id);
                let auth = CookieAuthenticator::with_transport(
                    Box::new(builder),
                    account_id,
                    self.transport(),
                );
                (host, Arc::new(auth))
            }
            CredentialConfig::OAuth { refresh_token } => (
                host,
                Arc::new(OAuthAuthenticator::with_transport(
                    refresh_token.clone(),
                    self.transport(),
                )),
            ),
            CredentialConfig::AccessToken { token } => (
                host,
                Arc::new(TokenAuthenticator::with_transport(
                    token.clone(),
                    self.transport(),
                )),
            ),
            CredentialConfig::ProxySecret { secret_file } => {
                let rll = RllConfig::load(secret_file)?;
                let auth =
                    ProxySecretAuthenticator::with_transport(rll.secret.clone(), self.transport());
                (rll.host(), Arc::new(auth))
            }
        };

        if self.self_service {
            let account_id = self.require_account()?;
            let auth = SelfServiceAuthenticator::wrap_with_transport(auth, account_id, self.transport());
            return Ok((host, auth));
        }
        Ok((host, auth))
    }

    fn require_account(&self) -> Result<u64> {
        self.account_id
            .ok_or_else(|| Error::missing_field("account_id"))
    }

    fn transport(&self) -> Arc<dyn HttpTransport> {
        Arc::new(DumpClient::new(self.dump))
    }
}

// ============================================================================
// RightLink Proxy Config
// ============================================================================

/// Port and shared secret of the local RightLink agent
#[derive(Clone, PartialEq, Eq)]
pub struct RllConfig {
    pub port: u16,
    pub secret: String,
}

impl RllConfig {
    /// Load the agent configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "failed to load RLL config {}: {e}",
                path.display()
            ))
        })?;
        content.parse()
    }

    /// Host requests are proxied through
    pub fn host(&self) -> String {
        format!("localhost:{}", self.port)
    }
}

impl FromStr for RllConfig {
    type Err = Error;

    fn from_str(content: &str) -> Result<Self> {
        let mut port = None;
        let mut secret = None;

        for line in content.lines() {
            let (key, value) = match line.split_once('=') {
                Some((key, value)) if !value.contains('=') => (key, value),
                _ => {
                    return Err(Error::config(format!(
                        "invalid RLL configuration line '{line}'"
                    )))
                }
            };
            match key {
                RLL_PORT_KEY => {
                    let parsed = value
                        .parse::<u16>()
                        .map_err(|_| Error::config(format!("invalid port value '{value}'")))?;
                    port = Some(parsed);
                }
                RLL_SECRET_KEY => secret = Some(value.to_string()),
                _ => {}
            }
        }

        Ok(Self {
            port: port.ok_or_else(|| Error::missing_field(RLL_PORT_KEY))?,
            secret: secret.ok_or_else(|| Error::missing_field(RLL_SECRET_KEY))?,
        })
    }
}

impl fmt::Debug for RllConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RllConfig")
            .field("port", &self.port)
            .field("secret", &"[redacted]")
            .finish()
    }
}
