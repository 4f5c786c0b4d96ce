//! Authentication module
//!
//! Supports: password and instance token sessions, OAuth refresh tokens,
//! static access tokens, the RightLink proxy secret and Self-Service sessions
//! layered on top of any of them.
//!
//! Authenticators that need a session or token keep it cached and refresh it
//! under a lock, so concurrent `sign` calls share a single login.

mod authenticator;
mod cookie;
mod login;
mod oauth;
mod self_service;
mod token;
mod types;

pub use authenticator::{Authenticator, ProbeTarget};
pub use cookie::CookieAuthenticator;
pub use login::{InstanceLogin, LoginRequestBuilder, PasswordLogin};
pub use oauth::OAuthAuthenticator;
pub use self_service::{self_service_host, SelfServiceAuthenticator};
pub use token::{ProxySecretAuthenticator, TokenAuthenticator};
pub use types::{AccessToken, Session, SessionCookie, SESSION_LIFETIME_SECS};
