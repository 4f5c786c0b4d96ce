//! Session and token state
//!
//! These values are owned by a single authenticator and replaced wholesale on
//! every successful refresh.

use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Lifetime of a session in seconds before it is proactively refreshed
pub const SESSION_LIFETIME_SECS: i64 = 2 * 60 * 60;

/// A cookie returned by a session login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
}

impl SessionCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Established cookie session
#[derive(Debug, Clone)]
pub struct Session {
    /// Cookies returned by the login, possibly empty
    pub cookies: Vec<SessionCookie>,
    /// When the session must be refreshed
    pub refresh_at: DateTime<Utc>,
}

impl Session {
    /// Create a session refreshed two hours from now
    pub fn started_now(cookies: Vec<SessionCookie>) -> Self {
        Self {
            cookies,
            refresh_at: session_deadline(),
        }
    }

    /// Check if the session must be refreshed
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.refresh_at
    }

    /// Value of a `Cookie` header carrying every session cookie
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect();
        Some(pairs.join("; "))
    }
}

/// Deadline of a session established now
pub fn session_deadline() -> DateTime<Utc> {
    Utc::now() + Duration::seconds(SESSION_LIFETIME_SECS)
}

/// Bearer access token with its refresh deadline
#[derive(Clone)]
pub struct AccessToken {
    /// The access token
    pub token: String,
    /// When the token must be refreshed
    pub refresh_at: DateTime<Utc>,
}

impl AccessToken {
    /// Create a token refreshed at half of its `ttl`
    pub fn at_half_life(token: impl Into<String>, ttl: Duration) -> Result<Self> {
        let refresh_at = Utc::now()
            .checked_add_signed(ttl / 2)
            .ok_or_else(|| Error::protocol(format!("token duration out of range: {ttl}")))?;
        Ok(Self {
            token: token.into(),
            refresh_at,
        })
    }

    /// Check if the token must be refreshed
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.refresh_at
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[redacted]")
            .field("refresh_at", &self.refresh_at)
            .finish()
    }
}

#[cfg(test)]
mod type_tests {
    use super::*;

    #[test]
    fn test_session_not_expired() {
        let session = Session::started_now(vec![]);
        assert!(!session.is_expired());
    }

    #[test]
    fn test_session_expired() {
        let session = Session {
            cookies: vec![],
            refresh_at: Utc::now() - Duration::seconds(1),
        };
        assert!(session.is_expired());
    }

    #[test]
    fn test_session_lifetime() {
        let before = Utc::now();
        let session = Session::started_now(vec![]);
        let after = Utc::now();
        assert!(session.refresh_at >= before + Duration::hours(2));
        assert!(session.refresh_at <= after + Duration::hours(2));
    }

    #[test]
    fn test_cookie_header() {
        let session = Session::started_now(vec![
            SessionCookie::new("rs_gbl", "abc"),
            SessionCookie::new("domain", ".rightscale.com"),
        ]);
        assert_eq!(
            session.cookie_header().as_deref(),
            Some("rs_gbl=abc; domain=.rightscale.com")
        );
        assert_eq!(Session::started_now(vec![]).cookie_header(), None);
    }

    #[test]
    fn test_access_token_half_life() {
        let before = Utc::now();
        let token = AccessToken::at_half_life("tok", Duration::seconds(3600)).unwrap();
        let after = Utc::now();
        assert!(token.refresh_at >= before + Duration::seconds(1800));
        assert!(token.refresh_at <= after + Duration::seconds(1800));
        assert!(!token.is_expired());
    }

    #[test]
    fn test_access_token_out_of_range() {
        let err = AccessToken::at_half_life("tok", Duration::MAX).unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }), "{err}");
    }

    #[test]
    fn test_access_token_debug_redacted() {
        let token = AccessToken::at_half_life("super-secret", Duration::seconds(60)).unwrap();
        assert!(!format!("{token:?}").contains("super-secret"));
    }
}
