//! Common types used throughout rsapi-auth
//!
//! Wire constants shared by the signers and the transport, and the
//! request/response dump format.

use serde::{Deserialize, Serialize};

// ============================================================================
// Wire Constants
// ============================================================================

/// API version sent with login, token and probe requests
pub const API_VERSION: &str = "1.5";

/// API version sent with self-service requests
pub const SELF_SERVICE_API_VERSION: &str = "1.0";

/// Host used by the session login builders when none is bound
pub const DEFAULT_HOST: &str = "us-3.rightscale.com";

/// Client identifier set on every request by the instrumented transport
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Header carrying the API version
pub const API_VERSION_HEADER: &str = "X-Api-Version";

/// Header carrying the account identifier on session-signed requests
pub const ACCOUNT_HEADER: &str = "X-Account";

/// Header carrying the proxy shared secret
pub const PROXY_SECRET_HEADER: &str = "X-RLL-Secret";

// ============================================================================
// Dump Format
// ============================================================================

/// Format used to dump HTTP requests and responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DumpFormat {
    /// Dumping disabled
    #[default]
    None,
    /// Human-readable wire-like rendering
    Debug,
    /// One JSON document per exchange
    Json,
}

impl DumpFormat {
    /// Whether anything gets dumped at all
    pub fn is_verbose(self) -> bool {
        !matches!(self, DumpFormat::None)
    }

    pub(crate) fn as_u8(self) -> u8 {
        match self {
            DumpFormat::None => 0,
            DumpFormat::Debug => 1,
            DumpFormat::Json => 2,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => DumpFormat::Debug,
            2 => DumpFormat::Json,
            _ => DumpFormat::None,
        }
    }
}

#[cfg(test)]
mod type_tests {
    use super::*;

    #[test]
    fn test_dump_format_default() {
        assert_eq!(DumpFormat::default(), DumpFormat::None);
        assert!(!DumpFormat::None.is_verbose());
        assert!(DumpFormat::Debug.is_verbose());
        assert!(DumpFormat::Json.is_verbose());
    }

    #[test]
    fn test_dump_format_u8() {
        for format in [DumpFormat::None, DumpFormat::Debug, DumpFormat::Json] {
            assert_eq!(DumpFormat::from_u8(format.as_u8()), format);
        }
        assert_eq!(DumpFormat::from_u8(42), DumpFormat::None);
    }

    #[test]
    fn test_dump_format_serde() {
        let format: DumpFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(format, DumpFormat::Json);
        assert_eq!(serde_json::to_string(&DumpFormat::Debug).unwrap(), "\"debug\"");
    }

    #[test]
    fn test_user_agent() {
        assert!(USER_AGENT.starts_with("rsapi-auth/"));
    }
}
