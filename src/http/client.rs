//! Instrumented HTTP transport
//!
//! `DumpClient` is the transport every authenticator uses for its own login
//! calls. It:
//! - sets the client identifier header on every request
//! - bounds the wait for response headers
//! - optionally dumps each exchange in the configured format
//!
//! Redirects are never followed so login responses can be inspected.

use super::dump::{render_json, RequestDump, ResponseDump, DUMP_TARGET};
use crate::error::{Error, Result};
use crate::types::{DumpFormat, USER_AGENT};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, USER_AGENT as USER_AGENT_HEADER};
use reqwest::{redirect, Client, Request, Response};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tracing::{info, warn};

/// Maximum time to wait for response headers
pub const RESPONSE_HEADER_TIMEOUT: Duration = Duration::from_secs(20);

/// Transport used to execute requests
#[async_trait]
pub trait HttpTransport: Send + Sync + fmt::Debug {
    /// Execute a request, returning the raw response
    async fn execute(&self, request: Request) -> Result<Response>;

    /// Set the dump format; transports that cannot dump ignore it
    fn enable_dump(&self, _format: DumpFormat) {}
}

#[async_trait]
impl HttpTransport for Client {
    async fn execute(&self, request: Request) -> Result<Response> {
        Ok(Client::execute(self, request).await?)
    }
}

/// HTTP transport that optionally dumps requests and responses
pub struct DumpClient {
    client: Client,
    format: AtomicU8,
    timeout: Duration,
}

impl DumpClient {
    /// Create a transport dumping in the given format
    pub fn new(format: DumpFormat) -> Self {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            format: AtomicU8::new(format.as_u8()),
            timeout: RESPONSE_HEADER_TIMEOUT,
        }
    }

    /// Override the response header timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Current dump format
    pub fn format(&self) -> DumpFormat {
        DumpFormat::from_u8(self.format.load(Ordering::Relaxed))
    }

    /// Response header timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn send(&self, request: Request) -> Result<Response> {
        match tokio::time::timeout(self.timeout, self.client.execute(request)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(Error::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}

impl Default for DumpClient {
    fn default() -> Self {
        Self::new(DumpFormat::None)
    }
}

#[async_trait]
impl HttpTransport for DumpClient {
    async fn execute(&self, mut request: Request) -> Result<Response> {
        request
            .headers_mut()
            .insert(USER_AGENT_HEADER, HeaderValue::from_static(USER_AGENT));

        let format = self.format();
        if !format.is_verbose() {
            return self.send(request).await;
        }

        let request_dump = RequestDump::capture(&request);
        if format == DumpFormat::Debug {
            info!(target: DUMP_TARGET, "{}", request_dump.render_debug());
        }

        let response = match self.send(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(target: DUMP_TARGET, "{} {} failed: {}", request_dump.method, request_dump.url, e);
                return Err(e);
            }
        };

        let (response, response_dump) = ResponseDump::capture(response).await?;
        match format {
            DumpFormat::Json => {
                info!(target: DUMP_TARGET, "{}", render_json(&request_dump, &response_dump));
            }
            _ => info!(target: DUMP_TARGET, "{}", response_dump.render_debug()),
        }

        Ok(response)
    }

    fn enable_dump(&self, format: DumpFormat) {
        self.format.store(format.as_u8(), Ordering::Relaxed);
    }
}

impl fmt::Debug for DumpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DumpClient")
            .field("format", &self.format())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
