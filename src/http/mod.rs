//! HTTP transport module
//!
//! Provides the instrumented transport used by every authenticator for its
//! own login calls, plus the endpoint and redirect helpers they share.
//!
//! # Features
//!
//! - **Response header timeout**: login calls never hang past 20s waiting for headers
//! - **Dumping**: optional request/response dumps in debug or JSON format
//! - **No redirects**: 3xx responses are surfaced for host re-resolution

mod client;
mod dump;
mod endpoint;

pub use client::{DumpClient, HttpTransport, RESPONSE_HEADER_TIMEOUT};
pub use dump::{render_json, RequestDump, ResponseDump, DUMP_TARGET};
pub use endpoint::{endpoint, extract_redirect_host, rebind_host};
