//! Request/response dump rendering
//!
//! Captures are plain data so both formats can be rendered (and tested)
//! without a tracing subscriber. Credential-bearing headers are redacted.

use crate::error::Result;
use reqwest::header::HeaderMap;
use reqwest::{Request, Response};
use serde_json::{json, Map, Value};

/// Tracing target dumps are emitted on
pub const DUMP_TARGET: &str = "rsapi_auth::dump";

const REDACTED_HEADERS: [&str; 3] = ["authorization", "cookie", "x-rll-secret"];

/// Snapshot of an outgoing request
#[derive(Debug, Clone)]
pub struct RequestDump {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl RequestDump {
    /// Capture a request before it is sent
    pub fn capture(request: &Request) -> Self {
        Self {
            method: request.method().to_string(),
            url: request.url().to_string(),
            headers: capture_headers(request.headers()),
            body: request
                .body()
                .and_then(reqwest::Body::as_bytes)
                .map(|b| String::from_utf8_lossy(b).into_owned()),
        }
    }

    /// Render in the debug format
    pub fn render_debug(&self) -> String {
        let mut out = format!("{} {}\n", self.method, self.url);
        push_headers(&mut out, &self.headers);
        if let Some(body) = &self.body {
            out.push('\n');
            out.push_str(body);
            out.push('\n');
        }
        out
    }

    fn to_json(&self) -> Value {
        json!({
            "method": self.method,
            "uri": self.url,
            "headers": headers_json(&self.headers),
            "body": self.body.as_deref().map(body_json),
        })
    }
}

/// Snapshot of a received response
#[derive(Debug, Clone)]
pub struct ResponseDump {
    pub status: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl ResponseDump {
    /// Capture a response, reading its body
    ///
    /// Returns a rebuilt response carrying the same status, headers and body
    /// so the caller can still consume it.
    pub async fn capture(response: Response) -> Result<(Response, Self)> {
        let status = response.status();
        let version = response.version();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        let dump = Self {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            headers: capture_headers(&headers),
            body: String::from_utf8_lossy(&body).into_owned(),
        };

        let mut rebuilt = http::Response::builder()
            .status(status)
            .version(version)
            .body(body)?;
        *rebuilt.headers_mut() = headers;

        Ok((Response::from(rebuilt), dump))
    }

    /// Render in the debug format
    pub fn render_debug(&self) -> String {
        let mut out = format!("==> {} {}\n", self.status, self.reason);
        push_headers(&mut out, &self.headers);
        if !self.body.is_empty() {
            out.push('\n');
            out.push_str(&self.body);
            out.push('\n');
        }
        out
    }

    fn to_json(&self) -> Value {
        json!({
            "status": self.status,
            "headers": headers_json(&self.headers),
            "body": body_json(&self.body),
        })
    }
}

/// Render one exchange in the JSON format
pub fn render_json(request: &RequestDump, response: &ResponseDump) -> String {
    let doc = json!({
        "request": request.to_json(),
        "response": response.to_json(),
    });
    serde_json::to_string_pretty(&doc).unwrap_or_else(|_| doc.to_string())
}

fn capture_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = if REDACTED_HEADERS.contains(&name.as_str()) {
                "[redacted]".to_string()
            } else {
                String::from_utf8_lossy(value.as_bytes()).into_owned()
            };
            (name.as_str().to_string(), value)
        })
        .collect()
}

fn push_headers(out: &mut String, headers: &[(String, String)]) {
    for (name, value) in headers {
        out.push_str(name);
        out.push_str(": ");
        out.push_str(value);
        out.push('\n');
    }
}

fn headers_json(headers: &[(String, String)]) -> Value {
    let mut map = Map::new();
    for (name, value) in headers {
        match map.get_mut(name) {
            Some(Value::String(existing)) => {
                existing.push_str(", ");
                existing.push_str(value);
            }
            _ => {
                map.insert(name.clone(), Value::String(value.clone()));
            }
        }
    }
    Value::Object(map)
}

// Bodies that are JSON are embedded as JSON, anything else as a string.
fn body_json(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}
