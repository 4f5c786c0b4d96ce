//! Endpoint construction and redirect host resolution

use crate::error::{Error, Result};
use reqwest::header::LOCATION;
use reqwest::Response;
use url::Url;

/// Build the URL of `path` on `host`
///
/// Hosts that already carry a scheme are used as-is. Loopback hosts get plain
/// HTTP, everything else HTTPS.
pub fn endpoint(host: &str, path: &str) -> Result<Url> {
    let mut base = if host.starts_with("http") {
        host.to_string()
    } else if host.starts_with("localhost") || host.starts_with("127.0.0.1") {
        format!("http://{host}")
    } else {
        format!("https://{host}")
    };
    if !base.ends_with('/') {
        base.push('/');
    }
    Ok(Url::parse(&format!("{base}{path}"))?)
}

/// Extract the target host of a redirect response
///
/// Returns `Ok(None)` when the response is not a redirect or carries no
/// `Location`. The host includes the port when the location names one.
pub fn extract_redirect_host(response: &Response) -> Result<Option<String>> {
    let status = response.status().as_u16();
    if !(300..399).contains(&status) {
        return Ok(None);
    }
    let Some(location) = response.headers().get(LOCATION) else {
        return Ok(None);
    };
    let location = location
        .to_str()
        .map_err(|e| Error::redirect(String::from_utf8_lossy(location.as_bytes()), e.to_string()))?;
    if location.is_empty() {
        return Ok(None);
    }
    let url = Url::parse(location).map_err(|e| Error::redirect(location, e.to_string()))?;
    Ok(authority(&url))
}

/// Rewrite the authority of `url` to `host`, which may carry a port
pub fn rebind_host(url: &mut Url, host: &str) -> Result<()> {
    let target = Url::parse(&format!("http://{host}"))?;
    url.set_host(target.host_str())?;
    url.set_port(target.port())
        .map_err(|()| Error::InvalidUrl(url::ParseError::SetHostOnCannotBeABaseUrl))
}

fn authority(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}
