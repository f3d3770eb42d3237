//! Shared helpers for the REST clients.

use crate::error::{Result, RollcallError};

/// Turn a non-2xx response into [`RollcallError::ExternalService`], keeping the
/// response body for the log.
pub(crate) async fn ensure_success(
    service: &'static str,
    what: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RollcallError::external(
        service,
        format!("{what} returned {status}: {}", body.trim()),
    ))
}

/// Append path segments to `base`, percent-encoding each one.
pub(crate) fn endpoint(service: &'static str, base: &str, segments: &[&str]) -> Result<reqwest::Url> {
    let mut url = reqwest::Url::parse(base)
        .map_err(|err| RollcallError::external(service, format!("bad base URL {base}: {err}")))?;
    url.path_segments_mut()
        .map_err(|_| RollcallError::external(service, format!("base URL {base} cannot take a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_encodes_segments() {
        let url = endpoint("test", "https://example.com/api/v10/", &["channels", "1", "✅", "@me"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/v10/channels/1/%E2%9C%85/@me");
    }

    #[test]
    fn test_endpoint_rejects_bad_base() {
        assert!(endpoint("test", "not a url", &["x"]).is_err());
    }
}
