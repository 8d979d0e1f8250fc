//! Request header helpers shared by the session middleware

use axum::http::{HeaderMap, header};
use std::net::IpAddr;

const BEARER_PREFIX: &str = "Bearer ";
const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Client address for the access log
///
/// The left-most `X-Forwarded-For` entry wins when it parses; otherwise the
/// socket peer address is used.
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|xff| xff.split(',').next())
        .and_then(|first| first.trim().parse().ok())
        .or(direct_ip)
}

/// Extract the token from an `Authorization: Bearer <token>` header
///
/// ## Returns
/// * `Some(token)` - trimmed, non-empty token
/// * `None` - header absent, not valid UTF-8, wrong scheme or empty token
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix(BEARER_PREFIX)?.trim();

    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Read a header as an owned string (empty when absent or not UTF-8)
pub fn header_string(headers: &HeaderMap, name: impl header::AsHeaderName) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn client_ip_prefers_first_forwarded_entry() {
        let direct: IpAddr = "127.0.0.1".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(extract_client_ip(&headers, Some(direct)), Some(direct));

        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        assert_eq!(
            extract_client_ip(&headers, Some(direct)),
            Some("203.0.113.7".parse().unwrap())
        );

        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("unknown"));
        assert_eq!(extract_client_ip(&headers, None), None);
    }

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer  abc.def.ghi "),
        );
        assert_eq!(extract_bearer_token(&headers), Some("abc.def.ghi".to_string()));
    }

    #[test]
    fn test_extract_bearer_token_rejects_malformed() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer    "));
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("abc.def.ghi"));
        assert_eq!(extract_bearer_token(&headers), None);
    }

    #[test]
    fn test_header_string() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static("curl/8.0"));
        assert_eq!(header_string(&headers, header::USER_AGENT), "curl/8.0");
        assert_eq!(header_string(&headers, header::REFERER), "");
    }
}
