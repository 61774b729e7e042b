//! URL 规范化与验证模块
//!
//! 缺少 http(s) 协议时补全 `http://`，然后按 WHATWG 规则解析。

use url::Url;

/// URL 验证错误
#[derive(Debug, PartialEq, Eq)]
pub enum UrlValidationError {
    EmptyUrl,
    MissingHost,
    InvalidFormat(String),
}

impl std::fmt::Display for UrlValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUrl => write!(f, "URL cannot be empty"),
            Self::MissingHost => write!(f, "URL has no host"),
            Self::InvalidFormat(msg) => write!(f, "Invalid URL format: {}", msg),
        }
    }
}

impl std::error::Error for UrlValidationError {}

/// Whether `input` already starts with `http://` or `https://`, ignoring case
pub fn has_http_scheme(input: &str) -> bool {
    let prefix = |p: &str| {
        input
            .get(..p.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(p))
    };
    prefix("http://") || prefix("https://")
}

/// 规范化并验证 URL
///
/// 1. 非 `http://` / `https://` 开头（不区分大小写）时补全 `http://`
/// 2. 必须能解析为带主机名的绝对 URL
///
/// Returns the (possibly prefixed) input itself rather than the parser's
/// serialization, so already-qualified input comes back unchanged.
pub fn normalize_url(input: &str) -> Result<String, UrlValidationError> {
    if input.trim().is_empty() {
        return Err(UrlValidationError::EmptyUrl);
    }

    let candidate = if has_http_scheme(input) {
        input.to_string()
    } else {
        format!("http://{}", input)
    };

    let parsed = Url::parse(&candidate).map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;
    if parsed.host().is_none() {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_urls_are_unchanged() {
        for url in [
            "http://example.com",
            "https://example.com",
            "https://example.com/path?query=1#frag",
            "http://localhost:8080",
            "HTTPS://Example.com/Upper",
            "http://192.168.0.1/x",
        ] {
            assert_eq!(normalize_url(url).as_deref(), Ok(url));
        }
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_url("example.com/a?b=c").unwrap();
        let twice = normalize_url(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_missing_scheme_gets_http_prefix() {
        assert_eq!(
            normalize_url("example.com").as_deref(),
            Ok("http://example.com")
        );
        assert_eq!(
            normalize_url("www.rust-lang.org/learn").as_deref(),
            Ok("http://www.rust-lang.org/learn")
        );
    }

    #[test]
    fn test_invalid_hosts_are_rejected() {
        assert!(matches!(
            normalize_url("not a url"),
            Err(UrlValidationError::InvalidFormat(_))
        ));
        assert!(matches!(
            normalize_url("http://"),
            Err(UrlValidationError::InvalidFormat(_))
        ));
        assert!(matches!(
            normalize_url("http://exa mple.com"),
            Err(UrlValidationError::InvalidFormat(_))
        ));
        assert!(matches!(
            normalize_url("http://example.com:99999"),
            Err(UrlValidationError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_empty_url() {
        assert_eq!(normalize_url(""), Err(UrlValidationError::EmptyUrl));
        assert_eq!(normalize_url("   "), Err(UrlValidationError::EmptyUrl));
    }

    #[test]
    fn test_scheme_detection_is_case_insensitive() {
        assert!(has_http_scheme("HTTP://a"));
        assert!(has_http_scheme("hTtPs://a"));
        assert!(!has_http_scheme("ftp://a"));
        assert!(!has_http_scheme("http:/a"));
        assert!(!has_http_scheme("ht"));
    }
}
