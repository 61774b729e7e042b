pub mod clock;
pub mod ip;
pub mod url_validator;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

pub use clock::{Clock, ManualClock, SystemClock};
pub use url_validator::normalize_url;

/// Default length of generated short codes
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Longest shortcode a caller may choose
pub const MAX_SHORT_CODE_LENGTH: usize = 64;

/// 生成随机短码
///
/// 从线程 CSPRNG 取 `length` 个字节，按 URL-safe base64（`-`/`_`，无填充）编码后截断到 `length` 个字符。
/// 不做去重，冲突由调用方处理。
pub fn generate_random_code(length: usize) -> String {
    let bytes: Vec<u8> = std::iter::repeat_with(rand::random::<u8>)
        .take(length)
        .collect();

    let mut code = URL_SAFE_NO_PAD.encode(bytes);
    code.truncate(length);
    code
}

/// Whether `c` belongs to the URL-safe base64 alphabet
#[inline]
pub fn is_url_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Paths owned by fixed routes; never handed out as short codes
pub const RESERVED_CODES: &[&str] = &["health", "shorturls"];

/// Whether `code` collides with a fixed route
pub fn is_reserved_code(code: &str) -> bool {
    RESERVED_CODES.contains(&code)
}

/// 校验短码格式：1..=64 个 URL-safe 字符
pub fn is_valid_short_code(code: &str) -> bool {
    !code.is_empty() && code.len() <= MAX_SHORT_CODE_LENGTH && code.chars().all(is_url_safe_char)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_codes() {
        assert!(is_reserved_code("health"));
        assert!(is_reserved_code("shorturls"));
        assert!(!is_reserved_code("Health"));
        assert!(!is_reserved_code("abc123"));
    }

    #[test]
    fn test_generated_code_has_requested_length() {
        for length in [1, 2, 5, 6, 7, 12, 32] {
            let code = generate_random_code(length);
            assert_eq!(code.len(), length, "length {}", length);
        }
    }

    #[test]
    fn test_generated_code_is_url_safe() {
        for _ in 0..200 {
            let code = generate_random_code(DEFAULT_CODE_LENGTH);
            assert!(code.chars().all(is_url_safe_char), "unexpected char in {}", code);
            assert!(is_valid_short_code(&code));
        }
    }

    #[test]
    fn test_generated_codes_differ() {
        let a = generate_random_code(DEFAULT_CODE_LENGTH);
        let b = generate_random_code(DEFAULT_CODE_LENGTH);
        let c = generate_random_code(DEFAULT_CODE_LENGTH);
        assert!(a != b || b != c);
    }

    #[test]
    fn test_zero_length_code() {
        assert_eq!(generate_random_code(0), "");
    }

    #[test]
    fn test_is_valid_short_code() {
        assert!(is_valid_short_code("abc123"));
        assert!(is_valid_short_code("a-b_C"));
        assert!(!is_valid_short_code(""));
        assert!(!is_valid_short_code("has space"));
        assert!(!is_valid_short_code("slash/inside"));
        assert!(!is_valid_short_code("dot.com"));
        assert!(is_valid_short_code(&"a".repeat(MAX_SHORT_CODE_LENGTH)));
        assert!(!is_valid_short_code(&"a".repeat(MAX_SHORT_CODE_LENGTH + 1)));
    }
}
