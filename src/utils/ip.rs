//! IP 地址处理工具
//!
//! 提供统一的客户端 IP 提取功能：
//! - X-Forwarded-For 取第一个地址（原始客户端）
//! - 其次 X-Real-IP
//! - 最后使用连接地址
//! - 去掉 IPv4-mapped IPv6 前缀（::ffff:1.2.3.4 → 1.2.3.4）

use std::net::IpAddr;

use actix_web::HttpRequest;
use actix_web::http::header::HeaderMap;

/// 检查 IP 是否为私有地址或 localhost
pub fn is_private_or_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback() || v4.is_unspecified(),
        IpAddr::V6(v6) => {
            // IPv6 私有地址：
            // - fc00::/7 (ULA, RFC 4193)
            // - fe80::/10 (Link-local)
            // - ::1 (Loopback)
            v6.is_loopback()
                || v6.is_unspecified()
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}

/// 去掉 IPv4-mapped IPv6 前缀
///
/// Non-IP strings only lose a literal `::ffff:` prefix.
pub fn strip_ipv4_mapped(ip: &str) -> String {
    let ip = ip.trim();
    match ip.parse::<IpAddr>() {
        Ok(IpAddr::V6(v6)) => match v6.to_ipv4_mapped() {
            Some(v4) => v4.to_string(),
            None => v6.to_string(),
        },
        Ok(v4) => v4.to_string(),
        Err(_) => ip
            .strip_prefix("::ffff:")
            .or_else(|| ip.strip_prefix("::FFFF:"))
            .unwrap_or(ip)
            .to_string(),
    }
}

/// 从 HeaderMap 提取转发的 IP
pub fn extract_forwarded_ip_from_headers(headers: &HeaderMap) -> Option<String> {
    // 优先 X-Forwarded-For（取第一个，即原始客户端 IP）
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            // 其次 X-Real-IP
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// 从 HttpRequest 提取客户端 IP（已去掉 ::ffff: 前缀）
pub fn extract_client_ip(req: &HttpRequest) -> Option<String> {
    extract_forwarded_ip_from_headers(req.headers())
        .or_else(|| req.peer_addr().map(|addr| addr.ip().to_string()))
        .map(|ip| strip_ipv4_mapped(&ip))
}

/// 是否值得做地理位置查询（可解析且为公网地址）
pub fn is_geo_lookup_candidate(ip: &str) -> bool {
    ip.parse::<IpAddr>()
        .map(|addr| !is_private_or_local(&addr))
        .unwrap_or(false)
}
