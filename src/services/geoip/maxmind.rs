//! MaxMind GeoLite2 数据库实现
//!
//! The whole `.mmdb` file is read into memory once at startup; lookups are
//! plain in-memory tree walks, so no caching layer sits in front of them.

use std::net::IpAddr;
use std::path::Path;

use async_trait::async_trait;
use maxminddb::Reader;
use maxminddb::geoip2::City;
use tracing::trace;

use super::provider::{GeoInfo, GeoIpLookup};
use crate::errors::{Result, SnaplinkError};

/// MaxMind GeoIP Provider (GeoLite2-City / GeoIP2-City)
pub struct MaxMindProvider {
    reader: Reader<Vec<u8>>,
}

impl MaxMindProvider {
    /// 加载数据库文件
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = Reader::open_readfile(path).map_err(|e| {
            SnaplinkError::file_operation(format!(
                "Cannot load MaxMind database {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self { reader })
    }

    fn decode_city(&self, addr: IpAddr) -> Option<GeoInfo> {
        let record: City = self.reader.lookup(addr).ok()?.decode().ok()??;

        let info = GeoInfo {
            country: record.country.iso_code.map(String::from),
            // 取第一级行政区（州/省）
            region: record
                .subdivisions
                .first()
                .and_then(|s| s.iso_code)
                .map(String::from),
            city: record.city.names.english.map(String::from),
        };

        (!info.is_empty()).then_some(info)
    }
}

#[async_trait]
impl GeoIpLookup for MaxMindProvider {
    async fn lookup(&self, ip: &str) -> Option<GeoInfo> {
        let addr: IpAddr = ip.parse().ok()?;
        let info = self.decode_city(addr);
        trace!("MaxMind lookup for {}: {:?}", ip, info);
        info
    }

    fn name(&self) -> &'static str {
        "MaxMind"
    }
}
