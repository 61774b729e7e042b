//! Service layer for business logic
//!
//! HTTP handlers stay thin; link creation, resolution and the side channels
//! (geolocation, remote log delivery) live here.

pub mod geoip;
mod link_service;
pub mod remote_log;

pub use geoip::{GeoInfo, GeoIpLookup, GeoIpProvider};
pub use link_service::*;
pub use remote_log::{LogLevel, LogNotifier, NullLogSink, RemoteLogSink, build_log_notifier};
