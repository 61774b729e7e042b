//! Snaplink - an in-memory URL shortener with expiring links
//!
//! # Architecture
//! - `registry`: concurrent shortcode store with lazy expiry and a background sweep
//! - `services`: link creation/resolution, geolocation, remote log delivery
//! - `api`: HTTP handlers and middleware
//! - `config`: TOML + environment configuration
//! - `runtime`: startup, server mode and graceful shutdown
//! - `system`: logging initialization

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod registry;
pub mod runtime;
pub mod services;
pub mod system;
pub mod utils;
