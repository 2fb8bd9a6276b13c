//! Ward server — configuration and service wiring for the `ward-server`
//! binary.

pub mod app;
pub mod config;
