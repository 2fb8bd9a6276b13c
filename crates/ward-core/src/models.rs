//! Domain models for Ward.
//!
//! The hierarchy (module → department → service, plus the independent
//! scope dimension) namespaces permissions; roles and grants connect
//! users to them.

pub mod department;
pub mod grant;
pub mod module;
pub mod permission;
pub mod role;
pub mod scope;
pub mod service;
