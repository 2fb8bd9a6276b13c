//! Ward Core — domain models, the permission codec, the error taxonomy
//! and storage-agnostic repository traits.
//!
//! Nothing in this crate performs I/O. Storage lives in `ward-db`,
//! resolution, caching and enforcement in `ward-authz`, and the admin
//! use cases in `ward-admin`.

pub mod codec;
pub mod error;
pub mod models;
pub mod repository;

pub use codec::{PermissionKey, decode, encode};
pub use error::{ErrorKind, WardError, WardResult};
