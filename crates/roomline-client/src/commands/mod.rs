//! User-facing client operations.
//!
//! Each sub-module adds an `impl ChatClient` block for one domain.  Every
//! operation captures the session epoch before its first suspension and
//! re-checks it afterwards, so results that belong to an ended session are
//! dropped instead of applied.

pub mod attachments;
pub mod auth;
pub mod messaging;
pub mod profile;
pub mod viewport;
