//! # roomline-shared
//!
//! Types shared by the roomline crates: the room server's wire schema,
//! boundary validation, protocol constants, and the image data-URL codec.

pub mod constants;
pub mod data_url;
pub mod error;
pub mod protocol;
pub mod types;

pub use error::{EncodeError, ProtocolError};
pub use types::{Message, Millis, User};
