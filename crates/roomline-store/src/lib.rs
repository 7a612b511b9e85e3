//! # roomline-store
//!
//! Durable client-side storage for roomline.
//!
//! Chat history is never persisted; the only thing that outlives a process
//! is the session token.  The crate exposes a synchronous `Database` handle
//! over a `rusqlite::Connection` and a [`TokenStore`] abstraction the session
//! gate writes through.

pub mod database;
pub mod kv;
pub mod migrations;
pub mod token_store;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use token_store::{MemoryTokenStore, SqliteTokenStore, TokenStore};
