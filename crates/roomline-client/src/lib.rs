//! # roomline-client
//!
//! Client-side reconciliation engine for a polling group chat: session
//! gate, polling synchronizer, optimistic outbox, attachment staging and
//! scroll anchoring.  Rendering is left to the embedding binary, which
//! consumes [`UiEvent`]s and pulls [`ChatView`] snapshots.

pub mod api;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod intake;
pub mod outbox;
pub mod scroll;
pub mod session;
pub mod staging;
pub mod state;
pub mod sync;
pub mod timeline;

#[cfg(test)]
pub(crate) mod testing;

use tracing_subscriber::{fmt, EnvFilter};

pub use api::{ChatApi, HttpApi};
pub use client::ChatClient;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use events::{EventSink, UiEvent};
pub use intake::CandidateFile;
pub use scroll::{ScrollCommand, Viewport};
pub use session::{AuthMode, Screen, SessionGate};
pub use state::{ChatView, RenderedMessage};
pub use timeline::DeliveryMark;

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("roomline_client=debug,roomline_store=info,warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
