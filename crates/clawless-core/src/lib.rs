//! Clawless Core — shared types, configuration, sandbox and persistence.
//!
//! This crate contains:
//! - **config**: JSON config schema, loader, env overrides
//! - **paths**: the three path roots and the `PathSandbox`
//! - **store**: the SQLite database every other crate writes through
//! - **session**: tracks, message history and the session pointers
//! - **router**: `#track:<name>` selector extraction
//! - **heartbeat**: the periodic unattended check

pub mod config;
pub mod heartbeat;
pub mod paths;
pub mod router;
pub mod session;
pub mod store;
pub mod types;
pub mod utils;

pub use paths::{PathRoots, PathSandbox, SandboxError};
pub use router::{RoutedMessage, Router};
pub use session::{SessionState, Track, TrackManager};
pub use store::Store;
pub use types::{Message, Role};
