//! Conversation sessions ("tracks") and the process-level session pointers.
//!
//! # Storage
//!
//! Tracks and their append-only message history live in the `tracks` and
//! `messages` tables of the shared [`Store`](crate::store::Store).
//! The "last active track" and "last chat" pointers are held in an explicit
//! [`SessionState`] owned by the top-level service and mirrored to the
//! `settings` table so a restart resumes where it left off.

pub mod state;
pub mod tracks;

pub use state::SessionState;
pub use tracks::{Track, TrackManager};
