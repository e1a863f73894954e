//! Explicit session pointers.

use anyhow::Result;
use tracing::warn;

use crate::store::Store;

/// Settings key for the last active track id.
pub const LAST_TRACK_KEY: &str = "last_track_id";
/// Settings key for the last chat that sent a message.
pub const LAST_CHAT_KEY: &str = "last_chat_id";

/// Which track and chat the service last talked to.
///
/// Owned by the service and passed by reference down the dispatch path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub last_track_id: Option<i64>,
    pub last_chat_id: Option<String>,
}

impl SessionState {
    /// Load the persisted pointers. Unparseable values are ignored.
    pub fn restore(store: &Store) -> Result<Self> {
        let last_track_id = match store.get_setting(LAST_TRACK_KEY)? {
            Some(raw) => match raw.parse::<i64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    warn!(value = %raw, "ignoring malformed last_track_id");
                    None
                }
            },
            None => None,
        };
        let last_chat_id = store
            .get_setting(LAST_CHAT_KEY)?
            .filter(|v| !v.is_empty());
        Ok(Self {
            last_track_id,
            last_chat_id,
        })
    }

    /// Remember the chat a message arrived from.
    pub fn record_chat(&mut self, store: &Store, chat_id: &str) -> Result<()> {
        store.set_setting(LAST_CHAT_KEY, chat_id)?;
        self.last_chat_id = Some(chat_id.to_string());
        Ok(())
    }
}
