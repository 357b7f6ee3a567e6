//! Ticketing for background hotspot refreshes.
//!
//! Each refresh is keyed by `(room id, perspective)`. Issuing a new ticket
//! for a key supersedes every earlier one, so only the most recently
//! started refresh may write its result.

use roomcraft_core::room::Perspective;
use std::collections::HashMap;
use std::sync::Mutex;

type RefreshKey = (String, Perspective);

#[derive(Debug, Default)]
pub struct RefreshTracker {
    latest: Mutex<HashMap<RefreshKey, u64>>,
}

impl RefreshTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a refresh for the key and returns its ticket.
    pub fn issue(&self, room_id: &str, perspective: Perspective) -> u64 {
        let mut latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        let ticket = latest
            .entry((room_id.to_string(), perspective))
            .or_insert(0);
        *ticket += 1;
        *ticket
    }

    /// Whether `ticket` is still the newest for the key.
    pub fn is_current(&self, room_id: &str, perspective: Perspective, ticket: u64) -> bool {
        let latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        latest.get(&(room_id.to_string(), perspective)) == Some(&ticket)
    }
}
