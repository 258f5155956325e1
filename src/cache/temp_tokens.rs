/// In-process cache for the temporary tokens that bridge the gap between
/// password verification and second-factor completion.
///
/// Entries self-expire; the cache lives exactly as long as the process. A
/// restart mid-window simply forces the user to log in again.
use dashmap::DashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

// Namespace prefix so keys cannot collide with other uses if the map is
// ever shared.
const KEY_PREFIX: &str = "2fa:login:";

#[derive(Debug, Clone)]
struct Entry {
    user_id: Uuid,
    deadline: Instant,
}

#[derive(Debug, Default)]
pub struct TempTokenCache {
    entries: DashMap<String, Entry>,
}

impl TempTokenCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn put(&self, token: &str, user_id: Uuid, ttl: Duration) {
        self.entries.insert(
            Self::key(token),
            Entry {
                user_id,
                deadline: Instant::now() + ttl,
            },
        );
    }

    /// Look up a pending user id. Does not consume the entry; the caller
    /// decides when the token has served its purpose.
    pub fn get(&self, token: &str) -> Option<Uuid> {
        let key = Self::key(token);

        if let Some(entry) = self.entries.get(&key) {
            if entry.deadline > Instant::now() {
                return Some(entry.user_id);
            }
        } else {
            return None;
        }

        // Expired entry found on read
        self.entries.remove(&key);
        None
    }

    pub fn remove(&self, token: &str) {
        self.entries.remove(&Self::key(token));
    }

    /// Drop every expired entry. Called periodically from a background
    /// task so abandoned logins do not accumulate.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.deadline > now);
    }

    fn key(token: &str) -> String {
        format!("{KEY_PREFIX}{token}")
    }
}
