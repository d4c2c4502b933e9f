use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Default number of user/assistant pairs remembered per user.
pub const MAX_TURNS: usize = 10;

/// Telegram user identifier.
pub type UserId = u64;

/// Speaker of a [`Turn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Wire name used by chat completion APIs.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    role: Role,
    content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Bounded per-user conversation log.
///
/// Each user keeps at most `2 * max_turns` [`Turn`]s; older turns are dropped
/// from the front as new ones arrive. Entries only appear on the first
/// [`append`](Self::append) and disappear on [`reset`](Self::reset).
///
/// ```
/// use tg_relay::history::{HistoryStore, Role, Turn};
/// let store = HistoryStore::new(1);
/// store.append(7, Role::User, "hi");
/// store.append(7, Role::Assistant, "hello");
/// store.append(7, Role::User, "again");
/// assert_eq!(store.get(7), vec![Turn::assistant("hello"), Turn::user("again")]);
/// ```
#[derive(Debug)]
pub struct HistoryStore {
    histories: Mutex<HashMap<UserId, VecDeque<Turn>>>,
    max_turns: usize,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(MAX_TURNS)
    }
}

impl HistoryStore {
    /// Create an empty store remembering `max_turns` exchanges per user.
    pub fn new(max_turns: usize) -> Self {
        Self {
            histories: Mutex::new(HashMap::new()),
            max_turns,
        }
    }

    /// Maximum number of turns retained per user.
    pub fn capacity(&self) -> usize {
        self.max_turns * 2
    }

    // Every mutation leaves the map consistent, so a poisoned lock is safe to reuse.
    fn lock(&self) -> MutexGuard<'_, HashMap<UserId, VecDeque<Turn>>> {
        self.histories.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of `user`'s history, oldest first. Empty for unknown users.
    pub fn get(&self, user: UserId) -> Vec<Turn> {
        self.lock()
            .get(&user)
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of turns currently stored for `user`.
    pub fn len(&self, user: UserId) -> usize {
        self.lock().get(&user).map_or(0, VecDeque::len)
    }

    /// Append a turn, evicting the oldest ones beyond the capacity.
    pub fn append(&self, user: UserId, role: Role, content: impl Into<String>) {
        let cap = self.capacity();
        let mut histories = self.lock();
        let history = histories.entry(user).or_default();
        history.push_back(Turn::new(role, content));
        while history.len() > cap {
            history.pop_front();
        }
        tracing::trace!(user, len = history.len(), "history appended");
    }

    /// Forget everything stored for `user`. No-op for unknown users.
    pub fn reset(&self, user: UserId) {
        if self.lock().remove(&user).is_some() {
            tracing::debug!(user, "history reset");
        }
    }
}
