//! Chat message, session, and collection types for Confab.
//!
//! These types model the conversation state the synchronization engine
//! owns: immutable messages, titled sessions with pin metadata, and the
//! per-identity `SessionCollection` with its active-session pointer.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Maximum number of characters in a session title.
///
/// Titles derived from the first user message are clamped to this length;
/// renames longer than this are stored as given (the clamp applies only to
/// derived titles, matching the stored history).
pub const TITLE_MAX_CHARS: usize = 30;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for Sender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Sender::User),
            "assistant" => Ok(Sender::Assistant),
            other => Err(format!("invalid sender: '{other}'")),
        }
    }
}

/// Mint a message or session id from the current wall clock.
///
/// Millisecond resolution, matching the ids already stored in existing
/// histories. Two calls within the same millisecond produce the same id;
/// that collision risk is accepted and must not be "fixed" here, since a
/// stronger scheme would change stored identity semantics.
pub fn timestamp_id() -> String {
    Utc::now().timestamp_millis().to_string()
}

/// Clamp text to [`TITLE_MAX_CHARS`] characters for use as a session title.
pub fn clamp_title(text: &str) -> String {
    text.chars().take(TITLE_MAX_CHARS).collect()
}

/// A single chat message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub text: String,
    pub sender: Sender,
}

impl ChatMessage {
    /// Create a user message with a freshly minted timestamp id.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: timestamp_id(),
            text: text.into(),
            sender: Sender::User,
        }
    }

    /// Create an assistant message with a freshly minted timestamp id.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            id: timestamp_id(),
            text: text.into(),
            sender: Sender::Assistant,
        }
    }
}

/// One titled conversation thread.
///
/// `id` is assigned once, at creation, and never reused. Messages are
/// append-only during a live conversation; the sequence is replaced
/// wholesale only through collection-level operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub title: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub pinned: bool,
}

impl ChatSession {
    /// Create an empty session with the given id and title.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            messages: Vec::new(),
            pinned: false,
        }
    }
}

/// Descending id order: numeric when both ids parse as integers, else
/// lexicographic. Timestamp ids therefore sort newest-first.
fn id_order_desc(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(an), Ok(bn)) => bn.cmp(&an),
        _ => b.cmp(a),
    }
}

/// The full set of one identity's sessions plus the active-session pointer.
///
/// Invariant: `active_id` always names a session present in the collection,
/// or is `None`. The mutating methods maintain this themselves -- `remove`
/// and `clear` drop a dangling pointer rather than leaving it behind.
///
/// The pointer is per-device view state, not part of the stored history,
/// so it is skipped during (de)serialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionCollection {
    sessions: Vec<ChatSession>,
    #[serde(skip)]
    active_id: Option<String>,
}

impl SessionCollection {
    /// Create an empty collection with no active session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collection from stored sessions, in stored order.
    pub fn with_sessions(sessions: Vec<ChatSession>) -> Self {
        Self {
            sessions,
            active_id: None,
        }
    }

    /// Sessions in stored (insertion) order.
    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.iter().any(|s| s.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ChatSession> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    /// Insert a new session at the front of the stored order.
    pub fn push_front(&mut self, session: ChatSession) {
        self.sessions.insert(0, session);
    }

    /// Remove a session by id, returning it if present.
    ///
    /// Clears the active pointer when it referenced the removed session.
    pub fn remove(&mut self, id: &str) -> Option<ChatSession> {
        let index = self.sessions.iter().position(|s| s.id == id)?;
        if self.active_id.as_deref() == Some(id) {
            self.active_id = None;
        }
        Some(self.sessions.remove(index))
    }

    /// Remove every session and clear the active pointer.
    pub fn clear(&mut self) {
        self.sessions.clear();
        self.active_id = None;
    }

    /// The currently active session id, if any.
    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    /// The currently active session, if any.
    pub fn active(&self) -> Option<&ChatSession> {
        self.active_id.as_deref().and_then(|id| self.get(id))
    }

    /// Point at a session, or clear the pointer with `None`.
    ///
    /// Pointing at an id not present in the collection is a no-op; returns
    /// whether the pointer was updated.
    pub fn set_active(&mut self, id: Option<&str>) -> bool {
        match id {
            None => {
                self.active_id = None;
                true
            }
            Some(id) if self.contains(id) => {
                self.active_id = Some(id.to_string());
                true
            }
            Some(_) => false,
        }
    }

    /// Display order: pinned sessions first, then descending id within each
    /// group (numeric when both ids are numeric, lexicographic otherwise).
    ///
    /// Recomputed on every call -- pin, rename, and delete all mutate the
    /// underlying set, so a cached order would go stale.
    pub fn sorted(&self) -> impl Iterator<Item = &ChatSession> {
        let mut ordered: Vec<&ChatSession> = self.sessions.iter().collect();
        ordered.sort_by(|a, b| {
            b.pinned
                .cmp(&a.pinned)
                .then_with(|| id_order_desc(&a.id, &b.id))
        });
        ordered.into_iter()
    }
}
