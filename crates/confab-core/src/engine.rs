//! The chat session synchronization engine.
//!
//! Owns the authoritative in-memory model of every chat session for the
//! current identity. Every mutation is applied optimistically to memory
//! first, then persisted through the remote full-collection replace
//! (authenticated) or the device-local temp sequence (guest). A failed
//! write is surfaced to the caller but never rolls the model back: the
//! in-memory state stays authoritative until the next successful
//! hydration.
//!
//! Collaborators are injected as ports; the engine never touches the
//! network or filesystem directly. State lives behind a single mutex held
//! only across synchronous mutation -- never across the generation call or
//! a persistence write.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use confab_types::chat::{
    clamp_title, timestamp_id, ChatMessage, ChatSession, SessionCollection,
};
use confab_types::error::EngineError;
use confab_types::identity::{Identity, IdentityMode};

use crate::auth::AuthSessionProvider;
use crate::generation::{ResponseGenerator, FALLBACK_APOLOGY};
use crate::history::{EphemeralStore, HistoryClient};
use crate::policy::content::{ContentFilter, Screening};
use crate::policy::quota::QuotaGate;
use crate::report::ReportSink;

/// Engine lifecycle phase.
///
/// Mutations are accepted only in `Ready`; while `Hydrating` they are
/// rejected with [`EngineError::NotReady`] rather than queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    Uninitialized,
    Hydrating,
    Ready,
}

/// Result of a successful `send_message`.
#[derive(Debug)]
pub struct SendOutcome {
    pub user: ChatMessage,
    pub assistant: ChatMessage,
    /// Set when the optimistic state could not be persisted. The new
    /// messages stay in memory regardless.
    pub save_error: Option<EngineError>,
}

struct EngineState {
    phase: EnginePhase,
    identity: Identity,
    collection: SessionCollection,
    /// The guest conversation. Authoritative only in guest mode; a stale
    /// copy may linger here after login and is ignored until the next
    /// guest hydration.
    temp_messages: Vec<ChatMessage>,
    in_flight: bool,
    guest_locked: bool,
}

impl EngineState {
    fn ensure_ready(&self) -> Result<(), EngineError> {
        if self.phase == EnginePhase::Ready {
            Ok(())
        } else {
            Err(EngineError::NotReady)
        }
    }

    fn visible_messages(&self) -> Vec<ChatMessage> {
        match self.identity.mode() {
            IdentityMode::Guest => self.temp_messages.clone(),
            IdentityMode::Authenticated => self
                .collection
                .active()
                .map(|s| s.messages.clone())
                .unwrap_or_default(),
        }
    }
}

/// What the completion half of a send has to write, decided under the lock.
enum PersistTarget {
    Remote(SessionCollection),
    Local(Vec<ChatMessage>),
    Skip,
}

/// The session synchronization engine, generic over its five ports.
///
/// One instance per process; state is owned by a single logical thread of
/// control. Methods take `&self` so the engine can be shared behind an
/// [`Arc`]; overlapping sends on the same conversation are rejected via
/// the in-flight flag, not queued.
pub struct ChatEngine<A, G, R, L, S> {
    auth: A,
    generator: G,
    history: R,
    ephemeral: L,
    report_sink: Arc<S>,
    quota: QuotaGate,
    filter: ContentFilter,
    state: Mutex<EngineState>,
}

impl<A, G, R, L, S> ChatEngine<A, G, R, L, S>
where
    A: AuthSessionProvider,
    G: ResponseGenerator,
    R: HistoryClient,
    L: EphemeralStore,
    S: ReportSink + 'static,
{
    /// Create an engine in the `Uninitialized` phase.
    ///
    /// Call [`hydrate`](Self::hydrate) before accepting user input.
    pub fn new(auth: A, generator: G, history: R, ephemeral: L, report_sink: S) -> Self {
        let identity = auth.identity();
        Self {
            auth,
            generator,
            history,
            ephemeral,
            report_sink: Arc::new(report_sink),
            quota: QuotaGate::default(),
            filter: ContentFilter,
            state: Mutex::new(EngineState {
                phase: EnginePhase::Uninitialized,
                identity,
                collection: SessionCollection::new(),
                temp_messages: Vec::new(),
                in_flight: false,
                guest_locked: false,
            }),
        }
    }

    /// Override the guest quota gate (tests, staged rollouts).
    pub fn with_quota(mut self, quota: QuotaGate) -> Self {
        self.quota = quota;
        self
    }

    // --- Read accessors -------------------------------------------------

    pub async fn phase(&self) -> EnginePhase {
        self.state.lock().await.phase
    }

    pub async fn identity_mode(&self) -> IdentityMode {
        self.state.lock().await.identity.mode()
    }

    /// Sessions in display order: pinned first, then id-descending.
    ///
    /// Recomputed on every call; never cached.
    pub async fn sorted_view(&self) -> Vec<ChatSession> {
        let st = self.state.lock().await;
        st.collection.sorted().cloned().collect()
    }

    pub async fn active_id(&self) -> Option<String> {
        let st = self.state.lock().await;
        st.collection.active_id().map(str::to_string)
    }

    /// The visible message sequence: the active session's messages when
    /// authenticated, the temp conversation when guest.
    pub async fn active_messages(&self) -> Vec<ChatMessage> {
        self.state.lock().await.visible_messages()
    }

    pub async fn is_in_flight(&self) -> bool {
        self.state.lock().await.in_flight
    }

    /// Whether the guest quota has latched the conversation shut.
    pub async fn is_guest_locked(&self) -> bool {
        self.state.lock().await.guest_locked
    }

    // --- Hydration ------------------------------------------------------

    /// Load authoritative state for the current identity, replacing
    /// whatever was in memory.
    ///
    /// Runs on engine start and after every identity change. A failed
    /// remote fetch falls back to an empty collection and is surfaced as
    /// an error, but the engine still becomes `Ready` -- availability over
    /// strict consistency.
    pub async fn hydrate(&self) -> Result<(), EngineError> {
        let identity = self.auth.identity();
        {
            let mut st = self.state.lock().await;
            st.phase = EnginePhase::Hydrating;
            st.identity = identity.clone();
            st.in_flight = false;
        }

        match identity {
            Identity::Authenticated { ref user_id } => {
                let fetched = self.history.fetch_all().await;
                let mut st = self.state.lock().await;
                st.guest_locked = false;
                st.phase = EnginePhase::Ready;
                match fetched {
                    Ok(mut collection) => {
                        // Default the view to the first stored session.
                        if collection.active_id().is_none() {
                            let first = collection.sessions().first().map(|s| s.id.clone());
                            if let Some(id) = first {
                                collection.set_active(Some(&id));
                            }
                        }
                        info!(
                            user_id = %user_id,
                            sessions = collection.len(),
                            "hydrated remote chat history"
                        );
                        st.collection = collection;
                        Ok(())
                    }
                    Err(err) => {
                        warn!(error = %err, "chat history fetch failed, starting empty");
                        st.collection = SessionCollection::new();
                        Err(EngineError::History(err))
                    }
                }
            }
            Identity::Guest => {
                let loaded = self.ephemeral.load_sequence().await;
                let mut st = self.state.lock().await;
                // The remote collection is discarded from memory on logout;
                // the server copy is untouched.
                st.collection = SessionCollection::new();
                st.phase = EnginePhase::Ready;
                match loaded {
                    Ok(sequence) => {
                        debug!(messages = sequence.len(), "hydrated temp chat");
                        st.temp_messages = sequence;
                        Ok(())
                    }
                    Err(err) => {
                        warn!(error = %err, "temp chat load failed, starting empty");
                        st.temp_messages = Vec::new();
                        Err(EngineError::Ephemeral(err))
                    }
                }
            }
        }
    }

    /// Re-hydrate on every identity change until the auth session closes.
    ///
    /// Intended to be spawned once next to the engine.
    pub async fn watch_identity(&self) {
        let mut events = self.auth.subscribe();
        while events.changed().await.is_ok() {
            if let Err(err) = self.hydrate().await {
                warn!(error = %err, "hydration after identity change failed");
            }
        }
    }

    // --- Mutations ------------------------------------------------------

    /// Send a user message and obtain the assistant's reply.
    ///
    /// Appends the user message optimistically (creating and activating a
    /// new session when none is active), generates the reply with the lock
    /// released, appends it to the session captured at call time -- not
    /// re-read from the active pointer -- and then issues exactly one
    /// persistence write. Generation failure is absorbed with the fixed
    /// apology; a failed write is carried in the outcome.
    pub async fn send_message(&self, text: &str) -> Result<SendOutcome, EngineError> {
        if text.trim().is_empty() {
            return Err(EngineError::EmptyMessage);
        }

        // Validate and apply the optimistic user append under the lock.
        let (mode, target_id, prior, user) = {
            let mut st = self.state.lock().await;
            st.ensure_ready()?;
            if st.in_flight {
                return Err(EngineError::SendInFlight);
            }

            let mode = st.identity.mode();
            let current_count = match mode {
                IdentityMode::Guest => st.temp_messages.len(),
                IdentityMode::Authenticated => {
                    st.collection.active().map(|s| s.messages.len()).unwrap_or(0)
                }
            };
            if !self.quota.may_accept(mode, current_count) {
                st.guest_locked = true;
                info!(count = current_count, "guest message limit reached");
                return Err(EngineError::QuotaExceeded);
            }

            if mode == IdentityMode::Authenticated {
                if let Screening::Blocked { term } = self.filter.screen(text) {
                    warn!(term, "message blocked by content policy");
                    self.spawn_report(text.to_string());
                    return Err(EngineError::PolicyViolation);
                }
            }

            let prior = st.visible_messages();
            let user = ChatMessage::user(text);
            let target_id = match mode {
                IdentityMode::Guest => {
                    st.temp_messages.push(user.clone());
                    None
                }
                IdentityMode::Authenticated => {
                    let active = st.collection.active_id().map(str::to_string);
                    let id = match active {
                        Some(id) => {
                            if let Some(session) = st.collection.get_mut(&id) {
                                session.messages.push(user.clone());
                            }
                            id
                        }
                        None => {
                            let id = timestamp_id();
                            let mut session =
                                ChatSession::new(id.clone(), clamp_title(text));
                            session.messages.push(user.clone());
                            st.collection.push_front(session);
                            st.collection.set_active(Some(&id));
                            info!(session_id = %id, "started new session");
                            id
                        }
                    };
                    Some(id)
                }
            };
            st.in_flight = true;
            (mode, target_id, prior, user)
        };

        // Generation runs with the lock released; selection and new-session
        // calls may land meanwhile without cancelling this send.
        let assistant_text = match self.generator.generate(text, &prior).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(error = %err, "assistant generation failed");
                FALLBACK_APOLOGY.to_string()
            }
        };
        let assistant = ChatMessage::assistant(assistant_text);

        // Append the reply to the captured target and snapshot for the write.
        let persist = {
            let mut st = self.state.lock().await;
            st.in_flight = false;
            if st.identity.mode() != mode {
                // The identity flipped mid-send; this completion belongs to
                // a model that no longer exists. Drop it.
                debug!("identity changed mid-send, dropping completion");
                PersistTarget::Skip
            } else {
                match target_id {
                    None => {
                        st.temp_messages.push(assistant.clone());
                        PersistTarget::Local(st.temp_messages.clone())
                    }
                    Some(ref id) => {
                        match st.collection.get_mut(id) {
                            Some(session) => session.messages.push(assistant.clone()),
                            None => {
                                debug!(session_id = %id, "target session deleted mid-send")
                            }
                        }
                        PersistTarget::Remote(st.collection.clone())
                    }
                }
            }
        };

        let save_error = match persist {
            PersistTarget::Remote(snapshot) => self
                .history
                .replace_all(&snapshot)
                .await
                .err()
                .map(EngineError::History),
            PersistTarget::Local(sequence) => self
                .ephemeral
                .save_sequence(&sequence)
                .await
                .err()
                .map(EngineError::Ephemeral),
            PersistTarget::Skip => None,
        };
        if let Some(err) = &save_error {
            warn!(error = %err, "failed to persist after send");
        }

        Ok(SendOutcome {
            user,
            assistant,
            save_error,
        })
    }

    /// Start composing into a fresh conversation.
    ///
    /// Clears the active pointer (and, for guests, the visible temp
    /// sequence). The persisted collection is untouched until the next
    /// send materializes a session.
    pub async fn new_session(&self) -> Result<(), EngineError> {
        let mut st = self.state.lock().await;
        st.ensure_ready()?;
        match st.identity.mode() {
            IdentityMode::Guest => {
                st.temp_messages.clear();
            }
            IdentityMode::Authenticated => {
                st.collection.set_active(None);
            }
        }
        Ok(())
    }

    /// Make a session the active one. Unknown ids are ignored.
    pub async fn select_session(&self, id: &str) -> Result<(), EngineError> {
        let mut st = self.state.lock().await;
        st.ensure_ready()?;
        if !st.collection.set_active(Some(id)) {
            debug!(session_id = %id, "select ignored for unknown session");
        }
        Ok(())
    }

    /// Rename a session and persist the full collection.
    ///
    /// A blank title is silently ignored -- it must not erase the existing
    /// one. The stored title is trimmed.
    pub async fn rename_session(&self, id: &str, new_title: &str) -> Result<(), EngineError> {
        let title = new_title.trim();
        let snapshot = {
            let mut st = self.state.lock().await;
            st.ensure_ready()?;
            if st.identity.mode() == IdentityMode::Guest || title.is_empty() {
                return Ok(());
            }
            let Some(session) = st.collection.get_mut(id) else {
                return Ok(());
            };
            session.title = title.to_string();
            info!(session_id = %id, "session renamed");
            st.collection.clone()
        };
        self.persist_remote(snapshot).await
    }

    /// Flip a session's pin flag and persist the full collection.
    pub async fn toggle_pin(&self, id: &str) -> Result<(), EngineError> {
        let snapshot = {
            let mut st = self.state.lock().await;
            st.ensure_ready()?;
            if st.identity.mode() == IdentityMode::Guest {
                return Ok(());
            }
            let Some(session) = st.collection.get_mut(id) else {
                return Ok(());
            };
            session.pinned = !session.pinned;
            info!(session_id = %id, pinned = session.pinned, "session pin toggled");
            st.collection.clone()
        };
        self.persist_remote(snapshot).await
    }

    /// Delete a session and persist the full collection.
    ///
    /// Deleting the active session clears the active pointer and the
    /// visible sequence with it.
    pub async fn delete_session(&self, id: &str) -> Result<(), EngineError> {
        let snapshot = {
            let mut st = self.state.lock().await;
            st.ensure_ready()?;
            if st.identity.mode() == IdentityMode::Guest {
                return Ok(());
            }
            if st.collection.remove(id).is_none() {
                return Ok(());
            }
            info!(session_id = %id, "session deleted");
            st.collection.clone()
        };
        self.persist_remote(snapshot).await
    }

    /// Delete every session and persist the now-empty collection.
    pub async fn delete_all_sessions(&self) -> Result<(), EngineError> {
        let snapshot = {
            let mut st = self.state.lock().await;
            st.ensure_ready()?;
            if st.identity.mode() == IdentityMode::Guest {
                return Ok(());
            }
            st.collection.clear();
            info!("chat history cleared");
            st.collection.clone()
        };
        self.persist_remote(snapshot).await
    }

    // --- Internals ------------------------------------------------------

    async fn persist_remote(&self, snapshot: SessionCollection) -> Result<(), EngineError> {
        match self.history.replace_all(&snapshot).await {
            Ok(()) => Ok(()),
            Err(err) => {
                // The optimistic mutation stays; only the write failed.
                warn!(error = %err, "failed to persist chat history");
                Err(EngineError::History(err))
            }
        }
    }

    /// Fire the safety report without blocking the rejection path.
    fn spawn_report(&self, text: String) {
        let sink = Arc::clone(&self.report_sink);
        tokio::spawn(async move {
            if let Err(err) = sink.report(&text).await {
                warn!(error = %err, "failed to deliver safety report");
            }
        });
    }
}
