//! The chat session state machine.
//!
//! One `SessionManager` drives one visible conversation: it stages user
//! turns, opens the transport, assembles the streamed response into the
//! in-flight assistant turn, and persists the completed exchange. Observers
//! follow along through `ChangeNotifier` callbacks.
//!
//! Locking: the session state lives behind a `std::sync::Mutex` that is
//! never held across an await. Teardown paths cancel the in-flight stream
//! while holding the state lock, and every mutation on the send path
//! re-checks its cancellation token under that same lock, so a concurrent
//! teardown can never see a write land after its reset.

use banter_types::config::ClientConfig;
use banter_types::conversation::ConversationSummary;
use banter_types::error::{SessionError, StoreError, StreamError};
use banter_types::message::Message;
use banter_types::session::{SessionChange, SessionStatus};
use chrono::Utc;
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use std::sync::Mutex;

use crate::api::request::build_chat_request;
use crate::api::transport::Transport;
use crate::session::notify::{ChangeNotifier, SubscriptionToken};
use crate::store::RecordStore;
use crate::stream::assembler::assemble;

/// Transient, process-local view of the active conversation.
///
/// Never persisted itself; the durable side lives in the `RecordStore`.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Empty until the conversation's first exchange completes.
    pub active_conversation_id: String,
    pub messages: Vec<Message>,
    pub selected_model: String,
    /// Attachment references staged for the next send.
    pub pending_attachments: Vec<String>,
    pub status: SessionStatus,
    /// How many leading entries of `messages` are durably stored.
    pub persisted_len: usize,
}

/// Drives the send/stream lifecycle for the active conversation.
///
/// Generic over the store and transport so the state machine stays free of
/// IO concerns. Methods take `&self`; share the manager behind an `Arc`
/// when observers or background tasks need it.
pub struct SessionManager<R, T> {
    store: R,
    transport: T,
    config: ClientConfig,
    api_key: SecretString,
    state: Mutex<Session>,
    notifier: ChangeNotifier,
    active_stream: Mutex<Option<CancellationToken>>,
}

impl<R: RecordStore, T: Transport> SessionManager<R, T> {
    pub fn new(store: R, transport: T, config: ClientConfig, api_key: SecretString) -> Self {
        let session = Session {
            selected_model: config.default_model.clone(),
            ..Session::default()
        };
        Self {
            store,
            transport,
            config,
            api_key,
            state: Mutex::new(session),
            notifier: ChangeNotifier::new(),
            active_stream: Mutex::new(None),
        }
    }

    /// Access the record store (for reads that bypass the session, like
    /// conversation listings).
    pub fn store(&self) -> &R {
        &self.store
    }

    /// Access the client configuration (for presentation that needs the
    /// endpoint or defaults, like the chat banner).
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Register an observer for session changes.
    pub fn subscribe(
        &self,
        callback: impl Fn(&SessionChange) + Send + Sync + 'static,
    ) -> SubscriptionToken {
        self.notifier.subscribe(callback)
    }

    pub fn unsubscribe(&self, token: SubscriptionToken) {
        self.notifier.unsubscribe(token);
    }

    /// Clone of the current session state, for renderers.
    pub fn snapshot(&self) -> Session {
        self.state.lock().expect("session state lock poisoned").clone()
    }

    /// Stage an attachment reference for the next send.
    pub fn stage_attachment(&self, reference: impl Into<String>) {
        let mut session = self.state.lock().expect("session state lock poisoned");
        session.pending_attachments.push(reference.into());
    }

    pub fn staged_attachments(&self) -> Vec<String> {
        self.state
            .lock()
            .expect("session state lock poisoned")
            .pending_attachments
            .clone()
    }

    /// Switch to a conversation, or to a fresh one.
    ///
    /// Cancels any in-flight stream first. With an id, the stored log
    /// becomes the visible transcript; without, the transcript is cleared.
    /// Either way the status settles to Idle and staged attachments are
    /// dropped.
    pub async fn start_conversation(&self, resume: Option<&str>) -> Result<(), SessionError> {
        {
            let _session = self.state.lock().expect("session state lock poisoned");
            self.cancel_stream_locked();
        }

        let loaded = match resume {
            Some(id) => match self.store.list_messages(id).await {
                Ok(messages) => Some((id.to_string(), messages)),
                Err(err) => {
                    // The old stream is already dead; do not leave the
                    // session wedged in a busy status.
                    self.settle_idle();
                    return Err(SessionError::Storage(err));
                }
            },
            None => None,
        };

        let status_changed = {
            let mut session = self.state.lock().expect("session state lock poisoned");
            let was = session.status;
            match loaded {
                Some((id, messages)) => {
                    info!(conversation_id = %id, messages = messages.len(), "Conversation resumed");
                    session.active_conversation_id = id;
                    session.persisted_len = messages.len();
                    session.messages = messages;
                }
                None => {
                    session.active_conversation_id.clear();
                    session.messages.clear();
                    session.persisted_len = 0;
                }
            }
            session.pending_attachments.clear();
            session.status = SessionStatus::Idle;
            was != SessionStatus::Idle
        };

        self.notifier.notify(&SessionChange::Transcript);
        if status_changed {
            self.notifier.notify(&SessionChange::Status {
                status: SessionStatus::Idle,
            });
        }
        Ok(())
    }

    /// Select the completion model. Always starts a fresh conversation;
    /// an in-flight stream is force-cancelled first.
    ///
    /// Staged attachments survive the switch.
    pub fn select_model(&self, model: impl Into<String>) {
        let model = model.into();
        let status_changed = {
            let mut session = self.state.lock().expect("session state lock poisoned");
            self.cancel_stream_locked();
            let was = session.status;
            session.selected_model = model.clone();
            session.messages.clear();
            session.active_conversation_id.clear();
            session.persisted_len = 0;
            session.status = SessionStatus::Idle;
            was != SessionStatus::Idle
        };

        self.notifier.notify(&SessionChange::Transcript);
        if status_changed {
            self.notifier.notify(&SessionChange::Status {
                status: SessionStatus::Idle,
            });
        }
        info!(model = %model, "Model selected, conversation reset");
    }

    /// Send one user turn and stream the reply into the transcript.
    ///
    /// The full status lifecycle runs inside this call: Sending while the
    /// request goes out, Streaming while fragments land, then Idle once the
    /// exchange is persisted. Failures leave the session in Error; the next
    /// send clears it and discards the unpersisted tail.
    pub async fn send(&self, text: &str) -> Result<(), SessionError> {
        let mut changes: Vec<SessionChange> = Vec::new();

        let (request, conversation_id, user_index, cancel) = {
            let mut session = self.state.lock().expect("session state lock poisoned");

            if matches!(
                session.status,
                SessionStatus::Sending | SessionStatus::Streaming
            ) {
                return Err(SessionError::Busy);
            }
            if session.status == SessionStatus::Error {
                session.status = SessionStatus::Idle;
                changes.push(SessionChange::Status {
                    status: SessionStatus::Idle,
                });
            }

            if text.is_empty() && session.pending_attachments.is_empty() {
                drop(session);
                self.emit(&changes);
                return Err(SessionError::InvalidArgument(
                    "message text and attachments are both empty".to_string(),
                ));
            }

            // A failed attempt leaves its turns visible but not durable;
            // discard them before staging so log positions stay aligned
            // with the store.
            let persisted_len = session.persisted_len;
            session.messages.truncate(persisted_len);

            let conversation_id = if session.active_conversation_id.is_empty() {
                Uuid::now_v7().to_string()
            } else {
                session.active_conversation_id.clone()
            };

            let request = build_chat_request(
                &self.config,
                &self.api_key,
                &session.selected_model,
                &session.messages,
                text,
            );

            let user_index = session.messages.len();
            let attachments = std::mem::take(&mut session.pending_attachments);
            session.messages.push(Message::user(
                conversation_id.clone(),
                user_index,
                text,
                attachments,
            ));
            session.status = SessionStatus::Sending;
            changes.push(SessionChange::Transcript);
            changes.push(SessionChange::Status {
                status: SessionStatus::Sending,
            });

            let cancel = CancellationToken::new();
            *self
                .active_stream
                .lock()
                .expect("active stream slot poisoned") = Some(cancel.clone());

            (request, conversation_id, user_index, cancel)
        };
        self.emit(&changes);

        debug!(
            conversation_id = %conversation_id,
            model = %request.body.model,
            "Opening completion stream"
        );

        let stream = match self.transport.open(&request).await {
            Ok(stream) => stream,
            Err(err) => {
                warn!(error = %err, "Transport open failed");
                return Err(self.fail_send(&cancel, SessionError::Transport(err)));
            }
        };

        // The assistant turn exists from the first streamed byte onward.
        {
            let mut session = self.state.lock().expect("session state lock poisoned");
            if cancel.is_cancelled() {
                return Err(SessionError::Cancelled);
            }
            session
                .messages
                .push(Message::assistant(conversation_id.clone(), user_index + 1));
            session.status = SessionStatus::Streaming;
        }
        self.notifier.notify(&SessionChange::Transcript);
        self.notifier.notify(&SessionChange::Status {
            status: SessionStatus::Streaming,
        });

        let outcome = assemble(stream, &cancel, |fragment| {
            let mut session = self.state.lock().expect("session state lock poisoned");
            if cancel.is_cancelled() {
                return false;
            }
            if let Some(message) = session.messages.last_mut() {
                message.append_fragment(fragment);
            }
            drop(session);
            self.notifier.notify(&SessionChange::Fragment {
                text: fragment.to_string(),
            });
            true
        })
        .await;

        match outcome {
            Ok(()) => self.complete_send(&cancel, &conversation_id, user_index).await,
            Err(StreamError::Cancelled) => Err(SessionError::Cancelled),
            Err(StreamError::Interrupted(reason)) => {
                warn!(reason = %reason, "Response stream interrupted");
                Err(self.fail_send(&cancel, SessionError::StreamInterrupted(reason)))
            }
        }
    }

    /// Delete a conversation's stored records.
    ///
    /// Deleting the active conversation also cancels any in-flight stream
    /// and clears the visible transcript. Deleting an unknown conversation
    /// is a no-op.
    pub async fn delete_conversation(&self, conversation_id: &str) -> Result<(), SessionError> {
        let teardown = {
            let mut session = self.state.lock().expect("session state lock poisoned");
            if session.active_conversation_id == conversation_id {
                self.cancel_stream_locked();
                session.active_conversation_id.clear();
                session.messages.clear();
                session.persisted_len = 0;
                let was = session.status;
                session.status = SessionStatus::Idle;
                Some(was != SessionStatus::Idle)
            } else {
                None
            }
        };
        if let Some(status_changed) = teardown {
            self.notifier.notify(&SessionChange::Transcript);
            if status_changed {
                self.notifier.notify(&SessionChange::Status {
                    status: SessionStatus::Idle,
                });
            }
        }

        self.store.delete_conversation(conversation_id).await?;
        info!(conversation_id = %conversation_id, "Conversation deleted");
        Ok(())
    }

    /// Tear down any in-flight send without switching conversations.
    ///
    /// The unpersisted tail (including the partial assistant turn) is
    /// discarded; nothing is written to the store.
    pub fn cancel_active(&self) {
        let (truncated, status_changed) = {
            let mut session = self.state.lock().expect("session state lock poisoned");
            self.cancel_stream_locked();
            let persisted_len = session.persisted_len;
            let truncated = session.messages.len() > persisted_len;
            session.messages.truncate(persisted_len);
            let was = session.status;
            session.status = SessionStatus::Idle;
            (truncated, was != SessionStatus::Idle)
        };

        if truncated {
            self.notifier.notify(&SessionChange::Transcript);
        }
        if status_changed {
            self.notifier.notify(&SessionChange::Status {
                status: SessionStatus::Idle,
            });
        }
    }

    // --- Send internals ---

    async fn complete_send(
        &self,
        cancel: &CancellationToken,
        conversation_id: &str,
        user_index: usize,
    ) -> Result<(), SessionError> {
        // Snapshot the completed turns under the lock, persist outside it.
        let (user_message, assistant_message) = {
            let mut session = self.state.lock().expect("session state lock poisoned");
            if cancel.is_cancelled() {
                return Err(SessionError::Cancelled);
            }
            if session.active_conversation_id.is_empty() {
                session.active_conversation_id = conversation_id.to_string();
            }
            (
                session.messages[user_index].clone(),
                session.messages[user_index + 1].clone(),
            )
        };

        let summary = ConversationSummary {
            conversation_id: conversation_id.to_string(),
            last_prompt: user_message.content.clone(),
            last_response: assistant_message.content.clone(),
            attachment_refs: user_message.attachment_refs.clone(),
            updated_at: Utc::now(),
        };

        match self
            .persist_exchange(conversation_id, user_index, &user_message, &assistant_message, &summary)
            .await
        {
            Ok(()) => {
                {
                    let mut session = self.state.lock().expect("session state lock poisoned");
                    if cancel.is_cancelled() {
                        // Torn down while persisting. The exchange is durable,
                        // but the resetter owns the in-memory state now.
                        return Err(SessionError::Cancelled);
                    }
                    session.persisted_len = user_index + 2;
                    session.status = SessionStatus::Idle;
                    *self
                        .active_stream
                        .lock()
                        .expect("active stream slot poisoned") = None;
                }
                self.notifier.notify(&SessionChange::Status {
                    status: SessionStatus::Idle,
                });
                info!(conversation_id = %conversation_id, "Exchange persisted");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Failed to persist completed exchange");
                Err(self.fail_send(cancel, SessionError::Storage(err)))
            }
        }
    }

    /// Three sequential commits; a crash in between leaves the message log
    /// ahead of the summary, which readers tolerate.
    async fn persist_exchange(
        &self,
        conversation_id: &str,
        user_index: usize,
        user_message: &Message,
        assistant_message: &Message,
        summary: &ConversationSummary,
    ) -> Result<(), StoreError> {
        self.store
            .put_message(conversation_id, user_index, user_message)
            .await?;
        self.store
            .put_message(conversation_id, user_index + 1, assistant_message)
            .await?;
        self.store.put_summary(summary).await
    }

    /// Mark the in-flight send failed, unless a concurrent teardown
    /// already reset the session (then the teardown outcome wins).
    fn fail_send(&self, cancel: &CancellationToken, err: SessionError) -> SessionError {
        {
            let mut session = self.state.lock().expect("session state lock poisoned");
            if cancel.is_cancelled() {
                return SessionError::Cancelled;
            }
            session.status = SessionStatus::Error;
            *self
                .active_stream
                .lock()
                .expect("active stream slot poisoned") = None;
        }
        self.notifier.notify(&SessionChange::Status {
            status: SessionStatus::Error,
        });
        err
    }

    /// Cancel the in-flight stream, if any. Callers hold the state lock,
    /// which is what keeps cancellation ordered against state resets.
    fn cancel_stream_locked(&self) {
        if let Some(token) = self
            .active_stream
            .lock()
            .expect("active stream slot poisoned")
            .take()
        {
            token.cancel();
        }
    }

    /// Settle a cancelled stream's status back to Idle.
    fn settle_idle(&self) {
        let changed = {
            let mut session = self.state.lock().expect("session state lock poisoned");
            if matches!(
                session.status,
                SessionStatus::Sending | SessionStatus::Streaming
            ) {
                session.status = SessionStatus::Idle;
                true
            } else {
                false
            }
        };
        if changed {
            self.notifier.notify(&SessionChange::Status {
                status: SessionStatus::Idle,
            });
        }
    }

    fn emit(&self, changes: &[SessionChange]) {
        for change in changes {
            self.notifier.notify(change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banter_types::error::TransportError;
    use banter_types::message::Role;
    use banter_types::profile::UserProfile;
    use banter_types::settings::Settings;
    use bytes::Bytes;
    use futures_util::{StreamExt, stream};
    use tokio::sync::Notify;

    use std::collections::{BTreeMap, HashMap, VecDeque};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::api::request::RequestSpec;

    // --- Fixtures ---

    #[derive(Default)]
    struct MemoryStore {
        records: Mutex<BTreeMap<(String, usize), Message>>,
        summaries: Mutex<HashMap<String, ConversationSummary>>,
        settings: Mutex<Option<Settings>>,
        profile: Mutex<Option<UserProfile>>,
        fail_writes: AtomicBool,
    }

    impl MemoryStore {
        fn message_count(&self, conversation_id: &str) -> usize {
            self.records
                .lock()
                .unwrap()
                .keys()
                .filter(|(id, _)| id == conversation_id)
                .count()
        }

        fn check(&self) -> Result<(), StoreError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                Err(StoreError::Query("simulated write failure".to_string()))
            } else {
                Ok(())
            }
        }
    }

    impl RecordStore for MemoryStore {
        async fn put_message(
            &self,
            conversation_id: &str,
            index: usize,
            message: &Message,
        ) -> Result<(), StoreError> {
            self.check()?;
            self.records
                .lock()
                .unwrap()
                .insert((conversation_id.to_string(), index), message.clone());
            Ok(())
        }

        async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, StoreError> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .filter(|((id, _), _)| id == conversation_id)
                .map(|(_, message)| message.clone())
                .collect())
        }

        async fn put_summary(&self, summary: &ConversationSummary) -> Result<(), StoreError> {
            self.check()?;
            self.summaries
                .lock()
                .unwrap()
                .insert(summary.conversation_id.clone(), summary.clone());
            Ok(())
        }

        async fn list_summaries(&self) -> Result<Vec<ConversationSummary>, StoreError> {
            let mut summaries: Vec<ConversationSummary> =
                self.summaries.lock().unwrap().values().cloned().collect();
            summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            Ok(summaries)
        }

        async fn delete_conversation(&self, conversation_id: &str) -> Result<(), StoreError> {
            self.records
                .lock()
                .unwrap()
                .retain(|(id, _), _| id != conversation_id);
            self.summaries.lock().unwrap().remove(conversation_id);
            Ok(())
        }

        async fn get_settings(&self) -> Result<Settings, StoreError> {
            Ok(self.settings.lock().unwrap().clone().unwrap_or_default())
        }

        async fn put_settings(&self, settings: &Settings) -> Result<(), StoreError> {
            *self.settings.lock().unwrap() = Some(settings.clone());
            Ok(())
        }

        async fn get_profile(&self) -> Result<UserProfile, StoreError> {
            Ok(self.profile.lock().unwrap().clone().unwrap_or_default())
        }

        async fn put_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
            *self.profile.lock().unwrap() = Some(profile.clone());
            Ok(())
        }
    }

    enum Script {
        Refuse(TransportError),
        /// Serve the whole body, then end the stream.
        Body(String),
        /// Serve a prefix, then hang until cancelled.
        Hang(String),
    }

    struct ScriptedTransport {
        script: Mutex<VecDeque<Script>>,
    }

    impl ScriptedTransport {
        fn with(script: Vec<Script>) -> Self {
            Self {
                script: Mutex::new(script.into()),
            }
        }
    }

    impl Transport for ScriptedTransport {
        async fn open(
            &self,
            _request: &RequestSpec,
        ) -> Result<crate::api::transport::ByteStream, TransportError> {
            let next = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .expect("transport opened more times than scripted");
            match next {
                Script::Refuse(err) => Err(err),
                Script::Body(body) => Ok(Box::pin(stream::iter(vec![Ok(Bytes::from(body))]))),
                Script::Hang(prefix) => Ok(Box::pin(
                    stream::iter(vec![Ok(Bytes::from(prefix))]).chain(stream::pending()),
                )),
            }
        }
    }

    fn delta(text: &str) -> String {
        format!("data: {{\"choices\":[{{\"delta\":{{\"content\":\"{text}\"}}}}]}}\n\n")
    }

    fn full_body(fragments: &[&str]) -> String {
        let mut body = String::new();
        for fragment in fragments {
            body.push_str(&delta(fragment));
        }
        body.push_str("data: [DONE]\n\n");
        body
    }

    fn manager(script: Vec<Script>) -> SessionManager<MemoryStore, ScriptedTransport> {
        SessionManager::new(
            MemoryStore::default(),
            ScriptedTransport::with(script),
            ClientConfig::default(),
            SecretString::from("sk-test".to_string()),
        )
    }

    /// Collects every change a subscription sees.
    fn record_changes(
        manager: &SessionManager<MemoryStore, ScriptedTransport>,
    ) -> Arc<Mutex<Vec<SessionChange>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        manager.subscribe(move |change| sink.lock().unwrap().push(change.clone()));
        seen
    }

    fn statuses(changes: &[SessionChange]) -> Vec<SessionStatus> {
        changes
            .iter()
            .filter_map(|change| match change {
                SessionChange::Status { status } => Some(*status),
                _ => None,
            })
            .collect()
    }

    fn fragments(changes: &[SessionChange]) -> String {
        changes
            .iter()
            .filter_map(|change| match change {
                SessionChange::Fragment { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    // --- Tests ---

    #[test]
    fn new_manager_seeds_model_and_exposes_config() {
        let config = ClientConfig {
            base_url: "http://localhost:9900/v1".to_string(),
            default_model: "test/tiny".to_string(),
            ..ClientConfig::default()
        };
        let manager = SessionManager::new(
            MemoryStore::default(),
            ScriptedTransport::with(vec![]),
            config,
            SecretString::from("sk-test".to_string()),
        );

        assert_eq!(manager.config().base_url, "http://localhost:9900/v1");
        assert_eq!(manager.snapshot().selected_model, "test/tiny");
    }

    #[tokio::test]
    async fn send_streams_persists_and_settles_idle() {
        let manager = manager(vec![Script::Body(full_body(&["I", "'m", " fine"]))]);
        let seen = record_changes(&manager);

        manager.send("How are you?").await.unwrap();

        let session = manager.snapshot();
        assert_eq!(session.status, SessionStatus::Idle);
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.persisted_len, 2);
        assert!(!session.active_conversation_id.is_empty());
        assert_eq!(session.messages[0].role, Role::User);
        assert_eq!(session.messages[0].content, "How are you?");
        assert_eq!(session.messages[1].role, Role::Assistant);
        assert_eq!(session.messages[1].content, "I'm fine");

        // Ids are log positions.
        assert_eq!(session.messages[0].id, "0");
        assert_eq!(session.messages[1].id, "1");

        let stored = manager
            .store()
            .list_messages(&session.active_conversation_id)
            .await
            .unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].content, "How are you?");
        assert_eq!(stored[1].content, "I'm fine");

        let summaries = manager.store().list_summaries().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].last_prompt, "How are you?");
        assert_eq!(summaries[0].last_response, "I'm fine");

        let seen = seen.lock().unwrap();
        assert_eq!(
            statuses(&seen),
            vec![
                SessionStatus::Sending,
                SessionStatus::Streaming,
                SessionStatus::Idle
            ]
        );
        assert_eq!(fragments(&seen), "I'm fine");
    }

    #[tokio::test]
    async fn resume_two_then_send_yields_four() {
        let manager = manager(vec![Script::Body(full_body(&["Sure."]))]);

        // Seed a stored conversation with one prior exchange.
        let store = manager.store();
        store
            .put_message("c-prior", 0, &Message::user("c-prior", 0, "hello", vec![]))
            .await
            .unwrap();
        let mut reply = Message::assistant("c-prior", 1);
        reply.append_fragment("hi!");
        store.put_message("c-prior", 1, &reply).await.unwrap();

        manager.start_conversation(Some("c-prior")).await.unwrap();
        assert_eq!(manager.snapshot().messages.len(), 2);
        assert_eq!(manager.snapshot().persisted_len, 2);

        let seen = record_changes(&manager);
        manager.send("one more thing").await.unwrap();

        let session = manager.snapshot();
        assert_eq!(session.messages.len(), 4);
        assert_eq!(session.messages[2].id, "2");
        assert_eq!(session.messages[3].id, "3");
        assert_eq!(
            statuses(&seen.lock().unwrap()),
            vec![
                SessionStatus::Sending,
                SessionStatus::Streaming,
                SessionStatus::Idle
            ]
        );

        let stored = manager.store().list_messages("c-prior").await.unwrap();
        assert_eq!(stored.len(), 4);
        assert_eq!(stored[3].content, "Sure.");
    }

    #[tokio::test]
    async fn send_while_streaming_is_busy() {
        let manager = Arc::new(manager(vec![Script::Hang(delta("thinking"))]));
        let first_fragment = Arc::new(Notify::new());
        let signal = first_fragment.clone();
        manager.subscribe(move |change| {
            if matches!(change, SessionChange::Fragment { .. }) {
                signal.notify_one();
            }
        });

        let background = manager.clone();
        let in_flight = tokio::spawn(async move { background.send("slow question").await });
        first_fragment.notified().await;

        assert_eq!(manager.snapshot().status, SessionStatus::Streaming);
        let err = manager.send("impatient follow-up").await.unwrap_err();
        assert!(matches!(err, SessionError::Busy));

        // The busy rejection touched nothing.
        let session = manager.snapshot();
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[0].content, "slow question");

        manager.cancel_active();
        let outcome = in_flight.await.unwrap();
        assert!(matches!(outcome, Err(SessionError::Cancelled)));
        assert_eq!(manager.snapshot().status, SessionStatus::Idle);
        assert!(manager.snapshot().messages.is_empty());
    }

    #[tokio::test]
    async fn empty_send_without_attachments_is_invalid() {
        let manager = manager(vec![]);
        let err = manager.send("").await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidArgument(_)));
        assert!(manager.snapshot().messages.is_empty());
        assert_eq!(manager.snapshot().status, SessionStatus::Idle);
    }

    #[tokio::test]
    async fn empty_send_with_attachment_goes_through() {
        let manager = manager(vec![Script::Body(full_body(&["nice photo"]))]);
        manager.stage_attachment("media://1234");

        manager.send("").await.unwrap();

        let session = manager.snapshot();
        assert_eq!(session.messages[0].content, "");
        assert_eq!(session.messages[0].attachment_refs, vec!["media://1234"]);
        assert!(session.pending_attachments.is_empty());

        let summaries = manager.store().list_summaries().await.unwrap();
        assert_eq!(summaries[0].attachment_refs, vec!["media://1234"]);
    }

    #[tokio::test]
    async fn refused_transport_leaves_user_turn_and_error_status() {
        let manager = manager(vec![Script::Refuse(TransportError::Connect(
            "connection refused".to_string(),
        ))]);
        let seen = record_changes(&manager);

        let err = manager.send("anyone there?").await.unwrap_err();
        assert!(matches!(err, SessionError::Transport(_)));

        let session = manager.snapshot();
        assert_eq!(session.status, SessionStatus::Error);
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].role, Role::User);
        // Nothing reached the store.
        assert!(manager.store().list_summaries().await.unwrap().is_empty());
        assert_eq!(
            statuses(&seen.lock().unwrap()),
            vec![SessionStatus::Sending, SessionStatus::Error]
        );
    }

    #[tokio::test]
    async fn interrupted_stream_keeps_partial_in_memory_only() {
        // Deltas but no DONE sentinel: the stream just ends.
        let manager = manager(vec![Script::Body(delta("partial ans"))]);

        let err = manager.send("tell me everything").await.unwrap_err();
        assert!(matches!(err, SessionError::StreamInterrupted(_)));

        let session = manager.snapshot();
        assert_eq!(session.status, SessionStatus::Error);
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[1].content, "partial ans");
        assert_eq!(session.persisted_len, 0);
        assert_eq!(manager.store().message_count(&session.messages[0].conversation_id), 0);
    }

    #[tokio::test]
    async fn failed_attempt_is_discarded_by_next_send() {
        let manager = manager(vec![
            Script::Refuse(TransportError::Connect("refused".to_string())),
            Script::Body(full_body(&["second try works"])),
        ]);
        let seen = record_changes(&manager);

        let _ = manager.send("first try").await.unwrap_err();
        assert_eq!(manager.snapshot().messages.len(), 1);

        manager.send("second try").await.unwrap();

        let session = manager.snapshot();
        // The failed user turn is gone; positions restart from zero.
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[0].content, "second try");
        assert_eq!(session.messages[0].id, "0");
        assert_eq!(session.messages[1].id, "1");

        let stored = manager
            .store()
            .list_messages(&session.active_conversation_id)
            .await
            .unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].content, "second try");

        // Error cleared to Idle at the start of the retry.
        let statuses = statuses(&seen.lock().unwrap());
        assert_eq!(
            statuses,
            vec![
                SessionStatus::Sending,
                SessionStatus::Error,
                SessionStatus::Idle,
                SessionStatus::Sending,
                SessionStatus::Streaming,
                SessionStatus::Idle
            ]
        );
    }

    #[tokio::test]
    async fn select_model_mid_stream_cancels_and_clears() {
        let manager = Arc::new(manager(vec![Script::Hang(delta("strea"))]));
        let first_fragment = Arc::new(Notify::new());
        let signal = first_fragment.clone();
        manager.subscribe(move |change| {
            if matches!(change, SessionChange::Fragment { .. }) {
                signal.notify_one();
            }
        });
        manager.stage_attachment("keep-me");

        let background = manager.clone();
        let in_flight = tokio::spawn(async move { background.send("question").await });
        first_fragment.notified().await;

        manager.select_model("anthropic/claude-3.5-sonnet");

        let outcome = in_flight.await.unwrap();
        assert!(matches!(outcome, Err(SessionError::Cancelled)));

        let session = manager.snapshot();
        assert!(session.messages.is_empty());
        assert!(session.active_conversation_id.is_empty());
        assert_eq!(session.selected_model, "anthropic/claude-3.5-sonnet");
        assert_eq!(session.status, SessionStatus::Idle);
        // Model switches keep staged attachments.
        assert_eq!(session.pending_attachments, vec!["keep-me"]);
    }

    #[tokio::test]
    async fn start_conversation_none_clears_transcript() {
        let manager = manager(vec![Script::Body(full_body(&["hello!"]))]);
        manager.send("hi").await.unwrap();
        assert_eq!(manager.snapshot().messages.len(), 2);

        manager.start_conversation(None).await.unwrap();

        let session = manager.snapshot();
        assert!(session.messages.is_empty());
        assert!(session.active_conversation_id.is_empty());
        assert_eq!(session.persisted_len, 0);
    }

    #[tokio::test]
    async fn delete_unknown_conversation_is_noop() {
        let manager = manager(vec![]);
        manager.delete_conversation("never-existed").await.unwrap();
        assert!(manager.store().list_summaries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_active_conversation_clears_session_and_store() {
        let manager = manager(vec![Script::Body(full_body(&["gone soon"]))]);
        manager.send("remember this").await.unwrap();
        let conversation_id = manager.snapshot().active_conversation_id;

        manager.delete_conversation(&conversation_id).await.unwrap();

        let session = manager.snapshot();
        assert!(session.messages.is_empty());
        assert!(session.active_conversation_id.is_empty());
        assert_eq!(manager.store().message_count(&conversation_id), 0);
        assert!(manager.store().list_summaries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn storage_failure_surfaces_but_keeps_exchange_visible() {
        let manager = manager(vec![Script::Body(full_body(&["done"]))]);
        manager.store().fail_writes.store(true, Ordering::SeqCst);

        let err = manager.send("save this").await.unwrap_err();
        assert!(matches!(err, SessionError::Storage(_)));

        let session = manager.snapshot();
        assert_eq!(session.status, SessionStatus::Error);
        // The completed exchange stays visible; the inconsistency is
        // surfaced, not masked.
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[1].content, "done");
        assert_eq!(session.persisted_len, 0);
    }

    #[tokio::test]
    async fn unsubscribed_observer_hears_nothing() {
        let manager = manager(vec![Script::Body(full_body(&["quiet"]))]);
        let count = Arc::new(Mutex::new(0));
        let sink = count.clone();
        let token = manager.subscribe(move |_| *sink.lock().unwrap() += 1);
        manager.unsubscribe(token);

        manager.send("hello").await.unwrap();
        assert_eq!(*count.lock().unwrap(), 0);
    }
}
