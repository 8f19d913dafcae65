//! Conversation state and the chat session that drives it.
//!
//! A [`Conversation`] is the ordered message history plus the state of the
//! single exchange that may be in flight. [`ChatSession`] owns one, sends the
//! prompt through an [`InferenceBackend`], and resolves the placeholder slot it
//! created by id when the reply or failure arrives.

use crate::config::{ConfigError, ConfigStore, ConfigUpdate, Configuration};
use crate::host::Host;
use crate::llm::{InferenceBackend, InferenceError, ModelDirectoryClient, ModelListing};
use crate::render::RenderPipeline;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Content of the assistant placeholder while the reply is pending.
pub const PLACEHOLDER_TEXT: &str = "...";
/// Content of the assistant slot when the reply failed.
pub const FAILED_REPLY_TEXT: &str = "Sorry, there was an error processing your request.";
pub const INFERENCE_FAILED_NOTICE: &str =
    "Failed to fetch AI response. Please check your Ollama setup.";
pub const DIRECTORY_FAILED_NOTICE: &str =
    "Error fetching models from Ollama API. Please check the API URL and your Ollama server.";
pub const BUSY_NOTICE: &str = "Still waiting for the previous response; message not sent.";
/// Model sent when nothing has been selected yet.
pub const FALLBACK_MODEL: &str = "qwen2.5-coder:latest";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn label(self) -> &'static str {
        match self {
            Sender::User => "User",
            Sender::Assistant => "AI",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStatus {
    Final,
    Pending,
    Failed,
}

impl MessageStatus {
    /// Final and Failed never transition again.
    pub fn is_terminal(self) -> bool {
        !matches!(self, MessageStatus::Pending)
    }
}

/// Position of a message in its conversation. Stable: history is append-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(usize);

impl MessageId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub sender: Sender,
    pub content: String,
    pub status: MessageStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExchangeState {
    #[default]
    Idle,
    /// Waiting on the backend; carries the placeholder slot.
    Sending(MessageId),
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("message is empty")]
    Empty,
    #[error("a reply is still pending")]
    Busy,
    #[error(transparent)]
    Configuration(#[from] ConfigError),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("message {0} is not the pending reply")]
pub struct NotPending(pub MessageId);

/// Slots created by [`Conversation::begin_exchange`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub user: MessageId,
    pub reply: MessageId,
    /// Trimmed user text, as sent to the backend.
    pub prompt: String,
}

/// Ordered message history with at most one pending assistant reply.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    state: ExchangeState,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    /// Append the user message and a pending placeholder, and enter Sending.
    /// Blank text and a send while Sending leave the conversation untouched.
    pub fn begin_exchange(&mut self, text: &str) -> Result<Exchange, SubmitError> {
        let prompt = text.trim();
        if prompt.is_empty() {
            return Err(SubmitError::Empty);
        }
        if let ExchangeState::Sending(_) = self.state {
            return Err(SubmitError::Busy);
        }
        let user = self.push(Sender::User, prompt, MessageStatus::Final);
        let reply = self.push(Sender::Assistant, PLACEHOLDER_TEXT, MessageStatus::Pending);
        self.state = ExchangeState::Sending(reply);
        Ok(Exchange {
            user,
            reply,
            prompt: prompt.to_string(),
        })
    }

    /// Pending → Final with the reply text.
    pub fn complete(&mut self, id: MessageId, content: impl Into<String>) -> Result<&Message, NotPending> {
        self.resolve(id, content.into(), MessageStatus::Final)
    }

    /// Pending → Failed with the fixed user-facing error text.
    pub fn fail(&mut self, id: MessageId) -> Result<&Message, NotPending> {
        self.resolve(id, FAILED_REPLY_TEXT.to_string(), MessageStatus::Failed)
    }

    fn resolve(
        &mut self,
        id: MessageId,
        content: String,
        status: MessageStatus,
    ) -> Result<&Message, NotPending> {
        if self.state != ExchangeState::Sending(id) {
            return Err(NotPending(id));
        }
        let message = self
            .messages
            .get_mut(id.0)
            .filter(|m| m.status == MessageStatus::Pending)
            .ok_or(NotPending(id))?;
        message.content = content;
        message.status = status;
        self.state = ExchangeState::Idle;
        Ok(&*message)
    }

    fn push(&mut self, sender: Sender, content: &str, status: MessageStatus) -> MessageId {
        self.messages.push(Message {
            sender,
            content: content.to_string(),
            status,
        });
        MessageId(self.messages.len() - 1)
    }
}

/// Slots and outcome of an accepted submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submitted {
    pub user: MessageId,
    pub reply: MessageId,
    /// Final or Failed.
    pub status: MessageStatus,
}

/// One chat conversation bound to a configuration, a backend, and a host.
pub struct ChatSession {
    id: String,
    config: Arc<ConfigStore>,
    directory: ModelDirectoryClient,
    backend: Arc<dyn InferenceBackend>,
    host: Arc<dyn Host>,
    render: RenderPipeline,
    conversation: Mutex<Conversation>,
}

impl ChatSession {
    pub fn new(
        config: Arc<ConfigStore>,
        backend: Arc<dyn InferenceBackend>,
        host: Arc<dyn Host>,
    ) -> Self {
        let id = format!("sess-{}", uuid::Uuid::new_v4());
        log::info!("session {} opened", id);
        Self {
            id,
            config,
            directory: ModelDirectoryClient::new(),
            backend,
            render: RenderPipeline::new(host.clone()),
            host,
            conversation: Mutex::new(Conversation::new()),
        }
    }

    pub fn with_directory(mut self, directory: ModelDirectoryClient) -> Self {
        self.directory = directory;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &Arc<ConfigStore> {
        &self.config
    }

    /// Snapshot of the history.
    pub fn messages(&self) -> Vec<Message> {
        self.conversation().messages().to_vec()
    }

    pub fn message(&self, id: MessageId) -> Option<Message> {
        self.conversation().get(id).cloned()
    }

    pub fn state(&self) -> ExchangeState {
        self.conversation().state()
    }

    pub fn is_sending(&self) -> bool {
        matches!(self.state(), ExchangeState::Sending(_))
    }

    fn conversation(&self) -> MutexGuard<'_, Conversation> {
        self.conversation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Send `text` and wait for the reply. The returned ids name the user slot
    /// and the reply slot, which is already Final or Failed.
    ///
    /// Blank text is a no-op. While another submit is Sending the call is
    /// rejected with [`SubmitError::Busy`] and a busy notice. Backend failures
    /// and timeouts are not errors here: they resolve the reply slot to
    /// Failed and raise a notice. Dropping the future before it completes
    /// also resolves the slot to Failed.
    pub async fn submit(&self, text: &str) -> Result<Submitted, SubmitError> {
        if text.trim().is_empty() {
            return Err(SubmitError::Empty);
        }
        let config = self.config.get();
        let backend_url = match config.validated_backend_url() {
            Ok(url) => url.to_string(),
            Err(e) => {
                log::warn!("session {}: not sending: {}", self.id, e);
                self.host.notify(&e.to_string());
                return Err(e.into());
            }
        };

        let begun = self.conversation().begin_exchange(text);
        let exchange = match begun {
            Ok(exchange) => exchange,
            Err(SubmitError::Busy) => {
                log::debug!("session {}: submit rejected, reply pending", self.id);
                self.host.notify(BUSY_NOTICE);
                return Err(SubmitError::Busy);
            }
            Err(e) => return Err(e),
        };
        self.render_slot(exchange.user);
        self.render_slot(exchange.reply);

        let mut guard = PendingGuard {
            session: self,
            reply: exchange.reply,
            armed: true,
        };
        let model = model_for_request(&config);
        let timeout = config.request_timeout();
        log::info!(
            "session {}: sending prompt to {} (model {})",
            self.id,
            backend_url,
            model
        );
        let request = self
            .backend
            .send_prompt(&backend_url, &model, &exchange.prompt, config.max_tokens);
        let result = match tokio::time::timeout(timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(InferenceError::Timeout(timeout)),
        };
        guard.armed = false;

        let status = self.finish(exchange.reply, result);
        Ok(Submitted {
            user: exchange.user,
            reply: exchange.reply,
            status,
        })
    }

    /// Resolve the reply slot, re-render it, and notify on failure.
    fn finish(&self, reply: MessageId, result: Result<String, InferenceError>) -> MessageStatus {
        let cancelled = matches!(result, Err(InferenceError::Cancelled));
        let resolved = {
            let mut conversation = self.conversation();
            match result {
                Ok(text) => conversation.complete(reply, text).cloned(),
                Err(e) => {
                    log::warn!("session {}: inference failed: {}", self.id, e.reason());
                    conversation.fail(reply).cloned()
                }
            }
        };
        match resolved {
            Ok(message) => {
                self.render.message_changed(reply, &message);
                if message.status == MessageStatus::Failed && !cancelled {
                    self.host.notify(INFERENCE_FAILED_NOTICE);
                }
                message.status
            }
            Err(e) => {
                log::error!("session {}: {}", self.id, e);
                MessageStatus::Failed
            }
        }
    }

    fn render_slot(&self, id: MessageId) {
        let message = self.message(id);
        if let Some(message) = message {
            self.render.message_changed(id, &message);
        }
    }

    /// Re-render the whole history (e.g. after the host rebuilt its surface).
    pub fn render_history(&self) {
        let messages = self.messages();
        self.render.render_all(&messages);
    }

    /// Fetch the backend's models and keep the selected model inside the new
    /// set. A failed listing raises one notice, yields an empty set, and
    /// leaves the stored selection alone.
    pub async fn refresh_models(&self) -> ModelListing {
        let url = self.config.get().backend_url;
        let listing = self.directory.list_models(&url).await;
        if let Some(e) = &listing.error {
            log::warn!("session {}: model listing failed: {}", self.id, e);
            self.config.clear_model_set();
            self.host.notify(DIRECTORY_FAILED_NOTICE);
            return listing;
        }
        match self.config.apply_model_set(&listing.models) {
            Ok(config) if !config.selected_model.is_empty() => {
                log::info!("session {}: using model {}", self.id, config.selected_model);
            }
            Ok(_) => log::info!("session {}: no models available", self.id),
            Err(e) => {
                log::error!("session {}: {}", self.id, e);
                self.host.notify(&e.to_string());
            }
        }
        listing
    }

    /// Select a model from the last listing and persist it.
    pub fn select_model(&self, model: &str) -> Result<Configuration, ConfigError> {
        let config = self.config.set(ConfigUpdate::selected_model(model))?;
        self.host
            .notify(&format!("Model changed to {}", config.selected_model));
        Ok(config)
    }

    /// Change and persist the backend URL (normalized).
    pub fn set_backend_url(&self, url: &str) -> Result<Configuration, ConfigError> {
        let config = self.config.set(ConfigUpdate::backend_url(url))?;
        self.host.notify("API URL updated");
        Ok(config)
    }
}

fn model_for_request(config: &Configuration) -> String {
    if config.selected_model.is_empty() {
        log::warn!("no model selected, using fallback {}", FALLBACK_MODEL);
        FALLBACK_MODEL.to_string()
    } else {
        config.selected_model.clone()
    }
}

/// Resolves the placeholder to Failed if the submit future is dropped first.
struct PendingGuard<'a> {
    session: &'a ChatSession,
    reply: MessageId,
    armed: bool,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.session
                .finish(self.reply, Err(InferenceError::Cancelled));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryPersistence;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct RecordingHost {
        notices: Mutex<Vec<String>>,
        renders: Mutex<Vec<(MessageId, String)>>,
    }

    impl RecordingHost {
        fn notices(&self) -> Vec<String> {
            self.notices.lock().unwrap().clone()
        }

        fn last_render(&self, slot: MessageId) -> Option<String> {
            self.renders
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find(|(id, _)| *id == slot)
                .map(|(_, text)| text.clone())
        }
    }

    impl Host for RecordingHost {
        fn notify(&self, message: &str) {
            self.notices.lock().unwrap().push(message.to_string());
        }

        fn render(&self, slot: MessageId, markdown: &str) {
            self.renders.lock().unwrap().push((slot, markdown.to_string()));
        }
    }

    enum Reply {
        Text(&'static str),
        Fail,
        Hang,
        Gated(Arc<Notify>, &'static str),
    }

    struct FakeBackend {
        reply: Reply,
        calls: Mutex<Vec<(String, String, String, u32)>>,
    }

    impl FakeBackend {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl InferenceBackend for FakeBackend {
        async fn send_prompt(
            &self,
            backend_url: &str,
            model: &str,
            prompt: &str,
            max_tokens: u32,
        ) -> Result<String, InferenceError> {
            self.calls.lock().unwrap().push((
                backend_url.to_string(),
                model.to_string(),
                prompt.to_string(),
                max_tokens,
            ));
            match &self.reply {
                Reply::Text(t) => Ok(t.to_string()),
                Reply::Fail => Err(InferenceError::Api("500 Internal Server Error".to_string())),
                Reply::Hang => std::future::pending().await,
                Reply::Gated(gate, t) => {
                    gate.notified().await;
                    Ok(t.to_string())
                }
            }
        }
    }

    fn session_with(
        backend: Arc<FakeBackend>,
        config: Configuration,
    ) -> (ChatSession, Arc<RecordingHost>) {
        let host = Arc::new(RecordingHost::default());
        let store = Arc::new(ConfigStore::new(config, MemoryPersistence::default()));
        (ChatSession::new(store, backend, host.clone()), host)
    }

    #[test]
    fn begin_exchange_appends_user_and_placeholder() {
        let mut c = Conversation::new();
        let ex = c.begin_exchange("  Hello ").unwrap();
        assert_eq!(ex.prompt, "Hello");
        assert_eq!(c.len(), 2);
        assert_eq!(c.get(ex.user).unwrap().content, "Hello");
        assert_eq!(c.get(ex.user).unwrap().status, MessageStatus::Final);
        let placeholder = c.get(ex.reply).unwrap();
        assert_eq!(placeholder.sender, Sender::Assistant);
        assert_eq!(placeholder.status, MessageStatus::Pending);
        assert_eq!(c.state(), ExchangeState::Sending(ex.reply));
    }

    #[test]
    fn blank_text_does_not_mutate() {
        let mut c = Conversation::new();
        assert!(matches!(c.begin_exchange(" \t\n"), Err(SubmitError::Empty)));
        assert!(c.is_empty());
        assert_eq!(c.state(), ExchangeState::Idle);
    }

    #[test]
    fn second_exchange_while_sending_is_busy() {
        let mut c = Conversation::new();
        c.begin_exchange("one").unwrap();
        assert!(matches!(c.begin_exchange("two"), Err(SubmitError::Busy)));
        assert_eq!(c.len(), 2);
        let pending = c
            .messages()
            .iter()
            .filter(|m| m.status == MessageStatus::Pending)
            .count();
        assert_eq!(pending, 1);
    }

    #[test]
    fn resolution_is_terminal() {
        let mut c = Conversation::new();
        let ex = c.begin_exchange("hi").unwrap();
        c.complete(ex.reply, "hello").unwrap();
        assert_eq!(c.state(), ExchangeState::Idle);
        assert_eq!(c.fail(ex.reply), Err(NotPending(ex.reply)));
        assert_eq!(c.complete(ex.reply, "again"), Err(NotPending(ex.reply)));
        assert_eq!(c.get(ex.reply).unwrap().content, "hello");
        // The user slot was never pending.
        assert_eq!(c.complete(ex.user, "x"), Err(NotPending(ex.user)));
    }

    #[test]
    fn failed_reply_uses_fixed_text() {
        let mut c = Conversation::new();
        let ex = c.begin_exchange("hi").unwrap();
        let m = c.fail(ex.reply).unwrap();
        assert_eq!(m.content, FAILED_REPLY_TEXT);
        assert_eq!(m.status, MessageStatus::Failed);
    }

    #[test]
    fn sequential_exchanges_alternate() {
        let mut c = Conversation::new();
        for (i, text) in ["a", "b", "c"].iter().enumerate() {
            let ex = c.begin_exchange(text).unwrap();
            if i % 2 == 0 {
                c.complete(ex.reply, "ok").unwrap();
            } else {
                c.fail(ex.reply).unwrap();
            }
        }
        assert_eq!(c.len(), 6);
        for (i, m) in c.messages().iter().enumerate() {
            let expected = if i % 2 == 0 { Sender::User } else { Sender::Assistant };
            assert_eq!(m.sender, expected);
            assert!(m.status.is_terminal());
        }
    }

    #[tokio::test]
    async fn submit_success_resolves_placeholder_in_place() {
        let backend = FakeBackend::new(Reply::Text("Hi there"));
        let (session, host) = session_with(backend.clone(), Configuration::default());

        let out = session.submit("Hello").await.unwrap();
        assert_eq!(out.status, MessageStatus::Final);
        assert_eq!(
            session.messages(),
            vec![
                Message {
                    sender: Sender::User,
                    content: "Hello".to_string(),
                    status: MessageStatus::Final,
                },
                Message {
                    sender: Sender::Assistant,
                    content: "Hi there".to_string(),
                    status: MessageStatus::Final,
                },
            ]
        );
        assert_eq!(session.state(), ExchangeState::Idle);
        assert!(host.notices().is_empty());
        assert_eq!(host.last_render(out.user).as_deref(), Some("User: Hello"));
        assert_eq!(host.last_render(out.reply).as_deref(), Some("AI: Hi there"));

        let calls = backend.calls.lock().unwrap();
        assert_eq!(
            calls[0],
            (
                "http://localhost:11434".to_string(),
                FALLBACK_MODEL.to_string(),
                "Hello".to_string(),
                150
            )
        );
    }

    #[tokio::test]
    async fn submit_failure_marks_failed_and_notifies() {
        let (session, host) = session_with(FakeBackend::new(Reply::Fail), Configuration::default());
        let out = session.submit("Hello").await.unwrap();
        assert_eq!(out.status, MessageStatus::Failed);
        let reply = session.message(out.reply).unwrap();
        assert_eq!(reply.content, FAILED_REPLY_TEXT);
        assert_eq!(reply.status, MessageStatus::Failed);
        assert_eq!(host.notices(), vec![INFERENCE_FAILED_NOTICE.to_string()]);
        assert!(!session.is_sending());
    }

    #[tokio::test]
    async fn submit_uses_selected_model_and_max_tokens() {
        let backend = FakeBackend::new(Reply::Text("ok"));
        let mut config = Configuration::default();
        config.selected_model = "llama3.2:latest".to_string();
        config.max_tokens = 512;
        let (session, _host) = session_with(backend.clone(), config);
        session.submit("hi").await.unwrap();
        let calls = backend.calls.lock().unwrap();
        assert_eq!(calls[0].1, "llama3.2:latest");
        assert_eq!(calls[0].3, 512);
    }

    #[tokio::test]
    async fn blank_submit_is_a_silent_no_op() {
        let backend = FakeBackend::new(Reply::Text("ok"));
        let (session, host) = session_with(backend.clone(), Configuration::default());
        assert!(matches!(session.submit("   ").await, Err(SubmitError::Empty)));
        assert!(session.messages().is_empty());
        assert!(host.notices().is_empty());
        assert!(backend.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_backend_url_is_surfaced_before_any_mutation() {
        let mut config = Configuration::default();
        config.backend_url = "localhost:11434".to_string();
        let (session, host) = session_with(FakeBackend::new(Reply::Text("ok")), config);
        let err = session.submit("Hello").await.unwrap_err();
        assert!(matches!(err, SubmitError::Configuration(ConfigError::InvalidUrl { .. })));
        assert!(session.messages().is_empty());
        assert_eq!(host.notices().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_submit_is_rejected_as_busy() {
        let gate = Arc::new(Notify::new());
        let backend = FakeBackend::new(Reply::Gated(gate.clone(), "first"));
        let (session, host) = session_with(backend.clone(), Configuration::default());

        let first = session.submit("one");
        let second = async {
            tokio::task::yield_now().await;
            let res = session.submit("two").await;
            assert_eq!(session.messages().len(), 2);
            gate.notify_one();
            res
        };
        let (first, second) = tokio::join!(first, second);

        assert_eq!(first.unwrap().status, MessageStatus::Final);
        assert!(matches!(second, Err(SubmitError::Busy)));
        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "first");
        assert_eq!(host.notices(), vec![BUSY_NOTICE.to_string()]);
        assert_eq!(backend.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_request_times_out_to_failed() {
        let mut config = Configuration::default();
        config.request_timeout_secs = 5;
        let (session, host) = session_with(FakeBackend::new(Reply::Hang), config);

        let out = session.submit("Hello").await.unwrap();
        assert_eq!(out.status, MessageStatus::Failed);
        assert_eq!(session.state(), ExchangeState::Idle);
        assert_eq!(host.notices(), vec![INFERENCE_FAILED_NOTICE.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_submit_does_not_leave_a_pending_slot() {
        let (session, host) = session_with(FakeBackend::new(Reply::Hang), Configuration::default());

        let res = tokio::time::timeout(Duration::from_secs(1), session.submit("Hello")).await;
        assert!(res.is_err());
        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].status, MessageStatus::Failed);
        assert_eq!(session.state(), ExchangeState::Idle);
        assert!(host.notices().is_empty());
        assert_eq!(
            host.last_render(MessageId::new(1)).as_deref(),
            Some(format!("AI: {}", FAILED_REPLY_TEXT).as_str())
        );
    }

    #[tokio::test]
    async fn select_model_notifies_and_persists() {
        let (session, host) = session_with(FakeBackend::new(Reply::Text("ok")), Configuration::default());
        let c = session.select_model("mistral").unwrap();
        assert_eq!(c.selected_model, "mistral");
        assert_eq!(host.notices(), vec!["Model changed to mistral".to_string()]);

        let c = session.set_backend_url("http://127.0.0.1:9999/").unwrap();
        assert_eq!(c.backend_url, "http://127.0.0.1:9999");
        assert_eq!(host.notices().last().map(String::as_str), Some("API URL updated"));
    }

    #[tokio::test]
    async fn render_history_rerenders_every_slot() {
        let (session, host) = session_with(FakeBackend::new(Reply::Text("yo")), Configuration::default());
        session.submit("hey").await.unwrap();
        let before = host.renders.lock().unwrap().len();
        session.render_history();
        let renders = host.renders.lock().unwrap();
        assert_eq!(renders.len(), before + 2);
        assert_eq!(renders[renders.len() - 1].1, "AI: yo");
    }
}
