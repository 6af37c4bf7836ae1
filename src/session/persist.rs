use std::sync::Arc;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};

use crate::session::engine::Signal;
use crate::types::{ConversationHandle, MessageId, Role};

/// The conversation store this engine appends completed turns into.
///
/// The store is an external collaborator; nothing here assumes transactional
/// behavior beyond per-call success or failure.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ConversationStore: Send + Sync {
    async fn create_conversation(&self, title: Option<String>) -> anyhow::Result<ConversationHandle>;

    async fn append_message(
        &self,
        conversation: &ConversationHandle,
        role: Role,
        text: &str,
    ) -> anyhow::Result<MessageId>;
}

/// One completed turn, handed to the worker after the transcript buffer was
/// taken. By the time a job exists the engine has already moved on.
#[derive(Debug)]
pub(crate) struct PersistJob {
    pub(crate) user_text: String,
    pub(crate) assistant_text: String,
}

/// Appends completed turns to the external store without ever blocking the
/// engine. Jobs are processed strictly in order on a dedicated worker task;
/// a failed append is logged and skipped, never retried here; losing a
/// message must not wedge the conversation.
pub(crate) struct PersistenceBridge {
    jobs_tx: tokio::sync::mpsc::Sender<PersistJob>,
    worker: tokio::task::JoinHandle<()>,
}

impl PersistenceBridge {
    pub(crate) fn spawn(
        store: Arc<dyn ConversationStore>,
        conversation: Option<ConversationHandle>,
        signal_tx: tokio::sync::mpsc::Sender<Signal>,
    ) -> Self {
        let (jobs_tx, mut jobs_rx) = tokio::sync::mpsc::channel::<PersistJob>(32);

        let worker = tokio::spawn(async move {
            let mut handle = conversation;
            while let Some(job) = jobs_rx.recv().await {
                if handle.is_none() {
                    let title = conversation_title(&job.user_text);
                    match store.create_conversation(title).await {
                        Ok(created) => {
                            // Report the lazily created handle back through the
                            // signal queue so the callback fires on the engine task.
                            let _ = signal_tx
                                .send(Signal::ConversationCreated(created.clone()))
                                .await;
                            handle = Some(created);
                        }
                        Err(e) => {
                            tracing::warn!("failed to create conversation, dropping turn: {}", e);
                            continue;
                        }
                    }
                }
                let Some(conversation) = handle.as_ref() else {
                    continue;
                };

                if !job.user_text.is_empty() {
                    if let Err(e) = store
                        .append_message(conversation, Role::User, &job.user_text)
                        .await
                    {
                        tracing::warn!("failed to persist user message: {}", e);
                    }
                }
                if !job.assistant_text.is_empty() {
                    if let Err(e) = store
                        .append_message(conversation, Role::Assistant, &job.assistant_text)
                        .await
                    {
                        tracing::warn!("failed to persist assistant message: {}", e);
                    }
                }
            }
        });

        Self { jobs_tx, worker }
    }

    pub(crate) fn sender(&self) -> tokio::sync::mpsc::Sender<PersistJob> {
        self.jobs_tx.clone()
    }

    /// Stops accepting new jobs and drains the queued ones. Called during
    /// session teardown so turns completed right before a disconnect still
    /// reach the store.
    pub(crate) async fn finish(self) {
        drop(self.jobs_tx);
        if let Err(e) = self.worker.await {
            tracing::warn!("persistence worker ended abnormally: {}", e);
        }
    }
}

/// First words of the opening utterance become the conversation title.
fn conversation_title(user_text: &str) -> Option<String> {
    let trimmed = user_text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut chars = trimmed.chars();
    let mut title: String = chars.by_ref().take(48).collect();
    if chars.next().is_some() {
        title.push('…');
    }
    Some(title)
}

/// Message body written to the HTTP conversation store.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct PersistedMessage<'a> {
    role: Role,
    text: &'a str,
    created_at: DateTime<Utc>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateConversationResponse {
    conversation_id: String,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendMessageResponse {
    message_id: String,
}

/// HTTP client for the external conversation store.
pub struct HttpConversationStore {
    http: reqwest::Client,
    base_url: String,
    auth_token: SecretString,
}

impl HttpConversationStore {
    pub fn new(base_url: &str, auth_token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: SecretString::from(auth_token.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl ConversationStore for HttpConversationStore {
    async fn create_conversation(&self, title: Option<String>) -> anyhow::Result<ConversationHandle> {
        let url = format!("{}/v1/conversations", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(self.auth_token.expose_secret())
            .json(&serde_json::json!({ "title": title }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("conversation store returned {} on create", status);
        }
        let body = response.json::<CreateConversationResponse>().await?;
        Ok(ConversationHandle::new(body.conversation_id))
    }

    async fn append_message(
        &self,
        conversation: &ConversationHandle,
        role: Role,
        text: &str,
    ) -> anyhow::Result<MessageId> {
        let url = format!(
            "{}/v1/conversations/{}/messages",
            self.base_url, conversation
        );
        let message = PersistedMessage {
            role,
            text,
            created_at: Utc::now(),
        };
        let response = self
            .http
            .post(&url)
            .bearer_auth(self.auth_token.expose_secret())
            .json(&message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("conversation store returned {} on append", status);
        }
        let body = response.json::<AppendMessageResponse>().await?;
        Ok(MessageId::new(body.message_id))
    }
}
