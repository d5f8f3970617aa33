//! Chat sessions.
//!
//! `ChatService` owns every live conversation and drives its controller: it
//! opens a turn, runs the AI work in a spawned task, and folds the result back.
//! Because the task owns the write-back, a caller that disconnects mid-turn
//! cannot leave the session stuck in flight.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::assistant::Assistant;
use crate::models::{Application, Message, Source};
use crate::tracker::Tracker;

pub mod controller;
pub mod handlers;
pub mod saves;

use controller::{ChatController, ChatMode, TurnOutcome, TurnPlan};
use saves::{SaveButton, SaveTracker};

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("Still working on the previous message")]
    Busy,

    #[error("Chat {0} not found")]
    NotFound(Uuid),

    #[error("{0}")]
    SaveNotAllowed(String),

    #[error("Chat turn did not complete: {0}")]
    TurnAborted(String),
}

struct Session {
    controller: ChatController,
    saves: SaveTracker,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSnapshot {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub mode: ChatMode,
    pub busy: bool,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub message: Message,
    pub mode: ChatMode,
    /// Set when the turn imported a job.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application: Option<Application>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceEntry {
    #[serde(flatten)]
    pub source: Source,
    pub button: SaveButton,
}

#[derive(Clone)]
pub struct ChatService {
    sessions: Arc<Mutex<HashMap<Uuid, Session>>>,
    tracker: Arc<Tracker>,
    assistant: Assistant,
}

impl ChatService {
    pub fn new(tracker: Arc<Tracker>, assistant: Assistant) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            tracker,
            assistant,
        }
    }

    pub async fn create(&self) -> ChatSnapshot {
        let id = Uuid::new_v4();
        let session = Session {
            controller: ChatController::default(),
            saves: SaveTracker::default(),
            created_at: Utc::now(),
        };
        let snapshot = snapshot_of(id, &session, "");
        self.sessions.lock().await.insert(id, session);
        info!("Started chat {id}");
        snapshot
    }

    /// History filtered by `query`; a blank query returns everything.
    pub async fn snapshot(&self, id: Uuid, query: &str) -> Result<ChatSnapshot, ChatError> {
        let sessions = self.sessions.lock().await;
        let session = sessions.get(&id).ok_or(ChatError::NotFound(id))?;
        Ok(snapshot_of(id, session, query))
    }

    /// Handles one user message and returns the model's answer.
    pub async fn send(&self, id: Uuid, text: &str) -> Result<ChatReply, ChatError> {
        let plan = {
            let mut sessions = self.sessions.lock().await;
            let session = sessions.get_mut(&id).ok_or(ChatError::NotFound(id))?;
            let plan = session.controller.begin_turn(text)?;
            if plan == TurnPlan::Reply {
                return Ok(reply_of(&session.controller, None));
            }
            plan
        };
        debug!("Chat {id}: {plan:?}");

        let service = self.clone();
        let task = tokio::spawn(async move {
            let outcome = service.run_plan(plan).await;
            let application = match &outcome {
                TurnOutcome::Imported(app) => Some(app.clone()),
                _ => None,
            };
            let mut sessions = service.sessions.lock().await;
            let session = sessions.get_mut(&id)?;
            session.controller.complete_turn(outcome);
            Some(reply_of(&session.controller, application))
        });

        match task.await {
            Ok(Some(reply)) => Ok(reply),
            Ok(None) => Err(ChatError::NotFound(id)),
            Err(e) => {
                warn!("Chat {id} turn task failed: {e}");
                if let Some(session) = self.sessions.lock().await.get_mut(&id) {
                    session.controller.abandon_turn();
                }
                Err(ChatError::TurnAborted(e.to_string()))
            }
        }
    }

    /// Cited sources with their save-button state.
    pub async fn sources(&self, id: Uuid) -> Result<Vec<SourceEntry>, ChatError> {
        let cited = {
            let sessions = self.sessions.lock().await;
            let session = sessions.get(&id).ok_or(ChatError::NotFound(id))?;
            session.controller.cited_sources()
        };
        let mut saved = Vec::with_capacity(cited.len());
        for source in &cited {
            saved.push(self.tracker.contains_url(&source.uri).await);
        }

        let sessions = self.sessions.lock().await;
        let session = sessions.get(&id).ok_or(ChatError::NotFound(id))?;
        Ok(cited
            .into_iter()
            .zip(saved)
            .map(|(source, already_saved)| {
                let button = session.saves.button(&source.uri, already_saved);
                SourceEntry { source, button }
            })
            .collect())
    }

    /// Imports the posting behind a cited source as a new application. The
    /// application keeps the source URI as its url so the source reads as
    /// already saved from then on.
    pub async fn save_source(&self, id: Uuid, uri: &str) -> Result<SourceEntry, ChatError> {
        let source = {
            let sessions = self.sessions.lock().await;
            let session = sessions.get(&id).ok_or(ChatError::NotFound(id))?;
            session.controller.cited_source(uri).ok_or_else(|| {
                ChatError::SaveNotAllowed(format!("{uri} was not cited in this chat"))
            })?
        };
        let already_saved = self.tracker.contains_url(uri).await;
        {
            let mut sessions = self.sessions.lock().await;
            let session = sessions.get_mut(&id).ok_or(ChatError::NotFound(id))?;
            session.saves.begin(uri, already_saved)?;
        }

        let service = self.clone();
        let task_uri = source.uri.clone();
        let task = tokio::spawn(async move {
            let result = service.import_source(&task_uri).await;
            let mut sessions = service.sessions.lock().await;
            if let Some(session) = sessions.get_mut(&id) {
                session.saves.finish(&task_uri, result);
            }
        });
        if let Err(e) = task.await {
            warn!("Chat {id} save task failed: {e}");
        }

        let already_saved = self.tracker.contains_url(&source.uri).await;
        let sessions = self.sessions.lock().await;
        let session = sessions.get(&id).ok_or(ChatError::NotFound(id))?;
        let button = session.saves.button(&source.uri, already_saved);
        Ok(SourceEntry { source, button })
    }

    async fn run_plan(&self, plan: TurnPlan) -> TurnOutcome {
        match plan {
            TurnPlan::ImportJob { url } => match self.assistant.extract_job_details(&url).await {
                Ok(job) => match self.tracker.add(job.into_draft(&url)).await {
                    Ok(app) => TurnOutcome::Imported(app),
                    Err(e) => {
                        warn!("Imported job could not be stored: {e}");
                        TurnOutcome::Failed(
                            "I found the job but could not save it. Please try again.".to_string(),
                        )
                    }
                },
                Err(e) => TurnOutcome::Failed(e.to_string()),
            },
            TurnPlan::AnalyzeFit { description } => {
                let resume = self.tracker.resume().await;
                match self.assistant.analyze_fit(&description, &resume).await {
                    Ok(analysis) => TurnOutcome::Analyzed(analysis),
                    Err(e) => TurnOutcome::Failed(e.to_string()),
                }
            }
            TurnPlan::Ask { text } => {
                let preferences = self.tracker.preferences().await;
                match self
                    .assistant
                    .send_message_to_bot(&text, Some(&preferences))
                    .await
                {
                    Ok(reply) => TurnOutcome::Answered(reply),
                    Err(e) => TurnOutcome::Failed(e.to_string()),
                }
            }
            TurnPlan::Reply => TurnOutcome::Failed("Nothing to do for this message.".to_string()),
        }
    }

    async fn import_source(&self, uri: &str) -> Result<(), String> {
        let job = self
            .assistant
            .extract_job_details(uri)
            .await
            .map_err(|e| e.to_string())?;
        let mut draft = job.into_draft(uri);
        draft.url = uri.to_string();
        self.tracker.add(draft).await.map_err(|e| {
            warn!("Saved source could not be stored: {e}");
            "Could not save the application. Please try again.".to_string()
        })?;
        Ok(())
    }
}

fn snapshot_of(id: Uuid, session: &Session, query: &str) -> ChatSnapshot {
    ChatSnapshot {
        id,
        created_at: session.created_at,
        mode: session.controller.mode(),
        busy: session.controller.is_busy(),
        messages: session.controller.search(query),
    }
}

fn reply_of(controller: &ChatController, application: Option<Application>) -> ChatReply {
    let message = controller
        .messages()
        .last()
        .cloned()
        .unwrap_or_else(|| Message::model(controller::GREETING));
    ChatReply {
        message,
        mode: controller.mode(),
        application,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::assistant::testing::ScriptedModel;
    use crate::llm_client::{LlmError, ModelResponse};
    use crate::models::JobDraft;
    use crate::store::memory::ReadOnlyStore;
    use crate::store::{DocumentStore, Documents, MemoryStore, StoreError};

    /// Writes take `delay` to land.
    struct SlowStore {
        inner: MemoryStore,
        delay: Duration,
    }

    #[async_trait::async_trait]
    impl DocumentStore for SlowStore {
        async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            tokio::time::sleep(self.delay).await;
            self.inner.set(key, value).await
        }
    }

    async fn service() -> (ChatService, Arc<ScriptedModel>, Arc<Tracker>) {
        service_with(Arc::new(MemoryStore::default())).await
    }

    async fn service_with(
        store: Arc<dyn DocumentStore>,
    ) -> (ChatService, Arc<ScriptedModel>, Arc<Tracker>) {
        let tracker = Arc::new(Tracker::load(Documents::new(store)).await.unwrap());
        let model = ScriptedModel::new();
        let chats = ChatService::new(tracker.clone(), Assistant::new(model.clone()));
        (chats, model, tracker)
    }

    const JOB_JSON: &str = r#"{"title": "Platform Engineer", "company": "Acme", "location": "Remote", "description": "Kubernetes.", "url": ""}"#;

    #[tokio::test]
    async fn test_url_import_adds_one_application() {
        let (chats, model, tracker) = service().await;
        model.push_text(JOB_JSON);
        let chat = chats.create().await;

        let reply = chats.send(chat.id, "https://example.com/job/123").await.unwrap();
        let app = reply.application.unwrap();
        assert_eq!(app.job.url, "https://example.com/job/123");
        assert_eq!(tracker.applications().await.len(), 5);
        assert_eq!(tracker.applications().await[0], app);
        assert_eq!(reply.mode, ChatMode::Idle);
    }

    #[tokio::test]
    async fn test_url_import_failure_adds_nothing() {
        let (chats, model, tracker) = service().await;
        model.push_error(LlmError::Api {
            status: 500,
            message: "down".to_string(),
        });
        let chat = chats.create().await;

        let reply = chats.send(chat.id, "https://example.com/job/123").await.unwrap();
        assert!(reply.application.is_none());
        assert!(reply.message.text.starts_with("Failed to extract job details"));
        assert_eq!(tracker.applications().await.len(), 4);

        let snapshot = chats.snapshot(chat.id, "").await.unwrap();
        assert_eq!(snapshot.messages.len(), 3);
        assert!(!snapshot.busy);
    }

    #[tokio::test]
    async fn test_url_import_that_cannot_be_stored_adds_nothing() {
        let (chats, model, tracker) = service_with(Arc::new(ReadOnlyStore::default())).await;
        model.push_text(JOB_JSON);
        let id = chats.create().await.id;

        let reply = chats.send(id, "https://example.com/job/123").await.unwrap();
        assert!(reply.application.is_none());
        assert!(reply.message.text.starts_with("I found the job but could not save it"));
        assert_eq!(tracker.applications().await.len(), 4);
        assert!(!tracker.contains_url("https://example.com/job/123").await);
    }

    #[tokio::test]
    async fn test_analyze_intent_then_description() {
        let (chats, model, tracker) = service().await;
        let chat = chats.create().await;

        let reply = chats
            .send(chat.id, "can you analyze this job for me")
            .await
            .unwrap();
        assert_eq!(reply.mode, ChatMode::AwaitingJobDescription);
        assert_eq!(model.calls(), 0);

        model.push_text(r#"{"fitScore": 64, "summary": "Decent.", "pros": ["SQL"], "cons": ["Go"]}"#);
        let reply = chats.send(chat.id, "Senior Go engineer wanted.").await.unwrap();
        assert!(reply.message.text.starts_with("Fit Score: 64/100"));
        assert_eq!(reply.mode, ChatMode::Idle);

        let prompt = model.last_request().unwrap().prompt_text();
        assert!(prompt.contains("Senior Go engineer wanted."));
        assert!(prompt.contains(tracker.resume().await.trim()));
    }

    #[tokio::test]
    async fn test_analysis_failure_returns_to_idle() {
        let (chats, model, _) = service().await;
        let chat = chats.create().await;
        chats.send(chat.id, "analyze my fit").await.unwrap();

        model.push_text("not json");
        let reply = chats.send(chat.id, "Some job").await.unwrap();
        assert_eq!(reply.mode, ChatMode::Idle);
        assert_eq!(reply.message.text, "Failed to parse the AI response. Please try again.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_send_while_busy_is_rejected() {
        let (chats, model, _) = service().await;
        model.set_delay(Duration::from_millis(200));
        model.push_text("Answer");
        let id = chats.create().await.id;

        let first = {
            let chats = chats.clone();
            tokio::spawn(async move { chats.send(id, "first").await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(matches!(chats.send(id, "second").await, Err(ChatError::Busy)));
        assert!(chats.snapshot(id, "").await.unwrap().busy);
        assert_eq!(first.await.unwrap().unwrap().message.text, "Answer");
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_request_still_completes_turn() {
        let (chats, model, _) = service().await;
        model.set_delay(Duration::from_millis(200));
        model.push_text("Late answer");
        let id = chats.create().await.id;

        let request = {
            let chats = chats.clone();
            tokio::spawn(async move { chats.send(id, "hello").await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        request.abort();
        tokio::time::sleep(Duration::from_millis(500)).await;

        let snapshot = chats.snapshot(id, "").await.unwrap();
        assert!(!snapshot.busy);
        assert_eq!(snapshot.messages.last().unwrap().text, "Late answer");
    }

    #[tokio::test]
    async fn test_crashed_turn_releases_session() {
        let (chats, model, _) = service().await;
        let id = chats.create().await.id;

        model.panic_next();
        assert!(matches!(
            chats.send(id, "hello").await,
            Err(ChatError::TurnAborted(_))
        ));
        let snapshot = chats.snapshot(id, "").await.unwrap();
        assert!(!snapshot.busy);
        assert_eq!(snapshot.mode, ChatMode::Idle);

        model.push_text("Back again");
        let reply = chats.send(id, "hello again").await.unwrap();
        assert_eq!(reply.message.text, "Back again");
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_stays_readable_while_tracker_writes() {
        let store = Arc::new(SlowStore {
            inner: MemoryStore::default(),
            delay: Duration::from_millis(200),
        });
        let (chats, model, tracker) = service_with(store).await;
        let uri = "https://jobs.example.com/platform";
        model.push(ModelResponse {
            text: "One opening.".to_string(),
            sources: vec![Source {
                uri: uri.to_string(),
                title: "Platform".to_string(),
            }],
        });
        let id = chats.create().await.id;
        chats.send(id, "find platform jobs").await.unwrap();

        let write = {
            let tracker = tracker.clone();
            tokio::spawn(async move {
                tracker
                    .add(JobDraft {
                        title: "SRE".to_string(),
                        company: "Acme".to_string(),
                        ..Default::default()
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let listing = {
            let chats = chats.clone();
            tokio::spawn(async move { chats.sources(id).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let snapshot = tokio::time::timeout(Duration::from_millis(50), chats.snapshot(id, "")).await;
        assert!(snapshot.is_ok());

        write.await.unwrap().unwrap();
        let entries = listing.await.unwrap().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].button, SaveButton::Idle);
    }

    #[tokio::test]
    async fn test_sources_and_save() {
        let (chats, model, tracker) = service().await;
        let cited = |uri: &str| Source {
            uri: uri.to_string(),
            title: "Posting".to_string(),
        };
        let existing = "https://jobs.example.com/existing";
        let fresh = "https://jobs.example.com/fresh";
        let mut app = tracker.applications().await[0].clone();
        app.job.url = existing.to_string();
        tracker.update(app).await.unwrap();

        model.push(ModelResponse {
            text: "Two openings.".to_string(),
            sources: vec![cited(existing), cited(fresh)],
        });
        let chat = chats.create().await;
        chats.send(chat.id, "find platform jobs").await.unwrap();

        let entries = chats.sources(chat.id).await.unwrap();
        assert_eq!(entries[0].button, SaveButton::AlreadySaved);
        assert_eq!(entries[1].button, SaveButton::Idle);
        assert!(chats.save_source(chat.id, existing).await.is_err());

        model.push_text(JOB_JSON);
        let entry = chats.save_source(chat.id, fresh).await.unwrap();
        assert_eq!(entry.button, SaveButton::AlreadySaved);
        assert!(tracker.contains_url(fresh).await);
    }

    #[tokio::test]
    async fn test_failed_save_can_be_retried() {
        let (chats, model, _) = service().await;
        let uri = "https://jobs.example.com/flaky";
        model.push(ModelResponse {
            text: "One opening.".to_string(),
            sources: vec![Source {
                uri: uri.to_string(),
                title: "Flaky".to_string(),
            }],
        });
        let chat = chats.create().await;
        chats.send(chat.id, "find jobs").await.unwrap();

        model.push_error(LlmError::EmptyContent);
        let entry = chats.save_source(chat.id, uri).await.unwrap();
        assert!(matches!(entry.button, SaveButton::Error { .. }));

        model.push_text(JOB_JSON);
        let entry = chats.save_source(chat.id, uri).await.unwrap();
        assert_eq!(entry.button, SaveButton::AlreadySaved);
    }

    #[tokio::test]
    async fn test_unknown_chat() {
        let (chats, _, _) = service().await;
        assert!(matches!(
            chats.send(Uuid::new_v4(), "hi").await,
            Err(ChatError::NotFound(_))
        ));
        assert!(chats.save_source(Uuid::new_v4(), "https://x.example").await.is_err());
    }
}
