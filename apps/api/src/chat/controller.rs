//! Conversation state machine.
//!
//! Pure and synchronous: `begin_turn` decides what a message needs and
//! `complete_turn` folds the result back. The caller performs the AI work in
//! between. One turn may be outstanding at a time.

use std::collections::HashSet;

use reqwest::Url;
use serde::Serialize;

use crate::assistant::{summarize_fit, BotReply};
use crate::chat::ChatError;
use crate::models::{Application, FitAnalysis, Message, Role, Source};

pub const GREETING: &str =
    "Hello! I'm your Career Companion. How can I help you with your job search today?";

pub const ASK_FOR_DESCRIPTION: &str =
    "Sure! Paste the job description you'd like me to analyze and I'll compare it with your resume.";

const ANALYZE_WORDS: &[&str] = &["analyze", "analyse"];
const JOB_WORDS: &[&str] = &["job", "fit", "role", "position", "posting", "description"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatMode {
    #[default]
    Idle,
    AwaitingJobDescription,
}

/// Work the caller has to do for the turn that was just opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnPlan {
    ImportJob { url: String },
    AnalyzeFit { description: String },
    Ask { text: String },
    /// Answered locally; the turn is already closed.
    Reply,
}

#[derive(Debug, Clone)]
pub enum TurnOutcome {
    Imported(Application),
    Analyzed(FitAnalysis),
    Answered(BotReply),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ChatController {
    messages: Vec<Message>,
    mode: ChatMode,
    in_flight: bool,
}

impl Default for ChatController {
    fn default() -> Self {
        Self {
            messages: vec![Message::model(GREETING)],
            mode: ChatMode::Idle,
            in_flight: false,
        }
    }
}

impl ChatController {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn mode(&self) -> ChatMode {
        self.mode
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    pub fn begin_turn(&mut self, input: &str) -> Result<TurnPlan, ChatError> {
        let text = input.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if self.in_flight {
            return Err(ChatError::Busy);
        }
        self.messages.push(Message::user(text));

        let plan = match self.mode {
            ChatMode::AwaitingJobDescription => TurnPlan::AnalyzeFit {
                description: text.to_string(),
            },
            ChatMode::Idle => {
                if let Some(url) = job_url(text) {
                    TurnPlan::ImportJob { url }
                } else if is_analyze_intent(text) {
                    self.mode = ChatMode::AwaitingJobDescription;
                    self.messages.push(Message::model(ASK_FOR_DESCRIPTION));
                    return Ok(TurnPlan::Reply);
                } else {
                    TurnPlan::Ask {
                        text: text.to_string(),
                    }
                }
            }
        };
        self.in_flight = true;
        Ok(plan)
    }

    /// Appends the model's message and returns the controller to `Idle`
    /// whatever the outcome.
    pub fn complete_turn(&mut self, outcome: TurnOutcome) -> &Message {
        let message = match outcome {
            TurnOutcome::Imported(app) => Message::model(format!(
                "I've added \"{}\" at {} to your {}.",
                app.job.title,
                app.job.company,
                app.status.label()
            )),
            TurnOutcome::Analyzed(analysis) => Message::model(summarize_fit(&analysis)),
            TurnOutcome::Answered(reply) => Message::model_with_sources(reply.text, reply.sources),
            TurnOutcome::Failed(reason) => Message::model(reason),
        };
        self.in_flight = false;
        self.mode = ChatMode::Idle;
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    /// Closes a turn whose work never reported back. No message is added.
    pub fn abandon_turn(&mut self) {
        self.in_flight = false;
        self.mode = ChatMode::Idle;
    }

    /// Case-insensitive substring search over message text. A blank query
    /// returns the whole history.
    pub fn search(&self, query: &str) -> Vec<Message> {
        let query = query.trim().to_lowercase();
        self.messages
            .iter()
            .filter(|m| query.is_empty() || m.text.to_lowercase().contains(&query))
            .cloned()
            .collect()
    }

    /// Every source cited by the model so far, first occurrence first.
    pub fn cited_sources(&self) -> Vec<Source> {
        let mut seen = HashSet::new();
        self.messages
            .iter()
            .filter(|m| m.role == Role::Model)
            .flat_map(|m| m.sources.iter().flatten())
            .filter(|s| seen.insert(s.uri.as_str()))
            .cloned()
            .collect()
    }

    pub fn cited_source(&self, uri: &str) -> Option<Source> {
        self.cited_sources().into_iter().find(|s| s.uri == uri)
    }
}

/// The message as an absolute http(s) URL, if it is exactly one.
pub fn job_url(text: &str) -> Option<String> {
    let text = text.trim();
    if text.chars().any(char::is_whitespace) {
        return None;
    }
    let url = Url::parse(text).ok()?;
    let has_host = url.host_str().is_some_and(|h| !h.is_empty());
    match url.scheme() {
        "http" | "https" if has_host => Some(text.to_string()),
        _ => None,
    }
}

pub fn is_analyze_intent(text: &str) -> bool {
    let text = text.to_lowercase();
    ANALYZE_WORDS.iter().any(|w| text.contains(w)) && JOB_WORDS.iter().any(|w| text.contains(w))
}
