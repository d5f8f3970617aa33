//! Save buttons for cited sources, one small state machine per URI.
//!
//! idle → saving → saved | error, and error → saving for a retry. A source
//! whose URI already belongs to a stored application shows as `AlreadySaved`
//! no matter what its own history says.

use std::collections::HashMap;

use serde::Serialize;

use crate::chat::ChatError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SaveState {
    #[default]
    Idle,
    Saving,
    Saved,
    Error { message: String },
}

/// What the client renders for a source's save button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SaveButton {
    AlreadySaved,
    Idle,
    Saving,
    Saved,
    Error { message: String },
}

impl SaveButton {
    #[cfg(test)]
    pub fn is_enabled(&self) -> bool {
        matches!(self, SaveButton::Idle | SaveButton::Error { .. })
    }
}

#[derive(Debug, Default)]
pub struct SaveTracker {
    states: HashMap<String, SaveState>,
}

impl SaveTracker {
    pub fn state(&self, uri: &str) -> SaveState {
        self.states.get(uri).cloned().unwrap_or_default()
    }

    /// Moves `uri` to `Saving`. Only `Idle` and `Error` may start a save.
    pub fn begin(&mut self, uri: &str, already_saved: bool) -> Result<(), ChatError> {
        if already_saved {
            return Err(ChatError::SaveNotAllowed(format!("{uri} is already saved")));
        }
        match self.state(uri) {
            SaveState::Idle | SaveState::Error { .. } => {
                self.states.insert(uri.to_string(), SaveState::Saving);
                Ok(())
            }
            SaveState::Saving => Err(ChatError::SaveNotAllowed(format!(
                "{uri} is already being saved"
            ))),
            SaveState::Saved => Err(ChatError::SaveNotAllowed(format!("{uri} is already saved"))),
        }
    }

    /// Ignored unless `uri` is currently saving.
    pub fn finish(&mut self, uri: &str, result: Result<(), String>) {
        if self.state(uri) != SaveState::Saving {
            return;
        }
        let next = match result {
            Ok(()) => SaveState::Saved,
            Err(message) => SaveState::Error { message },
        };
        self.states.insert(uri.to_string(), next);
    }

    pub fn button(&self, uri: &str, already_saved: bool) -> SaveButton {
        if already_saved {
            return SaveButton::AlreadySaved;
        }
        match self.state(uri) {
            SaveState::Idle => SaveButton::Idle,
            SaveState::Saving => SaveButton::Saving,
            SaveState::Saved => SaveButton::Saved,
            SaveState::Error { message } => SaveButton::Error { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URI: &str = "https://jobs.example.com/42";

    #[test]
    fn test_happy_path() {
        let mut saves = SaveTracker::default();
        assert_eq!(saves.button(URI, false), SaveButton::Idle);
        saves.begin(URI, false).unwrap();
        assert_eq!(saves.button(URI, false), SaveButton::Saving);
        assert!(!saves.button(URI, false).is_enabled());
        saves.finish(URI, Ok(()));
        assert_eq!(saves.state(URI), SaveState::Saved);
        assert!(saves.begin(URI, false).is_err());
    }

    #[test]
    fn test_retry_from_error() {
        let mut saves = SaveTracker::default();
        saves.begin(URI, false).unwrap();
        saves.finish(URI, Err("Failed to extract job details.".to_string()));
        assert!(saves.button(URI, false).is_enabled());

        saves.begin(URI, false).unwrap();
        assert_eq!(saves.state(URI), SaveState::Saving);
    }

    #[test]
    fn test_no_double_start() {
        let mut saves = SaveTracker::default();
        saves.begin(URI, false).unwrap();
        assert!(matches!(saves.begin(URI, false), Err(ChatError::SaveNotAllowed(_))));
    }

    #[test]
    fn test_already_saved_overrides_history() {
        let mut saves = SaveTracker::default();
        saves.begin(URI, false).unwrap();
        saves.finish(URI, Err("boom".to_string()));

        assert_eq!(saves.button(URI, true), SaveButton::AlreadySaved);
        assert!(!saves.button(URI, true).is_enabled());
        assert!(saves.begin(URI, true).is_err());
        assert!(matches!(saves.state(URI), SaveState::Error { .. }));
    }

    #[test]
    fn test_finish_without_begin_is_ignored() {
        let mut saves = SaveTracker::default();
        saves.finish(URI, Ok(()));
        assert_eq!(saves.state(URI), SaveState::Idle);
    }
}
