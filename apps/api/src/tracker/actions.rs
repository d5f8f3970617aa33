//! Per-application, per-button progress for AI actions.
//!
//! A slot is either absent (idle), `Loading`, or `Failed`. Generate and
//! improve for the same content kind share one slot.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::ContentKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionSlot {
    FitAnalysis,
    Content(ContentKind),
    InterviewPrep,
    CompanyResearch,
}

impl ActionSlot {
    pub fn key(&self) -> &'static str {
        match self {
            ActionSlot::FitAnalysis => "fit-analysis",
            ActionSlot::Content(ContentKind::CoverLetter) => "cover-letter",
            ActionSlot::Content(ContentKind::ResumeBullets) => "resume-bullets",
            ActionSlot::Content(ContentKind::OutreachPitch) => "outreach-pitch",
            ActionSlot::InterviewPrep => "interview-prep",
            ActionSlot::CompanyResearch => "company-research",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ActionState {
    Loading,
    Failed { message: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("The {} action is already running for this application", .slot.key())]
pub struct ActionBusy {
    pub slot: ActionSlot,
}

#[derive(Debug, Default)]
pub struct ActionBoard {
    slots: HashMap<(Uuid, ActionSlot), ActionState>,
}

impl ActionBoard {
    /// Marks the slot as loading, clearing any previous failure.
    pub fn start(&mut self, id: Uuid, slot: ActionSlot) -> Result<(), ActionBusy> {
        if self.slots.get(&(id, slot)) == Some(&ActionState::Loading) {
            return Err(ActionBusy { slot });
        }
        self.slots.insert((id, slot), ActionState::Loading);
        Ok(())
    }

    pub fn finish(&mut self, id: Uuid, slot: ActionSlot, failure: Option<String>) {
        match failure {
            Some(message) => {
                self.slots.insert((id, slot), ActionState::Failed { message });
            }
            None => {
                self.slots.remove(&(id, slot));
            }
        }
    }

    #[cfg(test)]
    pub fn state(&self, id: Uuid, slot: ActionSlot) -> Option<&ActionState> {
        self.slots.get(&(id, slot))
    }

    /// Non-idle slots of one application, keyed by slot name.
    pub fn for_application(&self, id: Uuid) -> BTreeMap<&'static str, ActionState> {
        self.slots
            .iter()
            .filter(|((app_id, _), _)| *app_id == id)
            .map(|((_, slot), state)| (slot.key(), state.clone()))
            .collect()
    }
}
