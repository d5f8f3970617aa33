//! In-memory collection of applications, most recent first.
//!
//! Operations never fail. Addressing an id that is not present is a no-op and
//! is reported through the `bool` return value only.

use std::collections::HashSet;

use tracing::warn;
use uuid::Uuid;

use crate::models::{
    Application, ApplicationStatus, ContentKind, DashboardFilters, FitAnalysis, InterviewPrep,
    JobDraft,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationRepository {
    applications: Vec<Application>,
}

impl ApplicationRepository {
    /// Builds a repository from persisted records. A repeated id keeps its
    /// first occurrence so ids stay unique.
    pub fn from_records(records: Vec<Application>) -> Self {
        let mut seen = HashSet::with_capacity(records.len());
        let applications = records
            .into_iter()
            .filter(|app| {
                let fresh = seen.insert(app.id());
                if !fresh {
                    warn!("Dropping duplicate application id {}", app.id());
                }
                fresh
            })
            .collect();
        Self { applications }
    }

    pub fn all(&self) -> &[Application] {
        &self.applications
    }

    pub fn get(&self, id: Uuid) -> Option<&Application> {
        self.applications.iter().find(|app| app.id() == id)
    }

    /// True if any stored application points at `url`.
    pub fn contains_url(&self, url: &str) -> bool {
        let url = url.trim();
        !url.is_empty() && self.applications.iter().any(|app| app.job.url.trim() == url)
    }

    /// Creates a Discovery-stage application with a fresh id and puts it first.
    pub fn add(&mut self, draft: JobDraft) -> Application {
        let mut id = Uuid::new_v4();
        while self.get(id).is_some() {
            id = Uuid::new_v4();
        }
        let app = Application::new(draft.into_job(id));
        self.applications.insert(0, app.clone());
        app
    }

    /// Replaces the record with the same id in place.
    pub fn update(&mut self, updated: Application) -> bool {
        match self.get_mut(updated.id()) {
            Some(slot) => {
                *slot = updated;
                true
            }
            None => false,
        }
    }

    pub fn set_status(&mut self, id: Uuid, status: ApplicationStatus) -> bool {
        self.modify(id, |app| app.status = status)
    }

    /// Replaces the whole fit analysis.
    pub fn set_fit_analysis(&mut self, id: Uuid, analysis: FitAnalysis) -> bool {
        self.modify(id, |app| app.fit_analysis = Some(analysis))
    }

    /// Writes one generated field, leaving its siblings alone.
    pub fn set_generated(&mut self, id: Uuid, kind: ContentKind, text: String) -> bool {
        self.modify(id, |app| {
            app.generated_content.get_or_insert_with(Default::default).set(kind, text)
        })
    }

    pub fn set_interview_prep(&mut self, id: Uuid, prep: InterviewPrep) -> bool {
        self.modify(id, |app| {
            app.generated_content
                .get_or_insert_with(Default::default)
                .interview_prep = Some(prep)
        })
    }

    /// Fresh vector of the records matching every active predicate, in
    /// collection order.
    pub fn filter(&self, filters: &DashboardFilters) -> Vec<Application> {
        self.applications
            .iter()
            .filter(|app| filters.matches(app))
            .cloned()
            .collect()
    }

    fn get_mut(&mut self, id: Uuid) -> Option<&mut Application> {
        self.applications.iter_mut().find(|app| app.id() == id)
    }

    fn modify(&mut self, id: Uuid, f: impl FnOnce(&mut Application)) -> bool {
        match self.get_mut(id) {
            Some(app) => {
                f(app);
                true
            }
            None => false,
        }
    }
}
