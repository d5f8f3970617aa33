//! Tracker: the application repository plus everything persisted next to it.
//!
//! Every mutation rewrites the matching document while the lock is still held,
//! and memory only changes once that write succeeds. The stored copy never
//! lags behind an acknowledged write and a failed write changes nothing. AI results are
//! written back field by field keyed by application id; concurrent completions
//! for different records or fields never overwrite each other.

use std::collections::BTreeMap;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{
    Application, ApplicationStatus, ContentKind, DashboardFilters, FitAnalysis, InterviewPrep,
    JobDraft,
};
use crate::store::{Documents, StoreError};

pub mod actions;
pub mod handlers;
pub mod repository;
pub mod view;

use actions::{ActionBoard, ActionBusy, ActionSlot, ActionState};
use repository::ApplicationRepository;
use view::{Board, Tab, ViewSnapshot, ViewState};

pub struct Tracker {
    documents: Documents,
    repository: Mutex<ApplicationRepository>,
    resume: RwLock<String>,
    preferences: RwLock<String>,
    filters: RwLock<DashboardFilters>,
    tour_completed: RwLock<bool>,
    view: RwLock<ViewState>,
    actions: Mutex<ActionBoard>,
}

impl Tracker {
    /// Reads every document once; missing or corrupt ones start from defaults.
    pub async fn load(documents: Documents) -> Result<Self, StoreError> {
        let repository = ApplicationRepository::from_records(documents.applications().await?);
        let resume = documents.resume().await?;
        let preferences = documents.preferences().await?;
        let filters = documents.filters().await?;
        let tour_completed = documents.tour_completed().await?;
        info!("Loaded {} applications", repository.all().len());

        Ok(Self {
            documents,
            repository: Mutex::new(repository),
            resume: RwLock::new(resume),
            preferences: RwLock::new(preferences),
            filters: RwLock::new(filters),
            tour_completed: RwLock::new(tour_completed),
            view: RwLock::new(ViewState::default()),
            actions: Mutex::new(ActionBoard::default()),
        })
    }

    // ────────────────────────────────────────────────────────────────────────
    // Applications
    // ────────────────────────────────────────────────────────────────────────

    #[cfg(test)]
    pub async fn applications(&self) -> Vec<Application> {
        self.repository.lock().await.all().to_vec()
    }

    pub async fn get(&self, id: Uuid) -> Option<Application> {
        self.repository.lock().await.get(id).cloned()
    }

    pub async fn contains_url(&self, url: &str) -> bool {
        self.repository.lock().await.contains_url(url)
    }

    pub async fn filter(&self, filters: &DashboardFilters) -> Vec<Application> {
        self.repository.lock().await.filter(filters)
    }

    pub async fn add(&self, draft: JobDraft) -> Result<Application, StoreError> {
        let mut repo = self.repository.lock().await;
        let mut next = repo.clone();
        let app = next.add(draft);
        self.documents.save_applications(next.all()).await?;
        *repo = next;
        info!("Added application {} ({} at {})", app.id(), app.job.title, app.job.company);
        Ok(app)
    }

    pub async fn update(&self, updated: Application) -> Result<bool, StoreError> {
        self.mutate(|repo| repo.update(updated)).await
    }

    pub async fn set_status(&self, id: Uuid, status: ApplicationStatus) -> Result<bool, StoreError> {
        self.mutate(|repo| repo.set_status(id, status)).await
    }

    pub async fn set_fit_analysis(&self, id: Uuid, analysis: FitAnalysis) -> Result<bool, StoreError> {
        self.mutate(|repo| repo.set_fit_analysis(id, analysis)).await
    }

    pub async fn set_generated(
        &self,
        id: Uuid,
        kind: ContentKind,
        text: String,
    ) -> Result<bool, StoreError> {
        self.mutate(|repo| repo.set_generated(id, kind, text)).await
    }

    pub async fn set_interview_prep(&self, id: Uuid, prep: InterviewPrep) -> Result<bool, StoreError> {
        self.mutate(|repo| repo.set_interview_prep(id, prep)).await
    }

    /// Applies `f` to a copy and persists only when it reports a change. The
    /// in-memory repository is replaced after the write succeeds, so a failed
    /// save leaves it untouched.
    async fn mutate<F>(&self, f: F) -> Result<bool, StoreError>
    where
        F: FnOnce(&mut ApplicationRepository) -> bool,
    {
        let mut repo = self.repository.lock().await;
        let mut next = repo.clone();
        if !f(&mut next) {
            debug!("Mutation addressed an unknown application, nothing stored");
            return Ok(false);
        }
        self.documents.save_applications(next.all()).await?;
        *repo = next;
        Ok(true)
    }

    // ────────────────────────────────────────────────────────────────────────
    // Profile documents
    // ────────────────────────────────────────────────────────────────────────

    pub async fn resume(&self) -> String {
        self.resume.read().await.clone()
    }

    pub async fn set_resume(&self, resume: String) -> Result<(), StoreError> {
        let mut slot = self.resume.write().await;
        self.documents.save_resume(&resume).await?;
        *slot = resume;
        Ok(())
    }

    pub async fn preferences(&self) -> String {
        self.preferences.read().await.clone()
    }

    pub async fn set_preferences(&self, preferences: String) -> Result<(), StoreError> {
        let mut slot = self.preferences.write().await;
        self.documents.save_preferences(&preferences).await?;
        *slot = preferences;
        Ok(())
    }

    pub async fn tour_completed(&self) -> bool {
        *self.tour_completed.read().await
    }

    pub async fn set_tour_completed(&self, completed: bool) -> Result<(), StoreError> {
        let mut slot = self.tour_completed.write().await;
        self.documents.save_tour_completed(completed).await?;
        *slot = completed;
        Ok(())
    }

    // ────────────────────────────────────────────────────────────────────────
    // View state
    // ────────────────────────────────────────────────────────────────────────

    pub async fn filters(&self) -> DashboardFilters {
        self.filters.read().await.clone()
    }

    pub async fn set_filters(&self, filters: DashboardFilters) -> Result<(), StoreError> {
        let mut slot = self.filters.write().await;
        self.documents.save_filters(&filters).await?;
        *slot = filters;
        Ok(())
    }

    pub async fn reset_filters(&self) -> Result<(), StoreError> {
        self.set_filters(DashboardFilters::default()).await
    }

    /// Board under the saved filters.
    pub async fn board(&self) -> Board {
        let filters = self.filters().await;
        let repo = self.repository.lock().await;
        Board::build(repo.all(), &filters)
    }

    pub async fn view(&self) -> ViewSnapshot {
        let view = self.view.read().await.clone();
        let filters = self.filters().await;
        let selected = view.resolve(&*self.repository.lock().await).cloned();
        ViewSnapshot {
            active_tab: view.active_tab,
            selected,
            filters,
        }
    }

    pub async fn set_tab(&self, tab: Tab) {
        self.view.write().await.active_tab = tab;
    }

    /// Focuses a record, or clears the focus with `None`. Returns false when
    /// the id is unknown and leaves the selection unchanged.
    pub async fn select(&self, id: Option<Uuid>) -> bool {
        if let Some(id) = id {
            if self.get(id).await.is_none() {
                return false;
            }
        }
        self.view.write().await.select(id);
        true
    }

    // ────────────────────────────────────────────────────────────────────────
    // Action progress
    // ────────────────────────────────────────────────────────────────────────

    pub async fn begin_action(&self, id: Uuid, slot: ActionSlot) -> Result<(), ActionBusy> {
        self.actions.lock().await.start(id, slot)
    }

    pub async fn finish_action(&self, id: Uuid, slot: ActionSlot, failure: Option<String>) {
        self.actions.lock().await.finish(id, slot, failure);
    }

    pub async fn action_states(&self, id: Uuid) -> BTreeMap<&'static str, ActionState> {
        self.actions.lock().await.for_application(id)
    }
}
