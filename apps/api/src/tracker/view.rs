//! Derived views over the repository. Nothing here owns state that the
//! repository does not already hold, except the active tab and selection.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Application, ApplicationStatus, DashboardFilters};
use crate::tracker::repository::ApplicationRepository;

/// The filtered view, recomputed from scratch on every call.
pub fn project(applications: &[Application], filters: &DashboardFilters) -> Vec<Application> {
    applications
        .iter()
        .filter(|app| filters.matches(app))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub status: ApplicationStatus,
    pub count: usize,
    pub applications: Vec<Application>,
}

/// Kanban columns in pipeline order. Empty columns are kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Board {
    pub columns: Vec<Column>,
    pub total: usize,
}

impl Board {
    pub fn build(applications: &[Application], filters: &DashboardFilters) -> Self {
        let visible = project(applications, filters);
        let total = visible.len();
        let columns = ApplicationStatus::ALL
            .iter()
            .map(|&status| {
                let applications: Vec<Application> = visible
                    .iter()
                    .filter(|app| app.status == status)
                    .cloned()
                    .collect();
                Column {
                    status,
                    count: applications.len(),
                    applications,
                }
            })
            .collect();
        Self { columns, total }
    }

    #[cfg(test)]
    pub fn column(&self, status: ApplicationStatus) -> Option<&Column> {
        self.columns.iter().find(|c| c.status == status)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Dashboard,
    Resume,
    Preferences,
    Guide,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub active_tab: Tab,
    selected: Option<Uuid>,
}

impl ViewState {
    pub fn select(&mut self, id: Option<Uuid>) {
        self.selected = id;
    }

    /// Looks the selection up again so callers always see the current record.
    pub fn resolve<'a>(&self, repository: &'a ApplicationRepository) -> Option<&'a Application> {
        self.selected.and_then(|id| repository.get(id))
    }
}

/// What the client needs to render the current screen.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSnapshot {
    pub active_tab: Tab,
    pub selected: Option<Application>,
    pub filters: DashboardFilters,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobDraft;
    use crate::store::defaults::sample_applications;

    #[test]
    fn test_board_groups_in_pipeline_order() {
        let board = Board::build(&sample_applications(), &DashboardFilters::default());

        let order: Vec<ApplicationStatus> = board.columns.iter().map(|c| c.status).collect();
        assert_eq!(order, ApplicationStatus::ALL.to_vec());
        assert_eq!(board.total, 4);
        assert_eq!(board.column(ApplicationStatus::Discovery).unwrap().count, 2);
        assert_eq!(board.column(ApplicationStatus::Applied).unwrap().count, 1);
        assert_eq!(board.column(ApplicationStatus::Interview).unwrap().count, 1);
        assert_eq!(board.column(ApplicationStatus::Offer).unwrap().count, 0);
    }

    #[test]
    fn test_board_applies_filters() {
        let filters = DashboardFilters {
            status: None,
            company: "solu".to_string(),
            location: String::new(),
        };
        let board = Board::build(&sample_applications(), &filters);
        assert_eq!(board.total, 1);
        let discovery = board.column(ApplicationStatus::Discovery).unwrap();
        assert_eq!(discovery.applications[0].job.company, "Creative Solutions");
    }

    #[test]
    fn test_project_is_repeatable() {
        let apps = sample_applications();
        let filters = DashboardFilters {
            status: Some(ApplicationStatus::Discovery),
            ..Default::default()
        };
        assert_eq!(project(&apps, &filters), project(&apps, &filters));
        assert_eq!(project(&apps, &DashboardFilters::default()), apps);
    }

    #[test]
    fn test_selection_tracks_current_record() {
        let mut repo = ApplicationRepository::from_records(sample_applications());
        let id = repo.all()[0].id();
        let mut view = ViewState::default();
        view.select(Some(id));

        repo.set_status(id, ApplicationStatus::Offer);
        assert_eq!(view.resolve(&repo).unwrap().status, ApplicationStatus::Offer);
    }

    #[test]
    fn test_selection_of_unknown_id_resolves_to_none() {
        let mut repo = ApplicationRepository::default();
        repo.add(JobDraft {
            title: "Engineer".to_string(),
            company: "Acme".to_string(),
            ..Default::default()
        });
        let mut view = ViewState::default();
        view.select(Some(Uuid::new_v4()));
        assert!(view.resolve(&repo).is_none());
        assert_eq!(view.active_tab, Tab::Dashboard);
    }

    #[test]
    fn test_tab_serde_names() {
        assert_eq!(serde_json::to_string(&Tab::Preferences).unwrap(), "\"preferences\"");
        let tab: Tab = serde_json::from_str("\"guide\"").unwrap();
        assert_eq!(tab, Tab::Guide);
    }
}
