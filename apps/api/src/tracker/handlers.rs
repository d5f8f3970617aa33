//! Axum route handlers for applications, the board, view state and the
//! profile documents.

use std::collections::BTreeMap;
use std::future::Future;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assistant::files::{FileKind, FileUpload};
use crate::errors::AppError;
use crate::models::{
    Application, ApplicationStatus, ContentKind, DashboardFilters, FitAnalysis, InterviewPrep,
    JobDraft,
};
use crate::state::AppState;
use crate::tracker::actions::{ActionSlot, ActionState};
use crate::tracker::view::{Board, Tab, ViewSnapshot};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
}

impl ListQuery {
    fn into_filters(self) -> Result<DashboardFilters, AppError> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<ApplicationStatus>()
                    .map_err(|e| AppError::Validation(e.to_string()))?,
            ),
        };
        Ok(DashboardFilters {
            status,
            company: self.company.unwrap_or_default(),
            location: self.location.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: ApplicationStatus,
}

#[derive(Debug, Serialize)]
pub struct ContentResponse {
    pub kind: ContentKind,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ResearchResponse {
    pub company: String,
    pub markdown: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResumeBody {
    pub resume: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PreferencesBody {
    pub preferences: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TourBody {
    pub completed: bool,
}

#[derive(Debug, Deserialize)]
pub struct TabRequest {
    pub tab: Tab,
}

#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    pub id: Option<Uuid>,
}

// ────────────────────────────────────────────────────────────────────────────
// Applications
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/applications
///
/// Filtered list, most recent first. Query parameters are independent and
/// optional; none returns the full collection.
pub async fn handle_list_applications(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Application>>, AppError> {
    let filters = query.into_filters()?;
    Ok(Json(state.tracker.filter(&filters).await))
}

/// POST /api/v1/applications
pub async fn handle_add_application(
    State(state): State<AppState>,
    Json(draft): Json<JobDraft>,
) -> Result<(StatusCode, Json<Application>), AppError> {
    let app = state.tracker.add(draft).await?;
    Ok((StatusCode::CREATED, Json(app)))
}

/// GET /api/v1/applications/:id
pub async fn handle_get_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Application>, AppError> {
    find(&state, id).await.map(Json)
}

/// PUT /api/v1/applications/:id
///
/// Whole-record replacement. The body's id must match the path.
pub async fn handle_update_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(updated): Json<Application>,
) -> Result<Json<Application>, AppError> {
    if updated.id() != id {
        return Err(AppError::Validation(format!(
            "Body id {} does not match path id {id}",
            updated.id()
        )));
    }
    if !state.tracker.update(updated.clone()).await? {
        return Err(not_found(id));
    }
    Ok(Json(updated))
}

/// PATCH /api/v1/applications/:id/status
pub async fn handle_set_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<Application>, AppError> {
    if !state.tracker.set_status(id, request.status).await? {
        return Err(not_found(id));
    }
    find(&state, id).await.map(Json)
}

/// GET /api/v1/applications/:id/actions
pub async fn handle_action_states(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BTreeMap<&'static str, ActionState>>, AppError> {
    find(&state, id).await?;
    Ok(Json(state.tracker.action_states(id).await))
}

// ────────────────────────────────────────────────────────────────────────────
// AI actions
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/applications/:id/fit-analysis
///
/// Replaces the stored fit analysis with a fresh one against the current resume.
pub async fn handle_fit_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FitAnalysis>, AppError> {
    let app = find(&state, id).await?;
    let description = require_description(&app)?;
    let resume = state.tracker.resume().await;
    let assistant = state.assistant.clone();
    let tracker = state.tracker.clone();

    let work = async move {
        let analysis = assistant.analyze_fit(&description, &resume).await?;
        tracker.set_fit_analysis(id, analysis.clone()).await?;
        Ok::<_, AppError>(analysis)
    };
    run_action(&state, id, ActionSlot::FitAnalysis, work)
        .await
        .map(Json)
}

/// POST /api/v1/applications/:id/content/:kind
pub async fn handle_generate_content(
    State(state): State<AppState>,
    Path((id, kind)): Path<(Uuid, ContentKind)>,
) -> Result<Json<ContentResponse>, AppError> {
    let app = find(&state, id).await?;
    let description = require_description(&app)?;
    let resume = state.tracker.resume().await;
    let assistant = state.assistant.clone();
    let tracker = state.tracker.clone();

    let work = async move {
        let content = assistant.generate_content(kind, &description, &resume).await?;
        tracker.set_generated(id, kind, content.clone()).await?;
        Ok::<_, AppError>(content)
    };
    let content = run_action(&state, id, ActionSlot::Content(kind), work).await?;
    Ok(Json(ContentResponse { kind, content }))
}

/// POST /api/v1/applications/:id/content/:kind/improve
///
/// Rewrites the stored text for `kind`; there must be something to improve.
pub async fn handle_improve_content(
    State(state): State<AppState>,
    Path((id, kind)): Path<(Uuid, ContentKind)>,
) -> Result<Json<ContentResponse>, AppError> {
    let app = find(&state, id).await?;
    let existing = app
        .content(kind)
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::Validation(format!("There is no {} to improve yet", kind.label())))?;
    let assistant = state.assistant.clone();
    let tracker = state.tracker.clone();

    let work = async move {
        let content = assistant.improve_content(&existing).await?;
        tracker.set_generated(id, kind, content.clone()).await?;
        Ok::<_, AppError>(content)
    };
    let content = run_action(&state, id, ActionSlot::Content(kind), work).await?;
    Ok(Json(ContentResponse { kind, content }))
}

/// POST /api/v1/applications/:id/interview-prep
pub async fn handle_interview_prep(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InterviewPrep>, AppError> {
    let app = find(&state, id).await?;
    let description = require_description(&app)?;
    let resume = state.tracker.resume().await;
    let assistant = state.assistant.clone();
    let tracker = state.tracker.clone();

    let work = async move {
        let prep = assistant
            .generate_interview_questions(&description, &resume)
            .await?;
        tracker.set_interview_prep(id, prep.clone()).await?;
        Ok::<_, AppError>(prep)
    };
    run_action(&state, id, ActionSlot::InterviewPrep, work)
        .await
        .map(Json)
}

/// POST /api/v1/applications/:id/company-research
///
/// Returned to the caller only; research is not stored on the application.
pub async fn handle_company_research(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResearchResponse>, AppError> {
    let app = find(&state, id).await?;
    let company = app.job.company.clone();
    let assistant = state.assistant.clone();

    let work = async move {
        let markdown = assistant
            .research_company(&app.job.company, &app.job.title)
            .await?;
        Ok::<_, AppError>(markdown)
    };
    let markdown = run_action(&state, id, ActionSlot::CompanyResearch, work).await?;
    Ok(Json(ResearchResponse { company, markdown }))
}

// ────────────────────────────────────────────────────────────────────────────
// Board, filters, view
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/board
pub async fn handle_board(State(state): State<AppState>) -> Json<Board> {
    Json(state.tracker.board().await)
}

/// GET /api/v1/filters
pub async fn handle_get_filters(State(state): State<AppState>) -> Json<DashboardFilters> {
    Json(state.tracker.filters().await)
}

/// PUT /api/v1/filters
pub async fn handle_set_filters(
    State(state): State<AppState>,
    Json(filters): Json<DashboardFilters>,
) -> Result<Json<DashboardFilters>, AppError> {
    state.tracker.set_filters(filters.clone()).await?;
    Ok(Json(filters))
}

/// DELETE /api/v1/filters
pub async fn handle_reset_filters(
    State(state): State<AppState>,
) -> Result<Json<DashboardFilters>, AppError> {
    state.tracker.reset_filters().await?;
    Ok(Json(DashboardFilters::default()))
}

/// GET /api/v1/view
pub async fn handle_get_view(State(state): State<AppState>) -> Json<ViewSnapshot> {
    Json(state.tracker.view().await)
}

/// PUT /api/v1/view/tab
pub async fn handle_set_tab(
    State(state): State<AppState>,
    Json(request): Json<TabRequest>,
) -> Json<ViewSnapshot> {
    state.tracker.set_tab(request.tab).await;
    Json(state.tracker.view().await)
}

/// PUT /api/v1/view/selection
///
/// `{"id": null}` clears the focus.
pub async fn handle_set_selection(
    State(state): State<AppState>,
    Json(request): Json<SelectionRequest>,
) -> Result<Json<ViewSnapshot>, AppError> {
    if let (false, Some(id)) = (state.tracker.select(request.id).await, request.id) {
        return Err(not_found(id));
    }
    Ok(Json(state.tracker.view().await))
}

// ────────────────────────────────────────────────────────────────────────────
// Profile documents
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/resume
pub async fn handle_get_resume(State(state): State<AppState>) -> Json<ResumeBody> {
    Json(ResumeBody {
        resume: state.tracker.resume().await,
    })
}

/// PUT /api/v1/resume
pub async fn handle_set_resume(
    State(state): State<AppState>,
    Json(body): Json<ResumeBody>,
) -> Result<Json<ResumeBody>, AppError> {
    state.tracker.set_resume(body.resume.clone()).await?;
    Ok(Json(body))
}

/// POST /api/v1/resume/upload
///
/// Multipart field `file`. Plain-text files are decoded directly; other
/// documents go through model-side extraction. The result replaces the
/// stored resume.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ResumeBody>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read the uploaded file: {e}")))?;
        upload = Some(FileUpload::new(file_name, content_type, bytes));
        break;
    }

    let upload =
        upload.ok_or_else(|| AppError::Validation("Missing multipart field 'file'".to_string()))?;
    if upload.bytes.is_empty() {
        return Err(AppError::Validation("The uploaded file is empty".to_string()));
    }

    let resume = match upload.kind() {
        FileKind::PlainText => upload.decode_text().ok_or_else(|| {
            AppError::Validation(format!("{} is not valid UTF-8 text", upload.file_name))
        })?,
        FileKind::Document => state.assistant.extract_text_from_file(&upload).await?,
    };
    state.tracker.set_resume(resume.clone()).await?;
    Ok(Json(ResumeBody { resume }))
}

/// GET /api/v1/preferences
pub async fn handle_get_preferences(State(state): State<AppState>) -> Json<PreferencesBody> {
    Json(PreferencesBody {
        preferences: state.tracker.preferences().await,
    })
}

/// PUT /api/v1/preferences
pub async fn handle_set_preferences(
    State(state): State<AppState>,
    Json(body): Json<PreferencesBody>,
) -> Result<Json<PreferencesBody>, AppError> {
    state.tracker.set_preferences(body.preferences.clone()).await?;
    Ok(Json(body))
}

/// GET /api/v1/tour
pub async fn handle_get_tour(State(state): State<AppState>) -> Json<TourBody> {
    Json(TourBody {
        completed: state.tracker.tour_completed().await,
    })
}

/// PUT /api/v1/tour
pub async fn handle_set_tour(
    State(state): State<AppState>,
    Json(body): Json<TourBody>,
) -> Result<Json<TourBody>, AppError> {
    state.tracker.set_tour_completed(body.completed).await?;
    Ok(Json(body))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn find(state: &AppState, id: Uuid) -> Result<Application, AppError> {
    state.tracker.get(id).await.ok_or_else(|| not_found(id))
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Application {id} not found"))
}

fn require_description(app: &Application) -> Result<String, AppError> {
    let description = app.job.description.trim();
    if description.is_empty() {
        return Err(AppError::Validation(
            "This application has no job description yet".to_string(),
        ));
    }
    Ok(description.to_string())
}

/// Runs `work` detached from the request with the slot marked as loading.
/// The outcome lands on the action board even if the caller goes away.
async fn run_action<T, F>(
    state: &AppState,
    id: Uuid,
    slot: ActionSlot,
    work: F,
) -> Result<T, AppError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, AppError>> + Send + 'static,
{
    state.tracker.begin_action(id, slot).await?;
    let tracker = state.tracker.clone();
    let task = tokio::spawn(async move {
        let result = work.await;
        let failure = result.as_ref().err().map(ToString::to_string);
        tracker.finish_action(id, slot, failure).await;
        result
    });
    task.await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("{} task failed: {e}", slot.key())))?
}
