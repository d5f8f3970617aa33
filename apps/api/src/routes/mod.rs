pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post, put},
    Router,
};

use crate::chat::handlers as chat;
use crate::state::AppState;
use crate::tracker::handlers as tracker;

/// Resume uploads may be PDFs or Word documents.
const UPLOAD_LIMIT_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Applications
        .route(
            "/api/v1/applications",
            get(tracker::handle_list_applications).post(tracker::handle_add_application),
        )
        .route(
            "/api/v1/applications/:id",
            get(tracker::handle_get_application).put(tracker::handle_update_application),
        )
        .route(
            "/api/v1/applications/:id/status",
            patch(tracker::handle_set_status),
        )
        .route(
            "/api/v1/applications/:id/actions",
            get(tracker::handle_action_states),
        )
        // AI actions
        .route(
            "/api/v1/applications/:id/fit-analysis",
            post(tracker::handle_fit_analysis),
        )
        .route(
            "/api/v1/applications/:id/content/:kind",
            post(tracker::handle_generate_content),
        )
        .route(
            "/api/v1/applications/:id/content/:kind/improve",
            post(tracker::handle_improve_content),
        )
        .route(
            "/api/v1/applications/:id/interview-prep",
            post(tracker::handle_interview_prep),
        )
        .route(
            "/api/v1/applications/:id/company-research",
            post(tracker::handle_company_research),
        )
        // Board and view state
        .route("/api/v1/board", get(tracker::handle_board))
        .route(
            "/api/v1/filters",
            get(tracker::handle_get_filters)
                .put(tracker::handle_set_filters)
                .delete(tracker::handle_reset_filters),
        )
        .route("/api/v1/view", get(tracker::handle_get_view))
        .route("/api/v1/view/tab", put(tracker::handle_set_tab))
        .route("/api/v1/view/selection", put(tracker::handle_set_selection))
        // Profile
        .route(
            "/api/v1/resume",
            get(tracker::handle_get_resume).put(tracker::handle_set_resume),
        )
        .route(
            "/api/v1/resume/upload",
            post(tracker::handle_upload_resume).layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        )
        .route(
            "/api/v1/preferences",
            get(tracker::handle_get_preferences).put(tracker::handle_set_preferences),
        )
        .route(
            "/api/v1/tour",
            get(tracker::handle_get_tour).put(tracker::handle_set_tour),
        )
        // Chat
        .route("/api/v1/chats", post(chat::handle_create_chat))
        .route("/api/v1/chats/:id", get(chat::handle_get_chat))
        .route("/api/v1/chats/:id/messages", post(chat::handle_send_message))
        .route("/api/v1/chats/:id/sources", get(chat::handle_list_sources))
        .route(
            "/api/v1/chats/:id/sources/save",
            post(chat::handle_save_source),
        )
        .with_state(state)
}
