pub mod cases;
pub mod fpn;
pub mod public;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use shared_types::{AppError, Case, UserSummary};

use crate::state::AppState;
use crate::workflow::UpdateOutcome;

/// Build the full application router.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Cases
        .route(
            "/api/cases",
            get(cases::list_cases).post(cases::create_case),
        )
        .route("/api/cases/check-duplicate-vrm", get(cases::check_duplicate_vrm))
        .route(
            "/api/cases/{id}",
            get(cases::get_case).patch(cases::update_case),
        )
        .route("/api/cases/{id}/location", put(cases::update_location))
        .route("/api/cases/{id}/self-assign", post(cases::self_assign))
        .route("/api/cases/{id}/reopen", post(cases::reopen_case))
        // FPN sub-record
        .route(
            "/api/cases/{id}/fpn",
            get(fpn::get_fpn).put(fpn::update_fpn),
        )
        // Reference data
        .route("/api/case-types/teams", get(cases::case_type_teams))
        // Public intake
        .route("/api/public/report", post(public::submit_public_report))
        // Plumbing
        .route("/health", get(crate::health::health_check))
        .route("/api/openapi.json", get(crate::openapi::serve_openapi))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Persist an engine outcome with a CAS on the stored version, then
/// record the audit lines. Audit failure is logged, never surfaced.
pub(crate) async fn commit(
    state: &AppState,
    actor: &UserSummary,
    expected_version: i64,
    outcome: UpdateOutcome,
    action: &str,
) -> Result<Case, AppError> {
    let case = state.cases.update(expected_version, outcome.case).await?;
    for line in &outcome.audit {
        if let Err(e) = state.audit.record(case.id, action, line, actor).await {
            tracing::warn!(case_id = %case.id, error = %e, "failed to record audit entry");
        }
    }
    Ok(case)
}
