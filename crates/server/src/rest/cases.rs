use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_types::{
    format_reference, merge_fields, schema, workflow, AppError, Case, CaseDetailResponse,
    CaseListParams, CaseStatus, CaseType, CaseUpdateRequest, CreateCaseRequest,
    DuplicateCheckResponse, Location, ReportingSource, TeamType,
};

use crate::auth::extractors::CurrentUser;
use crate::duplicates;
use crate::state::AppState;
use crate::store::CaseFilter;
use crate::workflow::{apply_reopen, apply_update, AssignmentChange};

// ── Case handlers ───────────────────────────────────────────────────

pub(crate) async fn fetch_case(state: &AppState, id: Uuid) -> Result<Case, AppError> {
    state
        .cases
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("case {id} not found")))
}

/// Validate and build the initial `type_specific_fields` document.
fn initial_fields(
    case_type: CaseType,
    patch: Option<&serde_json::Value>,
) -> Result<serde_json::Value, AppError> {
    let empty = serde_json::json!({});
    let merged = merge_fields(&empty, case_type, patch.unwrap_or(&empty));
    let family = case_type.family();
    let violations = schema::validate(family, &merged[family.canonical_key()]);
    if !violations.is_empty() {
        let field_errors = violations
            .into_iter()
            .map(|v| (v.field, v.message))
            .collect();
        return Err(AppError::validation("case field validation failed", field_errors));
    }
    Ok(merged)
}

pub(crate) async fn allocate_reference(
    state: &AppState,
    case_type: CaseType,
) -> Result<String, AppError> {
    let now = Utc::now();
    let sequence = state
        .cases
        .next_sequence(case_type.reference_prefix(), now.year())
        .await?;
    Ok(format_reference(case_type, now, sequence))
}

/// POST /api/cases
#[utoipa::path(
    post,
    path = "/api/cases",
    request_body = CreateCaseRequest,
    responses(
        (status = 201, description = "Case created", body = Case),
        (status = 422, description = "Field validation failed", body = AppError)
    ),
    tag = "cases"
)]
pub async fn create_case(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(body): Json<CreateCaseRequest>,
) -> Result<(StatusCode, Json<Case>), AppError> {
    if body.description.trim().is_empty() {
        return Err(AppError::bad_request("description must not be empty"));
    }
    if !body.location.has_any() {
        return Err(AppError::bad_request(
            "a location needs an address, coordinates, or a what3words square",
        ));
    }

    let type_specific_fields = initial_fields(body.case_type, body.type_specific_fields.as_ref())?;
    let reference_number = allocate_reference(&state, body.case_type).await?;
    let now = Utc::now();

    let case = Case {
        id: Uuid::new_v4(),
        reference_number,
        case_type: body.case_type,
        status: CaseStatus::New,
        description: body.description,
        location: body.location,
        location_history: Vec::new(),
        reporter_name: body.reporter_name,
        reporter_contact: body.reporter_contact,
        assigned_to: None,
        assigned_to_name: None,
        type_specific_fields,
        fpn_details: None,
        closure_reason: None,
        final_note: None,
        reporting_source: body.reporting_source.unwrap_or(ReportingSource::Officer),
        created_at: now,
        updated_at: now,
        closed_at: None,
        created_by: Some(actor.id),
        closed_by: None,
        version: 1,
    };

    let case = state.cases.create(case).await?;
    if let Err(e) = state
        .audit
        .record(case.id, "case_created", &case.reference_number, &actor)
        .await
    {
        tracing::warn!(case_id = %case.id, error = %e, "failed to record audit entry");
    }
    tracing::info!(reference = %case.reference_number, "case created");
    Ok((StatusCode::CREATED, Json(case)))
}

/// GET /api/cases
#[utoipa::path(
    get,
    path = "/api/cases",
    params(CaseListParams),
    responses(
        (status = 200, description = "Cases, newest first", body = Vec<Case>)
    ),
    tag = "cases"
)]
pub async fn list_cases(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Query(params): Query<CaseListParams>,
) -> Result<Json<Vec<Case>>, AppError> {
    let filter = CaseFilter {
        status: params.status,
        case_type: params.case_type,
        assigned_to: params.assigned_to,
        unassigned: params.unassigned.unwrap_or(false),
    };
    let mut cases = state.cases.list(&filter).await?;
    cases.retain(|c| workflow::can_view_case(&actor, c));
    Ok(Json(cases))
}

/// GET /api/cases/{id}
#[utoipa::path(
    get,
    path = "/api/cases/{id}",
    params(("id" = Uuid, Path, description = "Case UUID")),
    responses(
        (status = 200, description = "Case found", body = CaseDetailResponse),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "cases"
)]
pub async fn get_case(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CaseDetailResponse>, AppError> {
    let case = fetch_case(&state, id).await?;
    if !workflow::can_view_case(&actor, &case) {
        return Err(AppError::forbidden(
            "this case is assigned to another officer",
        ));
    }
    let integrity_flags = case.integrity_flags();
    let evidence_count = state.evidence.count_for_case(case.id).await?;
    Ok(Json(CaseDetailResponse {
        case,
        integrity_flags,
        evidence_count,
    }))
}

/// PATCH /api/cases/{id}
#[utoipa::path(
    patch,
    path = "/api/cases/{id}",
    request_body = CaseUpdateRequest,
    params(("id" = Uuid, Path, description = "Case UUID")),
    responses(
        (status = 200, description = "Case updated", body = Case),
        (status = 403, description = "Not allowed", body = AppError),
        (status = 409, description = "Conflict or invalid transition", body = AppError),
        (status = 422, description = "Validation failed", body = AppError)
    ),
    tag = "cases"
)]
pub async fn update_case(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    Json(body): Json<CaseUpdateRequest>,
) -> Result<Json<Case>, AppError> {
    let current = fetch_case(&state, id).await?;

    let assignment = match body.assigned_to.as_deref() {
        None => AssignmentChange::Keep,
        Some("unassigned") | Some("") => AssignmentChange::Clear,
        Some(raw) => {
            let assignee_id = Uuid::parse_str(raw)
                .map_err(|_| AppError::bad_request("assigned_to must be a user id or 'unassigned'"))?;
            let assignee = state
                .users
                .get_user(assignee_id)
                .await?
                .ok_or_else(|| AppError::not_found("assignee not found"))?;
            AssignmentChange::Set(assignee)
        }
    };
    let notify_assignee = match &assignment {
        AssignmentChange::Set(assignee) if Some(assignee.id) != current.assigned_to => {
            Some(assignee.id)
        }
        _ => None,
    };

    let outcome = apply_update(&current, &actor, &body, assignment)?;
    let case = super::commit(&state, &actor, current.version, outcome, "case_updated").await?;

    if let Some(assignee_id) = notify_assignee {
        if let Err(e) = state
            .notifications
            .notify(
                assignee_id,
                "Case assigned to you",
                &format!("{} has been assigned to you", case.reference_number),
                Some(case.id),
            )
            .await
        {
            tracing::warn!(case_id = %case.id, error = %e, "failed to send assignment notification");
        }
    }
    Ok(Json(case))
}

/// PUT /api/cases/{id}/location
#[utoipa::path(
    put,
    path = "/api/cases/{id}/location",
    request_body = Location,
    params(("id" = Uuid, Path, description = "Case UUID")),
    responses(
        (status = 200, description = "Location updated", body = Case),
        (status = 400, description = "Empty location", body = AppError)
    ),
    tag = "cases"
)]
pub async fn update_location(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    Json(location): Json<Location>,
) -> Result<Json<Case>, AppError> {
    let current = fetch_case(&state, id).await?;
    let request = CaseUpdateRequest {
        location: Some(location),
        ..Default::default()
    };
    let outcome = apply_update(&current, &actor, &request, AssignmentChange::Keep)?;
    let case = super::commit(&state, &actor, current.version, outcome, "location_updated").await?;
    Ok(Json(case))
}

/// POST /api/cases/{id}/self-assign
#[utoipa::path(
    post,
    path = "/api/cases/{id}/self-assign",
    params(("id" = Uuid, Path, description = "Case UUID")),
    responses(
        (status = 200, description = "Case claimed", body = Case),
        (status = 409, description = "Already assigned", body = AppError)
    ),
    tag = "cases"
)]
pub async fn self_assign(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Case>, AppError> {
    let case = state.cases.self_assign(id, &actor).await?;
    if let Err(e) = state
        .audit
        .record(case.id, "self_assigned", &format!("claimed by {}", actor.name), &actor)
        .await
    {
        tracing::warn!(case_id = %case.id, error = %e, "failed to record audit entry");
    }
    Ok(Json(case))
}

/// POST /api/cases/{id}/reopen
#[utoipa::path(
    post,
    path = "/api/cases/{id}/reopen",
    params(("id" = Uuid, Path, description = "Case UUID")),
    responses(
        (status = 200, description = "Case reopened", body = Case),
        (status = 403, description = "Not allowed", body = AppError),
        (status = 409, description = "Case is not closed", body = AppError)
    ),
    tag = "cases"
)]
pub async fn reopen_case(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Case>, AppError> {
    let current = fetch_case(&state, id).await?;
    let outcome = apply_reopen(&current, &actor)?;
    let case = super::commit(&state, &actor, current.version, outcome, "case_reopened").await?;
    Ok(Json(case))
}

// ── Duplicate VRM check ─────────────────────────────────────────────

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct DuplicateCheckParams {
    /// Vehicle registration mark, any spacing or case.
    pub vrm: String,
    pub case_type: CaseType,
    /// Case to exclude (the one being edited).
    pub exclude: Option<Uuid>,
}

/// GET /api/cases/check-duplicate-vrm
#[utoipa::path(
    get,
    path = "/api/cases/check-duplicate-vrm",
    params(DuplicateCheckParams),
    responses(
        (status = 200, description = "Prior cases for this plate", body = DuplicateCheckResponse)
    ),
    tag = "cases"
)]
pub async fn check_duplicate_vrm(
    State(state): State<AppState>,
    CurrentUser(_actor): CurrentUser,
    Query(params): Query<DuplicateCheckParams>,
) -> Result<Json<DuplicateCheckResponse>, AppError> {
    let duplicates = duplicates::find_duplicates(
        state.cases.as_ref(),
        &params.vrm,
        params.case_type,
        params.exclude,
    )
    .await?;
    Ok(Json(DuplicateCheckResponse { duplicates }))
}

// ── Reference data ──────────────────────────────────────────────────

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CaseTypeTeams {
    pub case_type: CaseType,
    pub teams: Vec<TeamType>,
}

/// GET /api/case-types/teams
#[utoipa::path(
    get,
    path = "/api/case-types/teams",
    responses(
        (status = 200, description = "Teams allowed per case type", body = Vec<CaseTypeTeams>)
    ),
    tag = "reference"
)]
pub async fn case_type_teams(
    CurrentUser(_actor): CurrentUser,
) -> Json<Vec<CaseTypeTeams>> {
    let mapping = CaseType::ALL
        .iter()
        .map(|t| CaseTypeTeams {
            case_type: *t,
            teams: schema::allowed_teams(*t).to_vec(),
        })
        .collect();
    Json(mapping)
}
