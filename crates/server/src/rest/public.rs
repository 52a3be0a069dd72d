use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use uuid::Uuid;

use shared_types::{
    merge_fields, schema, AppError, Case, CaseStatus, PublicReportRequest, PublicReportResponse,
    ReportingSource, UserRole,
};

use crate::config;
use crate::state::AppState;

use super::cases::allocate_reference;

/// Build the initial fields for a public report. Members of the public
/// cannot be held to the full schema, so only the values they did
/// provide are checked; required-field gaps are left for the officer.
fn public_fields(
    case_type: shared_types::CaseType,
    patch: Option<&serde_json::Value>,
) -> Result<serde_json::Value, AppError> {
    let empty = serde_json::json!({});
    let merged = merge_fields(&empty, case_type, patch.unwrap_or(&empty));
    let family = case_type.family();
    let field_errors: std::collections::HashMap<String, String> =
        schema::validate(family, &merged[family.canonical_key()])
            .into_iter()
            .filter(|v| v.message != "this field is required")
            .map(|v| (v.field, v.message))
            .collect();
    if !field_errors.is_empty() {
        return Err(AppError::validation("report validation failed", field_errors));
    }
    Ok(merged)
}

/// POST /api/public/report: unauthenticated intake from the public
/// reporting site. Returns 404 when the deployment has it disabled.
#[utoipa::path(
    post,
    path = "/api/public/report",
    request_body = PublicReportRequest,
    responses(
        (status = 201, description = "Report received", body = PublicReportResponse),
        (status = 404, description = "Public reporting is not enabled", body = AppError)
    ),
    tag = "public"
)]
pub async fn submit_public_report(
    State(state): State<AppState>,
    Json(body): Json<PublicReportRequest>,
) -> Result<(StatusCode, Json<PublicReportResponse>), AppError> {
    if !config::config().enable_public_reporting {
        return Err(AppError::not_found("not found"));
    }
    if body.description.trim().is_empty() {
        return Err(AppError::bad_request("description must not be empty"));
    }
    if !body.location.has_any() {
        return Err(AppError::bad_request(
            "please tell us where the problem is",
        ));
    }

    let type_specific_fields = public_fields(body.case_type, body.type_specific_fields.as_ref())?;
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
        reporting_source: ReportingSource::Public,
        created_at: now,
        updated_at: now,
        closed_at: None,
        created_by: None,
        closed_by: None,
        version: 1,
    };

    let case = state.cases.create(case).await?;
    tracing::info!(reference = %case.reference_number, "public report received");

    // Best effort; the report stands even if nobody gets pinged.
    for role in [UserRole::Supervisor, UserRole::Manager] {
        let recipients = match state.users.list_users(Some(role)).await {
            Ok(users) => users,
            Err(e) => {
                tracing::warn!(error = %e, "failed to list notification recipients");
                continue;
            }
        };
        for user in recipients {
            if let Err(e) = state
                .notifications
                .notify(
                    user.id,
                    "New public report",
                    &format!("{} was reported by a member of the public", case.reference_number),
                    Some(case.id),
                )
                .await
            {
                tracing::warn!(user_id = %user.id, error = %e, "failed to send notification");
            }
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(PublicReportResponse {
            message: format!(
                "Thank you for your report to {}. Your reference is {}.",
                config::config().organisation_name,
                case.reference_number
            ),
            reference_number: case.reference_number,
        }),
    ))
}
