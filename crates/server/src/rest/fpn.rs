use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use shared_types::{workflow, AppError, Case, CaseStatus, FpnDetails};

use crate::auth::extractors::CurrentUser;
use crate::state::AppState;
use crate::workflow::UpdateOutcome;

use super::cases::fetch_case;

// ── Fixed Penalty Notice handlers ───────────────────────────────────

/// GET /api/cases/{id}/fpn
#[utoipa::path(
    get,
    path = "/api/cases/{id}/fpn",
    params(("id" = Uuid, Path, description = "Case UUID")),
    responses(
        (status = 200, description = "FPN details (empty record if none)", body = FpnDetails),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "fpn"
)]
pub async fn get_fpn(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<FpnDetails>, AppError> {
    let case = fetch_case(&state, id).await?;
    if !workflow::can_view_case(&actor, &case) {
        return Err(AppError::forbidden(
            "this case is assigned to another officer",
        ));
    }
    Ok(Json(case.fpn_details.unwrap_or_default()))
}

fn check_fpn(fpn: &FpnDetails) -> Result<(), AppError> {
    let mut err = AppError::validation(
        "FPN validation failed",
        std::collections::HashMap::new(),
    );
    if let Some(amount) = fpn.fpn_amount {
        if amount < 0.0 {
            err = err.with_field("fpn_amount", "the amount cannot be negative");
        }
    }
    if fpn.paid && fpn.date_paid.is_none() {
        err = err.with_field("date_paid", "a paid FPN needs its payment date");
    }
    if fpn.date_paid.is_some() && !fpn.paid {
        err = err.with_field("paid", "a payment date without paid=true makes no sense");
    }
    if let (Some(issued), Some(paid)) = (fpn.date_issued, fpn.date_paid) {
        if paid < issued {
            err = err.with_field("date_paid", "paid before the notice was issued");
        }
    }
    if err.field_errors.is_empty() {
        Ok(())
    } else {
        Err(err)
    }
}

/// PUT /api/cases/{id}/fpn
#[utoipa::path(
    put,
    path = "/api/cases/{id}/fpn",
    request_body = FpnDetails,
    params(("id" = Uuid, Path, description = "Case UUID")),
    responses(
        (status = 200, description = "FPN recorded", body = Case),
        (status = 403, description = "Not allowed", body = AppError),
        (status = 422, description = "Validation failed", body = AppError)
    ),
    tag = "fpn"
)]
pub async fn update_fpn(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    Json(fpn): Json<FpnDetails>,
) -> Result<Json<Case>, AppError> {
    let current = fetch_case(&state, id).await?;
    if current.status == CaseStatus::Closed {
        return Err(AppError::invalid_transition(
            "this case is closed; reopen it before making changes",
        ));
    }
    if !workflow::can_edit_case(&actor, &current) {
        return Err(AppError::forbidden(
            "officers can only edit cases assigned to them",
        ));
    }
    check_fpn(&fpn)?;

    let mut case = current.clone();
    case.fpn_details = Some(fpn);
    case.updated_at = chrono::Utc::now();
    let outcome = UpdateOutcome {
        case,
        audit: vec!["fpn details updated".to_string()],
    };
    let case = super::commit(&state, &actor, current.version, outcome, "fpn_updated").await?;
    Ok(Json(case))
}
