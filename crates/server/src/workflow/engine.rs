//! The update engine. Pure over a fetched case: permission checks,
//! field validation and merge, transition guards, and closure gating
//! all happen here; the handler persists the outcome with a CAS on
//! `version`. A rejected update therefore never touches the store.

use std::collections::HashMap;

use chrono::Utc;

use shared_types::{
    merge_fields, schema, workflow, AppError, Case, CaseStatus, CaseUpdateRequest,
    LocationHistoryEntry, UserSummary,
};

/// Assignment part of an update, resolved by the handler (the engine
/// never looks users up).
pub enum AssignmentChange {
    Keep,
    Clear,
    Set(UserSummary),
}

#[derive(Debug)]
pub struct UpdateOutcome {
    pub case: Case,
    /// Human-readable audit lines describing what changed.
    pub audit: Vec<String>,
}

pub fn apply_update(
    current: &Case,
    actor: &UserSummary,
    request: &CaseUpdateRequest,
    assignment: AssignmentChange,
) -> Result<UpdateOutcome, AppError> {
    if current.status == CaseStatus::Closed {
        return Err(AppError::invalid_transition(
            "this case is closed; reopen it before making changes",
        ));
    }

    let changing_assignment = !matches!(assignment, AssignmentChange::Keep);
    if changing_assignment && !workflow::can_assign(actor) {
        return Err(AppError::forbidden(
            "only supervisors and managers can assign cases",
        ));
    }
    if !workflow::can_edit_case(actor, current) && !changing_assignment {
        return Err(AppError::forbidden(
            "officers can only edit cases assigned to them",
        ));
    }

    let mut case = current.clone();
    let mut audit = Vec::new();

    if let Some(description) = &request.description {
        if description.trim().is_empty() {
            return Err(AppError::bad_request("description must not be empty"));
        }
        if *description != case.description {
            case.description = description.clone();
            audit.push("description updated".to_string());
        }
    }

    if let Some(location) = &request.location {
        if !location.has_any() {
            return Err(AppError::bad_request(
                "a location needs an address, coordinates, or a what3words square",
            ));
        }
        if *location != case.location {
            case.location_history.push(LocationHistoryEntry {
                location: case.location.clone(),
                changed_by: actor.id,
                changed_by_name: actor.name.clone(),
                changed_at: Utc::now(),
            });
            case.location = location.clone();
            audit.push("location updated".to_string());
        }
    }

    if let Some(patch) = &request.type_specific_fields {
        apply_fields_patch(&mut case, actor, patch)?;
        audit.push(format!(
            "{} fields updated",
            case.case_type.family().canonical_key()
        ));
    }

    match assignment {
        AssignmentChange::Keep => {}
        AssignmentChange::Clear => {
            if case.assigned_to.is_some() {
                audit.push("assignment cleared".to_string());
            }
            case.assigned_to = None;
            case.assigned_to_name = None;
            if case.status == CaseStatus::Assigned {
                case.status = CaseStatus::New;
            }
        }
        AssignmentChange::Set(assignee) => {
            audit.push(format!("assigned to {}", assignee.name));
            case.assigned_to = Some(assignee.id);
            case.assigned_to_name = Some(assignee.name);
            // Assignment drives the first transition.
            if case.status == CaseStatus::New {
                case.status = CaseStatus::Assigned;
            }
        }
    }

    if let Some(to) = request.status {
        apply_transition(&mut case, current.status, to, actor, request, &mut audit)?;
    } else if request.closure_reason.is_some() || request.final_note.is_some() {
        return Err(AppError::bad_request(
            "closure_reason and final_note can only be set while closing the case",
        ));
    }

    case.updated_at = Utc::now();
    Ok(UpdateOutcome { case, audit })
}

fn apply_fields_patch(
    case: &mut Case,
    actor: &UserSummary,
    patch: &serde_json::Value,
) -> Result<(), AppError> {
    let Some(patch_obj) = patch.as_object() else {
        return Err(AppError::bad_request(
            "type_specific_fields must be a JSON object",
        ));
    };

    let family = case.case_type.family();
    for spec in family.field_specs() {
        if let Some(team) = spec.write_team {
            if patch_obj.contains_key(spec.name) && !actor.has_team(team) {
                return Err(AppError::forbidden(format!(
                    "only {} team members can update {}",
                    team.as_str(),
                    spec.name
                )));
            }
        }
    }

    let merged = merge_fields(&case.type_specific_fields, case.case_type, patch);
    let doc = &merged[family.canonical_key()];
    let violations = schema::validate(family, doc);
    if !violations.is_empty() {
        let field_errors: HashMap<String, String> = violations
            .into_iter()
            .map(|v| (v.field, v.message))
            .collect();
        return Err(AppError::validation("case field validation failed", field_errors));
    }

    case.type_specific_fields = merged;
    Ok(())
}

fn apply_transition(
    case: &mut Case,
    stored_status: CaseStatus,
    to: CaseStatus,
    actor: &UserSummary,
    request: &CaseUpdateRequest,
    audit: &mut Vec<String>,
) -> Result<(), AppError> {
    // Assignment in the same request may already have moved new -> assigned.
    let from = case.status;
    if to == from {
        return Ok(());
    }
    if !workflow::transition_allowed(from, to) {
        return Err(AppError::invalid_transition(format!(
            "cannot move a case from '{}' to '{}'",
            from.as_str(),
            to.as_str()
        )));
    }

    match to {
        CaseStatus::Assigned => {
            if case.assigned_to.is_none() {
                return Err(AppError::invalid_transition(
                    "assign the case to move it to 'assigned'",
                ));
            }
        }
        CaseStatus::Investigating => {
            if !workflow::can_start_investigating(actor, case) {
                return Err(AppError::forbidden(
                    "only the assigned officer or a supervisor can start investigating",
                ));
            }
        }
        CaseStatus::Closed => {
            if !workflow::can_close(actor) {
                return Err(AppError::forbidden(
                    "only supervisors and managers can close cases",
                ));
            }
            workflow::check_closure_data(
                request.closure_reason,
                request.final_note.as_deref(),
            )?;
            case.closure_reason = request.closure_reason;
            case.final_note = request.final_note.clone();
            case.closed_at = Some(Utc::now());
            case.closed_by = Some(actor.id);
        }
        CaseStatus::New => unreachable!("transition_allowed rejects moves back to new"),
    }

    case.status = to;
    audit.push(format!(
        "status: {} -> {}",
        stored_status.as_str(),
        to.as_str()
    ));
    Ok(())
}

/// Reopen a closed case. The closure reason and final note stay on the
/// record for the audit trail; only the terminal state is lifted.
pub fn apply_reopen(current: &Case, actor: &UserSummary) -> Result<UpdateOutcome, AppError> {
    if !workflow::can_reopen(actor) {
        return Err(AppError::forbidden(
            "only supervisors and managers can reopen cases",
        ));
    }
    if current.status != CaseStatus::Closed {
        return Err(AppError::invalid_transition("only closed cases can be reopened"));
    }

    let mut case = current.clone();
    case.status = CaseStatus::Investigating;
    case.closed_at = None;
    case.closed_by = None;
    case.updated_at = Utc::now();
    Ok(UpdateOutcome {
        case,
        audit: vec!["case reopened".to_string()],
    })
}
