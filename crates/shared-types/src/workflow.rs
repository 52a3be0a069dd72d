//! Pure workflow rules: status transitions, the permission matrix, and
//! the closure-data gate. No I/O here; the server-side engine composes
//! these over a fetched case.

use crate::case::{Case, CaseStatus, ClosureReason};
use crate::error::AppError;
use crate::models::UserSummary;

/// Forward edges of the status machine. `closed` is terminal; getting
/// out of it is the separate reopen operation, never a transition.
pub fn transition_allowed(from: CaseStatus, to: CaseStatus) -> bool {
    use CaseStatus::*;
    match (from, to) {
        (Closed, _) => false,
        (New, Assigned) => true,
        (New | Assigned, Investigating) => true,
        (New | Assigned | Investigating, Closed) => true,
        _ => false,
    }
}

pub fn can_assign(actor: &UserSummary) -> bool {
    actor.role.is_supervisor_or_above()
}

pub fn can_close(actor: &UserSummary) -> bool {
    actor.role.is_supervisor_or_above()
}

pub fn can_reopen(actor: &UserSummary) -> bool {
    actor.role.is_supervisor_or_above()
}

/// Supervisors and managers edit any case; officers only their own.
pub fn can_edit_case(actor: &UserSummary, case: &Case) -> bool {
    actor.role.is_supervisor_or_above() || case.assigned_to == Some(actor.id)
}

/// Officers see their own and unassigned cases; supervisors and
/// managers see everything.
pub fn can_view_case(actor: &UserSummary, case: &Case) -> bool {
    actor.role.is_supervisor_or_above()
        || case.assigned_to.is_none()
        || case.assigned_to == Some(actor.id)
}

/// Moving to `investigating` is open to the assigned officer as well as
/// supervisors and managers.
pub fn can_start_investigating(actor: &UserSummary, case: &Case) -> bool {
    actor.role.is_supervisor_or_above() || case.assigned_to == Some(actor.id)
}

/// A close must carry a closure reason and a non-empty final note
/// together. Reports every missing part, not just the first.
pub fn check_closure_data(
    reason: Option<ClosureReason>,
    final_note: Option<&str>,
) -> Result<(), AppError> {
    let mut err = AppError::missing_closure_data(
        "closing a case requires a closure reason and a final note",
    );
    if reason.is_none() {
        err = err.with_field("closure_reason", "a closure reason is required");
    }
    if final_note.map_or(true, |n| n.trim().is_empty()) {
        err = err.with_field("final_note", "a final note is required");
    }
    if err.field_errors.is_empty() {
        Ok(())
    } else {
        Err(err)
    }
}
