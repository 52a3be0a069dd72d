//! Duplicate-subject detection for vehicle cases. The subject key is
//! the vehicle registration mark (VRM); the same vehicle reported as
//! abandoned and later as a nuisance should surface either way.

use serde_json::Value;
use uuid::Uuid;

use shared_types::{AppError, Case, CaseFamily, CaseType, DuplicateCase};

use crate::store::CaseStore;

/// Families searched by the detector.
pub const VRM_FAMILIES: &[CaseFamily] = &[CaseFamily::AbandonedVehicle, CaseFamily::NuisanceVehicle];

/// Canonical VRM form: uppercase with all whitespace stripped, so
/// `"ab12 cde"` and `"AB12CDE"` are the same plate.
pub fn normalize_vrm(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

fn family_vrm_field(family: CaseFamily) -> Option<&'static str> {
    match family {
        CaseFamily::AbandonedVehicle => Some("registration_number"),
        CaseFamily::NuisanceVehicle => Some("vehicle_registration"),
        _ => None,
    }
}

/// Normalized VRM of a case, if its family carries one and it is set.
pub fn case_vrm(case: &Case) -> Option<String> {
    let family = case.case_type.family();
    let field = family_vrm_field(family)?;
    let raw = case
        .type_specific_fields
        .get(family.canonical_key())?
        .get(field)
        .and_then(Value::as_str)?;
    let normalized = normalize_vrm(raw);
    (!normalized.is_empty()).then_some(normalized)
}

/// Look up prior cases for the same plate, newest first. Non-vehicle
/// case types return empty without touching the store.
pub async fn find_duplicates(
    store: &dyn CaseStore,
    vrm: &str,
    case_type: CaseType,
    exclude: Option<Uuid>,
) -> Result<Vec<DuplicateCase>, AppError> {
    if !case_type.family().carries_vrm() {
        return Ok(Vec::new());
    }
    let normalized = normalize_vrm(vrm);
    if normalized.is_empty() {
        return Ok(Vec::new());
    }
    let cases = store.find_by_vrm(&normalized, VRM_FAMILIES, exclude).await?;
    Ok(cases
        .into_iter()
        .map(|c| DuplicateCase {
            id: c.id,
            reference_number: c.reference_number,
            status: c.status,
            created_at: c.created_at,
            location: c.location,
        })
        .collect())
}
