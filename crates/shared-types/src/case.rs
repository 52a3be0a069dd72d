use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::schema::CaseFamily;

// ── Enums ───────────────────────────────────────────────────────────

/// Case type, fixed at creation. Variants within a family (e.g. the
/// fly-tipping set) share one field schema and storage key, see
/// [`CaseFamily`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum CaseType {
    FlyTipping,
    FlyTippingPrivate,
    FlyTippingOrganised,
    AbandonedVehicle,
    Littering,
    DogFouling,
    PspoDogControl,
    UntidyLand,
    HighHedges,
    WasteCarrierLicensing,
    NuisanceVehicle,
    NuisanceVehicleSeller,
    ComplexEnvironmental,
}

impl CaseType {
    pub const ALL: &'static [CaseType] = &[
        CaseType::FlyTipping,
        CaseType::FlyTippingPrivate,
        CaseType::FlyTippingOrganised,
        CaseType::AbandonedVehicle,
        CaseType::Littering,
        CaseType::DogFouling,
        CaseType::PspoDogControl,
        CaseType::UntidyLand,
        CaseType::HighHedges,
        CaseType::WasteCarrierLicensing,
        CaseType::NuisanceVehicle,
        CaseType::NuisanceVehicleSeller,
        CaseType::ComplexEnvironmental,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseType::FlyTipping => "fly_tipping",
            CaseType::FlyTippingPrivate => "fly_tipping_private",
            CaseType::FlyTippingOrganised => "fly_tipping_organised",
            CaseType::AbandonedVehicle => "abandoned_vehicle",
            CaseType::Littering => "littering",
            CaseType::DogFouling => "dog_fouling",
            CaseType::PspoDogControl => "pspo_dog_control",
            CaseType::UntidyLand => "untidy_land",
            CaseType::HighHedges => "high_hedges",
            CaseType::WasteCarrierLicensing => "waste_carrier_licensing",
            CaseType::NuisanceVehicle => "nuisance_vehicle",
            CaseType::NuisanceVehicleSeller => "nuisance_vehicle_seller",
            CaseType::ComplexEnvironmental => "complex_environmental",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }

    /// Two-letter prefix used in human-readable reference numbers.
    pub fn reference_prefix(&self) -> &'static str {
        match self {
            CaseType::FlyTipping => "FT",
            CaseType::FlyTippingPrivate => "FP",
            CaseType::FlyTippingOrganised => "FO",
            CaseType::AbandonedVehicle => "AV",
            CaseType::Littering => "LT",
            CaseType::DogFouling => "DF",
            CaseType::PspoDogControl => "PS",
            CaseType::UntidyLand => "UL",
            CaseType::HighHedges => "HH",
            CaseType::WasteCarrierLicensing => "WC",
            CaseType::NuisanceVehicle => "NV",
            CaseType::NuisanceVehicleSeller => "NV",
            CaseType::ComplexEnvironmental => "CE",
        }
    }

    /// Schema/storage family this type belongs to.
    pub fn family(&self) -> CaseFamily {
        CaseFamily::for_case_type(*self)
    }
}

/// Case lifecycle status. Forward edges are
/// `new -> assigned -> investigating -> closed`; reopen is a distinct
/// privileged transition, not a reverse edge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    #[default]
    New,
    Assigned,
    Investigating,
    Closed,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::New => "new",
            CaseStatus::Assigned => "assigned",
            CaseStatus::Investigating => "investigating",
            CaseStatus::Closed => "closed",
        }
    }
}

/// How the case entered the system. Immutable after creation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ReportingSource {
    Public,
    #[default]
    Officer,
    Other,
}

/// Closed enumeration of reasons a case may be closed with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ClosureReason {
    Resolved,
    NoActionRequired,
    InsufficientEvidence,
    ProsecutionSuccessful,
    WarningIssued,
    FpnPaid,
    Transferred,
    Duplicate,
    Other,
}

// ── Sub-records ─────────────────────────────────────────────────────

/// Case location. Every member is optional but at least one must be
/// present at creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub what3words: Option<String>,
}

impl Location {
    /// True when at least one locating member is populated.
    pub fn has_any(&self) -> bool {
        self.address.as_deref().is_some_and(|s| !s.trim().is_empty())
            || self
                .postcode
                .as_deref()
                .is_some_and(|s| !s.trim().is_empty())
            || self.latitude.is_some()
            || self.longitude.is_some()
            || self
                .what3words
                .as_deref()
                .is_some_and(|s| !s.trim().is_empty())
    }
}

/// A previous location of a case, kept when the pin is moved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LocationHistoryEntry {
    pub location: Location,
    pub changed_by: Uuid,
    pub changed_by_name: String,
    pub changed_at: DateTime<Utc>,
}

/// Fixed Penalty Notice sub-record tracked per case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FpnDetails {
    /// External paper-based reference number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fpn_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_issued: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fpn_amount: Option<f64>,
    #[serde(default)]
    pub paid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_paid: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pay_reference: Option<String>,
}

// ── Case aggregate ──────────────────────────────────────────────────

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// The case aggregate: core attributes, location, type-specific fields,
/// FPN sub-record, and closure data. Mutated only through the workflow
/// engine and fields merger; persisted as a single document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Case {
    pub id: Uuid,
    pub reference_number: String,
    pub case_type: CaseType,
    pub status: CaseStatus,
    pub description: String,
    pub location: Location,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub location_history: Vec<LocationHistoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporter_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporter_contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to_name: Option<String>,
    /// Open map keyed by canonical family name; each value is validated
    /// against that family's schema. Keys for other families are never
    /// touched when one family is edited.
    #[serde(default = "empty_object")]
    pub type_specific_fields: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fpn_details: Option<FpnDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closure_reason: Option<ClosureReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_note: Option<String>,
    pub reporting_source: ReportingSource,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_by: Option<Uuid>,
    /// Optimistic-concurrency token; bumped by the store on every commit.
    #[serde(default)]
    pub version: i64,
}

impl Case {
    /// Data-quality problems in stored data, e.g. a legacy closed case
    /// missing its closure reason. Flagged for the caller, never repaired.
    pub fn integrity_flags(&self) -> Vec<String> {
        let mut flags = Vec::new();

        if self.status == CaseStatus::Closed {
            if self.closure_reason.is_none() {
                flags.push("closed case has no closure_reason".to_string());
            }
            if self.final_note.as_deref().map_or(true, |n| n.trim().is_empty()) {
                flags.push("closed case has no final_note".to_string());
            }
            if self.closed_at.is_none() {
                flags.push("closed case has no closed_at timestamp".to_string());
            }
        } else if self.closed_at.is_some() {
            flags.push(format!(
                "closed_at is set but status is '{}'",
                self.status.as_str()
            ));
        }

        if self.status == CaseStatus::Assigned && self.assigned_to.is_none() {
            flags.push("status is 'assigned' but no assignee is recorded".to_string());
        }

        if let Some(obj) = self.type_specific_fields.as_object() {
            for key in obj.keys() {
                if CaseFamily::resolve(key).is_none() {
                    flags.push(format!("unknown type_specific_fields key '{}'", key));
                }
            }
        } else if !self.type_specific_fields.is_null() {
            flags.push("type_specific_fields is not a JSON object".to_string());
        }

        flags
    }
}

/// Format a reference number: `<PREFIX>-<yy>-<NNNNN>`.
pub fn format_reference(case_type: CaseType, now: DateTime<Utc>, sequence: u64) -> String {
    format!(
        "{}-{}-{:05}",
        case_type.reference_prefix(),
        now.format("%y"),
        sequence
    )
}

// ── Request / response types ────────────────────────────────────────

/// Request to create a new case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateCaseRequest {
    pub case_type: CaseType,
    pub description: String,
    pub location: Location,
    #[serde(default)]
    pub reporter_name: Option<String>,
    #[serde(default)]
    pub reporter_contact: Option<String>,
    /// Initial field patch for the case's own family, if any.
    #[serde(default)]
    pub type_specific_fields: Option<Value>,
    #[serde(default)]
    pub reporting_source: Option<ReportingSource>,
}

/// Request to update a case through the workflow engine. All members
/// optional; only provided parts are applied, and they commit together
/// or not at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CaseUpdateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CaseStatus>,
    /// Assignee user id, or the literal `"unassigned"` to clear.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Partial field patch for the case's own family (not keyed by
    /// family name; the server resolves the canonical key).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_specific_fields: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closure_reason: Option<ClosureReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_note: Option<String>,
}

/// Query parameters for the case list.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct CaseListParams {
    pub status: Option<CaseStatus>,
    pub case_type: Option<CaseType>,
    pub assigned_to: Option<Uuid>,
    pub unassigned: Option<bool>,
}

/// A case view including stored data-quality flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CaseDetailResponse {
    #[serde(flatten)]
    pub case: Case,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub integrity_flags: Vec<String>,
    /// Evidence items attached to the case.
    #[serde(default)]
    pub evidence_count: u64,
}

/// A prior case surfaced by the duplicate-VRM check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DuplicateCase {
    pub id: Uuid,
    pub reference_number: String,
    pub status: CaseStatus,
    pub created_at: DateTime<Utc>,
    pub location: Location,
}

/// Response for the duplicate-VRM check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DuplicateCheckResponse {
    pub duplicates: Vec<DuplicateCase>,
}

/// Request to submit a report from the public site (unauthenticated).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PublicReportRequest {
    pub case_type: CaseType,
    pub description: String,
    pub location: Location,
    #[serde(default)]
    pub reporter_name: Option<String>,
    #[serde(default)]
    pub reporter_contact: Option<String>,
    #[serde(default)]
    pub type_specific_fields: Option<Value>,
}

/// Acknowledgement returned for a public report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PublicReportResponse {
    pub message: String,
    pub reference_number: String,
}
