//! Per-family field schema registry.
//!
//! Every case type belongs to exactly one schema *family*; families are
//! the storage keys inside `type_specific_fields` and the unit of
//! validation. Schemas are declarative `&'static` tables so that the
//! validator, the merger, and the UI all read from one source of truth.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::case::CaseType;
use crate::models::TeamType;

// ── Families ────────────────────────────────────────────────────────

/// Closed set of schema/storage families. Several case types can share
/// a family (the fly-tipping and nuisance-vehicle variant sets).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum CaseFamily {
    FlyTipping,
    AbandonedVehicle,
    Littering,
    DogFouling,
    PspoDogControl,
    UntidyLand,
    HighHedges,
    WasteCarrier,
    NuisanceVehicle,
    ComplexEnvironmental,
}

impl CaseFamily {
    pub const ALL: &'static [CaseFamily] = &[
        CaseFamily::FlyTipping,
        CaseFamily::AbandonedVehicle,
        CaseFamily::Littering,
        CaseFamily::DogFouling,
        CaseFamily::PspoDogControl,
        CaseFamily::UntidyLand,
        CaseFamily::HighHedges,
        CaseFamily::WasteCarrier,
        CaseFamily::NuisanceVehicle,
        CaseFamily::ComplexEnvironmental,
    ];

    /// Canonical key used inside `type_specific_fields`.
    pub fn canonical_key(&self) -> &'static str {
        match self {
            CaseFamily::FlyTipping => "fly_tipping",
            CaseFamily::AbandonedVehicle => "abandoned_vehicle",
            CaseFamily::Littering => "littering",
            CaseFamily::DogFouling => "dog_fouling",
            CaseFamily::PspoDogControl => "pspo_dog_control",
            CaseFamily::UntidyLand => "untidy_land",
            CaseFamily::HighHedges => "high_hedges",
            CaseFamily::WasteCarrier => "waste_carrier",
            CaseFamily::NuisanceVehicle => "nuisance_vehicle",
            CaseFamily::ComplexEnvironmental => "complex_environmental",
        }
    }

    pub fn for_case_type(case_type: CaseType) -> CaseFamily {
        match case_type {
            CaseType::FlyTipping
            | CaseType::FlyTippingPrivate
            | CaseType::FlyTippingOrganised => CaseFamily::FlyTipping,
            CaseType::AbandonedVehicle => CaseFamily::AbandonedVehicle,
            CaseType::Littering => CaseFamily::Littering,
            CaseType::DogFouling => CaseFamily::DogFouling,
            CaseType::PspoDogControl => CaseFamily::PspoDogControl,
            CaseType::UntidyLand => CaseFamily::UntidyLand,
            CaseType::HighHedges => CaseFamily::HighHedges,
            CaseType::WasteCarrierLicensing => CaseFamily::WasteCarrier,
            CaseType::NuisanceVehicle | CaseType::NuisanceVehicleSeller => {
                CaseFamily::NuisanceVehicle
            }
            CaseType::ComplexEnvironmental => CaseFamily::ComplexEnvironmental,
        }
    }

    /// Resolve a storage key or case-type name to its family. Accepts
    /// both canonical keys and variant case-type names, since legacy
    /// documents may carry either.
    pub fn resolve(key: &str) -> Option<CaseFamily> {
        if let Some(f) = Self::ALL.iter().copied().find(|f| f.canonical_key() == key) {
            return Some(f);
        }
        CaseType::parse(key).map(CaseFamily::for_case_type)
    }

    pub fn field_specs(&self) -> &'static [FieldSpec] {
        match self {
            CaseFamily::FlyTipping => FLY_TIPPING_FIELDS,
            CaseFamily::AbandonedVehicle => ABANDONED_VEHICLE_FIELDS,
            CaseFamily::Littering => LITTERING_FIELDS,
            CaseFamily::DogFouling => DOG_FOULING_FIELDS,
            CaseFamily::PspoDogControl => PSPO_DOG_CONTROL_FIELDS,
            CaseFamily::UntidyLand => UNTIDY_LAND_FIELDS,
            CaseFamily::HighHedges => HIGH_HEDGES_FIELDS,
            CaseFamily::WasteCarrier => WASTE_CARRIER_FIELDS,
            CaseFamily::NuisanceVehicle => NUISANCE_VEHICLE_FIELDS,
            CaseFamily::ComplexEnvironmental => COMPLEX_ENVIRONMENTAL_FIELDS,
        }
    }

    /// True for families whose subject is a vehicle registration mark.
    pub fn carries_vrm(&self) -> bool {
        matches!(
            self,
            CaseFamily::AbandonedVehicle | CaseFamily::NuisanceVehicle
        )
    }
}

// ── Field specs ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Text,
    Bool,
    Number,
    Date,
    DateTime,
    Enum(&'static [&'static str]),
    Object(&'static [FieldSpec]),
}

/// Predicate evaluated against the family's own field document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Condition {
    Always,
    Never,
    WhenTrue(&'static str),
    WhenFalse(&'static str),
    WhenEquals(&'static str, &'static str),
    UnlessTrue(&'static str),
}

impl Condition {
    pub fn eval(&self, doc: &serde_json::Map<String, Value>) -> bool {
        match self {
            Condition::Always => true,
            Condition::Never => false,
            Condition::WhenTrue(field) => doc.get(*field) == Some(&Value::Bool(true)),
            Condition::WhenFalse(field) => doc.get(*field) == Some(&Value::Bool(false)),
            Condition::WhenEquals(field, value) => {
                doc.get(*field).and_then(Value::as_str) == Some(*value)
            }
            Condition::UnlessTrue(field) => doc.get(*field) != Some(&Value::Bool(true)),
        }
    }
}

/// Declarative schema for one field of a family document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: Condition,
    pub visible: Condition,
    /// Uppercase the stored value on merge (registration marks).
    pub uppercase: bool,
    /// Fields blanked when this boolean field is set to true.
    pub clears_on_true: &'static [&'static str],
    /// When set, only members of this team may write the field.
    pub write_team: Option<TeamType>,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        FieldSpec {
            name,
            kind,
            required: Condition::Never,
            visible: Condition::Always,
            uppercase: false,
            clears_on_true: &[],
            write_team: None,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = Condition::Always;
        self
    }

    pub const fn required_if(mut self, cond: Condition) -> Self {
        self.required = cond;
        self
    }

    pub const fn visible_if(mut self, cond: Condition) -> Self {
        self.visible = cond;
        self
    }

    pub const fn uppercase(mut self) -> Self {
        self.uppercase = true;
        self
    }

    pub const fn clears(mut self, fields: &'static [&'static str]) -> Self {
        self.clears_on_true = fields;
        self
    }

    pub const fn write_team(mut self, team: TeamType) -> Self {
        self.write_team = Some(team);
        self
    }
}

pub const YES_NO_UNKNOWN: &[&str] = &["yes", "no", "unknown"];

pub const VEHICLE_DETAILS_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("registration_number", FieldKind::Text).uppercase(),
    FieldSpec::new("make", FieldKind::Text),
    FieldSpec::new("model", FieldKind::Text),
    FieldSpec::new("colour", FieldKind::Text),
];

pub const CLEARANCE_OUTCOME_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("items_cleared", FieldKind::Bool),
    FieldSpec::new("reason_not_cleared", FieldKind::Text)
        .required_if(Condition::WhenFalse("items_cleared")),
    FieldSpec::new("clearance_date", FieldKind::Date),
    FieldSpec::new("disposal_method", FieldKind::Text),
];

pub const FLY_TIPPING_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("waste_description", FieldKind::Text).required(),
    FieldSpec::new("estimated_quantity", FieldKind::Text),
    FieldSpec::new(
        "waste_type",
        FieldKind::Enum(&["household", "commercial", "construction", "mixed", "unknown"]),
    ),
    FieldSpec::new("offender_witnessed", FieldKind::Bool),
    FieldSpec::new("offender_description", FieldKind::Text)
        .visible_if(Condition::WhenTrue("offender_witnessed")),
    FieldSpec::new("vehicle_details", FieldKind::Object(VEHICLE_DETAILS_FIELDS)),
    FieldSpec::new("identifying_evidence", FieldKind::Text),
    FieldSpec::new("no_evidence_available", FieldKind::Bool),
    FieldSpec::new(
        "clearance_outcome",
        FieldKind::Object(CLEARANCE_OUTCOME_FIELDS),
    )
    .write_team(TeamType::WasteManagement),
];

pub const ABANDONED_VEHICLE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("registration_number", FieldKind::Text)
        .uppercase()
        .required_if(Condition::UnlessTrue("registration_not_visible")),
    FieldSpec::new("registration_not_visible", FieldKind::Bool)
        .clears(&["registration_number"]),
    FieldSpec::new("make", FieldKind::Text),
    FieldSpec::new("model", FieldKind::Text),
    FieldSpec::new("colour", FieldKind::Text),
    FieldSpec::new("tax_status", FieldKind::Enum(&["taxed", "untaxed", "unknown"])),
    FieldSpec::new("mot_status", FieldKind::Enum(&["valid", "expired", "unknown"])),
    FieldSpec::new(
        "condition",
        FieldKind::Enum(&["good", "damaged", "vandalised", "burnt_out", "unknown"]),
    )
    .required(),
    FieldSpec::new("estimated_time_at_location", FieldKind::Text).required(),
    FieldSpec::new("causing_obstruction", FieldKind::Bool),
];

pub const LITTERING_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(
        "litter_type",
        FieldKind::Enum(&["cigarette_end", "food_packaging", "general_waste", "other"]),
    )
    .required(),
    FieldSpec::new("offence_witnessed", FieldKind::Bool).required(),
    FieldSpec::new("offender_description", FieldKind::Text)
        .visible_if(Condition::WhenTrue("offence_witnessed")),
    FieldSpec::new("supporting_evidence", FieldKind::Text),
];

pub const DOG_FOULING_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("occurrence_datetime", FieldKind::DateTime).required(),
    FieldSpec::new("repeat_occurrence", FieldKind::Enum(YES_NO_UNKNOWN)),
    FieldSpec::new("offender_description", FieldKind::Text),
    FieldSpec::new("dog_description", FieldKind::Text),
    FieldSpec::new("additional_info", FieldKind::Text),
];

pub const PSPO_DOG_CONTROL_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(
        "breach_nature",
        FieldKind::Enum(&[
            "dogs_off_lead",
            "dog_exclusion_zone",
            "failure_to_pick_up",
            "exceeding_dog_limit",
            "other",
        ]),
    )
    .required(),
    FieldSpec::new("signage_present", FieldKind::Enum(YES_NO_UNKNOWN)).required(),
    FieldSpec::new("location_within_area", FieldKind::Text),
    FieldSpec::new("exemptions_claimed", FieldKind::Text),
    FieldSpec::new("officer_notes", FieldKind::Text),
];

pub const UNTIDY_LAND_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(
        "land_type",
        FieldKind::Enum(&["residential", "commercial", "agricultural", "unknown"]),
    ),
    FieldSpec::new("land_ownership", FieldKind::Text),
    FieldSpec::new("issues_identified", FieldKind::Text),
    FieldSpec::new("previous_notices", FieldKind::Bool),
];

pub const HIGH_HEDGES_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("hedge_type", FieldKind::Text),
    FieldSpec::new("hedge_height_meters", FieldKind::Number),
    FieldSpec::new("affected_property", FieldKind::Text),
    FieldSpec::new("previous_complaints", FieldKind::Bool),
    FieldSpec::new("mediation_attempted", FieldKind::Bool),
];

pub const WASTE_CARRIER_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("business_name", FieldKind::Text).required(),
    FieldSpec::new("carrier_license_number", FieldKind::Text),
    FieldSpec::new(
        "license_status",
        FieldKind::Enum(&["valid", "expired", "revoked", "none", "unknown"]),
    ),
    FieldSpec::new("vehicle_registration", FieldKind::Text).uppercase(),
    FieldSpec::new("breach_details", FieldKind::Text),
];

pub const NUISANCE_VEHICLE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("vehicle_registration", FieldKind::Text)
        .uppercase()
        .required(),
    FieldSpec::new("vehicle_make", FieldKind::Text),
    FieldSpec::new("vehicle_model", FieldKind::Text),
    FieldSpec::new("vehicle_colour", FieldKind::Text),
    FieldSpec::new(
        "nuisance_type",
        FieldKind::Enum(&["parking", "sale", "repair", "on_street_seller", "other"]),
    )
    .required(),
    FieldSpec::new("business_activity", FieldKind::Text)
        .visible_if(Condition::WhenEquals("nuisance_type", "on_street_seller"))
        .required_if(Condition::WhenEquals("nuisance_type", "on_street_seller")),
    FieldSpec::new(
        "location_frequency",
        FieldKind::Enum(&["daily", "weekly", "occasional", "unknown"]),
    ),
    FieldSpec::new("obstruction_caused", FieldKind::Bool),
];

pub const COMPLEX_ENVIRONMENTAL_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("summary", FieldKind::Text),
    FieldSpec::new("agencies_involved", FieldKind::Text),
    FieldSpec::new("legal_powers", FieldKind::Text),
];

// ── Team routing ────────────────────────────────────────────────────

/// Teams allowed to work cases of the given type.
pub fn allowed_teams(case_type: CaseType) -> &'static [TeamType] {
    match case_type {
        CaseType::FlyTipping | CaseType::FlyTippingPrivate => {
            &[TeamType::Enforcement, TeamType::WasteManagement]
        }
        CaseType::FlyTippingOrganised => {
            &[TeamType::EnvironmentalCrimes, TeamType::Enforcement]
        }
        CaseType::WasteCarrierLicensing => {
            &[TeamType::EnvironmentalCrimes, TeamType::WasteManagement]
        }
        CaseType::ComplexEnvironmental => &[TeamType::EnvironmentalCrimes],
        _ => &[TeamType::Enforcement],
    }
}

// ── Validation ──────────────────────────────────────────────────────

/// A single validation problem, addressed by dotted field path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldViolation {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        _ => false,
    }
}

/// Validate a family document against its schema, collecting every
/// violation rather than stopping at the first. Unknown keys are
/// tolerated (legacy free-text data).
pub fn validate(family: CaseFamily, doc: &Value) -> Vec<FieldViolation> {
    let mut violations = Vec::new();
    let Some(obj) = doc.as_object() else {
        violations.push(FieldViolation::new(
            family.canonical_key(),
            "expected a JSON object",
        ));
        return violations;
    };
    validate_specs(family.field_specs(), obj, "", &mut violations);
    violations
}

fn validate_specs(
    specs: &[FieldSpec],
    obj: &serde_json::Map<String, Value>,
    prefix: &str,
    out: &mut Vec<FieldViolation>,
) {
    for spec in specs {
        let path = if prefix.is_empty() {
            spec.name.to_string()
        } else {
            format!("{}.{}", prefix, spec.name)
        };
        let value = obj.get(spec.name);

        // Required booleans must be explicitly present; `false` satisfies.
        if spec.visible.eval(obj) && spec.required.eval(obj) && is_blank(value) {
            out.push(FieldViolation::new(&path, "this field is required"));
            continue;
        }

        let Some(value) = value else { continue };
        if value.is_null() {
            continue;
        }

        match spec.kind {
            FieldKind::Text | FieldKind::Date | FieldKind::DateTime => {
                if !value.is_string() {
                    out.push(FieldViolation::new(&path, "expected a string"));
                }
            }
            FieldKind::Bool => {
                if !value.is_boolean() {
                    out.push(FieldViolation::new(&path, "expected a boolean"));
                }
            }
            FieldKind::Number => {
                if !value.is_number() {
                    out.push(FieldViolation::new(&path, "expected a number"));
                }
            }
            FieldKind::Enum(allowed) => match value.as_str() {
                Some("") => {}
                Some(s) if allowed.contains(&s) => {}
                Some(s) => out.push(FieldViolation::new(
                    &path,
                    format!("'{}' is not one of {}", s, allowed.join(", ")),
                )),
                None => out.push(FieldViolation::new(&path, "expected a string")),
            },
            FieldKind::Object(sub_specs) => match value.as_object() {
                Some(sub) => validate_specs(sub_specs, sub, &path, out),
                None => out.push(FieldViolation::new(&path, "expected an object")),
            },
        }
    }
}
