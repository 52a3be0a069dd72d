use axum::http::StatusCode;
use chrono::Utc;
use pretty_assertions::assert_eq;
use serde_json::json;
use uuid::Uuid;

use shared_types::{Case, CaseStatus, CaseType, Location, ReportingSource};

use crate::common;

/// Seed a case straight into the store, bypassing creation
/// checks; this is how legacy documents with data from a previous case type
/// get into the system.
async fn seed_case(test: &common::TestApp, case_type: CaseType, fields: serde_json::Value) -> Case {
    let now = Utc::now();
    let case = Case {
        id: Uuid::new_v4(),
        reference_number: format!("{}-26-90001", case_type.reference_prefix()),
        case_type,
        status: CaseStatus::New,
        description: "seeded case".to_string(),
        location: Location {
            address: Some("7 Canal Street".to_string()),
            ..Default::default()
        },
        location_history: Vec::new(),
        reporter_name: None,
        reporter_contact: None,
        assigned_to: None,
        assigned_to_name: None,
        type_specific_fields: fields,
        fpn_details: None,
        closure_reason: None,
        final_note: None,
        reporting_source: ReportingSource::Officer,
        created_at: now,
        updated_at: now,
        closed_at: None,
        created_by: None,
        closed_by: None,
        version: 1,
    };
    test.state.cases.create(case).await.expect("seed failed")
}

#[tokio::test]
async fn editing_one_family_preserves_sibling_family_data() {
    let test = common::test_app();
    let (_, token) = common::supervisor(&test);

    // a case that used to be littering before its type was corrected
    let case = seed_case(
        &test,
        CaseType::FlyTipping,
        json!({
            "littering": { "litter_type": "other", "offence_witnessed": true },
            "fly_tipping": { "waste_description": "black bags" }
        }),
    )
    .await;

    let (status, updated) = common::patch_json(
        &test.app,
        &format!("/api/cases/{}", case.id),
        Some(&token),
        &json!({ "type_specific_fields": { "waste_type": "commercial" } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(
        updated["type_specific_fields"]["littering"],
        json!({ "litter_type": "other", "offence_witnessed": true })
    );
    assert_eq!(
        updated["type_specific_fields"]["fly_tipping"]["waste_description"],
        "black bags"
    );
    assert_eq!(
        updated["type_specific_fields"]["fly_tipping"]["waste_type"],
        "commercial"
    );
}

#[tokio::test]
async fn vehicle_details_merge_one_level_deep() {
    let test = common::test_app();
    let (_, token) = common::supervisor(&test);

    let case = seed_case(
        &test,
        CaseType::FlyTipping,
        json!({
            "fly_tipping": {
                "waste_description": "rubble",
                "vehicle_details": { "make": "Ford", "colour": "white" }
            }
        }),
    )
    .await;

    let (status, updated) = common::patch_json(
        &test.app,
        &format!("/api/cases/{}", case.id),
        Some(&token),
        &json!({
            "type_specific_fields": {
                "vehicle_details": { "registration_number": "fd21 abc" }
            }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    let details = &updated["type_specific_fields"]["fly_tipping"]["vehicle_details"];
    assert_eq!(details["make"], "Ford");
    assert_eq!(details["colour"], "white");
    assert_eq!(details["registration_number"], "FD21 ABC");
}

#[tokio::test]
async fn marking_registration_not_visible_clears_the_plate() {
    let test = common::test_app();
    let (_, token) = common::supervisor(&test);

    let case = seed_case(
        &test,
        CaseType::AbandonedVehicle,
        json!({
            "abandoned_vehicle": {
                "registration_number": "AB12CDE",
                "condition": "damaged",
                "estimated_time_at_location": "two weeks"
            }
        }),
    )
    .await;

    let (status, updated) = common::patch_json(
        &test.app,
        &format!("/api/cases/{}", case.id),
        Some(&token),
        &json!({ "type_specific_fields": { "registration_not_visible": true } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(
        updated["type_specific_fields"]["abandoned_vehicle"]["registration_number"],
        ""
    );
}

#[tokio::test]
async fn invalid_enum_value_is_rejected_with_field_error() {
    let test = common::test_app();
    let (_, token) = common::supervisor(&test);
    let case = seed_case(
        &test,
        CaseType::AbandonedVehicle,
        json!({
            "abandoned_vehicle": {
                "registration_number": "AB12CDE",
                "condition": "damaged",
                "estimated_time_at_location": "two weeks"
            }
        }),
    )
    .await;

    let (status, response) = common::patch_json(
        &test.app,
        &format!("/api/cases/{}", case.id),
        Some(&token),
        &json!({ "type_specific_fields": { "condition": "pristine" } }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{response}");
    assert!(response["field_errors"]["condition"].is_string());

    // the stored case is untouched
    let (_, detail) = common::get(
        &test.app,
        &format!("/api/cases/{}", case.id),
        Some(&token),
    )
    .await;
    assert_eq!(
        detail["type_specific_fields"]["abandoned_vehicle"]["condition"],
        "damaged"
    );
    assert_eq!(detail["version"], 1);
}

#[tokio::test]
async fn clearance_outcome_is_gated_to_waste_management() {
    let test = common::test_app();
    let (_, enforcement_token) = common::supervisor(&test);
    let (_, waste_token) = common::seed_user(
        &test,
        "Mel Brook",
        shared_types::UserRole::Supervisor,
        &[shared_types::TeamType::WasteManagement],
    );

    let case = seed_case(
        &test,
        CaseType::FlyTipping,
        json!({ "fly_tipping": { "waste_description": "sofa" } }),
    )
    .await;
    let patch = json!({
        "type_specific_fields": {
            "clearance_outcome": { "items_cleared": false, "reason_not_cleared": "van access" }
        }
    });

    let (status, response) = common::patch_json(
        &test.app,
        &format!("/api/cases/{}", case.id),
        Some(&enforcement_token),
        &patch,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{response}");

    let (status, updated) = common::patch_json(
        &test.app,
        &format!("/api/cases/{}", case.id),
        Some(&waste_token),
        &patch,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(
        updated["type_specific_fields"]["fly_tipping"]["clearance_outcome"]["reason_not_cleared"],
        "van access"
    );
}

#[tokio::test]
async fn case_detail_reports_evidence_count() {
    let test = common::test_app();
    let (_, token) = common::supervisor(&test);
    let case = seed_case(
        &test,
        CaseType::FlyTipping,
        json!({ "fly_tipping": { "waste_description": "sofa" } }),
    )
    .await;
    test.evidence.set_count(case.id, 3);

    let (status, detail) = common::get(
        &test.app,
        &format!("/api/cases/{}", case.id),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["evidence_count"], 3);
}

#[tokio::test]
async fn legacy_unknown_family_key_is_flagged_not_repaired() {
    let test = common::test_app();
    let (_, token) = common::supervisor(&test);
    let case = seed_case(
        &test,
        CaseType::UntidyLand,
        json!({ "graffiti": { "surface": "wall" } }),
    )
    .await;

    let (status, detail) = common::get(
        &test.app,
        &format!("/api/cases/{}", case.id),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let flags = detail["integrity_flags"].as_array().unwrap();
    assert!(flags.iter().any(|f| f.as_str().unwrap().contains("graffiti")));
    // the stored document still carries the unknown key
    assert_eq!(detail["type_specific_fields"]["graffiti"]["surface"], "wall");
}
