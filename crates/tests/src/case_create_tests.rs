use axum::http::StatusCode;
use serde_json::json;

use crate::common;

#[tokio::test]
async fn create_fly_tipping_case() {
    let test = common::test_app();
    let (officer, token) = common::officer(&test);

    let body = json!({
        "case_type": "fly_tipping",
        "description": "mattresses dumped behind the shops",
        "location": { "address": "rear of 4 Market Parade", "postcode": "B1 2AA" },
        "type_specific_fields": {
            "waste_description": "two mattresses and rubble",
            "waste_type": "household"
        }
    });
    let (status, response) = common::post_json(&test.app, "/api/cases", Some(&token), &body).await;

    assert_eq!(status, StatusCode::CREATED, "{response}");
    assert!(response["reference_number"]
        .as_str()
        .unwrap()
        .starts_with("FT-"));
    assert_eq!(response["status"], "new");
    assert_eq!(response["version"], 1);
    assert_eq!(response["created_by"], json!(officer.id.to_string()));
    assert_eq!(
        response["type_specific_fields"]["fly_tipping"]["waste_type"],
        "household"
    );
}

#[tokio::test]
async fn reference_numbers_are_sequential_per_prefix() {
    let test = common::test_app();
    let (_, token) = common::officer(&test);

    let first = common::create_case(
        &test.app,
        &token,
        "abandoned_vehicle",
        common::valid_fields("abandoned_vehicle"),
    )
    .await;
    let second = common::create_case(
        &test.app,
        &token,
        "abandoned_vehicle",
        common::valid_fields("abandoned_vehicle"),
    )
    .await;

    let first_ref = first["reference_number"].as_str().unwrap();
    let second_ref = second["reference_number"].as_str().unwrap();
    assert!(first_ref.starts_with("AV-"));
    assert!(first_ref.ends_with("00001"));
    assert!(second_ref.ends_with("00002"));
}

#[tokio::test]
async fn littering_case_collects_all_missing_fields() {
    let test = common::test_app();
    let (_, token) = common::officer(&test);

    let body = json!({
        "case_type": "littering",
        "description": "litter outside the school",
        "location": { "address": "School Lane" },
        "type_specific_fields": {}
    });
    let (status, response) = common::post_json(&test.app, "/api/cases", Some(&token), &body).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{response}");
    assert_eq!(response["kind"], "ValidationError");
    assert!(response["field_errors"]["litter_type"].is_string());
    assert!(response["field_errors"]["offence_witnessed"].is_string());
}

#[tokio::test]
async fn explicit_false_witness_answer_is_accepted() {
    let test = common::test_app();
    let (_, token) = common::officer(&test);

    let response = common::create_case(
        &test.app,
        &token,
        "littering",
        json!({ "litter_type": "cigarette_end", "offence_witnessed": false }),
    )
    .await;
    assert_eq!(
        response["type_specific_fields"]["littering"]["offence_witnessed"],
        json!(false)
    );
}

#[tokio::test]
async fn registration_is_normalized_to_uppercase_on_create() {
    let test = common::test_app();
    let (_, token) = common::officer(&test);

    let response = common::create_case(
        &test.app,
        &token,
        "abandoned_vehicle",
        json!({
            "registration_number": "ab12 cde",
            "condition": "burnt_out",
            "estimated_time_at_location": "a month"
        }),
    )
    .await;
    assert_eq!(
        response["type_specific_fields"]["abandoned_vehicle"]["registration_number"],
        "AB12 CDE"
    );
}

#[tokio::test]
async fn case_without_location_is_rejected() {
    let test = common::test_app();
    let (_, token) = common::officer(&test);

    let body = json!({
        "case_type": "dog_fouling",
        "description": "dog fouling on the green",
        "location": {},
        "type_specific_fields": common::valid_fields("dog_fouling")
    });
    let (status, response) = common::post_json(&test.app, "/api/cases", Some(&token), &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{response}");
}

#[tokio::test]
async fn unauthenticated_create_is_rejected() {
    let test = common::test_app();
    let body = json!({
        "case_type": "littering",
        "description": "x",
        "location": { "address": "y" }
    });
    let (status, _) = common::post_json(&test.app, "/api/cases", None, &body).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
