use axum::http::StatusCode;
use serde_json::json;

use crate::common;

#[tokio::test]
async fn duplicate_check_matches_regardless_of_spacing_and_case() {
    let test = common::test_app();
    let (_, token) = common::officer(&test);

    let prior = common::create_case(
        &test.app,
        &token,
        "abandoned_vehicle",
        json!({
            "registration_number": "AB12 CDE",
            "condition": "damaged",
            "estimated_time_at_location": "a fortnight"
        }),
    )
    .await;

    let (status, response) = common::get(
        &test.app,
        "/api/cases/check-duplicate-vrm?vrm=ab12cde&case_type=abandoned_vehicle",
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{response}");
    let duplicates = response["duplicates"].as_array().unwrap();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0]["reference_number"], prior["reference_number"]);
    assert_eq!(duplicates[0]["status"], "new");
    assert!(duplicates[0]["location"].is_object());
}

#[tokio::test]
async fn duplicate_check_spans_vehicle_families() {
    let test = common::test_app();
    let (_, token) = common::officer(&test);

    common::create_case(
        &test.app,
        &token,
        "abandoned_vehicle",
        json!({
            "registration_number": "ZZ99 YYY",
            "condition": "good",
            "estimated_time_at_location": "a week"
        }),
    )
    .await;

    // the same plate reported as a nuisance seller surfaces the AV case
    let (status, response) = common::get(
        &test.app,
        "/api/cases/check-duplicate-vrm?vrm=zz99yyy&case_type=nuisance_vehicle_seller",
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["duplicates"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_check_excludes_the_case_being_edited() {
    let test = common::test_app();
    let (_, token) = common::officer(&test);

    let case = common::create_case(
        &test.app,
        &token,
        "nuisance_vehicle",
        json!({ "vehicle_registration": "NV63 XYZ", "nuisance_type": "repair" }),
    )
    .await;

    let (status, response) = common::get(
        &test.app,
        &format!(
            "/api/cases/check-duplicate-vrm?vrm=NV63XYZ&case_type=nuisance_vehicle&exclude={}",
            case["id"].as_str().unwrap()
        ),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(response["duplicates"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn non_vehicle_case_types_return_empty_without_matching() {
    let test = common::test_app();
    let (_, token) = common::officer(&test);

    common::create_case(
        &test.app,
        &token,
        "abandoned_vehicle",
        json!({
            "registration_number": "AB12 CDE",
            "condition": "damaged",
            "estimated_time_at_location": "days"
        }),
    )
    .await;

    let (status, response) = common::get(
        &test.app,
        "/api/cases/check-duplicate-vrm?vrm=AB12CDE&case_type=fly_tipping",
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(response["duplicates"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn newest_duplicate_comes_first() {
    let test = common::test_app();
    let (_, token) = common::officer(&test);

    let fields = json!({
        "registration_number": "AB12 CDE",
        "condition": "unknown",
        "estimated_time_at_location": "unknown"
    });
    let older = common::create_case(&test.app, &token, "abandoned_vehicle", fields.clone()).await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let newer = common::create_case(&test.app, &token, "abandoned_vehicle", fields).await;

    let (_, response) = common::get(
        &test.app,
        "/api/cases/check-duplicate-vrm?vrm=AB12CDE&case_type=abandoned_vehicle",
        Some(&token),
    )
    .await;
    let duplicates = response["duplicates"].as_array().unwrap();
    assert_eq!(duplicates.len(), 2);
    assert_eq!(duplicates[0]["reference_number"], newer["reference_number"]);
    assert_eq!(duplicates[1]["reference_number"], older["reference_number"]);
}
