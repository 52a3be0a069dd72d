use axum::http::StatusCode;
use serde_json::json;

use crate::common;

#[tokio::test]
async fn public_report_creates_a_case_without_auth() {
    let test = common::test_app();
    let (supervisor, sup_token) = common::supervisor(&test);
    let (manager, _) = common::manager(&test);
    let (officer, _) = common::officer(&test);

    let (status, response) = common::post_json(
        &test.app,
        "/api/public/report",
        None,
        &json!({
            "case_type": "fly_tipping",
            "description": "pile of rubbish bags on the verge",
            "location": { "postcode": "B4 7DA" },
            "reporter_name": "A Resident",
            "reporter_contact": "resident@example.com"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{response}");
    let reference = response["reference_number"].as_str().unwrap();
    assert!(reference.starts_with("FT-"));
    assert!(response["message"].as_str().unwrap().contains(reference));

    // the case landed, marked as a public report
    let (_, list) = common::get(&test.app, "/api/cases", Some(&sup_token)).await;
    let case = &list.as_array().unwrap()[0];
    assert_eq!(case["reporting_source"], "public");
    assert_eq!(case["reference_number"], reference);
    assert!(case["created_by"].is_null());

    // supervisors and managers are notified, officers are not
    let sent = test.notifications.sent();
    assert!(sent.iter().any(|n| n.user_id == supervisor.id));
    assert!(sent.iter().any(|n| n.user_id == manager.id));
    assert!(!sent.iter().any(|n| n.user_id == officer.id));
}

#[tokio::test]
async fn public_reports_skip_required_field_gaps() {
    let test = common::test_app();
    let (_, sup_token) = common::supervisor(&test);

    // no litter_type, no offence_witnessed; fine from the public
    let (status, response) = common::post_json(
        &test.app,
        "/api/public/report",
        None,
        &json!({
            "case_type": "littering",
            "description": "litter all over the park entrance",
            "location": { "address": "Victoria Park, north gate" }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{response}");

    // but values that are provided must still be valid
    let (status, response) = common::post_json(
        &test.app,
        "/api/public/report",
        None,
        &json!({
            "case_type": "littering",
            "description": "more litter",
            "location": { "address": "Victoria Park" },
            "type_specific_fields": { "litter_type": "confetti" }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{response}");
    assert!(response["field_errors"]["litter_type"].is_string());

    // the officer picking the gap-filled case up sees it needs data
    let (_, list) = common::get(&test.app, "/api/cases", Some(&sup_token)).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn public_report_requires_a_location() {
    let test = common::test_app();
    let (status, _) = common::post_json(
        &test.app,
        "/api/public/report",
        None,
        &json!({
            "case_type": "fly_tipping",
            "description": "rubbish somewhere",
            "location": {}
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
