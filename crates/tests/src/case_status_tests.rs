use axum::http::StatusCode;
use serde_json::json;

use crate::common;

#[tokio::test]
async fn close_requires_reason_and_note_together() {
    let test = common::test_app();
    let (_, sup_token) = common::supervisor(&test);
    let case = common::create_case(&test.app, &sup_token, "littering", common::valid_fields("littering")).await;
    let id = case["id"].as_str().unwrap();
    let uri = format!("/api/cases/{id}");

    // reason without note
    let (status, response) = common::patch_json(
        &test.app,
        &uri,
        Some(&sup_token),
        &json!({ "status": "closed", "closure_reason": "no_action_required" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{response}");
    assert_eq!(response["kind"], "MissingClosureData");
    assert!(response["field_errors"]["final_note"].is_string());

    // note without reason
    let (status, response) = common::patch_json(
        &test.app,
        &uri,
        Some(&sup_token),
        &json!({ "status": "closed", "final_note": "nothing found on visit" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{response}");
    assert!(response["field_errors"]["closure_reason"].is_string());

    // failed close leaves the stored case open and unbumped
    let (_, detail) = common::get(&test.app, &uri, Some(&sup_token)).await;
    assert_eq!(detail["status"], "new");
    assert_eq!(detail["version"], 1);
    assert!(detail["closed_at"].is_null());

    // both parts together succeed
    let (status, closed) = common::patch_json(
        &test.app,
        &uri,
        Some(&sup_token),
        &json!({
            "status": "closed",
            "closure_reason": "no_action_required",
            "final_note": "site visit found no litter remaining"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{closed}");
    assert_eq!(closed["status"], "closed");
    assert_eq!(closed["closure_reason"], "no_action_required");
    assert!(closed["closed_at"].is_string());
}

#[tokio::test]
async fn officers_cannot_close_their_own_cases() {
    let test = common::test_app();
    let (officer, officer_token) = common::officer(&test);
    let (_, sup_token) = common::supervisor(&test);

    let case = common::create_case(&test.app, &sup_token, "dog_fouling", common::valid_fields("dog_fouling")).await;
    let id = case["id"].as_str().unwrap();

    let (status, _) = common::patch_json(
        &test.app,
        &format!("/api/cases/{id}"),
        Some(&sup_token),
        &json!({ "assigned_to": officer.id.to_string() }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, response) = common::patch_json(
        &test.app,
        &format!("/api/cases/{id}"),
        Some(&officer_token),
        &json!({
            "status": "closed",
            "closure_reason": "resolved",
            "final_note": "sorted"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{response}");
}

#[tokio::test]
async fn assigned_officer_can_start_investigating() {
    let test = common::test_app();
    let (officer, officer_token) = common::officer(&test);
    let (_, sup_token) = common::supervisor(&test);

    let case = common::create_case(&test.app, &sup_token, "untidy_land", json!({})).await;
    let id = case["id"].as_str().unwrap();
    common::patch_json(
        &test.app,
        &format!("/api/cases/{id}"),
        Some(&sup_token),
        &json!({ "assigned_to": officer.id.to_string() }),
    )
    .await;

    let (status, updated) = common::patch_json(
        &test.app,
        &format!("/api/cases/{id}"),
        Some(&officer_token),
        &json!({ "status": "investigating" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["status"], "investigating");
}

#[tokio::test]
async fn closed_cases_reject_edits_until_reopened() {
    let test = common::test_app();
    let (_, officer_token) = common::officer(&test);
    let (_, sup_token) = common::supervisor(&test);

    let case = common::create_case(&test.app, &sup_token, "high_hedges", json!({})).await;
    let id = case["id"].as_str().unwrap();
    let uri = format!("/api/cases/{id}");

    let (status, _) = common::patch_json(
        &test.app,
        &uri,
        Some(&sup_token),
        &json!({
            "status": "closed",
            "closure_reason": "transferred",
            "final_note": "passed to planning"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, response) = common::patch_json(
        &test.app,
        &uri,
        Some(&sup_token),
        &json!({ "description": "new text" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{response}");
    assert_eq!(response["kind"], "InvalidTransition");

    // officers cannot reopen
    let (status, _) = common::post_empty(
        &test.app,
        &format!("/api/cases/{id}/reopen"),
        Some(&officer_token),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // supervisors can; the closure record survives for audit
    let (status, reopened) = common::post_empty(
        &test.app,
        &format!("/api/cases/{id}/reopen"),
        Some(&sup_token),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{reopened}");
    assert_eq!(reopened["status"], "investigating");
    assert!(reopened["closed_at"].is_null());
    assert_eq!(reopened["closure_reason"], "transferred");
    assert_eq!(reopened["final_note"], "passed to planning");

    // and the case is editable again
    let (status, _) = common::patch_json(
        &test.app,
        &uri,
        Some(&sup_token),
        &json!({ "description": "re-examined after planning bounced it back" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn reopening_an_open_case_is_rejected() {
    let test = common::test_app();
    let (_, sup_token) = common::supervisor(&test);
    let case = common::create_case(&test.app, &sup_token, "littering", common::valid_fields("littering")).await;

    let (status, response) = common::post_empty(
        &test.app,
        &format!("/api/cases/{}/reopen", case["id"].as_str().unwrap()),
        Some(&sup_token),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{response}");
}
