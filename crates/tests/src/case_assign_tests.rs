use axum::http::StatusCode;
use serde_json::json;

use crate::common;

#[tokio::test]
async fn supervisor_assignment_moves_new_case_to_assigned() {
    let test = common::test_app();
    let (officer, _) = common::officer(&test);
    let (_, sup_token) = common::supervisor(&test);

    let case = common::create_case(&test.app, &sup_token, "fly_tipping", common::valid_fields("fly_tipping")).await;
    let id = case["id"].as_str().unwrap();

    let (status, updated) = common::patch_json(
        &test.app,
        &format!("/api/cases/{id}"),
        Some(&sup_token),
        &json!({ "assigned_to": officer.id.to_string() }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["status"], "assigned");
    assert_eq!(updated["assigned_to"], json!(officer.id.to_string()));
    assert_eq!(updated["assigned_to_name"], "Jo Field");

    // the assignee hears about it
    let sent = test.notifications.sent();
    assert!(sent.iter().any(|n| n.user_id == officer.id));
}

#[tokio::test]
async fn officers_cannot_assign_cases() {
    let test = common::test_app();
    let (officer, officer_token) = common::officer(&test);
    let (_, sup_token) = common::supervisor(&test);

    let case = common::create_case(&test.app, &sup_token, "littering", common::valid_fields("littering")).await;
    let (status, response) = common::patch_json(
        &test.app,
        &format!("/api/cases/{}", case["id"].as_str().unwrap()),
        Some(&officer_token),
        &json!({ "assigned_to": officer.id.to_string() }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{response}");
}

#[tokio::test]
async fn unassigned_sentinel_clears_the_assignment() {
    let test = common::test_app();
    let (officer, _) = common::officer(&test);
    let (_, sup_token) = common::supervisor(&test);

    let case = common::create_case(&test.app, &sup_token, "littering", common::valid_fields("littering")).await;
    let uri = format!("/api/cases/{}", case["id"].as_str().unwrap());

    common::patch_json(
        &test.app,
        &uri,
        Some(&sup_token),
        &json!({ "assigned_to": officer.id.to_string() }),
    )
    .await;
    let (status, updated) = common::patch_json(
        &test.app,
        &uri,
        Some(&sup_token),
        &json!({ "assigned_to": "unassigned" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert!(updated["assigned_to"].is_null());
    assert_eq!(updated["status"], "new");
}

#[tokio::test]
async fn self_assign_claims_an_unassigned_case() {
    let test = common::test_app();
    let (officer, officer_token) = common::officer(&test);
    let (_, sup_token) = common::supervisor(&test);

    let case = common::create_case(&test.app, &sup_token, "dog_fouling", common::valid_fields("dog_fouling")).await;
    let id = case["id"].as_str().unwrap();

    let (status, claimed) = common::post_empty(
        &test.app,
        &format!("/api/cases/{id}/self-assign"),
        Some(&officer_token),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{claimed}");
    assert_eq!(claimed["status"], "assigned");
    assert_eq!(claimed["assigned_to"], json!(officer.id.to_string()));

    // a second claim loses
    let (_, second_token) = common::seed_user(
        &test,
        "Riley Poole",
        shared_types::UserRole::Officer,
        &[shared_types::TeamType::Enforcement],
    );
    let (status, response) = common::post_empty(
        &test.app,
        &format!("/api/cases/{id}/self-assign"),
        Some(&second_token),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{response}");
}

#[tokio::test]
async fn concurrent_self_assign_has_exactly_one_winner() {
    let test = common::test_app();
    let (officer_a, _) = common::officer(&test);
    let (officer_b, _) = common::seed_user(
        &test,
        "Riley Poole",
        shared_types::UserRole::Officer,
        &[shared_types::TeamType::Enforcement],
    );
    let (_, sup_token) = common::supervisor(&test);

    let case = common::create_case(&test.app, &sup_token, "littering", common::valid_fields("littering")).await;
    let id = uuid::Uuid::parse_str(case["id"].as_str().unwrap()).unwrap();

    let (a, b) = tokio::join!(
        test.state.cases.self_assign(id, &officer_a),
        test.state.cases.self_assign(id, &officer_b),
    );
    let winners = [a.is_ok(), b.is_ok()].iter().filter(|w| **w).count();
    assert_eq!(winners, 1, "exactly one claim must win");
    let loser = if a.is_ok() { b } else { a };
    assert_eq!(
        loser.unwrap_err().kind,
        shared_types::AppErrorKind::Conflict
    );
}

#[tokio::test]
async fn stale_version_update_is_rejected() {
    let test = common::test_app();
    let (_, sup_token) = common::supervisor(&test);
    let case = common::create_case(&test.app, &sup_token, "littering", common::valid_fields("littering")).await;
    let id = uuid::Uuid::parse_str(case["id"].as_str().unwrap()).unwrap();

    let stored = test.state.cases.get(id).await.unwrap().unwrap();
    // first writer advances the version
    let mut first = stored.clone();
    first.description = "first edit".to_string();
    test.state.cases.update(stored.version, first).await.unwrap();

    // second writer still holds the old version
    let mut second = stored.clone();
    second.description = "second edit".to_string();
    let err = test.state.cases.update(stored.version, second).await.unwrap_err();
    assert_eq!(err.kind, shared_types::AppErrorKind::Conflict);
}
