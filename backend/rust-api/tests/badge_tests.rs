mod common;

use axum::{http::StatusCode, Router};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

// The quiz audio library covers 20 species; tests pick from the same universe.
const BIRDS: [&str; 20] = [
    "uguisu",
    "mejiro",
    "shijukara",
    "hiyodori",
    "suzume",
    "kawasemi",
    "kijibato",
    "hakusekirei",
    "mozu",
    "enaga",
    "yamagara",
    "kogera",
    "tsubame",
    "hibari",
    "hojiro",
    "kakkou",
    "oruri",
    "kibitaki",
    "sankouchou",
    "aoji",
];

async fn record_answer(app: &Router, token: &str, species: &str, correct: bool) {
    let response = app
        .clone()
        .oneshot(common::post_json(
            "/api/v1/quiz/answers",
            token,
            json!({ "species_name": species, "correct": correct }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

async fn submit_result(app: &Router, token: &str) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(common::post_json(
            "/api/v1/quiz/results",
            token,
            json!({ "score": 8, "total_questions": 10 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    common::body_json(response).await
}

#[tokio::test]
async fn test_four_species_do_not_earn_bronze() {
    let app = common::create_test_app().await;
    let user_id = format!("badge-user-{}", Uuid::new_v4());
    let token = common::bearer_token(&user_id);

    // Bronze needs 25% of 20 species = 5; four is one short.
    for species in &BIRDS[..4] {
        record_answer(&app, &token, species, true).await;
    }

    let body = submit_result(&app, &token).await;
    assert_eq!(body["new_badges"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_five_species_earn_bronze_once() {
    let app = common::create_test_app().await;
    let user_id = format!("badge-user-{}", Uuid::new_v4());
    let token = common::bearer_token(&user_id);

    for species in &BIRDS[..5] {
        record_answer(&app, &token, species, true).await;
    }

    let body = submit_result(&app, &token).await;
    assert_eq!(body["new_badges"], json!(["bronze"]));

    // Unchanged data: a second evaluation awards nothing
    let body = submit_result(&app, &token).await;
    assert_eq!(body["new_badges"].as_array().unwrap().len(), 0);

    // And the persisted set still holds exactly one bronze
    let response = app
        .oneshot(common::get_authed("/api/v1/stats/me/badges", &token))
        .await
        .unwrap();
    let body = common::body_json(response).await;
    assert_eq!(body["badges"], json!(["bronze"]));
}

#[tokio::test]
async fn test_full_coverage_earns_all_tiers_in_order() {
    let app = common::create_test_app().await;
    let user_id = format!("badge-user-{}", Uuid::new_v4());
    let token = common::bearer_token(&user_id);

    for species in &BIRDS {
        record_answer(&app, &token, species, true).await;
    }

    let body = submit_result(&app, &token).await;
    assert_eq!(
        body["new_badges"],
        json!(["bronze", "silver", "gold", "platinum"])
    );
}

#[tokio::test]
async fn test_low_accuracy_species_do_not_count() {
    let app = common::create_test_app().await;
    let user_id = format!("badge-user-{}", Uuid::new_v4());
    let token = common::bearer_token(&user_id);

    // Five species at 50% accuracy: coverage is there, the accuracy bar is not.
    for species in &BIRDS[..5] {
        record_answer(&app, &token, species, true).await;
        record_answer(&app, &token, species, false).await;
    }

    let body = submit_result(&app, &token).await;
    assert_eq!(body["new_badges"].as_array().unwrap().len(), 0);
}
