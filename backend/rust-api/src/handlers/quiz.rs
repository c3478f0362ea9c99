use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::{
    extractors::AppJson,
    middlewares::auth::JwtClaims,
    models::answer::{
        RecordAnswerRequest, RecordAnswerResponse, RecordResultRequest, RecordResultResponse,
    },
    services::{answer_service::AnswerService, progress_service::ProgressService, AppState},
};

/// POST /api/v1/quiz/answers - record one answered question.
///
/// Always answers 202 once the payload is valid: answer persistence is
/// fire-and-forget and must never hold up the quiz.
pub async fn record_answer(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    AppJson(req): AppJson<RecordAnswerRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // Validate request
    if let Err(e) = req.validate() {
        return Err((StatusCode::BAD_REQUEST, format!("Validation error: {}", e)));
    }
    if req.species_name.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Species name must not be blank".to_string(),
        ));
    }

    tracing::info!(
        "Recording answer: user={}, species={}, correct={}",
        claims.sub,
        req.species_name,
        req.correct
    );

    let service = AnswerService::new(state.mongo.clone());
    if let Err(e) = service.record_answer(&claims.sub, &req).await {
        tracing::error!("Failed to record species answer: {:#}", e);
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(RecordAnswerResponse { accepted: true }),
    ))
}

/// POST /api/v1/quiz/results - record a finished quiz run and evaluate badges.
///
/// This is the end-of-quiz event: the score row is appended and every badge
/// tier is re-evaluated against the updated species accuracies.
pub async fn submit_result(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    AppJson(req): AppJson<RecordResultRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // Validate request
    if let Err(e) = req.validate() {
        return Err((StatusCode::BAD_REQUEST, format!("Validation error: {}", e)));
    }
    if req.score > req.total_questions {
        return Err((
            StatusCode::BAD_REQUEST,
            "Score cannot exceed total questions".to_string(),
        ));
    }

    tracing::info!(
        "Recording quiz result: user={}, score={}/{}",
        claims.sub,
        req.score,
        req.total_questions
    );

    let answer_service = AnswerService::new(state.mongo.clone());
    if let Err(e) = answer_service.record_result(&claims.sub, &req).await {
        tracing::error!("Failed to record quiz result: {:#}", e);
    }

    let progress_service = ProgressService::new(state.mongo.clone());
    let new_badges = progress_service.check_and_award_badges(&claims.sub).await;

    Ok((
        StatusCode::OK,
        Json(RecordResultResponse {
            recorded: true,
            new_badges,
        }),
    ))
}
