use axum::{
    extract::{Extension, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::{
    middlewares::auth::JwtClaims,
    models::badge::{BadgeDefinition, BadgeTier, BADGES},
    models::stats::{SpeciesAccuracy, UserStats},
    services::{progress_service::ProgressService, AppState},
};

// These handlers are infallible by design: aggregator reads degrade to empty
// collections instead of surfacing persistence errors (the score page renders
// zeros rather than an error state).

/// GET /api/v1/stats/me - aggregate statistics for the score page.
pub async fn get_user_stats(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Json<UserStats> {
    let service = ProgressService::new(state.mongo.clone());
    Json(service.user_stats(&claims.sub).await)
}

/// GET /api/v1/stats/me/species - per-species accuracy, best first.
pub async fn get_species_accuracies(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Json<Vec<SpeciesAccuracy>> {
    let service = ProgressService::new(state.mongo.clone());
    Json(service.species_accuracies(&claims.sub).await)
}

/// GET /api/v1/stats/me/badges - tiers the user has earned so far.
pub async fn get_earned_badges(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Json<EarnedBadgesResponse> {
    let service = ProgressService::new(state.mongo.clone());
    Json(EarnedBadgesResponse {
        badges: service.earned_badges(&claims.sub).await,
    })
}

/// GET /api/v1/badges - the static tier table, public so the frontend renders
/// names, emoji and thresholds from one source of truth.
pub async fn badge_catalog() -> Json<[BadgeDefinition; 4]> {
    Json(BADGES)
}

#[derive(Debug, Serialize)]
pub struct EarnedBadgesResponse {
    pub badges: Vec<BadgeTier>,
}
