use serde::{Deserialize, Serialize};

use super::badge::{BadgeDefinition, BadgeTier};

/// Accuracy for a single species, derived on demand from the answer log.
/// `accuracy_percent` is rounded to one decimal place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesAccuracy {
    pub species_name: String,
    pub total_answers: u32,
    pub correct_answers: u32,
    pub accuracy_percent: f64,
}

/// Aggregate view returned by GET /api/v1/stats/me. Everything here is
/// recomputed from the persisted history on each request.
#[derive(Debug, Serialize)]
pub struct UserStats {
    pub total_quizzes: u32,
    pub total_correct: u32,
    pub total_questions: u32,
    pub overall_accuracy: f64,
    pub species_accuracies: Vec<SpeciesAccuracy>,
    pub earned_badges: Vec<BadgeTier>,
    pub next_badge: Option<BadgeDefinition>,
    pub progress_to_next_badge: u32,
}
