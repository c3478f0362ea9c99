use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::badge::BadgeTier;

/// One recorded answer for a single question, append-only. The correctness
/// verdict comes from the question service; this record just remembers it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesAnswer {
    pub id: String,
    pub user_id: String,
    pub species_name: String,
    pub correct: bool,
    pub answered_at: DateTime<Utc>,
}

/// One finished quiz run, append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizScore {
    pub id: String,
    pub user_id: String,
    pub score: u32,
    pub total_questions: u32,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordAnswerRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Species name must be between 1 and 100 characters"
    ))]
    pub species_name: String,
    pub correct: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecordAnswerResponse {
    pub accepted: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordResultRequest {
    pub score: u32,
    #[validate(range(min = 1, max = 500, message = "Total questions must be between 1 and 500"))]
    pub total_questions: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecordResultResponse {
    pub recorded: bool,
    pub new_badges: Vec<BadgeTier>,
}
