pub mod answer;
pub mod badge;
pub mod stats;

pub use answer::{QuizScore, SpeciesAnswer};
pub use badge::{BadgeDefinition, BadgeTier, EarnedBadge};
pub use stats::{SpeciesAccuracy, UserStats};
