use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Size of the species universe: the quiz audio library covers 20 birds.
pub const TOTAL_SPECIES: u32 = 20;

/// Accuracy a species must reach before it counts toward badge coverage (%).
pub const REQUIRED_ACCURACY: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl BadgeTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeTier::Bronze => "bronze",
            BadgeTier::Silver => "silver",
            BadgeTier::Gold => "gold",
            BadgeTier::Platinum => "platinum",
        }
    }
}

/// One row of the static badge table. `threshold_percent` is the share of the
/// species universe that must sit at or above [`REQUIRED_ACCURACY`].
#[derive(Debug, Clone, Serialize)]
pub struct BadgeDefinition {
    pub tier: BadgeTier,
    pub name: &'static str,
    pub description: &'static str,
    pub emoji: &'static str,
    pub threshold_percent: u32,
    pub required_accuracy: f64,
}

impl BadgeDefinition {
    /// Species count a user must master for this tier: ceil(20 * threshold / 100).
    pub fn required_species(&self) -> u32 {
        (TOTAL_SPECIES * self.threshold_percent).div_ceil(100)
    }
}

/// The fixed tier table, in award-evaluation order. Immutable configuration,
/// not mutable state: every evaluation reads from here.
pub const BADGES: [BadgeDefinition; 4] = [
    BadgeDefinition {
        tier: BadgeTier::Bronze,
        name: "Bronze Badge",
        description: "80% accuracy or better on 25% of all species",
        emoji: "\u{1F949}",
        threshold_percent: 25,
        required_accuracy: REQUIRED_ACCURACY,
    },
    BadgeDefinition {
        tier: BadgeTier::Silver,
        name: "Silver Badge",
        description: "80% accuracy or better on 50% of all species",
        emoji: "\u{1F948}",
        threshold_percent: 50,
        required_accuracy: REQUIRED_ACCURACY,
    },
    BadgeDefinition {
        tier: BadgeTier::Gold,
        name: "Gold Badge",
        description: "80% accuracy or better on 75% of all species",
        emoji: "\u{1F947}",
        threshold_percent: 75,
        required_accuracy: REQUIRED_ACCURACY,
    },
    BadgeDefinition {
        tier: BadgeTier::Platinum,
        name: "Platinum Badge",
        description: "80% accuracy or better on every species",
        emoji: "\u{1F48E}",
        threshold_percent: 100,
        required_accuracy: REQUIRED_ACCURACY,
    },
];

/// Persisted award, unique per (user_id, badge_type). Written once via upsert,
/// never revoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarnedBadge {
    pub user_id: String,
    pub badge_type: BadgeTier,
    pub awarded_at: DateTime<Utc>,
}
