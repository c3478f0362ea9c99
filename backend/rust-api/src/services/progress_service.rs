use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{bson::doc, Database};

use crate::metrics::BADGES_AWARDED_TOTAL;
use crate::models::answer::{QuizScore, SpeciesAnswer};
use crate::models::badge::{BadgeDefinition, BadgeTier, EarnedBadge, BADGES, REQUIRED_ACCURACY};
use crate::models::stats::{SpeciesAccuracy, UserStats};
use crate::utils::retry::{retry_async_with_config, RetryConfig};

/// Recomputes accuracy and badge state from the full persisted history on every
/// call. There is deliberately no cached counter anywhere: concurrent quiz
/// completions for the same user stay safe because the only write here is an
/// idempotent upsert keyed by (user_id, badge_type).
pub struct ProgressService {
    mongo: Database,
}

impl ProgressService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    /// Per-species accuracy for a user, sorted descending by accuracy.
    /// A failed read degrades to an empty list; stats must never block the quiz.
    pub async fn species_accuracies(&self, user_id: &str) -> Vec<SpeciesAccuracy> {
        match self.load_species_answers(user_id).await {
            Ok(answers) => aggregate_accuracies(&answers),
            Err(e) => {
                tracing::warn!(
                    "Failed to load species answers for user {}: {:#}",
                    user_id,
                    e
                );
                Vec::new()
            }
        }
    }

    /// Tiers already persisted for this user. Read failures degrade to an empty
    /// set, which at worst re-awards a tier through the idempotent upsert.
    pub async fn earned_badges(&self, user_id: &str) -> Vec<BadgeTier> {
        match self.load_earned_badges(user_id).await {
            Ok(tiers) => tiers,
            Err(e) => {
                tracing::warn!("Failed to load earned badges for user {}: {:#}", user_id, e);
                Vec::new()
            }
        }
    }

    /// Evaluates every tier against the current high-accuracy species count and
    /// persists awards for tiers that newly qualify. All four tiers are checked
    /// independently on each call, so a user who jumps straight to full coverage
    /// earns all of them at once. Returns the tiers awarded by this call.
    pub async fn check_and_award_badges(&self, user_id: &str) -> Vec<BadgeTier> {
        let accuracies = self.species_accuracies(user_id).await;
        let earned = self.earned_badges(user_id).await;
        let high_count = high_accuracy_count(&accuracies);

        let new_badges = tiers_to_award(&earned, high_count);
        for tier in &new_badges {
            self.award_badge(user_id, *tier).await;
        }
        new_badges
    }

    /// Aggregate statistics for the score page: quiz totals, overall accuracy,
    /// the species accuracy list, earned badges, and progress toward the next
    /// unearned tier.
    pub async fn user_stats(&self, user_id: &str) -> UserStats {
        let scores = match self.load_quiz_scores(user_id).await {
            Ok(scores) => scores,
            Err(e) => {
                tracing::warn!("Failed to load quiz scores for user {}: {:#}", user_id, e);
                Vec::new()
            }
        };
        let species_accuracies = self.species_accuracies(user_id).await;
        let earned_badges = self.earned_badges(user_id).await;

        compute_user_stats(&scores, species_accuracies, earned_badges)
    }

    async fn load_species_answers(&self, user_id: &str) -> Result<Vec<SpeciesAnswer>> {
        let collection = self.mongo.collection::<SpeciesAnswer>("species_answers");
        let cursor = collection
            .find(doc! { "user_id": user_id })
            .await
            .context("Failed to query species answers")?;

        cursor
            .try_collect()
            .await
            .context("Species answers cursor failure")
    }

    async fn load_quiz_scores(&self, user_id: &str) -> Result<Vec<QuizScore>> {
        let collection = self.mongo.collection::<QuizScore>("quiz_scores");
        let cursor = collection
            .find(doc! { "user_id": user_id })
            .await
            .context("Failed to query quiz scores")?;

        cursor
            .try_collect()
            .await
            .context("Quiz scores cursor failure")
    }

    async fn load_earned_badges(&self, user_id: &str) -> Result<Vec<BadgeTier>> {
        let collection = self.mongo.collection::<EarnedBadge>("user_badges");
        let cursor = collection
            .find(doc! { "user_id": user_id })
            .await
            .context("Failed to query earned badges")?;

        let rows: Vec<EarnedBadge> = cursor
            .try_collect()
            .await
            .context("Earned badges cursor failure")?;

        Ok(rows.into_iter().map(|b| b.badge_type).collect())
    }

    /// Persist a single award. Write failures are logged and swallowed: the
    /// tier stays unearned in storage and the next evaluation retries it.
    async fn award_badge(&self, user_id: &str, tier: BadgeTier) {
        let result = retry_async_with_config(RetryConfig::aggressive(), || async {
            self.upsert_badge(user_id, tier).await
        })
        .await;

        match result {
            Ok(()) => {
                BADGES_AWARDED_TOTAL
                    .with_label_values(&[tier.as_str()])
                    .inc();
                tracing::info!("Awarded {} badge to user {}", tier.as_str(), user_id);
            }
            Err(e) => {
                tracing::error!(
                    "Failed to persist {} badge for user {}: {:#}",
                    tier.as_str(),
                    user_id,
                    e
                );
            }
        }
    }

    async fn upsert_badge(&self, user_id: &str, tier: BadgeTier) -> Result<()> {
        let record = EarnedBadge {
            user_id: user_id.to_string(),
            badge_type: tier,
            awarded_at: Utc::now(),
        };

        let collection = self.mongo.collection::<EarnedBadge>("user_badges");
        collection
            .replace_one(
                doc! { "user_id": user_id, "badge_type": tier.as_str() },
                &record,
            )
            .with_options(
                mongodb::options::ReplaceOptions::builder()
                    .upsert(true)
                    .build(),
            )
            .await
            .context("Failed to upsert earned badge")?;

        Ok(())
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Group raw answers by species and compute per-species accuracy, sorted
/// descending. Empty input yields an empty list.
pub(crate) fn aggregate_accuracies(answers: &[SpeciesAnswer]) -> Vec<SpeciesAccuracy> {
    let mut per_species: HashMap<&str, (u32, u32)> = HashMap::new();
    for answer in answers {
        let (correct, total) = per_species
            .entry(answer.species_name.as_str())
            .or_insert((0, 0));
        *total += 1;
        if answer.correct {
            *correct += 1;
        }
    }

    let mut accuracies: Vec<SpeciesAccuracy> = per_species
        .into_iter()
        .map(|(species_name, (correct, total))| SpeciesAccuracy {
            species_name: species_name.to_string(),
            total_answers: total,
            correct_answers: correct,
            accuracy_percent: round1(correct as f64 / total as f64 * 100.0),
        })
        .collect();

    accuracies.sort_by(|a, b| b.accuracy_percent.total_cmp(&a.accuracy_percent));
    accuracies
}

pub(crate) fn high_accuracy_count(accuracies: &[SpeciesAccuracy]) -> u32 {
    accuracies
        .iter()
        .filter(|a| a.accuracy_percent >= REQUIRED_ACCURACY)
        .count() as u32
}

/// Tiers that qualify right now and are not yet earned, in tier order.
pub(crate) fn tiers_to_award(earned: &[BadgeTier], high_count: u32) -> Vec<BadgeTier> {
    BADGES
        .iter()
        .filter(|badge| high_count >= badge.required_species() && !earned.contains(&badge.tier))
        .map(|badge| badge.tier)
        .collect()
}

/// The first unearned tier (in tier order) and the capped progress percentage
/// toward it. With every tier earned there is nothing to progress toward, so
/// this returns (None, 0) rather than leaving the value undefined.
pub(crate) fn next_badge_progress(
    earned: &[BadgeTier],
    high_count: u32,
) -> (Option<&'static BadgeDefinition>, u32) {
    for badge in &BADGES {
        if !earned.contains(&badge.tier) {
            let required = badge.required_species();
            let progress = (high_count as f64 / required as f64 * 100.0).round() as u32;
            return (Some(badge), progress.min(100));
        }
    }
    (None, 0)
}

pub(crate) fn compute_user_stats(
    scores: &[QuizScore],
    species_accuracies: Vec<SpeciesAccuracy>,
    earned_badges: Vec<BadgeTier>,
) -> UserStats {
    let total_quizzes = scores.len() as u32;
    let total_correct: u32 = scores.iter().map(|s| s.score).sum();
    let total_questions: u32 = scores.iter().map(|s| s.total_questions).sum();
    let overall_accuracy = if total_questions > 0 {
        round1(total_correct as f64 / total_questions as f64 * 100.0)
    } else {
        0.0
    };

    let high_count = high_accuracy_count(&species_accuracies);
    let (next_badge, progress_to_next_badge) = next_badge_progress(&earned_badges, high_count);

    UserStats {
        total_quizzes,
        total_correct,
        total_questions,
        overall_accuracy,
        species_accuracies,
        earned_badges,
        next_badge: next_badge.cloned(),
        progress_to_next_badge,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn answer(species: &str, correct: bool) -> SpeciesAnswer {
        SpeciesAnswer {
            id: Uuid::new_v4().to_string(),
            user_id: "u1".to_string(),
            species_name: species.to_string(),
            correct,
            answered_at: Utc::now(),
        }
    }

    fn accuracy(species: &str, percent: f64) -> SpeciesAccuracy {
        SpeciesAccuracy {
            species_name: species.to_string(),
            total_answers: 10,
            correct_answers: 0,
            accuracy_percent: percent,
        }
    }

    fn score(correct: u32, total: u32) -> QuizScore {
        QuizScore {
            id: Uuid::new_v4().to_string(),
            user_id: "u1".to_string(),
            score: correct,
            total_questions: total,
            finished_at: Utc::now(),
        }
    }

    #[test]
    fn aggregate_groups_rounds_and_sorts() {
        let answers = vec![
            answer("uguisu", true),
            answer("uguisu", true),
            answer("uguisu", false),
            answer("mejiro", true),
        ];

        let accuracies = aggregate_accuracies(&answers);
        assert_eq!(accuracies.len(), 2);
        // mejiro 1/1 = 100.0 first, uguisu 2/3 = 66.7 second
        assert_eq!(accuracies[0].species_name, "mejiro");
        assert_eq!(accuracies[0].accuracy_percent, 100.0);
        assert_eq!(accuracies[1].species_name, "uguisu");
        assert_eq!(accuracies[1].total_answers, 3);
        assert_eq!(accuracies[1].correct_answers, 2);
        assert_eq!(accuracies[1].accuracy_percent, 66.7);
    }

    #[test]
    fn aggregate_empty_history_is_empty() {
        assert!(aggregate_accuracies(&[]).is_empty());
    }

    #[test]
    fn accuracy_stays_within_bounds() {
        let answers = vec![answer("suzume", false), answer("suzume", false)];
        let accuracies = aggregate_accuracies(&answers);
        assert_eq!(accuracies[0].accuracy_percent, 0.0);

        let answers = vec![answer("suzume", true)];
        let accuracies = aggregate_accuracies(&answers);
        assert_eq!(accuracies[0].accuracy_percent, 100.0);
    }

    #[test]
    fn high_count_uses_eighty_percent_bar() {
        let accuracies = vec![
            accuracy("a", 90.0),
            accuracy("b", 85.0),
            accuracy("c", 80.0),
            accuracy("d", 80.0),
            accuracy("e", 70.0),
        ];
        assert_eq!(high_accuracy_count(&accuracies), 4);
    }

    #[test]
    fn four_high_species_earn_nothing() {
        // Bronze needs 25% of 20 species = 5.
        assert!(tiers_to_award(&[], 4).is_empty());
    }

    #[test]
    fn five_high_species_earn_bronze_only() {
        assert_eq!(tiers_to_award(&[], 5), vec![BadgeTier::Bronze]);
    }

    #[test]
    fn full_coverage_earns_all_tiers_in_order() {
        assert_eq!(
            tiers_to_award(&[], 20),
            vec![
                BadgeTier::Bronze,
                BadgeTier::Silver,
                BadgeTier::Gold,
                BadgeTier::Platinum
            ]
        );
    }

    #[test]
    fn earned_tiers_are_not_awarded_again() {
        assert!(tiers_to_award(&[BadgeTier::Bronze], 5).is_empty());
        assert_eq!(
            tiers_to_award(&[BadgeTier::Bronze], 10),
            vec![BadgeTier::Silver]
        );
    }

    #[test]
    fn progress_toward_bronze() {
        let (next, progress) = next_badge_progress(&[], 4);
        assert_eq!(next.map(|b| b.tier), Some(BadgeTier::Bronze));
        assert_eq!(progress, 80);
    }

    #[test]
    fn progress_is_capped_at_one_hundred() {
        // Silver needs 10; 20 high species would be 200% uncapped.
        let (next, progress) = next_badge_progress(&[BadgeTier::Bronze], 20);
        assert_eq!(next.map(|b| b.tier), Some(BadgeTier::Silver));
        assert_eq!(progress, 100);
    }

    #[test]
    fn progress_with_all_tiers_earned_is_zero() {
        let earned = vec![
            BadgeTier::Bronze,
            BadgeTier::Silver,
            BadgeTier::Gold,
            BadgeTier::Platinum,
        ];
        let (next, progress) = next_badge_progress(&earned, 20);
        assert!(next.is_none());
        assert_eq!(progress, 0);
    }

    #[test]
    fn user_stats_with_no_history() {
        let stats = compute_user_stats(&[], Vec::new(), Vec::new());
        assert_eq!(stats.total_quizzes, 0);
        assert_eq!(stats.total_correct, 0);
        assert_eq!(stats.total_questions, 0);
        assert_eq!(stats.overall_accuracy, 0.0);
        assert!(stats.species_accuracies.is_empty());
        assert!(stats.earned_badges.is_empty());
        assert_eq!(
            stats.next_badge.map(|b| b.tier),
            Some(BadgeTier::Bronze)
        );
        assert_eq!(stats.progress_to_next_badge, 0);
    }

    #[test]
    fn user_stats_sums_scores_and_rounds_overall_accuracy() {
        let scores = vec![score(7, 10), score(8, 10), score(5, 10)];
        let stats = compute_user_stats(&scores, Vec::new(), Vec::new());
        assert_eq!(stats.total_quizzes, 3);
        assert_eq!(stats.total_correct, 20);
        assert_eq!(stats.total_questions, 30);
        assert_eq!(stats.overall_accuracy, 66.7);
    }
}
