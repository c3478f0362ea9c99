use anyhow::{Context, Result};
use chrono::Utc;
use mongodb::Database;
use uuid::Uuid;

use crate::metrics::{ANSWERS_RECORDED_TOTAL, RECORD_WRITES_TOTAL};
use crate::models::answer::{QuizScore, RecordAnswerRequest, RecordResultRequest, SpeciesAnswer};
use crate::utils::retry::{retry_async_with_config, RetryConfig};

/// Appends answer and score records. Both collections are append-only: there is
/// no update or delete path, and readers always aggregate the full log.
pub struct AnswerService {
    mongo: Database,
}

impl AnswerService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    /// Append one AnswerRecord for the user. The write normally happens on a
    /// background task; the quiz flow never waits for persistence.
    pub async fn record_answer(&self, user_id: &str, req: &RecordAnswerRequest) -> Result<()> {
        let record = SpeciesAnswer {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            species_name: req.species_name.trim().to_string(),
            correct: req.correct,
            answered_at: Utc::now(),
        };

        let correct_label = if record.correct { "true" } else { "false" };
        ANSWERS_RECORDED_TOTAL
            .with_label_values(&[correct_label])
            .inc();

        self.save("species_answers", record).await
    }

    /// Append one ScoreRecord for a finished quiz run.
    pub async fn record_result(&self, user_id: &str, req: &RecordResultRequest) -> Result<()> {
        let record = QuizScore {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            score: req.score,
            total_questions: req.total_questions,
            finished_at: Utc::now(),
        };

        self.save("quiz_scores", record).await
    }

    /// Insert with retry. With RECORDS_SAVE_ASYNC enabled (the default) the
    /// insert is spawned and this returns immediately; failures are logged and
    /// the record is lost, which costs stats but never blocks the user.
    /// RECORDS_SAVE_ASYNC=0 switches to a synchronous insert (used by tests).
    async fn save<T>(&self, collection_name: &'static str, record: T) -> Result<()>
    where
        T: serde::Serialize + Send + Sync + 'static,
    {
        if Self::records_save_async_enabled() {
            let mongo = self.mongo.clone();

            tokio::spawn(async move {
                let collection = mongo.collection::<T>(collection_name);
                let res = retry_async_with_config(RetryConfig::aggressive(), || async {
                    collection.insert_one(&record).await.map(|_| ())
                })
                .await;

                match res {
                    Ok(()) => {
                        RECORD_WRITES_TOTAL
                            .with_label_values(&[collection_name, "success"])
                            .inc();
                        tracing::debug!("Background insert into {} completed", collection_name);
                    }
                    Err(e) => {
                        RECORD_WRITES_TOTAL
                            .with_label_values(&[collection_name, "error"])
                            .inc();
                        tracing::error!(
                            "Background insert into {} failed: {:#?}",
                            collection_name,
                            e
                        );
                    }
                }
            });

            return Ok(());
        }

        let collection = self.mongo.collection::<T>(collection_name);
        retry_async_with_config(RetryConfig::aggressive(), || async {
            collection.insert_one(&record).await.map(|_| ())
        })
        .await
        .with_context(|| format!("Failed to insert into {}", collection_name))?;

        RECORD_WRITES_TOTAL
            .with_label_values(&[collection_name, "success"])
            .inc();
        Ok(())
    }

    fn records_save_async_enabled() -> bool {
        std::env::var("RECORDS_SAVE_ASYNC").unwrap_or_else(|_| "1".to_string()) != "0"
    }
}
