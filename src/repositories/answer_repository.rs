use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{db::Database, errors::AppResult, models::domain::AnswerRecord};

#[async_trait]
pub trait AnswerRepository: Send + Sync {
    /// Upsert keyed by `(module_id, question_id)`.
    async fn save_answer(&self, answer: AnswerRecord) -> AppResult<()>;
    async fn get_answers_for_module(&self, module_id: &str) -> AppResult<Vec<AnswerRecord>>;
    async fn delete_answers_for_module(&self, module_id: &str) -> AppResult<u64>;
}

pub struct MongoAnswerRepository {
    collection: Collection<AnswerRecord>,
}

impl MongoAnswerRepository {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        let collection = db.get_collection(collection_name);
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for answers collection");

        let module_question_index = IndexModel::builder()
            .keys(doc! { "module_id": 1, "question_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("module_question_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(module_question_index).await?;

        log::info!("Successfully created indexes for answers collection");
        Ok(())
    }
}

#[async_trait]
impl AnswerRepository for MongoAnswerRepository {
    async fn save_answer(&self, answer: AnswerRecord) -> AppResult<()> {
        self.collection
            .replace_one(
                doc! {
                    "module_id": &answer.module_id,
                    "question_id": answer.question_id
                },
                &answer,
            )
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn get_answers_for_module(&self, module_id: &str) -> AppResult<Vec<AnswerRecord>> {
        let answers = self
            .collection
            .find(doc! { "module_id": module_id })
            .sort(doc! { "answered_at": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(answers)
    }

    async fn delete_answers_for_module(&self, module_id: &str) -> AppResult<u64> {
        let result = self
            .collection
            .delete_many(doc! { "module_id": module_id })
            .await?;
        Ok(result.deleted_count)
    }
}
