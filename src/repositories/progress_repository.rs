use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};
use tokio::sync::watch;

use crate::{db::Database, errors::AppResult, models::domain::ModuleProgress};

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    async fn get_progress(&self, module_id: &str) -> AppResult<Option<ModuleProgress>>;
    /// Live view of every stored record; updated after each write through this repository.
    async fn watch_all_progress(&self) -> AppResult<watch::Receiver<Vec<ModuleProgress>>>;
    /// Upsert keyed by `module_id`.
    async fn save_progress(&self, progress: ModuleProgress) -> AppResult<()>;
    async fn delete_progress(&self, module_id: &str) -> AppResult<()>;
}

pub struct MongoProgressRepository {
    collection: Collection<ModuleProgress>,
    feed: watch::Sender<Vec<ModuleProgress>>,
}

impl MongoProgressRepository {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        let collection = db.get_collection(collection_name);
        let (feed, _) = watch::channel(Vec::new());
        Self { collection, feed }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for module progress collection");

        let module_index = IndexModel::builder()
            .keys(doc! { "module_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("module_id_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(module_index).await?;

        log::info!("Successfully created indexes for module progress collection");
        Ok(())
    }

    async fn refresh_feed(&self) -> AppResult<()> {
        let cursor = self.collection.find(doc! {}).await?;
        let all: Vec<ModuleProgress> = cursor.try_collect().await?;
        self.feed.send_replace(all);
        Ok(())
    }
}

#[async_trait]
impl ProgressRepository for MongoProgressRepository {
    async fn get_progress(&self, module_id: &str) -> AppResult<Option<ModuleProgress>> {
        let progress = self
            .collection
            .find_one(doc! { "module_id": module_id })
            .await?;
        Ok(progress)
    }

    async fn watch_all_progress(&self) -> AppResult<watch::Receiver<Vec<ModuleProgress>>> {
        self.refresh_feed().await?;
        Ok(self.feed.subscribe())
    }

    async fn save_progress(&self, progress: ModuleProgress) -> AppResult<()> {
        self.collection
            .replace_one(doc! { "module_id": &progress.module_id }, &progress)
            .upsert(true)
            .await?;
        self.refresh_feed().await
    }

    async fn delete_progress(&self, module_id: &str) -> AppResult<()> {
        self.collection
            .delete_one(doc! { "module_id": module_id })
            .await?;
        self.refresh_feed().await
    }
}
