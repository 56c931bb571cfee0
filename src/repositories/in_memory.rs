use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{watch, RwLock};

use crate::{
    errors::{AppError, AppResult},
    models::domain::{AnswerRecord, ModuleProgress},
    repositories::{AnswerRepository, ProgressRepository},
};

/// Process-local store, used when no database is reachable and in tests.
pub struct InMemoryProgressRepository {
    records: Arc<RwLock<HashMap<String, ModuleProgress>>>,
    feed: watch::Sender<Vec<ModuleProgress>>,
    fail_writes: AtomicBool,
}

impl InMemoryProgressRepository {
    pub fn new() -> Self {
        let (feed, _) = watch::channel(Vec::new());
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            feed,
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent write fail with a persistence error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Persistence("progress store is read-only".to_string()));
        }
        Ok(())
    }

    fn publish(&self, records: &HashMap<String, ModuleProgress>) {
        let mut all: Vec<_> = records.values().cloned().collect();
        all.sort_by(|a, b| a.module_id.cmp(&b.module_id));
        self.feed.send_replace(all);
    }
}

impl Default for InMemoryProgressRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProgressRepository for InMemoryProgressRepository {
    async fn get_progress(&self, module_id: &str) -> AppResult<Option<ModuleProgress>> {
        let records = self.records.read().await;
        Ok(records.get(module_id).cloned())
    }

    async fn watch_all_progress(&self) -> AppResult<watch::Receiver<Vec<ModuleProgress>>> {
        let records = self.records.read().await;
        self.publish(&records);
        Ok(self.feed.subscribe())
    }

    async fn save_progress(&self, progress: ModuleProgress) -> AppResult<()> {
        self.check_writable()?;
        let mut records = self.records.write().await;
        records.insert(progress.module_id.clone(), progress);
        self.publish(&records);
        Ok(())
    }

    async fn delete_progress(&self, module_id: &str) -> AppResult<()> {
        self.check_writable()?;
        let mut records = self.records.write().await;
        records.remove(module_id);
        self.publish(&records);
        Ok(())
    }
}

pub struct InMemoryAnswerRepository {
    answers: Arc<RwLock<HashMap<(String, i64), AnswerRecord>>>,
}

impl InMemoryAnswerRepository {
    pub fn new() -> Self {
        Self {
            answers: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryAnswerRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnswerRepository for InMemoryAnswerRepository {
    async fn save_answer(&self, answer: AnswerRecord) -> AppResult<()> {
        let mut answers = self.answers.write().await;
        answers.insert((answer.module_id.clone(), answer.question_id), answer);
        Ok(())
    }

    async fn get_answers_for_module(&self, module_id: &str) -> AppResult<Vec<AnswerRecord>> {
        let answers = self.answers.read().await;
        let mut items: Vec<_> = answers
            .values()
            .filter(|a| a.module_id == module_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.answered_at.cmp(&b.answered_at));
        Ok(items)
    }

    async fn delete_answers_for_module(&self, module_id: &str) -> AppResult<u64> {
        let mut answers = self.answers.write().await;
        let before = answers.len();
        answers.retain(|(m, _), _| m != module_id);
        Ok((before - answers.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::question;

    #[tokio::test]
    async fn progress_save_is_an_upsert() {
        let repo = InMemoryProgressRepository::new();
        repo.save_progress(ModuleProgress::fresh("m1", 3)).await.unwrap();

        let mut updated = ModuleProgress::fresh("m1", 3);
        updated.score = 2;
        repo.save_progress(updated).await.unwrap();

        let stored = repo.get_progress("m1").await.unwrap().expect("record exists");
        assert_eq!(stored.score, 2);
    }

    #[tokio::test]
    async fn feed_pushes_updates_to_subscribers() {
        let repo = InMemoryProgressRepository::new();
        let mut feed = repo.watch_all_progress().await.unwrap();
        assert!(feed.borrow_and_update().is_empty());

        repo.save_progress(ModuleProgress::fresh("m1", 3)).await.unwrap();
        feed.changed().await.unwrap();
        assert_eq!(feed.borrow().len(), 1);

        repo.delete_progress("m1").await.unwrap();
        feed.changed().await.unwrap();
        assert!(feed.borrow().is_empty());
    }

    #[tokio::test]
    async fn failing_store_rejects_writes() {
        let repo = InMemoryProgressRepository::new();
        repo.set_fail_writes(true);

        let err = repo
            .save_progress(ModuleProgress::fresh("m1", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Persistence(_)));
        assert!(repo.get_progress("m1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn answers_are_keyed_by_module_and_question() {
        let repo = InMemoryAnswerRepository::new();
        let q = question(5, 1);

        repo.save_answer(AnswerRecord::new("m1", &q, 0)).await.unwrap();
        repo.save_answer(AnswerRecord::new("m1", &q, 1)).await.unwrap();
        repo.save_answer(AnswerRecord::new("m2", &q, 2)).await.unwrap();

        let m1 = repo.get_answers_for_module("m1").await.unwrap();
        assert_eq!(m1.len(), 1);
        assert_eq!(m1[0].selected_option_index, 1);
        assert!(m1[0].is_correct);

        assert_eq!(repo.delete_answers_for_module("m1").await.unwrap(), 1);
        assert!(repo.get_answers_for_module("m1").await.unwrap().is_empty());
        assert_eq!(repo.get_answers_for_module("m2").await.unwrap().len(), 1);
    }
}
