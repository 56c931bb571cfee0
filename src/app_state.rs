use std::sync::Arc;

use crate::{
    config::Config,
    db::Database,
    errors::AppResult,
    repositories::{
        AnswerRepository, InMemoryAnswerRepository, InMemoryProgressRepository,
        MongoAnswerRepository, MongoProgressRepository, ProgressRepository,
    },
    services::{HttpQuizSource, ModuleListService, QuizSession, QuizSource, SessionSettings},
};

/// Application root: owns the store handles and the quiz source and builds the
/// services that use them.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn QuizSource>,
    pub progress: Arc<dyn ProgressRepository>,
    pub answers: Arc<dyn AnswerRepository>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;
        db.health_check().await?;

        let progress = Arc::new(MongoProgressRepository::new(&db, &config.progress_collection));
        progress.ensure_indexes().await?;

        let answers = Arc::new(MongoAnswerRepository::new(&db, &config.answers_collection));
        answers.ensure_indexes().await?;

        let source = Arc::new(HttpQuizSource::new(&config)?);

        Ok(Self {
            source,
            progress,
            answers,
            config: Arc::new(config),
        })
    }

    /// Same wiring with a process-local store; progress does not outlive the process.
    pub fn in_memory(config: Config) -> AppResult<Self> {
        let source = Arc::new(HttpQuizSource::new(&config)?);
        Ok(Self {
            source,
            progress: Arc::new(InMemoryProgressRepository::new()),
            answers: Arc::new(InMemoryAnswerRepository::new()),
            config: Arc::new(config),
        })
    }

    pub fn module_list(&self) -> ModuleListService {
        ModuleListService::new(Arc::clone(&self.source), Arc::clone(&self.progress))
    }

    pub fn quiz_session(&self) -> QuizSession {
        QuizSession::new(
            Arc::clone(&self.source),
            Arc::clone(&self.progress),
            Arc::clone(&self.answers),
            SessionSettings::from_config(&self.config),
        )
    }
}
