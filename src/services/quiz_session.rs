use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::{
    config::Config,
    errors::{AppError, AppResult},
    models::domain::{
        AnswerRecord, ModuleProgress, Navigation, Question, QuizResult, SessionState,
    },
    repositories::{AnswerRepository, ProgressRepository},
    services::quiz_source::QuizSource,
};

#[derive(Clone, Debug)]
pub struct SessionSettings {
    /// Pause between revealing an answer and moving to the next question.
    pub auto_advance_delay: Duration,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            auto_advance_delay: config.auto_advance_delay(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            auto_advance_delay: Duration::from_secs(2),
        }
    }
}

#[derive(Clone, Debug)]
struct ActiveModule {
    module_id: String,
    questions_url: String,
}

enum PersistOp {
    Progress {
        progress: ModuleProgress,
        ack: Option<oneshot::Sender<AppResult<()>>>,
    },
    Answer(AnswerRecord),
    StartOver {
        module_id: String,
        fresh: ModuleProgress,
        ack: oneshot::Sender<AppResult<()>>,
    },
    Flush(oneshot::Sender<()>),
}

#[derive(Clone, Copy)]
enum Direction {
    Forward,
    Back,
}

/// Drives one quiz attempt: navigation, answer locking, scoring and write-through
/// of progress. State lives in a `watch` channel so callers can render from
/// snapshots; writes go through a single queue so they land in order.
pub struct QuizSession {
    inner: Arc<SessionInner>,
    worker: JoinHandle<()>,
}

struct SessionInner {
    source: Arc<dyn QuizSource>,
    progress: Arc<dyn ProgressRepository>,
    answers: Arc<dyn AnswerRepository>,
    settings: SessionSettings,
    state: watch::Sender<SessionState>,
    active: Mutex<Option<ActiveModule>>,
    writes: mpsc::UnboundedSender<PersistOp>,
    pending_advance: Mutex<Option<JoinHandle<()>>>,
    // bumped by every navigation, load and reset
    generation: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl QuizSession {
    /// Must be called from within a tokio runtime; the write queue runs as a task
    /// owned by the session.
    pub fn new(
        source: Arc<dyn QuizSource>,
        progress: Arc<dyn ProgressRepository>,
        answers: Arc<dyn AnswerRepository>,
        settings: SessionSettings,
    ) -> Self {
        let (writes, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_persistence_worker(
            rx,
            Arc::clone(&progress),
            Arc::clone(&answers),
        ));
        let (state, _) = watch::channel(SessionState::default());

        Self {
            inner: Arc::new(SessionInner {
                source,
                progress,
                answers,
                settings,
                state,
                active: Mutex::new(None),
                writes,
                pending_advance: Mutex::new(None),
                generation: AtomicU64::new(0),
            }),
            worker,
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn module_id(&self) -> Option<String> {
        self.inner.module_id()
    }

    pub fn result(&self) -> QuizResult {
        self.inner.state.borrow().result()
    }

    /// Opens `module_id`: starts fresh, resumes an incomplete attempt, or shows a
    /// completed one for review. Failures end in an empty, non-loading state with
    /// `load_error` set.
    pub async fn load(&self, module_id: &str, questions_url: &str) {
        let inner = &self.inner;
        inner.cancel_auto_advance();
        inner.bump_generation();
        *lock(&inner.active) = Some(ActiveModule {
            module_id: module_id.to_string(),
            questions_url: questions_url.to_string(),
        });
        inner.state.send_replace(SessionState::loading());

        // earlier writes for this module must be visible to the reads below
        self.flush().await;

        let state = match inner.initial_state(module_id, questions_url).await {
            Ok(state) => state,
            Err(e) => {
                if e.is_fetch_failure() {
                    log::warn!("Failed to fetch module '{}': {}", module_id, e);
                } else {
                    log::error!("Failed to load module '{}': {}", module_id, e);
                }
                SessionState::failed(e.to_string())
            }
        };

        if inner.module_id().as_deref() != Some(module_id) {
            log::debug!("Module '{}' was closed while loading", module_id);
            return;
        }
        inner.state.send_replace(state);
    }

    /// Loads the last requested module again.
    pub async fn retry(&self) {
        let active = lock(&self.inner.active).clone();
        if let Some(active) = active {
            self.load(&active.module_id, &active.questions_url).await;
        }
    }

    /// Locks in an answer for the current question. Returns false when ignored.
    pub fn select_answer(&self, option_index: usize) -> bool {
        let inner = &self.inner;
        let Some(module_id) = inner.module_id() else {
            return false;
        };

        let mut outcome = None;
        inner.state.send_if_modified(|state| {
            outcome = state.answer(option_index);
            outcome.is_some()
        });
        let Some(outcome) = outcome else {
            return false;
        };

        log::debug!(
            "Module '{}' question {} answered with option {} (correct: {})",
            module_id,
            outcome.question_id,
            outcome.selected_option_index,
            outcome.is_correct
        );
        inner.enqueue(PersistOp::Answer(AnswerRecord::from_outcome(&module_id, &outcome)));
        inner.queue_snapshot();
        self.schedule_auto_advance();
        true
    }

    /// Moves on without answering. Skips are not counted here: the skip count is
    /// always `total - answered`.
    pub fn skip(&self) -> Navigation {
        self.inner.step(Direction::Forward)
    }

    pub fn next(&self) -> Navigation {
        self.inner.step(Direction::Forward)
    }

    pub fn previous(&self) -> Navigation {
        self.inner.step(Direction::Back)
    }

    pub fn finish(&self) {
        self.inner.cancel_auto_advance();
        self.inner.state.send_if_modified(|state| {
            if state.is_finished {
                return false;
            }
            state.finish();
            true
        });
    }

    /// Persists the attempt as completed and runs `on_saved` once the write has landed.
    /// Review and failed-load states have nothing to save; `on_saved` still runs.
    pub async fn save_and_finish<F: FnOnce()>(&self, on_saved: F) -> AppResult<()> {
        let inner = &self.inner;
        let module_id = inner.require_module()?;
        inner.cancel_auto_advance();

        let snapshot = {
            let state = inner.state.borrow();
            state
                .is_persistable()
                .then(|| state.progress_snapshot(&module_id, true))
        };
        if let Some(progress) = snapshot {
            inner.persist_and_wait(progress).await?;
            log::info!("Module '{}' completed", module_id);
            self.finish();
        }

        on_saved();
        Ok(())
    }

    /// Persists the attempt as incomplete and runs `on_exit` once the write has landed.
    /// Review and failed-load states leave the stored record untouched.
    pub async fn exit<F: FnOnce()>(&self, on_exit: F) -> AppResult<()> {
        let inner = &self.inner;
        let module_id = inner.require_module()?;
        inner.cancel_auto_advance();

        let snapshot = {
            let state = inner.state.borrow();
            state
                .is_persistable()
                .then(|| state.progress_snapshot(&module_id, false))
        };
        if let Some(progress) = snapshot {
            inner.persist_and_wait(progress).await?;
        }

        on_exit();
        Ok(())
    }

    /// Clears the in-memory session. Persisted progress is left alone.
    pub fn reset(&self) {
        self.inner.cancel_auto_advance();
        self.inner.bump_generation();
        *lock(&self.inner.active) = None;
        self.inner.state.send_replace(SessionState::default());
    }

    /// Wipes the module's stored answers and progress and starts over at question 0.
    pub async fn reattempt(&self) -> AppResult<()> {
        let inner = &self.inner;
        let module_id = inner.require_module()?;
        let questions = inner.state.borrow().questions.clone();
        if questions.is_empty() {
            return Ok(());
        }
        inner.cancel_auto_advance();
        inner.bump_generation();

        let (ack, done) = oneshot::channel();
        inner.enqueue(PersistOp::StartOver {
            module_id: module_id.clone(),
            fresh: ModuleProgress::fresh(&module_id, questions.len() as u32),
            ack,
        });
        done.await
            .map_err(|_| AppError::Internal("persistence worker stopped".to_string()))??;

        log::info!("Module '{}' restarted", module_id);
        inner.state.send_replace(SessionState::fresh(questions));
        Ok(())
    }

    /// Waits until every write queued so far has been applied.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        self.inner.enqueue(PersistOp::Flush(tx));
        let _ = rx.await;
    }

    fn schedule_auto_advance(&self) {
        let inner = &self.inner;
        let weak: Weak<SessionInner> = Arc::downgrade(inner);
        let generation = inner.generation.load(Ordering::SeqCst);
        let expected_index = inner.state.borrow().current_index;
        let delay = inner.settings.auto_advance_delay;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                inner.apply_auto_advance(generation, expected_index);
            }
        });

        if let Some(previous) = lock(&inner.pending_advance).replace(handle) {
            previous.abort();
        }
    }
}

impl Drop for QuizSession {
    fn drop(&mut self) {
        self.inner.cancel_auto_advance();
        self.worker.abort();
    }
}

impl SessionInner {
    fn module_id(&self) -> Option<String> {
        lock(&self.active).as_ref().map(|a| a.module_id.clone())
    }

    fn require_module(&self) -> AppResult<String> {
        self.module_id()
            .ok_or_else(|| AppError::NotFound("No module is loaded".to_string()))
    }

    fn bump_generation(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn cancel_auto_advance(&self) {
        if let Some(handle) = lock(&self.pending_advance).take() {
            handle.abort();
        }
    }

    fn enqueue(&self, op: PersistOp) {
        if self.writes.send(op).is_err() {
            log::warn!("Persistence worker has stopped; dropping write");
        }
    }

    fn queue_snapshot(&self) {
        let Some(module_id) = self.module_id() else {
            return;
        };
        let snapshot = {
            let state = self.state.borrow();
            if !state.is_persistable() {
                return;
            }
            state.progress_snapshot(&module_id, false)
        };
        self.enqueue(PersistOp::Progress {
            progress: snapshot,
            ack: None,
        });
    }

    async fn persist_and_wait(&self, progress: ModuleProgress) -> AppResult<()> {
        let (ack, done) = oneshot::channel();
        self.enqueue(PersistOp::Progress {
            progress,
            ack: Some(ack),
        });
        done.await
            .map_err(|_| AppError::Internal("persistence worker stopped".to_string()))?
    }

    fn step(&self, direction: Direction) -> Navigation {
        self.cancel_auto_advance();
        self.bump_generation();

        let mut navigation = Navigation::Unchanged;
        self.state.send_if_modified(|state| {
            if state.is_loading {
                return false;
            }
            navigation = match direction {
                Direction::Forward => state.advance(),
                Direction::Back => state.retreat(),
            };
            navigation != Navigation::Unchanged
        });

        if navigation == Navigation::Moved {
            self.queue_snapshot();
        }
        navigation
    }

    fn apply_auto_advance(&self, generation: u64, expected_index: usize) {
        // this task's own handle; detach rather than abort
        lock(&self.pending_advance).take();

        // checked under the state lock so a concurrent `next()` cannot slip in between
        let mut moved = false;
        self.state.send_if_modified(|state| {
            // the last question waits for an explicit finish
            if self.generation.load(Ordering::SeqCst) != generation
                || state.current_index != expected_index
                || state.is_loading
                || state.is_finished
                || state.is_last_question()
            {
                return false;
            }
            moved = state.advance() == Navigation::Moved;
            moved
        });

        if moved {
            self.bump_generation();
            self.queue_snapshot();
        }
    }

    async fn initial_state(&self, module_id: &str, questions_url: &str) -> AppResult<SessionState> {
        let questions = self.source.fetch_questions(questions_url).await?;
        let progress = self.progress.get_progress(module_id).await?;

        let Some(progress) = progress else {
            log::info!("Starting module '{}' ({} questions)", module_id, questions.len());
            self.enqueue(PersistOp::Progress {
                progress: ModuleProgress::fresh(module_id, questions.len() as u32),
                ack: None,
            });
            return Ok(SessionState::fresh(questions));
        };

        let records = self.answers.get_answers_for_module(module_id).await?;
        let answers = self.restore_answers(module_id, &questions, &progress, records);

        if progress.is_completed {
            log::info!("Reviewing completed module '{}'", module_id);
            Ok(SessionState::review(questions, answers, &progress))
        } else {
            log::info!(
                "Resuming module '{}' at question {} ({} answered)",
                module_id,
                progress.last_question_index,
                answers.len()
            );
            Ok(SessionState::resumed(questions, answers, &progress))
        }
    }

    /// Answer rows win; an older record's inline lists are used only when there are
    /// none, and are migrated to rows on the way.
    fn restore_answers(
        &self,
        module_id: &str,
        questions: &[Question],
        progress: &ModuleProgress,
        records: Vec<AnswerRecord>,
    ) -> BTreeMap<i64, usize> {
        if !records.is_empty() || !progress.has_legacy_answers() {
            return records
                .into_iter()
                .map(|r| (r.question_id, r.selected_option_index))
                .collect();
        }

        let by_position = match progress.legacy_answers() {
            Ok(map) => map,
            Err(e) => {
                log::warn!("Ignoring unreadable answer lists for '{}': {}", module_id, e);
                return BTreeMap::new();
            }
        };

        let mut answers = BTreeMap::new();
        for (position, option) in by_position {
            let Some(question) = usize::try_from(position).ok().and_then(|p| questions.get(p)) else {
                continue;
            };
            if !question.has_option(option) {
                continue;
            }
            answers.insert(question.id, option);
            self.enqueue(PersistOp::Answer(AnswerRecord::new(module_id, question, option)));
        }
        log::info!("Migrated {} inline answers for '{}'", answers.len(), module_id);
        answers
    }
}

async fn run_persistence_worker(
    mut rx: mpsc::UnboundedReceiver<PersistOp>,
    progress_repo: Arc<dyn ProgressRepository>,
    answer_repo: Arc<dyn AnswerRepository>,
) {
    while let Some(op) = rx.recv().await {
        match op {
            PersistOp::Progress { progress, ack } => {
                let module_id = progress.module_id.clone();
                let result = progress_repo.save_progress(progress).await;
                if let Err(e) = &result {
                    log::error!("Failed to save progress for '{}': {}", module_id, e);
                }
                if let Some(ack) = ack {
                    let _ = ack.send(result);
                }
            }
            PersistOp::Answer(answer) => {
                if let Err(e) = answer_repo.save_answer(answer).await {
                    log::error!("Failed to save answer: {}", e);
                }
            }
            PersistOp::StartOver {
                module_id,
                fresh,
                ack,
            } => {
                let result = start_over(&*progress_repo, &*answer_repo, &module_id, fresh).await;
                if let Err(e) = &result {
                    log::error!("Failed to restart '{}': {}", module_id, e);
                }
                let _ = ack.send(result);
            }
            PersistOp::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
}

async fn start_over(
    progress_repo: &dyn ProgressRepository,
    answer_repo: &dyn AnswerRepository,
    module_id: &str,
    fresh: ModuleProgress,
) -> AppResult<()> {
    let removed = answer_repo.delete_answers_for_module(module_id).await?;
    log::debug!("Removed {} answers for '{}'", removed, module_id);
    progress_repo.save_progress(fresh).await
}
