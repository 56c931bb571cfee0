use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::{
    errors::AppResult,
    models::domain::{
        module::join_progress, Module, ModuleProgress, ModuleWithProgress,
    },
    repositories::ProgressRepository,
    services::quiz_source::QuizSource,
};

static HOST_UNREACHABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)unable to resolve host|dns error|failed to lookup address|no such host|name or service not known")
        .expect("HOST_UNREACHABLE is a valid regex pattern")
});

static TIMED_OUT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)time[d ]?out").expect("TIMED_OUT is a valid regex pattern")
});

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum FetchErrorCategory {
    HostUnreachable,
    Timeout,
    Other,
}

impl FetchErrorCategory {
    pub fn headline(&self) -> &'static str {
        match self {
            FetchErrorCategory::HostUnreachable => "Internet Connection Required",
            FetchErrorCategory::Timeout => "Connection Timeout",
            FetchErrorCategory::Other => "Error",
        }
    }
}

/// Buckets a raw fetch error message for display.
pub fn classify_fetch_error(message: &str) -> FetchErrorCategory {
    if HOST_UNREACHABLE.is_match(message) {
        FetchErrorCategory::HostUnreachable
    } else if TIMED_OUT.is_match(message) {
        FetchErrorCategory::Timeout
    } else {
        FetchErrorCategory::Other
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ModuleListState {
    pub is_loading: bool,
    pub modules: Vec<ModuleWithProgress>,
    pub error: Option<String>,
}

impl Default for ModuleListState {
    fn default() -> Self {
        Self {
            is_loading: true,
            modules: Vec::new(),
            error: None,
        }
    }
}

impl ModuleListState {
    pub fn error_category(&self) -> Option<FetchErrorCategory> {
        self.error.as_deref().map(classify_fetch_error)
    }
}

/// Module list joined with the live progress feed.
pub struct ModuleListService {
    source: Arc<dyn QuizSource>,
    progress: Arc<dyn ProgressRepository>,
    state: Arc<watch::Sender<ModuleListState>>,
    feed_task: Mutex<Option<JoinHandle<()>>>,
}

impl ModuleListService {
    pub fn new(source: Arc<dyn QuizSource>, progress: Arc<dyn ProgressRepository>) -> Self {
        let (state, _) = watch::channel(ModuleListState::default());
        Self {
            source,
            progress,
            state: Arc::new(state),
            feed_task: Mutex::new(None),
        }
    }

    pub fn snapshot(&self) -> ModuleListState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ModuleListState> {
        self.state.subscribe()
    }

    /// Fetches modules and keeps the joined list current as progress changes.
    /// On failure the raw message is kept in `error`.
    pub async fn load(&self) {
        match self.start_feed().await {
            Ok(handle) => self.replace_feed(Some(handle)),
            Err(e) => {
                log::warn!("Failed to load modules: {}", e);
                // a surviving feed would republish the stale list over the error
                self.replace_feed(None);
                self.state.send_replace(ModuleListState {
                    is_loading: false,
                    modules: Vec::new(),
                    error: Some(e.to_string()),
                });
            }
        }
    }

    pub async fn refresh(&self) {
        self.state.send_modify(|s| s.is_loading = true);
        self.load().await;
    }

    fn replace_feed(&self, handle: Option<JoinHandle<()>>) {
        let mut slot = self
            .feed_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = std::mem::replace(&mut *slot, handle) {
            previous.abort();
        }
    }

    async fn start_feed(&self) -> AppResult<JoinHandle<()>> {
        let modules = self.source.fetch_modules().await?;
        let mut feed = self.progress.watch_all_progress().await?;

        publish(&self.state, &modules, &feed.borrow_and_update());

        let state = Arc::clone(&self.state);
        Ok(tokio::spawn(async move {
            while feed.changed().await.is_ok() {
                let progress = feed.borrow_and_update().clone();
                publish(&state, &modules, &progress);
            }
            log::debug!("Progress feed closed");
        }))
    }
}

impl Drop for ModuleListService {
    fn drop(&mut self) {
        self.replace_feed(None);
    }
}

fn publish(state: &watch::Sender<ModuleListState>, modules: &[Module], progress: &[ModuleProgress]) {
    state.send_replace(ModuleListState {
        is_loading: false,
        modules: join_progress(modules, progress),
        error: None,
    });
}
