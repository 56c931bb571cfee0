use quizapp::{
    app_state::AppState,
    config::Config,
    models::domain::{ModuleStatus, QuizResult},
};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env();
    let state = match AppState::new(config.clone()).await {
        Ok(state) => state,
        Err(e) => {
            log::warn!("Progress store unavailable ({}); progress will not be kept", e);
            AppState::in_memory(config).map_err(|e| std::io::Error::other(e.to_string()))?
        }
    };

    let modules = state.module_list();
    modules.load().await;
    let list = modules.snapshot();

    if let Some(error) = &list.error {
        let category = list.error_category().map(|c| c.headline()).unwrap_or("Error");
        eprintln!("{}: {}", category, error);
        std::process::exit(1);
    }

    for entry in &list.modules {
        let status = match (entry.status(), &entry.progress) {
            (ModuleStatus::Completed, Some(progress)) => {
                let result = QuizResult::from_progress(progress);
                format!(
                    "completed {}/{} ({:.0}%)",
                    result.correct, result.total, result.percentage
                )
            }
            (ModuleStatus::InProgress, Some(progress)) => format!(
                "in progress, question {}/{}",
                progress.last_question_index + 1,
                progress.total_questions
            ),
            _ => "not started".to_string(),
        };
        println!("{:<12} {:<40} {}", entry.module.id, entry.module.display_title(), status);
    }

    Ok(())
}
