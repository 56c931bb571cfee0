use std::env;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://gist.githubusercontent.com/dr-samrat/";
pub const DEFAULT_MODULES_PATH: &str = "ee986f16da9d8303c1acfd364ece22c5/raw";

#[derive(Clone, Debug)]
pub struct Config {
    pub mongo_conn_string: String,
    pub mongo_db_name: String,
    pub api_base_url: String,
    pub modules_path: String,
    pub progress_collection: String,
    pub answers_collection: String,
    pub http_timeout_secs: u64,
    pub auto_advance_delay_ms: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            mongo_conn_string: env::var("MONGO_CONN_STRING")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongo_db_name: env::var("MONGO_DB_NAME").unwrap_or_else(|_| "quizapp-local".to_string()),
            api_base_url: env::var("QUIZ_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),
            modules_path: env::var("QUIZ_MODULES_PATH")
                .unwrap_or_else(|_| DEFAULT_MODULES_PATH.to_string()),
            progress_collection: env::var("PROGRESS_COLLECTION")
                .unwrap_or_else(|_| "module_progress".to_string()),
            answers_collection: env::var("ANSWERS_COLLECTION")
                .unwrap_or_else(|_| "user_answers".to_string()),
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(15),
            auto_advance_delay_ms: env::var("AUTO_ADVANCE_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2000),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn auto_advance_delay(&self) -> Duration {
        Duration::from_millis(self.auto_advance_delay_ms)
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            mongo_conn_string: "mongodb://localhost:27017".to_string(),
            mongo_db_name: "quizapp-test".to_string(),
            api_base_url: "http://127.0.0.1:9/".to_string(),
            modules_path: "modules.json".to_string(),
            progress_collection: "module_progress".to_string(),
            answers_collection: "user_answers".to_string(),
            http_timeout_secs: 1,
            auto_advance_delay_ms: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env_with_defaults() {
        let config = Config::from_env();

        // Should use env vars if set, or fall back to defaults
        assert!(!config.mongo_conn_string.is_empty());
        assert!(!config.mongo_db_name.is_empty());
        assert!(!config.api_base_url.is_empty());
        assert!(config.http_timeout_secs > 0);
    }

    #[test]
    fn test_test_config() {
        let config = Config::test_config();

        assert_eq!(config.mongo_db_name, "quizapp-test");
        assert_eq!(config.progress_collection, "module_progress");
        assert_eq!(config.answers_collection, "user_answers");
        assert_eq!(config.auto_advance_delay(), Duration::from_millis(20));
        assert_eq!(config.http_timeout(), Duration::from_secs(1));
    }
}
