use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::{
    config::Config,
    errors::{AppError, AppResult},
    models::domain::{Module, Question},
};

/// Where modules and their question sets come from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizSource: Send + Sync {
    async fn fetch_modules(&self) -> AppResult<Vec<Module>>;
    async fn fetch_questions(&self, questions_url: &str) -> AppResult<Vec<Question>>;
}

pub struct HttpQuizSource {
    client: Client,
    base_url: Url,
    modules_path: String,
}

impl HttpQuizSource {
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = Client::builder().timeout(config.http_timeout()).build()?;
        let base_url = Url::parse(&config.api_base_url).map_err(|e| {
            AppError::Validation(format!("Invalid API base URL '{}': {}", config.api_base_url, e))
        })?;

        Ok(Self {
            client,
            base_url,
            modules_path: config.modules_path.clone(),
        })
    }

    /// Absolute URLs are used as-is; anything else is joined onto the base URL.
    pub fn resolve(&self, url: &str) -> AppResult<Url> {
        match Url::parse(url) {
            Ok(absolute) => Ok(absolute),
            Err(_) => self
                .base_url
                .join(url)
                .map_err(|e| AppError::Validation(format!("Invalid URL '{}': {}", url, e))),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> AppResult<T> {
        log::debug!("GET {}", url);
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<T>()
            .await?;
        Ok(body)
    }
}

#[async_trait]
impl QuizSource for HttpQuizSource {
    async fn fetch_modules(&self) -> AppResult<Vec<Module>> {
        let url = self.resolve(&self.modules_path)?;
        let modules: Vec<Module> = self.get_json(url).await?;
        log::info!("Fetched {} modules", modules.len());
        Ok(modules)
    }

    async fn fetch_questions(&self, questions_url: &str) -> AppResult<Vec<Question>> {
        let url = self.resolve(questions_url)?;
        let questions: Vec<Question> = self.get_json(url).await?;

        for question in &questions {
            question.validate().map_err(|e| {
                AppError::Validation(format!("Question {} is malformed: {}", question.id, e))
            })?;
        }

        log::info!("Fetched {} questions from {}", questions.len(), questions_url);
        Ok(questions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> HttpQuizSource {
        let mut config = Config::test_config();
        config.api_base_url = "https://gist.example.com/quiz/".to_string();
        HttpQuizSource::new(&config).expect("test config is valid")
    }

    #[test]
    fn relative_urls_are_joined_onto_base() {
        let url = source().resolve("abc123/raw").expect("url should resolve");
        assert_eq!(url.as_str(), "https://gist.example.com/quiz/abc123/raw");
    }

    #[test]
    fn absolute_urls_are_kept() {
        let url = source()
            .resolve("https://other.example.com/questions.json")
            .expect("url should resolve");
        assert_eq!(url.as_str(), "https://other.example.com/questions.json");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let mut config = Config::test_config();
        config.api_base_url = "not a url".to_string();

        let err = HttpQuizSource::new(&config).err().expect("base url should be rejected");
        assert!(matches!(err, AppError::Validation(_)));
    }
}
