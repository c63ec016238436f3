use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: PathBuf,
    /// Log directory, stdout if not set
    pub log_dir: Option<PathBuf>,
    pub ai: AiConfig,
    pub quiz: QuizConfig,
    /// Timeout for a single generation request in seconds
    pub generation_timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from("database/study_mate.db"),
            log_dir: None,
            ai: AiConfig::default(),
            quiz: QuizConfig::default(),
            generation_timeout: 60,
        }
    }
}

impl Config {
    /// Load from a toml file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let config = toml::from_str::<Config>(&content)
            .with_context(|| format!("parse config {}", path.display()))?;
        Ok(config)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout)
    }
}

#[derive(Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AiConfig {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
}

impl std::fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl AiConfig {
    pub fn new(api_key: impl Into<String>, base_url: Option<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            base_url,
            model: Some(model.into()),
        }
    }

    /// Falls back to `OPENAI_API_KEY` from the environment or `.env`.
    pub fn api_key(&self) -> anyhow::Result<String> {
        match &self.api_key {
            Some(key) => Ok(key.clone()),
            None => dotenvy::var("OPENAI_API_KEY").context("OPENAI_API_KEY is not set"),
        }
    }

    pub fn base_url(&self) -> Option<String> {
        self.base_url
            .clone()
            .or_else(|| dotenvy::var("OPENAI_BASE_URL").ok())
    }

    pub fn model(&self) -> String {
        self.model
            .clone()
            .or_else(|| dotenvy::var("AI_MODEL").ok())
            .unwrap_or_else(|| "gpt-4o-mini".to_string())
    }
}

/// Bounds for the number of questions a user may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    pub min_questions: usize,
    pub max_questions: usize,
    pub default_questions: usize,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            min_questions: 5,
            max_questions: 20,
            default_questions: 10,
        }
    }
}

impl QuizConfig {
    pub fn contains(&self, count: usize) -> bool {
        (self.min_questions..=self.max_questions).contains(&count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            generation_timeout = 30

            [quiz]
            max_questions = 15
            "#,
        )
        .unwrap();
        assert_eq!(config.generation_timeout(), Duration::from_secs(30));
        assert_eq!(config.quiz.min_questions, 5);
        assert_eq!(config.quiz.max_questions, 15);
        assert_eq!(config.quiz.default_questions, 10);
        assert_eq!(config.database, PathBuf::from("database/study_mate.db"));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("study_mate.toml");
        std::fs::write(
            &path,
            "database = \"notes.db\"\n[ai]\nmodel = \"gemini-2.5-flash\"\napi_key = \"k\"\n",
        )
        .unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.database, PathBuf::from("notes.db"));
        assert_eq!(config.ai.model(), "gemini-2.5-flash");
        assert_eq!(config.ai.api_key().unwrap(), "k");
        assert!(!format!("{:?}", config.ai).contains("\"k\""));
    }

    #[test]
    fn explicit_ai_settings_skip_env() {
        let ai = AiConfig::new("key", Some("http://localhost:11434/v1".into()), "llama3");
        assert_eq!(ai.api_key().unwrap(), "key");
        assert_eq!(ai.base_url().as_deref(), Some("http://localhost:11434/v1"));
        assert_eq!(ai.model(), "llama3");
    }

    #[test]
    fn missing_file_is_default() {
        let config = Config::load("/definitely/not/here.toml").unwrap();
        assert_eq!(config.quiz, QuizConfig::default());
    }

    #[test]
    fn quiz_bounds() {
        let quiz = QuizConfig::default();
        assert!(quiz.contains(5));
        assert!(quiz.contains(20));
        assert!(!quiz.contains(4));
        assert!(!quiz.contains(21));
    }
}
