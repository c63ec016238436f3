use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Chapter not found: {0}")]
    ChapterNotFound(i64),
    #[error("Question count {count} is outside {min}..={max}")]
    InvalidCount { count: usize, min: usize, max: usize },
}

/// Failures of the text generation service, classified so callers can decide
/// whether a retry makes sense.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("quota exceeded: {0}")]
    Quota(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("service error: {0}")]
    Service(String),
}

impl GenerationError {
    /// Auth failures won't go away by asking again.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, GenerationError::Auth(_))
    }
}

impl From<async_openai::error::OpenAIError> for GenerationError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        use async_openai::error::OpenAIError;
        match err {
            OpenAIError::Reqwest(e) => {
                if e.is_timeout() {
                    GenerationError::Network(format!("timeout: {e}"))
                } else if e.status().is_some_and(|s| s.as_u16() == 401 || s.as_u16() == 403) {
                    GenerationError::Auth(e.to_string())
                } else if e.status().is_some_and(|s| s.as_u16() == 429) {
                    GenerationError::Quota(e.to_string())
                } else {
                    GenerationError::Network(e.to_string())
                }
            }
            OpenAIError::ApiError(api) => {
                let tag = format!(
                    "{} {}",
                    api.r#type.as_deref().unwrap_or_default(),
                    api.code.as_deref().unwrap_or_default()
                );
                if tag.contains("invalid_api_key") || tag.contains("authentication") {
                    GenerationError::Auth(api.message)
                } else if tag.contains("quota") || tag.contains("rate_limit") {
                    GenerationError::Quota(api.message)
                } else {
                    GenerationError::Service(api.message)
                }
            }
            other => GenerationError::Service(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_is_not_retryable() {
        assert!(!GenerationError::Auth("bad key".into()).is_retryable());
        assert!(GenerationError::Timeout(Duration::from_secs(3)).is_retryable());
        assert!(GenerationError::Quota("slow down".into()).is_retryable());
        assert!(GenerationError::Network("reset".into()).is_retryable());
    }

    #[test]
    fn crate_error_messages() {
        assert_eq!(Error::ChapterNotFound(42).to_string(), "Chapter not found: 42");
        let e = Error::InvalidCount {
            count: 3,
            min: 5,
            max: 20,
        };
        assert_eq!(e.to_string(), "Question count 3 is outside 5..=20");
    }

    #[test]
    fn timeout_message() {
        let e = GenerationError::Timeout(Duration::from_secs(60));
        assert_eq!(e.to_string(), "request timed out after 60s");
    }
}
