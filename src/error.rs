pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid quiz: {0}")]
    InvalidQuiz(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("A submission is already in flight")]
    SubmissionInFlight,

    #[error("The attempt has already been submitted")]
    AlreadySubmitted,

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl Error {
    /// Message shown to the person taking the quiz.
    pub fn user_message(&self) -> String {
        match self {
            Error::NotFound(_) | Error::InvalidQuiz(_) | Error::Validation(_) => {
                "Quiz not found or failed to load.".to_string()
            }
            Error::SubmissionInFlight => "Submission already in progress.".to_string(),
            Error::AlreadySubmitted => "This attempt has already been submitted.".to_string(),
            Error::Api { message, .. } if !message.is_empty() => message.clone(),
            Error::Reqwest(err) if err.is_timeout() => {
                "The quiz service did not respond in time. Please try again.".to_string()
            }
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }
}
