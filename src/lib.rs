pub mod config;
pub mod dto;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use crate::error::{Error, Result};
pub use crate::services::attempt_service::{
    AttemptCommand, AttemptEvent, AttemptOutcome, AttemptRunner, AttemptService,
};
pub use crate::services::quiz_api::{HttpQuizApi, QuizApi};
