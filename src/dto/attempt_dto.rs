use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: Uuid,
    pub selected_answer_ids: Vec<Uuid>,
    /// Milliseconds spent on the question.
    pub time_spent: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizAttemptRequest {
    pub quiz_id: Uuid,
    pub answers: Vec<SubmittedAnswer>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizAttemptResponse {
    pub id: Uuid,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub percentage: Option<f64>,
}

impl SubmitQuizAttemptResponse {
    pub fn results_path(&self) -> String {
        format!("/results/{}", self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionView {
    pub id: Uuid,
    pub text: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: Uuid,
    pub text: String,
    pub type_label: String,
    pub points: i32,
    pub multi_select: bool,
    pub options: Vec<OptionView>,
    /// Present only for free-text questions.
    pub text_answer: Option<String>,
}

/// Everything a front-end needs to render the attempt at one moment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptSnapshot {
    pub quiz_title: String,
    pub current_index: usize,
    pub question_count: usize,
    pub progress_percent: f64,
    pub question: Option<QuestionView>,
    pub answered: Vec<bool>,
    pub time_remaining_secs: Option<u32>,
    pub is_last_question: bool,
    pub submitting: bool,
}
