use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A scored attempt as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttempt {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub score: f64,
    pub total_points: f64,
    pub percentage: f64,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_answers: Vec<UserAnswer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnswer {
    pub question_id: Uuid,
    #[serde(default)]
    pub selected_answer_ids: Vec<Uuid>,
    pub is_correct: bool,
    #[serde(default)]
    pub points_earned: f64,
    /// Milliseconds.
    #[serde(default)]
    pub time_spent: u64,
}
