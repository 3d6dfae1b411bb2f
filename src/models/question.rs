use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    pub question_text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default)]
    pub answers: Vec<AnswerOption>,
    #[serde(default = "default_points")]
    pub points: i32,
}

fn default_points() -> i32 {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    MultipleSelect,
    ShortAnswer,
}

impl QuestionType {
    /// At most one option may be selected.
    pub fn is_single_select(self) -> bool {
        matches!(self, QuestionType::MultipleChoice | QuestionType::TrueFalse)
    }

    pub fn is_free_text(self) -> bool {
        self == QuestionType::ShortAnswer
    }

    pub fn label(self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "Single Correct Answer",
            QuestionType::TrueFalse => "True/False",
            QuestionType::MultipleSelect => "Multiple Correct Answers",
            QuestionType::ShortAnswer => "Fill in the Blank",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOption {
    pub id: Uuid,
    pub answer_text: String,
    /// Withheld by the backend for choice questions while taking a quiz.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

impl Question {
    pub fn has_option(&self, option_id: Uuid) -> bool {
        self.answers.iter().any(|a| a.id == option_id)
    }

    /// The option a free-text answer is matched against: the one flagged
    /// correct, otherwise the first option.
    pub fn correct_option(&self) -> Option<&AnswerOption> {
        self.answers
            .iter()
            .find(|a| a.is_correct == Some(true))
            .or_else(|| self.answers.first())
    }
}
