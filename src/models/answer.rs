use uuid::Uuid;

use crate::models::question::QuestionType;

/// What the user has entered for one question, shaped by its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerResponse {
    /// Single-choice and true/false.
    Single(Option<Uuid>),
    /// Multi-select, in selection order.
    Multi(Vec<Uuid>),
    /// Free text; matched against the correct option at submission.
    Text(String),
}

impl AnswerResponse {
    pub fn empty_for(question_type: QuestionType) -> Self {
        match question_type {
            QuestionType::MultipleChoice | QuestionType::TrueFalse => AnswerResponse::Single(None),
            QuestionType::MultipleSelect => AnswerResponse::Multi(Vec::new()),
            QuestionType::ShortAnswer => AnswerResponse::Text(String::new()),
        }
    }

    pub fn selected_ids(&self) -> Vec<Uuid> {
        match self {
            AnswerResponse::Single(selected) => selected.iter().copied().collect(),
            AnswerResponse::Multi(selected) => selected.clone(),
            AnswerResponse::Text(_) => Vec::new(),
        }
    }

    pub fn is_selected(&self, option_id: Uuid) -> bool {
        match self {
            AnswerResponse::Single(selected) => *selected == Some(option_id),
            AnswerResponse::Multi(selected) => selected.contains(&option_id),
            AnswerResponse::Text(_) => false,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            AnswerResponse::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_answered(&self) -> bool {
        match self {
            AnswerResponse::Single(selected) => selected.is_some(),
            AnswerResponse::Multi(selected) => !selected.is_empty(),
            AnswerResponse::Text(text) => !text.trim().is_empty(),
        }
    }
}

/// Client-local answer record, one per question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizAnswer {
    pub question_id: Uuid,
    pub response: AnswerResponse,
    pub time_spent_ms: u64,
}
