use chrono::{DateTime, Utc};

use crate::dto::attempt_dto::{SubmitQuizAttemptRequest, SubmittedAnswer};
use crate::models::answer::{AnswerResponse, QuizAnswer};
use crate::models::question::Question;
use crate::models::quiz::Quiz;
use crate::services::answer_store::AnswerStore;

/// Builds the wire payload for an attempt. One entry per question, in quiz
/// order, answered or not.
pub fn assemble(
    quiz: &Quiz,
    store: &AnswerStore,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
) -> SubmitQuizAttemptRequest {
    let answers = quiz
        .questions
        .iter()
        .zip(store.answers())
        .map(|(question, answer)| submitted_answer(question, answer))
        .collect();

    SubmitQuizAttemptRequest {
        quiz_id: quiz.id,
        answers,
        started_at,
        finished_at,
    }
}

fn submitted_answer(question: &Question, answer: &QuizAnswer) -> SubmittedAnswer {
    let selected_answer_ids = match &answer.response {
        AnswerResponse::Text(text) => match question.correct_option() {
            Some(correct) if text.trim() == correct.answer_text.trim() => vec![correct.id],
            _ => Vec::new(),
        },
        other => other.selected_ids(),
    };

    SubmittedAnswer {
        question_id: answer.question_id,
        selected_answer_ids,
        time_spent: answer.time_spent_ms,
    }
}
