use uuid::Uuid;

use crate::models::answer::{AnswerResponse, QuizAnswer};
use crate::models::question::Question;
use crate::models::quiz::Quiz;

/// Per-question answer state, indexed in quiz order.
#[derive(Debug, Clone)]
pub struct AnswerStore {
    answers: Vec<QuizAnswer>,
    /// Valid option ids per question, same order as `answers`.
    options: Vec<Vec<Uuid>>,
}

impl AnswerStore {
    pub fn new(quiz: &Quiz) -> Self {
        let answers = quiz
            .questions
            .iter()
            .map(|q| QuizAnswer {
                question_id: q.id,
                response: AnswerResponse::empty_for(q.question_type),
                time_spent_ms: 0,
            })
            .collect();
        let options = quiz
            .questions
            .iter()
            .map(|q: &Question| q.answers.iter().map(|a| a.id).collect())
            .collect();

        Self { answers, options }
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn answers(&self) -> &[QuizAnswer] {
        &self.answers
    }

    pub fn get(&self, index: usize) -> Option<&QuizAnswer> {
        self.answers.get(index)
    }

    pub fn find(&self, question_id: Uuid) -> Option<&QuizAnswer> {
        self.answers.iter().find(|a| a.question_id == question_id)
    }

    fn position(&self, question_id: Uuid) -> Option<usize> {
        self.answers.iter().position(|a| a.question_id == question_id)
    }

    /// Replaces the selection on single-select questions, toggles it on
    /// multi-select ones. Returns whether anything changed.
    pub fn select_option(&mut self, question_id: Uuid, option_id: Uuid) -> bool {
        let Some(idx) = self.position(question_id) else {
            tracing::debug!(%question_id, "select on unknown question ignored");
            return false;
        };
        if !self.options[idx].contains(&option_id) {
            tracing::debug!(%question_id, %option_id, "select of foreign option ignored");
            return false;
        }

        match &mut self.answers[idx].response {
            AnswerResponse::Single(selected) => {
                if *selected == Some(option_id) {
                    return false;
                }
                *selected = Some(option_id);
                true
            }
            AnswerResponse::Multi(selected) => {
                if let Some(pos) = selected.iter().position(|id| *id == option_id) {
                    selected.remove(pos);
                } else {
                    selected.push(option_id);
                }
                true
            }
            AnswerResponse::Text(_) => false,
        }
    }

    pub fn set_text(&mut self, question_id: Uuid, text: &str) -> bool {
        let Some(idx) = self.position(question_id) else {
            tracing::debug!(%question_id, "text on unknown question ignored");
            return false;
        };

        match &mut self.answers[idx].response {
            AnswerResponse::Text(current) => {
                if current == text {
                    return false;
                }
                *current = text.to_string();
                true
            }
            _ => false,
        }
    }

    pub fn add_time(&mut self, index: usize, elapsed_ms: u64) {
        if let Some(answer) = self.answers.get_mut(index) {
            answer.time_spent_ms = answer.time_spent_ms.saturating_add(elapsed_ms);
        }
    }

    pub fn is_answered(&self, index: usize) -> bool {
        self.answers
            .get(index)
            .map(|a| a.response.is_answered())
            .unwrap_or(false)
    }

    pub fn answered_flags(&self) -> Vec<bool> {
        self.answers.iter().map(|a| a.response.is_answered()).collect()
    }

    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.response.is_answered()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{AnswerOption, QuestionType};

    fn option(text: &str) -> AnswerOption {
        AnswerOption {
            id: Uuid::new_v4(),
            answer_text: text.to_string(),
            is_correct: None,
        }
    }

    fn question(question_type: QuestionType, options: Vec<AnswerOption>) -> Question {
        Question {
            id: Uuid::new_v4(),
            question_text: "?".into(),
            question_type,
            answers: options,
            points: 1,
        }
    }

    fn quiz(questions: Vec<Question>) -> Quiz {
        Quiz {
            id: Uuid::new_v4(),
            title: "Store".into(),
            description: None,
            time_limit: None,
            difficulty: None,
            questions,
        }
    }

    #[test]
    fn one_answer_per_question_at_load() {
        let q = quiz(vec![
            question(QuestionType::MultipleChoice, vec![option("a")]),
            question(QuestionType::ShortAnswer, vec![option("x")]),
        ]);
        let store = AnswerStore::new(&q);

        assert_eq!(store.len(), 2);
        assert_eq!(store.answers()[0].question_id, q.questions[0].id);
        assert_eq!(store.answers()[1].response, AnswerResponse::Text(String::new()));
        assert!(store.answers().iter().all(|a| a.time_spent_ms == 0));
    }

    #[test]
    fn single_choice_second_selection_replaces_first() {
        let (a, b) = (option("a"), option("b"));
        let (a_id, b_id) = (a.id, b.id);
        let q = quiz(vec![question(QuestionType::MultipleChoice, vec![a, b])]);
        let qid = q.questions[0].id;
        let mut store = AnswerStore::new(&q);

        assert!(store.select_option(qid, a_id));
        assert!(store.select_option(qid, b_id));

        assert_eq!(store.find(qid).unwrap().response.selected_ids(), vec![b_id]);
    }

    #[test]
    fn true_false_keeps_at_most_one() {
        let (t, f) = (option("True"), option("False"));
        let (t_id, f_id) = (t.id, f.id);
        let q = quiz(vec![question(QuestionType::TrueFalse, vec![t, f])]);
        let qid = q.questions[0].id;
        let mut store = AnswerStore::new(&q);

        store.select_option(qid, t_id);
        store.select_option(qid, f_id);
        store.select_option(qid, f_id);

        assert_eq!(store.find(qid).unwrap().response.selected_ids(), vec![f_id]);
    }

    #[test]
    fn multi_select_toggles_membership() {
        let (a, b) = (option("a"), option("b"));
        let (a_id, b_id) = (a.id, b.id);
        let q = quiz(vec![question(QuestionType::MultipleSelect, vec![a, b])]);
        let qid = q.questions[0].id;
        let mut store = AnswerStore::new(&q);

        store.select_option(qid, a_id);
        let before = store.find(qid).unwrap().response.clone();
        store.select_option(qid, b_id);
        store.select_option(qid, b_id);

        assert_eq!(store.find(qid).unwrap().response, before);
        store.select_option(qid, a_id);
        assert!(!store.is_answered(0));
    }

    #[test]
    fn unknown_question_and_foreign_option_are_ignored() {
        let a = option("a");
        let q = quiz(vec![question(QuestionType::MultipleChoice, vec![a])]);
        let qid = q.questions[0].id;
        let mut store = AnswerStore::new(&q);

        assert!(!store.select_option(Uuid::new_v4(), Uuid::new_v4()));
        assert!(!store.select_option(qid, Uuid::new_v4()));
        assert!(!store.set_text(Uuid::new_v4(), "hello"));
        assert_eq!(store.answered_count(), 0);
    }

    #[test]
    fn text_only_applies_to_free_text_questions() {
        let q = quiz(vec![
            question(QuestionType::ShortAnswer, vec![option("Paris")]),
            question(QuestionType::MultipleChoice, vec![option("a")]),
        ]);
        let (text_q, choice_q) = (q.questions[0].id, q.questions[1].id);
        let mut store = AnswerStore::new(&q);

        assert!(store.set_text(text_q, "Par"));
        assert!(store.set_text(text_q, "Paris"));
        assert!(!store.set_text(choice_q, "Paris"));

        assert_eq!(store.find(text_q).unwrap().response.text(), Some("Paris"));
        assert_eq!(store.answered_flags(), vec![true, false]);
    }

    #[test]
    fn whitespace_text_does_not_count_as_answered() {
        let q = quiz(vec![question(QuestionType::ShortAnswer, vec![option("Paris")])]);
        let qid = q.questions[0].id;
        let mut store = AnswerStore::new(&q);

        store.set_text(qid, "   ");
        assert!(!store.is_answered(0));
    }

    #[test]
    fn time_accumulates() {
        let q = quiz(vec![question(QuestionType::MultipleChoice, vec![option("a")])]);
        let mut store = AnswerStore::new(&q);

        store.add_time(0, 1_500);
        store.add_time(0, 250);
        store.add_time(7, 1_000);

        assert_eq!(store.get(0).unwrap().time_spent_ms, 1_750);
    }
}
