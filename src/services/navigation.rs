use tokio::time::Instant;

use crate::services::answer_store::AnswerStore;

/// Tracks which question is on screen and since when.
#[derive(Debug, Clone)]
pub struct Navigator {
    current: usize,
    question_count: usize,
    entered_at: Instant,
}

impl Navigator {
    pub fn new(question_count: usize, now: Instant) -> Self {
        Self {
            current: 0,
            question_count,
            entered_at: now,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn question_count(&self) -> usize {
        self.question_count
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.question_count
    }

    /// Moves to `index`, charging the time spent on the question being left.
    /// Out-of-range targets and the current index are ignored. Returns
    /// whether the position changed.
    pub fn go_to(&mut self, index: isize, store: &mut AnswerStore, now: Instant) -> bool {
        let Ok(target) = usize::try_from(index) else {
            return false;
        };
        if target >= self.question_count || target == self.current {
            return false;
        }

        self.flush(store, now);
        tracing::debug!(from = self.current, to = target, "navigating");
        self.current = target;
        true
    }

    pub fn next(&mut self, store: &mut AnswerStore, now: Instant) -> bool {
        self.go_to(self.current as isize + 1, store, now)
    }

    pub fn previous(&mut self, store: &mut AnswerStore, now: Instant) -> bool {
        self.go_to(self.current as isize - 1, store, now)
    }

    /// Charges elapsed time to the current question and restarts its clock.
    pub fn flush(&mut self, store: &mut AnswerStore, now: Instant) {
        let elapsed = now.saturating_duration_since(self.entered_at);
        store.add_time(self.current, elapsed.as_millis() as u64);
        self.entered_at = now;
    }

    pub fn progress_percent(&self) -> f64 {
        if self.question_count == 0 {
            return 0.0;
        }
        (self.current + 1) as f64 / self.question_count as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{AnswerOption, Question, QuestionType};
    use crate::models::quiz::Quiz;
    use std::time::Duration;
    use uuid::Uuid;

    fn store_with(count: usize) -> AnswerStore {
        let questions = (0..count)
            .map(|i| Question {
                id: Uuid::new_v4(),
                question_text: format!("Q{}", i + 1),
                question_type: QuestionType::MultipleChoice,
                answers: vec![AnswerOption {
                    id: Uuid::new_v4(),
                    answer_text: "a".into(),
                    is_correct: None,
                }],
                points: 1,
            })
            .collect();
        AnswerStore::new(&Quiz {
            id: Uuid::new_v4(),
            title: "Nav".into(),
            description: None,
            time_limit: None,
            difficulty: None,
            questions,
        })
    }

    #[test]
    fn out_of_range_is_ignored() {
        let start = Instant::now();
        let mut store = store_with(3);
        let mut nav = Navigator::new(3, start);

        assert!(!nav.go_to(-1, &mut store, start + Duration::from_secs(1)));
        assert!(!nav.go_to(3, &mut store, start + Duration::from_secs(1)));

        assert_eq!(nav.current(), 0);
        assert_eq!(store.get(0).unwrap().time_spent_ms, 0);
    }

    #[test]
    fn leaving_a_question_charges_its_time() {
        let start = Instant::now();
        let mut store = store_with(3);
        let mut nav = Navigator::new(3, start);

        assert!(nav.next(&mut store, start + Duration::from_millis(1_200)));
        assert!(nav.next(&mut store, start + Duration::from_millis(2_000)));
        assert!(nav.previous(&mut store, start + Duration::from_millis(2_500)));

        assert_eq!(nav.current(), 1);
        assert_eq!(store.get(0).unwrap().time_spent_ms, 1_200);
        assert_eq!(store.get(1).unwrap().time_spent_ms, 800);
        assert_eq!(store.get(2).unwrap().time_spent_ms, 500);
    }

    #[test]
    fn going_to_current_index_does_not_double_count() {
        let start = Instant::now();
        let mut store = store_with(2);
        let mut nav = Navigator::new(2, start);

        assert!(!nav.go_to(0, &mut store, start + Duration::from_millis(400)));
        assert_eq!(store.get(0).unwrap().time_spent_ms, 0);

        nav.go_to(1, &mut store, start + Duration::from_millis(1_000));
        assert_eq!(store.get(0).unwrap().time_spent_ms, 1_000);
    }

    #[test]
    fn previous_on_first_and_next_on_last_are_ignored() {
        let start = Instant::now();
        let mut store = store_with(2);
        let mut nav = Navigator::new(2, start);

        assert!(!nav.previous(&mut store, start));
        nav.next(&mut store, start);
        assert!(nav.is_last());
        assert!(!nav.next(&mut store, start));
        assert_eq!(nav.current(), 1);
    }

    #[test]
    fn flush_restarts_the_clock() {
        let start = Instant::now();
        let mut store = store_with(1);
        let mut nav = Navigator::new(1, start);

        nav.flush(&mut store, start + Duration::from_millis(700));
        nav.flush(&mut store, start + Duration::from_millis(900));

        assert_eq!(store.get(0).unwrap().time_spent_ms, 900);
    }

    #[test]
    fn progress_counts_current_question() {
        let start = Instant::now();
        let mut store = store_with(4);
        let mut nav = Navigator::new(4, start);
        nav.go_to(1, &mut store, start);
        assert_eq!(nav.progress_percent(), 50.0);
    }
}
