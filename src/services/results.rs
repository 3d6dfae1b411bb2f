use serde::Serialize;

use crate::models::quiz_attempt::QuizAttempt;
use crate::utils::time::{format_clock, seconds_between};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    High,
    Medium,
    Low,
}

impl ScoreBand {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 80.0 {
            ScoreBand::High
        } else if percentage >= 60.0 {
            ScoreBand::Medium
        } else {
            ScoreBand::Low
        }
    }
}

pub fn grade_letter(percentage: f64) -> char {
    match percentage {
        p if p >= 90.0 => 'A',
        p if p >= 80.0 => 'B',
        p if p >= 70.0 => 'C',
        p if p >= 60.0 => 'D',
        _ => 'F',
    }
}

/// What the results view shows for a scored attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptSummary {
    pub attempt_id: uuid::Uuid,
    pub score: f64,
    pub total_points: f64,
    pub percentage: f64,
    pub grade: char,
    pub band: ScoreBand,
    pub correct: usize,
    pub incorrect: usize,
    pub average_secs_per_question: u64,
    pub duration: String,
}

impl AttemptSummary {
    pub fn from_attempt(attempt: &QuizAttempt) -> Self {
        let correct = attempt.user_answers.iter().filter(|a| a.is_correct).count();
        let incorrect = attempt.user_answers.len() - correct;

        let average_secs_per_question = if attempt.user_answers.is_empty() {
            0
        } else {
            let total_ms: u64 = attempt.user_answers.iter().map(|a| a.time_spent).sum();
            total_ms / attempt.user_answers.len() as u64 / 1000
        };

        let finished_at = attempt.finished_at.unwrap_or(attempt.started_at);

        Self {
            attempt_id: attempt.id,
            score: attempt.score,
            total_points: attempt.total_points,
            percentage: attempt.percentage,
            grade: grade_letter(attempt.percentage),
            band: ScoreBand::from_percentage(attempt.percentage),
            correct,
            incorrect,
            average_secs_per_question,
            duration: format_clock(seconds_between(attempt.started_at, finished_at)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quiz_attempt::UserAnswer;
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn answer(is_correct: bool, time_spent: u64) -> UserAnswer {
        UserAnswer {
            question_id: Uuid::new_v4(),
            selected_answer_ids: vec![],
            is_correct,
            points_earned: if is_correct { 1.0 } else { 0.0 },
            time_spent,
        }
    }

    #[test]
    fn grade_boundaries() {
        assert_eq!(grade_letter(90.0), 'A');
        assert_eq!(grade_letter(89.9), 'B');
        assert_eq!(grade_letter(70.0), 'C');
        assert_eq!(grade_letter(60.0), 'D');
        assert_eq!(grade_letter(59.99), 'F');
        assert_eq!(ScoreBand::from_percentage(80.0), ScoreBand::High);
        assert_eq!(ScoreBand::from_percentage(79.0), ScoreBand::Medium);
        assert_eq!(ScoreBand::from_percentage(10.0), ScoreBand::Low);
    }

    #[test]
    fn summarises_attempt() {
        let attempt = QuizAttempt {
            id: Uuid::new_v4(),
            quiz_id: Uuid::new_v4(),
            score: 2.0,
            total_points: 3.0,
            percentage: 66.67,
            started_at: at("2024-05-01T10:00:00Z"),
            finished_at: Some(at("2024-05-01T10:01:35Z")),
            user_answers: vec![answer(true, 20_000), answer(false, 40_000), answer(true, 30_000)],
        };

        let summary = AttemptSummary::from_attempt(&attempt);

        assert_eq!(summary.correct, 2);
        assert_eq!(summary.incorrect, 1);
        assert_eq!(summary.average_secs_per_question, 30);
        assert_eq!(summary.grade, 'D');
        assert_eq!(summary.band, ScoreBand::Medium);
        assert_eq!(summary.duration, "1:35");
    }

    #[test]
    fn unfinished_attempt_has_zero_duration() {
        let attempt = QuizAttempt {
            id: Uuid::new_v4(),
            quiz_id: Uuid::new_v4(),
            score: 0.0,
            total_points: 0.0,
            percentage: 0.0,
            started_at: at("2024-05-01T10:00:00Z"),
            finished_at: None,
            user_answers: vec![],
        };

        let summary = AttemptSummary::from_attempt(&attempt);
        assert_eq!(summary.duration, "0:00");
        assert_eq!(summary.average_secs_per_question, 0);
    }
}
