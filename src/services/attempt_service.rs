use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::Instant;
use uuid::Uuid;
use validator::Validate;

use crate::dto::attempt_dto::{
    AttemptSnapshot, OptionView, QuestionView, SubmitQuizAttemptRequest, SubmitQuizAttemptResponse,
};
use crate::error::{Error, Result};
use crate::models::answer::QuizAnswer;
use crate::models::question::{Question, QuestionType};
use crate::models::quiz::Quiz;
use crate::services::answer_store::AnswerStore;
use crate::services::countdown::{Countdown, CountdownEvent};
use crate::services::navigation::Navigator;
use crate::services::quiz_api::QuizApi;
use crate::services::results::AttemptSummary;
use crate::services::submission;
use crate::utils::time;

pub const DEFAULT_LOW_TIME_WARNING_SECS: u32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitPhase {
    Idle,
    InFlight,
    Submitted,
}

/// All state of one attempt, owned by a single runner.
#[derive(Debug)]
pub struct AttemptSession {
    quiz: Quiz,
    store: AnswerStore,
    navigator: Navigator,
    started_at: DateTime<Utc>,
    started_instant: Instant,
    time_remaining: Option<u32>,
    expired: bool,
    phase: SubmitPhase,
    low_time_warning_secs: u32,
}

impl AttemptSession {
    pub fn new(quiz: Quiz, now: Instant) -> Self {
        let store = AnswerStore::new(&quiz);
        let navigator = Navigator::new(quiz.questions.len(), now);
        let time_remaining = quiz.time_limit_secs();

        Self {
            quiz,
            store,
            navigator,
            started_at: Utc::now(),
            started_instant: now,
            time_remaining,
            expired: false,
            phase: SubmitPhase::Idle,
            low_time_warning_secs: DEFAULT_LOW_TIME_WARNING_SECS,
        }
    }

    pub fn with_low_time_warning(mut self, secs: u32) -> Self {
        self.low_time_warning_secs = secs;
        self
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn answers(&self) -> &[QuizAnswer] {
        self.store.answers()
    }

    pub fn phase(&self) -> SubmitPhase {
        self.phase
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn current_index(&self) -> usize {
        self.navigator.current()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.quiz.questions.get(self.navigator.current())
    }

    pub fn current_answer(&self) -> Option<&QuizAnswer> {
        self.store.get(self.navigator.current())
    }

    pub fn time_remaining(&self) -> Option<u32> {
        self.time_remaining
    }

    pub fn is_time_low(&self) -> bool {
        matches!(self.time_remaining, Some(secs) if secs < self.low_time_warning_secs)
    }

    fn is_editable(&self) -> bool {
        self.phase == SubmitPhase::Idle
    }

    pub fn select_option(&mut self, question_id: Uuid, option_id: Uuid) -> bool {
        self.is_editable() && self.store.select_option(question_id, option_id)
    }

    pub fn set_text(&mut self, question_id: Uuid, text: &str) -> bool {
        self.is_editable() && self.store.set_text(question_id, text)
    }

    pub fn go_to(&mut self, index: isize, now: Instant) -> bool {
        self.is_editable() && self.navigator.go_to(index, &mut self.store, now)
    }

    pub fn next(&mut self, now: Instant) -> bool {
        self.is_editable() && self.navigator.next(&mut self.store, now)
    }

    pub fn previous(&mut self, now: Instant) -> bool {
        self.is_editable() && self.navigator.previous(&mut self.store, now)
    }

    pub fn on_tick(&mut self, remaining_secs: u32) {
        self.time_remaining = Some(remaining_secs);
    }

    /// Records that the countdown hit zero. True only the first time.
    pub fn on_expired(&mut self) -> bool {
        if self.expired {
            return false;
        }
        self.expired = true;
        self.time_remaining = Some(0);
        true
    }

    /// Takes the submit lock and freezes the answers into a payload.
    pub fn begin_submit(&mut self, now: Instant) -> Result<SubmitQuizAttemptRequest> {
        match self.phase {
            SubmitPhase::InFlight => return Err(Error::SubmissionInFlight),
            SubmitPhase::Submitted => return Err(Error::AlreadySubmitted),
            SubmitPhase::Idle => {}
        }
        self.phase = SubmitPhase::InFlight;
        self.navigator.flush(&mut self.store, now);

        let elapsed = now.saturating_duration_since(self.started_instant);
        let finished_at = self.started_at
            + chrono::Duration::from_std(elapsed).unwrap_or_else(|_| chrono::Duration::zero());

        Ok(submission::assemble(
            &self.quiz,
            &self.store,
            self.started_at,
            finished_at,
        ))
    }

    /// Releases the submit lock; answers stay as they were.
    pub fn submit_failed(&mut self) {
        if self.phase == SubmitPhase::InFlight {
            self.phase = SubmitPhase::Idle;
        }
    }

    pub fn submit_succeeded(&mut self) {
        self.phase = SubmitPhase::Submitted;
    }

    pub fn snapshot(&self) -> AttemptSnapshot {
        let question = self.current_question().map(|q| {
            let answer = self.current_answer();
            QuestionView {
                id: q.id,
                text: q.question_text.clone(),
                type_label: q.question_type.label().to_string(),
                points: q.points,
                multi_select: q.question_type == QuestionType::MultipleSelect,
                options: if q.question_type.is_free_text() {
                    Vec::new()
                } else {
                    q.answers
                        .iter()
                        .map(|o| OptionView {
                            id: o.id,
                            text: o.answer_text.clone(),
                            selected: answer.map(|a| a.response.is_selected(o.id)).unwrap_or(false),
                        })
                        .collect()
                },
                text_answer: answer.and_then(|a| a.response.text()).map(str::to_string),
            }
        });

        AttemptSnapshot {
            quiz_title: self.quiz.title.clone(),
            current_index: self.navigator.current(),
            question_count: self.navigator.question_count(),
            progress_percent: self.navigator.progress_percent(),
            question,
            answered: self.store.answered_flags(),
            time_remaining_secs: self.time_remaining,
            is_last_question: self.navigator.is_last(),
            submitting: self.phase == SubmitPhase::InFlight,
        }
    }
}

/// Checks that a fetched quiz can be taken.
pub fn validate_for_taking(quiz: &Quiz) -> Result<()> {
    quiz.validate()?;

    let mut seen = HashSet::new();
    for question in &quiz.questions {
        if !seen.insert(question.id) {
            return Err(Error::InvalidQuiz(format!(
                "question {} appears more than once",
                question.id
            )));
        }
        if question.answers.is_empty() {
            return Err(Error::InvalidQuiz(format!(
                "question {} has no answer options",
                question.id
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptCommand {
    SelectOption { question_id: Uuid, option_id: Uuid },
    SetText { question_id: Uuid, text: String },
    GoTo(isize),
    Next,
    Previous,
    Submit,
    Abandon,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttemptEvent {
    Updated(AttemptSnapshot),
    Tick { remaining_secs: u32, low_time: bool },
    SubmitStarted { automatic: bool },
    SubmitFailed { message: String },
    Rejected { reason: String },
    Submitted(SubmitQuizAttemptResponse),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Submitted(SubmitQuizAttemptResponse),
    Abandoned,
}

#[derive(Clone)]
pub struct AttemptService {
    api: Arc<dyn QuizApi>,
    low_time_warning_secs: u32,
}

impl AttemptService {
    pub fn new(api: Arc<dyn QuizApi>) -> Self {
        Self {
            api,
            low_time_warning_secs: DEFAULT_LOW_TIME_WARNING_SECS,
        }
    }

    pub fn with_low_time_warning(mut self, secs: u32) -> Self {
        self.low_time_warning_secs = secs;
        self
    }

    /// Fetches a quiz and prepares an attempt on it.
    pub async fn load(&self, quiz_id: Uuid) -> Result<AttemptRunner> {
        let quiz = self.api.get_quiz_for_taking(quiz_id).await.map_err(|e| {
            tracing::error!(%quiz_id, error = %e, "failed to load quiz");
            e
        })?;
        validate_for_taking(&quiz)?;
        tracing::info!(
            %quiz_id,
            questions = quiz.questions.len(),
            time_limit = ?quiz.time_limit,
            "quiz loaded"
        );

        Ok(AttemptRunner {
            api: self.api.clone(),
            quiz,
            low_time_warning_secs: self.low_time_warning_secs,
        })
    }

    pub async fn results(&self, attempt_id: Uuid) -> Result<AttemptSummary> {
        let attempt = self.api.get_attempt_details(attempt_id).await?;
        Ok(AttemptSummary::from_attempt(&attempt))
    }
}

/// Event loop for one attempt: user commands, countdown events and submit
/// completions are handled one at a time on a single task.
pub struct AttemptRunner {
    api: Arc<dyn QuizApi>,
    quiz: Quiz,
    low_time_warning_secs: u32,
}

impl std::fmt::Debug for AttemptRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttemptRunner")
            .field("quiz", &self.quiz)
            .field("low_time_warning_secs", &self.low_time_warning_secs)
            .finish_non_exhaustive()
    }
}

impl AttemptRunner {
    pub fn new(api: Arc<dyn QuizApi>, quiz: Quiz) -> Self {
        Self {
            api,
            quiz,
            low_time_warning_secs: DEFAULT_LOW_TIME_WARNING_SECS,
        }
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub async fn run(
        self,
        mut commands: mpsc::Receiver<AttemptCommand>,
        events: mpsc::Sender<AttemptEvent>,
    ) -> Result<AttemptOutcome> {
        let AttemptRunner {
            api,
            quiz,
            low_time_warning_secs,
        } = self;

        let mut session =
            AttemptSession::new(quiz, Instant::now()).with_low_time_warning(low_time_warning_secs);

        let (tick_tx, mut tick_rx) = mpsc::channel(16);
        let mut countdown = session
            .quiz()
            .time_limit_secs()
            .map(|secs| Countdown::start(secs, tick_tx));
        let mut countdown_live = countdown.is_some();

        let (done_tx, mut done_rx) = mpsc::channel::<Result<SubmitQuizAttemptResponse>>(1);

        emit(&events, AttemptEvent::Updated(session.snapshot())).await;

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    None | Some(AttemptCommand::Abandon) => {
                        tracing::info!(quiz_id = %session.quiz().id, "attempt abandoned");
                        return Ok(AttemptOutcome::Abandoned);
                    }
                    Some(AttemptCommand::Submit) => {
                        start_submission(&mut session, &api, &done_tx, &events, false).await;
                    }
                    Some(command) => {
                        if apply(&mut session, command, Instant::now()) {
                            emit(&events, AttemptEvent::Updated(session.snapshot())).await;
                        }
                    }
                },
                event = tick_rx.recv(), if countdown_live => match event {
                    Some(CountdownEvent::Tick { remaining_secs }) => {
                        session.on_tick(remaining_secs);
                        let low_time = session.is_time_low();
                        emit(&events, AttemptEvent::Tick { remaining_secs, low_time }).await;
                    }
                    Some(CountdownEvent::Expired) => {
                        if session.on_expired() {
                            tracing::info!(quiz_id = %session.quiz().id, "time is up, submitting");
                            start_submission(&mut session, &api, &done_tx, &events, true).await;
                        }
                    }
                    None => countdown_live = false,
                },
                Some(result) = done_rx.recv() => match result {
                    Ok(response) => {
                        session.submit_succeeded();
                        tick_rx.close();
                        if let Some(countdown) = countdown.take() {
                            countdown.join().await;
                        }
                        tracing::info!(attempt_id = %response.id, "attempt submitted");
                        emit(&events, AttemptEvent::Submitted(response.clone())).await;
                        return Ok(AttemptOutcome::Submitted(response));
                    }
                    Err(e) => {
                        session.submit_failed();
                        tracing::warn!(error = %e, "attempt submission failed");
                        emit(&events, AttemptEvent::SubmitFailed { message: e.user_message() }).await;
                        emit(&events, AttemptEvent::Updated(session.snapshot())).await;
                    }
                },
            }
        }
    }
}

fn apply(session: &mut AttemptSession, command: AttemptCommand, now: Instant) -> bool {
    match command {
        AttemptCommand::SelectOption {
            question_id,
            option_id,
        } => session.select_option(question_id, option_id),
        AttemptCommand::SetText { question_id, text } => session.set_text(question_id, &text),
        AttemptCommand::GoTo(index) => session.go_to(index, now),
        AttemptCommand::Next => session.next(now),
        AttemptCommand::Previous => session.previous(now),
        AttemptCommand::Submit | AttemptCommand::Abandon => false,
    }
}

async fn start_submission(
    session: &mut AttemptSession,
    api: &Arc<dyn QuizApi>,
    done: &mpsc::Sender<Result<SubmitQuizAttemptResponse>>,
    events: &mpsc::Sender<AttemptEvent>,
    automatic: bool,
) {
    let payload = match session.begin_submit(Instant::now()) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::debug!(error = %e, automatic, "submission rejected");
            emit(events, AttemptEvent::Rejected { reason: e.user_message() }).await;
            return;
        }
    };

    tracing::info!(
        quiz_id = %payload.quiz_id,
        answers = payload.answers.len(),
        started_at = %time::log_timestamp(payload.started_at),
        finished_at = %time::log_timestamp(payload.finished_at),
        automatic,
        "submitting attempt"
    );
    emit(events, AttemptEvent::SubmitStarted { automatic }).await;

    let api = api.clone();
    let done = done.clone();
    tokio::spawn(async move {
        let result = api.submit_quiz_attempt(payload.quiz_id, &payload).await;
        let _ = done.send(result).await;
    });
}

async fn emit(events: &mpsc::Sender<AttemptEvent>, event: AttemptEvent) {
    if events.send(event).await.is_err() {
        tracing::debug!("event receiver dropped");
    }
}
