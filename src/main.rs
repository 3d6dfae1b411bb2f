use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;
use quiz_runner::{
    config::{get_config, init_config},
    dto::attempt_dto::AttemptSnapshot,
    services::results::AttemptSummary,
    utils::time::format_clock,
    AttemptCommand, AttemptEvent, AttemptOutcome, AttemptRunner, AttemptService, HttpQuizApi,
    QuizApi,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const HELP: &str = "Commands: n(ext) | p(rev) | g <number> | s <option> | t <answer text> | submit | q(uit) | h(elp)";

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    init_config()?;
    let config = get_config();

    let quiz_id: Uuid = std::env::args()
        .nth(1)
        .context("usage: quiz-runner <quiz-id>")?
        .parse()
        .context("quiz id must be a UUID")?;

    let api: Arc<dyn QuizApi> = Arc::new(HttpQuizApi::from_config(config)?);
    let service = AttemptService::new(api).with_low_time_warning(config.low_time_warning_secs);

    let runner = match open_attempt(&service, quiz_id).await {
        Ok(runner) => runner,
        Err(message) => {
            println!("{}", message);
            return Ok(ExitCode::FAILURE);
        }
    };
    let quiz = runner.quiz();
    println!(
        "{} ({} questions, {} points)",
        quiz.title,
        quiz.questions.len(),
        quiz.total_points()
    );
    if let Some(description) = &quiz.description {
        println!("{}", description);
    }
    println!("{}", HELP);

    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    let (ev_tx, ev_rx) = mpsc::channel(128);
    let (view_tx, view_rx) = watch::channel(None);

    let printer = tokio::spawn(render_events(ev_rx, view_tx, config.low_time_warning_secs));
    let input = tokio::spawn(read_commands(cmd_tx, view_rx));

    let outcome = runner.run(cmd_rx, ev_tx).await?;
    input.abort();
    let _ = printer.await;

    match outcome {
        AttemptOutcome::Submitted(response) => {
            info!(attempt_id = %response.id, "attempt finished");
            println!("Results: {}", response.results_path());
            match service.results(response.id).await {
                Ok(summary) => print_summary(&summary),
                Err(e) => warn!(error = %e, "could not load attempt results"),
            }
        }
        AttemptOutcome::Abandoned => println!("Attempt abandoned."),
    }

    Ok(ExitCode::SUCCESS)
}

/// Loads the quiz, turning a failure into the single line shown to the user.
async fn open_attempt(service: &AttemptService, quiz_id: Uuid) -> Result<AttemptRunner, String> {
    service.load(quiz_id).await.map_err(|e| {
        warn!(%quiz_id, error = %e, "quiz failed to load");
        e.user_message()
    })
}

async fn read_commands(
    commands: mpsc::Sender<AttemptCommand>,
    view: watch::Receiver<Option<AttemptSnapshot>>,
) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let snapshot = view.borrow().clone();
        match parse_command(line.trim(), snapshot.as_ref()) {
            Ok(Some(command)) => {
                let quit = command == AttemptCommand::Abandon;
                if commands.send(command).await.is_err() || quit {
                    return;
                }
            }
            Ok(None) => println!("{}", HELP),
            Err(msg) => println!("{}", msg),
        }
    }
}

fn parse_command(
    line: &str,
    snapshot: Option<&AttemptSnapshot>,
) -> Result<Option<AttemptCommand>, String> {
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    let command = match word {
        "n" | "next" => AttemptCommand::Next,
        "p" | "prev" | "previous" => AttemptCommand::Previous,
        "submit" => AttemptCommand::Submit,
        "q" | "quit" => AttemptCommand::Abandon,
        "g" | "go" => {
            let number: isize = rest.parse().map_err(|_| "usage: g <question number>".to_string())?;
            AttemptCommand::GoTo(number - 1)
        }
        "s" | "select" => {
            let question = snapshot
                .and_then(|s| s.question.as_ref())
                .ok_or("no question on screen")?;
            let number: usize = rest.parse().map_err(|_| "usage: s <option number>".to_string())?;
            let option = number
                .checked_sub(1)
                .and_then(|i| question.options.get(i))
                .ok_or_else(|| format!("no option {}", number))?;
            AttemptCommand::SelectOption {
                question_id: question.id,
                option_id: option.id,
            }
        }
        "t" | "text" => {
            let question = snapshot
                .and_then(|s| s.question.as_ref())
                .ok_or("no question on screen")?;
            AttemptCommand::SetText {
                question_id: question.id,
                text: rest.to_string(),
            }
        }
        _ => return Ok(None),
    };
    Ok(Some(command))
}

async fn render_events(
    mut events: mpsc::Receiver<AttemptEvent>,
    view: watch::Sender<Option<AttemptSnapshot>>,
    low_time_warning_secs: u32,
) {
    while let Some(event) = events.recv().await {
        match event {
            AttemptEvent::Updated(snapshot) => {
                print_snapshot(&snapshot);
                let _ = view.send(Some(snapshot));
            }
            AttemptEvent::Tick {
                remaining_secs,
                low_time,
            } => {
                let announce = remaining_secs % 60 == 0
                    || (low_time && remaining_secs % 30 == 0)
                    || remaining_secs <= 10;
                if announce {
                    let marker = if low_time { "!" } else { " " };
                    println!("{} Time remaining {}", marker, format_clock(remaining_secs as u64));
                }
                if remaining_secs == low_time_warning_secs {
                    println!("Less than {} left.", format_clock(low_time_warning_secs as u64));
                }
            }
            AttemptEvent::SubmitStarted { automatic } => {
                if automatic {
                    println!("Time is up. Submitting...");
                } else {
                    println!("Submitting...");
                }
            }
            AttemptEvent::SubmitFailed { message } => {
                println!("Submission failed: {}. Type `submit` to try again.", message)
            }
            AttemptEvent::Rejected { reason } => println!("{}", reason),
            AttemptEvent::Submitted(response) => {
                println!("Submitted. Attempt {}", response.id)
            }
        }
    }
}

fn print_snapshot(snapshot: &AttemptSnapshot) {
    println!();
    println!(
        "Question {} of {} ({:.0}%)",
        snapshot.current_index + 1,
        snapshot.question_count,
        snapshot.progress_percent
    );
    if let Some(secs) = snapshot.time_remaining_secs {
        println!("Time remaining {}", format_clock(secs as u64));
    }

    if let Some(question) = &snapshot.question {
        let points = if question.points == 1 { "point" } else { "points" };
        println!("[{}] {} {}", question.type_label, question.points, points);
        println!("{}", question.text);
        match &question.text_answer {
            Some(text) => println!("  Your answer: {}", text),
            None => {
                for (i, option) in question.options.iter().enumerate() {
                    let mark = match (question.multi_select, option.selected) {
                        (true, true) => "[x]",
                        (true, false) => "[ ]",
                        (false, true) => "(*)",
                        (false, false) => "( )",
                    };
                    println!("  {} {}. {}", mark, i + 1, option.text);
                }
            }
        }
    }

    let progress: String = snapshot
        .answered
        .iter()
        .enumerate()
        .map(|(i, answered)| {
            if i == snapshot.current_index {
                '>'
            } else if *answered {
                '+'
            } else {
                '.'
            }
        })
        .collect();
    println!("{}", progress);
    if snapshot.is_last_question && !snapshot.submitting {
        println!("Last question. Type `submit` when ready.");
    }
}

fn print_summary(summary: &AttemptSummary) {
    println!();
    println!(
        "Score {}/{} ({:.1}%), grade {}",
        summary.score, summary.total_points, summary.percentage, summary.grade
    );
    println!(
        "{} correct, {} incorrect, avg {} per question, took {}",
        summary.correct,
        summary.incorrect,
        format_clock(summary.average_secs_per_question),
        summary.duration
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quiz_runner::{
        dto::attempt_dto::{SubmitQuizAttemptRequest, SubmitQuizAttemptResponse},
        models::{quiz::Quiz, quiz_attempt::QuizAttempt},
        Error,
    };

    struct MissingQuiz;

    #[async_trait]
    impl QuizApi for MissingQuiz {
        async fn get_quiz_for_taking(&self, quiz_id: Uuid) -> quiz_runner::Result<Quiz> {
            Err(Error::NotFound(format!("quiz {}", quiz_id)))
        }

        async fn submit_quiz_attempt(
            &self,
            _quiz_id: Uuid,
            _payload: &SubmitQuizAttemptRequest,
        ) -> quiz_runner::Result<SubmitQuizAttemptResponse> {
            unreachable!("nothing is submitted")
        }

        async fn get_attempt_details(&self, attempt_id: Uuid) -> quiz_runner::Result<QuizAttempt> {
            Err(Error::NotFound(format!("attempt {}", attempt_id)))
        }
    }

    #[tokio::test]
    async fn load_failure_becomes_one_user_message() {
        let service = AttemptService::new(Arc::new(MissingQuiz));

        let message = open_attempt(&service, Uuid::new_v4()).await.err().unwrap();

        assert_eq!(message, "Quiz not found or failed to load.");
    }

    #[test]
    fn go_to_is_one_based() {
        assert_eq!(parse_command("g 3", None), Ok(Some(AttemptCommand::GoTo(2))));
        assert!(parse_command("g x", None).is_err());
        assert_eq!(parse_command("xyz", None), Ok(None));
    }
}
