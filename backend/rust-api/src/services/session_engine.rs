use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::WeakUnboundedSender;

use super::countdown::Countdown;
use super::randomizer::shuffle_answers;
use super::session_service::SessionMessage;
use crate::metrics::{ANSWERS_SUBMITTED_TOTAL, SESSIONS_ACTIVE, SESSIONS_TOTAL, TIMER_EXPIRATIONS_TOTAL};
use crate::models::session::{QuestionView, SessionPhase, SessionSnapshot};
use crate::models::timer::TimerEvent;
use crate::models::Quiz;
use crate::utils::text::display_text;
use crate::utils::time::format_clock;

/// Timer event tagged with the session generation that started the timer.
/// Signals from an older generation are stale and dropped.
#[derive(Debug, Clone)]
pub struct TimerSignal {
    pub generation: u64,
    pub event: TimerEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Not in progress; nothing changed.
    Ignored,
    Recorded { correct: bool, completed: bool },
}

/// State machine for one learner working through one quiz at a time.
///
/// `Selecting -> InProgress -> Completed | TimedOut -> Selecting`. Answer
/// submission scores and advances in a single step, and the countdown feeds
/// back in through the same inbox as learner commands, so there is exactly
/// one path into each terminal state.
pub struct SessionEngine {
    phase: SessionPhase,
    quiz: Option<Arc<Quiz>>,
    current_index: usize,
    score: u32,
    remaining_seconds: Option<u32>,
    displayed_answers: Option<Vec<String>>,
    timer: Option<Countdown>,
    generation: u64,
    inbox: WeakUnboundedSender<SessionMessage>,
    tick_interval: Duration,
}

impl SessionEngine {
    pub fn new(inbox: WeakUnboundedSender<SessionMessage>, tick_interval: Duration) -> Self {
        Self {
            phase: SessionPhase::Selecting,
            quiz: None,
            current_index: 0,
            score: 0,
            remaining_seconds: None,
            displayed_answers: None,
            timer: None,
            generation: 0,
            inbox,
            tick_interval,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn has_running_timer(&self) -> bool {
        self.timer.as_ref().is_some_and(|timer| !timer.is_finished())
    }

    /// Starts a session for `quiz`. Returns `false` (and changes nothing)
    /// unless the engine is waiting for a selection.
    pub fn select_quiz(&mut self, quiz: Arc<Quiz>) -> bool {
        if self.phase != SessionPhase::Selecting {
            tracing::warn!(
                "Ignoring quiz selection {} while session is {}",
                quiz.id,
                self.phase.as_str()
            );
            return false;
        }

        self.stop_timer();
        self.generation += 1;
        self.current_index = 0;
        self.score = 0;
        self.remaining_seconds = None;
        self.displayed_answers = None;
        self.quiz = Some(quiz.clone());

        SESSIONS_TOTAL.with_label_values(&["started"]).inc();

        if quiz.questions.is_empty() {
            tracing::info!("Quiz {} has no questions, session completed", quiz.id);
            self.finish(SessionPhase::Completed);
            return true;
        }

        self.phase = SessionPhase::InProgress;
        SESSIONS_ACTIVE.inc();
        self.enter_question();

        if let Some(seconds) = quiz.duration_seconds() {
            if self.start_timer(seconds) {
                self.remaining_seconds = Some(seconds);
            }
        }

        tracing::info!(
            "Session started: quiz={}, questions={}, timer={:?}",
            quiz.id,
            quiz.question_count(),
            quiz.duration_seconds()
        );
        true
    }

    /// Scores the answer against the current question and moves on.
    pub fn submit_answer(&mut self, answer: &str) -> AnswerOutcome {
        if self.phase != SessionPhase::InProgress {
            tracing::debug!(
                "Ignoring answer while session is {}",
                self.phase.as_str()
            );
            return AnswerOutcome::Ignored;
        }
        let Some(quiz) = self.quiz.clone() else {
            return AnswerOutcome::Ignored;
        };
        let Some(question) = quiz.questions.get(self.current_index) else {
            return AnswerOutcome::Ignored;
        };

        let correct = question.is_correct(answer);
        if correct {
            self.score += 1;
        }
        ANSWERS_SUBMITTED_TOTAL
            .with_label_values(&[if correct { "true" } else { "false" }])
            .inc();

        self.current_index += 1;
        tracing::info!(
            "Answer recorded: quiz={}, question={}, correct={}, score={}",
            quiz.id,
            self.current_index,
            correct,
            self.score
        );

        let completed = self.current_index >= quiz.question_count();
        if completed {
            self.finish(SessionPhase::Completed);
        } else {
            self.enter_question();
        }

        AnswerOutcome::Recorded { correct, completed }
    }

    /// Applies a timer signal. Returns `false` when it was dropped: it belongs
    /// to an earlier session, or the session is no longer in progress.
    pub fn handle_timer(&mut self, signal: &TimerSignal) -> bool {
        if signal.generation != self.generation {
            tracing::debug!(
                "Dropping stale timer event from generation {} (current {})",
                signal.generation,
                self.generation
            );
            return false;
        }
        if self.phase != SessionPhase::InProgress {
            return false;
        }

        match &signal.event {
            TimerEvent::TimerTick(tick) => self.on_timer_tick(tick.remaining_seconds),
            TimerEvent::TimeExpired(_) => self.on_timer_expired(),
        }
        true
    }

    pub fn on_timer_tick(&mut self, remaining_seconds: u32) {
        if self.phase != SessionPhase::InProgress {
            return;
        }
        let remaining = self
            .remaining_seconds
            .map_or(remaining_seconds, |current| current.min(remaining_seconds));
        self.remaining_seconds = Some(remaining);
        tracing::debug!("Timer tick: {}s remaining", remaining);
    }

    pub fn on_timer_expired(&mut self) {
        if self.phase != SessionPhase::InProgress {
            return;
        }
        self.remaining_seconds = Some(0);
        TIMER_EXPIRATIONS_TOTAL.inc();
        tracing::info!(
            "Time is up: question={}, score={}",
            self.current_index,
            self.score
        );
        self.finish(SessionPhase::TimedOut);
    }

    /// Discards a finished session. Returns `false` unless the session is
    /// `Completed` or `TimedOut`.
    pub fn return_to_selection(&mut self) -> bool {
        if !self.phase.is_terminal() {
            tracing::warn!(
                "Ignoring return to selection while session is {}",
                self.phase.as_str()
            );
            return false;
        }

        self.stop_timer();
        self.generation += 1;
        self.phase = SessionPhase::Selecting;
        self.quiz = None;
        self.current_index = 0;
        self.score = 0;
        self.remaining_seconds = None;
        self.displayed_answers = None;
        tracing::info!("Returned to quiz selection");
        true
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let quiz = self.quiz.as_deref();
        let in_progress = self.phase == SessionPhase::InProgress;

        let question = quiz
            .filter(|_| in_progress)
            .and_then(|quiz| quiz.questions.get(self.current_index))
            .map(|question| QuestionView {
                number: self.current_index + 1,
                prompt: display_text(&question.question),
                category: question.category.clone(),
                difficulty: question.difficulty.clone(),
                image: question.image.clone(),
            });

        SessionSnapshot {
            phase: self.phase,
            active: in_progress,
            quiz_id: quiz.map(|quiz| quiz.id),
            title: quiz.map(|quiz| quiz.title.clone()),
            question_count: quiz.map_or(0, Quiz::question_count),
            current_index: quiz.map(|_| self.current_index),
            remaining_seconds: self.remaining_seconds,
            remaining_clock: self.remaining_seconds.map(format_clock),
            score: self.score,
            answers: if in_progress {
                self.displayed_answers.clone()
            } else {
                None
            },
            answer_labels: self
                .displayed_answers
                .as_ref()
                .filter(|_| in_progress)
                .map(|answers| answers.iter().map(|answer| display_text(answer)).collect()),
            question,
        }
    }

    /// Shuffles the answers of the question at `current_index`, once per entry.
    fn enter_question(&mut self) {
        self.displayed_answers = self
            .quiz
            .as_ref()
            .and_then(|quiz| quiz.questions.get(self.current_index))
            .map(shuffle_answers);
    }

    fn finish(&mut self, phase: SessionPhase) {
        if self.phase == SessionPhase::InProgress {
            SESSIONS_ACTIVE.dec();
        }
        self.stop_timer();
        self.phase = phase;
        self.displayed_answers = None;
        let outcome = match phase {
            SessionPhase::TimedOut => "timed_out",
            _ => "completed",
        };
        SESSIONS_TOTAL.with_label_values(&[outcome]).inc();
        tracing::info!("Session finished: outcome={}, score={}", outcome, self.score);
    }

    fn start_timer(&mut self, seconds: u32) -> bool {
        let Some(inbox) = self.inbox.upgrade() else {
            tracing::warn!("Session inbox closed, running quiz without a countdown");
            return false;
        };
        let generation = self.generation;
        self.timer = Some(Countdown::start(seconds, self.tick_interval, move |event| {
            inbox
                .send(SessionMessage::Timer(TimerSignal { generation, event }))
                .is_ok()
        }));
        true
    }

    fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }
}
