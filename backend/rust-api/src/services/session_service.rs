use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

use super::session_engine::{AnswerOutcome, SessionEngine, TimerSignal};
use crate::models::session::SessionSnapshot;
use crate::models::timer::TimerEvent;
use crate::models::Quiz;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session dispatcher is not running")]
    Unavailable,
}

/// Learner-side requests, each answered over its own oneshot.
#[derive(Debug)]
pub enum SessionCommand {
    Select {
        quiz: Quiz,
        reply: oneshot::Sender<Transition>,
    },
    SubmitAnswer {
        answer: String,
        reply: oneshot::Sender<(AnswerOutcome, SessionSnapshot)>,
    },
    ReturnToSelection {
        reply: oneshot::Sender<Transition>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
}

/// Everything the dispatcher reacts to. Learner commands and countdown
/// events share one queue, so they are applied strictly in arrival order.
#[derive(Debug)]
pub enum SessionMessage {
    Command(SessionCommand),
    Timer(TimerSignal),
}

#[derive(Debug, Clone)]
pub struct Transition {
    pub accepted: bool,
    pub snapshot: SessionSnapshot,
}

// a slow stream client skips ticks rather than holding up the dispatcher
const TIMER_EVENT_CAPACITY: usize = 64;

/// Handle to the process-wide quiz session.
///
/// The engine itself lives on a dedicated task; this handle only enqueues
/// messages, watches the published snapshots and relays the countdown events
/// the engine accepted.
#[derive(Clone)]
pub struct SessionService {
    inbox: mpsc::UnboundedSender<SessionMessage>,
    snapshots: watch::Receiver<SessionSnapshot>,
    timer_events: broadcast::Sender<TimerEvent>,
}

impl SessionService {
    /// Spawns the dispatcher task. Must be called inside a Tokio runtime.
    pub fn spawn(tick_interval: Duration) -> Self {
        let (inbox, messages) = mpsc::unbounded_channel();
        let engine = SessionEngine::new(inbox.downgrade(), tick_interval);
        let (publisher, snapshots) = watch::channel(engine.snapshot());
        let (timer_events, _) = broadcast::channel(TIMER_EVENT_CAPACITY);

        tokio::spawn(run_dispatcher(
            engine,
            messages,
            publisher,
            timer_events.clone(),
        ));
        tracing::info!(
            "Session dispatcher started (tick interval {:?})",
            tick_interval
        );

        Self {
            inbox,
            snapshots,
            timer_events,
        }
    }

    pub async fn select_quiz(&self, quiz: Quiz) -> Result<Transition, SessionError> {
        self.request(|reply| SessionCommand::Select { quiz, reply })
            .await
    }

    pub async fn submit_answer(
        &self,
        answer: impl Into<String>,
    ) -> Result<(AnswerOutcome, SessionSnapshot), SessionError> {
        let answer = answer.into();
        self.request(|reply| SessionCommand::SubmitAnswer { answer, reply })
            .await
    }

    pub async fn return_to_selection(&self) -> Result<Transition, SessionError> {
        self.request(|reply| SessionCommand::ReturnToSelection { reply })
            .await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| SessionCommand::Snapshot { reply })
            .await
    }

    /// Latest published snapshot without a round trip through the dispatcher.
    pub fn current(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Ticks and expiries of the running session's countdown. Events from a
    /// superseded countdown are never relayed.
    pub fn subscribe_timer(&self) -> broadcast::Receiver<TimerEvent> {
        self.timer_events.subscribe()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, SessionError> {
        let (reply, response) = oneshot::channel();
        self.inbox
            .send(SessionMessage::Command(build(reply)))
            .map_err(|_| SessionError::Unavailable)?;
        response.await.map_err(|_| SessionError::Unavailable)
    }
}

async fn run_dispatcher(
    mut engine: SessionEngine,
    mut messages: mpsc::UnboundedReceiver<SessionMessage>,
    publisher: watch::Sender<SessionSnapshot>,
    timer_events: broadcast::Sender<TimerEvent>,
) {
    while let Some(message) = messages.recv().await {
        match message {
            SessionMessage::Timer(signal) => {
                if engine.handle_timer(&signal) {
                    // no stream listening is fine
                    let _ = timer_events.send(signal.event);
                }
            }
            SessionMessage::Command(command) => apply_command(&mut engine, command),
        }

        let snapshot = engine.snapshot();
        publisher.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }

    tracing::info!("Session dispatcher stopped");
}

fn apply_command(engine: &mut SessionEngine, command: SessionCommand) {
    // a dropped reply receiver just means the caller went away
    match command {
        SessionCommand::Select { quiz, reply } => {
            let accepted = engine.select_quiz(Arc::new(quiz));
            let _ = reply.send(Transition {
                accepted,
                snapshot: engine.snapshot(),
            });
        }
        SessionCommand::SubmitAnswer { answer, reply } => {
            let outcome = engine.submit_answer(&answer);
            let _ = reply.send((outcome, engine.snapshot()));
        }
        SessionCommand::ReturnToSelection { reply } => {
            let accepted = engine.return_to_selection();
            let _ = reply.send(Transition {
                accepted,
                snapshot: engine.snapshot(),
            });
        }
        SessionCommand::Snapshot { reply } => {
            let _ = reply.send(engine.snapshot());
        }
    }
}
