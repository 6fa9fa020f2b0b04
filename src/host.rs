//! Quest Host
//!
//! Runs a [`QuestOrchestrator`] on its own tokio task. Callers on any
//! thread talk to it through a cloneable [`QuestHandle`]; commands queue
//! on an mpsc mailbox and are applied one at a time, so the orchestrator
//! stays the only writer of its session. Events produced by each command
//! are broadcast to subscribers.

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::core::geometry::Point;
use crate::core::timer::Millis;
use crate::game::events::QuestEvent;
use crate::game::hint::{HintCallback, HintData, HintType};
use crate::game::input::InputFrame;
use crate::game::level::Level;
use crate::game::question::{Question, Subject};
use crate::game::question_engine::AnswerResult;
use crate::game::quest::{QuestError, QuestOrchestrator, QuestPhase, TickResult};
use crate::game::state::{GameMode, SessionSnapshot};

/// Queued commands before senders wait.
pub const MAILBOX_CAPACITY: usize = 64;

/// Buffered events per subscriber before the slowest one lags.
pub const EVENT_CAPACITY: usize = 256;

/// Host call failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The orchestrator rejected the call.
    #[error(transparent)]
    Quest(#[from] QuestError),

    /// The host task has stopped.
    #[error("quest host stopped")]
    Closed,
}

type Reply<T> = oneshot::Sender<T>;

enum Command {
    StartGame { mode: GameMode, subject: Subject, reply: Reply<()> },
    Pause { reply: Reply<Result<(), QuestError>> },
    Resume { reply: Reply<Result<(), QuestError>> },
    ResetGame { reply: Reply<()> },
    Interact { box_id: String, reply: Reply<Result<Question, QuestError>> },
    SubmitAnswer { selected: u8, reply: Reply<Result<AnswerResult, QuestError>> },
    DismissQuestion { reply: Reply<Result<(), QuestError>> },
    AdvanceLevel { reply: Reply<Result<Option<Level>, QuestError>> },
    ReplayLevel { reply: Reply<Result<(), QuestError>> },
    Tick { input: InputFrame, position: Point, now: Millis, reply: Reply<TickResult> },
    RegisterHintCallback { hint_type: HintType, callback: HintCallback, reply: Reply<()> },
    Snapshot { reply: Reply<(SessionSnapshot, QuestPhase)> },
    Shutdown,
}

/// Owner task for one orchestrator.
pub struct QuestHost {
    orchestrator: QuestOrchestrator,
    commands: mpsc::Receiver<Command>,
    events: broadcast::Sender<QuestEvent>,
}

impl QuestHost {
    /// Move `orchestrator` onto a new task.
    ///
    /// The task ends when every handle is dropped or on
    /// [`QuestHandle::shutdown`], and hands the orchestrator back.
    pub fn spawn(orchestrator: QuestOrchestrator) -> (QuestHandle, JoinHandle<QuestOrchestrator>) {
        let (command_tx, commands) = mpsc::channel(MAILBOX_CAPACITY);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let handle = QuestHandle {
            commands: command_tx,
            events: events.clone(),
        };
        let host = QuestHost {
            orchestrator,
            commands,
            events,
        };
        (handle, tokio::spawn(host.run()))
    }

    async fn run(mut self) -> QuestOrchestrator {
        info!("quest host started");
        while let Some(command) = self.commands.recv().await {
            if !self.apply(command) {
                break;
            }
            for event in self.orchestrator.take_events() {
                // No subscribers is fine
                let _ = self.events.send(event);
            }
        }
        info!("quest host stopped");
        self.orchestrator
    }

    /// Apply one command. Returns false on shutdown.
    fn apply(&mut self, command: Command) -> bool {
        let quest = &mut self.orchestrator;
        // A dropped reply receiver means the caller gave up; the command
        // still took effect.
        match command {
            Command::StartGame { mode, subject, reply } => {
                quest.start_game(mode, subject);
                let _ = reply.send(());
            }
            Command::Pause { reply } => {
                let _ = reply.send(quest.pause());
            }
            Command::Resume { reply } => {
                let _ = reply.send(quest.resume());
            }
            Command::ResetGame { reply } => {
                quest.reset_game();
                let _ = reply.send(());
            }
            Command::Interact { box_id, reply } => {
                let _ = reply.send(quest.interact(&box_id));
            }
            Command::SubmitAnswer { selected, reply } => {
                let _ = reply.send(quest.submit_answer(selected));
            }
            Command::DismissQuestion { reply } => {
                let _ = reply.send(quest.dismiss_question());
            }
            Command::AdvanceLevel { reply } => {
                let _ = reply.send(quest.advance_level());
            }
            Command::ReplayLevel { reply } => {
                let _ = reply.send(quest.replay_level());
            }
            Command::Tick { input, position, now, reply } => {
                let _ = reply.send(quest.tick(input, position, now));
            }
            Command::RegisterHintCallback { hint_type, mut callback, reply } => {
                quest.register_hint_callback(hint_type, move |data| callback(data));
                let _ = reply.send(());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send((quest.snapshot(), quest.phase()));
            }
            Command::Shutdown => {
                debug!("shutdown requested");
                return false;
            }
        }
        true
    }
}

/// Cloneable async front for a running [`QuestHost`].
#[derive(Clone)]
pub struct QuestHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<QuestEvent>,
}

impl QuestHandle {
    async fn call<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T, HostError> {
        let (reply, response) = oneshot::channel();
        self.commands.send(make(reply)).await.map_err(|_| HostError::Closed)?;
        response.await.map_err(|_| HostError::Closed)
    }

    /// Receive every event produced after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<QuestEvent> {
        self.events.subscribe()
    }

    pub async fn start_game(&self, mode: GameMode, subject: Subject) -> Result<(), HostError> {
        self.call(|reply| Command::StartGame { mode, subject, reply }).await
    }

    pub async fn pause(&self) -> Result<(), HostError> {
        Ok(self.call(|reply| Command::Pause { reply }).await??)
    }

    pub async fn resume(&self) -> Result<(), HostError> {
        Ok(self.call(|reply| Command::Resume { reply }).await??)
    }

    pub async fn reset_game(&self) -> Result<(), HostError> {
        self.call(|reply| Command::ResetGame { reply }).await
    }

    pub async fn interact(&self, box_id: &str) -> Result<Question, HostError> {
        let box_id = box_id.to_string();
        Ok(self.call(|reply| Command::Interact { box_id, reply }).await??)
    }

    pub async fn submit_answer(&self, selected: u8) -> Result<AnswerResult, HostError> {
        Ok(self.call(|reply| Command::SubmitAnswer { selected, reply }).await??)
    }

    pub async fn dismiss_question(&self) -> Result<(), HostError> {
        Ok(self.call(|reply| Command::DismissQuestion { reply }).await??)
    }

    /// The next level, or `None` once the game is complete.
    pub async fn advance_level(&self) -> Result<Option<Level>, HostError> {
        Ok(self.call(|reply| Command::AdvanceLevel { reply }).await??)
    }

    pub async fn replay_level(&self) -> Result<(), HostError> {
        Ok(self.call(|reply| Command::ReplayLevel { reply }).await??)
    }

    pub async fn tick(&self, input: InputFrame, position: Point, now: Millis) -> Result<TickResult, HostError> {
        self.call(|reply| Command::Tick { input, position, now, reply }).await
    }

    /// Install a presenter; it runs on the host task.
    pub async fn register_hint_callback<F>(&self, hint_type: HintType, callback: F) -> Result<(), HostError>
    where
        F: FnMut(&HintData) + Send + 'static,
    {
        let callback: HintCallback = Box::new(callback);
        self.call(|reply| Command::RegisterHintCallback { hint_type, callback, reply }).await
    }

    pub async fn snapshot(&self) -> Result<(SessionSnapshot, QuestPhase), HostError> {
        self.call(|reply| Command::Snapshot { reply }).await
    }

    /// Stop the host after the commands already queued.
    pub async fn shutdown(&self) -> Result<(), HostError> {
        self.commands.send(Command::Shutdown).await.map_err(|_| HostError::Closed)
    }
}

// =============================================================================
// TESTS
// =============================================================================
