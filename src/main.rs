//! Treasure Quest Demo
//!
//! Plays a scripted session through the async host: a player walks to
//! each box, opens it with the interact intent and answers. The first
//! box of every level is answered wrong until the solution shows. The
//! session is then replayed with the same seed and the state hashes
//! are compared.
//!
//! Usage: `treasure-quest [seed]`. Set `RUST_LOG` to change verbosity.

use anyhow::{bail, ensure, Context, Result};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use treasure_quest::{
    GameContent, GameMode, InputFrame, Millis, Point, QuestConfig, QuestHandle, QuestHost,
    QuestOrchestrator, Subject, VERSION,
    core::hash::StateHash,
    game::{
        events::{QuestEvent, QuestEventData},
        hint::HintType,
        input::InputRecording,
        quest::QuestPhase,
    },
};

const DEMO_SEED: u64 = 2024;
const FRAME_MS: Millis = 16;
const WALK_SPEED: i32 = 8;
/// Frames a single walk may take before the script gives up
const MAX_WALK_FRAMES: u32 = 5_000;

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;

    let seed = std::env::args()
        .nth(1)
        .map(|arg| arg.parse::<u64>())
        .transpose()
        .context("seed must be an unsigned integer")?
        .unwrap_or(DEMO_SEED);

    info!("Treasure Quest v{}", VERSION);
    info!("RNG Seed: {}", seed);

    info!("=== Starting Demo Session ===");
    let (hash, inputs) = play(seed, true).await?;
    info!("Final State Hash: {}", hex::encode(hash));
    info!("Input changes recorded: {}", inputs.deltas().len());

    info!("=== Verifying Determinism ===");
    let (replay_hash, replay_inputs) = play(seed, false).await?;
    info!("Replay State Hash: {}", hex::encode(replay_hash));
    ensure!(
        hash == replay_hash && inputs.deltas() == replay_inputs.deltas(),
        "replay diverged"
    );
    info!("Determinism verified");
    Ok(())
}

/// Run the scripted session on a fresh host and return its final hash.
async fn play(seed: u64, verbose: bool) -> Result<(StateHash, InputRecording)> {
    let content = GameContent::builtin();
    let config = QuestConfig { rng_seed: Some(seed), ..QuestConfig::default() };
    let transition_ms = config.level_transition_ms;
    let solution_ms = config.solution_display_ms;
    let (handle, task) = QuestHost::spawn(QuestOrchestrator::new(content.clone(), config.clone()));

    if verbose {
        for hint_type in HintType::ALL {
            handle
                .register_hint_callback(hint_type, move |hint| {
                    info!(
                        "Hint {:?} toward {}: {}",
                        hint.hint_type,
                        hint.target_position,
                        hint.message.as_deref().unwrap_or("")
                    );
                })
                .await?;
        }
    }

    let mut events = handle.subscribe();
    handle.start_game(GameMode::Reward, Subject::Math).await?;

    let mut player = Player::new(handle.clone(), config.interact_radius);
    for level in content.levels.levels() {
        player.position = level.player_spawn;
        info!("Level {} ({} boxes)", level.name, level.treasure_boxes.len());

        for (i, treasure) in level.treasure_boxes.iter().enumerate() {
            player.open(treasure.position).await?;
            let question = current_question(&handle, &content).await?;

            if i == 0 {
                let wrong = (question.answer_index + 1) % 4;
                for _ in 0..3 {
                    handle.submit_answer(wrong).await?;
                }
                player.wait(solution_ms).await?;
                player.open(treasure.position).await?;
            }

            let question = current_question(&handle, &content).await?;
            let result = handle.submit_answer(question.answer_index).await?;
            ensure!(result.correct, "scripted answer to {} was wrong", question.id);
            player.wait(config.hint_delay_ms).await?;
            report(&mut events, verbose);
        }

        player.wait(transition_ms).await?;
        report(&mut events, verbose);
        if handle.advance_level().await?.is_none() {
            break;
        }
    }
    report(&mut events, verbose);

    let (snapshot, phase) = handle.snapshot().await?;
    ensure!(phase == QuestPhase::GameComplete, "session ended in {:?}", phase);
    info!(
        "Score: {}, Coins: {}, Hints used: {}",
        snapshot.score, snapshot.total_coins, snapshot.hints_used
    );

    handle.shutdown().await?;
    drop(handle);
    let quest = task.await.context("host task failed")?;
    Ok((quest.state_hash(), player.inputs))
}

async fn current_question(
    handle: &QuestHandle,
    content: &GameContent,
) -> Result<treasure_quest::game::question::Question> {
    let (snapshot, _) = handle.snapshot().await?;
    let id = snapshot.current_question_id.context("no question open")?;
    content
        .questions
        .question_by_id(&id)
        .cloned()
        .with_context(|| format!("unknown question {id}"))
}

/// Log interesting events produced since the last call.
fn report(events: &mut broadcast::Receiver<QuestEvent>, verbose: bool) {
    loop {
        let event = match events.try_recv() {
            Ok(event) => event,
            Err(TryRecvError::Lagged(missed)) => {
                warn!("missed {} events", missed);
                continue;
            }
            Err(_) => break,
        };
        if !verbose {
            continue;
        }
        match event.data {
            QuestEventData::QuestionPresented { box_id, question_id } => {
                info!("[{}ms] {} opened: {}", event.at, box_id, question_id);
            }
            QuestEventData::SolutionRevealed { solution, .. } => {
                info!("[{}ms] Solution: {}", event.at, solution);
            }
            QuestEventData::QuestionResolved { correct, box_id, coins_earned, .. } => {
                info!(
                    "[{}ms] {} resolved (correct: {}, coins: {})",
                    event.at,
                    box_id,
                    correct,
                    coins_earned.unwrap_or(0)
                );
            }
            QuestEventData::LevelCompleted { level_id, score, .. } => {
                info!("[{}ms] Level {} complete! Score: {}", event.at, level_id, score);
            }
            QuestEventData::GameCompleted { score, total_coins } => {
                info!("[{}ms] Game complete! Score: {}, Coins: {}", event.at, score, total_coins);
            }
            _ => {}
        }
    }
}

/// Scripted player driving the host one frame at a time.
struct Player {
    handle: QuestHandle,
    position: Point,
    now: Millis,
    radius: u32,
    inputs: InputRecording,
}

impl Player {
    fn new(handle: QuestHandle, radius: u32) -> Self {
        Self {
            handle,
            position: Point::ZERO,
            now: 0,
            radius,
            inputs: InputRecording::new(),
        }
    }

    async fn step(&mut self, input: InputFrame) -> Result<Option<String>> {
        self.now += FRAME_MS;
        self.inputs.record(self.now, input);
        let result = self.handle.tick(input, self.position, self.now).await?;
        Ok(result.opened_box)
    }

    /// Walk toward `target` and press interact once in reach.
    async fn open(&mut self, target: Point) -> Result<String> {
        // Release interact so the next press is a fresh edge
        self.step(InputFrame::new()).await?;

        for _ in 0..MAX_WALK_FRAMES {
            let mut input = InputFrame::new();
            if self.position.is_within(target, self.radius) {
                input.set(InputFrame::FLAG_INTERACT, true);
                if let Some(box_id) = self.step(input).await? {
                    return Ok(box_id);
                }
                self.step(InputFrame::new()).await?;
                continue;
            }

            let dx = target.x - self.position.x;
            input.set(InputFrame::FLAG_MOVE_LEFT, dx < 0);
            input.set(InputFrame::FLAG_MOVE_RIGHT, dx > 0);
            input.set(InputFrame::FLAG_JUMP, target.y < self.position.y);
            self.step(input).await?;

            let stride = (input.horizontal() * WALK_SPEED).clamp(-dx.abs(), dx.abs());
            self.position = Point::new(self.position.x + stride, target.y);
        }
        bail!("could not reach box at {}", target)
    }

    /// Stand still for `ms` of virtual time.
    async fn wait(&mut self, ms: Millis) -> Result<()> {
        let until = self.now + ms;
        while self.now < until {
            self.step(InputFrame::new()).await?;
        }
        Ok(())
    }
}
