//! Quest Orchestrator
//!
//! Wires box interaction to the question engine, session state, hint
//! dispatch and level completion, in a fixed order:
//!
//! 1. Interacting with an open box makes it current and picks a question
//! 2. The question engine goes Active; the session mirrors the question
//!    and full attempts
//! 3. Every submission mirrors attempts. The last wrong answer shows the
//!    solution, then resolves the box as not solved
//! 4. A correct answer completes the box, pays out, clears the question
//!    and sends a hint toward the next open box in level order
//! 5. Reaching the level objective signals level completion once; the
//!    level itself only changes through [`QuestOrchestrator::advance_level`]
//!
//! All waits run on virtual time. The host calls [`QuestOrchestrator::tick`]
//! with the current time, and operations called between ticks are
//! stamped with the time of the last one.

use std::sync::Arc;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::geometry::Point;
use crate::core::hash::StateHash;
use crate::core::rng::{DeterministicRng, RandomSource};
use crate::core::timer::{Millis, TimerId, TimerQueue};
use crate::game::catalog::GameContent;
use crate::game::events::{QuestEvent, QuestEventData};
use crate::game::hint::{ActiveHint, HintData, HintEngine, HintType, DEFAULT_RIDDLE};
use crate::game::input::InputFrame;
use crate::game::level::Level;
use crate::game::question::{Question, Subject, SubjectStats};
use crate::game::question_engine::{AnswerResult, QuestionEngine};
use crate::game::state::{GameMode, SessionSnapshot, SessionState};
use crate::{
    COINS_PER_CORRECT, HINT_DELAY_MS, INTERACT_RADIUS, LEVEL_TRANSITION_MS,
    REWARD_POINTS, SOLUTION_DISPLAY_MS,
};

// =============================================================================
// CONFIG
// =============================================================================

/// Tuning for a quest session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestConfig {
    /// Score per correct answer
    pub reward_points: u32,
    /// Coins per correct answer in reward mode
    pub coins_per_correct: u32,
    /// Interaction reach around the player (world units)
    pub interact_radius: u32,
    /// Delay between a correct answer and its hint (ms)
    pub hint_delay_ms: Millis,
    /// How long the solution stays up after the last wrong answer (ms)
    pub solution_display_ms: Millis,
    /// Delay between level completion and the results screen (ms)
    pub level_transition_ms: Millis,
    /// Fixed seed for question picks; `None` seeds from OS entropy
    pub rng_seed: Option<u64>,
}

impl Default for QuestConfig {
    fn default() -> Self {
        Self {
            reward_points: REWARD_POINTS,
            coins_per_correct: COINS_PER_CORRECT,
            interact_radius: INTERACT_RADIUS,
            hint_delay_ms: HINT_DELAY_MS,
            solution_display_ms: SOLUTION_DISPLAY_MS,
            level_transition_ms: LEVEL_TRANSITION_MS,
            rng_seed: None,
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Rejected orchestrator calls. Session state is unchanged on error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestError {
    #[error("game not started")]
    NotStarted,

    #[error("game is paused")]
    Paused,

    #[error("a question is already open")]
    QuestionInProgress,

    #[error("no question is open")]
    NoActiveQuestion,

    #[error("solution is being shown")]
    AwaitingSolution,

    #[error("box {0} is not in the current level")]
    UnknownBox(String),

    #[error("box {0} is already solved")]
    BoxAlreadyCompleted(String),

    #[error("no unanswered {0} questions left")]
    ContentExhausted(Subject),

    #[error("level objective already met")]
    LevelFinished,

    #[error("level objective not met yet")]
    LevelNotComplete,
}

// =============================================================================
// PHASE / TIMERS
// =============================================================================

/// Where the session is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestPhase {
    /// Before `start_game` or after `reset_game`
    NotStarted,
    /// Free to walk around and open boxes
    Exploring,
    /// A question awaits an answer
    Answering,
    /// Attempts ran out; the solution is on screen
    ShowingSolution,
    /// Level objective met; waiting for advance or replay
    LevelComplete,
    /// No levels left
    GameComplete,
}

#[derive(Clone, Debug)]
enum QuestTimer {
    DispatchHint(HintData),
    ResolveSolution,
    ShowResults { level_index: u32 },
}

/// What one tick did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickResult {
    /// Box opened by an interact press this tick
    pub opened_box: Option<String>,
    /// Quest timers that fired
    pub timers_fired: usize,
    /// Hints that expired
    pub hints_expired: usize,
}

// =============================================================================
// ORCHESTRATOR
// =============================================================================

/// Single writer for a play session.
pub struct QuestOrchestrator {
    config: QuestConfig,
    content: GameContent,
    state: SessionState,
    questions: QuestionEngine,
    hints: HintEngine,
    rng: Box<dyn RandomSource + Send>,
    /// Seed the RNG was built from, when known
    seed: Option<u64>,
    phase: QuestPhase,
    timers: TimerQueue<QuestTimer>,
    solution_timer: Option<TimerId>,
    level_complete_signaled: bool,
    prev_input: InputFrame,
    now: Millis,
    pending_events: Vec<QuestEvent>,
}

impl std::fmt::Debug for QuestOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestOrchestrator")
            .field("phase", &self.phase)
            .field("state", &self.state)
            .field("now", &self.now)
            .field("seed", &self.seed)
            .finish()
    }
}

impl QuestOrchestrator {
    /// Orchestrator seeded from `config.rng_seed`, or from OS entropy.
    pub fn new(content: GameContent, config: QuestConfig) -> Self {
        let (rng, seed) = match config.rng_seed {
            Some(seed) => (DeterministicRng::new(seed), seed),
            None => DeterministicRng::from_entropy(),
        };
        info!(seed, "quest session created");
        let mut orchestrator = Self::with_rng(content, config, Box::new(rng));
        orchestrator.seed = Some(seed);
        orchestrator
    }

    /// Orchestrator drawing question picks from `rng`.
    pub fn with_rng(
        content: GameContent,
        config: QuestConfig,
        rng: Box<dyn RandomSource + Send>,
    ) -> Self {
        Self {
            questions: QuestionEngine::new(Arc::clone(&content.questions)),
            config,
            content,
            state: SessionState::new(),
            hints: HintEngine::new(),
            rng,
            seed: None,
            phase: QuestPhase::NotStarted,
            timers: TimerQueue::new(),
            solution_timer: None,
            level_complete_signaled: false,
            prev_input: InputFrame::new(),
            now: 0,
            pending_events: Vec::new(),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn config(&self) -> &QuestConfig {
        &self.config
    }

    pub fn content(&self) -> &GameContent {
        &self.content
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.snapshot()
    }

    pub fn phase(&self) -> QuestPhase {
        self.phase
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Time of the last tick.
    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn current_level(&self) -> Option<&Level> {
        self.content.levels.current_level(self.state.level_index())
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.current_question()
    }

    pub fn active_hints(&self) -> Vec<ActiveHint> {
        self.hints.active_hints()
    }

    /// Progress through the session subject's questions on this level.
    pub fn subject_stats(&self) -> SubjectStats {
        self.content
            .questions
            .subject_stats(self.state.subject(), self.state.answered_question_ids())
    }

    pub fn state_hash(&self) -> StateHash {
        self.state.compute_hash()
    }

    /// Drain events since the last call, oldest first.
    pub fn take_events(&mut self) -> Vec<QuestEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // =========================================================================
    // Presentation hooks
    // =========================================================================

    /// Install the presenter for `hint_type`, replacing any previous one.
    pub fn register_hint_callback<F>(&mut self, hint_type: HintType, callback: F)
    where
        F: FnMut(&HintData) + Send + 'static,
    {
        self.hints.register_hint_callback(hint_type, callback);
    }

    pub fn unregister_hint_callback(&mut self, hint_type: HintType) -> bool {
        self.hints.unregister_hint_callback(hint_type)
    }

    // =========================================================================
    // Game lifecycle
    // =========================================================================

    /// Begin a new run at the first level. Restarts a run in progress.
    pub fn start_game(&mut self, mode: GameMode, subject: Subject) {
        self.clear_transient();
        self.state.set_mode(mode);
        self.state.set_subject(subject);
        self.state.start_game();
        self.phase = QuestPhase::Exploring;

        info!(?mode, %subject, "game started");
        self.push(QuestEventData::GameStarted { mode, subject });
        self.push_level_started();
    }

    pub fn pause(&mut self) -> Result<(), QuestError> {
        self.require_started()?;
        self.state.pause_game();
        debug!("game paused");
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), QuestError> {
        self.require_started()?;
        self.state.resume_game();
        debug!("game resumed");
        Ok(())
    }

    /// Back to the initial state. Callbacks stay registered.
    pub fn reset_game(&mut self) {
        self.clear_transient();
        self.state.reset_game();
        self.phase = QuestPhase::NotStarted;
        info!("game reset");
    }

    /// Move on after the level objective is met.
    ///
    /// Returns the new level, or `None` when the game is complete.
    pub fn advance_level(&mut self) -> Result<Option<Level>, QuestError> {
        self.require_playing()?;
        if self.phase != QuestPhase::LevelComplete {
            return self.reject(QuestError::LevelNotComplete);
        }

        let levels = Arc::clone(&self.content.levels);
        let Some(next) = levels.next_level(self.state.level_index()) else {
            self.clear_transient();
            self.phase = QuestPhase::GameComplete;
            info!(score = self.state.score(), coins = self.state.total_coins(), "game complete");
            self.push(QuestEventData::GameCompleted {
                score: self.state.score(),
                total_coins: self.state.total_coins(),
            });
            return Ok(None);
        };

        self.clear_transient();
        self.state.clear_current_question();
        self.state.next_level();
        self.phase = QuestPhase::Exploring;

        info!(level = %next.id, index = self.state.level_index(), "level advanced");
        self.push_level_started();
        Ok(Some(next.clone()))
    }

    /// Restart the current level. Score and coins are kept.
    pub fn replay_level(&mut self) -> Result<(), QuestError> {
        self.require_playing()?;
        self.clear_transient();
        self.state.reset_level();
        self.phase = QuestPhase::Exploring;

        info!(index = self.state.level_index(), "level replayed");
        self.push_level_started();
        Ok(())
    }

    // =========================================================================
    // Questions
    // =========================================================================

    /// Open the box with `box_id` and present a question for it.
    pub fn interact(&mut self, box_id: &str) -> Result<Question, QuestError> {
        self.require_playing()?;
        match self.phase {
            QuestPhase::Exploring => {}
            QuestPhase::Answering | QuestPhase::ShowingSolution => {
                return self.reject(QuestError::QuestionInProgress);
            }
            QuestPhase::LevelComplete | QuestPhase::GameComplete | QuestPhase::NotStarted => {
                return self.reject(QuestError::LevelFinished);
            }
        }

        let levels = Arc::clone(&self.content.levels);
        let in_level = levels
            .current_level(self.state.level_index())
            .is_some_and(|l| l.box_by_id(box_id).is_some());
        if !in_level {
            return self.reject(QuestError::UnknownBox(box_id.to_string()));
        }
        if self.state.is_box_completed(box_id) {
            return self.reject(QuestError::BoxAlreadyCompleted(box_id.to_string()));
        }

        let subject = self.state.subject();
        let picked = self
            .questions
            .next_question(subject, self.state.answered_question_ids(), self.rng.as_mut())
            .map(|q| q.id.clone());
        let Some(question_id) = picked else {
            warn!(%subject, box_id, "no questions left for box");
            return Err(QuestError::ContentExhausted(subject));
        };
        let Some(question) = self.questions.set_current_question(&question_id).cloned() else {
            return self.reject(QuestError::ContentExhausted(subject));
        };

        self.state.set_current_box(box_id);
        self.state.set_current_question(&question);
        self.phase = QuestPhase::Answering;

        info!(box_id, question = %question.id, "question presented");
        self.pending_events
            .push(QuestEvent::question_presented(self.now, box_id, &question.id));
        Ok(question)
    }

    /// Answer the open question with option `selected`.
    pub fn submit_answer(&mut self, selected: u8) -> Result<AnswerResult, QuestError> {
        self.require_playing()?;
        match self.phase {
            QuestPhase::Answering => {}
            QuestPhase::ShowingSolution => return self.reject(QuestError::AwaitingSolution),
            _ => return self.reject(QuestError::NoActiveQuestion),
        }

        let result = self.questions.submit_answer(selected);
        self.state.set_attempts(result.attempts);

        if result.correct {
            self.resolve_correct();
        } else if result.should_show_solution {
            let question_id = self.state.current_question_id().unwrap_or_default().to_string();
            let solution = result.solution.clone().unwrap_or_default();
            info!(question = %question_id, "attempts exhausted, showing solution");
            self.push(QuestEventData::SolutionRevealed { question_id, solution });

            self.phase = QuestPhase::ShowingSolution;
            self.solution_timer = Some(self.timers.schedule(
                self.now,
                self.config.solution_display_ms,
                QuestTimer::ResolveSolution,
            ));
        } else {
            let question_id = self.state.current_question_id().unwrap_or_default().to_string();
            debug!(question = %question_id, attempts = result.attempts, "wrong answer");
            self.push(QuestEventData::AnswerRejected {
                question_id,
                attempts_remaining: result.attempts,
            });
        }

        Ok(result)
    }

    /// Close the open question without solving its box.
    pub fn dismiss_question(&mut self) -> Result<(), QuestError> {
        self.require_playing()?;
        match self.phase {
            QuestPhase::Answering | QuestPhase::ShowingSolution => {
                self.resolve_unsolved();
                Ok(())
            }
            _ => self.reject(QuestError::NoActiveQuestion),
        }
    }

    // =========================================================================
    // Tick
    // =========================================================================

    /// Advance virtual time to `now`, handle the interact intent, then
    /// fire due timers. Nothing happens while paused.
    pub fn tick(&mut self, input: InputFrame, player_position: Point, now: Millis) -> TickResult {
        let mut result = TickResult::default();
        let pressed = input.interact_pressed(self.prev_input);
        self.prev_input = input;
        self.now = self.now.max(now);

        if self.phase == QuestPhase::NotStarted || self.state.is_paused() {
            return result;
        }

        if pressed && self.phase == QuestPhase::Exploring {
            result.opened_box = self.interact_nearest(player_position);
        }

        result.hints_expired = self.hints.advance(self.now).len();
        for (_, timer) in self.timers.pop_due(self.now) {
            result.timers_fired += 1;
            self.fire(timer);
        }
        result
    }

    fn interact_nearest(&mut self, player_position: Point) -> Option<String> {
        let box_id = self
            .current_level()?
            .nearest_open_box(player_position, self.config.interact_radius, self.state.completed_box_ids())?
            .id
            .clone();
        match self.interact(&box_id) {
            Ok(_) => Some(box_id),
            Err(err) => {
                debug!(%err, box_id, "interact ignored");
                None
            }
        }
    }

    fn fire(&mut self, timer: QuestTimer) {
        match timer {
            QuestTimer::DispatchHint(hint) => {
                self.hints.process_hint_from_question(
                    &mut self.state,
                    Some(hint.hint_type),
                    Some(hint.target_position),
                    hint.message.as_deref(),
                );
                debug!(hint_type = ?hint.hint_type, target = %hint.target_position, "hint dispatched");
                self.push(QuestEventData::HintDispatched { hint });
            }
            QuestTimer::ResolveSolution => {
                self.solution_timer = None;
                if self.phase == QuestPhase::ShowingSolution {
                    self.resolve_unsolved();
                }
            }
            QuestTimer::ShowResults { level_index } => {
                debug!(level_index, "showing results");
                self.push(QuestEventData::ShowResults { level_index });
            }
        }
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    fn resolve_correct(&mut self) {
        let Some(question) = self.questions.current_question().cloned() else {
            return;
        };
        let box_id = self.state.current_box_id().unwrap_or_default().to_string();

        self.state.mark_box_completed(&box_id);
        self.state.mark_question_answered(&question.id);
        self.state.increment_correct();
        self.state.increment_score(self.config.reward_points);
        self.questions.clear_current_question();
        self.state.clear_current_question();

        let coins_earned = match self.state.mode() {
            GameMode::Reward => {
                self.state.add_coins(self.config.coins_per_correct);
                Some(self.config.coins_per_correct)
            }
            GameMode::Knowledge => None,
        };

        let levels = Arc::clone(&self.content.levels);
        let level = levels.current_level(self.state.level_index());
        let target = level
            .and_then(|l| l.next_hint_target(&box_id, self.state.completed_box_ids()))
            .map(|b| b.position);
        let hint = reward_hint(&question, target);
        if let Some(hint) = &hint {
            self.timers.schedule(self.now, self.config.hint_delay_ms, QuestTimer::DispatchHint(hint.clone()));
        }

        self.phase = QuestPhase::Exploring;
        info!(
            box_id = %box_id,
            question = %question.id,
            correct = self.state.correct_this_level(),
            score = self.state.score(),
            "box solved"
        );
        self.pending_events.push(QuestEvent::question_resolved(
            self.now,
            true,
            &box_id,
            coins_earned,
            hint,
        ));

        if let Some(level) = level {
            self.check_level_complete(level);
        }
    }

    fn resolve_unsolved(&mut self) {
        if let Some(id) = self.solution_timer.take() {
            self.timers.cancel(id);
        }
        let box_id = self.state.current_box_id().unwrap_or_default().to_string();
        self.questions.clear_current_question();
        self.state.clear_current_question();
        self.phase = QuestPhase::Exploring;

        debug!(box_id = %box_id, "question closed unsolved");
        self.pending_events
            .push(QuestEvent::question_resolved(self.now, false, &box_id, None, None));
    }

    fn check_level_complete(&mut self, level: &Level) {
        if self.level_complete_signaled || self.state.correct_this_level() < level.required_answers {
            return;
        }
        self.level_complete_signaled = true;
        self.phase = QuestPhase::LevelComplete;

        let level_index = self.state.level_index();
        info!(level = %level.id, score = self.state.score(), "level complete");
        self.pending_events.push(QuestEvent::level_completed(
            self.now,
            level_index,
            &level.id,
            self.state.score(),
        ));
        self.timers.schedule(
            self.now,
            self.config.level_transition_ms,
            QuestTimer::ShowResults { level_index },
        );
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Drop the open question, pending timers and visible hints.
    fn clear_transient(&mut self) {
        self.questions.clear_current_question();
        self.hints.clear_all_hints();
        self.timers.clear();
        self.solution_timer = None;
        self.level_complete_signaled = false;
    }

    fn require_started(&self) -> Result<(), QuestError> {
        if self.phase == QuestPhase::NotStarted {
            return self.reject(QuestError::NotStarted);
        }
        Ok(())
    }

    fn require_playing(&self) -> Result<(), QuestError> {
        self.require_started()?;
        if self.state.is_paused() {
            return self.reject(QuestError::Paused);
        }
        Ok(())
    }

    fn reject<T>(&self, err: QuestError) -> Result<T, QuestError> {
        debug!(%err, phase = ?self.phase, "quest call rejected");
        Err(err)
    }

    fn push(&mut self, data: QuestEventData) {
        self.pending_events.push(QuestEvent::new(self.now, data));
    }

    fn push_level_started(&mut self) {
        let index = self.state.level_index();
        let level_id = self.current_level().map(|l| l.id.clone()).unwrap_or_default();
        self.pending_events
            .push(QuestEvent::level_started(self.now, index, &level_id));
    }
}

/// Hint payload for a solved question, if it has a type and a target.
fn reward_hint(question: &Question, target: Option<Point>) -> Option<HintData> {
    let hint_type = question.hint_type?;
    let message = match hint_type {
        HintType::Riddle => Some(question.next_clue.as_deref().unwrap_or(DEFAULT_RIDDLE)),
        other => other.default_message(),
    };
    Some(HintData {
        hint_type,
        target_position: target?,
        message: message.map(str::to_string),
        duration: hint_type.default_duration(),
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use crate::game::level::{LevelCatalog, TreasureBox};
    use crate::game::question::{Difficulty, QuestionCatalog};

    fn seeded(seed: u64) -> QuestOrchestrator {
        let config = QuestConfig { rng_seed: Some(seed), ..QuestConfig::default() };
        QuestOrchestrator::new(GameContent::builtin(), config)
    }

    fn started(seed: u64, mode: GameMode) -> QuestOrchestrator {
        let mut quest = seeded(seed);
        quest.start_game(mode, Subject::Math);
        quest.take_events();
        quest
    }

    fn solve(quest: &mut QuestOrchestrator, box_id: &str) -> AnswerResult {
        let question = quest.interact(box_id).expect("box opens");
        quest.submit_answer(question.answer_index).expect("answer accepted")
    }

    fn wrong_option(question: &Question) -> u8 {
        (question.answer_index + 1) % 4
    }

    fn resolutions(events: &[QuestEvent]) -> Vec<(bool, String)> {
        events
            .iter()
            .filter_map(|e| match &e.data {
                QuestEventData::QuestionResolved { correct, box_id, .. } => Some((*correct, box_id.clone())),
                _ => None,
            })
            .collect()
    }

    fn count_level_completed(events: &[QuestEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e.data, QuestEventData::LevelCompleted { .. }))
            .count()
    }

    /// One map-hint question and a two-box level.
    fn small_content(hint_type: Option<HintType>, required: u32) -> GameContent {
        let question = Question {
            id: "q_map".into(),
            subject: Subject::Math,
            difficulty: Difficulty::Easy,
            prompt: "1 + 1?".into(),
            options: ["2".into(), "3".into(), "4".into(), "5".into()],
            answer_index: 0,
            solution: "1 + 1 = 2.".into(),
            hint_type,
            next_clue: Some("Under the bridge.".into()),
        };
        let level = Level {
            id: "meadow".into(),
            name: "Meadow".into(),
            background: "meadow-bg".into(),
            music: "meadow-music".into(),
            platforms: Vec::new(),
            treasure_boxes: vec![
                TreasureBox { id: "meadow_box_1".into(), position: Point::new(100, 100) },
                TreasureBox { id: "meadow_box_2".into(), position: Point::new(10, 20) },
            ],
            player_spawn: Point::ZERO,
            required_answers: required,
            ambient_sounds: Vec::new(),
        };
        GameContent {
            questions: Arc::new(QuestionCatalog::new(vec![question]).expect("valid questions")),
            levels: Arc::new(LevelCatalog::new(vec![level]).expect("valid levels")),
        }
    }

    #[test]
    fn test_level_completes_once() {
        let mut quest = started(1, GameMode::Knowledge);
        for id in ["jungle_box_2", "jungle_box_3", "jungle_box_4", "jungle_box_5"] {
            assert!(solve(&mut quest, id).correct);
        }
        assert_eq!(quest.state().correct_this_level(), 4);
        assert_eq!(count_level_completed(&quest.take_events()), 0);

        assert!(solve(&mut quest, "jungle_box_1").correct);
        let events = quest.take_events();
        assert_eq!(count_level_completed(&events), 1);
        assert_eq!(resolutions(&events), vec![(true, "jungle_box_1".to_string())]);
        assert_eq!(
            quest.state().completed_box_ids().iter().filter(|id| *id == "jungle_box_1").count(),
            1
        );
        assert_eq!(quest.state().correct_this_level(), 5);
        assert_eq!(quest.state().score(), 50);
        // Level index only moves through advance_level
        assert_eq!(quest.state().level_index(), 0);
        assert_eq!(quest.phase(), QuestPhase::LevelComplete);

        // Nothing more to open on a finished level
        assert_eq!(quest.interact("jungle_box_1"), Err(QuestError::LevelFinished));
        quest.tick(InputFrame::new(), Point::ZERO, 10_000);
        assert_eq!(count_level_completed(&quest.take_events()), 0);
    }

    #[test]
    fn test_results_follow_transition_delay() {
        let mut quest = started(2, GameMode::Knowledge);
        for b in LevelCatalog::builtin().levels()[0].treasure_boxes.iter() {
            solve(&mut quest, &b.id);
        }
        quest.take_events();

        quest.tick(InputFrame::new(), Point::ZERO, 2999);
        assert!(!quest.take_events().iter().any(|e| matches!(e.data, QuestEventData::ShowResults { .. })));
        quest.tick(InputFrame::new(), Point::ZERO, 3000);
        assert!(quest
            .take_events()
            .iter()
            .any(|e| e.data == QuestEventData::ShowResults { level_index: 0 }));
    }

    #[test]
    fn test_wrong_answers_show_solution_then_resolve() {
        let mut quest = started(3, GameMode::Knowledge);
        let question = quest.interact("jungle_box_1").expect("box opens");
        let wrong = wrong_option(&question);

        let first = quest.submit_answer(wrong).expect("accepted");
        assert_eq!(first.attempts, 2);
        assert_eq!(quest.state().attempts(), 2);
        quest.submit_answer(wrong).expect("accepted");
        let last = quest.submit_answer(wrong).expect("accepted");
        assert!(last.should_show_solution);
        assert_eq!(last.solution.as_deref(), Some(question.solution.as_str()));
        assert_eq!(quest.phase(), QuestPhase::ShowingSolution);
        assert_eq!(quest.submit_answer(question.answer_index), Err(QuestError::AwaitingSolution));

        // No resolution until the solution has been up long enough
        assert!(resolutions(&quest.take_events()).is_empty());
        quest.tick(InputFrame::new(), Point::ZERO, 2999);
        assert!(resolutions(&quest.take_events()).is_empty());
        quest.tick(InputFrame::new(), Point::ZERO, 3000);
        assert_eq!(resolutions(&quest.take_events()), vec![(false, "jungle_box_1".to_string())]);

        // Box stays open for another try
        assert!(!quest.state().is_box_completed("jungle_box_1"));
        assert_eq!(quest.state().current_question_id(), None);
        assert_eq!(quest.state().attempts(), 3);
        assert_eq!(quest.state().score(), 0);
        assert!(quest.interact("jungle_box_1").is_ok());
    }

    #[test]
    fn test_dismiss_resolves_once() {
        let mut quest = started(4, GameMode::Knowledge);
        let question = quest.interact("jungle_box_2").expect("box opens");
        for _ in 0..3 {
            quest.submit_answer(wrong_option(&question)).expect("accepted");
        }
        quest.dismiss_question().expect("dismissed");
        quest.tick(InputFrame::new(), Point::ZERO, 5000);

        assert_eq!(resolutions(&quest.take_events()), vec![(false, "jungle_box_2".to_string())]);
        assert_eq!(quest.dismiss_question(), Err(QuestError::NoActiveQuestion));
    }

    #[test]
    fn test_errors_leave_state_unchanged() {
        let mut quest = seeded(5);
        assert_eq!(quest.interact("jungle_box_1"), Err(QuestError::NotStarted));
        assert_eq!(quest.pause(), Err(QuestError::NotStarted));

        quest.start_game(GameMode::Knowledge, Subject::Science);
        solve(&mut quest, "jungle_box_1");
        let before = quest.snapshot();

        assert_eq!(quest.interact("city_box_1"), Err(QuestError::UnknownBox("city_box_1".into())));
        assert_eq!(
            quest.interact("jungle_box_1"),
            Err(QuestError::BoxAlreadyCompleted("jungle_box_1".into()))
        );
        assert_eq!(quest.submit_answer(0), Err(QuestError::NoActiveQuestion));
        assert_eq!(quest.advance_level(), Err(QuestError::LevelNotComplete));

        quest.pause().expect("paused");
        assert_eq!(quest.interact("jungle_box_2"), Err(QuestError::Paused));
        quest.resume().expect("resumed");

        assert_eq!(quest.snapshot(), before);

        quest.interact("jungle_box_2").expect("box opens");
        assert_eq!(quest.interact("jungle_box_3"), Err(QuestError::QuestionInProgress));
    }

    #[test]
    fn test_content_exhaustion() {
        let config = QuestConfig { rng_seed: Some(6), ..QuestConfig::default() };
        let mut quest = QuestOrchestrator::new(small_content(None, 2), config);
        quest.start_game(GameMode::Knowledge, Subject::Math);

        solve(&mut quest, "meadow_box_1");
        let before = quest.snapshot();
        assert_eq!(quest.interact("meadow_box_2"), Err(QuestError::ContentExhausted(Subject::Math)));
        assert_eq!(quest.snapshot(), before);
        assert_eq!(quest.phase(), QuestPhase::Exploring);

        // Other subjects have nothing at all
        quest.start_game(GameMode::Knowledge, Subject::Gk);
        assert_eq!(quest.interact("meadow_box_1"), Err(QuestError::ContentExhausted(Subject::Gk)));
    }

    #[test]
    fn test_hint_dispatched_after_delay() {
        let config = QuestConfig { rng_seed: Some(7), ..QuestConfig::default() };
        let mut quest = QuestOrchestrator::new(small_content(Some(HintType::Map), 2), config);
        let seen: Arc<Mutex<Vec<HintData>>> = Arc::default();
        let sink = Arc::clone(&seen);
        quest.register_hint_callback(HintType::Map, move |data| {
            sink.lock().expect("lock").push(data.clone());
        });
        quest.start_game(GameMode::Reward, Subject::Math);
        quest.tick(InputFrame::new(), Point::ZERO, 100);

        solve(&mut quest, "meadow_box_1");
        let expected = HintData {
            hint_type: HintType::Map,
            target_position: Point::new(10, 20),
            message: Some("Check your map for the treasure location!".into()),
            duration: 3000,
        };
        let resolved = quest
            .take_events()
            .into_iter()
            .find_map(|e| match e.data {
                QuestEventData::QuestionResolved { coins_earned, hint_data, .. } => Some((coins_earned, hint_data)),
                _ => None,
            });
        assert_eq!(resolved, Some((Some(10), Some(expected.clone()))));
        assert_eq!(quest.state().total_coins(), 10);

        // Not presented until the hint delay passes
        assert!(seen.lock().expect("lock").is_empty());
        assert_eq!(quest.state().hints_used(), 0);
        quest.tick(InputFrame::new(), Point::ZERO, 1100);
        assert_eq!(*seen.lock().expect("lock"), vec![expected]);
        assert_eq!(quest.state().hints_used(), 1);
        assert_eq!(quest.active_hints().len(), 1);

        quest.tick(InputFrame::new(), Point::ZERO, 4100);
        assert!(quest.active_hints().is_empty());
    }

    #[test]
    fn test_riddle_hint_uses_clue() {
        let question = small_content(Some(HintType::Riddle), 1).questions.questions()[0].clone();
        let hint = reward_hint(&question, Some(Point::new(1, 2))).expect("hint");
        assert_eq!(hint.message.as_deref(), Some("Under the bridge."));
        assert_eq!(hint.duration, 5000);

        assert!(reward_hint(&question, None).is_none());
    }

    #[test]
    fn test_interact_by_proximity_is_edge_triggered() {
        let mut quest = started(8, GameMode::Knowledge);
        let near_box = Point::new(105, 450);

        let result = quest.tick(InputFrame::interact(), near_box, 16);
        assert_eq!(result.opened_box.as_deref(), Some("jungle_box_1"));
        quest.dismiss_question().expect("dismissed");

        // Still held: no second interaction
        let result = quest.tick(InputFrame::interact(), near_box, 32);
        assert!(result.opened_box.is_none());

        quest.tick(InputFrame::new(), near_box, 48);
        let result = quest.tick(InputFrame::interact(), near_box, 64);
        assert_eq!(result.opened_box.as_deref(), Some("jungle_box_1"));

        // Out of reach
        quest.dismiss_question().expect("dismissed");
        quest.tick(InputFrame::new(), Point::new(2000, 2000), 80);
        let result = quest.tick(InputFrame::interact(), Point::new(2000, 2000), 96);
        assert!(result.opened_box.is_none());
    }

    #[test]
    fn test_interact_at_world_extremes() {
        let mut quest = started(8, GameMode::Knowledge);

        let mut now = 0;
        for corner in [Point::new(i32::MIN, i32::MIN), Point::new(i32::MAX, i32::MIN)] {
            now += 16;
            quest.tick(InputFrame::new(), corner, now);
            now += 16;
            let result = quest.tick(InputFrame::interact(), corner, now);
            assert!(result.opened_box.is_none());
        }
        assert_eq!(quest.state().current_box_id(), None);
    }

    #[test]
    fn test_paused_tick_does_nothing() {
        let mut quest = started(9, GameMode::Knowledge);
        quest.pause().expect("paused");
        let result = quest.tick(InputFrame::interact(), Point::new(100, 450), 16);
        assert_eq!(result, TickResult::default());
        assert_eq!(quest.state().current_box_id(), None);
    }

    #[test]
    fn test_play_through_all_levels() {
        let mut quest = started(10, GameMode::Reward);
        let levels = LevelCatalog::builtin();

        for (index, level) in levels.levels().iter().enumerate() {
            assert_eq!(quest.state().level_index(), index as u32);
            for b in &level.treasure_boxes {
                assert!(solve(&mut quest, &b.id).correct);
            }
            let next = quest.advance_level().expect("level complete");
            assert_eq!(next.map(|l| l.id), levels.levels().get(index + 1).map(|l| l.id.clone()));
        }

        assert_eq!(quest.phase(), QuestPhase::GameComplete);
        assert_eq!(quest.state().score(), 150);
        assert_eq!(quest.state().total_coins(), 150);
        assert!(quest
            .take_events()
            .iter()
            .any(|e| matches!(e.data, QuestEventData::GameCompleted { score: 150, total_coins: 150 })));
    }

    #[test]
    fn test_questions_repeat_across_levels_only() {
        let mut quest = started(11, GameMode::Knowledge);
        let mut asked = Vec::new();
        for b in &LevelCatalog::builtin().levels()[0].treasure_boxes {
            let q = quest.interact(&b.id).expect("box opens");
            asked.push(q.id.clone());
            quest.submit_answer(q.answer_index).expect("accepted");
        }
        asked.sort();
        asked.dedup();
        assert_eq!(asked.len(), 5);
        assert_eq!(quest.subject_stats().remaining, 0);

        quest.advance_level().expect("advanced");
        assert_eq!(quest.subject_stats().remaining, 5);
        assert!(quest.interact("city_box_1").is_ok());
    }

    #[test]
    fn test_replay_level_keeps_score() {
        let mut quest = started(12, GameMode::Reward);
        solve(&mut quest, "jungle_box_1");
        solve(&mut quest, "jungle_box_2");
        quest.interact("jungle_box_3").expect("box opens");

        quest.replay_level().expect("replayed");
        let s = quest.state();
        assert_eq!(s.correct_this_level(), 0);
        assert!(s.completed_box_ids().is_empty());
        assert_eq!(s.current_question_id(), None);
        assert_eq!(s.score(), 20);
        assert_eq!(s.total_coins(), 20);
        assert_eq!(quest.phase(), QuestPhase::Exploring);
        assert!(quest.current_question().is_none());
    }

    #[test]
    fn test_same_seed_same_session() {
        let run = |seed| {
            let mut quest = started(seed, GameMode::Reward);
            let mut asked = Vec::new();
            for b in ["jungle_box_3", "jungle_box_1", "jungle_box_5"] {
                asked.push(quest.interact(b).expect("box opens").id);
                quest.dismiss_question().expect("dismissed");
            }
            solve(&mut quest, "jungle_box_2");
            (asked, quest.state_hash())
        };
        assert_eq!(run(99), run(99));
    }

    #[test]
    fn test_reset_game() {
        let mut quest = started(13, GameMode::Reward);
        solve(&mut quest, "jungle_box_1");
        quest.reset_game();
        assert_eq!(quest.phase(), QuestPhase::NotStarted);
        assert_eq!(quest.snapshot(), SessionState::new().snapshot());
        assert_eq!(quest.interact("jungle_box_1"), Err(QuestError::NotStarted));
    }

    #[test]
    fn test_config_missing_fields_default() {
        let config: QuestConfig =
            serde_json::from_str(r#"{"reward_points": 5}"#).expect("valid config");
        assert_eq!(config.reward_points, 5);
        assert_eq!(config.interact_radius, 60);
        assert_eq!(config.hint_delay_ms, 1000);
        assert_eq!(config.rng_seed, None);
    }
}
