//! Session State
//!
//! The single mutable record of a play session. Fields are private and
//! change only through the named operations below, which keep the
//! invariants in one place:
//!
//! - `attempts` stays in `0..=MAX_ATTEMPTS` and resets whenever a new
//!   question becomes current
//! - `completed_box_ids` never holds duplicates
//! - `correct_this_level` resets exactly when the level changes or is replayed
//! - `level_index` only goes down through [`SessionState::reset_game`]

use serde::{Serialize, Deserialize};

use crate::MAX_ATTEMPTS;
use crate::core::hash::{StateHash, compute_state_hash};
use crate::game::question::{Question, Subject};

/// How correct answers are rewarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Score only
    #[default]
    Knowledge,
    /// Score plus coins
    Reward,
}

/// Mutable session progress.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    mode: GameMode,
    subject: Subject,
    level_index: u32,
    correct_this_level: u32,
    total_coins: u32,
    /// Insertion order kept for display
    completed_box_ids: Vec<String>,
    /// Questions answered correctly on this level; excluded from picks
    answered_question_ids: Vec<String>,
    current_question_id: Option<String>,
    current_box_id: Option<String>,
    attempts: u8,
    score: u32,
    hints_used: u32,
    game_started: bool,
    game_paused: bool,
}

/// Read-only copy of the session handed to presentation code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub mode: GameMode,
    pub subject: Subject,
    pub level_index: u32,
    pub correct_this_level: u32,
    pub total_coins: u32,
    pub completed_box_ids: Vec<String>,
    pub answered_question_ids: Vec<String>,
    pub current_question_id: Option<String>,
    pub current_box_id: Option<String>,
    pub attempts: u8,
    pub score: u32,
    pub hints_used: u32,
    pub game_started: bool,
    pub game_paused: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// Fresh session at its fixed initial state.
    pub fn new() -> Self {
        Self {
            mode: GameMode::Knowledge,
            subject: Subject::Math,
            level_index: 0,
            correct_this_level: 0,
            total_coins: 0,
            completed_box_ids: Vec::new(),
            answered_question_ids: Vec::new(),
            current_question_id: None,
            current_box_id: None,
            attempts: MAX_ATTEMPTS,
            score: 0,
            hints_used: 0,
            game_started: false,
            game_paused: false,
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn subject(&self) -> Subject {
        self.subject
    }

    pub fn level_index(&self) -> u32 {
        self.level_index
    }

    pub fn correct_this_level(&self) -> u32 {
        self.correct_this_level
    }

    pub fn total_coins(&self) -> u32 {
        self.total_coins
    }

    pub fn completed_box_ids(&self) -> &[String] {
        &self.completed_box_ids
    }

    pub fn answered_question_ids(&self) -> &[String] {
        &self.answered_question_ids
    }

    pub fn current_question_id(&self) -> Option<&str> {
        self.current_question_id.as_deref()
    }

    pub fn current_box_id(&self) -> Option<&str> {
        self.current_box_id.as_deref()
    }

    pub fn attempts(&self) -> u8 {
        self.attempts
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn hints_used(&self) -> u32 {
        self.hints_used
    }

    pub fn is_started(&self) -> bool {
        self.game_started
    }

    pub fn is_paused(&self) -> bool {
        self.game_paused
    }

    /// Has this box been solved in the current session?
    pub fn is_box_completed(&self, box_id: &str) -> bool {
        self.completed_box_ids.iter().any(|id| id == box_id)
    }

    /// Immutable copy for readers.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            mode: self.mode,
            subject: self.subject,
            level_index: self.level_index,
            correct_this_level: self.correct_this_level,
            total_coins: self.total_coins,
            completed_box_ids: self.completed_box_ids.clone(),
            answered_question_ids: self.answered_question_ids.clone(),
            current_question_id: self.current_question_id.clone(),
            current_box_id: self.current_box_id.clone(),
            attempts: self.attempts,
            score: self.score,
            hints_used: self.hints_used,
            game_started: self.game_started,
            game_paused: self.game_paused,
        }
    }

    // =========================================================================
    // Game lifecycle
    // =========================================================================

    pub fn set_mode(&mut self, mode: GameMode) {
        self.mode = mode;
    }

    pub fn set_subject(&mut self, subject: Subject) {
        self.subject = subject;
    }

    /// Begin a new run from the first level, keeping mode and subject.
    pub fn start_game(&mut self) {
        self.game_started = true;
        self.game_paused = false;
        self.level_index = 0;
        self.correct_this_level = 0;
        self.completed_box_ids.clear();
        self.answered_question_ids.clear();
        self.current_question_id = None;
        self.current_box_id = None;
        self.attempts = MAX_ATTEMPTS;
        self.score = 0;
        self.total_coins = 0;
        self.hints_used = 0;
    }

    pub fn pause_game(&mut self) {
        self.game_paused = true;
    }

    pub fn resume_game(&mut self) {
        self.game_paused = false;
    }

    /// Move to the next level and clear per-level progress.
    pub fn next_level(&mut self) {
        self.level_index = self.level_index.saturating_add(1);
        self.correct_this_level = 0;
        self.completed_box_ids.clear();
        self.answered_question_ids.clear();
    }

    /// Replay the current level from scratch.
    pub fn reset_level(&mut self) {
        self.correct_this_level = 0;
        self.completed_box_ids.clear();
        self.answered_question_ids.clear();
        self.current_question_id = None;
        self.current_box_id = None;
        self.attempts = MAX_ATTEMPTS;
    }

    /// Restore the initial state.
    pub fn reset_game(&mut self) {
        *self = Self::new();
    }

    // =========================================================================
    // Rewards
    // =========================================================================

    pub fn add_coins(&mut self, amount: u32) {
        self.total_coins = self.total_coins.saturating_add(amount);
    }

    pub fn increment_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    pub fn increment_correct(&mut self) {
        self.correct_this_level = self.correct_this_level.saturating_add(1);
    }

    pub fn increment_hints_used(&mut self) {
        self.hints_used = self.hints_used.saturating_add(1);
    }

    /// Record a solved box. Returns false if it was already recorded.
    pub fn mark_box_completed(&mut self, box_id: &str) -> bool {
        if self.is_box_completed(box_id) {
            return false;
        }
        self.completed_box_ids.push(box_id.to_string());
        true
    }

    /// Record a correctly answered question. Idempotent.
    pub fn mark_question_answered(&mut self, question_id: &str) {
        if !self.answered_question_ids.iter().any(|id| id == question_id) {
            self.answered_question_ids.push(question_id.to_string());
        }
    }

    // =========================================================================
    // Current question
    // =========================================================================

    /// Make `question` current and reset attempts.
    ///
    /// Takes the catalog record rather than an id so the current id
    /// always names a real question.
    pub fn set_current_question(&mut self, question: &Question) {
        self.current_question_id = Some(question.id.clone());
        self.attempts = MAX_ATTEMPTS;
    }

    pub fn set_current_box(&mut self, box_id: &str) {
        self.current_box_id = Some(box_id.to_string());
    }

    /// Drop the current question and box and reset attempts.
    pub fn clear_current_question(&mut self) {
        self.current_question_id = None;
        self.current_box_id = None;
        self.attempts = MAX_ATTEMPTS;
    }

    /// Mirror the engine's remaining attempts.
    pub fn set_attempts(&mut self, attempts: u8) {
        self.attempts = attempts.min(MAX_ATTEMPTS);
    }

    pub fn reset_attempts(&mut self) {
        self.attempts = MAX_ATTEMPTS;
    }

    pub fn decrement_attempts(&mut self) {
        self.attempts = self.attempts.saturating_sub(1);
    }

    // =========================================================================
    // Verification
    // =========================================================================

    /// Deterministic digest of all progress fields.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.level_index, |h| {
            h.update_u8(self.mode as u8);
            h.update_u8(self.subject as u8);
            h.update_u32(self.correct_this_level);
            h.update_u32(self.total_coins);
            h.update_u32(self.completed_box_ids.len() as u32);
            for id in &self.completed_box_ids {
                h.update_str(id);
            }
            h.update_u32(self.answered_question_ids.len() as u32);
            for id in &self.answered_question_ids {
                h.update_str(id);
            }
            h.update_opt_str(self.current_question_id.as_deref());
            h.update_opt_str(self.current_box_id.as_deref());
            h.update_u8(self.attempts);
            h.update_u32(self.score);
            h.update_u32(self.hints_used);
            h.update_bool(self.game_started);
            h.update_bool(self.game_paused);
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
