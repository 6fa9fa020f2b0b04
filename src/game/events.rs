//! Quest Events
//!
//! Ordered log of what the orchestrator did, drained by the host each
//! tick. `QuestionResolved` is the scene-transition signal: exactly one
//! per resolved question.

use serde::{Serialize, Deserialize};

use crate::core::timer::Millis;
use crate::game::hint::HintData;
use crate::game::state::GameMode;
use crate::game::question::Subject;

/// Event payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestEventData {
    /// A new run began
    GameStarted {
        mode: GameMode,
        subject: Subject,
    },

    /// A box was opened and its question is awaiting an answer
    QuestionPresented {
        box_id: String,
        question_id: String,
    },

    /// Wrong answer with attempts left
    AnswerRejected {
        question_id: String,
        attempts_remaining: u8,
    },

    /// Attempts ran out; the solution is on screen until auto-resolve
    SolutionRevealed {
        question_id: String,
        solution: String,
    },

    /// The question closed; the scene may resume
    QuestionResolved {
        correct: bool,
        box_id: String,
        coins_earned: Option<u32>,
        hint_data: Option<HintData>,
    },

    /// A reward hint went out
    HintDispatched {
        hint: HintData,
    },

    /// The level objective was met
    LevelCompleted {
        level_index: u32,
        level_id: String,
        score: u32,
    },

    /// The results screen should be shown
    ShowResults {
        level_index: u32,
    },

    /// Play moved on to another level (or replayed the current one)
    LevelStarted {
        level_index: u32,
        level_id: String,
    },

    /// No levels remain
    GameCompleted {
        score: u32,
        total_coins: u32,
    },
}

/// An event stamped with the virtual time it happened at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestEvent {
    pub at: Millis,
    pub data: QuestEventData,
}

impl QuestEvent {
    pub fn new(at: Millis, data: QuestEventData) -> Self {
        Self { at, data }
    }

    pub fn question_presented(at: Millis, box_id: &str, question_id: &str) -> Self {
        Self::new(at, QuestEventData::QuestionPresented {
            box_id: box_id.to_string(),
            question_id: question_id.to_string(),
        })
    }

    pub fn question_resolved(
        at: Millis,
        correct: bool,
        box_id: &str,
        coins_earned: Option<u32>,
        hint_data: Option<HintData>,
    ) -> Self {
        Self::new(at, QuestEventData::QuestionResolved {
            correct,
            box_id: box_id.to_string(),
            coins_earned,
            hint_data,
        })
    }

    pub fn level_completed(at: Millis, level_index: u32, level_id: &str, score: u32) -> Self {
        Self::new(at, QuestEventData::LevelCompleted {
            level_index,
            level_id: level_id.to_string(),
            score,
        })
    }

    pub fn level_started(at: Millis, level_index: u32, level_id: &str) -> Self {
        Self::new(at, QuestEventData::LevelStarted {
            level_index,
            level_id: level_id.to_string(),
        })
    }

    /// Is this the scene-transition signal?
    pub fn is_resolution(&self) -> bool {
        matches!(self.data, QuestEventData::QuestionResolved { .. })
    }
}
