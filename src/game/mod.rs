//! Game Logic Module
//!
//! Quest progression. Deterministic given a seed and a sequence of ticks.
//!
//! ## Module Structure
//!
//! - `question`: Question records and the question catalog
//! - `level`: Level descriptors and the level catalog
//! - `catalog`: Content loading and validation
//! - `state`: The mutable session record
//! - `question_engine`: Active question and attempts
//! - `hint`: Hint dispatch and expiry
//! - `input`: Player intents and edge detection
//! - `events`: Quest events for the host
//! - `quest`: The orchestrator tying it together

pub mod question;
pub mod level;
pub mod catalog;
pub mod state;
pub mod question_engine;
pub mod hint;
pub mod input;
pub mod events;
pub mod quest;

// Re-export key types
pub use question::{Question, QuestionCatalog, Subject, Difficulty, SubjectStats};
pub use level::{Level, LevelCatalog, TreasureBox};
pub use catalog::{CatalogError, GameContent};
pub use state::{GameMode, SessionSnapshot, SessionState};
pub use question_engine::{AnswerResult, QuestionEngine};
pub use hint::{ActiveHint, HintData, HintEngine, HintType};
pub use input::{InputFrame, InputRecording};
pub use events::{QuestEvent, QuestEventData};
pub use quest::{QuestConfig, QuestError, QuestOrchestrator, QuestPhase, TickResult};
