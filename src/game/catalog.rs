//! Content Loading
//!
//! Static content (questions and levels) is loaded once at startup,
//! either from the built-in tables or from a JSON document, and is
//! immutable afterwards.

use std::sync::Arc;
use serde::Deserialize;

use crate::game::level::{Level, LevelCatalog};
use crate::game::question::{Question, QuestionCatalog};

/// Content validation errors.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Malformed JSON or wrong shape (e.g. not exactly four options).
    #[error("invalid content JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A question or level has an empty id.
    #[error("empty id")]
    EmptyId,

    /// Two records share an id.
    #[error("duplicate id: {0}")]
    DuplicateId(String),

    /// `answerIndex` does not point at one of the four options.
    #[error("question {id}: answer index {index} out of range")]
    AnswerOutOfRange {
        /// Question id
        id: String,
        /// Offending index
        index: u8,
    },

    /// A level asks for more correct answers than it has boxes.
    #[error("level {id}: requires {required} answers but has {boxes} boxes")]
    UnreachableObjective {
        /// Level id
        id: String,
        /// Required answers
        required: u32,
        /// Treasure boxes in the level
        boxes: usize,
    },

    /// The level list is empty.
    #[error("no levels defined")]
    NoLevels,
}

/// Shared, immutable content for a game.
///
/// Catalogs sit behind `Arc` so engines and a host task can hold them
/// without copying.
#[derive(Clone, Debug)]
pub struct GameContent {
    /// All questions
    pub questions: Arc<QuestionCatalog>,
    /// All levels, in play order
    pub levels: Arc<LevelCatalog>,
}

#[derive(Deserialize)]
struct ContentDocument {
    questions: Vec<Question>,
    levels: Vec<Level>,
}

impl GameContent {
    /// Content shipped with the game.
    pub fn builtin() -> Self {
        Self {
            questions: Arc::new(QuestionCatalog::builtin()),
            levels: Arc::new(LevelCatalog::builtin()),
        }
    }

    /// Load `{ "questions": [...], "levels": [...] }`.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let doc: ContentDocument = serde_json::from_str(json)?;
        Ok(Self {
            questions: Arc::new(QuestionCatalog::new(doc.questions)?),
            levels: Arc::new(LevelCatalog::new(doc.levels)?),
        })
    }
}

impl Default for GameContent {
    fn default() -> Self {
        Self::builtin()
    }
}
