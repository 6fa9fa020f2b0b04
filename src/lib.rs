//! # Treasure Quest
//!
//! Quest progression engine for an educational treasure hunt: players
//! open treasure boxes, answer subject questions with limited attempts,
//! and earn hints toward the next box.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TREASURE QUEST                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/              - Deterministic primitives               │
//! │  ├── geometry.rs    - Integer points and rectangles          │
//! │  ├── rng.rs         - Xorshift128+ PRNG, RandomSource        │
//! │  ├── timer.rs       - Virtual-time timer queue               │
//! │  └── hash.rs        - Session state hashing                  │
//! │                                                              │
//! │  game/              - Quest logic (deterministic)            │
//! │  ├── question.rs    - Question catalog                       │
//! │  ├── level.rs       - Level catalog                          │
//! │  ├── catalog.rs     - Content loading and validation         │
//! │  ├── state.rs       - Session state store                    │
//! │  ├── question_engine.rs - Active question and attempts       │
//! │  ├── hint.rs        - Hint dispatch and expiry               │
//! │  ├── input.rs       - Player intents                         │
//! │  ├── events.rs      - Quest events                           │
//! │  └── quest.rs       - Orchestrator                           │
//! │                                                              │
//! │  host.rs            - Async single-writer host (tokio)       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! The `core/` and `game/` modules never read the wall clock. Time comes
//! in through [`QuestOrchestrator::tick`], and question picks draw from
//! a seeded [`DeterministicRng`]. The same seed and the same calls give
//! the same session hash.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod host;

// Re-export commonly used types
pub use crate::core::geometry::{Point, Rect};
pub use crate::core::rng::{DeterministicRng, RandomSource};
pub use crate::core::timer::Millis;
pub use game::catalog::GameContent;
pub use game::hint::{HintData, HintType};
pub use game::input::InputFrame;
pub use game::quest::{QuestConfig, QuestError, QuestOrchestrator};
pub use game::state::{GameMode, SessionSnapshot};
pub use game::question::Subject;
pub use host::{QuestHandle, QuestHost};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Attempts per question
pub const MAX_ATTEMPTS: u8 = 3;

/// Score per correct answer
pub const REWARD_POINTS: u32 = 10;

/// Coins per correct answer in reward mode
pub const COINS_PER_CORRECT: u32 = 10;

/// Interaction reach around the player (world units)
pub const INTERACT_RADIUS: u32 = 60;

/// Delay between a correct answer and its hint (ms)
pub const HINT_DELAY_MS: Millis = 1000;

/// How long a revealed solution stays up (ms)
pub const SOLUTION_DISPLAY_MS: Millis = 3000;

/// Delay between level completion and the results screen (ms)
pub const LEVEL_TRANSITION_MS: Millis = 3000;
