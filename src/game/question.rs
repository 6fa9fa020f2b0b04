//! Question Catalog
//!
//! Immutable question records grouped by subject, with pure lookup and
//! selection functions. Selection draws from an injected
//! [`RandomSource`] so picks are reproducible under a fixed seed.

use std::collections::BTreeSet;
use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::rng::RandomSource;
use crate::game::catalog::CatalogError;
use crate::game::hint::HintType;

/// Number of answer options on every question.
pub const OPTION_COUNT: usize = 4;

// =============================================================================
// SUBJECT / DIFFICULTY
// =============================================================================

/// Quiz subject chosen for a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Subject {
    /// Arithmetic and geometry
    #[default]
    Math,
    /// Natural sciences
    Science,
    /// General knowledge
    #[serde(rename = "GK")]
    Gk,
}

impl Subject {
    /// All subjects, in catalog order.
    pub const ALL: [Subject; 3] = [Subject::Math, Subject::Science, Subject::Gk];

    /// Display name.
    pub fn as_str(self) -> &'static str {
        match self {
            Subject::Math => "Math",
            Subject::Science => "Science",
            Subject::Gk => "GK",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Question difficulty tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

// =============================================================================
// QUESTION
// =============================================================================

/// A multiple-choice question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Catalog-wide unique id (e.g. `math_2`)
    pub id: String,
    pub subject: Subject,
    pub difficulty: Difficulty,
    pub prompt: String,
    pub options: [String; OPTION_COUNT],
    /// Index of the correct option
    pub answer_index: u8,
    /// Explanation shown after the last failed attempt
    pub solution: String,
    /// How the reward hint is presented
    #[serde(default)]
    pub hint_type: Option<HintType>,
    /// Clue text toward the next treasure
    #[serde(default)]
    pub next_clue: Option<String>,
}

impl Question {
    /// Is `selected` the correct option?
    #[inline]
    pub fn is_correct(&self, selected: u8) -> bool {
        selected == self.answer_index
    }

    /// Text of the correct option.
    pub fn correct_option(&self) -> &str {
        &self.options[(self.answer_index as usize).min(OPTION_COUNT - 1)]
    }
}

/// Per-subject progress counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectStats {
    pub total: usize,
    pub completed: usize,
    pub remaining: usize,
}

// =============================================================================
// CATALOG
// =============================================================================

/// The full, validated question set.
#[derive(Clone, Debug)]
pub struct QuestionCatalog {
    questions: Vec<Question>,
}

impl QuestionCatalog {
    /// Build a catalog, validating ids and answer indices.
    pub fn new(questions: Vec<Question>) -> Result<Self, CatalogError> {
        let mut seen = BTreeSet::new();
        for q in &questions {
            if q.id.is_empty() {
                return Err(CatalogError::EmptyId);
            }
            if !seen.insert(q.id.as_str()) {
                return Err(CatalogError::DuplicateId(q.id.clone()));
            }
            if q.answer_index as usize >= OPTION_COUNT {
                return Err(CatalogError::AnswerOutOfRange {
                    id: q.id.clone(),
                    index: q.answer_index,
                });
            }
        }
        Ok(Self { questions })
    }

    /// Load a catalog from a JSON array of questions.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let questions: Vec<Question> = serde_json::from_str(json)?;
        Self::new(questions)
    }

    /// The questions shipped with the game.
    pub fn builtin() -> Self {
        Self { questions: builtin_questions() }
    }

    /// All questions in catalog order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Number of questions.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Is the catalog empty?
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// All questions for `subject`, in catalog order.
    pub fn questions_by_subject(&self, subject: Subject) -> Vec<&Question> {
        self.questions.iter().filter(|q| q.subject == subject).collect()
    }

    /// Pick a random unanswered question for `subject`.
    ///
    /// Returns `None` once every question of the subject is in
    /// `completed_ids`.
    pub fn pick_next_question<R>(
        &self,
        subject: Subject,
        completed_ids: &[String],
        rng: &mut R,
    ) -> Option<&Question>
    where
        R: RandomSource + ?Sized,
    {
        let available: Vec<&Question> = self
            .questions
            .iter()
            .filter(|q| q.subject == subject && !completed_ids.iter().any(|id| *id == q.id))
            .collect();

        if available.is_empty() {
            return None;
        }
        let idx = rng.next_index(available.len());
        available.get(idx).copied()
    }

    /// Exact lookup by id.
    pub fn question_by_id(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Count the subject's questions and how many are in `completed_ids`.
    pub fn subject_stats(&self, subject: Subject, completed_ids: &[String]) -> SubjectStats {
        let subject_questions = self.questions_by_subject(subject);
        let total = subject_questions.len();
        let completed = subject_questions
            .iter()
            .filter(|q| completed_ids.iter().any(|id| *id == q.id))
            .count();
        SubjectStats {
            total,
            completed,
            remaining: total - completed,
        }
    }
}

impl Default for QuestionCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

// =============================================================================
// BUILT-IN CONTENT
// =============================================================================

#[allow(clippy::too_many_arguments)]
fn question(
    id: &str,
    subject: Subject,
    difficulty: Difficulty,
    prompt: &str,
    options: [&str; OPTION_COUNT],
    answer_index: u8,
    solution: &str,
    hint_type: HintType,
    next_clue: &str,
) -> Question {
    Question {
        id: id.to_string(),
        subject,
        difficulty,
        prompt: prompt.to_string(),
        options: options.map(str::to_string),
        answer_index,
        solution: solution.to_string(),
        hint_type: Some(hint_type),
        next_clue: Some(next_clue.to_string()),
    }
}

fn builtin_questions() -> Vec<Question> {
    use Difficulty::{Easy, Hard, Medium};
    use HintType::{Compass, Glow, Map, Riddle};
    use Subject::{Gk, Math, Science};

    vec![
        question(
            "math_1", Math, Easy,
            "What is 15 + 27?",
            ["42", "41", "43", "40"], 0,
            "15 + 27 = 42. Add the ones place (5+7=12) and tens place (1+2+1=4).",
            Compass, "Look for the treasure that sparkles near water.",
        ),
        question(
            "math_2", Math, Easy,
            "What is 8 × 7?",
            ["54", "56", "58", "52"], 1,
            "8 × 7 = 56. Think of it as 8 groups of 7.",
            Riddle, "Where shadows dance and leaves whisper secrets.",
        ),
        question(
            "math_3", Math, Medium,
            "If a triangle has angles of 60° and 70°, what is the third angle?",
            ["50°", "40°", "60°", "45°"], 0,
            "All triangle angles sum to 180°. 180° - 60° - 70° = 50°.",
            Glow, "The path lights up where ancient stones rest.",
        ),
        question(
            "math_4", Math, Medium,
            "What is 144 ÷ 12?",
            ["11", "12", "13", "10"], 1,
            "144 ÷ 12 = 12. Think: 12 × 12 = 144.",
            Map, "Check the northern clearing on your map.",
        ),
        question(
            "math_5", Math, Hard,
            "What is the square root of 169?",
            ["12", "13", "14", "11"], 1,
            "√169 = 13, because 13 × 13 = 169.",
            Compass, "Follow the arrow to where the sun sets.",
        ),
        question(
            "science_1", Science, Easy,
            "What gas do plants absorb from the atmosphere during photosynthesis?",
            ["Oxygen", "Carbon Dioxide", "Nitrogen", "Hydrogen"], 1,
            "Plants absorb carbon dioxide (CO₂) and release oxygen during photosynthesis.",
            Riddle, "Where green life flourishes and oxygen flows.",
        ),
        question(
            "science_2", Science, Easy,
            "How many bones are in an adult human body?",
            ["196", "206", "216", "186"], 1,
            "Adult humans have 206 bones, while babies are born with about 270.",
            Glow, "The treasure glows near the place of rest.",
        ),
        question(
            "science_3", Science, Medium,
            "What is the chemical symbol for gold?",
            ["Go", "Au", "Gd", "Ag"], 1,
            "Gold's symbol is Au, from the Latin word \"aurum\" meaning gold.",
            Map, "The map reveals treasure in the eastern caves.",
        ),
        question(
            "science_4", Science, Medium,
            "Which planet is closest to the Sun?",
            ["Venus", "Earth", "Mercury", "Mars"], 2,
            "Mercury is the closest planet to the Sun, with temperatures reaching 800°F.",
            Compass, "Head toward the brightest star in the sky.",
        ),
        question(
            "science_5", Science, Hard,
            "What is the powerhouse of the cell?",
            ["Nucleus", "Ribosome", "Mitochondria", "Endoplasmic Reticulum"], 2,
            "Mitochondria produce ATP (energy) for the cell, earning the nickname \"powerhouse\".",
            Riddle, "Where energy flows and life powers on.",
        ),
        question(
            "gk_1", Gk, Easy,
            "What is the capital of France?",
            ["London", "Berlin", "Paris", "Rome"], 2,
            "Paris is the capital and largest city of France.",
            Map, "Look for the treasure near the tallest structure.",
        ),
        question(
            "gk_2", Gk, Easy,
            "Which ocean is the largest?",
            ["Atlantic", "Pacific", "Indian", "Arctic"], 1,
            "The Pacific Ocean covers about one-third of Earth's surface.",
            Glow, "The path glows where water meets land.",
        ),
        question(
            "gk_3", Gk, Medium,
            "Who painted the Mona Lisa?",
            ["Picasso", "Van Gogh", "Leonardo da Vinci", "Michelangelo"], 2,
            "Leonardo da Vinci painted the Mona Lisa between 1503-1519.",
            Riddle, "Where art and beauty create eternal smiles.",
        ),
        question(
            "gk_4", Gk, Medium,
            "What is the longest river in the world?",
            ["Amazon", "Nile", "Mississippi", "Yangtze"], 1,
            "The Nile River is about 4,135 miles long, flowing through northeastern Africa.",
            Compass, "Follow the flowing water to ancient lands.",
        ),
        question(
            "gk_5", Gk, Hard,
            "In which year did World War II end?",
            ["1944", "1945", "1946", "1943"], 1,
            "World War II ended in 1945 with Japan's surrender in September.",
            Map, "The map points to where history was made.",
        ),
    ]
}

// =============================================================================
// TESTS
// =============================================================================
