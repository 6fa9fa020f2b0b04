//! Question Engine
//!
//! Idle / Active state machine around one question at a time.
//! Activating a question resets its attempts; each wrong answer spends
//! one, and the last one reveals the solution.

use std::sync::Arc;
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::MAX_ATTEMPTS;
use crate::core::rng::RandomSource;
use crate::game::question::{Question, QuestionCatalog, Subject};

/// The question awaiting an answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveQuestion {
    pub question: Question,
    pub attempts_remaining: u8,
}

/// Outcome of one submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub correct: bool,
    /// Attempts left after this submission
    pub attempts: u8,
    /// Solution text, present once attempts run out
    pub solution: Option<String>,
    pub should_show_solution: bool,
}

/// Evaluates answers against the active question.
#[derive(Clone, Debug)]
pub struct QuestionEngine {
    catalog: Arc<QuestionCatalog>,
    active: Option<ActiveQuestion>,
}

impl QuestionEngine {
    /// Idle engine over `catalog`.
    pub fn new(catalog: Arc<QuestionCatalog>) -> Self {
        Self { catalog, active: None }
    }

    /// The catalog questions are drawn from.
    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    /// Pick a random unanswered question for `subject`.
    pub fn next_question<R>(
        &self,
        subject: Subject,
        completed_ids: &[String],
        rng: &mut R,
    ) -> Option<&Question>
    where
        R: RandomSource + ?Sized,
    {
        self.catalog.pick_next_question(subject, completed_ids, rng)
    }

    /// Activate the question with `id` at full attempts.
    ///
    /// Unknown ids leave the engine untouched.
    pub fn set_current_question(&mut self, id: &str) -> Option<&Question> {
        let question = self.catalog.question_by_id(id)?.clone();
        debug!(id, "question activated");
        let active = self.active.insert(ActiveQuestion {
            question,
            attempts_remaining: MAX_ATTEMPTS,
        });
        Some(&active.question)
    }

    /// The active question, if any.
    pub fn current_question(&self) -> Option<&Question> {
        self.active.as_ref().map(|a| &a.question)
    }

    /// Attempts left on the active question; full when idle.
    pub fn remaining_attempts(&self) -> u8 {
        self.active.as_ref().map_or(MAX_ATTEMPTS, |a| a.attempts_remaining)
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Evaluate `selected` against the active question.
    ///
    /// A correct answer keeps the engine active with attempts unchanged.
    /// With no active question nothing changes and the result reports
    /// the idle attempt count.
    pub fn submit_answer(&mut self, selected: u8) -> AnswerResult {
        let Some(active) = self.active.as_mut() else {
            debug!(selected, "answer submitted with no active question");
            return AnswerResult {
                correct: false,
                attempts: MAX_ATTEMPTS,
                solution: None,
                should_show_solution: false,
            };
        };

        if active.question.is_correct(selected) {
            return AnswerResult {
                correct: true,
                attempts: active.attempts_remaining,
                solution: None,
                should_show_solution: false,
            };
        }

        active.attempts_remaining = active.attempts_remaining.saturating_sub(1);
        let exhausted = active.attempts_remaining == 0;
        AnswerResult {
            correct: false,
            attempts: active.attempts_remaining,
            solution: exhausted.then(|| active.question.solution.clone()),
            should_show_solution: exhausted,
        }
    }

    /// Restore full attempts on the active question.
    pub fn reset_attempts(&mut self) {
        if let Some(active) = self.active.as_mut() {
            active.attempts_remaining = MAX_ATTEMPTS;
        }
    }

    /// Clue toward the next treasure for the active question.
    pub fn hint_for_current_question(&self) -> Option<&str> {
        self.current_question()?.next_clue.as_deref()
    }

    /// Return to Idle. Idempotent.
    pub fn clear_current_question(&mut self) {
        self.active = None;
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::DeterministicRng;
    use proptest::prelude::*;

    fn engine() -> QuestionEngine {
        QuestionEngine::new(Arc::new(QuestionCatalog::builtin()))
    }

    #[test]
    fn test_three_wrong_answers_reveal_solution() {
        let mut engine = engine();
        assert!(engine.set_current_question("math_2").is_some());

        let first = engine.submit_answer(0);
        assert_eq!((first.correct, first.attempts, first.should_show_solution), (false, 2, false));
        assert!(first.solution.is_none());

        let second = engine.submit_answer(2);
        assert_eq!((second.correct, second.attempts, second.should_show_solution), (false, 1, false));

        let third = engine.submit_answer(3);
        assert_eq!(third, AnswerResult {
            correct: false,
            attempts: 0,
            solution: Some("8 × 7 = 56. Think of it as 8 groups of 7.".into()),
            should_show_solution: true,
        });

        // Attempts stay floored
        let fourth = engine.submit_answer(0);
        assert_eq!(fourth.attempts, 0);
        assert!(fourth.should_show_solution);
    }

    #[test]
    fn test_correct_answer_keeps_attempts() {
        let mut engine = engine();
        engine.set_current_question("math_2");
        engine.submit_answer(0);

        let result = engine.submit_answer(1);
        assert!(result.correct);
        assert_eq!(result.attempts, 2);
        assert!(engine.is_active());
    }

    #[test]
    fn test_idle_submission_keeps_attempts() {
        let mut engine = engine();
        let result = engine.submit_answer(1);
        assert!(!result.correct);
        assert_eq!(result.attempts, 3);
        assert_eq!(result.attempts, engine.remaining_attempts());
        assert!(result.solution.is_none() && !result.should_show_solution);
        assert!(!engine.is_active());

        // Same after a question was worked on and cleared
        engine.set_current_question("math_2");
        engine.submit_answer(0);
        engine.clear_current_question();
        let result = engine.submit_answer(1);
        assert_eq!(result.attempts, 3);
        assert!(!engine.is_active());
    }

    #[test]
    fn test_unknown_id_leaves_engine_untouched() {
        let mut engine = engine();
        engine.set_current_question("math_1");
        engine.submit_answer(3);

        assert!(engine.set_current_question("nope").is_none());
        assert_eq!(engine.current_question().map(|q| q.id.as_str()), Some("math_1"));
        assert_eq!(engine.remaining_attempts(), 2);
    }

    #[test]
    fn test_reactivation_resets_attempts() {
        let mut engine = engine();
        engine.set_current_question("math_1");
        engine.submit_answer(3);
        engine.submit_answer(3);
        engine.set_current_question("science_1");
        assert_eq!(engine.remaining_attempts(), MAX_ATTEMPTS);
    }

    #[test]
    fn test_clear_and_reset() {
        let mut engine = engine();
        engine.set_current_question("gk_1");
        engine.submit_answer(3);
        engine.reset_attempts();
        assert_eq!(engine.remaining_attempts(), MAX_ATTEMPTS);

        engine.clear_current_question();
        engine.clear_current_question();
        assert!(engine.current_question().is_none());
        assert_eq!(engine.remaining_attempts(), MAX_ATTEMPTS);
        assert!(engine.hint_for_current_question().is_none());
    }

    #[test]
    fn test_hint_for_current_question() {
        let mut engine = engine();
        engine.set_current_question("math_2");
        assert_eq!(
            engine.hint_for_current_question(),
            Some("Where shadows dance and leaves whisper secrets.")
        );
    }

    #[test]
    fn test_next_question_stays_in_subject() {
        let engine = engine();
        let mut rng = DeterministicRng::new(7);
        let q = engine.next_question(Subject::Science, &[], &mut rng).expect("science question");
        assert_eq!(q.subject, Subject::Science);
    }

    proptest! {
        #[test]
        fn test_attempts_never_increase(answers in proptest::collection::vec(0u8..4, 0..10)) {
            let mut engine = engine();
            engine.set_current_question("math_3");
            let mut last = engine.remaining_attempts();
            for a in answers {
                let result = engine.submit_answer(a);
                prop_assert!(result.attempts <= last);
                prop_assert_eq!(result.should_show_solution, !result.correct && result.attempts == 0);
                last = result.attempts;
            }
        }
    }
}
