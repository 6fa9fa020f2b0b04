//! Hint Engine
//!
//! Records hint directives, hands each one to the presentation callback
//! registered for its type, and expires it after its duration.
//!
//! Hint types form a closed enum and callbacks live in a fixed table
//! indexed by an exhaustive match, so adding a type is a compile error
//! until every dispatch site handles it. Expiry runs on virtual time:
//! the owner calls [`HintEngine::advance`] from its tick.

use std::collections::BTreeMap;
use std::fmt;
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::geometry::Point;
use crate::core::timer::{Millis, TimerQueue};
use crate::game::state::SessionState;

/// Duration used by [`HintEngine::emit_hint`] callers without a preference.
pub const DEFAULT_HINT_DURATION: Millis = 3000;

/// Riddle text used when a question carries no clue.
pub const DEFAULT_RIDDLE: &str = "Follow the clue to find your treasure!";

/// How a hint is presented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HintType {
    /// Marker over the target on the map
    Map,
    /// Text clue
    Riddle,
    /// Arrow from the player toward the target
    Compass,
    /// The target box glows
    Glow,
}

impl HintType {
    /// All hint types.
    pub const ALL: [HintType; 4] = [HintType::Map, HintType::Riddle, HintType::Compass, HintType::Glow];

    /// Display duration used by the per-type emitters.
    pub fn default_duration(self) -> Millis {
        match self {
            HintType::Map => 3000,
            HintType::Riddle => 5000,
            HintType::Compass => 8000,
            HintType::Glow => 4000,
        }
    }

    /// Fixed message of the per-type emitters; riddles bring their own.
    pub fn default_message(self) -> Option<&'static str> {
        match self {
            HintType::Map => Some("Check your map for the treasure location!"),
            HintType::Riddle => None,
            HintType::Compass => Some("Follow the compass to find your treasure!"),
            HintType::Glow => Some("Follow the glowing path!"),
        }
    }

    fn slot(self) -> usize {
        match self {
            HintType::Map => 0,
            HintType::Riddle => 1,
            HintType::Compass => 2,
            HintType::Glow => 3,
        }
    }
}

/// Payload handed to presentation callbacks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintData {
    #[serde(rename = "type")]
    pub hint_type: HintType,
    pub target_position: Point,
    #[serde(default)]
    pub message: Option<String>,
    /// Display duration (ms)
    pub duration: Millis,
}

/// Identity of an emitted hint.
pub type HintId = u64;

/// A hint still within its display duration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveHint {
    pub id: HintId,
    pub data: HintData,
    /// Virtual time at which the hint is dropped
    pub expires_at: Millis,
}

/// Presentation callback. Invoked synchronously at emission.
pub type HintCallback = Box<dyn FnMut(&HintData) + Send>;

/// Hint dispatch and bookkeeping.
pub struct HintEngine {
    callbacks: [Option<HintCallback>; 4],
    /// BTreeMap keeps emission order for `active_hints`
    active: BTreeMap<HintId, ActiveHint>,
    expiries: TimerQueue<HintId>,
    next_id: HintId,
    now: Millis,
}

impl Default for HintEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HintEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registered: Vec<HintType> = HintType::ALL
            .into_iter()
            .filter(|t| self.callbacks[t.slot()].is_some())
            .collect();
        f.debug_struct("HintEngine")
            .field("registered", &registered)
            .field("active", &self.active.len())
            .field("now", &self.now)
            .finish()
    }
}

impl HintEngine {
    /// Engine with no callbacks and no active hints.
    pub fn new() -> Self {
        Self {
            callbacks: Default::default(),
            active: BTreeMap::new(),
            expiries: TimerQueue::new(),
            next_id: 0,
            now: 0,
        }
    }

    /// Install the callback for `hint_type`, replacing any previous one.
    pub fn register_hint_callback<F>(&mut self, hint_type: HintType, callback: F)
    where
        F: FnMut(&HintData) + Send + 'static,
    {
        self.callbacks[hint_type.slot()] = Some(Box::new(callback));
    }

    /// Remove the callback for `hint_type`. Returns whether one was set.
    pub fn unregister_hint_callback(&mut self, hint_type: HintType) -> bool {
        self.callbacks[hint_type.slot()].take().is_some()
    }

    /// Current virtual time as last seen by [`advance`](Self::advance).
    pub fn now(&self) -> Millis {
        self.now
    }

    /// Record a hint, present it, and schedule its expiry.
    ///
    /// Usage is counted at emission, whether or not anything presents it.
    pub fn emit_hint(
        &mut self,
        state: &mut SessionState,
        hint_type: HintType,
        target_position: Point,
        message: Option<&str>,
        duration: Millis,
    ) -> HintId {
        let data = HintData {
            hint_type,
            target_position,
            message: message.map(str::to_string),
            duration,
        };

        let id = self.next_id;
        self.next_id += 1;
        self.active.insert(id, ActiveHint {
            id,
            data: data.clone(),
            expires_at: self.now.saturating_add(duration),
        });

        match self.callbacks[hint_type.slot()].as_mut() {
            Some(callback) => callback(&data),
            None => debug!(?hint_type, "no presenter registered for hint"),
        }

        self.expiries.schedule(self.now, duration, id);
        state.increment_hints_used();

        debug!(id, ?hint_type, %target_position, duration, "hint emitted");
        id
    }

    /// Map marker over the target.
    pub fn show_map_hint(&mut self, state: &mut SessionState, target: Point) -> HintId {
        self.show_typed(state, HintType::Map, target, None)
    }

    /// Riddle text pointing at the target.
    pub fn show_riddle_hint(&mut self, state: &mut SessionState, target: Point, riddle: &str) -> HintId {
        self.show_typed(state, HintType::Riddle, target, Some(riddle))
    }

    /// Compass arrow toward the target.
    pub fn show_compass_hint(&mut self, state: &mut SessionState, target: Point) -> HintId {
        self.show_typed(state, HintType::Compass, target, None)
    }

    /// Glow on the target box.
    pub fn show_glow_hint(&mut self, state: &mut SessionState, target: Point) -> HintId {
        self.show_typed(state, HintType::Glow, target, None)
    }

    fn show_typed(
        &mut self,
        state: &mut SessionState,
        hint_type: HintType,
        target: Point,
        message: Option<&str>,
    ) -> HintId {
        let message = message.or(hint_type.default_message());
        self.emit_hint(state, hint_type, target, message, hint_type.default_duration())
    }

    /// Dispatch a question's reward hint.
    ///
    /// Does nothing unless both a type and a target are known. `message`
    /// overrides the riddle text.
    pub fn process_hint_from_question(
        &mut self,
        state: &mut SessionState,
        hint_type: Option<HintType>,
        target: Option<Point>,
        message: Option<&str>,
    ) -> Option<HintId> {
        let (hint_type, target) = (hint_type?, target?);
        let id = match hint_type {
            HintType::Map => self.show_map_hint(state, target),
            HintType::Riddle => self.show_riddle_hint(state, target, message.unwrap_or(DEFAULT_RIDDLE)),
            HintType::Compass => self.show_compass_hint(state, target),
            HintType::Glow => self.show_glow_hint(state, target),
        };
        Some(id)
    }

    /// Hints still within their duration, in emission order.
    pub fn active_hints(&self) -> Vec<ActiveHint> {
        self.active.values().cloned().collect()
    }

    /// Drop every active hint and its pending expiry. Callbacks are not invoked.
    pub fn clear_all_hints(&mut self) {
        self.active.clear();
        self.expiries.clear();
    }

    /// Move virtual time to `now` and drop expired hints.
    ///
    /// Returns the ids that expired. Time never moves backwards.
    pub fn advance(&mut self, now: Millis) -> Vec<HintId> {
        self.now = self.now.max(now);
        self.expiries
            .pop_due(self.now)
            .into_iter()
            .filter_map(|(_, id)| self.active.remove(&id).map(|_| id))
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<HintData>>>;

    fn recorder(engine: &mut HintEngine, hint_type: HintType) -> Log {
        let log: Log = Arc::default();
        let sink = Arc::clone(&log);
        engine.register_hint_callback(hint_type, move |data| {
            sink.lock().expect("log lock").push(data.clone());
        });
        log
    }

    fn calls(log: &Log) -> Vec<HintData> {
        log.lock().expect("log lock").clone()
    }

    #[test]
    fn test_map_hint_payload() {
        let mut engine = HintEngine::new();
        let mut state = SessionState::new();
        let log = recorder(&mut engine, HintType::Map);

        engine.show_map_hint(&mut state, Point::new(10, 20));

        assert_eq!(calls(&log), vec![HintData {
            hint_type: HintType::Map,
            target_position: Point::new(10, 20),
            message: Some("Check your map for the treasure location!".into()),
            duration: 3000,
        }]);
    }

    #[test]
    fn test_typed_emitters() {
        let mut engine = HintEngine::new();
        let mut state = SessionState::new();
        let riddle = recorder(&mut engine, HintType::Riddle);
        let compass = recorder(&mut engine, HintType::Compass);
        let glow = recorder(&mut engine, HintType::Glow);

        engine.show_riddle_hint(&mut state, Point::new(1, 1), "Where shadows dance");
        engine.show_compass_hint(&mut state, Point::new(2, 2));
        engine.show_glow_hint(&mut state, Point::new(3, 3));

        let r = calls(&riddle).remove(0);
        assert_eq!((r.message.as_deref(), r.duration), (Some("Where shadows dance"), 5000));
        let c = calls(&compass).remove(0);
        assert_eq!(
            (c.message.as_deref(), c.duration),
            (Some("Follow the compass to find your treasure!"), 8000)
        );
        let g = calls(&glow).remove(0);
        assert_eq!((g.message.as_deref(), g.duration), (Some("Follow the glowing path!"), 4000));
    }

    #[test]
    fn test_emit_without_callback_still_counts_and_records() {
        let mut engine = HintEngine::new();
        let mut state = SessionState::new();

        engine.emit_hint(&mut state, HintType::Compass, Point::new(200, 300), None, DEFAULT_HINT_DURATION);

        assert_eq!(state.hints_used(), 1);
        let active = engine.active_hints();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].data.hint_type, HintType::Compass);
        assert_eq!(active[0].data.target_position, Point::new(200, 300));
        assert_eq!(active[0].expires_at, 3000);
    }

    #[test]
    fn test_every_emission_counts() {
        let mut engine = HintEngine::new();
        let mut state = SessionState::new();
        let _log = recorder(&mut engine, HintType::Glow);

        for i in 0..4 {
            engine.show_glow_hint(&mut state, Point::new(5, 5));
            assert_eq!(state.hints_used(), i + 1);
        }
        // Duplicates are kept
        assert_eq!(engine.active_hints().len(), 4);
    }

    #[test]
    fn test_last_registration_wins() {
        let mut engine = HintEngine::new();
        let mut state = SessionState::new();
        let first = recorder(&mut engine, HintType::Map);
        let second = recorder(&mut engine, HintType::Map);

        engine.show_map_hint(&mut state, Point::ZERO);
        assert!(calls(&first).is_empty());
        assert_eq!(calls(&second).len(), 1);

        assert!(engine.unregister_hint_callback(HintType::Map));
        assert!(!engine.unregister_hint_callback(HintType::Map));
        engine.show_map_hint(&mut state, Point::ZERO);
        assert_eq!(calls(&second).len(), 1);
    }

    #[test]
    fn test_expiry_on_virtual_time() {
        let mut engine = HintEngine::new();
        let mut state = SessionState::new();

        let map = engine.show_map_hint(&mut state, Point::ZERO);
        let compass = engine.show_compass_hint(&mut state, Point::ZERO);

        assert!(engine.advance(2999).is_empty());
        assert_eq!(engine.advance(3000), vec![map]);
        assert_eq!(engine.active_hints().len(), 1);

        assert_eq!(engine.advance(8000), vec![compass]);
        assert!(engine.active_hints().is_empty());
    }

    #[test]
    fn test_clear_all_hints_invalidates_expiries() {
        let mut engine = HintEngine::new();
        let mut state = SessionState::new();
        let log = recorder(&mut engine, HintType::Map);

        engine.show_map_hint(&mut state, Point::new(100, 200));
        engine.show_riddle_hint(&mut state, Point::new(300, 400), "riddle");
        engine.clear_all_hints();
        assert!(engine.active_hints().is_empty());

        // The pending expiries fire into nothing
        assert!(engine.advance(10_000).is_empty());
        assert!(engine.active_hints().is_empty());
        // No callback on clear, no counter change
        assert_eq!(calls(&log).len(), 1);
        assert_eq!(state.hints_used(), 2);

        // New hints after a clear expire normally
        let id = engine.show_glow_hint(&mut state, Point::ZERO);
        assert_eq!(engine.active_hints()[0].expires_at, 14_000);
        assert_eq!(engine.advance(14_000), vec![id]);
    }

    #[test]
    fn test_time_does_not_go_backwards() {
        let mut engine = HintEngine::new();
        engine.advance(500);
        engine.advance(100);
        assert_eq!(engine.now(), 500);
    }

    #[test]
    fn test_process_hint_from_question() {
        let mut engine = HintEngine::new();
        let mut state = SessionState::new();
        let riddle = recorder(&mut engine, HintType::Riddle);
        let map = recorder(&mut engine, HintType::Map);

        assert!(engine.process_hint_from_question(&mut state, None, Some(Point::ZERO), None).is_none());
        assert!(engine.process_hint_from_question(&mut state, Some(HintType::Map), None, None).is_none());
        assert_eq!(state.hints_used(), 0);

        engine.process_hint_from_question(&mut state, Some(HintType::Riddle), Some(Point::ZERO), Some("Custom clue"));
        engine.process_hint_from_question(&mut state, Some(HintType::Riddle), Some(Point::ZERO), None);
        engine.process_hint_from_question(&mut state, Some(HintType::Map), Some(Point::ZERO), Some("ignored"));

        let riddles: Vec<_> = calls(&riddle).into_iter().filter_map(|d| d.message).collect();
        assert_eq!(riddles, vec!["Custom clue".to_string(), DEFAULT_RIDDLE.to_string()]);
        assert_eq!(
            calls(&map)[0].message.as_deref(),
            Some("Check your map for the treasure location!")
        );
        assert_eq!(state.hints_used(), 3);
    }

    #[test]
    fn test_hint_data_json_shape() {
        let data = HintData {
            hint_type: HintType::Glow,
            target_position: Point::new(1, 2),
            message: None,
            duration: 4000,
        };
        let json = serde_json::to_value(&data).expect("serializable");
        assert_eq!(json["type"], "glow");
        assert_eq!(json["targetPosition"]["x"], 1);
    }
}
