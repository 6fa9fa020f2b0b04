//! Level Catalog
//!
//! Ordered, immutable level descriptors. A level's position in the
//! catalog is its index; "next level" is index + 1.

use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};

use crate::core::geometry::{Point, Rect};
use crate::game::catalog::CatalogError;

/// An interactive treasure container placed in a level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasureBox {
    /// Session-wide unique id (e.g. `jungle_box_1`)
    pub id: String,
    /// World position
    pub position: Point,
}

impl TreasureBox {
    fn new(id: &str, x: i32, y: i32) -> Self {
        Self {
            id: id.to_string(),
            position: Point::new(x, y),
        }
    }
}

/// A themed level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    pub id: String,
    pub name: String,
    /// Background asset key
    pub background: String,
    /// Music asset key
    pub music: String,
    pub platforms: Vec<Rect>,
    /// Boxes in display order; hint targets are chosen in this order
    pub treasure_boxes: Vec<TreasureBox>,
    pub player_spawn: Point,
    /// Correct answers needed to complete the level
    pub required_answers: u32,
    pub ambient_sounds: Vec<String>,
}

impl Level {
    /// Look up a box in this level.
    pub fn box_by_id(&self, id: &str) -> Option<&TreasureBox> {
        self.treasure_boxes.iter().find(|b| b.id == id)
    }

    /// Closest uncompleted box strictly within `radius` of `from`.
    ///
    /// Ties go to the box listed first.
    pub fn nearest_open_box(
        &self,
        from: Point,
        radius: u32,
        completed: &[String],
    ) -> Option<&TreasureBox> {
        let mut best: Option<(&TreasureBox, i128)> = None;
        for b in &self.treasure_boxes {
            if completed.iter().any(|id| *id == b.id) || !from.is_within(b.position, radius) {
                continue;
            }
            let d = from.distance_squared(b.position);
            if best.is_none_or(|(_, best_d)| d < best_d) {
                best = Some((b, d));
            }
        }
        best.map(|(b, _)| b)
    }

    /// First uncompleted box other than `solved`, in level order.
    pub fn next_hint_target(&self, solved: &str, completed: &[String]) -> Option<&TreasureBox> {
        self.treasure_boxes
            .iter()
            .find(|b| b.id != solved && !completed.iter().any(|id| *id == b.id))
    }
}

/// All levels, in play order.
#[derive(Clone, Debug)]
pub struct LevelCatalog {
    levels: Vec<Level>,
}

impl LevelCatalog {
    /// Build a catalog, validating ids and objectives.
    pub fn new(levels: Vec<Level>) -> Result<Self, CatalogError> {
        if levels.is_empty() {
            return Err(CatalogError::NoLevels);
        }

        let mut level_ids = BTreeSet::new();
        let mut box_ids = BTreeSet::new();
        for level in &levels {
            if level.id.is_empty() {
                return Err(CatalogError::EmptyId);
            }
            if !level_ids.insert(level.id.as_str()) {
                return Err(CatalogError::DuplicateId(level.id.clone()));
            }
            for b in &level.treasure_boxes {
                if b.id.is_empty() {
                    return Err(CatalogError::EmptyId);
                }
                // Completion is tracked by box id alone
                if !box_ids.insert(b.id.as_str()) {
                    return Err(CatalogError::DuplicateId(b.id.clone()));
                }
            }
            if level.required_answers as usize > level.treasure_boxes.len() {
                return Err(CatalogError::UnreachableObjective {
                    id: level.id.clone(),
                    required: level.required_answers,
                    boxes: level.treasure_boxes.len(),
                });
            }
        }

        Ok(Self { levels })
    }

    /// Load a catalog from a JSON array of levels.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let levels: Vec<Level> = serde_json::from_str(json)?;
        Self::new(levels)
    }

    /// The levels shipped with the game.
    pub fn builtin() -> Self {
        Self { levels: builtin_levels() }
    }

    /// All levels.
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Number of levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Always false for a validated catalog.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Exact lookup by index.
    pub fn level(&self, index: u32) -> Option<&Level> {
        self.levels.get(index as usize)
    }

    /// Level at `index`, falling back to the first level.
    pub fn current_level(&self, index: u32) -> Option<&Level> {
        self.level(index).or_else(|| self.levels.first())
    }

    /// The level after `index`, or `None` when `index` is the last one.
    pub fn next_level(&self, index: u32) -> Option<&Level> {
        self.level(index.checked_add(1)?)
    }
}

impl Default for LevelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn platforms(list: &[(i32, i32, u32, u32)]) -> Vec<Rect> {
    list.iter().map(|&(x, y, w, h)| Rect::new(x, y, w, h)).collect()
}

fn sounds(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn builtin_levels() -> Vec<Level> {
    vec![
        Level {
            id: "jungle".into(),
            name: "Mystic Jungle".into(),
            background: "jungle-bg".into(),
            music: "jungle-music".into(),
            platforms: platforms(&[
                (0, 500, 200, 32), (300, 450, 150, 32), (500, 400, 200, 32),
                (750, 350, 150, 32), (200, 300, 180, 32), (450, 250, 120, 32),
                (650, 200, 200, 32), (100, 150, 150, 32),
            ]),
            treasure_boxes: vec![
                TreasureBox::new("jungle_box_1", 100, 450),
                TreasureBox::new("jungle_box_2", 375, 400),
                TreasureBox::new("jungle_box_3", 600, 350),
                TreasureBox::new("jungle_box_4", 280, 250),
                TreasureBox::new("jungle_box_5", 720, 150),
            ],
            player_spawn: Point::new(50, 450),
            required_answers: 5,
            ambient_sounds: sounds(&["birds", "leaves", "water"]),
        },
        Level {
            id: "city".into(),
            name: "Cyber City".into(),
            background: "city-bg".into(),
            music: "city-music".into(),
            platforms: platforms(&[
                (0, 500, 180, 32), (250, 480, 120, 32), (450, 420, 160, 32),
                (700, 380, 140, 32), (150, 320, 200, 32), (500, 280, 150, 32),
                (750, 220, 180, 32), (300, 160, 120, 32),
            ]),
            treasure_boxes: vec![
                TreasureBox::new("city_box_1", 90, 450),
                TreasureBox::new("city_box_2", 320, 430),
                TreasureBox::new("city_box_3", 530, 370),
                TreasureBox::new("city_box_4", 220, 270),
                TreasureBox::new("city_box_5", 830, 170),
            ],
            player_spawn: Point::new(50, 450),
            required_answers: 5,
            ambient_sounds: sounds(&["traffic", "wind", "electricity"]),
        },
        Level {
            id: "desert".into(),
            name: "Ancient Desert".into(),
            background: "desert-bg".into(),
            music: "desert-music".into(),
            platforms: platforms(&[
                (0, 520, 220, 32), (280, 460, 140, 32), (500, 400, 180, 32),
                (750, 360, 160, 32), (200, 300, 150, 32), (450, 240, 200, 32),
                (700, 180, 120, 32), (100, 120, 180, 32),
            ]),
            treasure_boxes: vec![
                TreasureBox::new("desert_box_1", 110, 470),
                TreasureBox::new("desert_box_2", 350, 410),
                TreasureBox::new("desert_box_3", 580, 350),
                TreasureBox::new("desert_box_4", 275, 250),
                TreasureBox::new("desert_box_5", 760, 130),
            ],
            player_spawn: Point::new(50, 470),
            required_answers: 5,
            ambient_sounds: sounds(&["wind", "sand", "mystery"]),
        },
    ]
}
