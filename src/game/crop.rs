//! Placed Crops
//!
//! A crop is one archetype planted at an origin cell. It owns its own
//! growth and harvest transitions; the board owns placement and adjacency.

use serde::{Serialize, Deserialize};

use crate::game::catalog::CropArchetype;
use crate::game::config::ScoringConfig;

/// Unique crop identifier within a match (monotonic counter).
pub type CropId = u32;

/// A grid cell. Signed so that off-board requests can be expressed and rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl Cell {
    /// Create a cell.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another cell.
    #[inline]
    pub fn manhattan(self, other: Cell) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// Display-only growth classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GrowthStage {
    /// Under 25% grown
    Planted,
    /// 25% to under 75%
    Growing,
    /// 75% to under 100%
    Mature,
    /// Fully grown
    Harvestable,
}

/// A placed crop instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Crop {
    /// Unique ID
    pub id: CropId,

    /// Species
    pub archetype: CropArchetype,

    /// Top-left cell of the footprint
    pub origin: Cell,

    /// Turn on which it was placed
    pub turn_placed: u32,

    /// Turns grown since placement (capped at growth duration)
    pub age: u32,

    /// Has this crop been harvested?
    pub harvested: bool,
}

impl Crop {
    /// Create a freshly planted crop.
    pub fn new(id: CropId, archetype: CropArchetype, origin: Cell, turn_placed: u32) -> Self {
        Self {
            id,
            archetype,
            origin,
            turn_placed,
            age: 0,
            harvested: false,
        }
    }

    /// Grow by one turn. No-op once fully grown or harvested.
    pub fn advance_growth(&mut self) {
        if !self.harvested && self.age < self.archetype.growth_duration {
            self.age += 1;
        }
    }

    /// Fully grown and still in the ground.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.age >= self.archetype.growth_duration && !self.harvested
    }

    /// Harvest the crop. Returns 0 and leaves state unchanged if not ready.
    pub fn harvest(&mut self, scoring: &ScoringConfig) -> u32 {
        if !self.is_ready() {
            return 0;
        }
        self.harvested = true;
        self.base_score(scoring)
    }

    /// Score this crop would yield if harvested now, before synergy.
    ///
    /// Early harvests keep `early_harvest_percent` of the score. The result is
    /// never below `min_score`.
    pub fn base_score(&self, scoring: &ScoringConfig) -> u32 {
        let full = u64::from(self.archetype.base_value)
            + u64::from(self.archetype.growth_bonus(scoring));

        let score = if self.age < self.archetype.growth_duration {
            full * u64::from(scoring.early_harvest_percent) / 100
        } else {
            full
        };

        u32::try_from(score)
            .unwrap_or(u32::MAX)
            .max(scoring.min_score)
    }

    /// Growth stage for display. `None` once harvested.
    pub fn growth_stage(&self) -> Option<GrowthStage> {
        if self.harvested {
            return None;
        }

        let duration = self.archetype.growth_duration;
        if duration == 0 || self.age >= duration {
            return Some(GrowthStage::Harvestable);
        }

        // Compare age/duration against 3/4 and 1/4 without floats
        let age4 = u64::from(self.age) * 4;
        let duration = u64::from(duration);
        let stage = if age4 >= duration * 3 {
            GrowthStage::Mature
        } else if age4 >= duration {
            GrowthStage::Growing
        } else {
            GrowthStage::Planted
        };
        Some(stage)
    }

    /// Number of cells covered.
    #[inline]
    pub fn area(&self) -> u32 {
        self.archetype.footprint.area()
    }

    /// Check if crop covers a cell.
    pub fn occupies(&self, cell: Cell) -> bool {
        let fp = self.archetype.footprint;
        let dx = i64::from(cell.x) - i64::from(self.origin.x);
        let dy = i64::from(cell.y) - i64::from(self.origin.y);
        dx >= 0 && dy >= 0 && dx < i64::from(fp.width) && dy < i64::from(fp.height)
    }

    /// All cells covered, column-major from the origin.
    pub fn occupied_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let fp = self.archetype.footprint;
        let origin = self.origin;
        (0..fp.width as i32).flat_map(move |dx| {
            (0..fp.height as i32).map(move |dy| Cell::new(origin.x + dx, origin.y + dy))
        })
    }

    /// Count of orthogonally adjacent cell pairs between this crop and another.
    ///
    /// Each touching pair counts once, so long shared edges count several times.
    pub fn adjacent_pairs(&self, other: &Crop) -> u32 {
        let theirs: Vec<Cell> = other.occupied_cells().collect();
        self.occupied_cells()
            .map(|mine| theirs.iter().filter(|t| mine.manhattan(**t) == 1).count() as u32)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::Footprint;

    fn wheat() -> CropArchetype {
        CropArchetype::new("Wheat", Footprint::new(1, 1), 2, 8, 1.0)
    }

    fn crop(archetype: CropArchetype, x: i32, y: i32) -> Crop {
        Crop::new(0, archetype, Cell::new(x, y), 0)
    }

    #[test]
    fn test_growth_caps_at_duration() {
        let mut c = crop(wheat(), 0, 0);
        assert!(!c.is_ready());
        c.advance_growth();
        assert_eq!(c.age, 1);
        c.advance_growth();
        assert_eq!(c.age, 2);
        assert!(c.is_ready());

        // Idempotent beyond duration
        c.advance_growth();
        c.advance_growth();
        assert_eq!(c.age, 2);
    }

    #[test]
    fn test_harvest_requires_ready() {
        let scoring = ScoringConfig::default();
        let mut c = crop(wheat(), 0, 0);

        assert_eq!(c.harvest(&scoring), 0);
        assert!(!c.harvested);
        assert_eq!(c.age, 0);
    }

    #[test]
    fn test_harvest_at_most_once() {
        let scoring = ScoringConfig::default();
        let mut c = crop(wheat(), 0, 0);
        c.advance_growth();
        c.advance_growth();

        // 8 + floor(2 * 1.5)
        assert_eq!(c.harvest(&scoring), 11);
        assert!(c.harvested);
        assert!(!c.is_ready());

        let before = c.clone();
        assert_eq!(c.harvest(&scoring), 0);
        assert_eq!(c, before);
    }

    #[test]
    fn test_growth_stops_after_harvest() {
        let scoring = ScoringConfig::default();
        let mut c = crop(CropArchetype::new("Carrot", Footprint::new(1, 1), 0, 12, 0.9), 0, 0);
        assert!(c.is_ready());
        assert_eq!(c.harvest(&scoring), 12);
        c.advance_growth();
        assert_eq!(c.age, 0);
    }

    #[test]
    fn test_early_harvest_penalty() {
        let scoring = ScoringConfig::default();
        let mut c = crop(CropArchetype::new("Corn", Footprint::new(1, 2), 3, 20, 0.8), 0, 0);
        c.advance_growth();

        // (20 + floor(3 * 1.5)) * 50% = 24 * 0.5
        assert_eq!(c.base_score(&scoring), 12);
    }

    #[test]
    fn test_min_score_clamp() {
        let scoring = ScoringConfig {
            early_harvest_percent: 0,
            ..ScoringConfig::default()
        };
        let c = crop(wheat(), 0, 0);
        assert_eq!(c.base_score(&scoring), 1);
    }

    #[test]
    fn test_growth_stages() {
        let mut c = crop(CropArchetype::new("Pumpkin", Footprint::new(2, 2), 4, 45, 0.4), 0, 0);
        assert_eq!(c.growth_stage(), Some(GrowthStage::Planted));
        c.advance_growth();
        assert_eq!(c.growth_stage(), Some(GrowthStage::Growing));
        c.advance_growth();
        assert_eq!(c.growth_stage(), Some(GrowthStage::Growing));
        c.advance_growth();
        assert_eq!(c.growth_stage(), Some(GrowthStage::Mature));
        c.advance_growth();
        assert_eq!(c.growth_stage(), Some(GrowthStage::Harvestable));

        c.harvest(&ScoringConfig::default());
        assert_eq!(c.growth_stage(), None);
    }

    #[test]
    fn test_occupied_cells() {
        let c = crop(CropArchetype::new("Berry Bush", Footprint::new(2, 1), 3, 28, 0.6), 3, 4);
        let cells: Vec<Cell> = c.occupied_cells().collect();
        assert_eq!(cells, vec![Cell::new(3, 4), Cell::new(4, 4)]);
        assert!(c.occupies(Cell::new(4, 4)));
        assert!(!c.occupies(Cell::new(5, 4)));
        assert!(!c.occupies(Cell::new(3, 5)));
        assert_eq!(c.area(), 2);
    }

    #[test]
    fn test_adjacent_pairs_multiplicity() {
        let tall = CropArchetype::new("Corn", Footprint::new(1, 2), 3, 20, 0.8);
        let a = crop(tall.clone(), 0, 0);
        let b = crop(tall, 1, 0);
        // Shared edge of length two
        assert_eq!(a.adjacent_pairs(&b), 2);
        assert_eq!(b.adjacent_pairs(&a), 2);

        let far = crop(wheat(), 3, 3);
        assert_eq!(a.adjacent_pairs(&far), 0);

        // Diagonal contact does not count
        let diag = crop(wheat(), 1, 2);
        assert_eq!(a.adjacent_pairs(&diag), 0);
    }
}
