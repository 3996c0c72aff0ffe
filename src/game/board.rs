//! Grid Board
//!
//! Owns every placed crop, validates placements against bounds and overlap,
//! and performs bulk harvests with synergy accounting.
//!
//! Crops are kept in insertion order so that harvest iteration (and with it
//! the score breakdown) is deterministic.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::game::catalog::{CropArchetype, CropCatalog};
use crate::game::config::{ScoringConfig, SynergyScan};
use crate::game::crop::{Cell, Crop, CropId};

/// Placement rejection reasons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PlacementError {
    /// Footprint leaves the board.
    #[error("footprint at ({x}, {y}) leaves the board")]
    OutOfBounds {
        /// Requested origin column
        x: i32,
        /// Requested origin row
        y: i32,
    },

    /// Footprint covers a live crop.
    #[error("footprint at ({x}, {y}) overlaps crop {occupant}")]
    Overlap {
        /// Requested origin column
        x: i32,
        /// Requested origin row
        y: i32,
        /// First crop found in the way
        occupant: CropId,
    },

    /// No placements left this turn.
    #[error("no actions left this turn")]
    ActionsExhausted,

    /// The match is over.
    #[error("match has ended")]
    MatchEnded,
}

/// Per-crop line of a harvest breakdown.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestDetail {
    /// Crop that was harvested
    pub crop_id: CropId,
    /// Archetype name
    pub archetype: String,
    /// Score before synergy
    pub base_score: u32,
    /// Synergy total from neighbours
    pub synergy: u32,
    /// Origin cell
    pub origin: Cell,
}

impl HarvestDetail {
    /// Base plus synergy.
    pub fn total(&self) -> u32 {
        self.base_score.saturating_add(self.synergy)
    }
}

/// Result of one bulk harvest.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestReport {
    /// One line per harvested crop, in board order
    pub details: Vec<HarvestDetail>,
    /// Sum of all base scores and synergies
    pub total: u32,
}

impl HarvestReport {
    /// Nothing was harvested.
    pub fn is_empty(&self) -> bool {
        self.details.is_empty()
    }

    /// At least one harvested crop earned a synergy bonus.
    pub fn has_synergy(&self) -> bool {
        self.details.iter().any(|d| d.synergy > 0)
    }
}

/// Crop counts on the board.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardStats {
    /// Crops in the collection (live and not yet swept)
    pub total: usize,
    /// Ready to harvest
    pub ready: usize,
    /// Live but still growing
    pub growing: usize,
}

/// The placement grid.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GridBoard {
    width: u32,
    height: u32,
    crops: Vec<Crop>,
    next_crop_id: CropId,
}

impl GridBoard {
    /// Create an empty board.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            crops: Vec::new(),
            next_crop_id: 0,
        }
    }

    /// Board width in cells.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Board height in cells.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Total cells.
    pub fn cell_count(&self) -> u32 {
        self.width.saturating_mul(self.height)
    }

    /// All crops in insertion order, including harvested ones not yet swept.
    pub fn crops(&self) -> &[Crop] {
        &self.crops
    }

    /// Live (unharvested) crops.
    pub fn live_crops(&self) -> impl Iterator<Item = &Crop> {
        self.crops.iter().filter(|c| !c.harvested)
    }

    /// Check a placement without mutating anything.
    pub fn check_placement(&self, archetype: &CropArchetype, x: i32, y: i32) -> Result<(), PlacementError> {
        let fp = archetype.footprint;
        let fits_x = x >= 0 && i64::from(x) + i64::from(fp.width) <= i64::from(self.width);
        let fits_y = y >= 0 && i64::from(y) + i64::from(fp.height) <= i64::from(self.height);
        if !fits_x || !fits_y {
            return Err(PlacementError::OutOfBounds { x, y });
        }

        let probe = Crop::new(0, archetype.clone(), Cell::new(x, y), 0);
        for cell in probe.occupied_cells() {
            if let Some(occupant) = self.crop_at(cell.x, cell.y) {
                return Err(PlacementError::Overlap { x, y, occupant: occupant.id });
            }
        }
        Ok(())
    }

    /// True iff the footprint fits on the board and covers no live crop.
    pub fn can_place(&self, archetype: &CropArchetype, x: i32, y: i32) -> bool {
        self.check_placement(archetype, x, y).is_ok()
    }

    /// Place a crop. Rejected placements leave the board untouched.
    pub fn place(
        &mut self,
        archetype: &CropArchetype,
        x: i32,
        y: i32,
        turn_placed: u32,
    ) -> Result<&Crop, PlacementError> {
        self.check_placement(archetype, x, y)?;

        let id = self.next_crop_id;
        self.next_crop_id += 1;
        self.crops.push(Crop::new(id, archetype.clone(), Cell::new(x, y), turn_placed));

        // Just pushed
        Ok(&self.crops[self.crops.len() - 1])
    }

    /// Live crop covering a cell, if any.
    pub fn crop_at(&self, x: i32, y: i32) -> Option<&Crop> {
        let cell = Cell::new(x, y);
        self.live_crops().find(|c| c.occupies(cell))
    }

    /// Crop by ID (live or awaiting sweep).
    pub fn get(&self, id: CropId) -> Option<&Crop> {
        self.crops.iter().find(|c| c.id == id)
    }

    /// Whether the archetype fits anywhere on the board.
    pub fn has_any_placement(&self, archetype: &CropArchetype) -> bool {
        let (w, h) = (self.width as i32, self.height as i32);
        (0..w).any(|x| (0..h).any(|y| self.can_place(archetype, x, y)))
    }

    /// Grow every live crop by one turn.
    pub fn advance_all_growth(&mut self) {
        for crop in &mut self.crops {
            crop.advance_growth();
        }
    }

    /// Harvest every ready crop and score synergy.
    ///
    /// Crops are visited in insertion order. Synergy for a crop sums the pair
    /// bonus over every adjacent cell pair with each neighbour drawn from the
    /// crops live when the call began. Under `IncludeSameBatch` a neighbour
    /// harvested earlier in this call still counts; under `LiveOnly` it does not.
    pub fn harvest_ready(
        &mut self,
        catalog: &CropCatalog,
        scoring: &ScoringConfig,
        scan: SynergyScan,
    ) -> HarvestReport {
        let live_at_call: Vec<usize> = (0..self.crops.len())
            .filter(|&i| !self.crops[i].harvested)
            .collect();
        let ready: Vec<usize> = live_at_call
            .iter()
            .copied()
            .filter(|&i| self.crops[i].is_ready())
            .collect();

        let mut report = HarvestReport::default();

        for idx in ready {
            let base_score = self.crops[idx].harvest(scoring);

            let target = &self.crops[idx];
            let synergy: u32 = live_at_call
                .iter()
                .filter(|&&other| other != idx)
                .map(|&other| &self.crops[other])
                .filter(|other| scan == SynergyScan::IncludeSameBatch || !other.harvested)
                .map(|other| {
                    let pairs = target.adjacent_pairs(other);
                    pairs.saturating_mul(catalog.synergy_bonus(&target.archetype, &other.archetype))
                })
                .fold(0u32, u32::saturating_add);

            let detail = HarvestDetail {
                crop_id: target.id,
                archetype: target.archetype.name.clone(),
                base_score,
                synergy,
                origin: target.origin,
            };
            report.total = report.total.saturating_add(detail.total());
            report.details.push(detail);
        }

        report
    }

    /// Permanently remove harvested crops.
    pub fn sweep_harvested(&mut self) {
        self.crops.retain(|c| !c.harvested);
    }

    /// Crop counts.
    pub fn stats(&self) -> BoardStats {
        BoardStats {
            total: self.crops.len(),
            ready: self.crops.iter().filter(|c| c.is_ready()).count(),
            growing: self.crops.iter().filter(|c| !c.harvested && !c.is_ready()).count(),
        }
    }

    /// Cells covered by live crops.
    pub fn live_area(&self) -> u32 {
        self.live_crops().map(Crop::area).fold(0, u32::saturating_add)
    }

    /// Remove every crop and reset IDs.
    pub fn clear(&mut self) {
        self.crops.clear();
        self.next_crop_id = 0;
    }
}
