//! Match Configuration
//!
//! Every tunable constant of a match lives here: board size, turn budget,
//! action scaling, scoring percents, end-game tables and the crop catalog.
//! Defaults are the reference values; any field may be overridden from JSON.

use std::path::Path;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::game::catalog::CropCatalog;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config JSON is malformed.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Config parsed but describes an impossible match.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Which crops count as neighbours when scoring synergy during a bulk harvest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynergyScan {
    /// Every crop live when the harvest began, including ones harvested
    /// earlier in the same batch. Only the target itself is excluded.
    #[default]
    IncludeSameBatch,
    /// Only crops still unharvested at the moment the target is scored.
    LiveOnly,
}

/// Per-crop scoring constants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Growth-time bonus in percent of growth duration (150 = x1.5).
    pub age_bonus_percent: u32,
    /// Percent of score kept when a crop is harvested before maturity.
    pub early_harvest_percent: u32,
    /// Floor for any harvested crop's base score.
    pub min_score: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            age_bonus_percent: 150,
            early_harvest_percent: 50,
            min_score: 1,
        }
    }
}

/// Score multiplier applied while few turns remain.
///
/// The harvest that resolves a turn is scored with the turns remaining during
/// that turn, so the last auto-harvest sees 1, not 0. Scoring stops once the
/// match ends, so an entry for 0 is accepted but never applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndgameMultiplier {
    /// Turns remaining at which this multiplier applies.
    pub turns_remaining: u32,
    /// Multiplier in percent (180 = x1.8).
    pub percent: u32,
}

/// One-time bonus for board utilization at game end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EfficiencyTier {
    /// Minimum share of cells covered, in percent.
    pub min_utilization_percent: u32,
    /// Points awarded.
    pub bonus: u32,
}

/// Complete configuration for one match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Board width in cells
    pub board_width: u32,
    /// Board height in cells
    pub board_height: u32,
    /// Turns in a match
    pub max_turns: u32,
    /// Placements allowed per turn outside the final stretch
    pub base_actions_per_turn: u32,
    /// Final-stretch length in turns remaining
    pub bonus_window_turns: u32,
    /// Extra placements granted inside the final stretch
    pub bonus_actions: u32,
    /// Number of upcoming archetypes shown after the active one
    pub queue_length: usize,
    /// Delay before a forced end-turn fires (0 = immediate)
    pub auto_advance_delay_ms: u64,
    /// Per-crop scoring
    pub scoring: ScoringConfig,
    /// End-game score multipliers
    pub endgame_multipliers: Vec<EndgameMultiplier>,
    /// Utilization bonus tiers
    pub efficiency_tiers: Vec<EfficiencyTier>,
    /// Synergy neighbour policy for bulk harvests
    pub synergy_scan: SynergyScan,
    /// Crop archetypes and synergy table
    pub catalog: CropCatalog,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            board_width: 8,
            board_height: 8,
            max_turns: 20,
            base_actions_per_turn: 3,
            bonus_window_turns: 5,
            bonus_actions: 1,
            queue_length: 3,
            auto_advance_delay_ms: 500,
            scoring: ScoringConfig::default(),
            endgame_multipliers: vec![
                EndgameMultiplier { turns_remaining: 3, percent: 120 },
                EndgameMultiplier { turns_remaining: 2, percent: 150 },
                EndgameMultiplier { turns_remaining: 1, percent: 180 },
                EndgameMultiplier { turns_remaining: 0, percent: 200 },
            ],
            efficiency_tiers: vec![
                EfficiencyTier { min_utilization_percent: 90, bonus: 100 },
                EfficiencyTier { min_utilization_percent: 75, bonus: 60 },
                EfficiencyTier { min_utilization_percent: 60, bonus: 30 },
                EfficiencyTier { min_utilization_percent: 45, bonus: 10 },
            ],
            synergy_scan: SynergyScan::default(),
            catalog: CropCatalog::default(),
        }
    }
}

impl GameConfig {
    /// Parse and validate a JSON config. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Total number of cells on the board.
    pub fn cell_count(&self) -> u32 {
        self.board_width.saturating_mul(self.board_height)
    }

    /// Actions allowed in a turn with `turns_remaining` left.
    pub fn actions_for(&self, turns_remaining: u32) -> u32 {
        if turns_remaining <= self.bonus_window_turns {
            self.base_actions_per_turn.saturating_add(self.bonus_actions)
        } else {
            self.base_actions_per_turn
        }
    }

    /// End-game multiplier (percent) for the given turns remaining, if any.
    pub fn multiplier_percent(&self, turns_remaining: u32) -> Option<u32> {
        self.endgame_multipliers
            .iter()
            .find(|m| m.turns_remaining == turns_remaining)
            .map(|m| m.percent)
    }

    /// Efficiency bonus for `covered` cells out of the whole board.
    ///
    /// Compares in integer percent form so that tier edges are exact.
    pub fn efficiency_bonus(&self, covered: u32) -> u32 {
        let cells = u64::from(self.cell_count());
        if cells == 0 {
            return 0;
        }
        let covered = u64::from(covered) * 100;

        self.efficiency_tiers
            .iter()
            .filter(|tier| covered >= u64::from(tier.min_utilization_percent) * cells)
            .max_by_key(|tier| tier.min_utilization_percent)
            .map(|tier| tier.bonus)
            .unwrap_or(0)
    }

    /// Reject configurations that cannot produce a playable match.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.board_width == 0 || self.board_height == 0 {
            return Err(ConfigError::Invalid("board must be at least 1x1".into()));
        }
        if self.board_width > i32::MAX as u32 || self.board_height > i32::MAX as u32 {
            return Err(ConfigError::Invalid("board dimensions exceed i32 range".into()));
        }
        if self.max_turns == 0 {
            return Err(ConfigError::Invalid("max_turns must be positive".into()));
        }
        if self.base_actions_per_turn == 0 {
            return Err(ConfigError::Invalid("base_actions_per_turn must be positive".into()));
        }
        if self.queue_length == 0 {
            return Err(ConfigError::Invalid("queue_length must be positive".into()));
        }
        if self.endgame_multipliers.iter().any(|m| m.percent == 0) {
            return Err(ConfigError::Invalid("end-game multipliers must be positive".into()));
        }
        if self.efficiency_tiers.iter().any(|t| t.min_utilization_percent > 100) {
            return Err(ConfigError::Invalid("efficiency tiers are percentages (0-100)".into()));
        }
        Ok(())
    }
}
