//! Game Logic Module
//!
//! All game simulation code. 100% deterministic for a given seed.
//!
//! ## Module Structure
//!
//! - `config`: Match configuration and scoring tables
//! - `catalog`: Crop archetypes, weighted selection, synergy table
//! - `crop`: Placed crop lifecycle (growth, harvest, adjacency)
//! - `board`: Placement validation and bulk harvest
//! - `turn`: Turn state machine, scoring, end-of-game evaluation
//! - `events`: Game events for collaborators and replay

pub mod config;
pub mod catalog;
pub mod crop;
pub mod board;
pub mod turn;
pub mod events;

// Re-export key types
pub use config::{GameConfig, ConfigError, ScoringConfig, SynergyScan};
pub use catalog::{CropArchetype, CropCatalog, Footprint, RarityTier, SynergyTable};
pub use crop::{Cell, Crop, CropId, GrowthStage};
pub use board::{GridBoard, HarvestDetail, HarvestReport, PlacementError};
pub use turn::{Command, CommandOutcome, MatchSnapshot, TurnController, TurnPhase, replay_match};
pub use events::{EventSink, GameEvent, GameEventData, GameOverStats};
