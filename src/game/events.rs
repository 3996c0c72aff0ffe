//! Game Events
//!
//! One-way notifications from the core to rendering, audio, particle and
//! storage collaborators. Collaborators never feed back into game logic.

use serde::{Serialize, Deserialize};

use crate::game::board::HarvestDetail;
use crate::game::crop::{Cell, CropId};

/// End-of-game summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOverStats {
    /// Crops placed over the match
    pub crops_planted: u32,
    /// Crops harvested over the match
    pub crops_harvested: u32,
    /// Turn the match ended on
    pub final_turn: u32,
    /// Configured match length
    pub max_turns: u32,
    /// Final score divided by turns played, rounded
    pub avg_points_per_turn: u32,
    /// Utilization bonus awarded at the end
    pub efficiency_bonus: u32,
    /// Best score on record including this match (filled in by the session)
    pub high_score: u32,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEventData {
    /// A crop was planted
    CropPlaced {
        crop_id: CropId,
        archetype: String,
        origin: Cell,
    },

    /// The turn counter advanced
    TurnAdvanced {
        turn: u32,
    },

    /// Ready crops were harvested
    Harvested {
        details: Vec<HarvestDetail>,
        total: u32,
        has_synergy: bool,
    },

    /// Score changed
    ScoreChanged {
        new_total: u32,
        delta: u32,
    },

    /// Match ended
    GameOver {
        final_score: u32,
        stats: GameOverStats,
    },
}

/// A game event stamped with the turn it happened on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Turn when the event occurred
    pub turn: u32,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(turn: u32, data: GameEventData) -> Self {
        Self { turn, data }
    }

    /// Create crop placed event.
    pub fn crop_placed(turn: u32, crop_id: CropId, archetype: &str, origin: Cell) -> Self {
        Self::new(
            turn,
            GameEventData::CropPlaced {
                crop_id,
                archetype: archetype.to_owned(),
                origin,
            },
        )
    }

    /// Create turn advanced event.
    pub fn turn_advanced(turn: u32) -> Self {
        Self::new(turn, GameEventData::TurnAdvanced { turn })
    }

    /// Create harvested event.
    pub fn harvested(turn: u32, details: Vec<HarvestDetail>, total: u32) -> Self {
        let has_synergy = details.iter().any(|d| d.synergy > 0);
        Self::new(
            turn,
            GameEventData::Harvested {
                details,
                total,
                has_synergy,
            },
        )
    }

    /// Create score changed event.
    pub fn score_changed(turn: u32, new_total: u32, delta: u32) -> Self {
        Self::new(turn, GameEventData::ScoreChanged { new_total, delta })
    }

    /// Create game over event.
    pub fn game_over(turn: u32, final_score: u32, stats: GameOverStats) -> Self {
        Self::new(turn, GameEventData::GameOver { final_score, stats })
    }
}

/// Receiver of core events (renderer, audio, particles, storage).
///
/// Sinks are fire-and-forget: they cannot fail or alter match state.
pub trait EventSink {
    /// Handle one event.
    fn on_event(&mut self, event: &GameEvent);
}

/// Sink that forwards events to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn on_event(&mut self, event: &GameEvent) {
        tracing::debug!(turn = event.turn, event = ?event.data, "game event");
    }
}

impl<F> EventSink for F
where
    F: FnMut(&GameEvent),
{
    fn on_event(&mut self, event: &GameEvent) {
        self(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harvested_flags_synergy() {
        let plain = HarvestDetail {
            crop_id: 0,
            archetype: "Wheat".into(),
            base_score: 11,
            synergy: 0,
            origin: Cell::new(0, 0),
        };
        let boosted = HarvestDetail { synergy: 3, crop_id: 1, ..plain.clone() };

        let event = GameEvent::harvested(4, vec![plain.clone()], 11);
        assert!(matches!(event.data, GameEventData::Harvested { has_synergy: false, .. }));

        let event = GameEvent::harvested(4, vec![plain, boosted], 25);
        assert!(matches!(event.data, GameEventData::Harvested { has_synergy: true, .. }));
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |e: &GameEvent| seen.push(e.turn);
            sink.on_event(&GameEvent::turn_advanced(3));
            sink.on_event(&GameEvent::score_changed(3, 10, 10));
        }
        assert_eq!(seen, vec![3, 3]);
    }
}
