//! Turn Controller
//!
//! The match state machine. Holds the crop queue and action budget, feeds
//! placements into the board, resolves turns (growth, auto-harvest, scoring,
//! sweep) and evaluates the end of the game.
//!
//! ```text
//!   Active ──end_turn() with turn >= max_turns──▶ Ended
//! ```
//!
//! Every transition is a single synchronous call. The only deferred work is a
//! forced end-turn after a placement, which is recorded as a pending marker
//! tagged with its turn so that it can never end a second turn.

use std::collections::VecDeque;

use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::core::hash::{compute_state_hash, StateHash};
use crate::core::rng::DeterministicRng;
use crate::game::board::{BoardStats, GridBoard, HarvestReport, PlacementError};
use crate::game::catalog::CropArchetype;
use crate::game::config::{ConfigError, GameConfig};
use crate::game::crop::Crop;
use crate::game::events::{EventSink, GameEvent, GameOverStats};

// =============================================================================
// TYPES
// =============================================================================

/// Match phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    /// Placements allowed
    #[default]
    Active,
    /// Terminal
    Ended,
}

/// Why a turn was ended automatically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForcedAdvance {
    /// The new active crop fits nowhere on the board
    NoValidPlacement,
    /// All placements for this turn are used
    ActionsExhausted,
}

/// A scheduled automatic end-turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAdvance {
    /// Turn the advance was scheduled on
    pub turn: u32,
    /// Trigger
    pub reason: ForcedAdvance,
}

/// Result of a successful placement.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaceOutcome {
    /// The planted crop
    pub crop: Crop,
    /// Forced advancement triggered by this placement
    pub forced: Option<ForcedAdvance>,
    /// The turn was ended synchronously (zero auto-advance delay)
    pub turn_ended: bool,
}

/// Result of resolving a turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSummary {
    /// Turn counter after the advance
    pub turn: u32,
    /// Auto-harvest breakdown
    pub harvest: HarvestReport,
    /// Points added to the score for the harvest, after multipliers
    pub points_awarded: u32,
    /// The match ended on this turn
    pub game_over: bool,
}

/// A player command, as recorded for replay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Place the active crop with its origin at (x, y)
    Place { x: i32, y: i32 },
    /// End the current turn
    EndTurn,
    /// Harvest ready crops without ending the turn
    Harvest,
    /// Start a new match
    Restart,
}

/// What a command did.
#[derive(Clone, Debug, PartialEq)]
pub enum CommandOutcome {
    /// Crop planted
    Placed(PlaceOutcome),
    /// Placement refused, nothing changed
    Rejected(PlacementError),
    /// Turn resolved (`None` if the match had already ended)
    TurnEnded(Option<TurnSummary>),
    /// Manual harvest result
    Harvested(HarvestReport),
    /// New match started
    Restarted,
}

/// Serializable view of the match for UIs and debugging.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    /// Current turn (0-based)
    pub turn: u32,
    /// Match length
    pub max_turns: u32,
    /// Turns left
    pub turns_remaining: u32,
    /// Score so far
    pub score: u32,
    /// Phase
    pub phase: TurnPhase,
    /// Active crop name
    pub active: String,
    /// Upcoming crop names, next first
    pub queue: Vec<String>,
    /// Placements made this turn
    pub actions_used: u32,
    /// Placements allowed this turn
    pub actions_allowed: u32,
    /// Board counts
    pub board: BoardStats,
    /// Crops placed over the match
    pub crops_planted: u32,
    /// Crops harvested over the match
    pub crops_harvested: u32,
    /// Best known score
    pub high_score: u32,
}

// =============================================================================
// CONTROLLER
// =============================================================================

/// Turn/placement/scoring state machine for one match.
pub struct TurnController {
    config: GameConfig,
    board: GridBoard,
    rng_seed: u64,
    rng: DeterministicRng,

    current_turn: u32,
    score: u32,
    phase: TurnPhase,

    active: CropArchetype,
    queue: VecDeque<CropArchetype>,

    actions_used: u32,
    actions_allowed: u32,

    crops_planted: u32,
    crops_harvested: u32,
    efficiency_bonus: u32,
    known_high_score: u32,
    last_harvest: HarvestReport,
    pending_advance: Option<PendingAdvance>,

    /// Events since the last `take_events`
    pending_events: Vec<GameEvent>,
    sinks: Vec<Box<dyn EventSink>>,
}

impl TurnController {
    /// Start a match with no collaborators attached.
    pub fn new(config: GameConfig, rng_seed: u64) -> Result<Self, ConfigError> {
        Self::with_sinks(config, rng_seed, Vec::new())
    }

    /// Start a match that reports to the given collaborators.
    pub fn with_sinks(
        config: GameConfig,
        rng_seed: u64,
        sinks: Vec<Box<dyn EventSink>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = DeterministicRng::new(rng_seed);
        let active = config.catalog.weighted_random_archetype(&mut rng).clone();
        let queue = (0..config.queue_length)
            .map(|_| config.catalog.weighted_random_archetype(&mut rng).clone())
            .collect();
        // The final-stretch bonus is first granted by end_turn, even in short matches
        let actions_allowed = config.base_actions_per_turn;

        Ok(Self {
            board: GridBoard::new(config.board_width, config.board_height),
            rng_seed,
            rng,
            current_turn: 0,
            score: 0,
            phase: TurnPhase::Active,
            active,
            queue,
            actions_used: 0,
            actions_allowed,
            crops_planted: 0,
            crops_harvested: 0,
            efficiency_bonus: 0,
            known_high_score: 0,
            last_harvest: HarvestReport::default(),
            pending_advance: None,
            pending_events: Vec::new(),
            sinks,
            config,
        })
    }

    /// Attach another collaborator.
    pub fn attach_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// Best score on record before this match, reported in game-over stats.
    pub fn set_known_high_score(&mut self, high_score: u32) {
        self.known_high_score = high_score;
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Match configuration.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The board.
    pub fn board(&self) -> &GridBoard {
        &self.board
    }

    /// Seed the match was started with.
    pub fn rng_seed(&self) -> u64 {
        self.rng_seed
    }

    /// Current turn (0-based).
    pub fn current_turn(&self) -> u32 {
        self.current_turn
    }

    /// Turns left before the match ends.
    pub fn turns_remaining(&self) -> u32 {
        self.config.max_turns.saturating_sub(self.current_turn)
    }

    /// Score so far.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Current phase.
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Check if the match has ended.
    pub fn is_game_over(&self) -> bool {
        self.phase == TurnPhase::Ended
    }

    /// Archetype the next placement will use.
    pub fn active_archetype(&self) -> &CropArchetype {
        &self.active
    }

    /// Upcoming archetypes, next first.
    pub fn queue(&self) -> impl Iterator<Item = &CropArchetype> {
        self.queue.iter()
    }

    /// Placements made this turn.
    pub fn actions_used(&self) -> u32 {
        self.actions_used
    }

    /// Placements allowed this turn.
    pub fn actions_allowed(&self) -> u32 {
        self.actions_allowed
    }

    /// Placements left this turn.
    pub fn actions_remaining(&self) -> u32 {
        self.actions_allowed.saturating_sub(self.actions_used)
    }

    /// Most recent non-empty harvest.
    pub fn last_harvest(&self) -> &HarvestReport {
        &self.last_harvest
    }

    /// Scheduled automatic end-turn, if any.
    pub fn pending_advance(&self) -> Option<PendingAdvance> {
        self.pending_advance
    }

    /// Utilization bonus awarded at game end (0 until then).
    pub fn efficiency_bonus(&self) -> u32 {
        self.efficiency_bonus
    }

    /// Whether the active crop could be placed at (x, y) right now.
    pub fn can_place_active(&self, x: i32, y: i32) -> bool {
        !self.is_game_over() && self.board.can_place(&self.active, x, y)
    }

    /// Take buffered events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // -------------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------------

    /// Place the active crop with its origin at (x, y).
    ///
    /// On success the queue advances and forced advancement is evaluated.
    /// Rejections leave every piece of state unchanged.
    pub fn place_active(&mut self, x: i32, y: i32) -> Result<PlaceOutcome, PlacementError> {
        if self.is_game_over() {
            return Err(PlacementError::MatchEnded);
        }
        if self.actions_used >= self.actions_allowed {
            return Err(PlacementError::ActionsExhausted);
        }

        let crop = self.board.place(&self.active, x, y, self.current_turn)?.clone();
        self.actions_used += 1;
        self.crops_planted += 1;

        debug!(
            "Planted {} at ({}, {}) ({}/{} this turn)",
            crop.archetype.name, x, y, self.actions_used, self.actions_allowed
        );
        self.emit(GameEvent::crop_placed(self.current_turn, crop.id, &crop.archetype.name, crop.origin));

        self.advance_queue();

        let forced = self.check_forced_advance();
        let mut turn_ended = false;
        if let Some(reason) = forced {
            debug!("Forced advance scheduled on turn {}: {:?}", self.current_turn, reason);
            self.pending_advance = Some(PendingAdvance { turn: self.current_turn, reason });
            if self.config.auto_advance_delay_ms == 0 {
                turn_ended = self.resolve_forced_advance();
            }
        }

        Ok(PlaceOutcome { crop, forced, turn_ended })
    }

    /// Fire a scheduled automatic end-turn.
    ///
    /// Only ends the turn the advance was scheduled on; if the player already
    /// ended it (or the match is over) this is a no-op. Returns whether a turn ended.
    pub fn resolve_forced_advance(&mut self) -> bool {
        match self.pending_advance.take() {
            Some(pending) if pending.turn == self.current_turn && !self.is_game_over() => {
                self.end_turn().is_some()
            }
            _ => false,
        }
    }

    /// End the current turn: grow, auto-harvest, score, sweep, maybe finish.
    ///
    /// Returns `None` without touching state if the match has ended.
    pub fn end_turn(&mut self) -> Option<TurnSummary> {
        if self.is_game_over() {
            return None;
        }

        debug!(
            "Turn {} ending ({} crops placed)",
            self.current_turn + 1,
            self.actions_used
        );

        // Harvest scoring belongs to the turn being resolved
        let resolving_remaining = self.turns_remaining();

        self.current_turn += 1;
        self.actions_allowed = self.config.actions_for(self.turns_remaining());
        self.actions_used = 0;
        self.pending_advance = None;
        self.emit(GameEvent::turn_advanced(self.current_turn));

        self.board.advance_all_growth();
        let (harvest, points_awarded) = self.harvest_and_score(resolving_remaining);
        if points_awarded > 0 {
            debug!("Auto-harvested for {} points", points_awarded);
        }

        let game_over = self.current_turn >= self.config.max_turns;
        if game_over {
            self.finish();
        }

        Some(TurnSummary {
            turn: self.current_turn,
            harvest,
            points_awarded,
            game_over,
        })
    }

    /// Harvest ready crops now without ending the turn.
    ///
    /// Returns an empty report once the match has ended.
    pub fn manual_harvest(&mut self) -> HarvestReport {
        if self.is_game_over() {
            return HarvestReport::default();
        }
        let (report, points) = self.harvest_and_score(self.turns_remaining());
        if points > 0 {
            debug!("Manual harvest: {} points", points);
        }
        report
    }

    /// Add points, applying the end-game multiplier for the current turn.
    ///
    /// Returns the points actually added.
    pub fn add_score(&mut self, points: u32) -> u32 {
        if self.is_game_over() {
            return 0;
        }
        self.add_score_at(points, self.turns_remaining())
    }

    /// Apply one command.
    pub fn apply(&mut self, command: Command) -> CommandOutcome {
        match command {
            Command::Place { x, y } => match self.place_active(x, y) {
                Ok(outcome) => CommandOutcome::Placed(outcome),
                Err(err) => CommandOutcome::Rejected(err),
            },
            Command::EndTurn => CommandOutcome::TurnEnded(self.end_turn()),
            Command::Harvest => CommandOutcome::Harvested(self.manual_harvest()),
            Command::Restart => {
                self.restart();
                CommandOutcome::Restarted
            }
        }
    }

    /// Start a new match with the same config, continuing the RNG stream.
    pub fn restart(&mut self) {
        self.board.clear();
        self.current_turn = 0;
        self.score = 0;
        self.phase = TurnPhase::Active;
        self.actions_used = 0;
        self.actions_allowed = self.config.base_actions_per_turn;
        self.crops_planted = 0;
        self.crops_harvested = 0;
        self.efficiency_bonus = 0;
        self.last_harvest = HarvestReport::default();
        self.pending_advance = None;

        self.active = self.draw_archetype();
        let queue = (0..self.config.queue_length).map(|_| self.draw_archetype()).collect();
        self.queue = queue;

        info!("Match restarted");
    }

    // -------------------------------------------------------------------------
    // Reporting
    // -------------------------------------------------------------------------

    /// Serializable view of the match.
    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            turn: self.current_turn,
            max_turns: self.config.max_turns,
            turns_remaining: self.turns_remaining(),
            score: self.score,
            phase: self.phase,
            active: self.active.name.clone(),
            queue: self.queue.iter().map(|a| a.name.clone()).collect(),
            actions_used: self.actions_used,
            actions_allowed: self.actions_allowed,
            board: self.board.stats(),
            crops_planted: self.crops_planted,
            crops_harvested: self.crops_harvested,
            high_score: self.known_high_score.max(self.score),
        }
    }

    /// Game-over summary for the current state.
    pub fn game_over_stats(&self) -> GameOverStats {
        let turns = self.current_turn.max(1);
        GameOverStats {
            crops_planted: self.crops_planted,
            crops_harvested: self.crops_harvested,
            final_turn: self.current_turn,
            max_turns: self.config.max_turns,
            avg_points_per_turn: rounded_average(self.score, turns),
            efficiency_bonus: self.efficiency_bonus,
            high_score: self.known_high_score.max(self.score),
        }
    }

    /// Hash of the full match state, for replay verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.current_turn, self.rng_seed, |hasher| {
            hasher.update_u32(self.score);
            hasher.update_bool(self.is_game_over());
            hasher.update_u32(self.actions_used);
            hasher.update_u32(self.actions_allowed);

            hasher.update_str(&self.active.name);
            for archetype in &self.queue {
                hasher.update_str(&archetype.name);
            }

            for crop in self.board.crops() {
                hasher.update_u32(crop.id);
                hasher.update_str(&crop.archetype.name);
                hasher.update_i32(crop.origin.x);
                hasher.update_i32(crop.origin.y);
                hasher.update_u32(crop.age);
                hasher.update_bool(crop.harvested);
            }

            let rng_state = self.rng.state();
            hasher.update_u64(rng_state[0]);
            hasher.update_u64(rng_state[1]);
        })
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn emit(&mut self, event: GameEvent) {
        for sink in &mut self.sinks {
            sink.on_event(&event);
        }
        self.pending_events.push(event);
    }

    fn draw_archetype(&mut self) -> CropArchetype {
        self.config.catalog.weighted_random_archetype(&mut self.rng).clone()
    }

    fn advance_queue(&mut self) {
        if let Some(next) = self.queue.pop_front() {
            self.active = next;
        }
        let fresh = self.draw_archetype();
        self.queue.push_back(fresh);
    }

    fn check_forced_advance(&self) -> Option<ForcedAdvance> {
        if !self.board.has_any_placement(&self.active) {
            Some(ForcedAdvance::NoValidPlacement)
        } else if self.actions_used >= self.actions_allowed {
            Some(ForcedAdvance::ActionsExhausted)
        } else {
            None
        }
    }

    fn harvest_and_score(&mut self, turns_remaining: u32) -> (HarvestReport, u32) {
        let report = self.board.harvest_ready(
            &self.config.catalog,
            &self.config.scoring,
            self.config.synergy_scan,
        );

        let mut awarded = 0;
        if !report.is_empty() {
            self.crops_harvested += report.details.len() as u32;
            self.emit(GameEvent::harvested(self.current_turn, report.details.clone(), report.total));
            if report.total > 0 {
                awarded = self.add_score_at(report.total, turns_remaining);
            }
            self.last_harvest = report.clone();
        }
        self.board.sweep_harvested();

        (report, awarded)
    }

    fn add_score_at(&mut self, points: u32, turns_remaining: u32) -> u32 {
        let awarded = match self.config.multiplier_percent(turns_remaining) {
            Some(percent) => {
                let scaled = u64::from(points) * u64::from(percent) / 100;
                let scaled = u32::try_from(scaled).unwrap_or(u32::MAX);
                info!("Final turns bonus: {} -> {} ({}%)", points, scaled, percent);
                scaled
            }
            None => points,
        };

        self.credit(awarded);
        awarded
    }

    fn credit(&mut self, points: u32) {
        if points == 0 {
            return;
        }
        self.score = self.score.saturating_add(points);
        self.emit(GameEvent::score_changed(self.current_turn, self.score, points));
    }

    fn finish(&mut self) {
        let covered = self.board.live_area();
        let bonus = self.config.efficiency_bonus(covered);
        self.efficiency_bonus = bonus;
        if bonus > 0 {
            info!(
                "Efficiency bonus: +{} ({} of {} cells planted)",
                bonus, covered, self.board.cell_count()
            );
            self.credit(bonus);
        }

        self.phase = TurnPhase::Ended;
        self.pending_advance = None;

        let stats = self.game_over_stats();
        info!("Game over! Final score: {}", self.score);
        self.emit(GameEvent::game_over(self.current_turn, self.score, stats));
    }
}

/// `total / count` rounded half-up, without overflow near `u32::MAX`.
fn rounded_average(total: u32, count: u32) -> u32 {
    let count = u64::from(count.max(1));
    let avg = (u64::from(total) + count / 2) / count;
    u32::try_from(avg).unwrap_or(u32::MAX)
}

/// Replay a match from recorded commands.
///
/// Forced advances resolve immediately, as with a zero auto-advance delay.
/// Returns the final controller and every event emitted.
pub fn replay_match(
    config: GameConfig,
    rng_seed: u64,
    commands: &[Command],
) -> Result<(TurnController, Vec<GameEvent>), ConfigError> {
    let mut controller = TurnController::new(config, rng_seed)?;
    let mut all_events = Vec::new();

    for command in commands {
        controller.apply(*command);
        controller.resolve_forced_advance();
        all_events.extend(controller.take_events());
    }

    Ok((controller, all_events))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::game::catalog::{CropCatalog, Footprint, SynergyTable};
    use crate::game::events::GameEventData;

    fn single_crop_config(archetype: CropArchetype) -> GameConfig {
        GameConfig {
            catalog: CropCatalog::new(vec![archetype], SynergyTable::uniform(3, 1).unwrap()).unwrap(),
            auto_advance_delay_ms: 0,
            ..GameConfig::default()
        }
    }

    fn radish() -> CropArchetype {
        CropArchetype::new("Radish", Footprint::new(1, 1), 0, 10, 1.0)
    }

    #[test]
    fn test_initial_state() {
        let controller = TurnController::new(GameConfig::default(), 42).unwrap();
        assert_eq!(controller.current_turn(), 0);
        assert_eq!(controller.score(), 0);
        assert_eq!(controller.phase(), TurnPhase::Active);
        assert_eq!(controller.queue().count(), 3);
        assert_eq!(controller.actions_allowed(), 3);
    }

    #[test]
    fn test_queue_advances_fifo() {
        let mut controller = TurnController::new(GameConfig::default(), 7).unwrap();
        let upcoming: Vec<String> = controller.queue().map(|a| a.name.clone()).collect();

        controller.place_active(0, 0).unwrap();
        assert_eq!(controller.active_archetype().name, upcoming[0]);
        let now: Vec<String> = controller.queue().map(|a| a.name.clone()).collect();
        assert_eq!(&now[..2], &upcoming[1..]);
        assert_eq!(now.len(), 3);
    }

    #[test]
    fn test_rejected_placement_changes_nothing() {
        let mut controller = TurnController::new(single_crop_config(radish()), 1).unwrap();
        controller.place_active(0, 0).unwrap();
        let before = controller.compute_hash();

        let err = controller.place_active(0, 0).unwrap_err();
        assert!(matches!(err, PlacementError::Overlap { .. }));
        assert_eq!(controller.compute_hash(), before);
        assert_eq!(controller.actions_used(), 1);
    }

    #[test]
    fn test_actions_exhausted_forces_advance() {
        let mut controller = TurnController::new(single_crop_config(radish()), 1).unwrap();
        controller.place_active(0, 0).unwrap();
        controller.place_active(1, 0).unwrap();
        let outcome = controller.place_active(2, 0).unwrap();

        assert_eq!(outcome.forced, Some(ForcedAdvance::ActionsExhausted));
        assert!(outcome.turn_ended);
        assert_eq!(controller.current_turn(), 1);
        assert_eq!(controller.actions_used(), 0);
    }

    #[test]
    fn test_no_valid_placement_forces_advance() {
        let config = GameConfig {
            board_width: 2,
            board_height: 1,
            ..single_crop_config(CropArchetype::new("Hedge", Footprint::new(1, 1), 50, 1, 1.0))
        };
        let mut controller = TurnController::new(config, 1).unwrap();
        controller.place_active(0, 0).unwrap();
        let outcome = controller.place_active(1, 0).unwrap();

        assert_eq!(outcome.forced, Some(ForcedAdvance::NoValidPlacement));
        assert_eq!(controller.current_turn(), 1);
    }

    #[test]
    fn test_deferred_advance_cannot_double_end() {
        let config = GameConfig {
            base_actions_per_turn: 1,
            auto_advance_delay_ms: 500,
            ..single_crop_config(radish())
        };
        let mut controller = TurnController::new(config, 1).unwrap();

        let outcome = controller.place_active(0, 0).unwrap();
        assert_eq!(outcome.forced, Some(ForcedAdvance::ActionsExhausted));
        assert!(!outcome.turn_ended);
        assert_eq!(controller.pending_advance().map(|p| p.turn), Some(0));

        // Further placements are refused while the advance is pending
        assert_eq!(controller.place_active(1, 0).unwrap_err(), PlacementError::ActionsExhausted);

        // Manual end-turn wins the race
        controller.end_turn();
        assert_eq!(controller.current_turn(), 1);

        // The deferred call arrives late and must not end turn 1
        assert!(!controller.resolve_forced_advance());
        assert_eq!(controller.current_turn(), 1);
    }

    #[test]
    fn test_final_stretch_grants_extra_action() {
        let mut controller = TurnController::new(GameConfig::default(), 3).unwrap();
        for _ in 0..14 {
            controller.end_turn();
        }
        assert_eq!(controller.turns_remaining(), 6);
        assert_eq!(controller.actions_allowed(), 3);
        controller.end_turn();
        assert_eq!(controller.turns_remaining(), 5);
        assert_eq!(controller.actions_allowed(), 4);
    }

    #[test]
    fn test_endgame_multiplier_on_last_turn() {
        let mut controller = TurnController::new(single_crop_config(radish()), 9).unwrap();
        for _ in 0..19 {
            controller.end_turn();
        }
        assert_eq!(controller.current_turn(), 19);

        controller.place_active(0, 0).unwrap();
        let summary = controller.end_turn().unwrap();

        assert_eq!(summary.harvest.total, 10);
        assert_eq!(summary.points_awarded, 18);
        assert!(summary.game_over);
        assert_eq!(controller.score(), 18);
    }

    #[test]
    fn test_add_score_outside_window_is_unmodified() {
        let mut controller = TurnController::new(GameConfig::default(), 3).unwrap();
        assert_eq!(controller.add_score(10), 10);
        for _ in 0..18 {
            controller.end_turn();
        }
        // 2 turns remaining -> x1.5
        assert_eq!(controller.add_score(10), 15);
        assert_eq!(controller.score(), 25);
    }

    #[test]
    fn test_game_over_is_terminal() {
        let config = GameConfig { max_turns: 2, ..single_crop_config(radish()) };
        let mut controller = TurnController::new(config, 5).unwrap();
        controller.end_turn();
        let summary = controller.end_turn().unwrap();
        assert!(summary.game_over);
        assert!(controller.is_game_over());

        let hash = controller.compute_hash();
        assert!(controller.end_turn().is_none());
        assert_eq!(controller.place_active(0, 0).unwrap_err(), PlacementError::MatchEnded);
        assert!(controller.manual_harvest().is_empty());
        assert_eq!(controller.add_score(50), 0);
        assert!(!controller.resolve_forced_advance());
        assert_eq!(controller.compute_hash(), hash);
    }

    #[test]
    fn test_manual_harvest_keeps_turn() {
        let mut controller = TurnController::new(single_crop_config(radish()), 5).unwrap();
        controller.place_active(0, 0).unwrap();
        controller.place_active(1, 0).unwrap();

        let report = controller.manual_harvest();
        // Two adjacent radishes: 10 + 3 each
        assert_eq!(report.total, 26);
        assert_eq!(controller.score(), 26);
        assert_eq!(controller.current_turn(), 0);
        assert!(controller.board().crops().is_empty());
        assert_eq!(controller.last_harvest().details.len(), 2);
    }

    #[test]
    fn test_events_reach_sinks_and_buffer() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink_seen = Rc::clone(&seen);
        let sink = move |e: &GameEvent| sink_seen.borrow_mut().push(e.clone());

        let mut controller =
            TurnController::with_sinks(single_crop_config(radish()), 5, vec![Box::new(sink)]).unwrap();
        controller.place_active(2, 3).unwrap();
        controller.end_turn();

        let buffered = controller.take_events();
        assert_eq!(*seen.borrow(), buffered);
        assert!(matches!(buffered[0].data, GameEventData::CropPlaced { .. }));
        assert!(matches!(buffered[1].data, GameEventData::TurnAdvanced { turn: 1 }));
        assert!(matches!(buffered[2].data, GameEventData::Harvested { total: 10, .. }));
        assert!(matches!(buffered[3].data, GameEventData::ScoreChanged { new_total: 10, delta: 10 }));
        assert!(controller.take_events().is_empty());
    }

    #[test]
    fn test_game_over_stats() {
        let config = GameConfig { max_turns: 2, ..single_crop_config(radish()) };
        let mut controller = TurnController::new(config, 5).unwrap();
        controller.set_known_high_score(500);
        controller.place_active(0, 0).unwrap();
        controller.end_turn();
        controller.end_turn();

        let events = controller.take_events();
        let stats = events
            .iter()
            .find_map(|e| match &e.data {
                GameEventData::GameOver { stats, .. } => Some(stats.clone()),
                _ => None,
            })
            .unwrap();

        assert_eq!(stats.crops_planted, 1);
        assert_eq!(stats.crops_harvested, 1);
        assert_eq!(stats.final_turn, 2);
        assert_eq!(stats.max_turns, 2);
        // 10 points x1.5 (2 turns remaining during turn 0) = 15, over 2 turns
        assert_eq!(stats.avg_points_per_turn, 8);
        assert_eq!(stats.high_score, 500);
    }

    #[test]
    fn test_game_over_stats_with_saturated_score() {
        let config = GameConfig {
            max_turns: 2,
            ..single_crop_config(CropArchetype::new("Giant", Footprint::new(1, 1), 0, u32::MAX, 1.0))
        };
        let mut controller = TurnController::new(config, 5).unwrap();
        controller.place_active(0, 0).unwrap();
        controller.end_turn();
        assert_eq!(controller.score(), u32::MAX);

        let summary = controller.end_turn().unwrap();
        assert!(summary.game_over);

        let stats = controller.game_over_stats();
        assert_eq!(stats.avg_points_per_turn, 1 << 31);
        assert_eq!(stats.high_score, u32::MAX);
    }

    #[test]
    fn test_short_match_starts_with_base_actions() {
        let config = GameConfig { max_turns: 3, ..single_crop_config(radish()) };
        let mut controller = TurnController::new(config, 5).unwrap();
        assert_eq!(controller.actions_allowed(), 3);

        controller.end_turn();
        assert_eq!(controller.actions_allowed(), 4);

        controller.restart();
        assert_eq!(controller.actions_allowed(), 3);
    }

    #[test]
    fn test_restart_resets_match() {
        let config = GameConfig { max_turns: 1, ..single_crop_config(radish()) };
        let mut controller = TurnController::new(config, 5).unwrap();
        controller.place_active(0, 0).unwrap();
        controller.end_turn();
        assert!(controller.is_game_over());

        controller.restart();
        assert_eq!(controller.phase(), TurnPhase::Active);
        assert_eq!(controller.current_turn(), 0);
        assert_eq!(controller.score(), 0);
        assert!(controller.board().crops().is_empty());
        assert_eq!(controller.snapshot().crops_planted, 0);
        assert!(controller.place_active(0, 0).is_ok());
    }

    #[test]
    fn test_replay_is_deterministic() {
        let commands = [
            Command::Place { x: 0, y: 0 },
            Command::Place { x: 3, y: 3 },
            Command::EndTurn,
            Command::Place { x: 5, y: 1 },
            Command::Harvest,
            Command::EndTurn,
            Command::EndTurn,
        ];

        let (a, events_a) = replay_match(GameConfig::default(), 77, &commands).unwrap();
        let (b, events_b) = replay_match(GameConfig::default(), 77, &commands).unwrap();

        assert_eq!(a.compute_hash(), b.compute_hash());
        assert_eq!(events_a, events_b);
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn test_command_json() {
        let commands: Vec<Command> =
            serde_json::from_str(r#"[{"type":"place","x":1,"y":2},{"type":"end_turn"}]"#).unwrap();
        assert_eq!(commands, vec![Command::Place { x: 1, y: 2 }, Command::EndTurn]);
    }
}
