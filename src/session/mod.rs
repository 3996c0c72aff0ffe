//! Game Session
//!
//! Edge driver around one [`TurnController`]. Owns the high-score store,
//! applies player commands, and turns the controller's pending forced
//! advance into a real delay. This layer is **non-deterministic** (wall-clock
//! delays, disk I/O); all game logic runs through `game/`.

pub mod store;

use std::time::Duration;

use tracing::{info, warn};

use crate::game::turn::{Command, CommandOutcome, TurnController};

pub use store::{HighScoreStore, JsonFileHighScoreStore, MemoryHighScoreStore, StoreError};

/// A controller plus the persistence around it.
pub struct GameSession {
    controller: TurnController,
    store: Box<dyn HighScoreStore>,
    high_score: u32,
    /// Game-over already handled for the current match
    recorded: bool,
}

impl GameSession {
    /// Wrap a controller. Store failures are logged and treated as no record.
    pub fn new(mut controller: TurnController, store: Box<dyn HighScoreStore>) -> Self {
        let high_score = store.load().unwrap_or_else(|e| {
            warn!("Failed to load high score: {}", e);
            0
        });
        controller.set_known_high_score(high_score);

        Self {
            controller,
            store,
            high_score,
            recorded: false,
        }
    }

    /// The wrapped controller.
    pub fn controller(&self) -> &TurnController {
        &self.controller
    }

    /// Mutable access, e.g. to attach sinks or drain events.
    pub fn controller_mut(&mut self) -> &mut TurnController {
        &mut self.controller
    }

    /// Best score known to this session.
    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    /// The backing store.
    pub fn store(&self) -> &dyn HighScoreStore {
        self.store.as_ref()
    }

    /// Apply one command and record the high score if the match just ended.
    ///
    /// A pending forced advance is left pending; see [`Self::run_script`].
    pub fn apply(&mut self, command: Command) -> CommandOutcome {
        let outcome = self.controller.apply(command);
        if command == Command::Restart {
            self.recorded = false;
            self.controller.set_known_high_score(self.high_score);
        }
        self.record_if_finished();
        outcome
    }

    /// Fire the controller's pending forced advance, if still valid.
    pub fn resolve_forced_advance(&mut self) -> bool {
        let ended = self.controller.resolve_forced_advance();
        self.record_if_finished();
        ended
    }

    /// Play a list of commands in order.
    ///
    /// After each command, a scheduled forced advance fires once the
    /// configured auto-advance delay has elapsed.
    pub async fn run_script(&mut self, commands: &[Command]) -> Vec<CommandOutcome> {
        let delay = Duration::from_millis(self.controller.config().auto_advance_delay_ms);
        let mut outcomes = Vec::with_capacity(commands.len());

        for &command in commands {
            outcomes.push(self.apply(command));

            if self.controller.pending_advance().is_some() {
                tokio::time::sleep(delay).await;
                self.resolve_forced_advance();
            }
        }

        outcomes
    }

    fn record_if_finished(&mut self) {
        if self.recorded || !self.controller.is_game_over() {
            return;
        }
        self.recorded = true;

        let score = self.controller.score();
        if score <= self.high_score {
            return;
        }

        info!("New high score: {} (previous {})", score, self.high_score);
        self.high_score = score;
        if let Err(e) = self.store.save(score) {
            warn!("Failed to save high score: {}", e);
        }
    }
}
