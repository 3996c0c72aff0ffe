//! # Grid Garden Engine
//!
//! Turn-based crop placement, growth and scoring for Grid Garden, playable
//! headless and fully replayable from a seed and a command list.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    GRID GARDEN ENGINE                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── hash.rs     - State hashing for replay verification     │
//! │                                                              │
//! │  game/           - Game logic (deterministic)                │
//! │  ├── config.rs   - Match config and scoring tables           │
//! │  ├── catalog.rs  - Crop archetypes and synergy table         │
//! │  ├── crop.rs     - Growth and harvest of one crop            │
//! │  ├── board.rs    - Placement and bulk harvest                │
//! │  ├── turn.rs     - Turn state machine and scoring            │
//! │  └── events.rs   - Events for rendering/audio/storage        │
//! │                                                              │
//! │  session/        - Edge driver (non-deterministic)           │
//! │  ├── mod.rs      - Command driver, deferred auto end-turn    │
//! │  └── store.rs    - High-score persistence                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are deterministic:
//! - Scoring uses integer percentages, never floats
//! - Crops are iterated in insertion order
//! - No system time dependencies
//! - All randomness from seeded Xorshift128+
//!
//! Given identical config, seed and commands, a match produces identical
//! events and an identical state hash.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod session;

// Re-export commonly used types
pub use core::rng::DeterministicRng;
pub use game::config::GameConfig;
pub use game::events::{EventSink, GameEvent};
pub use game::turn::{Command, TurnController, replay_match};
pub use session::GameSession;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
