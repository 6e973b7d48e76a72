//! Long-biased perpetual grid strategy.
//!
//! The grid is a fixed ladder of price levels. Every level below the live
//! price carries a resting buy; a filled buy is answered with a take-profit
//! one rung above, and a filled take-profit re-arms the buy one rung below.
//! The modules split along that flow:
//!
//! - [`config`] - strategy parameters (bounded or ratio form) and derivations
//! - [`types`] - level states and per-order bookkeeping records
//! - [`ladder`] - pure ladder construction and price-to-level matching
//! - [`index`] - order-id lookup table
//! - [`reconciler`] - synchronous notification-to-transition state machine
//! - [`bot`] - async owner: bootstrap, dispatch, snapshots
//! - [`runner`] - main execution loop
//!
//! Everything except [`bot`] and [`runner`] is synchronous and deterministic:
//! given the same notification sequence, the ladder always ends in the same
//! state. The async edge of the system stays in the bot (which talks to the
//! venue) and the runner (which drives the feed).

pub mod bot;
pub mod config;
pub mod index;
pub mod ladder;
pub mod reconciler;
pub mod runner;
pub mod types;

// Re-export commonly used types
pub use bot::{GridBot, GridSnapshot};
pub use config::{GridConfig, GridForm, GridParams};
pub use index::OrderIndex;
pub use ladder::Ladder;
pub use reconciler::{FollowUp, Reconciler};
pub use runner::{run, RunnerConfig};
pub use types::{GridLevel, LevelStatus, OrderRecord, OrderRole};
