#![deny(unreachable_pub)]
pub mod config;
pub mod context;
pub mod errors;
pub mod events;
pub mod grid;
pub mod venue;

pub use config::Settings;
pub use context::BotContext;
pub use errors::{BotError, BotResult};
pub use events::Notification;
pub use grid::{GridBot, GridParams, RunnerConfig};
pub use venue::{OrderParams, PaperVenue, Side, SubmitPolicy, VenueClient};
