//! Venue boundary
//!
//! Everything the bot knows about the venue lives behind [`VenueClient`]:
//! order placement, transaction confirmation, status lookup, oracle price,
//! and rounding rules. The bot never holds connectivity or keys itself.
//!
//! - [`types`] - order vocabulary and transaction/confirmation types
//! - [`client`] - the `VenueClient` trait plus a mock for tests
//! - [`submit`] - submit-with-retry and idempotent confirmation
//! - [`paper`] - in-memory simulated venue for paper trading

pub mod client;
pub mod paper;
pub mod submit;
pub mod types;

// Re-export commonly used types
pub use client::VenueClient;
pub use paper::PaperVenue;
pub use submit::{backoff_delay, confirm_window, extract_signature_candidate, OrderSubmitter, SubmitPolicy};
pub use types::{
    AccountId, Commitment, ConfirmStatus, MarketRules, OrderKind, OrderParams, Side, TxSignature,
    TxStatus,
};
