//! Order and transaction vocabulary shared with the venue client

use serde::{Deserialize, Serialize};

/// Transaction signature returned by the venue for a submission
pub type TxSignature = String;

/// Venue account identifier notifications are addressed to
pub type AccountId = String;

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Returns the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Human-readable side label for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

/// Execution style of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    /// Taker order, executes immediately at the prevailing price
    Market,
    /// Resting order at a fixed limit price
    Limit,
}

/// Parameters for one order submission
#[derive(Debug, Clone, PartialEq)]
pub struct OrderParams {
    /// Order side
    pub side: Side,
    /// Market or limit execution
    pub kind: OrderKind,
    /// Base asset quantity
    pub size: f64,
    /// Limit price, absent for market orders
    pub price: Option<f64>,
    /// Whether the order may only reduce an existing position
    pub reduce_only: bool,
    /// Whether the order must rest on the book rather than match immediately
    pub post_only: bool,
}

impl OrderParams {
    /// Create a market (taker) order
    pub fn market(side: Side, size: f64) -> Self {
        Self {
            side,
            kind: OrderKind::Market,
            size,
            price: None,
            reduce_only: false,
            post_only: false,
        }
    }

    /// Create a limit order at the given price
    pub fn limit(side: Side, size: f64, price: f64) -> Self {
        Self {
            side,
            kind: OrderKind::Limit,
            size,
            price: Some(price),
            reduce_only: false,
            post_only: false,
        }
    }

    /// Set reduce_only flag
    pub fn reduce_only(mut self, reduce_only: bool) -> Self {
        self.reduce_only = reduce_only;
        self
    }

    /// Set post_only flag
    pub fn post_only(mut self, post_only: bool) -> Self {
        self.post_only = post_only;
        self
    }
}

/// Durability tier a confirmation waits for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    Confirmed,
    Finalized,
}

impl Commitment {
    /// Venue wire label
    pub fn as_str(&self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }
}

impl Default for Commitment {
    fn default() -> Self {
        Commitment::Confirmed
    }
}

/// Outcome of waiting on a transaction confirmation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmStatus {
    /// Transaction reached the requested commitment level
    Confirmed,
    /// The wait elapsed without the transaction being observed
    TimedOut,
    /// The venue reported the transaction as failed
    Failed(String),
}

/// Result of a direct transaction status lookup
#[derive(Debug, Clone, PartialEq)]
pub enum TxStatus {
    /// Transaction landed successfully
    Confirmed,
    /// Transaction landed but execution failed
    Failed(String),
    /// The venue has no record of this signature
    NotFound,
}

/// Venue-defined rounding rules for a market
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketRules {
    /// Smallest price increment
    pub tick_size: f64,
    /// Smallest tradable base quantity
    pub min_order_size: f64,
}

impl MarketRules {
    pub fn new(tick_size: f64, min_order_size: f64) -> Self {
        Self {
            tick_size,
            min_order_size,
        }
    }

    /// Round a price to the nearest tick
    pub fn round_price(&self, price: f64) -> f64 {
        if self.tick_size > 0.0 {
            (price / self.tick_size).round() * self.tick_size
        } else {
            price
        }
    }

    /// Raise a size to the venue minimum if it falls below it
    pub fn clamp_size(&self, size: f64) -> f64 {
        size.max(self.min_order_size)
    }
}
