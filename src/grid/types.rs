//! Core data types for the grid ladder and order tracking.

use serde::{Deserialize, Serialize};

/// Status of an individual grid level.
///
/// Levels cycle `Idle -> LongOpen -> Paired -> TpOpen -> Idle`; a
/// bootstrap-placed take-profit can return straight from `TpOpen` to `Idle`
/// since it never had a paired long below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelStatus {
    /// No order resting and no position attributed to this level.
    Idle,
    /// A grid buy order is resting at this level.
    LongOpen,
    /// A take-profit sell order is resting at this level.
    TpOpen,
    /// The level's buy has filled and its exit rests one rung above, or the
    /// level holds both a long and a take-profit during bootstrap.
    Paired,
}

impl LevelStatus {
    /// Human-readable form used in log lines and summaries.
    pub fn as_str(&self) -> &'static str {
        match self {
            LevelStatus::Idle => "idle",
            LevelStatus::LongOpen => "long_open",
            LevelStatus::TpOpen => "tp_open",
            LevelStatus::Paired => "paired",
        }
    }
}

/// One rung of the ladder.
///
/// At most one resting order of each kind is attributed to a level at a
/// time. `Idle` always implies both order ids are absent; `Paired` is the
/// one non-idle status that may hold zero ids (its long has filled and the
/// exit rests on the rung above).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridLevel {
    /// Index of this level (0 = lowest price).
    pub index: usize,
    /// Price at this level, rounded to the venue tick.
    pub price: f64,
    /// Current status of this level.
    pub status: LevelStatus,
    /// Exchange order id of the resting buy, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_order_id: Option<u64>,
    /// Exchange order id of the resting take-profit, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tp_order_id: Option<u64>,
}

impl GridLevel {
    /// Create an idle level.
    pub fn new(index: usize, price: f64) -> Self {
        Self {
            index,
            price,
            status: LevelStatus::Idle,
            long_order_id: None,
            tp_order_id: None,
        }
    }

    /// True when nothing rests here and no position is attributed.
    pub fn is_idle(&self) -> bool {
        self.status == LevelStatus::Idle
    }

    /// A grid buy was observed open at this level.
    pub fn open_long(&mut self, order_id: u64) {
        self.long_order_id = Some(order_id);
        self.status = if self.tp_order_id.is_some() {
            LevelStatus::Paired
        } else {
            LevelStatus::LongOpen
        };
    }

    /// A take-profit sell was observed open at this level.
    pub fn open_tp(&mut self, order_id: u64) {
        self.tp_order_id = Some(order_id);
        self.status = if self.long_order_id.is_some() {
            LevelStatus::Paired
        } else {
            LevelStatus::TpOpen
        };
    }

    /// The resting buy was cancelled.
    pub fn cancel_long(&mut self) {
        self.long_order_id = None;
        self.status = if self.tp_order_id.is_some() {
            LevelStatus::TpOpen
        } else {
            LevelStatus::Idle
        };
    }

    /// The resting take-profit was cancelled.
    pub fn cancel_tp(&mut self) {
        self.tp_order_id = None;
        self.status = if self.long_order_id.is_some() {
            LevelStatus::LongOpen
        } else {
            LevelStatus::Idle
        };
    }

    /// The resting buy filled; the level now holds a position whose exit
    /// will rest one rung above.
    pub fn fill_long(&mut self) {
        self.long_order_id = None;
        self.status = LevelStatus::Paired;
    }

    /// The resting take-profit filled; the level's cycle is complete.
    pub fn fill_tp(&mut self) {
        self.tp_order_id = None;
        self.status = if self.long_order_id.is_some() {
            LevelStatus::LongOpen
        } else {
            LevelStatus::Idle
        };
    }
}

/// Role an exchange order plays in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderRole {
    /// The bootstrap taker entry; not tied to any level.
    InitialEntry,
    /// A resting buy arming a level.
    GridLong,
    /// A resting reduce-only sell exiting the level below it.
    TakeProfit,
}

impl OrderRole {
    /// Human-readable form used in log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderRole::InitialEntry => "initial-entry",
            OrderRole::GridLong => "grid-long",
            OrderRole::TakeProfit => "take-profit",
        }
    }
}

/// Order Index entry: what a tracked exchange order is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderRecord {
    /// Role the order plays.
    pub role: OrderRole,
    /// Ladder index the order belongs to; absent for the initial entry.
    pub grid_index: Option<usize>,
}

impl OrderRecord {
    /// Record for the bootstrap taker entry.
    pub fn entry() -> Self {
        Self {
            role: OrderRole::InitialEntry,
            grid_index: None,
        }
    }

    /// Record for a grid buy at `grid_index`.
    pub fn grid_long(grid_index: usize) -> Self {
        Self {
            role: OrderRole::GridLong,
            grid_index: Some(grid_index),
        }
    }

    /// Record for a take-profit at `grid_index`.
    pub fn take_profit(grid_index: usize) -> Self {
        Self {
            role: OrderRole::TakeProfit,
            grid_index: Some(grid_index),
        }
    }
}
