//! Event reconciler: the per-level state machine and follow-up decisions.
//!
//! The reconciler consumes the three notification kinds, keeps the ladder
//! and the Order Index consistent with what the venue reports, and decides
//! which order (if any) must be placed next. It is deliberately synchronous:
//! every transition runs on the caller's task and the returned [`FollowUp`]
//! tells the async owner what to submit. The event feed is ground truth for
//! order lifecycles; submission return values never mutate level state.

use log::{debug, info, warn};

use super::index::OrderIndex;
use super::ladder::Ladder;
use super::types::{OrderRecord, OrderRole};
use crate::errors::BotError;
use crate::events::Notification;
use crate::venue::types::{OrderKind, OrderParams, Side};

/// Follow-up order decided by a fill, dispatched by the async owner.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowUp {
    /// Ladder index the order targets.
    pub grid_index: usize,
    /// Parameters ready to hand to the submitter.
    pub params: OrderParams,
}

impl FollowUp {
    /// Label for log lines, derived from the order side.
    pub fn label(&self) -> &'static str {
        match self.params.side {
            Side::Buy => "grid buy",
            Side::Sell => "take-profit",
        }
    }
}

/// Owns the ladder and the Order Index, applying notifications one at a
/// time in arrival order.
#[derive(Debug)]
pub struct Reconciler {
    ladder: Ladder,
    index: OrderIndex,
    fills_seen: u64,
}

impl Reconciler {
    /// Take ownership of a freshly built (and possibly bootstrap-marked)
    /// ladder.
    pub fn new(ladder: Ladder) -> Self {
        Self {
            ladder,
            index: OrderIndex::new(),
            fills_seen: 0,
        }
    }

    /// The ladder, for snapshots and summaries.
    pub fn ladder(&self) -> &Ladder {
        &self.ladder
    }

    /// Number of orders currently tracked in the Index.
    pub fn tracked_orders(&self) -> usize {
        self.index.len()
    }

    /// Number of fills observed for tracked orders.
    pub fn fills_seen(&self) -> u64 {
        self.fills_seen
    }

    /// Apply one notification addressed to this bot's account.
    ///
    /// Returns the follow-up order to place, if the notification calls for
    /// one. Notifications for unknown orders are ignored.
    pub fn apply(&mut self, notification: &Notification) -> Option<FollowUp> {
        match notification {
            Notification::OrderOpened {
                order_id,
                price,
                side,
                kind,
                ..
            } => {
                self.handle_opened(*order_id, *price, *side, *kind);
                None
            }
            Notification::OrderFilled { order_id, .. } => self.handle_filled(*order_id),
            Notification::OrderCancelled { order_id, .. } => {
                self.handle_cancelled(*order_id);
                None
            }
        }
    }

    /// Classify a newly opened order and attach it to its level.
    ///
    /// Market orders are the bootstrap entry and carry no level. Limit
    /// orders are matched to the nearest rung by price; a buy arms the
    /// level as a grid long, a sell as a take-profit. An order whose price
    /// matches no rung is left untracked.
    fn handle_opened(&mut self, order_id: u64, price: f64, side: Side, kind: OrderKind) {
        if kind == OrderKind::Market {
            self.index.record_open(order_id, OrderRecord::entry());
            info!("Initial entry order {} opened at {}", order_id, price);
            return;
        }

        let grid_index = match self.ladder.level_for_price(price) {
            Some(grid_index) => grid_index,
            None => {
                warn!("{}", BotError::Mapping { order_id, price });
                return;
            }
        };

        // level_for_price only returns in-bounds indices
        if let Some(level) = self.ladder.get_mut(grid_index) {
            match side {
                Side::Buy => {
                    level.open_long(order_id);
                    self.index
                        .record_open(order_id, OrderRecord::grid_long(grid_index));
                    info!(
                        "Grid long {} resting at level {} ({}), level {}",
                        order_id,
                        grid_index,
                        level.price,
                        level.status.as_str()
                    );
                }
                Side::Sell => {
                    level.open_tp(order_id);
                    self.index
                        .record_open(order_id, OrderRecord::take_profit(grid_index));
                    info!(
                        "Take-profit {} resting at level {} ({}), level {}",
                        order_id,
                        grid_index,
                        level.price,
                        level.status.as_str()
                    );
                }
            }
        }
    }

    /// A tracked order filled: advance its level and decide the follow-up.
    ///
    /// A grid long filling at level `i` pairs the level and asks for a
    /// take-profit one rung above; a take-profit filling at `i` completes
    /// the cycle and asks for a buy one rung below. Fills at the ladder
    /// boundary are absorbed with a warning, no wraparound.
    fn handle_filled(&mut self, order_id: u64) -> Option<FollowUp> {
        let record = match self.index.remove(order_id) {
            Some(record) => record,
            None => {
                debug!("Ignoring fill for unknown order {}", order_id);
                return None;
            }
        };
        self.fills_seen += 1;

        match record.role {
            OrderRole::InitialEntry => {
                info!("Initial entry {} filled", order_id);
                None
            }
            OrderRole::GridLong => {
                let grid_index = record.grid_index?;
                let level = self.ladder.get_mut(grid_index)?;
                level.fill_long();
                info!(
                    "Long {} filled at level {} ({}); level paired",
                    order_id, grid_index, level.price
                );

                let size = self.ladder.position_size();
                match self.ladder.get(grid_index + 1) {
                    Some(above) => Some(FollowUp {
                        grid_index: grid_index + 1,
                        params: OrderParams::limit(Side::Sell, size, above.price)
                            .reduce_only(true)
                            .post_only(true),
                    }),
                    None => {
                        warn!(
                            "Top of ladder reached at level {}; no take-profit placed",
                            grid_index
                        );
                        None
                    }
                }
            }
            OrderRole::TakeProfit => {
                let grid_index = record.grid_index?;
                let level = self.ladder.get_mut(grid_index)?;
                level.fill_tp();
                info!(
                    "Take-profit {} filled at level {} ({}); level {}",
                    order_id,
                    grid_index,
                    level.price,
                    level.status.as_str()
                );

                let size = self.ladder.position_size();
                if grid_index == 0 {
                    warn!("Bottom of ladder reached at level 0; no buy placed");
                    return None;
                }
                self.ladder.get(grid_index - 1).map(|below| FollowUp {
                    grid_index: grid_index - 1,
                    params: OrderParams::limit(Side::Buy, size, below.price).post_only(true),
                })
            }
        }
    }

    /// A tracked order was cancelled: release its level. Cancels for orders
    /// this process never tracked are a no-op.
    fn handle_cancelled(&mut self, order_id: u64) {
        let record = match self.index.remove(order_id) {
            Some(record) => record,
            None => {
                debug!("Ignoring cancel for unknown order {}", order_id);
                return;
            }
        };

        match record.role {
            OrderRole::InitialEntry => {
                info!("Initial entry {} cancelled before filling", order_id);
            }
            OrderRole::GridLong => {
                if let Some(level) = record.grid_index.and_then(|i| self.ladder.get_mut(i)) {
                    level.cancel_long();
                    info!(
                        "Grid long {} cancelled at level {}; level {}",
                        order_id,
                        level.index,
                        level.status.as_str()
                    );
                }
            }
            OrderRole::TakeProfit => {
                if let Some(level) = record.grid_index.and_then(|i| self.ladder.get_mut(i)) {
                    level.cancel_tp();
                    info!(
                        "Take-profit {} cancelled at level {}; level {}",
                        order_id,
                        level.index,
                        level.status.as_str()
                    );
                }
            }
        }
    }
}
