//! The async owner of the grid: bootstrap, notification dispatch, status.
//!
//! `GridBot` wires the synchronous reconciler to the venue. It samples the
//! oracle for the center price, builds the ladder, places the bootstrap
//! batch, and from then on applies notifications one at a time, spawning
//! each follow-up submission as a detached task so a retrying submission
//! never stalls notification processing.

use chrono::Utc;
use log::{error, info};
use serde::Serialize;
use tokio::task::JoinHandle;

use super::config::{GridConfig, GridParams};
use super::ladder::Ladder;
use super::reconciler::{FollowUp, Reconciler};
use super::types::{GridLevel, LevelStatus};
use crate::context::BotContext;
use crate::errors::BotResult;
use crate::events::Notification;
use crate::venue::types::{OrderParams, Side};

/// Point-in-time view of the ladder and counters.
#[derive(Debug, Clone, Serialize)]
pub struct GridSnapshot {
    /// Capture time, unix milliseconds.
    pub captured_at_ms: u64,
    /// Every rung, ascending by price.
    pub levels: Vec<GridLevel>,
    /// Orders currently tracked in the Index.
    pub tracked_orders: usize,
    /// Fills observed since bootstrap.
    pub fills_seen: u64,
}

/// One grid bot instance: one market, one account, one ladder.
pub struct GridBot {
    context: BotContext,
    reconciler: Reconciler,
}

impl GridBot {
    /// Bootstrap a bot: sample the oracle, build the ladder, and place the
    /// initial batch.
    ///
    /// The batch goes out as one transaction: a taker entry covering every
    /// rung below the center, reduce-only take-profits above it, and
    /// resting buys below it. The armed levels are marked before the batch
    /// is sent; their order ids attach later, when the venue's order-opened
    /// notifications arrive. Fails without sending anything if the
    /// parameters are invalid, and with no partial-state repair if the
    /// batch submission itself fails.
    pub async fn initialize(context: BotContext, params: &GridParams) -> BotResult<Self> {
        let center = context.venue.oracle_price().await?;
        let config = params.resolve(center)?;
        let rules = context.venue.market_rules();
        let mut ladder = Ladder::build(&config, &rules)?;

        info!(
            "Grid centered at {}: {} rungs, spacing {}, size {} per rung",
            center,
            ladder.len(),
            ladder.grid_space(),
            ladder.position_size()
        );

        let batch = bootstrap_orders(&mut ladder, &config);
        let signature = context.submitter().submit_batch(&batch).await?;
        info!(
            "Bootstrap batch of {} orders confirmed ({})",
            batch.len(),
            signature
        );

        let bot = Self {
            context,
            reconciler: Reconciler::new(ladder),
        };
        bot.log_summary();
        Ok(bot)
    }

    /// Account identifier inbound notifications are filtered against.
    pub fn account_id(&self) -> &str {
        &self.context.account_id
    }

    /// Apply one notification and dispatch any follow-up submission.
    ///
    /// The follow-up is spawned onto the runtime and logs its own outcome;
    /// the returned handle exists so tests can await completion.
    pub fn on_notification(&mut self, notification: &Notification) -> Option<JoinHandle<()>> {
        let follow_up = self.reconciler.apply(notification)?;
        Some(self.dispatch(follow_up))
    }

    fn dispatch(&self, follow_up: FollowUp) -> JoinHandle<()> {
        let submitter = self.context.submitter();
        let label = follow_up.label();
        let grid_index = follow_up.grid_index;
        let price = follow_up.params.price.unwrap_or_default();
        info!("Placing {} at level {} ({})", label, grid_index, price);

        tokio::spawn(async move {
            match submitter.submit(&follow_up.params).await {
                Ok(signature) => {
                    info!(
                        "{} at level {} confirmed ({})",
                        label, grid_index, signature
                    );
                }
                Err(err) => {
                    error!("{} at level {} failed: {}", label, grid_index, err);
                }
            }
        })
    }

    /// Point-in-time snapshot of every rung plus counters.
    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            captured_at_ms: Utc::now().timestamp_millis() as u64,
            levels: self.reconciler.ladder().levels().to_vec(),
            tracked_orders: self.reconciler.tracked_orders(),
            fills_seen: self.reconciler.fills_seen(),
        }
    }

    /// Log a rung-per-line summary, highest price first.
    pub fn log_summary(&self) {
        let ladder = self.reconciler.ladder();
        info!(
            "Grid summary: {} rungs, {} tracked orders, {} fills",
            ladder.len(),
            self.reconciler.tracked_orders(),
            self.reconciler.fills_seen()
        );
        for level in ladder.levels().iter().rev() {
            let mut ids = String::new();
            if let Some(id) = level.long_order_id {
                ids.push_str(&format!(" long={}", id));
            }
            if let Some(id) = level.tp_order_id {
                ids.push_str(&format!(" tp={}", id));
            }
            info!(
                "  [{:>3}] {:>12} {}{}",
                level.index,
                level.price,
                level.status.as_str(),
                ids
            );
        }
    }
}

/// Compose the bootstrap batch and mark the levels it arms.
///
/// Group 1 is one taker entry sized to cover every rung below the center;
/// group 2 rests reduce-only take-profits above the center, capped at the
/// configured up-level count; group 3 rests a buy at every rung below the
/// center. The rung at the center itself, if any, stays idle.
fn bootstrap_orders(ladder: &mut Ladder, config: &GridConfig) -> Vec<OrderParams> {
    let size = ladder.position_size();
    let mut orders = Vec::new();

    let entry_size = config.down_levels() as f64 * size;
    if entry_size > 0.0 {
        orders.push(OrderParams::market(Side::Buy, entry_size));
    }

    let mut placed_up = 0;
    for i in 0..ladder.len() {
        let price = match ladder.get(i) {
            Some(level) => level.price,
            None => continue,
        };
        if price > config.center && placed_up < config.up_levels() {
            orders.push(
                OrderParams::limit(Side::Sell, size, price)
                    .reduce_only(true)
                    .post_only(true),
            );
            if let Some(level) = ladder.get_mut(i) {
                level.status = LevelStatus::TpOpen;
            }
            placed_up += 1;
        }
    }

    for i in 0..ladder.len() {
        let price = match ladder.get(i) {
            Some(level) => level.price,
            None => continue,
        };
        if price < config.center {
            orders.push(OrderParams::limit(Side::Buy, size, price).post_only(true));
            if let Some(level) = ladder.get_mut(i) {
                level.status = LevelStatus::LongOpen;
            }
        }
    }

    orders
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::errors::BotError;
    use crate::venue::client::mock::MockVenue;
    use crate::venue::types::OrderKind;
    use crate::venue::SubmitPolicy;

    const ACCOUNT: &str = "acct-1";

    fn fast_policy() -> SubmitPolicy {
        SubmitPolicy {
            max_retries: 3,
            base_timeout: Duration::from_millis(5),
            backoff_base: Duration::from_millis(1),
            ..SubmitPolicy::default()
        }
    }

    fn params() -> GridParams {
        GridParams {
            capital: 2_100.0,
            leverage: 10,
            price_down: Some(93_000.0),
            price_up: Some(114_000.0),
            num_grids: Some(21),
            ratio: None,
            num_levels: None,
        }
    }

    fn opened(order_id: u64, price: f64, side: Side) -> Notification {
        Notification::OrderOpened {
            account_id: ACCOUNT.into(),
            order_id,
            price,
            side,
            kind: OrderKind::Limit,
        }
    }

    fn filled(order_id: u64) -> Notification {
        Notification::OrderFilled {
            account_id: ACCOUNT.into(),
            order_id,
        }
    }

    async fn bot_with_mock() -> (GridBot, Arc<MockVenue>) {
        let venue = Arc::new(MockVenue::new(107_000.0));
        let context = BotContext::new(ACCOUNT, venue.clone(), fast_policy());
        let bot = GridBot::initialize(context, &params()).await.unwrap();
        (bot, venue)
    }

    #[tokio::test]
    async fn test_bootstrap_places_one_batch() {
        let (bot, venue) = bot_with_mock().await;

        assert_eq!(*venue.batch_sizes.lock().await, vec![21]);

        let orders = venue.orders.lock().await;
        assert_eq!(orders.len(), 21);

        // One taker entry covering the fourteen rungs below the center.
        assert_eq!(orders[0].kind, OrderKind::Market);
        assert_eq!(orders[0].side, Side::Buy);
        assert!((orders[0].size - 14_000.0).abs() < 1e-9);

        // Six reduce-only exits above the center, fourteen buys below it.
        let sells: Vec<_> = orders.iter().filter(|o| o.side == Side::Sell).collect();
        let buys = orders
            .iter()
            .filter(|o| o.side == Side::Buy && o.kind == OrderKind::Limit)
            .count();
        assert_eq!(sells.len(), 6);
        assert_eq!(buys, 14);
        assert!(sells.iter().all(|o| o.reduce_only && o.post_only));
        drop(orders);

        // Armed levels are marked before any notification arrives.
        let snapshot = bot.snapshot();
        assert!(snapshot.levels[..14]
            .iter()
            .all(|l| l.status == LevelStatus::LongOpen));
        assert_eq!(snapshot.levels[14].status, LevelStatus::Idle);
        assert!(snapshot.levels[15..]
            .iter()
            .all(|l| l.status == LevelStatus::TpOpen));
    }

    #[tokio::test]
    async fn test_center_outside_bounds_rejected_before_sending() {
        let venue = Arc::new(MockVenue::new(80_000.0));
        let context = BotContext::new(ACCOUNT, venue.clone(), fast_policy());

        let result = GridBot::initialize(context, &params()).await;
        assert!(matches!(result, Err(BotError::Configuration(_))));
        assert_eq!(venue.place_attempts(), 0);
    }

    #[tokio::test]
    async fn test_fill_dispatches_follow_up() {
        let (mut bot, venue) = bot_with_mock().await;
        let placed_before = venue.orders.lock().await.len();

        // The venue reports the buy at 106000 open, then filled.
        assert!(bot.on_notification(&opened(500, 106_000.0, Side::Buy)).is_none());
        let handle = bot.on_notification(&filled(500)).unwrap();
        handle.await.unwrap();

        let orders = venue.orders.lock().await;
        assert_eq!(orders.len(), placed_before + 1);
        let tp = orders.last().unwrap();
        assert_eq!(tp.side, Side::Sell);
        assert_eq!(tp.price, Some(107_000.0));
        assert!(tp.reduce_only);
    }

    #[tokio::test]
    async fn test_boundary_fill_dispatches_nothing() {
        let (mut bot, venue) = bot_with_mock().await;
        let placed_before = venue.orders.lock().await.len();

        bot.on_notification(&opened(600, 113_000.0, Side::Buy));
        assert!(bot.on_notification(&filled(600)).is_none());
        assert_eq!(venue.orders.lock().await.len(), placed_before);
    }

    #[tokio::test]
    async fn test_snapshot_serializes_to_json() {
        let (bot, _venue) = bot_with_mock().await;
        let json = serde_json::to_string(&bot.snapshot()).unwrap();
        assert!(json.contains("\"tp_open\""));
        assert!(json.contains("\"fills_seen\":0"));
    }
}
