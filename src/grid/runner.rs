//! Main execution loop.
//!
//! One `tokio::select!` turn at a time: apply the next notification, print
//! the periodic summary, or shut down on Ctrl-C. Follow-up submissions run
//! detached, so a slow confirmation never blocks the next notification.

use std::time::Duration;

use log::{debug, info};
use tokio::time::interval;

use super::bot::GridBot;
use crate::errors::{BotError, BotResult};
use crate::events::{self, NotificationReceiver};

/// Runner pacing.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Seconds between grid summary log blocks.
    pub summary_interval_secs: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            summary_interval_secs: 60,
        }
    }
}

/// Drive the bot until the feed closes or Ctrl-C arrives.
///
/// Notifications for other accounts are skipped. A closed feed surfaces as
/// [`BotError::FeedClosed`] so the caller can tell a dead feed from a
/// requested stop.
pub async fn run(
    mut bot: GridBot,
    mut notifications: NotificationReceiver,
    runner_config: RunnerConfig,
) -> BotResult<()> {
    info!(
        "Grid bot running for account {} (summary every {}s)",
        bot.account_id(),
        runner_config.summary_interval_secs
    );

    let mut summary_timer = interval(Duration::from_secs(runner_config.summary_interval_secs));
    // the first tick completes immediately; bootstrap already logged a summary
    summary_timer.tick().await;

    loop {
        tokio::select! {
            maybe = notifications.recv() => {
                match maybe {
                    Some(notification) => {
                        if events::is_for_account(&notification, bot.account_id()) {
                            bot.on_notification(&notification);
                        } else {
                            debug!(
                                "Skipping {} for account {}",
                                notification.kind_str(),
                                notification.account_id()
                            );
                        }
                    }
                    None => {
                        info!("Notification feed closed");
                        bot.log_summary();
                        return Err(BotError::FeedClosed);
                    }
                }
            }
            _ = summary_timer.tick() => {
                bot.log_summary();
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received, shutting down");
                bot.log_summary();
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::context::BotContext;
    use crate::events::{self, Notification};
    use crate::grid::config::GridParams;
    use crate::venue::client::mock::MockVenue;
    use crate::venue::types::{OrderKind, Side};
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

    fn opened(account: &str, order_id: u64, price: f64, side: Side) -> Notification {
        Notification::OrderOpened {
            account_id: account.into(),
            order_id,
            price,
            side,
            kind: OrderKind::Limit,
        }
    }

    fn filled(account: &str, order_id: u64) -> Notification {
        Notification::OrderFilled {
            account_id: account.into(),
            order_id,
        }
    }

    #[tokio::test]
    async fn test_runner_processes_feed_until_close() {
        let venue = Arc::new(MockVenue::new(107_000.0));
        let context = BotContext::new(ACCOUNT, venue.clone(), fast_policy());
        let bot = GridBot::initialize(context, &params()).await.unwrap();

        let (tx, rx) = events::channel();
        let task = tokio::spawn(run(bot, rx, RunnerConfig::default()));

        tx.send(opened(ACCOUNT, 500, 106_000.0, Side::Buy)).unwrap();
        tx.send(filled(ACCOUNT, 500)).unwrap();
        // another account's fill one rung lower must not produce an order
        tx.send(opened("other", 700, 105_000.0, Side::Buy)).unwrap();
        tx.send(filled("other", 700)).unwrap();
        drop(tx);

        let outcome = task.await.unwrap();
        assert!(matches!(outcome, Err(BotError::FeedClosed)));

        // the dispatched follow-up may still be in flight after the loop exits
        for _ in 0..100 {
            if venue.orders.lock().await.len() == 22 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        let orders = venue.orders.lock().await;
        assert_eq!(orders.len(), 22);
        let tp = orders.last().unwrap();
        assert_eq!(tp.side, Side::Sell);
        assert_eq!(tp.price, Some(107_000.0));
    }
}
