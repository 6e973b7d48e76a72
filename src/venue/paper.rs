//! Paper venue
//!
//! Simulates order execution locally: resting orders fill when the driven
//! price crosses their limit, market orders fill at once, and every action is
//! reported through the same notification feed a live adapter would use. No
//! connectivity, no real money.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::errors::{BotError, BotResult};
use crate::events::{Notification, NotificationSender};

use super::client::VenueClient;
use super::types::{
    AccountId, Commitment, ConfirmStatus, MarketRules, OrderKind, OrderParams, Side, TxSignature,
    TxStatus,
};

/// One simulated resting order
#[derive(Debug, Clone)]
struct RestingOrder {
    id: u64,
    side: Side,
    price: f64,
    size: f64,
}

impl RestingOrder {
    /// Whether the driven price has crossed this order's limit
    fn should_fill(&self, price: f64) -> bool {
        match self.side {
            Side::Buy => price <= self.price,
            Side::Sell => price >= self.price,
        }
    }
}

#[derive(Debug, Default)]
struct Book {
    price: f64,
    resting: HashMap<u64, RestingOrder>,
    position: f64,
    transactions: HashSet<TxSignature>,
}

/// Simulated venue backing the paper trading mode
pub struct PaperVenue {
    account_id: AccountId,
    rules: MarketRules,
    events: NotificationSender,
    book: Mutex<Book>,
    next_order_id: AtomicU64,
}

impl PaperVenue {
    pub fn new(
        account_id: impl Into<AccountId>,
        rules: MarketRules,
        initial_price: f64,
        events: NotificationSender,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            rules,
            events,
            book: Mutex::new(Book {
                price: initial_price,
                ..Book::default()
            }),
            next_order_id: AtomicU64::new(1),
        }
    }

    /// Move the simulated price and fill whatever it crossed
    pub async fn advance_price(&self, price: f64) {
        let mut book = self.book.lock().await;
        book.price = price;

        let mut crossed: Vec<RestingOrder> = book
            .resting
            .values()
            .filter(|o| o.should_fill(price))
            .cloned()
            .collect();
        crossed.sort_by_key(|o| o.id);

        for order in crossed {
            book.resting.remove(&order.id);
            self.apply_fill(&mut book, &order, price);
        }
    }

    /// Current simulated price
    pub async fn current_price(&self) -> f64 {
        self.book.lock().await.price
    }

    /// Net simulated position in base units
    pub async fn position(&self) -> f64 {
        self.book.lock().await.position
    }

    /// Count of orders currently resting
    pub async fn resting_count(&self) -> usize {
        self.book.lock().await.resting.len()
    }

    fn signature() -> TxSignature {
        Uuid::new_v4().simple().to_string()
    }

    fn emit(&self, notification: Notification) {
        if self.events.send(notification).is_err() {
            debug!("Paper venue event dropped: feed receiver gone");
        }
    }

    fn apply_fill(&self, book: &mut Book, order: &RestingOrder, exec_price: f64) {
        match order.side {
            Side::Buy => book.position += order.size,
            Side::Sell => book.position -= order.size,
        }
        info!(
            "Paper fill: {} {} at {} (order {}, position {})",
            order.side.as_str(),
            order.size,
            exec_price,
            order.id,
            book.position
        );
        self.emit(Notification::OrderFilled {
            account_id: self.account_id.clone(),
            order_id: order.id,
        });
    }

    /// Accept a group of orders under one fabricated transaction
    async fn admit(&self, orders: &[OrderParams]) -> BotResult<TxSignature> {
        let mut book = self.book.lock().await;

        for params in orders {
            if params.size < self.rules.min_order_size {
                return Err(BotError::Venue(format!(
                    "order size {} below venue minimum {}",
                    params.size, self.rules.min_order_size
                )));
            }

            let id = self.next_order_id.fetch_add(1, Ordering::SeqCst);
            match params.kind {
                OrderKind::Market => {
                    let exec_price = book.price;
                    self.emit(Notification::OrderOpened {
                        account_id: self.account_id.clone(),
                        order_id: id,
                        price: exec_price,
                        side: params.side,
                        kind: OrderKind::Market,
                    });
                    let order = RestingOrder {
                        id,
                        side: params.side,
                        price: exec_price,
                        size: params.size,
                    };
                    self.apply_fill(&mut book, &order, exec_price);
                }
                OrderKind::Limit => {
                    let price = params.price.ok_or_else(|| {
                        BotError::Venue("limit order without a price".to_string())
                    })?;
                    let order = RestingOrder {
                        id,
                        side: params.side,
                        price,
                        size: params.size,
                    };
                    self.emit(Notification::OrderOpened {
                        account_id: self.account_id.clone(),
                        order_id: id,
                        price,
                        side: params.side,
                        kind: OrderKind::Limit,
                    });
                    // already marketable orders fill against the current price
                    if order.should_fill(book.price) {
                        let exec_price = book.price;
                        self.apply_fill(&mut book, &order, exec_price);
                    } else {
                        debug!(
                            "Paper order {} resting: {} {} @ {}",
                            id,
                            params.side.as_str(),
                            params.size,
                            price
                        );
                        book.resting.insert(id, order);
                    }
                }
            }
        }

        let sig = Self::signature();
        book.transactions.insert(sig.clone());
        Ok(sig)
    }
}

#[async_trait]
impl VenueClient for PaperVenue {
    async fn place_order(&self, order: &OrderParams) -> BotResult<TxSignature> {
        self.admit(std::slice::from_ref(order)).await
    }

    async fn place_orders(&self, orders: &[OrderParams]) -> BotResult<TxSignature> {
        self.admit(orders).await
    }

    async fn confirm_transaction(
        &self,
        signature: &str,
        _timeout: Duration,
        _commitment: Commitment,
    ) -> BotResult<ConfirmStatus> {
        if self.book.lock().await.transactions.contains(signature) {
            Ok(ConfirmStatus::Confirmed)
        } else {
            Ok(ConfirmStatus::Failed("unknown transaction".to_string()))
        }
    }

    async fn transaction_status(&self, signature: &str) -> BotResult<TxStatus> {
        if self.book.lock().await.transactions.contains(signature) {
            Ok(TxStatus::Confirmed)
        } else {
            Ok(TxStatus::NotFound)
        }
    }

    async fn oracle_price(&self) -> BotResult<f64> {
        Ok(self.book.lock().await.price)
    }

    fn market_rules(&self) -> MarketRules {
        self.rules
    }
}
