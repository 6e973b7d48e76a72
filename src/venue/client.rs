//! Venue abstraction - enables mocking for tests and paper trading

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::BotResult;

use super::types::{Commitment, ConfirmStatus, MarketRules, OrderParams, TxSignature, TxStatus};

/// Venue operations the bot calls into - can be mocked for testing
///
/// The bot never learns order identifiers from these calls; a submission
/// yields a transaction signature only, and order ids arrive later through
/// the notification feed.
#[async_trait]
pub trait VenueClient: Send + Sync {
    /// Submit one order, returning the transaction signature
    async fn place_order(&self, order: &OrderParams) -> BotResult<TxSignature>;

    /// Submit several orders in one transaction where the venue supports it
    async fn place_orders(&self, orders: &[OrderParams]) -> BotResult<TxSignature>;

    /// Wait for a transaction to reach the commitment level, up to `timeout`
    async fn confirm_transaction(
        &self,
        signature: &str,
        timeout: Duration,
        commitment: Commitment,
    ) -> BotResult<ConfirmStatus>;

    /// Direct status lookup for a previously submitted transaction
    async fn transaction_status(&self, signature: &str) -> BotResult<TxStatus>;

    /// Current oracle price for the bot's market
    async fn oracle_price(&self) -> BotResult<f64>;

    /// Venue rounding rules for the bot's market
    fn market_rules(&self) -> MarketRules;
}

// ============================================================================
// Mock Implementation for Testing
// ============================================================================

/// Mock venue for testing the bot without any connectivity.
pub mod mock {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
    use std::sync::Arc;

    use tokio::sync::Mutex;

    use crate::errors::BotError;

    /// Mock venue with recorded calls and scripted outcomes
    pub struct MockVenue {
        /// Every order accepted, batches flattened in submission order
        pub orders: Arc<Mutex<Vec<OrderParams>>>,
        /// Size of each accepted batch call
        pub batch_sizes: Arc<Mutex<Vec<usize>>>,
        /// Confirmation calls as (signature, timeout_ms, commitment)
        pub confirm_calls: Arc<Mutex<Vec<(TxSignature, u64, Commitment)>>>,
        /// Signatures queried through `transaction_status`
        pub status_queries: Arc<Mutex<Vec<TxSignature>>>,
        place_attempts: AtomicU32,
        fail_places: AtomicU32,
        place_error: Mutex<String>,
        confirm_timeouts: AtomicU32,
        status_script: Mutex<VecDeque<TxStatus>>,
        oracle: Mutex<f64>,
        rules: MarketRules,
        next_sig: AtomicU64,
    }

    impl MockVenue {
        pub fn new(oracle_price: f64) -> Self {
            Self {
                orders: Arc::new(Mutex::new(Vec::new())),
                batch_sizes: Arc::new(Mutex::new(Vec::new())),
                confirm_calls: Arc::new(Mutex::new(Vec::new())),
                status_queries: Arc::new(Mutex::new(Vec::new())),
                place_attempts: AtomicU32::new(0),
                fail_places: AtomicU32::new(0),
                place_error: Mutex::new(String::new()),
                confirm_timeouts: AtomicU32::new(0),
                status_script: Mutex::new(VecDeque::new()),
                oracle: Mutex::new(oracle_price),
                rules: MarketRules::new(1.0, 0.001),
                next_sig: AtomicU64::new(1),
            }
        }

        pub fn with_rules(oracle_price: f64, rules: MarketRules) -> Self {
            Self {
                rules,
                ..Self::new(oracle_price)
            }
        }

        /// Fail the next `n` placement calls with the given error text
        pub async fn script_place_failures(&self, n: u32, error_text: &str) {
            self.fail_places.store(n, Ordering::SeqCst);
            *self.place_error.lock().await = error_text.to_string();
        }

        /// Time out the next `n` confirmation calls
        pub fn script_confirm_timeouts(&self, n: u32) {
            self.confirm_timeouts.store(n, Ordering::SeqCst);
        }

        /// Queue statuses returned by successive `transaction_status` calls
        pub async fn script_statuses(&self, statuses: Vec<TxStatus>) {
            self.status_script.lock().await.extend(statuses);
        }

        pub async fn set_oracle_price(&self, price: f64) {
            *self.oracle.lock().await = price;
        }

        /// Total placement calls, single and batch
        pub fn place_attempts(&self) -> u32 {
            self.place_attempts.load(Ordering::SeqCst)
        }

        async fn accept(&self, orders: &[OrderParams]) -> BotResult<TxSignature> {
            self.place_attempts.fetch_add(1, Ordering::SeqCst);

            if self.fail_places.load(Ordering::SeqCst) > 0 {
                self.fail_places.fetch_sub(1, Ordering::SeqCst);
                return Err(BotError::Venue(self.place_error.lock().await.clone()));
            }

            self.orders.lock().await.extend_from_slice(orders);
            let n = self.next_sig.fetch_add(1, Ordering::SeqCst);
            Ok(format!("mock-sig-{n}"))
        }
    }

    #[async_trait]
    impl VenueClient for MockVenue {
        async fn place_order(&self, order: &OrderParams) -> BotResult<TxSignature> {
            self.accept(std::slice::from_ref(order)).await
        }

        async fn place_orders(&self, orders: &[OrderParams]) -> BotResult<TxSignature> {
            let sig = self.accept(orders).await?;
            self.batch_sizes.lock().await.push(orders.len());
            Ok(sig)
        }

        async fn confirm_transaction(
            &self,
            signature: &str,
            timeout: Duration,
            commitment: Commitment,
        ) -> BotResult<ConfirmStatus> {
            self.confirm_calls.lock().await.push((
                signature.to_string(),
                timeout.as_millis() as u64,
                commitment,
            ));

            if self.confirm_timeouts.load(Ordering::SeqCst) > 0 {
                self.confirm_timeouts.fetch_sub(1, Ordering::SeqCst);
                return Ok(ConfirmStatus::TimedOut);
            }
            Ok(ConfirmStatus::Confirmed)
        }

        async fn transaction_status(&self, signature: &str) -> BotResult<TxStatus> {
            self.status_queries.lock().await.push(signature.to_string());
            let scripted = self.status_script.lock().await.pop_front();
            Ok(scripted.unwrap_or(TxStatus::Confirmed))
        }

        async fn oracle_price(&self) -> BotResult<f64> {
            Ok(*self.oracle.lock().await)
        }

        fn market_rules(&self) -> MarketRules {
            self.rules
        }
    }
}
