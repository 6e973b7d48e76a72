//! Order submission with bounded retry and idempotent confirmation
//!
//! A submission that times out may still have landed. Before burning a retry
//! on a fresh transaction, the submitter asks the venue for the status of the
//! signature it already knows (returned directly, or fished out of the error
//! text), so a slow confirmation never turns into a duplicate order.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::errors::{BotError, BotResult};

use super::client::VenueClient;
use super::types::{Commitment, ConfirmStatus, OrderParams, TxSignature, TxStatus};

/// Retry and confirmation policy for order submission
#[derive(Debug, Clone, Copy)]
pub struct SubmitPolicy {
    /// Total placement attempts before giving up
    pub max_retries: u32,
    /// Confirmation wait for the first attempt; later attempts wait longer
    pub base_timeout: Duration,
    /// Backoff before the second attempt; doubles each retry
    pub backoff_base: Duration,
    /// Commitment level confirmations wait for
    pub commitment: Commitment,
}

impl Default for SubmitPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_timeout: Duration::from_millis(30_000),
            backoff_base: Duration::from_millis(2_000),
            commitment: Commitment::Confirmed,
        }
    }
}

/// Confirmation window for a 1-based attempt number, growing linearly
pub fn confirm_window(attempt: u32, base: Duration) -> Duration {
    base * attempt
}

/// Backoff slept after a failed 1-based attempt, doubling each time
pub fn backoff_delay(attempt: u32, base: Duration) -> Duration {
    base * 2u32.pow(attempt - 1)
}

fn is_base58_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() && !matches!(b, b'0' | b'O' | b'I' | b'l')
}

/// Extract a plausible transaction signature from venue error text.
///
/// Returns the first run of at least 32 base58 characters, capped at the 88
/// characters a signature can be. Venue clients embed the signature in their
/// "was not confirmed" messages; this is the only handle we have on a
/// transaction whose submission call failed after broadcasting.
pub fn extract_signature_candidate(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if is_base58_byte(bytes[i]) {
            let start = i;
            while i < bytes.len() && is_base58_byte(bytes[i]) {
                i += 1;
            }
            let len = i - start;
            if len >= 32 {
                return Some(&text[start..start + len.min(88)]);
            }
        } else {
            i += 1;
        }
    }
    None
}

/// Submits orders through the venue client under a [`SubmitPolicy`]
pub struct OrderSubmitter {
    venue: Arc<dyn VenueClient>,
    policy: SubmitPolicy,
}

impl OrderSubmitter {
    pub fn new(venue: Arc<dyn VenueClient>, policy: SubmitPolicy) -> Self {
        Self { venue, policy }
    }

    pub fn policy(&self) -> &SubmitPolicy {
        &self.policy
    }

    /// Submit one order with retry, returning the confirmed signature
    pub async fn submit(&self, order: &OrderParams) -> BotResult<TxSignature> {
        let venue = Arc::clone(&self.venue);
        let order = order.clone();
        self.run("order", move || {
            let venue = Arc::clone(&venue);
            let order = order.clone();
            async move { venue.place_order(&order).await }
        })
        .await
    }

    /// Submit a batch as one transaction with retry
    pub async fn submit_batch(&self, orders: &[OrderParams]) -> BotResult<TxSignature> {
        let venue = Arc::clone(&self.venue);
        let orders = orders.to_vec();
        self.run("batch", move || {
            let venue = Arc::clone(&venue);
            let orders = orders.clone();
            async move { venue.place_orders(&orders).await }
        })
        .await
    }

    /// Place, confirm, recover, back off, repeat
    async fn run<F, Fut>(&self, label: &str, place: F) -> BotResult<TxSignature>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = BotResult<TxSignature>>,
    {
        let mut last_error = BotError::Venue("no attempt made".into());

        for attempt in 1..=self.policy.max_retries {
            match place().await {
                Ok(signature) => {
                    let window = confirm_window(attempt, self.policy.base_timeout);
                    match self
                        .venue
                        .confirm_transaction(&signature, window, self.policy.commitment)
                        .await
                    {
                        Ok(ConfirmStatus::Confirmed) => {
                            info!(
                                "Confirmed {} submission on attempt {}: {}",
                                label, attempt, signature
                            );
                            return Ok(signature);
                        }
                        Ok(ConfirmStatus::TimedOut) => {
                            let ambiguous = BotError::AmbiguousConfirmation {
                                signature: signature.clone(),
                                timeout_ms: window.as_millis() as u64,
                            };
                            warn!(
                                "{} submission attempt {}/{}: {}",
                                label, attempt, self.policy.max_retries, ambiguous
                            );
                            if self.landed(&signature).await {
                                info!(
                                    "Transaction {} landed despite confirmation timeout",
                                    signature
                                );
                                return Ok(signature);
                            }
                            last_error = ambiguous;
                        }
                        Ok(ConfirmStatus::Failed(reason)) => {
                            warn!(
                                "{} submission attempt {}/{} failed on-venue: {}",
                                label, attempt, self.policy.max_retries, reason
                            );
                            last_error = BotError::Venue(reason);
                        }
                        Err(e) => {
                            warn!(
                                "{} confirmation attempt {}/{} errored: {}",
                                label, attempt, self.policy.max_retries, e
                            );
                            last_error = e;
                        }
                    }
                }
                Err(e) => {
                    let text = e.to_string();
                    if text.contains("not confirmed") {
                        if let Some(candidate) = extract_signature_candidate(&text) {
                            debug!(
                                "Checking status of candidate signature {} from error text",
                                candidate
                            );
                            if self.landed(candidate).await {
                                info!(
                                    "Transaction {} landed despite ambiguous submission error",
                                    candidate
                                );
                                return Ok(candidate.to_string());
                            }
                        }
                    }
                    warn!(
                        "{} submission attempt {}/{} failed: {}",
                        label, attempt, self.policy.max_retries, e
                    );
                    last_error = e;
                }
            }

            if attempt < self.policy.max_retries {
                let delay = backoff_delay(attempt, self.policy.backoff_base);
                warn!("Retrying {} submission in {}ms", label, delay.as_millis());
                tokio::time::sleep(delay).await;
            }
        }

        Err(BotError::Submission {
            attempts: self.policy.max_retries,
            reason: last_error.to_string(),
        })
    }

    /// Direct status lookup, true only on a definitively landed transaction
    async fn landed(&self, signature: &str) -> bool {
        match self.venue.transaction_status(signature).await {
            Ok(TxStatus::Confirmed) => true,
            Ok(TxStatus::Failed(reason)) => {
                debug!("Transaction {} failed on lookup: {}", signature, reason);
                false
            }
            Ok(TxStatus::NotFound) => false,
            Err(e) => {
                debug!("Status lookup for {} errored: {}", signature, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::venue::client::mock::MockVenue;
    use crate::venue::types::Side;

    const SIG: &str = "3nGq2yczqCpm8bF2dyvdPtLpHTxXtNsFGeJK4zUqiSc9wsqk";

    fn fast_policy() -> SubmitPolicy {
        SubmitPolicy {
            max_retries: 3,
            base_timeout: Duration::from_millis(5),
            backoff_base: Duration::from_millis(1),
            commitment: Commitment::Confirmed,
        }
    }

    #[test]
    fn test_confirm_window_grows_linearly() {
        let base = Duration::from_millis(30_000);
        assert_eq!(confirm_window(1, base), Duration::from_millis(30_000));
        assert_eq!(confirm_window(2, base), Duration::from_millis(60_000));
        assert_eq!(confirm_window(3, base), Duration::from_millis(90_000));
        assert_eq!(confirm_window(2, base), confirm_window(1, base) * 2);
    }

    #[test]
    fn test_backoff_delay_doubles() {
        let base = Duration::from_millis(2_000);
        assert_eq!(backoff_delay(1, base), Duration::from_millis(2_000));
        assert_eq!(backoff_delay(2, base), Duration::from_millis(4_000));
        assert_eq!(backoff_delay(3, base), Duration::from_millis(8_000));
        assert_eq!(backoff_delay(2, base), backoff_delay(1, base) * 2);
    }

    #[test]
    fn test_extract_signature_candidate() {
        let msg = format!(
            "Transaction was not confirmed in 30.00 seconds. \
             It is unknown if it succeeded or failed. Check signature {} using the explorer.",
            SIG
        );
        assert_eq!(extract_signature_candidate(&msg), Some(SIG));
    }

    #[test]
    fn test_extract_ignores_short_runs() {
        assert_eq!(
            extract_signature_candidate("connection refused by node abc123"),
            None
        );
        assert_eq!(extract_signature_candidate(""), None);
    }

    #[test]
    fn test_extract_breaks_on_non_base58() {
        // 'l' and '0' are not base58; the run around them is too short to match
        let msg = "request l00000000000000000000000000000000000000000ked odd";
        assert_eq!(extract_signature_candidate(msg), None);
    }

    #[test]
    fn test_extract_caps_at_signature_length() {
        let long: String = "a".repeat(100);
        let found = extract_signature_candidate(&long).unwrap();
        assert_eq!(found.len(), 88);
    }

    #[tokio::test]
    async fn test_submit_succeeds_first_attempt() {
        let venue = Arc::new(MockVenue::new(107_000.0));
        let submitter = OrderSubmitter::new(venue.clone(), fast_policy());

        let sig = submitter
            .submit(&OrderParams::limit(Side::Buy, 0.5, 106_000.0))
            .await
            .unwrap();

        assert_eq!(sig, "mock-sig-1");
        assert_eq!(venue.place_attempts(), 1);
        assert!(venue.status_queries.lock().await.is_empty());

        let confirms = venue.confirm_calls.lock().await;
        assert_eq!(confirms.len(), 1);
        assert_eq!(confirms[0].1, 5);
        assert_eq!(confirms[0].2, Commitment::Confirmed);
    }

    #[tokio::test]
    async fn test_recovery_avoids_duplicate_submission() {
        let venue = Arc::new(MockVenue::new(107_000.0));
        venue.script_confirm_timeouts(2);
        venue
            .script_statuses(vec![TxStatus::NotFound, TxStatus::Confirmed])
            .await;
        let submitter = OrderSubmitter::new(venue.clone(), fast_policy());

        let sig = submitter
            .submit(&OrderParams::limit(Side::Sell, 0.5, 108_000.0))
            .await
            .unwrap();

        // second submission landed; the status check saved the third
        assert_eq!(sig, "mock-sig-2");
        assert_eq!(venue.place_attempts(), 2);
        assert_eq!(venue.status_queries.lock().await.len(), 2);

        // confirmation window doubled between attempts
        let confirms = venue.confirm_calls.lock().await;
        assert_eq!(confirms[0].1, 5);
        assert_eq!(confirms[1].1, 10);
    }

    #[tokio::test]
    async fn test_exhausted_retries_report_attempt_count() {
        let venue = Arc::new(MockVenue::new(107_000.0));
        venue.script_confirm_timeouts(3);
        venue
            .script_statuses(vec![TxStatus::NotFound, TxStatus::NotFound, TxStatus::NotFound])
            .await;
        let submitter = OrderSubmitter::new(venue.clone(), fast_policy());

        let err = submitter
            .submit(&OrderParams::limit(Side::Buy, 0.5, 106_000.0))
            .await
            .unwrap_err();

        match err {
            BotError::Submission { attempts, reason } => {
                assert_eq!(attempts, 3);
                assert!(reason.contains("not confirmed"));
            }
            other => panic!("expected Submission error, got {other:?}"),
        }
        assert_eq!(venue.place_attempts(), 3);
    }

    #[tokio::test]
    async fn test_ambiguous_place_error_recovered_from_text() {
        let venue = Arc::new(MockVenue::new(107_000.0));
        let text = format!("Transaction {} was not confirmed in 30.00 seconds", SIG);
        venue.script_place_failures(1, &text).await;
        venue.script_statuses(vec![TxStatus::Confirmed]).await;
        let submitter = OrderSubmitter::new(venue.clone(), fast_policy());

        let sig = submitter
            .submit(&OrderParams::limit(Side::Buy, 0.5, 106_000.0))
            .await
            .unwrap();

        assert_eq!(sig, SIG);
        assert_eq!(venue.place_attempts(), 1);
        assert_eq!(venue.status_queries.lock().await.as_slice(), [SIG.to_string()]);
    }

    #[tokio::test]
    async fn test_plain_place_error_skips_status_lookup() {
        let venue = Arc::new(MockVenue::new(107_000.0));
        venue.script_place_failures(3, "rpc node unavailable").await;
        let submitter = OrderSubmitter::new(venue.clone(), fast_policy());

        let err = submitter
            .submit(&OrderParams::limit(Side::Buy, 0.5, 106_000.0))
            .await
            .unwrap_err();

        assert!(matches!(err, BotError::Submission { attempts: 3, .. }));
        assert!(venue.status_queries.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_batch_goes_out_as_one_transaction() {
        let venue = Arc::new(MockVenue::new(107_000.0));
        let submitter = OrderSubmitter::new(venue.clone(), fast_policy());

        let orders = vec![
            OrderParams::market(Side::Buy, 1.5),
            OrderParams::limit(Side::Sell, 0.5, 108_000.0).reduce_only(true),
            OrderParams::limit(Side::Buy, 0.5, 106_000.0),
        ];
        submitter.submit_batch(&orders).await.unwrap();

        assert_eq!(venue.place_attempts(), 1);
        assert_eq!(venue.batch_sizes.lock().await.as_slice(), [3]);
        assert_eq!(venue.orders.lock().await.len(), 3);
    }
}
