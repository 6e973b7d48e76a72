//! Explicit bot context: the capabilities core logic calls into.
//!
//! Constructed once at startup and handed to the bot and the event-feed
//! adapter. Core logic never reaches for process-wide state; everything it
//! may touch arrives through this object.

use std::sync::Arc;

use crate::venue::types::AccountId;
use crate::venue::{OrderSubmitter, SubmitPolicy, VenueClient};

/// Handles and policy shared by the bot, the submitter, and the feed.
#[derive(Clone)]
pub struct BotContext {
    /// Account identifier inbound notifications are filtered against.
    pub account_id: AccountId,
    /// Venue capability handle.
    pub venue: Arc<dyn VenueClient>,
    /// Retry and confirmation policy for submissions.
    pub submit: SubmitPolicy,
}

impl BotContext {
    /// Bundle the venue handle with the account and submission policy.
    pub fn new(
        account_id: impl Into<AccountId>,
        venue: Arc<dyn VenueClient>,
        submit: SubmitPolicy,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            venue,
            submit,
        }
    }

    /// Build a submitter bound to this context's venue and policy.
    pub fn submitter(&self) -> OrderSubmitter {
        OrderSubmitter::new(Arc::clone(&self.venue), self.submit)
    }
}
