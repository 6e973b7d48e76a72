//! Typed notification feed between the venue and the bot
//!
//! Everything the bot reacts to arrives as one of three notification kinds on
//! a single channel. A feed adapter translates raw venue records into these
//! and the runner drops anything not addressed to the bot's account before it
//! reaches the grid.

use tokio::sync::mpsc;

use crate::venue::types::{AccountId, OrderKind, Side};

/// One event from the venue's order stream
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// An order started resting on the book (or executed, for market orders)
    OrderOpened {
        account_id: AccountId,
        order_id: u64,
        price: f64,
        side: Side,
        kind: OrderKind,
    },
    /// An order filled completely
    OrderFilled { account_id: AccountId, order_id: u64 },
    /// An order was cancelled
    OrderCancelled { account_id: AccountId, order_id: u64 },
}

impl Notification {
    /// Account the notification is addressed to
    pub fn account_id(&self) -> &str {
        match self {
            Notification::OrderOpened { account_id, .. }
            | Notification::OrderFilled { account_id, .. }
            | Notification::OrderCancelled { account_id, .. } => account_id,
        }
    }

    /// Exchange order id the notification refers to
    pub fn order_id(&self) -> u64 {
        match self {
            Notification::OrderOpened { order_id, .. }
            | Notification::OrderFilled { order_id, .. }
            | Notification::OrderCancelled { order_id, .. } => *order_id,
        }
    }

    /// Notification kind label for logs
    pub fn kind_str(&self) -> &'static str {
        match self {
            Notification::OrderOpened { .. } => "order-opened",
            Notification::OrderFilled { .. } => "order-filled",
            Notification::OrderCancelled { .. } => "order-cancelled",
        }
    }
}

/// Sending half of the bot's notification feed
pub type NotificationSender = mpsc::UnboundedSender<Notification>;

/// Receiving half of the bot's notification feed
pub type NotificationReceiver = mpsc::UnboundedReceiver<Notification>;

/// Create the notification channel the bot consumes
pub fn channel() -> (NotificationSender, NotificationReceiver) {
    mpsc::unbounded_channel()
}

/// True when the notification is addressed to the given account
pub fn is_for_account(notification: &Notification, account_id: &str) -> bool {
    notification.account_id() == account_id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let n = Notification::OrderOpened {
            account_id: "acct-1".into(),
            order_id: 42,
            price: 107_000.0,
            side: Side::Buy,
            kind: OrderKind::Limit,
        };
        assert_eq!(n.account_id(), "acct-1");
        assert_eq!(n.order_id(), 42);
        assert_eq!(n.kind_str(), "order-opened");
    }

    #[test]
    fn test_account_filter() {
        let ours = Notification::OrderFilled {
            account_id: "acct-1".into(),
            order_id: 7,
        };
        let theirs = Notification::OrderFilled {
            account_id: "acct-2".into(),
            order_id: 7,
        };
        assert!(is_for_account(&ours, "acct-1"));
        assert!(!is_for_account(&theirs, "acct-1"));
    }

    #[tokio::test]
    async fn test_channel_delivers_in_order() {
        let (tx, mut rx) = channel();
        tx.send(Notification::OrderFilled {
            account_id: "a".into(),
            order_id: 1,
        })
        .unwrap();
        tx.send(Notification::OrderCancelled {
            account_id: "a".into(),
            order_id: 2,
        })
        .unwrap();

        assert_eq!(rx.recv().await.unwrap().order_id(), 1);
        assert_eq!(rx.recv().await.unwrap().order_id(), 2);
    }
}
