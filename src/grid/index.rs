//! Order Index: which exchange order belongs to which level and role.

use std::collections::HashMap;

use super::types::OrderRecord;

/// Mapping from exchange order id to grid role and level index.
///
/// The index is a pointer structure into the ladder, not state of its own:
/// level statuses change inside the notification handlers, never as a side
/// effect of index operations. All operations are O(1) expected.
#[derive(Debug, Default)]
pub struct OrderIndex {
    records: HashMap<u64, OrderRecord>,
}

impl OrderIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
        }
    }

    /// Register a newly observed order.
    ///
    /// Re-registering an id replaces the previous record.
    pub fn record_open(&mut self, order_id: u64, record: OrderRecord) {
        self.records.insert(order_id, record);
    }

    /// Look up a tracked order.
    pub fn resolve(&self, order_id: u64) -> Option<OrderRecord> {
        self.records.get(&order_id).copied()
    }

    /// Drop a tracked order, returning its record. Unknown ids are a no-op.
    pub fn remove(&mut self, order_id: u64) -> Option<OrderRecord> {
        self.records.remove(&order_id)
    }

    /// Number of tracked orders.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no orders are tracked.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
