//! Order history: bounded, insertion-ordered record of accepted orders.

use super::OrderResult;
use crate::shared::OrderId;
use std::collections::{HashMap, VecDeque};

/// Results keyed by client order id.
///
/// When over capacity the oldest *terminal* entry is evicted. In-flight
/// orders are never evicted, so the history may temporarily exceed its
/// capacity while many orders are pending.
#[derive(Debug)]
pub struct OrderHistory {
    capacity: usize,
    orders: HashMap<OrderId, OrderResult>,
    arrival: VecDeque<OrderId>,
}

impl OrderHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            orders: HashMap::new(),
            arrival: VecDeque::new(),
        }
    }

    pub fn get(&self, id: &OrderId) -> Option<&OrderResult> {
        self.orders.get(id)
    }

    pub fn contains(&self, id: &OrderId) -> bool {
        self.orders.contains_key(id)
    }

    /// Track a new result. Replaces any entry with the same client id.
    pub fn insert(&mut self, result: OrderResult) {
        let id = result.client_order_id.clone();
        if self.orders.insert(id.clone(), result).is_none() {
            self.arrival.push_back(id);
        }
        self.evict();
    }

    /// Overwrite a tracked result and return what is stored afterwards.
    ///
    /// A terminal entry is never replaced; its stored value is returned
    /// instead. Untracked results are ignored and come back unchanged.
    pub fn update(&mut self, result: OrderResult) -> OrderResult {
        let stored = match self.orders.get_mut(&result.client_order_id) {
            Some(slot) if slot.is_terminal() => slot.clone(),
            Some(slot) => {
                *slot = result.clone();
                result
            }
            None => result,
        };
        self.evict();
        stored
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Results in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &OrderResult> {
        self.arrival.iter().filter_map(|id| self.orders.get(id))
    }

    fn evict(&mut self) {
        while self.orders.len() > self.capacity {
            let Some(pos) = self
                .arrival
                .iter()
                .position(|id| self.orders.get(id).is_some_and(OrderResult::is_terminal))
            else {
                break;
            };
            if let Some(id) = self.arrival.remove(pos) {
                tracing::debug!(client_order_id = %id, "Evicting order from history");
                self.orders.remove(&id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{OrderRequest, OrderStatus};
    use crate::shared::Side;
    use rust_decimal::Decimal;

    fn result(id: &str, status: OrderStatus) -> OrderResult {
        let mut r = OrderResult::pending(&OrderRequest::market("BTC/USD", Side::Buy, Decimal::ONE, id));
        r.status = status;
        r
    }

    #[test]
    fn test_evicts_oldest_terminal_first() {
        let mut h = OrderHistory::new(2);
        h.insert(result("a", OrderStatus::Submitted));
        h.insert(result("b", OrderStatus::Filled));
        h.insert(result("c", OrderStatus::Canceled));

        assert_eq!(h.len(), 2);
        assert!(h.contains(&OrderId::from("a")));
        assert!(!h.contains(&OrderId::from("b")));
        assert!(h.contains(&OrderId::from("c")));
    }

    #[test]
    fn test_in_flight_orders_are_kept_over_capacity() {
        let mut h = OrderHistory::new(1);
        h.insert(result("a", OrderStatus::Pending));
        h.insert(result("b", OrderStatus::Submitted));
        assert_eq!(h.len(), 2);

        h.update(result("a", OrderStatus::Filled));
        assert_eq!(h.len(), 1);
        assert!(h.contains(&OrderId::from("b")));
    }

    #[test]
    fn test_terminal_entry_is_never_replaced() {
        let mut h = OrderHistory::new(4);
        h.insert(result("a", OrderStatus::Submitted));
        h.update(result("a", OrderStatus::Canceled));

        let stored = h.update(result("a", OrderStatus::Filled));
        assert_eq!(stored.status, OrderStatus::Canceled);
        assert_eq!(h.get(&OrderId::from("a")).unwrap().status, OrderStatus::Canceled);
    }

    #[test]
    fn test_update_ignores_untracked() {
        let mut h = OrderHistory::new(4);
        h.update(result("x", OrderStatus::Filled));
        assert!(h.is_empty());
    }

    #[test]
    fn test_iter_in_arrival_order() {
        let mut h = OrderHistory::new(4);
        h.insert(result("b", OrderStatus::Pending));
        h.insert(result("a", OrderStatus::Pending));
        let ids: Vec<_> = h.iter().map(|r| r.client_order_id.as_str().to_string()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }
}
