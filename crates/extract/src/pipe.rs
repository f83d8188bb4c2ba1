use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::resource::Resource;

/// A pull-based iterator that interleaves many [`Resource`]s next-ready-first.
///
/// Since resolution here is synchronous, "next ready" degenerates to round-robin: every
/// resource gets one `next_item()` call per lap before any resource gets a second, so order
/// *among* resources is unspecified (any fair interleaving satisfies spec.md §4.D step 2) while
/// order *within* a resource is exactly its emission order, list items included.
///
/// A list-valued item is expanded into its elements before being handed to the caller, one at a
/// time, ahead of the owning resource's next raw item -- so a resource yielding `[a, b]` then `c`
/// surfaces as `a, b, c` in that order, never interleaved with another resource's items.
pub struct PipeIterator {
    resources: Vec<Resource>,
    order: VecDeque<usize>,
    pending: Vec<VecDeque<Value>>,
    cancelled: Arc<AtomicBool>,
    done: bool,
}

/// Identifies which resource an item (or failure) came from, alongside the item/error itself.
pub struct PipeItem {
    pub resource_index: usize,
    pub value: Result<Value, String>,
}

impl PipeIterator {
    pub fn new(resources: Vec<Resource>, cancelled: Arc<AtomicBool>) -> Self {
        let order = (0..resources.len()).collect();
        let pending = resources.iter().map(|_| VecDeque::new()).collect();
        PipeIterator {
            resources,
            order,
            pending,
            cancelled,
            done: false,
        }
    }

    pub fn resource(&self, index: usize) -> &Resource {
        &self.resources[index]
    }
}

impl Iterator for PipeIterator {
    type Item = PipeItem;

    fn next(&mut self) -> Option<PipeItem> {
        if self.done {
            return None;
        }

        loop {
            if self.cancelled.load(Ordering::Relaxed) {
                self.done = true;
                return None;
            }

            let index = self.order.pop_front()?;

            if let Some(value) = self.pending[index].pop_front() {
                self.order.push_back(index);
                return Some(PipeItem {
                    resource_index: index,
                    value: Ok(value),
                });
            }

            match self.resources[index].next_item() {
                None => continue, // exhausted; drop it from the rotation
                Some(Err(message)) => {
                    self.done = true;
                    return Some(PipeItem {
                        resource_index: index,
                        value: Err(message),
                    });
                }
                Some(Ok(item)) => {
                    let mut scalars: VecDeque<Value> = item.into_scalars().into();
                    let Some(first) = scalars.pop_front() else {
                        // An empty list contributes no items; keep the resource in rotation.
                        self.order.push_back(index);
                        continue;
                    };
                    self.pending[index] = scalars;
                    self.order.push_back(index);
                    return Some(PipeItem {
                        resource_index: index,
                        value: Ok(first),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceItem;

    fn cancel_flag() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(false))
    }

    #[test]
    fn preserves_emission_order_within_a_resource() {
        let resource = Resource::from_values("orders", "event", vec![
            Value::from(1),
            Value::from(2),
            Value::from(3),
        ]);
        let pipe = PipeIterator::new(vec![resource], cancel_flag());
        let values: Vec<Value> = pipe.map(|item| item.value.unwrap()).collect();
        assert_eq!(values, vec![Value::from(1), Value::from(2), Value::from(3)]);
    }

    #[test]
    fn round_robins_fairly_across_resources() {
        let a = Resource::from_values("a", "event", vec![Value::from("a1"), Value::from("a2")]);
        let b = Resource::from_values("b", "event", vec![Value::from("b1")]);
        let pipe = PipeIterator::new(vec![a, b], cancel_flag());
        let seen: Vec<(usize, Value)> = pipe
            .map(|item| (item.resource_index, item.value.unwrap()))
            .collect();
        // Resource 1 ("b") only has one item; resource 0 ("a") still yields its items in order.
        assert_eq!(seen[0], (0, Value::from("a1")));
        assert!(seen.contains(&(1, Value::from("b1"))));
        assert_eq!(seen.last().unwrap(), &(0, Value::from("a2")));
    }

    #[test]
    fn expands_list_items_in_place_preserving_order() {
        let resource = Resource::new(
            "orders",
            "event",
            vec![
                Ok(ResourceItem::List(vec![Value::from(1), Value::from(2)])),
                Ok(ResourceItem::Scalar(Value::from(3))),
            ]
            .into_iter(),
        );
        let pipe = PipeIterator::new(vec![resource], cancel_flag());
        let values: Vec<Value> = pipe.map(|item| item.value.unwrap()).collect();
        assert_eq!(values, vec![Value::from(1), Value::from(2), Value::from(3)]);
    }

    #[test]
    fn stops_and_surfaces_a_resource_failure() {
        let resource = Resource::new(
            "orders",
            "event",
            vec![Ok(ResourceItem::Scalar(Value::from(1))), Err("boom".to_string())].into_iter(),
        );
        let mut pipe = PipeIterator::new(vec![resource], cancel_flag());
        assert!(pipe.next().unwrap().value.is_ok());
        let failure = pipe.next().unwrap();
        assert_eq!(failure.value.unwrap_err(), "boom");
        assert!(pipe.next().is_none());
    }

    #[test]
    fn a_cancelled_flag_stops_iteration_immediately() {
        let resource = Resource::from_values("orders", "event", vec![Value::from(1), Value::from(2)]);
        let cancelled = cancel_flag();
        let mut pipe = PipeIterator::new(vec![resource], cancelled.clone());
        assert!(pipe.next().is_some());
        cancelled.store(true, Ordering::Relaxed);
        assert!(pipe.next().is_none());
    }
}
