// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A minimal pub/sub bus keyed by plain function pointers rather than
//! `Box<dyn Fn>`. Function pointers implement `PartialEq` by address, which
//! is what lets [`EventBus::subscribe`] treat re-subscribing the same
//! handler as a priority update instead of a duplicate call on publish.

/// One registered handler: a priority (lower runs first) and the sequence
/// number it was first subscribed at, used to break priority ties in
/// subscription order.
struct Subscription<E> {
    callback: fn(&E),
    priority: i32,
    sequence: u64,
}

/// Subscribers for one event type `E`, invoked in ascending priority order
/// (insertion order among equal priorities).
pub struct EventBus<E> {
    subscriptions: Vec<Subscription<E>>,
    next_sequence: u64,
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
            next_sequence: 0,
        }
    }

    /// Register `callback` at `priority`. Subscribing a callback that is
    /// already registered updates its priority in place rather than adding
    /// a second entry — callbacks are deduplicated by pointer equality.
    pub fn subscribe(&mut self, callback: fn(&E), priority: i32) {
        if let Some(existing) = self.subscriptions.iter_mut().find(|s| s.callback == callback) {
            existing.priority = priority;
        } else {
            let sequence = self.next_sequence;
            self.next_sequence += 1;
            self.subscriptions.push(Subscription {
                callback,
                priority,
                sequence,
            });
        }
        self.subscriptions.sort_by(|a, b| a.priority.cmp(&b.priority).then(a.sequence.cmp(&b.sequence)));
    }

    /// Remove `callback`. Returns `true` if it was subscribed.
    pub fn unsubscribe(&mut self, callback: fn(&E)) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.callback != callback);
        self.subscriptions.len() != before
    }

    /// Invoke every subscriber, in priority order, with `event`.
    pub fn publish(&self, event: &E) {
        for subscription in &self.subscriptions {
            (subscription.callback)(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Ping;

    static CALLS_A: AtomicUsize = AtomicUsize::new(0);
    static CALLS_B: AtomicUsize = AtomicUsize::new(0);
    static ORDER: std::sync::Mutex<Vec<&'static str>> = std::sync::Mutex::new(Vec::new());

    fn handler_a(_event: &Ping) {
        CALLS_A.fetch_add(1, Ordering::SeqCst);
        ORDER.lock().unwrap().push("a");
    }

    fn handler_b(_event: &Ping) {
        CALLS_B.fetch_add(1, Ordering::SeqCst);
        ORDER.lock().unwrap().push("b");
    }

    #[test]
    fn publish_invokes_every_subscriber() {
        CALLS_A.store(0, Ordering::SeqCst);
        CALLS_B.store(0, Ordering::SeqCst);
        let mut bus = EventBus::new();
        bus.subscribe(handler_a, 0);
        bus.subscribe(handler_b, 0);
        bus.publish(&Ping);
        assert_eq!(CALLS_A.load(Ordering::SeqCst), 1);
        assert_eq!(CALLS_B.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn resubscribing_the_same_callback_does_not_duplicate_it() {
        let mut bus = EventBus::new();
        bus.subscribe(handler_a, 5);
        bus.subscribe(handler_a, 1);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn lower_priority_runs_first() {
        ORDER.lock().unwrap().clear();
        let mut bus = EventBus::new();
        bus.subscribe(handler_b, 10);
        bus.subscribe(handler_a, 1);
        bus.publish(&Ping);
        assert_eq!(*ORDER.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn unsubscribe_removes_the_handler() {
        let mut bus = EventBus::new();
        bus.subscribe(handler_a, 0);
        assert!(bus.unsubscribe(handler_a));
        assert_eq!(bus.subscriber_count(), 0);
        assert!(!bus.unsubscribe(handler_a));
    }
}
