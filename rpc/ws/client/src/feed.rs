use async_channel::{Receiver, Sender};
use nodelink_core::trace;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};

/// Pushes kept for a key that has no feed yet.
const MAX_BACKLOG_PER_KEY: usize = 16;
/// Keys for which a backlog is kept; the oldest one is evicted first.
const MAX_BACKLOG_KEYS: usize = 32;

#[derive(Debug, Default)]
struct Feeds {
    senders: HashMap<String, Sender<Value>>,
    backlog: HashMap<String, VecDeque<Value>>,
    backlog_order: VecDeque<String>,
    closed: bool,
}

/// Routes push payloads to the feed registered for their subscription key.
///
/// A subscription id is known to the caller only once the subscribe call resolves,
/// so the first pushes may arrive before the feed exists. Those are held in a small
/// bounded backlog and flushed into the feed on registration.
#[derive(Debug, Default)]
pub(crate) struct FeedRouter {
    feeds: Mutex<Feeds>,
}

impl FeedRouter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&self, key: &str) -> Receiver<Value> {
        let (sender, receiver) = async_channel::unbounded();
        let mut feeds = self.feeds.lock();
        if feeds.closed {
            sender.close();
            return receiver;
        }
        if let Some(backlog) = feeds.backlog.remove(key) {
            feeds.backlog_order.retain(|k| k != key);
            trace!("[FeedRouter] flushing {} early pushes into feed {}", backlog.len(), key);
            backlog.into_iter().for_each(|payload| {
                let _ = sender.try_send(payload);
            });
        }
        if let Some(previous) = feeds.senders.insert(key.to_string(), sender) {
            previous.close();
        }
        receiver
    }

    pub(crate) fn unregister(&self, key: &str) {
        let mut feeds = self.feeds.lock();
        if let Some(sender) = feeds.senders.remove(key) {
            sender.close();
        }
        if feeds.backlog.remove(key).is_some() {
            feeds.backlog_order.retain(|k| k != key);
        }
    }

    pub(crate) fn route(&self, key: String, payload: Value) {
        let mut feeds = self.feeds.lock();
        if feeds.closed {
            return;
        }
        if let Some(sender) = feeds.senders.get(&key) {
            if sender.try_send(payload).is_err() {
                trace!("[FeedRouter] feed {} is closed, dropping push", key);
            }
            return;
        }

        if !feeds.backlog.contains_key(&key) {
            if feeds.backlog_order.len() >= MAX_BACKLOG_KEYS {
                if let Some(evicted) = feeds.backlog_order.pop_front() {
                    trace!("[FeedRouter] dropping backlog of unclaimed key {}", evicted);
                    feeds.backlog.remove(&evicted);
                }
            }
            feeds.backlog_order.push_back(key.clone());
        }
        let backlog = feeds.backlog.entry(key).or_default();
        if backlog.len() >= MAX_BACKLOG_PER_KEY {
            backlog.pop_front();
        }
        backlog.push_back(payload);
    }

    /// Closes every feed and forgets every backlog. Feeds registered afterwards are born closed.
    pub(crate) fn close_all(&self) {
        let mut feeds = self.feeds.lock();
        feeds.closed = true;
        feeds.senders.drain().for_each(|(_, sender)| {
            sender.close();
        });
        feeds.backlog.clear();
        feeds.backlog_order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_route_to_registered_feed() {
        let router = FeedRouter::new();
        let feed = router.register("0x1");
        router.route("0x1".to_string(), json!(1));
        router.route("0x1".to_string(), json!(2));
        assert_eq!(feed.try_recv().unwrap(), json!(1));
        assert_eq!(feed.try_recv().unwrap(), json!(2));

        router.unregister("0x1");
        assert!(feed.is_closed());
    }

    #[test]
    fn test_early_pushes_are_flushed_in_order() {
        let router = FeedRouter::new();
        for i in 0..(MAX_BACKLOG_PER_KEY + 2) {
            router.route("0xa".to_string(), json!(i));
        }
        let feed = router.register("0xa");
        let received: Vec<Value> = std::iter::from_fn(|| feed.try_recv().ok()).collect();
        assert_eq!(received.len(), MAX_BACKLOG_PER_KEY);
        assert_eq!(received[0], json!(2));
        assert_eq!(received.last(), Some(&json!(MAX_BACKLOG_PER_KEY + 1)));
    }

    #[test]
    fn test_backlog_keys_are_bounded() {
        let router = FeedRouter::new();
        for i in 0..=MAX_BACKLOG_KEYS {
            router.route(format!("0x{i}"), json!(i));
        }
        // the oldest key was evicted
        assert!(router.register("0x0").try_recv().is_err());
        assert_eq!(router.register(&format!("0x{MAX_BACKLOG_KEYS}")).try_recv().unwrap(), json!(MAX_BACKLOG_KEYS));
    }

    #[test]
    fn test_close_all() {
        let router = FeedRouter::new();
        let a = router.register("a");
        let b = router.register("b");
        router.close_all();
        assert!(a.is_closed() && b.is_closed());
        assert!(router.register("c").is_closed());
    }
}
