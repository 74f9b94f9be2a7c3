use crate::event::SubscriptionEvent;
use nodelink_core::{debug, trace, warn};
use nodelink_notify::{
    error::{Error as NotifyError, Result as NotifyResult},
    handler::{Emitter, Handler},
};
use nodelink_rpc_core::{
    api::transport::DynStreamTransport,
    error::TransportError,
    model::message::feed_key,
};
use serde_json::{Value, json};
use std::sync::Arc;
use triggered::{Listener, Trigger};

/// Relays one server push subscription of the given kind.
///
/// Starting issues `eth_subscribe(kind)` and forwards the push feed; stopping ends the
/// relay and issues `eth_unsubscribe(id)`. A failed subscribe call or a closed feed
/// is emitted as an error event, then the relay retires its instance: current
/// subscriptions end and the next subscribe opens a new upstream subscription.
#[derive(Debug)]
pub struct PushHandler {
    kind: String,
    stream: DynStreamTransport,
    shutdown_trigger: Trigger,
    shutdown_listener: Listener,
}

impl PushHandler {
    pub fn new(kind: impl Into<String>, stream: DynStreamTransport) -> Self {
        let (shutdown_trigger, shutdown_listener) = triggered::trigger();
        Self { kind: kind.into(), stream, shutdown_trigger, shutdown_listener }
    }

    fn subscribe_params(&self) -> Vec<Value> {
        match self.kind.as_str() {
            "logs" => vec![json!(self.kind), json!({})],
            _ => vec![json!(self.kind)],
        }
    }

    async fn open(&self) -> Result<String, TransportError> {
        let id = self.stream.execute("eth_subscribe", self.subscribe_params()).await?;
        feed_key(&id).ok_or_else(|| TransportError::Protocol(format!("invalid subscription id {id}")))
    }

    async fn run(self: Arc<Self>, emitter: Emitter<SubscriptionEvent>) {
        let key = match self.open().await {
            Ok(key) => key,
            Err(err) => {
                warn!("subscribing to `{}` failed: {}", self.kind, err);
                emitter.emit(Err(err));
                emitter.retire();
                return;
            }
        };
        debug!("relaying `{}` pushes of subscription {}", self.kind, key);

        let feed = self.stream.register_feed(&key);
        let shutdown = self.shutdown_listener.clone();
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                payload = feed.recv() => match payload {
                    Ok(payload) => {
                        if !emitter.emit(Ok(payload)) {
                            break;
                        }
                    }
                    Err(_) => {
                        emitter.emit(Err(TransportError::Closed));
                        emitter.retire();
                        break;
                    }
                },
            }
        }

        self.stream.unregister_feed(&key);
        if !self.stream.is_closed() {
            if let Err(err) = self.stream.execute("eth_unsubscribe", vec![json!(key)]).await {
                trace!("unsubscribing {} from `{}` failed: {}", key, self.kind, err);
            }
        }
        trace!("relay of `{}` terminated", self.kind);
    }
}

impl Handler<SubscriptionEvent> for PushHandler {
    fn start(self: Arc<Self>, emitter: Emitter<SubscriptionEvent>) -> NotifyResult<()> {
        if self.stream.is_closed() {
            return Err(NotifyError::ConnectionClosed);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|err| NotifyError::General(err.to_string()))?;
        runtime.spawn(self.run(emitter));
        Ok(())
    }

    fn stop(self: Arc<Self>) {
        debug!("stop relaying `{}`", self.kind);
        self.shutdown_trigger.trigger();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodelink_notify::{ChannelConnection, SubscriptionManager, handler::DynHandler};
    use nodelink_rpc_core::{api::transport::StreamTransport, error::TransportErrorKind, test_helpers::MockStreamTransport};
    use std::time::Duration;

    fn manager_with(stream: Arc<MockStreamTransport>, kind: &'static str) -> SubscriptionManager<SubscriptionEvent> {
        let manager = SubscriptionManager::new("test");
        let factory = Arc::new(move |name: &str| -> NotifyResult<DynHandler<SubscriptionEvent>> {
            Ok(Arc::new(PushHandler::new(name, stream.clone())))
        });
        manager.register(kind, factory).unwrap();
        manager
    }

    async fn wait_for_feed(stream: &MockStreamTransport, key: &str) {
        while !stream.has_feed(key) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    async fn wait_for_retirement(manager: &SubscriptionManager<SubscriptionEvent>, name: &str) {
        while manager.is_handler_active(name) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    #[tokio::test]
    async fn test_relays_pushes_and_cleans_up() {
        let stream = Arc::new(MockStreamTransport::new());
        stream.respond("eth_subscribe", Ok(json!("0xheads")));
        let manager = manager_with(stream.clone(), "newHeads");

        let (sender, receiver) = async_channel::unbounded();
        let id = manager.subscribe("newHeads", Arc::new(ChannelConnection::new(sender))).unwrap();
        wait_for_feed(&stream, "0xheads").await;

        assert!(stream.push("0xheads", json!({ "number": "0x1" })));
        assert!(stream.push("0xheads", json!({ "number": "0x2" })));
        assert_eq!(receiver.recv().await.unwrap().unwrap(), json!({ "number": "0x1" }));
        assert_eq!(receiver.recv().await.unwrap().unwrap(), json!({ "number": "0x2" }));

        manager.unsubscribe(id);
        while stream.call_count("eth_unsubscribe") == 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert!(!stream.has_feed("0xheads"));
        assert_eq!(stream.calls()[0], ("eth_subscribe".to_string(), vec![json!("newHeads")]));
        assert!(stream.calls().contains(&("eth_unsubscribe".to_string(), vec![json!("0xheads")])));
    }

    #[tokio::test]
    async fn test_logs_subscription_carries_a_filter() {
        let stream = Arc::new(MockStreamTransport::new());
        stream.respond("eth_subscribe", Ok(json!("0xlogs")));
        let manager = manager_with(stream.clone(), "logs");

        let (sender, _receiver) = async_channel::unbounded();
        manager.subscribe("logs", Arc::new(ChannelConnection::new(sender))).unwrap();
        wait_for_feed(&stream, "0xlogs").await;
        assert_eq!(stream.calls()[0].1, vec![json!("logs"), json!({})]);
        manager.shutdown();
    }

    #[tokio::test]
    async fn test_subscribe_failure_is_emitted() {
        let stream = Arc::new(MockStreamTransport::new());
        stream.respond("eth_subscribe", Err(TransportError::remote(-32601, "subscriptions not supported")));
        let manager = manager_with(stream, "syncing");

        let (sender, receiver) = async_channel::unbounded();
        let id = manager.subscribe("syncing", Arc::new(ChannelConnection::new(sender))).unwrap();
        assert_eq!(receiver.recv().await.unwrap().unwrap_err().kind(), TransportErrorKind::Remote);

        // the failed relay ends its subscriptions
        wait_for_retirement(&manager, "syncing").await;
        assert!(receiver.recv().await.is_err());
        assert!(!manager.is_subscribed(id));
        assert_eq!(manager.subscription_count(), 0);
    }

    #[tokio::test]
    async fn test_subscribe_is_retried_after_a_failure() {
        let stream = Arc::new(MockStreamTransport::new());
        stream.respond("eth_subscribe", Err(TransportError::remote(-32000, "transient")));
        stream.respond("eth_subscribe", Ok(json!("0xheads")));
        let manager = manager_with(stream.clone(), "newHeads");

        let (sender, receiver) = async_channel::unbounded();
        manager.subscribe("newHeads", Arc::new(ChannelConnection::new(sender))).unwrap();
        assert_eq!(receiver.recv().await.unwrap().unwrap_err().kind(), TransportErrorKind::Remote);
        wait_for_retirement(&manager, "newHeads").await;

        // the next subscriber gets a fresh relay instead of the stale failure
        let (sender, receiver) = async_channel::unbounded();
        manager.subscribe("newHeads", Arc::new(ChannelConnection::new(sender))).unwrap();
        wait_for_feed(&stream, "0xheads").await;
        assert_eq!(stream.call_count("eth_subscribe"), 2);
        assert!(stream.push("0xheads", json!({ "number": "0x1" })));
        assert_eq!(receiver.recv().await.unwrap().unwrap(), json!({ "number": "0x1" }));
        manager.shutdown();
    }

    #[tokio::test]
    async fn test_closed_transport() {
        let stream = Arc::new(MockStreamTransport::new());
        stream.respond("eth_subscribe", Ok(json!("0xpending")));
        let manager = manager_with(stream.clone(), "newPendingTransactions");

        let (sender, receiver) = async_channel::unbounded();
        manager.subscribe("newPendingTransactions", Arc::new(ChannelConnection::new(sender))).unwrap();
        wait_for_feed(&stream, "0xpending").await;

        // closing the connection closes the feed, which is reported once
        stream.close().await;
        assert_eq!(receiver.recv().await.unwrap().unwrap_err().kind(), TransportErrorKind::Closed);
        wait_for_retirement(&manager, "newPendingTransactions").await;
        assert!(receiver.recv().await.is_err());
        assert_eq!(stream.call_count("eth_unsubscribe"), 0);

        // a closed transport refuses new relays
        manager.shutdown();
        let (sender, _receiver) = async_channel::unbounded();
        let err = manager.subscribe("newPendingTransactions", Arc::new(ChannelConnection::new(sender))).unwrap_err();
        assert!(matches!(err, NotifyError::HandlerStart(..)));
    }
}
