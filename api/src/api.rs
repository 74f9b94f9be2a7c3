use crate::{config::ApiConfig, contract::Contract, event::SubscriptionEvent, handlers};
use async_channel::Receiver;
use nodelink_core::{debug, warn};
use nodelink_notify::{
    connection::{CallbackConnection, ChannelConnection, DynConnection},
    error::Error as NotifyError,
    handler::DynHandlerFactory,
    listener::SubscriptionId,
    manager::SubscriptionManager,
};
use nodelink_rpc_core::{
    api::transport::{DynRpcTransport, TransportKind},
    error::{RpcError, RpcResult},
    namespace::{Db, Eth, Net, Parity, Personal, Shh, Trace, Web3},
};
use serde_json::Value;
use std::sync::Arc;

const API: &str = "api";

#[derive(Debug)]
struct Inner {
    transport: DynRpcTransport,
    config: ApiConfig,
    db: Db,
    eth: Eth,
    net: Net,
    parity: Parity,
    personal: Personal,
    shh: Shh,
    trace: Trace,
    web3: Web3,
    subscriptions: SubscriptionManager<SubscriptionEvent>,
}

/// Entry point over one transport.
///
/// Every namespace client and every built-in subscription handler shares the
/// transport; none of them closes it.
#[derive(Clone, Debug)]
pub struct Api {
    inner: Arc<Inner>,
}

impl Api {
    pub fn new(transport: DynRpcTransport) -> Self {
        Self::build(transport, ApiConfig::default())
    }

    /// Validates `config` before building the facade.
    pub fn with_config(transport: DynRpcTransport, config: ApiConfig) -> RpcResult<Self> {
        config.validate()?;
        Ok(Self::build(transport, config))
    }

    fn build(transport: DynRpcTransport, config: ApiConfig) -> Self {
        let subscriptions = SubscriptionManager::new(API);
        // Registration only fails on duplicate names, which the built-in tables do not hold
        if let Err(err) = handlers::register_builtin(&subscriptions, &transport, &config) {
            warn!("[{}] built-in handlers are incomplete: {}", API, err);
        }
        debug!("[{}] facade ready over a {:?} transport, subscriptions: {:?}", API, transport.kind(), subscriptions.names());
        Self {
            inner: Arc::new(Inner {
                db: Db::new(transport.clone()),
                eth: Eth::new(transport.clone()),
                net: Net::new(transport.clone()),
                parity: Parity::new(transport.clone()),
                personal: Personal::new(transport.clone()),
                shh: Shh::new(transport.clone()),
                trace: Trace::new(transport.clone()),
                web3: Web3::new(transport.clone()),
                transport,
                config,
                subscriptions,
            }),
        }
    }

    pub fn transport(&self) -> &DynRpcTransport {
        &self.inner.transport
    }

    pub fn transport_kind(&self) -> TransportKind {
        self.inner.transport.kind()
    }

    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    pub fn db(&self) -> &Db {
        &self.inner.db
    }

    pub fn eth(&self) -> &Eth {
        &self.inner.eth
    }

    pub fn net(&self) -> &Net {
        &self.inner.net
    }

    pub fn parity(&self) -> &Parity {
        &self.inner.parity
    }

    pub fn personal(&self) -> &Personal {
        &self.inner.personal
    }

    pub fn shh(&self) -> &Shh {
        &self.inner.shh
    }

    pub fn trace(&self) -> &Trace {
        &self.inner.trace
    }

    pub fn web3(&self) -> &Web3 {
        &self.inner.web3
    }

    pub fn subscriptions(&self) -> &SubscriptionManager<SubscriptionEvent> {
        &self.inner.subscriptions
    }

    /// Subscribes `callback` to the feed `name`.
    ///
    /// Fails with [`RpcError::UnknownSubscription`] when no handler serves `name`, in
    /// which case `callback` is never invoked.
    pub fn subscribe<F>(&self, name: &str, callback: F) -> RpcResult<SubscriptionId>
    where
        F: Fn(SubscriptionEvent) + Send + Sync + 'static,
    {
        self.subscribe_with(name, Arc::new(CallbackConnection::new(callback)))
    }

    /// Subscribes to the feed `name` and returns a channel receiving its events.
    pub fn subscribe_channel(&self, name: &str) -> RpcResult<(SubscriptionId, Receiver<SubscriptionEvent>)> {
        let (sender, receiver) = async_channel::unbounded();
        let id = self.subscribe_with(name, Arc::new(ChannelConnection::new(sender)))?;
        Ok((id, receiver))
    }

    pub fn subscribe_with(&self, name: &str, connection: DynConnection<SubscriptionEvent>) -> RpcResult<SubscriptionId> {
        self.inner.subscriptions.subscribe(name, connection).map_err(|err| match err {
            NotifyError::UnknownSubscription(name) => RpcError::UnknownSubscription(name),
            err => err.into(),
        })
    }

    /// Cancels a subscription. Unknown or already cancelled identifiers are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.subscriptions.unsubscribe(id)
    }

    pub fn register_handler(&self, name: impl Into<String>, factory: DynHandlerFactory<SubscriptionEvent>) -> RpcResult<()> {
        Ok(self.inner.subscriptions.register(name, factory)?)
    }

    pub fn new_contract(&self, abi: Value) -> RpcResult<Contract> {
        Contract::new(self.inner.transport.clone(), abi)
    }

    /// Cancels every subscription. The transport is left open.
    pub fn shutdown(&self) {
        self.inner.subscriptions.shutdown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{POLLED_METHODS, PUSH_KINDS};
    use nodelink_notify::handler::test_helpers::{ManualHandler, shared_factory};
    use nodelink_rpc_core::{
        error::TransportError,
        test_helpers::{MockStreamTransport, MockTransport},
    };
    use parking_lot::Mutex;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_handlers_follow_transport_capability() {
        let api = Api::new(Arc::new(MockTransport::new()));
        assert_eq!(api.transport_kind(), TransportKind::Request);
        assert!(POLLED_METHODS.iter().all(|name| api.subscriptions().is_registered(name)));
        assert!(PUSH_KINDS.iter().all(|name| !api.subscriptions().is_registered(name)));

        let api = Api::new(Arc::new(MockStreamTransport::new()));
        assert_eq!(api.transport_kind(), TransportKind::Stream);
        assert!(POLLED_METHODS.iter().chain(PUSH_KINDS.iter()).all(|name| api.subscriptions().is_registered(name)));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ApiConfig { poll_interval: Duration::ZERO, ..Default::default() };
        assert!(matches!(Api::with_config(Arc::new(MockTransport::new()), config), Err(RpcError::Configuration(_))));
    }

    #[test]
    fn test_unknown_subscription() {
        let api = Api::new(Arc::new(MockTransport::new()));
        let invoked = Arc::new(Mutex::new(false));
        let flag = invoked.clone();
        let err = api.subscribe("unknownName", move |_| *flag.lock() = true).unwrap_err();
        assert!(matches!(err, RpcError::UnknownSubscription(name) if name == "unknownName"));
        assert!(!*invoked.lock());
    }

    #[tokio::test]
    async fn test_namespace_clients_share_the_transport() {
        let transport = Arc::new(MockTransport::new());
        transport.respond("web3_clientVersion", Ok(json!("Parity//v1.7.0")));
        transport.respond("net_peerCount", Err(TransportError::Unavailable("offline".into())));
        let api = Api::new(transport.clone());

        assert_eq!(api.web3().client_version().await.unwrap(), json!("Parity//v1.7.0"));
        // a failing call does not affect the facade
        assert!(api.net().peer_count().await.is_err());
        api.parity().node_name().await.unwrap();
        api.db().get_string("app", "key").await.unwrap();

        let methods: Vec<String> = transport.calls().into_iter().map(|(method, _)| method).collect();
        assert_eq!(methods, vec!["web3_clientVersion", "net_peerCount", "parity_nodeName", "db_getString"]);
    }

    #[tokio::test]
    async fn test_custom_handler_subscriptions_are_independent() {
        let api = Api::new(Arc::new(MockTransport::new()));
        let handler = Arc::new(ManualHandler::new());
        api.register_handler("ticker", shared_factory(handler.clone())).unwrap();

        let (a, first) = api.subscribe_channel("ticker").unwrap();
        let (b, second) = api.subscribe_channel("ticker").unwrap();
        assert_ne!(a, b);
        assert!(handler.emit(Ok(json!(1))));
        assert_eq!(first.recv().await.unwrap().unwrap(), json!(1));
        assert_eq!(second.recv().await.unwrap().unwrap(), json!(1));

        api.unsubscribe(a);
        api.unsubscribe(a);
        assert!(handler.emit(Err(TransportError::Closed)));
        assert!(first.try_recv().is_err());
        assert!(second.recv().await.unwrap().is_err());

        api.shutdown();
        assert!(!handler.emit(Ok(json!(2))));
        assert_eq!(handler.stops(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_block_number_subscription_over_request_transport() {
        let transport = Arc::new(MockTransport::new());
        transport.respond("eth_blockNumber", Ok(json!("0x1b4")));
        transport.respond("eth_blockNumber", Ok(json!("0x1b5")));
        let config = ApiConfig { poll_interval: Duration::from_millis(500), ..Default::default() };
        let api = Api::with_config(transport, config).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let id = api.subscribe("eth_blockNumber", move |event| sink.lock().push(event.unwrap())).unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        api.unsubscribe(id);
        assert_eq!(*seen.lock(), vec![json!("0x1b4"), json!("0x1b5")]);
    }
}
