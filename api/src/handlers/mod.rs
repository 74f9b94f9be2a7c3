//! Built-in subscription handlers.
//!
//! Polling handlers work over any transport. Push handlers relay the server feeds of a
//! stream transport and are only registered when one is available.

use crate::{config::ApiConfig, event::SubscriptionEvent};
use nodelink_notify::{
    error::Result as NotifyResult,
    handler::{DynHandler, DynHandlerFactory},
    manager::SubscriptionManager,
};
use nodelink_rpc_core::api::transport::DynRpcTransport;
use std::sync::Arc;

pub mod poll;
pub mod push;

pub use poll::PollingHandler;
pub use push::PushHandler;

/// Remote methods exposed as polled subscriptions, named after the method.
pub const POLLED_METHODS: [&str; 4] = ["eth_blockNumber", "eth_accounts", "personal_listAccounts", "parity_accountsInfo"];

/// Server push kinds exposed as subscriptions, named after the kind.
pub const PUSH_KINDS: [&str; 4] = ["newHeads", "logs", "newPendingTransactions", "syncing"];

pub(crate) fn register_builtin(
    manager: &SubscriptionManager<SubscriptionEvent>,
    transport: &DynRpcTransport,
    config: &ApiConfig,
) -> NotifyResult<()> {
    for method in POLLED_METHODS {
        let transport = transport.clone();
        let (interval, timeout) = (config.poll_interval, config.request_timeout);
        let factory: DynHandlerFactory<SubscriptionEvent> = Arc::new(move |name: &str| -> NotifyResult<DynHandler<SubscriptionEvent>> {
            Ok(Arc::new(PollingHandler::new(name, transport.clone(), interval, timeout)))
        });
        manager.register(method, factory)?;
    }

    if let Some(stream) = transport.clone().as_stream() {
        for kind in PUSH_KINDS {
            let stream = stream.clone();
            let factory: DynHandlerFactory<SubscriptionEvent> = Arc::new(move |name: &str| -> NotifyResult<DynHandler<SubscriptionEvent>> {
                Ok(Arc::new(PushHandler::new(name, stream.clone())))
            });
            manager.register(kind, factory)?;
        }
    }
    Ok(())
}
