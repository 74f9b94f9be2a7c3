//! Namespace clients
//!
//! One thin client per remote method namespace. Every operation serializes its
//! arguments into positional JSON params, executes `<namespace>_<method>` on the
//! shared transport and hands the raw result back. Methods without a dedicated
//! operation remain reachable through each client's `request`.

/// Declares a namespace client struct bound to the `$prefix` method namespace.
macro_rules! namespace {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        pub struct $name {
            transport: $crate::api::transport::DynRpcTransport,
        }

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            pub fn new(transport: $crate::api::transport::DynRpcTransport) -> Self {
                Self { transport }
            }

            /// Executes `<namespace>_<method>` with raw positional params.
            pub async fn request(&self, method: &str, params: Vec<serde_json::Value>) -> $crate::error::RpcResult<serde_json::Value> {
                Ok(self.transport.execute(&format!("{}_{}", $prefix, method), params).await?)
            }
        }
    };
}

/// Declares one operation forwarding to a fixed remote method.
macro_rules! route {
    ($(#[$meta:meta])* $fn:ident, $method:literal $(, $arg:ident : $ty:ty)* $(,)?) => {
        $(#[$meta])*
        pub async fn $fn(&self $(, $arg: $ty)*) -> $crate::error::RpcResult<serde_json::Value> {
            let params: Vec<serde_json::Value> = vec![$(serde_json::to_value($arg)?),*];
            nodelink_core::trace!("[{}] {}", Self::PREFIX, $method);
            Ok(self.transport.execute($method, params).await?)
        }
    };
}

pub mod db;
pub mod eth;
pub mod net;
pub mod parity;
pub mod personal;
pub mod shh;
pub mod trace;
pub mod web3;

pub use db::Db;
pub use eth::Eth;
pub use net::Net;
pub use parity::Parity;
pub use personal::Personal;
pub use shh::Shh;
pub use trace::Trace;
pub use web3::Web3;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{RpcError, TransportError},
        model::{BlockNumber, TransactionRequest},
        test_helpers::MockTransport,
    };
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_routes_build_positional_params() {
        let transport = Arc::new(MockTransport::new());
        transport.respond("eth_getBalance", Ok(json!("0x64")));

        let eth = Eth::new(transport.clone());
        let balance = eth.get_balance("0xabc", BlockNumber::Latest).await.unwrap();
        assert_eq!(balance, json!("0x64"));

        let tx = TransactionRequest::new().to("0xdef").data("0x01");
        eth.call(&tx, BlockNumber::Number(16)).await.unwrap();
        Web3::new(transport.clone()).sha3("0x68656c6c6f").await.unwrap();
        Net::new(transport.clone()).peer_count().await.unwrap();

        assert_eq!(
            transport.calls(),
            vec![
                ("eth_getBalance".to_string(), vec![json!("0xabc"), json!("latest")]),
                ("eth_call".to_string(), vec![json!({ "to": "0xdef", "data": "0x01" }), json!("0x10")]),
                ("web3_sha3".to_string(), vec![json!("0x68656c6c6f")]),
                ("net_peerCount".to_string(), vec![]),
            ]
        );
    }

    #[tokio::test]
    async fn test_generic_call_is_prefixed() {
        let transport = Arc::new(MockTransport::new());
        Parity::new(transport.clone()).request("nodeName", vec![]).await.unwrap();
        Personal::new(transport.clone()).request("lockAccount", vec![json!("0xabc")]).await.unwrap();
        assert_eq!(
            transport.calls(),
            vec![("parity_nodeName".to_string(), vec![]), ("personal_lockAccount".to_string(), vec![json!("0xabc")]),]
        );
    }

    #[tokio::test]
    async fn test_transport_failure_is_propagated() {
        let transport = Arc::new(MockTransport::new());
        transport.respond("eth_blockNumber", Err(TransportError::remote(-32603, "internal error")));
        let err = Eth::new(transport).block_number().await.unwrap_err();
        assert!(matches!(err, RpcError::Transport(TransportError::Remote { code: -32603, .. })));
    }

    #[tokio::test]
    async fn test_optional_params() {
        let transport = Arc::new(MockTransport::new());
        let personal = Personal::new(transport.clone());
        personal.unlock_account("0xabc", "secret", None).await.unwrap();
        personal.unlock_account("0xabc", "secret", Some(300)).await.unwrap();
        let calls = transport.calls();
        assert_eq!(calls[0].1, vec![json!("0xabc"), json!("secret"), json!(null)]);
        assert_eq!(calls[1].1, vec![json!("0xabc"), json!("secret"), json!(300)]);
    }
}
