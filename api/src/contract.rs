use nodelink_rpc_core::{
    api::transport::DynRpcTransport,
    error::{RpcError, RpcResult},
    model::{BlockNumber, TransactionRequest},
    namespace::Eth,
};
use serde_json::Value;
use std::sync::Arc;

/// A contract description bound, once [`at`](Contract::at) is called, to a deployed address.
///
/// Call data is expected pre-encoded; the ABI is only used to list entries by name.
#[derive(Clone, Debug)]
pub struct Contract {
    eth: Eth,
    abi: Arc<Vec<Value>>,
    address: Option<String>,
}

impl Contract {
    /// Fails with [`RpcError::Configuration`] unless `abi` is a JSON array of entries.
    pub fn new(transport: DynRpcTransport, abi: Value) -> RpcResult<Self> {
        match abi {
            Value::Array(entries) => Ok(Self { eth: Eth::new(transport), abi: Arc::new(entries), address: None }),
            other => Err(RpcError::Configuration(format!("a contract ABI must be an array of entries, got {other}"))),
        }
    }

    pub fn at(&self, address: impl Into<String>) -> Self {
        Self { eth: self.eth.clone(), abi: self.abi.clone(), address: Some(address.into()) }
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn abi(&self) -> &[Value] {
        &self.abi
    }

    pub fn functions(&self) -> Vec<&str> {
        self.entries_of("function")
    }

    pub fn events(&self) -> Vec<&str> {
        self.entries_of("event")
    }

    fn entries_of(&self, kind: &str) -> Vec<&str> {
        self.abi
            .iter()
            .filter(|entry| entry.get("type").and_then(Value::as_str) == Some(kind))
            .filter_map(|entry| entry.get("name").and_then(Value::as_str))
            .collect()
    }

    fn bound_address(&self) -> RpcResult<&str> {
        self.address().ok_or_else(|| RpcError::Configuration("the contract is not bound to an address".to_string()))
    }

    /// Executes a read-only call against the latest block.
    pub async fn call(&self, data: &str) -> RpcResult<Value> {
        let tx = TransactionRequest::new().to(self.bound_address()?).data(data);
        self.eth.call(&tx, BlockNumber::Latest).await
    }

    /// Submits a transaction from `from` carrying `data` and an optional `value`.
    pub async fn send(&self, from: &str, data: &str, value: Option<u64>) -> RpcResult<Value> {
        let mut tx = TransactionRequest::new().from(from).to(self.bound_address()?).data(data);
        if let Some(value) = value {
            tx = tx.value(value);
        }
        self.eth.send_transaction(&tx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodelink_rpc_core::test_helpers::MockTransport;
    use serde_json::json;

    fn token_abi() -> Value {
        json!([
            { "type": "function", "name": "balanceOf", "inputs": [{ "name": "owner", "type": "address" }] },
            { "type": "function", "name": "transfer", "inputs": [] },
            { "type": "event", "name": "Transfer", "inputs": [] },
            { "type": "constructor", "inputs": [] }
        ])
    }

    #[test]
    fn test_abi_entries() {
        let contract = Contract::new(Arc::new(MockTransport::new()), token_abi()).unwrap();
        assert_eq!(contract.functions(), vec!["balanceOf", "transfer"]);
        assert_eq!(contract.events(), vec!["Transfer"]);
        assert!(contract.address().is_none());
        assert!(matches!(Contract::new(Arc::new(MockTransport::new()), json!({})), Err(RpcError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_calls_require_an_address() {
        let transport = Arc::new(MockTransport::new());
        let contract = Contract::new(transport.clone(), token_abi()).unwrap();
        assert!(matches!(contract.call("0x70a08231").await, Err(RpcError::Configuration(_))));
        assert!(transport.calls().is_empty());

        let token = contract.at("0xtoken");
        token.call("0x70a08231").await.unwrap();
        token.send("0xme", "0xa9059cbb", Some(0)).await.unwrap();
        assert_eq!(
            transport.calls(),
            vec![
                ("eth_call".to_string(), vec![json!({ "to": "0xtoken", "data": "0x70a08231" }), json!("latest")]),
                ("eth_sendTransaction".to_string(), vec![json!({ "from": "0xme", "to": "0xtoken", "value": "0x0", "data": "0xa9059cbb" })]),
            ]
        );
    }
}
