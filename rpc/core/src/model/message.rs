//! JSON-RPC 2.0 framing shared by the transports.

use crate::error::{TransportError, TransportResult};
use nodelink_core::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// Suffix of the method name carried by server push frames, as in `eth_subscription`.
pub const SUBSCRIPTION_METHOD_SUFFIX: &str = "_subscription";

#[derive(Clone, Debug, Serialize)]
pub struct JsonRpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: &'a [Value],
}

impl<'a> JsonRpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: &'a [Value]) -> Self {
        Self { jsonrpc: JSONRPC_VERSION, id, method, params }
    }

    pub fn to_json(&self) -> TransportResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl From<JsonRpcErrorObject> for TransportError {
    fn from(err: JsonRpcErrorObject) -> Self {
        TransportError::Remote { code: err.code, message: err.message, data: err.data }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub error: Option<JsonRpcErrorObject>,
}

impl JsonRpcResponse {
    /// Numeric id of the response. String ids holding a number are accepted too.
    pub fn id(&self) -> Option<u64> {
        match &self.id {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// A `null` or absent result resolves to [`Value::Null`].
    pub fn into_result(self) -> TransportResult<Value> {
        match self.error {
            Some(err) => Err(err.into()),
            None => Ok(self.result),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
struct PushParams {
    subscription: Value,
    #[serde(default)]
    result: Value,
}

/// A frame received on a persistent connection.
#[derive(Clone, Debug)]
pub enum Incoming {
    Response { id: u64, outcome: TransportResult<Value> },
    Push { key: String, payload: Value },
}

/// Normalizes a subscription id into the key used to address feeds.
pub fn feed_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Decodes one text frame, which may hold a single message or a batch.
///
/// Malformed batch elements are logged and skipped; the rest of the batch is kept.
pub fn parse_incoming(text: &str) -> TransportResult<Vec<Incoming>> {
    match serde_json::from_str::<Value>(text)? {
        Value::Array(items) => Ok(items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match parse_message(item) {
                Ok(incoming) => Some(incoming),
                Err(err) => {
                    warn!("skipping batch element #{index}: {err}");
                    None
                }
            })
            .collect()),
        message => Ok(vec![parse_message(message)?]),
    }
}

fn parse_message(mut message: Value) -> TransportResult<Incoming> {
    let is_push = message
        .get("method")
        .and_then(Value::as_str)
        .is_some_and(|method| method.ends_with(SUBSCRIPTION_METHOD_SUFFIX));

    if is_push {
        let params = message.get_mut("params").map(Value::take).unwrap_or_default();
        let params: PushParams = serde_json::from_value(params)?;
        let key = feed_key(&params.subscription)
            .ok_or_else(|| TransportError::Protocol(format!("invalid subscription id {}", params.subscription)))?;
        return Ok(Incoming::Push { key, payload: params.result });
    }

    let response: JsonRpcResponse = serde_json::from_value(message)?;
    let id = response.id().ok_or_else(|| TransportError::Protocol(format!("response without usable id {}", response.id)))?;
    Ok(Incoming::Response { id, outcome: response.into_result() })
}
