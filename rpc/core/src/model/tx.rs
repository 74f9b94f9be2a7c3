use crate::model::quantity::Quantity;
use serde::{Deserialize, Serialize};

/// Call or transaction description used by `eth_call`, `eth_estimateGas`,
/// `eth_sendTransaction` and the signing helpers. Absent fields are omitted
/// from the wire object.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<Quantity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<Quantity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Quantity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<Quantity>,
}

impl TransactionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(mut self, address: impl Into<String>) -> Self {
        self.from = Some(address.into());
        self
    }

    pub fn to(mut self, address: impl Into<String>) -> Self {
        self.to = Some(address.into());
        self
    }

    pub fn data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn value(mut self, value: u64) -> Self {
        self.value = Some(Quantity(value));
        self
    }

    pub fn gas(mut self, gas: u64) -> Self {
        self.gas = Some(Quantity(gas));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transaction_request_omits_absent_fields() {
        let tx = TransactionRequest::new().from("0xabc").to("0xdef").value(16);
        assert_eq!(serde_json::to_value(&tx).unwrap(), json!({ "from": "0xabc", "to": "0xdef", "value": "0x10" }));
    }
}
