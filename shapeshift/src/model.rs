use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Deposit status values reported by `txStat`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    NoDeposits,
    Received,
    Complete,
    Failed,
    /// Any value this client does not know of
    #[serde(other)]
    Unknown,
}

impl Status {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Complete | Status::Failed)
    }
}

/// Body of a `txStat/<address>` answer.
///
/// Fields other than `status` and `error` (amounts, transaction ids, ...) depend on the
/// status and are kept verbatim in `extra`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepositStatus {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DepositStatus {
    pub fn new(status: Status) -> Self {
        Self { status, error: None, extra: Map::new() }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self { status: Status::Failed, error: Some(error.into()), extra: Map::new() }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.extra.get(field)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub status: String,
}

impl Coin {
    pub fn is_available(&self) -> bool {
        self.status == "available"
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarketInfo {
    pub pair: String,
    pub rate: f64,
    pub limit: f64,
    pub minimum: f64,
    pub miner_fee: f64,
}

/// Answer to a `shift` request: where to send the deposit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftResponse {
    pub deposit: String,
    #[serde(default)]
    pub deposit_type: Option<String>,
    pub withdrawal: String,
    #[serde(default)]
    pub withdrawal_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deposit_status_decoding() {
        let status: DepositStatus = serde_json::from_value(json!({ "status": "no_deposits", "address": "addr1" })).unwrap();
        assert_eq!(status.status, Status::NoDeposits);
        assert_eq!(status.get("address"), Some(&json!("addr1")));

        let status: DepositStatus = serde_json::from_value(json!({ "status": "failed", "error": "timeout" })).unwrap();
        assert_eq!(status, DepositStatus::failed("timeout"));
        assert!(status.status.is_terminal());

        let status: DepositStatus = serde_json::from_value(json!({ "status": "resolved" })).unwrap();
        assert_eq!(status.status, Status::Unknown);
        assert!(!status.status.is_terminal());
    }

    #[test]
    fn test_market_info_decoding() {
        let info: MarketInfo =
            serde_json::from_value(json!({ "pair": "btc_eth", "rate": 13.7, "limit": 1.5, "minimum": 0.0002, "minerFee": 0.001 })).unwrap();
        assert_eq!(info.pair, "btc_eth");
        assert_eq!(info.miner_fee, 0.001);
    }
}
