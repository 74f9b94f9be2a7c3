use nodelink_rpc_core::error::TransportError;
use serde_json::Value;

/// What a subscription callback observes: either a payload or the error of the
/// upstream exchange that should have produced it.
pub type SubscriptionEvent = std::result::Result<Value, TransportError>;
