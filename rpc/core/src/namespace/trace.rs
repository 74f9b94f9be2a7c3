use crate::model::{BlockNumber, TransactionRequest};
use serde_json::Value;

namespace!(
    /// Client of the transaction tracing methods (`trace_*`).
    Trace,
    "trace"
);

impl Trace {
    route!(block, "trace_block", block: BlockNumber);
    route!(call, "trace_call", tx: &TransactionRequest, trace_types: &[&str], block: BlockNumber);
    route!(filter, "trace_filter", filter: &Value);
    route!(
        /// Traces at `indices` within the transaction `hash`.
        get,
        "trace_get",
        hash: &str,
        indices: &[u64]
    );
    route!(raw_transaction, "trace_rawTransaction", data: &str, trace_types: &[&str]);
    route!(replay_transaction, "trace_replayTransaction", hash: &str, trace_types: &[&str]);
    route!(transaction, "trace_transaction", hash: &str);
}
