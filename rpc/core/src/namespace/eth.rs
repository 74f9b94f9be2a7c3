use crate::model::{BlockNumber, TransactionRequest};
use serde_json::Value;

namespace!(
    /// Client of the chain methods (`eth_*`).
    Eth,
    "eth"
);

impl Eth {
    route!(accounts, "eth_accounts");
    route!(block_number, "eth_blockNumber");
    route!(call, "eth_call", tx: &TransactionRequest, block: BlockNumber);
    route!(coinbase, "eth_coinbase");
    route!(estimate_gas, "eth_estimateGas", tx: &TransactionRequest);
    route!(gas_price, "eth_gasPrice");
    route!(get_balance, "eth_getBalance", address: &str, block: BlockNumber);
    route!(get_block_by_hash, "eth_getBlockByHash", hash: &str, full_transactions: bool);
    route!(get_block_by_number, "eth_getBlockByNumber", block: BlockNumber, full_transactions: bool);
    route!(get_block_transaction_count_by_hash, "eth_getBlockTransactionCountByHash", hash: &str);
    route!(get_block_transaction_count_by_number, "eth_getBlockTransactionCountByNumber", block: BlockNumber);
    route!(get_code, "eth_getCode", address: &str, block: BlockNumber);
    route!(get_filter_changes, "eth_getFilterChanges", filter_id: &str);
    route!(get_filter_logs, "eth_getFilterLogs", filter_id: &str);
    route!(get_logs, "eth_getLogs", filter: &Value);
    route!(get_storage_at, "eth_getStorageAt", address: &str, position: &str, block: BlockNumber);
    route!(get_transaction_by_hash, "eth_getTransactionByHash", hash: &str);
    route!(get_transaction_count, "eth_getTransactionCount", address: &str, block: BlockNumber);
    route!(get_transaction_receipt, "eth_getTransactionReceipt", hash: &str);
    route!(get_uncle_count_by_block_hash, "eth_getUncleCountByBlockHash", hash: &str);
    route!(get_uncle_count_by_block_number, "eth_getUncleCountByBlockNumber", block: BlockNumber);
    route!(hashrate, "eth_hashrate");
    route!(mining, "eth_mining");
    route!(new_block_filter, "eth_newBlockFilter");
    route!(new_filter, "eth_newFilter", filter: &Value);
    route!(new_pending_transaction_filter, "eth_newPendingTransactionFilter");
    route!(protocol_version, "eth_protocolVersion");
    route!(send_raw_transaction, "eth_sendRawTransaction", data: &str);
    route!(send_transaction, "eth_sendTransaction", tx: &TransactionRequest);
    route!(sign, "eth_sign", address: &str, data: &str);
    route!(syncing, "eth_syncing");
    route!(uninstall_filter, "eth_uninstallFilter", filter_id: &str);
    route!(
        /// Opens a push subscription of `kind` (`newHeads`, `newPendingTransactions`, `syncing`).
        /// Only meaningful over a stream transport.
        subscribe,
        "eth_subscribe",
        kind: &str
    );
    route!(
        /// Opens a `logs` push subscription restricted by `filter`.
        subscribe_logs,
        "eth_subscribe",
        kind: &str,
        filter: &Value
    );
    route!(unsubscribe, "eth_unsubscribe", subscription_id: &str);
}
