use crate::model::Quantity;

namespace!(
    /// Client of the node-specific `parity_*` methods.
    Parity,
    "parity"
);

impl Parity {
    route!(accounts_info, "parity_accountsInfo");
    route!(default_extra_data, "parity_defaultExtraData");
    route!(dev_logs, "parity_devLogs");
    route!(dev_logs_levels, "parity_devLogsLevels");
    route!(enode, "parity_enode");
    route!(extra_data, "parity_extraData");
    route!(gas_floor_target, "parity_gasFloorTarget");
    route!(generate_secret_phrase, "parity_generateSecretPhrase");
    route!(min_gas_price, "parity_minGasPrice");
    route!(net_chain, "parity_netChain");
    route!(net_peers, "parity_netPeers");
    route!(net_port, "parity_netPort");
    route!(node_name, "parity_nodeName");
    route!(pending_transactions, "parity_pendingTransactions");
    route!(phrase_to_address, "parity_phraseToAddress", phrase: &str);
    route!(rpc_settings, "parity_rpcSettings");
    route!(set_author, "parity_setAuthor", address: &str);
    route!(set_extra_data, "parity_setExtraData", data: &str);
    route!(set_gas_floor_target, "parity_setGasFloorTarget", target: Quantity);
    route!(set_min_gas_price, "parity_setMinGasPrice", price: Quantity);
    route!(set_transactions_limit, "parity_setTransactionsLimit", limit: u64);
    route!(transactions_limit, "parity_transactionsLimit");
    route!(unsigned_transactions_count, "parity_unsignedTransactionsCount");
    route!(version_info, "parity_versionInfo");
}
