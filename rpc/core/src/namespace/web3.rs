namespace!(
    /// Client of the `web3_*` methods.
    Web3,
    "web3"
);

impl Web3 {
    route!(client_version, "web3_clientVersion");
    route!(
        /// Keccak-256 of the given hex data.
        sha3,
        "web3_sha3",
        data: &str
    );
}
