use crate::model::TransactionRequest;
use serde_json::Value;

namespace!(
    /// Client of the account management methods (`personal_*`).
    Personal,
    "personal"
);

impl Personal {
    route!(list_accounts, "personal_listAccounts");
    route!(new_account, "personal_newAccount", password: &str);
    route!(new_account_from_phrase, "personal_newAccountFromPhrase", phrase: &str, password: &str);
    route!(new_account_from_wallet, "personal_newAccountFromWallet", wallet_json: &str, password: &str);
    route!(set_account_name, "personal_setAccountName", address: &str, name: &str);
    route!(set_account_meta, "personal_setAccountMeta", address: &str, meta: &Value);
    route!(sign_and_send_transaction, "personal_signAndSendTransaction", tx: &TransactionRequest, password: &str);
    route!(
        /// Unlocks `address` for `duration` seconds, or for the node default when `None`.
        unlock_account,
        "personal_unlockAccount",
        address: &str,
        password: &str,
        duration: Option<u64>
    );
}
