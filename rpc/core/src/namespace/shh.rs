use serde_json::Value;

namespace!(
    /// Client of the whisper messaging methods (`shh_*`).
    Shh,
    "shh"
);

impl Shh {
    route!(add_to_group, "shh_addToGroup", identity: &str);
    route!(get_filter_changes, "shh_getFilterChanges", filter_id: &str);
    route!(get_messages, "shh_getMessages", filter_id: &str);
    route!(has_identity, "shh_hasIdentity", identity: &str);
    route!(new_filter, "shh_newFilter", options: &Value);
    route!(new_group, "shh_newGroup");
    route!(new_identity, "shh_newIdentity");
    route!(post, "shh_post", message: &Value);
    route!(uninstall_filter, "shh_uninstallFilter", filter_id: &str);
    route!(version, "shh_version");
}
