namespace!(
    /// Client of the node-local key/value store methods (`db_*`).
    Db,
    "db"
);

impl Db {
    route!(get_hex, "db_getHex", database: &str, key: &str);
    route!(get_string, "db_getString", database: &str, key: &str);
    route!(put_hex, "db_putHex", database: &str, key: &str, hex: &str);
    route!(put_string, "db_putString", database: &str, key: &str, value: &str);
}
