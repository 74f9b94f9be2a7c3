use crate::model::quantity::Quantity;
use serde::{Serialize, Serializer};

/// Block selector accepted by state queries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlockNumber {
    #[default]
    Latest,
    Earliest,
    Pending,
    Number(u64),
}

impl Serialize for BlockNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BlockNumber::Latest => serializer.serialize_str("latest"),
            BlockNumber::Earliest => serializer.serialize_str("earliest"),
            BlockNumber::Pending => serializer.serialize_str("pending"),
            BlockNumber::Number(n) => Quantity(*n).serialize(serializer),
        }
    }
}

impl From<u64> for BlockNumber {
    fn from(value: u64) -> Self {
        BlockNumber::Number(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_block_number_serialization() {
        assert_eq!(serde_json::to_value(BlockNumber::Latest).unwrap(), json!("latest"));
        assert_eq!(serde_json::to_value(BlockNumber::Pending).unwrap(), json!("pending"));
        assert_eq!(serde_json::to_value(BlockNumber::from(255)).unwrap(), json!("0xff"));
    }
}
