use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _};
use serde_json::Value;
use std::{fmt, str::FromStr};

/// An unsigned integer carried on the wire as a `0x`-prefixed hex string.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(pub u64);

impl Quantity {
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Reads a quantity from a JSON result, accepting hex strings and plain numbers.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n.as_u64().map(Quantity),
            _ => None,
        }
    }
}

impl From<u64> for Quantity {
    fn from(value: u64) -> Self {
        Quantity(value)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseQuantityError(pub String);

impl fmt::Display for ParseQuantityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid hex quantity `{}`", self.0)
    }
}

impl std::error::Error for ParseQuantityError {}

impl FromStr for Quantity {
    type Err = ParseQuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).ok_or_else(|| ParseQuantityError(s.to_string()))?;
        if digits.is_empty() {
            return Err(ParseQuantityError(s.to_string()));
        }
        u64::from_str_radix(digits, 16).map(Quantity).map_err(|_| ParseQuantityError(s.to_string()))
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Quantity::from_value(&value).ok_or_else(|| D::Error::custom(format!("invalid quantity {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_quantity_wire_format() {
        assert_eq!(serde_json::to_value(Quantity(0)).unwrap(), json!("0x0"));
        assert_eq!(serde_json::to_value(Quantity(1024)).unwrap(), json!("0x400"));
        assert_eq!(serde_json::from_value::<Quantity>(json!("0x1b4")).unwrap(), Quantity(436));
        assert_eq!(serde_json::from_value::<Quantity>(json!(7)).unwrap(), Quantity(7));
    }

    #[test]
    fn test_quantity_rejects_malformed() {
        assert!("1b4".parse::<Quantity>().is_err());
        assert!("0x".parse::<Quantity>().is_err());
        assert!("0xzz".parse::<Quantity>().is_err());
        assert!(Quantity::from_value(&json!(null)).is_none());
    }
}
