//! Custom serde helpers for backend wire formats.

/// Deserializes a Unix-millis integer into `DateTime<Utc>`.
///
/// Reya's REST and WS payloads send `updatedAt`/`createdAt` as epoch
/// milliseconds, not ISO 8601 strings.
pub mod timestamp_ms {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = i64::deserialize(deserializer)?;
        DateTime::<Utc>::from_timestamp_millis(millis)
            .ok_or_else(|| serde::de::Error::custom(format!("Invalid timestamp: {}", millis)))
    }

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(value.timestamp_millis())
    }
}

/// Convert epoch seconds into `DateTime<Utc>`.
pub fn from_secs(secs: i64) -> Option<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::<chrono::Utc>::from_timestamp(secs, 0)
}

/// Convert epoch milliseconds into `DateTime<Utc>`.
pub fn from_millis(millis: i64) -> Option<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::<chrono::Utc>::from_timestamp_millis(millis)
}

/// A decimal that accepts either a JSON string or a JSON number.
///
/// `rust_decimal` with `serde-str` only reads strings; some Reya endpoints
/// (candle history, a few summary fields) send bare numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlexDecimal(pub rust_decimal::Decimal);

impl<'de> serde::Deserialize<'de> for FlexDecimal {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Str(String),
            Int(i64),
            Float(f64),
        }

        use std::str::FromStr;
        match Raw::deserialize(deserializer)? {
            Raw::Str(s) => rust_decimal::Decimal::from_str(s.trim())
                .map(FlexDecimal)
                .map_err(|e| serde::de::Error::custom(format!("Invalid decimal '{}': {}", s, e))),
            Raw::Int(i) => Ok(FlexDecimal(rust_decimal::Decimal::from(i))),
            Raw::Float(f) => rust_decimal::Decimal::try_from(f)
                .map(FlexDecimal)
                .map_err(|e| serde::de::Error::custom(format!("Invalid decimal {}: {}", f, e))),
        }
    }
}

impl From<FlexDecimal> for rust_decimal::Decimal {
    fn from(d: FlexDecimal) -> Self {
        d.0
    }
}
