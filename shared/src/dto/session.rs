use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

/// Connection status of a wallet session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl SessionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SessionStatus::Disconnected => "Disconnected",
            SessionStatus::Connecting => "Connecting",
            SessionStatus::Connected => "Connected",
            SessionStatus::Error => "Error",
        }
    }
}

/// Immutable view of a wallet session handed to presentation adapters.
///
/// A new snapshot is published whenever any field changes; adapters never read
/// the controller's live state directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,

    /// Active account, lowercase hex
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub account: Option<String>,

    /// Hex chain id reported by the provider (e.g. `"0x1"`)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub chain_id: Option<String>,

    /// Last fetched balance of `account` on `chain_id`, in wei
    #[serde(
        with = "decimal_wei",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub balance_wei: Option<BigUint>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error_message: Option<String>,
}

/// Serde adapter that writes wei amounts as base-10 strings.
mod decimal_wei {
    use num_bigint::BigUint;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<BigUint>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(wei) => serializer.serialize_str(&wei.to_str_radix(10)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<BigUint>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| {
            BigUint::parse_bytes(s.as_bytes(), 10)
                .ok_or_else(|| D::Error::custom(format!("invalid wei amount: {}", s)))
        })
        .transpose()
    }
}
