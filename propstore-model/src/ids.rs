use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ModelError, Result};

const OBJECT_ID_LEN: usize = 12;

/// Opaque identity assigned by the document store to every record.
///
/// Twelve bytes: a big-endian seconds timestamp, five process-random bytes
/// and a wrapping three byte counter. Rendered as 24 lowercase hex chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; OBJECT_ID_LEN]);

fn process_entropy() -> &'static [u8; 5] {
    static ENTROPY: OnceLock<[u8; 5]> = OnceLock::new();
    ENTROPY.get_or_init(rand::random)
}

fn next_counter() -> u32 {
    static COUNTER: OnceLock<AtomicU32> = OnceLock::new();
    COUNTER
        .get_or_init(|| AtomicU32::new(rand::random::<u32>() & 0x00ff_ffff))
        .fetch_add(1, Ordering::Relaxed)
        & 0x00ff_ffff
}

impl ObjectId {
    /// Generate a fresh identity.
    pub fn new() -> Self {
        let seconds = Utc::now().timestamp().clamp(0, u32::MAX as i64) as u32;
        let counter = next_counter().to_be_bytes();

        let mut bytes = [0u8; OBJECT_ID_LEN];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(process_entropy());
        bytes[9..].copy_from_slice(&counter[1..]);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; OBJECT_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse the canonical 24 character hex form.
    pub fn parse_str(raw: &str) -> Result<Self> {
        if raw.len() != OBJECT_ID_LEN * 2 {
            return Err(ModelError::InvalidObjectId(raw.to_string()));
        }

        let mut bytes = [0u8; OBJECT_ID_LEN];
        hex::decode_to_slice(raw, &mut bytes)
            .map_err(|_| ModelError::InvalidObjectId(raw.to_string()))?;
        Ok(Self(bytes))
    }

    pub fn bytes(&self) -> &[u8; OBJECT_ID_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_str(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Accepts the bare hex string as well as the `{"$oid": ".."}` extended form.
#[derive(Deserialize)]
#[serde(untagged)]
enum ObjectIdRepr {
    Hex(String),
    Extended {
        #[serde(rename = "$oid")]
        oid: String,
    },
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let raw = match ObjectIdRepr::deserialize(deserializer)? {
            ObjectIdRepr::Hex(raw) => raw,
            ObjectIdRepr::Extended { oid } => oid,
        };
        ObjectId::parse_str(&raw).map_err(serde::de::Error::custom)
    }
}

macro_rules! business_key {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Build a key, rejecting empty or whitespace-only values.
            pub fn new(value: impl Into<String>) -> Result<Self> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(ModelError::EmptyKey($label));
                }
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

business_key!(
    /// Business identifier of a listing (`idProperty`), shared with its
    /// images and traces. Distinct from the listing's [`ObjectId`].
    ListingKey,
    "listing key"
);

business_key!(
    /// Business identifier of an owner (`IdOwner`), referenced by listings.
    OwnerKey,
    "owner key"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_hex() {
        let id = ObjectId::parse_str("65f1c0ffee00000000000001").unwrap();
        assert_eq!(id.to_hex(), "65f1c0ffee00000000000001");
        assert_eq!(id.bytes()[11], 1);
    }

    #[test]
    fn rejects_wrong_length_and_non_hex() {
        assert!(ObjectId::parse_str("not-a-valid-id-format").is_err());
        assert!(ObjectId::parse_str("65f1c0ffee0000000000000").is_err());
        assert!(ObjectId::parse_str("zzf1c0ffee00000000000001").is_err());
        assert!(ObjectId::parse_str("").is_err());
    }

    #[test]
    fn generated_ids_are_unique_and_round_trip() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_ne!(a, b);
        assert_eq!(ObjectId::parse_str(&a.to_string()).unwrap(), a);
    }

    #[test]
    fn deserializes_extended_json() {
        let id: ObjectId = serde_json::from_value(serde_json::json!({
            "$oid": "65f1c0ffee00000000000002"
        }))
        .unwrap();
        assert_eq!(id.to_hex(), "65f1c0ffee00000000000002");
    }

    #[test]
    fn business_keys_reject_blank_values() {
        assert_eq!(
            ListingKey::new("   ").unwrap_err(),
            ModelError::EmptyKey("listing key")
        );
        assert_eq!(OwnerKey::new("OWN01").unwrap().as_str(), "OWN01");
    }
}
