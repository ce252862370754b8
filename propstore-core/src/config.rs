//! Tunables for pipeline assembly: collection names, join and presentation
//! caps, the composed-document size ceiling, paging bounds and the optional
//! response cache.

use std::num::NonZeroU32;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hard per-document limit of the underlying store (16 MiB).
pub const STORE_DOCUMENT_LIMIT_BYTES: u64 = 16 * 1024 * 1024;

const DEFAULT_SIZE_CEILING_BYTES: u64 = 15 * 1024 * 1024;

fn cap(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
}

/// Names of the four collections the core reads from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionNames {
    pub listings: String,
    pub owners: String,
    pub images: String,
    pub traces: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            listings: "Properties".to_string(),
            owners: "Owners".to_string(),
            images: "PropertyImages".to_string(),
            traces: "PropertyTraces".to_string(),
        }
    }
}

/// Bounds of the optional response cache kept outside the query core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheLimits {
    /// Maximum number of cached responses per operation family.
    pub capacity: usize,
    #[serde(with = "humantime_duration")]
    pub ttl: Duration,
}

impl Default for CacheLimits {
    fn default() -> Self {
        Self {
            capacity: 256,
            ttl: Duration::from_secs(30),
        }
    }
}

/// Limits applied while assembling and running listing pipelines.
///
/// Join caps bound fan-out at lookup time; presentation caps truncate what
/// survives cleanup. A join cap must be at least its presentation cap so the
/// enabled-image filter has enough candidates to fill the presented list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryLimits {
    pub collections: CollectionNames,
    pub image_join_cap: NonZeroU32,
    pub image_presentation_cap: NonZeroU32,
    pub trace_join_cap: NonZeroU32,
    pub trace_presentation_cap: NonZeroU32,
    /// Composed documents larger than this are dropped by the size guard.
    pub size_ceiling_bytes: u64,
    pub default_page_size: NonZeroU32,
    pub max_page_size: NonZeroU32,
    /// Upper bound for one whole operation (data and count together).
    #[serde(
        with = "humantime_duration::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub query_timeout: Option<Duration>,
    pub cache: CacheLimits,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            collections: CollectionNames::default(),
            image_join_cap: cap(20),
            image_presentation_cap: cap(10),
            trace_join_cap: cap(50),
            trace_presentation_cap: cap(20),
            size_ceiling_bytes: DEFAULT_SIZE_CEILING_BYTES,
            default_page_size: cap(10),
            max_page_size: cap(100),
            query_timeout: None,
            cache: CacheLimits::default(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LimitsError {
    #[error(
        "{relation} presentation cap {presentation} exceeds its join cap {join}"
    )]
    PresentationExceedsJoin {
        relation: &'static str,
        presentation: u32,
        join: u32,
    },

    #[error(
        "size ceiling {ceiling} must be between 1 byte and the 16 MiB store limit"
    )]
    SizeCeilingOutOfRange { ceiling: u64 },

    #[error("default page size {default} exceeds max page size {max}")]
    DefaultPageSizeExceedsMax { default: u32, max: u32 },

    #[error("collection name for {0} cannot be empty")]
    EmptyCollectionName(&'static str),

    #[error("query timeout cannot be zero")]
    ZeroTimeout,
}

impl QueryLimits {
    pub fn validate(&self) -> Result<(), LimitsError> {
        let relations = [
            ("images", self.image_presentation_cap, self.image_join_cap),
            ("traces", self.trace_presentation_cap, self.trace_join_cap),
        ];
        for (relation, presentation, join) in relations {
            if presentation > join {
                return Err(LimitsError::PresentationExceedsJoin {
                    relation,
                    presentation: presentation.get(),
                    join: join.get(),
                });
            }
        }

        if self.size_ceiling_bytes == 0
            || self.size_ceiling_bytes > STORE_DOCUMENT_LIMIT_BYTES
        {
            return Err(LimitsError::SizeCeilingOutOfRange {
                ceiling: self.size_ceiling_bytes,
            });
        }

        if self.default_page_size > self.max_page_size {
            return Err(LimitsError::DefaultPageSizeExceedsMax {
                default: self.default_page_size.get(),
                max: self.max_page_size.get(),
            });
        }

        let names = [
            ("listings", &self.collections.listings),
            ("owners", &self.collections.owners),
            ("images", &self.collections.images),
            ("traces", &self.collections.traces),
        ];
        for (label, name) in names {
            if name.trim().is_empty() {
                return Err(LimitsError::EmptyCollectionName(label));
            }
        }

        if self.query_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(LimitsError::ZeroTimeout);
        }

        Ok(())
    }
}

/// Serde adapter reading durations such as `"750ms"` or `"2s"`.
pub(crate) mod humantime_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(
        value: &Duration,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer
            .serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(raw.trim()).map_err(D::Error::custom)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<Duration>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(duration) => super::serialize(duration, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Duration>, D::Error> {
            let raw = Option::<String>::deserialize(deserializer)?;
            raw.map(|value| {
                humantime::parse_duration(value.trim()).map_err(D::Error::custom)
            })
            .transpose()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(QueryLimits::default().validate(), Ok(()));
    }

    #[test]
    fn presentation_cap_cannot_exceed_join_cap() {
        let limits = QueryLimits {
            image_join_cap: cap(5),
            image_presentation_cap: cap(8),
            ..Default::default()
        };
        assert_eq!(
            limits.validate(),
            Err(LimitsError::PresentationExceedsJoin {
                relation: "images",
                presentation: 8,
                join: 5,
            })
        );
    }

    #[test]
    fn size_ceiling_must_stay_below_store_limit() {
        let limits = QueryLimits {
            size_ceiling_bytes: STORE_DOCUMENT_LIMIT_BYTES + 1,
            ..Default::default()
        };
        assert!(matches!(
            limits.validate(),
            Err(LimitsError::SizeCeilingOutOfRange { .. })
        ));
    }

    #[test]
    fn parses_partial_json_with_humantime_timeout() {
        let limits: QueryLimits = serde_json::from_str(
            r#"{ "trace_join_cap": 80, "query_timeout": "750ms" }"#,
        )
        .unwrap();

        assert_eq!(limits.trace_join_cap.get(), 80);
        assert_eq!(limits.query_timeout, Some(Duration::from_millis(750)));
        assert_eq!(limits.image_join_cap.get(), 20);
        assert_eq!(limits.collections.listings, "Properties");
    }

    #[test]
    fn zero_caps_are_rejected_while_parsing() {
        let parsed: Result<QueryLimits, _> =
            serde_json::from_str(r#"{ "image_join_cap": 0 }"#);
        assert!(parsed.is_err());
    }
}
