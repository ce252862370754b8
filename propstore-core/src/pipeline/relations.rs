//! Join topology of the composed listing view.
//!
//! Each relation carries its own local/foreign key pair. Owners join on the
//! owner business key (`IdOwner`); images and traces join on the listing
//! business key (`idProperty`). Neither ever joins on the store identity
//! `_id`: the values differ, and a wrong key yields silently empty relations.

use std::num::NonZeroU32;

use propstore_model::fields;

use crate::config::QueryLimits;

/// How a relation's joined array is shaped after the join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    /// 0-or-1 element array collapsed into an optional object.
    Single,
    /// Only elements whose `flag` field is `true`, truncated to `cap`.
    Flagged {
        flag: &'static str,
        cap: NonZeroU32,
    },
    /// All elements, truncated to `cap`.
    Truncated { cap: NonZeroU32 },
}

/// A single foreign-key relation from a listing to a related collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub collection: String,
    pub local_field: &'static str,
    pub foreign_field: &'static str,
    pub output: &'static str,
    pub join_cap: NonZeroU32,
    pub presentation: Presentation,
}

impl Relation {
    /// One-to-one owner relation keyed on the owner business identifier.
    pub fn owner(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            local_field: fields::listing::OWNER_KEY,
            foreign_field: fields::owner::KEY,
            output: fields::details::OWNER,
            join_cap: NonZeroU32::MIN,
            presentation: Presentation::Single,
        }
    }

    /// One-to-many enabled images keyed on the listing business identifier.
    pub fn images(
        collection: impl Into<String>,
        join_cap: NonZeroU32,
        presentation_cap: NonZeroU32,
    ) -> Self {
        Self {
            collection: collection.into(),
            local_field: fields::listing::KEY,
            foreign_field: fields::image::LISTING_KEY,
            output: fields::details::IMAGES,
            join_cap,
            presentation: Presentation::Flagged {
                flag: fields::image::ENABLED,
                cap: presentation_cap,
            },
        }
    }

    /// One-to-many traces keyed on the listing business identifier.
    pub fn traces(
        collection: impl Into<String>,
        join_cap: NonZeroU32,
        presentation_cap: NonZeroU32,
    ) -> Self {
        Self {
            collection: collection.into(),
            local_field: fields::listing::KEY,
            foreign_field: fields::trace::LISTING_KEY,
            output: fields::details::TRACES,
            join_cap,
            presentation: Presentation::Truncated {
                cap: presentation_cap,
            },
        }
    }
}

/// Ordered set of relations joined onto every listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JoinTopology {
    relations: Vec<Relation>,
}

impl JoinTopology {
    /// No joins: plain listing reads.
    pub fn none() -> Self {
        Self::default()
    }

    /// Owner, enabled images and traces, capped per `limits`.
    pub fn listing_details(limits: &QueryLimits) -> Self {
        let collections = &limits.collections;
        Self {
            relations: vec![
                Relation::owner(&collections.owners),
                Relation::images(
                    &collections.images,
                    limits.image_join_cap,
                    limits.image_presentation_cap,
                ),
                Relation::traces(
                    &collections.traces,
                    limits.trace_join_cap,
                    limits.trace_presentation_cap,
                ),
            ],
        }
    }

    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn related_collections_join_on_business_keys() {
        let topology = JoinTopology::listing_details(&QueryLimits::default());

        for relation in topology.relations() {
            assert_ne!(relation.local_field, fields::ID);
            assert_ne!(relation.foreign_field, fields::ID);
        }

        let owner = &topology.relations()[0];
        assert_eq!(owner.local_field, "IdOwner");
        assert_eq!(owner.foreign_field, "IdOwner");
        assert_eq!(owner.join_cap.get(), 1);

        let images = &topology.relations()[1];
        assert_eq!(images.local_field, "idProperty");
        assert_eq!(images.foreign_field, "idProperty");

        let traces = &topology.relations()[2];
        assert_eq!(traces.local_field, images.local_field);
        assert_eq!(traces.foreign_field, images.foreign_field);
    }

    #[test]
    fn caps_follow_limits() {
        let limits = QueryLimits {
            image_join_cap: NonZeroU32::new(7).unwrap(),
            image_presentation_cap: NonZeroU32::new(3).unwrap(),
            ..Default::default()
        };
        let topology = JoinTopology::listing_details(&limits);
        let images = &topology.relations()[1];

        assert_eq!(images.join_cap.get(), 7);
        assert_eq!(
            images.presentation,
            Presentation::Flagged {
                flag: "Enabled",
                cap: NonZeroU32::new(3).unwrap(),
            }
        );
    }
}
