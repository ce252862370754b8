use serde::{Deserialize, Serialize};

use crate::{
    ids::{ListingKey, ObjectId},
    image::ListingImage,
    listing::Listing,
    owner::Owner,
    trace::ListingTrace,
};

/// Read-only composed view of a listing and its resolved relations.
///
/// Built fresh by every read; it is never persisted and carries no identity
/// beyond the listing's own. `owner` is `None` when the listing's owner key
/// does not resolve. `images` only ever holds enabled images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingWithDetails {
    #[serde(flatten)]
    pub listing: Listing,
    #[serde(rename = "Owner", default)]
    pub owner: Option<Owner>,
    #[serde(rename = "Images", default)]
    pub images: Vec<ListingImage>,
    #[serde(rename = "Traces", default)]
    pub traces: Vec<ListingTrace>,
}

impl ListingWithDetails {
    pub fn id(&self) -> &ObjectId {
        &self.listing.id
    }

    pub fn key(&self) -> &ListingKey {
        &self.listing.key
    }
}
