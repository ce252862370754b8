use serde::{Deserialize, Serialize};

use crate::ids::{ListingKey, ObjectId};

/// Image attached to a listing (`PropertyImages`).
///
/// Disabled images stay in storage but never reach a composed view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingImage {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(rename = "idPropertyImage")]
    pub key: String,
    #[serde(rename = "idProperty")]
    pub listing_key: ListingKey,
    #[serde(rename = "FilePath")]
    pub file_path: String,
    #[serde(rename = "Enabled")]
    pub enabled: bool,
}
