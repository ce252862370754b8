use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{ListingKey, ObjectId, OwnerKey};

/// A real-estate listing as stored in the `Properties` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(rename = "idProperty")]
    pub key: ListingKey,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "Price")]
    pub price: Decimal,
    #[serde(rename = "CodeInternal")]
    pub code_internal: String,
    #[serde(rename = "Year")]
    pub year: i32,
    /// Business identifier of the owner; may point at no stored owner.
    #[serde(rename = "IdOwner")]
    pub owner_key: OwnerKey,
}
