use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::{ObjectId, OwnerKey};

/// Owner record from the `Owners` collection. Joined to listings through
/// [`OwnerKey`], never through the store identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(rename = "IdOwner")]
    pub key: OwnerKey,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "Photo", default)]
    pub photo: Option<String>,
    #[serde(rename = "Birthday", default)]
    pub birthday: Option<NaiveDate>,
}
