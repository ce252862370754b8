use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{ListingKey, ObjectId};

/// A recorded sale of a listing (`PropertyTraces`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingTrace {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(rename = "idPropertyTrace")]
    pub key: String,
    #[serde(rename = "idProperty")]
    pub listing_key: ListingKey,
    #[serde(rename = "DateSale")]
    pub date_sale: DateTime<Utc>,
    /// Counterparty of the sale.
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value")]
    pub value: Decimal,
    #[serde(rename = "Tax")]
    pub tax: Decimal,
}
