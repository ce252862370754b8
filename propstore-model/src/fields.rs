//! Stored field names, one module per collection.
//!
//! Join keys are defined here and nowhere else; the serde renames on the
//! record types are checked against these in tests.

/// Store identity field, present on every record.
pub const ID: &str = "_id";

pub mod listing {
    pub const KEY: &str = "idProperty";
    pub const NAME: &str = "Name";
    pub const ADDRESS: &str = "Address";
    pub const PRICE: &str = "Price";
    pub const CODE_INTERNAL: &str = "CodeInternal";
    pub const YEAR: &str = "Year";
    pub const OWNER_KEY: &str = "IdOwner";
}

pub mod owner {
    pub const KEY: &str = "IdOwner";
    pub const NAME: &str = "Name";
    pub const ADDRESS: &str = "Address";
    pub const PHOTO: &str = "Photo";
    pub const BIRTHDAY: &str = "Birthday";
}

pub mod image {
    pub const KEY: &str = "idPropertyImage";
    pub const LISTING_KEY: &str = "idProperty";
    pub const FILE_PATH: &str = "FilePath";
    pub const ENABLED: &str = "Enabled";
}

pub mod trace {
    pub const KEY: &str = "idPropertyTrace";
    pub const LISTING_KEY: &str = "idProperty";
    pub const DATE_SALE: &str = "DateSale";
    pub const NAME: &str = "Name";
    pub const VALUE: &str = "Value";
    pub const TAX: &str = "Tax";
}

/// Output fields of the composed view.
pub mod details {
    pub const OWNER: &str = "Owner";
    pub const IMAGES: &str = "Images";
    pub const TRACES: &str = "Traces";
}
