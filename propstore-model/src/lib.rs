//! Record types shared across PropStore crates: listings, owners, images,
//! traces and the composed listing-with-details view.
#![allow(missing_docs)]

pub use ::chrono;
pub use ::rust_decimal;

pub mod details;
pub mod error;
pub mod fields;
pub mod ids;
pub mod image;
pub mod listing;
pub mod owner;
pub mod trace;

pub use details::ListingWithDetails;
pub use error::{ModelError, Result as ModelResult};
pub use ids::{ListingKey, ObjectId, OwnerKey};
pub use image::ListingImage;
pub use listing::Listing;
pub use owner::Owner;
pub use trace::ListingTrace;
