//! Enviro Protocol - wire types for the environmental complaint API.
//!
//! The backend owns every entity; this crate only describes what travels
//! over HTTP and how to decode it without trusting its shape.

pub mod constants;
pub mod decode;
pub mod error;
pub mod messages;
pub mod types;

pub use constants::*;
pub use decode::{collection_items, decode_collection, decode_record, decode_tables};
pub use error::*;
pub use messages::*;
pub use types::*;
