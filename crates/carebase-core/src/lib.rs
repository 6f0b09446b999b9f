//! Core record types for the Carebase server.
//!
//! A [`ResourceRecord`] is what the stores persist and what the HTTP surface
//! returns. A [`NewRecord`] is the create payload before the store assigns an id.

pub mod error;
pub mod record;

pub use error::FieldError;
pub use record::{NewRecord, RecordId, ResourceRecord};
