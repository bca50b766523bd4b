//! Row structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` struct matching the database row, convertible into the core type
//! - `Deserialize` DTOs for the writes the API accepts

pub mod alert;
pub mod device;
pub mod observation;
pub mod setting;
pub mod threshold;
