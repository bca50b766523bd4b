//! HTTP handlers, one module per resource.

pub mod alert;
pub mod data;
pub mod device;
pub mod setting;
pub mod threshold;
