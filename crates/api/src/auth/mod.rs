//! Authentication primitives.
//!
//! - [`jwt`] -- staff access tokens and device session tokens.

pub mod jwt;
