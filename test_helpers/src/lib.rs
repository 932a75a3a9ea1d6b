//! Test helpers shared across crates in the field-meta workspace.
//!
//! - [`figment`] wraps `figment::Jail` for configuration tests.
//! - [`tokens`] normalises token streams so generated code can be compared
//!   against hand-written source.

pub mod figment;
pub mod tokens;
