//! Runtime side of the field metadata framework.
//!
//! Metadata channels attach one literal value per field of an annotated type.
//! The `field_meta_codegen` crate parses annotated declarations and emits
//! registration code; this crate holds the registries that code fills in and
//! answers lookups against them:
//!
//! - single-field lookups through [`Registry::get`], falling back to the
//!   channel default for fields without an explicit value,
//! - whole-type lookups through [`Registry::get_all`], in field declaration
//!   order,
//! - the unconditional default through [`Registry::fallback`].
//!
//! ```
//! use field_meta::{Registries, Value};
//!
//! let mut registries = Registries::new();
//! registries.declare_channel("unit", Value::from("m"));
//! registries.declare_type("unit", "Point", ["x", "y"])?;
//! registries.define("unit", "Point", "x", Value::from("cm"))?;
//!
//! assert_eq!(registries.lookup("unit", "Point", "x")?, &Value::from("cm"));
//! assert_eq!(registries.lookup("unit", "Point", "y")?, &Value::from("m"));
//! # Ok::<_, field_meta::MetaError>(())
//! ```

mod error;
mod key;
mod registry;
mod value;

pub use error::{MetaError, MetaResult};
pub use key::{Field, FieldKey, TypeKey};
pub use registry::{Registries, Registry};
pub use value::Value;
