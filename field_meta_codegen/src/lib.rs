//! Code generation for the `field_meta` runtime.
//!
//! Channels attach one literal value per field of a struct. Values are
//! written as a chain after each field's type and consumed one layer per
//! channel application:
//!
//! ```
//! use field_meta::Value;
//! use field_meta_codegen::Engine;
//! use quote::quote;
//!
//! let mut engine = Engine::new();
//! engine.new_channel("label", "")?;
//! engine.new_channel("unit", "m")?;
//! engine.new_chain("geo", ["label", "unit"])?;
//!
//! let expansion = engine.expand_all(quote! {
//!     #[geo]
//!     pub struct Point {
//!         pub x: f64 | "X" | "cm",
//!         pub y: f64,
//!     }
//! })?;
//! assert_eq!(expansion.accessors.len(), 2);
//! assert_eq!(engine.lookup("unit", "Point", "x")?, &Value::from("cm"));
//! assert_eq!(engine.lookup("unit", "Point", "y")?, &Value::from("m"));
//!
//! // One source unit: the cleaned struct and a registration function.
//! let source = engine.render(&[expansion]);
//! syn::parse2::<syn::File>(source)?;
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```

mod chain;
mod channel;
mod config;
mod emit;
mod engine;
mod error;
mod literal;
mod locate;
mod peel;
mod syntax;

pub use chain::Chain;
pub use channel::{Annotate, Channel};
pub use config::{ChainConfig, ChannelConfig, CodegenConfig, ENV_PREFIX};
pub use emit::{AccessorDef, Emitter, Expansion, LayoutDef, emit};
pub use engine::{ChainHandle, ChannelHandle, DEFAULT_UPDATE_PREFIX, Engine};
pub use error::{CodegenError, CodegenResult};
pub use locate::locate;
pub use peel::{Layer, MetaChain};
pub use syntax::{Body, Declaration, Item, MetaField, RetrofitTable, StructDecl, TableRow};
