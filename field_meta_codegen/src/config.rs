//! Code generation configuration.
//!
//! Settings are layered with figment: built-in defaults, then an optional
//! TOML file, then `FIELD_META_*` environment variables.
//!
//! ```toml
//! crate_path = "::field_meta"
//! register_fn = "register_field_meta"
//! update_prefix = "update_"
//!
//! [[channels]]
//! name = "label"
//! default = ""
//!
//! [[channels]]
//! name = "unit"
//! default = "m"
//!
//! [[chains]]
//! name = "geo"
//! members = ["label", "unit"]
//! ```

use std::path::Path;

use field_meta::Value;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use proc_macro2::Ident;
use serde::{Deserialize, Serialize};

use crate::emit::Emitter;
use crate::engine::DEFAULT_UPDATE_PREFIX;
use crate::error::{CodegenError, CodegenResult};

/// Prefix of environment variables read by [`CodegenConfig::figment`].
pub const ENV_PREFIX: &str = "FIELD_META_";

/// A channel declared through configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Channel name.
    pub name: String,
    /// Default value for fields without an explicit entry.
    ///
    /// Written as a plain scalar. Strings always load as [`Value::Str`], so
    /// `default = "c"` is the string `"c"`, never a `char`.
    pub default: Value,
}

/// A chain declared through configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Chain name.
    pub name: String,
    /// Member channel or chain names, in application order.
    pub members: Vec<String>,
}

/// Settings for an [`Engine`](crate::Engine) and its emitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodegenConfig {
    /// Path generated code uses to reach the runtime crate.
    pub crate_path: String,
    /// Name of the generated registration function.
    pub register_fn: String,
    /// Prefix of update annotation names.
    pub update_prefix: String,
    /// Channels to declare, in order.
    pub channels: Vec<ChannelConfig>,
    /// Chains to compose after the channels, in order.
    pub chains: Vec<ChainConfig>,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            crate_path: "::field_meta".to_owned(),
            register_fn: "register_field_meta".to_owned(),
            update_prefix: DEFAULT_UPDATE_PREFIX.to_owned(),
            channels: Vec::new(),
            chains: Vec::new(),
        }
    }
}

impl CodegenConfig {
    /// Builds the layered provider stack without extracting it.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut fig = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = file {
            fig = fig.merge(Toml::file(path));
        }
        fig.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Loads configuration from defaults, `file` and the environment.
    ///
    /// # Errors
    ///
    /// Returns [`CodegenError::Config`] when a source cannot be read or
    /// does not match the expected shape.
    pub fn load(file: Option<&Path>) -> CodegenResult<Self> {
        Self::from_figment(&Self::figment(file))
    }

    /// Extracts configuration from an arbitrary figment.
    ///
    /// # Errors
    ///
    /// Returns [`CodegenError::Config`] when extraction fails.
    pub fn from_figment(figment: &Figment) -> CodegenResult<Self> {
        figment
            .extract()
            .map_err(|err| CodegenError::Config(Box::new(err)))
    }

    /// Builds the emitter described by `crate_path` and `register_fn`.
    ///
    /// # Errors
    ///
    /// Returns [`CodegenError::Syntax`] when either setting is not valid
    /// Rust.
    pub fn emitter(&self) -> CodegenResult<Emitter> {
        let crate_path: syn::Path = syn::parse_str(&self.crate_path)?;
        let register_fn: Ident = syn::parse_str(&self.register_fn)?;
        Ok(Emitter::new(crate_path, register_fn))
    }
}
