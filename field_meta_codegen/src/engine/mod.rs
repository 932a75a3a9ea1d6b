//! Generation engine.
//!
//! The engine owns the annotation registry (annotation name to channel or
//! chain), the runtime registries it fills while expanding, and the emitter
//! used to render the final source unit. Every expansion is committed
//! atomically: either all of its accessor entries are registered or none are.

use std::collections::BTreeMap;

use field_meta::{FieldKey, MetaResult, Registries, Registry, Value};
use heck::ToSnakeCase;
use proc_macro2::{Ident, TokenStream};
use tracing::debug;

use crate::chain::Chain;
use crate::channel::{Annotate, Channel, ensure_consumed, ensure_unique, peel_declaration};
use crate::config::CodegenConfig;
use crate::emit::{Emitter, Expansion};
use crate::error::{CodegenError, CodegenResult};
use crate::locate::locate;
use crate::syntax::{Item, RetrofitTable, bare_name};


/// Default prefix of update annotation names.
pub const DEFAULT_UPDATE_PREFIX: &str = "update_";

/// Handle to a channel registered with an [`Engine`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelHandle {
    name: String,
    update: String,
}

impl ChannelHandle {
    /// Standalone annotation name, also the channel name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Update annotation name.
    #[must_use]
    pub fn update_name(&self) -> &str {
        &self.update
    }
}

impl AsRef<str> for ChannelHandle {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

/// Handle to a chain registered with an [`Engine`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChainHandle {
    name: String,
    update: String,
    members: Vec<String>,
}

impl ChainHandle {
    /// Standalone annotation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Update annotation name.
    #[must_use]
    pub fn update_name(&self) -> &str {
        &self.update
    }

    /// Member channel names after flattening, in application order.
    #[must_use]
    pub fn members(&self) -> &[String] {
        &self.members
    }
}

impl AsRef<str> for ChainHandle {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Standalone,
    Update,
}

#[derive(Debug, Clone)]
enum Target {
    Channel(Channel),
    Chain(Chain),
}

impl Annotate for Target {
    fn annotation_name(&self) -> &str {
        match self {
            Self::Channel(channel) => channel.annotation_name(),
            Self::Chain(chain) => chain.annotation_name(),
        }
    }

    fn members(&self) -> &[Channel] {
        match self {
            Self::Channel(channel) => channel.members(),
            Self::Chain(chain) => chain.members(),
        }
    }
}

#[derive(Debug, Clone)]
struct Binding {
    mode: Mode,
    target: Target,
}

/// Expands annotated declarations and keeps the resulting registries.
#[derive(Debug)]
pub struct Engine {
    emitter: Emitter,
    update_prefix: String,
    channels: Vec<Channel>,
    annotations: BTreeMap<String, Binding>,
    registries: Registries,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Creates an engine with the default emitter and update prefix.
    #[must_use]
    pub fn new() -> Self {
        Self::with_emitter(Emitter::default(), DEFAULT_UPDATE_PREFIX)
    }

    /// Creates an engine rendering through `emitter` and naming update
    /// annotations `<update_prefix><name>`.
    #[must_use]
    pub fn with_emitter(emitter: Emitter, update_prefix: &str) -> Self {
        Self {
            emitter,
            update_prefix: update_prefix.to_owned(),
            channels: Vec::new(),
            annotations: BTreeMap::new(),
            registries: Registries::new(),
        }
    }

    /// Creates an engine from configuration, declaring its channels and then
    /// its chains in order.
    ///
    /// # Errors
    ///
    /// Fails when the configured crate path or function name is not valid
    /// Rust, or when a configured channel or chain cannot be registered.
    pub fn from_config(config: &CodegenConfig) -> CodegenResult<Self> {
        let mut engine = Self::with_emitter(config.emitter()?, &config.update_prefix);
        for channel in &config.channels {
            engine.new_channel(&channel.name, channel.default.clone())?;
        }
        for chain in &config.chains {
            engine.new_chain(&chain.name, &chain.members)?;
        }
        Ok(engine)
    }

    /// Declares a channel and registers its standalone and update
    /// annotations.
    ///
    /// # Errors
    ///
    /// Returns [`CodegenError::DuplicateAnnotation`] when either annotation
    /// name is already taken.
    pub fn new_channel(
        &mut self,
        name: &str,
        default: impl Into<Value>,
    ) -> CodegenResult<ChannelHandle> {
        let channel = Channel::new(name, default);
        let handle = ChannelHandle {
            name: channel.name().to_owned(),
            update: self.update_name(channel.name()),
        };
        self.ensure_free(&handle.name)?;
        self.ensure_free(&handle.update)?;

        self.registries
            .declare_channel(channel.name(), channel.default_value().clone());
        self.bind(&handle.name, &handle.update, &Target::Channel(channel.clone()));
        debug!(
            channel = channel.name(),
            default = %channel.default_value(),
            "registered channel"
        );
        self.channels.push(channel);
        Ok(handle)
    }

    /// Composes existing channels or chains into one annotation. Chain
    /// members are flattened in order.
    ///
    /// # Errors
    ///
    /// Returns [`CodegenError::EmptyChain`] for an empty member list,
    /// [`CodegenError::UnknownAnnotation`] for a member that is not a
    /// registered channel or chain, and [`CodegenError::DuplicateAnnotation`]
    /// when the chain's names are already taken.
    pub fn new_chain<I>(&mut self, name: &str, members: I) -> CodegenResult<ChainHandle>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut flattened = Vec::new();
        for member in members {
            let member_name = member.as_ref().to_snake_case();
            let binding = self
                .annotations
                .get(&member_name)
                .filter(|binding| binding.mode == Mode::Standalone)
                .ok_or(CodegenError::UnknownAnnotation { name: member_name })?;
            flattened.extend_from_slice(binding.target.members());
        }

        let chain = Chain::compose(name, flattened)?;
        let handle = ChainHandle {
            name: chain.name().to_owned(),
            update: self.update_name(chain.name()),
            members: chain
                .members()
                .iter()
                .map(|channel| channel.name().to_owned())
                .collect(),
        };
        self.ensure_free(&handle.name)?;
        self.ensure_free(&handle.update)?;

        self.bind(&handle.name, &handle.update, &Target::Chain(chain));
        debug!(chain = %handle.name, members = ?handle.members, "registered chain");
        Ok(handle)
    }

    /// Whether `name` is a registered standalone or update annotation.
    #[must_use]
    pub fn is_annotation(&self, name: &str) -> bool {
        self.annotations.contains_key(name)
    }

    /// Applies the outermost wrapper of `tokens` once.
    ///
    /// A standalone annotation re-emits the declaration with the remaining
    /// wrappers still attached; an update annotation emits no declaration.
    /// Input without wrappers is returned unchanged.
    ///
    /// # Errors
    ///
    /// Fails on malformed input, when no declaration is found, and when an
    /// accessor entry would be registered twice. Fails with
    /// [`CodegenError::UnconsumedMetadata`] when metadata layers would be
    /// emitted on a declaration no wrapper is left to process, or dropped
    /// along with it.
    pub fn expand(&mut self, tokens: TokenStream) -> CodegenResult<Expansion> {
        let item: Item = syn::parse2(tokens)?;
        let mut target = locate(item, |name| self.is_annotation(name))?;
        let Some(wrapper) = target.pop_outer() else {
            ensure_consumed(&target)?;
            return Ok(Expansion::declaration_only(target));
        };
        let binding = self.binding(&wrapper)?;
        let expansion = match binding.mode {
            Mode::Standalone => binding.target.build_standalone(target)?,
            Mode::Update => binding.target.build_update(target)?,
        };
        if let Some(declaration) = &expansion.declaration
            && declaration.wrappers.is_empty()
        {
            ensure_consumed(declaration)?;
        }
        self.commit(&expansion)?;
        Ok(expansion)
    }

    /// Applies every wrapper of `tokens`, outermost first.
    ///
    /// The cleaned declaration is emitted once at the end unless an update
    /// annotation took part.
    ///
    /// # Errors
    ///
    /// As for [`Engine::expand`]: [`CodegenError::UnconsumedMetadata`] is
    /// raised when metadata layers are left on a field once every wrapper
    /// ran, whether or not the declaration is emitted.
    pub fn expand_all(&mut self, tokens: TokenStream) -> CodegenResult<Expansion> {
        let item: Item = syn::parse2(tokens)?;
        let mut target = locate(item, |name| self.is_annotation(name))?;
        let mut layouts = Vec::new();
        let mut accessors = Vec::new();
        let mut updated = false;

        while let Some(wrapper) = target.pop_outer() {
            let binding = self.binding(&wrapper)?;
            let pass = peel_declaration(binding.target.members(), target)?;
            debug!(
                annotation = binding.target.annotation_name(),
                type_name = %pass.target.decl.ident,
                accessors = pass.accessors.len(),
                "applied wrapper"
            );
            updated |= binding.mode == Mode::Update;
            layouts.extend(pass.layouts);
            accessors.extend(pass.accessors);
            target = pass.target;
        }
        ensure_unique(&accessors)?;
        ensure_consumed(&target)?;

        let declaration = (!updated).then_some(target);
        let expansion = Expansion {
            declaration,
            layouts,
            accessors,
        };
        self.commit(&expansion)?;
        Ok(expansion)
    }

    /// Applies `annotation` to the retrofit table in `tokens`.
    ///
    /// A type declared on any channel keeps that layout; otherwise the table
    /// order is noted as the layout until a declaration replaces it.
    ///
    /// # Errors
    ///
    /// Fails on malformed input, for an unknown annotation, for a field the
    /// type's declared layout lacks, for a row with more layers than the
    /// annotation has members, and when an accessor entry would be
    /// registered twice.
    pub fn retrofit(
        &mut self,
        annotation: impl AsRef<str>,
        tokens: TokenStream,
    ) -> CodegenResult<Expansion> {
        let table: RetrofitTable = syn::parse2(tokens)?;
        let name = annotation.as_ref();
        let binding = self
            .annotations
            .get(name)
            .ok_or_else(|| CodegenError::UnknownAnnotation {
                name: name.to_owned(),
            })?;
        let type_name = table.type_name();
        let known_layout = self
            .registries
            .declared_fields(&type_name)
            .map(<[String]>::to_vec);
        let expansion = binding
            .target
            .build_retrofit(table, known_layout.as_deref())?;
        self.commit(&expansion)?;
        Ok(expansion)
    }

    /// The registry of one channel.
    #[must_use]
    pub fn registry(&self, channel: impl AsRef<str>) -> Option<&Registry> {
        self.registries.channel(channel.as_ref())
    }

    /// Every channel registry.
    #[must_use]
    pub const fn registries(&self) -> &Registries {
        &self.registries
    }

    /// Single-field lookup on one channel.
    ///
    /// # Errors
    ///
    /// As for [`Registries::lookup`].
    pub fn lookup(
        &self,
        channel: impl AsRef<str>,
        type_name: &str,
        key: impl FieldKey,
    ) -> MetaResult<&Value> {
        self.registries.lookup(channel.as_ref(), type_name, key)
    }

    /// Declared channels in registration order.
    #[must_use]
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Renders `expansions` and a registration function declaring every
    /// channel of this engine.
    #[must_use]
    pub fn render(&self, expansions: &[Expansion]) -> TokenStream {
        self.emitter.render(&self.channels, expansions)
    }

    fn update_name(&self, name: &str) -> String {
        format!("{}{name}", self.update_prefix)
    }

    fn ensure_free(&self, name: &str) -> CodegenResult<()> {
        if self.annotations.contains_key(name) {
            return Err(CodegenError::DuplicateAnnotation {
                name: name.to_owned(),
            });
        }
        Ok(())
    }

    fn bind(&mut self, name: &str, update: &str, target: &Target) {
        self.annotations.insert(
            name.to_owned(),
            Binding {
                mode: Mode::Standalone,
                target: target.clone(),
            },
        );
        self.annotations.insert(
            update.to_owned(),
            Binding {
                mode: Mode::Update,
                target: target.clone(),
            },
        );
    }

    fn binding(&self, wrapper: &Ident) -> CodegenResult<&Binding> {
        let name = bare_name(wrapper);
        self.annotations
            .get(&name)
            .ok_or(CodegenError::UnknownAnnotation { name })
    }

    /// Registers an expansion's layouts and accessor entries, or nothing if
    /// any layout conflicts or any entry collides with one already
    /// registered.
    fn commit(&mut self, expansion: &Expansion) -> CodegenResult<()> {
        ensure_unique(&expansion.accessors)?;
        for layout in expansion.layouts.iter().filter(|layout| layout.declared) {
            self.registries.channel_mut(&layout.channel)?;
            self.registries
                .check_layout(&layout.type_name, &layout.fields)?;
        }
        for def in &expansion.accessors {
            let registry = self.registries.channel_mut(&def.channel)?;
            if registry.contains(&def.type_name, &def.field) {
                return Err(CodegenError::duplicate(
                    &def.channel,
                    &def.type_name,
                    &def.field,
                ));
            }
        }

        for layout in &expansion.layouts {
            let type_name = layout.type_name.as_str();
            if layout.declared {
                self.registries
                    .declare_type(&layout.channel, type_name, &layout.fields)?;
            } else {
                self.registries
                    .note_fields(&layout.channel, type_name, &layout.fields)?;
            }
        }
        for def in &expansion.accessors {
            self.registries.define(
                &def.channel,
                def.type_name.as_str(),
                &def.field,
                def.value.clone(),
            )?;
        }
        debug!(
            layouts = expansion.layouts.len(),
            accessors = expansion.accessors.len(),
            "committed expansion"
        );
        Ok(())
    }
}
