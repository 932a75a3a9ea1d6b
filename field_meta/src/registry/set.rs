//! A named collection of channel registries.

use std::collections::BTreeMap;

use tracing::debug;

use super::Registry;
use crate::{FieldKey, MetaError, MetaResult, TypeKey, Value};

/// Registries for several channels, addressed by channel name.
///
/// Generated registration functions take a `&mut Registries` and fill it in;
/// callers needing separate metadata universes keep separate instances.
#[derive(Debug, Clone, Default)]
pub struct Registries {
    channels: BTreeMap<String, Registry>,
}

impl Registries {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            channels: BTreeMap::new(),
        }
    }

    /// Returns the registry for `name`, creating it with `default` if absent.
    ///
    /// An existing registry keeps its original default.
    pub fn declare_channel(&mut self, name: &str, default: Value) -> &mut Registry {
        self.channels.entry(name.to_owned()).or_insert_with(|| {
            debug!(channel = name, default = %default, "declared metadata channel");
            Registry::new(name, default)
        })
    }

    /// The registry for `name`, if declared.
    #[must_use]
    pub fn channel(&self, name: &str) -> Option<&Registry> {
        self.channels.get(name)
    }

    /// Mutable access to the registry for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::UnknownChannel`] when the channel was never declared.
    pub fn channel_mut(&mut self, name: &str) -> MetaResult<&mut Registry> {
        self.channels
            .get_mut(name)
            .ok_or_else(|| MetaError::UnknownChannel {
                channel: name.to_owned(),
            })
    }

    /// Records the declared field layout of `ty` on `channel`.
    ///
    /// Channels that only know `ty` from retrofit rows take the declared
    /// layout as well. Nothing is recorded unless every affected channel
    /// accepts it.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::UnknownChannel`] when the channel was never
    /// declared, and the errors of [`Registries::check_layout`].
    pub fn declare_type<I, S>(&mut self, channel: &str, ty: impl Into<TypeKey>, fields: I) -> MetaResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let key = ty.into();
        let layout: Vec<String> = fields.into_iter().map(|f| f.as_ref().to_owned()).collect();
        self.channel_mut(channel)?;
        self.check_layout(key.as_str(), &layout)?;
        for registry in self.channels.values_mut() {
            let noted = registry.knows_type(key.as_str())
                && registry.declared_fields(key.as_str()).is_none();
            if noted || registry.channel() == channel {
                registry.declare_type(&key, &layout)?;
            }
        }
        Ok(())
    }

    /// Checks that `ty` may be declared with `fields` on every channel that
    /// already knows it.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::LayoutConflict`] when a channel holds a different
    /// declared layout, and [`MetaError::UnknownField`] when retrofit rows
    /// name a field outside `fields`.
    pub fn check_layout<S: AsRef<str>>(&self, ty: &str, fields: &[S]) -> MetaResult<()> {
        self.channels
            .values()
            .try_for_each(|registry| registry.check_layout(ty, fields))
    }

    /// Notes fields of `ty` seen in retrofit rows on `channel`.
    ///
    /// A layout declared on another channel is adopted first, so the rows
    /// are checked against it.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::UnknownChannel`] when the channel was never
    /// declared, and the errors of [`Registry::note_fields`].
    pub fn note_fields<I, S>(&mut self, channel: &str, ty: impl Into<TypeKey>, fields: I) -> MetaResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let key = ty.into();
        let declared = self.declared_fields(key.as_str()).map(<[String]>::to_vec);
        let registry = self.channel_mut(channel)?;
        if let Some(layout) = declared
            && registry.declared_fields(key.as_str()).is_none()
        {
            registry.declare_type(&key, layout)?;
        }
        registry.note_fields(key, fields)
    }

    /// The declared layout of `ty` on any channel.
    #[must_use]
    pub fn declared_fields(&self, ty: &str) -> Option<&[String]> {
        self.channels
            .values()
            .find_map(|registry| registry.declared_fields(ty))
    }

    /// Registers an explicit value on `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::UnknownChannel`] for an undeclared channel and
    /// [`MetaError::DuplicateFieldMetadata`] for a key that already has an
    /// entry.
    pub fn define(
        &mut self,
        channel: &str,
        ty: impl Into<TypeKey>,
        field: &str,
        value: Value,
    ) -> MetaResult<()> {
        self.channel_mut(channel)?.define(ty, field, value)
    }

    /// Looks up one field on `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::UnknownChannel`] for an undeclared channel, or the
    /// errors of [`Registry::get`].
    pub fn lookup(&self, channel: &str, ty: &str, key: impl FieldKey) -> MetaResult<&Value> {
        self.channel(channel)
            .ok_or_else(|| MetaError::UnknownChannel {
                channel: channel.to_owned(),
            })?
            .get(ty, key)
    }

    /// Iterates the registries in channel-name order.
    pub fn iter(&self) -> impl Iterator<Item = &Registry> {
        self.channels.values()
    }

    /// Number of declared channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether no channel has been declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
