//! Per-channel accessor registries.
//!
//! A [`Registry`] holds every accessor entry of one metadata channel, keyed by
//! (type, field), together with the field layout of each type the channel
//! has seen. Registries grow while declarations are processed and are only
//! read afterwards.
//!
//! A layout is either *declared*, taken from the type's own declaration and
//! fixed from then on, or *noted*, pieced together from retrofit rows for a
//! type whose declaration has not been seen. A declaration replaces a noted
//! layout; declaring a type again with different fields is a conflict.

use std::collections::BTreeMap;
use std::collections::HashMap;

use tracing::{debug, trace};

use crate::{Field, FieldKey, MetaError, MetaResult, TypeKey, Value};

mod set;
#[cfg(test)]
mod tests;

pub use set::Registries;

/// Field layout and explicit values recorded for one type.
#[derive(Debug, Clone, Default)]
struct TypeTable {
    layout: Vec<String>,
    declared: bool,
    values: HashMap<String, Value>,
}

impl TypeTable {
    fn declares(&self, field: &str) -> bool {
        self.layout.iter().any(|name| name == field)
    }

    fn note_field(&mut self, field: &str) {
        if !self.declares(field) {
            self.layout.push(field.to_owned());
        }
    }
}

/// Accessor entries for a single metadata channel.
///
/// # Examples
///
/// ```
/// use field_meta::{Field, Registry, Value};
///
/// let mut size = Registry::new("size", Value::from(0));
/// size.declare_type("Crate", ["w", "h"])?;
/// size.define("Crate", "w", Value::from(5))?;
///
/// assert_eq!(size.get("Crate", "w")?, &Value::from(5));
/// assert_eq!(size.get("Crate", Field("h"))?, &Value::from(0));
/// assert_eq!(size.get_all("Crate"), [&Value::from(5), &Value::from(0)]);
/// # Ok::<_, field_meta::MetaError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Registry {
    channel: String,
    default: Value,
    types: BTreeMap<TypeKey, TypeTable>,
}

impl Registry {
    /// Creates an empty registry for `channel` with its default value.
    #[must_use]
    pub fn new(channel: impl Into<String>, default: Value) -> Self {
        Self {
            channel: channel.into(),
            default,
            types: BTreeMap::new(),
        }
    }

    /// Name of the channel this registry serves.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// The value returned for fields without an explicit entry.
    #[must_use]
    pub const fn default_value(&self) -> &Value {
        &self.default
    }

    /// Records the declared field layout of `ty`.
    ///
    /// The first declaration fixes the layout, replacing any layout noted
    /// from retrofit rows. Repeating the same declaration is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::LayoutConflict`] when `ty` was already declared
    /// with different fields, and [`MetaError::UnknownField`] when a noted
    /// entry names a field the declaration lacks.
    pub fn declare_type<I, S>(&mut self, ty: impl Into<TypeKey>, fields: I) -> MetaResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let key = ty.into();
        let layout: Vec<String> = fields.into_iter().map(|f| f.as_ref().to_owned()).collect();
        self.check_layout(key.as_str(), &layout)?;
        let table = self.types.entry(key).or_default();
        table.layout = layout;
        table.declared = true;
        Ok(())
    }

    /// Checks that declaring `ty` with `fields` would succeed, without
    /// recording anything.
    ///
    /// # Errors
    ///
    /// As for [`Registry::declare_type`].
    pub fn check_layout<S: AsRef<str>>(&self, ty: &str, fields: &[S]) -> MetaResult<()> {
        let Some(table) = self.types.get(ty) else {
            return Ok(());
        };
        let same = table.layout.len() == fields.len()
            && table.layout.iter().zip(fields).all(|(a, b)| a == b.as_ref());
        if table.declared {
            if same {
                return Ok(());
            }
            return Err(MetaError::LayoutConflict {
                channel: self.channel.clone(),
                type_name: ty.to_owned(),
                declared: table.layout.clone(),
                found: fields.iter().map(|f| f.as_ref().to_owned()).collect(),
            });
        }
        let stray = table
            .values
            .keys()
            .find(|field| !fields.iter().any(|f| f.as_ref() == field.as_str()));
        match stray {
            Some(field) => Err(self.unknown_field(ty, field)),
            None => Ok(()),
        }
    }

    /// Notes fields of `ty` seen in retrofit rows.
    ///
    /// Unseen names are appended while the type is undeclared; once declared,
    /// every name must belong to the declared layout.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::UnknownField`] for a name outside a declared
    /// layout.
    pub fn note_fields<I, S>(&mut self, ty: impl Into<TypeKey>, fields: I) -> MetaResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let key = ty.into();
        let names: Vec<S> = fields.into_iter().collect();
        if let Some(table) = self.types.get(key.as_str())
            && table.declared
        {
            return match names.iter().find(|name| !table.declares(name.as_ref())) {
                Some(name) => Err(self.unknown_field(key.as_str(), name.as_ref())),
                None => Ok(()),
            };
        }
        let table = self.types.entry(key).or_default();
        for name in &names {
            table.note_field(name.as_ref());
        }
        Ok(())
    }

    /// Registers an explicit value for `field` of `ty`.
    ///
    /// A field missing from a noted layout is appended to it.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::DuplicateFieldMetadata`] when the field already
    /// has an entry on this channel, and [`MetaError::UnknownField`] when
    /// `ty` is declared without `field`.
    pub fn define(&mut self, ty: impl Into<TypeKey>, field: &str, value: Value) -> MetaResult<()> {
        let key = ty.into();
        if self.contains(key.as_str(), field) {
            return Err(MetaError::DuplicateFieldMetadata {
                channel: self.channel.clone(),
                type_name: key.to_string(),
                field: field.to_owned(),
            });
        }
        if let Some(table) = self.types.get(key.as_str())
            && table.declared
            && !table.declares(field)
        {
            return Err(self.unknown_field(key.as_str(), field));
        }
        debug!(
            channel = %self.channel,
            type_name = %key,
            field,
            kind = value.kind(),
            "registered field metadata"
        );
        let table = self.types.entry(key).or_default();
        table.note_field(field);
        table.values.insert(field.to_owned(), value);
        Ok(())
    }

    /// Whether an explicit entry exists for `field` of `ty`.
    #[must_use]
    pub fn contains(&self, ty: &str, field: &str) -> bool {
        self.types
            .get(ty)
            .is_some_and(|table| table.values.contains_key(field))
    }

    /// Whether the channel has seen `ty` at all.
    #[must_use]
    pub fn knows_type(&self, ty: &str) -> bool {
        self.types.contains_key(ty)
    }

    /// The recorded field layout of `ty`, in declaration order.
    #[must_use]
    pub fn fields(&self, ty: &str) -> Option<&[String]> {
        self.types.get(ty).map(|table| table.layout.as_slice())
    }

    /// The layout of `ty` if it comes from a declaration rather than from
    /// retrofit rows.
    #[must_use]
    pub fn declared_fields(&self, ty: &str) -> Option<&[String]> {
        self.types
            .get(ty)
            .filter(|table| table.declared)
            .map(|table| table.layout.as_slice())
    }

    /// Looks up the value of one field.
    ///
    /// Known fields without an entry resolve to the channel default. A type
    /// the channel has never seen, or only knows from retrofit rows, also
    /// resolves to the default, which makes this the universal fallback for
    /// arbitrary keys.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::UnknownField`] when `ty` is declared but does not
    /// declare the requested field.
    pub fn get(&self, ty: &str, key: impl FieldKey) -> MetaResult<&Value> {
        let field = key.field_name();
        let Some(table) = self.types.get(ty) else {
            trace!(channel = %self.channel, type_name = ty, field, "unregistered type, using default");
            return Ok(&self.default);
        };
        if let Some(value) = table.values.get(field) {
            return Ok(value);
        }
        if table.declares(field) || !table.declared {
            Ok(&self.default)
        } else {
            Err(self.unknown_field(ty, field))
        }
    }

    /// Looks up a field of the Rust type `T`.
    ///
    /// # Errors
    ///
    /// See [`Registry::get`].
    pub fn get_for<T: ?Sized>(&self, key: impl FieldKey) -> MetaResult<&Value> {
        self.get(TypeKey::of::<T>().as_str(), key)
    }

    /// Looks up a field of the type of `instance`.
    ///
    /// # Errors
    ///
    /// See [`Registry::get`].
    pub fn get_of<T: ?Sized>(&self, instance: &T, key: impl FieldKey) -> MetaResult<&Value> {
        self.get(TypeKey::of_val(instance).as_str(), key)
    }

    /// Values of every field of `ty`, in declaration order.
    ///
    /// Types with no fields, and types the channel has never seen, yield an
    /// empty list.
    #[must_use]
    pub fn get_all(&self, ty: &str) -> Vec<&Value> {
        self.types.get(ty).map_or_else(Vec::new, |table| {
            table
                .layout
                .iter()
                .map(|field| table.values.get(field).unwrap_or(&self.default))
                .collect()
        })
    }

    /// Values of every field of the Rust type `T`, in declaration order.
    #[must_use]
    pub fn get_all_for<T: ?Sized>(&self) -> Vec<&Value> {
        self.get_all(TypeKey::of::<T>().as_str())
    }

    /// The channel default, regardless of type or field.
    #[must_use]
    pub const fn fallback(&self) -> &Value {
        &self.default
    }

    /// Iterates explicit entries as `(type, field, value)`, types in name
    /// order and fields in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (&TypeKey, Field<'_>, &Value)> {
        self.types.iter().flat_map(|(ty, table)| {
            table.layout.iter().filter_map(move |field| {
                table
                    .values
                    .get(field)
                    .map(|value| (ty, Field(field.as_str()), value))
            })
        })
    }

    /// Number of explicit entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.values().map(|table| table.values.len()).sum()
    }

    /// Whether the registry holds no explicit entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn unknown_field(&self, ty: &str, field: &str) -> MetaError {
        MetaError::UnknownField {
            channel: self.channel.clone(),
            type_name: ty.to_owned(),
            field: field.to_owned(),
        }
    }
}
