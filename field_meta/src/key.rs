//! Type and field identities used as registry keys.

use std::borrow::Borrow;
use std::fmt;

/// Identity of an annotated type.
///
/// Keys are the bare type name, which is what the generator sees in a
/// declaration. [`TypeKey::of`] derives the same key from a Rust type by
/// dropping the module path and any generic arguments, so a registry filled
/// at generation time answers lookups made with concrete types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(String);

impl TypeKey {
    /// Creates a key from a declared type name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates the key for the Rust type `T`.
    ///
    /// ```
    /// use field_meta::TypeKey;
    ///
    /// struct Sample<T>(T);
    ///
    /// assert_eq!(TypeKey::of::<Sample<u8>>(), TypeKey::named("Sample"));
    /// ```
    #[must_use]
    pub fn of<T: ?Sized>() -> Self {
        Self::named(bare_type_name(std::any::type_name::<T>()))
    }

    /// Creates the key for the type of `value`.
    #[must_use]
    pub fn of_val<T: ?Sized>(_value: &T) -> Self {
        Self::of::<T>()
    }

    /// Returns the type name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Strips the module path and generic arguments from a `type_name` string.
fn bare_type_name(full: &str) -> &str {
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for TypeKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeKey {
    fn from(value: &str) -> Self {
        Self::named(value)
    }
}

impl From<String> for TypeKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&TypeKey> for TypeKey {
    fn from(value: &TypeKey) -> Self {
        value.clone()
    }
}

/// Type-level marker wrapping a field name.
///
/// Lookups accept either a plain name or this marker, so call sites that
/// carry field identities around as values read the same as literal names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Field<'a>(pub &'a str);

/// Anything that names a field of an annotated type.
pub trait FieldKey {
    /// The field name this key resolves to.
    fn field_name(&self) -> &str;
}

impl FieldKey for str {
    fn field_name(&self) -> &str {
        self
    }
}

impl FieldKey for String {
    fn field_name(&self) -> &str {
        self
    }
}

impl FieldKey for Field<'_> {
    fn field_name(&self) -> &str {
        self.0
    }
}

impl<K: FieldKey + ?Sized> FieldKey for &K {
    fn field_name(&self) -> &str {
        (**self).field_name()
    }
}
