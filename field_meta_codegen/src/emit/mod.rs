//! Code emitter.
//!
//! Every resolved (type, field, channel, value) becomes an [`AccessorDef`]:
//! one self-contained registration statement. Statements for different
//! fields never touch each other, so emitting an accessor for one field can
//! not shadow or remove the accessor of another. The [`Emitter`] renders
//! expansions into a source unit with a single registration function.

use field_meta::Value;
use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;

use crate::channel::Channel;
use crate::literal::value_from_expr;
use crate::syntax::{Declaration, bare_name};

#[cfg(test)]
mod tests;

/// A registered (type, field, channel) fact with an explicit value.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessorDef {
    /// Channel the value belongs to.
    pub channel: String,
    /// Declared type name.
    pub type_name: String,
    /// Field name.
    pub field: String,
    /// Explicit value.
    pub value: Value,
}

impl AccessorDef {
    /// The dispatch key of this definition.
    #[must_use]
    pub fn key(&self) -> (&str, &str, &str) {
        (&self.channel, &self.type_name, &self.field)
    }
}

/// Field layout of a type as seen by one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutDef {
    /// Channel recording the layout.
    pub channel: String,
    /// Declared type name.
    pub type_name: String,
    /// Field names in declaration order.
    pub fields: Vec<String>,
    /// Whether the layout comes from the type's declaration. Layouts from
    /// retrofit tables are only noted and give way to a later declaration.
    pub declared: bool,
}

/// Output of one annotation application.
#[derive(Debug, Clone, Default)]
pub struct Expansion {
    /// The declaration to emit, if this application emits one.
    pub declaration: Option<Declaration>,
    /// Layouts recorded for whole-type lookups.
    pub layouts: Vec<LayoutDef>,
    /// Accessor definitions, one per explicit (type, field, channel).
    pub accessors: Vec<AccessorDef>,
}

impl Expansion {
    /// An expansion that only re-emits `declaration`.
    #[must_use]
    pub fn declaration_only(declaration: Declaration) -> Self {
        Self {
            declaration: Some(declaration),
            ..Self::default()
        }
    }

    /// Names of the channels this expansion touches, in first-seen order.
    #[must_use]
    pub fn channels(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        let layout_channels = self.layouts.iter().map(|layout| layout.channel.as_str());
        let accessor_channels = self.accessors.iter().map(|def| def.channel.as_str());
        for name in layout_channels.chain(accessor_channels) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

/// Builds the accessor definition for one explicit field value.
#[must_use]
pub fn emit(type_name: &Ident, field: &Ident, channel: &str, value: &syn::Expr) -> AccessorDef {
    AccessorDef {
        channel: channel.to_owned(),
        type_name: bare_name(type_name),
        field: bare_name(field),
        value: value_from_expr(value),
    }
}

/// Renders expansions as Rust source referring to the runtime crate.
#[derive(Debug, Clone)]
pub struct Emitter {
    crate_path: syn::Path,
    register_fn: Ident,
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new(
            syn::parse_quote!(::field_meta),
            Ident::new("register_field_meta", Span::call_site()),
        )
    }
}

impl Emitter {
    /// Creates an emitter that references the runtime through `crate_path`
    /// and names the registration function `register_fn`.
    #[must_use]
    pub const fn new(crate_path: syn::Path, register_fn: Ident) -> Self {
        Self {
            crate_path,
            register_fn,
        }
    }

    /// Tokens constructing `value` at runtime.
    #[must_use]
    pub fn value(&self, value: &Value) -> TokenStream {
        let krate = &self.crate_path;
        match value {
            Value::Bool(b) => quote!(#krate::Value::Bool(#b)),
            Value::Int(n) => quote!(#krate::Value::Int(#n)),
            Value::Float(n) if n.is_nan() => quote!(#krate::Value::Float(::core::f64::NAN)),
            Value::Float(n) if n.is_infinite() && n.is_sign_negative() => {
                quote!(#krate::Value::Float(::core::f64::NEG_INFINITY))
            }
            Value::Float(n) if n.is_infinite() => {
                quote!(#krate::Value::Float(::core::f64::INFINITY))
            }
            Value::Float(n) => quote!(#krate::Value::Float(#n)),
            Value::Str(s) => quote!(#krate::Value::Str(::std::string::String::from(#s))),
            Value::Char(c) => quote!(#krate::Value::Char(#c)),
            Value::Expr(e) => quote!(#krate::Value::Expr(::std::string::String::from(#e))),
        }
    }

    /// The registration statement for one accessor definition.
    #[must_use]
    pub fn accessor(&self, def: &AccessorDef) -> TokenStream {
        let AccessorDef {
            channel,
            type_name,
            field,
            value,
        } = def;
        let value_tokens = self.value(value);
        quote! {
            registries.define(#channel, #type_name, #field, #value_tokens)?;
        }
    }

    /// The layout statement for one type on one channel.
    #[must_use]
    pub fn layout(&self, layout: &LayoutDef) -> TokenStream {
        let LayoutDef {
            channel,
            type_name,
            fields,
            declared,
        } = layout;
        let method = if *declared {
            quote!(declare_type)
        } else {
            quote!(note_fields)
        };
        quote! {
            registries.#method(#channel, #type_name, &[#(#fields),*] as &[&str])?;
        }
    }

    /// The statement declaring `channel` with its default.
    #[must_use]
    pub fn channel(&self, channel: &Channel) -> TokenStream {
        let name = channel.name();
        let default = self.value(channel.default_value());
        quote! {
            registries.declare_channel(#name, #default);
        }
    }

    /// Renders a source unit: every emitted declaration followed by one
    /// registration function that declares `channels`, then all layouts, then
    /// all accessor definitions.
    #[must_use]
    pub fn render<'a, I>(&self, channels: I, expansions: &[Expansion]) -> TokenStream
    where
        I: IntoIterator<Item = &'a Channel>,
    {
        let krate = &self.crate_path;
        let register_fn = &self.register_fn;
        let declarations = expansions.iter().filter_map(|e| e.declaration.as_ref());
        let channel_stmts = channels.into_iter().map(|channel| self.channel(channel));
        let layout_stmts = expansions
            .iter()
            .flat_map(|e| &e.layouts)
            .map(|layout| self.layout(layout));
        let accessor_stmts = expansions
            .iter()
            .flat_map(|e| &e.accessors)
            .map(|def| self.accessor(def));

        quote! {
            #(#declarations)*

            /// Registers the field metadata generated for the declarations above.
            ///
            /// # Errors
            ///
            /// Fails when an entry for the same type, field and channel is
            /// already present in `registries`, or when a type is already
            /// declared there with other fields.
            pub fn #register_fn(
                registries: &mut #krate::Registries,
            ) -> #krate::MetaResult<()> {
                #(#channel_stmts)*
                #(#layout_stmts)*
                #(#accessor_stmts)*
                ::core::result::Result::Ok(())
            }
        }
    }
}
