//! Annotated declaration syntax.
//!
//! The generator reads ordinary Rust struct declarations whose named fields
//! may carry a metadata chain after their type:
//!
//! ```text
//! #[geo]
//! #[derive(Debug)]
//! pub struct Point {
//!     pub x: f64 | "X" | "cm",
//!     pub y: f64,
//! }
//! ```
//!
//! Retrofit tables name an existing type and list metadata per field without
//! redeclaring it: `Point { x: "X" | "cm", y: _ }`.

use proc_macro2::{Ident, TokenStream};
use quote::{ToTokens, TokenStreamExt};
use syn::ext::IdentExt;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{Attribute, Generics, Token, Type, Visibility, braced, token};

use crate::peel::MetaChain;


/// Bare name of an identifier, without any `r#` prefix.
pub(crate) fn bare_name(ident: &Ident) -> String {
    ident.unraw().to_string()
}

/// Outer attributes followed by an optional struct declaration.
///
/// This is the raw shape of annotated input before the locator has told
/// wrapper annotations apart from ordinary attributes.
#[derive(Debug, Clone)]
pub struct Item {
    /// Every outer attribute, in source order.
    pub attrs: Vec<Attribute>,
    /// The declaration, if the input contains one.
    pub decl: Option<StructDecl>,
}

impl Parse for Item {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let decl = if input.is_empty() {
            None
        } else {
            Some(input.parse()?)
        };
        Ok(Self { attrs, decl })
    }
}

/// A named field with its remaining metadata chain.
#[derive(Debug, Clone)]
pub struct MetaField {
    /// Field attributes such as doc comments.
    pub attrs: Vec<Attribute>,
    /// Field visibility.
    pub vis: Visibility,
    /// Field name.
    pub ident: Ident,
    /// The `:` separating name and type.
    pub colon_token: Token![:],
    /// Declared base type.
    pub ty: Type,
    /// Metadata layers not yet consumed.
    pub chain: MetaChain,
}

impl Parse for MetaField {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        Ok(Self {
            attrs: input.call(Attribute::parse_outer)?,
            vis: input.parse()?,
            ident: input.call(Ident::parse_any)?,
            colon_token: input.parse()?,
            ty: input.parse()?,
            chain: MetaChain::parse_piped(input)?,
        })
    }
}

impl ToTokens for MetaField {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        tokens.append_all(&self.attrs);
        self.vis.to_tokens(tokens);
        self.ident.to_tokens(tokens);
        self.colon_token.to_tokens(tokens);
        self.ty.to_tokens(tokens);
        self.chain.to_tokens(tokens);
    }
}

/// Body of a declaration: braced named fields, or a unit struct.
#[derive(Debug, Clone)]
pub enum Body {
    /// `{ a: T | ..., b: U }`
    Named {
        /// The braces around the fields.
        brace_token: token::Brace,
        /// Fields in declaration order.
        fields: Punctuated<MetaField, Token![,]>,
    },
    /// `;`
    Unit(Token![;]),
}

/// A struct declaration whose fields may carry metadata chains.
#[derive(Debug, Clone)]
pub struct StructDecl {
    /// Ordinary outer attributes kept on the emitted declaration.
    pub attrs: Vec<Attribute>,
    /// Struct visibility.
    pub vis: Visibility,
    /// The `struct` keyword.
    pub struct_token: Token![struct],
    /// Type name.
    pub ident: Ident,
    /// Generic parameters and where clause.
    pub generics: Generics,
    /// Field block.
    pub body: Body,
}

impl StructDecl {
    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &MetaField> {
        let fields = match &self.body {
            Body::Named { fields, .. } => Some(fields.iter()),
            Body::Unit(_) => None,
        };
        fields.into_iter().flatten()
    }

    /// Mutable fields in declaration order.
    pub fn fields_mut(&mut self) -> impl Iterator<Item = &mut MetaField> {
        let fields = match &mut self.body {
            Body::Named { fields, .. } => Some(fields.iter_mut()),
            Body::Unit(_) => None,
        };
        fields.into_iter().flatten()
    }

    /// Field names in declaration order.
    #[must_use]
    pub fn field_names(&self) -> Vec<String> {
        self.fields().map(|field| bare_name(&field.ident)).collect()
    }

    /// Bare type name.
    #[must_use]
    pub fn type_name(&self) -> String {
        bare_name(&self.ident)
    }

    /// The first field that still carries metadata layers.
    #[must_use]
    pub fn first_unconsumed(&self) -> Option<&MetaField> {
        self.fields().find(|field| !field.chain.is_empty())
    }
}

impl Parse for StructDecl {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let vis = input.parse()?;
        let struct_token = input.parse()?;
        let ident = input.parse()?;
        let mut generics: Generics = input.parse()?;
        generics.where_clause = input.parse()?;

        let lookahead = input.lookahead1();
        let body = if lookahead.peek(Token![;]) {
            Body::Unit(input.parse()?)
        } else if lookahead.peek(token::Brace) {
            let content;
            let brace_token = braced!(content in input);
            let fields = content.parse_terminated(MetaField::parse, Token![,])?;
            Body::Named {
                brace_token,
                fields,
            }
        } else if input.peek(token::Paren) {
            return Err(input.error("field metadata requires a struct with named fields"));
        } else {
            return Err(lookahead.error());
        };

        Ok(Self {
            attrs,
            vis,
            struct_token,
            ident,
            generics,
            body,
        })
    }
}

impl ToTokens for StructDecl {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        tokens.append_all(&self.attrs);
        self.vis.to_tokens(tokens);
        self.struct_token.to_tokens(tokens);
        self.ident.to_tokens(tokens);
        self.generics.to_tokens(tokens);
        self.generics.where_clause.to_tokens(tokens);
        match &self.body {
            Body::Named {
                brace_token,
                fields,
            } => brace_token.surround(tokens, |inner| fields.to_tokens(inner)),
            Body::Unit(semi) => semi.to_tokens(tokens),
        }
    }
}

/// A declaration to emit, headed by the annotations still to be applied.
#[derive(Debug, Clone)]
pub struct Declaration {
    /// Pending annotation names, outermost first.
    pub wrappers: Vec<Ident>,
    /// The declaration itself.
    pub decl: StructDecl,
}

impl Declaration {
    /// Removes and returns the outermost pending annotation.
    pub fn pop_outer(&mut self) -> Option<Ident> {
        if self.wrappers.is_empty() {
            None
        } else {
            Some(self.wrappers.remove(0))
        }
    }
}

impl ToTokens for Declaration {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        for wrapper in &self.wrappers {
            tokens.extend(quote::quote!(#[#wrapper]));
        }
        self.decl.to_tokens(tokens);
    }
}

/// One row of a retrofit table: `field: a | b`.
#[derive(Debug, Clone)]
pub struct TableRow {
    /// Field name.
    pub ident: Ident,
    /// The `:` separating name and chain.
    pub colon_token: Token![:],
    /// Metadata layers for the field.
    pub chain: MetaChain,
}

impl Parse for TableRow {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        Ok(Self {
            ident: input.call(Ident::parse_any)?,
            colon_token: input.parse()?,
            chain: MetaChain::parse_bare(input)?,
        })
    }
}

/// Metadata for a type declared elsewhere: `Point { x: "X", y: _ | "mm" }`.
#[derive(Debug, Clone)]
pub struct RetrofitTable {
    /// Name of the existing type.
    pub ident: Ident,
    /// The braces around the rows.
    pub brace_token: token::Brace,
    /// Rows in table order.
    pub rows: Punctuated<TableRow, Token![,]>,
}

impl RetrofitTable {
    /// Bare type name.
    #[must_use]
    pub fn type_name(&self) -> String {
        bare_name(&self.ident)
    }
}

impl Parse for RetrofitTable {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let content;
        Ok(Self {
            ident: input.parse()?,
            brace_token: braced!(content in input),
            rows: content.parse_terminated(TableRow::parse, Token![,])?,
        })
    }
}
