//! Declaration locator.
//!
//! Annotated input arrives as outer attributes followed by a struct. Some of
//! those attributes are earlier metadata annotations still waiting to run;
//! the locator walks through all of them to reach the declaration, keeping
//! the pending annotations in order and leaving ordinary attributes on the
//! struct.

use proc_macro2::Ident;
use syn::{Attribute, Meta};

use crate::error::{CodegenError, CodegenResult};
use crate::syntax::{Declaration, Item, bare_name};

/// Returns the annotation name when `attr` is a bare `#[name]` that names a
/// known annotation. Raw identifiers match their plain spelling.
fn annotation_name<F>(attr: &Attribute, is_annotation: &F) -> CodegenResult<Option<Ident>>
where
    F: Fn(&str) -> bool,
{
    let Some(ident) = attr.path().get_ident() else {
        return Ok(None);
    };
    if !is_annotation(&bare_name(ident)) {
        return Ok(None);
    }
    match &attr.meta {
        Meta::Path(_) => Ok(Some(ident.clone())),
        Meta::List(_) | Meta::NameValue(_) => Err(syn::Error::new_spanned(
            attr,
            format!("metadata annotation `{ident}` takes no arguments"),
        )
        .into()),
    }
}

/// Finds the declaration inside `item`, separating pending annotations from
/// ordinary attributes.
///
/// # Errors
///
/// Returns [`CodegenError::NoDeclarationFound`] when the input holds no
/// struct, and a syntax error when a known annotation is given arguments.
pub fn locate<F>(item: Item, is_annotation: F) -> CodegenResult<Declaration>
where
    F: Fn(&str) -> bool,
{
    let mut wrappers = Vec::new();
    let mut ordinary = Vec::new();
    for attr in item.attrs {
        match annotation_name(&attr, &is_annotation)? {
            Some(name) => wrappers.push(name),
            None => ordinary.push(attr),
        }
    }

    let mut decl = item.decl.ok_or(CodegenError::NoDeclarationFound)?;
    ordinary.append(&mut decl.attrs);
    decl.attrs = ordinary;
    Ok(Declaration { wrappers, decl })
}

#[cfg(test)]
mod tests {
    use anyhow::{Result, anyhow, ensure};
    use quote::quote;
    use rstest::rstest;

    use super::locate;
    use crate::error::CodegenError;
    use crate::syntax::Item;

    fn known(name: &str) -> bool {
        matches!(name, "size" | "label" | "geo")
    }

    fn item(tokens: proc_macro2::TokenStream) -> Result<Item> {
        syn::parse2(tokens).map_err(|err| anyhow!(err))
    }

    #[rstest]
    fn descends_through_every_pending_annotation() -> Result<()> {
        let located = locate(
            item(quote! {
                #[geo]
                #[derive(Debug)]
                #[size]
                struct Crate { w: u32 | 5 | "X" }
            })?,
            known,
        )?;
        let wrappers: Vec<_> = located.wrappers.iter().map(ToString::to_string).collect();
        ensure!(wrappers == ["geo", "size"], "unexpected wrappers {wrappers:?}");
        ensure!(located.decl.attrs.len() == 1, "derive should stay on the struct");
        ensure!(located.decl.type_name() == "Crate", "type name");
        Ok(())
    }

    #[rstest]
    fn bare_declarations_have_no_wrappers() -> Result<()> {
        let located = locate(item(quote!(struct Crate { w: u32 }))?, known)?;
        ensure!(located.wrappers.is_empty(), "no wrappers expected");
        Ok(())
    }

    #[rstest]
    #[case(quote!(#[size] #[label]))]
    #[case(quote!())]
    fn wrapper_lists_without_a_struct_fail(
        #[case] tokens: proc_macro2::TokenStream,
    ) -> Result<()> {
        let result = locate(item(tokens)?, known);
        ensure!(
            matches!(result, Err(CodegenError::NoDeclarationFound)),
            "expected NoDeclarationFound, got {result:?}"
        );
        Ok(())
    }

    #[rstest]
    fn annotations_with_arguments_are_rejected() -> Result<()> {
        let result = locate(item(quote!(#[size(5)] struct Crate { w: u32 }))?, known);
        ensure!(
            matches!(result, Err(CodegenError::Syntax(_))),
            "expected a syntax error, got {result:?}"
        );
        Ok(())
    }

    #[rstest]
    fn raw_identifiers_name_the_same_annotation() -> Result<()> {
        let located = locate(item(quote!(#[r#size] struct Crate { w: u32 | 5 }))?, known)?;
        ensure!(located.wrappers.len() == 1, "r#size should be a wrapper");
        ensure!(located.decl.attrs.is_empty(), "wrapper must leave the struct");
        Ok(())
    }

    #[rstest]
    fn unknown_attributes_are_left_alone() -> Result<()> {
        let located = locate(item(quote!(#[unit] struct Crate { w: u32 }))?, known)?;
        ensure!(located.wrappers.is_empty(), "unit is not a known annotation");
        ensure!(located.decl.attrs.len() == 1, "attribute should be kept");
        Ok(())
    }
}
