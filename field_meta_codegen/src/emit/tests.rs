//! Tests for accessor emission and source rendering.

use anyhow::{Result, anyhow, ensure};
use field_meta::Value;
use proc_macro2::{Ident, Span};
use quote::quote;
use rstest::{fixture, rstest};

use super::{AccessorDef, Emitter, Expansion, LayoutDef, emit};
use crate::channel::Channel;

#[fixture]
fn emitter() -> Emitter {
    Emitter::default()
}

fn accessor(channel: &str, field: &str, value: impl Into<Value>) -> AccessorDef {
    AccessorDef {
        channel: channel.to_owned(),
        type_name: "Crate".to_owned(),
        field: field.to_owned(),
        value: value.into(),
    }
}

#[rstest]
fn emit_resolves_names_and_values() -> Result<()> {
    let ty = Ident::new("Crate", Span::call_site());
    let field = Ident::new_raw("type", Span::call_site());
    let def = emit(&ty, &field, "size", &syn::parse_quote!(-3));
    ensure!(def.key() == ("size", "Crate", "type"), "key {:?}", def.key());
    ensure!(def.value == Value::Int(-3), "value {:?}", def.value);
    Ok(())
}

#[rstest]
fn accessors_render_as_define_calls(emitter: Emitter) -> Result<()> {
    let tokens = emitter.accessor(&accessor("size", "w", 5));
    let expected = quote! {
        registries.define("size", "Crate", "w", ::field_meta::Value::Int(5i64))?;
    };
    ensure!(
        tokens.to_string() == expected.to_string(),
        "unexpected tokens: {tokens}"
    );
    Ok(())
}

#[rstest]
#[case(true, quote!(declare_type))]
#[case(false, quote!(note_fields))]
fn layouts_list_fields_in_order(
    emitter: Emitter,
    #[case] declared: bool,
    #[case] method: proc_macro2::TokenStream,
) -> Result<()> {
    let tokens = emitter.layout(&LayoutDef {
        channel: "size".to_owned(),
        type_name: "Crate".to_owned(),
        fields: vec!["w".to_owned(), "h".to_owned()],
        declared,
    });
    let expected = quote! {
        registries.#method("size", "Crate", &["w", "h"] as &[&str])?;
    };
    ensure!(
        tokens.to_string() == expected.to_string(),
        "unexpected tokens: {tokens}"
    );
    Ok(())
}

#[rstest]
#[case(Value::Float(f64::NAN), "NAN")]
#[case(Value::Float(f64::NEG_INFINITY), "NEG_INFINITY")]
#[case(Value::Str("cm".to_owned()), "\"cm\"")]
#[case(Value::Char('x'), "'x'")]
fn values_render_as_constructors(
    emitter: Emitter,
    #[case] value: Value,
    #[case] fragment: &str,
) -> Result<()> {
    let rendered = emitter.value(&value).to_string();
    ensure!(rendered.contains(fragment), "{rendered} lacks {fragment}");
    syn::parse_str::<syn::Expr>(&rendered).map_err(|err| anyhow!(err))?;
    Ok(())
}

#[rstest]
fn custom_crate_paths_are_used() -> Result<()> {
    let emitter = Emitter::new(
        syn::parse_quote!(crate::meta),
        Ident::new("install", Span::call_site()),
    );
    let rendered = emitter.render(std::iter::empty(), &[]).to_string();
    ensure!(rendered.contains("fn install"), "register fn name: {rendered}");
    ensure!(
        rendered.contains("crate :: meta :: Registries"),
        "crate path: {rendered}"
    );
    Ok(())
}

#[rstest]
fn rendered_units_parse_as_rust(emitter: Emitter) -> Result<()> {
    let decl = syn::parse2(quote!(#[derive(Debug)] pub struct Crate { pub w: u32, h: u32 }))
        .map_err(|err| anyhow!(err))?;
    let expansion = Expansion {
        declaration: Some(crate::syntax::Declaration {
            wrappers: Vec::new(),
            decl,
        }),
        layouts: vec![LayoutDef {
            channel: "size".to_owned(),
            type_name: "Crate".to_owned(),
            fields: vec!["w".to_owned(), "h".to_owned()],
            declared: true,
        }],
        accessors: vec![accessor("size", "w", 5)],
    };
    let channels = [Channel::new("size", 0)];
    let unit = emitter.render(&channels, &[expansion]);
    let file: syn::File = syn::parse2(unit).map_err(|err| anyhow!(err))?;
    ensure!(file.items.len() == 2, "declaration plus register fn expected");
    Ok(())
}

#[rstest]
fn channels_are_listed_in_first_seen_order() -> Result<()> {
    let expansion = Expansion {
        declaration: None,
        layouts: Vec::new(),
        accessors: vec![
            accessor("label", "x", "X"),
            accessor("unit", "x", "cm"),
            accessor("label", "y", "Y"),
        ],
    };
    ensure!(expansion.channels() == ["label", "unit"], "order");
    Ok(())
}
