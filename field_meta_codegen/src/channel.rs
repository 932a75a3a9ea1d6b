//! Channel generator.
//!
//! A [`Channel`] is a named metadata category with a default value. Applying
//! it to a declaration peels one layer from each field, turns explicit
//! values into accessor definitions, and strips the consumed layer so deeper
//! layers stay available to later annotations.
//!
//! The [`Annotate`] trait carries the three annotation builders. Channels
//! and chains both implement it by exposing their member channels; a single
//! channel is simply a chain of one.

use std::collections::HashSet;

use field_meta::Value;
use heck::ToSnakeCase;
use proc_macro2::Ident;
use tracing::{debug, trace};

use crate::emit::{AccessorDef, Expansion, LayoutDef, emit};
use crate::error::{CodegenError, CodegenResult};
use crate::peel::{Layer, MetaChain};
use crate::syntax::{Declaration, MetaField, RetrofitTable, TableRow, bare_name};

/// A named metadata category with a default value.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    name: String,
    default: Value,
}

impl Channel {
    /// Creates a channel; the name is normalised to `snake_case` so it can be
    /// used as an attribute path.
    #[must_use]
    pub fn new(name: &str, default: impl Into<Value>) -> Self {
        Self {
            name: name.to_snake_case(),
            default: default.into(),
        }
    }

    /// Channel name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value used for fields without an explicit entry.
    #[must_use]
    pub const fn default_value(&self) -> &Value {
        &self.default
    }
}

/// Result of applying members to a declaration, before deciding whether the
/// declaration itself is emitted.
#[derive(Debug)]
pub(crate) struct Pass {
    pub(crate) accessors: Vec<AccessorDef>,
    pub(crate) layouts: Vec<LayoutDef>,
    pub(crate) target: Declaration,
}

fn field_parts(field: &mut MetaField) -> (&Ident, &mut MetaChain) {
    (&field.ident, &mut field.chain)
}

fn row_parts(row: &mut TableRow) -> (&Ident, &mut MetaChain) {
    (&row.ident, &mut row.chain)
}

/// Peels one layer per member channel from each row, in member order.
///
/// Explicit values become accessor definitions; `_` and exhausted chains
/// defer to the channel default and produce nothing.
fn peel_rows<'f, I>(
    members: &[Channel],
    type_name: &Ident,
    rows: I,
) -> CodegenResult<Vec<AccessorDef>>
where
    I: IntoIterator<Item = (&'f Ident, &'f mut MetaChain)>,
{
    let mut accessors = Vec::new();
    for (field, chain) in rows {
        for channel in members {
            let (layer, rest) = std::mem::take(chain).peel();
            *chain = rest;
            trace!(
                channel = channel.name(),
                type_name = %type_name,
                field = %field,
                explicit = matches!(layer, Some(Layer::Value(_))),
                "peeled metadata layer"
            );
            if let Some(Layer::Value(expr)) = layer {
                accessors.push(emit(type_name, field, channel.name(), &expr));
            }
        }
    }
    ensure_unique(&accessors)?;
    Ok(accessors)
}

/// Rejects a batch that defines the same key twice.
pub(crate) fn ensure_unique(accessors: &[AccessorDef]) -> CodegenResult<()> {
    let mut seen = HashSet::new();
    for def in accessors {
        if !seen.insert(def.key()) {
            return Err(CodegenError::duplicate(
                &def.channel,
                &def.type_name,
                &def.field,
            ));
        }
    }
    Ok(())
}

/// Rejects a declaration that still carries metadata layers on a field.
pub(crate) fn ensure_consumed(target: &Declaration) -> CodegenResult<()> {
    match target.decl.first_unconsumed() {
        Some(field) => Err(CodegenError::UnconsumedMetadata {
            type_name: target.decl.type_name(),
            field: bare_name(&field.ident),
        }),
        None => Ok(()),
    }
}

fn layouts_for(
    members: &[Channel],
    type_name: &str,
    fields: &[String],
    declared: bool,
) -> Vec<LayoutDef> {
    members
        .iter()
        .map(|channel| LayoutDef {
            channel: channel.name().to_owned(),
            type_name: type_name.to_owned(),
            fields: fields.to_vec(),
            declared,
        })
        .collect()
}

/// Applies `members` to a declaration, stripping one layer per member.
pub(crate) fn peel_declaration(members: &[Channel], mut target: Declaration) -> CodegenResult<Pass> {
    let type_ident = target.decl.ident.clone();
    let fields = target.decl.field_names();
    let accessors = peel_rows(members, &type_ident, target.decl.fields_mut().map(field_parts))?;
    let layouts = layouts_for(members, &bare_name(&type_ident), &fields, true);
    Ok(Pass {
        accessors,
        layouts,
        target,
    })
}

/// Applies `members` to a retrofit table.
///
/// With a `known_layout`, every row must name one of its fields and the
/// layout is reused; otherwise the table order becomes the layout. Either
/// way the layout is only noted, never declared. Every row must be fully
/// consumed.
pub(crate) fn peel_table(
    members: &[Channel],
    mut table: RetrofitTable,
    known_layout: Option<&[String]>,
) -> CodegenResult<Expansion> {
    let type_name = table.type_name();
    if let Some(layout) = known_layout {
        let stray = table
            .rows
            .iter()
            .map(|row| bare_name(&row.ident))
            .find(|field| !layout.contains(field));
        if let (Some(field), Some(channel)) = (stray, members.first()) {
            return Err(CodegenError::unknown_field(channel.name(), &type_name, &field));
        }
    }
    let fields = known_layout.map_or_else(
        || table.rows.iter().map(|row| bare_name(&row.ident)).collect(),
        <[String]>::to_vec,
    );
    let type_ident = table.ident.clone();
    let accessors = peel_rows(members, &type_ident, table.rows.iter_mut().map(row_parts))?;
    if let Some(row) = table.rows.iter().find(|row| !row.chain.is_empty()) {
        return Err(CodegenError::UnconsumedMetadata {
            type_name,
            field: bare_name(&row.ident),
        });
    }
    Ok(Expansion {
        declaration: None,
        layouts: layouts_for(members, &type_name, &fields, false),
        accessors,
    })
}

/// The annotation builders shared by channels and chains.
pub trait Annotate {
    /// Annotation name.
    fn annotation_name(&self) -> &str;

    /// Member channels in application order.
    fn members(&self) -> &[Channel];

    /// Applies the annotation to a declaration and re-emits it once, with
    /// the consumed layer stripped and any remaining wrappers kept.
    ///
    /// # Errors
    ///
    /// Fails with a duplicate-metadata error when the same channel would
    /// register a field twice.
    fn build_standalone(&self, target: Declaration) -> CodegenResult<Expansion> {
        let pass = peel_declaration(self.members(), target)?;
        debug!(
            annotation = self.annotation_name(),
            type_name = %pass.target.decl.ident,
            accessors = pass.accessors.len(),
            "expanded standalone annotation"
        );
        Ok(Expansion {
            declaration: Some(pass.target),
            layouts: pass.layouts,
            accessors: pass.accessors,
        })
    }

    /// Applies the annotation to a declaration that has already been emitted,
    /// producing only accessor definitions.
    ///
    /// # Errors
    ///
    /// As for [`Annotate::build_standalone`], plus
    /// [`CodegenError::UnconsumedMetadata`] when a field keeps layers that
    /// would be dropped with the declaration.
    fn build_update(&self, target: Declaration) -> CodegenResult<Expansion> {
        let pass = peel_declaration(self.members(), target)?;
        ensure_consumed(&pass.target)?;
        debug!(
            annotation = self.annotation_name(),
            type_name = %pass.target.decl.ident,
            accessors = pass.accessors.len(),
            "expanded update annotation"
        );
        Ok(Expansion {
            declaration: None,
            layouts: pass.layouts,
            accessors: pass.accessors,
        })
    }

    /// Applies the annotation to an existing type through an external field
    /// table, producing only accessor definitions.
    ///
    /// # Errors
    ///
    /// Fails with an unknown-field error when `known_layout` is given and a
    /// row names a field outside it, with [`CodegenError::UnconsumedMetadata`]
    /// when a row has more layers than the annotation has members, and with
    /// a duplicate-metadata error as for [`Annotate::build_standalone`].
    fn build_retrofit(
        &self,
        table: RetrofitTable,
        known_layout: Option<&[String]>,
    ) -> CodegenResult<Expansion> {
        let expansion = peel_table(self.members(), table, known_layout)?;
        debug!(
            annotation = self.annotation_name(),
            accessors = expansion.accessors.len(),
            "expanded retrofit table"
        );
        Ok(expansion)
    }
}

impl Annotate for Channel {
    fn annotation_name(&self) -> &str {
        &self.name
    }

    fn members(&self) -> &[Channel] {
        std::slice::from_ref(self)
    }
}
