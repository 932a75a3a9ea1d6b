//! Unit tests for channel registries.

use anyhow::{Result, ensure};
use rstest::{fixture, rstest};

use super::{Registries, Registry};
use crate::{Field, MetaError, Value};

#[fixture]
fn size() -> Result<Registry> {
    let mut registry = Registry::new("size", Value::from(0));
    registry.declare_type("Crate", ["w", "h"])?;
    Ok(registry)
}

#[rstest]
fn explicit_entries_win_over_default(size: Result<Registry>) -> Result<()> {
    let mut registry = size?;
    registry.define("Crate", "w", Value::from(5))?;
    ensure!(registry.get("Crate", "w")? == &Value::from(5), "w should be 5");
    ensure!(registry.get("Crate", "h")? == &Value::from(0), "h should default");
    Ok(())
}

#[rstest]
fn whole_type_lookup_follows_declaration_order(size: Result<Registry>) -> Result<()> {
    let mut registry = size?;
    registry.define("Crate", "h", Value::from(3))?;
    let values = registry.get_all("Crate");
    ensure!(
        values == [&Value::from(0), &Value::from(3)],
        "unexpected order: {values:?}"
    );
    Ok(())
}

#[rstest]
fn whole_type_lookup_matches_single_field_lookups(size: Result<Registry>) -> Result<()> {
    let mut registry = size?;
    registry.define("Crate", "w", Value::from(8))?;
    let singles = ["w", "h"]
        .iter()
        .map(|field| registry.get("Crate", field))
        .collect::<Result<Vec<_>, _>>()?;
    ensure!(registry.get_all("Crate") == singles, "tuple must mirror single lookups");
    Ok(())
}

#[rstest]
fn field_marker_resolves_like_a_name(size: Result<Registry>) -> Result<()> {
    let mut registry = size?;
    registry.define("Crate", "w", Value::from(5))?;
    ensure!(
        registry.get("Crate", Field("w"))? == registry.get("Crate", "w")?,
        "marker lookup diverged from name lookup"
    );
    Ok(())
}

#[rstest]
fn duplicate_entries_are_rejected(size: Result<Registry>) -> Result<()> {
    let mut registry = size?;
    registry.define("Crate", "w", Value::from(5))?;
    let err = registry
        .define("Crate", "w", Value::from(6))
        .err()
        .ok_or_else(|| anyhow::anyhow!("second definition must fail"))?;
    ensure!(
        matches!(err, MetaError::DuplicateFieldMetadata { ref field, .. } if field == "w"),
        "unexpected error: {err}"
    );
    ensure!(registry.get("Crate", "w")? == &Value::from(5), "first value must survive");
    Ok(())
}

#[rstest]
fn entries_for_distinct_fields_are_additive(size: Result<Registry>) -> Result<()> {
    let mut registry = size?;
    registry.define("Crate", "w", Value::from(1))?;
    registry.define("Crate", "h", Value::from(2))?;
    ensure!(registry.get("Crate", "w")? == &Value::from(1), "w was overwritten");
    ensure!(registry.len() == 2, "expected two entries, got {}", registry.len());
    Ok(())
}

#[rstest]
fn unknown_field_of_known_type_is_an_error(size: Result<Registry>) -> Result<()> {
    let registry = size?;
    let result = registry.get("Crate", "depth");
    ensure!(
        matches!(result, Err(MetaError::UnknownField { .. })),
        "expected UnknownField, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[case("Unregistered", "anything")]
#[case("", "")]
fn unknown_types_fall_back_to_default(
    size: Result<Registry>,
    #[case] ty: &str,
    #[case] field: &str,
) -> Result<()> {
    let registry = size?;
    ensure!(registry.get(ty, field)? == &Value::from(0), "expected default");
    ensure!(registry.get_all(ty).is_empty(), "unknown type has no layout");
    ensure!(registry.fallback() == &Value::from(0), "fallback must be the default");
    Ok(())
}

#[rstest]
fn zero_field_types_yield_empty_tuples() -> Result<()> {
    let mut registry = Registry::new("label", Value::from(""));
    registry.declare_type("Empty", std::iter::empty::<&str>())?;
    ensure!(registry.knows_type("Empty"), "type should be recorded");
    ensure!(registry.get_all("Empty").is_empty(), "expected no values");
    Ok(())
}

#[rstest]
fn define_extends_layout_for_new_fields() -> Result<()> {
    let mut registry = Registry::new("unit", Value::from("m"));
    registry.define("Point", "x", Value::from("cm"))?;
    registry.define("Point", "y", Value::from("mm"))?;
    ensure!(
        registry.fields("Point") == Some(&["x".to_owned(), "y".to_owned()][..]),
        "layout should follow definition order"
    );
    Ok(())
}

#[rstest]
fn entries_iterate_in_layout_order(size: Result<Registry>) -> Result<()> {
    let mut registry = size?;
    registry.define("Crate", "h", Value::from(2))?;
    registry.define("Crate", "w", Value::from(1))?;
    let fields: Vec<_> = registry.entries().map(|(_, field, _)| field.0).collect();
    ensure!(fields == ["w", "h"], "unexpected entry order {fields:?}");
    Ok(())
}

#[rstest]
fn registries_route_by_channel() -> Result<()> {
    let mut set = Registries::new();
    set.declare_channel("a", Value::from(1));
    set.declare_channel("b", Value::from(2));
    set.define("a", "P", "z", Value::from(9))?;
    set.define("b", "P", "z", Value::from(8))?;
    ensure!(set.lookup("a", "P", "z")? == &Value::from(9), "a(P, z) should be 9");
    ensure!(set.lookup("b", "P", "z")? == &Value::from(8), "b(P, z) should be 8");
    Ok(())
}

#[rstest]
fn registries_reject_undeclared_channels() -> Result<()> {
    let mut set = Registries::new();
    let result = set.define("missing", "P", "z", Value::from(1));
    ensure!(
        result == Err(MetaError::UnknownChannel {
            channel: "missing".to_owned()
        }),
        "expected UnknownChannel, got {result:?}"
    );
    Ok(())
}

#[rstest]
fn redeclaring_a_channel_keeps_its_default() -> Result<()> {
    let mut set = Registries::new();
    set.declare_channel("size", Value::from(0));
    let registry = set.declare_channel("size", Value::from(99));
    ensure!(registry.default_value() == &Value::from(0), "default was replaced");
    ensure!(set.len() == 1, "channel declared twice");
    Ok(())
}

#[rstest]
fn conflicting_declarations_keep_the_first_layout() -> Result<()> {
    let mut registry = Registry::new("label", Value::from(""));
    registry.declare_type("Point", ["x"])?;
    registry.define("Point", "x", Value::from("X"))?;
    let result = registry.declare_type("Point", ["y"]);
    ensure!(
        matches!(
            &result,
            Err(MetaError::LayoutConflict { declared, found, .. })
                if declared == &["x"] && found == &["y"]
        ),
        "expected LayoutConflict, got {result:?}"
    );
    ensure!(
        registry.get_all("Point") == [&Value::from("X")],
        "layout changed after a rejected declaration"
    );
    registry.declare_type("Point", ["x"])?;
    Ok(())
}

#[rstest]
fn declarations_replace_noted_layouts() -> Result<()> {
    let mut registry = Registry::new("label", Value::from(""));
    registry.note_fields("Point", ["y"])?;
    registry.define("Point", "y", Value::from("Y"))?;
    ensure!(registry.get("Point", "x")? == &Value::from(""), "noted layouts are open");
    ensure!(registry.declared_fields("Point").is_none(), "nothing declared yet");

    registry.declare_type("Point", ["x", "y"])?;
    ensure!(
        registry.get_all("Point") == [&Value::from(""), &Value::from("Y")],
        "values should follow the declared order"
    );
    let result = registry.get("Point", "z");
    ensure!(
        matches!(result, Err(MetaError::UnknownField { .. })),
        "declared layouts are closed, got {result:?}"
    );
    Ok(())
}

#[rstest]
fn declarations_must_cover_noted_entries() -> Result<()> {
    let mut registry = Registry::new("label", Value::from(""));
    registry.define("Point", "z", Value::from("Z"))?;
    let result = registry.declare_type("Point", ["x", "y"]);
    ensure!(
        matches!(&result, Err(MetaError::UnknownField { field, .. }) if field == "z"),
        "expected UnknownField, got {result:?}"
    );
    ensure!(registry.declared_fields("Point").is_none(), "layout must stay noted");
    Ok(())
}

#[rstest]
fn declared_layouts_reject_new_fields(size: Result<Registry>) -> Result<()> {
    let mut registry = size?;
    let noted = registry.note_fields("Crate", ["depth"]);
    ensure!(
        matches!(noted, Err(MetaError::UnknownField { .. })),
        "expected UnknownField, got {noted:?}"
    );
    let defined = registry.define("Crate", "depth", Value::from(1));
    ensure!(
        matches!(defined, Err(MetaError::UnknownField { .. })),
        "expected UnknownField, got {defined:?}"
    );
    ensure!(registry.is_empty(), "no entry should be recorded");
    Ok(())
}

#[rstest]
fn declaring_a_type_fixes_noted_layouts_on_other_channels() -> Result<()> {
    let mut set = Registries::new();
    set.declare_channel("label", Value::from(""));
    set.declare_channel("size", Value::from(0));
    set.note_fields("label", "Point", ["y"])?;
    set.define("label", "Point", "y", Value::from("Y"))?;

    set.declare_type("size", "Point", ["x", "y"])?;
    ensure!(
        set.declared_fields("Point") == Some(&["x".to_owned(), "y".to_owned()][..]),
        "declared layout missing"
    );
    let labels = set
        .channel("label")
        .map(|registry| registry.get_all("Point"))
        .unwrap_or_default();
    ensure!(
        labels == [&Value::from(""), &Value::from("Y")],
        "label layout should follow the declaration, got {labels:?}"
    );
    Ok(())
}

#[rstest]
fn noted_fields_adopt_layouts_declared_elsewhere() -> Result<()> {
    let mut set = Registries::new();
    set.declare_channel("label", Value::from(""));
    set.declare_channel("size", Value::from(0));
    set.declare_type("size", "Point", ["x", "y"])?;

    set.note_fields("label", "Point", ["y"])?;
    ensure!(
        set.channel("label").and_then(|registry| registry.declared_fields("Point"))
            == Some(&["x".to_owned(), "y".to_owned()][..]),
        "label should adopt the declared layout"
    );
    let stray = set.note_fields("label", "Point", ["z"]);
    ensure!(
        matches!(stray, Err(MetaError::UnknownField { .. })),
        "expected UnknownField, got {stray:?}"
    );
    Ok(())
}

#[rstest]
fn conflicting_declarations_across_channels_change_nothing() -> Result<()> {
    let mut set = Registries::new();
    set.declare_channel("label", Value::from(""));
    set.declare_channel("size", Value::from(0));
    set.declare_type("size", "Point", ["x"])?;
    let result = set.declare_type("label", "Point", ["y"]);
    ensure!(
        matches!(result, Err(MetaError::LayoutConflict { .. })),
        "expected LayoutConflict, got {result:?}"
    );
    ensure!(
        set.channel("label").is_some_and(|registry| !registry.knows_type("Point")),
        "label must not record the rejected layout"
    );
    Ok(())
}
