//! Configuration loading through defaults, TOML files and the environment.

use std::path::Path;

use anyhow::{Result, ensure};
use field_meta::Value;
use field_meta_codegen::{CodegenConfig, CodegenError, Engine};
use quote::quote;
use rstest::rstest;
use test_helpers::figment::{CONFIG_FILE, jail_error, with_config_file, with_jail};

const GEO: &str = r#"
update_prefix = "refresh_"

[[channels]]
name = "label"
default = ""

[[channels]]
name = "unit"
default = "m"

[[chains]]
name = "geo"
members = ["label", "unit"]
"#;

#[rstest]
fn defaults_apply_without_sources() -> Result<()> {
    let config = with_jail(|_| CodegenConfig::load(None).map_err(jail_error))?;
    ensure!(config == CodegenConfig::default(), "unexpected config {config:?}");
    Ok(())
}

#[rstest]
fn toml_file_declares_channels_and_chains() -> Result<()> {
    let config = with_config_file(GEO, |_| {
        CodegenConfig::load(Some(Path::new(CONFIG_FILE))).map_err(jail_error)
    })?;
    ensure!(config.update_prefix == "refresh_", "prefix from file");
    ensure!(config.channels.len() == 2, "two channels");
    ensure!(
        config.channels.get(1).map(|c| &c.default) == Some(&Value::from("m")),
        "unit default"
    );

    let mut engine = Engine::from_config(&config)?;
    ensure!(engine.is_annotation("refresh_geo"), "configured update prefix");
    engine.expand_all(quote!(#[geo] struct Point { x: f64 | "X" | "cm" }))?;
    ensure!(engine.lookup("label", "Point", "x")? == &Value::from("X"), "label");
    ensure!(engine.lookup("unit", "Point", "x")? == &Value::from("cm"), "unit");
    Ok(())
}

#[rstest]
fn environment_overrides_the_file() -> Result<()> {
    let config = with_config_file("register_fn = \"from_file\"", |jail| {
        jail.set_env("FIELD_META_REGISTER_FN", "from_env");
        CodegenConfig::load(Some(Path::new(CONFIG_FILE))).map_err(jail_error)
    })?;
    ensure!(config.register_fn == "from_env", "got {}", config.register_fn);

    let engine = Engine::from_config(&config)?;
    let rendered = engine.render(&[]).to_string();
    ensure!(rendered.contains("fn from_env"), "register fn name: {rendered}");
    Ok(())
}

#[rstest]
#[case("true", Value::Bool(true))]
#[case("-3", Value::Int(-3))]
#[case("2.5", Value::Float(2.5))]
#[case("\"m\"", Value::from("m"))]
#[case("\"c\"", Value::Str("c".to_owned()))]
fn channel_defaults_load_as_plain_scalars(
    #[case] literal: &str,
    #[case] expected: Value,
) -> Result<()> {
    let contents = format!("[[channels]]\nname = \"tag\"\ndefault = {literal}");
    let config = with_config_file(&contents, |_| {
        CodegenConfig::load(Some(Path::new(CONFIG_FILE))).map_err(jail_error)
    })?;
    let default = config.channels.first().map(|channel| &channel.default);
    ensure!(
        default == Some(&expected),
        "expected {expected:?}, got {default:?}"
    );
    Ok(())
}

#[rstest]
fn malformed_files_are_config_errors() -> Result<()> {
    let failed = with_config_file("channels = 3", |_| {
        Ok(matches!(
            CodegenConfig::load(Some(Path::new(CONFIG_FILE))),
            Err(CodegenError::Config(_))
        ))
    })?;
    ensure!(failed, "expected a configuration error");
    Ok(())
}

#[rstest]
fn configured_chains_must_name_known_channels() -> Result<()> {
    let config = with_config_file("[[chains]]\nname = \"geo\"\nmembers = [\"label\"]", |_| {
        CodegenConfig::load(Some(Path::new(CONFIG_FILE))).map_err(jail_error)
    })?;
    let result = Engine::from_config(&config);
    ensure!(
        matches!(result, Err(CodegenError::UnknownAnnotation { .. })),
        "expected UnknownAnnotation"
    );
    Ok(())
}
