//! `figment::Jail` helpers for configuration tests.
//!
//! A jail gives each test its own working directory and environment, and
//! serialises tests that touch either. The helpers here surface jail
//! failures as `anyhow` errors so tests can use `?` throughout.

use anyhow::{Result, anyhow};
use figment::Jail;

/// Name of the configuration file created by [`with_config_file`].
pub const CONFIG_FILE: &str = "field_meta.toml";

/// Runs `f` inside a fresh [`Jail`] and returns its output.
///
/// # Errors
///
/// Returns an error when the jail cannot be set up or `f` fails.
pub fn with_jail<F, T>(f: F) -> Result<T>
where
    F: FnOnce(&mut Jail) -> figment::error::Result<T>,
{
    let mut output = None;
    Jail::try_with(|jail| {
        output = Some(f(jail)?);
        Ok(())
    })
    .map_err(|err| anyhow!(err.to_string()))?;
    output.ok_or_else(|| anyhow!("jail closure produced no value"))
}

/// Runs `f` inside a jail whose working directory holds [`CONFIG_FILE`]
/// with `contents`.
///
/// # Errors
///
/// Returns an error when the file cannot be written or `f` fails.
pub fn with_config_file<F, T>(contents: &str, f: F) -> Result<T>
where
    F: FnOnce(&mut Jail) -> figment::error::Result<T>,
{
    with_jail(|jail| {
        jail.create_file(CONFIG_FILE, contents)?;
        f(jail)
    })
}

/// Converts any displayable error into a [`figment::Error`] so it can cross
/// a jail closure.
#[expect(
    clippy::needless_pass_by_value,
    reason = "called as `map_err(jail_error)` with owned errors"
)]
pub fn jail_error<E: ToString>(err: E) -> figment::Error {
    figment::Error::from(err.to_string())
}
