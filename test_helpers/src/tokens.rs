//! Token stream comparison helpers.
//!
//! Generated code and expected source rarely agree on whitespace. Both sides
//! are reparsed into a [`TokenStream`] and compared through its canonical
//! string form.

use std::str::FromStr;

use anyhow::{Result, anyhow, ensure};
use proc_macro2::TokenStream;

/// Canonical string form of `tokens`.
#[must_use]
pub fn normalise(tokens: &TokenStream) -> String {
    tokens.to_string()
}

/// Lexes `source` into tokens.
///
/// # Errors
///
/// Returns an error when `source` is not valid Rust tokens.
pub fn lex(source: &str) -> Result<TokenStream> {
    TokenStream::from_str(source).map_err(|err| anyhow!("failed to lex {source:?}: {err}"))
}

/// Fails unless `actual` and `expected` lex to the same tokens.
///
/// # Errors
///
/// Returns an error describing both sides when they differ, or when
/// `expected` does not lex.
pub fn ensure_tokens_eq(actual: &TokenStream, expected: &str) -> Result<()> {
    let want = normalise(&lex(expected)?);
    let got = normalise(actual);
    ensure!(
        got == want,
        "token mismatch\n  actual: {got}\nexpected: {want}"
    );
    Ok(())
}
