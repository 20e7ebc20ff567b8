//! # jsxdom
//!
//! Compiles JSX embedded in JavaScript into plain DOM API calls.
//!
//! ```text
//! const el = <p class="note">Hi</p>;
//! ```
//!
//! becomes
//!
//! ```text
//! var $$0 = document.createElement("p");
//! $$0.setAttribute("class", "note");
//! var $$1 = document.createTextNode("Hi");
//! $$0.appendChild($$1);
//! const el = $$0;
//! ```
//!
//! ## Pipeline
//!
//! 1. **Parse**: `oxc_parser` with JSX always enabled.
//! 2. **Lower**: [`jsx_lowerer::JsxLowerer`] replaces each markup expression
//!    with a temporary and hoists the construction statements in front of the
//!    enclosing statement.
//! 3. **Audit**: no JSX may survive lowering.
//! 4. **Render**: `oxc_codegen`.
//!
//! Each run owns its arena and its name allocator, so output is deterministic
//! and runs never interfere with one another.

#[cfg(feature = "napi")]
use napi_derive::napi;

use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use std::path::Path;
use tracing::debug;

pub mod builders;
pub mod compositions;
pub mod error;
pub mod jsx_lowerer;
pub mod names;
pub mod options;
pub mod source;


pub use error::TranspileError;
pub use options::{
    DeclarationKind, OptionFallback, ParserOptions, TranspileOptions, ValidatedOptions,
};

/// Transpiles JSX source text to JavaScript that builds the same nodes with
/// DOM calls.
pub fn transpile(source: &str, options: &TranspileOptions) -> Result<String, TranspileError> {
    transpile_validated(source, &options.validate())
}

pub fn transpile_validated(
    source: &str,
    options: &ValidatedOptions,
) -> Result<String, TranspileError> {
    debug!(
        bytes = source.len(),
        declaration = options.declaration_kind.as_str(),
        prefix = %options.variable_prefix,
        "transpiling"
    );

    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, options.source_type).parse();
    if !ret.errors.is_empty() {
        return Err(TranspileError::Parse {
            messages: ret.errors.iter().map(|e| e.to_string()).collect(),
        });
    }

    let mut program = ret.program;
    jsx_lowerer::lower_program(&allocator, &mut program, options)?;

    Ok(Codegen::new().build(&program).code)
}

/// Reads and transpiles a file without blocking the calling task.
pub async fn parse_file(
    path: impl AsRef<Path>,
    options: &TranspileOptions,
) -> Result<String, TranspileError> {
    let options = options.validate();
    let source = source::read_source(path.as_ref(), &options.encoding).await?;
    transpile_validated(&source, &options)
}

/// Blocking counterpart of [`parse_file`].
pub fn parse_file_sync(
    path: impl AsRef<Path>,
    options: &TranspileOptions,
) -> Result<String, TranspileError> {
    let options = options.validate();
    let source = source::read_source_sync(path.as_ref(), &options.encoding)?;
    transpile_validated(&source, &options)
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAPI EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "napi")]
fn napi_options(options: Option<serde_json::Value>) -> TranspileOptions {
    options
        .map(|value| TranspileOptions::from_json(&value))
        .unwrap_or_default()
}

#[cfg(feature = "napi")]
fn napi_error(error: TranspileError) -> napi::Error {
    napi::Error::from_reason(format!("[{}] {}", error.code(), error))
}

#[cfg(feature = "napi")]
#[napi]
pub fn transpile_native(
    source: String,
    options: Option<serde_json::Value>,
) -> napi::Result<String> {
    transpile(&source, &napi_options(options)).map_err(napi_error)
}

#[cfg(feature = "napi")]
#[napi]
pub fn parse_file_sync_native(
    path: String,
    options: Option<serde_json::Value>,
) -> napi::Result<String> {
    parse_file_sync(&path, &napi_options(options)).map_err(napi_error)
}

#[cfg(feature = "napi")]
#[napi]
pub async fn parse_file_native(
    path: String,
    options: Option<serde_json::Value>,
) -> napi::Result<String> {
    let options = napi_options(options);
    parse_file(&path, &options).await.map_err(napi_error)
}
