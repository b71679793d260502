//! In-process C++ header reader.
//!
//! Builds a [`DeclTree`] from header files with tree-sitter-cpp. Only the
//! declarations a binding generator needs are read; no preprocessing or
//! semantic analysis happens here.

mod parser;
mod reader;

pub use parser::parse;
pub use reader::read;

use miette::{IntoDiagnostic, Result, WrapErr};
use rubric_decl::DeclTree;
use std::path::Path;
use tracing::debug;

/// Read one header's declarations into an existing tree.
///
/// `file` is recorded on every declaration and later used to decide which
/// header a generated file must include.
pub fn read_source(source: &str, file: &str, decls: &mut DeclTree) -> Result<()> {
    let tree = parse(source)?;
    read(&tree, source, file, decls);
    Ok(())
}

/// Read a header from disk into an existing tree.
pub fn read_header(path: &Path, decls: &mut DeclTree) -> Result<()> {
    let source = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read header {}", path.display()))?;
    let before = decls.len();
    read_source(&source, &path.display().to_string(), decls)?;
    debug!(
        header = %path.display(),
        declarations = decls.len() - before,
        "read header"
    );
    Ok(())
}

/// Read every header into one fresh tree. Namespaces re-opened across
/// headers are merged.
pub fn read_headers<P: AsRef<Path>>(paths: &[P]) -> Result<DeclTree> {
    let mut decls = DeclTree::new();
    for path in paths {
        read_header(path.as_ref(), &mut decls)?;
    }
    Ok(decls)
}
