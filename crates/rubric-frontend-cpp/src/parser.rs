use miette::{IntoDiagnostic, Result};
use tree_sitter::{Parser, Tree};

/// Parse C++ source code into a tree-sitter Tree.
pub fn parse(source: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    let language = tree_sitter_cpp::LANGUAGE;
    parser.set_language(&language.into()).into_diagnostic()?;

    parser
        .parse(source, None)
        .ok_or_else(|| miette::miette!("Failed to parse C++ source"))
}
