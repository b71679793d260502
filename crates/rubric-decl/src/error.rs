//! Error types for rubric-decl.

use miette::Diagnostic;
use thiserror::Error;

/// Result type for declaration queries and annotations.
pub type Result<T> = std::result::Result<T, DeclError>;

/// Errors raised while querying or annotating the declaration tree.
#[derive(Error, Diagnostic, Debug)]
pub enum DeclError {
    /// No declaration of the requested kind has this name.
    #[error("no {kind} named `{name}` in the parsed headers")]
    #[diagnostic(
        code(rubric::decl::not_found),
        help("names are fully qualified, e.g. `math::Vector`")
    )]
    NotFound { kind: &'static str, name: String },

    /// The name resolved, but to a different kind of declaration.
    #[error("`{name}` is not a {expected}")]
    #[diagnostic(code(rubric::decl::wrong_kind))]
    WrongKind { name: String, expected: &'static str },

    /// Ignored declarations cannot be moved elsewhere.
    #[error("cannot move `{name}`: it is ignored")]
    #[diagnostic(code(rubric::decl::already_ignored))]
    AlreadyIgnored { name: String },

    /// Only classes and namespaces can receive moved declarations.
    #[error("cannot move `{name}` into `{target}`")]
    #[diagnostic(
        code(rubric::decl::invalid_move_target),
        help("declarations can only be moved into a class or namespace other than themselves")
    )]
    InvalidMoveTarget { name: String, target: String },

    /// The chosen superclass is not a base of the class.
    #[error("`{candidate}` is not a superclass of `{class}`")]
    #[diagnostic(code(rubric::decl::not_a_superclass))]
    NotASuperclass { class: String, candidate: String },

    /// The chosen constructor does not belong to the class.
    #[error("`{candidate}` is not a constructor of `{class}`")]
    #[diagnostic(code(rubric::decl::not_a_constructor))]
    NotAConstructor { class: String, candidate: String },

    /// Malformed interchange document.
    #[error("invalid declaration tree document: {0}")]
    #[diagnostic(code(rubric::decl::interchange))]
    Interchange(#[from] serde_json::Error),
}
