//! Error types for rubric-build.

use miette::Diagnostic;
use rubric_decl::DeclError;
use thiserror::Error;

/// Result type for rubric-build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Errors from loading configuration or running the external parser.
#[derive(Error, Diagnostic, Debug)]
pub enum BuildError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    #[diagnostic(code(rubric::build::read_config))]
    ReadConfig(#[from] std::io::Error),

    /// Failed to parse TOML configuration.
    #[error("failed to parse TOML config: {0}")]
    #[diagnostic(code(rubric::build::parse_toml))]
    ParseToml(#[from] toml::de::Error),

    /// Configuration validation error.
    #[error("config validation error: {0}")]
    #[diagnostic(code(rubric::build::validation))]
    Validation(String),

    /// The parser command could not be started.
    #[error("failed to run parser `{command}`")]
    #[diagnostic(
        code(rubric::build::parser_spawn),
        help("check `parser.command` in the configuration and that it is on PATH")
    )]
    ParserSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The parser ran but reported failure.
    #[error("parser `{command}` failed ({status})")]
    #[diagnostic(code(rubric::build::parser_failed), help("{stderr}"))]
    ParserFailed {
        command: String,
        status: String,
        stderr: String,
    },

    /// The parser's output is not a declaration tree document.
    #[error("failed to parse parser output: {0}")]
    #[diagnostic(code(rubric::build::parse_json))]
    ParseJson(#[from] serde_json::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Decl(#[from] DeclError),
}
