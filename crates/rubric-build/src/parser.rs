//! External parser invocation.
//!
//! An external parser is any command that reads C++ headers and prints the
//! declaration tree as an interchange document on stdout.

use crate::config::{ParserConfig, RubricConfig};
use crate::error::{BuildError, Result};
use rubric_decl::{DeclNode, DeclTree};
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalParser {
    pub command: String,
    pub args: Vec<String>,
}

impl ExternalParser {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
        }
    }

    /// The parser configured in `parser`, if it names a command.
    pub fn from_config(parser: &ParserConfig) -> Option<Self> {
        let command = parser.command.clone()?;
        Some(Self {
            command,
            args: parser.args.clone(),
        })
    }

    /// Arguments after the command: configured args, `-I<path>` per
    /// include path, the flags, then the headers.
    pub fn arguments(
        &self,
        include_paths: &[PathBuf],
        cxxflags: &[String],
        headers: &[PathBuf],
    ) -> Vec<String> {
        let mut args = self.args.clone();
        args.extend(include_paths.iter().map(|p| format!("-I{}", p.display())));
        args.extend(cxxflags.iter().cloned());
        args.extend(headers.iter().map(|h| h.display().to_string()));
        args
    }

    /// Run the parser over the headers of `config`.
    pub fn parse_config(&self, config: &RubricConfig) -> Result<DeclTree> {
        self.run(
            &config.include_paths(),
            &config.sources.cxxflags,
            &config.headers(),
        )
    }

    /// Run the parser and read its output. A parser that cannot be started
    /// or exits unsuccessfully is an error carrying the full command line.
    pub fn run(
        &self,
        include_paths: &[PathBuf],
        cxxflags: &[String],
        headers: &[PathBuf],
    ) -> Result<DeclTree> {
        let args = self.arguments(include_paths, cxxflags, headers);
        let command_line = std::iter::once(self.command.as_str())
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        info!(command = %command_line, "running external parser");

        let output = Command::new(&self.command)
            .args(&args)
            .output()
            .map_err(|source| BuildError::ParserSpawn {
                command: command_line.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(BuildError::ParserFailed {
                command: command_line,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let document: DeclNode = serde_json::from_slice(&output.stdout)?;
        let mut tree = DeclTree::new();
        for child in document.children {
            tree.insert_node(tree.root(), child);
        }
        debug!(declarations = tree.len(), "parser output read");
        Ok(tree)
    }
}
