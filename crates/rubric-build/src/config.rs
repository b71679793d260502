//! Generation configuration types (rubric.toml format).

use crate::error::{BuildError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RubricConfig {
    /// Extension metadata.
    pub extension: ExtensionConfig,

    /// Headers and compiler settings.
    pub sources: SourcesConfig,

    /// How headers are turned into declarations.
    #[serde(default)]
    pub parser: ParserConfig,

    /// Explicit Ruby modules.
    #[serde(rename = "module", default)]
    pub modules: Vec<ModuleConfig>,

    #[serde(rename = "class", default)]
    pub classes: Vec<ClassConfig>,

    #[serde(rename = "function", default)]
    pub functions: Vec<FunctionConfig>,

    #[serde(rename = "enum", default)]
    pub enums: Vec<EnumConfig>,

    /// Directory relative paths are resolved against (the config file's
    /// directory when loaded from disk).
    #[serde(skip)]
    pub root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionConfig {
    /// Extension name; the entry point is `Init_<name>`.
    pub name: String,

    /// Namespace wrapped at the top level of Ruby; `::` is the global
    /// namespace.
    #[serde(default)]
    pub namespace: Option<String>,

    #[serde(default)]
    pub writer: WriterKind,

    /// Output directory (default: `generated`).
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

/// Output layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriterKind {
    Single,
    #[default]
    Multiple,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Headers to wrap. Only declarations from these are included by
    /// generated files.
    pub headers: Vec<PathBuf>,

    /// Include directories passed to the parser.
    #[serde(default)]
    pub include_paths: Vec<PathBuf>,

    /// Extra includes added to every generated file.
    #[serde(default)]
    pub includes: Vec<String>,

    /// Additional compiler flags for the parser.
    #[serde(default)]
    pub cxxflags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParserConfig {
    #[serde(default)]
    pub kind: ParserKind,

    /// Parser executable, for `kind = "external"`.
    #[serde(default)]
    pub command: Option<String>,

    /// Arguments placed before the include paths, flags and headers.
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParserKind {
    /// Built-in tree-sitter reader.
    #[default]
    TreeSitter,
    /// A command printing the JSON declaration tree.
    External,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub name: String,

    /// Namespace whose contents the module wraps.
    #[serde(default)]
    pub namespace: Option<String>,

    #[serde(rename = "module", default)]
    pub modules: Vec<ModuleConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassConfig {
    /// Qualified class name.
    pub name: String,

    #[serde(default)]
    pub ignore: bool,

    #[serde(default)]
    pub rename: Option<String>,

    /// Superclass to expose when the class has several.
    #[serde(default)]
    pub superclass: Option<String>,

    /// Index among the declared constructors.
    #[serde(default)]
    pub constructor: Option<usize>,

    #[serde(default)]
    pub disable_typedef_lookup: bool,

    /// Functions, methods, classes or enums moved into this class.
    #[serde(default)]
    pub include: Vec<String>,

    /// Free functions moved in as instance methods.
    #[serde(default)]
    pub instance_methods: Vec<String>,

    #[serde(default)]
    pub custom_code: Vec<CustomCode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomCode {
    pub declaration: String,
    /// Registration code; `<class>` stands for the class variable.
    pub wrapping: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionConfig {
    pub name: String,

    #[serde(default)]
    pub ignore: bool,

    #[serde(default)]
    pub rename: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnumConfig {
    pub name: String,

    #[serde(default)]
    pub ignore: bool,

    #[serde(default)]
    pub rename: Option<String>,
}

impl RubricConfig {
    /// Load and validate configuration from a TOML file. Relative paths are
    /// resolved against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_toml(&content, root)
    }

    /// Parse and validate configuration text.
    pub fn from_toml(content: &str, root: impl Into<PathBuf>) -> Result<Self> {
        let mut config: RubricConfig = toml::from_str(content)?;
        config.root = root.into();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !is_c_identifier(&self.extension.name) {
            return Err(BuildError::Validation(format!(
                "extension name `{}` is not a valid C identifier",
                self.extension.name
            )));
        }
        if self.sources.headers.is_empty() {
            return Err(BuildError::Validation(
                "at least one header is required in `sources.headers`".to_string(),
            ));
        }
        if self.parser.kind == ParserKind::External && self.parser.command.is_none() {
            return Err(BuildError::Validation(
                "`parser.kind = \"external\"` requires `parser.command`".to_string(),
            ));
        }
        Ok(())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Header paths, resolved.
    pub fn headers(&self) -> Vec<PathBuf> {
        self.sources.headers.iter().map(|h| self.resolve(h)).collect()
    }

    /// Include directories, resolved.
    pub fn include_paths(&self) -> Vec<PathBuf> {
        self.sources
            .include_paths
            .iter()
            .map(|p| self.resolve(p))
            .collect()
    }

    /// Output directory, resolved.
    pub fn working_dir(&self) -> PathBuf {
        let dir = self
            .extension
            .working_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("generated"));
        self.resolve(&dir)
    }

    /// Find the configuration of a class by qualified name.
    pub fn find_class(&self, name: &str) -> Option<&ClassConfig> {
        self.classes.iter().find(|c| c.name == name)
    }
}

fn is_c_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
