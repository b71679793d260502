use miette::{miette, Result};
use rubric_build::{
    ClassConfig, ExternalParser, ModuleConfig, ParserKind, RubricConfig, WriterKind,
};
use rubric_codegen::{
    Builder, ExtensionBuilder, GeneratedFile, GenerationContext, ModuleSpec, Writer, WriterMode,
};
use rubric_decl::{DeclCache, DeclError, DeclId, DeclTree};
use std::path::{Path, PathBuf};
use tracing::info;

/// Runs generation runs for one configuration.
///
/// Every run starts from a fresh [`DeclCache`], so runs never observe each
/// other's annotations.
pub struct Driver {
    config: RubricConfig,
    writer: Option<WriterMode>,
    output: Option<PathBuf>,
}

impl Driver {
    pub fn new(config: RubricConfig) -> Self {
        Self {
            config,
            writer: None,
            output: None,
        }
    }

    /// Load the configuration file at `path`.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(RubricConfig::from_file(path.as_ref())?))
    }

    /// Override the configured output layout.
    pub fn with_writer(mut self, mode: WriterMode) -> Self {
        self.writer = Some(mode);
        self
    }

    /// Override the configured output directory.
    pub fn with_output(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output = Some(dir.into());
        self
    }

    pub fn config(&self) -> &RubricConfig {
        &self.config
    }

    pub fn writer_mode(&self) -> WriterMode {
        self.writer.unwrap_or(match self.config.extension.writer {
            WriterKind::Single => WriterMode::Single,
            WriterKind::Multiple => WriterMode::Multiple,
        })
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.config.working_dir())
    }

    /// Header paths as recorded on parsed declarations.
    fn sources(&self) -> Vec<String> {
        self.config
            .headers()
            .iter()
            .map(|h| h.display().to_string())
            .collect()
    }

    /// Read the configured headers with the configured parser.
    pub fn parse(&self) -> Result<DeclTree> {
        let headers = self.config.headers();
        let tree = match self.config.parser.kind {
            ParserKind::TreeSitter => rubric_frontend_cpp::read_headers(&headers)?,
            ParserKind::External => {
                let parser = ExternalParser::from_config(&self.config.parser)
                    .ok_or_else(|| miette!("external parser has no command"))?;
                parser.parse_config(&self.config)?
            }
        };
        info!(
            headers = headers.len(),
            declarations = tree.len(),
            "parsed headers"
        );
        Ok(tree)
    }

    /// Apply the configured annotations to a fresh cache.
    pub fn annotate(&self, cache: &mut DeclCache) -> Result<()> {
        for function in &self.config.functions {
            let overloads = cache.function(&function.name)?.overloads();
            for id in overloads {
                if function.ignore {
                    cache.ignore(id);
                } else if let Some(name) = &function.rename {
                    cache.rename(id, name.as_str());
                }
            }
        }
        for enumeration in &self.config.enums {
            let mut handle = cache.enumeration(&enumeration.name)?;
            if enumeration.ignore {
                handle.ignore();
            } else if let Some(name) = &enumeration.rename {
                handle.rename(name);
            }
        }
        for class in &self.config.classes {
            apply_class(cache, class)?;
        }
        Ok(())
    }

    /// Run everything but the final write: parse, annotate, build, render.
    pub fn generate(&self) -> Result<Vec<GeneratedFile>> {
        let tree = self.parse()?;
        self.generate_from(tree)
    }

    /// Annotate, build and render an already parsed tree.
    pub fn generate_from(&self, tree: DeclTree) -> Result<Vec<GeneratedFile>> {
        let mut cache = DeclCache::new(tree);
        self.annotate(&mut cache)?;

        let namespace = match &self.config.extension.namespace {
            Some(name) => Some(cache.namespace(name)?),
            None => None,
        };
        let modules = self
            .config
            .modules
            .iter()
            .map(|m| module_spec(&cache, m))
            .collect::<std::result::Result<Vec<_>, DeclError>>()?;

        let mut ctx = GenerationContext::new(&cache)
            .with_sources(self.sources())
            .with_additional_includes(self.config.sources.includes.iter().cloned());
        let mut extension = ExtensionBuilder::new(self.config.extension.name.clone(), namespace)
            .with_modules(modules);
        extension.build(&mut ctx)?;

        let files = Writer::new(self.writer_mode()).render(&extension, ctx)?;
        Ok(files)
    }

    /// One full generation run. Returns the paths written.
    pub fn run(&self) -> Result<Vec<PathBuf>> {
        let files = self.generate()?;
        let dir = self.output_dir();
        let written = Writer::new(self.writer_mode()).write_to(&files, &dir)?;
        info!(
            extension = %self.config.extension.name,
            files = written.len(),
            dir = %dir.display(),
            "generation finished"
        );
        Ok(written)
    }
}

fn apply_class(cache: &mut DeclCache, class: &ClassConfig) -> Result<()> {
    let mut included = Vec::new();
    for name in &class.include {
        let found = cache.tree().lookup_all(name);
        if found.is_empty() {
            return Err(DeclError::NotFound {
                kind: "declaration",
                name: name.clone(),
            }
            .into());
        }
        included.extend(found);
    }
    let mut instance_methods = Vec::new();
    for name in &class.instance_methods {
        instance_methods.extend(cache.function(name)?.overloads());
    }

    let mut handle = cache.class(&class.name)?;
    if class.ignore {
        handle.ignore();
        return Ok(());
    }
    if let Some(name) = &class.rename {
        handle.rename(name);
    }
    if let Some(superclass) = &class.superclass {
        handle.use_superclass(superclass)?;
    }
    if let Some(index) = class.constructor {
        handle.use_constructor(index)?;
    }
    if class.disable_typedef_lookup {
        handle.disable_typedef_lookup();
    }
    for id in included {
        handle.include(id)?;
    }
    for id in instance_methods {
        handle.include_as_instance_method(id)?;
    }
    for code in &class.custom_code {
        handle.add_custom_code(&code.declaration, &code.wrapping);
    }
    Ok(())
}

fn module_spec(
    cache: &DeclCache,
    module: &ModuleConfig,
) -> std::result::Result<ModuleSpec, DeclError> {
    let namespace: Option<DeclId> = match &module.namespace {
        Some(name) => Some(cache.namespace(name)?),
        None => None,
    };
    Ok(ModuleSpec {
        name: module.name.clone(),
        namespace,
        modules: module
            .modules
            .iter()
            .map(|m| module_spec(cache, m))
            .collect::<std::result::Result<_, _>>()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rubric_decl::{BaseSpecifier, CppType, DeclKind, Param};

    fn config(extra: &str) -> RubricConfig {
        let text = format!(
            "[extension]\nname = \"zoo\"\nnamespace = \"zoo\"\nwriter = \"single\"\n\
             [sources]\nheaders = [\"zoo.h\"]\n{}",
            extra
        );
        RubricConfig::from_toml(&text, "/work").unwrap()
    }

    fn tree() -> DeclTree {
        let mut tree = DeclTree::new();
        let zoo = tree.namespace(tree.root(), "zoo");
        let class = |bases: &[&str]| DeclKind::Class {
            is_struct: false,
            bases: bases.iter().map(|b| BaseSpecifier::public(*b)).collect(),
        };
        tree.add(zoo, "Animal", class(&[]));
        tree.add(zoo, "Pet", class(&[]));
        tree.add(zoo, "Dog", class(&["Animal", "Pet"]));
        tree.add(
            zoo,
            "feed",
            DeclKind::Function {
                return_type: CppType::Void,
                params: vec![Param::new("dog", CppType::named("Dog").ref_())],
            },
        );
        tree
    }

    #[test]
    fn test_output_settings() {
        let driver = Driver::new(config(""));
        assert_eq!(driver.writer_mode(), WriterMode::Single);
        assert_eq!(driver.output_dir(), PathBuf::from("/work/generated"));

        let driver = driver.with_writer(WriterMode::Multiple).with_output("/tmp/out");
        assert_eq!(driver.writer_mode(), WriterMode::Multiple);
        assert_eq!(driver.output_dir(), PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_ambiguous_class_needs_configuration() {
        let driver = Driver::new(config(""));
        assert!(driver.generate_from(tree()).is_err());

        let driver = Driver::new(config(
            "[[class]]\nname = \"zoo::Dog\"\nsuperclass = \"Animal\"\n\
             include = [\"zoo::feed\"]\ninstance_methods = []\n",
        ));
        let files = driver.generate_from(tree()).unwrap();
        let text = &files[0].contents;
        assert!(text.contains("Rice::define_class< zoo::Dog, zoo::Animal >(\"Dog\")"));
        assert!(text.contains("rb_czoo_Dog.define_singleton_method(\"feed\", &wrap_zoo_feed);"));
        assert!(!text.contains("define_global_function(\"feed\""));
    }

    #[test]
    fn test_instance_methods_and_renames() {
        let driver = Driver::new(config(
            "[[class]]\nname = \"zoo::Dog\"\nrename = \"Puppy\"\nsuperclass = \"zoo::Pet\"\n\
             instance_methods = [\"zoo::feed\"]\n\
             [[class]]\nname = \"zoo::Animal\"\nignore = true\n",
        ));
        let files = driver.generate_from(tree()).unwrap();
        let text = &files[0].contents;
        assert!(text.contains("Rice::define_class< zoo::Dog, zoo::Pet >(\"Puppy\")"));
        assert!(text.contains("void wrap_zoo_feed(zoo::Dog* self) {"));
        assert!(text.contains("\tzoo::feed(*self);"));
        assert!(text.contains("rb_czoo_Dog.define_method(\"feed\", &wrap_zoo_feed);"));
        assert!(!text.contains("\"Animal\""));
    }

    #[test]
    fn test_unknown_names_are_errors() {
        let driver = Driver::new(config("[[function]]\nname = \"zoo::nope\"\nignore = true\n"));
        assert!(driver.generate_from(tree()).is_err());

        let driver = Driver::new(config("[[module]]\nname = \"Extra\"\nnamespace = \"missing\"\n"));
        assert!(driver.generate_from(tree()).is_err());
    }
}
