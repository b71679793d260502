//! Rendering a built extension to source files.
//!
//! Every file is rendered in memory first; nothing touches the disk until
//! the whole extension rendered without error.

use crate::builder::{compose_unit, Builder, ExtensionBuilder};
use crate::context::GenerationContext;
use crate::error::{CodegenError, Result};
use crate::names::{functionize, UniqueNames};
use crate::types::Converter;
use indexmap::IndexSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// First line of every generated file.
pub const PROVENANCE: &str = "// This file generated by rubric";

/// Stem of the files holding converter specializations.
const CUSTOM_STEM: &str = "_rbpp_custom";

/// How the builder tree is split into files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriterMode {
    /// One compilation unit for the whole extension
    Single,
    /// One file pair per top-level builder, plus the entry point
    #[default]
    Multiple,
}

/// A rendered file, named relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub name: String,
    pub contents: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Writer {
    mode: WriterMode,
}

impl Writer {
    pub fn new(mode: WriterMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> WriterMode {
        self.mode
    }

    /// Render `extension`, consuming the context it was built with.
    pub fn render(
        &self,
        extension: &ExtensionBuilder,
        ctx: GenerationContext<'_>,
    ) -> Result<Vec<GeneratedFile>> {
        let cache = ctx.cache();
        let additional: Vec<String> = ctx
            .additional_includes()
            .iter()
            .map(|i| format!("#include \"{}\"", i))
            .collect();
        let sources: Vec<String> = ctx
            .sources()
            .iter()
            .map(|s| format!("#include \"{}\"", s))
            .collect();
        let converters = ctx.into_converters();
        let root = extension.base();

        let files = match self.mode {
            WriterMode::Single => {
                let mut includes = IndexSet::new();
                root.collect_includes(&mut includes);
                if !converters.is_empty() {
                    includes.insert("#include <rice/Data_Object.hpp>".to_string());
                }
                let mut declarations: Vec<String> = converters
                    .iter()
                    .flat_map(|c| c.definition.iter().cloned().chain([String::new()]))
                    .collect();
                root.collect_declarations(&mut declarations);

                let contents =
                    compose_unit(includes, &declarations, &root.inline_block(cache)?);
                vec![file(format!("{}.rb.cpp", extension.name()), &contents)]
            }
            WriterMode::Multiple => {
                let mut files = Vec::new();
                let custom = (!converters.is_empty())
                    .then(|| format!("#include \"{}.rb.hpp\"", CUSTOM_STEM));

                let mut stem_names = UniqueNames::default();
                let mut stems = Vec::with_capacity(root.builders.len());
                for child in &root.builders {
                    let stem = stem_names.unique(&functionize(&child.base().name));
                    files.extend(render_subtree(
                        child.as_ref(),
                        &stem,
                        cache,
                        &additional,
                        custom.as_deref(),
                    )?);
                    stems.push(stem);
                }

                let mut includes: Vec<String> = root.includes.clone();
                includes.extend(stems.iter().map(|s| format!("#include \"_{}.rb.hpp\"", s)));
                includes.extend(custom.clone());
                let block = root.render_block(cache, &mut |index, _| {
                    Ok(vec![format!("\tregister_{}();", stems[index])])
                })?;
                let contents = compose_unit(includes, &root.declarations, &block);
                files.insert(0, file(format!("{}.rb.cpp", extension.name()), &contents));

                if !converters.is_empty() {
                    files.extend(render_converters(&converters, &sources, &additional));
                }
                files
            }
        };
        debug!(count = files.len(), mode = ?self.mode, "rendered extension");
        Ok(files)
    }

    /// Write rendered files into `dir`, creating it when missing.
    pub fn write_to(&self, files: &[GeneratedFile], dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir).map_err(|source| CodegenError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut written = Vec::with_capacity(files.len());
        for generated in files {
            let path = dir.join(&generated.name);
            fs::write(&path, &generated.contents).map_err(|source| CodegenError::Io {
                path: path.clone(),
                source,
            })?;
            info!(path = %path.display(), "wrote");
            written.push(path);
        }
        Ok(written)
    }
}

fn file(name: String, body: &str) -> GeneratedFile {
    GeneratedFile {
        name,
        contents: format!("{}\n{}\n", PROVENANCE, body),
    }
}

fn header_guard(stem: &str) -> String {
    format!("__RICE_GENERATED_{}_HPP__", stem.trim_start_matches('_'))
}

/// `_<stem>.rb.hpp` declaring `register_<stem>()` and the `.rb.cpp`
/// defining it from the subtree.
fn render_subtree(
    builder: &dyn Builder,
    stem: &str,
    cache: &rubric_decl::DeclCache,
    additional: &[String],
    custom: Option<&str>,
) -> Result<[GeneratedFile; 2]> {
    let base = builder.base();
    let guard = header_guard(stem);
    let header = [
        format!("#ifndef {}", guard),
        format!("#define {}", guard),
        String::new(),
        format!("void register_{}();", stem),
        String::new(),
        "#endif".to_string(),
    ]
    .join("\n");

    let mut includes = vec![format!("#include \"_{}.rb.hpp\"", stem)];
    includes.extend(additional.iter().cloned());
    includes.extend(custom.map(str::to_string));
    let mut collected = IndexSet::new();
    base.collect_includes(&mut collected);
    includes.extend(collected);

    let mut declarations = Vec::new();
    base.collect_declarations(&mut declarations);

    let mut block = vec![format!("void register_{}() {{", stem)];
    block.extend(base.inline_block(cache)?);
    block.push("}".to_string());

    Ok([
        file(format!("_{}.rb.hpp", stem), &header),
        file(
            format!("_{}.rb.cpp", stem),
            &compose_unit(includes, &declarations, &block),
        ),
    ])
}

fn render_converters(
    converters: &[Converter],
    sources: &[String],
    additional: &[String],
) -> [GeneratedFile; 2] {
    let guard = header_guard(CUSTOM_STEM);
    let mut header = vec![
        format!("#ifndef {}", guard),
        format!("#define {}", guard),
        String::new(),
        "#include <rice/Object.hpp>".to_string(),
        "#include <rice/Data_Object.hpp>".to_string(),
        "#include <rice/Data_Type.hpp>".to_string(),
    ];
    header.extend(sources.iter().cloned());
    header.extend(additional.iter().cloned());
    header.push(String::new());
    for converter in converters {
        header.extend(converter.prototype.iter().cloned());
    }
    header.push(String::new());
    header.push("#endif".to_string());

    let mut source = vec![format!("#include \"{}.rb.hpp\"", CUSTOM_STEM), String::new()];
    for converter in converters {
        source.extend(converter.definition.iter().cloned());
        source.push(String::new());
    }

    [
        file(format!("{}.rb.hpp", CUSTOM_STEM), &header.join("\n")),
        file(format!("{}.rb.cpp", CUSTOM_STEM), source.join("\n").trim_end()),
    ]
}
