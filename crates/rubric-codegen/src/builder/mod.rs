//! The builder tree.
//!
//! A builder turns one declaration (and everything under it) into three
//! code regions:
//!
//! - includes: the `#include` lines its code needs
//! - declarations: wrapper functions and classes defined outside the
//!   registration function
//! - body: the Rice statements that expose the declaration to Ruby
//!
//! Child builders do not write into their parent's body. They are
//! registered with it instead, and the parent emits their code after its
//! own body, ordered so that base classes reach Ruby before subclasses.

mod class;
mod director;
mod enumeration;
mod extension;
mod module;

pub use class::ClassBuilder;
pub use director::{director_methods, needs_director, DirectorBuilder, DirectorMethod};
pub use enumeration::EnumerationBuilder;
pub use extension::{ExtensionBuilder, ModuleSpec};
pub use module::ModuleBuilder;

use crate::context::GenerationContext;
use crate::error::{CodegenError, Result};
use crate::names::{is_special_member, ruby_method_name};
use indexmap::IndexSet;
use rubric_decl::{DeclCache, DeclId, DeclKind};
use std::fmt;
use tracing::debug;

/// A code-emitting node of the builder tree.
pub trait Builder: fmt::Debug {
    fn base(&self) -> &BuilderBase;

    fn base_mut(&mut self) -> &mut BuilderBase;

    /// Fill the code regions and child builders from the owning node.
    fn build(&mut self, _ctx: &mut GenerationContext<'_>) -> Result<()> {
        Err(CodegenError::NotImplemented {
            builder: self.base().name.clone(),
        })
    }
}

/// What a registration emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registered {
    /// Literal statements
    Code(Vec<String>),
    /// The code of a child builder, by index into `builders`
    Builder(usize),
}

/// A registration contributed to a builder, ordered by the inheritance
/// depth of `node`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// `None` sorts with depth 0
    pub node: Option<DeclId>,
    pub item: Registered,
}

/// State shared by every builder.
#[derive(Debug, Default)]
pub struct BuilderBase {
    pub name: String,
    /// Owning declaration; `None` for the extension root
    pub node: Option<DeclId>,
    /// C++ variable holding the Ruby object this builder defines
    pub rice_variable: String,
    pub builders: Vec<Box<dyn Builder>>,
    pub includes: Vec<String>,
    pub declarations: Vec<String>,
    pub body: Vec<String>,
    registrations: Vec<Registration>,
}

/// The plain base is the abstract builder: it has nothing to build from.
impl Builder for BuilderBase {
    fn base(&self) -> &BuilderBase {
        self
    }

    fn base_mut(&mut self) -> &mut BuilderBase {
        self
    }
}

impl BuilderBase {
    pub fn new(name: impl Into<String>, node: Option<DeclId>) -> Self {
        Self {
            name: name.into(),
            node,
            ..Self::default()
        }
    }

    /// Record registration code to emit after this builder's body.
    pub fn register_node(&mut self, node: Option<DeclId>, code: Vec<String>) {
        self.registrations.push(Registration {
            node,
            item: Registered::Code(code),
        });
    }

    /// Build `builder` and adopt it as a registered child.
    pub fn add_builder(
        &mut self,
        ctx: &mut GenerationContext<'_>,
        mut builder: Box<dyn Builder>,
    ) -> Result<()> {
        debug!(builder = %builder.base().name, parent = %self.name, "building");
        builder.build(ctx)?;
        let node = builder.base().node;
        self.registrations.push(Registration {
            node,
            item: Registered::Builder(self.builders.len()),
        });
        self.builders.push(builder);
        Ok(())
    }

    pub fn add_include(&mut self, include: impl Into<String>) {
        self.includes.push(include.into());
    }

    /// Include the headers `node` needs.
    pub fn add_includes_for(&mut self, ctx: &GenerationContext<'_>, node: DeclId) {
        for header in ctx.header_files(node) {
            self.includes.push(format!("#include \"{}\"", header));
        }
    }

    pub fn add_additional_includes(&mut self, ctx: &GenerationContext<'_>) {
        for include in ctx.additional_includes() {
            self.includes.push(format!("#include \"{}\"", include));
        }
    }

    /// Registrations sorted by inheritance depth, base classes first.
    /// Registrations at the same depth keep the order they were made in.
    pub fn registered_nodes(&self, cache: &DeclCache) -> Result<Vec<&Registration>> {
        let mut keyed = Vec::with_capacity(self.registrations.len());
        for registration in &self.registrations {
            let depth = match registration.node {
                Some(node) => inheritance_depth(cache, node)?,
                None => 0,
            };
            keyed.push((depth, registration));
        }
        keyed.sort_by_key(|(depth, _)| *depth);
        Ok(keyed.into_iter().map(|(_, r)| r).collect())
    }

    /// Includes of this builder and every descendant, first occurrence
    /// kept.
    pub fn collect_includes(&self, out: &mut IndexSet<String>) {
        out.extend(self.includes.iter().cloned());
        for child in &self.builders {
            child.base().collect_includes(out);
        }
    }

    /// Declarations of this builder and every descendant, parents first.
    pub fn collect_declarations(&self, out: &mut Vec<String>) {
        out.extend(self.declarations.iter().cloned());
        for child in &self.builders {
            child.base().collect_declarations(out);
        }
    }

    /// Body with the sorted registrations spliced in. A trailing bare `}`
    /// in the body closes the function skeleton and moves after the
    /// registrations.
    ///
    /// `child` renders a registered child builder.
    pub fn render_block(
        &self,
        cache: &DeclCache,
        child: &mut dyn FnMut(usize, &dyn Builder) -> Result<Vec<String>>,
    ) -> Result<Vec<String>> {
        let (body, closing) = split_closing_brace(&self.body);
        let mut lines = body.to_vec();
        for registration in self.registered_nodes(cache)? {
            match &registration.item {
                Registered::Code(code) => lines.extend(code.iter().cloned()),
                Registered::Builder(index) => {
                    lines.extend(child(*index, self.builders[*index].as_ref())?)
                }
            }
        }
        lines.extend(closing.iter().cloned());
        Ok(lines)
    }

    /// Body and registrations with every child inlined.
    pub fn inline_block(&self, cache: &DeclCache) -> Result<Vec<String>> {
        self.render_block(cache, &mut |_, child| child.base().inline_block(cache))
    }

    /// Render this builder's subtree as one compilation unit: includes,
    /// declarations, body, then sorted registrations.
    pub fn serialize(&self, cache: &DeclCache) -> Result<String> {
        let mut includes = IndexSet::new();
        self.collect_includes(&mut includes);
        let mut declarations = Vec::new();
        self.collect_declarations(&mut declarations);
        Ok(compose_unit(includes, &declarations, &self.inline_block(cache)?))
    }
}

/// Lay out a compilation unit. Duplicate includes are dropped.
pub fn compose_unit(
    includes: impl IntoIterator<Item = String>,
    declarations: &[String],
    block: &[String],
) -> String {
    let includes: IndexSet<String> = includes.into_iter().collect();
    let mut out: Vec<String> = includes.into_iter().collect();
    out.push(String::new());
    out.extend(declarations.iter().cloned());
    out.push(String::new());
    out.extend(block.iter().cloned());
    out.join("\n")
}

/// Split off the last non-empty line of `body` when it is a bare `}`.
fn split_closing_brace(body: &[String]) -> (&[String], &[String]) {
    match body.iter().rposition(|line| !line.trim().is_empty()) {
        Some(last) if body[last].trim() == "}" => body.split_at(last),
        _ => (body, &[]),
    }
}

/// Length of the longest superclass chain above `node`. Classes use their
/// chosen superclass when one was picked and skip ignored ones; everything
/// else has depth 0.
pub fn inheritance_depth(cache: &DeclCache, node: DeclId) -> Result<usize> {
    fn walk(cache: &DeclCache, node: DeclId, path: &mut Vec<DeclId>) -> Result<usize> {
        if !cache.decl(node).is_class() {
            return Ok(0);
        }
        if path.contains(&node) {
            return Err(CodegenError::InheritanceCycle {
                class: cache.qualified_name(node),
            });
        }
        let supers = match cache.chosen_superclass(node) {
            Some(chosen) => vec![chosen],
            None => cache
                .tree()
                .superclasses(node)
                .into_iter()
                .filter(|&s| !cache.is_ignored(s))
                .collect(),
        };

        path.push(node);
        let mut depth = 0;
        for sup in supers {
            depth = depth.max(walk(cache, sup, path)? + 1);
        }
        path.pop();
        Ok(depth)
    }

    walk(cache, node, &mut Vec::new())
}

/// Pick the builder for a declaration kind. Kinds that are not wrapped by
/// a builder of their own, and anonymous declarations, yield `None`.
pub fn builder_for(
    cache: &DeclCache,
    node: DeclId,
    parent_variable: Option<&str>,
) -> Option<Box<dyn Builder>> {
    let decl = cache.decl(node);
    if decl.name.is_empty() {
        return None;
    }
    let parent = parent_variable.map(str::to_string);
    match &decl.kind {
        DeclKind::Namespace => Some(Box::new(ModuleBuilder::for_namespace(cache, node, parent))),
        DeclKind::Class { .. } => Some(Box::new(ClassBuilder::new(cache, node, parent))),
        DeclKind::Enumeration { .. } => {
            Some(Box::new(EnumerationBuilder::new(cache, node, parent)))
        }
        DeclKind::Function { .. }
        | DeclKind::Method { .. }
        | DeclKind::Constructor { .. }
        | DeclKind::Field { .. }
        | DeclKind::Typedef { .. } => None,
    }
}

/// Ruby name of a function, method or field: the rename when one was
/// given, the snake_case C++ name otherwise. Operators without a rename
/// have none.
pub(crate) fn ruby_member_name(cache: &DeclCache, node: DeclId) -> Option<String> {
    if let Some(renamed) = cache.renamed(node) {
        return Some(renamed.to_string());
    }
    let name = &cache.decl(node).name;
    if is_special_member(name) {
        return None;
    }
    Some(ruby_method_name(name))
}

/// Whether `node` is wrapped where it was declared.
pub(crate) fn is_exposed(cache: &DeclCache, node: DeclId) -> bool {
    !cache.is_ignored(node) && !cache.is_moved(node) && cache.decl(node).is_public()
}
