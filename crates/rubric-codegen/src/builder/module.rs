//! Ruby modules, and the namespace walk shared with the extension root.

use super::{builder_for, is_exposed, ruby_member_name, Builder, BuilderBase, ModuleSpec};
use crate::context::GenerationContext;
use crate::error::Result;
use crate::names::{functionize, ruby_constant_name, UniqueNames};
use crate::wrapper::{build_wrapper, Receiver};
use rubric_decl::{DeclCache, DeclId, DeclKind};
use tracing::warn;

/// Where functions found in a namespace are defined on the Ruby side.
#[derive(Debug, Clone, Copy)]
pub(crate) enum FunctionScope<'a> {
    /// `Rice::define_global_function`
    Global,
    /// `define_module_function` on a module variable
    Module(&'a str),
}

impl FunctionScope<'_> {
    fn parent_variable(&self) -> Option<&str> {
        match self {
            FunctionScope::Global => None,
            FunctionScope::Module(variable) => Some(variable),
        }
    }
}

/// Wrap everything `namespace` exposes into `base`: functions as
/// registrations in its body, classes, enumerations and nested namespaces
/// as child builders. Declarations moved into the namespace come last.
///
/// The global namespace only yields declarations from the source headers.
pub(crate) fn build_namespace_contents(
    ctx: &mut GenerationContext<'_>,
    base: &mut BuilderBase,
    namespace: DeclId,
    scope: FunctionScope<'_>,
) -> Result<()> {
    let cache = ctx.cache();
    let global = namespace == cache.tree().root();

    let mut items: Vec<DeclId> = cache
        .tree()
        .children(namespace)
        .iter()
        .copied()
        .filter(|&id| is_exposed(cache, id))
        .filter(|&id| !global || ctx.declared_in_sources(id))
        .collect();
    items.extend(
        cache
            .moved_into(namespace)
            .iter()
            .copied()
            .filter(|&id| !cache.is_ignored(id)),
    );

    let mut names = UniqueNames::default();
    for id in items {
        match &cache.decl(id).kind {
            DeclKind::Function { .. } | DeclKind::Method { is_static: true, .. } => {
                let Some(ruby) = ruby_member_name(cache, id) else {
                    continue;
                };
                let ruby = names.unique(&ruby);
                let wrapper = build_wrapper(ctx, &mut base.declarations, id, Receiver::Object)?;
                base.add_includes_for(ctx, id);
                match scope {
                    FunctionScope::Global => {
                        base.add_include("#include <rice/global_function.hpp>");
                        base.body.push(format!(
                            "\tRice::define_global_function(\"{}\", &{});",
                            ruby, wrapper
                        ));
                    }
                    FunctionScope::Module(variable) => base.body.push(format!(
                        "\t{}.define_module_function(\"{}\", &{});",
                        variable, ruby, wrapper
                    )),
                }
            }
            DeclKind::Method { .. } => {
                warn!(
                    method = %cache.qualified_name(id),
                    "instance method moved into a namespace, skipping"
                );
            }
            DeclKind::Namespace if ctx.is_claimed(id) => {}
            _ => {
                if let Some(child) = builder_for(cache, id, scope.parent_variable()) {
                    base.add_builder(ctx, child)?;
                }
            }
        }
    }
    Ok(())
}

/// A Ruby module, either wrapping a namespace or declared explicitly.
#[derive(Debug)]
pub struct ModuleBuilder {
    base: BuilderBase,
    ruby_name: String,
    namespace: Option<DeclId>,
    /// Variable of the enclosing module or class
    parent: Option<String>,
    modules: Vec<ModuleSpec>,
}

impl ModuleBuilder {
    pub fn for_namespace(cache: &DeclCache, namespace: DeclId, parent: Option<String>) -> Self {
        let name = cache
            .renamed(namespace)
            .unwrap_or(cache.decl(namespace).name.as_str())
            .to_string();
        Self {
            base: BuilderBase::new(cache.qualified_name(namespace), Some(namespace)),
            ruby_name: ruby_constant_name(&name),
            namespace: Some(namespace),
            parent,
            modules: Vec::new(),
        }
    }

    pub fn from_spec(spec: ModuleSpec, parent: Option<String>) -> Self {
        Self {
            base: BuilderBase::new(spec.name.clone(), spec.namespace),
            ruby_name: ruby_constant_name(&spec.name),
            namespace: spec.namespace,
            parent,
            modules: spec.modules,
        }
    }

    pub fn ruby_name(&self) -> &str {
        &self.ruby_name
    }
}

impl Builder for ModuleBuilder {
    fn base(&self) -> &BuilderBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BuilderBase {
        &mut self.base
    }

    fn build(&mut self, ctx: &mut GenerationContext<'_>) -> Result<()> {
        let variable = ctx.unique_name(&format!("rb_m{}", functionize(&self.base.name)));
        self.base.rice_variable = variable.clone();
        self.base.add_include("#include <rice/Module.hpp>");

        let define = match &self.parent {
            Some(parent) => format!("Rice::define_module_under({}, \"{}\")", parent, self.ruby_name),
            None => format!("Rice::define_module(\"{}\")", self.ruby_name),
        };
        self.base
            .body
            .push(format!("\tRice::Module {} = {};", variable, define));

        if let Some(namespace) = self.namespace {
            build_namespace_contents(
                ctx,
                &mut self.base,
                namespace,
                FunctionScope::Module(&variable),
            )?;
        }
        for spec in std::mem::take(&mut self.modules) {
            let child = ModuleBuilder::from_spec(spec, Some(variable.clone()));
            self.base.add_builder(ctx, Box::new(child))?;
        }
        Ok(())
    }
}
