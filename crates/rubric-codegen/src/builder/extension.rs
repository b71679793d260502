use super::module::{build_namespace_contents, FunctionScope, ModuleBuilder};
use super::{Builder, BuilderBase};
use crate::context::GenerationContext;
use crate::error::Result;
use rubric_decl::DeclId;

/// An explicitly configured Ruby module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSpec {
    pub name: String,
    /// Namespace whose contents the module wraps
    pub namespace: Option<DeclId>,
    pub modules: Vec<ModuleSpec>,
}

impl ModuleSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            modules: Vec::new(),
        }
    }

    fn claim(&self, ctx: &mut GenerationContext<'_>) {
        if let Some(namespace) = self.namespace {
            ctx.claim_namespace(namespace);
        }
        for module in &self.modules {
            module.claim(ctx);
        }
    }
}

/// Root of the builder tree: the extension's `Init_<name>` entry point.
///
/// The root namespace is wrapped at the top level of Ruby. Without one,
/// only explicit modules are generated.
#[derive(Debug)]
pub struct ExtensionBuilder {
    base: BuilderBase,
    namespace: Option<DeclId>,
    modules: Vec<ModuleSpec>,
}

impl ExtensionBuilder {
    pub fn new(name: impl Into<String>, namespace: Option<DeclId>) -> Self {
        Self {
            base: BuilderBase::new(name, None),
            namespace,
            modules: Vec::new(),
        }
    }

    pub fn with_modules(mut self, modules: Vec<ModuleSpec>) -> Self {
        self.modules = modules;
        self
    }

    /// The extension name, as in `Init_<name>`.
    pub fn name(&self) -> &str {
        &self.base.name
    }
}

impl Builder for ExtensionBuilder {
    fn base(&self) -> &BuilderBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BuilderBase {
        &mut self.base
    }

    fn build(&mut self, ctx: &mut GenerationContext<'_>) -> Result<()> {
        for module in &self.modules {
            module.claim(ctx);
        }

        self.base.add_include("#include <rice/Class.hpp>");
        self.base.add_additional_includes(ctx);
        self.base.body.push("extern \"C\"".to_string());
        self.base.body.push(format!("void Init_{}() {{", self.base.name));

        if let Some(namespace) = self.namespace {
            build_namespace_contents(ctx, &mut self.base, namespace, FunctionScope::Global)?;
        }
        for spec in std::mem::take(&mut self.modules) {
            self.base
                .add_builder(ctx, Box::new(ModuleBuilder::from_spec(spec, None)))?;
        }

        self.base.body.push("}".to_string());
        Ok(())
    }
}
