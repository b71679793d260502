use super::{Builder, BuilderBase};
use crate::context::GenerationContext;
use crate::error::Result;
use crate::names::{functionize, ruby_constant_name};
use rubric_decl::{DeclCache, DeclId, DeclKind};

/// A C++ enumeration exposed as a `Rice::Enum`.
#[derive(Debug)]
pub struct EnumerationBuilder {
    base: BuilderBase,
    enumeration: DeclId,
    parent: Option<String>,
}

impl EnumerationBuilder {
    pub fn new(cache: &DeclCache, enumeration: DeclId, parent: Option<String>) -> Self {
        Self {
            base: BuilderBase::new(cache.qualified_name(enumeration), Some(enumeration)),
            enumeration,
            parent,
        }
    }
}

impl Builder for EnumerationBuilder {
    fn base(&self) -> &BuilderBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BuilderBase {
        &mut self.base
    }

    fn build(&mut self, ctx: &mut GenerationContext<'_>) -> Result<()> {
        let cache = ctx.cache();
        let decl = cache.decl(self.enumeration);
        let DeclKind::Enumeration { is_scoped, values } = &decl.kind else {
            return Ok(());
        };

        let qualified = cache.qualified_name(self.enumeration);
        let ruby_name =
            ruby_constant_name(cache.renamed(self.enumeration).unwrap_or(decl.name.as_str()));
        let variable = ctx.unique_name(&format!("rb_e{}", functionize(&qualified)));
        self.base.rice_variable = variable.clone();

        self.base.add_include("#include <rice/Enum.hpp>");
        self.base.add_includes_for(ctx, self.enumeration);

        let parent = match &self.parent {
            Some(parent) => format!(", {}", parent),
            None => String::new(),
        };
        self.base.body.push(format!(
            "\tRice::Enum< {q} > {v} = Rice::define_enum< {q} >(\"{n}\"{p});",
            q = qualified,
            v = variable,
            n = ruby_name,
            p = parent
        ));

        // Unscoped enumerators live in the enclosing scope.
        let scope = if *is_scoped {
            qualified.clone()
        } else {
            cache.qualified_name(cache.tree().scope_of(self.enumeration))
        };
        for value in values {
            let spelled = if scope == "::" {
                value.name.clone()
            } else {
                format!("{}::{}", scope, value.name)
            };
            self.base.body.push(format!(
                "\t{}.define_value(\"{}\", {});",
                variable,
                ruby_constant_name(&value.name),
                spelled
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rubric_decl::{DeclTree, Enumerator};

    fn enumeration(is_scoped: bool, names: &[&str]) -> DeclKind {
        DeclKind::Enumeration {
            is_scoped,
            values: names
                .iter()
                .map(|n| Enumerator {
                    name: n.to_string(),
                    value: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_unscoped_values_qualified_by_enclosing_scope() {
        let mut tree = DeclTree::new();
        let gfx = tree.namespace(tree.root(), "gfx");
        let color = tree.add(gfx, "Color", enumeration(false, &["Red", "green"]));
        let cache = DeclCache::new(tree);
        let mut ctx = GenerationContext::new(&cache);
        let mut builder = EnumerationBuilder::new(&cache, color, Some("rb_mGfx".into()));
        builder.build(&mut ctx).unwrap();

        assert_eq!(
            builder.base().body,
            vec![
                "\tRice::Enum< gfx::Color > rb_egfx_Color = Rice::define_enum< gfx::Color >(\"Color\", rb_mGfx);",
                "\trb_egfx_Color.define_value(\"Red\", gfx::Red);",
                "\trb_egfx_Color.define_value(\"Green\", gfx::green);",
            ]
        );
    }

    #[test]
    fn test_scoped_values_qualified_by_enum() {
        let mut tree = DeclTree::new();
        let mode = tree.add(tree.root(), "Mode", enumeration(true, &["Fast"]));
        let cache = DeclCache::new(tree);
        let mut ctx = GenerationContext::new(&cache);
        let mut builder = EnumerationBuilder::new(&cache, mode, None);
        builder.build(&mut ctx).unwrap();

        assert_eq!(builder.base().body[1], "\trb_eMode.define_value(\"Fast\", Mode::Fast);");
    }
}
