//! Directors: subclasses that route virtual calls through Ruby.
//!
//! A class with virtual methods is registered through a director so that a
//! Ruby subclass overriding one of them is called back from C++. Each
//! override asks the Ruby object to dispatch the call; the matching
//! `default_` method reaches the C++ implementation and is what the Ruby
//! class binds.

use super::{ruby_member_name, Builder, BuilderBase};
use crate::context::GenerationContext;
use crate::error::Result;
use crate::names::{functionize, UniqueNames};
use rubric_decl::{CppType, DeclCache, DeclId, DeclKind, Param};
use rustc_hash::FxHashSet;
use std::collections::VecDeque;

/// One virtual method routed through a director.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorMethod {
    pub method: DeclId,
    pub ruby_name: String,
    /// Director member reaching the C++ implementation, distinct per
    /// overload
    pub default_name: String,
    /// Inherited pure virtual the class does not override
    pub inherited: bool,
}

/// Virtual methods a director of `class` overrides: its own, then the
/// pure virtual methods of its ancestors that nothing below them
/// implements. Ignored methods and operators without a Ruby name are left
/// out.
pub fn director_methods(cache: &DeclCache, class: DeclId) -> Vec<DirectorMethod> {
    let tree = cache.tree();
    let mut out = Vec::new();
    let mut implemented: FxHashSet<&str> = FxHashSet::default();
    let mut defaults = UniqueNames::default();
    let mut default_name = |method: DeclId| {
        defaults.unique(&format!("default_{}", functionize(&cache.decl(method).name)))
    };

    for method in tree.methods(class) {
        implemented.insert(cache.decl(method).name.as_str());
        if !cache.decl(method).is_virtual() || cache.is_ignored(method) {
            continue;
        }
        if let Some(ruby_name) = ruby_member_name(cache, method) {
            out.push(DirectorMethod {
                method,
                ruby_name,
                default_name: default_name(method),
                inherited: false,
            });
        }
    }

    let mut visited = vec![class];
    let mut pending: VecDeque<DeclId> = tree.superclasses(class).into();
    while let Some(ancestor) = pending.pop_front() {
        if visited.contains(&ancestor) {
            continue;
        }
        visited.push(ancestor);

        let methods = tree.methods(ancestor);
        for &method in &methods {
            let decl = cache.decl(method);
            let pure = matches!(decl.kind, DeclKind::Method { is_pure_virtual: true, .. });
            if !pure || implemented.contains(decl.name.as_str()) {
                continue;
            }
            if let Some(ruby_name) = ruby_member_name(cache, method) {
                out.push(DirectorMethod {
                    method,
                    ruby_name,
                    default_name: default_name(method),
                    inherited: true,
                });
            }
        }
        for &method in &methods {
            implemented.insert(cache.decl(method).name.as_str());
        }
        pending.extend(tree.superclasses(ancestor));
    }
    out
}

/// Whether `class` is registered through a director.
pub fn needs_director(cache: &DeclCache, class: DeclId) -> bool {
    !director_methods(cache, class).is_empty()
}

/// Emits the director class of a wrapped class and registers it with the
/// class's Rice variable.
#[derive(Debug)]
pub struct DirectorBuilder {
    base: BuilderBase,
    class: DeclId,
    class_type: String,
    class_variable: String,
    /// Parameters of the wrapped constructor; `None` when the class cannot
    /// be constructed from Ruby
    constructor: Option<Vec<Param>>,
    methods: Vec<DirectorMethod>,
}

impl DirectorBuilder {
    pub fn new(
        name: impl Into<String>,
        class: DeclId,
        class_type: impl Into<String>,
        class_variable: impl Into<String>,
        constructor: Option<Vec<Param>>,
        methods: Vec<DirectorMethod>,
    ) -> Self {
        Self {
            base: BuilderBase::new(name, None),
            class,
            class_type: class_type.into(),
            class_variable: class_variable.into(),
            constructor,
            methods,
        }
    }

    fn build_method(
        &self,
        ctx: &mut GenerationContext<'_>,
        method: &DirectorMethod,
    ) -> Vec<String> {
        let cache = ctx.cache();
        let decl = cache.decl(method.method);
        let DeclKind::Method {
            return_type,
            params,
            is_pure_virtual,
            is_const,
            ..
        } = &decl.kind
        else {
            return Vec::new();
        };

        let scope = cache.tree().scope_of(method.method);
        let returns = ctx.resolve(scope, return_type);
        let (signature, arguments) = signature(ctx, scope, params);
        let constness = if *is_const { " const" } else { "" };
        let spelled = returns.to_cpp_string();

        let mut call = format!("getSelf().call(\"{}\"", method.ruby_name);
        for argument in &arguments {
            call.push_str(", ");
            call.push_str(argument);
        }
        call.push(')');

        let mut lines = vec![format!(
            "\tvirtual {} {}({}){} {{",
            spelled, decl.name, signature, constness
        )];
        if returns.is_void() {
            lines.push(format!("\t\t{};", call));
        } else {
            lines.push(format!("\t\treturn from_ruby< {} >( {} );", spelled, call));
        }
        lines.push("\t}".to_string());

        if !decl.is_public() && !method.inherited {
            return lines;
        }
        lines.push(String::new());
        lines.push(format!(
            "\t{} {}({}){} {{",
            spelled, method.default_name, signature, constness
        ));
        if *is_pure_virtual || method.inherited {
            lines.push("\t\traisePureVirtual();".to_string());
        } else {
            let returns = if returns.is_void() { "" } else { "return " };
            lines.push(format!(
                "\t\t{}{}::{}({});",
                returns,
                self.class_type,
                decl.name,
                arguments.join(", ")
            ));
        }
        lines.push("\t}".to_string());
        lines
    }
}

/// Declared parameter list and the names to forward.
fn signature(
    ctx: &mut GenerationContext<'_>,
    scope: DeclId,
    params: &[Param],
) -> (String, Vec<String>) {
    let mut declared = Vec::new();
    let mut names = Vec::new();
    for (i, param) in params.iter().enumerate() {
        let name = param.name.clone().unwrap_or_else(|| format!("arg{}", i));
        let ty: CppType = ctx.resolve(scope, &param.ty);
        declared.push(ty.declare(&name));
        names.push(name);
    }
    (declared.join(", "), names)
}

impl Builder for DirectorBuilder {
    fn base(&self) -> &BuilderBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BuilderBase {
        &mut self.base
    }

    fn build(&mut self, ctx: &mut GenerationContext<'_>) -> Result<()> {
        let director = self.base.name.clone();
        self.base.add_include("#include <rice/Director.hpp>");

        let mut lines = vec![
            format!(
                "class {} : public {}, public Rice::Director {{",
                director, self.class_type
            ),
            "public:".to_string(),
        ];

        let (signature, arguments) = match &self.constructor {
            Some(params) => signature(ctx, self.class, params),
            None => (String::new(), Vec::new()),
        };
        if self.constructor.is_some() {
            let self_param = if signature.is_empty() {
                "Rice::Object self".to_string()
            } else {
                format!("Rice::Object self, {}", signature)
            };
            lines.push(format!(
                "\t{}({}) : {}({}), Rice::Director(self) {{ }}",
                director,
                self_param,
                self.class_type,
                arguments.join(", ")
            ));
        }

        for method in self.methods.clone() {
            lines.push(String::new());
            lines.extend(self.build_method(ctx, &method));
        }
        lines.push("};".to_string());
        self.base.declarations.extend(lines);

        self.base.body.push(format!(
            "\t{}.define_director< {} >();",
            self.class_variable, director
        ));
        if let Some(params) = &self.constructor {
            let mut types = vec![director.clone(), "Rice::Object".to_string()];
            for param in params {
                types.push(ctx.resolve_param(self.class, &param.ty).to_cpp_string());
            }
            self.base.body.push(format!(
                "\t{}.define_constructor(Rice::Constructor< {} >());",
                self.class_variable,
                types.join(", ")
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rubric_decl::{BaseSpecifier, DeclTree};

    fn class(bases: &[&str]) -> DeclKind {
        DeclKind::Class {
            is_struct: false,
            bases: bases.iter().map(|b| BaseSpecifier::public(*b)).collect(),
        }
    }

    fn method(is_virtual: bool, is_pure_virtual: bool) -> DeclKind {
        DeclKind::Method {
            return_type: CppType::Float,
            params: Vec::new(),
            is_static: false,
            is_virtual,
            is_pure_virtual,
            is_const: false,
        }
    }

    #[test]
    fn test_gating() {
        let mut tree = DeclTree::new();
        let shape = tree.add(tree.root(), "Shape", class(&[]));
        tree.add(shape, "area", method(true, true));
        let plain = tree.add(tree.root(), "Plain", class(&[]));
        tree.add(plain, "area", method(false, false));
        let square = tree.add(tree.root(), "Square", class(&["Shape"]));
        let blob = tree.add(tree.root(), "Blob", class(&["Shape"]));
        tree.add(blob, "area", method(false, false));
        let cache = DeclCache::new(tree);

        assert!(needs_director(&cache, shape));
        assert!(!needs_director(&cache, plain));
        assert!(!needs_director(&cache, blob));

        let inherited = director_methods(&cache, square);
        assert_eq!(inherited.len(), 1);
        assert!(inherited[0].inherited);
    }

    #[test]
    fn test_overloads_get_distinct_defaults() {
        let mut tree = DeclTree::new();
        let shape = tree.add(tree.root(), "Shape", class(&[]));
        tree.add(shape, "area", method(true, false));
        tree.add(
            shape,
            "area",
            DeclKind::Method {
                return_type: CppType::Float,
                params: vec![Param::new("scale", CppType::int())],
                is_static: false,
                is_virtual: true,
                is_pure_virtual: false,
                is_const: false,
            },
        );
        let cache = DeclCache::new(tree);
        let mut ctx = GenerationContext::new(&cache);

        let methods = director_methods(&cache, shape);
        let defaults: Vec<&str> = methods.iter().map(|m| m.default_name.as_str()).collect();
        assert_eq!(defaults, vec!["default_area", "default_area_1"]);

        let mut director =
            DirectorBuilder::new("ShapeDirector", shape, "Shape", "rb_cShape", None, methods);
        director.build(&mut ctx).unwrap();
        let declarations = &director.base().declarations;
        assert!(declarations.contains(&"\tfloat default_area() {".to_string()));
        assert!(declarations.contains(&"\tfloat default_area_1(int scale) {".to_string()));
        assert!(declarations.contains(&"\t\treturn Shape::area(scale);".to_string()));
    }

    #[test]
    fn test_director_class() {
        let mut tree = DeclTree::new();
        let shape = tree.add(tree.root(), "Shape", class(&[]));
        tree.add(shape, "area", method(true, true));
        let cache = DeclCache::new(tree);
        let mut ctx = GenerationContext::new(&cache);

        let methods = director_methods(&cache, shape);
        let mut director = DirectorBuilder::new(
            "ShapeDirector",
            shape,
            "Shape",
            "rb_cShape",
            Some(Vec::new()),
            methods,
        );
        director.build(&mut ctx).unwrap();

        assert_eq!(
            director.base().declarations,
            vec![
                "class ShapeDirector : public Shape, public Rice::Director {",
                "public:",
                "\tShapeDirector(Rice::Object self) : Shape(), Rice::Director(self) { }",
                "",
                "\tvirtual float area() {",
                "\t\treturn from_ruby< float >( getSelf().call(\"area\") );",
                "\t}",
                "",
                "\tfloat default_area() {",
                "\t\traisePureVirtual();",
                "\t}",
                "};",
            ]
        );
        assert_eq!(
            director.base().body,
            vec![
                "\trb_cShape.define_director< ShapeDirector >();",
                "\trb_cShape.define_constructor(Rice::Constructor< ShapeDirector, Rice::Object >());",
            ]
        );
    }
}
