use super::director::{director_methods, DirectorBuilder, DirectorMethod};
use super::{builder_for, is_exposed, ruby_member_name, Builder, BuilderBase};
use crate::context::GenerationContext;
use crate::error::{CodegenError, Result};
use crate::names::{functionize, ruby_constant_name, UniqueNames};
use crate::types::humanizing_typedef;
use crate::wrapper::{build_field_accessors, build_wrapper, Receiver};
use rubric_decl::{DeclCache, DeclId, DeclKind, Param};
use tracing::warn;

/// A C++ class or struct exposed as a `Rice::Data_Type`.
#[derive(Debug)]
pub struct ClassBuilder {
    base: BuilderBase,
    class: DeclId,
    /// Variable of the enclosing module or class
    parent: Option<String>,
}

impl ClassBuilder {
    pub fn new(cache: &DeclCache, class: DeclId, parent: Option<String>) -> Self {
        Self {
            base: BuilderBase::new(cache.qualified_name(class), Some(class)),
            class,
            parent,
        }
    }

    /// Ruby constant for the class: the rename, the humanizing typedef or
    /// the C++ name, in that order.
    fn ruby_name(&self, cache: &DeclCache) -> String {
        if let Some(renamed) = cache.renamed(self.class) {
            return ruby_constant_name(renamed);
        }
        let named = humanizing_typedef(cache, self.class).unwrap_or(self.class);
        ruby_constant_name(&cache.decl(named).name)
    }

    fn superclass(&self, cache: &DeclCache) -> Result<Option<DeclId>> {
        if let Some(chosen) = cache.chosen_superclass(self.class) {
            return Ok(Some(chosen));
        }
        let supers: Vec<DeclId> = cache
            .tree()
            .superclasses(self.class)
            .into_iter()
            .filter(|&s| !cache.is_ignored(s))
            .collect();
        match supers.as_slice() {
            [] => Ok(None),
            [only] => Ok(Some(*only)),
            many => Err(CodegenError::AmbiguousSuperclass {
                class: cache.qualified_name(self.class),
                candidates: many.iter().map(|&s| cache.qualified_name(s)).collect(),
            }),
        }
    }

    /// Parameters of the constructor to expose. A class without declared
    /// constructors gets the default one; a class whose constructors are
    /// all hidden gets none.
    fn constructor(&self, cache: &DeclCache) -> Option<Vec<Param>> {
        if let Some(chosen) = cache.chosen_constructor(self.class) {
            return Some(cache.decl(chosen).kind.params().to_vec());
        }
        let declared = cache.tree().constructors(self.class);
        if declared.is_empty() {
            return Some(Vec::new());
        }
        let visible: Vec<DeclId> = declared
            .into_iter()
            .filter(|&c| is_exposed(cache, c))
            .collect();
        let last = *visible.last()?;
        if visible.len() > 1 {
            warn!(
                class = %cache.qualified_name(self.class),
                count = visible.len(),
                "several constructors and none chosen, using the last one"
            );
        }
        Some(cache.decl(last).kind.params().to_vec())
    }

    fn define_method(&mut self, variable: &str, singleton: bool, ruby: &str, target: &str) {
        let definer = if singleton {
            "define_singleton_method"
        } else {
            "define_method"
        };
        self.base.body.push(format!(
            "\t{}.{}(\"{}\", &{});",
            variable, definer, ruby, target
        ));
    }
}

impl Builder for ClassBuilder {
    fn base(&self) -> &BuilderBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BuilderBase {
        &mut self.base
    }

    fn build(&mut self, ctx: &mut GenerationContext<'_>) -> Result<()> {
        let cache = ctx.cache();
        let tree = cache.tree();
        let class = self.class;
        let cpp = ctx.class_type(class);
        let ruby = self.ruby_name(cache);
        let superclass = self.superclass(cache)?;

        let variable = ctx.unique_name(&format!("rb_c{}", functionize(&cpp)));
        self.base.rice_variable = variable.clone();
        for include in [
            "#include <rice/Class.hpp>",
            "#include <rice/Data_Type.hpp>",
            "#include <rice/Constructor.hpp>",
        ] {
            self.base.add_include(include);
        }
        self.base.add_includes_for(ctx, class);

        let template = match superclass {
            Some(sup) => format!("{}, {}", cpp, ctx.class_type(sup)),
            None => cpp.clone(),
        };
        let define = match &self.parent {
            Some(parent) => format!(
                "Rice::define_class_under< {} >({}, \"{}\")",
                template, parent, ruby
            ),
            None => format!("Rice::define_class< {} >(\"{}\")", template, ruby),
        };
        self.base.body.push(format!(
            "\tRice::Data_Type< {} > {} = {};",
            cpp, variable, define
        ));

        let constructor = self.constructor(cache);

        // Ruby names first, so the director dispatches to the names the
        // class binds.
        let mut names = UniqueNames::default();
        let mut methods = Vec::new();
        for method in tree.methods(class) {
            if !is_exposed(cache, method) {
                continue;
            }
            if let Some(ruby) = ruby_member_name(cache, method) {
                methods.push((method, names.unique(&ruby)));
            }
        }

        let mut virtuals: Vec<DirectorMethod> = director_methods(cache, class);
        for entry in &mut virtuals {
            if let Some((_, ruby)) = methods.iter().find(|(m, _)| *m == entry.method) {
                entry.ruby_name = ruby.clone();
            }
        }
        let defaults: Vec<(DeclId, String)> = virtuals
            .iter()
            .map(|entry| (entry.method, entry.default_name.clone()))
            .collect();
        let director = if virtuals.is_empty() {
            if let Some(params) = &constructor {
                let mut types = vec![cpp.clone()];
                for param in params {
                    types.push(ctx.resolve_param(class, &param.ty).to_cpp_string());
                }
                self.base.body.push(format!(
                    "\t{}.define_constructor(Rice::Constructor< {} >());",
                    variable,
                    types.join(", ")
                ));
            }
            None
        } else {
            let name = ctx.unique_name(&format!("{}Director", functionize(&cpp)));
            let builder = DirectorBuilder::new(
                name.clone(),
                class,
                cpp.clone(),
                variable.clone(),
                constructor,
                virtuals,
            );
            self.base.add_builder(ctx, Box::new(builder))?;
            Some(name)
        };

        for (method, ruby) in methods {
            let decl = cache.decl(method);
            let DeclKind::Method {
                is_static,
                is_virtual,
                ..
            } = decl.kind
            else {
                continue;
            };
            match &director {
                Some(director) if is_virtual => {
                    let Some((_, default)) = defaults.iter().find(|(m, _)| *m == method) else {
                        continue;
                    };
                    let target = format!("{}::{}", director, default);
                    self.define_method(&variable, false, &ruby, &target);
                }
                _ if is_static => {
                    let wrapper =
                        build_wrapper(ctx, &mut self.base.declarations, method, Receiver::Object)?;
                    self.define_method(&variable, true, &ruby, &wrapper);
                }
                _ => {
                    let wrapper = build_wrapper(
                        ctx,
                        &mut self.base.declarations,
                        method,
                        Receiver::Instance(&cpp),
                    )?;
                    self.define_method(&variable, false, &ruby, &wrapper);
                }
            }
        }

        for field in tree.fields(class) {
            if !is_exposed(cache, field) {
                continue;
            }
            let Some(ruby) = ruby_member_name(cache, field) else {
                continue;
            };
            let singleton = matches!(
                cache.decl(field).kind,
                DeclKind::Field { is_static: true, .. }
            );
            let Some(accessors) =
                build_field_accessors(ctx, &mut self.base.declarations, field, &cpp)
            else {
                warn!(field = %cache.qualified_name(field), "cannot expose field, skipping");
                continue;
            };
            let ruby = names.unique(&ruby);
            self.define_method(&variable, singleton, &ruby, &accessors.getter);
            if let Some(setter) = accessors.setter {
                self.define_method(&variable, singleton, &format!("{}=", ruby), &setter);
            }
        }

        let nested = tree
            .children(class)
            .iter()
            .copied()
            .filter(|&id| is_exposed(cache, id));
        let moved = cache
            .moved_into(class)
            .iter()
            .copied()
            .filter(|&id| !cache.is_ignored(id));
        for id in nested.chain(moved) {
            let moved_here = cache.moved_to(id) == Some(class);
            match &cache.decl(id).kind {
                DeclKind::Function { .. } if moved_here => {
                    let Some(ruby) = ruby_member_name(cache, id) else {
                        continue;
                    };
                    let ruby = names.unique(&ruby);
                    self.base.add_includes_for(ctx, id);
                    if cache.is_instance_method(id) {
                        let wrapper = build_wrapper(
                            ctx,
                            &mut self.base.declarations,
                            id,
                            Receiver::FirstArgument(&cpp),
                        )?;
                        self.define_method(&variable, false, &ruby, &wrapper);
                    } else {
                        let wrapper =
                            build_wrapper(ctx, &mut self.base.declarations, id, Receiver::Object)?;
                        self.define_method(&variable, true, &ruby, &wrapper);
                    }
                }
                DeclKind::Method { is_static, .. } if moved_here => {
                    let Some(ruby) = ruby_member_name(cache, id) else {
                        continue;
                    };
                    let ruby = names.unique(&ruby);
                    // Called through the class that declares it.
                    let declaring = tree
                        .parent(id)
                        .map(|owner| ctx.class_type(owner))
                        .unwrap_or_else(|| cpp.clone());
                    self.base.add_includes_for(ctx, id);
                    let receiver = if *is_static {
                        Receiver::Object
                    } else {
                        Receiver::Instance(&declaring)
                    };
                    let wrapper = build_wrapper(ctx, &mut self.base.declarations, id, receiver)?;
                    self.define_method(&variable, *is_static, &ruby, &wrapper);
                }
                DeclKind::Class { .. } | DeclKind::Enumeration { .. } => {
                    if let Some(child) = builder_for(cache, id, Some(&variable)) {
                        self.base.add_builder(ctx, child)?;
                    }
                }
                _ => {}
            }
        }

        self.base
            .declarations
            .extend(cache.custom_declarations(class).iter().cloned());
        for wrapping in cache.custom_wrappings(class) {
            self.base
                .body
                .push(format!("\t{}", wrapping.replace("<class>", &variable)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rubric_decl::{Access, BaseSpecifier, CppType, DeclTree};

    fn class(bases: &[&str]) -> DeclKind {
        DeclKind::Class {
            is_struct: false,
            bases: bases.iter().map(|b| BaseSpecifier::public(*b)).collect(),
        }
    }

    fn constructor(params: Vec<Param>) -> DeclKind {
        DeclKind::Constructor { params }
    }

    fn method(returning: CppType) -> DeclKind {
        DeclKind::Method {
            return_type: returning,
            params: Vec::new(),
            is_static: false,
            is_virtual: false,
            is_pure_virtual: false,
            is_const: false,
        }
    }

    fn build(cache: &DeclCache, class: DeclId) -> Result<ClassBuilder> {
        let mut ctx = GenerationContext::new(cache);
        let mut builder = ClassBuilder::new(cache, class, None);
        builder.build(&mut ctx)?;
        Ok(builder)
    }

    #[test]
    fn test_plain_class() {
        let mut tree = DeclTree::new();
        let counter = tree.add(tree.root(), "Counter", class(&[]));
        tree.add(counter, "getValue", method(CppType::int()));
        let secret = tree.add(counter, "secret", method(CppType::int()));
        tree.set_access(secret, Access::Private);
        let cache = DeclCache::new(tree);

        let builder = build(&cache, counter).unwrap();
        assert_eq!(
            builder.base().body,
            vec![
                "\tRice::Data_Type< Counter > rb_cCounter = Rice::define_class< Counter >(\"Counter\");",
                "\trb_cCounter.define_constructor(Rice::Constructor< Counter >());",
                "\trb_cCounter.define_method(\"get_value\", &wrap_Counter_getValue);",
            ]
        );
        assert!(builder.base().builders.is_empty());
    }

    #[test]
    fn test_last_constructor_is_the_fallback() {
        let mut tree = DeclTree::new();
        let point = tree.add(tree.root(), "Point", class(&[]));
        tree.add(point, "Point", constructor(Vec::new()));
        tree.add(
            point,
            "Point",
            constructor(vec![
                Param::new("x", CppType::Double),
                Param::new("y", CppType::Double),
            ]),
        );
        let mut cache = DeclCache::new(tree);

        let builder = build(&cache, point).unwrap();
        assert_eq!(
            builder.base().body[1],
            "\trb_cPoint.define_constructor(Rice::Constructor< Point, double, double >());"
        );

        let first = cache.tree().constructors(point)[0];
        cache.choose_constructor(point, first).unwrap();
        let builder = build(&cache, point).unwrap();
        assert_eq!(
            builder.base().body[1],
            "\trb_cPoint.define_constructor(Rice::Constructor< Point >());"
        );
    }

    #[test]
    fn test_ambiguous_superclass() {
        let mut tree = DeclTree::new();
        tree.add(tree.root(), "Left", class(&[]));
        let right = tree.add(tree.root(), "Right", class(&[]));
        let both = tree.add(tree.root(), "Both", class(&["Left", "Right"]));
        let mut cache = DeclCache::new(tree);

        let err = build(&cache, both).unwrap_err();
        assert!(matches!(err, CodegenError::AmbiguousSuperclass { .. }));

        cache.choose_superclass(both, right).unwrap();
        let builder = build(&cache, both).unwrap();
        assert!(builder.base().body[0].contains("Rice::define_class< Both, Right >(\"Both\")"));
    }

    #[test]
    fn test_overloads_and_fields() {
        let mut tree = DeclTree::new();
        let vec = tree.add(tree.root(), "Vec", class(&[]));
        tree.add(vec, "scale", method(CppType::Void));
        tree.add(
            vec,
            "scale",
            DeclKind::Method {
                return_type: CppType::Void,
                params: vec![Param::new("by", CppType::Double)],
                is_static: false,
                is_virtual: false,
                is_pure_virtual: false,
                is_const: false,
            },
        );
        tree.add(
            vec,
            "len",
            DeclKind::Field {
                ty: CppType::int(),
                is_static: false,
                is_const: false,
            },
        );
        let cache = DeclCache::new(tree);

        let builder = build(&cache, vec).unwrap();
        let body = &builder.base().body;
        assert!(body.contains(&"\trb_cVec.define_method(\"scale\", &wrap_Vec_scale);".to_string()));
        assert!(body.contains(&"\trb_cVec.define_method(\"scale_1\", &wrap_Vec_scale_1);".to_string()));
        assert!(body.contains(&"\trb_cVec.define_method(\"len\", &wrap_Vec_len_get);".to_string()));
        assert!(body.contains(&"\trb_cVec.define_method(\"len=\", &wrap_Vec_len_set);".to_string()));
    }

    #[test]
    fn test_virtual_class_goes_through_director() {
        let mut tree = DeclTree::new();
        let shape = tree.add(tree.root(), "Shape", class(&[]));
        tree.add(
            shape,
            "area",
            DeclKind::Method {
                return_type: CppType::Float,
                params: Vec::new(),
                is_static: false,
                is_virtual: true,
                is_pure_virtual: true,
                is_const: false,
            },
        );
        let cache = DeclCache::new(tree);

        let builder = build(&cache, shape).unwrap();
        let body = &builder.base().body;
        assert_eq!(body.len(), 2);
        assert_eq!(
            body[1],
            "\trb_cShape.define_method(\"area\", &ShapeDirector::default_area);"
        );
        assert_eq!(builder.base().builders.len(), 1);
        assert_eq!(builder.base().builders[0].base().name, "ShapeDirector");
    }

    #[test]
    fn test_typedef_names_the_class() {
        let mut tree = DeclTree::new();
        let ns = tree.namespace(tree.root(), "geo");
        let imp = tree.add(ns, "PointImpl", class(&[]));
        tree.add(
            ns,
            "Point",
            DeclKind::Typedef {
                underlying: CppType::named("PointImpl"),
            },
        );
        let mut cache = DeclCache::new(tree);

        let builder = build(&cache, imp).unwrap();
        assert_eq!(
            builder.base().body[0],
            "\tRice::Data_Type< geo::Point > rb_cgeo_Point = Rice::define_class< geo::Point >(\"Point\");"
        );

        cache.disable_typedef_lookup(imp);
        let builder = build(&cache, imp).unwrap();
        assert!(builder.base().body[0].contains("(\"PointImpl\")"));
    }
}
