//! End-to-end generation over programmatically built declaration trees.

use rubric_codegen::{
    Builder, BuilderBase, CodegenError, ExtensionBuilder, GeneratedFile, GenerationContext,
    Writer, WriterMode,
};
use rubric_decl::{BaseSpecifier, CppType, DeclCache, DeclId, DeclKind, DeclTree, Param};

fn class(bases: &[&str]) -> DeclKind {
    DeclKind::Class {
        is_struct: false,
        bases: bases.iter().map(|b| BaseSpecifier::public(*b)).collect(),
    }
}

fn method(return_type: CppType, is_virtual: bool, is_pure_virtual: bool) -> DeclKind {
    DeclKind::Method {
        return_type,
        params: Vec::new(),
        is_static: false,
        is_virtual,
        is_pure_virtual,
        is_const: false,
    }
}

fn function(params: Vec<Param>) -> DeclKind {
    DeclKind::Function {
        return_type: CppType::Void,
        params,
    }
}

fn generate(cache: &DeclCache, namespace: &str, mode: WriterMode) -> Result<Vec<GeneratedFile>, CodegenError> {
    let mut ctx = GenerationContext::new(cache);
    let mut extension = ExtensionBuilder::new("ext", cache.lookup(namespace));
    extension.build(&mut ctx)?;
    Writer::new(mode).render(&extension, ctx)
}

fn single(cache: &DeclCache, namespace: &str) -> String {
    let files = generate(cache, namespace, WriterMode::Single).unwrap();
    files[0].contents.clone()
}

fn position(text: &str, needle: &str) -> usize {
    text.find(needle)
        .unwrap_or_else(|| panic!("`{}` not found in:\n{}", needle, text))
}

#[test]
fn test_superclasses_register_first() {
    let mut tree = DeclTree::new();
    let ns = tree.namespace(tree.root(), "ns");
    tree.add(ns, "C", class(&["B"]));
    tree.add(ns, "B", class(&["A"]));
    tree.add(ns, "A", class(&[]));
    let cache = DeclCache::new(tree);

    let text = single(&cache, "ns");
    let a = position(&text, "Rice::define_class< ns::A >(\"A\")");
    let b = position(&text, "Rice::define_class< ns::B, ns::A >(\"B\")");
    let c = position(&text, "Rice::define_class< ns::C, ns::B >(\"C\")");
    assert!(a < b && b < c);
}

#[test]
fn test_generation_is_deterministic() {
    let mut tree = DeclTree::new();
    let ns = tree.namespace(tree.root(), "ns");
    let shape = tree.add(ns, "Shape", class(&[]));
    tree.add(shape, "area", method(CppType::Float, true, true));
    tree.add(ns, "Square", class(&["Shape"]));
    tree.add(ns, "describe", function(vec![Param::new("s", CppType::named("Shape").ptr())]));
    let cache = DeclCache::new(tree);

    for mode in [WriterMode::Single, WriterMode::Multiple] {
        let first = generate(&cache, "ns", mode).unwrap();
        let second = generate(&cache, "ns", mode).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_moved_declarations_appear_once_at_new_owner() {
    let mut tree = DeclTree::new();
    let ns = tree.namespace(tree.root(), "ns");
    tree.add(ns, "Widget", class(&[]));
    let other = tree.add(ns, "Other", class(&[]));
    let inner = tree.add(other, "Inner", class(&[]));
    tree.add(ns, "helper", function(Vec::new()));
    let mut cache = DeclCache::new(tree);

    let helper = cache.function("ns::helper").unwrap().id();
    cache.class("ns::Widget").unwrap().include(helper).unwrap();
    let widget: DeclId = cache.class("ns::Widget").unwrap().id();
    cache.class_by_id(widget).unwrap().include(inner).unwrap();

    let text = single(&cache, "ns");
    assert_eq!(text.matches("define_singleton_method(\"helper\"").count(), 1);
    assert!(!text.contains("define_global_function(\"helper\""));
    assert_eq!(text.matches("void wrap_ns_helper(").count(), 1);
    assert_eq!(
        text.matches("Rice::define_class_under< ns::Other::Inner >(rb_cns_Widget, \"Inner\")")
            .count(),
        1
    );
    assert!(!text.contains("(rb_cns_Other, \"Inner\")"));
}

#[test]
fn test_moved_methods_keep_their_declaring_receiver() {
    let mut tree = DeclTree::new();
    let ns = tree.namespace(tree.root(), "ns");
    let x = tree.add(ns, "X", class(&[]));
    tree.add(x, "compute", method(CppType::Float, false, false));
    tree.add(
        x,
        "make",
        DeclKind::Method {
            return_type: CppType::int(),
            params: Vec::new(),
            is_static: true,
            is_virtual: false,
            is_pure_virtual: false,
            is_const: false,
        },
    );
    tree.add(ns, "Y", class(&[]));
    let mut cache = DeclCache::new(tree);

    let compute = cache.method("ns::X::compute").unwrap().id();
    let make = cache.method("ns::X::make").unwrap().id();
    {
        let mut y = cache.class("ns::Y").unwrap();
        y.include(compute).unwrap();
        y.include(make).unwrap();
    }

    let text = single(&cache, "ns");
    assert_eq!(text.matches("float wrap_ns_X_compute(ns::X* self) {").count(), 1);
    assert!(text.contains("\treturn self->compute();"));
    assert!(text.contains("rb_cns_Y.define_method(\"compute\", &wrap_ns_X_compute);"));
    assert!(!text.contains("rb_cns_X.define_method(\"compute\""));

    assert_eq!(text.matches("int wrap_ns_X_make(Rice::Object self) {").count(), 1);
    assert!(text.contains("\treturn ns::X::make();"));
    assert!(text.contains("rb_cns_Y.define_singleton_method(\"make\", &wrap_ns_X_make);"));
    assert!(!text.contains("rb_cns_X.define_singleton_method(\"make\""));
}

#[test]
fn test_class_moved_into_namespace() {
    let mut tree = DeclTree::new();
    let ns = tree.namespace(tree.root(), "ns");
    let outer = tree.add(ns, "Outer", class(&[]));
    let nested = tree.add(outer, "Nested", class(&[]));
    let target = tree.namespace(ns, "target");
    tree.add(target, "Local", class(&[]));
    let mut cache = DeclCache::new(tree);
    cache.move_to(nested, target).unwrap();

    let text = single(&cache, "ns");
    assert_eq!(
        text.matches(
            "Rice::define_class_under< ns::Outer::Nested >(rb_mns_target, \"Nested\")"
        )
        .count(),
        1
    );
    assert!(!text.contains("(rb_cns_Outer, \"Nested\")"));
}

#[test]
fn test_virtual_overloads_bind_distinct_defaults() {
    let mut tree = DeclTree::new();
    let ns = tree.namespace(tree.root(), "ns");
    let s = tree.add(ns, "S", class(&[]));
    tree.add(s, "area", method(CppType::Float, true, false));
    tree.add(
        s,
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

    let text = single(&cache, "ns");
    assert!(text.contains("\tfloat default_area() {"));
    assert!(text.contains("\tfloat default_area_1(int scale) {"));
    assert!(text.contains("rb_cns_S.define_method(\"area\", &ns_SDirector::default_area);"));
    assert!(text.contains("rb_cns_S.define_method(\"area_1\", &ns_SDirector::default_area_1);"));
    assert!(text.contains("getSelf().call(\"area_1\", scale)"));
}

#[test]
fn test_ignored_declarations_are_skipped() {
    let mut tree = DeclTree::new();
    let ns = tree.namespace(tree.root(), "ns");
    tree.add(ns, "Hidden", class(&[]));
    tree.add(ns, "internal", function(Vec::new()));
    tree.add(ns, "visible", function(Vec::new()));
    let mut cache = DeclCache::new(tree);
    cache.class("ns::Hidden").unwrap().ignore();
    cache.function("ns::internal").unwrap().ignore();

    let text = single(&cache, "ns");
    assert!(!text.contains("Hidden"));
    assert!(!text.contains("internal"));
    assert!(text.contains("define_global_function(\"visible\""));
}

#[test]
fn test_ambiguous_superclass_writes_nothing() {
    let mut tree = DeclTree::new();
    let ns = tree.namespace(tree.root(), "ns");
    tree.add(ns, "Left", class(&[]));
    tree.add(ns, "Right", class(&[]));
    tree.add(ns, "Both", class(&["Left", "Right"]));
    let mut cache = DeclCache::new(tree);

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("generated");
    let result = generate(&cache, "ns", WriterMode::Multiple)
        .and_then(|files| Writer::new(WriterMode::Multiple).write_to(&files, &out));
    assert!(matches!(result, Err(CodegenError::AmbiguousSuperclass { .. })));
    assert!(!out.exists());

    cache
        .class("ns::Both")
        .unwrap()
        .use_superclass("Left")
        .unwrap();
    let text = single(&cache, "ns");
    assert!(text.contains("Rice::define_class< ns::Both, ns::Left >(\"Both\")"));
    assert!(!text.contains("ns::Both, ns::Right"));
}

#[test]
fn test_overloads_get_distinct_wrappers() {
    let mut tree = DeclTree::new();
    let ns = tree.namespace(tree.root(), "ns");
    tree.add(ns, "scale", function(vec![Param::new("by", CppType::int())]));
    tree.add(ns, "scale", function(vec![Param::new("by", CppType::Double)]));
    let cache = DeclCache::new(tree);

    let text = single(&cache, "ns");
    assert!(text.contains("void wrap_ns_scale(Rice::Object self, int by) {"));
    assert!(text.contains("void wrap_ns_scale_1(Rice::Object self, double by) {"));
    assert!(text.contains("define_global_function(\"scale\", &wrap_ns_scale);"));
    assert!(text.contains("define_global_function(\"scale_1\", &wrap_ns_scale_1);"));
}

#[test]
fn test_custom_code_accumulates_in_order() {
    let mut tree = DeclTree::new();
    let ns = tree.namespace(tree.root(), "ns");
    tree.add(ns, "Widget", class(&[]));
    let mut cache = DeclCache::new(tree);
    {
        let mut widget = cache.class("ns::Widget").unwrap();
        for i in 0..3 {
            widget.add_custom_code(
                &format!("int extra_{}(ns::Widget* self) {{ return {}; }}", i, i),
                &format!("<class>.define_method(\"extra_{}\", &extra_{});", i, i),
            );
        }
    }

    let text = single(&cache, "ns");
    let declared: Vec<usize> = (0..3)
        .map(|i| position(&text, &format!("int extra_{}(ns::Widget* self)", i)))
        .collect();
    let wrapped: Vec<usize> = (0..3)
        .map(|i| position(&text, &format!("rb_cns_Widget.define_method(\"extra_{}\", &extra_{});", i, i)))
        .collect();
    assert!(declared.windows(2).all(|w| w[0] < w[1]));
    assert!(wrapped.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_shape_and_circle() {
    let mut tree = DeclTree::new();
    let shape = tree.add(tree.root(), "Shape", class(&[]));
    tree.add(shape, "area", method(CppType::Float, true, true));
    let circle = tree.add(tree.root(), "Circle", class(&["Shape"]));
    tree.add(circle, "area", method(CppType::Float, false, false));
    tree.add(
        circle,
        "radius",
        DeclKind::Field {
            ty: CppType::Float,
            is_static: false,
            is_const: false,
        },
    );
    let cache = DeclCache::new(tree);

    let text = single(&cache, "::");
    assert!(text.contains("class ShapeDirector : public Shape, public Rice::Director {"));
    assert!(!text.contains("CircleDirector"));

    let director = position(&text, "rb_cShape.define_director< ShapeDirector >();");
    let circle = position(&text, "Rice::define_class< Circle, Shape >(\"Circle\")");
    assert!(director < circle);

    assert!(text.contains("rb_cShape.define_method(\"area\", &ShapeDirector::default_area);"));
    assert!(text.contains("float wrap_Circle_area(Circle* self) {"));
    assert!(text.contains("rb_cCircle.define_method(\"area\", &wrap_Circle_area);"));
    assert!(text.contains("rb_cCircle.define_method(\"radius=\", &wrap_Circle_radius_set);"));
}

#[test]
fn test_multiple_files_per_top_level_builder() {
    let mut tree = DeclTree::new();
    let ns = tree.namespace(tree.root(), "ns");
    tree.add(ns, "A", class(&[]));
    let inner = tree.namespace(ns, "inner");
    tree.add(inner, "B", class(&[]));
    let cache = DeclCache::new(tree);

    let files = generate(&cache, "ns", WriterMode::Multiple).unwrap();
    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "ext.rb.cpp",
            "_ns_A.rb.hpp",
            "_ns_A.rb.cpp",
            "_ns_inner.rb.hpp",
            "_ns_inner.rb.cpp",
        ]
    );
    let entry = &files[0].contents;
    assert!(entry.contains("void Init_ext() {"));
    assert!(entry.contains("\tregister_ns_A();\n\tregister_ns_inner();\n}"));
    assert!(files[4].contents.contains("Rice::define_class_under< ns::inner::B >(rb_mns_inner, \"B\")"));
}

#[test]
fn test_abstract_builder_is_rejected() {
    let cache = DeclCache::new(DeclTree::new());
    let mut ctx = GenerationContext::new(&cache);
    let mut abstract_builder = BuilderBase::new("base", None);
    assert!(matches!(
        abstract_builder.build(&mut ctx),
        Err(CodegenError::NotImplemented { .. })
    ));
}

#[test]
fn test_inheritance_cycle_is_reported() {
    let mut tree = DeclTree::new();
    let ns = tree.namespace(tree.root(), "ns");
    tree.add(ns, "A", class(&["B"]));
    tree.add(ns, "B", class(&["A"]));
    let cache = DeclCache::new(tree);

    let result = generate(&cache, "ns", WriterMode::Single);
    assert!(matches!(result, Err(CodegenError::InheritanceCycle { .. })));
}
