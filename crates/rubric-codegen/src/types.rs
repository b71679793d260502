//! Type resolution for generated signatures.

use indexmap::IndexMap;
use rubric_decl::{CppType, DeclCache, DeclId, DeclKind};
use rustc_hash::FxHashMap;

/// A `to_ruby`/`from_ruby` specialization emitted once per type signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converter {
    /// e.g. `to_ruby< math::Vector* >`
    pub signature: String,
    /// Forward declaration, for headers
    pub prototype: Vec<String>,
    pub definition: Vec<String>,
}

/// Memoized type spellings and the converters they required.
#[derive(Debug, Default)]
pub struct TypeCache {
    resolved: FxHashMap<(DeclId, CppType), CppType>,
    converters: IndexMap<String, Converter>,
}

impl TypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrite every name in `ty` to the fully qualified (or typedef)
    /// spelling, as seen from `scope`. Names the tree does not know are
    /// kept as written.
    pub fn resolve(&mut self, cache: &DeclCache, scope: DeclId, ty: &CppType) -> CppType {
        if let Some(done) = self.resolved.get(&(scope, ty.clone())) {
            return done.clone();
        }
        let resolved = ty.map_names(&mut |name| match cache.tree().resolve_type_name(scope, name) {
            Some(id) => class_type(cache, id),
            None => name.to_string(),
        });
        self.resolved.insert((scope, ty.clone()), resolved.clone());
        resolved
    }

    /// Record that a wrapper returns `ty` (already resolved).
    pub fn note_return(&mut self, cache: &DeclCache, ty: &CppType) {
        let Some((class, is_const)) = wrapped_class_pointer(cache, ty) else {
            return;
        };
        let spelled = ty.to_cpp_string();
        let signature = format!("to_ruby< {} >", spelled);
        if self.converters.contains_key(&signature) {
            return;
        }
        let pointer = if is_const {
            format!("const_cast< {}* >(a)", class)
        } else {
            "a".to_string()
        };
        let head = format!("Rice::Object {}({} const & a)", signature, spelled);
        let converter = Converter {
            signature: signature.clone(),
            prototype: vec!["template<>".to_string(), format!("{};", head)],
            definition: vec![
                "template<>".to_string(),
                format!("{} {{", head),
                format!(
                    "\treturn Rice::Data_Object< {} >({}, Rice::Data_Type< {} >::klass(), 0, 0);",
                    class, pointer, class
                ),
                "}".to_string(),
            ],
        };
        self.converters.insert(signature, converter);
    }

    /// Record that a wrapper takes `ty` (already resolved). Only pointers
    /// to const wrapped classes need a converter.
    pub fn note_param(&mut self, cache: &DeclCache, ty: &CppType) {
        let Some((class, true)) = wrapped_class_pointer(cache, ty) else {
            return;
        };
        let spelled = ty.to_cpp_string();
        let signature = format!("from_ruby< {} >", spelled);
        if self.converters.contains_key(&signature) {
            return;
        }
        let head = format!("{} {}(Rice::Object x)", spelled, signature);
        let converter = Converter {
            signature: signature.clone(),
            prototype: vec!["template<>".to_string(), format!("{};", head)],
            definition: vec![
                "template<>".to_string(),
                format!("{} {{", head),
                format!("\treturn from_ruby< {}* >(x);", class),
                "}".to_string(),
            ],
        };
        self.converters.insert(signature, converter);
    }

    pub fn converters(&self) -> impl Iterator<Item = &Converter> {
        self.converters.values()
    }

    pub fn into_converters(self) -> Vec<Converter> {
        self.converters.into_values().collect()
    }
}

/// The C++ spelling used for a class: its unique typedef when one exists
/// and typedef lookup is enabled for it, its qualified name otherwise.
pub fn class_type(cache: &DeclCache, id: DeclId) -> String {
    match humanizing_typedef(cache, id) {
        Some(alias) => cache.qualified_name(alias),
        None => cache.qualified_name(id),
    }
}

/// The typedef that renames class `id`, if exactly one does.
pub fn humanizing_typedef(cache: &DeclCache, id: DeclId) -> Option<DeclId> {
    if !cache.decl(id).is_class() || cache.typedef_lookup_disabled(id) {
        return None;
    }
    match cache.tree().typedefs_of(id).as_slice() {
        [alias] => Some(*alias),
        _ => None,
    }
}

/// `Some((class, is_const))` when `ty` is a pointer to a class in the tree.
fn wrapped_class_pointer(cache: &DeclCache, ty: &CppType) -> Option<(String, bool)> {
    let CppType::Pointer { pointee, is_const } = ty else {
        return None;
    };
    let CppType::Named(name) = pointee.as_ref() else {
        return None;
    };
    let id = cache.lookup(name)?;
    let wraps_class = match &cache.decl(id).kind {
        DeclKind::Class { .. } => true,
        DeclKind::Typedef {
            underlying: CppType::Named(target),
        } => cache
            .tree()
            .resolve_type_name(cache.tree().scope_of(id), target)
            .is_some_and(|t| cache.decl(t).is_class()),
        _ => false,
    };
    wraps_class.then(|| (name.clone(), *is_const))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rubric_decl::DeclTree;

    fn cache() -> (DeclCache, DeclId, DeclId) {
        let mut tree = DeclTree::new();
        let math = tree.namespace(tree.root(), "math");
        let vector = tree.add(
            math,
            "Vector",
            DeclKind::Class {
                is_struct: false,
                bases: Vec::new(),
            },
        );
        (DeclCache::new(tree), math, vector)
    }

    #[test]
    fn test_resolve_qualifies_names() {
        let (cache, math, _) = cache();
        let mut types = TypeCache::new();
        let ty = CppType::named("Vector").const_ref();
        assert_eq!(
            types.resolve(&cache, math, &ty).to_cpp_string(),
            "const math::Vector&"
        );
        let unknown = CppType::named("std::string");
        assert_eq!(types.resolve(&cache, math, &unknown), unknown);
    }

    #[test]
    fn test_converter_emitted_once_per_signature() {
        let (cache, _, _) = cache();
        let mut types = TypeCache::new();
        let ptr = CppType::named("math::Vector").ptr();
        types.note_return(&cache, &ptr);
        types.note_return(&cache, &ptr);
        types.note_param(&cache, &ptr);
        types.note_param(&cache, &CppType::named("math::Vector").const_ptr());
        types.note_return(&cache, &CppType::int().ptr());

        let signatures: Vec<&str> = types.converters().map(|c| c.signature.as_str()).collect();
        assert_eq!(
            signatures,
            vec!["to_ruby< math::Vector* >", "from_ruby< const math::Vector* >"]
        );
    }

    #[test]
    fn test_typedef_humanizes_class_type() {
        let (mut cache, math, vector) = {
            let mut tree = DeclTree::new();
            let math = tree.namespace(tree.root(), "math");
            let vector = tree.add(
                math,
                "VectorImpl",
                DeclKind::Class {
                    is_struct: false,
                    bases: Vec::new(),
                },
            );
            tree.add(
                math,
                "Vector",
                DeclKind::Typedef {
                    underlying: CppType::named("VectorImpl"),
                },
            );
            (DeclCache::new(tree), math, vector)
        };
        assert_eq!(class_type(&cache, vector), "math::Vector");

        cache.disable_typedef_lookup(vector);
        assert_eq!(class_type(&cache, vector), "math::VectorImpl");
        let mut types = TypeCache::new();
        assert_eq!(
            types
                .resolve(&cache, math, &CppType::named("VectorImpl"))
                .to_cpp_string(),
            "math::VectorImpl"
        );
    }
}
