//! Annotation layer.
//!
//! Typed handles over declarations in a [`DeclCache`]. Each handle exposes
//! only the annotations that make sense for its kind:
//!
//! ```ignore
//! let mut cache = DeclCache::new(tree);
//! cache.class("math::Circle")?.use_superclass("math::Shape")?;
//! cache.function("math::internal")?.ignore();
//! let helper = cache.function("math::area_of")?.id();
//! cache.class("math::Circle")?.include(helper)?;
//! ```

use crate::cache::DeclCache;
use crate::decl::{DeclId, DeclKind};
use crate::error::{DeclError, Result};

impl DeclCache {
    fn find(
        &self,
        name: &str,
        kind: &'static str,
        matches: fn(&DeclKind) -> bool,
    ) -> Result<DeclId> {
        let candidates = self.tree().lookup_all(name);
        if candidates.is_empty() {
            return Err(DeclError::NotFound {
                kind,
                name: name.to_string(),
            });
        }
        candidates
            .into_iter()
            .find(|&id| matches(&self.decl(id).kind))
            .ok_or_else(|| DeclError::WrongKind {
                name: name.to_string(),
                expected: kind,
            })
    }

    /// Handle on the class or struct called `name`.
    pub fn class(&mut self, name: &str) -> Result<ClassHandle<'_>> {
        let id = self.find(name, "class", |k| matches!(k, DeclKind::Class { .. }))?;
        Ok(ClassHandle { cache: self, id })
    }

    /// Handle on a class by id.
    pub fn class_by_id(&mut self, id: DeclId) -> Result<ClassHandle<'_>> {
        if !self.decl(id).is_class() {
            return Err(DeclError::WrongKind {
                name: self.qualified_name(id),
                expected: "class",
            });
        }
        Ok(ClassHandle { cache: self, id })
    }

    /// Handle on the free function called `name`. With overloads, the first
    /// declaration is returned.
    pub fn function(&mut self, name: &str) -> Result<FunctionHandle<'_>> {
        let id = self.find(name, "function", |k| matches!(k, DeclKind::Function { .. }))?;
        Ok(FunctionHandle { cache: self, id })
    }

    /// Handle on the method called `name` (e.g. `math::Vector::len`).
    pub fn method(&mut self, name: &str) -> Result<FunctionHandle<'_>> {
        let id = self.find(name, "method", |k| matches!(k, DeclKind::Method { .. }))?;
        Ok(FunctionHandle { cache: self, id })
    }

    /// Handle on the enumeration called `name`.
    pub fn enumeration(&mut self, name: &str) -> Result<EnumHandle<'_>> {
        let id = self.find(name, "enumeration", |k| {
            matches!(k, DeclKind::Enumeration { .. })
        })?;
        Ok(EnumHandle { cache: self, id })
    }

    /// Id of the namespace called `name`; `::` is the global namespace.
    pub fn namespace(&self, name: &str) -> Result<DeclId> {
        if name == "::" {
            return Ok(self.tree().root());
        }
        self.find(name, "namespace", |k| matches!(k, DeclKind::Namespace))
    }
}

/// Annotations on a class or struct.
pub struct ClassHandle<'c> {
    cache: &'c mut DeclCache,
    id: DeclId,
}

impl ClassHandle<'_> {
    pub fn id(&self) -> DeclId {
        self.id
    }

    pub fn ignore(self) {
        self.cache.ignore(self.id);
    }

    pub fn rename(&mut self, name: &str) -> &mut Self {
        self.cache.rename(self.id, name);
        self
    }

    /// Move a method, function or nested class into this class.
    pub fn include(&mut self, node: DeclId) -> Result<&mut Self> {
        self.cache.move_to(node, self.id)?;
        Ok(self)
    }

    /// Move a free function into this class as an instance method: the
    /// receiver is passed as the function's first argument.
    pub fn include_as_instance_method(&mut self, function: DeclId) -> Result<&mut Self> {
        if !matches!(self.cache.decl(function).kind, DeclKind::Function { .. }) {
            return Err(DeclError::WrongKind {
                name: self.cache.qualified_name(function),
                expected: "function",
            });
        }
        self.cache.move_to(function, self.id)?;
        self.cache.set_instance_method(function);
        Ok(self)
    }

    /// Pick the superclass the embedding layer should see when the class
    /// has several.
    pub fn use_superclass(&mut self, name: &str) -> Result<&mut Self> {
        let scope = self.cache.tree().scope_of(self.id);
        let candidate = self
            .cache
            .tree()
            .resolve_type_name(scope, name)
            .ok_or_else(|| DeclError::NotFound {
                kind: "class",
                name: name.to_string(),
            })?;
        self.cache.choose_superclass(self.id, candidate)?;
        Ok(self)
    }

    /// Pick the constructor exposed to Ruby by its index among the
    /// declared constructors.
    pub fn use_constructor(&mut self, index: usize) -> Result<&mut Self> {
        let ctor = self
            .constructors()
            .get(index)
            .copied()
            .ok_or_else(|| DeclError::NotFound {
                kind: "constructor",
                name: format!("{}#{}", self.cache.qualified_name(self.id), index),
            })?;
        self.cache.choose_constructor(self.id, ctor)?;
        Ok(self)
    }

    pub fn constructors(&self) -> Vec<DeclId> {
        self.cache.tree().constructors(self.id)
    }

    /// Attach hand-written code. `wrapping` may use `<class>` to refer to
    /// the Ruby class variable. Repeated calls accumulate.
    pub fn add_custom_code(&mut self, declaration: &str, wrapping: &str) -> &mut Self {
        self.cache.add_custom_code(self.id, declaration, wrapping);
        self
    }

    pub fn disable_typedef_lookup(&mut self) -> &mut Self {
        self.cache.disable_typedef_lookup(self.id);
        self
    }
}

/// Annotations on a free function or method.
pub struct FunctionHandle<'c> {
    cache: &'c mut DeclCache,
    id: DeclId,
}

impl FunctionHandle<'_> {
    pub fn id(&self) -> DeclId {
        self.id
    }

    pub fn ignore(self) {
        self.cache.ignore(self.id);
    }

    pub fn rename(&mut self, name: &str) -> &mut Self {
        self.cache.rename(self.id, name);
        self
    }

    /// Every overload sharing this declaration's qualified name.
    pub fn overloads(&self) -> Vec<DeclId> {
        let name = self.cache.qualified_name(self.id);
        self.cache.tree().lookup_all(&name)
    }
}

/// Annotations on an enumeration.
pub struct EnumHandle<'c> {
    cache: &'c mut DeclCache,
    id: DeclId,
}

impl EnumHandle<'_> {
    pub fn id(&self) -> DeclId {
        self.id
    }

    pub fn ignore(self) {
        self.cache.ignore(self.id);
    }

    pub fn rename(&mut self, name: &str) -> &mut Self {
        self.cache.rename(self.id, name);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{BaseSpecifier, Param};
    use crate::types::CppType;
    use crate::DeclTree;

    fn sample() -> DeclCache {
        let mut tree = DeclTree::new();
        let ns = tree.namespace(tree.root(), "zoo");
        let class = |bases: Vec<BaseSpecifier>| DeclKind::Class {
            is_struct: false,
            bases,
        };
        tree.add(ns, "Animal", class(vec![]));
        tree.add(ns, "Pet", class(vec![]));
        let dog = tree.add(
            ns,
            "Dog",
            class(vec![BaseSpecifier::public("Animal"), BaseSpecifier::public("Pet")]),
        );
        tree.add(dog, "Dog", DeclKind::Constructor { params: vec![] });
        tree.add(
            dog,
            "Dog",
            DeclKind::Constructor {
                params: vec![Param::new("name", CppType::Char { signed: true }.const_ptr())],
            },
        );
        tree.add(
            ns,
            "bark",
            DeclKind::Function {
                return_type: CppType::Void,
                params: vec![Param::new("dog", CppType::named("Dog").ref_())],
            },
        );
        tree.add(
            ns,
            "Color",
            DeclKind::Enumeration {
                is_scoped: false,
                values: vec![],
            },
        );
        DeclCache::new(tree)
    }

    #[test]
    fn test_use_superclass_by_name() {
        let mut cache = sample();
        cache
            .class("zoo::Dog")
            .unwrap()
            .use_superclass("Pet")
            .unwrap();
        let dog = cache.lookup("zoo::Dog").unwrap();
        let pet = cache.lookup("zoo::Pet").unwrap();
        assert_eq!(cache.chosen_superclass(dog), Some(pet));
    }

    #[test]
    fn test_use_constructor_by_index() {
        let mut cache = sample();
        let mut dog = cache.class("zoo::Dog").unwrap();
        let second = dog.constructors()[1];
        dog.use_constructor(1).unwrap();
        let id = dog.id();
        assert_eq!(cache.chosen_constructor(id), Some(second));
        assert!(cache.class("zoo::Dog").unwrap().use_constructor(5).is_err());
    }

    #[test]
    fn test_include_as_instance_method() {
        let mut cache = sample();
        let bark = cache.function("zoo::bark").unwrap().id();
        cache
            .class("zoo::Dog")
            .unwrap()
            .include_as_instance_method(bark)
            .unwrap();
        assert!(cache.is_instance_method(bark));
        assert!(cache.is_moved(bark));
    }

    #[test]
    fn test_wrong_kind_is_reported() {
        let mut cache = sample();
        assert!(matches!(
            cache.class("zoo::bark"),
            Err(DeclError::WrongKind { .. })
        ));
        assert!(matches!(
            cache.enumeration("zoo::Missing"),
            Err(DeclError::NotFound { .. })
        ));
        assert!(cache.enumeration("zoo::Color").is_ok());
    }
}
