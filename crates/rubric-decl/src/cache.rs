//! Declaration model cache.
//!
//! Holds the declaration tree of one generation run together with the
//! annotation state attached to its nodes. A fresh cache is created for
//! every run; nothing here is global.

use crate::decl::{Decl, DeclId, DeclKind};
use crate::error::{DeclError, Result};
use crate::tree::DeclTree;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

/// Annotation state of a single declaration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotation {
    /// Excluded from generation together with its descendants
    pub ignored: bool,
    /// The class or namespace that now owns this declaration
    pub moved_to: Option<DeclId>,
    /// Name to use on the Ruby side instead of the C++ name
    pub renamed_to: Option<SmolStr>,
    pub chosen_superclass: Option<DeclId>,
    pub chosen_constructor: Option<DeclId>,
    /// Custom code, in the order it was attached
    pub custom_declarations: Vec<String>,
    pub custom_wrappings: Vec<String>,
    pub typedef_lookup_disabled: bool,
    /// Free function exposed as an instance method of the class it moved to
    pub as_instance_method: bool,
}

/// Declaration tree plus per-node annotations.
#[derive(Debug, Clone)]
pub struct DeclCache {
    tree: DeclTree,
    annotations: FxHashMap<DeclId, Annotation>,
    /// Reverse index of `moved_to`, in move order
    moved_in: FxHashMap<DeclId, Vec<DeclId>>,
}

impl DeclCache {
    pub fn new(tree: DeclTree) -> Self {
        Self {
            tree,
            annotations: FxHashMap::default(),
            moved_in: FxHashMap::default(),
        }
    }

    pub fn tree(&self) -> &DeclTree {
        &self.tree
    }

    pub fn decl(&self, id: DeclId) -> &Decl {
        self.tree.get(id)
    }

    /// Resolve a qualified name to its canonical node.
    pub fn lookup(&self, qualified: &str) -> Option<DeclId> {
        self.tree.lookup(qualified)
    }

    pub fn qualified_name(&self, id: DeclId) -> String {
        self.tree.qualified_name(id)
    }

    pub fn annotation(&self, id: DeclId) -> Option<&Annotation> {
        self.annotations.get(&id)
    }

    fn entry(&mut self, id: DeclId) -> &mut Annotation {
        self.annotations.entry(id).or_default()
    }

    pub fn ignore(&mut self, id: DeclId) {
        self.entry(id).ignored = true;
    }

    pub fn is_ignored(&self, id: DeclId) -> bool {
        self.annotation(id).is_some_and(|a| a.ignored)
    }

    /// Move `id` so that `owner` wraps it instead of its declaring scope.
    pub fn move_to(&mut self, id: DeclId, owner: DeclId) -> Result<()> {
        if self.is_ignored(id) {
            return Err(DeclError::AlreadyIgnored {
                name: self.qualified_name(id),
            });
        }

        let target = self.decl(owner);
        let owner_ok = (target.is_class() || target.is_namespace())
            && owner != id
            && !self.is_within(owner, id);
        if !owner_ok {
            return Err(DeclError::InvalidMoveTarget {
                name: self.qualified_name(id),
                target: self.qualified_name(owner),
            });
        }

        if let Some(previous) = self.moved_to(id) {
            if let Some(list) = self.moved_in.get_mut(&previous) {
                list.retain(|&m| m != id);
            }
        }
        self.entry(id).moved_to = Some(owner);
        self.moved_in.entry(owner).or_default().push(id);
        Ok(())
    }

    /// Whether `id` is `ancestor` or nested somewhere inside it.
    fn is_within(&self, id: DeclId, ancestor: DeclId) -> bool {
        let mut current = Some(id);
        while let Some(cur) = current {
            if cur == ancestor {
                return true;
            }
            current = self.tree.parent(cur);
        }
        false
    }

    pub fn moved_to(&self, id: DeclId) -> Option<DeclId> {
        self.annotation(id).and_then(|a| a.moved_to)
    }

    pub fn is_moved(&self, id: DeclId) -> bool {
        self.moved_to(id).is_some()
    }

    /// Declarations moved into `owner`, in the order they were moved.
    pub fn moved_into(&self, owner: DeclId) -> &[DeclId] {
        self.moved_in.get(&owner).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn rename(&mut self, id: DeclId, name: impl Into<SmolStr>) {
        self.entry(id).renamed_to = Some(name.into());
    }

    pub fn renamed(&self, id: DeclId) -> Option<&str> {
        self.annotation(id).and_then(|a| a.renamed_to.as_deref())
    }

    /// Pick the base class the embedding layer should see.
    pub fn choose_superclass(&mut self, class: DeclId, candidate: DeclId) -> Result<()> {
        if !self.tree.superclasses(class).contains(&candidate) {
            return Err(DeclError::NotASuperclass {
                class: self.qualified_name(class),
                candidate: self.qualified_name(candidate),
            });
        }
        self.entry(class).chosen_superclass = Some(candidate);
        Ok(())
    }

    pub fn chosen_superclass(&self, class: DeclId) -> Option<DeclId> {
        self.annotation(class).and_then(|a| a.chosen_superclass)
    }

    /// Pick the constructor exposed to Ruby.
    pub fn choose_constructor(&mut self, class: DeclId, ctor: DeclId) -> Result<()> {
        let is_ctor = matches!(self.decl(ctor).kind, DeclKind::Constructor { .. })
            && self.tree.parent(ctor) == Some(class);
        if !is_ctor {
            return Err(DeclError::NotAConstructor {
                class: self.qualified_name(class),
                candidate: self.qualified_name(ctor),
            });
        }
        self.entry(class).chosen_constructor = Some(ctor);
        Ok(())
    }

    pub fn chosen_constructor(&self, class: DeclId) -> Option<DeclId> {
        self.annotation(class).and_then(|a| a.chosen_constructor)
    }

    /// Attach custom code. Repeated calls accumulate.
    pub fn add_custom_code(
        &mut self,
        id: DeclId,
        declaration: impl Into<String>,
        wrapping: impl Into<String>,
    ) {
        let entry = self.entry(id);
        entry.custom_declarations.push(declaration.into());
        entry.custom_wrappings.push(wrapping.into());
    }

    pub fn custom_declarations(&self, id: DeclId) -> &[String] {
        self.annotation(id)
            .map(|a| a.custom_declarations.as_slice())
            .unwrap_or(&[])
    }

    pub fn custom_wrappings(&self, id: DeclId) -> &[String] {
        self.annotation(id)
            .map(|a| a.custom_wrappings.as_slice())
            .unwrap_or(&[])
    }

    pub fn disable_typedef_lookup(&mut self, id: DeclId) {
        self.entry(id).typedef_lookup_disabled = true;
    }

    pub fn typedef_lookup_disabled(&self, id: DeclId) -> bool {
        self.annotation(id).is_some_and(|a| a.typedef_lookup_disabled)
    }

    pub fn set_instance_method(&mut self, id: DeclId) {
        self.entry(id).as_instance_method = true;
    }

    pub fn is_instance_method(&self, id: DeclId) -> bool {
        self.annotation(id).is_some_and(|a| a.as_instance_method)
    }
}
