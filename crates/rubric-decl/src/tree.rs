//! Arena holding every declaration of one generation run.

use crate::decl::{Access, Decl, DeclId, DeclKind};
use crate::types::CppType;
use smol_str::SmolStr;

/// The declaration tree produced by a parser.
///
/// Node 0 is always the global namespace `::`. Nodes are never removed;
/// annotations live in [`crate::DeclCache`], not here.
#[derive(Debug, Clone)]
pub struct DeclTree {
    decls: Vec<Decl>,
}

impl DeclTree {
    pub fn new() -> Self {
        Self {
            decls: vec![Decl {
                id: DeclId(0),
                name: SmolStr::default(),
                kind: DeclKind::Namespace,
                access: Access::Public,
                parent: None,
                children: Vec::new(),
                file: None,
            }],
        }
    }

    /// The global namespace.
    pub fn root(&self) -> DeclId {
        DeclId(0)
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.len() <= 1
    }

    pub fn get(&self, id: DeclId) -> &Decl {
        &self.decls[id.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Decl> {
        self.decls.iter()
    }

    /// Add a public declaration under `parent`.
    pub fn add(&mut self, parent: DeclId, name: impl Into<SmolStr>, kind: DeclKind) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        self.decls.push(Decl {
            id,
            name: name.into(),
            kind,
            access: Access::Public,
            parent: Some(parent),
            children: Vec::new(),
            file: None,
        });
        self.decls[parent.index()].children.push(id);
        id
    }

    /// Get or create the namespace `name` under `parent`.
    ///
    /// Re-opened namespaces map onto a single node.
    pub fn namespace(&mut self, parent: DeclId, name: &str) -> DeclId {
        if !name.is_empty() {
            if let Some(existing) = self
                .children(parent)
                .iter()
                .copied()
                .find(|&c| self.get(c).is_namespace() && self.get(c).name == name)
            {
                return existing;
            }
        }
        self.add(parent, name, DeclKind::Namespace)
    }

    pub fn set_access(&mut self, id: DeclId, access: Access) {
        self.decls[id.index()].access = access;
    }

    pub fn set_file(&mut self, id: DeclId, file: impl Into<String>) {
        self.decls[id.index()].file = Some(file.into());
    }

    pub fn parent(&self, id: DeclId) -> Option<DeclId> {
        self.get(id).parent
    }

    pub fn children(&self, id: DeclId) -> &[DeclId] {
        &self.get(id).children
    }

    /// Fully qualified name without a leading `::`, e.g. `math::Vector::len`.
    /// The global namespace is spelled `::`.
    pub fn qualified_name(&self, id: DeclId) -> String {
        if id == self.root() {
            return "::".to_string();
        }
        let mut parts = Vec::new();
        let mut current = Some(id);
        while let Some(cur) = current {
            if cur == self.root() {
                break;
            }
            parts.push(self.get(cur).name.as_str());
            current = self.parent(cur);
        }
        parts.reverse();
        parts.join("::")
    }

    fn children_where(&self, id: DeclId, pred: impl Fn(&Decl) -> bool) -> Vec<DeclId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| pred(self.get(c)))
            .collect()
    }

    pub fn namespaces(&self, id: DeclId) -> Vec<DeclId> {
        self.children_where(id, |d| d.is_namespace())
    }

    /// Classes and structs directly inside `id`.
    pub fn classes(&self, id: DeclId) -> Vec<DeclId> {
        self.children_where(id, |d| d.is_class())
    }

    pub fn functions(&self, id: DeclId) -> Vec<DeclId> {
        self.children_where(id, |d| matches!(d.kind, DeclKind::Function { .. }))
    }

    pub fn methods(&self, id: DeclId) -> Vec<DeclId> {
        self.children_where(id, |d| matches!(d.kind, DeclKind::Method { .. }))
    }

    pub fn constructors(&self, id: DeclId) -> Vec<DeclId> {
        self.children_where(id, |d| matches!(d.kind, DeclKind::Constructor { .. }))
    }

    pub fn fields(&self, id: DeclId) -> Vec<DeclId> {
        self.children_where(id, |d| matches!(d.kind, DeclKind::Field { .. }))
    }

    pub fn enumerations(&self, id: DeclId) -> Vec<DeclId> {
        self.children_where(id, |d| matches!(d.kind, DeclKind::Enumeration { .. }))
    }

    /// Every child of `scope` called `name`, in declaration order.
    pub fn find_children(&self, scope: DeclId, name: &str) -> Vec<DeclId> {
        self.children_where(scope, |d| d.name == name)
    }

    /// Look up a declaration by qualified name, starting at the global
    /// namespace. For overloaded names the first declaration wins; see
    /// [`DeclTree::lookup_all`].
    pub fn lookup(&self, qualified: &str) -> Option<DeclId> {
        self.lookup_all(qualified).into_iter().next()
    }

    /// Every declaration matching a qualified name (overload set).
    pub fn lookup_all(&self, qualified: &str) -> Vec<DeclId> {
        self.lookup_from(self.root(), qualified.trim_start_matches("::"))
    }

    fn lookup_from(&self, scope: DeclId, path: &str) -> Vec<DeclId> {
        let path = path.trim();
        if path.is_empty() {
            return vec![scope];
        }
        let segments: Vec<&str> = path.split("::").map(str::trim).collect();
        let (last, init) = match segments.split_last() {
            Some(split) => split,
            None => return Vec::new(),
        };

        let mut current = scope;
        for segment in init {
            let next = self
                .find_children(current, segment)
                .into_iter()
                .find(|&c| {
                    let decl = self.get(c);
                    decl.is_namespace()
                        || decl.is_class()
                        || matches!(decl.kind, DeclKind::Enumeration { .. })
                });
            match next {
                Some(next) => current = next,
                None => return Vec::new(),
            }
        }
        self.find_children(current, last)
    }

    /// Resolve a type name as written inside `scope`, searching enclosing
    /// scopes outwards. Only classes, enumerations and typedefs match.
    pub fn resolve_type_name(&self, scope: DeclId, name: &str) -> Option<DeclId> {
        let is_type = |id: &DeclId| {
            matches!(
                self.get(*id).kind,
                DeclKind::Class { .. } | DeclKind::Enumeration { .. } | DeclKind::Typedef { .. }
            )
        };

        if let Some(absolute) = name.strip_prefix("::") {
            return self.lookup_all(absolute).into_iter().find(|c| is_type(c));
        }

        let mut current = Some(scope);
        while let Some(cur) = current {
            if let Some(found) = self.lookup_from(cur, name).into_iter().find(|c| is_type(c)) {
                return Some(found);
            }
            current = self.parent(cur);
        }
        None
    }

    /// The enclosing namespace or class used to resolve names written in
    /// the declaration of `id`.
    pub fn scope_of(&self, id: DeclId) -> DeclId {
        self.parent(id).unwrap_or(self.root())
    }

    /// Base classes of `id` that are present in this tree, in declaration
    /// order. Bases that cannot be resolved are not reported.
    pub fn superclasses(&self, id: DeclId) -> Vec<DeclId> {
        let bases = match &self.get(id).kind {
            DeclKind::Class { bases, .. } => bases,
            _ => return Vec::new(),
        };
        let scope = self.scope_of(id);
        bases
            .iter()
            .filter_map(|base| self.resolve_type_name(scope, &base.name))
            .filter(|&b| self.get(b).is_class())
            .collect()
    }

    /// Typedefs anywhere in the tree that alias the class `id` directly.
    pub fn typedefs_of(&self, id: DeclId) -> Vec<DeclId> {
        self.decls
            .iter()
            .filter_map(|decl| match &decl.kind {
                DeclKind::Typedef {
                    underlying: CppType::Named(name),
                } => {
                    let target = self.resolve_type_name(self.scope_of(decl.id), name);
                    (target == Some(id)).then_some(decl.id)
                }
                _ => None,
            })
            .collect()
    }
}

impl Default for DeclTree {
    fn default() -> Self {
        Self::new()
    }
}
