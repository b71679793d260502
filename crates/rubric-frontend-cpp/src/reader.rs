use rubric_decl::{Access, BaseSpecifier, CppType, DeclId, DeclKind, DeclTree, Enumerator, Param};
use tracing::{debug, trace, warn};
use tree_sitter::{Node, Tree};

/// Read the declarations of one parsed header into `decls`.
///
/// Every declaration created is tagged with `file`. Function bodies,
/// templates and anonymous namespaces are not read.
pub fn read(tree: &Tree, source: &str, file: &str, decls: &mut DeclTree) {
    let root = tree.root_node();
    if root.has_error() {
        warn!(file, "header has syntax errors, reading what parsed");
    }
    let mut ctx = ReadingContext {
        source,
        file,
        decls,
    };
    let scope = ctx.decls.root();
    ctx.read_items(root, scope);
}

struct ReadingContext<'a> {
    source: &'a str,
    file: &'a str,
    decls: &'a mut DeclTree,
}

/// Result of walking a declarator.
struct Declared<'t> {
    name: Option<String>,
    /// The declarator named a destructor or operator
    special: bool,
    ty: CppType,
    /// The function declarator, when the declarator declares a function
    function: Option<Node<'t>>,
}

impl<'a> ReadingContext<'a> {
    fn text(&self, node: Node) -> &'a str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn children<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        let mut cursor = node.walk();
        node.children(&mut cursor).collect()
    }

    fn has_child(&self, node: Node, kind: &str, text: Option<&str>) -> bool {
        self.children(node)
            .into_iter()
            .any(|c| c.kind() == kind && text.map_or(true, |t| self.text(c) == t))
    }

    fn record(&mut self, id: DeclId, access: Access) {
        self.decls.set_access(id, access);
        self.decls.set_file(id, self.file);
    }

    fn read_items(&mut self, node: Node, scope: DeclId) {
        for child in self.children(node) {
            self.read_item(child, scope);
        }
    }

    fn read_item(&mut self, node: Node, scope: DeclId) {
        match node.kind() {
            "namespace_definition" => self.read_namespace(node, scope),
            "class_specifier" | "struct_specifier" => {
                self.read_class(node, scope, Access::Public, None);
            }
            "enum_specifier" => {
                self.read_enum(node, scope, Access::Public);
            }
            "declaration" | "function_definition" => {
                self.read_declaration(node, scope, Access::Public)
            }
            "type_definition" | "alias_declaration" => {
                self.read_typedef(node, scope, Access::Public)
            }
            "linkage_specification" => {
                // extern "C" { ... } or extern "C" void f();
                if let Some(body) = node.child_by_field_name("body") {
                    if body.kind() == "declaration_list" {
                        self.read_items(body, scope);
                    } else {
                        self.read_item(body, scope);
                    }
                }
            }
            // include guards and conditional blocks
            "preproc_ifdef" | "preproc_if" | "preproc_else" | "preproc_elif" => {
                self.read_items(node, scope)
            }
            "template_declaration" => trace!("skipping template declaration"),
            _ => {}
        }
    }

    fn read_namespace(&mut self, node: Node, scope: DeclId) {
        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        let Some(name) = node.child_by_field_name("name") else {
            trace!("skipping anonymous namespace");
            return;
        };

        // `namespace a::b { }` opens both levels
        let mut ns = scope;
        for part in self.text(name).split("::").map(str::trim) {
            if !part.is_empty() {
                ns = self.decls.namespace(ns, part);
            }
        }
        self.read_items(body, ns);
    }

    /// Read a class or struct definition. Forward declarations and
    /// anonymous classes without a typedef name are skipped.
    fn read_class(
        &mut self,
        node: Node,
        scope: DeclId,
        access: Access,
        alias: Option<&str>,
    ) -> Option<DeclId> {
        let body = node.child_by_field_name("body")?;
        let name = match node.child_by_field_name("name") {
            Some(n) if n.kind() == "template_type" => {
                trace!(class = self.text(n), "skipping template specialization");
                return None;
            }
            Some(n) => last_segment(self.text(n)),
            None => alias?,
        };

        let duplicate = self
            .decls
            .find_children(scope, name)
            .into_iter()
            .any(|c| self.decls.get(c).is_class());
        if duplicate {
            debug!(class = name, file = self.file, "class already read");
            return None;
        }

        let is_struct = node.kind() == "struct_specifier";
        let default_access = if is_struct {
            Access::Public
        } else {
            Access::Private
        };
        let bases = self.base_specifiers(node, default_access);
        let id = self.decls.add(scope, name, DeclKind::Class { is_struct, bases });
        self.record(id, access);
        self.read_members(body, id, default_access);
        Some(id)
    }

    fn base_specifiers(&self, node: Node, default_access: Access) -> Vec<BaseSpecifier> {
        let mut bases = Vec::new();
        let Some(clause) = self
            .children(node)
            .into_iter()
            .find(|c| c.kind() == "base_class_clause")
        else {
            return bases;
        };

        let mut access = None;
        let mut is_virtual = false;
        for child in self.children(clause) {
            match child.kind() {
                "access_specifier" => access = Some(parse_access(self.text(child))),
                "virtual" => is_virtual = true,
                "type_identifier" | "qualified_identifier" | "template_type" => {
                    bases.push(BaseSpecifier {
                        name: self.text(child).to_string(),
                        access: access.take().unwrap_or(default_access),
                        is_virtual,
                    });
                    is_virtual = false;
                }
                _ => {}
            }
        }
        bases
    }

    fn read_members(&mut self, body: Node, class: DeclId, default_access: Access) {
        let mut access = default_access;
        for child in self.children(body) {
            match child.kind() {
                "access_specifier" => access = parse_access(self.text(child)),
                "field_declaration" | "declaration" | "function_definition" => {
                    self.read_declaration(child, class, access)
                }
                "type_definition" | "alias_declaration" => self.read_typedef(child, class, access),
                "template_declaration" | "friend_declaration" => {
                    trace!(kind = child.kind(), "skipping member")
                }
                _ => {}
            }
        }
    }

    /// Read a `declaration`, `field_declaration` or `function_definition`.
    fn read_declaration(&mut self, node: Node, scope: DeclId, access: Access) {
        if let Some(ty) = node.child_by_field_name("type") {
            match ty.kind() {
                "class_specifier" | "struct_specifier" => {
                    self.read_class(ty, scope, access, None);
                }
                "enum_specifier" => {
                    self.read_enum(ty, scope, access);
                }
                _ => {}
            }
        }

        let base = self.base_type(node);
        let mut cursor = node.walk();
        let declarators: Vec<Node> = node
            .children_by_field_name("declarator", &mut cursor)
            .collect();

        for declarator in declarators {
            let declared = match &base {
                Some((ty, is_const)) => self.declarator(ty.clone(), declarator, *is_const),
                // constructors and destructors have no type
                None => self.declarator(CppType::Void, declarator, false),
            };
            let Some(name) = declared.name.clone() else {
                continue;
            };

            match declared.function {
                Some(function) => {
                    self.read_function(node, scope, access, &name, base.is_some(), declared, function)
                }
                None if node.kind() == "field_declaration" && base.is_some() => {
                    let is_static = self.has_child(node, "storage_class_specifier", Some("static"));
                    // `const T* p` is a mutable pointer; only top-level const counts
                    let is_const = base.as_ref().is_some_and(|(_, c)| *c)
                        && !matches!(
                            declared.ty,
                            CppType::Pointer { .. } | CppType::Reference { .. }
                        );
                    let id = self.decls.add(
                        scope,
                        name.as_str(),
                        DeclKind::Field {
                            ty: declared.ty,
                            is_static,
                            is_const,
                        },
                    );
                    self.record(id, access);
                }
                // variables are not bound
                None => {}
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn read_function(
        &mut self,
        node: Node,
        scope: DeclId,
        access: Access,
        name: &str,
        has_type: bool,
        declared: Declared,
        function: Node,
    ) {
        if declared.special {
            trace!(function = name, "skipping destructor or operator");
            return;
        }
        // out-of-line definitions repeat a declaration already read
        if name.contains("::") {
            return;
        }
        let compact: String = self.text(node).split_whitespace().collect();
        if compact.contains("=delete") {
            return;
        }

        let params = self.params(function);
        let in_class = self.decls.get(scope).is_class();
        let kind = if in_class && !has_type && self.decls.get(scope).name == name {
            DeclKind::Constructor { params }
        } else if !has_type {
            return;
        } else if in_class {
            let is_pure_virtual = node
                .child_by_field_name("default_value")
                .is_some_and(|v| self.text(v).trim() == "0")
                || compact.ends_with("=0;");
            let is_virtual = is_pure_virtual
                || self.has_child(node, "virtual", None)
                || self.has_child(function, "virtual_specifier", None);
            DeclKind::Method {
                return_type: declared.ty,
                params,
                is_static: self.has_child(node, "storage_class_specifier", Some("static")),
                is_virtual,
                is_pure_virtual,
                is_const: self.has_child(function, "type_qualifier", Some("const")),
            }
        } else {
            DeclKind::Function {
                return_type: declared.ty,
                params,
            }
        };

        let id = self.decls.add(scope, name, kind);
        self.record(id, access);
    }

    /// The type named by a declaration's `type` field, and whether it was
    /// qualified `const`.
    fn base_type(&self, node: Node) -> Option<(CppType, bool)> {
        let ty = node.child_by_field_name("type")?;
        let is_const = self.has_child(node, "type_qualifier", Some("const"));
        let base = match ty.kind() {
            "primitive_type" | "sized_type_specifier" => CppType::from_spelling(self.text(ty)),
            "class_specifier" | "struct_specifier" | "enum_specifier" | "union_specifier" => {
                let name = ty.child_by_field_name("name")?;
                CppType::named(self.text(name))
            }
            _ => CppType::named(self.text(ty).split_whitespace().collect::<Vec<_>>().join(" ")),
        };
        Some((base, is_const))
    }

    /// Walk a declarator from the outside in, wrapping `ty` as pointers,
    /// references and function types are met.
    fn declarator<'t>(&self, ty: CppType, node: Node<'t>, pending_const: bool) -> Declared<'t> {
        let inner = |n: Node<'t>| n.child_by_field_name("declarator").or_else(|| n.named_child(0));
        match node.kind() {
            "identifier" | "field_identifier" | "type_identifier" | "qualified_identifier" => {
                Declared {
                    name: Some(self.text(node).to_string()),
                    special: false,
                    ty,
                    function: None,
                }
            }
            "destructor_name" | "operator_name" => Declared {
                name: Some(self.text(node).to_string()),
                special: true,
                ty,
                function: None,
            },
            "pointer_declarator" | "abstract_pointer_declarator" | "array_declarator" => {
                let ty = CppType::Pointer {
                    pointee: Box::new(ty),
                    is_const: pending_const,
                };
                self.declare_inner(ty, node.child_by_field_name("declarator"))
            }
            "reference_declarator" | "abstract_reference_declarator" => {
                let ty = CppType::Reference {
                    referent: Box::new(ty),
                    is_const: pending_const,
                    is_rvalue: self.text(node).trim_start().starts_with("&&"),
                };
                self.declare_inner(ty, inner(node))
            }
            "parenthesized_declarator" | "abstract_parenthesized_declarator" | "init_declarator" => {
                match inner(node) {
                    Some(next) => self.declarator(ty, next, pending_const),
                    None => self.unnamed(ty),
                }
            }
            "function_declarator" | "abstract_function_declarator" => {
                let target = node.child_by_field_name("declarator");
                let is_pointer = target.is_some_and(|t| {
                    matches!(
                        t.kind(),
                        "parenthesized_declarator" | "abstract_parenthesized_declarator"
                    )
                });
                if is_pointer {
                    let params = self.params(node).into_iter().map(|p| p.ty).collect();
                    let function = CppType::Function {
                        return_type: Box::new(ty),
                        params,
                    };
                    return self.declare_inner(function, target);
                }
                let mut declared = self.declare_inner(ty, target);
                declared.function = Some(node);
                declared
            }
            _ => self.unnamed(ty),
        }
    }

    fn declare_inner<'t>(&self, ty: CppType, node: Option<Node<'t>>) -> Declared<'t> {
        match node {
            Some(node) => self.declarator(ty, node, false),
            None => self.unnamed(ty),
        }
    }

    fn unnamed<'t>(&self, ty: CppType) -> Declared<'t> {
        Declared {
            name: None,
            special: false,
            ty,
            function: None,
        }
    }

    fn params(&self, function: Node) -> Vec<Param> {
        let Some(list) = function.child_by_field_name("parameters") else {
            return Vec::new();
        };
        let mut params = Vec::new();
        for child in self.children(list) {
            if !matches!(
                child.kind(),
                "parameter_declaration" | "optional_parameter_declaration"
            ) {
                continue;
            }
            let Some((base, is_const)) = self.base_type(child) else {
                continue;
            };
            let declared = match child.child_by_field_name("declarator") {
                Some(d) => self.declarator(base, d, is_const),
                // f(void)
                None if base.is_void() => continue,
                None => self.unnamed(base),
            };
            params.push(Param {
                name: declared.name,
                ty: declared.ty,
            });
        }
        params
    }

    fn read_enum(&mut self, node: Node, scope: DeclId, access: Access) -> Option<DeclId> {
        let body = node.child_by_field_name("body")?;
        let Some(name) = node.child_by_field_name("name") else {
            trace!("skipping anonymous enumeration");
            return None;
        };
        let name = last_segment(self.text(name));
        let duplicate = self
            .decls
            .find_children(scope, name)
            .into_iter()
            .any(|c| matches!(self.decls.get(c).kind, DeclKind::Enumeration { .. }));
        if duplicate {
            return None;
        }

        let is_scoped = self.has_child(node, "class", None) || self.has_child(node, "struct", None);
        let values = self
            .children(body)
            .into_iter()
            .filter(|c| c.kind() == "enumerator")
            .filter_map(|e| {
                let name = e.child_by_field_name("name")?;
                Some(Enumerator {
                    name: self.text(name).to_string(),
                    value: e
                        .child_by_field_name("value")
                        .and_then(|v| parse_integer(self.text(v))),
                })
            })
            .collect();

        let id = self.decls.add(scope, name, DeclKind::Enumeration { is_scoped, values });
        self.record(id, access);
        Some(id)
    }

    fn read_typedef(&mut self, node: Node, scope: DeclId, access: Access) {
        if node.kind() == "alias_declaration" {
            // using Name = Type;
            let (Some(name), Some(ty)) = (
                node.child_by_field_name("name"),
                node.child_by_field_name("type"),
            ) else {
                return;
            };
            let underlying = CppType::from_spelling(self.text(ty));
            let id = self.decls.add(scope, self.text(name), DeclKind::Typedef { underlying });
            self.record(id, access);
            return;
        }

        let mut cursor = node.walk();
        let declarators: Vec<Node> = node
            .children_by_field_name("declarator", &mut cursor)
            .collect();

        // typedef struct { ... } Name;
        if let Some(ty) = node.child_by_field_name("type") {
            if matches!(ty.kind(), "class_specifier" | "struct_specifier") {
                let alias = declarators
                    .first()
                    .filter(|d| d.kind() == "type_identifier")
                    .map(|d| self.text(*d));
                let anonymous = ty.child_by_field_name("name").is_none();
                self.read_class(ty, scope, access, alias);
                if anonymous {
                    return;
                }
            }
        }

        let Some((base, is_const)) = self.base_type(node) else {
            return;
        };
        for declarator in declarators {
            let declared = self.declarator(base.clone(), declarator, is_const);
            if let Some(name) = declared.name {
                let id = self.decls.add(
                    scope,
                    name.as_str(),
                    DeclKind::Typedef {
                        underlying: declared.ty,
                    },
                );
                self.record(id, access);
            }
        }
    }
}

fn parse_access(text: &str) -> Access {
    if text.contains("public") {
        Access::Public
    } else if text.contains("protected") {
        Access::Protected
    } else {
        Access::Private
    }
}

fn last_segment(name: &str) -> &str {
    name.rsplit("::").next().unwrap_or(name).trim()
}

fn parse_integer(text: &str) -> Option<i64> {
    let text = text.trim().trim_end_matches(['u', 'U', 'l', 'L']);
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok();
    }
    if let Some(negative) = text.strip_prefix('-') {
        return parse_integer(negative).map(|v| -v);
    }
    text.parse().ok()
}
