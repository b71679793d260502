//! Identifier derivation for generated C++ and Ruby names.

use heck::{ToSnakeCase, ToUpperCamelCase};
use rustc_hash::FxHashSet;

/// Turn a qualified C++ name into an identifier fragment:
/// `math::Vector<int*>` becomes `math_Vector_intPtr_`.
pub fn functionize(name: &str) -> String {
    name.trim_start_matches("::")
        .replace("::", "_")
        .replace('*', "Ptr")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Ruby method name for a C++ function or method.
pub fn ruby_method_name(name: &str) -> String {
    name.to_snake_case()
}

/// Ruby constant name (class, module) for a C++ name. Names that already
/// start uppercase are kept as written.
pub fn ruby_constant_name(name: &str) -> String {
    match name.chars().next() {
        Some(c) if c.is_ascii_uppercase() => name.to_string(),
        _ => name.to_upper_camel_case(),
    }
}

/// Operators and destructors have no Ruby spelling of their own.
pub fn is_special_member(name: &str) -> bool {
    name.starts_with('~') || name.starts_with("operator")
}

/// Names handed out within one scope: Ruby methods of a class, wrapper
/// identifiers of a run, file stems. Clashes are told apart by suffix:
/// `name`, `name_1`, `name_2`, ...
#[derive(Debug, Default)]
pub struct UniqueNames {
    taken: FxHashSet<String>,
}

impl UniqueNames {
    pub fn unique(&mut self, base: &str) -> String {
        let mut name = base.to_string();
        let mut suffix = 0;
        while !self.taken.insert(name.clone()) {
            suffix += 1;
            name = format!("{}_{}", base, suffix);
        }
        name
    }
}
