//! C++ type representation.

use serde::{Deserialize, Serialize};

/// A C++ type as it appears in a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CppType {
    /// void
    Void,
    /// bool
    Bool,
    /// char, signed char, unsigned char
    Char { signed: bool },
    /// short, unsigned short
    Short { signed: bool },
    /// int, unsigned int
    Int { signed: bool },
    /// long, unsigned long
    Long { signed: bool },
    /// long long, unsigned long long
    LongLong { signed: bool },
    /// float
    Float,
    /// double
    Double,
    /// Pointer type: T*
    Pointer {
        pointee: Box<CppType>,
        is_const: bool,
    },
    /// Reference type: T& (lvalue) or T&& (rvalue)
    Reference {
        referent: Box<CppType>,
        is_const: bool,
        /// Whether this is an rvalue reference (T&&) vs lvalue reference (T&)
        is_rvalue: bool,
    },
    /// Named type (class, struct, enum, typedef or anything spelled by name)
    Named(String),
    /// Function type: R(Args...)
    Function {
        return_type: Box<CppType>,
        params: Vec<CppType>,
    },
}

impl CppType {
    /// Create a signed int type.
    pub fn int() -> Self {
        CppType::Int { signed: true }
    }

    /// Create a named type.
    pub fn named(name: impl Into<String>) -> Self {
        CppType::Named(name.into())
    }

    /// Create a pointer to this type.
    pub fn ptr(self) -> Self {
        CppType::Pointer {
            pointee: Box::new(self),
            is_const: false,
        }
    }

    /// Create a pointer to const of this type.
    pub fn const_ptr(self) -> Self {
        CppType::Pointer {
            pointee: Box::new(self),
            is_const: true,
        }
    }

    /// Create an lvalue reference to this type.
    pub fn ref_(self) -> Self {
        CppType::Reference {
            referent: Box::new(self),
            is_const: false,
            is_rvalue: false,
        }
    }

    /// Create a const lvalue reference to this type.
    pub fn const_ref(self) -> Self {
        CppType::Reference {
            referent: Box::new(self),
            is_const: true,
            is_rvalue: false,
        }
    }

    /// Create a pointer to a function with the given signature.
    pub fn function_ptr(return_type: CppType, params: Vec<CppType>) -> Self {
        CppType::Function {
            return_type: Box::new(return_type),
            params,
        }
        .ptr()
    }

    pub fn is_void(&self) -> bool {
        matches!(self, CppType::Void)
    }

    /// Get the pointee type if this is a pointer.
    pub fn pointee(&self) -> Option<&CppType> {
        match self {
            CppType::Pointer { pointee, .. } => Some(pointee),
            _ => None,
        }
    }

    /// The signature behind a function pointer (or a reference to one).
    ///
    /// Returns `(return_type, params)`.
    pub fn function_pointer(&self) -> Option<(&CppType, &[CppType])> {
        match self {
            CppType::Pointer { pointee, .. } => match pointee.as_ref() {
                CppType::Function {
                    return_type,
                    params,
                } => Some((return_type, params)),
                _ => None,
            },
            CppType::Reference { referent, .. } => referent.function_pointer(),
            _ => None,
        }
    }

    /// The name at the bottom of any pointer/reference chain.
    pub fn base_name(&self) -> Option<&str> {
        match self {
            CppType::Named(name) => Some(name),
            CppType::Pointer { pointee, .. } => pointee.base_name(),
            CppType::Reference { referent, .. } => referent.base_name(),
            _ => None,
        }
    }

    /// Rewrite every named type inside this type.
    pub fn map_names(&self, f: &mut impl FnMut(&str) -> String) -> CppType {
        match self {
            CppType::Named(name) => CppType::Named(f(name)),
            CppType::Pointer { pointee, is_const } => CppType::Pointer {
                pointee: Box::new(pointee.map_names(f)),
                is_const: *is_const,
            },
            CppType::Reference {
                referent,
                is_const,
                is_rvalue,
            } => CppType::Reference {
                referent: Box::new(referent.map_names(f)),
                is_const: *is_const,
                is_rvalue: *is_rvalue,
            },
            CppType::Function {
                return_type,
                params,
            } => CppType::Function {
                return_type: Box::new(return_type.map_names(f)),
                params: params.iter().map(|p| p.map_names(f)).collect(),
            },
            other => other.clone(),
        }
    }

    /// Spell this type as C++ source.
    pub fn to_cpp_string(&self) -> String {
        match self {
            CppType::Void => "void".to_string(),
            CppType::Bool => "bool".to_string(),
            CppType::Char { signed } => integral("char", *signed),
            CppType::Short { signed } => integral("short", *signed),
            CppType::Int { signed } => integral("int", *signed),
            CppType::Long { signed } => integral("long", *signed),
            CppType::LongLong { signed } => integral("long long", *signed),
            CppType::Float => "float".to_string(),
            CppType::Double => "double".to_string(),
            CppType::Pointer { pointee, is_const } => {
                if let CppType::Function {
                    return_type,
                    params,
                } = pointee.as_ref()
                {
                    return format!(
                        "{} (*)({})",
                        return_type.to_cpp_string(),
                        spell_params(params)
                    );
                }
                let constness = if *is_const { "const " } else { "" };
                format!("{}{}*", constness, pointee.to_cpp_string())
            }
            CppType::Reference {
                referent,
                is_const,
                is_rvalue,
            } => {
                let constness = if *is_const { "const " } else { "" };
                let amp = if *is_rvalue { "&&" } else { "&" };
                format!("{}{}{}", constness, referent.to_cpp_string(), amp)
            }
            CppType::Named(name) => name.clone(),
            CppType::Function {
                return_type,
                params,
            } => format!("{} ({})", return_type.to_cpp_string(), spell_params(params)),
        }
    }

    /// Spell a declaration of `name` with this type, e.g. `int x` or
    /// `void (*cb)(int)`.
    pub fn declare(&self, name: &str) -> String {
        if let Some((ret, params)) = self.function_pointer() {
            return format!("{} (*{})({})", ret.to_cpp_string(), name, spell_params(params));
        }
        format!("{} {}", self.to_cpp_string(), name)
    }

    /// Parse a simple type spelling such as `const Foo&`, `unsigned int`
    /// or `char **`. Anything that is not a builtin becomes [`CppType::Named`].
    pub fn from_spelling(spelling: &str) -> CppType {
        let mut text = spelling.trim();
        // top-level constness of the declarator is irrelevant to bindings
        if let Some(rest) = text.strip_suffix("const") {
            if rest.ends_with(|c: char| c.is_whitespace() || c == '*' || c == '&') {
                text = rest.trim_end();
            }
        }

        let split = text.trim_end_matches(|c: char| c == '*' || c == '&' || c.is_whitespace());
        let declarators: Vec<char> = text[split.len()..]
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        let mut base = split.trim();
        let mut is_const = false;
        if let Some(rest) = base.strip_prefix("const ") {
            is_const = true;
            base = rest.trim();
        }
        if let Some(rest) = base.strip_suffix(" const") {
            is_const = true;
            base = rest.trim();
        }

        let mut ty = builtin(base).unwrap_or_else(|| CppType::Named(base.to_string()));
        let mut innermost = true;
        let mut i = 0;
        while i < declarators.len() {
            let constness = innermost && is_const;
            if declarators[i] == '*' {
                ty = CppType::Pointer {
                    pointee: Box::new(ty),
                    is_const: constness,
                };
                i += 1;
            } else {
                let is_rvalue = declarators.get(i + 1) == Some(&'&');
                ty = CppType::Reference {
                    referent: Box::new(ty),
                    is_const: constness,
                    is_rvalue,
                };
                i += if is_rvalue { 2 } else { 1 };
            }
            innermost = false;
        }
        ty
    }
}

fn integral(base: &str, signed: bool) -> String {
    if signed {
        base.to_string()
    } else {
        format!("unsigned {}", base)
    }
}

fn spell_params(params: &[CppType]) -> String {
    params
        .iter()
        .map(|p| p.to_cpp_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn builtin(text: &str) -> Option<CppType> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let (signed, words) = match words.first() {
        Some(&"unsigned") => (false, &words[1..]),
        Some(&"signed") => (true, &words[1..]),
        _ => (true, &words[..]),
    };
    let words: Vec<&str> = words.iter().copied().filter(|w| *w != "int" || words.len() == 1).collect();
    let ty = match words.as_slice() {
        [] => CppType::Int { signed },
        ["void"] => CppType::Void,
        ["bool"] => CppType::Bool,
        ["char"] => CppType::Char { signed },
        ["short"] => CppType::Short { signed },
        ["int"] => CppType::Int { signed },
        ["long"] => CppType::Long { signed },
        ["long", "long"] => CppType::LongLong { signed },
        ["float"] => CppType::Float,
        ["double"] => CppType::Double,
        _ => return None,
    };
    if text.is_empty() {
        return None;
    }
    Some(ty)
}
