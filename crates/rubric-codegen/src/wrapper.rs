//! Forwarding functions between Rice and the wrapped C++ API.
//!
//! Rice binds free functions with an explicit receiver and cannot tell
//! C++ overloads apart, so every exposed function, method and field goes
//! through a uniquely named wrapper emitted into the declarations region.

use crate::context::GenerationContext;
use crate::error::{CodegenError, Result};
use crate::names::functionize;
use rubric_decl::{CppType, DeclId, DeclKind};
use tracing::info;

/// How the Ruby receiver reaches the wrapped call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver<'a> {
    /// `Rice::Object self`, discarded (global, module and singleton functions)
    Object,
    /// `T* self`, called as `self->name(...)`
    Instance(&'a str),
    /// `T* self`, passed as the first argument of a free function
    FirstArgument(&'a str),
}

/// Emit the wrapper for a function or method and return its name.
pub fn build_wrapper(
    ctx: &mut GenerationContext<'_>,
    declarations: &mut Vec<String>,
    function: DeclId,
    receiver: Receiver<'_>,
) -> Result<String> {
    let cache = ctx.cache();
    let decl = cache.decl(function);
    let qualified = cache.qualified_name(function);
    let params = decl.kind.params();

    let callbacks = params
        .iter()
        .filter(|p| p.ty.function_pointer().is_some())
        .count();
    if callbacks > 0 {
        if params.len() > 1 {
            return Err(unsupported(
                &qualified,
                "a callback must be the only argument",
            ));
        }
        if matches!(receiver, Receiver::FirstArgument(_)) {
            return Err(unsupported(
                &qualified,
                "a function taking a callback cannot be an instance method",
            ));
        }
        return build_callback_wrapper(ctx, declarations, function, receiver);
    }

    let scope = cache.tree().scope_of(function);
    let return_type = match decl.kind.return_type() {
        Some(ty) => ctx.resolve_return(scope, ty),
        None => CppType::Void,
    };
    let wrapper = ctx.unique_name(&format!("wrap_{}", functionize(&qualified)));

    let mut signature = Vec::new();
    let mut arguments = Vec::new();
    let mut declared = params.iter().enumerate();
    match receiver {
        Receiver::Object => signature.push("Rice::Object self".to_string()),
        Receiver::Instance(class) => signature.push(format!("{}* self", class)),
        Receiver::FirstArgument(class) => {
            signature.push(format!("{}* self", class));
            if let Some((_, first)) = declared.next() {
                let by_pointer = matches!(first.ty, CppType::Pointer { .. });
                arguments.push(if by_pointer { "self" } else { "*self" }.to_string());
            }
        }
    }
    for (i, param) in declared {
        let name = param.name.clone().unwrap_or_else(|| format!("arg{}", i));
        let ty = ctx.resolve_param(scope, &param.ty);
        signature.push(ty.declare(&name));
        arguments.push(name);
    }

    let target = match receiver {
        Receiver::Instance(_) => format!("self->{}", decl.name),
        Receiver::Object | Receiver::FirstArgument(_) => qualified,
    };
    let returns = if return_type.is_void() { "" } else { "return " };

    declarations.push(format!(
        "{} {}({}) {{",
        return_type.to_cpp_string(),
        wrapper,
        signature.join(", ")
    ));
    declarations.push(format!("\t{}{}({});", returns, target, arguments.join(", ")));
    declarations.push("}".to_string());
    Ok(wrapper)
}

/// Ruby blocks as C++ callbacks. Emits the captured block, a trampoline
/// with the callback's exact signature and the Ruby entry point.
fn build_callback_wrapper(
    ctx: &mut GenerationContext<'_>,
    declarations: &mut Vec<String>,
    function: DeclId,
    receiver: Receiver<'_>,
) -> Result<String> {
    let cache = ctx.cache();
    let decl = cache.decl(function);
    let qualified = cache.qualified_name(function);
    let scope = cache.tree().scope_of(function);

    let callback = ctx.resolve(scope, &decl.kind.params()[0].ty);
    let Some((callback_return, callback_params)) = callback.function_pointer() else {
        return Err(unsupported(&qualified, "callback type could not be resolved"));
    };
    if callback_params.iter().any(|p| p.function_pointer().is_some()) {
        return Err(unsupported(&qualified, "callbacks taking callbacks are not supported"));
    }
    info!(function = %qualified, "building callback wrapper");

    let wrapper = ctx.unique_name(&format!("wrap_for_callback_{}", functionize(&qualified)));
    let suffix = &wrapper["wrap_for_callback_".len()..];
    let block = format!("_block_for_{}", suffix);
    let trampoline = format!("do_yield_on_{}", suffix);

    let signature: Vec<String> = callback_params
        .iter()
        .enumerate()
        .map(|(i, ty)| ty.declare(&format!("arg{}", i)))
        .collect();
    let mut funcall = format!(
        "rb_funcall({}, rb_intern(\"call\"), {}",
        block,
        callback_params.len()
    );
    for i in 0..callback_params.len() {
        funcall.push_str(&format!(", to_ruby(arg{}).value()", i));
    }
    funcall.push(')');

    let returns = callback_return.to_cpp_string();
    declarations.push(format!("VALUE {};", block));
    declarations.push(format!("{} {}({}) {{", returns, trampoline, signature.join(", ")));
    if callback_return.is_void() {
        declarations.push(format!("\t{};", funcall));
    } else {
        declarations.push(format!("\treturn from_ruby< {} >({});", returns, funcall));
    }
    declarations.push("}".to_string());

    match receiver {
        Receiver::Instance(class) => {
            declarations.push(format!("VALUE {}({}* self) {{", wrapper, class));
            declarations.push(format!("\t{} = rb_block_proc();", block));
            declarations.push(format!("\tself->{}(&{});", decl.name, trampoline));
            declarations.push("\treturn Qnil;".to_string());
        }
        Receiver::Object | Receiver::FirstArgument(_) => {
            declarations.push(format!("void {}(Rice::Object self) {{", wrapper));
            declarations.push(format!("\t{} = rb_block_proc();", block));
            declarations.push(format!("\t{}(&{});", qualified, trampoline));
        }
    }
    declarations.push("}".to_string());
    Ok(wrapper)
}

fn unsupported(function: &str, reason: &str) -> CodegenError {
    CodegenError::UnsupportedCallback {
        function: function.to_string(),
        reason: reason.to_string(),
    }
}

/// Wrapper names of a field's accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessors {
    pub getter: String,
    /// Absent for static, const and reference members
    pub setter: Option<String>,
}

/// Emit getter (and setter) wrappers for a data member of `class`.
/// Returns `None` for members that cannot be spelled as a return type.
pub fn build_field_accessors(
    ctx: &mut GenerationContext<'_>,
    declarations: &mut Vec<String>,
    field: DeclId,
    class: &str,
) -> Option<Accessors> {
    let cache = ctx.cache();
    let decl = cache.decl(field);
    let DeclKind::Field {
        ty,
        is_static,
        is_const,
    } = &decl.kind
    else {
        return None;
    };
    if ty.function_pointer().is_some() {
        return None;
    }

    let qualified = cache.qualified_name(field);
    let scope = cache.tree().scope_of(field);
    let ty = ctx.resolve_return(scope, ty);
    let spelled = ty.to_cpp_string();
    let base = functionize(&qualified);

    let (receiver, value) = if *is_static {
        ("Rice::Object self".to_string(), qualified.clone())
    } else {
        (format!("{}* self", class), format!("self->{}", decl.name))
    };

    let getter = ctx.unique_name(&format!("wrap_{}_get", base));
    declarations.push(format!("{} {}({}) {{", spelled, getter, receiver));
    declarations.push(format!("\treturn {};", value));
    declarations.push("}".to_string());

    let read_only = *is_static || *is_const || matches!(ty, CppType::Reference { .. });
    let setter = if read_only {
        None
    } else {
        let setter = ctx.unique_name(&format!("wrap_{}_set", base));
        declarations.push(format!(
            "void {}({}, {}) {{",
            setter,
            receiver,
            ty.declare("value")
        ));
        declarations.push(format!("\t{} = value;", value));
        declarations.push("}".to_string());
        Some(setter)
    };

    Some(Accessors { getter, setter })
}
