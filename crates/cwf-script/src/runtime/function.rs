//! Script function representation.

use super::scope::Scope;
use super::value::Value;
use crate::ast::Statement;
use crate::error::Result;
use crate::vm::Interpreter;
use std::fmt;
use std::rc::Rc;

/// A function written in module script, closed over its defining scope.
#[derive(Clone)]
pub struct Function {
    /// The function name (if any)
    pub name: Option<String>,
    /// The parameter names
    pub params: Vec<String>,
    /// The function body
    pub body: Rc<Vec<Statement>>,
    /// The scope the function was created in
    pub scope: Rc<Scope>,
    /// Remote-call callbacks are never trace-wrapped
    pub rpc_callback: bool,
}

impl Function {
    /// Returns the arity (number of parameters).
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Signature of a host function: interpreter, `this`, arguments.
pub type NativeFn = fn(&mut Interpreter, &Value, &[Value]) -> Result<Value>;

/// A native (Rust) function.
#[derive(Clone)]
pub struct NativeFunction {
    /// The function name
    pub name: &'static str,
    /// The native function pointer
    pub func: NativeFn,
    /// Remote-call callbacks are never trace-wrapped
    pub rpc_callback: bool,
}

impl NativeFunction {
    /// Creates a native function without capabilities.
    pub fn new(name: &'static str, func: NativeFn) -> Self {
        Self {
            name,
            func,
            rpc_callback: false,
        }
    }
}

/// Where a traced function was declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    /// Path of the owning module, if the function belongs to one
    pub module: Option<String>,
    /// The declared property path (`helpers.format`)
    pub path: String,
    /// The last segment of the path
    pub name: String,
}

impl CallSite {
    /// Creates a call site for `path` declared in `module`.
    pub fn new(module: Option<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        let name = path.rsplit('.').next().unwrap_or(&path).to_string();
        Self { module, path, name }
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.module {
            Some(module) => write!(f, "{}: {}", module, self.path),
            None => write!(f, "{}", self.path),
        }
    }
}

/// A callable value.
#[derive(Clone)]
pub enum Callable {
    /// A script function
    Function(Function),
    /// A native Rust function
    Native(NativeFunction),
    /// A declared function whose failures are recorded in the trace
    Traced {
        /// The wrapped function
        target: Rc<Callable>,
        /// Declaration site reported in traces
        site: CallSite,
    },
}

impl Callable {
    /// The function's name, if it has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Callable::Function(func) => func.name.as_deref(),
            Callable::Native(native) => Some(native.name),
            Callable::Traced { site, .. } => Some(&site.name),
        }
    }

    /// Whether the function was flagged as a remote-call callback.
    pub fn is_rpc_callback(&self) -> bool {
        match self {
            Callable::Function(func) => func.rpc_callback,
            Callable::Native(native) => native.rpc_callback,
            Callable::Traced { target, .. } => target.is_rpc_callback(),
        }
    }

    /// A copy of this callable carrying the remote-call capability.
    pub fn as_rpc_callback(&self) -> Callable {
        match self {
            Callable::Function(func) => Callable::Function(Function {
                rpc_callback: true,
                ..func.clone()
            }),
            Callable::Native(native) => Callable::Native(NativeFunction {
                rpc_callback: true,
                ..native.clone()
            }),
            Callable::Traced { target, .. } => target.as_rpc_callback(),
        }
    }

    /// The declaration site of a traced function.
    pub fn site(&self) -> Option<&CallSite> {
        match self {
            Callable::Traced { site, .. } => Some(site),
            _ => None,
        }
    }

    /// The underlying function, looking through trace wrappers.
    pub fn target(&self) -> &Callable {
        match self {
            Callable::Traced { target, .. } => target.target(),
            other => other,
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Function(func) => write!(f, "Function({:?})", func.name),
            Callable::Native(native) => write!(f, "NativeFunction({})", native.name),
            Callable::Traced { site, .. } => write!(f, "Traced({})", site),
        }
    }
}
