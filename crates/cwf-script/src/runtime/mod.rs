//! Runtime types: values, objects, functions, classes, scopes and traces.

pub mod class;
pub mod function;
pub mod object;
pub mod scope;
pub mod trace;
pub mod value;

pub use class::{ClassDescriptor, ClassId, ClassTree, PropertySlot};
pub use function::{CallSite, Callable, Function, NativeFn, NativeFunction};
pub use object::{Object, PropertyMap};
pub use scope::{Scope, ScopeKind};
pub use trace::{TraceEntry, TraceRecorder};
pub use value::{ArrayRef, ObjectRef, Value};
