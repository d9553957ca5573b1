// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module loading.
//!
//! Loading a module decodes its payload, compiles the text, resolves the
//! declared dependencies (recursively, through the configured
//! [`ModuleSource`]) and writes each declaration onto the module instance.
//! Instances come from the name-memoized `Module` class, so `Module(name)`
//! in script and the loader agree on identity.

use cwf_script::builtins::make_native;
use cwf_script::runtime::class::cache_key;
use cwf_script::runtime::{Object, ObjectRef, Scope};
use cwf_script::{CallSite, Callable, ClassId, Interpreter, Value};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info, warn};

use super::cache::CompileCache;
use super::compiler::{CompiledModule, compile, localize_syntax_error};
use super::registry::{LoadRegistry, LoggingRegistry, ModuleHandle};
use super::source::{DirectorySource, ModuleSource, PackedModule};
use crate::config::LoaderConfig;
use crate::error::{LoaderError, Result};
use crate::packed::{DecodeError, decode};
use crate::reporter::{ErrorReporter, ErrorSink, Report, ReportContext};

/// Name of the property holding the declaration in progress.
const FAULT: &str = "fault";

/// Result of a module load.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The module is ready
    Success(ModuleHandle),
    /// The load failed and was reported
    Failure(Report),
}

impl Outcome {
    /// Whether the module loaded.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// The loaded module, if any.
    pub fn handle(&self) -> Option<&ModuleHandle> {
        match self {
            Outcome::Success(handle) => Some(handle),
            Outcome::Failure(_) => None,
        }
    }

    /// The failure report, if any.
    pub fn report(&self) -> Option<&Report> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(report) => Some(report),
        }
    }
}

/// Why a single module failed.
enum LoadFailure {
    /// Not yet reported
    Error(LoaderError),
    /// A dependency failed and was reported already
    Dependency(Report),
    /// Reporting itself failed
    Fatal(LoaderError),
}

impl From<LoaderError> for LoadFailure {
    fn from(err: LoaderError) -> Self {
        LoadFailure::Error(err)
    }
}

impl From<cwf_script::Error> for LoadFailure {
    fn from(err: cwf_script::Error) -> Self {
        LoadFailure::Error(err.into())
    }
}

impl From<DecodeError> for LoadFailure {
    fn from(err: DecodeError) -> Self {
        LoadFailure::Error(err.into())
    }
}

/// State shared by every module of one loader.
pub struct LoaderContext {
    interp: Interpreter,
    cache: CompileCache,
    module_class: ClassId,
    root: ObjectRef,
    privates: FxHashMap<String, ObjectRef>,
    ready: FxHashMap<String, ModuleHandle>,
    loading: Vec<String>,
}

impl Default for LoaderContext {
    fn default() -> Self {
        Self::new()
    }
}

impl LoaderContext {
    /// Create a context with the `Module` class and the root module `cwf`
    /// installed as globals.
    pub fn new() -> Self {
        let mut interp = Interpreter::new();
        let root_class = interp.root_class();
        let module_class = interp.classes_mut().sub_class(
            root_class,
            vec![("toString".to_string(), make_native("toString", module_to_string))],
        );
        interp.classes_mut().name_class(module_class, "Module");

        let mut root = Object::instance_of(module_class);
        root.set("path", Value::from(""));
        let root = Rc::new(RefCell::new(root));
        interp
            .classes_mut()
            .cache_instance(module_class, cache_key(""), Rc::clone(&root));

        interp.define_global("Module", Value::Class(module_class));
        interp.define_global("cwf", Value::Object(Rc::clone(&root)));

        Self {
            interp,
            cache: CompileCache::new(),
            module_class,
            root,
            privates: FxHashMap::default(),
            ready: FxHashMap::default(),
            loading: Vec::new(),
        }
    }

    /// The `Module` class.
    pub fn module_class(&self) -> ClassId {
        self.module_class
    }

    /// The memoized instance for `name`.
    fn instance(&mut self, name: &str) -> Result<ObjectRef> {
        match self.interp.get_or_create(self.module_class, &[Value::from(name)])? {
            Value::Object(instance) => Ok(instance),
            other => Err(LoaderError::Script(format!("Module({}) returned {}", name, other.type_of()))),
        }
    }

    fn existing_instance(&self, name: &str) -> Option<ObjectRef> {
        self.interp
            .classes()
            .cached_instance(self.module_class, &cache_key(name))
    }

    fn privates_for(&mut self, name: &str) -> ObjectRef {
        Rc::clone(
            self.privates
                .entry(name.to_string())
                .or_insert_with(|| Rc::new(RefCell::new(Object::new()))),
        )
    }

    /// Removes and returns the declaration name a failure happened in.
    fn take_fault(&self, name: &str) -> Option<String> {
        let instance = self.existing_instance(name)?;
        let fault = instance.borrow_mut().delete(FAULT);
        match fault {
            Some(Value::String(fault)) => Some(fault),
            _ => None,
        }
    }
}

fn module_to_string(interp: &mut Interpreter, this: &Value, _args: &[Value]) -> cwf_script::Result<Value> {
    let path = interp.get_property(this, "path")?;
    Ok(Value::String(interp.to_string(&path)?))
}

/// Loads, compiles and runs modules.
pub struct ModuleLoader {
    context: LoaderContext,
    config: LoaderConfig,
    source: Box<dyn ModuleSource>,
    reporter: ErrorReporter,
    registry: Box<dyn LoadRegistry>,
}

impl std::fmt::Debug for ModuleLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleLoader").finish_non_exhaustive()
    }
}

impl ModuleLoader {
    /// Create a loader reading dependencies from the configured root
    /// directory.
    pub fn new(config: LoaderConfig) -> Self {
        let source = DirectorySource::new(config.root.clone());
        Self {
            context: LoaderContext::new(),
            config,
            source: Box::new(source),
            reporter: ErrorReporter::default(),
            registry: Box::new(LoggingRegistry),
        }
    }

    /// Use `source` for dependency resolution.
    pub fn with_source(mut self, source: impl ModuleSource + 'static) -> Self {
        self.source = Box::new(source);
        self
    }

    /// Deliver error reports to `sink`.
    pub fn with_sink(mut self, sink: impl ErrorSink + 'static) -> Self {
        self.reporter.set_sink(Box::new(sink));
        self
    }

    /// Notify `registry` of each initialized module.
    pub fn with_registry(mut self, registry: impl LoadRegistry + 'static) -> Self {
        self.registry = Box::new(registry);
        self
    }

    /// The loader configuration.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// The interpreter modules run in.
    pub fn interpreter(&self) -> &Interpreter {
        &self.context.interp
    }

    /// Mutable access to the interpreter.
    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.context.interp
    }

    /// The root module `cwf`.
    pub fn root(&self) -> ModuleHandle {
        ModuleHandle::new("", Rc::clone(&self.context.root))
    }

    /// A ready module.
    pub fn module(&self, name: &str) -> Option<ModuleHandle> {
        self.context.ready.get(&self.config.normalize_name(name)).cloned()
    }

    /// Names of all ready modules, sorted.
    pub fn ready_modules(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.context.ready.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// The compiled form of a module.
    pub fn compiled(&self, name: &str) -> Option<Rc<CompiledModule>> {
        self.context.cache.get(&self.config.normalize_name(name))
    }

    /// Load timestamp of a module.
    pub fn timestamp(&self, name: &str) -> Option<u64> {
        self.context.cache.timestamp(&self.config.normalize_name(name))
    }

    /// The private bag of a module.
    pub fn privates(&self, name: &str) -> Option<ObjectRef> {
        self.context.privates.get(&self.config.normalize_name(name)).cloned()
    }

    /// Load a module from its packed payload.
    ///
    /// A module that is already ready is returned as is; its `init` does
    /// not run again. Failures are reported and returned as
    /// [`Outcome::Failure`]; `Err` means the report could not be delivered.
    pub fn load(&mut self, payload: &str, name: &str, timestamp: u64) -> Result<Outcome> {
        let name = self.config.normalize_name(name);
        let packed = PackedModule {
            name: name.clone(),
            timestamp,
            payload: payload.to_string(),
        };
        self.load_module(&name, Some(packed))
    }

    /// Load a module from the configured source.
    pub fn require(&mut self, name: &str) -> Result<Outcome> {
        let name = self.config.normalize_name(name);
        self.load_module(&name, None)
    }

    /// Call a function of a loaded module, reporting failures.
    pub fn invoke(
        &mut self,
        module: &ModuleHandle,
        function: &str,
        args: Vec<Value>,
    ) -> Result<std::result::Result<Value, Report>> {
        let this = module.value();
        let result = self
            .context
            .interp
            .get_property(&this, function)
            .and_then(|callee| self.context.interp.call(&callee, this, args));
        match result {
            Ok(value) => Ok(Ok(value)),
            Err(err) => {
                let context = ReportContext::Message(format!("{}.{}", module.name(), function));
                self.report(&err.into(), &context).map(Err)
            }
        }
    }

    /// Run script in the global scope, reporting failures.
    pub fn run_script(&mut self, source: &str) -> Result<std::result::Result<Value, Report>> {
        match self.context.interp.run(source) {
            Ok(value) => Ok(Ok(value)),
            Err(err) => self.report(&err.into(), &ReportContext::Anonymous).map(Err),
        }
    }

    fn report(&mut self, err: &LoaderError, context: &ReportContext) -> Result<Report> {
        self.reporter
            .report(err, context, self.context.interp.trace_mut())
    }

    fn load_module(&mut self, name: &str, packed: Option<PackedModule>) -> Result<Outcome> {
        if let Some(handle) = self.context.ready.get(name) {
            debug!(module = name, "module already loaded");
            return Ok(Outcome::Success(handle.clone()));
        }

        if let Some(err) = self.check_recursion(name) {
            warn!(module = name, error = %err, "refusing to load module");
            let report = self.report(&err, &ReportContext::module(name, None))?;
            return Ok(Outcome::Failure(report));
        }

        self.context.loading.push(name.to_string());
        let mut text = None;
        let result = self.instantiate(name, packed, &mut text);
        self.context.loading.pop();

        match result {
            Ok(handle) => Ok(Outcome::Success(handle)),
            Err(LoadFailure::Dependency(report)) => {
                self.context.take_fault(name);
                Ok(Outcome::Failure(report))
            }
            Err(LoadFailure::Fatal(err)) => {
                self.context.take_fault(name);
                Err(err)
            }
            Err(LoadFailure::Error(err)) => {
                let fault = self
                    .context
                    .take_fault(name)
                    .or_else(|| text.as_deref().and_then(localize_syntax_error));
                warn!(module = name, fault = ?fault, error = %err, "module failed to load");
                let report = self.report(&err, &ReportContext::module(name, fault))?;
                Ok(Outcome::Failure(report))
            }
        }
    }

    fn check_recursion(&self, name: &str) -> Option<LoaderError> {
        let loading = &self.context.loading;
        if self.config.detect_cycles {
            let start = loading.iter().position(|n| n == name)?;
            let mut chain: Vec<&str> = loading[start..].iter().map(String::as_str).collect();
            chain.push(name);
            Some(LoaderError::CircularDependency(chain.join(" -> ")))
        } else if loading.len() >= self.config.max_load_depth {
            Some(LoaderError::LoadDepthExceeded(loading.len()))
        } else {
            None
        }
    }

    fn compile_module(
        &mut self,
        name: &str,
        packed: Option<PackedModule>,
        text: &mut Option<String>,
    ) -> std::result::Result<Rc<CompiledModule>, LoadFailure> {
        if let Some(compiled) = self.context.cache.get(name) {
            debug!(module = name, "compile cache hit");
            return Ok(compiled);
        }

        let packed = match packed {
            Some(packed) => packed,
            None => self
                .source
                .fetch(name)?
                .ok_or_else(|| LoaderError::module_not_found(name))?,
        };
        let decoded = text.insert(decode(&packed.payload)?);
        let compiled = compile(name, decoded)?;
        debug!(module = name, declarations = compiled.declarations.len(), "compiled module");
        Ok(self.context.cache.insert(compiled, packed.timestamp))
    }

    fn instantiate(
        &mut self,
        name: &str,
        packed: Option<PackedModule>,
        text: &mut Option<String>,
    ) -> std::result::Result<ModuleHandle, LoadFailure> {
        let compiled = self.compile_module(name, packed, text)?;
        info!(module = name, includes = ?compiled.includes, "loading module");

        let instance = self.context.instance(name)?;
        instance.borrow_mut().set("path", Value::from(name));
        let this = Value::Object(Rc::clone(&instance));

        let mut dependencies = Vec::with_capacity(compiled.includes.len());
        for include in &compiled.includes {
            let dependency = self.config.normalize_name(include);
            debug!(module = name, dependency = %dependency, "resolving dependency");
            match self.load_module(&dependency, None).map_err(LoadFailure::Fatal)? {
                Outcome::Success(handle) => dependencies.push(handle),
                Outcome::Failure(report) => return Err(LoadFailure::Dependency(report)),
            }
        }

        let privates = Value::Object(self.context.privates_for(name));
        let scope = self.module_scope(&this, &privates, &dependencies);

        for decl in &compiled.declarations {
            instance.borrow_mut().set(FAULT, Value::from(decl.name.as_str()));
            let value = self
                .context
                .interp
                .eval_in(&decl.expression, &scope, this.clone())?;
            let value = traced(name, &decl.name, value);
            let target = if self.config.is_private(&decl.name) {
                &privates
            } else {
                &this
            };
            self.assign(target, &decl.name, value)?;
        }

        instance.borrow_mut().set(FAULT, Value::from("init"));
        let init = instance.borrow().get("init").cloned();
        if let Some(init @ Value::Function(_)) = init {
            self.context.interp.call(&init, this.clone(), Vec::new())?;
        }

        let handle = ModuleHandle::new(name, Rc::clone(&instance));
        self.registry.loaded(&handle);
        instance.borrow_mut().delete(FAULT);
        self.context.ready.insert(name.to_string(), handle.clone());
        info!(module = name, "module ready");
        Ok(handle)
    }

    /// Scope chain for declaration expressions, innermost first:
    /// `module`/`privates` bindings, private bag, module, dependencies
    /// (last first), root module, globals.
    fn module_scope(&self, this: &Value, privates: &Value, dependencies: &[ModuleHandle]) -> Rc<Scope> {
        let globals = self.context.interp.globals();
        let mut scope = Scope::object(Value::Object(Rc::clone(&self.context.root)), globals);
        for dependency in dependencies {
            scope = Scope::object(dependency.value(), &scope);
        }
        scope = Scope::object(this.clone(), &scope);
        scope = Scope::object(privates.clone(), &scope);

        let scope = Scope::declarative(&scope);
        scope.declare("module", this.clone(), false);
        scope.declare("privates", privates.clone(), false);
        scope
    }

    /// Writes `value` at the dotted `path` below `target`.
    fn assign(&mut self, target: &Value, path: &str, value: Value) -> cwf_script::Result<()> {
        let interp = &mut self.context.interp;
        let (parents, key) = match path.rsplit_once('.') {
            Some((parents, key)) => (Some(parents), key),
            None => (None, path),
        };
        let mut base = target.clone();
        for segment in parents.into_iter().flat_map(|p| p.split('.')) {
            base = interp.get_property(&base, segment)?;
        }
        interp.set_property(&base, key, value)
    }
}

/// Wraps declared functions so failures inside them are traced.
///
/// Remote-call callbacks and already traced functions are left alone.
fn traced(module: &str, path: &str, value: Value) -> Value {
    match &value {
        Value::Function(callable) if !callable.is_rpc_callback() && callable.site().is_none() => {
            Value::Function(Rc::new(Callable::Traced {
                target: Rc::clone(callable),
                site: CallSite::new(Some(module.to_string()), path),
            }))
        }
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packed::pack;

    #[test]
    fn test_root_module_is_memoized_instance() {
        let mut loader = ModuleLoader::new(LoaderConfig::default());
        let value = loader.interpreter_mut().run("Module('') === cwf").expect("run");
        assert_eq!(value, Value::Boolean(true));
        assert_eq!(loader.root().property("path"), Some(Value::from("")));
    }

    #[test]
    fn test_load_writes_declarations() {
        let mut loader = ModuleLoader::new(LoaderConfig::default());
        let outcome = loader
            .load(&pack("\nx=1\ny=x + 1\nz=this.y * 10"), "demo", 5)
            .expect("no sink failure");
        let handle = outcome.handle().expect("loaded");
        assert_eq!(handle.property("y"), Some(Value::Number(2.0)));
        assert_eq!(handle.property("z"), Some(Value::Number(20.0)));
        assert_eq!(handle.property("path"), Some(Value::from("demo")));
        assert_eq!(handle.property(FAULT), None);
        assert_eq!(loader.timestamp("demo"), Some(5));
    }

    #[test]
    fn test_names_are_normalized() {
        let mut loader = ModuleLoader::new(LoaderConfig::default());
        let outcome = loader.load(&pack("\nx=1"), "app_main", 0).expect("loads");
        assert_eq!(outcome.handle().map(ModuleHandle::name), Some("app/main"));
        assert!(loader.module("app/main").is_some());
        assert!(loader.module("app_main").is_some());
    }

    #[test]
    fn test_dotted_declarations_walk_objects() {
        let mut loader = ModuleLoader::new(LoaderConfig::default());
        let outcome = loader
            .load(&pack("\nhelpers={}\nhelpers.twice=function (n) { return n * 2 }\nr=helpers.twice(4)"), "demo", 0)
            .expect("loads");
        assert_eq!(outcome.handle().and_then(|h| h.property("r")), Some(Value::Number(8.0)));
    }

    #[test]
    fn test_declared_functions_are_traced() {
        let mut loader = ModuleLoader::new(LoaderConfig::default());
        let outcome = loader
            .load(&pack("\nf=function () { return 1 }\ng=rpc(function () { return 2 })\nK=Class.subClass()"), "demo", 0)
            .expect("loads");
        let handle = outcome.handle().expect("loaded");
        let Some(Value::Function(f)) = handle.property("f") else {
            panic!("Expected a function");
        };
        assert_eq!(f.site().map(ToString::to_string).as_deref(), Some("demo: f"));
        let Some(Value::Function(g)) = handle.property("g") else {
            panic!("Expected a function");
        };
        assert!(g.site().is_none());
        assert!(matches!(handle.property("K"), Some(Value::Class(_))));
    }
}
