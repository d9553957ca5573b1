//! The tree-walking interpreter.

use super::operators;
use super::string_methods::call_string_method;
use crate::ast::*;
use crate::builtins;
use crate::error::{Error, Result};
use crate::parser::Parser;
use crate::runtime::class::{ClassId, ClassTree, cache_key};
use crate::runtime::function::{Callable, Function};
use crate::runtime::object::Object;
use crate::runtime::scope::{Scope, ScopeKind};
use crate::runtime::trace::{TraceEntry, TraceRecorder};
use crate::runtime::value::{ObjectRef, Value, format_number};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::trace;

/// Default limit on nested script function calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// Default limit on native stack used by nested script calls, measured
/// from the outermost call. Half of the 2 MiB a spawned thread gets.
pub const DEFAULT_MAX_STACK_BYTES: usize = 1024 * 1024;

/// How a statement finished.
#[derive(Debug)]
enum Completion {
    Normal,
    Return(Value),
    Break,
    Continue,
}

/// An active script function call.
#[derive(Debug)]
struct Frame {
    this: Value,
}

/// Executes module script.
///
/// One interpreter owns the class tree, the failure trace and the global
/// scope; everything a loader context shares between modules hangs off it.
pub struct Interpreter {
    classes: ClassTree,
    trace: TraceRecorder,
    globals: Rc<Scope>,
    frames: Vec<Frame>,
    max_call_depth: usize,
    max_stack_bytes: usize,
    /// Stack address of the outermost active script call.
    stack_base: Option<usize>,
    root_class: ClassId,
    error_class: ClassId,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an interpreter with the root `Class` and the builtins
    /// (`Class`, `Error`, `rpc`) installed as globals.
    pub fn new() -> Self {
        let mut classes = ClassTree::new();
        let root_class = classes.define_class();
        classes.name_class(root_class, "Class");
        let error_class = builtins::define_error_class(&mut classes, root_class);

        let globals = Scope::global();
        builtins::install_globals(&globals, root_class, error_class);

        Self {
            classes,
            trace: TraceRecorder::new(),
            globals,
            frames: Vec::new(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_stack_bytes: DEFAULT_MAX_STACK_BYTES,
            stack_base: None,
            root_class,
            error_class,
        }
    }

    /// Sets the limit on nested script function calls.
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Sets the native stack budget for nested script calls.
    pub fn with_max_stack_bytes(mut self, bytes: usize) -> Self {
        self.max_stack_bytes = bytes;
        self
    }

    /// The root class every class derives from.
    pub fn root_class(&self) -> ClassId {
        self.root_class
    }

    /// The builtin `Error` class.
    pub fn error_class(&self) -> ClassId {
        self.error_class
    }

    /// The class tree.
    pub fn classes(&self) -> &ClassTree {
        &self.classes
    }

    /// Mutable access to the class tree.
    pub fn classes_mut(&mut self) -> &mut ClassTree {
        &mut self.classes
    }

    /// The failure trace.
    pub fn trace(&self) -> &TraceRecorder {
        &self.trace
    }

    /// Mutable access to the failure trace.
    pub fn trace_mut(&mut self) -> &mut TraceRecorder {
        &mut self.trace
    }

    /// The global scope.
    pub fn globals(&self) -> &Rc<Scope> {
        &self.globals
    }

    /// Declares a global binding.
    pub fn define_global(&self, name: &str, value: Value) {
        self.globals.declare(name, value, true);
    }

    /// Parses and runs `source` in the global scope.
    ///
    /// Returns the value of the last expression statement.
    pub fn run(&mut self, source: &str) -> Result<Value> {
        let program = Parser::new(source).parse_program()?;
        let globals = Rc::clone(&self.globals);
        self.execute_program(&program, &globals)
    }

    /// Runs a program in `scope`, returning the value of the last
    /// expression statement.
    pub fn execute_program(&mut self, program: &Program, scope: &Rc<Scope>) -> Result<Value> {
        self.hoist_declarations(&program.body, scope);
        let mut last = Value::Undefined;
        for statement in &program.body {
            if let Statement::Expression(expr) = statement {
                last = self.evaluate(expr, scope)?;
                continue;
            }
            match self.execute_statement(statement, scope)? {
                Completion::Normal => {}
                Completion::Return(value) => return Ok(value),
                Completion::Break | Completion::Continue => {
                    return Err(Error::syntax("Illegal break or continue", 0));
                }
            }
        }
        Ok(last)
    }

    /// Evaluates `expr` in `scope` with `this` bound to `this`.
    pub fn eval_in(&mut self, expr: &Expression, scope: &Rc<Scope>, this: Value) -> Result<Value> {
        self.frames.push(Frame { this });
        let result = self.evaluate(expr, scope);
        self.frames.pop();
        result
    }

    // ==================== Calls and classes ====================

    /// Calls a function or class value.
    ///
    /// Calling a class is the name-memoized construction of
    /// [`Interpreter::get_or_create`].
    pub fn call(&mut self, callee: &Value, this: Value, args: Vec<Value>) -> Result<Value> {
        match callee {
            Value::Function(callable) => self.call_callable(callable, this, args),
            Value::Class(class) => self.get_or_create(*class, &args),
            other => Err(Error::type_error(format!("{} is not a function", other.type_of()))),
        }
    }

    fn call_callable(&mut self, callable: &Rc<Callable>, this: Value, args: Vec<Value>) -> Result<Value> {
        match &**callable {
            Callable::Native(native) => (native.func)(self, &this, &args),
            Callable::Function(function) => self.call_function(function, this, args),
            Callable::Traced { target, site } => {
                match self.call_callable(target, this.clone(), args.clone()) {
                    Ok(value) => Ok(value),
                    Err(err) => {
                        trace!(site = %site, depth = self.trace.len(), "unwinding traced call");
                        self.trace.push(TraceEntry {
                            context: this,
                            args,
                            site: site.clone(),
                        });
                        Err(err)
                    }
                }
            }
        }
    }

    fn call_function(&mut self, function: &Function, this: Value, args: Vec<Value>) -> Result<Value> {
        let marker = 0u8;
        let here = &marker as *const u8 as usize;
        let outermost = self.stack_base.is_none();
        let base = *self.stack_base.get_or_insert(here);
        if self.frames.len() >= self.max_call_depth || base.abs_diff(here) > self.max_stack_bytes {
            if outermost {
                self.stack_base = None;
            }
            return Err(Error::Range("Maximum call stack size exceeded".into()));
        }

        let scope = Scope::declarative(&function.scope);
        for (i, param) in function.params.iter().enumerate() {
            scope.declare(param.as_str(), args.get(i).cloned().unwrap_or_default(), true);
        }
        scope.declare("arguments", Value::array(args), true);

        self.frames.push(Frame { this });
        let result = self.execute_body(&function.body, &scope);
        self.frames.pop();
        if outermost {
            self.stack_base = None;
        }

        match result? {
            Completion::Return(value) => Ok(value),
            _ => Ok(Value::Undefined),
        }
    }

    /// Creates a fresh instance of `class`.
    ///
    /// If `init` resolves to a function it is called with the arguments;
    /// any `init` the instance holds as an own property afterwards is
    /// removed.
    pub fn construct(&mut self, class: ClassId, args: &[Value]) -> Result<ObjectRef> {
        let instance = Rc::new(RefCell::new(Object::instance_of(class)));
        self.initialize(&instance, args)?;
        Ok(instance)
    }

    fn initialize(&mut self, instance: &ObjectRef, args: &[Value]) -> Result<()> {
        let this = Value::Object(Rc::clone(instance));
        let init = self.get_property(&this, "init")?;
        if let Value::Function(_) = init {
            self.call(&init, this, args.to_vec())?;
            instance.borrow_mut().delete("init");
        }
        Ok(())
    }

    /// Returns the instance memoized under the first argument's text
    /// (case-insensitive), creating and caching it on first use.
    pub fn get_or_create(&mut self, class: ClassId, args: &[Value]) -> Result<Value> {
        let first = args.first().cloned().unwrap_or_default();
        let key = cache_key(&self.to_string(&first)?);
        if let Some(instance) = self.classes.cached_instance(class, &key) {
            return Ok(Value::Object(instance));
        }

        let instance = self.construct(class, args)?;
        self.classes.cache_instance(class, key, Rc::clone(&instance));
        Ok(Value::Object(instance))
    }

    /// Creates an initialised instance of `class` carrying a copy of the
    /// own properties of `source`.
    pub fn cast(&mut self, class: ClassId, source: &Value) -> Result<Value> {
        let instance = self.construct(class, &[])?;
        if let Value::Object(source) = source {
            let properties = source.borrow().properties.clone();
            let mut target = instance.borrow_mut();
            for (key, value) in properties {
                target.set(key, value);
            }
        }
        Ok(Value::Object(instance))
    }

    /// Whether `value` is an instance of `class` or of one of its
    /// subclasses.
    pub fn instance_of(&self, value: &Value, class: ClassId) -> bool {
        match value {
            Value::Object(obj) => obj
                .borrow()
                .class
                .is_some_and(|own| self.classes.is_subclass_of(own, class)),
            _ => false,
        }
    }

    // ==================== Properties ====================

    /// Reads a property, falling back to the class prototype for
    /// instances.
    pub fn get_property(&mut self, base: &Value, key: &str) -> Result<Value> {
        match base {
            Value::Undefined | Value::Null => Err(Error::type_error(format!(
                "Cannot read properties of {} (reading '{}')",
                base, key
            ))),
            Value::Object(_) => Ok(self.object_property(base, key).unwrap_or_default()),
            Value::Array(elements) => {
                let elements = elements.borrow();
                if key == "length" {
                    return Ok(Value::Number(elements.len() as f64));
                }
                Ok(key
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| elements.get(i).cloned())
                    .unwrap_or_default())
            }
            Value::String(s) => {
                if key == "length" {
                    return Ok(Value::Number(s.chars().count() as f64));
                }
                Ok(key
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| s.chars().nth(i))
                    .map(|c| Value::String(c.to_string()))
                    .unwrap_or_default())
            }
            Value::Class(class) => Ok(builtins::class_member(self, *class, key)),
            _ => Ok(Value::Undefined),
        }
    }

    /// Own property or class-provided property of an object value.
    fn object_property(&self, target: &Value, key: &str) -> Option<Value> {
        let Value::Object(obj) = target else {
            return None;
        };
        let obj = obj.borrow();
        if let Some(value) = obj.get(key) {
            return Some(value.clone());
        }
        obj.class.and_then(|class| self.classes.lookup(class, key))
    }

    /// Writes an own property.
    pub fn set_property(&mut self, base: &Value, key: &str, value: Value) -> Result<()> {
        match base {
            Value::Undefined | Value::Null => Err(Error::type_error(format!(
                "Cannot set properties of {} (setting '{}')",
                base, key
            ))),
            Value::Object(obj) => {
                obj.borrow_mut().set(key, value);
                Ok(())
            }
            Value::Array(elements) => {
                let Ok(index) = key.parse::<usize>() else {
                    return Ok(());
                };
                let mut elements = elements.borrow_mut();
                if index >= elements.len() {
                    elements.resize(index + 1, Value::Undefined);
                }
                elements[index] = value;
                Ok(())
            }
            Value::Class(_) => Err(Error::type_error(format!(
                "Cannot assign class member '{}'; use implement()",
                key
            ))),
            _ => Ok(()),
        }
    }

    // ==================== Conversions ====================

    /// Converts a value to text, running a script `toString` on objects.
    pub fn to_string(&mut self, value: &Value) -> Result<String> {
        match value {
            Value::Object(_) => {
                let method = self.object_property(value, "toString");
                if let Some(method @ Value::Function(_)) = method {
                    let result = self.call(&method, value.clone(), Vec::new())?;
                    return Ok(result.to_string());
                }
                Ok(value.to_string())
            }
            Value::Array(elements) => {
                let elements = elements.borrow().clone();
                let mut parts = Vec::with_capacity(elements.len());
                for element in &elements {
                    parts.push(if element.is_nullish() {
                        String::new()
                    } else {
                        self.to_string(element)?
                    });
                }
                Ok(parts.join(","))
            }
            other => Ok(other.to_string()),
        }
    }

    fn to_primitive(&mut self, value: Value) -> Result<Value> {
        match value {
            Value::Object(_) | Value::Array(_) => Ok(Value::String(self.to_string(&value)?)),
            other => Ok(other),
        }
    }

    fn to_property_key(&mut self, value: &Value) -> Result<String> {
        match value {
            Value::Number(n) => Ok(format_number(*n)),
            other => self.to_string(other),
        }
    }

    /// The value a `catch` clause binds for `err`.
    ///
    /// Thrown values pass through; engine errors become `Error` instances
    /// whose `message` is the error text.
    pub fn error_value(&self, err: Error) -> Value {
        match err {
            Error::Thrown(value) => value,
            other => {
                let mut instance = Object::instance_of(self.error_class);
                instance.set("message", Value::String(other.to_string()));
                Value::object(instance)
            }
        }
    }

    // ==================== Statements ====================

    fn execute_body(&mut self, body: &[Statement], scope: &Rc<Scope>) -> Result<Completion> {
        self.hoist_declarations(body, scope);
        self.execute_block(body, scope)
    }

    /// Declares function declarations and `var` names before a body runs.
    fn hoist_declarations(&self, body: &[Statement], scope: &Rc<Scope>) {
        for statement in body {
            match statement {
                Statement::FunctionDeclaration(decl) => {
                    let value = self.create_function(&decl.function, scope);
                    scope.declare(decl.id.name.as_str(), value, true);
                }
                Statement::VariableDeclaration(decl) if decl.kind == VariableKind::Var => {
                    for declarator in &decl.declarations {
                        if scope.binding(&declarator.id.name).is_none() {
                            scope.declare(declarator.id.name.as_str(), Value::Undefined, true);
                        }
                    }
                }
                Statement::Block(body) => self.hoist_declarations(body, scope),
                _ => {}
            }
        }
    }

    fn execute_block(&mut self, body: &[Statement], scope: &Rc<Scope>) -> Result<Completion> {
        for statement in body {
            match self.execute_statement(statement, scope)? {
                Completion::Normal => {}
                abrupt => return Ok(abrupt),
            }
        }
        Ok(Completion::Normal)
    }

    fn execute_statement(&mut self, statement: &Statement, scope: &Rc<Scope>) -> Result<Completion> {
        match statement {
            Statement::VariableDeclaration(decl) => {
                for declarator in &decl.declarations {
                    let value = match &declarator.init {
                        Some(init) => self.evaluate(init, scope)?,
                        None if decl.kind == VariableKind::Var => continue,
                        None => Value::Undefined,
                    };
                    scope.declare(
                        declarator.id.name.as_str(),
                        value,
                        decl.kind != VariableKind::Const,
                    );
                }
                Ok(Completion::Normal)
            }
            Statement::FunctionDeclaration(_) | Statement::Empty => Ok(Completion::Normal),
            Statement::Expression(expr) => {
                self.evaluate(expr, scope)?;
                Ok(Completion::Normal)
            }
            Statement::Block(body) => self.execute_block(body, scope),
            Statement::If(stmt) => {
                if self.evaluate(&stmt.test, scope)?.to_boolean() {
                    self.execute_statement(&stmt.consequent, scope)
                } else if let Some(alternate) = &stmt.alternate {
                    self.execute_statement(alternate, scope)
                } else {
                    Ok(Completion::Normal)
                }
            }
            Statement::While(stmt) => {
                while self.evaluate(&stmt.test, scope)?.to_boolean() {
                    match self.execute_statement(&stmt.body, scope)? {
                        Completion::Break => break,
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                        Completion::Normal | Completion::Continue => {}
                    }
                }
                Ok(Completion::Normal)
            }
            Statement::For(stmt) => {
                if let Some(init) = &stmt.init {
                    self.execute_statement(init, scope)?;
                }
                loop {
                    if let Some(test) = &stmt.test {
                        if !self.evaluate(test, scope)?.to_boolean() {
                            break;
                        }
                    }
                    match self.execute_statement(&stmt.body, scope)? {
                        Completion::Break => break,
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                        Completion::Normal | Completion::Continue => {}
                    }
                    if let Some(update) = &stmt.update {
                        self.evaluate(update, scope)?;
                    }
                }
                Ok(Completion::Normal)
            }
            Statement::Return(argument) => {
                let value = match argument {
                    Some(expr) => self.evaluate(expr, scope)?,
                    None => Value::Undefined,
                };
                Ok(Completion::Return(value))
            }
            Statement::Break => Ok(Completion::Break),
            Statement::Continue => Ok(Completion::Continue),
            Statement::Throw(expr) => {
                let value = self.evaluate(expr, scope)?;
                Err(Error::Thrown(value))
            }
            Statement::Try(stmt) => self.execute_try(stmt, scope),
        }
    }

    fn execute_try(&mut self, stmt: &TryStatement, scope: &Rc<Scope>) -> Result<Completion> {
        let trace_len = self.trace.len();
        let result = match (self.execute_block(&stmt.block, scope), &stmt.handler) {
            (Err(err), Some(handler)) => {
                // A handled failure leaves no trace behind.
                self.trace.truncate(trace_len);
                let catch_scope = Scope::declarative(scope);
                if let Some(param) = &handler.param {
                    catch_scope.declare(param.name.as_str(), self.error_value(err), true);
                }
                self.execute_block(&handler.body, &catch_scope)
            }
            (result, _) => result,
        };

        if let Some(finalizer) = &stmt.finalizer {
            match self.execute_block(finalizer, scope)? {
                Completion::Normal => {}
                abrupt => return Ok(abrupt),
            }
        }
        result
    }

    // ==================== Expressions ====================

    fn create_function(&self, function: &FunctionExpression, scope: &Rc<Scope>) -> Value {
        Value::Function(Rc::new(Callable::Function(Function {
            name: function.id.as_ref().map(|id| id.name.clone()),
            params: function.params.iter().map(|p| p.name.clone()).collect(),
            body: Rc::clone(&function.body),
            scope: Rc::clone(scope),
            rpc_callback: false,
        })))
    }

    /// Evaluates an expression in `scope`.
    pub fn evaluate(&mut self, expr: &Expression, scope: &Rc<Scope>) -> Result<Value> {
        match expr {
            Expression::Literal(literal) => Ok(match literal {
                Literal::Number(n) => Value::Number(*n),
                Literal::String(s) => Value::String(s.clone()),
                Literal::Boolean(b) => Value::Boolean(*b),
                Literal::Null => Value::Null,
            }),
            Expression::Identifier(id) => match self.resolve(scope, &id.name) {
                Some((value, _)) => Ok(value),
                None => Err(Error::reference_error(format!("{} is not defined", id.name))),
            },
            Expression::This => Ok(self
                .frames
                .last()
                .map(|frame| frame.this.clone())
                .unwrap_or_default()),
            Expression::Array(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.evaluate(element, scope)?);
                }
                Ok(Value::array(values))
            }
            Expression::Object(properties) => {
                let mut object = Object::new();
                for property in properties {
                    let value = self.evaluate(&property.value, scope)?;
                    object.set(property.key.as_str(), value);
                }
                Ok(Value::object(object))
            }
            Expression::Binary(binary) => self.evaluate_binary(binary, scope),
            Expression::Logical(logical) => {
                let left = self.evaluate(&logical.left, scope)?;
                let short_circuit = match logical.operator {
                    LogicalOperator::And => !left.to_boolean(),
                    LogicalOperator::Or => left.to_boolean(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(&logical.right, scope)
                }
            }
            Expression::Unary(unary) => self.evaluate_unary(unary, scope),
            Expression::Assignment(assign) => self.evaluate_assignment(assign, scope),
            Expression::Update(update) => {
                let old = self.evaluate(&update.argument, scope)?.to_number();
                let new = if update.increment { old + 1.0 } else { old - 1.0 };
                self.assign_to(&update.argument, Value::Number(new), scope)?;
                Ok(Value::Number(if update.prefix { new } else { old }))
            }
            Expression::Call(call) => self.evaluate_call(call, scope),
            Expression::New(call) => {
                let callee = self.evaluate(&call.callee, scope)?;
                let args = self.evaluate_arguments(&call.arguments, scope)?;
                match callee {
                    Value::Class(class) => Ok(Value::Object(self.construct(class, &args)?)),
                    other => Err(Error::type_error(format!("{} is not a constructor", other))),
                }
            }
            Expression::Member(member) => {
                let object = self.evaluate(&member.object, scope)?;
                let key = self.member_key(&member.property, scope)?;
                self.get_property(&object, &key)
            }
            Expression::Conditional(cond) => {
                if self.evaluate(&cond.test, scope)?.to_boolean() {
                    self.evaluate(&cond.consequent, scope)
                } else {
                    self.evaluate(&cond.alternate, scope)
                }
            }
            Expression::Function(function) => Ok(self.create_function(function, scope)),
        }
    }

    fn member_key(&mut self, property: &MemberProperty, scope: &Rc<Scope>) -> Result<String> {
        match property {
            MemberProperty::Identifier(id) => Ok(id.name.clone()),
            MemberProperty::Computed(expr) => {
                let key = self.evaluate(expr, scope)?;
                self.to_property_key(&key)
            }
        }
    }

    fn evaluate_arguments(&mut self, arguments: &[Expression], scope: &Rc<Scope>) -> Result<Vec<Value>> {
        let mut values = Vec::with_capacity(arguments.len());
        for argument in arguments {
            values.push(self.evaluate(argument, scope)?);
        }
        Ok(values)
    }

    fn evaluate_binary(&mut self, binary: &BinaryExpression, scope: &Rc<Scope>) -> Result<Value> {
        let left = self.evaluate(&binary.left, scope)?;
        let right = self.evaluate(&binary.right, scope)?;
        match binary.operator {
            BinaryOperator::Add => {
                let left = self.to_primitive(left)?;
                let right = self.to_primitive(right)?;
                Ok(operators::add(&left, &right))
            }
            BinaryOperator::InstanceOf => match right {
                Value::Class(class) => Ok(Value::Boolean(self.instance_of(&left, class))),
                _ => Err(Error::type_error("Right-hand side of 'instanceof' is not a class")),
            },
            operator => {
                let left = self.to_primitive(left)?;
                let right = self.to_primitive(right)?;
                operators::binary(operator, &left, &right)
                    .ok_or_else(|| Error::Internal(format!("unhandled operator {:?}", operator)))
            }
        }
    }

    fn evaluate_unary(&mut self, unary: &UnaryExpression, scope: &Rc<Scope>) -> Result<Value> {
        if unary.operator == UnaryOperator::Typeof {
            if let Expression::Identifier(id) = &*unary.argument {
                let value = self.resolve(scope, &id.name).map(|(v, _)| v).unwrap_or_default();
                return Ok(Value::from(value.type_of()));
            }
        }

        let argument = self.evaluate(&unary.argument, scope)?;
        Ok(match unary.operator {
            UnaryOperator::Minus => Value::Number(-argument.to_number()),
            UnaryOperator::Plus => Value::Number(argument.to_number()),
            UnaryOperator::LogicalNot => Value::Boolean(!argument.to_boolean()),
            UnaryOperator::Typeof => Value::from(argument.type_of()),
            UnaryOperator::Void => Value::Undefined,
        })
    }

    fn evaluate_assignment(&mut self, assign: &AssignmentExpression, scope: &Rc<Scope>) -> Result<Value> {
        let value = match assign.operator {
            AssignmentOperator::Assign => self.evaluate(&assign.right, scope)?,
            AssignmentOperator::AddAssign => {
                let current = self.evaluate(&assign.left, scope)?;
                let current = self.to_primitive(current)?;
                let right = self.evaluate(&assign.right, scope)?;
                let right = self.to_primitive(right)?;
                operators::add(&current, &right)
            }
            AssignmentOperator::SubtractAssign => {
                let current = self.evaluate(&assign.left, scope)?.to_number();
                let right = self.evaluate(&assign.right, scope)?.to_number();
                Value::Number(current - right)
            }
        };
        self.assign_to(&assign.left, value.clone(), scope)?;
        Ok(value)
    }

    fn assign_to(&mut self, target: &Expression, value: Value, scope: &Rc<Scope>) -> Result<()> {
        match target {
            Expression::Identifier(id) => self.assign_identifier(scope, &id.name, value),
            Expression::Member(member) => {
                let object = self.evaluate(&member.object, scope)?;
                let key = self.member_key(&member.property, scope)?;
                self.set_property(&object, &key, value)
            }
            _ => Err(Error::syntax("Invalid assignment target", 0)),
        }
    }

    fn evaluate_call(&mut self, call: &CallExpression, scope: &Rc<Scope>) -> Result<Value> {
        let (callee, this) = match &*call.callee {
            Expression::Member(member) => {
                let base = self.evaluate(&member.object, scope)?;
                let key = self.member_key(&member.property, scope)?;
                match &base {
                    Value::String(s) => {
                        let args = self.evaluate_arguments(&call.arguments, scope)?;
                        return call_string_method(s, &key, &args).ok_or_else(|| {
                            Error::type_error(format!("string.{} is not a function", key))
                        });
                    }
                    Value::Array(_) => {
                        let args = self.evaluate_arguments(&call.arguments, scope)?;
                        return self.call_array_method(&base, &key, &args);
                    }
                    _ => {}
                }
                let callee = self.get_property(&base, &key)?;
                if !callee.is_callable() {
                    return Err(Error::type_error(format!("{}.{} is not a function", describe(&member.object), key)));
                }
                (callee, base)
            }
            Expression::Identifier(id) => match self.resolve(scope, &id.name) {
                Some((callee, this)) => (callee, this),
                None => return Err(Error::reference_error(format!("{} is not defined", id.name))),
            },
            other => (self.evaluate(other, scope)?, Value::Undefined),
        };

        if !callee.is_callable() {
            return Err(Error::type_error(format!("{} is not a function", describe(&call.callee))));
        }
        let args = self.evaluate_arguments(&call.arguments, scope)?;
        self.call(&callee, this, args)
    }

    fn call_array_method(&mut self, base: &Value, method: &str, args: &[Value]) -> Result<Value> {
        let Value::Array(elements) = base else {
            return Ok(Value::Undefined);
        };
        let value = match method {
            "push" => {
                let mut elements = elements.borrow_mut();
                elements.extend(args.iter().cloned());
                Value::Number(elements.len() as f64)
            }
            "pop" => elements.borrow_mut().pop().unwrap_or_default(),
            "shift" => {
                let mut elements = elements.borrow_mut();
                if elements.is_empty() {
                    Value::Undefined
                } else {
                    elements.remove(0)
                }
            }
            "indexOf" => {
                let needle = args.first().cloned().unwrap_or_default();
                let position = elements
                    .borrow()
                    .iter()
                    .position(|v| operators::strict_equals(v, &needle));
                Value::Number(position.map_or(-1.0, |i| i as f64))
            }
            "slice" => {
                let elements = elements.borrow();
                let len = elements.len() as i64;
                let relative = |v: Option<&Value>, default: i64| {
                    let n = match v {
                        Some(Value::Undefined) | None => default,
                        Some(v) => v.to_number() as i64,
                    };
                    if n < 0 { len.saturating_add(n).max(0) } else { n.min(len) }
                };
                let start = relative(args.first(), 0) as usize;
                let end = relative(args.get(1), len) as usize;
                Value::array(elements.get(start..end.max(start)).unwrap_or_default().to_vec())
            }
            "concat" => {
                let mut out = elements.borrow().clone();
                for arg in args {
                    match arg {
                        Value::Array(other) => out.extend(other.borrow().iter().cloned()),
                        other => out.push(other.clone()),
                    }
                }
                Value::array(out)
            }
            "join" => {
                let separator = match args.first() {
                    Some(Value::Undefined) | None => ",".to_string(),
                    Some(sep) => sep.to_string(),
                };
                let items = elements.borrow().clone();
                let mut parts = Vec::with_capacity(items.len());
                for item in &items {
                    parts.push(if item.is_nullish() {
                        String::new()
                    } else {
                        self.to_string(item)?
                    });
                }
                Value::String(parts.join(&separator))
            }
            "toString" => Value::String(self.to_string(base)?),
            _ => return Err(Error::type_error(format!("array.{} is not a function", method))),
        };
        Ok(value)
    }

    // ==================== Scopes ====================

    /// Resolves `name` along the scope chain.
    ///
    /// Returns the value and the `this` a call through the name binds:
    /// the target object for names found in an object scope.
    fn resolve(&self, scope: &Rc<Scope>, name: &str) -> Option<(Value, Value)> {
        let mut current = Some(scope);
        while let Some(link) = current {
            match link.kind() {
                ScopeKind::Declarative(bindings) => {
                    if let Some(binding) = bindings.borrow().get(name) {
                        return Some((binding.value.clone(), Value::Undefined));
                    }
                }
                ScopeKind::Object(target) => {
                    if let Some(value) = self.object_property(target, name) {
                        return Some((value, target.clone()));
                    }
                }
            }
            current = link.parent();
        }
        None
    }

    fn assign_identifier(&mut self, scope: &Rc<Scope>, name: &str, value: Value) -> Result<()> {
        let mut current = Some(scope);
        while let Some(link) = current {
            match link.kind() {
                ScopeKind::Declarative(bindings) => {
                    if let Some(binding) = bindings.borrow_mut().get_mut(name) {
                        if !binding.mutable {
                            return Err(Error::type_error("Assignment to constant variable."));
                        }
                        binding.value = value;
                        return Ok(());
                    }
                }
                ScopeKind::Object(target) => {
                    if self.object_property(target, name).is_some() {
                        return self.set_property(target, name, value);
                    }
                }
            }
            current = link.parent();
        }
        Err(Error::reference_error(format!("{} is not defined", name)))
    }
}

/// Short source-like rendering of a callee for error messages.
fn describe(expr: &Expression) -> String {
    match expr {
        Expression::Identifier(id) => id.name.clone(),
        Expression::This => "this".to_string(),
        Expression::Member(member) => match &member.property {
            MemberProperty::Identifier(id) => format!("{}.{}", describe(&member.object), id.name),
            MemberProperty::Computed(_) => format!("{}[...]", describe(&member.object)),
        },
        Expression::Call(call) => format!("{}(...)", describe(&call.callee)),
        _ => "expression".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(source: &str) -> Value {
        Interpreter::new()
            .run(source)
            .unwrap_or_else(|e| panic!("{:?} failed: {}", source, e))
    }

    fn eval_err(source: &str) -> Error {
        Interpreter::new().run(source).expect_err("expected an error")
    }

    #[test]
    fn test_arithmetic_and_strings() {
        assert_eq!(eval("1 + 2 * 3"), Value::Number(7.0));
        assert_eq!(eval("'a' + 1 + 2"), Value::from("a12"));
        assert_eq!(eval("10 % 4 - 1"), Value::Number(1.0));
    }

    #[test]
    fn test_functions_and_closures() {
        let source = "
            function counter() { var n = 0; return function () { n++; return n } }
            var next = counter()
            next(); next()
        ";
        assert_eq!(eval(source), Value::Number(2.0));
    }

    #[test]
    fn test_hoisting() {
        assert_eq!(eval("var r = f(); function f() { return 5 } r"), Value::Number(5.0));
    }

    #[test]
    fn test_loops() {
        let source = "
            var total = 0
            for (var i = 0; i < 10; i++) { if (i == 5) break; if (i % 2) continue; total += i }
            var j = 0
            while (j < 3) j++
            total + j
        ";
        assert_eq!(eval(source), Value::Number(9.0));
    }

    #[test]
    fn test_try_catch_finally() {
        let source = "
            var log = []
            try { throw 'x' } catch (e) { log.push(e) } finally { log.push('f') }
            try { undefinedName } catch (e) { log.push(e.message) }
            log.join('|')
        ";
        assert_eq!(
            eval(source),
            Value::from("x|f|ReferenceError: undefinedName is not defined")
        );
    }

    #[test]
    fn test_const_rejects_assignment() {
        assert!(matches!(eval_err("const k = 1; k = 2"), Error::Type(_)));
    }

    #[test]
    fn test_undeclared_assignment_is_reference_error() {
        assert!(matches!(eval_err("nothing = 1"), Error::Reference(_)));
    }

    #[test]
    fn test_object_and_array_access() {
        assert_eq!(eval("var o = { a: { b: [1, 2, 3] } }; o.a.b[1] + o.a.b.length"), Value::Number(5.0));
        assert_eq!(eval("var o = {}; o['x' + 1] = 4; o.x1"), Value::Number(4.0));
        assert_eq!(eval("'abc'.toUpperCase() + 'abc'.length"), Value::from("ABC3"));
    }

    #[test]
    fn test_this_binding_in_method_calls() {
        assert_eq!(eval("var o = { v: 3, get: function () { return this.v } }; o.get()"), Value::Number(3.0));
    }

    #[test]
    fn test_typeof_undeclared() {
        assert_eq!(eval("typeof missing"), Value::from("undefined"));
        assert_eq!(eval("typeof Class"), Value::from("function"));
    }

    #[test]
    fn test_call_depth_limit() {
        let mut interp = Interpreter::new().with_max_call_depth(16);
        let err = interp.run("function f() { return f() } f()").expect_err("overflow");
        assert!(matches!(err, Error::Range(_)));
    }

    #[test]
    fn test_array_slice_with_infinite_bounds() {
        assert_eq!(eval("[1, 2, 3].slice(-Infinity, Infinity).length"), Value::Number(3.0));
        assert_eq!(eval("[1, 2, 3].slice(Infinity).length"), Value::Number(0.0));
    }

    #[test]
    fn test_stack_budget_limit() {
        let mut interp = Interpreter::new().with_max_stack_bytes(64 * 1024);
        let err = interp
            .run("function f(n) { return f(n + 1) } f(0)")
            .expect_err("overflow");
        assert_eq!(err.to_string(), "RangeError: Maximum call stack size exceeded");

        // the budget is measured per outermost call
        assert_eq!(
            interp.run("function g(n) { return n == 0 ? 0 : g(n - 1) } g(3)").expect("shallow"),
            Value::Number(0.0)
        );
    }

    #[test]
    fn test_calling_non_function() {
        let err = eval_err("var o = {}; o.missing()");
        assert_eq!(err.to_string(), "TypeError: o.missing is not a function");
    }

    #[test]
    fn test_to_string_uses_script_method() {
        let mut interp = Interpreter::new();
        let value = interp
            .run("var o = { toString: function () { return 'custom' } }; o")
            .expect("object");
        assert_eq!(interp.to_string(&value).expect("text"), "custom");
        assert_eq!(interp.run("'' + o").expect("concat"), Value::from("custom"));
    }
}
