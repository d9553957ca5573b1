//! Syntax tree for module script.
//!
//! Node names follow ESTree where the language overlaps with JavaScript.
//! Function bodies sit behind an `Rc` so creating a closure at runtime
//! shares the tree instead of cloning it.

use std::rc::Rc;

/// Top-level statement list: REPL input or a script run by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Statements in source order.
    pub body: Vec<Statement>,
}

/// A bare name: a binding, parameter or `obj.name` property.
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    /// Source spelling.
    pub name: String,
}

impl Identifier {
    /// Wraps `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Statement forms.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `var`, `let` or `const` with one or more declarators.
    VariableDeclaration(VariableDeclaration),
    /// `function name() {}` at statement level.
    FunctionDeclaration(FunctionDeclaration),
    /// An expression evaluated for its effect.
    Expression(Expression),
    /// `{ ... }`
    Block(Vec<Statement>),
    /// `if (test) .. else ..`
    If(IfStatement),
    /// `while (test) body`
    While(WhileStatement),
    /// `for (init; test; update) body`
    For(ForStatement),
    /// `return` with an optional value.
    Return(Option<Expression>),
    /// `break` out of the innermost loop.
    Break,
    /// `continue` with the next iteration.
    Continue,
    /// `throw value`
    Throw(Expression),
    /// `try` with `catch` and/or `finally`.
    Try(TryStatement),
    /// A lone `;`.
    Empty,
}

/// Keyword that introduced a variable declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// `var`
    Var,
    /// `let`
    Let,
    /// `const`; rejects reassignment at runtime.
    Const,
}

/// `var a = 1, b;`
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    /// Introducing keyword.
    pub kind: VariableKind,
    /// `a = 1` and `b` in the example above.
    pub declarations: Vec<VariableDeclarator>,
}

/// One `name = init` entry of a declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclarator {
    /// Declared name.
    pub id: Identifier,
    /// Initial value; the binding starts `undefined` without one.
    pub init: Option<Expression>,
}

/// `function name(params) { body }`, hoisted to the top of its scope.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    /// Name bound in the enclosing scope.
    pub id: Identifier,
    /// Parameters and body.
    pub function: FunctionExpression,
}

/// `if (test) consequent else alternate`
#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    /// Condition, tested for truthiness.
    pub test: Expression,
    /// Runs when `test` is truthy.
    pub consequent: Box<Statement>,
    /// Runs otherwise, if present.
    pub alternate: Option<Box<Statement>>,
}

/// `while (test) body`
#[derive(Debug, Clone, PartialEq)]
pub struct WhileStatement {
    /// Checked before every iteration.
    pub test: Expression,
    /// Loop body.
    pub body: Box<Statement>,
}

/// C-style `for`. Every clause is optional; a missing test loops forever.
#[derive(Debug, Clone, PartialEq)]
pub struct ForStatement {
    /// Declaration or expression statement run once.
    pub init: Option<Box<Statement>>,
    /// Checked before every iteration.
    pub test: Option<Expression>,
    /// Evaluated after every iteration.
    pub update: Option<Expression>,
    /// Loop body.
    pub body: Box<Statement>,
}

/// `try { block } catch (param) { .. } finally { .. }`. At least one of
/// `handler` and `finalizer` is present.
#[derive(Debug, Clone, PartialEq)]
pub struct TryStatement {
    /// Guarded statements.
    pub block: Vec<Statement>,
    /// Runs when `block` throws.
    pub handler: Option<CatchClause>,
    /// Runs on every exit from the statement.
    pub finalizer: Option<Vec<Statement>>,
}

/// `catch (param) { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    /// `None` for `catch { .. }` without a binding.
    pub param: Option<Identifier>,
    /// Handler statements.
    pub body: Vec<Statement>,
}

/// Expression forms.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Number, string, boolean or `null`.
    Literal(Literal),
    /// Variable reference.
    Identifier(Identifier),
    /// `this`
    This,
    /// `[a, b]`
    Array(Vec<Expression>),
    /// `{ key: value }`
    Object(Vec<Property>),
    /// Arithmetic, comparison and `instanceof`.
    Binary(BinaryExpression),
    /// `&&` and `||`; the right side is evaluated lazily.
    Logical(LogicalExpression),
    /// Prefix operators other than `++`/`--`.
    Unary(UnaryExpression),
    /// `=`, `+=`, `-=`
    Assignment(AssignmentExpression),
    /// `++` and `--`, prefix or postfix.
    Update(UpdateExpression),
    /// `callee(args)`
    Call(CallExpression),
    /// `new C(args)`; shares the call node shape.
    New(CallExpression),
    /// `obj.name` or `obj[expr]`
    Member(MemberExpression),
    /// `test ? a : b`
    Conditional(ConditionalExpression),
    /// A function literal.
    Function(FunctionExpression),
}

/// Literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Numeric literal.
    Number(f64),
    /// String literal with escapes resolved.
    String(String),
    /// `true` or `false`
    Boolean(bool),
    /// `null`
    Null,
}

/// `key: value` inside an object literal. Keys are already resolved to
/// text (identifier, string, number or reserved word).
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Property name.
    pub key: String,
    /// Property value.
    pub value: Expression,
}

/// `left operator right`
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    /// Operation applied.
    pub operator: BinaryOperator,
    /// Evaluated first.
    pub left: Box<Expression>,
    /// Evaluated second.
    pub right: Box<Expression>,
}

/// Binary operators, named after their effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    /// `+`, concatenating when either side is a string.
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `%`
    Modulo,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `===`
    StrictEqual,
    /// `!==`
    StrictNotEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessThanEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanEqual,
    /// `instanceof`; walks the class chain of the left operand.
    InstanceOf,
}

/// `left && right` or `left || right`
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalExpression {
    /// `&&` or `||`.
    pub operator: LogicalOperator,
    /// Always evaluated.
    pub left: Box<Expression>,
    /// Evaluated only when `left` does not decide the result.
    pub right: Box<Expression>,
}

/// Short-circuit operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    /// `&&`
    And,
    /// `||`
    Or,
}

/// `operator argument`
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpression {
    /// Prefix operator.
    pub operator: UnaryOperator,
    /// Operand.
    pub argument: Box<Expression>,
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// `-x`
    Minus,
    /// `+x`
    Plus,
    /// `!x`
    LogicalNot,
    /// `typeof x`; tolerates undeclared names.
    Typeof,
    /// `void x`
    Void,
}

/// `target op= value`; `left` is an identifier or member expression.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentExpression {
    /// `=`, `+=` or `-=`.
    pub operator: AssignmentOperator,
    /// Assignment target.
    pub left: Box<Expression>,
    /// New value, or the operand of the compound operator.
    pub right: Box<Expression>,
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOperator {
    /// `=`
    Assign,
    /// `+=`
    AddAssign,
    /// `-=`
    SubtractAssign,
}

/// `++x`, `x++`, `--x`, `x--`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateExpression {
    /// `++` when set, `--` otherwise.
    pub increment: bool,
    /// Prefix forms yield the updated value, postfix the old one.
    pub prefix: bool,
    /// Identifier or member being updated.
    pub argument: Box<Expression>,
}

/// `callee(arguments)`, also used for `new`.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    /// Function or class being invoked.
    pub callee: Box<Expression>,
    /// Argument expressions, evaluated left to right.
    pub arguments: Vec<Expression>,
}

/// Property access.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpression {
    /// Value whose property is read.
    pub object: Box<Expression>,
    /// Which property.
    pub property: MemberProperty,
}

/// The property part of a member access.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberProperty {
    /// `obj.name`
    Identifier(Identifier),
    /// `obj[expr]`
    Computed(Box<Expression>),
}

/// `test ? consequent : alternate`
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalExpression {
    /// Condition, tested for truthiness.
    pub test: Box<Expression>,
    /// Result when `test` is truthy.
    pub consequent: Box<Expression>,
    /// Result otherwise.
    pub alternate: Box<Expression>,
}

/// A function literal. `id` is set for named function expressions and
/// declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionExpression {
    /// Name, if one was written.
    pub id: Option<Identifier>,
    /// Parameter names.
    pub params: Vec<Identifier>,
    /// Body statements, shared by every closure created from this node.
    pub body: Rc<Vec<Statement>>,
}
