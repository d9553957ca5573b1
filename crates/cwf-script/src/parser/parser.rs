//! The main parser implementation.

use crate::Error;
use crate::ast::*;
use crate::lexer::{Scanner, Token, TokenKind};
use std::rc::Rc;

/// A recursive descent parser for module script.
///
/// Statement terminators are optional: a `;` after a statement is consumed
/// when present and never required.
pub struct Parser<'a> {
    scanner: Scanner<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given source code.
    pub fn new(source: &'a str) -> Self {
        let mut scanner = Scanner::new(source);
        let current = scanner.next_token();
        Self { scanner, current }
    }

    /// Parses the source code into a Program AST node.
    pub fn parse_program(&mut self) -> Result<Program, Error> {
        let mut body = Vec::new();

        while !self.is_at_end() {
            body.push(self.parse_statement()?);
        }

        Ok(Program { body })
    }

    /// Parses the whole input as exactly one expression.
    ///
    /// A trailing `;` is tolerated; anything after it is an error.
    pub fn parse_standalone_expression(&mut self) -> Result<Expression, Error> {
        let expr = self.parse_expression()?;
        self.eat(&TokenKind::Semicolon);
        if !self.is_at_end() {
            return Err(self.unexpected());
        }
        Ok(expr)
    }

    /// Parses a single statement.
    pub fn parse_statement(&mut self) -> Result<Statement, Error> {
        match &self.current.kind {
            TokenKind::Var | TokenKind::Let | TokenKind::Const => self.parse_variable_declaration(),
            TokenKind::Function => self.parse_function_declaration(),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Break => {
                self.advance();
                self.eat(&TokenKind::Semicolon);
                Ok(Statement::Break)
            }
            TokenKind::Continue => {
                self.advance();
                self.eat(&TokenKind::Semicolon);
                Ok(Statement::Continue)
            }
            TokenKind::Throw => {
                self.advance();
                let argument = self.parse_expression()?;
                self.eat(&TokenKind::Semicolon);
                Ok(Statement::Throw(argument))
            }
            TokenKind::Try => self.parse_try_statement(),
            TokenKind::LeftBrace => Ok(Statement::Block(self.parse_block()?)),
            TokenKind::Semicolon => {
                self.advance();
                Ok(Statement::Empty)
            }
            _ => {
                let expr = self.parse_expression()?;
                self.eat(&TokenKind::Semicolon);
                Ok(Statement::Expression(expr))
            }
        }
    }

    fn parse_variable_declaration(&mut self) -> Result<Statement, Error> {
        let declaration = self.parse_variable_declaration_list()?;
        self.eat(&TokenKind::Semicolon);
        Ok(declaration)
    }

    fn parse_variable_declaration_list(&mut self) -> Result<Statement, Error> {
        let kind = match &self.current.kind {
            TokenKind::Var => VariableKind::Var,
            TokenKind::Let => VariableKind::Let,
            TokenKind::Const => VariableKind::Const,
            _ => return Err(self.error("Expected variable keyword")),
        };
        self.advance();

        let mut declarations = Vec::new();
        loop {
            let id = self.expect_identifier()?;
            let init = if self.eat(&TokenKind::Equal) {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            declarations.push(VariableDeclarator { id, init });

            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }

        Ok(Statement::VariableDeclaration(VariableDeclaration {
            kind,
            declarations,
        }))
    }

    fn parse_function_declaration(&mut self) -> Result<Statement, Error> {
        self.advance(); // consume 'function'
        let id = self.expect_identifier()?;
        let function = self.parse_function_rest(Some(id.clone()))?;
        Ok(Statement::FunctionDeclaration(FunctionDeclaration { id, function }))
    }

    /// Parses `(params) { body }` after the `function` keyword and name.
    fn parse_function_rest(&mut self, id: Option<Identifier>) -> Result<FunctionExpression, Error> {
        self.expect(&TokenKind::LeftParen)?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                params.push(self.expect_identifier()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RightParen)?;
        let body = self.parse_block()?;
        Ok(FunctionExpression {
            id,
            params,
            body: Rc::new(body),
        })
    }

    fn parse_block(&mut self) -> Result<Vec<Statement>, Error> {
        self.expect(&TokenKind::LeftBrace)?;
        let mut body = Vec::new();
        while !self.check(&TokenKind::RightBrace) {
            if self.is_at_end() {
                return Err(self.error("Unterminated block"));
            }
            body.push(self.parse_statement()?);
        }
        self.expect(&TokenKind::RightBrace)?;
        Ok(body)
    }

    fn parse_if_statement(&mut self) -> Result<Statement, Error> {
        self.advance(); // consume 'if'
        self.expect(&TokenKind::LeftParen)?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RightParen)?;
        let consequent = Box::new(self.parse_statement()?);
        let alternate = if self.eat(&TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Statement::If(IfStatement {
            test,
            consequent,
            alternate,
        }))
    }

    fn parse_while_statement(&mut self) -> Result<Statement, Error> {
        self.advance(); // consume 'while'
        self.expect(&TokenKind::LeftParen)?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RightParen)?;
        let body = Box::new(self.parse_statement()?);
        Ok(Statement::While(WhileStatement { test, body }))
    }

    fn parse_for_statement(&mut self) -> Result<Statement, Error> {
        self.advance(); // consume 'for'
        self.expect(&TokenKind::LeftParen)?;

        let init = match &self.current.kind {
            TokenKind::Semicolon => None,
            TokenKind::Var | TokenKind::Let | TokenKind::Const => {
                Some(Box::new(self.parse_variable_declaration_list()?))
            }
            _ => Some(Box::new(Statement::Expression(self.parse_expression()?))),
        };
        self.expect(&TokenKind::Semicolon)?;

        let test = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::Semicolon)?;

        let update = if self.check(&TokenKind::RightParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::RightParen)?;

        let body = Box::new(self.parse_statement()?);
        Ok(Statement::For(ForStatement {
            init,
            test,
            update,
            body,
        }))
    }

    fn parse_return_statement(&mut self) -> Result<Statement, Error> {
        self.advance(); // consume 'return'
        let argument = if self.check(&TokenKind::Semicolon)
            || self.check(&TokenKind::RightBrace)
            || self.is_at_end()
        {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.eat(&TokenKind::Semicolon);
        Ok(Statement::Return(argument))
    }

    fn parse_try_statement(&mut self) -> Result<Statement, Error> {
        self.advance(); // consume 'try'
        let block = self.parse_block()?;

        let handler = if self.eat(&TokenKind::Catch) {
            let param = if self.eat(&TokenKind::LeftParen) {
                let id = self.expect_identifier()?;
                self.expect(&TokenKind::RightParen)?;
                Some(id)
            } else {
                None
            };
            let body = self.parse_block()?;
            Some(CatchClause { param, body })
        } else {
            None
        };

        let finalizer = if self.eat(&TokenKind::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(self.error("Missing catch or finally after try"));
        }

        Ok(Statement::Try(TryStatement {
            block,
            handler,
            finalizer,
        }))
    }

    // ==================== Expressions ====================

    /// Parses an expression.
    pub fn parse_expression(&mut self) -> Result<Expression, Error> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expression, Error> {
        let left = self.parse_conditional()?;

        let operator = match &self.current.kind {
            TokenKind::Equal => AssignmentOperator::Assign,
            TokenKind::PlusEqual => AssignmentOperator::AddAssign,
            TokenKind::MinusEqual => AssignmentOperator::SubtractAssign,
            _ => return Ok(left),
        };

        if !matches!(left, Expression::Identifier(_) | Expression::Member(_)) {
            return Err(self.error("Invalid assignment target"));
        }
        self.advance();
        let right = self.parse_assignment()?;

        Ok(Expression::Assignment(AssignmentExpression {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }))
    }

    fn parse_conditional(&mut self) -> Result<Expression, Error> {
        let test = self.parse_logical_or()?;

        if !self.eat(&TokenKind::Question) {
            return Ok(test);
        }
        let consequent = self.parse_assignment()?;
        self.expect(&TokenKind::Colon)?;
        let alternate = self.parse_assignment()?;

        Ok(Expression::Conditional(ConditionalExpression {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        }))
    }

    fn parse_logical_or(&mut self) -> Result<Expression, Error> {
        let mut left = self.parse_logical_and()?;
        while self.eat(&TokenKind::PipePipe) {
            let right = self.parse_logical_and()?;
            left = Expression::Logical(LogicalExpression {
                operator: LogicalOperator::Or,
                left: Box::new(left),
                right: Box::new(right),
            });
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<Expression, Error> {
        let mut left = self.parse_equality()?;
        while self.eat(&TokenKind::AmpersandAmpersand) {
            let right = self.parse_equality()?;
            left = Expression::Logical(LogicalExpression {
                operator: LogicalOperator::And,
                left: Box::new(left),
                right: Box::new(right),
            });
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expression, Error> {
        let mut left = self.parse_comparison()?;
        loop {
            let operator = match &self.current.kind {
                TokenKind::EqualEqual => BinaryOperator::Equal,
                TokenKind::NotEqual => BinaryOperator::NotEqual,
                TokenKind::StrictEqual => BinaryOperator::StrictEqual,
                TokenKind::StrictNotEqual => BinaryOperator::StrictNotEqual,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_comparison()?;
            left = binary(operator, left, right);
        }
    }

    fn parse_comparison(&mut self) -> Result<Expression, Error> {
        let mut left = self.parse_additive()?;
        loop {
            let operator = match &self.current.kind {
                TokenKind::LessThan => BinaryOperator::LessThan,
                TokenKind::LessThanEqual => BinaryOperator::LessThanEqual,
                TokenKind::GreaterThan => BinaryOperator::GreaterThan,
                TokenKind::GreaterThanEqual => BinaryOperator::GreaterThanEqual,
                TokenKind::Instanceof => BinaryOperator::InstanceOf,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_additive()?;
            left = binary(operator, left, right);
        }
    }

    fn parse_additive(&mut self) -> Result<Expression, Error> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let operator = match &self.current.kind {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Subtract,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(operator, left, right);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expression, Error> {
        let mut left = self.parse_unary()?;
        loop {
            let operator = match &self.current.kind {
                TokenKind::Star => BinaryOperator::Multiply,
                TokenKind::Slash => BinaryOperator::Divide,
                TokenKind::Percent => BinaryOperator::Modulo,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(operator, left, right);
        }
    }

    fn parse_unary(&mut self) -> Result<Expression, Error> {
        let operator = match &self.current.kind {
            TokenKind::Minus => UnaryOperator::Minus,
            TokenKind::Plus => UnaryOperator::Plus,
            TokenKind::Bang => UnaryOperator::LogicalNot,
            TokenKind::Typeof => UnaryOperator::Typeof,
            TokenKind::Void => UnaryOperator::Void,
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let increment = self.check(&TokenKind::PlusPlus);
                self.advance();
                let argument = self.parse_unary()?;
                return self.update(increment, true, argument);
            }
            _ => return self.parse_postfix(),
        };
        self.advance();
        let argument = self.parse_unary()?;
        Ok(Expression::Unary(UnaryExpression {
            operator,
            argument: Box::new(argument),
        }))
    }

    fn parse_postfix(&mut self) -> Result<Expression, Error> {
        let expr = self.parse_call()?;
        match &self.current.kind {
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let increment = self.check(&TokenKind::PlusPlus);
                self.advance();
                self.update(increment, false, expr)
            }
            _ => Ok(expr),
        }
    }

    fn update(&self, increment: bool, prefix: bool, argument: Expression) -> Result<Expression, Error> {
        if !matches!(argument, Expression::Identifier(_) | Expression::Member(_)) {
            return Err(self.error("Invalid update target"));
        }
        Ok(Expression::Update(UpdateExpression {
            increment,
            prefix,
            argument: Box::new(argument),
        }))
    }

    fn parse_call(&mut self) -> Result<Expression, Error> {
        let mut expr = if self.check(&TokenKind::New) {
            self.parse_new_expression()?
        } else {
            self.parse_primary()?
        };

        loop {
            match &self.current.kind {
                TokenKind::LeftParen => {
                    let arguments = self.parse_arguments()?;
                    expr = Expression::Call(CallExpression {
                        callee: Box::new(expr),
                        arguments,
                    });
                }
                TokenKind::Dot | TokenKind::LeftBracket => {
                    expr = self.parse_member_suffix(expr)?;
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_new_expression(&mut self) -> Result<Expression, Error> {
        self.advance(); // consume 'new'
        let mut callee = if self.check(&TokenKind::New) {
            self.parse_new_expression()?
        } else {
            self.parse_primary()?
        };
        while matches!(self.current.kind, TokenKind::Dot | TokenKind::LeftBracket) {
            callee = self.parse_member_suffix(callee)?;
        }
        let arguments = if self.check(&TokenKind::LeftParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        Ok(Expression::New(CallExpression {
            callee: Box::new(callee),
            arguments,
        }))
    }

    fn parse_member_suffix(&mut self, object: Expression) -> Result<Expression, Error> {
        let property = if self.eat(&TokenKind::Dot) {
            MemberProperty::Identifier(self.expect_property_name()?)
        } else {
            self.expect(&TokenKind::LeftBracket)?;
            let property = self.parse_expression()?;
            self.expect(&TokenKind::RightBracket)?;
            MemberProperty::Computed(Box::new(property))
        };
        Ok(Expression::Member(MemberExpression {
            object: Box::new(object),
            property,
        }))
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expression>, Error> {
        self.expect(&TokenKind::LeftParen)?;
        let mut arguments = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                arguments.push(self.parse_assignment()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RightParen)?;
        Ok(arguments)
    }

    fn parse_primary(&mut self) -> Result<Expression, Error> {
        let expr = match self.current.kind.clone() {
            TokenKind::Number(n) => Expression::Literal(Literal::Number(n)),
            TokenKind::String(s) => Expression::Literal(Literal::String(s)),
            TokenKind::True => Expression::Literal(Literal::Boolean(true)),
            TokenKind::False => Expression::Literal(Literal::Boolean(false)),
            TokenKind::Null => Expression::Literal(Literal::Null),
            TokenKind::Identifier(name) => Expression::Identifier(Identifier::new(name)),
            TokenKind::This => Expression::This,
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::RightParen)?;
                return Ok(expr);
            }
            TokenKind::LeftBracket => return self.parse_array_literal(),
            TokenKind::LeftBrace => return self.parse_object_literal(),
            TokenKind::Function => {
                self.advance();
                let id = match &self.current.kind {
                    TokenKind::Identifier(_) => Some(self.expect_identifier()?),
                    _ => None,
                };
                return Ok(Expression::Function(self.parse_function_rest(id)?));
            }
            _ => return Err(self.unexpected()),
        };
        self.advance();
        Ok(expr)
    }

    fn parse_array_literal(&mut self) -> Result<Expression, Error> {
        self.expect(&TokenKind::LeftBracket)?;
        let mut elements = Vec::new();
        while !self.check(&TokenKind::RightBracket) {
            elements.push(self.parse_assignment()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightBracket)?;
        Ok(Expression::Array(elements))
    }

    fn parse_object_literal(&mut self) -> Result<Expression, Error> {
        self.expect(&TokenKind::LeftBrace)?;
        let mut properties = Vec::new();
        while !self.check(&TokenKind::RightBrace) {
            let key = match self.current.kind.clone() {
                TokenKind::String(s) => {
                    self.advance();
                    s
                }
                TokenKind::Number(n) => {
                    self.advance();
                    crate::runtime::value::format_number(n)
                }
                _ => self.expect_property_name()?.name,
            };
            self.expect(&TokenKind::Colon)?;
            let value = self.parse_assignment()?;
            properties.push(Property { key, value });

            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightBrace)?;
        Ok(Expression::Object(properties))
    }

    // ==================== Helpers ====================

    fn advance(&mut self) {
        self.current = self.scanner.next_token();
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.current.kind == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), Error> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.error(format!(
                "Expected {:?}, found {:?}",
                kind, self.current.kind
            )))
        }
    }

    fn expect_identifier(&mut self) -> Result<Identifier, Error> {
        if let TokenKind::Identifier(name) = &self.current.kind {
            let id = Identifier::new(name.clone());
            self.advance();
            Ok(id)
        } else {
            Err(self.error(format!("Expected identifier, found {:?}", self.current.kind)))
        }
    }

    /// Property names accept keywords as well as identifiers.
    fn expect_property_name(&mut self) -> Result<Identifier, Error> {
        if let Some(text) = self.current.kind.keyword_text() {
            self.advance();
            return Ok(Identifier::new(text));
        }
        self.expect_identifier()
    }

    fn is_at_end(&self) -> bool {
        self.check(&TokenKind::Eof)
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::syntax(message, self.current.span.start)
    }

    fn unexpected(&self) -> Error {
        match &self.current.kind {
            TokenKind::Eof => self.error("Unexpected end of input"),
            TokenKind::Invalid => self.error("Invalid or unexpected token"),
            other => self.error(format!("Unexpected token {:?}", other)),
        }
    }
}

fn binary(operator: BinaryOperator, left: Expression, right: Expression) -> Expression {
    Expression::Binary(BinaryExpression {
        operator,
        left: Box::new(left),
        right: Box::new(right),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Program {
        Parser::new(source)
            .parse_program()
            .unwrap_or_else(|e| panic!("failed to parse {:?}: {}", source, e))
    }

    fn parse_err(source: &str) -> Error {
        Parser::new(source)
            .parse_program()
            .expect_err("expected a syntax error")
    }

    fn parse_stmt(source: &str) -> Statement {
        parse_ok(source).body.remove(0)
    }

    #[test]
    fn test_parse_variable_declarations() {
        parse_ok("var x = 1;");
        parse_ok("let a, b = 2");
        parse_ok("const c = 'x'");
    }

    #[test]
    fn test_semicolons_are_optional() {
        let program = parse_ok("var x = 1\nvar y = 2\nx = y");
        assert_eq!(program.body.len(), 3);
    }

    #[test]
    fn test_parse_function_declaration() {
        let stmt = parse_stmt("function add(a, b) { return a + b }");
        let Statement::FunctionDeclaration(decl) = stmt else {
            panic!("Expected function declaration");
        };
        assert_eq!(decl.id.name, "add");
        assert_eq!(decl.function.params.len(), 2);
    }

    #[test]
    fn test_parse_control_flow() {
        parse_ok("if (a) { b() } else c()");
        parse_ok("while (i < 3) { i++ }");
        parse_ok("for (var i = 0; i < 3; i++) { continue }");
        parse_ok("for (;;) { break }");
        parse_ok("try { a() } catch (e) { b(e) } finally { c() }");
        parse_ok("try { a() } finally { c() }");
    }

    #[test]
    fn test_parse_try_requires_handler() {
        assert!(parse_err("try { a() }").is_syntax());
    }

    #[test]
    fn test_parse_object_literal_keys() {
        let stmt = parse_stmt("x = { a: 1, 'b c': 2, 3: 4, new: 5 }");
        let Statement::Expression(Expression::Assignment(assign)) = stmt else {
            panic!("Expected assignment");
        };
        let Expression::Object(props) = *assign.right else {
            panic!("Expected object literal");
        };
        let keys: Vec<_> = props.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b c", "3", "new"]);
    }

    #[test]
    fn test_parse_keyword_member_names() {
        parse_ok("C.new(); a.if = 1");
    }

    #[test]
    fn test_parse_new_expression() {
        parse_ok("new Foo()");
        parse_ok("new a.b.C(1, 2)");
        parse_ok("new Foo");
    }

    #[test]
    fn test_parse_operator_precedence() {
        let stmt = parse_stmt("1 + 2 * 3;");
        let Statement::Expression(Expression::Binary(bin)) = stmt else {
            panic!("Expected binary expression");
        };
        assert_eq!(bin.operator, BinaryOperator::Add);
    }

    #[test]
    fn test_parse_ternary_and_logical() {
        parse_ok("a ? b : c ? d : e");
        parse_ok("a && b || !c");
        parse_ok("x instanceof C");
    }

    #[test]
    fn test_invalid_assignment_target() {
        assert!(parse_err("1 = 2").is_syntax());
        assert!(parse_err("f()++").is_syntax());
    }

    #[test]
    fn test_unterminated_input() {
        assert!(parse_err("function f() { return 1").is_syntax());
        assert!(parse_err("x = (1 + ").is_syntax());
        assert!(parse_err("'open").is_syntax());
    }

    #[test]
    fn test_standalone_expression() {
        let expr = Parser::new("function () { return 1 };")
            .parse_standalone_expression()
            .expect("expression");
        assert!(matches!(expr, Expression::Function(_)));

        assert!(Parser::new("1 2").parse_standalone_expression().is_err());
        assert!(Parser::new("").parse_standalone_expression().is_err());
    }

    #[test]
    fn test_error_offset_points_at_token() {
        let Error::Syntax { offset, .. } = parse_err("var x = )") else {
            panic!("Expected syntax error");
        };
        assert_eq!(offset, 8);
    }

    #[test]
    fn test_parse_empty_program() {
        assert!(parse_ok("").body.is_empty());
        assert_eq!(parse_ok(";;").body.len(), 2);
    }
}
