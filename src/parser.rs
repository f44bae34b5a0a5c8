use crate::ast::{ASTNode, Expression, Function, Prototype};
use crate::diagnostics::DiagnosticSink;
use crate::lexer::{Lexer, Position, Token};
use crate::precedence::Precedence;

#[derive(Debug, PartialEq, Clone, thiserror::Error)]
pub enum ParserError {
    #[error("{position}: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: Token,
        position: Position,
    },
    #[error("{position}: unknown token {found} when expecting an expression")]
    UnparseablePrimary { found: Token, position: Position },
    #[error("{position}: duplicate parameter `{name}` in prototype `{prototype}`")]
    DuplicateParameter {
        name: String,
        prototype: String,
        position: Position,
    },
}

impl ParserError {
    pub fn position(&self) -> Position {
        match self {
            ParserError::UnexpectedToken { position, .. }
            | ParserError::UnparseablePrimary { position, .. }
            | ParserError::DuplicateParameter { position, .. } => *position,
        }
    }
}

pub type ParseResult<T> = Result<T, ParserError>;

/// Recursive-descent parser for one input stream.
///
/// Keeps one token of lookahead in `current`. Public `parse_*` methods report
/// a failure to the sink once before returning it; the private steps they are
/// built from only propagate.
pub struct Parser<I, S> {
    lexer: Lexer<I>,
    current: Token,
    precedence: Precedence,
    sink: S,
}

impl<I, S> Parser<I, S>
where
    I: Iterator<Item = char>,
    S: DiagnosticSink,
{
    /// Creates the parser and reads the first token.
    pub fn new(input: I, precedence: Precedence, sink: S) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            precedence,
            sink,
        }
    }

    pub fn current(&self) -> &Token {
        &self.current
    }

    /// Where the current token starts.
    pub fn position(&self) -> Position {
        self.lexer.position()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn next_token(&mut self) -> &Token {
        self.current = self.lexer.next_token();
        &self.current
    }

    /// Discards the current token so parsing can resume after a failure.
    pub fn recover(&mut self) {
        log::debug!("skipping {} at {}", self.current, self.position());
        self.next_token();
    }

    /// Returns the next top-level form, or `None` once the input is exhausted.
    /// Stray `;` between forms are skipped.
    pub fn next_item(&mut self) -> Option<ParseResult<ASTNode>> {
        loop {
            let item = match self.current {
                Token::Eof => return None,
                Token::Char(';') => {
                    self.next_token();
                    continue;
                }
                Token::Def => self.parse_definition().map(ASTNode::Function),
                Token::Extern => self.parse_extern().map(ASTNode::Extern),
                _ => self.parse_top_level_expr().map(ASTNode::Function),
            };
            return Some(item);
        }
    }

    pub fn parse_definition(&mut self) -> ParseResult<Function> {
        self.reported(Self::definition)
    }

    pub fn parse_extern(&mut self) -> ParseResult<Prototype> {
        self.reported(Self::external)
    }

    pub fn parse_top_level_expr(&mut self) -> ParseResult<Function> {
        self.reported(Self::top_level_expr)
    }

    pub fn parse_prototype(&mut self) -> ParseResult<Prototype> {
        self.reported(Self::prototype)
    }

    pub fn parse_expression(&mut self) -> ParseResult<Expression> {
        self.reported(Self::expression)
    }

    fn reported<T>(&mut self, parse: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        let result = parse(self);
        if let Err(err) = &result {
            self.sink.report(err);
        }
        result
    }

    fn unexpected<T>(&self, expected: &'static str) -> ParseResult<T> {
        Err(ParserError::UnexpectedToken {
            expected,
            found: self.current.clone(),
            position: self.position(),
        })
    }

    fn expect_char(&mut self, c: char, expected: &'static str) -> ParseResult<()> {
        if !self.current.is_char(c) {
            return self.unexpected(expected);
        }
        self.next_token();
        Ok(())
    }

    /// Precedence of the current token, `-1` if it is not a binary operator.
    fn token_precedence(&self) -> i32 {
        match self.current {
            Token::Char(op) => self.precedence.get(op).unwrap_or(-1),
            _ => -1,
        }
    }

    // definition ::= 'def' prototype expression
    fn definition(&mut self) -> ParseResult<Function> {
        if self.current != Token::Def {
            return self.unexpected("'def'");
        }
        self.next_token();

        let prototype = self.prototype()?;
        let body = self.expression()?;
        Ok(Function { prototype, body })
    }

    // external ::= 'extern' prototype
    fn external(&mut self) -> ParseResult<Prototype> {
        if self.current != Token::Extern {
            return self.unexpected("'extern'");
        }
        self.next_token();

        self.prototype()
    }

    fn top_level_expr(&mut self) -> ParseResult<Function> {
        let body = self.expression()?;
        Ok(Function {
            prototype: Prototype::anonymous(),
            body,
        })
    }

    // prototype ::= identifier '(' identifier* ')'
    fn prototype(&mut self) -> ParseResult<Prototype> {
        let name = match &self.current {
            Token::Ident(name) => name.clone(),
            _ => return self.unexpected("function name in prototype"),
        };
        self.next_token();

        if !self.current.is_char('(') {
            return self.unexpected("'(' in prototype");
        }

        let mut args: Vec<String> = Vec::new();
        loop {
            let arg = match self.next_token() {
                Token::Ident(arg) => arg.clone(),
                _ => break,
            };
            if args.contains(&arg) {
                return Err(ParserError::DuplicateParameter {
                    name: arg,
                    prototype: name,
                    position: self.position(),
                });
            }
            args.push(arg);
        }

        self.expect_char(')', "')' in prototype")?;
        Ok(Prototype::new(name, args))
    }

    // expression ::= primary binop_rhs
    fn expression(&mut self) -> ParseResult<Expression> {
        let lhs = self.primary()?;
        self.binop_rhs(0, lhs)
    }

    fn primary(&mut self) -> ParseResult<Expression> {
        match self.current {
            Token::Ident(_) => self.identifier_expr(),
            Token::Number(value) => {
                self.next_token();
                Ok(Expression::Literal(value))
            }
            Token::Char('(') => self.paren_expr(),
            _ => Err(ParserError::UnparseablePrimary {
                found: self.current.clone(),
                position: self.position(),
            }),
        }
    }

    // identifier
    // identifier '(' (expression (',' expression)*)? ')'
    fn identifier_expr(&mut self) -> ParseResult<Expression> {
        let name = match &self.current {
            Token::Ident(name) => name.clone(),
            _ => return self.unexpected("identifier"),
        };
        self.next_token();

        if !self.current.is_char('(') {
            return Ok(Expression::Variable(name));
        }
        self.next_token();

        let mut args = Vec::new();
        if !self.current.is_char(')') {
            loop {
                if self.current == Token::Eof {
                    return self.unexpected("')' to close argument list");
                }
                args.push(self.expression()?);

                if self.current.is_char(')') {
                    break;
                }
                if !self.current.is_char(',') {
                    return self.unexpected("')' or ',' in argument list");
                }
                self.next_token();
            }
        }
        self.next_token();

        Ok(Expression::Call(name, args))
    }

    // '(' expression ')'
    fn paren_expr(&mut self) -> ParseResult<Expression> {
        self.next_token();
        let expr = self.expression()?;
        self.expect_char(')', "')'")?;
        Ok(expr)
    }

    /// Precedence climbing over `(binop primary)*`.
    ///
    /// Folds operators binding at least as tightly as `min_precedence` into
    /// `lhs`. An operator of equal precedence folds left; a tighter one after
    /// the right operand takes that operand first through a recursive call.
    fn binop_rhs(&mut self, min_precedence: i32, mut lhs: Expression) -> ParseResult<Expression> {
        loop {
            let precedence = self.token_precedence();
            let op = match self.current {
                Token::Char(op) if precedence >= min_precedence => op,
                _ => return Ok(lhs),
            };
            self.next_token();

            let mut rhs = self.primary()?;

            if precedence < self.token_precedence() {
                rhs = self.binop_rhs(precedence + 1, rhs)?;
            }

            lhs = Expression::binary(op, lhs, rhs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parser(input: &str) -> Parser<std::str::Chars<'_>, Vec<ParserError>> {
        Parser::new(input.chars(), Precedence::default(), Vec::new())
    }

    fn num(value: f64) -> Expression {
        Expression::Literal(value)
    }

    fn var(name: &str) -> Expression {
        Expression::variable(name)
    }

    fn parse_expr(input: &str) -> Expression {
        parser(input).parse_expression().unwrap()
    }

    #[test]
    fn tighter_operator_on_the_right() {
        assert_eq!(
            parse_expr("1+2*3"),
            Expression::binary('+', num(1.0), Expression::binary('*', num(2.0), num(3.0)))
        );
    }

    #[test]
    fn tighter_operator_on_the_left() {
        assert_eq!(
            parse_expr("1*2+3"),
            Expression::binary('+', Expression::binary('*', num(1.0), num(2.0)), num(3.0))
        );
    }

    #[test]
    fn equal_precedence_is_left_associative() {
        assert_eq!(
            parse_expr("1+2+3"),
            Expression::binary('+', Expression::binary('+', num(1.0), num(2.0)), num(3.0))
        );
        assert_eq!(
            parse_expr("a-b+c").to_string(),
            "(+ (- a b) c)"
        );
    }

    #[test]
    fn mixed_levels() {
        assert_eq!(parse_expr("a+b*c-d").to_string(), "(- (+ a (* b c)) d)");
        assert_eq!(parse_expr("a < b + 1").to_string(), "(< a (+ b 1))");
        assert_eq!(parse_expr("a*b < c*d").to_string(), "(< (* a b) (* c d))");
    }

    #[test]
    fn parse_expr_works() {
        let target = Expression::binary(
            '+',
            var("x"),
            Expression::binary(
                '*',
                num(1.0),
                Expression::binary('-', num(2.0), num(3.0)),
            ),
        );
        assert_eq!(parse_expr("x + 1 * (2 - 3)"), target);
    }

    #[test]
    fn calls() {
        assert_eq!(
            parse_expr("foo(1, 2+3)"),
            Expression::call(
                "foo",
                vec![num(1.0), Expression::binary('+', num(2.0), num(3.0))]
            )
        );
        assert_eq!(parse_expr("now()"), Expression::call("now", vec![]));
        assert_eq!(parse_expr("f(g(x), y)").to_string(), "(f (g x) y)");
    }

    #[test]
    fn unterminated_call_fails_once() {
        let mut p = parser("foo(");
        let err = p.parse_expression().unwrap_err();
        assert!(matches!(
            err,
            ParserError::UnexpectedToken {
                found: Token::Eof,
                ..
            }
        ));
        assert_eq!(p.into_sink(), vec![err]);
    }

    #[test]
    fn bad_argument_separator() {
        let mut p = parser("foo(1 2)");
        let err = p.parse_expression().unwrap_err();
        assert_eq!(
            err.to_string(),
            "1:7: expected ')' or ',' in argument list, found number 2"
        );
    }

    #[test]
    fn missing_close_paren() {
        let err = parser("(1+2").parse_expression().unwrap_err();
        assert_eq!(
            err,
            ParserError::UnexpectedToken {
                expected: "')'",
                found: Token::Eof,
                position: Position { line: 1, column: 5 },
            }
        );
    }

    #[test]
    fn unparseable_primary() {
        let mut p = parser(")");
        let err = p.parse_expression().unwrap_err();
        assert_eq!(
            err,
            ParserError::UnparseablePrimary {
                found: Token::Char(')'),
                position: Position { line: 1, column: 1 },
            }
        );
        assert_eq!(p.sink().len(), 1);
    }

    #[test]
    fn nested_failure_reported_once() {
        let mut p = parser("def f(x) (1 + ");
        assert!(p.parse_definition().is_err());
        assert_eq!(p.sink().len(), 1);
    }

    #[test]
    fn unknown_operator_ends_expression() {
        let mut p = parser("1 / 2");
        assert_eq!(p.parse_expression(), Ok(num(1.0)));
        assert_eq!(p.current(), &Token::Char('/'));
    }

    #[test]
    fn injected_precedence() {
        let table = Precedence::default().with('/', 40).with('^', 60);
        let mut p = Parser::new("1 + 8 / 2 ^ 3".chars(), table, Vec::new());
        assert_eq!(
            p.parse_expression().unwrap().to_string(),
            "(+ 1 (/ 8 (^ 2 3)))"
        );

        let mut p = Parser::new("1 + 2".chars(), Precedence::empty(), Vec::new());
        assert_eq!(p.parse_expression(), Ok(num(1.0)));
    }

    #[test]
    fn bare_expression_is_anonymous_function() {
        let func = parser("x * 2").parse_top_level_expr().unwrap();
        assert!(func.is_anonymous());
        assert_eq!(func.prototype, Prototype::anonymous());
        assert_eq!(func.body, Expression::binary('*', var("x"), num(2.0)));
    }

    #[test]
    fn definition() {
        let func = parser("def foo(x y) x+y").parse_definition().unwrap();
        assert_eq!(
            func,
            Function {
                prototype: Prototype::new("foo", vec!["x".to_string(), "y".to_string()]),
                body: Expression::binary('+', var("x"), var("y")),
            }
        );
    }

    #[test]
    fn external() {
        let proto = parser("extern sin(a)").parse_extern().unwrap();
        assert_eq!(proto, Prototype::new("sin", vec!["a".to_string()]));
        let proto = parser("extern rand()").parse_extern().unwrap();
        assert!(proto.params().is_empty());
    }

    #[test]
    fn prototype_errors() {
        let expected = |input: &str| match parser(input).next_item() {
            Some(Err(ParserError::UnexpectedToken { expected, .. })) => expected,
            other => panic!("unexpected result {:?}", other),
        };
        assert_eq!(expected("def 1(x) x"), "function name in prototype");
        assert_eq!(expected("extern foo x"), "'(' in prototype");
        assert_eq!(expected("extern foo(x, y)"), "')' in prototype");
    }

    #[test]
    fn duplicate_parameters_rejected() {
        let err = parser("def f(x y x) x").parse_definition().unwrap_err();
        assert_eq!(
            err,
            ParserError::DuplicateParameter {
                name: "x".to_string(),
                prototype: "f".to_string(),
                position: Position { line: 1, column: 11 },
            }
        );
    }

    #[test]
    fn wrong_entry_point() {
        let err = parser("extern f()").parse_definition().unwrap_err();
        assert_eq!(err.position(), Position { line: 1, column: 1 });
        assert!(matches!(
            err,
            ParserError::UnexpectedToken {
                expected: "'def'",
                ..
            }
        ));
    }

    #[test]
    fn items_in_sequence() {
        let mut p = parser("extern sin(a); ;def f(x) sin(x) * x; f(2);");
        let items: Vec<ASTNode> = std::iter::from_fn(|| p.next_item())
            .map(Result::unwrap)
            .collect();
        assert_eq!(
            items.iter().map(ToString::to_string).collect::<Vec<_>>(),
            ["extern sin(a)", "def f(x) (* (sin x) x)", "def () (f 2)"]
        );
        assert!(p.next_item().is_none());
        assert!(p.sink().is_empty());
    }
}
