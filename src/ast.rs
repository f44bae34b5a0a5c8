use std::fmt;

#[derive(Debug, PartialEq, Clone)]
pub struct Prototype {
    pub name: String,
    pub args: Vec<String>,
}

impl Prototype {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// The nameless, argument-less prototype wrapped around a bare top-level
    /// expression.
    pub fn anonymous() -> Self {
        Self::new("", Vec::new())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.args
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    Literal(f64),
    Variable(String),
    Binary(char, Box<Expression>, Box<Expression>),
    Call(String, Vec<Expression>),
}

impl Expression {
    pub fn binary(op: char, lhs: Expression, rhs: Expression) -> Self {
        Expression::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Expression::Variable(name.into())
    }

    pub fn call(callee: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::Call(callee.into(), args)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Function {
    pub prototype: Prototype,
    pub body: Expression,
}

impl Function {
    pub fn is_anonymous(&self) -> bool {
        self.prototype.is_anonymous()
    }
}

/// One top-level form: `extern` yields a bare prototype, everything else a function.
#[derive(Debug, PartialEq, Clone)]
pub enum ASTNode {
    Extern(Prototype),
    Function(Function),
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(value) => write!(f, "{}", value),
            Expression::Variable(name) => write!(f, "{}", name),
            Expression::Binary(op, lhs, rhs) => write!(f, "({} {} {})", op, lhs, rhs),
            Expression::Call(callee, args) => {
                write!(f, "({}", callee)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.args.join(" "))
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "def {} {}", self.prototype, self.body)
    }
}

impl fmt::Display for ASTNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ASTNode::Extern(proto) => write!(f, "extern {}", proto),
            ASTNode::Function(func) => write!(f, "{}", func),
        }
    }
}
