use crate::language::syntax::SyntaxRule;
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Int(i64),
    Str(String),
    Bool(bool),
    Nothing,
    Name(String),
    Sequence(Vec<Expr>),
    Define {
        name: String,
        value: Box<Expr>,
        mutable: bool,
    },
    Assign {
        name: String,
        value: Box<Expr>,
    },
    If {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Option<Box<Expr>>,
    },
    /// Fields in source order; positional entries are already named `_0`, `_1`, ...
    Record(Vec<(String, Expr)>),
    Call {
        method: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Class(ClassDef),
    Method(MethodDef),
    Function(FunctionDef),
    Import(String),
    Quote(Rc<Expr>),
    DefSyntax(SyntaxRule),
    Try {
        body: Box<Expr>,
        catches: Vec<CatchClause>,
    },
}

impl Expr {
    pub fn call(method: impl Into<String>, left: Expr, right: Expr) -> Self {
        Expr::Call {
            method: method.into(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub parents: Vec<String>,
    pub fields: Vec<FieldDecl>,
    pub doc: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub mutable: bool,
    pub initializer: Option<Rc<Expr>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MethodDef {
    pub name: String,
    pub left: PatternExpr,
    pub right: PatternExpr,
    pub body: Rc<Expr>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDef {
    pub pattern: PatternExpr,
    pub body: Rc<Expr>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CatchClause {
    pub class: String,
    pub binding: Option<String>,
    pub body: Expr,
}

/// Unresolved pattern as written; class names and value expressions are
/// resolved in the defining scope when the method or function is created.
#[derive(Clone, Debug, PartialEq)]
pub enum PatternExpr {
    Wildcard,
    Bind {
        name: String,
        inner: Box<PatternExpr>,
    },
    Is(String),
    Equals(Box<Expr>),
    Record(Vec<(String, PatternExpr)>),
}

impl PatternExpr {
    pub fn bind(name: impl Into<String>, inner: PatternExpr) -> Self {
        PatternExpr::Bind {
            name: name.into(),
            inner: Box::new(inner),
        }
    }
}
