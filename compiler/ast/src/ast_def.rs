use ty::{Constant, FuncType, Type};

/// Defines AST datatypes

#[derive(Debug, PartialEq)]
pub struct TranslationUnit {
    pub decls: Vec<Decl>,
}

#[derive(Debug, PartialEq)]
pub enum Decl {
    FuncDecl(FuncDecl),
    VarDecl(VarDecl),
}

#[derive(Debug, PartialEq)]
pub struct FuncDecl {
    pub ident: String,
    pub params: Vec<String>,
    pub func_type: FuncType,
    pub body: Block,
}

#[derive(Debug, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub init: Option<Expr>,
    pub var_type: Type,
    pub is_static: bool,
}

#[derive(Debug, PartialEq)]
pub struct Block {
    pub items: Vec<BlockItem>,
}

#[derive(Debug, PartialEq)]
pub enum BlockItem {
    S(Stmt),
    D(VarDecl),
}

#[derive(Debug, PartialEq)]
pub enum Stmt {
    Return {
        expr: Expr,
    },
    Expression {
        expr: Expr,
    },
    If {
        condition: Expr,
        then: Box<Stmt>,
        otherwise: Option<Box<Stmt>>,
    },
    Compound {
        block: Block,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        condition: Expr,
    },
    For {
        init: ForInit,
        condition: Option<Expr>,
        post: Option<Expr>,
        body: Box<Stmt>,
    },
    Break,
    Continue,
    Null,
}

#[derive(Debug, PartialEq)]
pub enum ForInit {
    Decl(VarDecl),
    Expr(Option<Expr>),
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expr {
    Constant(Constant),
    Var(String),
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assignment {
        lvalue: Box<Expr>,
        expr: Box<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    FunctionCall {
        func: String,
        args: Vec<Expr>,
    },
    PostfixInc(Box<Expr>),
    PostfixDec(Box<Expr>),
}

impl Expr {
    /// Only variables can be assigned through today
    pub fn is_lvalue(&self) -> bool {
        matches!(self, Expr::Var(_))
    }
}

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum UnaryOp {
    Complement,
    Negate,
    Not,
}

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,

    // Logical and Relational Operators
    And,
    Or,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    // Bitwise Operators
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    BitshiftLeft,
    BitshiftRight,
}
