//! Abstract syntax tree for SL.
//!
//! Every node carries a `NodeId` so the semantic passes can attach
//! derived attributes (scope, type, l-value flag) in a side table
//! without mutating the tree.

/// Identity of a tree node, assigned by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// Byte range in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Hands out fresh node ids during parsing.
pub struct NodeIdGen {
    next: u32,
}

impl NodeIdGen {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    pub fn next(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }
}

impl Default for NodeIdGen {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct Program {
    pub id: NodeId,
    pub functions: Vec<Function>,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub id: NodeId,
    pub name: String,
    pub name_span: Span,
    pub params: Vec<Param>,
    /// Declared return type; `None` for procedures.
    pub ret: Option<BasicTypeNode>,
    pub decls: Vec<VarDecl>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub id: NodeId,
    pub name: String,
    pub span: Span,
    pub ty: TypeExpr,
}

/// One `var a, b : type` declaration introducing one or more names.
#[derive(Debug, Clone)]
pub struct VarDecl {
    pub id: NodeId,
    pub names: Vec<(String, Span)>,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone)]
pub struct TypeExpr {
    pub id: NodeId,
    pub span: Span,
    pub kind: TypeExprKind,
}

#[derive(Debug, Clone)]
pub enum TypeExprKind {
    Basic(BasicType),
    Array { size: usize, elem: BasicType },
}

#[derive(Debug, Clone)]
pub struct BasicTypeNode {
    pub id: NodeId,
    pub span: Span,
    pub ty: BasicType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicType {
    Int,
    Float,
    Bool,
    Char,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Assign {
        id: NodeId,
        target: LeftExpr,
        assign_span: Span,
        value: Expr,
    },
    If {
        id: NodeId,
        span: Span,
        cond: Expr,
        then_stmts: Vec<Stmt>,
        else_stmts: Option<Vec<Stmt>>,
    },
    While {
        id: NodeId,
        span: Span,
        cond: Expr,
        body: Vec<Stmt>,
    },
    ProcCall {
        id: NodeId,
        span: Span,
        callee: Ident,
        args: Vec<Expr>,
    },
    Read {
        id: NodeId,
        span: Span,
        target: LeftExpr,
    },
    WriteExpr {
        id: NodeId,
        span: Span,
        expr: Expr,
    },
    /// The literal is kept verbatim, surrounding quotes included.
    WriteString {
        id: NodeId,
        span: Span,
        value: String,
    },
    Return {
        id: NodeId,
        span: Span,
        expr: Option<Expr>,
    },
}

/// A name appearing in the tree, decorated independently of its parent.
#[derive(Debug, Clone)]
pub struct Ident {
    pub id: NodeId,
    pub name: String,
    pub span: Span,
}

/// Assignment / read target.
#[derive(Debug, Clone)]
pub enum LeftExpr {
    Ident {
        id: NodeId,
        ident: Ident,
    },
    Index {
        id: NodeId,
        ident: Ident,
        index: Expr,
    },
}

impl LeftExpr {
    pub fn id(&self) -> NodeId {
        match self {
            LeftExpr::Ident { id, .. } => *id,
            LeftExpr::Index { id, .. } => *id,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            LeftExpr::Ident { ident, .. } => ident.span,
            LeftExpr::Index { ident, index, .. } => ident.span.to(index.span()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    Paren {
        id: NodeId,
        inner: Box<Expr>,
    },
    Index {
        id: NodeId,
        ident: Ident,
        index: Box<Expr>,
    },
    Call {
        id: NodeId,
        callee: Ident,
        args: Vec<Expr>,
    },
    Ident {
        id: NodeId,
        ident: Ident,
    },
    Binary {
        id: NodeId,
        op: BinOp,
        op_span: Span,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        id: NodeId,
        op: UnOp,
        op_span: Span,
        operand: Box<Expr>,
    },
    Literal {
        id: NodeId,
        span: Span,
        value: Lit,
    },
}

impl Expr {
    pub fn id(&self) -> NodeId {
        match self {
            Expr::Paren { id, .. } => *id,
            Expr::Index { id, .. } => *id,
            Expr::Call { id, .. } => *id,
            Expr::Ident { id, .. } => *id,
            Expr::Binary { id, .. } => *id,
            Expr::Unary { id, .. } => *id,
            Expr::Literal { id, .. } => *id,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Expr::Paren { inner, .. } => inner.span(),
            Expr::Index { ident, index, .. } => ident.span.to(index.span()),
            Expr::Call { callee, .. } => callee.span,
            Expr::Ident { ident, .. } => ident.span,
            Expr::Binary { lhs, rhs, .. } => lhs.span().to(rhs.span()),
            Expr::Unary { op_span, operand, .. } => op_span.to(operand.span()),
            Expr::Literal { span, .. } => *span,
        }
    }
}

/// Literal values keep their source spelling; the code generator emits
/// the text unchanged (char literals keep the inner text only).
#[derive(Debug, Clone)]
pub enum Lit {
    Int(String),
    Float(String),
    Bool(bool),
    Char(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub fn is_arith(self) -> bool {
        matches!(
            self,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod
        )
    }

    pub fn is_rel(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Neq | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }

    pub fn is_logic(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Neq => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "and",
            BinOp::Or => "or",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Plus,
    Neg,
    Not,
}

impl UnOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnOp::Plus => "+",
            UnOp::Neg => "-",
            UnOp::Not => "not",
        }
    }
}
