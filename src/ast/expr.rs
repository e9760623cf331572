use crate::ast::Value;
use crate::metadata::EntityType;

/// A member access on a mapped entity (`x.field`).
#[derive(Debug, Clone, PartialEq)]
pub struct MemberRef {
    pub entity: EntityType,
    pub member: String,
}

/// Typed expression tree handed to the resolvers.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Member access: `x.age`
    Member(MemberRef),
    /// Constant; always bound as a parameter
    Constant(Value),
    /// Comparison or arithmetic: `left op right`
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    /// Conjunction / disjunction
    Logical {
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
    },
    /// NOT (expr)
    Not(Box<Expr>),
    /// expr IS [NOT] NULL
    IsNull { expr: Box<Expr>, negated: bool },
    /// expr [NOT] IN (v1, v2, ...)
    InList {
        expr: Box<Expr>,
        list: Vec<Value>,
        negated: bool,
    },
    /// expr [NOT] LIKE pattern, `%` placed by kind
    Like {
        expr: Box<Expr>,
        pattern: String,
        kind: LikeKind,
        negated: bool,
    },
    /// expr BETWEEN low AND high
    Between {
        expr: Box<Expr>,
        low: Value,
        high: Value,
    },
    /// Aggregate call; `arg == None` only for COUNT(1)
    Aggregate {
        func: AggregateFunc,
        arg: Option<Box<Expr>>,
    },
    /// Member-init: `x => new T { a = ..., b = ... }`
    MemberInit {
        entity: EntityType,
        bindings: Vec<(String, Expr)>,
    },
    /// Lambda wrapper carrying the parameter types
    Lambda {
        params: Vec<EntityType>,
        body: Box<Expr>,
    },
}

impl Expr {
    /// Node kind name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Expr::Member(_) => "member-access",
            Expr::Constant(_) => "constant",
            Expr::Binary { .. } => "binary",
            Expr::Logical { .. } => "logical",
            Expr::Not(_) => "not",
            Expr::IsNull { .. } => "null-test",
            Expr::InList { .. } => "in-list",
            Expr::Like { .. } => "like",
            Expr::Between { .. } => "between",
            Expr::Aggregate { .. } => "aggregate",
            Expr::MemberInit { .. } => "member-init",
            Expr::Lambda { .. } => "lambda",
        }
    }

    /// Strip any lambda wrappers and return the body.
    pub fn body(&self) -> &Expr {
        match self {
            Expr::Lambda { body, .. } => body.body(),
            other => other,
        }
    }

    /// The member this expression reads, if it is a plain member access.
    pub fn as_member(&self) -> Option<&MemberRef> {
        match self.body() {
            Expr::Member(m) => Some(m),
            _ => None,
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Gt | BinaryOp::Gte | BinaryOp::Lt | BinaryOp::Lte
        )
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

/// Logical operator between predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogicalOp {
    #[default]
    And,
    Or,
}

impl LogicalOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
        }
    }
}

/// Where the wildcard goes in a LIKE pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeKind {
    /// %pattern%
    Contains,
    /// pattern%
    StartsWith,
    /// %pattern
    EndsWith,
}

impl LikeKind {
    pub fn wrap(&self, pattern: &str) -> String {
        match self {
            LikeKind::Contains => format!("%{}%", pattern),
            LikeKind::StartsWith => format!("{}%", pattern),
            LikeKind::EndsWith => format!("%{}", pattern),
        }
    }
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunc {
    Count,
    Sum,
    Min,
    Max,
    Avg,
}

impl AggregateFunc {
    pub fn as_sql(&self) -> &'static str {
        match self {
            AggregateFunc::Count => "COUNT",
            AggregateFunc::Sum => "SUM",
            AggregateFunc::Min => "MIN",
            AggregateFunc::Max => "MAX",
            AggregateFunc::Avg => "AVG",
        }
    }
}

/// Sort order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// One ORDER BY item.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub expr: Expr,
    pub order: SortOrder,
}
