pub mod builders;
pub mod expr;
pub mod values;

pub use self::builders::{MemberInit, col, count, init, lambda, lit};
pub use self::expr::{
    AggregateFunc, BinaryOp, Expr, LikeKind, LogicalOp, MemberRef, OrderItem, SortOrder,
};
pub use self::values::Value;
