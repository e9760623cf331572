//! Fluent builders for expression trees.
//!
//! These stand in for lambda expressions:
//!
//! ```ignore
//! // x => x.Age > 18 && x.Name.Contains("an")
//! col::<User>("age").gt(18).and(col::<User>("name").contains("an"))
//!
//! // x => new User { Age = x.Age + 1 }
//! init::<User>().set("age", col::<User>("age").add(1))
//! ```

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::ast::*;
use crate::metadata::{Entity, EntityType};

/// Member access on entity `T`.
pub fn col<T: Entity>(member: &str) -> Expr {
    Expr::Member(MemberRef {
        entity: EntityType::of::<T>(),
        member: member.to_string(),
    })
}

/// Constant value, bound as a parameter when rendered.
pub fn lit(value: impl Into<Value>) -> Expr {
    Expr::Constant(value.into())
}

/// COUNT(1)
pub fn count() -> Expr {
    Expr::Aggregate {
        func: AggregateFunc::Count,
        arg: None,
    }
}

/// Wrap a body in a lambda over `T`.
pub fn lambda<T: Entity>(body: Expr) -> Expr {
    Expr::Lambda {
        params: vec![EntityType::of::<T>()],
        body: Box::new(body),
    }
}

/// Start a member-init expression for `T`.
pub fn init<T: Entity>() -> MemberInit {
    MemberInit {
        entity: EntityType::of::<T>(),
        bindings: Vec::new(),
    }
}

/// Builder for `new T { member = expr, ... }`.
#[derive(Debug, Clone)]
pub struct MemberInit {
    entity: EntityType,
    bindings: Vec<(String, Expr)>,
}

impl MemberInit {
    pub fn set(mut self, member: &str, value: impl Into<Expr>) -> Self {
        self.bindings.push((member.to_string(), value.into()));
        self
    }
}

impl From<MemberInit> for Expr {
    fn from(init: MemberInit) -> Self {
        Expr::MemberInit {
            entity: init.entity,
            bindings: init.bindings,
        }
    }
}

#[allow(clippy::should_implement_trait)]
impl Expr {
    fn binary(self, op: BinaryOp, right: impl Into<Expr>) -> Expr {
        Expr::Binary {
            left: Box::new(self),
            op,
            right: Box::new(right.into()),
        }
    }

    pub fn eq(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Eq, right)
    }

    pub fn ne(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Ne, right)
    }

    pub fn gt(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Gt, right)
    }

    pub fn gte(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Gte, right)
    }

    pub fn lt(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Lt, right)
    }

    pub fn lte(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Lte, right)
    }

    pub fn add(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Add, right)
    }

    pub fn sub(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Sub, right)
    }

    pub fn mul(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Mul, right)
    }

    pub fn div(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Div, right)
    }

    pub fn and(self, right: Expr) -> Expr {
        Expr::Logical {
            left: Box::new(self),
            op: LogicalOp::And,
            right: Box::new(right),
        }
    }

    pub fn or(self, right: Expr) -> Expr {
        Expr::Logical {
            left: Box::new(self),
            op: LogicalOp::Or,
            right: Box::new(right),
        }
    }

    pub fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }

    pub fn is_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self),
            negated: false,
        }
    }

    pub fn is_not_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self),
            negated: true,
        }
    }

    pub fn in_list<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> Expr {
        Expr::InList {
            expr: Box::new(self),
            list: values.into_iter().map(Into::into).collect(),
            negated: false,
        }
    }

    pub fn not_in<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> Expr {
        Expr::InList {
            expr: Box::new(self),
            list: values.into_iter().map(Into::into).collect(),
            negated: true,
        }
    }

    fn like(self, pattern: &str, kind: LikeKind, negated: bool) -> Expr {
        Expr::Like {
            expr: Box::new(self),
            pattern: pattern.to_string(),
            kind,
            negated,
        }
    }

    /// `x.Name.Contains("an")`
    pub fn contains(self, pattern: &str) -> Expr {
        self.like(pattern, LikeKind::Contains, false)
    }

    pub fn not_contains(self, pattern: &str) -> Expr {
        self.like(pattern, LikeKind::Contains, true)
    }

    pub fn starts_with(self, pattern: &str) -> Expr {
        self.like(pattern, LikeKind::StartsWith, false)
    }

    pub fn ends_with(self, pattern: &str) -> Expr {
        self.like(pattern, LikeKind::EndsWith, false)
    }

    pub fn between(self, low: impl Into<Value>, high: impl Into<Value>) -> Expr {
        Expr::Between {
            expr: Box::new(self),
            low: low.into(),
            high: high.into(),
        }
    }

    fn aggregate(self, func: AggregateFunc) -> Expr {
        Expr::Aggregate {
            func,
            arg: Some(Box::new(self)),
        }
    }

    pub fn sum(self) -> Expr {
        self.aggregate(AggregateFunc::Sum)
    }

    pub fn min(self) -> Expr {
        self.aggregate(AggregateFunc::Min)
    }

    pub fn max(self) -> Expr {
        self.aggregate(AggregateFunc::Max)
    }

    pub fn avg(self) -> Expr {
        self.aggregate(AggregateFunc::Avg)
    }

    pub fn count(self) -> Expr {
        self.aggregate(AggregateFunc::Count)
    }

    pub fn asc(self) -> OrderItem {
        OrderItem {
            expr: self,
            order: SortOrder::Asc,
        }
    }

    pub fn desc(self) -> OrderItem {
        OrderItem {
            expr: self,
            order: SortOrder::Desc,
        }
    }
}

impl From<Value> for Expr {
    fn from(v: Value) -> Self {
        Expr::Constant(v)
    }
}

macro_rules! constant_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Expr {
                fn from(v: $t) -> Self {
                    Expr::Constant(v.into())
                }
            }
        )*
    };
}

constant_from!(bool, i32, i64, u32, f64, &str, String, Uuid, NaiveDateTime);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::EntityDescriptor;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Probe {
        id: i64,
        name: String,
    }

    impl Entity for Probe {
        fn describe() -> EntityDescriptor {
            EntityDescriptor::table("probes").field("id").field("name").key("id")
        }
    }

    #[test]
    fn test_lambda_body_unwraps() {
        let e = lambda::<Probe>(col::<Probe>("id"));
        assert_eq!(e.kind(), "lambda");
        assert_eq!(e.body().kind(), "member-access");
        assert_eq!(e.as_member().map(|m| m.member.as_str()), Some("id"));
    }

    #[test]
    fn test_member_init_builder() {
        let e: Expr = init::<Probe>().set("name", "x").set("id", 3).into();
        match e {
            Expr::MemberInit { bindings, .. } => {
                assert_eq!(bindings.len(), 2);
                assert_eq!(bindings[0].0, "name");
                assert_eq!(bindings[1].1, Expr::Constant(Value::Int(3)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_like_wrap() {
        assert_eq!(LikeKind::Contains.wrap("an"), "%an%");
        assert_eq!(LikeKind::StartsWith.wrap("an"), "an%");
        assert_eq!(LikeKind::EndsWith.wrap("an"), "%an");
    }
}
