//! Expression tree → SQL fragment translation.
//!
//! Every constant becomes a parameter; its name is taken from the member it
//! is compared with, so `x.age > 18` renders as `users.age > @age`.

use std::any::TypeId;

use crate::ast::*;
use crate::error::{ForgeError, ForgeResult};
use crate::metadata::{EntityObject, query_entity};
use crate::transpiler::option::ProviderOption;
use crate::transpiler::params::Params;

const DEFAULT_PARAM: &str = "param";

/// Alias a joined entity is rendered under inside its ON clause.
///
/// For a self-join both sides share one entity type; only the right operand
/// of each comparison then reads the joined alias.
#[derive(Debug, Clone)]
pub struct JoinScope {
    pub target: TypeId,
    pub alias: String,
    pub self_join: bool,
}

/// Explicit build state threaded through every resolver call.
pub struct BuildContext<'a> {
    pub option: &'a ProviderOption,
    pub params: &'a mut Params,
    /// Qualify columns with the entity alias
    pub as_name: bool,
    scope: Option<JoinScope>,
    right_operand: bool,
}

impl<'a> BuildContext<'a> {
    pub fn new(option: &'a ProviderOption, params: &'a mut Params, as_name: bool) -> Self {
        Self {
            option,
            params,
            as_name,
            scope: None,
            right_operand: false,
        }
    }

    /// Same bag, different aliasing.
    pub fn with_as_name(&mut self, as_name: bool) -> BuildContext<'_> {
        BuildContext {
            option: self.option,
            params: &mut *self.params,
            as_name,
            scope: None,
            right_operand: false,
        }
    }

    /// Same bag; members of the joined entity render under the join alias.
    pub fn with_join_scope(&mut self, scope: JoinScope) -> BuildContext<'_> {
        BuildContext {
            option: self.option,
            params: &mut *self.params,
            as_name: true,
            scope: Some(scope),
            right_operand: false,
        }
    }

    pub fn quote(&self, name: &str) -> String {
        self.option.combine_field_name(name)
    }

    /// Bind a value and return its placeholder.
    pub fn bind(&mut self, base: &str, value: Value) -> String {
        let name = self.params.add(base, value);
        self.option.placeholder(&name)
    }

    pub fn bind_output(&mut self, base: &str) -> String {
        let name = self.params.add_output(base);
        self.option.placeholder(&name)
    }

    /// Column reference for a property of an already resolved entity.
    pub fn column_of(&self, entity: &EntityObject, property: &str) -> ForgeResult<String> {
        self.column_in(&entity.as_name, entity, property)
    }

    /// Column reference qualified with an explicit alias.
    pub fn column_in(&self, alias: &str, entity: &EntityObject, property: &str) -> ForgeResult<String> {
        let column = self.quote(entity.column(property)?);
        if self.as_name {
            Ok(format!("{}.{}", alias, column))
        } else {
            Ok(column)
        }
    }

    /// Column reference for a member access.
    pub fn member(&self, m: &MemberRef) -> ForgeResult<String> {
        let entity = query_entity(&m.entity)?;
        match &self.scope {
            Some(scope)
                if scope.target == m.entity.id() && (!scope.self_join || self.right_operand) =>
            {
                self.column_in(&scope.alias, &entity, &m.member)
            }
            _ => self.column_of(&entity, &m.member),
        }
    }

    /// Render a boolean predicate.
    pub fn predicate(&mut self, expr: &Expr) -> ForgeResult<String> {
        match expr.body() {
            Expr::Member(m) => {
                let col = self.member(m)?;
                let p = self.bind(&m.member, Value::Bool(true));
                Ok(format!("{} = {}", col, p))
            }
            Expr::Constant(Value::Bool(true)) => Ok("1=1".to_string()),
            Expr::Constant(Value::Bool(false)) => Ok("1=0".to_string()),
            Expr::Binary { left, op, right } if op.is_comparison() => {
                self.comparison(left, *op, right)
            }
            Expr::Logical { left, op, right } => {
                let l = self.logical_child(left, *op)?;
                let r = self.logical_child(right, *op)?;
                Ok(format!("{} {} {}", l, op.as_sql(), r))
            }
            Expr::Not(inner) => Ok(format!("NOT ({})", self.predicate(inner)?)),
            Expr::IsNull { expr, negated } => {
                let v = self.value(expr, DEFAULT_PARAM)?;
                let kw = if *negated { "IS NOT NULL" } else { "IS NULL" };
                Ok(format!("{} {}", v, kw))
            }
            Expr::InList {
                expr,
                list,
                negated,
            } => {
                if list.is_empty() {
                    // IN () is not valid SQL in any dialect
                    return Ok(if *negated { "1=1" } else { "1=0" }.to_string());
                }
                let hint = member_hint(expr).unwrap_or(DEFAULT_PARAM).to_string();
                let v = self.value(expr, &hint)?;
                let placeholders: Vec<String> =
                    list.iter().map(|item| self.bind(&hint, item.clone())).collect();
                let kw = if *negated { "NOT IN" } else { "IN" };
                Ok(format!("{} {} ({})", v, kw, placeholders.join(", ")))
            }
            Expr::Like {
                expr,
                pattern,
                kind,
                negated,
            } => {
                let hint = member_hint(expr).unwrap_or(DEFAULT_PARAM).to_string();
                let v = self.value(expr, &hint)?;
                let p = self.bind(&hint, Value::String(kind.wrap(pattern)));
                let kw = if *negated { "NOT LIKE" } else { "LIKE" };
                Ok(format!("{} {} {}", v, kw, p))
            }
            Expr::Between { expr, low, high } => {
                let hint = member_hint(expr).unwrap_or(DEFAULT_PARAM).to_string();
                let v = self.value(expr, &hint)?;
                let lo = self.bind(&hint, low.clone());
                let hi = self.bind(&hint, high.clone());
                Ok(format!("{} BETWEEN {} AND {}", v, lo, hi))
            }
            other => Err(ForgeError::unsupported(other.kind(), "predicate")),
        }
    }

    fn logical_child(&mut self, expr: &Expr, parent: LogicalOp) -> ForgeResult<String> {
        let sql = self.predicate(expr)?;
        match expr.body() {
            Expr::Logical { op, .. } if *op != parent => Ok(format!("({})", sql)),
            _ => Ok(sql),
        }
    }

    fn comparison(&mut self, left: &Expr, op: BinaryOp, right: &Expr) -> ForgeResult<String> {
        // x.a == null → IS NULL
        let null_side = match (left.body(), right.body()) {
            (_, Expr::Constant(Value::Null)) => Some(left),
            (Expr::Constant(Value::Null), _) => Some(right),
            _ => None,
        };
        if let Some(side) = null_side {
            let v = self.value(side, DEFAULT_PARAM)?;
            return match op {
                BinaryOp::Eq => Ok(format!("{} IS NULL", v)),
                BinaryOp::Ne => Ok(format!("{} IS NOT NULL", v)),
                _ => Err(ForgeError::unsupported("null constant", "ordering comparison")),
            };
        }

        let hint = member_hint(left)
            .or_else(|| member_hint(right))
            .unwrap_or(DEFAULT_PARAM)
            .to_string();
        let l = self.value(left, &hint)?;
        let outer = std::mem::replace(&mut self.right_operand, true);
        let r = self.value(right, &hint);
        self.right_operand = outer;
        Ok(format!("{} {} {}", l, op.as_sql(), r?))
    }

    /// Render a scalar expression. `hint` names any parameter it binds.
    pub fn value(&mut self, expr: &Expr, hint: &str) -> ForgeResult<String> {
        match expr.body() {
            Expr::Member(m) => self.member(m),
            Expr::Constant(v) => Ok(self.bind(hint, v.clone())),
            Expr::Binary { left, op, right } if !op.is_comparison() => {
                let hint = member_hint(left)
                    .or_else(|| member_hint(right))
                    .unwrap_or(hint)
                    .to_string();
                let l = self.value(left, &hint)?;
                let r = self.value(right, &hint)?;
                Ok(format!("({} {} {})", l, op.as_sql(), r))
            }
            Expr::Aggregate { func, arg } => match arg {
                Some(arg) => {
                    let hint = member_hint(arg).unwrap_or(hint).to_string();
                    Ok(format!("{}({})", func.as_sql(), self.value(arg, &hint)?))
                }
                None if *func == AggregateFunc::Count => Ok("COUNT(1)".to_string()),
                None => Err(ForgeError::MissingArgument("aggregate argument")),
            },
            other => Err(ForgeError::unsupported(other.kind(), "value")),
        }
    }
}

/// Parameter base name derived from a member access.
pub(crate) fn member_hint(expr: &Expr) -> Option<&str> {
    match expr.body() {
        Expr::Member(m) => Some(m.member.as_str()),
        Expr::Aggregate { arg: Some(arg), .. } => member_hint(arg),
        Expr::Binary { left, right, .. } => member_hint(left).or_else(|| member_hint(right)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transpiler::tests::fixtures::*;

    const MYSQL: ProviderOption = ProviderOption::new("`", "`", '@');

    fn render(expr: &Expr, as_name: bool) -> (String, Params) {
        let mut params = Params::new();
        let sql = {
            let mut ctx = BuildContext::new(&MYSQL, &mut params, as_name);
            ctx.predicate(expr).unwrap()
        };
        (sql, params)
    }

    #[test]
    fn test_comparison_names_param_after_member() {
        let (sql, params) = render(&col::<User>("age").gt(18), true);
        assert_eq!(sql, "users.`age` > @age");
        assert_eq!(params.get("age"), Some(&Value::Int(18)));
    }

    #[test]
    fn test_renamed_column_without_alias() {
        let (sql, _) = render(&col::<User>("name").eq("ann"), false);
        assert_eq!(sql, "`user_name` = @name");
    }

    #[test]
    fn test_or_inside_and_is_parenthesized() {
        let expr = col::<User>("age")
            .gt(18)
            .and(col::<User>("name").eq("a").or(col::<User>("name").eq("b")));
        let (sql, params) = render(&expr, true);
        assert_eq!(
            sql,
            "users.`age` > @age AND (users.`user_name` = @name OR users.`user_name` = @name_1)"
        );
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_null_comparison() {
        let (sql, params) = render(&col::<User>("dept_id").eq(Value::Null), true);
        assert_eq!(sql, "users.`dept_id` IS NULL");
        assert!(params.is_empty());

        let (sql, _) = render(&col::<User>("dept_id").ne(Value::Null), true);
        assert_eq!(sql, "users.`dept_id` IS NOT NULL");
    }

    #[test]
    fn test_in_list_and_empty_list() {
        let (sql, params) = render(&col::<User>("id").in_list([1, 2, 3]), true);
        assert_eq!(sql, "users.`id` IN (@id, @id_1, @id_2)");
        assert_eq!(params.len(), 3);

        let empty: Vec<i64> = Vec::new();
        let (sql, _) = render(&col::<User>("id").in_list(empty.clone()), true);
        assert_eq!(sql, "1=0");
        let (sql, _) = render(&col::<User>("id").not_in(empty), true);
        assert_eq!(sql, "1=1");
    }

    #[test]
    fn test_like_binds_wrapped_pattern() {
        let (sql, params) = render(&col::<User>("name").starts_with("an"), true);
        assert_eq!(sql, "users.`user_name` LIKE @name");
        assert_eq!(params.get("name"), Some(&Value::String("an%".to_string())));
    }

    #[test]
    fn test_between_and_arithmetic() {
        let (sql, _) = render(&col::<User>("age").between(18, 65), true);
        assert_eq!(sql, "users.`age` BETWEEN @age AND @age_1");

        let (sql, _) = render(&col::<User>("age").add(1).gt(20), true);
        assert_eq!(sql, "(users.`age` + @age) > @age_1");
    }

    #[test]
    fn test_member_init_is_not_a_predicate() {
        let mut params = Params::new();
        let mut ctx = BuildContext::new(&MYSQL, &mut params, true);
        let expr: Expr = init::<User>().set("age", 1).into();
        let err = ctx.predicate(&expr).unwrap_err();
        assert!(matches!(err, ForgeError::UnsupportedExpression { kind: "member-init", .. }));
    }

    #[test]
    fn test_unknown_member_fails() {
        let mut params = Params::new();
        let mut ctx = BuildContext::new(&MYSQL, &mut params, true);
        let err = ctx.predicate(&col::<User>("nickname").eq(1)).unwrap_err();
        assert!(matches!(err, ForgeError::UnknownMember { .. }));
    }

    #[test]
    fn test_aggregate_in_having_position() {
        let (sql, _) = render(&count().gt(5), true);
        assert_eq!(sql, "COUNT(1) > @param");
    }
}
