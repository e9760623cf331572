//! Fragment resolvers.
//!
//! The default methods produce the SQL shared by all dialects; each dialect
//! overrides only what differs (TOP, IFNULL, table hints, update projection).

use crate::ast::*;
use crate::error::{ForgeError, ForgeResult};
use crate::metadata::{EntityObject, EntityRecord, Navigation, query_entity};
use crate::transpiler::conditions::{BuildContext, JoinScope};
use crate::transpiler::option::ProviderOption;

/// Separator between navigation name and property in joined column aliases.
pub const NAVIGATION_SEPARATOR: &str = "__";

/// Dialect-specific expression → fragment translation.
pub trait ResolveExpression: Send + Sync {
    fn option(&self) -> &ProviderOption;

    /// `SELECT` keyword plus modifiers. Only SQL Server renders `top` here.
    fn select_prefix(&self, distinct: bool, _top: Option<u32>) -> String {
        if distinct {
            "SELECT DISTINCT".to_string()
        } else {
            "SELECT".to_string()
        }
    }

    /// Table hint appended to FROM.
    fn resolve_with_no_lock(&self, _no_lock: bool) -> &'static str {
        ""
    }

    fn format_table_name(&self, entity: &EntityObject, as_name: bool) -> String {
        let table = self.option().combine_field_name(&entity.table);
        if as_name {
            format!("{} {}", table, entity.as_name)
        } else {
            table
        }
    }

    fn resolve_from(&self, entity: &EntityObject, no_lock: bool) -> String {
        let from = format!("FROM {}", self.format_table_name(entity, true));
        match self.resolve_with_no_lock(no_lock) {
            "" => from,
            hint => format!("{} {}", from, hint),
        }
    }

    /// Select list without the keyword; queues the entity's navigations.
    fn resolve_select(
        &self,
        ctx: &mut BuildContext<'_>,
        entity: &EntityObject,
        selector: Option<&Expr>,
        joins: &mut Vec<Navigation>,
    ) -> ForgeResult<String> {
        joins.extend(entity.navigations.iter().cloned());
        match selector {
            None => self.table_fields(ctx, entity),
            Some(selector) => self.resolve_projection(ctx, selector),
        }
    }

    /// Every mapped column, aliased back to its property when renamed.
    fn table_fields(&self, ctx: &mut BuildContext<'_>, entity: &EntityObject) -> ForgeResult<String> {
        let mut cols = Vec::with_capacity(entity.fields.len());
        for f in &entity.fields {
            let col = ctx.column_of(entity, &f.property)?;
            if f.column == f.property {
                cols.push(col);
            } else {
                cols.push(format!("{} AS {}", col, ctx.quote(&f.property)));
            }
        }
        Ok(cols.join(", "))
    }

    fn resolve_projection(&self, ctx: &mut BuildContext<'_>, selector: &Expr) -> ForgeResult<String> {
        match selector.body() {
            Expr::Member(m) => {
                let entity = query_entity(&m.entity)?;
                let col = ctx.column_of(&entity, &m.member)?;
                if entity.column(&m.member)? == m.member {
                    Ok(col)
                } else {
                    Ok(format!("{} AS {}", col, ctx.quote(&m.member)))
                }
            }
            Expr::MemberInit { bindings, .. } => {
                if bindings.is_empty() {
                    return Err(ForgeError::MissingArgument("projection members"));
                }
                let mut cols = Vec::with_capacity(bindings.len());
                for (member, value) in bindings {
                    let v = ctx.value(value, member)?;
                    cols.push(format!("{} AS {}", v, ctx.quote(member)));
                }
                Ok(cols.join(", "))
            }
            Expr::Aggregate { .. } | Expr::Binary { .. } => ctx.value(selector, "param"),
            other => Err(ForgeError::unsupported(other.kind(), "select")),
        }
    }

    /// `WHERE 1=1 AND ...`
    fn resolve_where_list(&self, ctx: &mut BuildContext<'_>, filters: &[Expr]) -> ForgeResult<String> {
        let mut sql = String::from("WHERE 1=1");
        for filter in filters {
            sql.push_str(" AND ");
            sql.push_str(&conjunct(ctx, filter)?);
        }
        Ok(sql)
    }

    /// JOIN clauses; projected navigation columns are appended to `select_sql`.
    ///
    /// A joined table keeps its entity alias unless `root` or an earlier join
    /// already uses it; it is then aliased by the navigation name.
    fn resolve_join_sql(
        &self,
        ctx: &mut BuildContext<'_>,
        root: &EntityObject,
        joins: &[Navigation],
        select_sql: &mut String,
    ) -> ForgeResult<String> {
        let mut taken = vec![root.as_name.clone()];
        let mut clauses = Vec::with_capacity(joins.len());
        for nav in joins {
            let target = query_entity(&nav.target)?;
            let alias = join_alias(&taken, &target.as_name, &nav.name);
            taken.push(alias.clone());

            let scope = JoinScope {
                target: target.type_id,
                alias: alias.clone(),
                self_join: target.type_id == root.type_id,
            };
            let on = ctx.with_join_scope(scope).predicate(&nav.on)?;
            clauses.push(format!(
                "{} {} {} ON {}",
                nav.kind.as_sql(),
                self.format_table_name(&target, false),
                alias,
                on
            ));

            if nav.with_fields {
                for f in &target.fields {
                    let col = ctx.column_in(&alias, &target, &f.property)?;
                    let name = format!("{}{}{}", nav.name, NAVIGATION_SEPARATOR, f.property);
                    select_sql.push_str(&format!(", {} AS {}", col, ctx.quote(&name)));
                }
            }
        }
        Ok(clauses.join(" "))
    }

    fn resolve_group_by(&self, ctx: &mut BuildContext<'_>, group_by: &[Expr]) -> ForgeResult<String> {
        if group_by.is_empty() {
            return Ok(String::new());
        }
        let cols = group_by
            .iter()
            .map(|e| ctx.value(e, "param"))
            .collect::<ForgeResult<Vec<_>>>()?;
        Ok(format!("GROUP BY {}", cols.join(", ")))
    }

    fn resolve_having(&self, ctx: &mut BuildContext<'_>, having: &[Expr]) -> ForgeResult<String> {
        if having.is_empty() {
            return Ok(String::new());
        }
        let preds = having
            .iter()
            .map(|e| conjunct(ctx, e))
            .collect::<ForgeResult<Vec<_>>>()?;
        Ok(format!("HAVING {}", preds.join(" AND ")))
    }

    fn resolve_order_by(&self, ctx: &mut BuildContext<'_>, order_by: &[OrderItem]) -> ForgeResult<String> {
        if order_by.is_empty() {
            return Ok(String::new());
        }
        let mut items = Vec::with_capacity(order_by.len());
        for item in order_by {
            let dir = match item.order {
                SortOrder::Asc => "ASC",
                SortOrder::Desc => "DESC",
            };
            items.push(format!("{} {}", ctx.value(&item.expr, "param")?, dir));
        }
        Ok(format!("ORDER BY {}", items.join(", ")))
    }

    /// Column an aggregate selector reads. Only member access is accepted.
    fn aggregate_column(&self, ctx: &mut BuildContext<'_>, selector: Option<&Expr>) -> ForgeResult<String> {
        let selector = selector.ok_or(ForgeError::MissingArgument("aggregate selector"))?;
        match selector.body() {
            Expr::Member(m) => ctx.member(m),
            other => Err(ForgeError::unsupported(other.kind(), "aggregate selector")),
        }
    }

    fn resolve_sum(&self, ctx: &mut BuildContext<'_>, selector: Option<&Expr>) -> ForgeResult<String> {
        Ok(format!("SELECT SUM({})", self.aggregate_column(ctx, selector)?))
    }

    fn resolve_min(&self, ctx: &mut BuildContext<'_>, selector: Option<&Expr>) -> ForgeResult<String> {
        Ok(format!("SELECT MIN({})", self.aggregate_column(ctx, selector)?))
    }

    fn resolve_max(&self, ctx: &mut BuildContext<'_>, selector: Option<&Expr>) -> ForgeResult<String> {
        Ok(format!("SELECT MAX({})", self.aggregate_column(ctx, selector)?))
    }

    /// `SET col = value, ...` from a member-init expression.
    fn resolve_update(&self, ctx: &mut BuildContext<'_>, updator: &Expr) -> ForgeResult<String> {
        let (entity, bindings) = match updator.body() {
            Expr::MemberInit { entity, bindings } => (entity, bindings),
            other => return Err(ForgeError::unsupported(other.kind(), "update expression")),
        };
        if bindings.is_empty() {
            return Err(ForgeError::MissingArgument("update assignments"));
        }
        let entity = query_entity(entity)?;
        let mut sets = Vec::with_capacity(bindings.len());
        for (member, value) in bindings {
            let col = ctx.column_of(&entity, member)?;
            sets.push(format!("{} = {}", col, ctx.value(value, member)?));
        }
        Ok(format!("SET {}", sets.join(", ")))
    }

    /// `SET col = @prop, ...` for every non-key, non-excluded property.
    fn resolve_updates(
        &self,
        ctx: &mut BuildContext<'_>,
        entity: &EntityObject,
        record: &EntityRecord,
        exclude: &[&str],
    ) -> ForgeResult<String> {
        let mut sets = Vec::new();
        for f in &entity.fields {
            let prop = f.property.as_str();
            if entity.is_key(prop) || entity.is_identity(prop) || exclude.contains(&prop) {
                continue;
            }
            let col = ctx.column_of(entity, prop)?;
            let p = ctx.bind(prop, record.value(prop));
            sets.push(format!("{} = {}", col, p));
        }
        if sets.is_empty() {
            return Err(ForgeError::MissingArgument("updatable field"));
        }
        Ok(format!("SET {}", sets.join(", ")))
    }

    /// Column list and placeholder list for an INSERT.
    fn resolve_insert(
        &self,
        ctx: &mut BuildContext<'_>,
        entity: &EntityObject,
        record: &EntityRecord,
        exclude: &[&str],
    ) -> ForgeResult<(String, String)> {
        let mut cols = Vec::new();
        let mut values = Vec::new();
        for f in &entity.fields {
            let prop = f.property.as_str();
            if entity.is_identity(prop) || exclude.contains(&prop) {
                continue;
            }
            cols.push(ctx.column_of(entity, prop)?);
            values.push(ctx.bind(prop, record.value(prop)));
        }
        if cols.is_empty() {
            return Err(ForgeError::MissingArgument("insertable field"));
        }
        Ok((cols.join(", "), values.join(", ")))
    }

    /// ` AND key = @key ...` read off the instance.
    fn resolve_identity_where(
        &self,
        ctx: &mut BuildContext<'_>,
        entity: &EntityObject,
        record: &EntityRecord,
    ) -> ForgeResult<String> {
        if entity.keys.is_empty() {
            return Err(ForgeError::MissingPrimaryKey(entity.table.clone()));
        }
        let mut sql = String::new();
        for key in &entity.keys {
            let value = record.value(key);
            if value.is_null() {
                return Err(ForgeError::MissingArgument("primary key value"));
            }
            let col = ctx.column_of(entity, key)?;
            let p = ctx.bind(key, value);
            sql.push_str(&format!(" AND {} = {}", col, p));
        }
        Ok(sql)
    }

    /// `(column, property)` pairs returned by an update-select.
    fn resolve_update_columns(
        &self,
        ctx: &mut BuildContext<'_>,
        entity: &EntityObject,
        selector: Option<&Expr>,
    ) -> ForgeResult<Vec<(String, String)>> {
        let mut cols = Vec::new();
        let Some(selector) = selector else {
            for f in &entity.fields {
                cols.push((ctx.column_of(entity, &f.property)?, f.property.clone()));
            }
            return Ok(cols);
        };
        match selector.body() {
            Expr::Member(m) => cols.push((ctx.member(m)?, m.member.clone())),
            Expr::MemberInit { bindings, .. } if !bindings.is_empty() => {
                for (name, value) in bindings {
                    let m = value
                        .as_member()
                        .ok_or_else(|| ForgeError::unsupported(value.kind(), "update projection"))?;
                    cols.push((ctx.member(m)?, name.clone()));
                }
            }
            other => return Err(ForgeError::unsupported(other.kind(), "update projection")),
        }
        Ok(cols)
    }

    /// Dialect clause returning the updated rows.
    fn resolve_select_of_update(
        &self,
        ctx: &mut BuildContext<'_>,
        entity: &EntityObject,
        selector: Option<&Expr>,
    ) -> ForgeResult<String>;
}

/// First free alias out of the entity alias, the navigation name, then
/// the navigation name with a numeric suffix.
fn join_alias(taken: &[String], as_name: &str, nav_name: &str) -> String {
    let free = |name: &str| !taken.iter().any(|t| t.eq_ignore_ascii_case(name));
    if free(as_name) {
        return as_name.to_string();
    }
    if free(nav_name) {
        return nav_name.to_string();
    }
    (1..)
        .map(|i| format!("{}_{}", nav_name, i))
        .find(|name| free(name.as_str()))
        .unwrap_or_else(|| nav_name.to_string())
}

/// One AND-ed predicate; a top-level OR keeps its own parentheses.
fn conjunct(ctx: &mut BuildContext<'_>, expr: &Expr) -> ForgeResult<String> {
    let sql = ctx.predicate(expr)?;
    match expr.body() {
        Expr::Logical {
            op: LogicalOp::Or, ..
        } => Ok(format!("({})", sql)),
        _ => Ok(sql),
    }
}
