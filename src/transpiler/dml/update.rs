//! UPDATE assembly. Columns are never alias-qualified here.

use std::sync::Arc;

use crate::ast::Expr;
use crate::error::ForgeResult;
use crate::metadata::{EntityObject, EntityRecord, query_entity};
use crate::set::SetState;
use crate::transpiler::conditions::BuildContext;
use crate::transpiler::params::Params;
use crate::transpiler::resolve::ResolveExpression;

use super::join_fragments;

#[derive(Debug)]
pub struct UpdateParts {
    pub entity: Arc<EntityObject>,
    pub table: String,
    pub set_sql: String,
    pub where_sql: String,
    pub params: Params,
}

impl UpdateParts {
    pub fn sql(&self) -> String {
        self.sql_with(&[])
    }

    /// Statement with dialect clauses placed between SET and WHERE.
    pub fn sql_with(&self, between: &[&str]) -> String {
        let head = format!("UPDATE {}", self.table);
        let mut parts = vec![head.as_str(), self.set_sql.as_str()];
        parts.extend_from_slice(between);
        parts.push(self.where_sql.as_str());
        join_fragments(&parts)
    }
}

/// `UPDATE t SET <member-init> WHERE <filters>`.
pub fn build_update(resolver: &dyn ResolveExpression, set: &SetState, updator: &Expr) -> ForgeResult<UpdateParts> {
    let entity = query_entity(&set.table)?;
    let mut params = Params::new();
    let mut ctx = BuildContext::new(resolver.option(), &mut params, false);

    let table = resolver.format_table_name(&entity, false);
    let set_sql = resolver.resolve_update(&mut ctx, updator)?;
    let where_sql = resolver.resolve_where_list(&mut ctx, &set.filters)?;
    if !set.has_filters() {
        tracing::warn!("UPDATE on {} has no predicate; every row is affected", entity.table);
    }

    Ok(UpdateParts {
        entity,
        table,
        set_sql,
        where_sql,
        params,
    })
}

/// `UPDATE t SET <every non-key property> WHERE ...`.
///
/// With no filters and `is_batch == false` the key predicate is read off the
/// record; a missing key or key value is an error. `is_batch` leaves the
/// where clause as given.
pub fn build_update_entity(
    resolver: &dyn ResolveExpression,
    set: &SetState,
    record: &EntityRecord,
    exclude: &[&str],
    is_batch: bool,
) -> ForgeResult<UpdateParts> {
    let entity = query_entity(&set.table)?;
    let mut params = Params::new();
    let mut ctx = BuildContext::new(resolver.option(), &mut params, false);

    let table = resolver.format_table_name(&entity, false);
    let set_sql = resolver.resolve_updates(&mut ctx, &entity, record, exclude)?;
    let mut where_sql = resolver.resolve_where_list(&mut ctx, &set.filters)?;
    if !set.has_filters() {
        if is_batch {
            tracing::warn!("batch UPDATE on {} has no predicate; every row is affected", entity.table);
        } else {
            where_sql.push_str(&resolver.resolve_identity_where(&mut ctx, &entity, record)?);
        }
    }

    Ok(UpdateParts {
        entity,
        table,
        set_sql,
        where_sql,
        params,
    })
}
