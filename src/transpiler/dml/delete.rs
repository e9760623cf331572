//! DELETE assembly.

use crate::error::ForgeResult;
use crate::metadata::query_entity;
use crate::set::SetState;
use crate::transpiler::conditions::BuildContext;
use crate::transpiler::params::Params;
use crate::transpiler::resolve::ResolveExpression;

/// `DELETE FROM t WHERE 1=1 AND ...`, columns unqualified.
pub fn build_delete(resolver: &dyn ResolveExpression, set: &SetState) -> ForgeResult<(String, Params)> {
    let entity = query_entity(&set.table)?;
    let mut params = Params::new();
    let mut ctx = BuildContext::new(resolver.option(), &mut params, false);

    let where_sql = resolver.resolve_where_list(&mut ctx, &set.filters)?;
    if !set.has_filters() {
        tracing::warn!("DELETE on {} has no predicate; every row is affected", entity.table);
    }
    let sql = format!("DELETE FROM {} {}", resolver.format_table_name(&entity, false), where_sql);
    Ok((sql, params))
}
