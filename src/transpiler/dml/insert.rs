//! INSERT assembly.

use std::sync::Arc;

use crate::error::ForgeResult;
use crate::metadata::{EntityObject, EntityRecord, query_entity};
use crate::set::SetState;
use crate::transpiler::conditions::BuildContext;
use crate::transpiler::params::Params;
use crate::transpiler::resolve::ResolveExpression;

#[derive(Debug)]
pub struct InsertParts {
    pub entity: Arc<EntityObject>,
    pub table: String,
    pub columns: String,
    pub values: String,
    pub params: Params,
}

impl InsertParts {
    pub fn sql(&self) -> String {
        format!("INSERT INTO {} ({}) VALUES ({})", self.table, self.columns, self.values)
    }
}

/// Bind every insertable property of `record`. The identity property and
/// `exclude` are skipped.
pub fn build_insert(
    resolver: &dyn ResolveExpression,
    set: &SetState,
    record: &EntityRecord,
    exclude: &[&str],
) -> ForgeResult<InsertParts> {
    let entity = query_entity(&set.table)?;
    let mut params = Params::new();
    let mut ctx = BuildContext::new(resolver.option(), &mut params, false);

    let table = resolver.format_table_name(&entity, false);
    let (columns, values) = resolver.resolve_insert(&mut ctx, &entity, record, exclude)?;

    Ok(InsertParts {
        entity,
        table,
        columns,
        values,
        params,
    })
}
