//! SELECT and aggregate assembly.

use std::sync::Arc;

use crate::error::{ForgeError, ForgeResult};
use crate::metadata::{EntityObject, Navigation, query_entity};
use crate::set::SetState;
use crate::transpiler::conditions::BuildContext;
use crate::transpiler::params::Params;
use crate::transpiler::resolve::ResolveExpression;

use super::join_fragments;

/// Resolved fragments of a row-returning query.
#[derive(Debug)]
pub struct SelectParts {
    pub entity: Arc<EntityObject>,
    pub prefix: String,
    pub columns: String,
    pub from: String,
    pub join: String,
    pub where_sql: String,
    pub group: String,
    pub having: String,
    pub order: String,
    pub joins: Vec<Navigation>,
    pub params: Params,
}

impl SelectParts {
    /// Resolve in statement order: select, from, join, where, group, having, order.
    pub fn resolve(resolver: &dyn ResolveExpression, set: &SetState, top: Option<u32>) -> ForgeResult<Self> {
        let entity = query_entity(&set.table)?;
        let mut params = Params::new();
        let mut joins = set.joins.clone();
        let mut ctx = BuildContext::new(resolver.option(), &mut params, true);

        let prefix = resolver.select_prefix(set.distinct, top);
        let mut columns = resolver.resolve_select(&mut ctx, &entity, set.select.as_ref(), &mut joins)?;
        let from = resolver.resolve_from(&entity, set.no_lock);
        let join = if set.select.is_none() {
            resolver.resolve_join_sql(&mut ctx, &entity, &joins, &mut columns)?
        } else {
            // explicit projection: joined columns are not selected
            let mut scratch = String::new();
            resolver.resolve_join_sql(&mut ctx, &entity, &joins, &mut scratch)?
        };
        let where_sql = resolver.resolve_where_list(&mut ctx, &set.filters)?;
        let group = resolver.resolve_group_by(&mut ctx, &set.group_by)?;
        let having = resolver.resolve_having(&mut ctx, &set.having)?;
        let order = resolver.resolve_order_by(&mut ctx, &set.order_by)?;

        Ok(Self {
            entity,
            prefix,
            columns,
            from,
            join,
            where_sql,
            group,
            having,
            order,
            joins,
            params,
        })
    }

    pub fn sql(&self) -> String {
        let head = format!("{} {}", self.prefix, self.columns);
        join_fragments(&[
            head.as_str(),
            self.from.as_str(),
            self.join.as_str(),
            self.where_sql.as_str(),
            self.group.as_str(),
            self.having.as_str(),
            self.order.as_str(),
        ])
    }
}

/// Fragments of a single-value query (`COUNT`, `SUM`, `EXISTS`...).
#[derive(Debug)]
pub struct AggregateParts {
    pub head: String,
    pub from: String,
    pub join: String,
    pub where_sql: String,
    pub joins: Vec<Navigation>,
    pub params: Params,
}

impl AggregateParts {
    /// `head` renders the select keyword and its single column.
    pub fn resolve<F>(resolver: &dyn ResolveExpression, set: &SetState, head: F) -> ForgeResult<Self>
    where
        F: FnOnce(&mut BuildContext<'_>) -> ForgeResult<String>,
    {
        let entity = query_entity(&set.table)?;
        let mut params = Params::new();
        let mut joins = set.joins.clone();
        joins.extend(entity.navigations.iter().cloned());
        let mut ctx = BuildContext::new(resolver.option(), &mut params, true);

        let head = head(&mut ctx)?;
        let from = resolver.resolve_from(&entity, set.no_lock);
        let mut discarded = String::new();
        let join = resolver.resolve_join_sql(&mut ctx, &entity, &joins, &mut discarded)?;
        let where_sql = resolver.resolve_where_list(&mut ctx, &set.filters)?;

        Ok(Self {
            head,
            from,
            join,
            where_sql,
            joins,
            params,
        })
    }

    pub fn sql(&self) -> String {
        join_fragments(&[
            self.head.as_str(),
            self.from.as_str(),
            self.join.as_str(),
            self.where_sql.as_str(),
        ])
    }
}

/// Row bounds of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBounds {
    /// Rows before the page
    pub skip: u64,
    /// 1-based first row
    pub first: u64,
    /// 1-based last row
    pub last: u64,
    pub size: u64,
}

pub fn page_bounds(page_index: u32, page_size: u32) -> ForgeResult<PageBounds> {
    if page_index < 1 || page_size < 1 {
        return Err(ForgeError::InvalidPaging {
            page_index,
            page_size,
        });
    }
    let size = u64::from(page_size);
    let skip = (u64::from(page_index) - 1) * size;
    Ok(PageBounds {
        skip,
        first: skip + 1,
        last: skip + size,
        size,
    })
}
