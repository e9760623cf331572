use std::mem;

use crate::ast::Expr;
use crate::error::ForgeResult;
use crate::metadata::{EntityRecord, Navigation};
use crate::set::SetState;
use crate::transpiler::Statement;
use crate::transpiler::dialect::Dialect;
use crate::transpiler::dml::{delete, insert, select::AggregateParts, update};
use crate::transpiler::params::Params;
use crate::transpiler::resolve::ResolveExpression;

/// Output of one `format_*` call.
#[derive(Debug, Default)]
pub struct ProviderState {
    pub join_list: Vec<Navigation>,
    pub params: Params,
    pub sql_string: String,
}

impl ProviderState {
    /// Replace the state with a successfully built statement.
    pub fn commit(&mut self, dialect: Dialect, sql: String, params: Params, join_list: Vec<Navigation>) {
        tracing::debug!("[{}] {} ({} params)", dialect, sql, params.len());
        self.sql_string = sql;
        self.params = params;
        self.join_list = join_list;
    }
}

/// Statement builder for one dialect.
///
/// A provider is driven by a single `format_*` call, read, then discarded;
/// use [`SqlProvider::create_new`] for the next statement. Every `format_*`
/// resolves into local state and commits only on success, so an error leaves
/// the provider as it was.
pub trait SqlProvider: Send + Sync {
    fn dialect(&self) -> Dialect;
    fn resolver(&self) -> &dyn ResolveExpression;
    fn state(&self) -> &ProviderState;
    fn state_mut(&mut self) -> &mut ProviderState;

    /// Fresh provider of the same dialect.
    fn create_new(&self) -> Box<dyn SqlProvider>;

    /// First matching row.
    fn format_get(&mut self, set: &SetState) -> ForgeResult<()>;

    /// All matching rows, capped by `set.top`.
    fn format_to_list(&mut self, set: &SetState) -> ForgeResult<()>;

    /// One page; `page_index` and `page_size` start at 1.
    fn format_to_page_list(&mut self, set: &SetState, page_index: u32, page_size: u32) -> ForgeResult<()>;

    fn format_exists(&mut self, set: &SetState) -> ForgeResult<()>;

    /// Insert returning the generated identity (or first key).
    fn format_insert_identity(&mut self, set: &SetState, record: &EntityRecord, exclude: &[&str]) -> ForgeResult<()>;

    /// Update returning the updated columns (`set.select` or every field).
    fn format_update_select(&mut self, set: &SetState, updator: &Expr) -> ForgeResult<()>;

    fn format_count(&mut self, set: &SetState) -> ForgeResult<()> {
        let parts = AggregateParts::resolve(self.resolver(), set, |_| Ok("SELECT COUNT(1)".to_string()))?;
        let sql = parts.sql();
        let dialect = self.dialect();
        self.state_mut().commit(dialect, sql, parts.params, parts.joins);
        Ok(())
    }

    fn format_sum(&mut self, set: &SetState, selector: Option<&Expr>) -> ForgeResult<()> {
        let resolver = self.resolver();
        let parts = AggregateParts::resolve(resolver, set, |ctx| resolver.resolve_sum(ctx, selector))?;
        let sql = parts.sql();
        let dialect = self.dialect();
        self.state_mut().commit(dialect, sql, parts.params, parts.joins);
        Ok(())
    }

    fn format_min(&mut self, set: &SetState, selector: Option<&Expr>) -> ForgeResult<()> {
        let resolver = self.resolver();
        let parts = AggregateParts::resolve(resolver, set, |ctx| resolver.resolve_min(ctx, selector))?;
        let sql = parts.sql();
        let dialect = self.dialect();
        self.state_mut().commit(dialect, sql, parts.params, parts.joins);
        Ok(())
    }

    fn format_max(&mut self, set: &SetState, selector: Option<&Expr>) -> ForgeResult<()> {
        let resolver = self.resolver();
        let parts = AggregateParts::resolve(resolver, set, |ctx| resolver.resolve_max(ctx, selector))?;
        let sql = parts.sql();
        let dialect = self.dialect();
        self.state_mut().commit(dialect, sql, parts.params, parts.joins);
        Ok(())
    }

    fn format_insert(&mut self, set: &SetState, record: &EntityRecord, exclude: &[&str]) -> ForgeResult<()> {
        let parts = insert::build_insert(self.resolver(), set, record, exclude)?;
        let sql = parts.sql();
        let dialect = self.dialect();
        self.state_mut().commit(dialect, sql, parts.params, Vec::new());
        Ok(())
    }

    /// Update from a member-init expression.
    fn format_update(&mut self, set: &SetState, updator: &Expr) -> ForgeResult<()> {
        let parts = update::build_update(self.resolver(), set, updator)?;
        let sql = parts.sql();
        let dialect = self.dialect();
        self.state_mut().commit(dialect, sql, parts.params, Vec::new());
        Ok(())
    }

    /// Update every non-key property of `record`.
    fn format_update_entity(
        &mut self,
        set: &SetState,
        record: &EntityRecord,
        exclude: &[&str],
        is_batch: bool,
    ) -> ForgeResult<()> {
        let parts = update::build_update_entity(self.resolver(), set, record, exclude, is_batch)?;
        let sql = parts.sql();
        let dialect = self.dialect();
        self.state_mut().commit(dialect, sql, parts.params, Vec::new());
        Ok(())
    }

    fn format_delete(&mut self, set: &SetState) -> ForgeResult<()> {
        let (sql, params) = delete::build_delete(self.resolver(), set)?;
        let dialect = self.dialect();
        self.state_mut().commit(dialect, sql, params, Vec::new());
        Ok(())
    }

    fn sql_string(&self) -> &str {
        &self.state().sql_string
    }

    fn params(&self) -> &Params {
        &self.state().params
    }

    fn join_list(&self) -> &[Navigation] {
        &self.state().join_list
    }

    /// Move the built statement out, leaving the provider empty.
    fn take_statement(&mut self) -> Statement {
        let state = self.state_mut();
        let sql = mem::take(&mut state.sql_string);
        let params = mem::take(&mut state.params);
        state.join_list.clear();
        Statement::new(sql, params)
    }
}
