use crate::ast::Expr;
use crate::error::{ForgeError, ForgeResult};
use crate::metadata::{EntityObject, EntityRecord};
use crate::set::SetState;
use crate::transpiler::conditions::BuildContext;
use crate::transpiler::dialect::Dialect;
use crate::transpiler::dml::select::{AggregateParts, SelectParts, page_bounds};
use crate::transpiler::dml::{insert, update};
use crate::transpiler::option::ProviderOption;
use crate::transpiler::resolve::ResolveExpression;
use crate::transpiler::traits::{ProviderState, SqlProvider};

static OPTION: ProviderOption = ProviderOption::new("`", "`", '@');

#[derive(Debug, Default, Clone, Copy)]
pub struct MysqlResolver;

impl ResolveExpression for MysqlResolver {
    fn option(&self) -> &ProviderOption {
        &OPTION
    }

    /// SUM over no rows reads as 0.
    fn resolve_sum(&self, ctx: &mut BuildContext<'_>, selector: Option<&Expr>) -> ForgeResult<String> {
        Ok(format!("SELECT IFNULL(SUM({}),0)", self.aggregate_column(ctx, selector)?))
    }

    /// `SELECT cols FROM t`; the provider appends the update's WHERE.
    fn resolve_select_of_update(
        &self,
        ctx: &mut BuildContext<'_>,
        entity: &EntityObject,
        selector: Option<&Expr>,
    ) -> ForgeResult<String> {
        let cols = self.resolve_update_columns(ctx, entity, selector)?;
        let list = cols
            .iter()
            .map(|(col, prop)| {
                let alias = ctx.quote(prop);
                if *col == alias {
                    col.clone()
                } else {
                    format!("{} AS {}", col, alias)
                }
            })
            .collect::<Vec<_>>();
        Ok(format!(
            "SELECT {} FROM {}",
            list.join(", "),
            self.format_table_name(entity, false)
        ))
    }
}

#[derive(Debug, Default)]
pub struct MysqlProvider {
    resolver: MysqlResolver,
    state: ProviderState,
}

impl MysqlProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SqlProvider for MysqlProvider {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    fn resolver(&self) -> &dyn ResolveExpression {
        &self.resolver
    }

    fn state(&self) -> &ProviderState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ProviderState {
        &mut self.state
    }

    fn create_new(&self) -> Box<dyn SqlProvider> {
        Box::new(MysqlProvider::new())
    }

    fn format_get(&mut self, set: &SetState) -> ForgeResult<()> {
        let parts = SelectParts::resolve(&self.resolver, set, None)?;
        let sql = format!("{} LIMIT 1", parts.sql());
        self.state.commit(Dialect::MySql, sql, parts.params, parts.joins);
        Ok(())
    }

    fn format_to_list(&mut self, set: &SetState) -> ForgeResult<()> {
        let parts = SelectParts::resolve(&self.resolver, set, set.top)?;
        let sql = match set.top {
            Some(n) => format!("{} LIMIT {}", parts.sql(), n),
            None => parts.sql(),
        };
        self.state.commit(Dialect::MySql, sql, parts.params, parts.joins);
        Ok(())
    }

    fn format_to_page_list(&mut self, set: &SetState, page_index: u32, page_size: u32) -> ForgeResult<()> {
        let bounds = page_bounds(page_index, page_size)?;
        let parts = SelectParts::resolve(&self.resolver, set, None)?;
        let sql = format!("{} LIMIT {} OFFSET {}", parts.sql(), bounds.size, bounds.skip);
        self.state.commit(Dialect::MySql, sql, parts.params, parts.joins);
        Ok(())
    }

    fn format_exists(&mut self, set: &SetState) -> ForgeResult<()> {
        let parts = AggregateParts::resolve(&self.resolver, set, |_| Ok("SELECT 1".to_string()))?;
        let sql = format!("{} LIMIT 1", parts.sql());
        self.state.commit(Dialect::MySql, sql, parts.params, parts.joins);
        Ok(())
    }

    fn format_insert_identity(&mut self, set: &SetState, record: &EntityRecord, exclude: &[&str]) -> ForgeResult<()> {
        let parts = insert::build_insert(&self.resolver, set, record, exclude)?;
        if parts.entity.identity_or_key().is_none() {
            return Err(ForgeError::MissingPrimaryKey(parts.entity.table.clone()));
        }
        let sql = format!("{};SELECT @@IDENTITY", parts.sql());
        self.state.commit(Dialect::MySql, sql, parts.params, Vec::new());
        Ok(())
    }

    fn format_update_select(&mut self, set: &SetState, updator: &Expr) -> ForgeResult<()> {
        let parts = update::build_update(&self.resolver, set, updator)?;
        let update_sql = parts.sql();
        let mut params = parts.params;
        let mut ctx = BuildContext::new(&OPTION, &mut params, false);
        let select = self
            .resolver
            .resolve_select_of_update(&mut ctx, &parts.entity, set.select.as_ref())?;
        let sql = format!("{};{} {}", update_sql, select, parts.where_sql);
        self.state.commit(Dialect::MySql, sql, params, Vec::new());
        Ok(())
    }
}
