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

static OPTION: ProviderOption = ProviderOption::new("[", "]", '@');

#[derive(Debug, Default, Clone, Copy)]
pub struct SqlServerResolver;

impl ResolveExpression for SqlServerResolver {
    fn option(&self) -> &ProviderOption {
        &OPTION
    }

    fn select_prefix(&self, distinct: bool, top: Option<u32>) -> String {
        let mut prefix = String::from("SELECT");
        if distinct {
            prefix.push_str(" DISTINCT");
        }
        if let Some(n) = top {
            prefix.push_str(&format!(" TOP {}", n));
        }
        prefix
    }

    fn resolve_with_no_lock(&self, no_lock: bool) -> &'static str {
        if no_lock { "WITH(NOLOCK)" } else { "" }
    }

    /// `OUTPUT INSERTED.[col] AS [prop], ...`
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
                    format!("INSERTED.{}", col)
                } else {
                    format!("INSERTED.{} AS {}", col, alias)
                }
            })
            .collect::<Vec<_>>();
        Ok(format!("OUTPUT {}", list.join(", ")))
    }
}

#[derive(Debug, Default)]
pub struct SqlServerProvider {
    resolver: SqlServerResolver,
    state: ProviderState,
}

impl SqlServerProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SqlProvider for SqlServerProvider {
    fn dialect(&self) -> Dialect {
        Dialect::SqlServer
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
        Box::new(SqlServerProvider::new())
    }

    fn format_get(&mut self, set: &SetState) -> ForgeResult<()> {
        let parts = SelectParts::resolve(&self.resolver, set, Some(1))?;
        self.state.commit(Dialect::SqlServer, parts.sql(), parts.params, parts.joins);
        Ok(())
    }

    fn format_to_list(&mut self, set: &SetState) -> ForgeResult<()> {
        let parts = SelectParts::resolve(&self.resolver, set, set.top)?;
        self.state.commit(Dialect::SqlServer, parts.sql(), parts.params, parts.joins);
        Ok(())
    }

    /// OFFSET/FETCH needs an ORDER BY; the key columns stand in when none is given.
    ///
    /// Grouped rows and DISTINCT projections may not carry the key, so those
    /// fall back to `(SELECT NULL)`.
    fn format_to_page_list(&mut self, set: &SetState, page_index: u32, page_size: u32) -> ForgeResult<()> {
        let bounds = page_bounds(page_index, page_size)?;
        let mut parts = SelectParts::resolve(&self.resolver, set, None)?;
        if parts.order.is_empty() {
            let key_visible = set.group_by.is_empty() && !(set.distinct && set.select.is_some());
            parts.order = if parts.entity.keys.is_empty() || !key_visible {
                "ORDER BY (SELECT NULL)".to_string()
            } else {
                let mut keys = Vec::with_capacity(parts.entity.keys.len());
                for key in &parts.entity.keys {
                    let col = OPTION.combine_field_name(parts.entity.column(key)?);
                    keys.push(format!("{}.{}", parts.entity.as_name, col));
                }
                format!("ORDER BY {}", keys.join(", "))
            };
        }
        let sql = format!(
            "{} OFFSET {} ROWS FETCH NEXT {} ROWS ONLY",
            parts.sql(),
            bounds.skip,
            bounds.size
        );
        self.state.commit(Dialect::SqlServer, sql, parts.params, parts.joins);
        Ok(())
    }

    fn format_exists(&mut self, set: &SetState) -> ForgeResult<()> {
        let parts = AggregateParts::resolve(&self.resolver, set, |_| Ok("SELECT TOP 1 1".to_string()))?;
        self.state.commit(Dialect::SqlServer, parts.sql(), parts.params, parts.joins);
        Ok(())
    }

    fn format_insert_identity(&mut self, set: &SetState, record: &EntityRecord, exclude: &[&str]) -> ForgeResult<()> {
        let parts = insert::build_insert(&self.resolver, set, record, exclude)?;
        if parts.entity.identity_or_key().is_none() {
            return Err(ForgeError::MissingPrimaryKey(parts.entity.table.clone()));
        }
        let sql = format!("{};SELECT SCOPE_IDENTITY()", parts.sql());
        self.state.commit(Dialect::SqlServer, sql, parts.params, Vec::new());
        Ok(())
    }

    fn format_update_select(&mut self, set: &SetState, updator: &Expr) -> ForgeResult<()> {
        let mut parts = update::build_update(&self.resolver, set, updator)?;
        let output = {
            let mut ctx = BuildContext::new(&OPTION, &mut parts.params, false);
            self.resolver
                .resolve_select_of_update(&mut ctx, &parts.entity, set.select.as_ref())?
        };
        let sql = parts.sql_with(&[output.as_str()]);
        self.state.commit(Dialect::SqlServer, sql, parts.params, Vec::new());
        Ok(())
    }
}
