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

static OPTION: ProviderOption = ProviderOption::new("\"", "\"", ':');

/// Prefix of output parameters filled by `RETURNING ... INTO`.
const OUT_PREFIX: &str = "out_";

#[derive(Debug, Default, Clone, Copy)]
pub struct OracleResolver;

impl ResolveExpression for OracleResolver {
    fn option(&self) -> &ProviderOption {
        &OPTION
    }

    /// `RETURNING c1, c2 INTO :out_a, :out_b`
    fn resolve_select_of_update(
        &self,
        ctx: &mut BuildContext<'_>,
        entity: &EntityObject,
        selector: Option<&Expr>,
    ) -> ForgeResult<String> {
        let cols = self.resolve_update_columns(ctx, entity, selector)?;
        let mut outs = Vec::with_capacity(cols.len());
        for (_, prop) in &cols {
            outs.push(ctx.bind_output(&format!("{}{}", OUT_PREFIX, prop)));
        }
        let names = cols.into_iter().map(|(col, _)| col).collect::<Vec<_>>();
        Ok(format!("RETURNING {} INTO {}", names.join(", "), outs.join(", ")))
    }
}

/// Oracle has no LIMIT; row caps wrap the query and filter on ROWNUM.
#[derive(Debug, Default)]
pub struct OracleProvider {
    resolver: OracleResolver,
    state: ProviderState,
}

impl OracleProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

fn limit_rows(body: &str, n: u32) -> String {
    format!("SELECT T.* FROM ({}) T WHERE ROWNUM<={}", body, n)
}

impl SqlProvider for OracleProvider {
    fn dialect(&self) -> Dialect {
        Dialect::Oracle
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
        Box::new(OracleProvider::new())
    }

    /// Takes whichever row ROWNUM yields first; no ordering is added.
    fn format_get(&mut self, set: &SetState) -> ForgeResult<()> {
        let parts = SelectParts::resolve(&self.resolver, set, None)?;
        let sql = limit_rows(&parts.sql(), 1);
        self.state.commit(Dialect::Oracle, sql, parts.params, parts.joins);
        Ok(())
    }

    fn format_to_list(&mut self, set: &SetState) -> ForgeResult<()> {
        let parts = SelectParts::resolve(&self.resolver, set, None)?;
        let sql = match set.top {
            Some(n) => limit_rows(&parts.sql(), n),
            None => parts.sql(),
        };
        self.state.commit(Dialect::Oracle, sql, parts.params, parts.joins);
        Ok(())
    }

    fn format_to_page_list(&mut self, set: &SetState, page_index: u32, page_size: u32) -> ForgeResult<()> {
        let bounds = page_bounds(page_index, page_size)?;
        let parts = SelectParts::resolve(&self.resolver, set, None)?;
        let sql = format!(
            "SELECT T2.* FROM (SELECT T.*,ROWNUM ROWNUMS FROM ({}) T) T2 WHERE ROWNUMS BETWEEN {} AND {}",
            parts.sql(),
            bounds.first,
            bounds.last
        );
        self.state.commit(Dialect::Oracle, sql, parts.params, parts.joins);
        Ok(())
    }

    fn format_exists(&mut self, set: &SetState) -> ForgeResult<()> {
        let mut parts = AggregateParts::resolve(&self.resolver, set, |_| Ok("SELECT 1".to_string()))?;
        parts.where_sql.push_str(" AND ROWNUM<=1");
        self.state.commit(Dialect::Oracle, parts.sql(), parts.params, parts.joins);
        Ok(())
    }

    fn format_insert_identity(&mut self, set: &SetState, record: &EntityRecord, exclude: &[&str]) -> ForgeResult<()> {
        let mut parts = insert::build_insert(&self.resolver, set, record, exclude)?;
        let Some(prop) = parts.entity.identity_or_key() else {
            return Err(ForgeError::MissingPrimaryKey(parts.entity.table.clone()));
        };
        let col = OPTION.combine_field_name(parts.entity.column(prop)?);
        let out = BuildContext::new(&OPTION, &mut parts.params, false)
            .bind_output(&format!("{}{}", OUT_PREFIX, prop));
        let sql = format!("{} RETURNING {} INTO {}", parts.sql(), col, out);
        self.state.commit(Dialect::Oracle, sql, parts.params, Vec::new());
        Ok(())
    }

    fn format_update_select(&mut self, set: &SetState, updator: &Expr) -> ForgeResult<()> {
        let mut parts = update::build_update(&self.resolver, set, updator)?;
        let returning = {
            let mut ctx = BuildContext::new(&OPTION, &mut parts.params, false);
            self.resolver
                .resolve_select_of_update(&mut ctx, &parts.entity, set.select.as_ref())?
        };
        let sql = format!("{} {}", parts.sql(), returning);
        self.state.commit(Dialect::Oracle, sql, parts.params, Vec::new());
        Ok(())
    }
}
