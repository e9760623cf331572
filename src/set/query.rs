use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::ast::{Expr, OrderItem, SortOrder};
use crate::database::Database;
use crate::engine::{Executor, from_row};
use crate::error::ForgeResult;
use crate::metadata::{Entity, Navigation};
use crate::set::{SetState, scalar_to_u64};
use crate::transpiler::Statement;

/// One page of results plus the total row count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageList<T> {
    pub page_index: u32,
    pub page_size: u32,
    pub total: u64,
    pub items: Vec<T>,
}

impl<T> PageList<T> {
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.page_size.max(1)))
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page_index) < self.total_pages()
    }
}

/// Read-side fluent set over entity `T`.
///
/// ```ignore
/// let adults = db
///     .query_set::<User>()
///     .filter(col::<User>("age").gte(18))
///     .order_by(col::<User>("name"))
///     .to_list()
///     .await?;
/// ```
pub struct QuerySet<T: Entity, E: Executor> {
    db: Database<E>,
    state: SetState,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity, E: Executor> QuerySet<T, E> {
    pub(crate) fn new(db: Database<E>, no_lock: bool) -> Self {
        let mut state = SetState::of::<T>();
        state.no_lock = no_lock;
        Self {
            db,
            state,
            _entity: PhantomData,
        }
    }

    pub fn state(&self) -> &SetState {
        &self.state
    }

    /// AND another predicate onto the where clause.
    pub fn filter(mut self, predicate: Expr) -> Self {
        self.state.filters.push(predicate);
        self
    }

    /// Replace the full projection.
    pub fn select(mut self, selector: Expr) -> Self {
        self.state.select = Some(selector);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.state.distinct = true;
        self
    }

    pub fn top(mut self, n: u32) -> Self {
        self.state.top = Some(n);
        self
    }

    pub fn order_by(mut self, expr: Expr) -> Self {
        self.state.order_by.push(OrderItem {
            expr,
            order: SortOrder::Asc,
        });
        self
    }

    pub fn order_by_desc(mut self, expr: Expr) -> Self {
        self.state.order_by.push(OrderItem {
            expr,
            order: SortOrder::Desc,
        });
        self
    }

    pub fn group_by(mut self, expr: Expr) -> Self {
        self.state.group_by.push(expr);
        self
    }

    pub fn having(mut self, predicate: Expr) -> Self {
        self.state.having.push(predicate);
        self
    }

    /// Join beyond the entity's declared navigations.
    pub fn join(mut self, navigation: Navigation) -> Self {
        self.state.joins.push(navigation);
        self
    }

    /// `WITH(NOLOCK)` on SQL Server; ignored elsewhere.
    pub fn with_no_lock(mut self) -> Self {
        self.state.no_lock = true;
        self
    }

    pub fn build_get(&self) -> ForgeResult<Statement> {
        let mut p = self.db.provider();
        p.format_get(&self.state)?;
        Ok(p.take_statement())
    }

    pub fn build_to_list(&self) -> ForgeResult<Statement> {
        let mut p = self.db.provider();
        p.format_to_list(&self.state)?;
        Ok(p.take_statement())
    }

    pub fn build_page(&self, page_index: u32, page_size: u32) -> ForgeResult<Statement> {
        let mut p = self.db.provider();
        p.format_to_page_list(&self.state, page_index, page_size)?;
        Ok(p.take_statement())
    }

    pub fn build_count(&self) -> ForgeResult<Statement> {
        let mut p = self.db.provider();
        p.format_count(&self.state)?;
        Ok(p.take_statement())
    }

    pub fn build_exists(&self) -> ForgeResult<Statement> {
        let mut p = self.db.provider();
        p.format_exists(&self.state)?;
        Ok(p.take_statement())
    }

    pub fn build_sum(&self, selector: &Expr) -> ForgeResult<Statement> {
        let mut p = self.db.provider();
        p.format_sum(&self.state, Some(selector))?;
        Ok(p.take_statement())
    }

    pub fn build_min(&self, selector: &Expr) -> ForgeResult<Statement> {
        let mut p = self.db.provider();
        p.format_min(&self.state, Some(selector))?;
        Ok(p.take_statement())
    }

    pub fn build_max(&self, selector: &Expr) -> ForgeResult<Statement> {
        let mut p = self.db.provider();
        p.format_max(&self.state, Some(selector))?;
        Ok(p.take_statement())
    }

    pub async fn get(&self) -> ForgeResult<Option<T>> {
        self.get_as().await
    }

    /// First row deserialized into a projection type.
    pub async fn get_as<R: DeserializeOwned>(&self) -> ForgeResult<Option<R>> {
        let rows = self.db.query(self.build_get()?).await?;
        rows.into_iter().next().map(from_row::<R>).transpose()
    }

    pub async fn to_list(&self) -> ForgeResult<Vec<T>> {
        self.to_list_as().await
    }

    pub async fn to_list_as<R: DeserializeOwned>(&self) -> ForgeResult<Vec<R>> {
        let rows = self.db.query(self.build_to_list()?).await?;
        rows.into_iter().map(from_row::<R>).collect()
    }

    /// Runs the count and the page query.
    pub async fn page_list(&self, page_index: u32, page_size: u32) -> ForgeResult<PageList<T>> {
        let page = self.build_page(page_index, page_size)?;
        let total = self.count().await?;
        let rows = self.db.query(page).await?;
        Ok(PageList {
            page_index,
            page_size,
            total,
            items: rows.into_iter().map(from_row::<T>).collect::<ForgeResult<_>>()?,
        })
    }

    pub async fn count(&self) -> ForgeResult<u64> {
        scalar_to_u64(self.db.scalar(self.build_count()?).await?)
    }

    pub async fn exists(&self) -> ForgeResult<bool> {
        Ok(!self.db.query(self.build_exists()?).await?.is_empty())
    }

    pub async fn sum<R: DeserializeOwned>(&self, selector: Expr) -> ForgeResult<R> {
        let value = self.db.scalar(self.build_sum(&selector)?).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// NULL over an empty set; use an `Option` result type.
    pub async fn min<R: DeserializeOwned>(&self, selector: Expr) -> ForgeResult<R> {
        let value = self.db.scalar(self.build_min(&selector)?).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn max<R: DeserializeOwned>(&self, selector: Expr) -> ForgeResult<R> {
        let value = self.db.scalar(self.build_max(&selector)?).await?;
        Ok(serde_json::from_value(value)?)
    }
}
