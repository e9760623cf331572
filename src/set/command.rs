use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::ast::Expr;
use crate::database::Database;
use crate::engine::{Executor, from_row};
use crate::error::ForgeResult;
use crate::metadata::{Entity, EntityRecord};
use crate::set::SetState;
use crate::transpiler::Statement;

/// Write-side fluent set over entity `T`.
///
/// ```ignore
/// db.command_set::<User>()
///     .filter(col::<User>("id").eq(7))
///     .update_with(init::<User>().set("age", col::<User>("age").add(1)).into())
///     .await?;
/// ```
pub struct CommandSet<T: Entity, E: Executor> {
    db: Database<E>,
    state: SetState,
    exclude: Vec<String>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity, E: Executor> CommandSet<T, E> {
    pub(crate) fn new(db: Database<E>) -> Self {
        Self {
            db,
            state: SetState::of::<T>(),
            exclude: Vec::new(),
            _entity: PhantomData,
        }
    }

    pub fn state(&self) -> &SetState {
        &self.state
    }

    pub fn filter(mut self, predicate: Expr) -> Self {
        self.state.filters.push(predicate);
        self
    }

    /// Columns returned by [`CommandSet::update_select`].
    pub fn select(mut self, selector: Expr) -> Self {
        self.state.select = Some(selector);
        self
    }

    /// Properties left out of entity inserts and updates.
    pub fn exclude(mut self, fields: &[&str]) -> Self {
        self.exclude.extend(fields.iter().map(|f| f.to_string()));
        self
    }

    fn excluded(&self) -> Vec<&str> {
        self.exclude.iter().map(String::as_str).collect()
    }

    pub fn build_insert(&self, entity: &T) -> ForgeResult<Statement> {
        let record = EntityRecord::of(entity)?;
        let mut p = self.db.provider();
        p.format_insert(&self.state, &record, &self.excluded())?;
        Ok(p.take_statement())
    }

    pub fn build_insert_identity(&self, entity: &T) -> ForgeResult<Statement> {
        let record = EntityRecord::of(entity)?;
        let mut p = self.db.provider();
        p.format_insert_identity(&self.state, &record, &self.excluded())?;
        Ok(p.take_statement())
    }

    /// Entity update; without filters the key predicate is injected.
    pub fn build_update(&self, entity: &T) -> ForgeResult<Statement> {
        self.build_update_entity(entity, false)
    }

    /// Entity update applied to every row the filters match.
    pub fn build_update_batch(&self, entity: &T) -> ForgeResult<Statement> {
        self.build_update_entity(entity, true)
    }

    fn build_update_entity(&self, entity: &T, is_batch: bool) -> ForgeResult<Statement> {
        let record = EntityRecord::of(entity)?;
        let mut p = self.db.provider();
        p.format_update_entity(&self.state, &record, &self.excluded(), is_batch)?;
        Ok(p.take_statement())
    }

    pub fn build_update_with(&self, updator: &Expr) -> ForgeResult<Statement> {
        let mut p = self.db.provider();
        p.format_update(&self.state, updator)?;
        Ok(p.take_statement())
    }

    pub fn build_update_select(&self, updator: &Expr) -> ForgeResult<Statement> {
        let mut p = self.db.provider();
        p.format_update_select(&self.state, updator)?;
        Ok(p.take_statement())
    }

    pub fn build_delete(&self) -> ForgeResult<Statement> {
        let mut p = self.db.provider();
        p.format_delete(&self.state)?;
        Ok(p.take_statement())
    }

    pub async fn insert(&self, entity: &T) -> ForgeResult<u64> {
        self.db.execute(self.build_insert(entity)?).await
    }

    /// One INSERT per entity; every statement is built before any runs.
    pub async fn insert_many(&self, entities: &[T]) -> ForgeResult<u64> {
        let stmts = entities
            .iter()
            .map(|e| self.build_insert(e))
            .collect::<ForgeResult<Vec<_>>>()?;
        let mut affected = 0;
        for stmt in stmts {
            affected += self.db.execute(stmt).await?;
        }
        Ok(affected)
    }

    /// Generated identity of the inserted row.
    pub async fn insert_identity(&self, entity: &T) -> ForgeResult<JsonValue> {
        self.db.scalar(self.build_insert_identity(entity)?).await
    }

    pub async fn update(&self, entity: &T) -> ForgeResult<u64> {
        self.db.execute(self.build_update(entity)?).await
    }

    pub async fn update_batch(&self, entity: &T) -> ForgeResult<u64> {
        self.db.execute(self.build_update_batch(entity)?).await
    }

    /// Key-matched update per entity, each with its own provider.
    pub async fn update_many(&self, entities: &[T]) -> ForgeResult<u64> {
        let base = self.db.provider();
        let exclude = self.excluded();
        let mut stmts = Vec::with_capacity(entities.len());
        for entity in entities {
            let record = EntityRecord::of(entity)?;
            let mut p = base.create_new();
            p.format_update_entity(&self.state, &record, &exclude, false)?;
            stmts.push(p.take_statement());
        }

        let mut affected = 0;
        for stmt in stmts {
            affected += self.db.execute(stmt).await?;
        }
        Ok(affected)
    }

    /// Update from a member-init expression.
    pub async fn update_with(&self, updator: Expr) -> ForgeResult<u64> {
        self.db.execute(self.build_update_with(&updator)?).await
    }

    /// Update and return the updated rows.
    pub async fn update_select<R: DeserializeOwned>(&self, updator: Expr) -> ForgeResult<Vec<R>> {
        let rows = self.db.query(self.build_update_select(&updator)?).await?;
        rows.into_iter().map(from_row::<R>).collect()
    }

    pub async fn delete(&self) -> ForgeResult<u64> {
        self.db.execute(self.build_delete()?).await
    }
}
