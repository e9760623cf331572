//! Entry point binding an executor, a dialect and interception hooks.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value as JsonValue;

use crate::aop::{Aop, AopChain, SqlLogger};
use crate::config::ForgeConfig;
use crate::engine::{Executor, Row};
use crate::error::ForgeResult;
use crate::metadata::Entity;
use crate::set::{CommandSet, QuerySet};
use crate::transpiler::{Dialect, SqlProvider, Statement};

/// Cheap to clone; sets keep their own handle.
pub struct Database<E: Executor> {
    executor: Arc<E>,
    dialect: Dialect,
    no_lock: bool,
    aop: Arc<AopChain>,
}

impl<E: Executor> Clone for Database<E> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
            dialect: self.dialect,
            no_lock: self.no_lock,
            aop: Arc::clone(&self.aop),
        }
    }
}

impl<E: Executor> Database<E> {
    pub fn new(executor: E, dialect: Dialect) -> Self {
        Self {
            executor: Arc::new(executor),
            dialect,
            no_lock: false,
            aop: Arc::new(AopChain::new()),
        }
    }

    pub fn from_config(executor: E, config: &ForgeConfig) -> Self {
        let mut db = Self::new(executor, config.dialect);
        db.no_lock = config.no_lock;
        if config.log_sql {
            db = db.with_aop(SqlLogger);
        }
        db
    }

    pub fn with_aop(mut self, hook: impl Aop + 'static) -> Self {
        Arc::make_mut(&mut self.aop).push(Arc::new(hook));
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Fresh provider for one statement.
    pub fn provider(&self) -> Box<dyn SqlProvider> {
        self.dialect.provider()
    }

    pub fn query_set<T: Entity>(&self) -> QuerySet<T, E> {
        QuerySet::new(self.clone(), self.no_lock)
    }

    pub fn command_set<T: Entity>(&self) -> CommandSet<T, E> {
        CommandSet::new(self.clone())
    }

    pub(crate) async fn query(&self, mut stmt: Statement) -> ForgeResult<Vec<Row>> {
        self.aop.executing(&mut stmt);
        let start = Instant::now();
        let result = self.executor.query(&stmt).await;
        self.aop.executed(&stmt, start.elapsed());
        result
    }

    pub(crate) async fn scalar(&self, mut stmt: Statement) -> ForgeResult<JsonValue> {
        self.aop.executing(&mut stmt);
        let start = Instant::now();
        let result = self.executor.scalar(&stmt).await;
        self.aop.executed(&stmt, start.elapsed());
        result
    }

    pub(crate) async fn execute(&self, mut stmt: Statement) -> ForgeResult<u64> {
        self.aop.executing(&mut stmt);
        let start = Instant::now();
        let result = self.executor.execute(&stmt).await;
        self.aop.executed(&stmt, start.elapsed());
        result
    }
}
