//! Interception hooks around statement execution.

use std::sync::Arc;
use std::time::Duration;

use crate::transpiler::Statement;

/// Called around every statement a set executes.
pub trait Aop: Send + Sync {
    /// Before execution; may rewrite the statement.
    fn on_executing(&self, _stmt: &mut Statement) {}

    /// After execution, successful or not.
    fn on_executed(&self, _stmt: &Statement, _elapsed: Duration) {}
}

/// Ordered hook list.
#[derive(Clone, Default)]
pub struct AopChain {
    hooks: Vec<Arc<dyn Aop>>,
}

impl AopChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, hook: Arc<dyn Aop>) {
        self.hooks.push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn executing(&self, stmt: &mut Statement) {
        for hook in &self.hooks {
            hook.on_executing(stmt);
        }
    }

    pub fn executed(&self, stmt: &Statement, elapsed: Duration) {
        for hook in &self.hooks {
            hook.on_executed(stmt, elapsed);
        }
    }
}

/// Logs each executed statement; installed when `log_sql` is set.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlLogger;

impl Aop for SqlLogger {
    fn on_executed(&self, stmt: &Statement, elapsed: Duration) {
        tracing::info!("{} [{} params] in {:?}", stmt.sql, stmt.params.len(), elapsed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Value;
    use crate::transpiler::Params;

    struct Tagger;

    impl Aop for Tagger {
        fn on_executing(&self, stmt: &mut Statement) {
            stmt.sql = format!("/* app */ {}", stmt.sql);
            stmt.params.add("tenant", Value::Int(1));
        }
    }

    #[test]
    fn test_hooks_run_in_order() {
        let mut chain = AopChain::new();
        chain.push(Arc::new(Tagger));
        chain.push(Arc::new(SqlLogger));
        let mut stmt = Statement::new("SELECT 1", Params::new());
        chain.executing(&mut stmt);
        chain.executed(&stmt, Duration::from_millis(1));
        assert_eq!(stmt.sql, "/* app */ SELECT 1");
        assert!(stmt.params.contains("tenant"));
        assert_eq!(chain.len(), 2);
    }
}
