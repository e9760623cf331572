//! Statement execution.
//!
//! Statement building never touches a database; an [`Executor`] receives
//! the finished `(sql, params)` pair. [`SqlxExecutor`] runs statements
//! against MySQL through sqlx.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};
use sqlx::mysql::{MySqlArguments, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, MySql, Row as _, TypeInfo};

use crate::ast::Value;
use crate::error::{ForgeError, ForgeResult};
use crate::transpiler::{NAVIGATION_SEPARATOR, Params, Statement};

/// One result row, column name → value.
pub type Row = Map<String, JsonValue>;

/// Runs finished statements.
pub trait Executor: Send + Sync {
    /// Rows of the last statement in `stmt.sql`.
    fn query(&self, stmt: &Statement) -> impl Future<Output = ForgeResult<Vec<Row>>> + Send;

    /// First column of the first row, `Null` when there is none.
    fn scalar(&self, stmt: &Statement) -> impl Future<Output = ForgeResult<JsonValue>> + Send;

    /// Affected row count.
    fn execute(&self, stmt: &Statement) -> impl Future<Output = ForgeResult<u64>> + Send;
}

/// Fold `nav__field` columns into nested objects.
///
/// A navigation whose columns are all NULL (unmatched left join) becomes
/// `null` rather than an object of nulls.
pub fn nest_row(row: Row) -> JsonValue {
    let mut out = Map::with_capacity(row.len());
    let mut nested: Vec<(String, Map<String, JsonValue>)> = Vec::new();

    for (key, value) in row {
        match key.split_once(NAVIGATION_SEPARATOR) {
            Some((nav, field)) => {
                let idx = match nested.iter().position(|(n, _)| n == nav) {
                    Some(i) => i,
                    None => {
                        nested.push((nav.to_string(), Map::new()));
                        nested.len() - 1
                    }
                };
                nested[idx].1.insert(field.to_string(), value);
            }
            None => {
                out.insert(key, value);
            }
        }
    }

    for (nav, fields) in nested {
        let value = if fields.values().all(JsonValue::is_null) {
            JsonValue::Null
        } else {
            JsonValue::Object(fields)
        };
        out.insert(nav, value);
    }
    JsonValue::Object(out)
}

/// Deserialize a row, materializing navigations first.
pub fn from_row<T: DeserializeOwned>(row: Row) -> ForgeResult<T> {
    Ok(serde_json::from_value(nest_row(row))?)
}

/// MySQL executor over a sqlx pool.
#[derive(Clone)]
pub struct SqlxExecutor {
    pool: MySqlPool,
}

impl SqlxExecutor {
    pub async fn connect(url: &str) -> ForgeResult<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| ForgeError::Database(e.to_string()))?;
        Ok(Self { pool })
    }

    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Run every statement but the last; returns the last, rewritten, with its arguments.
    async fn run_leading(
        conn: &mut sqlx::MySqlConnection,
        stmt: &Statement,
    ) -> ForgeResult<(String, Vec<Value>)> {
        let mut parts = split_statements(&stmt.sql);
        let last = parts.pop().ok_or(ForgeError::MissingArgument("statement text"))?;
        for part in parts {
            let (sql, args) = positional(part, &stmt.params)?;
            bind_all(sqlx::query(&sql), &args)
                .execute(&mut *conn)
                .await
                .map_err(|e| ForgeError::Execution(e.to_string()))?;
        }
        positional(last, &stmt.params)
    }
}

impl Executor for SqlxExecutor {
    async fn query(&self, stmt: &Statement) -> ForgeResult<Vec<Row>> {
        let mut conn = self.pool.acquire().await?;
        let (sql, args) = Self::run_leading(&mut conn, stmt).await?;
        let rows = bind_all(sqlx::query(&sql), &args)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| ForgeError::Execution(e.to_string()))?;
        Ok(rows.iter().map(row_to_map).collect())
    }

    async fn scalar(&self, stmt: &Statement) -> ForgeResult<JsonValue> {
        let mut conn = self.pool.acquire().await?;
        let (sql, args) = Self::run_leading(&mut conn, stmt).await?;
        let row = bind_all(sqlx::query(&sql), &args)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| ForgeError::Execution(e.to_string()))?;
        Ok(row
            .filter(|r| !r.columns().is_empty())
            .map(|r| column_value(&r, 0))
            .unwrap_or(JsonValue::Null))
    }

    async fn execute(&self, stmt: &Statement) -> ForgeResult<u64> {
        let mut conn = self.pool.acquire().await?;
        let mut affected = 0;
        for part in split_statements(&stmt.sql) {
            let (sql, args) = positional(part, &stmt.params)?;
            let result = bind_all(sqlx::query(&sql), &args)
                .execute(&mut *conn)
                .await
                .map_err(|e| ForgeError::Execution(e.to_string()))?;
            affected += result.rows_affected();
        }
        Ok(affected)
    }
}

/// Split on `;`, dropping empty statements.
fn split_statements(sql: &str) -> Vec<&str> {
    sql.split(';').map(str::trim).filter(|s| !s.is_empty()).collect()
}

/// Rewrite `@name` placeholders into `?` and collect their values in order
/// of appearance. `@@name` system variables are left alone.
fn positional(sql: &str, params: &Params) -> ForgeResult<(String, Vec<Value>)> {
    let mut out = String::with_capacity(sql.len());
    let mut args = Vec::new();
    let mut chars = sql.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c != '@' {
            out.push(c);
            continue;
        }
        if let Some(&(_, '@')) = chars.peek() {
            out.push_str("@@");
            chars.next();
            continue;
        }
        let start = i + 1;
        let mut end = start;
        while let Some(&(j, n)) = chars.peek() {
            if n.is_ascii_alphanumeric() || n == '_' {
                end = j + n.len_utf8();
                chars.next();
            } else {
                break;
            }
        }
        let name = &sql[start..end];
        if name.is_empty() {
            out.push('@');
            continue;
        }
        let value = params
            .get(name)
            .ok_or_else(|| ForgeError::Execution(format!("no value bound for parameter '{}'", name)))?;
        args.push(value.clone());
        out.push('?');
    }
    Ok((out, args))
}

fn bind_all<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    args: &[Value],
) -> Query<'q, MySql, MySqlArguments> {
    for arg in args {
        query = match arg.clone() {
            Value::Null => query.bind(None::<String>),
            Value::Bool(v) => query.bind(v),
            Value::Int(v) => query.bind(v),
            Value::UInt(v) => query.bind(v),
            Value::Float(v) => query.bind(v),
            Value::String(v) => query.bind(v),
            Value::Uuid(v) => query.bind(v.to_string()),
            Value::DateTime(v) => query.bind(v),
        };
    }
    query
}

fn row_to_map(row: &MySqlRow) -> Row {
    let mut map = Map::new();
    for (i, column) in row.columns().iter().enumerate() {
        map.insert(column.name().to_string(), column_value(row, i));
    }
    map
}

fn column_value(row: &MySqlRow, i: usize) -> JsonValue {
    let type_name = row.columns()[i].type_info().name();
    match type_name {
        "BOOLEAN" => row
            .try_get::<Option<bool>, _>(i)
            .ok()
            .flatten()
            .map(JsonValue::Bool)
            .unwrap_or(JsonValue::Null),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => row
            .try_get::<Option<i64>, _>(i)
            .ok()
            .flatten()
            .map(JsonValue::from)
            .unwrap_or(JsonValue::Null),
        t if t.ends_with("UNSIGNED") => row
            .try_get::<Option<u64>, _>(i)
            .ok()
            .flatten()
            .map(JsonValue::from)
            .unwrap_or(JsonValue::Null),
        "FLOAT" | "DOUBLE" => row
            .try_get::<Option<f64>, _>(i)
            .ok()
            .flatten()
            .and_then(serde_json::Number::from_f64)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        // SUM over integers comes back as DECIMAL text
        "DECIMAL" => row
            .try_get_unchecked::<Option<String>, _>(i)
            .ok()
            .flatten()
            .map(|s| decimal_to_json(&s))
            .unwrap_or(JsonValue::Null),
        "DATETIME" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(i)
            .ok()
            .flatten()
            .map(|v| JsonValue::String(v.to_string()))
            .unwrap_or(JsonValue::Null),
        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(i)
            .ok()
            .flatten()
            .map(|v| JsonValue::String(v.to_string()))
            .unwrap_or(JsonValue::Null),
        "TIMESTAMP" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(i)
            .ok()
            .flatten()
            .map(|v| JsonValue::String(v.to_rfc3339()))
            .unwrap_or(JsonValue::Null),
        _ => row
            .try_get_unchecked::<Option<String>, _>(i)
            .ok()
            .flatten()
            .map(JsonValue::String)
            .unwrap_or(JsonValue::Null),
    }
}

fn decimal_to_json(s: &str) -> JsonValue {
    if let Ok(n) = s.parse::<i64>() {
        return JsonValue::from(n);
    }
    s.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(s.to_string()))
}
