//! Sets driven against a recording executor.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use sqlforge::prelude::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Team {
    id: i64,
    title: String,
}

impl Entity for Team {
    fn describe() -> EntityDescriptor {
        EntityDescriptor::table("teams").field("id").column("title", "team_title").key("id")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Player {
    id: i64,
    name: String,
    score: i32,
    team_id: Option<i64>,
    #[serde(default, skip_serializing)]
    team: Option<Team>,
}

impl Entity for Player {
    fn describe() -> EntityDescriptor {
        EntityDescriptor::table("players")
            .as_name("p")
            .field("id")
            .field("name")
            .field("score")
            .field("team_id")
            .key("id")
            .identity("id")
            .navigation(Navigation::left::<Team>(
                "team",
                col::<Player>("team_id").eq(col::<Team>("id")),
            ))
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn player(id: i64, name: &str, score: i32) -> Player {
    Player {
        id,
        name: name.to_string(),
        score,
        team_id: None,
        team: None,
    }
}

/// Records every statement; answers from queued rows and a fixed scalar.
#[derive(Default)]
struct Recorder {
    log: Mutex<Vec<Statement>>,
    rows: Mutex<VecDeque<Vec<Row>>>,
    scalar: Mutex<JsonValue>,
}

impl Recorder {
    fn with_rows(rows: Vec<JsonValue>) -> Self {
        let rec = Recorder::default();
        rec.push_rows(rows);
        rec
    }

    fn push_rows(&self, rows: Vec<JsonValue>) {
        let rows = rows
            .into_iter()
            .map(|r| match r {
                JsonValue::Object(map) => map,
                other => panic!("row must be an object: {}", other),
            })
            .collect();
        self.rows.lock().unwrap().push_back(rows);
    }

    fn sql(&self) -> Vec<String> {
        self.log.lock().unwrap().iter().map(|s| s.sql.clone()).collect()
    }
}

impl Executor for Recorder {
    async fn query(&self, stmt: &Statement) -> ForgeResult<Vec<Row>> {
        self.log.lock().unwrap().push(stmt.clone());
        Ok(self.rows.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn scalar(&self, stmt: &Statement) -> ForgeResult<JsonValue> {
        self.log.lock().unwrap().push(stmt.clone());
        Ok(self.scalar.lock().unwrap().clone())
    }

    async fn execute(&self, stmt: &Statement) -> ForgeResult<u64> {
        self.log.lock().unwrap().push(stmt.clone());
        Ok(1)
    }
}

#[tokio::test]
async fn test_to_list_materializes_navigation() {
    let db = Database::new(
        Recorder::with_rows(vec![
            json!({"id": 1, "name": "ann", "score": 10, "team_id": 3, "team__id": 3, "team__title": "red"}),
            json!({"id": 2, "name": "bob", "score": 4, "team_id": null, "team__id": null, "team__title": null}),
        ]),
        Dialect::MySql,
    );

    let players = db
        .query_set::<Player>()
        .filter(col::<Player>("score").gt(1))
        .to_list()
        .await
        .unwrap();

    assert_eq!(players.len(), 2);
    assert_eq!(
        players[0].team,
        Some(Team {
            id: 3,
            title: "red".to_string()
        })
    );
    assert_eq!(players[1].team, None);
    assert_eq!(
        db.executor().sql(),
        vec![
            "SELECT p.`id`, p.`name`, p.`score`, p.`team_id`, teams.`id` AS `team__id`, \
             teams.`team_title` AS `team__title` FROM `players` p \
             LEFT JOIN `teams` teams ON p.`team_id` = teams.`id` WHERE 1=1 AND p.`score` > @score"
        ]
    );
}

#[tokio::test]
async fn test_page_list_counts_then_pages() {
    let rec = Recorder::with_rows(vec![json!({"id": 3, "name": "cy", "score": 1, "team_id": null})]);
    *rec.scalar.lock().unwrap() = json!(21);
    let db = Database::new(rec, Dialect::Oracle);

    let page = db
        .query_set::<Player>()
        .order_by(col::<Player>("id"))
        .page_list(3, 10)
        .await
        .unwrap();

    assert_eq!(page.total, 21);
    assert_eq!(page.total_pages(), 3);
    assert!(!page.has_next());
    assert_eq!(page.items, vec![player(3, "cy", 1)]);

    let sql = db.executor().sql();
    assert!(sql[0].starts_with("SELECT COUNT(1) FROM \"players\" p"));
    assert!(sql[1].ends_with("ROWNUMS BETWEEN 21 AND 30"));
}

#[tokio::test]
async fn test_update_many_uses_key_per_entity() {
    let db = Database::new(Recorder::default(), Dialect::SqlServer);
    let affected = db
        .command_set::<Player>()
        .exclude(&["team_id"])
        .update_many(&[player(1, "ann", 5), player(2, "bob", 6)])
        .await
        .unwrap();

    assert_eq!(affected, 2);
    let log = db.executor().log.lock().unwrap().clone();
    assert_eq!(
        log[0].sql,
        "UPDATE [players] SET [name] = @name, [score] = @score WHERE 1=1 AND [id] = @id"
    );
    assert_eq!(log[1].params.get("id"), Some(&Value::Int(2)));
}

#[tokio::test]
async fn test_build_errors_never_reach_executor() {
    let db = Database::new(Recorder::default(), Dialect::MySql);

    let err = db
        .query_set::<Player>()
        .sum::<i64>(init::<Player>().set("score", col::<Player>("score")).into())
        .await
        .unwrap_err();
    assert!(matches!(err, ForgeError::UnsupportedExpression { .. }));

    let err = db
        .query_set::<Player>()
        .page_list(0, 10)
        .await
        .unwrap_err();
    assert!(matches!(err, ForgeError::InvalidPaging { .. }));

    assert!(db.executor().sql().is_empty());
}

#[tokio::test]
async fn test_sum_and_exists() {
    let rec = Recorder::with_rows(vec![json!({"1": 1})]);
    *rec.scalar.lock().unwrap() = json!(42);
    let db = Database::new(rec, Dialect::MySql);
    let players = db.query_set::<Player>().filter(col::<Player>("name").starts_with("a"));

    let total: i64 = players.sum(col::<Player>("score")).await.unwrap();
    assert_eq!(total, 42);
    assert!(players.exists().await.unwrap());

    let sql = db.executor().sql();
    assert!(sql[0].starts_with("SELECT IFNULL(SUM(p.`score`),0) FROM `players` p"));
    assert!(sql[1].ends_with("AND p.`name` LIKE @name LIMIT 1"));
}

#[tokio::test]
async fn test_insert_identity_and_delete() {
    let rec = Recorder::default();
    *rec.scalar.lock().unwrap() = json!(99);
    let db = Database::new(rec, Dialect::MySql);
    let players = db.command_set::<Player>();

    let id = players.insert_identity(&player(0, "dee", 0)).await.unwrap();
    assert_eq!(id, json!(99));

    let deleted = players
        .filter(col::<Player>("score").lt(1))
        .delete()
        .await
        .unwrap();
    assert_eq!(deleted, 1);

    let sql = db.executor().sql();
    assert_eq!(
        sql[0],
        "INSERT INTO `players` (`name`, `score`, `team_id`) VALUES (@name, @score, @team_id);SELECT @@IDENTITY"
    );
    assert_eq!(sql[1], "DELETE FROM `players` WHERE 1=1 AND `score` < @score");
}

struct Comment;

impl Aop for Comment {
    fn on_executing(&self, stmt: &mut Statement) {
        stmt.sql = format!("/* sqlforge */ {}", stmt.sql);
    }
}

#[tokio::test]
async fn test_aop_rewrites_statement() {
    init_tracing();
    let db = Database::new(Recorder::default(), Dialect::MySql).with_aop(Comment);
    db.command_set::<Player>()
        .filter(col::<Player>("id").eq(1))
        .update_with(init::<Player>().set("score", 0).into())
        .await
        .unwrap();

    assert_eq!(
        db.executor().sql(),
        vec!["/* sqlforge */ UPDATE `players` SET `score` = @score WHERE 1=1 AND `id` = @id"]
    );
}

#[tokio::test]
async fn test_config_no_lock_applies_to_reads() {
    init_tracing();
    let config = ForgeConfig::parse("dialect = \"sqlserver\"\nno_lock = true\nlog_sql = true").unwrap();
    let db = Database::from_config(Recorder::default(), &config);

    let stmt = db.query_set::<Team>().build_count().unwrap();
    assert_eq!(stmt.sql, "SELECT COUNT(1) FROM [teams] teams WITH(NOLOCK) WHERE 1=1");
    assert!(db.executor().sql().is_empty());
}

#[test]
fn test_build_previews_share_nothing() {
    let db = Database::new(Recorder::default(), Dialect::MySql);
    let set = db.query_set::<Team>().filter(col::<Team>("title").eq("red"));
    let a = set.build_to_list().unwrap();
    let b = set.build_to_list().unwrap();
    assert_eq!(a, b);
    assert_eq!(a.params.names(), vec!["title"]);
}

#[test]
fn test_shared_database_across_threads() {
    let db = Arc::new(Database::new(Recorder::default(), Dialect::Oracle));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let db = Arc::clone(&db);
            std::thread::spawn(move || {
                db.query_set::<Player>()
                    .filter(col::<Player>("id").eq(i))
                    .build_get()
                    .unwrap()
            })
        })
        .collect();
    for h in handles {
        let stmt = h.join().unwrap();
        assert!(stmt.sql.ends_with("T WHERE ROWNUM<=1"));
        assert_eq!(stmt.params.len(), 1);
    }
}
