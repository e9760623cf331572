//! Behavior every dialect agrees on.

use std::collections::BTreeSet;
use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::fixtures::*;
use crate::ast::*;
use crate::error::ForgeError;
use crate::metadata::{EntityCache, EntityRecord, EntityType};
use crate::set::SetState;
use crate::transpiler::{Dialect, SqlProvider};

const DIALECTS: [Dialect; 3] = [Dialect::MySql, Dialect::SqlServer, Dialect::Oracle];

fn assert_placeholders_match(p: &dyn SqlProvider) {
    let prefix = p.dialect().option().param_prefix;
    let in_sql: BTreeSet<String> = placeholders(p.sql_string(), prefix).into_iter().collect();
    let in_bag: BTreeSet<String> = p.params().names().into_iter().map(str::to_string).collect();
    assert_eq!(in_sql, in_bag, "{}", p.sql_string());
}

#[test]
fn test_where_defaults_to_one_eq_one() {
    for d in DIALECTS {
        let mut p = d.provider();
        p.format_to_list(&user_set()).unwrap();
        assert!(p.sql_string().contains("WHERE 1=1"), "{}", p.sql_string());
        assert_eq!(p.sql_string().matches("WHERE").count(), 1);
    }
}

#[test]
fn test_placeholders_match_bag() {
    let mut set = user_set();
    set.filters.push(col::<User>("age").between(18, 65));
    set.filters.push(col::<User>("id").in_list([1, 2, 3]));
    set.filters.push(col::<User>("name").starts_with("a").or(col::<User>("age").eq(0)));
    let updator: Expr = init::<User>()
        .set("age", col::<User>("age").add(1))
        .set("name", "x")
        .into();

    for d in DIALECTS {
        let mut p = d.provider();
        p.format_to_page_list(&set, 2, 10).unwrap();
        assert_placeholders_match(p.as_ref());

        let mut p = d.provider();
        p.format_update_select(&set, &updator).unwrap();
        assert_placeholders_match(p.as_ref());

        let mut p = d.provider();
        p.format_insert_identity(&user_set(), &ann_record(), &[]).unwrap();
        assert_placeholders_match(p.as_ref());

        let mut p = d.provider();
        p.format_update_entity(&set, &ann_record(), &[], false).unwrap();
        assert_placeholders_match(p.as_ref());
    }
}

#[test]
fn test_identity_system_variable_is_not_a_placeholder() {
    assert_eq!(placeholders("INSERT ... (@name);SELECT @@IDENTITY", '@'), vec!["name"]);
}

#[test]
fn test_update_entity_injects_key_unless_batch() {
    for d in DIALECTS {
        let mut p = d.provider();
        p.format_update_entity(&user_set(), &ann_record(), &[], false).unwrap();
        let key_pred = format!(
            "WHERE 1=1 AND {} = {}",
            d.option().combine_field_name("id"),
            d.option().placeholder("id")
        );
        assert!(p.sql_string().ends_with(&key_pred), "{}", p.sql_string());

        let mut p = d.provider();
        p.format_update_entity(&user_set(), &ann_record(), &[], true).unwrap();
        assert!(p.sql_string().ends_with("WHERE 1=1"), "{}", p.sql_string());
        assert!(!p.params().contains("id"));
    }
}

#[test]
fn test_update_entity_without_key_fails() {
    let log = Log {
        ts: 1,
        message: "boot".to_string(),
    };
    let record = EntityRecord::of(&log).unwrap();
    for d in DIALECTS {
        let mut p = d.provider();
        let err = p
            .format_update_entity(&SetState::of::<Log>(), &record, &["ts"], false)
            .unwrap_err();
        assert!(matches!(err, ForgeError::MissingPrimaryKey(_)));
    }
}

#[test]
fn test_update_entity_with_null_key_fails() {
    let dept = Dept {
        id: None,
        name: "ops".to_string(),
    };
    let record = EntityRecord::of(&dept).unwrap();
    let mut p = Dialect::MySql.provider();
    let err = p
        .format_update_entity(&SetState::of::<Dept>(), &record, &[], false)
        .unwrap_err();
    assert!(matches!(err, ForgeError::MissingArgument("primary key value")));
}

#[test]
fn test_sum_wrapping_per_dialect() {
    let age = col::<User>("age");
    let expected = [
        (Dialect::MySql, "SELECT IFNULL(SUM(users.`age`),0)"),
        (Dialect::SqlServer, "SELECT SUM(users.[age])"),
        (Dialect::Oracle, "SELECT SUM(users.\"age\")"),
    ];
    for (d, head) in expected {
        let mut p = d.provider();
        p.format_sum(&user_set(), Some(&age)).unwrap();
        assert!(p.sql_string().starts_with(head), "{}", p.sql_string());
    }
}

#[test]
fn test_oracle_page_bounds() {
    let mut p = Dialect::Oracle.provider();
    p.format_to_page_list(&user_set(), 2, 10).unwrap();
    assert!(p.sql_string().ends_with("ROWNUMS BETWEEN 11 AND 20"));

    let mut p = p.create_new();
    p.format_to_page_list(&user_set(), 1, 10).unwrap();
    assert!(p.sql_string().ends_with("ROWNUMS BETWEEN 1 AND 10"));
}

#[test]
fn test_invalid_paging() {
    for d in DIALECTS {
        let err = d.provider().format_to_page_list(&user_set(), 0, 10).unwrap_err();
        assert!(matches!(err, ForgeError::InvalidPaging { page_index: 0, page_size: 10 }));
    }
}

#[test]
fn test_member_init_aggregate_leaves_provider_unchanged() {
    let selector: Expr = init::<User>().set("age", col::<User>("age")).into();
    for d in DIALECTS {
        let mut p = d.provider();
        p.format_count(&user_set()).unwrap();
        let before = (p.sql_string().to_string(), p.params().clone());

        let err = p.format_sum(&user_set(), Some(&selector)).unwrap_err();
        assert!(matches!(
            err,
            ForgeError::UnsupportedExpression {
                kind: "member-init",
                ..
            }
        ));
        assert_eq!((p.sql_string().to_string(), p.params().clone()), before);
    }
}

#[test]
fn test_aggregate_requires_selector() {
    let err = Dialect::SqlServer
        .provider()
        .format_max(&user_set(), None)
        .unwrap_err();
    assert!(matches!(err, ForgeError::MissingArgument("aggregate selector")));
}

#[test]
fn test_failed_filter_keeps_previous_statement() {
    let mut bad = user_set();
    bad.filters.push(col::<User>("nickname").eq("x"));
    for d in DIALECTS {
        let mut p = d.provider();
        p.format_get(&user_set()).unwrap();
        let before = p.sql_string().to_string();
        assert!(p.format_to_list(&bad).is_err());
        assert_eq!(p.sql_string(), before);
    }
}

#[test]
fn test_insert_and_delete_never_alias() {
    let mut set = user_set();
    set.filters.push(col::<User>("age").gt(1));
    for d in DIALECTS {
        let mut p = d.provider();
        p.format_delete(&set).unwrap();
        assert!(!p.sql_string().contains("users."), "{}", p.sql_string());

        let mut p = d.provider();
        p.format_insert(&user_set(), &ann_record(), &[]).unwrap();
        assert!(!p.sql_string().contains("users."), "{}", p.sql_string());
    }
}

#[test]
fn test_concurrent_first_lookup_builds_once() {
    let cache = Arc::new(EntityCache::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || cache.query(&EntityType::of::<Employee>()).unwrap())
        })
        .collect();
    let entities: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(entities.iter().all(|e| Arc::ptr_eq(e, &entities[0])));
    assert_eq!(cache.len(), 1);
}
