//! Oracle statement shapes.

use pretty_assertions::assert_eq;

use super::fixtures::*;
use crate::ast::*;
use crate::transpiler::{Dialect, Direction, SqlProvider};

const USER_SELECT: &str = "SELECT users.\"id\", users.\"user_name\" AS \"name\", users.\"age\", users.\"dept_id\" \
                           FROM \"users\" users WHERE 1=1";

fn provider() -> Box<dyn SqlProvider> {
    Dialect::Oracle.provider()
}

#[test]
fn test_get_wraps_rownum() {
    let mut p = provider();
    p.format_get(&user_set()).unwrap();
    assert_eq!(
        p.sql_string(),
        format!("SELECT T.* FROM ({}) T WHERE ROWNUM<=1", USER_SELECT)
    );
}

#[test]
fn test_to_list_top_wraps_rownum() {
    let mut set = user_set();
    set.top = Some(3);

    let mut p = provider();
    p.format_to_list(&set).unwrap();
    assert_eq!(
        p.sql_string(),
        format!("SELECT T.* FROM ({}) T WHERE ROWNUM<=3", USER_SELECT)
    );

    let mut p = provider();
    p.format_to_list(&user_set()).unwrap();
    assert_eq!(p.sql_string(), USER_SELECT);
}

#[test]
fn test_page_list_rownums_between() {
    let mut p = provider();
    p.format_to_page_list(&user_set(), 2, 10).unwrap();
    assert_eq!(
        p.sql_string(),
        format!(
            "SELECT T2.* FROM (SELECT T.*,ROWNUM ROWNUMS FROM ({}) T) T2 WHERE ROWNUMS BETWEEN 11 AND 20",
            USER_SELECT
        )
    );
}

#[test]
fn test_colon_placeholders() {
    let mut set = user_set();
    set.filters.push(col::<User>("age").between(18, 65));

    let mut p = provider();
    p.format_count(&set).unwrap();
    assert_eq!(
        p.sql_string(),
        "SELECT COUNT(1) FROM \"users\" users WHERE 1=1 AND users.\"age\" BETWEEN :age AND :age_1"
    );
}

#[test]
fn test_exists_adds_rownum_predicate() {
    let mut set = user_set();
    set.filters.push(col::<User>("id").in_list([1, 2]));

    let mut p = provider();
    p.format_exists(&set).unwrap();
    assert_eq!(
        p.sql_string(),
        "SELECT 1 FROM \"users\" users WHERE 1=1 AND users.\"id\" IN (:id, :id_1) AND ROWNUM<=1"
    );
}

#[test]
fn test_insert_identity_returning_into() {
    let mut p = provider();
    p.format_insert_identity(&user_set(), &ann_record(), &[]).unwrap();
    assert_eq!(
        p.sql_string(),
        "INSERT INTO \"users\" (\"user_name\", \"age\", \"dept_id\") VALUES (:name, :age, :dept_id) \
         RETURNING \"id\" INTO :out_id"
    );
    let out = p.params().iter().find(|x| x.name == "out_id").unwrap();
    assert_eq!(out.direction, Direction::Output);
}

#[test]
fn test_update_select_returning_into() {
    let mut set = user_set();
    set.filters.push(col::<User>("id").eq(7));
    set.select = Some(init::<User>().set("age", col::<User>("age")).set("name", col::<User>("name")).into());
    let updator: Expr = init::<User>().set("age", 31).into();

    let mut p = provider();
    p.format_update_select(&set, &updator).unwrap();
    assert_eq!(
        p.sql_string(),
        "UPDATE \"users\" SET \"age\" = :age WHERE 1=1 AND \"id\" = :id \
         RETURNING \"age\", \"user_name\" INTO :out_age, :out_name"
    );
    assert_eq!(p.params().len(), 4);
}

#[test]
fn test_double_quote_in_names_is_doubled() {
    let mut p = provider();
    p.format_to_list(&crate::set::SetState::of::<Odd>()).unwrap();
    assert_eq!(
        p.sql_string(),
        "SELECT we_ird.\"i\"\"d\" AS \"id\" FROM \"we`ird\" we_ird WHERE 1=1"
    );
}
