// CLI integration tests for the table lifecycle flows.
use std::process::Command;

use serde_json::Value;

fn cmd() -> Command {
    let exe = env!("CARGO_BIN_EXE_tabulite");
    Command::new(exe)
}

fn parse_json(value: &str) -> Value {
    serde_json::from_str(value).expect("valid json")
}

fn json_lines(output: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(output)
        .lines()
        .map(parse_json)
        .collect()
}

#[test]
fn create_insert_update_rows_flow() {
    let temp = tempfile::tempdir().expect("tempdir");
    let dir = temp.path().join("tables");
    let dir = dir.to_str().unwrap();

    let create = cmd()
        .args(["--dir", dir, "create", "users"])
        .output()
        .expect("create");
    assert!(create.status.success());
    let created = parse_json(std::str::from_utf8(&create.stdout).expect("utf8"));
    assert_eq!(created["created"]["table"], "users");
    assert!(
        created["created"]["path"]
            .as_str()
            .unwrap()
            .ends_with("users.json")
    );

    let insert = cmd()
        .args([
            "--dir",
            dir,
            "insert",
            "users",
            "--row",
            r#"{"id":1,"score":50}"#,
            "--row",
            r#"{"id":2,"score":50}"#,
        ])
        .output()
        .expect("insert");
    assert!(insert.status.success());
    let inserted = parse_json(std::str::from_utf8(&insert.stdout).expect("utf8"));
    assert_eq!(inserted["inserted"], 2);

    let update = cmd()
        .args([
            "--dir", dir, "update", "users", "score", "50", "--set", r#"{"score":100}"#,
        ])
        .output()
        .expect("update");
    assert!(update.status.success());
    let updated = parse_json(std::str::from_utf8(&update.stdout).expect("utf8"));
    assert_eq!(updated["updated"], 2);

    let rows = cmd()
        .args(["--dir", dir, "rows", "users"])
        .output()
        .expect("rows");
    assert!(rows.status.success());
    let lines = json_lines(&rows.stdout);
    assert_eq!(lines.len(), 2);
    for line in &lines {
        assert_eq!(line["score"], 100);
    }

    let find = cmd()
        .args(["--dir", dir, "find", "users", "id", "1"])
        .output()
        .expect("find");
    assert!(find.status.success());
    let lines = json_lines(&find.stdout);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["id"], 1);

    let delete = cmd()
        .args(["--dir", dir, "delete", "users", "id", "2"])
        .output()
        .expect("delete");
    assert!(delete.status.success());
    let deleted = parse_json(std::str::from_utf8(&delete.stdout).expect("utf8"));
    assert_eq!(deleted["deleted"], 1);

    let list = cmd().args(["--dir", dir, "list"]).output().expect("list");
    let tables = parse_json(std::str::from_utf8(&list.stdout).expect("utf8"));
    assert_eq!(tables["tables"], serde_json::json!(["users"]));

    let drop = cmd()
        .args(["--dir", dir, "drop", "users"])
        .output()
        .expect("drop");
    let dropped = parse_json(std::str::from_utf8(&drop.stdout).expect("utf8"));
    assert_eq!(dropped["dropped"], true);

    let drop_again = cmd()
        .args(["--dir", dir, "drop", "users"])
        .output()
        .expect("drop again");
    assert!(drop_again.status.success());
    let dropped = parse_json(std::str::from_utf8(&drop_again.stdout).expect("utf8"));
    assert_eq!(dropped["dropped"], false);
}

#[test]
fn sort_persists_ordering() {
    let temp = tempfile::tempdir().expect("tempdir");
    let dir = temp.path().join("tables");
    let dir = dir.to_str().unwrap();

    let insert = cmd()
        .args([
            "--dir",
            dir,
            "insert",
            "scores",
            "--row",
            r#"{"id":2,"score":70}"#,
            "--row",
            r#"{"id":1,"score":90}"#,
        ])
        .output()
        .expect("insert");
    assert!(insert.status.success());

    let sort = cmd()
        .args(["--dir", dir, "sort", "scores", "score", "--reverse"])
        .output()
        .expect("sort");
    assert!(sort.status.success());
    let lines = json_lines(&sort.stdout);
    assert_eq!(lines[0]["id"], 1);

    let rows = cmd()
        .args(["--dir", dir, "rows", "scores"])
        .output()
        .expect("rows");
    let lines = json_lines(&rows.stdout);
    assert_eq!(lines[0]["id"], 1);
    assert_eq!(lines[1]["id"], 2);
}

#[test]
fn rename_and_order_columns_flow() {
    let temp = tempfile::tempdir().expect("tempdir");
    let dir = temp.path().join("tables");
    let dir = dir.to_str().unwrap();

    let insert = cmd()
        .args([
            "--dir",
            dir,
            "insert",
            "people",
            "--row",
            r#"{"name":"ada","age":36,"city":"london"}"#,
        ])
        .output()
        .expect("insert");
    assert!(insert.status.success());

    let rename = cmd()
        .args(["--dir", dir, "rename", "people", "city", "town"])
        .output()
        .expect("rename");
    let renamed = parse_json(std::str::from_utf8(&rename.stdout).expect("utf8"));
    assert_eq!(renamed["renamed"], true);

    let order = cmd()
        .args([
            "--dir",
            dir,
            "order-columns",
            "people",
            r#"["age","town","name"]"#,
        ])
        .output()
        .expect("order");
    assert!(order.status.success());
    let lines = json_lines(&order.stdout);
    let keys: Vec<&String> = lines[0].as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["age", "town", "name"]);
}

#[test]
fn usage_exit_code_for_bad_row_json() {
    let temp = tempfile::tempdir().expect("tempdir");
    let dir = temp.path().join("tables");

    let insert = cmd()
        .args([
            "--dir",
            dir.to_str().unwrap(),
            "insert",
            "users",
            "--row",
            "not json",
        ])
        .output()
        .expect("insert");
    assert_eq!(insert.status.code().unwrap(), 2);
    let err = parse_json(
        String::from_utf8_lossy(&insert.stderr)
            .lines()
            .last()
            .expect("stderr line"),
    );
    assert_eq!(err["error"]["kind"], "Usage");
}

#[test]
fn type_exit_code_for_mixed_sort() {
    let temp = tempfile::tempdir().expect("tempdir");
    let dir = temp.path().join("tables");
    let dir = dir.to_str().unwrap();

    let insert = cmd()
        .args([
            "--dir",
            dir,
            "insert",
            "mixed",
            "--row",
            r#"{"v":1}"#,
            "--row",
            r#"{"v":"one"}"#,
        ])
        .output()
        .expect("insert");
    assert!(insert.status.success());

    let sort = cmd()
        .args(["--dir", dir, "sort", "mixed", "v"])
        .output()
        .expect("sort");
    assert_eq!(sort.status.code().unwrap(), 4);
}

#[test]
fn corrupt_exit_code_for_unreadable_document() {
    let temp = tempfile::tempdir().expect("tempdir");
    let dir = temp.path().join("tables");
    std::fs::create_dir_all(&dir).expect("mkdir");
    std::fs::write(dir.join("broken.json"), "{ not json").expect("seed");

    let rows = cmd()
        .args(["--dir", dir.to_str().unwrap(), "rows", "broken"])
        .output()
        .expect("rows");
    assert_eq!(rows.status.code().unwrap(), 6);
}
