mod common;
use common::TestEnv;
use predicates::prelude::*;

#[test]
fn declined_prompt_keeps_the_clip() {
    let t = TestEnv::new();
    let id = t.add("precious", None);
    t.bin()
        .args(["delete", &id.to_string()])
        .write_stdin("n\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("[y/N]"))
        .stdout(predicate::str::contains(format!("kept {}", id)));
    assert_eq!(t.list_json(&[]).len(), 1);
}

#[test]
fn confirmed_delete_removes_only_that_clip() {
    let t = TestEnv::new();
    let one = t.add("one", None);
    let two = t.add("two", None);
    t.bin()
        .args(["delete", &one.to_string()])
        .write_stdin("y\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("deleted {}", one)));
    let items = t.list_json(&[]);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], two);

    t.bin()
        .args(["delete", &two.to_string(), "--yes"])
        .assert()
        .success();
    assert!(t.list_json(&[]).is_empty());
}

#[test]
fn deleting_a_missing_id_is_a_no_op() {
    let t = TestEnv::new();
    t.add("stays", None);
    t.bin()
        .args(["delete", "999", "--yes"])
        .assert()
        .success()
        .stderr(predicate::str::contains("not found"));
    assert_eq!(t.list_json(&[]).len(), 1);
}

#[test]
fn ids_are_not_reused_after_delete() {
    let t = TestEnv::new();
    let a = t.add("a", None);
    t.bin().args(["delete", &a.to_string(), "-y"]).assert().success();
    let b = t.add("b", None);
    assert!(b > a);
}
