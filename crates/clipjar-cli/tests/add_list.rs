mod common;
use common::TestEnv;
use predicates::prelude::*;

#[test]
fn hello_with_tags_lists_exactly_one_record() {
    let t = TestEnv::new();
    let id = t.add("hello", Some("a, b"));

    let items = t.list_json(&[]);
    assert_eq!(items.len(), 1);
    let clip = &items[0];
    assert_eq!(clip["id"], id);
    assert_eq!(clip["type"], "text");
    assert_eq!(clip["content"], "hello");
    assert_eq!(clip["tags"], serde_json::json!(["a", "b"]));
    assert!(clip.get("memo").is_none());
    assert_eq!(clip["createdAt"], clip["updatedAt"]);
}

#[test]
fn empty_content_is_rejected() {
    let t = TestEnv::new();
    t.add("keep", None);
    t.bin()
        .arg("add")
        .write_stdin("   \n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("must not be empty"));
    assert_eq!(t.list_json(&[]).len(), 1);
}

#[test]
fn empty_state_is_explicit() {
    let t = TestEnv::new();
    t.bin()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No clips found."));
    assert!(t.list_json(&[]).is_empty());

    t.add("only text", None);
    t.bin()
        .args(["list", "--kind", "image"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No clips found."));
}

#[test]
fn sort_flag_and_settings_order_the_list() {
    let t = TestEnv::new();
    let first = t.add("first", None);
    std::thread::sleep(std::time::Duration::from_millis(5));
    let second = t.add("second", None);

    let ids = |items: Vec<serde_json::Value>| -> Vec<i64> {
        items.iter().map(|c| c["id"].as_i64().unwrap()).collect()
    };
    assert_eq!(ids(t.list_json(&[])), vec![second, first]);
    assert_eq!(ids(t.list_json(&["--sort", "oldest"])), vec![first, second]);

    t.write_settings("[view]\nsort = \"oldest\"\n");
    assert_eq!(ids(t.list_json(&[])), vec![first, second]);
    assert_eq!(ids(t.list_json(&["--sort", "newest"])), vec![second, first]);
}

#[test]
fn plain_list_prints_tab_separated_cards() {
    let t = TestEnv::new();
    let id = t.add("line one\nline two", Some("x"));
    let out = t
        .bin()
        .arg("list")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let s = String::from_utf8(out).unwrap();
    let cols: Vec<&str> = s.trim_end().split('\t').collect();
    assert_eq!(cols.len(), 5);
    assert_eq!(cols[0], id.to_string());
    assert_eq!(cols[1], "text");
    assert_eq!(cols[3], "x");
    assert_eq!(cols[4], "line one line two");
}

#[test]
fn repeated_user_tags_keep_their_order() {
    let t = TestEnv::new();
    t.add("dupes", Some("a, b, a"));
    let items = t.list_json(&[]);
    assert_eq!(items[0]["tags"], serde_json::json!(["a", "b", "a"]));
}
