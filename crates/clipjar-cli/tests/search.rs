mod common;
use common::TestEnv;

fn search(t: &TestEnv, args: &[&str]) -> Vec<serde_json::Value> {
    let out = t
        .bin()
        .arg("search")
        .args(args)
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    v.as_array().unwrap().clone()
}

#[test]
fn search_is_case_insensitive() {
    let t = TestEnv::new();
    t.add("Hello World", None);
    t.add("unrelated", None);
    let hits = search(&t, &["ELL"]);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["content"], "Hello World");
}

#[test]
fn tags_and_memo_are_searched() {
    let t = TestEnv::new();
    let tagged = t.add("body text", Some("project-x"));
    t.bin()
        .args(["add", "other body", "--memo", "Meeting notes"])
        .assert()
        .success();

    let hits = search(&t, &["ject"]);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["id"], tagged);

    let hits = search(&t, &["meeting"]);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["memo"], "Meeting notes");

    assert!(search(&t, &["nothing-like-this"]).is_empty());
}

#[test]
fn search_respects_kind() {
    let t = TestEnv::new();
    t.add("tiny text", None);
    let png = t.write_tiny_png("tiny.png");
    t.bin()
        .args(["add-image", "--tags", "tiny"])
        .arg(&png)
        .assert()
        .success();

    assert_eq!(search(&t, &["tiny"]).len(), 2);
    let images = search(&t, &["tiny", "--kind", "image"]);
    assert_eq!(images.len(), 1);
    assert_eq!(images[0]["type"], "image");
}
