mod common;
use common::TestEnv;
use predicates::prelude::*;

#[test]
fn mixed_drop_saves_supported_files_and_reports_the_rest() {
    let t = TestEnv::new();
    let png = t.write_tiny_png("pic.png");
    let md = t.path("readme.md");
    std::fs::write(&md, "# title").unwrap();
    let zip = t.path("bundle.zip");
    std::fs::write(&zip, b"PK\x03\x04").unwrap();

    t.bin()
        .arg("drop")
        .arg(&png)
        .arg(&zip)
        .arg(&md)
        .args(["--tags", "inbox"])
        .assert()
        .success()
        .stderr(predicate::str::contains("bundle.zip"))
        .stderr(predicate::str::contains("unsupported file type"));

    let items = t.list_json(&["--sort", "oldest"]);
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["type"], "image");
    assert_eq!(items[0]["tags"], serde_json::json!(["file", "image", "inbox"]));
    assert_eq!(items[1]["type"], "text");
    assert_eq!(items[1]["content"], "# title");
    assert_eq!(items[1]["mimeType"], "text/markdown");
    assert_eq!(items[1]["tags"], serde_json::json!(["file", "text", "inbox"]));
}

#[test]
fn drop_fails_when_nothing_was_added() {
    let t = TestEnv::new();
    let zip = t.path("bundle.zip");
    std::fs::write(&zip, b"PK\x03\x04").unwrap();
    t.bin()
        .arg("drop")
        .arg(&zip)
        .arg(t.path("missing.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no files were added"));
    assert!(t.list_json(&[]).is_empty());
}
