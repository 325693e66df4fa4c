#![allow(dead_code)]
use assert_cmd::Command;
use image::{ImageBuffer, Rgba, RgbaImage};
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestEnv {
    dir: TempDir,
    pub db: PathBuf,
    pub cfg: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = dir.path().join("config");
        std::fs::create_dir_all(&cfg).expect("cfg dir");
        let db = dir.path().join("clipjar.db");
        Self { dir, db, cfg }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// The binary with an isolated config dir and database.
    pub fn bin(&self) -> Command {
        let mut cmd = Command::cargo_bin("clipjar").unwrap();
        cmd.env("XDG_CONFIG_HOME", &self.cfg)
            .env_remove("CLIPJAR_LOG")
            .env_remove("RUST_LOG");
        cmd.arg("--store").arg("sqlite").arg("--db").arg(&self.db);
        cmd
    }

    pub fn write_settings(&self, toml: &str) {
        let dir = self.cfg.join("clipjar");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("settings.toml"), toml).unwrap();
    }

    pub fn write_tiny_png(&self, name: &str) -> PathBuf {
        let path = self.path(name);
        let mut img: RgbaImage = ImageBuffer::new(2, 2);
        for p in img.pixels_mut() {
            *p = Rgba([0, 255, 0, 255]);
        }
        img.save(&path).unwrap();
        path
    }

    /// Adds a text clip and returns its id.
    pub fn add(&self, text: &str, tags: Option<&str>) -> i64 {
        let mut cmd = self.bin();
        cmd.arg("add").arg(text);
        if let Some(t) = tags {
            cmd.args(["--tags", t]);
        }
        let out = cmd.assert().success().get_output().stdout.clone();
        String::from_utf8(out)
            .unwrap()
            .trim()
            .trim_start_matches("added ")
            .parse()
            .unwrap()
    }

    pub fn list_json(&self, extra: &[&str]) -> Vec<serde_json::Value> {
        let out = self
            .bin()
            .args(["list", "--json"])
            .args(extra)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
        v.as_array().unwrap().clone()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
