use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::{fs, process::Command};
use tempfile::tempdir;

fn schemashare() -> Command {
    let mut cmd = Command::cargo_bin("schemashare").unwrap();
    cmd.env_remove("SCHEMASHARE__STORAGE__PROVIDER")
        .env_remove("SCHEMASHARE__STORAGE__TABLE")
        .env_remove("SCHEMASHARE__STORAGE__PATH");
    cmd
}

#[test]
fn save_then_get_with_embedded_store() {
    let tmp = tempdir().unwrap();
    let schema = tmp.path().join("schema.json");
    let doc = tmp.path().join("doc.json");
    fs::write(&schema, "{\"type\":\"object\"}").unwrap();
    fs::write(&doc, "{\"a\":1}").unwrap();
    let store = tmp.path().join("data").join("records.json");

    let out = schemashare()
        .args(["save", "--schema"])
        .arg(&schema)
        .arg("--json")
        .arg(&doc)
        .arg("--path")
        .arg(&store)
        .output()
        .unwrap();
    assert!(out.status.success());
    let id = String::from_utf8(out.stdout).unwrap().trim().to_string();
    assert_eq!(id.len(), 22);
    assert!(store.exists());

    schemashare()
        .args(["get", &id, "--path"])
        .arg(&store)
        .assert()
        .success()
        .stdout(predicate::str::contains(id.as_str()))
        .stdout(predicate::str::contains("{\\\"type\\\":\\\"object\\\"}"));
}

#[test]
fn get_unknown_id_fails() {
    let tmp = tempdir().unwrap();
    schemashare()
        .args(["get", "nonexistent-id", "--path"])
        .arg(tmp.path().join("records.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found or expired"));
}

#[test]
fn managed_provider_without_table_refuses_to_start() {
    let tmp = tempdir().unwrap();
    schemashare()
        .args(["get", "whatever", "--provider", "managed"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("table name is required"));
}

#[test]
fn provider_can_come_from_environment() {
    let tmp = tempdir().unwrap();
    schemashare()
        .env("SCHEMASHARE__STORAGE__PROVIDER", "managed")
        .args(["get", "whatever"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("table name is required"));
}

#[test]
fn config_file_selects_store_path() {
    let tmp = tempdir().unwrap();
    let store = tmp.path().join("from-config.json");
    let cfg = tmp.path().join("schemashare.toml");
    fs::write(
        &cfg,
        format!("[storage]\nprovider = \"embedded\"\npath = {:?}\n", store.display().to_string()),
    )
    .unwrap();
    let schema = tmp.path().join("s.json");
    fs::write(&schema, "{}").unwrap();

    schemashare()
        .arg("--config")
        .arg(&cfg)
        .args(["save", "--schema"])
        .arg(&schema)
        .arg("--json")
        .arg(&schema)
        .assert()
        .success();
    assert!(store.exists());
}
