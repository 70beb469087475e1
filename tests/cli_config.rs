use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn fixture_path() -> PathBuf {
    PathBuf::from("tests/fixtures/records.jsonl")
        .canonicalize()
        .expect("fixture path")
}

fn project_with_config(config_toml: &str) -> (tempfile::TempDir, PathBuf) {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path().join("project");
    let appsearch_dir = root.join(".appsearch");
    fs::create_dir_all(&appsearch_dir).expect("create .appsearch directory");
    fs::write(appsearch_dir.join("config.toml"), config_toml).expect("write config.toml");
    (tmp, root)
}

fn load_into(root: &Path, store_path: &str) {
    let mut cmd = cargo_bin_cmd!("appsearch");
    cmd.current_dir(root);
    cmd.arg("load").arg(fixture_path()).args(["--store-path", store_path]);
    cmd.assert().success();
}

#[test]
fn cli_search_uses_project_config_defaults() {
    let (_tmp, root) = project_with_config(
        r#"
[search]
entity = "users"
format = "json"
store_path = "data/records.sqlite"
no_server = true
"#,
    );
    load_into(&root, "data/records.sqlite");

    let mut cmd = cargo_bin_cmd!("appsearch");
    cmd.current_dir(&root);
    cmd.args(["search", "department=Physics"]);

    let assert = cmd.assert().success();
    let value: Value =
        serde_json::from_slice(&assert.get_output().stdout).expect("valid json output");

    let results = value["results"].as_array().expect("results array");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["username"], "bob");
}

#[test]
fn cli_config_is_found_from_subdirectory() {
    let (_tmp, root) = project_with_config(
        r#"
[load]
store_path = "../shared.sqlite"

[store_info]
store_path = "../shared.sqlite"
format = "json"
no_server = true
"#,
    );
    let nested = root.join("nested");
    fs::create_dir_all(&nested).expect("create nested dir");
    load_into(&nested, "../shared.sqlite");

    let mut cmd = cargo_bin_cmd!("appsearch");
    cmd.current_dir(&nested);
    cmd.arg("store-info");

    let assert = cmd.assert().success();
    let value: Value =
        serde_json::from_slice(&assert.get_output().stdout).expect("valid json output");
    assert_eq!(value["backend"], "sqlite");
    assert_eq!(value["counts"]["application"], 4);
}

#[test]
fn cli_search_config_can_disable_server_even_with_env() {
    let (_tmp, root) = project_with_config(
        r#"
[search]
store_path = "store"
no_server = true
"#,
    );
    load_into(&root, "store");

    let mut cmd = cargo_bin_cmd!("appsearch");
    cmd.current_dir(&root);
    cmd.env("APPSEARCH_SERVER_URL", "http://127.0.0.1:9");
    cmd.args(["search", "accounts", "email:lab"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("account carol"));
}

#[test]
fn logging_level_from_config_reaches_stderr() {
    let (_tmp, root) = project_with_config(
        r#"
[search]
store_path = "store"
no_server = true

[logging]
level = "debug"
"#,
    );
    load_into(&root, "store");

    let mut cmd = cargo_bin_cmd!("appsearch");
    cmd.current_dir(&root);
    cmd.env_remove("RUST_LOG");
    cmd.args(["search", "users", "name:Smith"]);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("compiled criterion"));
}
