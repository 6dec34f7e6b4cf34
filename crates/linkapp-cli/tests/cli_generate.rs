use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn linkapp(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("linkapp").unwrap();
    cmd.current_dir(cwd)
        .env_remove("LINKAPP_CONFIG")
        .env_remove("LINKAPP_SOURCE_DIR")
        .env_remove("LINKAPP_BINARY_DIR")
        .env_remove("LINKAPP_OUTPUT")
        .env_remove("RUST_LOG");
    cmd
}

fn user_tree(root: &Path, apps: &[(&str, &[u8])]) {
    let src = root.join("src_bin");
    let rel = root.join("release");
    fs::create_dir_all(&src).unwrap();
    fs::create_dir_all(&rel).unwrap();
    for (name, data) in apps {
        fs::write(src.join(format!("{name}.rs")), "fn main() {}").unwrap();
        fs::write(rel.join(name), data).unwrap();
    }
}

#[test]
fn generate_writes_bundle() {
    let dir = tempdir().unwrap();
    user_tree(dir.path(), &[("initproc", b"INIT"), ("shell", b"SHELL")]);

    linkapp(dir.path())
        .args([
            "generate",
            "--source-dir",
            "src_bin",
            "--binary-dir",
            "release/",
            "--output",
            "kernel/src/link_app.S",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("Wrote 2 application(s)"));

    let text = fs::read_to_string(dir.path().join("kernel/src/link_app.S")).unwrap();
    assert!(text.contains("    .quad 2\n"));
    assert!(text.contains(".string \"initproc\"\n    .string \"shell\"\n"));
    assert!(text.contains(".incbin \"release/shell\""));
}

#[test]
fn generate_reads_config_file() {
    let dir = tempdir().unwrap();
    user_tree(dir.path(), &[("hello", b"HELLO")]);
    fs::write(
        dir.path().join("linkapp.yaml"),
        "source_dir: src_bin\nbinary_dir: release\noutput: out/apps.S\nsymbols:\n  payload_prefix: payload\n",
    )
    .unwrap();

    linkapp(dir.path()).arg("generate").assert().success();

    let text = fs::read_to_string(dir.path().join("out/apps.S")).unwrap();
    assert!(text.contains("payload_0_start:"));
}

#[test]
fn env_overrides_config_file() {
    let dir = tempdir().unwrap();
    user_tree(dir.path(), &[("hello", b"HELLO")]);
    fs::write(
        dir.path().join("linkapp.yaml"),
        "source_dir: src_bin\nbinary_dir: release\noutput: from_file.S\n",
    )
    .unwrap();

    linkapp(dir.path())
        .env("LINKAPP_OUTPUT", "from_env.S")
        .arg("generate")
        .assert()
        .success();

    assert!(dir.path().join("from_env.S").exists());
    assert!(!dir.path().join("from_file.S").exists());
}

#[test]
fn missing_source_dir_exits_nonzero() {
    let dir = tempdir().unwrap();
    linkapp(dir.path())
        .args(["generate", "--source-dir", "nope", "--output", "out.S"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("fatal:"));
    assert!(!dir.path().join("out.S").exists());
}

#[test]
fn missing_binary_exits_nonzero_without_output() {
    let dir = tempdir().unwrap();
    user_tree(dir.path(), &[("initproc", b"INIT")]);
    fs::write(dir.path().join("src_bin/ghost.rs"), "").unwrap();

    linkapp(dir.path())
        .args([
            "generate",
            "--source-dir",
            "src_bin",
            "--binary-dir",
            "release",
            "--output",
            "link_app.S",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("ghost"));
    assert!(!dir.path().join("link_app.S").exists());
}

#[test]
fn bad_config_exits_nonzero() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("linkapp.yaml"), "unknown_key: 1\n").unwrap();
    linkapp(dir.path())
        .arg("generate")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("configuration"));
}

#[test]
fn list_prints_sorted_entries_as_json() {
    let dir = tempdir().unwrap();
    user_tree(dir.path(), &[("zz", b""), ("aa", b""), ("mm", b"")]);

    let out = linkapp(dir.path())
        .args(["list", "--source-dir", "src_bin", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let names: Vec<&str> = v
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["aa", "mm", "zz"]);
    assert_eq!(v[2]["index"], 2);
}

#[test]
fn map_reports_payload_sizes() {
    let dir = tempdir().unwrap();
    user_tree(dir.path(), &[("hello", &[0u8; 4096])]);

    linkapp(dir.path())
        .args([
            "map",
            "--source-dir",
            "src_bin",
            "--binary-dir",
            "release",
            "--base",
            "0x80400000",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("[0] hello (4096 bytes"))
        .stdout(predicate::str::contains("_num_app"));
}

#[test]
fn map_rejects_base_without_room_for_image() {
    let dir = tempdir().unwrap();
    user_tree(dir.path(), &[("hello", b"HELLO")]);

    linkapp(dir.path())
        .args([
            "map",
            "--source-dir",
            "src_bin",
            "--binary-dir",
            "release",
            "--base",
            "0xfffffffffffffff8",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("does not fit above base"));
}

#[test]
fn run_reports_failed_tool() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("linkapp.yaml"),
        "pipeline:\n  cargo: linkapp-test-no-such-cargo\n",
    )
    .unwrap();

    linkapp(dir.path())
        .args(["run", "--skip-generate", "--no-launch"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("build step"));
}
