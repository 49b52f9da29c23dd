use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    assert_cmd::Command::from(Command::new(env!("CARGO_BIN_EXE_parrot")))
}

const PARROT_GO: &str = "package a\n\nfunc f() {\n\t// connect to the database\n\tconnectToDatabase()\n}\n";
const CLEAN_PY: &str = "# retry because the network drops packets under load\nsend_batch()\n";

fn workspace(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, text) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, text).unwrap();
    }
    dir
}

#[test]
fn clean_tree_exits_zero() {
    let dir = workspace(&[("tool.py", CLEAN_PY)]);
    cmd()
        .current_dir(dir.path())
        .assert()
        .code(0)
        .stdout(predicate::str::contains("1 files, 1 comments, 0 diagnostics"));
}

#[test]
fn parrot_comment_exits_one() {
    let dir = workspace(&[("pkg/a.go", PARROT_GO), ("tool.py", CLEAN_PY)]);
    cmd()
        .current_dir(dir.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "pkg/a.go:4:2: comment parrots the code: consider removing or adding insight",
        ))
        .stdout(predicate::str::contains("// connect to the database"))
        .stdout(predicate::str::contains("2 files, 2 comments, 1 diagnostics"));
}

#[test]
fn quiet_prints_only_summary() {
    let dir = workspace(&[("a.go", PARROT_GO)]);
    cmd()
        .current_dir(dir.path())
        .arg("--quiet")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("a.go:4:2").not())
        .stdout(predicate::str::contains("1 files, 1 comments, 1 diagnostics"));
}

#[test]
fn explain_shows_matched_words() {
    let dir = workspace(&[("a.go", PARROT_GO)]);
    cmd()
        .current_dir(dir.path())
        .arg("--explain")
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "repeats expression-statement on line 5: 2 of 2 words (1.00): connect, database",
        ));
}

#[test]
fn json_report() {
    let dir = workspace(&[("a.go", PARROT_GO)]);
    let assert = cmd()
        .current_dir(dir.path())
        .args(["--json", "a.go"])
        .assert()
        .code(1);
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["total_diagnostics"], 1);
    assert_eq!(value["files"][0]["path"], "a.go");
    assert_eq!(value["files"][0]["language"], "go");
    assert_eq!(value["files"][0]["diagnostics"][0]["location"]["line"], 4);
    assert_eq!(
        value["files"][0]["diagnostics"][0]["evidence"]["anchor_kind"],
        "expression-statement"
    );
}

#[test]
fn parse_failure_exits_two_and_continues() {
    let dir = workspace(&[("broken.go", "package a\nfunc (\n"), ("a.go", PARROT_GO)]);
    cmd()
        .current_dir(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("broken.go"))
        .stdout(predicate::str::contains("a.go:4:2"));
}

#[test]
fn ignore_globs_from_config() {
    let dir = workspace(&[
        ("generated/a.go", PARROT_GO),
        ("parrot.yml", "ignore_globs:\n  - \"**/generated/**\"\n"),
    ]);
    cmd()
        .current_dir(dir.path())
        .assert()
        .code(0)
        .stdout(predicate::str::contains("0 files, 0 comments, 0 diagnostics"));
}

#[test]
fn default_ignores_skip_vendored_code() {
    let dir = workspace(&[("node_modules/dep/index.js", "// open the file\nopenFile();\n")]);
    cmd().current_dir(dir.path()).assert().code(0);
}

#[test]
fn lang_forces_frontend() {
    let dir = workspace(&[("script.txt", "# open the config file\nopen_config_file()\n")]);
    cmd()
        .current_dir(dir.path())
        .args(["--lang", "python", "script.txt"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("script.txt:1:1"));
}

#[test]
fn unknown_lang_is_rejected() {
    cmd()
        .args(["--lang", "cobol"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cobol"));
}

#[test]
fn invalid_config_exits_two() {
    let dir = workspace(&[("parrot.yml", "max_file_kb: [not, a, number]\n")]);
    cmd()
        .current_dir(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("parrot.yml"));
}
