//! End-to-end tests for the `grafter` binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// A project directory with an empty local config, so user configuration
/// never leaks into a test.
fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".grafter.toml"), "").unwrap();
    for (path, content) in files {
        let full = dir.path().join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }
    dir
}

fn grafter(dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("grafter");
    cmd.current_dir(dir).env_remove("RUST_LOG").env("NO_COLOR", "1");
    cmd
}

fn read(dir: &TempDir, path: &str) -> String {
    fs::read_to_string(dir.path().join(path)).unwrap()
}

#[test]
fn help_lists_commands() {
    let dir = project(&[]);
    grafter(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("inspect"))
        .stdout(predicate::str::contains("apply"));
}

#[test]
fn version_flag() {
    let dir = project(&[]);
    grafter(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn usage_errors_go_to_stderr() {
    let dir = project(&[]);
    grafter(dir.path())
        .arg("--no-such-flag")
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("--no-such-flag"));
}

#[test]
fn inspect_reports_json() {
    let dir = project(&[(
        "vite.config.ts",
        "import a from 'a';\n\nexport default {\n    plugins: [a()],\n};\n",
    )]);
    let output = grafter(dir.path())
        .args(["--output-format", "json", "inspect", "vite.config.ts"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let reports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(reports[0]["kind"], "script");
    assert_eq!(reports[0]["indent"], "4 spaces");
    assert_eq!(reports[0]["quote"], "single");
    assert_eq!(reports[0]["semicolons"], true);
}

#[test]
fn import_is_written_once() {
    let dir = project(&[("src/app.ts", "const a = 1;\n")]);
    let args = ["import", "src/app.ts", "--from", "svelte/store", "--named", "writable"];

    grafter(dir.path())
        .args(args)
        .assert()
        .success()
        .stdout(predicate::str::contains("modified src/app.ts"));
    let first = read(&dir, "src/app.ts");
    assert!(first.contains("import { writable } from 'svelte/store';"));
    assert!(first.ends_with("const a = 1;\n"));

    grafter(dir.path())
        .args(args)
        .assert()
        .success()
        .stdout(predicate::str::contains("unchanged src/app.ts"));
    assert_eq!(read(&dir, "src/app.ts"), first);
}

#[test]
fn plugin_adds_import_and_call() {
    let dir = project(&[(
        "vite.config.ts",
        "import { defineConfig } from 'vite';\n\nexport default defineConfig({\n  plugins: [],\n});\n",
    )]);
    grafter(dir.path())
        .args([
            "plugin",
            "vite.config.ts",
            "tailwindcss()",
            "--import-from",
            "@tailwindcss/vite",
            "--import-default",
            "tailwindcss",
        ])
        .assert()
        .success();

    let config = read(&dir, "vite.config.ts");
    assert!(config.contains("import tailwindcss from '@tailwindcss/vite';"));
    assert!(config.contains("tailwindcss()"));
}

#[test]
fn set_updates_package_json() {
    let dir = project(&[("package.json", "{\n  \"name\": \"app\"\n}\n")]);
    grafter(dir.path())
        .args(["set", "package.json", "scripts.lint", "eslint ."])
        .assert()
        .success();

    let json: serde_json::Value = serde_json::from_str(&read(&dir, "package.json")).unwrap();
    assert_eq!(json["name"], "app");
    assert_eq!(json["scripts"]["lint"], "eslint .");
}

#[test]
fn dry_run_leaves_files_alone() {
    let original = "{\n  \"name\": \"app\"\n}\n";
    let dir = project(&[("package.json", original)]);
    grafter(dir.path())
        .args(["set", "package.json", "private", "true", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"private\": true"))
        .stdout(predicate::str::contains("Dry run"));
    assert_eq!(read(&dir, "package.json"), original);
}

#[test]
fn project_root_flag() {
    let dir = project(&[("web/package.json", "{}\n")]);
    grafter(dir.path())
        .args(["set", "package.json", "type", "module", "-C", "web"])
        .assert()
        .success();
    assert!(read(&dir, "web/package.json").contains("\"type\": \"module\""));
}

#[test]
fn apply_runs_recipe() {
    let dir = project(&[
        ("package.json", "{\n  \"name\": \"app\"\n}\n"),
        ("src/app.css", "body {\n  margin: 0;\n}\n"),
        (
            "recipes/tailwind.toml",
            r#"
[recipe]
name = "tailwind"

[[steps]]
op = "css-import"
path = "src/app.css"
params = "'tailwindcss'"

[[steps]]
op = "json-append"
path = "package.json"
key = "keywords"
value = "tailwind"
"#,
        ),
    ]);

    grafter(dir.path())
        .args(["apply", "recipes/tailwind.toml", "--yes"])
        .assert()
        .success();

    assert!(read(&dir, "src/app.css").starts_with("@import 'tailwindcss';"));
    let json: serde_json::Value = serde_json::from_str(&read(&dir, "package.json")).unwrap();
    assert_eq!(json["keywords"], serde_json::json!(["tailwind"]));
}

#[test]
fn unknown_recipe_exits_with_three() {
    let dir = project(&[]);
    grafter(dir.path())
        .args(["apply", "missing.toml", "--yes"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Recipe not found"));
}

#[test]
fn unsupported_file_exits_with_two() {
    let dir = project(&[("src/app.ts", "export {};\n")]);
    grafter(dir.path())
        .args(["set", "src/app.ts", "a", "1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("set cannot edit src/app.ts"));
}

#[test]
fn wrong_shape_fails_without_writing() {
    let original = "[1, 2]\n";
    let dir = project(&[("data.json", original)]);
    grafter(dir.path())
        .args(["set", "data.json", "a.b", "1"])
        .assert()
        .code(2);
    assert_eq!(read(&dir, "data.json"), original);
}

#[test]
fn config_set_then_get() {
    let dir = project(&[]);
    grafter(dir.path())
        .args(["config", "set", "edits.keep_going", "true"])
        .assert()
        .success();
    assert!(read(&dir, ".grafter.toml").contains("keep_going = true"));

    grafter(dir.path())
        .args(["config", "get", "edits.keep_going"])
        .assert()
        .success()
        .stdout(predicate::str::diff("true\n"));
}

#[test]
fn completions_for_bash() {
    let dir = project(&[]);
    grafter(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("grafter"));
}
