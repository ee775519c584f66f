use chrono::Utc;
use clap::Parser;
use mdq::cli::{self, Cli};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn vault() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let today = Utc::now().format("%Y-%m-%d");
    write(
        dir.path(),
        "a.md",
        &format!("---\nstatus: draft\npriority: 5\ntags: [work, urgent]\ncreated: {}\n---\nA", today),
    );
    write(
        dir.path(),
        "b.md",
        "---\nstatus: done\npriority: 2\ntags: [home]\ncreated: 2020-01-01\n---\nB",
    );
    write(dir.path(), "c.md", "no frontmatter here");
    write(
        dir.path(),
        "sub/d.md",
        "---\nstatus: draft\npriority: high\ncreated: 2020-06-01\n---\nD",
    );
    dir
}

/// Runs `mdq` with `args`, returning the exit status and what was printed.
fn mdq(args: &[&str]) -> (u8, String) {
    let cli = Cli::try_parse_from(std::iter::once("mdq").chain(args.iter().copied())).unwrap();
    let mut out = Vec::new();
    let result = cli::run(cli, &mut out);
    (cli::exit_status(&result), String::from_utf8(out).unwrap())
}

fn lines(out: &str) -> Vec<String> {
    out.lines().map(|l| l.replace('\\', "/")).collect()
}

// ============================================================================
// Exit codes
// ============================================================================

#[test]
fn test_match_exits_zero() {
    let dir = vault();
    let root = dir.path().to_str().unwrap();
    let (status, out) = mdq(&["--vault", root, r#"status = "draft""#]);
    assert_eq!(status, 0);
    assert_eq!(lines(&out), vec!["a.md", "sub/d.md"]);
}

#[test]
fn test_no_match_exits_one() {
    let dir = vault();
    let root = dir.path().to_str().unwrap();
    let (status, out) = mdq(&["--vault", root, r#"status = "archived""#]);
    assert_eq!(status, 1);
    assert!(out.is_empty());
}

#[test]
fn test_errors_exit_two() {
    let dir = vault();
    let root = dir.path().to_str().unwrap();
    let missing = dir.path().join("nope");

    assert_eq!(mdq(&["--vault", missing.to_str().unwrap(), "status"]).0, 2);
    assert_eq!(mdq(&["--vault", root, "status = "]).0, 2);
    assert_eq!(mdq(&["--vault", root]).0, 2);
    assert_eq!(mdq(&["--vault", root, "--ignore", "a[", "status"]).0, 2);
}

#[test]
fn test_usage_errors_exit_two() {
    let err = Cli::try_parse_from(["mdq", "--from", "2024-01-01", "status"]).unwrap_err();
    assert_eq!(err.exit_code(), 2);
    let err = Cli::try_parse_from(["mdq", "--date-field", "created", "--within", "soon"])
        .unwrap_err();
    assert_eq!(err.exit_code(), 2);
    let err = Cli::try_parse_from(["mdq", "--check", "priority", "status"]).unwrap_err();
    assert_eq!(err.exit_code(), 2);
}

// ============================================================================
// Output modes
// ============================================================================

#[test]
fn test_explain_prints_tree_without_a_vault() {
    let (status, out) = mdq(&[
        "--vault",
        "/definitely/not/a/vault",
        "--explain",
        "a = 1 OR b = 2 AND c = 3",
    ]);
    assert_eq!(status, 0);
    assert_eq!(out, "((a = 1) OR ((b = 2) AND (c = 3)))\n");
}

#[test]
fn test_yaml_format() {
    let dir = vault();
    let root = dir.path().to_str().unwrap();
    let (status, out) = mdq(&["--vault", root, "--format", "yaml", "priority > 4"]);
    assert_eq!(status, 0);

    let records: serde_yaml::Value = serde_yaml::from_str(&out).unwrap();
    let records = records.as_sequence().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["path"], "a.md");
    assert_eq!(records[0]["fields"]["priority"], 5);
    assert_eq!(records[0]["fields"]["tags"][1], "urgent");
}

#[test]
fn test_values_mode() {
    let dir = vault();
    let root = dir.path().to_str().unwrap();
    let (status, out) = mdq(&["--vault", root, "--values", "status", "--count"]);
    assert_eq!(status, 0);
    assert_eq!(lines(&out), vec!["draft: 2", "done: 1"]);

    let (status, out) = mdq(&["--vault", root, "--values", "owner"]);
    assert_eq!(status, 1);
    assert!(out.is_empty());
}

// ============================================================================
// Combining filters
// ============================================================================

#[test]
fn test_type_check_narrows_query() {
    let dir = vault();
    let root = dir.path().to_str().unwrap();
    let (status, out) = mdq(&["--vault", root, "--check", "priority:number", r#"status = "draft""#]);
    assert_eq!(status, 0);
    assert_eq!(lines(&out), vec!["a.md"]);
}

#[test]
fn test_date_range_without_query() {
    let dir = vault();
    let root = dir.path().to_str().unwrap();
    let (status, out) = mdq(&["--vault", root, "--date-field", "created", "--within", "2 days"]);
    assert_eq!(status, 0);
    assert_eq!(lines(&out), vec!["a.md"]);

    let (status, out) = mdq(&[
        "--vault",
        root,
        "--date-field",
        "created",
        "--from",
        "2020-01-01",
        "--to",
        "2020-12-31",
        r#"status = "draft""#,
    ]);
    assert_eq!(status, 0);
    assert_eq!(lines(&out), vec!["sub/d.md"]);
}

#[test]
fn test_ignore_glob() {
    let dir = vault();
    let root = dir.path().to_str().unwrap();
    let (_, out) = mdq(&["--vault", root, "--ignore", "sub/**", r#"status = "draft""#]);
    assert_eq!(lines(&out), vec!["a.md"]);
}
