//! Integration tests for the `na` CLI.
//!
//! Each test creates a temp directory of project files, runs `na` as a
//! subprocess, and verifies stdout and/or file contents.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// Get the path to the built `na` binary.
fn na_bin() -> PathBuf {
    // cargo test builds to target/debug/
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("na");
    path
}

/// Run `na` in `dir` with an isolated config home and no pager or color.
fn na(dir: &Path, args: &[&str]) -> Output {
    Command::new(na_bin())
        .args(["--no-pager", "--no-color"])
        .args(args)
        .current_dir(dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env("HOME", dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run na")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn write(dir: &Path, rel: &str, text: &str) -> PathBuf {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, text).unwrap();
    path
}

/// A project directory with one file matching the worked example.
fn example_dir() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "work.taskpaper",
        "Work:\n\t- fix bug @na\n\t- write docs",
    );
    tmp
}

fn json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout)
        .unwrap_or_else(|e| panic!("invalid JSON ({}): {}", e, stdout(output)))
}

// ============================================================================
// next
// ============================================================================

#[test]
fn next_lists_only_tagged_actions() {
    let tmp = example_dir();
    let out = na(tmp.path(), &["next"]);
    assert!(out.status.success(), "{}", stderr(&out));

    let text = stdout(&out);
    assert!(text.contains("== work.taskpaper =="));
    assert!(text.contains("[Work] fix bug @na"));
    assert!(!text.contains("write docs"));
}

#[test]
fn next_is_the_default_command() {
    let tmp = example_dir();
    let out = na(tmp.path(), &[]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("fix bug @na"));
}

#[test]
fn next_json_reports_line_and_tags() {
    let tmp = example_dir();
    let out = na(tmp.path(), &["--json", "next"]);
    assert!(out.status.success());

    let doc = json(&out);
    let actions = doc["actions"].as_array().unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0]["text"], "fix bug @na");
    assert_eq!(actions[0]["title"], "fix bug");
    assert_eq!(actions[0]["line"], 2);
    assert_eq!(actions[0]["project"][0], "Work");
    assert_eq!(actions[0]["tags"][0]["key"], "na");
}

#[test]
fn next_with_custom_tag() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "a.taskpaper",
        "Work:\n\t- one @na\n\t- two @next\n",
    );
    let out = na(tmp.path(), &["next", "--tag", "next"]);
    let text = stdout(&out);
    assert!(text.contains("two @next"));
    assert!(!text.contains("one @na"));
}

#[test]
fn next_hides_done_unless_asked() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "a.taskpaper",
        "Work:\n\t- open @na\n\t- closed @na @done(2025-01-01)\n",
    );
    let text = stdout(&na(tmp.path(), &["next"]));
    assert!(text.contains("open @na"));
    assert!(!text.contains("closed"));

    let text = stdout(&na(tmp.path(), &["next", "--done"]));
    assert!(text.contains("closed @na"));
}

#[test]
fn depth_bounds_directory_search() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "top.taskpaper", "Top:\n\t- shallow @na\n");
    write(tmp.path(), "sub/deep.taskpaper", "Deep:\n\t- one down @na\n");
    write(tmp.path(), "sub/more/deeper.taskpaper", "Deeper:\n\t- two down @na\n");

    let text = stdout(&na(tmp.path(), &["next"]));
    assert!(text.contains("shallow"));
    assert!(!text.contains("one down"));

    let text = stdout(&na(tmp.path(), &["next", "-d", "1"]));
    assert!(text.contains("shallow"));
    assert!(text.contains("one down"));
    assert!(!text.contains("two down"));
}

#[test]
fn results_follow_file_path_order() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "b.taskpaper", "B:\n\t- from b @na\n");
    write(tmp.path(), "a.taskpaper", "A:\n\t- from a @na\n");

    let text = stdout(&na(tmp.path(), &["next"]));
    let a = text.find("from a").unwrap();
    let b = text.find("from b").unwrap();
    assert!(a < b);
}

#[test]
fn explicit_file_limits_scope() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "a.taskpaper", "A:\n\t- from a @na\n");
    write(tmp.path(), "b.taskpaper", "B:\n\t- from b @na\n");

    let text = stdout(&na(tmp.path(), &["next", "-f", "b.taskpaper"]));
    assert!(text.contains("from b"));
    assert!(!text.contains("from a"));
}

#[test]
fn no_project_files_is_empty_not_an_error() {
    let tmp = TempDir::new().unwrap();
    let out = na(tmp.path(), &["--json", "next"]);
    assert!(out.status.success());
    assert_eq!(json(&out)["actions"].as_array().unwrap().len(), 0);
}

#[test]
fn custom_extension() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "list.todo", "Work:\n\t- in todo file @na\n");
    write(tmp.path(), "other.taskpaper", "Work:\n\t- in taskpaper file @na\n");

    let text = stdout(&na(tmp.path(), &["--ext", "todo", "next"]));
    assert!(text.contains("in todo file"));
    assert!(!text.contains("in taskpaper file"));
}

#[test]
fn config_file_sets_default_tag() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), ".config/na/config.toml", "tag = \"next\"\n");
    write(
        tmp.path(),
        "a.taskpaper",
        "Work:\n\t- one @na\n\t- two @next\n",
    );
    let text = stdout(&na(tmp.path(), &["next"]));
    assert!(text.contains("two @next"));
    assert!(!text.contains("one @na"));
}

#[test]
fn parse_problems_do_not_hide_results() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "a.taskpaper",
        "- orphan @na\nWork:\n    - fine\n  - odd indent @na\n",
    );
    let out = na(tmp.path(), &["--json", "next"]);
    assert!(out.status.success());
    let doc = json(&out);
    assert_eq!(doc["actions"].as_array().unwrap().len(), 2);
    assert_eq!(doc["problems"].as_array().unwrap().len(), 2);
}

#[cfg(unix)]
#[test]
fn unreadable_entries_are_listed_as_problems() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "a.taskpaper", "- orphan fix @na\nWork:\n\t- fix bug @na\n");
    std::os::unix::fs::symlink(tmp.path().join("gone"), tmp.path().join("b.taskpaper")).unwrap();

    let out = na(tmp.path(), &["--json", "next"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let doc = json(&out);
    assert_eq!(doc["actions"].as_array().unwrap().len(), 2);
    let problems = doc["problems"].as_array().unwrap();
    assert_eq!(problems.len(), 2);
    assert!(problems[0]["file"].as_str().unwrap().ends_with("b.taskpaper"));
    assert!(problems[0].get("line").is_none());
    assert!(problems[1]["file"].as_str().unwrap().ends_with("a.taskpaper"));
    assert_eq!(problems[1]["line"], 1);
}

#[cfg(unix)]
#[test]
fn find_json_includes_problems() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "a.taskpaper", "- orphan fix @na\nWork:\n\t- fix bug @na\n");
    std::os::unix::fs::symlink(tmp.path().join("gone"), tmp.path().join("b.taskpaper")).unwrap();

    let doc = json(&na(tmp.path(), &["--json", "find", "fix"]));
    assert_eq!(doc["actions"].as_array().unwrap().len(), 2);
    assert_eq!(doc["problems"].as_array().unwrap().len(), 2);
}

#[test]
fn missing_explicit_file_is_a_problem() {
    let tmp = example_dir();
    let out = na(tmp.path(), &["--json", "next", "-f", "work.taskpaper", "-f", "nope.taskpaper"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let doc = json(&out);
    assert_eq!(doc["actions"].as_array().unwrap().len(), 1);
    let problems = doc["problems"].as_array().unwrap();
    assert_eq!(problems.len(), 1);
    assert!(problems[0]["file"].as_str().unwrap().ends_with("nope.taskpaper"));
}

// ============================================================================
// tagged / find / projects
// ============================================================================

#[test]
fn tagged_compares_values() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "a.taskpaper",
        "Work:\n\t- low @priority(1)\n\t- high @priority(10)\n\t- none\n",
    );
    let text = stdout(&na(tmp.path(), &["tagged", "priority>=2"]));
    assert!(text.contains("high"));
    assert!(!text.contains("low"));
    assert!(!text.contains("none"));
}

#[test]
fn tagged_rejects_bad_query() {
    let tmp = example_dir();
    let out = na(tmp.path(), &["tagged", "=x"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("error:"));
}

#[test]
fn find_searches_action_text() {
    let tmp = example_dir();
    let text = stdout(&na(tmp.path(), &["find", "DOCS"]));
    assert!(text.contains("write docs"));
    assert!(!text.contains("fix bug"));
}

#[test]
fn projects_prints_tree() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "a.taskpaper",
        "Work:\n\t- a\n\tBackend:\n\t\t- b\nHome:\n",
    );
    let text = stdout(&na(tmp.path(), &["projects"]));
    assert!(text.contains("  Work (1)\n"));
    assert!(text.contains("    Backend (1)\n"));
    assert!(text.contains("  Home\n"));
}

// ============================================================================
// add
// ============================================================================

#[test]
fn add_appends_after_existing_actions() {
    let tmp = example_dir();
    let out = na(tmp.path(), &["add", "call client", "-p", "Work"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("Added to"));

    let content = fs::read_to_string(tmp.path().join("work.taskpaper")).unwrap();
    assert_eq!(
        content,
        "Work:\n\t- fix bug @na\n\t- write docs\n\t- call client @na"
    );
}

#[test]
fn add_at_start() {
    let tmp = example_dir();
    let out = na(tmp.path(), &["add", "first thing", "-p", "work", "--at", "start"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let content = fs::read_to_string(tmp.path().join("work.taskpaper")).unwrap();
    assert!(content.starts_with("Work:\n\t- first thing @na\n\t- fix bug @na"));
}

#[test]
fn add_defaults_to_inbox_and_creates_it() {
    let tmp = example_dir();
    let out = na(tmp.path(), &["add", "something"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let content = fs::read_to_string(tmp.path().join("work.taskpaper")).unwrap();
    assert!(content.ends_with("\t- write docs\nInbox:\n\t- something @na"));
}

#[test]
fn add_creates_nested_project() {
    let tmp = example_dir();
    let out = na(
        tmp.path(),
        &["add", "deploy", "-p", "Work/Backend", "--priority", "2", "-n", "after lunch"],
    );
    assert!(out.status.success(), "{}", stderr(&out));
    let content = fs::read_to_string(tmp.path().join("work.taskpaper")).unwrap();
    assert!(content.ends_with(
        "\t- write docs\n\tBackend:\n\t\t- deploy @na @priority(2)\n\t\t\tafter lunch"
    ));
}

#[test]
fn add_finished_action() {
    let tmp = example_dir();
    let out = na(tmp.path(), &["--json", "add", "done already", "-p", "Work", "--finish"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let doc = json(&out);
    let text = doc["text"].as_str().unwrap();
    assert!(text.starts_with("done already @done("));
    assert!(!text.contains("@na"));
    assert_eq!(doc["line"], 4);
}

#[test]
fn add_to_explicit_file() {
    let tmp = example_dir();
    let other = write(tmp.path(), "sub/other.taskpaper", "Errands:\n");
    let out = na(
        tmp.path(),
        &["add", "post office", "-p", "Errands", "-f", "sub/other.taskpaper"],
    );
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(
        fs::read_to_string(other).unwrap(),
        "Errands:\n\t- post office @na\n"
    );
}

#[test]
fn add_empty_text_fails_without_touching_file() {
    let tmp = example_dir();
    let before = fs::read_to_string(tmp.path().join("work.taskpaper")).unwrap();
    let out = na(tmp.path(), &["add", "   ", "-p", "Work"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("error: action text is empty"));
    assert_eq!(
        fs::read_to_string(tmp.path().join("work.taskpaper")).unwrap(),
        before
    );
}

#[test]
fn add_without_any_file_fails() {
    let tmp = TempDir::new().unwrap();
    let out = na(tmp.path(), &["add", "orphan"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("na init"));
}

#[test]
fn added_action_shows_up_in_next() {
    let tmp = example_dir();
    na(tmp.path(), &["add", "call client", "-p", "Work"]);
    let text = stdout(&na(tmp.path(), &["next"]));
    let fix = text.find("fix bug").unwrap();
    let call = text.find("call client").unwrap();
    assert!(fix < call);
}

// ============================================================================
// init
// ============================================================================

#[test]
fn init_creates_file_and_refuses_overwrite() {
    let tmp = TempDir::new().unwrap();
    let out = na(tmp.path(), &["init", "garden"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let path = tmp.path().join("garden.taskpaper");
    assert_eq!(fs::read_to_string(&path).unwrap(), "Inbox:\n");

    let again = na(tmp.path(), &["init", "garden"]);
    assert!(!again.status.success());
    assert!(stderr(&again).contains("already exists"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "Inbox:\n");
}

#[test]
fn init_then_add() {
    let tmp = TempDir::new().unwrap();
    na(tmp.path(), &["init", "todo"]);
    let out = na(tmp.path(), &["add", "buy milk"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(
        fs::read_to_string(tmp.path().join("todo.taskpaper")).unwrap(),
        "Inbox:\n\t- buy milk @na\n"
    );
}

#[test]
fn run_in_other_directory() {
    let tmp = example_dir();
    let elsewhere = TempDir::new().unwrap();
    let dir = tmp.path().to_string_lossy().into_owned();
    let out = na(elsewhere.path(), &["-C", &dir, "next"]);
    assert!(stdout(&out).contains("fix bug @na"));
}
