use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{Map, Value};
use tagsync_engine::TagEntry;

static TEMP_DIR_COUNTER: AtomicU64 = AtomicU64::new(1);

fn unique_temp_dir(prefix: &str) -> PathBuf {
    for _ in 0..64 {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        let seq = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!(
            "tagsync-{prefix}-{}-{nanos}-{seq}",
            std::process::id()
        ));
        match std::fs::create_dir(&dir) {
            Ok(()) => return dir,
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(err) => panic!("create temp fixture dir {}: {err}", dir.display()),
        }
    }
    panic!("failed to allocate unique temp dir for fixture '{prefix}'")
}

fn tagsync(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tagsync"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("run tagsync")
}

fn tagsync_in(project: &Path, args: &[&str]) -> Output {
    let project = project.to_string_lossy().into_owned();
    let mut full: Vec<&str> = args.to_vec();
    full.push("--project");
    full.push(&project);
    tagsync(&full)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "tagsync failed\nstdout:\n{}\nstderr:\n{}",
        stdout(output),
        stderr(output)
    );
}

fn write_tags(project: &Path, tags: &[TagEntry]) {
    let text = serde_json::to_string_pretty(tags).expect("encode tags");
    std::fs::write(project.join("tags.json"), text).expect("write tags.json");
}

fn read_rows(path: &Path) -> Vec<Map<String, Value>> {
    let text = std::fs::read_to_string(path).expect("read table file");
    serde_json::from_str(&text).expect("parse table file")
}

fn row_names(rows: &[Map<String, Value>]) -> Vec<String> {
    rows.iter()
        .map(|row| row["NAME"].as_str().unwrap_or_default().to_string())
        .collect()
}

fn motor_project(prefix: &str) -> PathBuf {
    let project = unique_temp_dir(prefix);
    write_tags(
        &project,
        &[TagEntry::udt("Pump01", "Prog:Pump01", "Motor_Basic").with_description("Main pump")],
    );
    project
}

#[test]
fn sanitize_prints_derived_identity() {
    let output = tagsync(&["sanitize", "N7:0", "--prefix", "Pump01"]);
    assert_success(&output);
    assert_eq!(stdout(&output), "Pump01N7_0\n");
}

#[test]
fn diff_lists_pending_rows() {
    let project = motor_project("diff");
    let output = tagsync_in(&project, &["diff"]);
    assert_success(&output);
    let text = stdout(&output);
    assert!(text.contains("variable: 3 new"), "{text}");
    assert!(text.contains("+ Pump01.Mode"), "{text}");
    assert!(text.contains("alarm: 1 new"), "{text}");
    let _ = std::fs::remove_dir_all(project);
}

#[test]
fn sync_writes_tables_and_becomes_idempotent() {
    let project = motor_project("sync");
    let output = tagsync_in(&project, &["sync", "--yes"]);
    assert_success(&output);
    assert!(stdout(&output).contains("6 appended"), "{}", stdout(&output));

    let variables = read_rows(&project.join("variable.json"));
    assert_eq!(
        row_names(&variables),
        ["Pump01.Run", "Pump01.Fault", "Pump01.Mode"]
    );
    let guid = variables[0]["GUID"].as_str().unwrap_or_default().to_string();
    assert!(!guid.is_empty());
    assert!(!project.join("variable.json.bak").exists());

    let output = tagsync_in(&project, &["diff"]);
    assert_success(&output);
    assert!(stdout(&output).contains("Project tables are up to date."));

    write_tags(
        &project,
        &[TagEntry::udt("Pump01", "Prog:Pump01", "Motor_Basic").with_description("Feed pump")],
    );
    let output = tagsync_in(&project, &["sync", "--yes"]);
    assert_success(&output);
    assert!(project.join("variable.json.bak").exists());
    let variables = read_rows(&project.join("variable.json"));
    assert_eq!(variables[0]["COMMENT"], "Feed pump Run Status");
    assert_eq!(variables[0]["GUID"], Value::String(guid));
    let _ = std::fs::remove_dir_all(project);
}

#[test]
fn sync_skips_rejected_changes() {
    let project = motor_project("reject");
    let output = tagsync_in(
        &project,
        &[
            "sync",
            "--yes",
            "--reject",
            "variable/new/Pump01.Mode",
            "--reject-all",
            "alarm/new",
        ],
    );
    assert_success(&output);
    assert!(stdout(&output).contains("x variable·new·Pump01.Mode"));
    let variables = read_rows(&project.join("variable.json"));
    assert_eq!(row_names(&variables), ["Pump01.Run", "Pump01.Fault"]);
    assert_eq!(read_rows(&project.join("trend.json")).len(), 2);
    assert!(!project.join("digalm.json").exists());
    let _ = std::fs::remove_dir_all(project);
}

#[test]
fn dry_run_writes_nothing() {
    let project = motor_project("dry-run");
    let output = tagsync_in(&project, &["sync", "--dry-run"]);
    assert_success(&output);
    let text = stdout(&output);
    assert!(text.contains("variable: would append 3, update 0, delete 0"), "{text}");
    assert!(text.contains("Dry run: nothing written."));
    assert!(!project.join("variable.json").exists());
    let _ = std::fs::remove_dir_all(project);
}

#[test]
fn import_rebuilds_tag_list() {
    let project = unique_temp_dir("import");
    std::fs::write(
        project.join("variable.json"),
        r#"[{"NAME": "FT101", "TYPE": "REAL", "ADDR": "N7:1", "COMMENT": "Feed flow"}]"#,
    )
    .expect("write variable.json");

    let output = tagsync_in(&project, &["import", "--dry-run"]);
    assert_success(&output);
    assert!(stdout(&output).contains("import: 1 added, 0 removed, 0 unchanged"));
    assert!(!project.join("tags.json").exists());

    let output = tagsync_in(&project, &["import"]);
    assert_success(&output);
    let text = std::fs::read_to_string(project.join("tags.json")).expect("read tags.json");
    let tags: Vec<TagEntry> = serde_json::from_str(&text).expect("parse tags.json");
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].identity(), "FT101");
    assert_eq!(tags[0].description, "Feed flow");
    let _ = std::fs::remove_dir_all(project);
}

#[test]
fn import_keeps_rejected_removals() {
    let project = motor_project("import-keep");
    std::fs::write(project.join("variable.json"), "[]").expect("write variable.json");

    let output = tagsync_in(&project, &["import", "--keep", "Pump01"]);
    assert_success(&output);
    assert!(stdout(&output).contains("- Pump01"));
    let text = std::fs::read_to_string(project.join("tags.json")).expect("read tags.json");
    let tags: Vec<TagEntry> = serde_json::from_str(&text).expect("parse tags.json");
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].identity(), "Pump01");
    let _ = std::fs::remove_dir_all(project);
}

#[test]
fn missing_project_folder_fails() {
    let project = std::env::temp_dir().join(format!("tagsync-missing-{}", std::process::id()));
    let output = tagsync_in(&project, &["diff"]);
    assert!(!output.status.success());
    let text = stderr(&output);
    assert!(text.contains("invalid project folder"), "{text}");
    assert!(text.contains("Tip: pass --project"), "{text}");
}

#[test]
fn bad_selection_key_fails() {
    let project = motor_project("bad-key");
    let output = tagsync_in(&project, &["sync", "--yes", "--reject-all", "variable"]);
    assert!(!output.status.success());
    assert!(!project.join("variable.json").exists());
    let _ = std::fs::remove_dir_all(project);
}

#[test]
fn misspelled_subcommand_gets_suggestion() {
    let output = tagsync(&["snyc"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Did you mean: sync?"));
}
