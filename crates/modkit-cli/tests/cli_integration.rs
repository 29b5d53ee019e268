//! CLI subprocess integration tests.
//!
//! These tests invoke the `modkit` binary as a subprocess, feed it an
//! argument document, and check the exit code and the JSON result on stdout.

use serde_json::{json, Value};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::{Command, Output, Stdio};

fn modkit_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_modkit"));
    cmd.env_remove("MODKIT_MODULE_ARGS").env_remove("MODKIT_LOG");
    cmd
}

fn run_with_stdin(mut cmd: Command, stdin: &str) -> Output {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn envelope(output: &Output) -> Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(stdout.trim())
        .unwrap_or_else(|e| panic!("stdout is not a JSON envelope ({e}): {stdout}"))
}

/// Run `module` with `args` on stdin; returns the exit code and envelope.
fn run_module(module: &str, args: &Value) -> (i32, Value) {
    let mut cmd = modkit_bin();
    cmd.arg(module);
    let output = run_with_stdin(cmd, &args.to_string());
    (output.status.code().unwrap(), envelope(&output))
}

fn path_str(path: &Path) -> String {
    path.display().to_string()
}

#[test]
fn cli_version_exits_zero() {
    let output = modkit_bin().arg("--version").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("modkit"));
}

#[test]
fn cli_help_lists_modules() {
    let output = modkit_bin().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for module in ["file", "copy", "append", "replace", "command", "stat"] {
        assert!(stdout.contains(module), "help must list '{module}': {stdout}");
    }
}

#[test]
fn copy_content_converges() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("motd");
    let args = json!({"dest": path_str(&dest), "content": "welcome\n", "mode": "0640"});

    let (code, first) = run_module("copy", &args);
    assert_eq!(code, 0, "{first}");
    assert_eq!(first["changed"], true);
    assert!(first.get("failed").is_none());
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "welcome\n");

    let (code, second) = run_module("copy", &args);
    assert_eq!(code, 0);
    assert_eq!(second["changed"], false);
    assert_eq!(first["checksum"], second["checksum"]);
}

#[test]
fn copy_masks_sensitive_content_in_invocation() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("token");
    let (code, result) = run_module(
        "copy",
        &json!({"dest": path_str(&dest), "content": "hunter2"}),
    );
    assert_eq!(code, 0);
    assert_eq!(
        result["invocation"]["content"],
        "VALUE_SPECIFIED_IN_NO_LOG_PARAMETER"
    );
    assert!(!result.to_string().contains("hunter2"));
}

#[test]
fn copy_with_backup_keeps_previous_content() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("app.conf");
    std::fs::write(&dest, "old\n").unwrap();

    let (code, result) = run_module(
        "copy",
        &json!({"dest": path_str(&dest), "content": "new\n", "backup": "yes"}),
    );
    assert_eq!(code, 0, "{result}");
    let backup = result["backup_file"].as_str().unwrap();
    assert_eq!(std::fs::read_to_string(backup).unwrap(), "old\n");
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "new\n");
}

#[test]
fn copy_rejects_src_and_content_together() {
    let dir = tempfile::tempdir().unwrap();
    let (code, result) = run_module(
        "copy",
        &json!({"dest": path_str(&dir.path().join("x")), "src": "/etc/hostname", "content": "x"}),
    );
    assert_eq!(code, 1);
    assert_eq!(result["failed"], true);
    assert!(result["msg"].as_str().unwrap().contains("mutually exclusive"));
    assert!(result.get("invocation").is_none());
}

#[test]
fn copy_check_mode_leaves_disk_alone() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("f");
    let (code, result) = run_module(
        "copy",
        &json!({"dest": path_str(&dest), "content": "x", "_modkit_check_mode": true}),
    );
    assert_eq!(code, 0);
    assert_eq!(result["changed"], true);
    assert!(!dest.exists());
}

#[test]
fn file_directory_and_link() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("releases").join("v1");

    let (code, result) = run_module(
        "file",
        &json!({"path": path_str(&target), "state": "directory", "mode": "0750"}),
    );
    assert_eq!(code, 0, "{result}");
    assert_eq!(result["changed"], true);
    assert!(target.is_dir());

    let (_, again) = run_module(
        "file",
        &json!({"path": path_str(&target), "state": "directory", "mode": "0750"}),
    );
    assert_eq!(again["changed"], false);

    let link = dir.path().join("current");
    let args = json!({"dest": path_str(&link), "state": "link", "src": path_str(&target)});
    let (_, linked) = run_module("file", &args);
    assert_eq!(linked["changed"], true);
    assert_eq!(std::fs::read_link(&link).unwrap(), target);
    let (_, relinked) = run_module("file", &args);
    assert_eq!(relinked["changed"], false);
}

#[test]
fn file_link_check_mode_compares_exact_target() {
    let dir = tempfile::tempdir().unwrap();
    let link = dir.path().join("l");
    std::os::unix::fs::symlink("a/", &link).unwrap();

    let (code, result) = run_module(
        "file",
        &json!({"dest": path_str(&link), "state": "link", "src": "a", "_modkit_check_mode": true}),
    );
    assert_eq!(code, 0, "{result}");
    assert_eq!(result["changed"], true);
    assert_eq!(std::fs::read_link(&link).unwrap().as_os_str(), "a/");
}

#[test]
fn file_link_requires_src() {
    let dir = tempfile::tempdir().unwrap();
    let (code, result) = run_module(
        "file",
        &json!({"path": path_str(&dir.path().join("l")), "state": "link"}),
    );
    assert_eq!(code, 1);
    assert!(result["msg"]
        .as_str()
        .unwrap()
        .starts_with("src is required when state="));
}

#[test]
fn file_rejects_unknown_state() {
    let dir = tempfile::tempdir().unwrap();
    let (code, result) = run_module(
        "file",
        &json!({"path": path_str(dir.path()), "state": "absent"}),
    );
    assert_eq!(code, 1);
    assert!(result["msg"].as_str().unwrap().contains("state must be one of"));
}

#[test]
fn append_reports_diff_once() {
    let dir = tempfile::tempdir().unwrap();
    let hosts = dir.path().join("hosts");
    std::fs::write(&hosts, "127.0.0.1 localhost").unwrap();
    let args = json!({"path": path_str(&hosts), "content": "10.0.0.5 db\n"});

    let (code, first) = run_module("append", &args);
    assert_eq!(code, 0, "{first}");
    assert_eq!(first["changed"], true);
    assert_eq!(first["diff"]["after"], "127.0.0.1 localhost\n10.0.0.5 db\n");

    let (_, second) = run_module("append", &args);
    assert_eq!(second["changed"], false);
    assert!(second.get("diff").is_none());
}

#[test]
fn append_accepts_non_utf8_files() {
    let dir = tempfile::tempdir().unwrap();
    let conf = dir.path().join("legacy.conf");
    std::fs::write(&conf, b"caf\xe9=1\n").unwrap();
    let args = json!({"path": path_str(&conf), "content": "extra\n"});

    let (code, first) = run_module("append", &args);
    assert_eq!(code, 0, "{first}");
    assert_eq!(first["changed"], true);
    assert_eq!(std::fs::read(&conf).unwrap(), b"caf\xe9=1\nextra\n");

    let (_, second) = run_module("append", &args);
    assert_eq!(second["changed"], false);
}

#[test]
fn append_to_empty_file_starts_on_new_line() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("empty");
    std::fs::write(&file, "").unwrap();

    let (code, result) = run_module(
        "append",
        &json!({"path": path_str(&file), "content": "line\n"}),
    );
    assert_eq!(code, 0, "{result}");
    assert_eq!(result["diff"]["after"], "\nline\n");
    assert_eq!(std::fs::read_to_string(&file).unwrap(), "\nline\n");
}

#[test]
fn replace_substitutes_and_converges() {
    let dir = tempfile::tempdir().unwrap();
    let conf = dir.path().join("sshd_config");
    std::fs::write(&conf, "Port 22\nPermitRootLogin yes\n").unwrap();
    std::fs::set_permissions(&conf, std::fs::Permissions::from_mode(0o600)).unwrap();
    let args = json!({
        "path": path_str(&conf),
        "regexp": "(?m)^PermitRootLogin .*$",
        "replace": "PermitRootLogin no",
    });

    let (code, first) = run_module("replace", &args);
    assert_eq!(code, 0, "{first}");
    assert_eq!(first["changed"], true);
    assert_eq!(first["diff"]["after"], "Port 22\nPermitRootLogin no\n");
    assert_eq!(
        std::fs::read_to_string(&conf).unwrap(),
        "Port 22\nPermitRootLogin no\n"
    );
    assert_eq!(
        std::fs::metadata(&conf).unwrap().permissions().mode() & 0o7777,
        0o600
    );

    let (_, second) = run_module("replace", &args);
    assert_eq!(second["changed"], false);
}

#[test]
fn replace_check_mode_leaves_file_alone() {
    let dir = tempfile::tempdir().unwrap();
    let conf = dir.path().join("app.ini");
    std::fs::write(&conf, "level=debug\n").unwrap();

    let (code, result) = run_module(
        "replace",
        &json!({
            "path": path_str(&conf),
            "regexp": "level=(\\w+)",
            "replace": "level=info",
            "_modkit_check_mode": true,
        }),
    );
    assert_eq!(code, 0, "{result}");
    assert_eq!(result["changed"], true);
    assert_eq!(result["diff"]["after"], "level=info\n");
    assert_eq!(std::fs::read_to_string(&conf).unwrap(), "level=debug\n");
}

#[test]
fn replace_rejects_invalid_pattern() {
    let dir = tempfile::tempdir().unwrap();
    let conf = dir.path().join("f");
    std::fs::write(&conf, "x\n").unwrap();

    let (code, result) = run_module(
        "replace",
        &json!({"path": path_str(&conf), "regexp": "[", "replace": "y"}),
    );
    assert_eq!(code, 1);
    assert!(result["msg"]
        .as_str()
        .unwrap()
        .starts_with("invalid regular expression"));
    assert_eq!(std::fs::read_to_string(&conf).unwrap(), "x\n");
}

#[test]
fn command_captures_output() {
    let (code, result) = run_module(
        "command",
        &json!({"cmd": ["sh", "-c", "cat; echo \"-$GREETING\""], "stdin": "hi", "env": {"GREETING": "there"}}),
    );
    assert_eq!(code, 0, "{result}");
    assert_eq!(result["changed"], true);
    assert_eq!(result["rc"], 0);
    assert_eq!(result["stdout"], "hi-there\n");
}

#[test]
fn command_nonzero_rc_fails() {
    let (code, result) = run_module("command", &json!({"argv": "sh, -c, exit 4"}));
    assert_eq!(code, 1);
    assert_eq!(result["failed"], true);
    assert_eq!(result["rc"], 4);
    assert_eq!(result["msg"], "non-zero return code");
}

#[test]
fn command_creates_guard_skips() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("done");
    std::fs::write(&marker, "").unwrap();
    let (code, result) = run_module(
        "command",
        &json!({"argv": ["false"], "creates": path_str(&marker)}),
    );
    assert_eq!(code, 0);
    assert_eq!(result["changed"], false);
    assert_eq!(result["skipped"], true);
}

#[test]
fn stat_reports_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("data");
    std::fs::write(&file, "12345").unwrap();

    let (code, result) = run_module("stat", &json!({"path": path_str(&file)}));
    assert_eq!(code, 0);
    assert_eq!(result["changed"], false);
    assert_eq!(result["stat"]["exists"], true);
    assert_eq!(result["stat"]["size"], 5);
    assert_eq!(result["stat"]["checksum"].as_str().unwrap().len(), 32);

    let (_, missing) = run_module("stat", &json!({"path": path_str(&dir.path().join("no"))}));
    assert_eq!(missing["stat"]["exists"], false);
}

#[test]
fn args_from_environment_variable() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("f");
    std::fs::write(&file, "x").unwrap();
    let output = modkit_bin()
        .arg("stat")
        .env("MODKIT_MODULE_ARGS", json!({"path": path_str(&file)}).to_string())
        .stdin(Stdio::null())
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(envelope(&output)["stat"]["isreg"], true);
}

#[test]
fn args_from_file_argument() {
    let dir = tempfile::tempdir().unwrap();
    let args = dir.path().join("args.json");
    std::fs::write(&args, json!({"path": path_str(dir.path())}).to_string()).unwrap();
    let output = modkit_bin().arg("stat").arg(&args).output().unwrap();
    assert!(output.status.success());
    assert_eq!(envelope(&output)["stat"]["isdir"], true);
}

#[test]
fn empty_input_fails() {
    let mut cmd = modkit_bin();
    cmd.arg("stat");
    let output = run_with_stdin(cmd, "");
    assert_eq!(output.status.code(), Some(1));
    let result = envelope(&output);
    assert_eq!(result["failed"], true);
    assert!(result["msg"].as_str().unwrap().contains("empty input"));
}

#[test]
fn malformed_input_fails() {
    let mut cmd = modkit_bin();
    cmd.arg("stat");
    let output = run_with_stdin(cmd, "[1, 2]");
    assert_eq!(output.status.code(), Some(1));
    assert!(envelope(&output)["msg"]
        .as_str()
        .unwrap()
        .contains("invalid module arguments"));
}

#[test]
fn logs_stay_off_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = modkit_bin();
    cmd.args(["--verbose", "copy"]);
    let output = run_with_stdin(
        cmd,
        &json!({"dest": path_str(&dir.path().join("f")), "content": "x"}).to_string(),
    );
    assert!(output.status.success());
    // stdout must still be exactly one JSON document.
    assert_eq!(envelope(&output)["changed"], true);
    assert!(!output.stderr.is_empty());
}
