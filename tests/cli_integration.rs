use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("intake-{prefix}-{}-{nanos}", std::process::id()));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(path, content).expect("write test file");
}

struct Output {
    ok: bool,
    stdout: Vec<u8>,
    stderr: String,
}

impl Output {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.stdout).unwrap_or_else(|e| {
            panic!(
                "invalid json ({e}): {}\nstderr: {}",
                String::from_utf8_lossy(&self.stdout),
                self.stderr
            )
        })
    }
}

/// Run the binary with `home` as INTAKE_HOME and HOME so no user config leaks in
fn run_intake(home: &Path, args: &[&str], stdin: Option<&str>) -> Output {
    let bin = std::env::var("CARGO_BIN_EXE_intake").unwrap_or_else(|_| {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("target");
        path.push("debug");
        if cfg!(windows) {
            path.push("intake.exe");
        } else {
            path.push("intake");
        }
        path.to_string_lossy().into_owned()
    });
    let mut cmd = Command::new(bin);
    cmd.args(args)
        .env("INTAKE_HOME", home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("XDG_DATA_HOME", home.join(".local"))
        .env_remove("INTAKE_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = cmd.spawn().expect("run intake");
    if let Some(mut pipe) = child.stdin.take() {
        pipe.write_all(stdin.unwrap_or("").as_bytes())
            .expect("write stdin");
    }
    let output = child.wait_with_output().expect("wait intake");
    Output {
        ok: output.status.success(),
        stdout: output.stdout,
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}

fn login(home: &Path, code: &str) {
    let out = run_intake(home, &["login", code], None);
    assert!(out.ok, "login failed: {}", out.stderr);
}

#[test]
fn add_splits_quantity_and_summary_reports_totals() {
    let home = unique_temp_dir("add");
    login(&home, "emp001");

    let out = run_intake(
        &home,
        &[
            "add", "--type", "box", "--length", "50", "--width", "40", "--height", "30",
            "--weight", "6", "--quantity", "2", "--json",
        ],
        None,
    );
    assert!(out.ok, "stderr: {}", out.stderr);
    let added = out.json();
    let arr = added.as_array().expect("array output");
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0]["weight"].as_f64(), Some(3.0));
    assert_eq!(arr[0]["groupKey"], arr[1]["groupKey"]);
    assert_eq!(arr[0]["employeeId"], "EMP001");

    let out = run_intake(&home, &["summary", "--json"], None);
    assert!(out.ok, "stderr: {}", out.stderr);
    let totals = out.json();
    assert_eq!(totals["totalPlaces"], 2);
    assert!((totals["totalWeight"].as_f64().unwrap() - 6.0).abs() < 1e-9);
    assert!((totals["totalVolume"].as_f64().unwrap() - 0.12).abs() < 1e-9);
    assert_eq!(totals["byType"]["box"]["places"], 2);
    assert_eq!(totals["byType"]["box"]["count"], 1);

    let _ = fs::remove_dir_all(home);
}

#[test]
fn cargo_commands_require_login() {
    let home = unique_temp_dir("no-login");
    let out = run_intake(&home, &["add", "--type", "box", "--weight", "5"], None);
    assert!(!out.ok);
    assert!(out.stderr.contains("Error: Not logged in"), "stderr: {}", out.stderr);

    let _ = fs::remove_dir_all(home);
}

#[test]
fn unknown_employee_is_rejected() {
    let home = unique_temp_dir("unknown");
    let out = run_intake(&home, &["login", "EMP999"], None);
    assert!(!out.ok);
    assert!(out.stderr.contains("Employee code EMP999 not found"), "stderr: {}", out.stderr);

    let out = run_intake(&home, &["status", "--json"], None);
    assert!(out.ok);
    assert_eq!(out.json()["loggedIn"], false);

    let _ = fs::remove_dir_all(home);
}

#[test]
fn invalid_weight_leaves_list_unchanged() {
    let home = unique_temp_dir("invalid");
    login(&home, "EMP002");

    let out = run_intake(&home, &["add", "--type", "box", "--weight", "0"], None);
    assert!(!out.ok);
    assert!(out.stderr.contains("Weight 0 kg is out of range"), "stderr: {}", out.stderr);

    let out = run_intake(&home, &["add", "--type", "box", "--weight", "5", "--height", "5"], None);
    assert!(!out.ok);
    assert!(out.stderr.contains("height 5 cm is out of range"), "stderr: {}", out.stderr);

    let out = run_intake(&home, &["list", "--json"], None);
    assert!(out.ok, "stderr: {}", out.stderr);
    assert_eq!(out.json(), Value::Array(Vec::new()));

    let _ = fs::remove_dir_all(home);
}

#[test]
fn remove_by_group_keeps_other_kinds() {
    let home = unique_temp_dir("remove");
    login(&home, "EMP001");
    assert!(run_intake(&home, &["add", "--type", "box", "--weight", "10", "-q", "2"], None).ok);
    assert!(run_intake(&home, &["add", "--type", "euro-pallet", "--weight", "250"], None).ok);

    let groups = run_intake(&home, &["groups", "--json"], None).json();
    let groups = groups.as_array().expect("array output");
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0]["count"], 2);
    let key = groups[0]["groupKey"].as_str().expect("group key").to_string();

    let out = run_intake(&home, &["remove", "--group", &key], None);
    assert!(out.ok, "stderr: {}", out.stderr);
    assert!(out.stderr.contains("Removed 2 places"), "stderr: {}", out.stderr);

    let list = run_intake(&home, &["list", "--json"], None).json();
    let list = list.as_array().expect("array output");
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["cargoType"], "euro-pallet");

    let out = run_intake(&home, &["remove", "--group", &key, "--json"], None);
    assert!(out.ok, "stderr: {}", out.stderr);
    assert_eq!(out.json(), serde_json::json!({ "removed": 0, "remaining": 1 }));

    let out = run_intake(&home, &["clear", "--json"], None);
    assert!(out.ok, "stderr: {}", out.stderr);
    assert_eq!(out.json(), serde_json::json!({ "removed": 1, "remaining": 0 }));

    let _ = fs::remove_dir_all(home);
}

#[test]
fn send_moves_list_into_history() {
    let home = unique_temp_dir("send");
    login(&home, "EMP003");
    assert!(run_intake(&home, &["add", "--type", "american-pallet", "--weight", "300"], None).ok);

    let out = run_intake(&home, &["send", "--json"], None);
    assert!(out.ok, "stderr: {}", out.stderr);
    let snapshot = out.json();
    assert!(snapshot["id"].as_str().unwrap().starts_with("SHP-"));
    assert_eq!(snapshot["status"], "pending");
    assert_eq!(snapshot["employeeName"], "Sidorov Dmitry");
    assert_eq!(snapshot["totals"]["totalPlaces"], 1);

    let totals = run_intake(&home, &["summary", "--json"], None).json();
    assert_eq!(totals["totalPlaces"], 0);

    let history = run_intake(&home, &["history", "--json"], None).json();
    assert_eq!(history.as_array().map(Vec::len), Some(1));
    assert_eq!(history[0]["records"][0]["cargoType"], "american-pallet");

    let csv = run_intake(&home, &["history", "--csv"], None);
    assert!(csv.ok);
    let text = String::from_utf8(csv.stdout).unwrap();
    assert_eq!(text.lines().count(), 2);
    assert!(text.lines().nth(1).unwrap().contains(",EMP003,Sidorov Dmitry,pending,1,300,"));

    // Nothing left to send
    let out = run_intake(&home, &["send"], None);
    assert!(!out.ok);
    assert!(out.stderr.contains("cargo list is empty"), "stderr: {}", out.stderr);

    let _ = fs::remove_dir_all(home);
}

#[test]
fn logout_discards_unsent_list() {
    let home = unique_temp_dir("logout");
    login(&home, "EMP001");
    assert!(run_intake(&home, &["add", "--type", "box", "--weight", "4"], None).ok);

    let out = run_intake(&home, &["logout"], None);
    assert!(out.ok);
    assert!(out.stderr.contains("Goodbye, Ivanov Aleksei"), "stderr: {}", out.stderr);

    login(&home, "EMP001");
    let list = run_intake(&home, &["list", "--json"], None).json();
    assert_eq!(list, Value::Array(Vec::new()));

    let _ = fs::remove_dir_all(home);
}

#[test]
fn decode_reports_matching_strategy() {
    let home = unique_temp_dir("decode");
    let out = run_intake(&home, &["decode", "https://x.io/u/EMP042/profile", "--json"], None);
    assert!(out.ok, "stderr: {}", out.stderr);
    let json = out.json();
    assert_eq!(json["code"], "EMP042");
    assert_eq!(json["strategy"], "url-path");

    let out = run_intake(&home, &["decode", r#"{"emp_code":"emp007"}"#], None);
    assert!(out.ok, "stderr: {}", out.stderr);
    assert!(String::from_utf8_lossy(&out.stdout).starts_with("EMP007"));

    let out = run_intake(&home, &["decode", "no code here"], None);
    assert!(!out.ok);
    assert!(
        out.stderr.contains("No employee code found in text: no code here"),
        "stderr: {}",
        out.stderr
    );

    let _ = fs::remove_dir_all(home);
}

#[test]
fn scan_logs_in_with_first_known_badge() {
    let home = unique_temp_dir("scan");
    let out = run_intake(
        &home,
        &["scan"],
        Some("\nhello\nhello\nEMP999\nhttps://b.io/EMP002\nEMP001\n"),
    );
    assert!(out.ok, "stderr: {}", out.stderr);
    assert_eq!(out.stderr.matches("Unrecognized QR code (text: hello)").count(), 1);
    assert!(out.stderr.contains("Employee code EMP999 not found"), "stderr: {}", out.stderr);
    assert!(out.stderr.contains("Welcome, Petrova Maria!"), "stderr: {}", out.stderr);

    let status = run_intake(&home, &["status", "--json"], None).json();
    assert_eq!(status["loggedIn"], true);
    assert_eq!(status["session"]["id"], "EMP002");

    let _ = fs::remove_dir_all(home);
}

#[test]
fn scan_without_code_fails() {
    let home = unique_temp_dir("scan-none");
    let out = run_intake(&home, &["scan"], Some("nothing useful\n"));
    assert!(!out.ok);
    assert!(out.stderr.contains("Scanner input ended"), "stderr: {}", out.stderr);

    let _ = fs::remove_dir_all(home);
}

#[test]
fn roster_from_config_replaces_demo_directory() {
    let home = unique_temp_dir("roster");
    let roster = home.join("roster.txt");
    write_file(
        &roster,
        "=====\nEMPLOYEE ACCESS CODES\nUpdated: 15.01.2026\n=====\n\nLeontiev Dmitry\nEMP010\n-----\nSmirnov Pavel\nK9CM4CRF\n-----\n",
    );
    write_file(
        &home.join("config.toml"),
        &format!("roster = '{}'\nsession_hours = 12\n", roster.display()),
    );

    let out = run_intake(&home, &["employees", "--json"], None);
    assert!(out.stderr.contains("Roster entries skipped, not EMP### codes: K9CM4CRF"), "stderr: {}", out.stderr);
    let employees = out.json();
    let arr = employees.as_array().expect("array output");
    assert_eq!(arr.len(), 1);
    assert_eq!(arr[0]["code"], "EMP010");
    assert_eq!(arr[0]["department"], "Logistics");

    login(&home, "010");
    let out = run_intake(&home, &["login", "EMP001"], None);
    assert!(!out.ok, "demo employees are gone once a roster is set");

    let _ = fs::remove_dir_all(home);
}

#[test]
fn batch_photo_is_named_on_every_unit() {
    let home = unique_temp_dir("photo");
    let photo = home.join("label.jpg");
    fs::write(&photo, vec![0xffu8; 4096]).expect("write photo");
    login(&home, "EMP001");

    let photo_arg = photo.to_string_lossy().into_owned();
    let out = run_intake(
        &home,
        &["add", "--type", "box", "--weight", "30", "-q", "3", "--photo", &photo_arg, "--json"],
        None,
    );
    assert!(out.ok, "stderr: {}", out.stderr);
    let added = out.json();
    let arr = added.as_array().expect("array output");
    assert_eq!(arr.len(), 3);
    for record in arr {
        assert_eq!(record["photos"], serde_json::json!(["label.jpg"]));
        assert_eq!(record["batchId"], arr[0]["id"]);
    }

    write_file(&home.join("config.toml"), "max_photo_bytes = 1024\n");
    let out = run_intake(&home, &["add", "--type", "box", "--weight", "5", "--photo", &photo_arg], None);
    assert!(!out.ok);
    assert!(out.stderr.contains("Photo label.jpg is 4096 bytes, the limit is 1024"), "stderr: {}", out.stderr);

    let _ = fs::remove_dir_all(home);
}

#[test]
fn memory_store_keeps_nothing_between_runs() {
    let home = unique_temp_dir("memory");
    let out = run_intake(&home, &["--memory", "login", "EMP001"], None);
    assert!(out.ok, "stderr: {}", out.stderr);
    let status = run_intake(&home, &["--memory", "status", "--json"], None).json();
    assert_eq!(status["loggedIn"], false);
    assert!(!home.join("intake.db").exists());

    let _ = fs::remove_dir_all(home);
}
