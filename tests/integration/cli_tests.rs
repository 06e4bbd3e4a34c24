//! Integration tests for the CLI binary.
//!
//! Runs the `atnd` binary against a temporary data directory. Registered as
//! a [[test]] in the attendance-cli crate so that CARGO_BIN_EXE_atnd is
//! available.

use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

const PASSPHRASE: &str = "correct horse battery staple";

struct Sandbox {
    home: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            home: tempfile::tempdir().expect("failed to create temp dir"),
        }
    }

    fn run(&self, wallet: &str, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_atnd"))
            .arg("--home")
            .arg(self.home.path())
            .arg("--wallet")
            .arg(wallet)
            .args(args)
            .env("ATTENDANCE_PASSPHRASE", PASSPHRASE)
            .env_remove("ATTENDANCE_HOME")
            .output()
            .expect("failed to execute atnd")
    }

    /// Run with `--json`, require success and parse stdout.
    fn json(&self, wallet: &str, args: &[&str]) -> Value {
        let mut full = vec!["--json"];
        full.extend_from_slice(args);
        let output = self.run(wallet, &full);
        assert!(
            output.status.success(),
            "atnd {args:?} failed, stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
    }

    fn init_wallet(&self, name: &str) -> String {
        let summary = self.json(name, &["wallet", "init", "--label", name]);
        summary["address"].as_str().expect("address").to_string()
    }

    /// Create a wallet and register its profile.
    fn enroll(&self, name: &str, role: &str) -> String {
        let address = self.init_wallet(name);
        let email = format!("{name}@university.edu");
        let id_flag = if role == "teacher" { "--employee-id" } else { "--student-id" };
        let decision = self.json(
            name,
            &[
                "profile",
                "init",
                "--role",
                role,
                "--name",
                name,
                "--email",
                &email,
                "--phone",
                "+1 555 0100",
                "--institution",
                "State University",
                id_flag,
                "ID-1",
            ],
        );
        assert_eq!(decision["decision"], "accepted");
        address
    }

    fn declare_cs101(&self, teacher: &str) -> String {
        let decision = self.json(
            teacher,
            &[
                "session",
                "declare",
                "--course",
                "CS101",
                "--name",
                "Computer Science 101",
                "--start",
                "2025-09-08T10:00:00Z",
                "--end",
                "2025-09-08T11:30:00Z",
                "--lat",
                "40.7128",
                "--lon=-74.0060",
                "--radius",
                "50",
                "--window",
                "10",
            ],
        );
        assert_eq!(decision["decision"], "accepted");
        decision["value"]["id"].as_str().expect("session id").to_string()
    }
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn cli_responds_to_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_atnd"))
        .arg("--help")
        .output()
        .expect("failed to execute atnd --help");

    assert!(output.status.success(), "atnd --help failed: {}", stderr(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("check-in"), "help should list check-in, got: {stdout}");
}

#[test]
fn cli_responds_to_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_atnd"))
        .arg("--version")
        .output()
        .expect("failed to execute atnd --version");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("0.1"));
}

#[test]
fn cli_exits_with_error_on_unknown_flag() {
    let output = Command::new(env!("CARGO_BIN_EXE_atnd"))
        .arg("--nonexistent-flag")
        .output()
        .expect("failed to execute atnd");
    assert!(!output.status.success());
}

#[test]
fn cli_wallet_init_show_list() {
    let sb = Sandbox::new();
    let address = sb.init_wallet("teacher");
    assert_eq!(address.len(), 58);

    let shown = sb.json("teacher", &["wallet", "show"]);
    assert_eq!(shown["address"], address.as_str());
    assert_eq!(shown["label"], "teacher");

    let again = sb.run("teacher", &["wallet", "init"]);
    assert!(!again.status.success());
    assert!(stderr(&again).contains("already exists"));

    let listed = sb.run("teacher", &["wallet", "list"]);
    assert!(listed.status.success());
    assert!(String::from_utf8_lossy(&listed.stdout).contains(&address));
}

#[test]
fn cli_missing_wallet_is_an_error() {
    let sb = Sandbox::new();
    let output = sb.run("nobody", &["check-in", "ases_x", "--lat", "0", "--lon", "0"]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.starts_with("error:"), "got: {err}");
    assert!(err.contains("not found"));
}

#[test]
fn cli_check_in_and_eligibility() {
    let sb = Sandbox::new();
    sb.enroll("teacher", "teacher");
    let student = sb.enroll("student", "student");
    let session_id = sb.declare_cs101("teacher");

    let decision = sb.json(
        "student",
        &[
            "check-in",
            &session_id,
            "--lat",
            "40.7128",
            "--lon=-74.0060",
            "--at",
            "2025-09-08T10:02:00Z",
        ],
    );
    assert_eq!(decision["decision"], "accepted");
    assert_eq!(decision["value"]["status"], "present");
    assert_eq!(decision["value"]["distance_from_class"], 0);
    assert!(decision["value"]["reference"].as_str().unwrap().starts_with("tx_"));

    let dup = sb.run(
        "student",
        &[
            "check-in",
            &session_id,
            "--lat",
            "40.7128",
            "--lon=-74.0060",
            "--at",
            "2025-09-08T10:03:00Z",
        ],
    );
    assert!(!dup.status.success());
    assert!(stderr(&dup).contains("already checked in"));

    let e = sb.json("teacher", &["report", "eligibility", "--course", "CS101", "--student", &student]);
    assert_eq!(e["total_sessions"], 1);
    assert_eq!(e["attended_sessions"], 1);
    assert_eq!(e["is_eligible"], true);
    assert_eq!(e["band"], "eligible");

    let show = sb.json("teacher", &["session", "show", &session_id]);
    assert_eq!(show["session"]["attendee_count"], 1);
    assert_eq!(show["records"].as_array().unwrap().len(), 1);
}

#[test]
fn cli_rejects_far_and_late_check_in() {
    let sb = Sandbox::new();
    sb.enroll("teacher", "teacher");
    sb.enroll("student", "student");
    let session_id = sb.declare_cs101("teacher");

    let output = sb.run(
        "student",
        &[
            "check-in",
            &session_id,
            "--lat",
            "40.7200",
            "--lon=-74.0060",
            "--at",
            "2025-09-08T10:15:00Z",
        ],
    );
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("Maximum allowed distance is 50m"), "got: {err}");
    assert!(err.contains("Check-in window closed"), "got: {err}");
}

#[test]
fn cli_excuse_submit_and_review() {
    let sb = Sandbox::new();
    sb.enroll("teacher", "teacher");
    let student = sb.enroll("student", "student");
    let session_id = sb.declare_cs101("teacher");

    let submitted = sb.json(
        "student",
        &[
            "excuse",
            "submit",
            &session_id,
            "--reason",
            "Medical appointment",
            "--at",
            "2025-09-08T14:00:00Z",
        ],
    );
    assert_eq!(submitted["value"]["approval_status"], "pending");
    let excuse_id = submitted["value"]["id"].as_str().unwrap().to_string();

    let pending = sb.json("teacher", &["excuse", "list", "--pending"]);
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let denied = sb.run("student", &["excuse", "review", &excuse_id, "--verdict", "approve"]);
    assert!(!denied.status.success());
    assert!(stderr(&denied).contains("Only the class checker"));

    let reviewed = sb.json(
        "teacher",
        &[
            "excuse",
            "review",
            &excuse_id,
            "--verdict",
            "approve",
            "--notes",
            "Documentation provided",
            "--at",
            "2025-09-08T16:00:00Z",
        ],
    );
    assert_eq!(reviewed["value"]["excuse"]["approval_status"], "approved");
    assert_eq!(reviewed["value"]["record_created"], true);

    let stats = sb.json("teacher", &["report", "stats", "--student", &student]);
    assert_eq!(stats["excused_absences"], 1);
    assert_eq!(stats["unexcused_absences"], 0);
}

#[test]
fn cli_profile_init_and_show() {
    let sb = Sandbox::new();
    let address = sb.enroll("teacher", "teacher");

    let shown = sb.json("teacher", &["profile", "show"]);
    assert_eq!(shown["role"], "teacher");
    assert_eq!(shown["email"], "teacher@university.edu");
    assert_eq!(shown["employee_id"], "ID-1");
    assert_eq!(shown["verified"], false);

    let by_address = sb.json("teacher", &["profile", "show", &address]);
    assert_eq!(by_address, shown);

    sb.init_wallet("copycat");
    let taken = sb.run(
        "copycat",
        &[
            "profile",
            "init",
            "--role",
            "student",
            "--name",
            "Copy Cat",
            "--email",
            "TEACHER@university.edu",
            "--phone",
            "1",
            "--institution",
            "State University",
            "--student-id",
            "S-1",
        ],
    );
    assert!(!taken.status.success());
    assert!(stderr(&taken).contains("Email address is already registered"));

    let missing = sb.run("copycat", &["profile", "show"]);
    assert!(!missing.status.success());
    assert!(stderr(&missing).contains("no profile"));

    let listed = sb.json("teacher", &["profile", "list"]);
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[test]
fn cli_roles_and_location_guard_check_in() {
    let sb = Sandbox::new();
    sb.enroll("teacher", "teacher");
    sb.enroll("student", "student");
    let session_id = sb.declare_cs101("teacher");

    let as_teacher = sb.run(
        "teacher",
        &["check-in", &session_id, "--lat", "40.7128", "--lon=-74.0060", "--at", "2025-09-08T10:01:00Z"],
    );
    assert!(!as_teacher.status.success());
    assert!(stderr(&as_teacher).contains("Only students can check in"));

    let not_a_number = sb.run(
        "student",
        &["check-in", &session_id, "--lat", "NaN", "--lon=-74.0060", "--at", "2025-09-08T10:01:00Z"],
    );
    assert!(!not_a_number.status.success());
    let err = stderr(&not_a_number);
    assert!(err.contains("not a valid latitude and longitude"), "got: {err}");
    assert!(!err.contains("0m away"), "got: {err}");

    let declared_by_student = sb.run(
        "student",
        &[
            "session", "declare", "--course", "CS101", "--name", "Hijack", "--start",
            "2025-09-09T10:00:00Z", "--end", "2025-09-09T11:00:00Z", "--lat", "0", "--lon", "0",
        ],
    );
    assert!(!declared_by_student.status.success());
    assert!(stderr(&declared_by_student).contains("Only teachers can declare sessions"));
}

#[test]
fn cli_seed_populates_reports() {
    let sb = Sandbox::new();
    sb.init_wallet("teacher");
    let student = sb.init_wallet("student");

    let report = sb.json("teacher", &["seed", "--student", &student]);
    assert_eq!(report["profiles"].as_array().unwrap().len(), 2);
    assert_eq!(report["sessions"].as_array().unwrap().len(), 5);

    let rows = sb.json("student", &["report", "summary"]);
    let courses: Vec<&str> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["course_code"].as_str().unwrap())
        .collect();
    assert_eq!(courses, vec!["CS101", "MATH201", "PHYS301"]);

    let active = sb.json("teacher", &["session", "list", "--active"]);
    assert_eq!(active.as_array().unwrap().len(), 2);
}
