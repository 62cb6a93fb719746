//! CLI surface tests for the `nst` binary
//!
//! These run the compiled binary in an isolated working directory with the
//! configuration environment cleared.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::TempDir;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

const CONFIG_VARS: [&str; 10] = [
    "DIRECTORY_URL",
    "ENDPOINT_HOST",
    "PROBE_COUNT",
    "PROBE_INTERVAL_MS",
    "PROBE_TIMEOUT_SECONDS",
    "TRANSFER_COUNT",
    "DOWNLOAD_SIZE_BYTES",
    "UPLOAD_SIZE_BYTES",
    "REQUEST_TIMEOUT_SECONDS",
    "ENABLE_COLOR",
];

/// Command for the binary, isolated from the caller's .env and environment
fn create_test_cmd(workdir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("nst").unwrap();
    cmd.current_dir(workdir.path());
    for var in CONFIG_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_help_lists_options() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--transfers"))
        .stdout(predicate::str::contains("--server"))
        .stdout(predicate::str::contains("--interactive"));
}

#[test]
fn test_version_flag() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_conflicting_color_flags() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["--color", "--no-color"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("--color"));
}

#[test]
fn test_invalid_server_override() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["--server", "http://h.example/", "--no-color"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_out_of_range_count_rejected_by_parser() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["--count", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--count"));
}

#[test]
fn test_invalid_env_file_value() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(".env"), "TRANSFER_COUNT=many\n").unwrap();

    create_test_cmd(&dir)
        .arg("--no-color")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("TRANSFER_COUNT"));
}

#[test]
fn test_unreachable_directory_exit_code() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["--directory", "http://127.0.0.1:1/servers", "--timeout", "2", "--no-color"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("DIRECTORY"));
}

#[test]
fn test_env_help_lists_variables() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .arg("--env-help")
        .assert()
        .success()
        .stdout(predicate::str::contains("TRANSFER_COUNT"))
        .stdout(predicate::str::contains("Configuration Priority"));
}

#[test]
fn test_write_env_example_then_check_it() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["--write-env-example", ".env"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Example configuration written to"));

    let written = std::fs::read_to_string(dir.path().join(".env")).unwrap();
    assert!(written.contains("# DIRECTORY_URL="));

    create_test_cmd(&dir)
        .arg("--check-env")
        .assert()
        .success()
        .stdout(predicate::str::contains(".env file is valid"));
}

#[test]
fn test_check_env_reports_bad_entries() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(".env"), "PROBE_COUNT=5\nTRANSFER_COUNT=99\n").unwrap();

    create_test_cmd(&dir)
        .arg("--check-env")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("TRANSFER_COUNT=99"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_json_run_against_mock_server() {
    let server = MockServer::start().await;
    let host = server.uri().trim_start_matches("http://").to_string();

    Mock::given(method("GET"))
        .and(path("/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"[{{"sponsor":"X","name":"Ankara","country":"Turkey","url":"http://{h}/upload.php","host":"{h}"}}]"#,
            h = host
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/download"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 20_000]))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let directory = format!("{}/servers", server.uri());
    let output = tokio::task::spawn_blocking(move || {
        let dir = TempDir::new().unwrap();
        create_test_cmd(&dir)
            .args([
                "--directory", &directory,
                "--count", "3",
                "--transfers", "2",
                "--download-size", "20000",
                "--upload-size", "10000",
                "--json",
                "--verbose",
                "--debug",
            ])
            .env("PROBE_INTERVAL_MS", "0")
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    // Diagnostics and log lines stay on stderr; stdout is exactly one JSON document
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Configuration Summary"));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["endpoint"]["sponsor"], "X");
    assert_eq!(report["download"]["succeeded"], 2);
    assert_eq!(report["upload"]["attempted"], 2);
    assert_eq!(report["latency"]["samples_ms"].as_array().unwrap().len(), 3);
}

#[test]
fn test_interactive_quit_without_running() {
    let dir = TempDir::new().unwrap();
    assert_cmd::Command::from_std(create_test_cmd(&dir))
        .args(["--interactive", "--no-color", "--server", "127.0.0.1:1"])
        .write_stdin("x\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Press Enter to start"))
        .stdout(predicate::str::contains("Selected server").not());
}

#[test]
fn test_interactive_failed_run_then_exit() {
    let dir = TempDir::new().unwrap();
    assert_cmd::Command::from_std(create_test_cmd(&dir))
        .args(["--interactive", "--no-color", "--server", "127.0.0.1:1", "--count", "1"])
        .write_stdin("\nx\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Benchmark failed"))
        .stdout(predicate::str::contains("Press Enter to run again"));
}
