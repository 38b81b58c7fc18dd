use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd(dir: &Path) -> Command {
    let mut c = Command::new(assert_cmd::cargo_bin!("skybook"));
    c.current_dir(dir)
        .env_remove("SKYBOOK_API_URL")
        .env_remove("SKYBOOK_SESSION_FILE")
        .env_remove("RUST_LOG")
        .args(["--api-url", "http://127.0.0.1:9"]);
    c
}

fn session_file(dir: &Path, role: Option<&str>) -> PathBuf {
    let path = dir.join("session.json");
    if let Some(role) = role {
        let body = format!(
            r#"{{"user":{{"id":"9","first_name":"Ana","role":"{role}"}},"token":"t"}}"#
        );
        std::fs::write(&path, body).unwrap();
    }
    path
}

#[test]
fn top_level_help() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Search, book and manage flights on a SkyBook server",
        ))
        .stdout(predicate::str::contains("Examples:"))
        .stdout(predicate::str::contains("skybook flights -f JFK -t LAX"))
        .stdout(predicate::str::contains("bookings"))
        .stdout(predicate::str::contains("admin"));
}

#[test]
fn top_level_version() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("skybook 0.3.0"));
}

#[test]
fn flights_help_lists_filters() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path())
        .args(["flights", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-f, --from <CITY|IATA>"))
        .stdout(predicate::str::contains("-t, --to <CITY|IATA>"))
        .stdout(predicate::str::contains("-d, --date <YYYY-MM-DD>"))
        .stdout(predicate::str::contains("--json"));
}

#[test]
fn admin_help_lists_actions() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path())
        .args(["admin", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("locations"))
        .stdout(predicate::str::contains("add-location"))
        .stdout(predicate::str::contains("update-location"))
        .stdout(predicate::str::contains("delete-location"))
        .stdout(predicate::str::contains("add-flight"));
}

#[test]
fn whoami_without_session() {
    let dir = tempfile::tempdir().unwrap();
    let session = session_file(dir.path(), None);
    cmd(dir.path())
        .arg("--session-file")
        .arg(&session)
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in."));
}

#[test]
fn whoami_reads_stored_session() {
    let dir = tempfile::tempdir().unwrap();
    let session = session_file(dir.path(), Some("ADMIN"));
    cmd(dir.path())
        .arg("--session-file")
        .arg(&session)
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Hello, Ana (ADMIN, id 9)"));
}

#[test]
fn protected_route_without_session_points_to_login() {
    let dir = tempfile::tempdir().unwrap();
    let session = session_file(dir.path(), None);
    cmd(dir.path())
        .arg("--session-file")
        .arg(&session)
        .args(["open", "/history"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Please log in to continue to /history"));
}

#[test]
fn protected_route_json_carries_return_path() {
    let dir = tempfile::tempdir().unwrap();
    let session = session_file(dir.path(), None);
    cmd(dir.path())
        .arg("--session-file")
        .arg(&session)
        .args(["open", "/admin", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""route":"/login""#))
        .stdout(predicate::str::contains(r#""return_to":"/admin""#));
}

#[test]
fn unknown_route_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path())
        .args(["open", "/nowhere"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown route"));
}

#[test]
fn unknown_route_json_error() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path())
        .args(["open", "/nowhere", "--json"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains(r#""kind":"invalid_route""#));
}

#[test]
fn logout_twice_is_fine() {
    let dir = tempfile::tempdir().unwrap();
    let session = session_file(dir.path(), Some("CLIENT"));
    for _ in 0..2 {
        cmd(dir.path())
            .arg("--session-file")
            .arg(&session)
            .arg("logout")
            .assert()
            .success()
            .stdout(predicate::str::contains("Logged out."));
    }
    assert!(!session.exists());
}

#[test]
fn bookings_require_login() {
    let dir = tempfile::tempdir().unwrap();
    let session = session_file(dir.path(), None);
    cmd(dir.path())
        .arg("--session-file")
        .arg(&session)
        .arg("bookings")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("log in first"));
}

#[test]
fn client_cannot_use_admin_commands() {
    let dir = tempfile::tempdir().unwrap();
    let session = session_file(dir.path(), Some("CLIENT"));
    cmd(dir.path())
        .arg("--session-file")
        .arg(&session)
        .args(["admin", "locations"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("/admin is not available to your account"));
}

#[test]
fn same_airports_rejected_before_any_request() {
    let dir = tempfile::tempdir().unwrap();
    let session = session_file(dir.path(), Some("ADMIN"));
    cmd(dir.path())
        .arg("--session-file")
        .arg(&session)
        .args([
            "admin", "add-flight", "-n", "AA101", "--from", "JFK", "--to", "jfk",
            "--departure", "2026-04-01T10:00", "--arrival", "2026-04-01T13:30",
            "--seats", "200", "--price", "199",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Departure and arrival cannot be the same"));
}

#[test]
fn notifications_without_session_show_zero() {
    let dir = tempfile::tempdir().unwrap();
    let session = session_file(dir.path(), None);
    cmd(dir.path())
        .arg("--session-file")
        .arg(&session)
        .arg("notifications")
        .assert()
        .success()
        .stdout(predicate::str::contains("🔔 0"));
}

#[test]
fn invalid_api_url_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    Command::new(assert_cmd::cargo_bin!("skybook"))
        .current_dir(dir.path())
        .env_remove("SKYBOOK_API_URL")
        .args(["--api-url", "ftp://example.com", "whoami"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid configuration"));
}

#[test]
fn config_file_is_read() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("custom.toml"),
        "[api]\nbase_url = \"not-a-url\"\n",
    )
    .unwrap();
    Command::new(assert_cmd::cargo_bin!("skybook"))
        .current_dir(dir.path())
        .env_remove("SKYBOOK_API_URL")
        .args(["--config", "custom.toml", "whoami"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("api.base_url must start with http"));
}
