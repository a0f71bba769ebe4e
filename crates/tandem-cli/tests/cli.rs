//! Integration tests for tandem-cli.
//!
//! Tests invoke the built `tandem` binary and check its output.

use std::process::Command;

use tempfile::TempDir;

/// Helper to get the path to the `tandem` binary built by cargo.
fn tandem_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tandem"));
    cmd.env("RUST_LOG", "warn");
    cmd
}

// ---------------------------------------------------------------------------
// `tandem units`
// ---------------------------------------------------------------------------

#[test]
fn cli_units_lists_builtins() {
    let output = tandem_bin().arg("units").output().expect("failed to run tandem units");
    assert!(output.status.success(), "tandem units failed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Available Units"));
    for id in [
        "Builtin-Gain-1001",
        "Builtin-Lookahead-1002",
        "Builtin-Echo-1003",
        "Builtin-Ducker-1004",
    ] {
        assert!(stdout.contains(id), "listing should contain '{id}'");
    }
}

#[test]
fn cli_units_json_is_one_object_per_line() {
    let output = tandem_bin()
        .args(["units", "--json"])
        .output()
        .expect("failed to run tandem units --json");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 4);
    for line in lines {
        assert!(line.starts_with('{') && line.ends_with('}'), "{line}");
        assert!(line.contains("\"isInstrument\":false"), "{line}");
    }
}

#[test]
fn cli_units_detail_shows_params() {
    let output = tandem_bin()
        .args(["units", "builtin:echo"])
        .output()
        .expect("failed to run tandem units builtin:echo");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Echo"));
    assert!(stdout.contains("time_ms"));
    assert!(stdout.contains("feedback"));
}

#[test]
fn cli_units_unknown_fails() {
    let output = tandem_bin().args(["units", "nope"]).output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown unit"));
}

// ---------------------------------------------------------------------------
// `tandem render`
// ---------------------------------------------------------------------------

#[test]
fn cli_render_units() {
    let output = tandem_bin()
        .args([
            "render",
            "-u",
            "builtin:gain",
            "-u",
            "builtin:lookahead",
            "-u",
            "!builtin:echo",
            "--blocks",
            "8",
        ])
        .output()
        .expect("failed to run tandem render");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "render failed: {stdout}");

    assert!(stdout.contains("Gain > Lookahead > <bypassed>"), "{stdout}");
    assert!(stdout.contains("latency 240 samples"), "{stdout}");
    assert!(stdout.contains("bypassed"));
}

#[test]
fn cli_render_double_on_loader_thread() {
    let output = tandem_bin()
        .args([
            "render",
            "-u",
            "builtin:ducker",
            "--double",
            "--loader-thread",
            "--blocks",
            "4",
        ])
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "render failed: {stdout}");
    assert!(stdout.contains("(f64)"), "{stdout}");
    assert!(stdout.contains("2 extra channel(s)"), "{stdout}");
}

#[test]
fn cli_render_missing_unit_fails() {
    let output = tandem_bin().args(["render", "-u", "missing-id"]).output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to find"));
}

// ---------------------------------------------------------------------------
// `tandem init-config` then `tandem render --config`
// ---------------------------------------------------------------------------

#[test]
fn cli_init_config_then_render() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("chain.toml");
    let path_str = path.to_str().unwrap();

    let output = tandem_bin().args(["init-config", path_str]).output().unwrap();
    assert!(output.status.success());
    assert!(path.is_file());

    // Refuses to overwrite without --force.
    let output = tandem_bin().args(["init-config", path_str]).output().unwrap();
    assert!(!output.status.success());
    let output = tandem_bin()
        .args(["init-config", path_str, "--force"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let output = tandem_bin()
        .args(["render", "--config", path_str, "--blocks", "2"])
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "render failed: {stdout}");
    assert!(stdout.contains("Gain > Lookahead > <bypassed>"), "{stdout}");
}
