use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Sim backends with fast cadences so short runs still settle.
fn write_sim_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[adc]
backend = "sim"
seed_reads = 4
reads_per_sample = 2

[filter]
commit_threshold = 5
fast_interval_ms = 2
slow_interval_ms = 10

[sink]
backend = "sim"
actuation_interval_ms = 5
"#;
    let path = dir.path().join("potvol.toml");
    fs::write(&path, toml).unwrap();
    path
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["run", "--help"], 0, "--duration-ms", "stdout")]
#[case(&["run", "sink", "/tmp/state", "9"], 2, "invalid value", "stderr")]
#[case(&["run", "--channel", "8"], 2, "invalid value", "stderr")]
#[case(&["self-check", "--sim"], 0, "self-check ok", "stdout")]
#[case(&["run", "--sim", "--duration-ms", "300"], 0, "potvol stopped", "stdout")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_sim_config(&dir);

    let mut cmd = Command::cargo_bin("potvol_cli").unwrap();
    cmd.arg("--config").arg(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
fn sim_run_writes_state_file() {
    let dir = tempdir().unwrap();
    let cfg = write_sim_config(&dir);
    let state = dir.path().join("state");

    let mut cmd = Command::cargo_bin("potvol_cli").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("run")
        .arg("--sim")
        .arg("--duration-ms")
        .arg("400")
        .arg("--state-file")
        .arg(&state);
    cmd.assert().success();

    let line = fs::read_to_string(&state).unwrap();
    let re = predicate::str::is_match(r"^0:\d+/65536\n$").unwrap();
    assert!(re.eval(&line), "unexpected state line: {line:?}");
    // The simulated knob sits near 40%, away from the sink's starting 50%.
    assert_ne!(line, "0:32768/65536\n");
}

#[rstest]
fn sim_run_prints_json_summary() {
    let dir = tempdir().unwrap();
    let cfg = write_sim_config(&dir);

    let out = Command::cargo_bin("potvol_cli")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("--json")
        .arg("run")
        .arg("--sim")
        .arg("--duration-ms")
        .arg("300")
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    let v: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert!(v["samples"].as_u64().unwrap() > 0);
    assert!(v["unstable_commits"].as_u64().unwrap() >= 1);
    assert_eq!(v["apply_failures"], 0);
}

#[rstest]
fn invalid_config_is_explained() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[adc]\nchannel = 9\n").unwrap();

    let mut cmd = Command::cargo_bin("potvol_cli").unwrap();
    cmd.arg("--config").arg(&path).arg("self-check").arg("--sim");
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("adc.channel"));
}

#[rstest]
fn missing_sink_name_is_explained() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("potvol.toml");
    fs::write(&cfg, "[adc]\nbackend = \"sim\"\n").unwrap();

    // pactl backend by default, but no sink name anywhere.
    let mut cmd = Command::cargo_bin("potvol_cli").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("run")
        .arg("--duration-ms")
        .arg("10");
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("No sink to control"));
}

#[rstest]
fn missing_adc_node_exits_with_sensor_code() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("potvol.toml");
    let toml = format!(
        "[adc]\npath = {:?}\n\n[sink]\nbackend = \"sim\"\n",
        dir.path().join("saradc_ch0").display().to_string()
    );
    fs::write(&cfg, toml).unwrap();

    let mut cmd = Command::cargo_bin("potvol_cli").unwrap();
    cmd.arg("--config").arg(&cfg).arg("run");
    cmd.assert()
        .code(4)
        .stderr(predicate::str::contains("ADC could not be read"));
}

#[rstest]
fn silent_sink_exits_with_startup_code() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("potvol.toml");
    let toml = r#"
[adc]
backend = "sim"

[sink]
name = "alsa_output.nowhere"
pactl = "/nonexistent/pactl"
startup_retries = 3
startup_poll_ms = 1
"#;
    fs::write(&cfg, toml).unwrap();

    let out = Command::cargo_bin("potvol_cli")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("--json")
        .arg("run")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(3));
    let stdout = String::from_utf8(out.stdout).unwrap();
    let v: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(v["reason"], "StartupTimeout");
    assert_eq!(v["details"]["retries"], 3);
}

#[rstest]
fn unwritable_state_file_fails_at_startup() {
    let dir = tempdir().unwrap();
    let cfg = write_sim_config(&dir);
    let state = dir.path().join("missing-dir").join("state");

    let mut cmd = Command::cargo_bin("potvol_cli").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("run")
        .arg("--sim")
        .arg("--duration-ms")
        .arg("5000")
        .arg("--state-file")
        .arg(&state);
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("The state file could not be created"));
    assert!(!state.exists());
}
