use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::PathBuf;
use std::process::Command;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::tempdir;

// Minimal valid TOML for the sim backend with short timings
fn write_config(dir: &tempfile::TempDir, port: u16) -> PathBuf {
    let toml = format!(
        r#"
[sampling]
count = 3
inter_sample_ms = 5

[control]
cadence_ms = 10

[peer]
host = "127.0.0.1"
port = {port}
connect_timeout_ms = 300
io_timeout_ms = 300

[network]
connect_window_ms = 200
poll_ms = 50
"#
    );
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn closed_port() -> u16 {
    let l = TcpListener::bind("127.0.0.1:0").unwrap();
    l.local_addr().unwrap().port()
}

/// Collect request lines from every connection made within `window`.
fn recording_peer(window: Duration) -> (u16, thread::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let deadline = Instant::now() + window;
        let mut lines = Vec::new();
        while Instant::now() < deadline {
            match listener.accept() {
                Ok((mut sock, _)) => {
                    sock.set_nonblocking(false).unwrap();
                    sock.set_read_timeout(Some(Duration::from_secs(1))).unwrap();
                    let mut req = Vec::new();
                    let mut buf = [0u8; 256];
                    while !req.ends_with(b"\r\n\r\n") {
                        match sock.read(&mut buf) {
                            Ok(0) | Err(_) => break,
                            Ok(n) => req.extend_from_slice(&buf[..n]),
                        }
                    }
                    let _ = sock.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n");
                    let text = String::from_utf8_lossy(&req).to_string();
                    lines.push(text.lines().next().unwrap_or("").to_string());
                }
                Err(_) => thread::sleep(Duration::from_millis(10)),
            }
        }
        lines
    });
    (port, handle)
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["health"], 0, "ok", "stdout")]
#[case(&["self-check"], 0, "OK", "stdout")]
#[case(&["measure"], 0, "distance_cm: 7.", "stdout")]
#[case(&["measure", "--count", "0"], 2, "count must be in 1..=64", "stderr")]
#[case(&["run", "--iterations", "2", "--stats"], 0, "Iterations: 2", "stderr")]
#[case(&["bogus"], 2, "unrecognized subcommand", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, closed_port());

    let mut cmd = Command::cargo_bin("sonar").unwrap();
    cmd.arg("--config").arg(&cfg);
    cmd.env("SONAR_TEST_SIM_DISTANCE_CM", "7.5");
    cmd.env_remove("SONAR_TEST_SIM_NO_ECHO");
    cmd.env_remove("SONAR_TEST_SIM_OFFLINE");
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
fn measure_without_echo_is_undetermined() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, closed_port());

    Command::cargo_bin("sonar")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("measure")
        .env("SONAR_TEST_SIM_NO_ECHO", "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("undetermined"));
}

#[rstest]
fn missing_peer_section_is_a_config_error() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("cfg.toml");
    fs::write(&cfg, "[sampling]\ncount = 3\n").unwrap();

    Command::cargo_bin("sonar")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("self-check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Configuration is invalid"));
}

#[rstest]
fn invalid_thresholds_are_a_config_error() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("cfg.toml");
    fs::write(
        &cfg,
        "[thresholds]\nthreshold_cm = 1.0\nhysteresis_cm = 5.0\n\n[peer]\nhost = \"127.0.0.1\"\n",
    )
    .unwrap();

    Command::cargo_bin("sonar")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("run")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("hysteresis_cm"));
}

#[rstest]
fn missing_config_file_is_a_config_error() {
    let dir = tempdir().unwrap();
    Command::cargo_bin("sonar")
        .unwrap()
        .arg("--config")
        .arg(dir.path().join("nope.toml"))
        .arg("measure")
        .assert()
        .code(2);
}

#[rstest]
fn offline_network_exits_3_before_the_loop() {
    let dir = tempdir().unwrap();
    let (port, peer) = recording_peer(Duration::from_millis(1500));
    let cfg = write_config(&dir, port);

    Command::cargo_bin("sonar")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("run")
        .env("SONAR_TEST_SIM_OFFLINE", "1")
        .env("SONAR_TEST_SIM_DISTANCE_CM", "5")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("did not come up"));

    assert!(peer.join().unwrap().is_empty(), "no request may reach the peer");
}

#[rstest]
fn first_near_reading_notifies_peer_once() {
    let dir = tempdir().unwrap();
    let (port, peer) = recording_peer(Duration::from_secs(3));
    let cfg = write_config(&dir, port);

    Command::cargo_bin("sonar")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .args(["run", "--iterations", "4"])
        .env("SONAR_TEST_SIM_DISTANCE_CM", "5")
        .env_remove("SONAR_TEST_SIM_OFFLINE")
        .env_remove("SONAR_TEST_SIM_NO_ECHO")
        .assert()
        .success();

    assert_eq!(peer.join().unwrap(), vec!["GET /on HTTP/1.1".to_string()]);
}

#[rstest]
fn far_target_sends_off() {
    let dir = tempdir().unwrap();
    let (port, peer) = recording_peer(Duration::from_secs(3));
    let cfg = write_config(&dir, port);

    Command::cargo_bin("sonar")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .args(["run", "--iterations", "2"])
        .env("SONAR_TEST_SIM_DISTANCE_CM", "30")
        .env_remove("SONAR_TEST_SIM_OFFLINE")
        .env_remove("SONAR_TEST_SIM_NO_ECHO")
        .assert()
        .success();

    assert_eq!(peer.join().unwrap(), vec!["GET /off HTTP/1.1".to_string()]);
}

#[rstest]
fn unreachable_peer_does_not_stop_the_loop() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, closed_port());

    Command::cargo_bin("sonar")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .args(["run", "--iterations", "3", "--stats"])
        .env("SONAR_TEST_SIM_DISTANCE_CM", "5")
        .env_remove("SONAR_TEST_SIM_OFFLINE")
        .assert()
        .success()
        .stderr(predicate::str::contains("Notify failures: 1"));
}
