use rstest::rstest;
use sonar_config::load_toml;

fn with_peer(extra: &str) -> String {
    format!(
        r#"
{extra}

[peer]
host = "192.168.0.32"
port = 80
"#
    )
}

#[rstest]
#[case("[thresholds]\nthreshold_cm = 0.0", "threshold_cm must be > 0")]
#[case("[thresholds]\nhysteresis_cm = -0.1", "hysteresis_cm must be >= 0")]
#[case(
    "[thresholds]\nthreshold_cm = 10.0\nhysteresis_cm = 20.0",
    "hysteresis_cm must be < 2 * threshold_cm"
)]
#[case("[sampling]\ncount = 0", "sampling.count must be >= 1")]
#[case("[sampling]\ncount = 65", "sampling.count must be <= 64")]
#[case("[sensor]\npulse_timeout_us = 0", "pulse_timeout_us must be >= 1")]
#[case("[sensor]\nsound_speed_m_s = 0.0", "sound_speed_m_s must be > 0")]
#[case("[sensor]\ntrigger_pulse_us = 0", "trigger_pulse_us must be >= 1")]
#[case("[network]\npoll_ms = 0", "network.poll_ms must be >= 1")]
#[case("[logging]\nrotation = \"weekly\"", "logging.rotation must be one of")]
fn rejects_out_of_range_values(#[case] section: &str, #[case] needle: &str) {
    let cfg = load_toml(&with_peer(section)).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject");
    assert!(
        format!("{err}").contains(needle),
        "expected '{needle}' in '{err}'"
    );
}

#[test]
fn rejects_bad_peer_paths() {
    let toml = r#"
[peer]
host = "xiao.local"
on_path = "on"
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("relative path must be rejected");
    assert!(format!("{err}").contains("peer.on_path must start with '/'"));
}

#[test]
fn rejects_empty_host() {
    let cfg = load_toml("[peer]\nhost = \"  \"\n").expect("parse TOML");
    let err = cfg.validate().expect_err("empty host");
    assert!(format!("{err}").contains("peer.host must not be empty"));
}

#[test]
fn accepts_full_config() {
    let toml = r#"
[pins]
trigger = 3
echo = 2
indicator = 16

[sensor]
sound_speed_m_s = 343.0
pulse_timeout_us = 30000
trigger_pulse_us = 10
settle_us = 3
poll_us = 1

[sampling]
count = 5
inter_sample_ms = 30

[thresholds]
threshold_cm = 10.0
hysteresis_cm = 0.8

[control]
cadence_ms = 100
notify_initial = false

[peer]
host = "192.168.0.32"
port = 8080
on_path = "/on"
off_path = "/off"
connect_timeout_ms = 1500
io_timeout_ms = 1500

[network]
connect_window_ms = 15000
poll_ms = 200

[logging]
file = "sonar.log"
level = "debug"
rotation = "daily"
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert!(!cfg.control.notify_initial);
    assert_eq!(cfg.peer.port, 8080);
    assert_eq!(cfg.pins.indicator, 16);
}

#[test]
fn loads_from_file() {
    use std::io::Write;
    let mut f = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(f, "[peer]\nhost = \"10.0.0.5\"\n[thresholds]\nthreshold_cm = 25.0").expect("write");
    let text = std::fs::read_to_string(f.path()).expect("read back");
    let cfg = load_toml(&text).expect("parse TOML");
    cfg.validate().expect("valid");
    assert!((cfg.thresholds.threshold_cm - 25.0).abs() < f32::EPSILON);
}

#[test]
fn shipped_sample_config_is_valid() {
    let cfg = sonar_config::load_toml(include_str!("../../etc/sonar.toml")).unwrap();
    cfg.validate().unwrap();
    assert_eq!(cfg.peer.host, "192.168.0.32");
    assert_eq!(cfg.sampling.count, 5);
}
