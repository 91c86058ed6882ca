//! Human-readable error descriptions and structured JSON error formatting.

use sonar_core::error::{BuildError, SonarError};
use sonar_hardware::HwError;

use crate::ConfigError;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(ce) = err.downcast_ref::<ConfigError>() {
        return format!(
            "What happened: Configuration is invalid ({ce}).\nLikely causes: Missing [peer] section, or out-of-range values in the TOML.\nHow to fix: Edit the config file (see etc/sonar.toml), then rerun."
        );
    }

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in [sampling], [sensor] or [thresholds].\nHow to fix: Edit the config file, then rerun."
            ),
            other => format!(
                "What happened: The monitor could not be assembled ({other}).\nLikely causes: A backend failed to initialize.\nHow to fix: Re-run with --log-level=debug for details."
            ),
        };
    }

    if let Some(se) = err.downcast_ref::<SonarError>() {
        return match se {
            SonarError::NetworkUnavailable { waited_ms } => format!(
                "What happened: The network did not come up within {waited_ms} ms.\nLikely causes: Peer powered off, wrong [peer].host/port, or no link.\nHow to fix: Check the peer is reachable, or raise network.connect_window_ms."
            ),
            SonarError::Interrupted => {
                "What happened: Interrupted while waiting for the network.\nHow to fix: Nothing; rerun when ready.".to_string()
            }
        };
    }

    if let Some(HwError::Gpio(msg)) = err.downcast_ref::<HwError>() {
        return format!(
            "What happened: Failed to initialize GPIO ({msg}).\nLikely causes: Incorrect pin numbers or insufficient GPIO permissions.\nHow to fix: Fix the [pins] values in the config; ensure the process has permission to access GPIO."
        );
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: network unavailable 3, configuration 2, anything else 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(SonarError::NetworkUnavailable { .. }) = err.downcast_ref::<SonarError>() {
        return 3;
    }
    if err.downcast_ref::<ConfigError>().is_some()
        || matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::InvalidConfig(_))
        )
    {
        return 2;
    }
    1
}

pub fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<ConfigError>().is_some() {
        return "Config";
    }
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::InvalidConfig(_) => "Config",
            _ => "Build",
        };
    }
    match err.downcast_ref::<SonarError>() {
        Some(SonarError::NetworkUnavailable { .. }) => "NetworkUnavailable",
        Some(SonarError::Interrupted) => "Interrupted",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    if let Some(SonarError::NetworkUnavailable { waited_ms }) = err.downcast_ref::<SonarError>() {
        return json!({
            "reason": reason_name(err),
            "details": { "waited_ms": waited_ms },
            "message": humanize(err),
        })
        .to_string();
    }
    json!({ "reason": reason_name(err), "message": humanize(err) }).to_string()
}
