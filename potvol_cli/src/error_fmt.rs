//! Human-readable error descriptions and structured JSON error formatting.

use crate::cli::LAST_STARTUP;

/// Stable name of an error for JSON output.
pub fn error_reason_name(err: &eyre::Report) -> &'static str {
    use potvol_core::error::{BuildError, PotvolError};

    if err.downcast_ref::<BuildError>().is_some() {
        return "Build";
    }
    match err.downcast_ref::<PotvolError>() {
        Some(PotvolError::StartupTimeout { .. }) => "StartupTimeout",
        Some(PotvolError::SensorUnavailable(_)) => "SensorUnavailable",
        Some(PotvolError::Sensor(_)) => "Sensor",
        Some(PotvolError::Sink(_)) => "Sink",
        None => "Error",
    }
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use potvol_core::error::{BuildError, PotvolError};

    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingSource => {
                "What happened: No ADC source was provided to the controller.\nLikely causes: The sample source failed to open or was not wired into the builder.\nHow to fix: Check [adc] in the config, or run with --sim.".to_string()
            }
            BuildError::MissingSink => {
                "What happened: No volume sink was provided to the controller.\nLikely causes: The sink backend failed to start or was not wired into the builder.\nHow to fix: Check [sink] in the config, or run with --sim.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/potvol.toml for a sample."
            ),
        };
    }

    if let Some(pe) = err.downcast_ref::<PotvolError>() {
        return match pe {
            PotvolError::StartupTimeout { retries } => format!(
                "What happened: The sink never reported its volume ({retries} attempts).\nLikely causes: PulseAudio is not running, the sink name is wrong, or pactl is missing.\nHow to fix: Check `pactl list short sinks` and the sink name; raise sink.startup_retries if the server starts slowly."
            ),
            PotvolError::SensorUnavailable(msg) => format!(
                "What happened: The ADC could not be read ({msg}).\nLikely causes: Wrong channel, SARADC driver not loaded, or missing permissions on sysfs.\nHow to fix: Check that /sys/class/saradc/saradc_ch<N> exists and is readable, or set adc.path."
            ),
            PotvolError::Sink(msg) => format!(
                "What happened: The sink rejected a request ({msg}).\nLikely causes: The sink disappeared or the PulseAudio server restarted.\nHow to fix: Restart the daemon once the sink is available again."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.starts_with("read config") || lower.starts_with("parse config") {
        return format!(
            "What happened: The config file could not be loaded.\nLikely causes: Wrong --config path or a TOML syntax error.\nHow to fix: Fix the file and rerun. Original: {msg}"
        );
    }

    if lower.starts_with("open state file") {
        let cause = err.source().map(|c| format!(" ({c})")).unwrap_or_default();
        return format!(
            "What happened: The state file could not be created{cause}.\nLikely causes: Its directory does not exist or is not writable.\nHow to fix: Create the directory or point --state-file / state.file elsewhere. Original: {msg}"
        );
    }

    if lower.contains("no sink name") {
        return "What happened: No sink to control.\nLikely causes: The sink was given neither on the command line nor as sink.name.\nHow to fix: Pass it (e.g. `potvol run alsa_output.platform-hdmi`) or set sink.name in the config.".to_string();
    }

    if lower.starts_with("adc.")
        || lower.starts_with("filter.")
        || lower.starts_with("sink")
        || lower.starts_with("logging.")
    {
        return format!(
            "What happened: Invalid configuration: {msg}.\nLikely causes: Out-of-range values in the TOML or on the command line.\nHow to fix: Edit the config file and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 3 startup timeout, 4 sensor unavailable, 1 otherwise.
/// Usage errors exit with 2 from clap before we get here.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    use potvol_core::error::PotvolError;
    match err.downcast_ref::<PotvolError>() {
        Some(PotvolError::StartupTimeout { .. }) => 3,
        Some(PotvolError::SensorUnavailable(_)) => 4,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use potvol_core::error::PotvolError;
    use serde_json::json;

    let reason = error_reason_name(err);
    let message = humanize(err);
    if let Some(PotvolError::StartupTimeout { retries }) = err.downcast_ref::<PotvolError>() {
        let poll_ms = LAST_STARTUP.get().map(|s| s.poll_ms);
        return json!({
            "reason": reason,
            "details": { "retries": retries, "poll_ms": poll_ms },
            "message": message,
        })
        .to_string();
    }
    json!({ "reason": reason, "message": message }).to_string()
}
