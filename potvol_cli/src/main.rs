mod cli;
mod error_fmt;
mod logging;
mod run;
mod state;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::Result;
use potvol_config::Config;

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};
use crate::run::{RunOpts, run_daemon, self_check};

fn main() {
    let _ = color_eyre::install();
    // clap prints usage errors itself and exits with 2.
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = real_main(cli) {
        tracing::error!(error = %err, "potvol failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => potvol_config::load_file(path),
        None => Ok(Config::default()),
    }
}

fn real_main(cli: Cli) -> Result<()> {
    let mut cfg = load_config(&cli)?;

    // CLI overrides take precedence over the file
    let opts = match &cli.cmd {
        Commands::Run {
            sink,
            state_file,
            channel,
            sink_flag,
            state_file_flag,
            channel_flag,
            sim,
            duration_ms,
        } => {
            if let Some(name) = sink_flag.clone().or_else(|| sink.clone()) {
                cfg.sink.name = Some(name);
            }
            if let Some(path) = state_file_flag.clone().or_else(|| state_file.clone()) {
                cfg.state.file = Some(path);
            }
            if let Some(ch) = channel_flag.or(*channel) {
                cfg.adc.channel = ch;
            }
            Some(RunOpts {
                sim: *sim,
                duration_ms: *duration_ms,
            })
        }
        Commands::SelfCheck { .. } => None,
    };
    cfg.validate()?;

    logging::init(cli.log_level.as_deref(), cli.json, &cfg.logging)?;

    match cli.cmd {
        Commands::Run { .. } => {
            let opts = opts.unwrap_or_default();
            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = shutdown.clone();
            if let Err(e) = ctrlc::set_handler(move || {
                flag.store(true, Ordering::Relaxed);
            }) {
                tracing::warn!(error = %e, "failed to install Ctrl-C handler");
            }

            tracing::info!(
                sink = cfg.sink.name.as_deref().unwrap_or("sim"),
                channel = cfg.adc.channel,
                sim = opts.sim,
                "potvol starting"
            );
            let summary = run_daemon(&cfg, opts, shutdown)?;

            if cli.json {
                let line = serde_json::json!({
                    "samples": summary.stats.samples,
                    "skipped": summary.stats.skipped,
                    "read_errors": summary.stats.read_errors,
                    "unstable_commits": summary.stats.unstable_commits,
                    "stable_commits": summary.stats.stable_commits,
                    "applies": summary.applies_issued,
                    "apply_failures": summary.apply_failures,
                    "initial_level": summary.initial_level,
                    "final_level": summary.final_target,
                });
                println!("{line}");
            } else {
                println!(
                    "potvol stopped after {} samples: {} unstable / {} stable commits, {} applies ({} failed), volume {:.1}%",
                    summary.stats.samples,
                    summary.stats.unstable_commits,
                    summary.stats.stable_commits,
                    summary.applies_issued,
                    summary.apply_failures,
                    100.0 * summary.final_target
                );
            }
        }
        Commands::SelfCheck { sim, reads } => {
            let check = self_check(&cfg, sim, reads)?;
            if cli.json {
                let line = serde_json::json!({
                    "raw_mean": check.raw_mean,
                    "level": check.level,
                    "read_failures": check.read_failures,
                    "sink_volume": check.sink_volume,
                    "sink_level": check.sink_level,
                });
                println!("{line}");
            } else {
                println!(
                    "adc: raw mean {:.1}, level {:.3} ({} failed reads)",
                    check.raw_mean, check.level, check.read_failures
                );
                match (check.sink_volume, check.sink_level) {
                    (Some(v), Some(l)) => println!("sink: volume {v} (level {l:.3})"),
                    _ => println!("sink: no answer"),
                }
            }
            if check.sink_volume.is_none() {
                eyre::bail!("sink did not report its volume");
            }
            println!("self-check ok");
        }
    }
    Ok(())
}
