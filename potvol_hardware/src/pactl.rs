//! PulseAudio sink driven through the `pactl` command-line client.
//!
//! Volume changes are queued to a dedicated command thread so that
//! `apply_async` never blocks the actuation worker. Requests that pile up
//! while `pactl` is busy are coalesced: only the newest one is run. The optional
//! [`SinkMonitor`] follows `pactl subscribe` and reports the sink's volume and
//! mute state after every change event.

use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;

use crossbeam_channel as xch;
use potvol_traits::{ApplyCallback, BoxError, LevelSink};

use crate::SinkReport;
use crate::error::{HwError, Result};

/// How to invoke `pactl` for one sink.
#[derive(Debug, Clone)]
pub struct PactlCommand {
    program: String,
    client_name: Option<String>,
    sink_name: String,
}

impl PactlCommand {
    pub fn new(sink_name: impl Into<String>) -> Self {
        Self {
            program: "pactl".to_string(),
            client_name: None,
            sink_name: sink_name.into(),
        }
    }

    /// Use another executable (a wrapper script, or a fake in tests).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = Some(name.into());
        self
    }

    pub fn sink_name(&self) -> &str {
        &self.sink_name
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        // The parsers below expect untranslated output.
        cmd.env("LC_ALL", "C");
        if let Some(name) = &self.client_name {
            cmd.arg(format!("--client-name={name}"));
        }
        cmd
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let out = self.command().args(args).stdin(Stdio::null()).output()?;
        if !out.status.success() {
            return Err(HwError::Command {
                program: self.program.clone(),
                status: out.status.to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }

    pub fn set_volume(&self, volume: u32) -> Result<()> {
        self.run(&["set-sink-volume", &self.sink_name, &volume.to_string()])
            .map(|_| ())
    }

    /// Per-channel native volumes.
    pub fn volumes(&self) -> Result<Vec<u32>> {
        let out = self.run(&["get-sink-volume", &self.sink_name])?;
        let vols = parse_sink_volumes(&out);
        if vols.is_empty() {
            return Err(HwError::Output {
                program: self.program.clone(),
                output: out,
            });
        }
        Ok(vols)
    }

    pub fn muted(&self) -> Result<bool> {
        let out = self.run(&["get-sink-mute", &self.sink_name])?;
        parse_sink_mute(&out).ok_or(HwError::Output {
            program: self.program.clone(),
            output: out,
        })
    }

    pub fn report(&self) -> Result<SinkReport> {
        Ok(SinkReport {
            muted: self.muted()?,
            volumes: self.volumes()?,
        })
    }
}

/// Parse `pactl get-sink-volume` output into per-channel native volumes.
///
/// ```text
/// Volume: front-left: 32768 /  50% / -18.06 dB,   front-right: 32768 /  50% / -18.06 dB
///         balance 0.00
/// ```
pub fn parse_sink_volumes(out: &str) -> Vec<u32> {
    let Some(line) = out.lines().find(|l| l.trim_start().starts_with("Volume:")) else {
        return Vec::new();
    };
    let body = line.trim_start().trim_start_matches("Volume:");
    body.split(',')
        .filter_map(|chan| {
            let before_pct = chan.split('/').next()?;
            before_pct.rsplit(':').next()?.trim().parse::<u32>().ok()
        })
        .collect()
}

/// Parse `pactl get-sink-mute` output (`Mute: yes` / `Mute: no`).
pub fn parse_sink_mute(out: &str) -> Option<bool> {
    let line = out.lines().find(|l| l.trim_start().starts_with("Mute:"))?;
    match line.trim_start().trim_start_matches("Mute:").trim() {
        "yes" => Some(true),
        "no" => Some(false),
        _ => None,
    }
}

/// True for `pactl subscribe` lines about a sink (not a sink input).
pub fn is_sink_event(line: &str) -> bool {
    line.contains(" on sink #")
}

struct SetVolume {
    volume: u32,
    on_result: ApplyCallback,
}

/// `LevelSink` backed by `pactl`.
pub struct PactlSink {
    cmd: PactlCommand,
    tx: Option<xch::Sender<SetVolume>>,
    join_handle: Option<JoinHandle<()>>,
}

impl PactlSink {
    pub fn spawn(cmd: PactlCommand) -> Result<Self> {
        let (tx, rx) = xch::unbounded::<SetVolume>();
        let worker_cmd = cmd.clone();
        let join_handle = std::thread::Builder::new()
            .name("potvol-pactl".into())
            .spawn(move || {
                while let Ok(mut req) = rx.recv() {
                    for newer in rx.try_iter() {
                        tracing::trace!(volume = req.volume, "superseded before reaching pactl");
                        (req.on_result)(Ok(()));
                        req = newer;
                    }
                    let res = worker_cmd
                        .set_volume(req.volume)
                        .map_err(|e| Box::new(e) as BoxError);
                    (req.on_result)(res);
                }
                tracing::trace!("pactl command thread exiting cleanly");
            })?;
        Ok(Self {
            cmd,
            tx: Some(tx),
            join_handle: Some(join_handle),
        })
    }

    pub fn command(&self) -> &PactlCommand {
        &self.cmd
    }
}

impl LevelSink for PactlSink {
    fn apply_async(&self, volume: u32, on_result: ApplyCallback) {
        let Some(tx) = &self.tx else {
            on_result(Err(Box::new(HwError::ChannelClosed)));
            return;
        };
        if let Err(xch::SendError(req)) = tx.send(SetVolume { volume, on_result }) {
            (req.on_result)(Err(Box::new(HwError::ChannelClosed)));
        }
    }

    fn initial_state(&self) -> Option<u32> {
        match self.cmd.volumes() {
            Ok(v) => v.first().copied(),
            Err(e) => {
                tracing::debug!(error = %e, sink = self.cmd.sink_name(), "sink volume not available yet");
                None
            }
        }
    }
}

impl Drop for PactlSink {
    fn drop(&mut self) {
        // Closing the channel ends the command thread after at most one more set.
        self.tx.take();
        if let Some(handle) = self.join_handle.take()
            && handle.join().is_err()
        {
            tracing::warn!("pactl command thread panicked during shutdown");
        }
    }
}

/// Follows `pactl subscribe` and reports sink state after each change.
pub struct SinkMonitor {
    child: Child,
    join_handle: Option<JoinHandle<()>>,
}

impl SinkMonitor {
    /// Start monitoring. `on_report` runs once immediately and then on every
    /// sink event whose state differs from the previous report.
    pub fn spawn<F>(cmd: PactlCommand, mut on_report: F) -> Result<Self>
    where
        F: FnMut(SinkReport) + Send + 'static,
    {
        let mut child = cmd
            .command()
            .arg("subscribe")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        let stdout = child.stdout.take().ok_or(HwError::ChannelClosed)?;

        let spawned = std::thread::Builder::new()
            .name("potvol-monitor".into())
            .spawn(move || {
                let mut last: Option<SinkReport> = None;
                let mut emit = |last: &mut Option<SinkReport>| match cmd.report() {
                    Ok(report) => {
                        if last.as_ref() != Some(&report) {
                            on_report(report.clone());
                            *last = Some(report);
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "failed to query sink state"),
                };
                emit(&mut last);
                for line in BufReader::new(stdout).lines() {
                    let Ok(line) = line else { break };
                    if is_sink_event(&line) {
                        emit(&mut last);
                    }
                }
                tracing::trace!("sink monitor exiting cleanly");
            });
        let join_handle = match spawned {
            Ok(h) => h,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e.into());
            }
        };

        Ok(Self {
            child,
            join_handle: Some(join_handle),
        })
    }
}

impl Drop for SinkMonitor {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        if let Some(handle) = self.join_handle.take()
            && handle.join().is_err()
        {
            tracing::warn!("sink monitor thread panicked during shutdown");
        }
    }
}
