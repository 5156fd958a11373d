//! State file: one `mute:volume/norm` line describing the sink, replaced
//! atomically on every change so readers never see a partial line.

use std::{fs, io::Write, path::Path};

use potvol_core::VOLUME_NORM;
use potvol_hardware::SinkReport;

/// `0:65536/65536\n` for an unmuted sink at 100%.
pub fn format_state(report: &SinkReport) -> String {
    format!(
        "{}:{}/{}\n",
        u8::from(report.muted),
        report.average(),
        VOLUME_NORM
    )
}

/// Create (or truncate) the state file so an unwritable path fails at startup.
pub fn create_state_file(path: &Path) -> std::io::Result<()> {
    fs::File::create(path).map(|_| ())
}

pub fn write_state(path: &Path, report: &SinkReport) -> std::io::Result<()> {
    write_atomic(path, format_state(report).as_bytes())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("new");
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(tmp, path)
}

/// Callback for sink reports: logs the change and refreshes the state file.
pub fn report_handler(
    sink_name: String,
    state_file: Option<std::path::PathBuf>,
) -> impl FnMut(SinkReport) + Send + 'static {
    let mut connected = false;
    move |report: SinkReport| {
        if connected {
            tracing::info!(
                muted = report.muted,
                volume = report.average(),
                "sink changed"
            );
        } else {
            connected = true;
            tracing::info!(
                sink = %sink_name,
                muted = report.muted,
                volumes = ?report.volumes,
                "connected to sink"
            );
        }
        if let Some(path) = &state_file
            && let Err(e) = write_state(path, &report)
        {
            tracing::warn!(error = %e, path = %path.display(), "failed to write state file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_mute_average_and_norm() {
        let r = SinkReport {
            muted: false,
            volumes: vec![65536, 65536],
        };
        assert_eq!(format_state(&r), "0:65536/65536\n");
        let r = SinkReport {
            muted: true,
            volumes: vec![100, 200],
        };
        assert_eq!(format_state(&r), "1:150/65536\n");
    }

    #[test]
    fn state_file_is_replaced_not_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state");
        let mut handler = report_handler("test".into(), Some(path.clone()));
        handler(SinkReport {
            muted: false,
            volumes: vec![1000],
        });
        handler(SinkReport {
            muted: true,
            volumes: vec![2000],
        });
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1:2000/65536\n");
        assert!(!path.with_extension("new").exists());
    }
}
