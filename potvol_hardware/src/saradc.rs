//! SARADC channel exposed by the kernel as a sysfs attribute.
//!
//! Each read re-reads the attribute from offset 0 and parses the decimal
//! value. The file is opened once and kept for the process lifetime.

use std::fs::File;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

use potvol_traits::{BoxError, SampleSource};
use tracing::trace;

use crate::error::{HwError, Result};

/// sysfs node of a SARADC channel.
pub fn channel_path(channel: u8) -> PathBuf {
    PathBuf::from(format!("/sys/class/saradc/saradc_ch{channel}"))
}

#[derive(Debug)]
pub struct SaradcSource {
    file: File,
    path: PathBuf,
}

impl SaradcSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        Ok(Self { file, path })
    }

    pub fn open_channel(channel: u8) -> Result<Self> {
        Self::open(channel_path(channel))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// One positional read of the attribute.
    pub fn read_value(&self) -> Result<u16> {
        let mut buf = [0u8; 16];
        let n = self.file.read_at(&mut buf, 0)?;
        if n == 0 {
            return Err(HwError::Empty);
        }
        parse_adc_value(&buf[..n])
    }
}

/// Parse a sysfs ADC value such as `b"512\n"`.
pub fn parse_adc_value(bytes: &[u8]) -> Result<u16> {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(HwError::Empty);
    }
    trimmed
        .parse::<u16>()
        .map_err(|_| HwError::Parse(trimmed.to_string()))
}

impl SampleSource for SaradcSource {
    fn read_raw(&mut self) -> std::result::Result<u16, BoxError> {
        let raw = self.read_value()?;
        trace!(raw, "saradc read");
        Ok(raw)
    }
}
