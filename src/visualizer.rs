//! A write-only appendable text sink for diagnostic samples
//! (`SPEC_FULL.md` section 4.12), grounded on the source's `Visualizer`
//! class. Writes are best-effort: failures are logged and swallowed, never
//! propagated into the search (`SPEC_FULL.md` section 7).

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

pub struct Visualizer<W: Write> {
    stream: W,
}

impl Visualizer<std::fs::File> {
    pub fn open(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let stream = OpenOptions::new().append(true).create(true).open(path)?;
        Ok(Self { stream })
    }
}

impl<W: Write> Visualizer<W> {
    pub fn from_writer(stream: W) -> Self {
        Self { stream }
    }

    /// Appends `line` plus a newline. Swallows I/O failure after logging it.
    pub fn write_line(&mut self, line: &str) {
        if let Err(e) = writeln!(self.stream, "{line}") {
            log::warn!("visualizer sink write failed, dropping sample: {e}");
        }
    }
}
