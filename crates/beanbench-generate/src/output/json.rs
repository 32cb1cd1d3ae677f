use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::errors::GenerationError;
use crate::model::BeanGraphSnapshot;

/// Write a snapshot as pretty-printed JSON and return the bytes written.
pub fn write_snapshot_json(
    path: &Path,
    snapshot: &BeanGraphSnapshot,
) -> Result<u64, GenerationError> {
    write_json(path, snapshot)
}

/// Write any serializable artifact as pretty-printed JSON.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<u64, GenerationError> {
    let mut writer = CountingWriter::new(BufWriter::new(File::create(path)?));
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(writer.bytes_written())
}

/// Read a snapshot written by [`write_snapshot_json`].
pub fn read_snapshot_json(path: &Path) -> Result<BeanGraphSnapshot, GenerationError> {
    let contents = std::fs::read(path)?;
    Ok(serde_json::from_slice(&contents)?)
}

struct CountingWriter<W: Write> {
    inner: W,
    bytes: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, bytes: 0 }
    }

    fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.bytes += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
