use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::errors::Result;

/// Append-only, newline-delimited link writer.
///
/// Reopening the same path extends the file; nothing is deduplicated across
/// runs. The buffered handle flushes on drop, including on error paths.
pub struct LinkSink {
    writer: BufWriter<File>,
    path: PathBuf,
    written: usize,
}

impl LinkSink {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            writer: BufWriter::new(file),
            path,
            written: 0,
        })
    }

    pub fn append(&mut self, link: &str) -> Result<()> {
        self.writer.write_all(link.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Links written through this handle (not lines already in the file)
    pub fn written(&self) -> usize {
        self.written
    }
}
