//! Line-atomic status output shared by all workers.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use chrono::Local;
use parking_lot::Mutex;

/// Output options for a [`Reporter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOptions {
    /// Emit verbose lines.
    pub verbose: bool,
    /// Prefix each line with a local timestamp.
    pub timestamps: bool,
}

/// Shared status sink.
///
/// Each emitted line is written and flushed under one lock, so lines from
/// concurrent workers never interleave. Cloning shares the same sink.
#[derive(Clone)]
pub struct Reporter {
    sink: Arc<Mutex<Box<dyn Write + Send>>>,
    options: ReportOptions,
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Reporter {
    /// Reporter writing to any writer.
    pub fn new(writer: impl Write + Send + 'static, options: ReportOptions) -> Self {
        Self {
            sink: Arc::new(Mutex::new(Box::new(writer))),
            options,
        }
    }

    /// Reporter writing to standard output.
    #[must_use]
    pub fn stdout(options: ReportOptions) -> Self {
        Self::new(io::stdout(), options)
    }

    /// Reporter appending to the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be opened for appending.
    pub fn append_to(path: &Path, options: ReportOptions) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(file, options))
    }

    /// Reporter writing into an in-memory buffer, with a handle to read it.
    #[must_use]
    pub fn capture(options: ReportOptions) -> (Self, CapturedOutput) {
        let buffer = CapturedOutput::default();
        (Self::new(buffer.clone(), options), buffer)
    }

    /// Output options in effect.
    #[must_use]
    pub const fn options(&self) -> ReportOptions {
        self.options
    }

    /// Emit a status line.
    pub fn emit(&self, line: impl AsRef<str>) {
        let line = line.as_ref();
        let mut sink = self.sink.lock();
        let written = if self.options.timestamps {
            writeln!(sink, "{}: {line}", timestamp())
        } else {
            writeln!(sink, "{line}")
        };
        if let Err(e) = written.and_then(|()| sink.flush()) {
            tracing::warn!(error = %e, "failed to write status line");
        }
    }

    /// Emit a line only in verbose mode.
    pub fn verbose(&self, line: impl AsRef<str>) {
        if self.options.verbose {
            self.emit(line);
        }
    }
}

/// Local timestamp in status-line format.
#[must_use]
pub fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S %Z").to_string()
}

/// In-memory writer backing [`Reporter::capture`].
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedOutput {
    /// Everything written so far.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    /// Written lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
