// src/workflow/sink.rs

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::warn;

/// Shared, append-only output destination.
///
/// Clones write to the same destination. Each call writes its bytes while
/// holding the lock, so concurrent writers never split a line.
#[derive(Clone)]
pub struct Sink {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    captured: Option<Arc<Mutex<Vec<u8>>>>,
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("captured", &self.captured.is_some())
            .finish_non_exhaustive()
    }
}

struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Sink {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Arc::new(Mutex::new(Box::new(writer))),
            captured: None,
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    /// In-memory sink whose contents can be read back with [`Sink::contents`].
    pub fn memory() -> Self {
        let buf = Arc::new(Mutex::new(Vec::new()));
        Self {
            writer: Arc::new(Mutex::new(Box::new(SharedBuffer(Arc::clone(&buf))))),
            captured: Some(buf),
        }
    }

    /// Write `line` followed by a newline as a single locked write.
    pub fn write_line(&self, line: impl AsRef<str>) {
        let mut bytes = Vec::with_capacity(line.as_ref().len() + 1);
        bytes.extend_from_slice(line.as_ref().as_bytes());
        bytes.push(b'\n');
        self.write_all(&bytes);
    }

    pub fn write_all(&self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = writer.write_all(bytes).and_then(|()| writer.flush()) {
            warn!(error = %err, "failed to write to output sink");
        }
    }

    /// Everything written so far, for sinks created with [`Sink::memory`].
    /// Other sinks return an empty string.
    pub fn contents(&self) -> String {
        match &self.captured {
            Some(buf) => {
                String::from_utf8_lossy(&buf.lock().unwrap_or_else(PoisonError::into_inner))
                    .into_owned()
            }
            None => String::new(),
        }
    }

    /// Captured contents split into lines.
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}
