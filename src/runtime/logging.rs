use std::io::Write;

/// Sink for line-based output. Evaluation writes its output log through this
/// trait and sessions use it for tracing.
pub trait Logger {
    /// A writer for the next line, or `None` to drop it.
    fn line_writer(&mut self) -> Option<&mut dyn Write>;

    /// Writes a single line. Writing is best effort.
    fn write_line(&mut self, line: &str) {
        if let Some(w) = self.line_writer() {
            let _ = writeln!(w, "{}", line);
        }
    }
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct DummyLogger;

/// Collects lines in memory. Each `write_line` is one line, even when its
/// text contains newlines.
#[derive(Debug, Default)]
pub struct VecLogger {
    lines: Vec<String>,
    // Written through `line_writer`, finished by the next write
    pending: Vec<u8>,
}

/// Appends lines to a file, each prefixed by the session id and a timestamp.
#[derive(Debug)]
pub struct FileLogger(u32, std::fs::File);

fn secs_since_unix_epoch() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|dur| dur.as_secs_f64())
        .unwrap_or(0.)
}

impl VecLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = self.lines.clone();
        if !self.pending.is_empty() {
            lines.push(self.pending_line());
        }
        lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.pending.clear();
    }

    fn pending_line(&self) -> String {
        let text = String::from_utf8_lossy(&self.pending);
        text.strip_suffix('\n').unwrap_or(&*text).to_string()
    }

    fn finish_pending(&mut self) {
        if !self.pending.is_empty() {
            let line = self.pending_line();
            self.lines.push(line);
            self.pending.clear();
        }
    }
}

impl FileLogger {
    pub fn new(session_id: u32, file: std::fs::File) -> Self {
        Self(session_id, file)
    }
}

impl Logger for DummyLogger {
    fn line_writer(&mut self) -> Option<&mut dyn Write> {
        None
    }
}

impl Logger for VecLogger {
    fn line_writer(&mut self) -> Option<&mut dyn Write> {
        self.finish_pending();
        Some(&mut self.pending)
    }

    fn write_line(&mut self, line: &str) {
        self.finish_pending();
        self.lines.push(line.to_string());
    }
}

impl Logger for FileLogger {
    fn line_writer(&mut self) -> Option<&mut dyn Write> {
        let _ = write!(&mut self.1, "SESSION({}) at {:.6} ", self.0, secs_since_unix_epoch());
        Some(&mut self.1)
    }
}
