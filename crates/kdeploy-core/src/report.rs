//! Pipeline-facing run reporting.
//!
//! Warnings and failures are surfaced to the pipeline as workflow commands on
//! stdout (`::warning::…`, `::error::…`) so they show up as annotations on the
//! step. Every message is mirrored to `tracing`.

use std::io::Write;
use std::sync::Mutex;

use tracing::{error, info, warn};

pub trait Reporter {
    fn info(&self, message: &str);
    fn warning(&self, message: &str);
    /// Record a failure for the run. Does not stop anything by itself.
    fn set_failed(&self, message: &str);
}

/// Escape a message body for a workflow command.
pub fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

// ---------------------------------------------------------------------------
// WorkflowReporter
// ---------------------------------------------------------------------------

/// Writes workflow commands to an output sink (stdout by default).
pub struct WorkflowReporter<W: Write = std::io::Stdout> {
    out: Mutex<W>,
}

impl WorkflowReporter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> WorkflowReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn emit(&self, line: &str) {
        let mut out = match self.out.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        // A closed stdout must not turn a report into a crash.
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
    }
}

impl<W: Write> Reporter for WorkflowReporter<W> {
    fn info(&self, message: &str) {
        info!("{message}");
        self.emit(message);
    }

    fn warning(&self, message: &str) {
        warn!("{message}");
        self.emit(&format!("::warning::{}", escape_data(message)));
    }

    fn set_failed(&self, message: &str) {
        error!("{message}");
        self.emit(&format!("::error::{}", escape_data(message)));
    }
}
