//! Index progress reporting.
//!
//! Reports observable progress during `index` so users see which tree is
//! being walked and how many documents have been updated so far.
//! Progress is emitted on **stderr** so stdout remains parseable for scripts.

use std::io::Write;

/// A single progress event for an index run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IndexProgressEvent {
    /// A directory walk is starting.
    Scanning { root: String },
    /// `updated` documents have been (re)indexed so far.
    Indexed { updated: u64 },
}

/// Reports index progress. Implementations write to stderr (human or JSON).
pub trait IndexProgressReporter: Send + Sync {
    /// Emit a progress event. Called from the indexer.
    fn report(&self, event: IndexProgressEvent);
}

/// Human-friendly progress on stderr: "Indexed 1,200 files...".
pub struct StderrProgress;

impl IndexProgressReporter for StderrProgress {
    fn report(&self, event: IndexProgressEvent) {
        let line = match &event {
            IndexProgressEvent::Scanning { root } => {
                format!("Indexing directory: {}\n", root)
            }
            IndexProgressEvent::Indexed { updated } => {
                format!("Indexed {} files...\n", format_number(*updated))
            }
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl IndexProgressReporter for JsonProgress {
    fn report(&self, event: IndexProgressEvent) {
        let obj = match &event {
            IndexProgressEvent::Scanning { root } => serde_json::json!({
                "event": "progress",
                "phase": "scanning",
                "root": root
            }),
            IndexProgressEvent::Indexed { updated } => serde_json::json!({
                "event": "progress",
                "phase": "indexing",
                "updated": updated
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl IndexProgressReporter for NoProgress {
    fn report(&self, _event: IndexProgressEvent) {}
}

/// Thousands-separated count, e.g. `12,400`.
fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Build a reporter for this mode.
    pub fn reporter(&self) -> Box<dyn IndexProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
