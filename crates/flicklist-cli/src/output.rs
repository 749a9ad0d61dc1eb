use clap::ValueEnum;
use flicklist_core::{SyncOutcome, SyncReport};
use owo_colors::OwoColorize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    #[value(name = "json-pretty")]
    JsonPretty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Success,
    Error,
    Info,
    Warning,
}

impl Level {
    fn name(self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Error => "error",
            Level::Info => "info",
            Level::Warning => "warning",
        }
    }
}

/// Everything the CLI prints to stdout goes through here, so `--output json`
/// produces one JSON document per line and nothing else.
pub struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        self.message(Level::Success, msg.as_ref());
    }

    /// Errors are shown even in quiet mode
    pub fn error(&self, msg: impl AsRef<str>) {
        self.message(Level::Error, msg.as_ref());
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        self.message(Level::Info, msg.as_ref());
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        self.message(Level::Warning, msg.as_ref());
    }

    pub fn println(&self, msg: impl AsRef<str>) {
        self.message(Level::Info, msg.as_ref());
    }

    fn message(&self, level: Level, msg: &str) {
        if self.quiet && level != Level::Error {
            return;
        }

        match self.format {
            OutputFormat::Human => match level {
                Level::Success => println!("{} {}", "✓".green(), msg),
                Level::Error => eprintln!("{} {}", "✗".red(), msg),
                Level::Warning => println!("{} {}", "⚠".yellow(), msg),
                Level::Info => println!("{}", msg),
            },
            OutputFormat::Json | OutputFormat::JsonPretty => {
                self.print_json(&json!({ "type": level.name(), "message": msg }));
            }
        }
    }

    /// Print the result of one sync pass
    pub fn report(&self, report: &SyncReport) {
        if !self.is_human() {
            self.json(&report_json(report));
            return;
        }

        let headline = format!(
            "FlickList sync {} in {} ms",
            report.outcome,
            report.duration.as_millis()
        );
        match report.outcome {
            SyncOutcome::Success => self.success(headline),
            SyncOutcome::NotNeeded => self.info(headline),
            SyncOutcome::NoAccount => self.warn(format!("{} (run 'flicklist auth set-token' first)", headline)),
            SyncOutcome::FetchFailed => self.error(headline),
        }
        if report.full_reset {
            self.info("  all cached partitions were dropped first");
        }
        if report.daily_cleared {
            self.info("  daily cache sweep ran");
        }
        for action in &report.actions {
            self.info(format!("  • {}", action));
        }
        for (kind, rows) in &report.summary.watched {
            self.info(format!("  {} watched rows: {}", kind, rows));
        }
        for (kind, rows) in &report.summary.progress {
            self.info(format!("  {} progress rows: {}", kind, rows));
        }
        if report.summary.failed_fetches > 0 {
            self.warn(format!(
                "  {} remote pull(s) failed; their indexes were left unchanged",
                report.summary.failed_fetches
            ));
        }
    }

    pub fn json(&self, data: &Value) {
        if self.quiet && self.format != OutputFormat::Human {
            return;
        }
        self.print_json(data);
    }

    fn print_json(&self, data: &Value) {
        match self.format {
            OutputFormat::JsonPretty => {
                println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
            }
            _ => println!("{}", serde_json::to_string(data).unwrap_or_default()),
        }
    }
}

fn report_json(report: &SyncReport) -> Value {
    let mut value = serde_json::to_value(report).unwrap_or(Value::Null);
    if let Value::Object(map) = &mut value {
        map.insert("type".to_string(), json!("sync"));
    }
    value
}
