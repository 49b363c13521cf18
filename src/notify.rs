//! User-facing notifications
//!
//! Fire-and-forget messages with a severity. The console sink writes to
//! stderr so stdout stays clean for JSON/CSV output.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    fn ansi_color(self) -> &'static str {
        match self {
            Severity::Info => "\x1b[36m",
            Severity::Success => "\x1b[32m",
            Severity::Warning => "\x1b[33m",
            Severity::Error => "\x1b[31m",
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Severity::Info => "",
            Severity::Success => "✓ ",
            Severity::Warning => "Warning: ",
            Severity::Error => "✗ ",
        }
    }
}

pub(crate) trait Notifier {
    fn notify(&self, message: &str, severity: Severity);
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ConsoleNotifier {
    use_color: bool,
}

impl ConsoleNotifier {
    pub(crate) fn new(use_color: bool) -> Self {
        Self { use_color }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        if self.use_color {
            eprintln!(
                "{}{}{}\x1b[0m",
                severity.ansi_color(),
                severity.prefix(),
                message
            );
        } else {
            eprintln!("{}{}", severity.prefix(), message);
        }
    }
}
