//! CLI output formatting.
//!
//! The converter reports what it does as [`ConvertEvent`]s; this module turns
//! them into lines for the terminal. Progress goes to stdout, failures to
//! stderr, and every directory ends with a separator rule:
//!
//! ```text
//! copying [docs/guide/diagram.png] to [html/guide/diagram.png]
//! converting [docs/guide/usage.md] to [html/guide/usage.html]
//! ------------------------------------------------------------ docs/guide
//! converting [docs/index.md] to [html/index.html]
//! error: cannot read docs/broken.md: No such file or directory (os error 2)
//! ------------------------------------------------------------ docs
//! Converted 2 pages, copied 1 file, wrapped 0 data files in 2 directories (1 failed)
//! ```
//!
//! Format functions are pure (they return strings) so they can be tested
//! without capturing output; the `print_*` wrappers do the writing.

use crate::convert::{ConvertEvent, ConvertSummary};

const SEPARATOR_WIDTH: usize = 60;

/// Format one event as output lines.
pub fn format_event(event: &ConvertEvent) -> Vec<String> {
    match event {
        ConvertEvent::Converted { source, dest } => vec![format!(
            "converting [{}] to [{}]",
            source.display(),
            dest.display()
        )],
        ConvertEvent::Copied { source, dest } => vec![format!(
            "copying [{}] to [{}]",
            source.display(),
            dest.display()
        )],
        ConvertEvent::Wrapped { source, dest } => vec![format!(
            "wrapping [{}] in [{}]",
            source.display(),
            dest.display()
        )],
        ConvertEvent::Failed(error) => vec![format!("error: {error}")],
        ConvertEvent::DirectoryFinished { source } => {
            vec![format!("{} {}", "-".repeat(SEPARATOR_WIDTH), source.display())]
        }
    }
}

/// Whether an event belongs on stderr.
pub fn is_error(event: &ConvertEvent) -> bool {
    matches!(event, ConvertEvent::Failed(_))
}

/// Print an event to stdout, or stderr for failures.
pub fn print_event(event: &ConvertEvent) {
    for line in format_event(event) {
        if is_error(event) {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

fn plural(n: usize, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {plural}")
    }
}

/// One-line summary of a run.
pub fn format_summary(summary: &ConvertSummary) -> String {
    let mut line = format!(
        "Converted {}, copied {}, wrapped {} in {}",
        plural(summary.rendered, "page", "pages"),
        plural(summary.copied, "file", "files"),
        plural(summary.wrapped, "data file", "data files"),
        plural(summary.directories, "directory", "directories"),
    );
    if summary.failed > 0 {
        line.push_str(&format!(" ({} failed)", summary.failed));
    }
    line
}
