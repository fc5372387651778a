pub mod apply;
pub mod diff;
pub mod facts;
pub mod verify;

use colored::Colorize;
use declarative::{ApplyOutcome, CheckOutcome, ProgressCallback, executor};
use indicatif::ProgressBar;

use crate::progress;

/// Prints each report line as the executor reaches it, with a spinner while
/// an apply runs
pub struct ConsoleProgress {
    quiet: bool,
    spinner: Option<ProgressBar>,
}

impl ConsoleProgress {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            spinner: None,
        }
    }

    fn stop_spinner(&mut self) {
        if let Some(pb) = self.spinner.take() {
            progress::finish_clear(&pb);
        }
    }
}

impl ProgressCallback for ConsoleProgress {
    fn on_check(&mut self, name: &str, outcome: &CheckOutcome) {
        println!("{}", paint(&executor::check_line(name, outcome)));
    }

    fn on_apply_start(&mut self, name: &str) {
        self.spinner = Some(progress::spinner(&format!("Applying {name}..."), self.quiet));
    }

    fn on_apply(&mut self, name: &str, outcome: &ApplyOutcome) {
        self.stop_spinner();
        println!("{}", paint(&executor::apply_line(name, outcome)));
    }
}

impl Drop for ConsoleProgress {
    fn drop(&mut self) {
        self.stop_spinner();
    }
}

/// Colour the `[TAG]` prefix and status word of a report line
fn paint(line: &str) -> String {
    let colored_status = [
        (" | ", "CHANGED", "green"),
        (" | ", "FAILED", "red"),
        (" | ", "absent", "yellow"),
        (" | ", "present", "green"),
        (" | ", "skipped", "blue"),
    ];

    let Some((tag, rest)) = line.split_once(' ') else {
        return line.to_string();
    };
    let tag = match tag {
        "[CHECK]" => tag.cyan().bold(),
        "[APPLY]" => tag.magenta().bold(),
        "[FAIL]" => tag.red().bold(),
        _ => return line.to_string(),
    };

    let Some((name, tail)) = rest.split_once(": ") else {
        return format!("{tag} {rest}");
    };
    for (sep, word, color) in colored_status {
        if let Some(message) = tail.strip_prefix(word).and_then(|t| t.strip_prefix(sep)) {
            return format!("{tag} {name}: {}{sep}{message}", word.color(color).bold());
        }
    }
    format!("{tag} {name}: {tail}")
}
