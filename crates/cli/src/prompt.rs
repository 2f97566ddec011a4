//! Interactive tier choices on the terminal.
use std::io::{self, BufRead, Write};

use character_core::{TierChoiceProvider, TierChoiceRequest};
use console::style;

/// Asks on stderr and reads the answer from stdin. An empty line or end of
/// input declines.
pub struct StdinChoices;

impl TierChoiceProvider for StdinChoices {
    fn choose(&mut self, request: &TierChoiceRequest) -> Option<String> {
        let mut stderr = io::stderr();
        let _ = writeln!(
            stderr,
            "{} {} level {} starts tier {}",
            style("?").cyan().bold(),
            request.track,
            request.level,
            request.tier
        );
        if let Some(previous) = &request.previous {
            let _ = writeln!(stderr, "  previous: {}", style(previous).dim());
        }
        if !request.rejected.is_empty() {
            let _ = writeln!(
                stderr,
                "  {} {}",
                style("not valid here:").red(),
                request.rejected.join(", ")
            );
        }
        let _ = writeln!(stderr, "  options: {}", request.options.join(", "));
        let _ = write!(stderr, "  choice (empty to cancel): ");
        let _ = stderr.flush();

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(answer.trim().to_string()).filter(|answer| !answer.is_empty()),
        }
    }
}
