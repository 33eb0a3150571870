//! Plain-text pass/fail summary for the terminal.

use std::fmt::Write as _;

use crate::domain::{CheckStatus, ResultBundle};

const GREEN: &str = "\x1b[92m";
const RED: &str = "\x1b[91m";
const YELLOW: &str = "\x1b[93m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

struct Palette {
    color: bool,
}

impl Palette {
    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

/// Render the summary block for one task. `color` toggles ANSI escapes.
pub fn render_summary(bundle: &ResultBundle, color: bool) -> String {
    let p = Palette { color };
    let rule = "=".repeat(60);
    let mut out = String::new();

    let _ = writeln!(out, "\n{}", p.paint(BOLD, &rule));
    let _ = writeln!(
        out,
        "{}",
        p.paint(BOLD, &format!("  VALIDATION SUMMARY: {}", bundle.task))
    );
    let _ = writeln!(out, "{}\n", p.paint(BOLD, &rule));

    if let Some(error) = &bundle.preparation_error {
        let _ = writeln!(out, "  {}  preparation failed: {error}\n", p.paint(RED, "FAIL"));
        return out;
    }

    if let Some(schema) = &bundle.schema {
        let label = if schema.valid {
            p.paint(GREEN, "VALID")
        } else {
            p.paint(RED, "INVALID")
        };
        let _ = writeln!(out, "Schema: {label}");
        for message in &schema.messages {
            let _ = writeln!(out, "    - {message}");
        }
        out.push('\n');
    }

    let _ = writeln!(out, "{}", p.paint(BOLD, "Fairness Checks:"));
    for check in &bundle.fairness {
        let icon = match check.status {
            CheckStatus::Pass => p.paint(GREEN, "PASS"),
            CheckStatus::Fail => p.paint(RED, "FAIL"),
            CheckStatus::Unknown => p.paint(YELLOW, "????"),
        };
        let _ = writeln!(out, "  {icon}  {}", check.name);
    }

    let _ = writeln!(out, "\n{}", p.paint(BOLD, "Rubric Compliance:"));
    for result in &bundle.rubric {
        match result.pass_count() {
            Some((passed, total)) => {
                let code = if passed == total { GREEN } else { RED };
                let _ = writeln!(
                    out,
                    "  {}  {}",
                    p.paint(code, &format!("{passed}/{total}")),
                    result.category.title()
                );
            }
            None => {
                let _ = writeln!(
                    out,
                    "  {}  {} (parse error)",
                    p.paint(YELLOW, "????"),
                    result.category.title()
                );
            }
        }
    }
    out
}
