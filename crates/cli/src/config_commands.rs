use std::path::Path;

use {
    anyhow::Result,
    commbot_config::{Severity, ValidationResult, validate_file},
};

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// `commbot check-config`: print diagnostics, exit non-zero on errors.
pub fn check(path: Option<&Path>, verbose: bool) -> Result<()> {
    let result = validate_file(path);
    eprint!("{}", render(&result, verbose));

    if result.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}

fn render(result: &ValidationResult, verbose: bool) -> String {
    let mut out = match result.config_path {
        Some(ref path) => format!("Checking {}\n\n", path.display()),
        None => "No config file found; checking defaults.\n\n".to_string(),
    };

    let mut shown = 0;
    for d in &result.diagnostics {
        if d.severity == Severity::Info && !verbose {
            continue;
        }
        let color = match d.severity {
            Severity::Error => RED,
            Severity::Warning => YELLOW,
            Severity::Info => CYAN,
        };
        if d.path.is_empty() {
            out.push_str(&format!("  {BOLD}{color}{}{RESET} {}\n", d.severity, d.message));
        } else {
            out.push_str(&format!(
                "  {BOLD}{color}{}{RESET} {}: {}\n",
                d.severity, d.path, d.message
            ));
        }
        shown += 1;
    }
    if shown > 0 {
        out.push('\n');
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);
    if errors == 0 && warnings == 0 {
        out.push_str("No issues found.\n");
    } else {
        out.push_str(&format!("{errors} error(s), {warnings} warning(s)\n"));
    }
    out
}
