use regex::Regex;
use std::sync::OnceLock;

const MAX_PROGRAM_LENGTH: usize = 255;

/// Result of reducing an advanced output program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramValue {
    /// "Set <device> to <N>%" style programs, reduced to N.
    Intensity(i64),
    /// Anything that doesn't reduce, passed through as written.
    Script(String),
}

fn set_pattern() -> &'static Regex {
    static SET_PATTERN: OnceLock<Regex> = OnceLock::new();
    SET_PATTERN.get_or_init(|| Regex::new(r"Set\s\D*(\d+)").expect("set pattern is valid"))
}

/// Reduces an output program to a plain intensity where possible.
///
/// Oversized programs are rejected, `Set PF` programs (profile scripts) are
/// returned as text since their digits aren't an intensity.
pub fn parse_program(prog: &str) -> Option<ProgramValue> {
    if prog.chars().count() > MAX_PROGRAM_LENGTH {
        return None;
    }
    if prog.contains("Set PF") {
        return Some(ProgramValue::Script(prog.to_owned()));
    }

    let intensity = set_pattern()
        .captures(prog)
        .and_then(|captures| captures.get(1))
        .and_then(|digits| digits.as_str().parse::<i64>().ok());

    match intensity {
        Some(value) => {
            tracing::debug!("Program reduced to intensity {value}");
            Some(ProgramValue::Intensity(value))
        }
        None => Some(ProgramValue::Script(prog.to_owned())),
    }
}
