/// Whole-command checks run before a command is split into segments
use super::error::ValidationError;
use super::rules::{DangerousPattern, RuleTables};
use once_cell::sync::Lazy;
use regex::Regex;

/// Backslash-newline continuation with surrounding whitespace
static LINE_CONTINUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\\s*\n\s*").unwrap());

/// A command that passed the global checks, with line continuations folded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedCommand {
    text: String,
}

impl NormalizedCommand {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

/// Run the global checks against a raw command.
///
/// Order: emptiness, length, unescaped newlines, continuation folding,
/// then every dangerous pattern against the folded text.
pub fn precheck(
    rules: &RuleTables,
    label: &str,
    command: &str,
) -> Result<NormalizedCommand, ValidationError> {
    if command.trim().is_empty() {
        return Err(ValidationError::EmptyCommand {
            label: label.to_string(),
        });
    }

    // Bounded before any regex work
    let length = command.chars().count();
    if length > rules.max_command_length() {
        return Err(ValidationError::TooLong {
            label: label.to_string(),
            length,
            max: rules.max_command_length(),
        });
    }

    if has_unescaped_newline(command) {
        return Err(ValidationError::UnsafeNewline {
            label: label.to_string(),
        });
    }

    let text = fold_line_continuations(command);

    if let Some(pattern) = find_dangerous_pattern(rules, &text) {
        return Err(ValidationError::DangerousPattern {
            label: label.to_string(),
            pattern: pattern.id().to_string(),
        });
    }

    Ok(NormalizedCommand { text })
}

/// True if a `\n` or `\r` appears without a backslash directly before it
pub fn has_unescaped_newline(command: &str) -> bool {
    let mut prev = None;
    for ch in command.chars() {
        if (ch == '\n' || ch == '\r') && prev != Some('\\') {
            return true;
        }
        prev = Some(ch);
    }
    false
}

/// Replace each backslash-newline continuation with a single space
pub fn fold_line_continuations(command: &str) -> String {
    LINE_CONTINUATION.replace_all(command, " ").into_owned()
}

/// First dangerous pattern matching `command`, in table order
pub fn find_dangerous_pattern<'r>(
    rules: &'r RuleTables,
    command: &str,
) -> Option<&'r DangerousPattern> {
    rules
        .dangerous_patterns()
        .iter()
        .find(|pattern| pattern.is_match(command))
}
