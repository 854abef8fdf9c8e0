/// Rejection reasons for command validation
use thiserror::Error;

/// Why a command was rejected.
///
/// Every variant carries the caller's `label` (usually the configuration key
/// the command came from) so the rendered message can be shown to an operator
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{label} is empty or contains only whitespace")]
    EmptyCommand { label: String },

    #[error("{label} exceeds maximum length of {max} characters (command length: {length})")]
    TooLong {
        label: String,
        length: usize,
        max: usize,
    },

    #[error(
        "{label} contains unescaped newline characters; \
         use escaped newlines (\\) for line continuations or && for chaining"
    )]
    UnsafeNewline { label: String },

    #[error("{label} contains dangerous pattern: {pattern}")]
    DangerousPattern { label: String, pattern: String },

    #[error(
        "{label} exceeds maximum complexity of {max} chained commands \
         (command has {count} segments)"
    )]
    TooManySegments {
        label: String,
        count: usize,
        max: usize,
    },

    #[error("{label} uses disallowed operator: {op}")]
    DisallowedOperator { label: String, op: String },

    #[error("{label} uses disallowed command: {name}")]
    DisallowedExecutable { label: String, name: String },

    #[error(
        "{label} uses shell command incorrectly: {segment} (sh/bash may only run .sh script files)"
    )]
    ImproperShellUsage { label: String, segment: String },

    #[error("{label} uses dangerous interpreter flag: {executable} {flag}")]
    DangerousInterpreterFlag {
        label: String,
        executable: String,
        flag: String,
    },

    #[error(
        "{label} uses disallowed Python module with -m flag: {}",
        .module.as_deref().unwrap_or("<none>")
    )]
    DisallowedPythonModule {
        label: String,
        module: Option<String>,
    },

    #[error("{label} contains unsafe file redirect: {path}")]
    UnsafeRedirect { label: String, path: String },
}

impl ValidationError {
    /// Stable snake_case name of the rejection reason
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::EmptyCommand { .. } => "empty_command",
            ValidationError::TooLong { .. } => "too_long",
            ValidationError::UnsafeNewline { .. } => "unsafe_newline",
            ValidationError::DangerousPattern { .. } => "dangerous_pattern",
            ValidationError::TooManySegments { .. } => "too_many_segments",
            ValidationError::DisallowedOperator { .. } => "disallowed_operator",
            ValidationError::DisallowedExecutable { .. } => "disallowed_executable",
            ValidationError::ImproperShellUsage { .. } => "improper_shell_usage",
            ValidationError::DangerousInterpreterFlag { .. } => "dangerous_interpreter_flag",
            ValidationError::DisallowedPythonModule { .. } => "disallowed_python_module",
            ValidationError::UnsafeRedirect { .. } => "unsafe_redirect",
        }
    }

    /// Label the command was validated under
    pub fn label(&self) -> &str {
        match self {
            ValidationError::EmptyCommand { label }
            | ValidationError::TooLong { label, .. }
            | ValidationError::UnsafeNewline { label }
            | ValidationError::DangerousPattern { label, .. }
            | ValidationError::TooManySegments { label, .. }
            | ValidationError::DisallowedOperator { label, .. }
            | ValidationError::DisallowedExecutable { label, .. }
            | ValidationError::ImproperShellUsage { label, .. }
            | ValidationError::DangerousInterpreterFlag { label, .. }
            | ValidationError::DisallowedPythonModule { label, .. }
            | ValidationError::UnsafeRedirect { label, .. } => label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_label_and_offender() {
        let err = ValidationError::DisallowedExecutable {
            label: "BUILD_COMMAND".to_string(),
            name: "wget".to_string(),
        };
        assert_eq!(err.to_string(), "BUILD_COMMAND uses disallowed command: wget");

        let err = ValidationError::UnsafeRedirect {
            label: "FORMATTING_COMMAND".to_string(),
            path: "/etc/passwd".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "FORMATTING_COMMAND contains unsafe file redirect: /etc/passwd"
        );

        let err = ValidationError::TooLong {
            label: "BUILD_COMMAND".to_string(),
            length: 10_001,
            max: 10_000,
        };
        assert!(err.to_string().contains("10000"));
        assert!(err.to_string().contains("10001"));
    }

    #[test]
    fn test_missing_python_module_message() {
        let err = ValidationError::DisallowedPythonModule {
            label: "BUILD_COMMAND".to_string(),
            module: None,
        };
        assert!(err.to_string().ends_with("<none>"));

        let err = ValidationError::DisallowedPythonModule {
            label: "BUILD_COMMAND".to_string(),
            module: Some("os".to_string()),
        };
        assert!(err.to_string().ends_with(": os"));
    }

    #[test]
    fn test_kind_and_label() {
        let err = ValidationError::UnsafeNewline {
            label: "X".to_string(),
        };
        assert_eq!(err.kind(), "unsafe_newline");
        assert_eq!(err.label(), "X");
    }
}
