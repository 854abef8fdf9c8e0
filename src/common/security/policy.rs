/// Per-segment policy checks
use super::error::ValidationError;
use super::rules::{RuleTables, PYTHON_EXECUTABLES, SHELL_EXECUTABLES};
use super::segment::{extract_redirects, ParsedSegment};

/// Run every segment check in order; the first failure wins.
///
/// `segment` is the raw segment text (redirect clauses included) and
/// `parsed` its tokenization. A vacuous segment (`parsed == None`) skips the
/// executable checks but its redirect targets are still checked.
pub fn check_segment(
    rules: &RuleTables,
    label: &str,
    segment: &str,
    parsed: Option<&ParsedSegment>,
) -> Result<(), ValidationError> {
    if let Some(parsed) = parsed {
        check_executable(rules, label, parsed)?;
        check_shell_usage(label, segment, parsed)?;
        check_interpreter_flags(rules, label, parsed)?;
        check_python_module(rules, label, parsed)?;
    }
    check_redirects(label, segment)
}

/// The executable must be on the allowlist
pub fn check_executable(
    rules: &RuleTables,
    label: &str,
    parsed: &ParsedSegment,
) -> Result<(), ValidationError> {
    if rules.is_allowed_executable(&parsed.executable) {
        Ok(())
    } else {
        Err(ValidationError::DisallowedExecutable {
            label: label.to_string(),
            name: parsed.executable.clone(),
        })
    }
}

/// `sh`/`bash` may only run a `.sh` script, never inline code.
/// Any single-dash word containing `c` is read as a `-c` cluster, script arguments included.
pub fn check_shell_usage(
    label: &str,
    segment: &str,
    parsed: &ParsedSegment,
) -> Result<(), ValidationError> {
    if !SHELL_EXECUTABLES.contains(&parsed.executable.as_str()) {
        return Ok(());
    }

    let inline = parsed.args.iter().any(|arg| is_short_flag_cluster_with(arg, 'c'));
    let script = parsed.args.iter().find(|arg| !arg.starts_with('-'));
    let runs_script = matches!(script, Some(path) if path.ends_with(".sh"));

    if inline || !runs_script {
        return Err(ValidationError::ImproperShellUsage {
            label: label.to_string(),
            segment: segment.to_string(),
        });
    }
    Ok(())
}

/// Restricted interpreters may not take code through their eval flags
pub fn check_interpreter_flags(
    rules: &RuleTables,
    label: &str,
    parsed: &ParsedSegment,
) -> Result<(), ValidationError> {
    let Some(flags) = rules.interpreter_flags(&parsed.executable) else {
        return Ok(());
    };

    for flag in flags {
        if parsed.args.iter().any(|arg| flag_matches(arg, flag)) {
            return Err(ValidationError::DangerousInterpreterFlag {
                label: label.to_string(),
                executable: parsed.executable.clone(),
                flag: flag.clone(),
            });
        }
    }
    Ok(())
}

/// `python -m` may only run an allowlisted module
pub fn check_python_module(
    rules: &RuleTables,
    label: &str,
    parsed: &ParsedSegment,
) -> Result<(), ValidationError> {
    if !PYTHON_EXECUTABLES.contains(&parsed.executable.as_str()) {
        return Ok(());
    }

    let mut args = parsed.args.iter();
    let module = loop {
        match args.next() {
            Some(arg) if arg == "-m" => break args.next().map(String::as_str),
            // Attached form: -mpytest
            Some(arg) if arg.starts_with("-m") && !arg.starts_with("--") => break Some(&arg[2..]),
            Some(_) => continue,
            None => return Ok(()),
        }
    };

    match module {
        Some(name) if rules.is_allowed_python_module(name) => Ok(()),
        other => Err(ValidationError::DisallowedPythonModule {
            label: label.to_string(),
            module: other.map(str::to_string),
        }),
    }
}

/// Redirect targets must stay inside the working tree
pub fn check_redirects(label: &str, segment: &str) -> Result<(), ValidationError> {
    match extract_redirects(segment)
        .into_iter()
        .find(|path| !is_safe_redirect_target(path))
    {
        Some(path) => Err(ValidationError::UnsafeRedirect {
            label: label.to_string(),
            path,
        }),
        None => Ok(()),
    }
}

/// Relative after quote removal, no `..`, no `~` or `$` expansion
pub fn is_safe_redirect_target(path: &str) -> bool {
    // The shell removes quotes and escapes before opening the file
    let path: String = path
        .chars()
        .filter(|c| !matches!(c, '\'' | '"' | '\\'))
        .collect();
    !(path.starts_with('/')
        || path.contains("..")
        || path.starts_with('~')
        || path.contains('$'))
}

/// Exact flag, attached value (`-cCODE`) or long form with `=` (`--eval=CODE`).
/// Any single-dash word starting with a short flag counts, so `-config` matches `-c`.
fn flag_matches(arg: &str, flag: &str) -> bool {
    if arg == flag {
        return true;
    }
    if flag.starts_with("--") {
        return arg
            .strip_prefix(flag)
            .is_some_and(|rest| rest.starts_with('='));
    }
    flag.len() == 2 && !arg.starts_with("--") && arg.starts_with(flag)
}

/// `-c`, `-ec`, `-xc` and similar clusters of single-letter options
fn is_short_flag_cluster_with(arg: &str, letter: char) -> bool {
    arg.len() > 1 && arg.starts_with('-') && !arg.starts_with("--") && arg[1..].contains(letter)
}
