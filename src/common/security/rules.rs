/// Rule tables for shell command validation
/// Constant allowlists, limits and compiled dangerous-pattern matchers
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Maximum command length, in characters
pub const MAX_COMMAND_LENGTH: usize = 10_000;

/// Maximum number of chained segments in one command
pub const MAX_SEGMENTS: usize = 50;

/// Executables permitted as the leading token of a segment
pub const ALLOWED_EXECUTABLES: &[&str] = &[
    // .NET
    "dotnet",
    "msbuild",
    "nuget",
    "nunit-console",
    "nunit3-console",
    "xunit.console",
    "vstest.console",
    "mstest",
    "csharpier",
    // Java / Scala
    "mvn",
    "gradle",
    "ant",
    "sbt",
    "junit",
    "testng",
    "./gradlew",
    "./mvnw",
    "gradlew",
    "mvnw",
    "google-java-format",
    "checkstyle",
    // Python
    "pip",
    "pip3",
    "python",
    "python3",
    "pytest",
    "nose2",
    "unittest",
    "coverage",
    "poetry",
    "pipenv",
    "uv",
    "tox",
    "virtualenv",
    "black",
    "autopep8",
    "yapf",
    "isort",
    "ruff",
    "flake8",
    "pylint",
    // Node.js / JavaScript / TypeScript
    "npm",
    "npx",
    "yarn",
    "node",
    "pnpm",
    "bun",
    "jest",
    "mocha",
    "jasmine",
    "karma",
    "ava",
    "vitest",
    "nyc",
    "prettier",
    "eslint",
    "standard",
    // PHP
    "composer",
    "php",
    "phpunit",
    "pest",
    "codeception",
    "php-cs-fixer",
    "phpcbf",
    // Multi-language formatters
    "clang-format",
    // Build tools
    "make",
    "cmake",
    "ninja",
    "bazel",
    "ctest",
    // Shell utilities
    "echo",
    "sh",
    "bash",
    "grep",
    "sed",
    "awk",
    "cat",
    "tee",
];

/// Operators allowed to join segments
pub const ALLOWED_OPERATORS: &[&str] = &["&&", "||", ";", "|"];

/// Interpreter flags that accept inline code
pub const DANGEROUS_INTERPRETER_FLAGS: &[(&str, &[&str])] = &[
    ("node", &["-e", "--eval"]),
    ("python", &["-c"]),
    ("python3", &["-c"]),
    ("ruby", &["-e"]),
    ("perl", &["-e"]),
];

/// Modules python may run with `-m`
pub const ALLOWED_PYTHON_MODULES: &[&str] = &[
    "pytest",
    "unittest",
    "coverage",
    "pip",
    "venv",
    "virtualenv",
    "black",
    "autopep8",
    "yapf",
    "isort",
    "ruff",
    "flake8",
    "pylint",
    "mypy",
    "tox",
    "nose2",
    "poetry",
    "pipenv",
];

/// Executables restricted to running `.sh` script files
pub const SHELL_EXECUTABLES: &[&str] = &["sh", "bash"];

/// Executables subject to the `-m` module allowlist
pub const PYTHON_EXECUTABLES: &[&str] = &["python", "python3"];

/// Identifier reported for the background-execution matcher
pub const BACKGROUND_PATTERN_ID: &str = "&";

/// Built-in dangerous patterns, in scan order.
/// `None` marks the background `&` matcher, which needs look-around the regex crate lacks.
const BUILTIN_PATTERNS: &[(Option<&str>, &str)] = &[
    (Some(r"\$\("), "command substitution $(...)"),
    (Some(r"`"), "backtick command substitution"),
    (Some(r"\$\{"), "variable expansion ${...}"),
    (Some(r"\beval\s"), "eval command"),
    (Some(r"\bexec\s"), "exec command"),
    (Some(r"\brm\s+-rf"), "recursive forced rm"),
    (Some(r"\bcurl.*\|"), "curl piped to another command"),
    (Some(r"\bwget.*\|"), "wget piped to another command"),
    (Some(r">\s*/dev/"), "write to a device"),
    (Some(r";\s*rm\b"), "rm after command separator"),
    (Some(r"\|\s*sh\b"), "pipe to sh"),
    (Some(r"\|\s*bash\b"), "pipe to bash"),
    (None, "background execution (&)"),
    (Some(r"<<<?"), "here-document or here-string"),
    (Some(r"<\("), "process substitution (input)"),
    (Some(r">\("), "process substitution (output)"),
];

/// How a dangerous pattern is recognized
#[derive(Debug, Clone)]
enum Matcher {
    Regex(Regex),
    /// `&` not preceded by `&` or `>`, and not followed by `&` or a digit
    Background,
}

/// A signature denied anywhere in a command
#[derive(Debug, Clone)]
pub struct DangerousPattern {
    id: String,
    description: String,
    matcher: Matcher,
}

impl DangerousPattern {
    /// Build a regex-backed pattern; `id` is the regex source
    pub fn new(pattern: &str, description: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            id: pattern.to_string(),
            description: description.to_string(),
            matcher: Matcher::Regex(Regex::new(pattern)?),
        })
    }

    fn background(description: &str) -> Self {
        Self {
            id: BACKGROUND_PATTERN_ID.to_string(),
            description: description.to_string(),
            matcher: Matcher::Background,
        }
    }

    /// Stable identifier reported in rejections
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_match(&self, text: &str) -> bool {
        match &self.matcher {
            Matcher::Regex(re) => re.is_match(text),
            Matcher::Background => has_background_ampersand(text),
        }
    }
}

impl fmt::Display for DangerousPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.description)
    }
}

fn has_background_ampersand(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.iter().enumerate().any(|(i, &b)| {
        if b != b'&' {
            return false;
        }
        let after_ok = match bytes.get(i + 1) {
            Some(&next) => next != b'&' && !next.is_ascii_digit(),
            None => true,
        };
        let before_ok = i == 0 || !matches!(bytes[i - 1], b'&' | b'>');
        before_ok && after_ok
    })
}

/// Immutable policy data consulted by every validation.
///
/// Construct once (see [`default_rules`]) and share; customized tables are
/// built with the `with_*` methods, which rebuild derived matchers.
#[derive(Debug, Clone)]
pub struct RuleTables {
    allowed_executables: BTreeSet<String>,
    allowed_operators: Vec<String>,
    dangerous_patterns: Vec<DangerousPattern>,
    interpreter_flags: BTreeMap<String, Vec<String>>,
    allowed_python_modules: BTreeSet<String>,
    max_command_length: usize,
    max_segments: usize,
    operator_splitter: Regex,
}

impl RuleTables {
    /// Build the built-in rule set
    pub fn new() -> Self {
        let dangerous_patterns = BUILTIN_PATTERNS
            .iter()
            .map(|(pattern, description)| match pattern {
                Some(pattern) => DangerousPattern::new(pattern, description)
                    .expect("built-in dangerous pattern must compile"),
                None => DangerousPattern::background(description),
            })
            .collect();

        let allowed_operators: Vec<String> =
            ALLOWED_OPERATORS.iter().map(|s| s.to_string()).collect();

        Self {
            allowed_executables: ALLOWED_EXECUTABLES.iter().map(|s| s.to_string()).collect(),
            operator_splitter: build_operator_splitter(&allowed_operators),
            allowed_operators,
            dangerous_patterns,
            interpreter_flags: DANGEROUS_INTERPRETER_FLAGS
                .iter()
                .map(|(exe, flags)| {
                    (
                        exe.to_string(),
                        flags.iter().map(|f| f.to_string()).collect(),
                    )
                })
                .collect(),
            allowed_python_modules: ALLOWED_PYTHON_MODULES.iter().map(|s| s.to_string()).collect(),
            max_command_length: MAX_COMMAND_LENGTH,
            max_segments: MAX_SEGMENTS,
        }
    }

    /// Add an executable to the allowlist
    pub fn with_executable(mut self, name: &str) -> Self {
        self.allowed_executables.insert(name.to_string());
        self
    }

    /// Remove an executable from the allowlist
    pub fn without_executable(mut self, name: &str) -> Self {
        self.allowed_executables.remove(name);
        self
    }

    /// Append a dangerous pattern to the end of the scan order
    pub fn with_dangerous_pattern(
        mut self,
        pattern: &str,
        description: &str,
    ) -> Result<Self, regex::Error> {
        self.dangerous_patterns
            .push(DangerousPattern::new(pattern, description)?);
        Ok(self)
    }

    /// Deny `flag` for `executable`
    pub fn with_interpreter_flag(mut self, executable: &str, flag: &str) -> Self {
        let flags = self
            .interpreter_flags
            .entry(executable.to_string())
            .or_default();
        if !flags.iter().any(|f| f == flag) {
            flags.push(flag.to_string());
        }
        self
    }

    pub fn with_python_module(mut self, module: &str) -> Self {
        self.allowed_python_modules.insert(module.to_string());
        self
    }

    pub fn with_max_command_length(mut self, max: usize) -> Self {
        self.max_command_length = max;
        self
    }

    pub fn with_max_segments(mut self, max: usize) -> Self {
        self.max_segments = max;
        self
    }

    pub fn is_allowed_executable(&self, name: &str) -> bool {
        self.allowed_executables.contains(name)
    }

    pub fn is_allowed_operator(&self, op: &str) -> bool {
        self.allowed_operators.iter().any(|o| o == op)
    }

    pub fn is_allowed_python_module(&self, module: &str) -> bool {
        self.allowed_python_modules.contains(module)
    }

    /// Flags denied for `executable`, if it is a restricted interpreter
    pub fn interpreter_flags(&self, executable: &str) -> Option<&[String]> {
        self.interpreter_flags.get(executable).map(Vec::as_slice)
    }

    pub fn allowed_executables(&self) -> impl Iterator<Item = &str> {
        self.allowed_executables.iter().map(String::as_str)
    }

    pub fn allowed_operators(&self) -> impl Iterator<Item = &str> {
        self.allowed_operators.iter().map(String::as_str)
    }

    pub fn allowed_python_modules(&self) -> impl Iterator<Item = &str> {
        self.allowed_python_modules.iter().map(String::as_str)
    }

    pub fn restricted_interpreters(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.interpreter_flags
            .iter()
            .map(|(exe, flags)| (exe.as_str(), flags.as_slice()))
    }

    /// Dangerous patterns in scan order
    pub fn dangerous_patterns(&self) -> &[DangerousPattern] {
        &self.dangerous_patterns
    }

    pub fn max_command_length(&self) -> usize {
        self.max_command_length
    }

    pub fn max_segments(&self) -> usize {
        self.max_segments
    }

    /// Alternation over the allowed operators, longest first
    pub(crate) fn operator_splitter(&self) -> &Regex {
        &self.operator_splitter
    }
}

impl Default for RuleTables {
    fn default() -> Self {
        Self::new()
    }
}

fn build_operator_splitter(operators: &[String]) -> Regex {
    let mut ordered: Vec<&String> = operators.iter().collect();
    // "||" must win over "|"
    ordered.sort_by(|a, b| b.len().cmp(&a.len()));
    let alternation = ordered
        .iter()
        .map(|op| regex::escape(op))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("({})", alternation)).expect("escaped operator alternation must compile")
}

/// Process-wide built-in rule set
static DEFAULT_RULES: Lazy<Arc<RuleTables>> = Lazy::new(|| Arc::new(RuleTables::new()));

/// Get the shared built-in rule set
pub fn default_rules() -> Arc<RuleTables> {
    Arc::clone(&DEFAULT_RULES)
}
