/// Tokenization of a single segment into executable and arguments
use once_cell::sync::Lazy;
use regex::Regex;

/// Redirect clauses removed before tokenizing: `[n]>target`, `[n]>>target`, `[n]>&word`
static REDIRECT_CLAUSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d*>>?&?\s*[^\s&|;]+").unwrap());

/// Redirect targets, `[n]> path`, `[n]>> path` and `[n]>& word`.
/// The forms are scanned independently so every candidate target is checked.
static REDIRECT_TARGETS: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        Regex::new(r"(\d*)>\s*([^\s&|;]+)").unwrap(),
        Regex::new(r"(\d*)>>\s*([^\s&|;]+)").unwrap(),
        Regex::new(r"(\d*)>>?&\s*([^\s&|;]+)").unwrap(),
    ]
});

/// Executable and arguments of one segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSegment {
    pub executable: String,
    pub args: Vec<String>,
}

impl ParsedSegment {
    /// True if any argument equals `arg`
    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

/// Parse a segment into executable and arguments.
///
/// Returns `None` when nothing but whitespace and redirects remain.
/// Unbalanced quotes fall back to whitespace splitting; the result is still
/// subject to every segment check.
pub fn parse_segment(segment: &str) -> Option<ParsedSegment> {
    let stripped = strip_redirects(segment.trim());
    let stripped = stripped.trim();
    if stripped.is_empty() {
        return None;
    }

    let mut tokens = shlex::split(stripped)
        .unwrap_or_else(|| stripped.split_whitespace().map(str::to_string).collect())
        .into_iter();

    let executable = tokens.next()?;
    Some(ParsedSegment {
        executable,
        args: tokens.collect(),
    })
}

/// Remove redirect clauses so they don't end up as arguments
pub fn strip_redirects(segment: &str) -> String {
    REDIRECT_CLAUSE.replace_all(segment, "").into_owned()
}

/// Redirect target paths in a raw segment.
///
/// `>&` is a file-descriptor duplication only when followed by a descriptor
/// number or `-` (`2>&1`, `>&2`, `>&-`); those have no filesystem target and
/// are skipped. Any other word after `>&` is a file receiving stdout and stderr.
pub fn extract_redirects(segment: &str) -> Vec<String> {
    let mut targets = Vec::new();
    for pattern in REDIRECT_TARGETS.iter() {
        for caps in pattern.captures_iter(segment) {
            if let Some(path) = caps.get(2) {
                if !is_fd_duplication(path.as_str()) {
                    targets.push(path.as_str().to_string());
                }
            }
        }
    }
    targets
}

/// `1`, `2-` or `-`
fn is_fd_duplication(word: &str) -> bool {
    let fd = word.strip_suffix('-').unwrap_or(word);
    fd.bytes().all(|b| b.is_ascii_digit())
}
