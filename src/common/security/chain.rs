/// Decomposition of a command into operator-separated segments
use super::error::ValidationError;
use super::rules::RuleTables;

/// One segment and the operator that follows it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainLink<'a> {
    /// Trimmed, never empty
    pub segment: &'a str,
    /// `None` for the last segment
    pub operator: Option<&'a str>,
}

/// Ordered segments of a command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chain<'a> {
    links: Vec<ChainLink<'a>>,
}

impl<'a> Chain<'a> {
    pub fn links(&self) -> &[ChainLink<'a>] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChainLink<'a>> {
        self.links.iter()
    }
}

/// Split `command` on the allowed operators.
///
/// Empty chunks (from leading, trailing or doubled operators) are dropped.
/// Fails if more than `max_segments` segments remain, or if an operator
/// outside the allowlist is paired with a segment.
pub fn split_chain<'a>(
    rules: &RuleTables,
    label: &str,
    command: &'a str,
) -> Result<Chain<'a>, ValidationError> {
    let mut links = Vec::new();
    let mut start = 0;

    for op in rules.operator_splitter().find_iter(command) {
        push_link(&mut links, &command[start..op.start()], Some(op.as_str()));
        start = op.end();
    }
    push_link(&mut links, &command[start..], None);

    if links.len() > rules.max_segments() {
        return Err(ValidationError::TooManySegments {
            label: label.to_string(),
            count: links.len(),
            max: rules.max_segments(),
        });
    }

    for link in &links {
        if let Some(op) = link.operator {
            if !rules.is_allowed_operator(op) {
                return Err(ValidationError::DisallowedOperator {
                    label: label.to_string(),
                    op: op.to_string(),
                });
            }
        }
    }

    Ok(Chain { links })
}

fn push_link<'a>(links: &mut Vec<ChainLink<'a>>, chunk: &'a str, operator: Option<&'a str>) {
    let segment = chunk.trim();
    if !segment.is_empty() {
        links.push(ChainLink { segment, operator });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(command: &str) -> Vec<(&str, Option<&str>)> {
        split_chain(&RuleTables::new(), "TEST", command)
            .unwrap()
            .iter()
            .map(|l| (l.segment, l.operator))
            .collect()
    }

    #[test]
    fn test_single_segment() {
        assert_eq!(pairs("mvn clean install"), vec![("mvn clean install", None)]);
    }

    #[test]
    fn test_operators_follow_segments() {
        assert_eq!(
            pairs("npm install && npm test || echo 'Build failed'"),
            vec![
                ("npm install", Some("&&")),
                ("npm test", Some("||")),
                ("echo 'Build failed'", None),
            ]
        );
        assert_eq!(
            pairs("npm test | grep passing ; make"),
            vec![
                ("npm test", Some("|")),
                ("grep passing", Some(";")),
                ("make", None),
            ]
        );
    }

    #[test]
    fn test_empty_chunks_dropped() {
        assert_eq!(
            pairs("; npm install ;; npm test ;"),
            vec![
                ("npm install", Some(";")),
                ("npm test", Some(";")),
            ]
        );
        assert!(split_chain(&RuleTables::new(), "TEST", "&& ||").unwrap().is_empty());
    }

    #[test]
    fn test_segment_limit() {
        let fifty = vec!["make"; 50].join(" && ");
        assert_eq!(split_chain(&RuleTables::new(), "TEST", &fifty).unwrap().len(), 50);

        let fifty_one = vec!["make"; 51].join(" && ");
        assert_eq!(
            split_chain(&RuleTables::new(), "TEST", &fifty_one),
            Err(ValidationError::TooManySegments {
                label: "TEST".to_string(),
                count: 51,
                max: 50,
            })
        );
    }

    #[test]
    fn test_custom_segment_limit() {
        let rules = RuleTables::new().with_max_segments(2);
        assert!(split_chain(&rules, "TEST", "make ; make").is_ok());
        assert!(matches!(
            split_chain(&rules, "TEST", "make ; make ; make"),
            Err(ValidationError::TooManySegments { count: 3, max: 2, .. })
        ));
    }
}
