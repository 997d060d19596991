use std::collections::BTreeSet;

use thiserror::Error;

use crate::workflow::WorkflowStateCategory;

/// Default behavior when no status filter is given. Passed in explicitly so
/// callers and tests can override it.
#[derive(Debug, Clone)]
pub struct StatusPolicy {
    pub default_exclude: Vec<WorkflowStateCategory>,
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self {
            default_exclude: vec![
                WorkflowStateCategory::Completed,
                WorkflowStateCategory::Canceled,
            ],
        }
    }
}

/// Include/exclude sets over the workflow-state vocabulary. Ordered sets so
/// the emitted filter is reproducible run to run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSelector {
    pub include: BTreeSet<WorkflowStateCategory>,
    pub exclude: BTreeSet<WorkflowStateCategory>,
}

impl StatusSelector {
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

/// Parse a comma-separated status selector string.
///
/// Empty input applies the default policy; `all` (case-insensitive) means no
/// filter and returns `None`. Tokens may be negated with `!` or the
/// shell-escaped `\!`; both resolve identically. A category named both
/// negated and non-negated ends up excluded.
pub fn parse_status_filter(
    input: &str,
    policy: &StatusPolicy,
) -> Result<Option<StatusSelector>, StatusParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Some(StatusSelector {
            include: BTreeSet::new(),
            exclude: policy.default_exclude.iter().copied().collect(),
        }));
    }
    if trimmed.eq_ignore_ascii_case("all") {
        return Ok(None);
    }

    let mut selector = StatusSelector::default();
    for token in trimmed.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let (negated, name) = match token.strip_prefix("\\!").or_else(|| token.strip_prefix('!')) {
            Some(rest) => (true, rest.trim()),
            None => (false, token),
        };
        let category = WorkflowStateCategory::from_token(name)
            .ok_or_else(|| StatusParseError::UnknownCategory(name.to_owned()))?;
        if negated {
            selector.exclude.insert(category);
        } else {
            selector.include.insert(category);
        }
    }

    let excluded = selector.exclude.clone();
    selector.include.retain(|category| !excluded.contains(category));
    Ok(Some(selector))
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatusParseError {
    #[error("unknown workflow state '{0}': expected started, unstarted (or todo), triage, backlog, completed, canceled, or all")]
    UnknownCategory(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use WorkflowStateCategory::*;

    fn parse(input: &str) -> Option<StatusSelector> {
        parse_status_filter(input, &StatusPolicy::default()).unwrap()
    }

    #[test]
    fn empty_input_applies_default_policy() {
        let selector = parse("").unwrap();
        assert!(selector.include.is_empty());
        assert_eq!(
            selector.exclude.iter().copied().collect::<Vec<_>>(),
            vec![Completed, Canceled]
        );
    }

    #[test]
    fn explicit_negations_match_default_policy() {
        assert_eq!(parse("!completed,!canceled"), parse(""));
    }

    #[test]
    fn all_means_no_filter() {
        assert!(parse("all").is_none());
        assert!(parse("ALL").is_none());
        assert!(parse(" All ").is_none());
    }

    #[test]
    fn positive_and_negative_tokens_split() {
        let selector = parse("started, !triage ,backlog").unwrap();
        assert_eq!(
            selector.include.iter().copied().collect::<Vec<_>>(),
            vec![Started, Backlog]
        );
        assert_eq!(selector.exclude.iter().copied().collect::<Vec<_>>(), vec![Triage]);
    }

    #[test]
    fn escaped_negation_resolves_like_bare_negation() {
        assert_eq!(parse(r"\!completed"), parse("!completed"));
    }

    #[test]
    fn todo_alias_applies_after_negation() {
        let selector = parse("!todo").unwrap();
        assert_eq!(selector.exclude.iter().copied().collect::<Vec<_>>(), vec![Unstarted]);
    }

    #[test]
    fn token_order_does_not_matter() {
        assert_eq!(parse("started,!completed,backlog"), parse("backlog,!completed,started"));
    }

    #[test]
    fn duplicates_deduplicate() {
        let selector = parse("started,started,!canceled,!canceled").unwrap();
        assert_eq!(selector.include.len(), 1);
        assert_eq!(selector.exclude.len(), 1);
    }

    #[test]
    fn contradiction_resolves_to_exclude() {
        for input in ["started,!started", "!started,started"] {
            let selector = parse(input).unwrap();
            assert!(selector.include.is_empty(), "{input}");
            assert_eq!(
                selector.exclude.iter().copied().collect::<Vec<_>>(),
                vec![Started],
                "{input}"
            );
        }
    }

    #[test]
    fn unknown_token_is_an_error() {
        let err = parse_status_filter("started,done", &StatusPolicy::default()).unwrap_err();
        assert_eq!(err, StatusParseError::UnknownCategory("done".into()));
    }

    #[test]
    fn policy_override_is_honored() {
        let policy = StatusPolicy {
            default_exclude: vec![Backlog],
        };
        let selector = parse_status_filter("", &policy).unwrap().unwrap();
        assert_eq!(selector.exclude.iter().copied().collect::<Vec<_>>(), vec![Backlog]);
    }
}
