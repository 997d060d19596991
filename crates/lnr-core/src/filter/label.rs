use serde_json::{json, Value};

/// A label filter: a leaf matches one label name, `And`/`Or` combine their
/// children. Built once from the `--label` flag and immutable afterwards.
///
/// The grammar keeps the tree shallow: the whole expression is either a
/// single leaf, an AND of leaves, or an OR of (leaves | AND groups).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelFilterExpression {
    Leaf(String),
    And(Vec<LabelFilterExpression>),
    Or(Vec<LabelFilterExpression>),
}

impl LabelFilterExpression {
    /// Render as a fragment of the remote issue filter. Name matching is
    /// delegated to the server's case-insensitive comparator.
    pub fn to_query_value(&self) -> Value {
        match self {
            LabelFilterExpression::Leaf(name) => {
                json!({ "labels": { "name": { "eqIgnoreCase": name } } })
            }
            LabelFilterExpression::And(children) => {
                json!({ "and": children.iter().map(Self::to_query_value).collect::<Vec<_>>() })
            }
            LabelFilterExpression::Or(children) => {
                json!({ "or": children.iter().map(Self::to_query_value).collect::<Vec<_>>() })
            }
        }
    }
}

/// Compile a label selector string: comma separates OR-groups, `+` separates
/// AND-terms within a group, empty groups and terms are dropped silently.
/// Leaf names are case-folded. Returns `None` for an effectively empty input.
pub fn compile_label_filter(input: &str) -> Option<LabelFilterExpression> {
    let folded = input.trim().to_lowercase();
    let mut groups = Vec::new();
    for group in folded.split(',') {
        let mut terms: Vec<LabelFilterExpression> = group
            .split('+')
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(|term| LabelFilterExpression::Leaf(term.to_owned()))
            .collect();
        match terms.len() {
            0 => {}
            1 => groups.push(terms.remove(0)),
            _ => groups.push(LabelFilterExpression::And(terms)),
        }
    }
    match groups.len() {
        0 => None,
        1 => Some(groups.remove(0)),
        _ => Some(LabelFilterExpression::Or(groups)),
    }
}

#[cfg(test)]
mod tests {
    use super::LabelFilterExpression::{And, Leaf, Or};
    use super::*;

    fn leaf(name: &str) -> LabelFilterExpression {
        Leaf(name.to_owned())
    }

    #[test]
    fn single_label_is_a_bare_leaf() {
        assert_eq!(compile_label_filter("bug"), Some(leaf("bug")));
    }

    #[test]
    fn commas_build_an_or() {
        assert_eq!(
            compile_label_filter("bug,devex"),
            Some(Or(vec![leaf("bug"), leaf("devex")]))
        );
    }

    #[test]
    fn plus_builds_an_and() {
        assert_eq!(
            compile_label_filter("bug+frontend"),
            Some(And(vec![leaf("bug"), leaf("frontend")]))
        );
    }

    #[test]
    fn or_of_and_groups() {
        assert_eq!(
            compile_label_filter("bug+frontend,devex"),
            Some(Or(vec![And(vec![leaf("bug"), leaf("frontend")]), leaf("devex")]))
        );
    }

    #[test]
    fn empty_input_is_absent() {
        assert_eq!(compile_label_filter(""), None);
        assert_eq!(compile_label_filter("   "), None);
        assert_eq!(compile_label_filter(",,+,"), None);
    }

    #[test]
    fn empty_groups_and_terms_are_dropped() {
        assert_eq!(
            compile_label_filter("bug,,devex+"),
            Some(Or(vec![leaf("bug"), leaf("devex")]))
        );
    }

    #[test]
    fn names_are_case_folded() {
        assert_eq!(compile_label_filter("Bug+FrontEnd"), compile_label_filter("bug+frontend"));
    }

    #[test]
    fn compilation_is_idempotent() {
        let first = compile_label_filter("bug+frontend,devex");
        let second = compile_label_filter("bug+frontend,devex");
        assert_eq!(first, second);
    }

    #[test]
    fn leaf_renders_label_name_match() {
        let value = leaf("bug").to_query_value();
        assert_eq!(value["labels"]["name"]["eqIgnoreCase"], "bug");
    }

    #[test]
    fn or_of_ands_renders_nested_combinators() {
        let expr = compile_label_filter("bug+frontend,devex").unwrap();
        let value = expr.to_query_value();
        let arms = value["or"].as_array().unwrap();
        assert_eq!(arms.len(), 2);
        let and_arm = arms[0]["and"].as_array().unwrap();
        assert_eq!(and_arm[0]["labels"]["name"]["eqIgnoreCase"], "bug");
        assert_eq!(and_arm[1]["labels"]["name"]["eqIgnoreCase"], "frontend");
        assert_eq!(arms[1]["labels"]["name"]["eqIgnoreCase"], "devex");
    }
}
