use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::cycle::{CycleCache, CycleError, ResolvedCycle};
use crate::services::cycles::CycleService;

use super::label::{compile_label_filter, LabelFilterExpression};
use super::status::{parse_status_filter, StatusParseError, StatusPolicy, StatusSelector};

/// Interpretation of the `--cycle` flag value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleArg {
    /// Flag omitted or empty: default to the current cycle when one exists.
    Omitted,
    /// `all`: no cycle constraint.
    All,
    /// Anything else: resolve as a selector.
    Selector(String),
}

impl CycleArg {
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag.map(str::trim) {
            None | Some("") => CycleArg::Omitted,
            Some(value) if value.eq_ignore_ascii_case("all") => CycleArg::All,
            Some(value) => CycleArg::Selector(value.to_owned()),
        }
    }
}

/// The cycle portion of the composed filter.
#[derive(Debug, Clone)]
pub enum CycleConstraint {
    Unconstrained,
    Resolved(ResolvedCycle),
    /// Fallback when no current cycle could be resolved: let the server
    /// match whatever cycle is active at query time.
    ActiveOnly,
}

/// Result of a filter build: the remote filter object (absent when nothing
/// constrains the query) and an optional header describing the cycle scope.
#[derive(Debug, Clone, Default)]
pub struct BuiltFilter {
    pub filter: Option<Value>,
    pub cycle_header: Option<String>,
}

/// Composes status, label, assignee, and cycle constraints into one issue
/// filter. Constraints are additive; absent ones are omitted entirely.
pub struct IssueFilterBuilder<'a> {
    cycles: &'a CycleService,
    cache: Option<&'a CycleCache>,
    policy: StatusPolicy,
}

impl<'a> IssueFilterBuilder<'a> {
    pub fn new(cycles: &'a CycleService, cache: Option<&'a CycleCache>) -> Self {
        Self {
            cycles,
            cache,
            policy: StatusPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: StatusPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn build(
        &self,
        status: &str,
        labels: &str,
        assignee: Option<&str>,
        cycle: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<BuiltFilter, FilterBuildError> {
        let status_selector = parse_status_filter(status, &self.policy)?;
        let label_expression = compile_label_filter(labels);
        let assignee = assignee
            .map(str::trim)
            .filter(|name| !name.is_empty() && !name.eq_ignore_ascii_case("all"));

        let (constraint, cycle_header) = match CycleArg::from_flag(cycle) {
            CycleArg::All => (CycleConstraint::Unconstrained, None),
            CycleArg::Selector(selector) => {
                let resolved = self.cycles.resolve(&selector, self.cache, now).await?;
                let header = resolved.display_label();
                (CycleConstraint::Resolved(resolved), Some(header))
            }
            CycleArg::Omitted => match self.cycles.resolve("current", self.cache, now).await {
                Ok(resolved) => {
                    let header = resolved.display_label();
                    (CycleConstraint::Resolved(resolved), Some(header))
                }
                Err(_) => (CycleConstraint::ActiveOnly, None),
            },
        };

        let filter = compose_filter(
            status_selector.as_ref(),
            label_expression.as_ref(),
            assignee,
            &constraint,
        );
        Ok(BuiltFilter {
            filter,
            cycle_header,
        })
    }
}

/// Pure composition of the filter object. Every present constraint becomes
/// one entry; sibling entries AND together on the server.
pub fn compose_filter(
    status: Option<&StatusSelector>,
    labels: Option<&LabelFilterExpression>,
    assignee: Option<&str>,
    cycle: &CycleConstraint,
) -> Option<Value> {
    let mut filter = Map::new();

    if let Some(selector) = status {
        let mut state_type = Map::new();
        if !selector.include.is_empty() {
            let names: Vec<&str> = selector.include.iter().map(|c| c.as_str()).collect();
            state_type.insert("in".into(), json!(names));
        }
        if !selector.exclude.is_empty() {
            let names: Vec<&str> = selector.exclude.iter().map(|c| c.as_str()).collect();
            state_type.insert("nin".into(), json!(names));
        }
        if !state_type.is_empty() {
            filter.insert("state".into(), json!({ "type": Value::Object(state_type) }));
        }
    }

    if let Some(name) = assignee {
        filter.insert("assignee".into(), json!({ "displayName": { "eqIgnoreCase": name } }));
    }

    match cycle {
        CycleConstraint::Unconstrained => {}
        CycleConstraint::Resolved(resolved) => {
            filter.insert("cycle".into(), json!({ "number": { "eq": resolved.number } }));
        }
        CycleConstraint::ActiveOnly => {
            filter.insert("cycle".into(), json!({ "isActive": { "eq": true } }));
        }
    }

    if let Some(expression) = labels {
        if let Value::Object(entries) = expression.to_query_value() {
            for (key, value) in entries {
                filter.insert(key, value);
            }
        }
    }

    if filter.is_empty() {
        None
    } else {
        Some(Value::Object(filter))
    }
}

#[derive(Debug, Error)]
pub enum FilterBuildError {
    #[error(transparent)]
    Status(#[from] StatusParseError),
    #[error(transparent)]
    Cycle(#[from] CycleError),
}
