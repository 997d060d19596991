//! Deterministic ordering of issue listings. The sort must be reproducible
//! run to run so filtered output and completions stay stable.

use crate::graphql::IssueSummary;
use crate::workflow::{priority_rank, UNRANKED};

/// Which key to order a listing by. Unrecognized names map to `Unknown`,
/// which behaves exactly like `Status`; a bad `--sort` value is leniency,
/// not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Status,
    Priority,
    Identifier,
    Title,
    Unknown,
}

impl SortKey {
    pub fn parse(input: &str) -> Self {
        match input.trim().to_ascii_lowercase().as_str() {
            "status" => SortKey::Status,
            "priority" => SortKey::Priority,
            "identifier" => SortKey::Identifier,
            "title" => SortKey::Title,
            _ => SortKey::Unknown,
        }
    }
}

/// Sort issues in place by the given key. All sorts are stable total orders:
/// - `status`: category display rank, ties broken by priority rank;
/// - `priority`: priority rank, ties broken by category display rank;
/// - `identifier`: lexicographic on the raw identifier;
/// - `title`: lexicographic on the case-folded title.
pub fn rank_issues(issues: &mut [IssueSummary], key: SortKey) {
    match key {
        SortKey::Status | SortKey::Unknown => {
            issues.sort_by_key(|issue| (state_rank(issue), priority_rank(issue.priority)));
        }
        SortKey::Priority => {
            issues.sort_by_key(|issue| (priority_rank(issue.priority), state_rank(issue)));
        }
        SortKey::Identifier => {
            issues.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        }
        SortKey::Title => {
            issues.sort_by_key(|issue| issue.title.to_lowercase());
        }
    }
}

fn state_rank(issue: &IssueSummary) -> u8 {
    issue
        .state
        .as_ref()
        .and_then(|state| state.category())
        .map(|category| category.display_rank())
        .unwrap_or(UNRANKED)
}
