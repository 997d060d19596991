use std::fmt;

use serde::{Deserialize, Serialize};

/// Rank used for anything outside the known vocabulary; sorts last.
pub const UNRANKED: u8 = 99;

/// The fixed lifecycle buckets an issue's workflow state can belong to.
///
/// Declaration order doubles as display order: `started` issues are shown
/// before `unstarted` ones, terminal states last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStateCategory {
    Started,
    Unstarted,
    Triage,
    Backlog,
    Completed,
    Canceled,
}

impl WorkflowStateCategory {
    pub const ALL: [WorkflowStateCategory; 6] = [
        WorkflowStateCategory::Started,
        WorkflowStateCategory::Unstarted,
        WorkflowStateCategory::Triage,
        WorkflowStateCategory::Backlog,
        WorkflowStateCategory::Completed,
        WorkflowStateCategory::Canceled,
    ];

    /// Parse a user- or API-supplied category name. `todo` is accepted as a
    /// synonym for `unstarted` on input.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "started" => Some(WorkflowStateCategory::Started),
            "unstarted" | "todo" => Some(WorkflowStateCategory::Unstarted),
            "triage" => Some(WorkflowStateCategory::Triage),
            "backlog" => Some(WorkflowStateCategory::Backlog),
            "completed" => Some(WorkflowStateCategory::Completed),
            "canceled" => Some(WorkflowStateCategory::Canceled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStateCategory::Started => "started",
            WorkflowStateCategory::Unstarted => "unstarted",
            WorkflowStateCategory::Triage => "triage",
            WorkflowStateCategory::Backlog => "backlog",
            WorkflowStateCategory::Completed => "completed",
            WorkflowStateCategory::Canceled => "canceled",
        }
    }

    /// Display rank, 1-based; lower ranks are shown first.
    pub fn display_rank(&self) -> u8 {
        match self {
            WorkflowStateCategory::Started => 1,
            WorkflowStateCategory::Unstarted => 2,
            WorkflowStateCategory::Triage => 3,
            WorkflowStateCategory::Backlog => 4,
            WorkflowStateCategory::Completed => 5,
            WorkflowStateCategory::Canceled => 6,
        }
    }
}

impl fmt::Display for WorkflowStateCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rank for a numeric priority: positive values rank by themselves
/// (1 = most urgent), zero or absent means "no priority" and ranks last.
pub fn priority_rank(priority: Option<i32>) -> i32 {
    match priority {
        Some(value) if value > 0 => value,
        _ => i32::from(UNRANKED),
    }
}
