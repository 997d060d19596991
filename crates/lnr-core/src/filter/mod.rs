//! Translation of user-supplied flag strings into the structured issue
//! filter sent to the remote query.

mod builder;
mod label;
mod status;

pub use builder::{compose_filter, BuiltFilter, CycleArg, CycleConstraint, FilterBuildError, IssueFilterBuilder};
pub use label::{compile_label_filter, LabelFilterExpression};
pub use status::{parse_status_filter, StatusParseError, StatusPolicy, StatusSelector};
