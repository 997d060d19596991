mod client;

pub use client::{
    GraphqlError, GraphqlResult, IssueDetail, IssueLabel, IssueLabelConnection, IssueListParams,
    IssueState, IssueSummary, LinearClient, Viewer,
};
