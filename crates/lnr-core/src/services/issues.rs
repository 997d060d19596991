use serde_json::Value;

use crate::graphql::{GraphqlResult, IssueDetail, IssueListParams, IssueSummary, LinearClient};

/// Provides higher-level helpers around issues.
#[derive(Clone)]
pub struct IssueService {
    client: LinearClient,
}

impl IssueService {
    pub fn new(client: LinearClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, options: IssueQueryOptions) -> GraphqlResult<Vec<IssueSummary>> {
        let params = options.into_params();
        self.client.issues(params).await
    }

    pub async fn get_by_key(&self, key: &str) -> GraphqlResult<IssueDetail> {
        self.client.issue_by_key(key).await
    }
}

/// Options used to constrain issue queries. The filter is the composed
/// object produced by the filter builder, passed through unchanged.
#[derive(Debug, Clone, Default)]
pub struct IssueQueryOptions {
    pub limit: usize,
    pub filter: Option<Value>,
}

impl IssueQueryOptions {
    fn into_params(self) -> IssueListParams {
        IssueListParams {
            first: if self.limit == 0 {
                20
            } else {
                self.limit.min(200)
            },
            filter: self.filter,
        }
    }
}
