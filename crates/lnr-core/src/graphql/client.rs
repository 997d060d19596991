use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::cycle::CycleRecord;
use crate::workflow::WorkflowStateCategory;

const DEFAULT_ENDPOINT: &str = "https://api.linear.app/graphql";
const USER_AGENT: &str = "lnr/0.1.0";

/// Errors returned by the GraphQL client.
#[derive(Debug, Error)]
pub enum GraphqlError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP status {status} body: {body}")]
    HttpStatus { status: StatusCode, body: String },
    #[error("invalid GraphQL endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("GraphQL returned errors: {0:?}")]
    ResponseErrors(Vec<GraphqlResponseError>),
    #[error("failed to deserialize response: {0}")]
    Deserialize(#[from] serde_json::Error),
    #[error("requested resource not found")]
    NotFound,
}

pub type GraphqlResult<T> = Result<T, GraphqlError>;

/// Minimal GraphQL client for the Linear API, authenticated with a personal
/// API key.
#[derive(Debug, Clone)]
pub struct LinearClient {
    http: Client,
    endpoint: Url,
    auth_header: String,
}

impl LinearClient {
    /// Build a client targeting the default endpoint.
    pub fn from_api_key(api_key: &str) -> GraphqlResult<Self> {
        Self::with_endpoint(api_key, DEFAULT_ENDPOINT)
    }

    /// Build a client with a custom endpoint (useful for testing).
    pub fn with_endpoint(api_key: &str, endpoint: &str) -> GraphqlResult<Self> {
        let endpoint = Url::parse(endpoint)?;
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            endpoint,
            auth_header: api_key.to_owned(),
        })
    }

    /// Fetch the current user (`viewer`) object.
    pub async fn viewer(&self) -> GraphqlResult<Viewer> {
        #[derive(Deserialize)]
        struct ViewerEnvelope {
            viewer: Viewer,
        }

        const QUERY: &str = r#"
            query ViewerQuery {
                viewer {
                    id
                    name
                    email
                    displayName
                    createdAt
                }
            }
        "#;

        let envelope: ViewerEnvelope = self.execute(QUERY, Value::Null).await?;
        Ok(envelope.viewer)
    }

    /// Fetch issues matching the given filter, most recently updated first.
    pub async fn issues(&self, params: IssueListParams) -> GraphqlResult<Vec<IssueSummary>> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Variables {
            first: i64,
            #[serde(skip_serializing_if = "Option::is_none")]
            filter: Option<Value>,
        }

        #[derive(Deserialize)]
        struct IssuesEnvelope {
            issues: Connection<IssueSummary>,
        }

        const QUERY: &str = r#"
            query ListIssues($first: Int!, $filter: IssueFilter) {
                issues(first: $first, filter: $filter, orderBy: updatedAt) {
                    nodes {
                        id
                        identifier
                        title
                        url
                        priority
                        updatedAt
                        state { name type }
                        labels(first: 10) {
                            nodes { name }
                        }
                    }
                }
            }
        "#;

        let variables = serde_json::to_value(Variables {
            first: params.first as i64,
            filter: params.filter,
        })?;
        let envelope: IssuesEnvelope = self.execute(QUERY, variables).await?;
        Ok(envelope.issues.nodes)
    }

    /// Fetch a single issue by its identifier (e.g. "ENG-123").
    pub async fn issue_by_key(&self, key: &str) -> GraphqlResult<IssueDetail> {
        #[derive(Deserialize)]
        struct IssueEnvelope {
            issues: Connection<IssueDetail>,
        }

        const QUERY: &str = r#"
            query IssueByKey($key: String!) {
                issues(first: 1, filter: { identifier: { eq: $key } }) {
                    nodes {
                        id
                        identifier
                        title
                        description
                        url
                        priority
                        createdAt
                        updatedAt
                        state { name type }
                        assignee { name displayName }
                        labels(first: 20) {
                            nodes { name }
                        }
                    }
                }
            }
        "#;

        let variables = serde_json::json!({ "key": key });
        let envelope: IssueEnvelope = self.execute(QUERY, variables).await?;
        envelope
            .issues
            .nodes
            .into_iter()
            .next()
            .ok_or(GraphqlError::NotFound)
    }

    /// Fetch the cycle list in server order.
    pub async fn cycles(&self, first: usize) -> GraphqlResult<Vec<CycleRecord>> {
        #[derive(Deserialize)]
        struct CyclesEnvelope {
            cycles: Connection<CycleRecord>,
        }

        const QUERY: &str = r#"
            query ListCycles($first: Int!) {
                cycles(first: $first) {
                    nodes {
                        id
                        number
                        name
                        startsAt
                        endsAt
                        isActive
                        isNext
                        isPrevious
                    }
                }
            }
        "#;

        let variables = serde_json::json!({ "first": first as i64 });
        let envelope: CyclesEnvelope = self.execute(QUERY, variables).await?;
        Ok(envelope.cycles.nodes)
    }

    async fn execute<R>(&self, query: &str, variables: Value) -> GraphqlResult<R>
    where
        R: DeserializeOwned,
    {
        #[derive(Serialize)]
        struct Request<'a> {
            query: &'a str,
            variables: Value,
        }

        let response = self
            .http
            .post(self.endpoint.clone())
            .header("Authorization", &self.auth_header)
            .json(&Request { query, variables })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GraphqlError::HttpStatus { status, body: text });
        }

        let envelope = response.json::<GraphqlEnvelope<R>>().await?;
        if let Some(errors) = envelope.errors {
            return Err(GraphqlError::ResponseErrors(errors));
        }
        envelope.data.ok_or(GraphqlError::NotFound)
    }
}

/// Parameters for an issue list query.
#[derive(Debug, Clone, Default)]
pub struct IssueListParams {
    pub first: usize,
    pub filter: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct GraphqlEnvelope<T> {
    data: Option<T>,
    errors: Option<Vec<GraphqlResponseError>>,
}

#[derive(Debug, Deserialize)]
struct Connection<T> {
    nodes: Vec<T>,
}

/// Subset of viewer fields useful for identity-aware commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewer {
    pub id: String,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One issue row in a listing. Constructed fresh from each query response
/// and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSummary {
    pub id: String,
    pub identifier: String,
    pub title: String,
    pub url: Option<String>,
    pub state: Option<IssueState>,
    pub priority: Option<i32>,
    pub updated_at: DateTime<Utc>,
    pub labels: Option<IssueLabelConnection>,
}

impl IssueSummary {
    pub fn label_names(&self) -> Vec<&str> {
        self.labels
            .as_ref()
            .map(|connection| connection.nodes.iter().map(|l| l.name.as_str()).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueDetail {
    pub id: String,
    pub identifier: String,
    pub title: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub state: Option<IssueState>,
    pub assignee: Option<IssueAssignee>,
    pub priority: Option<i32>,
    pub labels: Option<IssueLabelConnection>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueState {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl IssueState {
    /// The lifecycle bucket this state belongs to, when recognized.
    pub fn category(&self) -> Option<WorkflowStateCategory> {
        self.kind
            .as_deref()
            .and_then(WorkflowStateCategory::from_token)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueAssignee {
    pub name: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueLabelConnection {
    pub nodes: Vec<IssueLabel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueLabel {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlResponseError {
    pub message: String,
    #[serde(default)]
    pub path: Option<Vec<String>>,
}
