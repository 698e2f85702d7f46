//! Raw issue / pull request records as supplied by the fetch collaborator.
//!
//! Shapes mirror the GitHub GraphQL connection layout (`{ totalCount, nodes }`).
//! Every optional or nullable field defaults, so partial dumps still parse.

use serde::{Deserialize, Serialize};

use crate::types::PrFile;

/// A paginated list: `{ totalCount, nodes }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self {
            total_count: 0,
            nodes: Vec::new(),
        }
    }
}

impl<T> Connection<T> {
    pub fn new(nodes: Vec<T>) -> Self {
        Self {
            total_count: nodes.len() as u64,
            nodes,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAuthor {
    #[serde(default)]
    pub login: Option<String>,
}

/// Resolve a nullable author to a login, `"unknown"` when absent.
pub fn login_of(author: &Option<RawAuthor>) -> String {
    author
        .as_ref()
        .and_then(|a| a.login.clone())
        .unwrap_or_else(|| "unknown".to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLabel {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAssignee {
    pub login: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUserCount {
    #[serde(default)]
    pub total_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawReactionGroup {
    pub content: String,
    #[serde(default)]
    pub users: RawUserCount,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawComment {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub body: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub author: Option<RawAuthor>,
    #[serde(default)]
    pub author_association: Option<String>,
    #[serde(default)]
    pub reaction_groups: Option<Vec<RawReactionGroup>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReview {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub state: String,
    pub submitted_at: String,
    #[serde(default)]
    pub author: Option<RawAuthor>,
    #[serde(default)]
    pub author_association: Option<String>,
    #[serde(default)]
    pub reaction_groups: Option<Vec<RawReactionGroup>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawReviewComment {
    #[serde(flatten)]
    pub comment: RawComment,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub position: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReviewThread {
    #[serde(default)]
    pub is_resolved: bool,
    #[serde(default)]
    pub comments: Connection<RawReviewComment>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawStatusRollup {
    pub state: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCommit {
    #[serde(default)]
    pub oid: String,
    #[serde(default)]
    pub status_check_rollup: Option<RawStatusRollup>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCommitNode {
    #[serde(default)]
    pub commit: RawCommit,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIssue {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub url: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub author: Option<RawAuthor>,
    #[serde(default)]
    pub labels: Option<Connection<RawLabel>>,
    #[serde(default)]
    pub assignees: Option<Connection<RawAssignee>>,
    #[serde(default)]
    pub comments: Connection<RawComment>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPullRequest {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub url: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub is_draft: bool,
    #[serde(default)]
    pub author: Option<RawAuthor>,
    #[serde(default)]
    pub labels: Option<Connection<RawLabel>>,
    #[serde(default)]
    pub assignees: Option<Connection<RawAssignee>>,
    #[serde(default)]
    pub comments: Connection<RawComment>,
    #[serde(default)]
    pub reviews: Connection<RawReview>,
    #[serde(default)]
    pub review_threads: Connection<RawReviewThread>,
    #[serde(default)]
    pub files: Connection<PrFile>,
    #[serde(default)]
    pub commits: Connection<RawCommitNode>,
}

impl RawPullRequest {
    /// CI rollup state of the head commit, if reported.
    pub fn status_check_state(&self) -> Option<String> {
        self.commits
            .nodes
            .first()
            .and_then(|n| n.commit.status_check_rollup.as_ref())
            .map(|r| r.state.clone())
    }
}

pub(crate) fn label_names(labels: &Option<Connection<RawLabel>>) -> Vec<String> {
    labels
        .as_ref()
        .map(|c| c.nodes.iter().map(|l| l.name.clone()).collect())
        .unwrap_or_default()
}

pub(crate) fn assignee_logins(assignees: &Option<Connection<RawAssignee>>) -> Vec<String> {
    assignees
        .as_ref()
        .map(|c| c.nodes.iter().map(|a| a.login.clone()).collect())
        .unwrap_or_default()
}

impl RawIssue {
    pub fn label_names(&self) -> Vec<String> {
        label_names(&self.labels)
    }

    pub fn assignee_logins(&self) -> Vec<String> {
        assignee_logins(&self.assignees)
    }
}

impl RawPullRequest {
    pub fn label_names(&self) -> Vec<String> {
        label_names(&self.labels)
    }

    pub fn assignee_logins(&self) -> Vec<String> {
        assignee_logins(&self.assignees)
    }
}
