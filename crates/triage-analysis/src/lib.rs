//! Normalization, scoring and relationship inference.
//!
//! [`analyze`] runs the passes in their required order: issues are normalized
//! and scored, then pull requests, then the mention graph is closed over both
//! kinds, and finally PRs are enriched with signals from the issues they link.

mod contributors;
mod graph;
mod links;
mod normalize;
mod relations;
mod score;

#[cfg(test)]
mod fixtures;

use time::OffsetDateTime;
use tracing::info;

use triage_config::Config;
use triage_core::raw::{RawIssue, RawPullRequest};
use triage_core::{Issue, PullRequest, Result};

pub use contributors::contributor_profiles;
pub use graph::{EdgeKind, Graph, GraphEdge, GraphNode};
pub use links::LinkPatterns;
pub use normalize::{classify_item_type, normalize_issues, normalize_pull_requests, reaction_counts};
pub use relations::{assign_mentioned_by, enrich_pull_requests, error_signatures, DuplicateIndex};
pub use score::{
    implementation_score, issue_actionability, issue_needs_info, issue_priority, net_reactions,
    pr_actionability, pr_needs_info, pr_priority, relationship_quality, LinkedSignals,
};

/// Fully scored batch, each list ordered by priority (highest first).
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub issues: Vec<Issue>,
    pub pull_requests: Vec<PullRequest>,
}

fn by_priority_desc<T: triage_core::Entity>(items: &mut [T]) {
    items.sort_by(|a, b| b.priority_score().total_cmp(&a.priority_score()));
}

/// Score a closed-world batch. Any entity that fails to normalize aborts the
/// whole batch.
pub fn analyze(
    raw_issues: &[RawIssue],
    raw_prs: &[RawPullRequest],
    as_of: OffsetDateTime,
    config: &Config,
) -> Result<Analysis> {
    let links = LinkPatterns::new(&config.semantics.relationship.link_keywords)?;

    let mut issues = normalize_issues(raw_issues, as_of, config, &links)?;
    by_priority_desc(&mut issues);
    let mut pull_requests = normalize_pull_requests(raw_prs, as_of, config, &links)?;
    by_priority_desc(&mut pull_requests);

    assign_mentioned_by(&mut issues, &mut pull_requests);
    enrich_pull_requests(&mut pull_requests, &issues, &links, config);

    info!(
        issues = issues.len(),
        pull_requests = pull_requests.len(),
        "analysis complete"
    );
    Ok(Analysis {
        issues,
        pull_requests,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{as_of, config, with_timestamps};
    use serde_json::json;
    use triage_core::{Actionability, RelationshipQuality};

    fn raw_issue(v: serde_json::Value) -> RawIssue {
        serde_json::from_value(with_timestamps(v)).unwrap()
    }

    fn raw_pr(v: serde_json::Value) -> RawPullRequest {
        serde_json::from_value(with_timestamps(v)).unwrap()
    }

    #[test]
    fn end_to_end_batch() {
        let c = config();
        let issues = vec![
            raw_issue(json!({ "number": 1, "title": "Typo in docs", "labels": { "nodes": [{ "name": "meta" }] } })),
            raw_issue(json!({
                "number": 2,
                "title": "Export crashes",
                "body": "Export to csv crashes with an error",
                "labels": { "nodes": [{ "name": "bug" }, { "name": "critical" }] }
            })),
        ];
        let prs = vec![raw_pr(json!({
            "number": 3,
            "title": "Fix export crash",
            "body": "Fixes #2\n\nTest plan: exported a csv",
            "commits": { "nodes": [{ "commit": { "statusCheckRollup": { "state": "SUCCESS" } } }] }
        }))];

        let out = analyze(&issues, &prs, as_of(), &c).unwrap();
        assert_eq!(out.issues[0].number, 2);
        assert_eq!(out.issues[1].number, 1);
        assert_eq!(out.issues[0].relations.mentioned_by, vec![3]);
        assert_eq!(out.issues[0].actionability, Actionability::NeedsInfo);

        let pr = &out.pull_requests[0];
        assert_eq!(pr.linked_issues, vec![2]);
        assert_eq!(pr.relationship_quality_auto, RelationshipQuality::Strong);
        assert_eq!(pr.status_check_state.as_deref(), Some("SUCCESS"));
        assert!(pr.implementation_score_auto > 0);
    }

    #[test]
    fn one_bad_entity_fails_the_batch() {
        let c = config();
        let issues = vec![
            raw_issue(json!({ "number": 1, "title": "ok" })),
            raw_issue(json!({ "number": 2, "title": "bad", "updatedAt": "not a date" })),
        ];
        assert!(analyze(&issues, &[], as_of(), &c).is_err());
    }
}
