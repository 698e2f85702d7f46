//! Node/edge projection of the analyzed batch (`index/graph.json`).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use triage_core::{Actionability, Entity, EntityKind, Issue, PullRequest};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Mentions,
    MentionedBy,
    PossibleDuplicate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub title: String,
    pub priority_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implementation_score: Option<i64>,
    pub actionability: Actionability,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl Graph {
    pub fn build(issues: &[Issue], prs: &[PullRequest]) -> Self {
        let pr_numbers: HashSet<u64> = prs.iter().map(|p| p.number).collect();
        let resolve = |n: u64| {
            if pr_numbers.contains(&n) {
                format!("pr:{n}")
            } else {
                format!("issue:{n}")
            }
        };

        let mut graph = Graph::default();
        let entities = issues
            .iter()
            .map(|i| i as &dyn Entity)
            .chain(prs.iter().map(|p| p as &dyn Entity));
        for entity in entities {
            let id = entity.node_id();
            graph.nodes.push(GraphNode {
                id: id.clone(),
                kind: entity.kind(),
                title: entity.title().to_string(),
                priority_score: entity.priority_score(),
                implementation_score: entity.as_pull_request().map(|p| p.implementation_score_final),
                actionability: entity.actionability(),
            });

            let relations = entity.relations();
            for &target in &relations.mentions {
                graph.edge(&id, &resolve(target), EdgeKind::Mentions);
            }
            for &source in &relations.mentioned_by {
                graph.edge(&resolve(source), &id, EdgeKind::MentionedBy);
            }
            for &dup in &relations.possible_duplicates {
                let to = format!("{}:{dup}", entity.kind());
                graph.edge(&id, &to, EdgeKind::PossibleDuplicate);
            }
        }
        graph
    }

    fn edge(&mut self, from: &str, to: &str, kind: EdgeKind) {
        self.edges.push(GraphEdge {
            from: from.to_string(),
            to: to.to_string(),
            kind,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{issue, pr};
    use serde_json::json;

    #[test]
    fn endpoints_resolve_to_known_prs() {
        let mut issues = vec![issue(json!({ "number": 1, "title": "bug" }))];
        let mut prs = vec![pr(json!({ "number": 2, "title": "fix" }))];
        issues[0].relations.mentions = vec![2];
        issues[0].relations.possible_duplicates = vec![7];
        prs[0].relations.mentions = vec![1];
        prs[0].relations.mentioned_by = vec![1];
        prs[0].implementation_score_final = 33;

        let graph = Graph::build(&issues, &prs);
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[1].implementation_score, Some(33));
        assert_eq!(graph.nodes[0].implementation_score, None);

        let edges: Vec<(&str, &str, EdgeKind)> = graph
            .edges
            .iter()
            .map(|e| (e.from.as_str(), e.to.as_str(), e.kind))
            .collect();
        assert_eq!(
            edges,
            vec![
                ("issue:1", "pr:2", EdgeKind::Mentions),
                ("issue:1", "issue:7", EdgeKind::PossibleDuplicate),
                ("pr:2", "issue:1", EdgeKind::Mentions),
                ("issue:1", "pr:2", EdgeKind::MentionedBy),
            ]
        );
    }

    #[test]
    fn serializes_wire_names() {
        let graph = Graph::build(&[issue(json!({ "number": 4, "title": "t" }))], &[]);
        let v = serde_json::to_value(&graph).unwrap();
        assert_eq!(v["nodes"][0]["id"], "issue:4");
        assert_eq!(v["nodes"][0]["type"], "issue");
        assert!(v["nodes"][0].get("implementationScore").is_none());
        let edge = serde_json::to_value(GraphEdge {
            from: "a".into(),
            to: "b".into(),
            kind: EdgeKind::MentionedBy,
        })
        .unwrap();
        assert_eq!(edge["type"], "mentioned_by");
    }
}
