use serde_json::json;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use triage_core::{Issue, PullRequest};

fn raw(number: u64, title: &str, updated_at: &str, comments: u64) -> serde_json::Value {
    json!({
        "number": number,
        "title": title,
        "createdAt": "2024-01-01T00:00:00Z",
        "updatedAt": updated_at,
        "comments": { "totalCount": comments, "nodes": [] }
    })
}

fn analyze(issues: Vec<serde_json::Value>, prs: Vec<serde_json::Value>) -> triage_analysis::Analysis {
    let config = triage_config::resolve(None, None).config;
    let as_of = OffsetDateTime::parse("2024-03-01T00:00:00Z", &Rfc3339).unwrap();
    let issues: Vec<_> = issues.into_iter().map(|v| serde_json::from_value(v).unwrap()).collect();
    let prs: Vec<_> = prs.into_iter().map(|v| serde_json::from_value(v).unwrap()).collect();
    triage_analysis::analyze(&issues, &prs, as_of, &config).unwrap()
}

pub fn issue(number: u64, title: &str, updated_at: &str, comments: u64) -> Issue {
    analyze(vec![raw(number, title, updated_at, comments)], vec![])
        .issues
        .remove(0)
}

pub fn pr(number: u64, title: &str, updated_at: &str) -> PullRequest {
    analyze(vec![], vec![raw(number, title, updated_at, 0)])
        .pull_requests
        .remove(0)
}
