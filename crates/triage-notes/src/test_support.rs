use serde_json::json;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use triage_core::raw::{RawIssue, RawPullRequest};
use triage_core::{Issue, PullRequest};

fn raw(number: u64, title: &str) -> serde_json::Value {
    json!({
        "number": number,
        "title": title,
        "createdAt": "2024-01-01T00:00:00Z",
        "updatedAt": "2024-02-29T00:00:00Z"
    })
}

fn analyze(issues: Vec<RawIssue>, prs: Vec<RawPullRequest>) -> triage_analysis::Analysis {
    let config = triage_config::resolve(None, None).config;
    let as_of = OffsetDateTime::parse("2024-03-01T00:00:00Z", &Rfc3339).unwrap();
    triage_analysis::analyze(&issues, &prs, as_of, &config).unwrap()
}

pub fn issue(number: u64) -> Issue {
    let raw_issue = serde_json::from_value(raw(number, "Crash on startup")).unwrap();
    analyze(vec![raw_issue], vec![]).issues.remove(0)
}

pub fn pr(number: u64) -> PullRequest {
    let raw_pr = serde_json::from_value(raw(number, "Tidy startup path")).unwrap();
    analyze(vec![], vec![raw_pr]).pull_requests.remove(0)
}
