//! Shared test builders: raw JSON records with sensible timestamps filled in.

use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use triage_config::Config;
use triage_core::{Issue, PullRequest};

use crate::links::LinkPatterns;
use crate::normalize::{normalize_issues, normalize_pull_requests};

pub const AS_OF: &str = "2024-03-01T00:00:00Z";

pub fn config() -> Config {
    triage_config::resolve(None, None).config
}

pub fn as_of() -> OffsetDateTime {
    OffsetDateTime::parse(AS_OF, &Rfc3339).unwrap()
}

pub fn with_timestamps(mut raw: Value) -> Value {
    let obj = raw.as_object_mut().unwrap();
    obj.entry("createdAt").or_insert_with(|| "2024-01-01T00:00:00Z".into());
    obj.entry("updatedAt").or_insert_with(|| "2024-02-29T00:00:00Z".into());
    raw
}

pub fn issue(raw: Value) -> Issue {
    let c = config();
    let links = LinkPatterns::new(&c.semantics.relationship.link_keywords).unwrap();
    let raw = serde_json::from_value(with_timestamps(raw)).unwrap();
    normalize_issues(&[raw], as_of(), &c, &links).unwrap().remove(0)
}

pub fn pr(raw: Value) -> PullRequest {
    let c = config();
    let links = LinkPatterns::new(&c.semantics.relationship.link_keywords).unwrap();
    let raw = serde_json::from_value(with_timestamps(raw)).unwrap();
    normalize_pull_requests(&[raw], as_of(), &c, &links).unwrap().remove(0)
}
