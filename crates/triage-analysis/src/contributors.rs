use std::collections::BTreeMap;

use triage_core::{Comment, ContributorProfile, Issue, PullRequest};

fn profile<'a>(profiles: &'a mut BTreeMap<String, ContributorProfile>, login: &str) -> &'a mut ContributorProfile {
    profiles
        .entry(login.to_string())
        .or_insert_with(|| ContributorProfile::new(login))
}

fn record_comments(profiles: &mut BTreeMap<String, ContributorProfile>, number: u64, comments: &[Comment]) {
    for comment in comments {
        let p = profile(profiles, &comment.author);
        if !p.comments_on.contains(&number) {
            p.comments_on.push(number);
        }
        if let Some(assoc) = comment.author_association.as_deref().filter(|a| !a.is_empty()) {
            p.association_types.insert(assoc.to_string());
        }
        p.observe(&comment.created_at);
    }
}

/// Per-login activity across the batch, issues first, keyed (and ordered) by
/// login.
pub fn contributor_profiles(issues: &[Issue], prs: &[PullRequest]) -> BTreeMap<String, ContributorProfile> {
    let mut profiles = BTreeMap::new();

    for issue in issues {
        let p = profile(&mut profiles, &issue.author);
        p.issues_opened.push(issue.number);
        p.observe(&issue.created_at);
        record_comments(&mut profiles, issue.number, &issue.comments);
    }

    for pr in prs {
        let p = profile(&mut profiles, &pr.author);
        p.prs_opened.push(pr.number);
        p.observe(&pr.created_at);
        record_comments(&mut profiles, pr.number, &pr.comments);
        for review in &pr.reviews {
            let r = profile(&mut profiles, &review.author);
            if let Some(assoc) = review.author_association.as_deref().filter(|a| !a.is_empty()) {
                r.association_types.insert(assoc.to_string());
            }
        }
    }

    for p in profiles.values_mut() {
        p.is_first_time = p.issues_opened.len() + p.prs_opened.len() <= 1;
    }
    profiles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{issue, pr};
    use serde_json::json;

    #[test]
    fn profiles_aggregate_across_kinds() {
        let issues = vec![
            issue(json!({
                "number": 1, "title": "a",
                "author": { "login": "ann" },
                "createdAt": "2024-01-05T00:00:00Z",
                "comments": { "totalCount": 2, "nodes": [
                    { "body": "x", "createdAt": "2024-01-06T00:00:00Z", "author": { "login": "bob" }, "authorAssociation": "MEMBER" },
                    { "body": "y", "createdAt": "2024-01-07T00:00:00Z", "author": { "login": "bob" } }
                ]}
            })),
            issue(json!({ "number": 2, "title": "b", "author": { "login": "ann" }, "createdAt": "2024-01-01T00:00:00Z" })),
        ];
        let prs = vec![pr(json!({
            "number": 3, "title": "c",
            "author": { "login": "bob" },
            "createdAt": "2024-02-01T00:00:00Z",
            "comments": { "totalCount": 1, "nodes": [
                { "body": "z", "createdAt": "2024-02-03T00:00:00Z", "author": { "login": "cat" } }
            ]},
            "reviews": { "totalCount": 1, "nodes": [
                { "state": "APPROVED", "submittedAt": "2024-02-02T00:00:00Z", "author": { "login": "dan" }, "authorAssociation": "OWNER" }
            ]}
        }))];

        let profiles = contributor_profiles(&issues, &prs);
        assert_eq!(profiles.keys().collect::<Vec<_>>(), vec!["ann", "bob", "cat", "dan"]);

        let ann = &profiles["ann"];
        assert_eq!(ann.issues_opened, vec![1, 2]);
        assert_eq!(ann.first_seen, "2024-01-01T00:00:00Z");
        assert_eq!(ann.last_seen, "2024-01-05T00:00:00Z");
        assert!(!ann.is_first_time);

        let bob = &profiles["bob"];
        assert_eq!(bob.comments_on, vec![1]);
        assert_eq!(bob.prs_opened, vec![3]);
        assert!(bob.association_types.contains("MEMBER"));
        assert_eq!(bob.last_seen, "2024-02-01T00:00:00Z");
        assert!(bob.is_first_time);

        assert_eq!(profiles["cat"].last_seen, "2024-02-03T00:00:00Z");
        let dan = &profiles["dan"];
        assert!(dan.association_types.contains("OWNER"));
        assert!(dan.first_seen.is_empty());
    }
}
