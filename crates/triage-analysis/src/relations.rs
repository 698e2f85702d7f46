//! Cross-item relationships: duplicates, the mention graph and PR ↔ issue
//! enrichment.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use triage_config::Config;
use triage_core::text::{collapse_whitespace, overlap_of_sets, token_set};
use triage_core::{round_score, Issue, PullRequest};

use crate::links::LinkPatterns;
use crate::score::{self, LinkedSignals};

static ERROR_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(error|exception|failed|failure|security error|cannot|can't|can not|unable)").unwrap()
});
static QUOTED_SNIPPET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["'`]([^"'`]{10,180})["'`]"#).unwrap());
static ERROR_SNIPPET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(error|exception|failed|failure|security error)").unwrap());

// ── Error signatures ──

/// Error-looking lines and quoted error snippets, lower-cased with
/// whitespace collapsed.
pub fn error_signatures(text: &str) -> HashSet<String> {
    let mut found = HashSet::new();
    for line in text.to_lowercase().lines() {
        let line = line.trim();
        let len = line.chars().count();
        if (10..=180).contains(&len) && ERROR_LINE.is_match(line) {
            found.insert(collapse_whitespace(line));
        }
    }
    for caps in QUOTED_SNIPPET.captures_iter(text) {
        let snippet = caps[1].to_lowercase();
        let snippet = snippet.trim();
        if ERROR_SNIPPET.is_match(snippet) {
            found.insert(collapse_whitespace(snippet));
        }
    }
    found
}

// ── Duplicates ──

struct DuplicateFeatures {
    number: u64,
    title_words: HashSet<String>,
    lower_text: String,
    tokens: BTreeSet<String>,
    errors: HashSet<String>,
}

impl DuplicateFeatures {
    fn new(number: u64, title: &str, body: Option<&str>) -> Self {
        let text = format!("{title} {}", body.unwrap_or_default());
        Self {
            number,
            title_words: title
                .to_lowercase()
                .split_whitespace()
                .filter(|w| w.chars().count() > 3)
                .map(str::to_string)
                .collect(),
            lower_text: text.to_lowercase(),
            tokens: token_set(&text),
            errors: error_signatures(&text),
        }
    }
}

/// Pre-computed duplicate features for one batch (issues or PRs).
pub struct DuplicateIndex {
    items: Vec<DuplicateFeatures>,
    configured_signatures: Vec<String>,
}

impl DuplicateIndex {
    pub fn build<'a>(items: impl IntoIterator<Item = (u64, &'a str, Option<&'a str>)>, config: &Config) -> Self {
        Self {
            items: items
                .into_iter()
                .map(|(number, title, body)| DuplicateFeatures::new(number, title, body))
                .collect(),
            configured_signatures: config
                .semantics
                .errors
                .signatures
                .iter()
                .map(|s| s.to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Numbers in the batch that look like duplicates of `number`. The title
    /// ratio is measured against this item's own title words, so the
    /// relation is not symmetric.
    pub fn possible_duplicates(&self, number: u64, config: &Config) -> Vec<u64> {
        let Some(item) = self.items.iter().find(|f| f.number == number) else {
            return Vec::new();
        };
        let thresholds = &config.heuristics.duplicates;
        let hints = &config.semantics.relationship.duplicate_hints;

        let mut duplicates = Vec::new();
        for other in &self.items {
            if other.number == item.number {
                continue;
            }
            let title_similarity = if item.title_words.is_empty() {
                0.0
            } else {
                other.title_words.intersection(&item.title_words).count() as f64 / item.title_words.len() as f64
            };
            let overlap = overlap_of_sets(&item.tokens, &other.tokens);
            let shared_error = !item.errors.is_disjoint(&other.errors);
            let shared_configured = self
                .configured_signatures
                .iter()
                .any(|sig| item.lower_text.contains(sig.as_str()) && other.lower_text.contains(sig.as_str()));
            let hinted = hints
                .iter()
                .any(|h| item.lower_text.contains(h.as_str()) || other.lower_text.contains(h.as_str()));

            let matched = title_similarity > thresholds.title_similarity_threshold
                || overlap > thresholds.overlap_threshold
                || shared_error
                || shared_configured;
            let corroborated = !thresholds.require_shared_error || shared_error || shared_configured || hinted;
            if matched && corroborated {
                duplicates.push(other.number);
            }
        }
        duplicates
    }
}

// ── Mention graph ──

/// Fill `mentionedBy` on every issue and PR from the outgoing mentions of
/// issues first, then PRs. A number shared by an issue and a PR credits both.
pub fn assign_mentioned_by(issues: &mut [Issue], prs: &mut [PullRequest]) {
    let sources: Vec<(u64, Vec<u64>)> = issues
        .iter()
        .map(|i| (i.number, i.relations.mentions.clone()))
        .chain(prs.iter().map(|p| (p.number, p.relations.mentions.clone())))
        .collect();

    let issue_at: HashMap<u64, usize> = issues.iter().enumerate().map(|(i, x)| (x.number, i)).collect();
    let pr_at: HashMap<u64, usize> = prs.iter().enumerate().map(|(i, x)| (x.number, i)).collect();

    let credit = |list: &mut Vec<u64>, source: u64| {
        if !list.contains(&source) {
            list.push(source);
        }
    };
    for (source, targets) in sources {
        for target in targets {
            if let Some(&i) = issue_at.get(&target) {
                credit(&mut issues[i].relations.mentioned_by, source);
            }
            if let Some(&i) = pr_at.get(&target) {
                credit(&mut prs[i].relations.mentioned_by, source);
            }
        }
    }
}

// ── PR enrichment ──

/// Link each PR to the issues it mentions and derive relationship and
/// implementation scores. Run after [`assign_mentioned_by`].
pub fn enrich_pull_requests(prs: &mut [PullRequest], issues: &[Issue], links: &LinkPatterns, config: &Config) {
    let by_number: HashMap<u64, &Issue> = issues.iter().map(|i| (i.number, i)).collect();
    let weights = &config.relationship_score;

    for pr in prs.iter_mut() {
        let linked: Vec<&Issue> = pr
            .relations
            .mentions
            .iter()
            .filter_map(|n| by_number.get(n).copied())
            .collect();
        let linked_priority: f64 = linked.iter().map(|i| i.priority_score).sum();
        let signals = LinkedSignals {
            reactions: linked.iter().map(|i| score::net_reactions(&i.reaction_totals)).sum(),
            sentiment: linked.iter().map(|i| i.sentiment_score).sum(),
        };

        let pr_tokens = token_set(&format!("{} {}", pr.title, pr.body.as_deref().unwrap_or_default()));
        let overlap = linked
            .iter()
            .map(|i| {
                let issue_tokens = token_set(&format!("{} {}", i.title, i.body.as_deref().unwrap_or_default()));
                overlap_of_sets(&issue_tokens, &pr_tokens)
            })
            .fold(0.0, f64::max);
        let explicit = links.has_explicit_link(pr.body.as_deref().unwrap_or_default());
        let quality = score::relationship_quality(overlap, explicit, linked.len(), config);

        pr.linked_issues = linked.iter().map(|i| i.number).collect();
        pr.linked_issue_priority = linked_priority;
        pr.relationship_overlap = overlap;
        pr.relationship_quality_auto = quality;
        pr.relationship_quality_final = quality;
        pr.relationship_score = round_score(
            overlap * weights.overlap_weight
                + if explicit { weights.explicit_link_boost } else { 0.0 }
                + linked.len() as f64 * weights.linked_issues_weight
                + pr.relations.mentioned_by.len() as f64 * weights.mentioned_by_weight
                + linked_priority * weights.linked_issue_priority_weight,
        );

        let auto = score::implementation_score(pr, signals, config);
        let tier = config.implementation.tier_for(auto);
        pr.implementation_score_auto = auto;
        pr.implementation_score_final = auto;
        pr.implementation_tier_auto = tier;
        pr.implementation_tier_final = tier;

        debug!(
            number = pr.number,
            linked = pr.linked_issues.len(),
            quality = %quality,
            implementation = auto,
            "enriched pull request"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{config, issue, pr};
    use serde_json::json;
    use triage_core::RelationshipQuality;

    fn index(items: &[(u64, &str, &str)], config: &Config) -> DuplicateIndex {
        DuplicateIndex::build(items.iter().map(|(n, t, b)| (*n, *t, Some(*b))), config)
    }

    #[test]
    fn signatures_from_lines_and_quotes() {
        let sigs = error_signatures("Build   FAILED with exit 2\nok\nthrows 'Security Error: blocked frame' here");
        assert!(sigs.contains("build failed with exit 2"));
        assert!(sigs.contains("security error: blocked frame"));
        // "ok" is too short to be a signature line
        assert!(!sigs.contains("ok"));
    }

    #[test]
    fn duplicate_title_ratio_is_asymmetric() {
        let c = config();
        let idx = index(
            &[
                (1, "Login timeout", ""),
                (2, "Login timeout after upgrade", "happens every morning during nightly sync against remote server"),
            ],
            &c,
        );
        assert_eq!(idx.possible_duplicates(1, &c), vec![2]);
        assert!(idx.possible_duplicates(2, &c).is_empty());
        assert!(idx.possible_duplicates(99, &c).is_empty());
    }

    #[test]
    fn shared_error_signature_matches() {
        let c = config();
        let idx = index(
            &[
                (1, "Widget blank", "Console shows `TypeError: x is undefined` on load"),
                (2, "Sidebar gone", "I get `TypeError: x is undefined` too"),
                (3, "Docs typo", "Spelling in readme"),
            ],
            &c,
        );
        assert_eq!(idx.possible_duplicates(1, &c), vec![2]);
        assert_eq!(idx.possible_duplicates(2, &c), vec![1]);
        assert!(idx.possible_duplicates(3, &c).is_empty());
    }

    #[test]
    fn require_shared_error_needs_corroboration() {
        let mut c = config();
        c.heuristics.duplicates.require_shared_error = true;
        let idx = index(&[(1, "Login timeout", ""), (2, "Login timeout", "")], &c);
        assert!(idx.possible_duplicates(1, &c).is_empty());

        let hinted = index(&[(1, "Login timeout", "same issue as before"), (2, "Login timeout", "")], &c);
        assert_eq!(hinted.possible_duplicates(2, &c), vec![1]);

        c.semantics.errors.signatures = vec!["ETIMEDOUT".into()];
        let configured = index(&[(1, "Login timeout", "etimedout"), (2, "Login timeout", "ETIMEDOUT")], &c);
        assert_eq!(configured.possible_duplicates(1, &c), vec![2]);
    }

    #[test]
    fn mentioned_by_credits_issue_and_pr_with_same_number() {
        let mut issues = vec![
            issue(json!({ "number": 1, "title": "a", "body": "see #5" })),
            issue(json!({ "number": 5, "title": "b" })),
        ];
        let mut prs = vec![
            pr(json!({ "number": 5, "title": "c", "body": "fixes #1" })),
            pr(json!({ "number": 6, "title": "d", "body": "fixes #1 and see #5" })),
        ];
        assign_mentioned_by(&mut issues, &mut prs);
        assert_eq!(issues[0].relations.mentioned_by, vec![5, 6]);
        assert_eq!(issues[1].relations.mentioned_by, vec![1, 6]);
        assert_eq!(prs[0].relations.mentioned_by, vec![1, 6]);
        assert!(prs[1].relations.mentioned_by.is_empty());
    }

    #[test]
    fn enrichment_links_issues_and_scores() {
        let c = config();
        let links = LinkPatterns::new(&c.semantics.relationship.link_keywords).unwrap();
        let issues = vec![issue(json!({
            "number": 10,
            "title": "Export crashes",
            "body": "Export to csv crashes",
            "labels": { "nodes": [{ "name": "bug" }] }
        }))];
        let mut prs = vec![
            pr(json!({ "number": 11, "title": "Fix export crash", "body": "Fixes #10. Export to csv no longer crashes" })),
            pr(json!({ "number": 12, "title": "Refactor", "body": "Internal cleanup, touches #999" })),
        ];
        enrich_pull_requests(&mut prs, &issues, &links, &c);

        let linked = &prs[0];
        assert_eq!(linked.linked_issues, vec![10]);
        assert_eq!(linked.relationship_quality_auto, RelationshipQuality::Strong);
        assert_eq!(linked.relationship_quality_final, RelationshipQuality::Strong);
        assert_eq!(linked.linked_issue_priority, issues[0].priority_score);
        assert!(linked.relationship_score >= 10);
        assert_eq!(linked.implementation_score_final, linked.implementation_score_auto);
        assert_eq!(
            linked.implementation_tier_auto,
            c.implementation.tier_for(linked.implementation_score_auto)
        );

        let unlinked = &prs[1];
        assert!(unlinked.linked_issues.is_empty());
        assert_eq!(unlinked.relationship_quality_auto, RelationshipQuality::None);
        assert_eq!(unlinked.relationship_score, 0);
    }
}
