//! Priority, needs-info, actionability and implementation scoring.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use triage_config::Config;
use triage_core::text::{has_any_phrase, phrase_matches};
use triage_core::{
    round_score, Actionability, Issue, NeedsInfoSignal, PullRequest, ReactionCounts, RelationshipQuality,
};

static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bv?\d+\.\d+(\.\d+)?\b").unwrap());

const CLOSING_PHRASES: &[&str] = &["fixed in", "released in", "issue can be closed"];

// ── Reactions ──

/// `2·(👍 + ❤ + 🎉 + 🚀) − 2·(👎 + 😕)`
pub fn net_reactions(reactions: &ReactionCounts) -> i64 {
    let count = |kind: &str| reactions.get(kind).copied().unwrap_or(0) as i64;
    let positive = count("THUMBS_UP") + count("HEART") + count("HOORAY") + count("ROCKET");
    let negative = count("THUMBS_DOWN") + count("CONFUSED");
    positive * 2 - negative * 2
}

fn label_boosts(labels: &[String], config: &Config) -> f64 {
    labels.iter().map(|l| config.priority.label_boost(l)).sum()
}

// ── Priority ──

pub fn issue_priority(issue: &Issue, config: &Config) -> f64 {
    let w = &config.priority.issue;
    let mut score = issue.comments_total as f64 * w.comment_weight;
    for (kind, weight) in &w.reaction_weights {
        score += issue.reaction_totals.get(kind).copied().unwrap_or(0) as f64 * weight;
    }
    score += w.type_boosts.get(issue.item_type.as_str()).copied().unwrap_or(0.0);
    if issue.days_since_update > 30 {
        score += w.stale_penalty.over30;
    }
    if issue.days_since_update > 60 {
        score += w.stale_penalty.over60;
    }
    if issue.age_in_days > 30 && issue.days_since_update < 7 {
        score += w.age_boost.over30_and_fresh;
    }
    score += label_boosts(&issue.labels, config);
    score.max(0.0)
}

pub fn pr_priority(pr: &PullRequest, config: &Config) -> f64 {
    let w = &config.priority.pr;
    let mut score = pr.comments_total as f64 * w.comment_weight + pr.reviews_total as f64 * w.review_weight;
    if pr.has_approval {
        score += w.approval_boost;
    }
    if pr.status_check_state.as_deref() == Some("SUCCESS") {
        score += w.ci_success_boost;
    }
    if pr.unresolved_threads > 0 {
        score += w.unresolved_threads_penalty;
    }
    if pr.has_changes_requested {
        score += w.changes_requested_penalty;
    }
    if pr.is_draft {
        score += w.draft_penalty;
    }
    if pr.days_since_update > 14 {
        score += w.stale_penalty.over14;
    }
    if pr.days_since_update > 30 {
        score += w.stale_penalty.over30;
    }
    score += label_boosts(&pr.labels, config);
    score.max(0.0)
}

// ── Needs-info ──

fn conversation_text(title: &str, body: Option<&str>, comment_bodies: impl Iterator<Item = Option<String>>) -> String {
    let comments: Vec<String> = comment_bodies.map(Option::unwrap_or_default).collect();
    format!("{title}\n{}\n{}", body.unwrap_or_default(), comments.join("\n")).to_lowercase()
}

fn weigh(signals: &[NeedsInfoSignal], config: &Config) -> f64 {
    signals
        .iter()
        .map(|s| config.heuristics.needs_info.weight(s.weight_key()))
        .sum()
}

/// Missing-information signals for an issue and their weighted total.
pub fn issue_needs_info(issue: &Issue, config: &Config) -> (f64, Vec<NeedsInfoSignal>) {
    let heuristics = &config.heuristics.needs_info;
    if !heuristics.enabled {
        return (0.0, Vec::new());
    }
    let text = conversation_text(
        &issue.title,
        issue.body.as_deref(),
        issue.comments.iter().map(|c| c.body.clone()),
    );
    let lexicon = &config.semantics.needs_info;
    let toggles = &heuristics.issue_signals;
    let kind = issue.item_type;
    let mut signals = Vec::new();

    if toggles.missing_repro.applies(kind) && !has_any_phrase(&text, &lexicon.repro) {
        signals.push(NeedsInfoSignal::MissingRepro);
    }
    if toggles.missing_expected_actual.applies(kind)
        && !(has_any_phrase(&text, &lexicon.expected) && has_any_phrase(&text, &lexicon.actual))
    {
        signals.push(NeedsInfoSignal::MissingExpectedActual);
    }
    if toggles.missing_environment.applies(kind) {
        let has_env = has_any_phrase(&text, &lexicon.environment)
            || config
                .semantics
                .environment_tokens
                .iter()
                .any(|t| phrase_matches(&text, t));
        if !has_env {
            signals.push(NeedsInfoSignal::MissingEnvironment);
        }
    }
    if toggles.missing_version.applies(kind)
        && !(has_any_phrase(&text, &lexicon.version) || VERSION_PATTERN.is_match(&text))
    {
        signals.push(NeedsInfoSignal::MissingVersion);
    }
    if toggles.missing_logs.applies(kind) {
        let has_error = config
            .semantics
            .errors
            .keywords
            .iter()
            .any(|kw| !kw.is_empty() && text.contains(kw.as_str()));
        let has_logs = has_any_phrase(&text, &lexicon.logs) || text.contains("```") || text.contains("stack trace");
        if has_error && !has_logs {
            signals.push(NeedsInfoSignal::MissingLogs);
        }
    }

    (weigh(&signals, config), signals)
}

pub fn pr_needs_info(pr: &PullRequest, config: &Config) -> (f64, Vec<NeedsInfoSignal>) {
    let heuristics = &config.heuristics.needs_info;
    if !heuristics.enabled {
        return (0.0, Vec::new());
    }
    let text = conversation_text(&pr.title, pr.body.as_deref(), pr.comments.iter().map(|c| c.body.clone()));
    let mut signals = Vec::new();
    if heuristics.pr_signals.missing_description.enabled
        && pr.body.as_deref().map_or(true, |b| b.trim().is_empty())
    {
        signals.push(NeedsInfoSignal::MissingDescription);
    }
    if heuristics.pr_signals.missing_test_plan.enabled
        && !has_any_phrase(&text, &config.semantics.needs_info.test_plan)
    {
        signals.push(NeedsInfoSignal::MissingTestPlan);
    }
    (weigh(&signals, config), signals)
}

// ── Actionability ──

/// Label-driven states take precedence, then staleness, then the needs-info
/// threshold.
fn common_actionability(
    labels: &[String],
    days_since_update: i64,
    stale_after: f64,
    needs_info_score: f64,
    config: &Config,
) -> Option<Actionability> {
    let labels: HashSet<String> = labels.iter().map(|l| l.to_lowercase()).collect();
    let any = |set: &[String]| set.iter().any(|l| labels.contains(l));
    let sets = &config.labels;
    if any(&sets.blocked) {
        return Some(Actionability::Blocked);
    }
    if any(&sets.needs_info) {
        return Some(Actionability::NeedsInfo);
    }
    if any(&sets.needs_decision) {
        return Some(Actionability::NeedsDecision);
    }
    if any(&sets.closable) {
        return Some(Actionability::Closable);
    }
    if days_since_update as f64 > stale_after {
        return Some(Actionability::Stale);
    }
    let heuristics = &config.heuristics.needs_info;
    if heuristics.enabled && needs_info_score >= heuristics.threshold {
        return Some(Actionability::NeedsInfo);
    }
    None
}

pub fn issue_actionability(issue: &Issue, config: &Config) -> Actionability {
    if let Some(state) = common_actionability(
        &issue.labels,
        issue.days_since_update,
        config.stale_days.issues,
        issue.needs_info_score,
        config,
    ) {
        return state;
    }
    // an open question from someone other than the author
    if let Some(last) = issue.comments.last() {
        if last.author != issue.author && last.body.as_deref().is_some_and(|b| b.contains('?')) {
            return Actionability::NeedsInfo;
        }
    }
    let resolved = issue.comments.iter().any(|c| {
        let body = c.body.as_deref().unwrap_or_default().to_lowercase();
        CLOSING_PHRASES.iter().any(|p| body.contains(p))
    });
    if resolved {
        return Actionability::Closable;
    }
    Actionability::Ready
}

pub fn pr_actionability(pr: &PullRequest, config: &Config) -> Actionability {
    common_actionability(
        &pr.labels,
        pr.days_since_update,
        config.stale_days.prs,
        pr.needs_info_score,
        config,
    )
    .unwrap_or(Actionability::NeedsAnalysis)
}

// ── Relationship and implementation ──

pub fn relationship_quality(overlap: f64, explicit_link: bool, linked: usize, config: &Config) -> RelationshipQuality {
    let h = &config.heuristics.relationship_quality;
    if linked == 0 {
        return RelationshipQuality::None;
    }
    if h.strong_when_explicit && explicit_link {
        return RelationshipQuality::Strong;
    }
    if overlap >= h.strong_overlap_threshold {
        return RelationshipQuality::Strong;
    }
    if overlap >= h.medium_overlap_threshold {
        return RelationshipQuality::Medium;
    }
    h.default_when_linked
}

/// Signals carried over from the issues a pull request links to.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkedSignals {
    pub reactions: i64,
    pub sentiment: i64,
}

/// Evidence that a PR is a worthwhile implementation. Expects the relationship
/// fields to be filled in already.
pub fn implementation_score(pr: &PullRequest, linked: LinkedSignals, config: &Config) -> i64 {
    let w = &config.implementation;
    let mut score = pr.comments_total as f64 * w.comment_weight
        + pr.reviews_total as f64 * w.review_weight
        + pr.review_comments_total as f64 * w.review_comment_weight
        + net_reactions(&pr.reaction_totals) as f64 * w.reaction_weight
        + pr.linked_issue_priority * w.linked_issue_priority_weight
        + linked.reactions as f64 * w.linked_issue_reaction_weight
        + linked.sentiment as f64 * w.linked_issue_sentiment_weight
        + pr.relationship_score as f64 * w.relationship_score_weight
        + w.relationship_quality_boosts.get(pr.relationship_quality_auto);

    if pr.touches_tests {
        score += w.touches_tests_boost;
    }
    match pr.status_check_state.as_deref() {
        Some("SUCCESS") => score += w.ci_success_boost,
        Some("FAILURE") => score += w.ci_failure_penalty,
        _ => {}
    }
    if pr.has_changes_requested {
        score += w.changes_requested_penalty;
    }
    if pr.unresolved_threads > 0 {
        score += w.unresolved_threads_penalty;
    }
    if pr.is_draft {
        score += w.draft_penalty;
    }

    score += match pr.days_since_update {
        d if d > 60 => w.age_penalty.over60,
        d if d > 30 => w.age_penalty.over30,
        d if d > 14 => w.age_penalty.over14,
        _ => 0.0,
    };
    score += match pr.files_total {
        n if n > 25 => w.size_penalty.files_over25,
        n if n > 10 => w.size_penalty.files_over10,
        _ => 0.0,
    };
    score += match pr.lines_changed {
        n if n > 1000 => w.size_penalty.lines_over1000,
        n if n > 500 => w.size_penalty.lines_over500,
        _ => 0.0,
    };

    round_score(score).max(w.floor())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{config, issue, pr};
    use serde_json::json;
    use triage_core::ImplementationTier;

    #[test]
    fn bare_bug_report_needs_info() {
        let i = issue(json!({
            "number": 1,
            "title": "App crashes",
            "body": "It throws an error when I click save.",
            "labels": { "nodes": [{ "name": "bug" }] },
            "updatedAt": "2024-02-29T00:00:00Z"
        }));
        assert_eq!(
            i.needs_info_signals,
            vec![
                NeedsInfoSignal::MissingRepro,
                NeedsInfoSignal::MissingExpectedActual,
                NeedsInfoSignal::MissingEnvironment,
                NeedsInfoSignal::MissingVersion,
                NeedsInfoSignal::MissingLogs,
            ]
        );
        assert_eq!(i.needs_info_score, 6.0);
        assert_eq!(i.actionability, Actionability::NeedsInfo);
    }

    #[test]
    fn complete_report_has_no_signals() {
        let c = config();
        let i = issue(json!({
            "number": 2,
            "title": "Crash on save",
            "body": "Steps to reproduce: click save.\nExpected behavior: saved.\nActual behavior: error.\nOS: linux, v1.2.3\n```\ntrace\n```",
            "labels": { "nodes": [{ "name": "bug" }] },
            "updatedAt": "2024-02-29T00:00:00Z"
        }));
        assert!(i.needs_info_signals.is_empty());
        assert_eq!(issue_actionability(&i, &c), Actionability::Ready);
    }

    #[test]
    fn disabled_heuristics_emit_nothing() {
        let mut c = config();
        c.heuristics.needs_info.enabled = false;
        let i = issue(json!({ "number": 3, "title": "broken", "labels": { "nodes": [{ "name": "bug" }] } }));
        assert_eq!(issue_needs_info(&i, &c), (0.0, Vec::new()));
    }

    #[test]
    fn signals_respect_item_type() {
        let c = config();
        // feature requests are exempt from every issue signal by default
        let i = issue(json!({ "number": 4, "title": "Add dark mode", "labels": { "nodes": [{ "name": "enhancement" }] } }));
        assert!(i.needs_info_signals.is_empty());
        assert_eq!(issue_needs_info(&i, &c).0, 0.0);
    }

    #[test]
    fn blocked_label_wins_over_everything() {
        let c = config();
        let mut i = issue(json!({
            "number": 5,
            "title": "crash",
            "labels": { "nodes": [{ "name": "Blocked" }, { "name": "needs-info" }] },
            "updatedAt": "2023-01-01T00:00:00Z"
        }));
        assert_eq!(i.actionability, Actionability::Blocked);
        i.labels.clear();
        assert_eq!(issue_actionability(&i, &c), Actionability::Stale);
    }

    #[test]
    fn comment_heuristics_for_issues() {
        let c = config();
        let asked = issue(json!({
            "number": 6,
            "title": "Add export",
            "labels": { "nodes": [{ "name": "feature" }] },
            "author": { "login": "op" },
            "updatedAt": "2024-02-29T00:00:00Z",
            "comments": { "totalCount": 1, "nodes": [
                { "body": "Which format?", "createdAt": "2024-02-01T00:00:00Z", "author": { "login": "maint" } }
            ]}
        }));
        assert_eq!(asked.actionability, Actionability::NeedsInfo);

        let closable = issue(json!({
            "number": 7,
            "title": "Add export",
            "labels": { "nodes": [{ "name": "feature" }] },
            "author": { "login": "op" },
            "updatedAt": "2024-02-29T00:00:00Z",
            "comments": { "totalCount": 1, "nodes": [
                { "body": "Fixed in 2.1", "createdAt": "2024-02-01T00:00:00Z", "author": { "login": "op" } }
            ]}
        }));
        assert_eq!(closable.actionability, Actionability::Closable);
    }

    #[test]
    fn issue_priority_components() {
        let i = issue(json!({
            "number": 8,
            "title": "Crash",
            "labels": { "nodes": [{ "name": "bug" }, { "name": "Security" }] },
            "createdAt": "2023-12-01T00:00:00Z",
            "updatedAt": "2024-02-29T00:00:00Z",
            "comments": { "totalCount": 3, "nodes": [
                { "body": "+1", "createdAt": "2024-01-01T00:00:00Z",
                  "reactionGroups": [{ "content": "THUMBS_UP", "users": { "totalCount": 2 } }] }
            ]}
        }));
        // 3·2 + 2·3 + bug 10 + fresh 5 + security 40
        assert_eq!(i.priority_score, 67.0);
    }

    #[test]
    fn priority_never_negative() {
        let i = issue(json!({
            "number": 9,
            "title": "Old question?",
            "createdAt": "2023-01-01T00:00:00Z",
            "updatedAt": "2023-06-01T00:00:00Z"
        }));
        assert_eq!(i.priority_score, 0.0);
    }

    #[test]
    fn pr_priority_and_needs_info() {
        let c = config();
        let p = pr(json!({
            "number": 20,
            "title": "Draft fix",
            "body": "",
            "isDraft": true,
            "updatedAt": "2024-02-29T00:00:00Z",
            "comments": { "totalCount": 2, "nodes": [] },
            "reviews": { "totalCount": 1, "nodes": [
                { "state": "APPROVED", "submittedAt": "2024-02-28T00:00:00Z" }
            ]}
        }));
        // 2·2 + 1·3 + approval 8 + draft −8
        assert_eq!(p.priority_score, 7.0);
        assert_eq!(
            p.needs_info_signals,
            vec![NeedsInfoSignal::MissingDescription, NeedsInfoSignal::MissingTestPlan]
        );
        assert_eq!(p.actionability, Actionability::NeedsInfo);
        assert_eq!(pr_needs_info(&p, &c).0, 2.0);
    }

    #[test]
    fn quality_classification() {
        let c = config();
        assert_eq!(relationship_quality(0.9, true, 0, &c), RelationshipQuality::None);
        assert_eq!(relationship_quality(0.0, true, 1, &c), RelationshipQuality::Strong);
        assert_eq!(relationship_quality(0.45, false, 1, &c), RelationshipQuality::Strong);
        assert_eq!(relationship_quality(0.2, false, 1, &c), RelationshipQuality::Medium);
        let mut weak_default = c.clone();
        weak_default.heuristics.relationship_quality.default_when_linked = RelationshipQuality::Weak;
        assert_eq!(relationship_quality(0.1, false, 2, &weak_default), RelationshipQuality::Weak);
    }

    #[test]
    fn implementation_score_penalties_and_floor() {
        let c = config();
        let mut p = pr(json!({
            "number": 21,
            "title": "Big change",
            "body": "Test plan: ran it",
            "updatedAt": "2023-12-01T00:00:00Z",
            "files": { "totalCount": 30, "nodes": [{ "path": "src/a.rs", "additions": 1200, "deletions": 0 }] }
        }));
        // quality none −2, age >60 −12, files >25 −7, lines >1000 −12
        assert_eq!(implementation_score(&p, LinkedSignals::default(), &c), 0);

        p.relationship_quality_auto = RelationshipQuality::Strong;
        p.relationship_score = 20;
        p.days_since_update = 0;
        p.files_total = 1;
        p.lines_changed = 10;
        p.status_check_state = Some("SUCCESS".into());
        p.touches_tests = true;
        // 20·0.5 + strong 6 + tests 5 + ci 6
        let score = implementation_score(&p, LinkedSignals { reactions: 4, sentiment: -5 }, &c);
        // + 4·0.3 − 5·0.2 = +0.2 → 27.2 rounds to 27
        assert_eq!(score, 27);
        assert_eq!(c.implementation.tier_for(score), ImplementationTier::Medium);
        assert_eq!(c.implementation.tier_for(40), ImplementationTier::Strong);
        assert_eq!(c.implementation.tier_for(19), ImplementationTier::Weak);
    }

    #[test]
    fn net_reactions_weights() {
        let mut r = ReactionCounts::new();
        r.insert("THUMBS_UP".into(), 3);
        r.insert("ROCKET".into(), 1);
        r.insert("CONFUSED".into(), 1);
        r.insert("EYES".into(), 9);
        assert_eq!(net_reactions(&r), 6);
    }
}
