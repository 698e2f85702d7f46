//! Built-in configuration values.

use std::collections::BTreeMap;

use triage_core::{RelationshipQuality, SCHEMA_VERSION};

use crate::model::*;

fn list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn weights(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            reports_dir: "reports".into(),
            state_file: ".github/maintainer/state.json".into(),
            no_merge_external_prs: true,
            semantics: Semantics::default(),
            heuristics: Heuristics::default(),
            sentiment: SentimentLexicon::default(),
            stale_days: StaleDays::default(),
            labels: LabelSets::default(),
            type_labels: TypeLabels::default(),
            priority: PriorityWeights::default(),
            relationship_score: RelationshipScoreWeights::default(),
            implementation: ImplementationWeights::default(),
        }
    }
}

// ── Semantics ──

impl Default for Semantics {
    fn default() -> Self {
        Self {
            intent: IntentLexicon::default(),
            needs_info: NeedsInfoLexicon::default(),
            environment_tokens: list(&[
                "windows", "win11", "win10", "mac", "macos", "linux", "ubuntu", "debian", "node",
                "npm", "pnpm", "yarn",
            ]),
            relationship: RelationshipLexicon::default(),
            errors: ErrorLexicon::default(),
        }
    }
}

impl Default for IntentLexicon {
    fn default() -> Self {
        Self {
            bug: list(&[
                "bug", "crash", "error", "exception", "fails", "failing", "broken", "regression",
            ]),
            feature: list(&[
                "feature",
                "enhancement",
                "feature request",
                "would be nice",
                "add support",
                "request",
            ]),
            question: list(&["how do i", "how can i", "is it possible", "what does", "question"]),
            support: list(&[
                "help",
                "support",
                "troubleshoot",
                "configure",
                "configuration",
                "setup",
                "install",
            ]),
            meta: list(&["roadmap", "governance", "maintainer", "community", "discussion"]),
        }
    }
}

impl Default for NeedsInfoLexicon {
    fn default() -> Self {
        Self {
            repro: list(&["steps to reproduce", "repro steps", "reproduction"]),
            expected: list(&["expected behavior", "expected result"]),
            actual: list(&["actual behavior", "actual result"]),
            environment: list(&["environment", "os", "operating system", "platform"]),
            version: list(&["version", "openskills version", "node version"]),
            logs: list(&["logs", "stack trace", "error output"]),
            test_plan: list(&["test plan", "testing", "tests run"]),
        }
    }
}

impl Default for RelationshipLexicon {
    fn default() -> Self {
        Self {
            link_keywords: list(&[
                "fixes",
                "closes",
                "resolves",
                "addresses",
                "related to",
                "see",
                "ref",
                "refs",
                "linked to",
            ]),
            duplicate_hints: list(&["duplicate", "same issue", "same error", "same problem"]),
        }
    }
}

impl Default for ErrorLexicon {
    fn default() -> Self {
        Self {
            signatures: Vec::new(),
            keywords: list(&[
                "error",
                "exception",
                "failed",
                "failure",
                "crash",
                "security error",
            ]),
        }
    }
}

// ── Heuristics ──

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            needs_info: NeedsInfoHeuristics::default(),
            duplicates: DuplicateHeuristics::default(),
            relationship_quality: RelationshipQualityHeuristics::default(),
        }
    }
}

impl Default for NeedsInfoHeuristics {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 2.0,
            issue_signals: IssueSignals::default(),
            pr_signals: PrSignals::default(),
            weights: weights(&[
                ("missingRepro", 2.0),
                ("missingExpectedActual", 1.0),
                ("missingEnvironment", 1.0),
                ("missingVersion", 1.0),
                ("missingLogs", 1.0),
                ("missingTestPlan", 1.0),
                ("missingDescription", 1.0),
            ]),
        }
    }
}

fn toggle(apply_to: &[&str]) -> IssueSignalToggle {
    IssueSignalToggle {
        enabled: true,
        apply_to: list(apply_to),
    }
}

impl Default for IssueSignals {
    fn default() -> Self {
        Self {
            missing_repro: toggle(&["bug", "unknown"]),
            missing_expected_actual: toggle(&["bug", "unknown"]),
            missing_environment: toggle(&["bug", "support", "question", "unknown"]),
            missing_version: toggle(&["bug", "support", "question", "unknown"]),
            missing_logs: toggle(&["bug", "support", "unknown"]),
        }
    }
}

impl Default for PrSignals {
    fn default() -> Self {
        Self {
            missing_test_plan: Toggle { enabled: true },
            missing_description: Toggle { enabled: true },
        }
    }
}

impl Default for DuplicateHeuristics {
    fn default() -> Self {
        Self {
            title_similarity_threshold: 0.6,
            overlap_threshold: 0.35,
            require_shared_error: false,
        }
    }
}

impl Default for RelationshipQualityHeuristics {
    fn default() -> Self {
        Self {
            strong_overlap_threshold: 0.45,
            medium_overlap_threshold: 0.15,
            strong_when_explicit: true,
            default_when_linked: RelationshipQuality::Medium,
        }
    }
}

// ── Sentiment, staleness and labels ──

impl Default for SentimentLexicon {
    fn default() -> Self {
        Self {
            positive_words: list(&[
                "thanks", "thank", "great", "awesome", "good", "love", "like", "helpful",
                "appreciate", "nice", "excellent", "amazing", "worked", "works", "fixed",
                "resolved", "perfect",
            ]),
            negative_words: list(&[
                "broken", "fail", "fails", "failing", "error", "crash", "crashes", "bad",
                "terrible", "awful", "hate", "bug", "regression", "doesnt", "doesn't", "cant",
                "can't", "worse", "problem", "issue",
            ]),
        }
    }
}

impl Default for StaleDays {
    fn default() -> Self {
        Self { issues: 60.0, prs: 30.0 }
    }
}

impl Default for LabelSets {
    fn default() -> Self {
        Self {
            blocked: list(&["blocked", "on-hold"]),
            needs_info: list(&["needs-info", "needs-more-info", "waiting-for-response"]),
            needs_decision: list(&["needs-decision"]),
            closable: list(&["duplicate", "wontfix", "invalid", "out-of-scope"]),
        }
    }
}

impl Default for TypeLabels {
    fn default() -> Self {
        Self {
            bug: list(&["bug"]),
            feature: list(&["feature", "enhancement"]),
            question: list(&["question"]),
            support: list(&["support"]),
            meta: list(&["meta", "governance", "roadmap"]),
        }
    }
}

// ── Priority ──

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            issue: IssuePriorityWeights::default(),
            pr: PrPriorityWeights::default(),
            label_boosts: weights(&[("security", 40.0), ("critical", 25.0), ("high-priority", 15.0)]),
        }
    }
}

impl Default for IssuePriorityWeights {
    fn default() -> Self {
        Self {
            comment_weight: 2.0,
            reaction_weights: weights(&[("THUMBS_UP", 3.0), ("THUMBS_DOWN", 2.0), ("HEART", 2.0)]),
            type_boosts: weights(&[("bug", 10.0), ("feature", 5.0)]),
            stale_penalty: IssueStalePenalty::default(),
            age_boost: AgeBoost::default(),
        }
    }
}

impl Default for IssueStalePenalty {
    fn default() -> Self {
        Self {
            over30: -5.0,
            over60: -10.0,
        }
    }
}

impl Default for AgeBoost {
    fn default() -> Self {
        Self {
            over30_and_fresh: 5.0,
        }
    }
}

impl Default for PrPriorityWeights {
    fn default() -> Self {
        Self {
            comment_weight: 2.0,
            review_weight: 3.0,
            approval_boost: 8.0,
            ci_success_boost: 6.0,
            unresolved_threads_penalty: -5.0,
            changes_requested_penalty: -5.0,
            draft_penalty: -8.0,
            stale_penalty: PrStalePenalty::default(),
        }
    }
}

impl Default for PrStalePenalty {
    fn default() -> Self {
        Self {
            over14: -5.0,
            over30: -10.0,
        }
    }
}

// ── Relationship & implementation ──

impl Default for RelationshipScoreWeights {
    fn default() -> Self {
        Self {
            overlap_weight: 30.0,
            explicit_link_boost: 8.0,
            linked_issues_weight: 2.0,
            mentioned_by_weight: 2.0,
            linked_issue_priority_weight: 0.15,
        }
    }
}

impl Default for ImplementationWeights {
    fn default() -> Self {
        Self {
            comment_weight: 1.0,
            review_weight: 2.0,
            review_comment_weight: 1.0,
            reaction_weight: 1.0,
            linked_issue_priority_weight: 0.6,
            linked_issue_reaction_weight: 0.3,
            linked_issue_sentiment_weight: 0.2,
            relationship_score_weight: 0.5,
            relationship_quality_boosts: QualityBoosts::default(),
            touches_tests_boost: 5.0,
            ci_success_boost: 6.0,
            ci_failure_penalty: -6.0,
            changes_requested_penalty: -8.0,
            unresolved_threads_penalty: -4.0,
            draft_penalty: -10.0,
            age_penalty: AgePenalty::default(),
            size_penalty: SizePenalty::default(),
            agent_score_weight: 1.0,
            agent_confidence_multipliers: ConfidenceMultipliers::default(),
            score_floor: 0.0,
            tier_thresholds: TierThresholds::default(),
        }
    }
}

impl Default for QualityBoosts {
    fn default() -> Self {
        Self {
            strong: 6.0,
            medium: 3.0,
            weak: 0.0,
            none: -2.0,
        }
    }
}

impl Default for AgePenalty {
    fn default() -> Self {
        Self {
            over14: -3.0,
            over30: -7.0,
            over60: -12.0,
        }
    }
}

impl Default for SizePenalty {
    fn default() -> Self {
        Self {
            files_over10: -3.0,
            files_over25: -7.0,
            lines_over500: -8.0,
            lines_over1000: -12.0,
        }
    }
}

impl Default for ConfidenceMultipliers {
    fn default() -> Self {
        Self {
            high: 1.5,
            medium: 1.0,
            low: 0.5,
            unset: 0.0,
        }
    }
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            strong: 40.0,
            medium: 20.0,
        }
    }
}
