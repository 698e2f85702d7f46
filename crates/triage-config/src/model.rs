use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use triage_core::{AgentConfidence, ImplementationTier, ItemType, RelationshipQuality};

/// Fully resolved configuration. Every struct defaults field-by-field, so a
/// partial JSON document still deserializes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub schema_version: u32,
    pub reports_dir: String,
    pub state_file: String,
    #[serde(rename = "noMergeExternalPRs")]
    pub no_merge_external_prs: bool,
    pub semantics: Semantics,
    pub heuristics: Heuristics,
    pub sentiment: SentimentLexicon,
    pub stale_days: StaleDays,
    pub labels: LabelSets,
    pub type_labels: TypeLabels,
    pub priority: PriorityWeights,
    pub relationship_score: RelationshipScoreWeights,
    pub implementation: ImplementationWeights,
}

// ── Semantics ──

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Semantics {
    pub intent: IntentLexicon,
    pub needs_info: NeedsInfoLexicon,
    pub environment_tokens: Vec<String>,
    pub relationship: RelationshipLexicon,
    pub errors: ErrorLexicon,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct IntentLexicon {
    pub bug: Vec<String>,
    pub feature: Vec<String>,
    pub question: Vec<String>,
    pub support: Vec<String>,
    pub meta: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NeedsInfoLexicon {
    pub repro: Vec<String>,
    pub expected: Vec<String>,
    pub actual: Vec<String>,
    pub environment: Vec<String>,
    pub version: Vec<String>,
    pub logs: Vec<String>,
    pub test_plan: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RelationshipLexicon {
    pub link_keywords: Vec<String>,
    pub duplicate_hints: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ErrorLexicon {
    pub signatures: Vec<String>,
    pub keywords: Vec<String>,
}

// ── Heuristics ──

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Heuristics {
    pub needs_info: NeedsInfoHeuristics,
    pub duplicates: DuplicateHeuristics,
    pub relationship_quality: RelationshipQualityHeuristics,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NeedsInfoHeuristics {
    pub enabled: bool,
    pub threshold: f64,
    pub issue_signals: IssueSignals,
    pub pr_signals: PrSignals,
    /// Signal weight by camelCase key; unmapped signals weigh 1.
    pub weights: BTreeMap<String, f64>,
}

impl NeedsInfoHeuristics {
    pub fn weight(&self, key: &str) -> f64 {
        self.weights.get(key).copied().unwrap_or(1.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct IssueSignals {
    pub missing_repro: IssueSignalToggle,
    pub missing_expected_actual: IssueSignalToggle,
    pub missing_environment: IssueSignalToggle,
    pub missing_version: IssueSignalToggle,
    pub missing_logs: IssueSignalToggle,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct IssueSignalToggle {
    pub enabled: bool,
    /// Item types (`bug`, `unknown`, ...) the signal is evaluated for.
    pub apply_to: Vec<String>,
}

impl Default for IssueSignalToggle {
    fn default() -> Self {
        Self {
            enabled: true,
            apply_to: Vec::new(),
        }
    }
}

impl IssueSignalToggle {
    pub fn applies(&self, item_type: ItemType) -> bool {
        self.enabled && self.apply_to.iter().any(|t| t == item_type.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PrSignals {
    pub missing_test_plan: Toggle,
    pub missing_description: Toggle,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Toggle {
    pub enabled: bool,
}

impl Default for Toggle {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DuplicateHeuristics {
    pub title_similarity_threshold: f64,
    pub overlap_threshold: f64,
    pub require_shared_error: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RelationshipQualityHeuristics {
    pub strong_overlap_threshold: f64,
    pub medium_overlap_threshold: f64,
    pub strong_when_explicit: bool,
    pub default_when_linked: RelationshipQuality,
}

// ── Sentiment, staleness and labels ──

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SentimentLexicon {
    pub positive_words: Vec<String>,
    pub negative_words: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StaleDays {
    pub issues: f64,
    pub prs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelSets {
    pub blocked: Vec<String>,
    pub needs_info: Vec<String>,
    pub needs_decision: Vec<String>,
    pub closable: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TypeLabels {
    pub bug: Vec<String>,
    pub feature: Vec<String>,
    pub question: Vec<String>,
    pub support: Vec<String>,
    pub meta: Vec<String>,
}

// ── Priority ──

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PriorityWeights {
    pub issue: IssuePriorityWeights,
    pub pr: PrPriorityWeights,
    /// Lower-cased label name → additive boost.
    pub label_boosts: BTreeMap<String, f64>,
}

impl PriorityWeights {
    pub fn label_boost(&self, label: &str) -> f64 {
        self.label_boosts
            .get(&label.to_lowercase())
            .copied()
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct IssuePriorityWeights {
    pub comment_weight: f64,
    /// Reaction kind (`THUMBS_UP`) → weight per reaction.
    pub reaction_weights: BTreeMap<String, f64>,
    /// Item type → additive boost.
    pub type_boosts: BTreeMap<String, f64>,
    pub stale_penalty: IssueStalePenalty,
    pub age_boost: AgeBoost,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct IssueStalePenalty {
    pub over30: f64,
    pub over60: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AgeBoost {
    pub over30_and_fresh: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PrPriorityWeights {
    pub comment_weight: f64,
    pub review_weight: f64,
    pub approval_boost: f64,
    pub ci_success_boost: f64,
    pub unresolved_threads_penalty: f64,
    pub changes_requested_penalty: f64,
    pub draft_penalty: f64,
    pub stale_penalty: PrStalePenalty,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PrStalePenalty {
    pub over14: f64,
    pub over30: f64,
}

// ── Relationship & implementation ──

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RelationshipScoreWeights {
    pub overlap_weight: f64,
    pub explicit_link_boost: f64,
    pub linked_issues_weight: f64,
    pub mentioned_by_weight: f64,
    pub linked_issue_priority_weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ImplementationWeights {
    pub comment_weight: f64,
    pub review_weight: f64,
    pub review_comment_weight: f64,
    pub reaction_weight: f64,
    pub linked_issue_priority_weight: f64,
    pub linked_issue_reaction_weight: f64,
    pub linked_issue_sentiment_weight: f64,
    pub relationship_score_weight: f64,
    pub relationship_quality_boosts: QualityBoosts,
    pub touches_tests_boost: f64,
    pub ci_success_boost: f64,
    pub ci_failure_penalty: f64,
    pub changes_requested_penalty: f64,
    pub unresolved_threads_penalty: f64,
    pub draft_penalty: f64,
    pub age_penalty: AgePenalty,
    pub size_penalty: SizePenalty,
    pub agent_score_weight: f64,
    pub agent_confidence_multipliers: ConfidenceMultipliers,
    pub score_floor: f64,
    pub tier_thresholds: TierThresholds,
}

impl ImplementationWeights {
    /// `strong` at or above the strong threshold, `medium` at or above the
    /// medium threshold, otherwise `weak`.
    pub fn tier_for(&self, score: i64) -> ImplementationTier {
        let score = score as f64;
        if score >= self.tier_thresholds.strong {
            ImplementationTier::Strong
        } else if score >= self.tier_thresholds.medium {
            ImplementationTier::Medium
        } else {
            ImplementationTier::Weak
        }
    }

    /// `max(floor, round(auto + agent * weight * multiplier(confidence)))`
    pub fn final_score(&self, auto: i64, agent_score: f64, confidence: AgentConfidence) -> i64 {
        let adjusted = auto as f64
            + agent_score
                * self.agent_score_weight
                * self.agent_confidence_multipliers.get(confidence);
        triage_core::round_score(adjusted).max(self.floor())
    }

    /// The configured floor, rounded like any other score.
    pub fn floor(&self) -> i64 {
        triage_core::round_score(self.score_floor)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QualityBoosts {
    pub strong: f64,
    pub medium: f64,
    pub weak: f64,
    pub none: f64,
}

impl QualityBoosts {
    pub fn get(&self, quality: RelationshipQuality) -> f64 {
        match quality {
            RelationshipQuality::Strong => self.strong,
            RelationshipQuality::Medium => self.medium,
            RelationshipQuality::Weak => self.weak,
            RelationshipQuality::None => self.none,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AgePenalty {
    pub over14: f64,
    pub over30: f64,
    pub over60: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SizePenalty {
    pub files_over10: f64,
    pub files_over25: f64,
    pub lines_over500: f64,
    pub lines_over1000: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConfidenceMultipliers {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
    pub unset: f64,
}

impl ConfidenceMultipliers {
    pub fn get(&self, confidence: AgentConfidence) -> f64 {
        match confidence {
            AgentConfidence::High => self.high,
            AgentConfidence::Medium => self.medium,
            AgentConfidence::Low => self.low,
            AgentConfidence::Unset => self.unset,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TierThresholds {
    pub strong: f64,
    pub medium: f64,
}

// ── Normalization ──

/// Lower-case, trim, drop empties and duplicates (first occurrence wins).
pub fn normalize_list(list: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    let normalized: Vec<String> = list
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect();
    *list = normalized;
}

impl Config {
    /// Bring every lexicon and label list into canonical form.
    pub fn normalize(&mut self) {
        let s = &mut self.semantics;
        for list in [
            &mut s.intent.bug,
            &mut s.intent.feature,
            &mut s.intent.question,
            &mut s.intent.support,
            &mut s.intent.meta,
            &mut s.needs_info.repro,
            &mut s.needs_info.expected,
            &mut s.needs_info.actual,
            &mut s.needs_info.environment,
            &mut s.needs_info.version,
            &mut s.needs_info.logs,
            &mut s.needs_info.test_plan,
            &mut s.environment_tokens,
            &mut s.relationship.link_keywords,
            &mut s.relationship.duplicate_hints,
            &mut s.errors.signatures,
            &mut s.errors.keywords,
        ] {
            normalize_list(list);
        }
        normalize_list(&mut self.sentiment.positive_words);
        normalize_list(&mut self.sentiment.negative_words);

        let l = &mut self.labels;
        for list in [
            &mut l.blocked,
            &mut l.needs_info,
            &mut l.needs_decision,
            &mut l.closable,
        ] {
            normalize_list(list);
        }
        let t = &mut self.type_labels;
        for list in [
            &mut t.bug,
            &mut t.feature,
            &mut t.question,
            &mut t.support,
            &mut t.meta,
        ] {
            normalize_list(list);
        }

        let sig = &mut self.heuristics.needs_info.issue_signals;
        for toggle in [
            &mut sig.missing_repro,
            &mut sig.missing_expected_actual,
            &mut sig.missing_environment,
            &mut sig.missing_version,
            &mut sig.missing_logs,
        ] {
            normalize_list(&mut toggle.apply_to);
        }

        self.priority.label_boosts = std::mem::take(&mut self.priority.label_boosts)
            .into_iter()
            .map(|(k, v)| (k.trim().to_lowercase(), v))
            .collect();
    }

    /// Labels that map to `kind` in the label pass of type classification.
    pub fn type_labels_for(&self, kind: ItemType) -> &[String] {
        match kind {
            ItemType::Bug => &self.type_labels.bug,
            ItemType::Feature => &self.type_labels.feature,
            ItemType::Question => &self.type_labels.question,
            ItemType::Support => &self.type_labels.support,
            ItemType::Meta => &self.type_labels.meta,
            ItemType::Unknown => &[],
        }
    }

    /// Free-text intent phrases for `kind`.
    pub fn intent_for(&self, kind: ItemType) -> &[String] {
        let intent = &self.semantics.intent;
        match kind {
            ItemType::Bug => &intent.bug,
            ItemType::Feature => &intent.feature,
            ItemType::Question => &intent.question,
            ItemType::Support => &intent.support,
            ItemType::Meta => &intent.meta,
            ItemType::Unknown => &[],
        }
    }
}
