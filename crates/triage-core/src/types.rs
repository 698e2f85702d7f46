use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Reaction kind (e.g. `THUMBS_UP`) → count. Zero counts are never stored.
pub type ReactionCounts = BTreeMap<String, u64>;

// ── Classification enums ──

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Issue,
    Pr,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Issue => "issue",
            EntityKind::Pr => "pr",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Bug,
    Feature,
    Question,
    Support,
    Meta,
    #[default]
    Unknown,
}

impl ItemType {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::Bug => "bug",
            ItemType::Feature => "feature",
            ItemType::Question => "question",
            ItemType::Support => "support",
            ItemType::Meta => "meta",
            ItemType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow state of an issue or PR, re-derived every run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Actionability {
    Ready,
    NeedsInfo,
    NeedsDecision,
    NeedsAnalysis,
    Blocked,
    Stale,
    Closable,
}

impl Actionability {
    pub fn as_str(self) -> &'static str {
        match self {
            Actionability::Ready => "ready",
            Actionability::NeedsInfo => "needs-info",
            Actionability::NeedsDecision => "needs-decision",
            Actionability::NeedsAnalysis => "needs-analysis",
            Actionability::Blocked => "blocked",
            Actionability::Stale => "stale",
            Actionability::Closable => "closable",
        }
    }
}

impl fmt::Display for Actionability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipQuality {
    Strong,
    Medium,
    Weak,
    #[default]
    None,
}

impl RelationshipQuality {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationshipQuality::Strong => "strong",
            RelationshipQuality::Medium => "medium",
            RelationshipQuality::Weak => "weak",
            RelationshipQuality::None => "none",
        }
    }

    /// Strict parse of a persisted value; anything unrecognised is `None` (Rust's).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "strong" => Some(RelationshipQuality::Strong),
            "medium" => Some(RelationshipQuality::Medium),
            "weak" => Some(RelationshipQuality::Weak),
            "none" => Some(RelationshipQuality::None),
            _ => None,
        }
    }
}

impl fmt::Display for RelationshipQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImplementationTier {
    Strong,
    Medium,
    #[default]
    Weak,
}

impl ImplementationTier {
    pub fn as_str(self) -> &'static str {
        match self {
            ImplementationTier::Strong => "strong",
            ImplementationTier::Medium => "medium",
            ImplementationTier::Weak => "weak",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "strong" => Some(ImplementationTier::Strong),
            "medium" => Some(ImplementationTier::Medium),
            "weak" => Some(ImplementationTier::Weak),
            _ => None,
        }
    }
}

impl fmt::Display for ImplementationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confidence attached to a human/agent score adjustment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgentConfidence {
    High,
    Medium,
    Low,
    #[default]
    Unset,
}

impl AgentConfidence {
    pub fn as_str(self) -> &'static str {
        match self {
            AgentConfidence::High => "high",
            AgentConfidence::Medium => "medium",
            AgentConfidence::Low => "low",
            AgentConfidence::Unset => "unset",
        }
    }

    /// Lenient parse: unknown or empty values are `Unset`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "high" => AgentConfidence::High,
            "medium" => AgentConfidence::Medium,
            "low" => AgentConfidence::Low,
            _ => AgentConfidence::Unset,
        }
    }
}

impl fmt::Display for AgentConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named gap in the information an issue or PR provides.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum NeedsInfoSignal {
    MissingRepro,
    MissingExpectedActual,
    MissingEnvironment,
    MissingVersion,
    MissingLogs,
    MissingTestPlan,
    MissingDescription,
}

impl NeedsInfoSignal {
    pub fn as_str(self) -> &'static str {
        match self {
            NeedsInfoSignal::MissingRepro => "missing-repro",
            NeedsInfoSignal::MissingExpectedActual => "missing-expected-actual",
            NeedsInfoSignal::MissingEnvironment => "missing-environment",
            NeedsInfoSignal::MissingVersion => "missing-version",
            NeedsInfoSignal::MissingLogs => "missing-logs",
            NeedsInfoSignal::MissingTestPlan => "missing-test-plan",
            NeedsInfoSignal::MissingDescription => "missing-description",
        }
    }

    /// Key of this signal in `heuristics.needsInfo.weights`.
    pub fn weight_key(self) -> &'static str {
        match self {
            NeedsInfoSignal::MissingRepro => "missingRepro",
            NeedsInfoSignal::MissingExpectedActual => "missingExpectedActual",
            NeedsInfoSignal::MissingEnvironment => "missingEnvironment",
            NeedsInfoSignal::MissingVersion => "missingVersion",
            NeedsInfoSignal::MissingLogs => "missingLogs",
            NeedsInfoSignal::MissingTestPlan => "missingTestPlan",
            NeedsInfoSignal::MissingDescription => "missingDescription",
        }
    }
}

impl fmt::Display for NeedsInfoSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Normalized records ──

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// 1-based chronological position.
    pub index: usize,
    pub url: String,
    pub body: Option<String>,
    pub created_at: String,
    pub author: String,
    pub author_association: Option<String>,
    pub reactions: ReactionCounts,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub index: usize,
    pub url: String,
    pub body: Option<String>,
    pub state: String,
    pub submitted_at: String,
    pub author: String,
    pub author_association: Option<String>,
    pub reactions: ReactionCounts,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewComment {
    /// 1-based position after flattening every thread and re-sorting.
    pub index: usize,
    /// 1-based position of the owning thread.
    pub thread_index: usize,
    pub thread_resolved: bool,
    pub url: String,
    pub body: Option<String>,
    pub created_at: String,
    pub author: String,
    pub author_association: Option<String>,
    pub reactions: ReactionCounts,
    pub path: Option<String>,
    pub position: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PrFile {
    pub path: String,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Relations {
    pub mentions: Vec<u64>,
    pub mentioned_by: Vec<u64>,
    pub possible_duplicates: Vec<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub url: String,
    pub created_at: String,
    pub updated_at: String,
    pub author: String,
    pub labels: Vec<String>,
    pub assignees: Vec<String>,
    pub comments_total: u64,
    pub comments: Vec<Comment>,
    pub reaction_totals: ReactionCounts,
    pub sentiment_score: i64,
    pub participants: Vec<String>,
    pub age_in_days: i64,
    pub days_since_update: i64,
    pub priority_score: f64,
    pub actionability: Actionability,
    pub needs_info_score: f64,
    pub needs_info_signals: Vec<NeedsInfoSignal>,
    pub relations: Relations,
    pub item_type: ItemType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub url: String,
    pub created_at: String,
    pub updated_at: String,
    pub is_draft: bool,
    pub author: String,
    pub labels: Vec<String>,
    pub assignees: Vec<String>,
    pub comments_total: u64,
    pub comments: Vec<Comment>,
    pub reaction_totals: ReactionCounts,
    pub sentiment_score: i64,
    pub reviews_total: u64,
    pub reviews: Vec<Review>,
    pub review_comments_total: u64,
    pub review_comments: Vec<ReviewComment>,
    pub files_total: u64,
    pub files: Vec<PrFile>,
    pub lines_changed: u64,
    pub status_check_state: Option<String>,
    pub participants: Vec<String>,
    pub age_in_days: i64,
    pub days_since_update: i64,
    pub priority_score: f64,
    pub actionability: Actionability,
    pub needs_info_score: f64,
    pub needs_info_signals: Vec<NeedsInfoSignal>,
    pub relations: Relations,
    pub has_approval: bool,
    pub has_changes_requested: bool,
    pub unresolved_threads: usize,
    pub linked_issues: Vec<u64>,
    pub linked_issue_priority: f64,
    pub relationship_score: i64,
    pub relationship_overlap: f64,
    pub relationship_quality_auto: RelationshipQuality,
    pub relationship_quality_final: RelationshipQuality,
    pub touches_tests: bool,
    pub implementation_score_auto: i64,
    pub implementation_score_final: i64,
    pub implementation_tier_auto: ImplementationTier,
    pub implementation_tier_final: ImplementationTier,
    pub agent_score: f64,
    pub agent_confidence: AgentConfidence,
    pub agent_rationale: String,
}

/// Read-only view shared by issues and pull requests.
pub trait Entity {
    fn kind(&self) -> EntityKind;
    fn number(&self) -> u64;
    fn title(&self) -> &str;
    fn body(&self) -> Option<&str>;
    fn updated_at(&self) -> &str;
    fn comments_total(&self) -> u64;
    fn labels(&self) -> &[String];
    fn actionability(&self) -> Actionability;
    fn priority_score(&self) -> f64;
    fn sentiment_score(&self) -> i64;
    fn needs_info_score(&self) -> f64;
    fn needs_info_signals(&self) -> &[NeedsInfoSignal];
    fn relations(&self) -> &Relations;

    /// PR-only fields; `None` for issues.
    fn as_pull_request(&self) -> Option<&PullRequest> {
        None
    }

    /// `issue:12` / `pr:40`
    fn node_id(&self) -> String {
        format!("{}:{}", self.kind(), self.number())
    }
}

macro_rules! impl_entity_common {
    () => {
        fn number(&self) -> u64 {
            self.number
        }
        fn title(&self) -> &str {
            &self.title
        }
        fn body(&self) -> Option<&str> {
            self.body.as_deref()
        }
        fn updated_at(&self) -> &str {
            &self.updated_at
        }
        fn comments_total(&self) -> u64 {
            self.comments_total
        }
        fn labels(&self) -> &[String] {
            &self.labels
        }
        fn actionability(&self) -> Actionability {
            self.actionability
        }
        fn priority_score(&self) -> f64 {
            self.priority_score
        }
        fn sentiment_score(&self) -> i64 {
            self.sentiment_score
        }
        fn needs_info_score(&self) -> f64 {
            self.needs_info_score
        }
        fn needs_info_signals(&self) -> &[NeedsInfoSignal] {
            &self.needs_info_signals
        }
        fn relations(&self) -> &Relations {
            &self.relations
        }
    };
}

impl Entity for Issue {
    fn kind(&self) -> EntityKind {
        EntityKind::Issue
    }
    impl_entity_common!();
}

impl Entity for PullRequest {
    fn kind(&self) -> EntityKind {
        EntityKind::Pr
    }
    impl_entity_common!();

    fn as_pull_request(&self) -> Option<&PullRequest> {
        Some(self)
    }
}

// ── Contributors ──

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContributorProfile {
    pub login: String,
    pub issues_opened: Vec<u64>,
    pub prs_opened: Vec<u64>,
    pub comments_on: Vec<u64>,
    pub first_seen: String,
    pub last_seen: String,
    pub is_first_time: bool,
    pub association_types: BTreeSet<String>,
}

impl ContributorProfile {
    pub fn new(login: &str) -> Self {
        Self {
            login: login.to_string(),
            issues_opened: Vec::new(),
            prs_opened: Vec::new(),
            comments_on: Vec::new(),
            first_seen: String::new(),
            last_seen: String::new(),
            is_first_time: true,
            association_types: BTreeSet::new(),
        }
    }

    /// Widen the first/last-seen window to include `ts` (ISO-8601 strings sort chronologically).
    pub fn observe(&mut self, ts: &str) {
        if ts.is_empty() {
            return;
        }
        if self.first_seen.is_empty() || ts < self.first_seen.as_str() {
            self.first_seen = ts.to_string();
        }
        if self.last_seen.is_empty() || ts > self.last_seen.as_str() {
            self.last_seen = ts.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actionability_serializes_kebab_case() {
        let v = serde_json::to_value(Actionability::NeedsDecision).unwrap();
        assert_eq!(v, "needs-decision");
        assert_eq!(Actionability::NeedsInfo.to_string(), "needs-info");
    }

    #[test]
    fn signals_map_to_weight_keys() {
        assert_eq!(NeedsInfoSignal::MissingExpectedActual.as_str(), "missing-expected-actual");
        assert_eq!(
            NeedsInfoSignal::MissingExpectedActual.weight_key(),
            "missingExpectedActual"
        );
        let v = serde_json::to_value(NeedsInfoSignal::MissingTestPlan).unwrap();
        assert_eq!(v, "missing-test-plan");
    }

    #[test]
    fn confidence_parse_is_lenient() {
        assert_eq!(AgentConfidence::parse_lenient(" HIGH "), AgentConfidence::High);
        assert_eq!(AgentConfidence::parse_lenient("sure"), AgentConfidence::Unset);
        assert_eq!(AgentConfidence::parse_lenient(""), AgentConfidence::Unset);
    }

    #[test]
    fn relationship_quality_parse_rejects_unknown() {
        assert_eq!(RelationshipQuality::parse("Medium"), Some(RelationshipQuality::Medium));
        assert_eq!(RelationshipQuality::parse("maybe"), None);
    }

    #[test]
    fn contributor_observe_widens_window() {
        let mut p = ContributorProfile::new("alice");
        p.observe("2024-02-01T00:00:00Z");
        p.observe("2024-01-01T00:00:00Z");
        p.observe("2024-03-01T00:00:00Z");
        assert_eq!(p.first_seen, "2024-01-01T00:00:00Z");
        assert_eq!(p.last_seen, "2024-03-01T00:00:00Z");
    }
}
