use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use triage_config::Config;
use triage_core::{
    round_score, AgentConfidence, Entity, EntityKind, ImplementationTier, PullRequest, RelationshipQuality,
};

use crate::front_matter::{parse_document, FrontMatter, FrontValue};

/// Keys older runs wrote before auto/final scores were split.
const LEGACY_KEYS: &[&str] = &["implementation_score", "implementation_tier"];

const ISSUE_TEMPLATE: &str = "\
## Intent
- TODO: Summarize the reporter intent and underlying need.

## Analysis
- TODO: Root cause, severity, scope.

## Proposed Action
- TODO: Implement, ask for info, close, defer.

## Draft Response (requires approval)
- TODO: Draft the public response.
";

const PR_TEMPLATE: &str = "\
## Intent
- TODO: Summarize what the PR tries to solve and how.

## Relationship Quality
- TODO: Does this solve linked issues? Any mismatch? Update relationship_quality_final if needed.

## Agent Score Adjustment
- TODO: Adjust score based on your judgment. Update agent_score, agent_confidence, agent_rationale.

## Implementation Plan
- TODO: How you will implement the fix directly.

## Draft Response (requires approval)
- TODO: Draft the closing response with credit.
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteOutcome {
    Created,
    Merged,
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct Note {
    pub path: PathBuf,
    pub front_matter: FrontMatter,
    pub body: String,
    pub outcome: NoteOutcome,
}

/// `<root>/issues/<shard>/ISSUE-<n>.md` and `<root>/prs/<shard>/PR-<n>.md`,
/// with 1000 notes per shard.
pub fn note_path(root: &Path, kind: EntityKind, number: u64) -> PathBuf {
    let shard = format!("{:03}", number / 1000);
    match kind {
        EntityKind::Issue => root.join("issues").join(shard).join(format!("ISSUE-{number}.md")),
        EntityKind::Pr => root.join("prs").join(shard).join(format!("PR-{number}.md")),
    }
}

// ── Merge ──

/// Human-owned PR fields as they stand in an existing note.
struct AgentFields {
    score: f64,
    confidence: AgentConfidence,
    rationale: String,
}

impl AgentFields {
    fn read(existing: &FrontMatter) -> Self {
        Self {
            score: existing.number("agent_score").unwrap_or(0.0),
            confidence: existing
                .string("agent_confidence")
                .map(AgentConfidence::parse_lenient)
                .unwrap_or_default(),
            rationale: existing.string("agent_rationale").unwrap_or_default().to_string(),
        }
    }

    fn is_set(&self) -> bool {
        self.score != 0.0 || self.confidence != AgentConfidence::Unset || !self.rationale.trim().is_empty()
    }
}

/// The stored relationship-quality override survives only once a human has
/// touched the agent fields; until then it tracks the automatic value.
fn relationship_quality_final(existing: &FrontMatter, agent: &AgentFields, auto: RelationshipQuality) -> String {
    let stored = existing.string("relationship_quality_final").unwrap_or_default();
    if !agent.is_set() && stored != auto.as_str() {
        return auto.as_str().to_string();
    }
    if stored.is_empty() {
        auto.as_str().to_string()
    } else {
        stored.to_string()
    }
}

fn merge_pull_request_fields(fm: &mut FrontMatter, pr: &PullRequest, existing: &FrontMatter, config: &Config) {
    let agent = AgentFields::read(existing);
    let implementation = &config.implementation;
    let auto = pr.implementation_score_auto;
    let final_score = implementation.final_score(auto, agent.score, agent.confidence);

    fm.set("implementation_score_auto", auto);
    fm.set("implementation_score_final", final_score);
    fm.set("implementation_tier_auto", implementation.tier_for(auto).as_str());
    fm.set("implementation_tier_final", implementation.tier_for(final_score).as_str());
    fm.set("agent_score", agent.score);
    fm.set("agent_confidence", agent.confidence.as_str());
    fm.set("agent_rationale", agent.rationale.as_str());
    fm.set("relationship_score", pr.relationship_score);
    fm.set("relationship_overlap", pr.relationship_overlap);
    fm.set("relationship_quality_auto", pr.relationship_quality_auto.as_str());
    fm.set(
        "relationship_quality_final",
        relationship_quality_final(existing, &agent, pr.relationship_quality_auto),
    );
    fm.set("linked_issues", pr.linked_issues.as_slice());
}

/// Recompute every machine-owned key on top of `existing`. Unknown keys keep
/// their place; legacy keys are dropped.
pub fn merge_front_matter(entity: &dyn Entity, now: &str, existing: &FrontMatter, config: &Config) -> FrontMatter {
    let mut fm = existing.clone();
    for key in LEGACY_KEYS {
        fm.remove(key);
    }
    fm.set("id", entity.number());
    fm.set("type", entity.kind().as_str());
    fm.set("status", "open");
    fm.set("actionability", entity.actionability().as_str());
    fm.set("priority_score", entity.priority_score());
    fm.set("sentiment_score", entity.sentiment_score());
    fm.set("needs_info_score", entity.needs_info_score());
    fm.set(
        "needs_info_signals",
        entity
            .needs_info_signals()
            .iter()
            .map(|s| s.as_str().to_string())
            .collect::<Vec<_>>(),
    );
    fm.set("labels", entity.labels().to_vec());
    fm.set("last_seen_at", now);

    if let Some(pr) = entity.as_pull_request() {
        merge_pull_request_fields(&mut fm, pr, existing, config);
    }
    fm
}

// ── Store ──

/// Create the note for `entity`, or merge fresh machine fields into the one
/// on disk. The file is only rewritten when its content changes.
pub fn sync_note(root: &Path, entity: &dyn Entity, now: &str, config: &Config) -> anyhow::Result<Note> {
    let path = note_path(root, entity.kind(), entity.number());
    let existing = triage_store::read_text_if_exists(&path);

    let (front_matter, body, outcome) = match &existing {
        None => {
            let fm = merge_front_matter(entity, now, &FrontMatter::default(), config);
            let body = match entity.kind() {
                EntityKind::Issue => ISSUE_TEMPLATE,
                EntityKind::Pr => PR_TEMPLATE,
            };
            (fm, body.to_string(), NoteOutcome::Created)
        }
        Some(content) => {
            let (stored, body) = parse_document(content);
            let fm = merge_front_matter(entity, now, &stored, config);
            (fm, body, NoteOutcome::Merged)
        }
    };

    let rendered = format!("{}{}", front_matter.render(), body);
    let outcome = if existing.as_deref() == Some(rendered.as_str()) {
        NoteOutcome::Unchanged
    } else {
        triage_store::write_atomic(&path, rendered.as_bytes())
            .with_context(|| format!("write note {}", path.display()))?;
        outcome
    };
    debug!(id = %entity.node_id(), path = %path.display(), ?outcome, "synced note");

    Ok(Note {
        path,
        front_matter,
        body,
        outcome,
    })
}

// ── Reconciliation ──

/// Copy human-influenced values back from a PR's note so exported data
/// matches what the note says.
pub fn apply_note_to_pr(pr: &mut PullRequest, fm: &FrontMatter) {
    if let Some(n) = fm.number("implementation_score_auto") {
        pr.implementation_score_auto = round_score(n);
    }
    if let Some(n) = fm.number("implementation_score_final") {
        pr.implementation_score_final = round_score(n);
    }
    if let Some(t) = fm.string("implementation_tier_auto").and_then(ImplementationTier::parse) {
        pr.implementation_tier_auto = t;
    }
    if let Some(t) = fm.string("implementation_tier_final").and_then(ImplementationTier::parse) {
        pr.implementation_tier_final = t;
    }
    if let Some(n) = fm.number("agent_score") {
        pr.agent_score = n;
    }
    if let Some(s) = fm.string("agent_confidence") {
        pr.agent_confidence = AgentConfidence::parse_lenient(s);
    }
    if let Some(FrontValue::Str(s)) = fm.get("agent_rationale") {
        pr.agent_rationale = s.clone();
    }
    if let Some(n) = fm.number("relationship_overlap") {
        pr.relationship_overlap = n;
    }
    if let Some(q) = fm.string("relationship_quality_auto").and_then(RelationshipQuality::parse) {
        pr.relationship_quality_auto = q;
    }
    if let Some(q) = fm.string("relationship_quality_final").and_then(RelationshipQuality::parse) {
        pr.relationship_quality_final = q;
    }
}
