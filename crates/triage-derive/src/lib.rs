//! Repository-Semantics Deriver.
//!
//! Reads a repository's issue/PR templates and contribution guide, classifies
//! the phrases it finds, and produces a union-only configuration layer with the
//! vocabulary the built-in lexicons do not already cover.

mod phrases;
mod sources;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use triage_config::Config;
use triage_core::text::phrase_matches;
use triage_core::SCHEMA_VERSION;

pub use phrases::{extract_markdown_phrases, extract_yaml_phrases, sanitize_phrase};
pub use sources::collect_template_files;

// ── Keyword tables ──

const NEEDS_INFO_KEYWORDS: &[(&str, &[&str])] = &[
    ("repro", &["steps to reproduce", "repro", "reproduction"]),
    ("expected", &["expected behavior", "expected result"]),
    ("actual", &["actual behavior", "actual result"]),
    ("environment", &["environment", "os", "operating system", "platform"]),
    ("version", &["version", "openskills version", "node version"]),
    ("logs", &["logs", "stack trace", "error output"]),
    ("testPlan", &["test plan", "testing", "tests run"]),
];

const INTENT_KEYWORDS: &[(&str, &[&str])] = &[
    ("bug", &["bug report", "bug"]),
    ("feature", &["feature request", "feature"]),
    ("question", &["question"]),
    ("support", &["support", "help"]),
    ("meta", &["governance", "roadmap", "discussion"]),
];

const ENV_TOKENS: &[&str] = &[
    "windows", "mac", "macos", "linux", "ubuntu", "debian", "node", "npm", "pnpm", "yarn",
];

const MAX_VERBATIM_WORDS: usize = 6;
const MAX_VERBATIM_CHARS: usize = 80;

// ── Types ──

/// Additions only: every list holds entries the base config lacks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedSemantics {
    pub intent: BTreeMap<String, BTreeSet<String>>,
    pub needs_info: BTreeMap<String, BTreeSet<String>>,
    pub environment_tokens: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedOverrides {
    pub semantics: DerivedSemantics,
}

impl DerivedOverrides {
    pub fn is_empty(&self) -> bool {
        let s = &self.semantics;
        s.intent.values().all(BTreeSet::is_empty)
            && s.needs_info.values().all(BTreeSet::is_empty)
            && s.environment_tokens.is_empty()
    }

    /// The layer in configuration shape, ready for a union merge.
    pub fn to_layer(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Derived {
    pub overrides: DerivedOverrides,
    /// Repository-relative template paths that were read.
    pub sources: Vec<String>,
}

/// On-disk form of the derived layer (`semantics.generated.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedFile {
    pub schema_version: u32,
    pub generated_at: String,
    pub sources: Vec<String>,
    pub overrides: serde_json::Value,
}

// ── Derivation ──

/// Keep short phrases verbatim; otherwise fall back to the matched keyword.
fn phrase_or_keyword(phrase: &str, keyword: &str) -> String {
    let trimmed = phrase.trim();
    if trimmed.is_empty() {
        return keyword.to_string();
    }
    let words = trimmed.split_whitespace().count();
    if words <= MAX_VERBATIM_WORDS && trimmed.chars().count() <= MAX_VERBATIM_CHARS {
        trimmed.to_string()
    } else {
        keyword.to_string()
    }
}

fn base_needs_info<'a>(base: &'a Config, category: &str) -> &'a [String] {
    let n = &base.semantics.needs_info;
    match category {
        "repro" => &n.repro,
        "expected" => &n.expected,
        "actual" => &n.actual,
        "environment" => &n.environment,
        "version" => &n.version,
        "logs" => &n.logs,
        "testPlan" => &n.test_plan,
        _ => &[],
    }
}

fn base_intent<'a>(base: &'a Config, intent: &str) -> &'a [String] {
    let i = &base.semantics.intent;
    match intent {
        "bug" => &i.bug,
        "feature" => &i.feature,
        "question" => &i.question,
        "support" => &i.support,
        "meta" => &i.meta,
        _ => &[],
    }
}

/// Classify each phrase against a keyword table: first matching keyword per
/// category wins, and every category is tried.
fn classify(
    phrases: &BTreeSet<String>,
    table: &[(&str, &[&str])],
    existing: impl Fn(&str) -> Vec<String>,
) -> BTreeMap<String, BTreeSet<String>> {
    let mut adds: BTreeMap<String, BTreeSet<String>> = table
        .iter()
        .map(|(category, _)| (category.to_string(), BTreeSet::new()))
        .collect();
    for phrase in phrases {
        for (category, keywords) in table {
            let Some(kw) = keywords.iter().find(|kw| phrase_matches(phrase, kw)) else {
                continue;
            };
            let entry = phrase_or_keyword(phrase, kw);
            if !existing(category).contains(&entry) {
                if let Some(set) = adds.get_mut(*category) {
                    set.insert(entry);
                }
            }
        }
    }
    adds
}

/// Turn a set of lower-cased template phrases into an additions-only layer.
pub fn derive_from_phrases(phrases: &BTreeSet<String>, base: &Config) -> DerivedOverrides {
    let needs_info = classify(phrases, NEEDS_INFO_KEYWORDS, |c| {
        base_needs_info(base, c).to_vec()
    });
    let intent = classify(phrases, INTENT_KEYWORDS, |c| base_intent(base, c).to_vec());
    let environment_tokens = ENV_TOKENS
        .iter()
        .filter(|token| phrases.iter().any(|p| phrase_matches(p, token)))
        .filter(|token| !base.semantics.environment_tokens.iter().any(|t| t == *token))
        .map(|t| t.to_string())
        .collect();
    DerivedOverrides {
        semantics: DerivedSemantics {
            intent,
            needs_info,
            environment_tokens,
        },
    }
}

/// Scan `repo_root`'s templates and derive the additions layer.
pub fn derive_repo_overrides(repo_root: &Path, base: &Config) -> Derived {
    let sources = collect_template_files(repo_root);
    let mut collected = BTreeSet::new();
    for rel in &sources {
        let Some(content) = triage_store::read_text_if_exists(&repo_root.join(rel)) else {
            continue;
        };
        let found = if crate::sources::is_structured(rel) {
            extract_yaml_phrases(&content)
        } else {
            extract_markdown_phrases(&content)
        };
        debug!(source = %rel, phrases = found.len(), "scanned template");
        collected.extend(found.iter().filter_map(|p| phrases::accept_phrase(p)));
    }
    let overrides = derive_from_phrases(&collected, base);
    info!(
        sources = sources.len(),
        phrases = collected.len(),
        "derived repository semantics"
    );
    Derived { overrides, sources }
}

/// Persist the derived layer unless the stored copy already has the same
/// overrides and sources. Returns whether the file was written.
pub fn write_derived_file(path: &Path, derived: &Derived, generated_at: &str) -> anyhow::Result<bool> {
    let overrides = serde_json::to_value(&derived.overrides)?;
    if let Ok(Some(existing)) = triage_store::read_json::<DerivedFile>(path) {
        if existing.overrides == overrides && existing.sources == derived.sources {
            debug!(path = %path.display(), "derived semantics unchanged");
            return Ok(false);
        }
    }
    let file = DerivedFile {
        schema_version: SCHEMA_VERSION,
        generated_at: generated_at.to_string(),
        sources: derived.sources.clone(),
        overrides,
    };
    triage_store::write_json(path, &file)
        .with_context(|| format!("write derived semantics to {}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn base() -> Config {
        triage_config::resolve(None, None).config
    }

    #[test]
    fn short_phrases_kept_verbatim_long_ones_reduced() {
        let phrases = set(&[
            "how to reproduce the bug",
            "please describe in detail the exact steps to reproduce this problem",
        ]);
        let d = derive_from_phrases(&phrases, &base());
        let repro = &d.semantics.needs_info["repro"];
        assert!(repro.contains("how to reproduce the bug"));
        // long phrase collapses to its keyword, which the base already has
        assert!(!repro.contains("steps to reproduce"));
        assert_eq!(repro.len(), 1);
        // "bug" keyword hits the intent table too
        assert!(d.semantics.intent["bug"].contains("how to reproduce the bug"));
    }

    #[test]
    fn only_additions_are_emitted() {
        let d = derive_from_phrases(&set(&["expected behavior", "os"]), &base());
        assert!(d.semantics.needs_info["expected"].is_empty());
        assert!(d.semantics.needs_info["environment"].is_empty());
        assert!(d.is_empty());
    }

    #[test]
    fn environment_tokens_match_words() {
        let mut cfg = base();
        cfg.semantics.environment_tokens.clear();
        let d = derive_from_phrases(&set(&["tested on macos and npm 10"]), &cfg);
        assert_eq!(d.semantics.environment_tokens, set(&["macos", "npm"]));
    }

    #[test]
    fn derive_reads_templates_and_layer_unions() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join(".github/ISSUE_TEMPLATE")).unwrap();
        fs::write(
            root.join(".github/ISSUE_TEMPLATE/bug.yml"),
            "body:\n  - id: logs\n    attributes:\n      label: Relevant logs and output\n",
        )
        .unwrap();
        fs::write(root.join("CONTRIBUTING.md"), "## Test plan for reviewers\n").unwrap();

        let cfg = base();
        let derived = derive_repo_overrides(root, &cfg);
        assert_eq!(
            derived.sources,
            vec![".github/ISSUE_TEMPLATE/bug.yml", "CONTRIBUTING.md"]
        );
        assert!(derived.overrides.semantics.needs_info["logs"].contains("relevant logs and output"));
        assert!(derived.overrides.semantics.needs_info["testPlan"].contains("test plan for reviewers"));

        let merged = triage_config::resolve(None, Some(&derived.overrides.to_layer())).config;
        assert!(merged.semantics.needs_info.logs.contains(&"relevant logs and output".to_string()));
        assert!(merged.semantics.needs_info.logs.contains(&"stack trace".to_string()));
    }

    #[test]
    fn write_skips_identical_overrides() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("semantics.generated.json");
        let derived = Derived {
            overrides: derive_from_phrases(&set(&["browser version"]), &base()),
            sources: vec!["CONTRIBUTING.md".into()],
        };
        assert!(write_derived_file(&path, &derived, "2024-01-01T00:00:00Z").unwrap());
        assert!(!write_derived_file(&path, &derived, "2024-02-01T00:00:00Z").unwrap());
        let stored: DerivedFile =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(stored.generated_at, "2024-01-01T00:00:00Z");

        let changed = Derived {
            sources: vec![],
            ..derived
        };
        assert!(write_derived_file(&path, &changed, "2024-03-01T00:00:00Z").unwrap());
    }
}
