//! Flat listing of every note on disk (`index/items.json`).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;

use triage_core::{round_score, EntityKind};

use crate::front_matter::{parse_document, FrontMatter};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IndexItem {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub title: String,
    pub actionability: String,
    pub priority_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implementation_score_auto: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implementation_score_final: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implementation_tier_auto: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implementation_tier_final: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_confidence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship_overlap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship_quality_auto: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship_quality_final: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs_info_score: Option<f64>,
    pub needs_info_signals: Vec<String>,
    pub linked_issues: Vec<u64>,
    pub labels: Vec<String>,
    pub note_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reviewed_at: Option<String>,
}

/// Key into the title map handed to [`build_index`]: `"issue:12"`, `"pr:7"`.
pub fn title_key(kind: EntityKind, number: u64) -> String {
    format!("{kind}:{number}")
}

fn collect_notes(dir: &Path, out: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e).with_context(|| format!("read {}", dir.display())),
    };
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            collect_notes(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "md") {
            out.push(path);
        }
    }
    Ok(())
}

fn relative_display(path: &Path, base: &Path) -> String {
    let rel = path.strip_prefix(base).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn index_item(fm: &FrontMatter, titles: &HashMap<String, String>, note_path: String) -> Option<IndexItem> {
    let kind = match fm.string("type") {
        Some("pr") => EntityKind::Pr,
        _ => EntityKind::Issue,
    };
    let id = fm.number("id").filter(|n| *n > 0.0)? as u64;
    Some(IndexItem {
        id,
        kind,
        title: titles.get(&title_key(kind, id)).cloned().unwrap_or_default(),
        actionability: fm.text("actionability").unwrap_or_default(),
        priority_score: fm.number("priority_score").unwrap_or(0.0),
        implementation_score_auto: fm.number("implementation_score_auto").map(round_score),
        implementation_score_final: fm.number("implementation_score_final").map(round_score),
        implementation_tier_auto: fm.text("implementation_tier_auto"),
        implementation_tier_final: fm.text("implementation_tier_final"),
        agent_score: fm.number("agent_score"),
        agent_confidence: fm.text("agent_confidence"),
        relationship_score: fm.number("relationship_score"),
        relationship_overlap: fm.number("relationship_overlap"),
        relationship_quality_auto: fm.text("relationship_quality_auto"),
        relationship_quality_final: fm.text("relationship_quality_final"),
        sentiment_score: fm.number("sentiment_score"),
        needs_info_score: fm.number("needs_info_score"),
        needs_info_signals: fm.strings("needs_info_signals"),
        linked_issues: fm
            .numbers("linked_issues")
            .into_iter()
            .filter(|n| *n > 0.0)
            .map(|n| n as u64)
            .collect(),
        labels: fm.strings("labels"),
        note_path,
        last_seen_at: fm.text("last_seen_at"),
        last_reviewed_at: fm.text("last_reviewed_at"),
    })
}

/// Read every `*.md` under `notes_dir`. Notes without a usable `id` are
/// skipped. Paths are recorded relative to `relative_to`.
pub fn build_index(
    notes_dir: &Path,
    titles: &HashMap<String, String>,
    relative_to: &Path,
) -> anyhow::Result<Vec<IndexItem>> {
    let mut paths = Vec::new();
    collect_notes(notes_dir, &mut paths)?;

    let mut items = Vec::with_capacity(paths.len());
    for path in paths {
        let content = fs::read_to_string(&path).with_context(|| format!("read note {}", path.display()))?;
        let (fm, _) = parse_document(&content);
        if let Some(item) = index_item(&fm, titles, relative_display(&path, relative_to)) {
            items.push(item);
        }
    }
    items.sort_by(|a, b| a.kind.as_str().cmp(b.kind.as_str()).then(a.id.cmp(&b.id)));
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn indexes_sorted_and_skips_unidentified_notes() {
        let tmp = tempfile::tempdir().unwrap();
        let notes = tmp.path().join("notes");
        write(
            &notes.join("prs/000/PR-5.md"),
            "---\nid: 5\ntype: pr\nactionability: ready\npriority_score: 12.5\nimplementation_score_final: 31\nlinked_issues: [2]\n---\n",
        );
        write(
            &notes.join("issues/000/ISSUE-9.md"),
            "---\nid: 9\ntype: issue\nlabels: [bug, ui]\n---\n",
        );
        write(
            &notes.join("issues/000/ISSUE-2.md"),
            "---\nid: 2\ntype: issue\nneeds_info_signals: [missing_repro]\n---\n",
        );
        write(&notes.join("issues/000/scratch.md"), "just some thoughts\n");
        write(&notes.join("issues/000/ISSUE-3.txt"), "---\nid: 3\n---\n");

        let mut titles = HashMap::new();
        titles.insert(title_key(EntityKind::Pr, 5), "Fix crash".to_string());

        let items = build_index(&notes, &titles, tmp.path()).unwrap();
        let order: Vec<(EntityKind, u64)> = items.iter().map(|i| (i.kind, i.id)).collect();
        assert_eq!(
            order,
            vec![(EntityKind::Issue, 2), (EntityKind::Issue, 9), (EntityKind::Pr, 5)]
        );

        let pr = &items[2];
        assert_eq!(pr.title, "Fix crash");
        assert_eq!(pr.implementation_score_final, Some(31));
        assert_eq!(pr.linked_issues, vec![2]);
        assert_eq!(pr.note_path, "notes/prs/000/PR-5.md");
        assert_eq!(items[1].labels, vec!["bug", "ui"]);
        assert_eq!(items[0].needs_info_signals, vec!["missing_repro"]);
        assert_eq!(items[0].title, "");
    }

    #[test]
    fn missing_directory_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let items = build_index(&tmp.path().join("nope"), &HashMap::new(), tmp.path()).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn optional_fields_are_omitted() {
        let mut fm = FrontMatter::default();
        fm.set("id", 4u64);
        let item = index_item(&fm, &HashMap::new(), "notes/x.md".into()).unwrap();
        let v = serde_json::to_value(&item).unwrap();
        assert_eq!(v["type"], "issue");
        assert!(v.get("agentScore").is_none());
        assert_eq!(v["notePath"], "notes/x.md");
        assert_eq!(v["linkedIssues"], serde_json::json!([]));
    }
}
