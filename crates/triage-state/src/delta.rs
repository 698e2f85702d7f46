use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use triage_core::{Entity, Issue, PullRequest};

use crate::snapshot::{item_hash, StateSnapshot};

/// Changes since the previous run. `new` and `updated` follow the current
/// item order; `closed` is ascending.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Delta {
    pub new_issues: Vec<u64>,
    pub updated_issues: Vec<u64>,
    pub new_prs: Vec<u64>,
    pub updated_prs: Vec<u64>,
    pub closed_issues: Vec<u64>,
    pub closed_prs: Vec<u64>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.new_issues.is_empty()
            && self.updated_issues.is_empty()
            && self.new_prs.is_empty()
            && self.updated_prs.is_empty()
            && self.closed_issues.is_empty()
            && self.closed_prs.is_empty()
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct KindDelta {
    pub new: Vec<u64>,
    pub updated: Vec<u64>,
    pub closed: Vec<u64>,
}

/// Compare `(number, fingerprint)` pairs against the previous fingerprints.
/// The fingerprint is the content hash on the snapshot path and `updatedAt`
/// on the dump path.
pub(crate) fn diff<'a>(
    previous: &BTreeMap<u64, String>,
    current: impl IntoIterator<Item = (u64, &'a str)>,
) -> KindDelta {
    let mut out = KindDelta::default();
    let mut seen = HashSet::new();
    for (number, fingerprint) in current {
        seen.insert(number);
        match previous.get(&number) {
            None => out.new.push(number),
            Some(prev) if prev != fingerprint => out.updated.push(number),
            Some(_) => {}
        }
    }
    out.closed = previous.keys().copied().filter(|n| !seen.contains(n)).collect();
    out
}

fn assemble(issues: KindDelta, prs: KindDelta) -> Delta {
    Delta {
        new_issues: issues.new,
        updated_issues: issues.updated,
        new_prs: prs.new,
        updated_prs: prs.updated,
        closed_issues: issues.closed,
        closed_prs: prs.closed,
    }
}

fn hashed<E: Entity>(items: &[E]) -> Vec<(u64, String)> {
    items.iter().map(|e| (e.number(), item_hash(e))).collect()
}

pub fn delta_from_state(previous: &StateSnapshot, issues: &[Issue], prs: &[PullRequest]) -> Delta {
    let issue_hashes = hashed(issues);
    let pr_hashes = hashed(prs);
    let delta = assemble(
        diff(&previous.issue_hashes, issue_hashes.iter().map(|(n, h)| (*n, h.as_str()))),
        diff(&previous.pr_hashes, pr_hashes.iter().map(|(n, h)| (*n, h.as_str()))),
    );
    debug!(?delta, "delta from snapshot");
    delta
}

// ── Fallback: previous report dump ──

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DumpedItem {
    number: u64,
    #[serde(default)]
    updated_at: String,
}

#[derive(Debug, Deserialize)]
struct IssueDump {
    issues: Vec<DumpedItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrDump {
    pull_requests: Vec<DumpedItem>,
}

fn updated_by_number(items: Vec<DumpedItem>) -> BTreeMap<u64, String> {
    items.into_iter().map(|i| (i.number, i.updated_at)).collect()
}

/// Derive the delta from a previous report's `data/issues.json` and
/// `data/prs.json`, comparing `updatedAt`. `Ok(None)` when either file is
/// missing.
pub fn delta_from_previous_dump(data_dir: &Path, issues: &[Issue], prs: &[PullRequest]) -> anyhow::Result<Option<Delta>> {
    let issues_path = data_dir.join("issues.json");
    let prs_path = data_dir.join("prs.json");
    let Some(prev_issues) = triage_store::read_json::<IssueDump>(&issues_path)? else {
        return Ok(None);
    };
    let Some(prev_prs) = triage_store::read_json::<PrDump>(&prs_path)? else {
        return Ok(None);
    };

    let delta = assemble(
        diff(
            &updated_by_number(prev_issues.issues),
            issues.iter().map(|i| (i.number, i.updated_at.as_str())),
        ),
        diff(
            &updated_by_number(prev_prs.pull_requests),
            prs.iter().map(|p| (p.number, p.updated_at.as_str())),
        ),
    );
    debug!(dir = %data_dir.display(), ?delta, "delta from previous dump");
    Ok(Some(delta))
}

/// Lexicographically greatest subdirectory of `reports_root`, skipping
/// `exclude` (the run currently being written).
pub fn find_latest_report_dir(reports_root: &Path, exclude: Option<&str>) -> anyhow::Result<Option<PathBuf>> {
    let entries = match fs::read_dir(reports_root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("read {}", reports_root.display())),
    };
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if Some(name.as_str()) != exclude {
            names.push(name);
        }
    }
    Ok(names.into_iter().max().map(|name| reports_root.join(name)))
}
