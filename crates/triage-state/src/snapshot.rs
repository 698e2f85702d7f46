use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::warn;

use triage_core::{Entity, Issue, PullRequest, SCHEMA_VERSION};

/// 32-bit rolling hash (`h = h * 31 + unit` over UTF-16 units, wrapping) of
/// `updatedAt|commentsTotal|title`, as lower-case hex of its absolute value.
///
/// Only a change signal: collisions are possible and tolerated.
pub fn item_hash(entity: &dyn Entity) -> String {
    let data = format!(
        "{}|{}|{}",
        entity.updated_at(),
        entity.comments_total(),
        entity.title()
    );
    let mut h: i32 = 0;
    for unit in data.encode_utf16() {
        h = h.wrapping_mul(31).wrapping_add(i32::from(unit));
    }
    format!("{:x}", i64::from(h).abs())
}

pub(crate) fn hashes<E: Entity>(items: &[E]) -> BTreeMap<u64, String> {
    items.iter().map(|e| (e.number(), item_hash(e))).collect()
}

/// What a run leaves behind for the next one to diff against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub last_run_at: String,
    #[serde(default)]
    pub last_report_dir: String,
    pub issue_hashes: BTreeMap<u64, String>,
    pub pr_hashes: BTreeMap<u64, String>,
}

impl StateSnapshot {
    pub fn new(last_run_at: &str, report_dir: &str, issues: &[Issue], prs: &[PullRequest]) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            last_run_at: last_run_at.to_string(),
            last_report_dir: report_dir.to_string(),
            issue_hashes: hashes(issues),
            pr_hashes: hashes(prs),
        }
    }
}

/// Previous snapshot, or `None` when there is none or it cannot be used.
/// A corrupt file is treated as no history and reported in `warnings`.
pub fn read_state(path: &Path, warnings: &mut Vec<String>) -> Option<StateSnapshot> {
    match triage_store::read_json::<StateSnapshot>(path) {
        Ok(state) => state,
        Err(e) => {
            warn!(path = %path.display(), error = %format!("{e:#}"), "ignoring unreadable state snapshot");
            warnings.push(format!("State file {} is unreadable; starting fresh: {e:#}", path.display()));
            None
        }
    }
}

pub fn write_state(path: &Path, state: &StateSnapshot) -> anyhow::Result<()> {
    triage_store::write_json(path, state).with_context(|| format!("write state {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::issue;
    use std::fs;

    #[test]
    fn hash_is_stable_and_sensitive_to_each_part() {
        let base = issue(1, "Crash on save", "2024-02-01T00:00:00Z", 2);
        assert_eq!(item_hash(&base), item_hash(&base.clone()));
        assert_ne!(
            item_hash(&base),
            item_hash(&issue(1, "Crash on save", "2024-02-02T00:00:00Z", 2))
        );
        assert_ne!(
            item_hash(&base),
            item_hash(&issue(1, "Crash on save", "2024-02-01T00:00:00Z", 3))
        );
        assert_ne!(
            item_hash(&base),
            item_hash(&issue(1, "Crash on load", "2024-02-01T00:00:00Z", 2))
        );

        let mut relabeled = base.clone();
        relabeled.labels = vec!["bug".into()];
        relabeled.body = Some("more detail".into());
        relabeled.priority_score += 10.0;
        assert_eq!(item_hash(&relabeled), item_hash(&base));
    }

    #[test]
    fn hash_matches_known_values() {
        // "a|0|" = 97,124,48,124
        let h = (((97i64 * 31 + 124) * 31 + 48) * 31) + 124;
        let mut item = issue(1, "", "2024-02-01T00:00:00Z", 0);
        item.updated_at = "a".into();
        assert_eq!(item_hash(&item), format!("{h:x}"));

        // long titles overflow and wrap to a negative value before abs
        item.title = "x".repeat(40);
        let hex = item_hash(&item);
        assert!(u32::from_str_radix(&hex, 16).is_ok());
    }

    #[test]
    fn state_round_trip_and_corruption() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(".github/maintainer/state.json");
        let mut warnings = Vec::new();
        assert!(read_state(&path, &mut warnings).is_none());
        assert!(warnings.is_empty());

        let state = StateSnapshot::new(
            "2024-03-01T00:00:00Z",
            "reports/2024-03-01T00-00-00",
            &[issue(2, "b", "2024-02-01T00:00:00Z", 0), issue(10, "a", "2024-02-01T00:00:00Z", 0)],
            &[],
        );
        write_state(&path, &state).unwrap();
        let back = read_state(&path, &mut warnings).unwrap();
        assert_eq!(back, state);
        assert_eq!(back.schema_version, 1);

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw["issueHashes"]["10"].is_string());
        assert!(raw["prHashes"].as_object().unwrap().is_empty());

        fs::write(&path, "{ not json").unwrap();
        assert!(read_state(&path, &mut warnings).is_none());
        fs::write(&path, r#"{"schemaVersion":1,"issueHashes":{}}"#).unwrap();
        assert!(read_state(&path, &mut warnings).is_none());
        assert_eq!(warnings.len(), 2);
    }
}
