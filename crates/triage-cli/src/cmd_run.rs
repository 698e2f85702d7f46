use std::collections::{BTreeMap, HashMap};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use serde::de::DeserializeOwned;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{info, warn};

use triage_analysis::{analyze, contributor_profiles, Graph};
use triage_config::{load_config, merge_layer, Config, ListMerge};
use triage_core::raw::{RawIssue, RawPullRequest};
use triage_core::time_util::format_rfc3339;
use triage_core::{ContributorProfile, EntityKind, Issue, PullRequest};
use triage_notes::{apply_note_to_pr, build_index, sync_note, title_key, IndexItem, NoteOutcome};
use triage_state::{
    delta_from_previous_dump, delta_from_state, find_latest_report_dir, read_state, write_state, Delta,
    StateSnapshot,
};

use crate::paths::TriagePaths;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub issues: PathBuf,
    pub prs: PathBuf,
    pub config: Option<PathBuf>,
    pub as_of: OffsetDateTime,
    pub datetime: Option<String>,
    pub delta: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NoteCounts {
    pub created: usize,
    pub merged: usize,
    pub unchanged: usize,
}

impl NoteCounts {
    fn record(&mut self, outcome: NoteOutcome) {
        match outcome {
            NoteOutcome::Created => self.created += 1,
            NoteOutcome::Merged => self.merged += 1,
            NoteOutcome::Unchanged => self.unchanged += 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub report_label: String,
    pub issues: usize,
    pub pull_requests: usize,
    pub contributors: usize,
    pub notes: NoteCounts,
    pub delta: Option<Delta>,
    pub previous: Option<String>,
    pub warnings: Vec<String>,
}

// ── Artifact shapes ──

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IssuesFile<'a> {
    generated_at: &'a str,
    count: usize,
    issues: &'a [Issue],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PullRequestsFile<'a> {
    generated_at: &'a str,
    count: usize,
    pull_requests: &'a [PullRequest],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ContributorsFile<'a> {
    generated_at: &'a str,
    count: usize,
    contributors: &'a BTreeMap<String, ContributorProfile>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IndexFile<'a> {
    generated_at: &'a str,
    count: usize,
    items: &'a [IndexItem],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphFile<'a> {
    generated_at: &'a str,
    #[serde(flatten)]
    graph: &'a Graph,
}

/// `2024-03-01T10:20:30Z` → `2024-03-01T10-20-30`
fn datetime_label(raw: Option<&str>, as_of: OffsetDateTime) -> String {
    match raw {
        Some(s) => s.trim().replace(':', "-"),
        None => {
            let ts = format_rfc3339(as_of);
            let ts = ts.split('.').next().unwrap_or(&ts).trim_end_matches('Z');
            ts.replace(':', "-")
        }
    }
}

fn read_input<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    triage_store::read_json::<Vec<T>>(path)?.ok_or_else(|| anyhow!("input file not found: {}", path.display()))
}

/// Fold the repository-derived semantics into `config`. Failures only warn.
fn apply_derived(paths: &TriagePaths, config: Config, generated_at: &str, warnings: &mut Vec<String>) -> Config {
    let derived = triage_derive::derive_repo_overrides(&paths.root, &config);
    if let Err(e) = triage_derive::write_derived_file(&paths.derived_json, &derived, generated_at) {
        warn!(error = %format!("{e:#}"), "could not persist derived semantics");
        warnings.push(format!("Failed to write derived semantics: {e:#}"));
    }
    if derived.overrides.is_empty() {
        return config;
    }
    match merge_layer(&config, &derived.overrides.to_layer(), ListMerge::Union) {
        Ok(merged) => merged,
        Err(e) => {
            warnings.push(format!("Ignoring derived semantics: {e}"));
            config
        }
    }
}

fn compute_delta(
    paths: &TriagePaths,
    datetime: &str,
    issues: &[Issue],
    prs: &[PullRequest],
    warnings: &mut Vec<String>,
) -> anyhow::Result<(Option<Delta>, Option<String>)> {
    if let Some(previous) = read_state(&paths.state_file, warnings) {
        let label = previous.last_run_at.clone();
        return Ok((Some(delta_from_state(&previous, issues, prs)), Some(label)));
    }
    let Some(dir) = find_latest_report_dir(&paths.reports_dir, Some(datetime))? else {
        return Ok((None, None));
    };
    let label = paths.relative(&dir);
    match delta_from_previous_dump(&dir.join("data"), issues, prs) {
        Ok(delta) => Ok((delta, Some(label))),
        Err(e) => {
            warnings.push(format!("Could not read previous report {label}: {e:#}"));
            Ok((None, Some(label)))
        }
    }
}

fn append_run_log(path: &Path, line: &str) -> anyhow::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open {}", path.display()))?;
    writeln!(file, "{line}")?;
    Ok(())
}

/// One full triage pass over the supplied dumps. Writes every artifact and
/// returns what happened.
pub fn run(repo_root: &Path, opts: &RunOptions) -> anyhow::Result<RunSummary> {
    let paths = TriagePaths::discover(repo_root);
    let config_path = opts
        .config
        .as_ref()
        .map(|p| repo_root.join(p))
        .unwrap_or_else(|| paths.config_json.clone());

    let loaded = load_config(&config_path);
    let mut warnings = loaded.warnings;
    let generated_at = format_rfc3339(opts.as_of);
    let datetime = datetime_label(opts.datetime.as_deref(), opts.as_of);

    let config = apply_derived(&paths, loaded.config, &generated_at, &mut warnings);
    let paths = paths.with_config(&config);

    let raw_issues: Vec<RawIssue> = read_input(&repo_root.join(&opts.issues))?;
    let raw_prs: Vec<RawPullRequest> = read_input(&repo_root.join(&opts.prs))?;
    info!(issues = raw_issues.len(), prs = raw_prs.len(), "loaded input");

    let analysis = analyze(&raw_issues, &raw_prs, opts.as_of, &config)?;
    let issues = analysis.issues;
    let mut prs = analysis.pull_requests;
    let contributors = contributor_profiles(&issues, &prs);

    let mut notes = NoteCounts::default();
    for issue in &issues {
        let note = sync_note(&paths.notes_dir, issue, &generated_at, &config)?;
        notes.record(note.outcome);
    }
    for pr in &mut prs {
        let note = sync_note(&paths.notes_dir, &*pr, &generated_at, &config)?;
        notes.record(note.outcome);
        apply_note_to_pr(pr, &note.front_matter);
    }

    let (delta, previous) = if opts.delta {
        compute_delta(&paths, &datetime, &issues, &prs, &mut warnings)?
    } else {
        (None, None)
    };

    let report_dir = paths.report_dir(&datetime);
    let report_label = paths.relative(&report_dir);
    let data_dir = report_dir.join("data");

    triage_store::write_json(
        &data_dir.join("issues.json"),
        &IssuesFile {
            generated_at: &generated_at,
            count: issues.len(),
            issues: &issues,
        },
    )?;
    triage_store::write_json(
        &data_dir.join("prs.json"),
        &PullRequestsFile {
            generated_at: &generated_at,
            count: prs.len(),
            pull_requests: &prs,
        },
    )?;
    triage_store::write_json(
        &data_dir.join("contributors.json"),
        &ContributorsFile {
            generated_at: &generated_at,
            count: contributors.len(),
            contributors: &contributors,
        },
    )?;

    let mut titles = HashMap::new();
    for issue in &issues {
        titles.insert(title_key(EntityKind::Issue, issue.number), issue.title.clone());
    }
    for pr in &prs {
        titles.insert(title_key(EntityKind::Pr, pr.number), pr.title.clone());
    }
    let items = build_index(&paths.notes_dir, &titles, &paths.root)?;
    triage_store::write_json(
        &paths.index_dir.join("items.json"),
        &IndexFile {
            generated_at: &generated_at,
            count: items.len(),
            items: &items,
        },
    )?;

    let graph = Graph::build(&issues, &prs);
    triage_store::write_json(
        &paths.index_dir.join("graph.json"),
        &GraphFile {
            generated_at: &generated_at,
            graph: &graph,
        },
    )?;

    let state = StateSnapshot::new(&generated_at, &report_label, &issues, &prs);
    write_state(&paths.state_file, &state)?;
    triage_store::write_json(&data_dir.join("state.json"), &state)?;
    triage_store::write_text(&paths.reports_dir.join("LATEST"), &report_label)?;
    append_run_log(
        &paths.runs_log,
        &format!(
            "- {generated_at} | {report_label} | issues:{} prs:{}",
            issues.len(),
            prs.len()
        ),
    )?;

    info!(report = %report_label, "run complete");
    Ok(RunSummary {
        report_label,
        issues: issues.len(),
        pull_requests: prs.len(),
        contributors: contributors.len(),
        notes,
        delta,
        previous,
        warnings,
    })
}

pub fn execute(repo_root: &Path, opts: &RunOptions) -> anyhow::Result<()> {
    let summary = run(repo_root, opts)?;

    println!("Report generated: {}", summary.report_label);
    println!("  - {} issues", summary.issues);
    println!("  - {} PRs", summary.pull_requests);
    println!("  - {} contributors", summary.contributors);
    println!(
        "  - Notes: {} created, {} merged, {} unchanged",
        summary.notes.created, summary.notes.merged, summary.notes.unchanged
    );
    if let Some(delta) = &summary.delta {
        println!(
            "  - Delta since {}: {} new issues, {} updated, {} closed",
            summary.previous.as_deref().unwrap_or("unknown"),
            delta.new_issues.len(),
            delta.updated_issues.len(),
            delta.closed_issues.len()
        );
        println!(
            "  - Delta: {} new PRs, {} updated, {} closed",
            delta.new_prs.len(),
            delta.updated_prs.len(),
            delta.closed_prs.len()
        );
    } else if opts.delta {
        println!("  - Delta: no previous run found");
    }
    for warning in &summary.warnings {
        println!("Warning: {warning}");
    }
    Ok(())
}
