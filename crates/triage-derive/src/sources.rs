use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// Template directories scanned one level deep.
const TEMPLATE_DIRS: &[&str] = &[".github/ISSUE_TEMPLATE", ".github/PULL_REQUEST_TEMPLATE"];

/// Single-file templates, checked in this order.
const PR_TEMPLATE_FILES: &[&str] = &[
    ".github/PULL_REQUEST_TEMPLATE.md",
    ".github/pull_request_template.md",
];
const CONTRIBUTING_FILES: &[&str] = &["CONTRIBUTING.md", ".github/CONTRIBUTING.md"];

static TEMPLATE_GLOBS: LazyLock<GlobSet> = LazyLock::new(|| {
    let mut builder = GlobSetBuilder::new();
    for pattern in [
        ".github/ISSUE_TEMPLATE/*.{md,yml,yaml}",
        ".github/PULL_REQUEST_TEMPLATE/*.md",
    ] {
        builder.add(
            GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .expect("template glob is valid"),
        );
    }
    builder.build().expect("template glob set is valid")
});

fn matching_entries(repo_root: &Path, dir: &str) -> Vec<String> {
    let Ok(entries) = fs::read_dir(repo_root.join(dir)) else {
        return Vec::new();
    };
    let mut found: Vec<String> = entries
        .flatten()
        .filter(|e| e.path().is_file())
        .filter_map(|e| e.file_name().to_str().map(|n| format!("{dir}/{n}")))
        .filter(|rel| TEMPLATE_GLOBS.is_match(rel))
        .collect();
    found.sort();
    found
}

/// Repository-relative paths (forward slashes) of every template that exists:
/// issue templates, PR templates, then contribution guides.
pub fn collect_template_files(repo_root: &Path) -> Vec<String> {
    let mut files = matching_entries(repo_root, TEMPLATE_DIRS[0]);
    for rel in PR_TEMPLATE_FILES {
        if repo_root.join(rel).is_file() {
            files.push(rel.to_string());
        }
    }
    files.extend(matching_entries(repo_root, TEMPLATE_DIRS[1]));
    for rel in CONTRIBUTING_FILES {
        if repo_root.join(rel).is_file() {
            files.push(rel.to_string());
        }
    }
    let mut seen = std::collections::HashSet::new();
    files.retain(|f| seen.insert(f.clone()));
    files
}

pub fn is_structured(rel: &str) -> bool {
    rel.ends_with(".yml") || rel.ends_with(".yaml")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str) {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, "x").unwrap();
    }

    #[test]
    fn finds_templates_in_fixed_order() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        touch(root, ".github/ISSUE_TEMPLATE/bug.yml");
        touch(root, ".github/ISSUE_TEMPLATE/feature.md");
        touch(root, ".github/ISSUE_TEMPLATE/config.json");
        touch(root, ".github/pull_request_template.md");
        touch(root, ".github/PULL_REQUEST_TEMPLATE/release.md");
        touch(root, "CONTRIBUTING.md");

        let files = collect_template_files(root);
        assert_eq!(
            files,
            vec![
                ".github/ISSUE_TEMPLATE/bug.yml",
                ".github/ISSUE_TEMPLATE/feature.md",
                ".github/pull_request_template.md",
                ".github/PULL_REQUEST_TEMPLATE/release.md",
                "CONTRIBUTING.md",
            ]
        );
    }

    #[test]
    fn empty_repo_has_no_sources() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(collect_template_files(tmp.path()).is_empty());
    }
}
