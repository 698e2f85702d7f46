use std::path::{Path, PathBuf};

use triage_config::Config;

/// Well-known locations under a repository root.
#[derive(Debug, Clone)]
pub struct TriagePaths {
    pub root: PathBuf,
    pub config_json: PathBuf,
    pub derived_json: PathBuf,
    pub notes_dir: PathBuf,
    pub index_dir: PathBuf,
    pub runs_log: PathBuf,
    pub state_file: PathBuf,
    pub reports_dir: PathBuf,
}

impl TriagePaths {
    /// Derive all paths from a repo root with the default report and state
    /// locations. Pure computation, no I/O.
    pub fn discover(repo_root: impl Into<PathBuf>) -> Self {
        let root = repo_root.into();
        let maintainer_dir = root.join(".github").join("maintainer");
        Self {
            config_json: maintainer_dir.join("config.json"),
            derived_json: maintainer_dir.join("semantics.generated.json"),
            notes_dir: maintainer_dir.join("notes"),
            index_dir: maintainer_dir.join("index"),
            runs_log: maintainer_dir.join("runs.md"),
            state_file: maintainer_dir.join("state.json"),
            reports_dir: root.join("reports"),
            root,
        }
    }

    /// Apply the configured `reportsDir` and `stateFile`, relative to the root.
    pub fn with_config(mut self, config: &Config) -> Self {
        self.reports_dir = self.root.join(&config.reports_dir);
        self.state_file = self.root.join(&config.state_file);
        self
    }

    pub fn report_dir(&self, datetime: &str) -> PathBuf {
        self.reports_dir.join(datetime)
    }

    /// `path` relative to the root with forward slashes, or as given when it
    /// lies outside.
    pub fn relative(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(rel) => rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
            Err(_) => path.display().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_locations_resolve_under_root() {
        let mut config = triage_config::resolve(None, None).config;
        config.reports_dir = "out/reports".into();
        let paths = TriagePaths::discover("/repo").with_config(&config);
        assert_eq!(paths.reports_dir, Path::new("/repo/out/reports"));
        assert_eq!(paths.state_file, Path::new("/repo/.github/maintainer/state.json"));
        assert_eq!(
            paths.relative(&paths.report_dir("2024-03-01T00-00-00")),
            "out/reports/2024-03-01T00-00-00"
        );
        assert_eq!(paths.relative(Path::new("/elsewhere/x")), "/elsewhere/x");
    }
}
