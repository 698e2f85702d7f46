use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::merge::resolve;
use crate::model::Config;

/// Result of [`load_config`]. Loading never fails; problems land in `warnings`.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub path: PathBuf,
    pub used_default: bool,
    pub warnings: Vec<String>,
}

fn defaults_only(path: &Path, warnings: Vec<String>) -> ConfigLoad {
    ConfigLoad {
        config: resolve(None, None).config,
        path: path.to_path_buf(),
        used_default: true,
        warnings,
    }
}

/// Load the stored configuration layer from `path` and resolve it over the
/// built-in defaults.
///
/// A missing file is seeded with the defaults. An unreadable or unparsable
/// file falls back to the defaults.
pub fn load_config(path: &Path) -> ConfigLoad {
    let mut warnings = Vec::new();

    if !path.exists() {
        let msg = match triage_store::write_json(path, &resolve(None, None).config) {
            Ok(()) => format!("Config not found; wrote defaults to {}.", path.display()),
            Err(e) => {
                warn!(error = %e, "could not seed default config");
                format!("Config not found at {}; using defaults.", path.display())
            }
        };
        info!("{msg}");
        warnings.push(msg);
        return defaults_only(path, warnings);
    }

    let value = match triage_store::read_json::<serde_json::Value>(path) {
        Ok(Some(v)) => v,
        Ok(None) | Err(_) => {
            let msg = format!("Failed to parse config at {}; using defaults.", path.display());
            warn!("{msg}");
            warnings.push(msg);
            return defaults_only(path, warnings);
        }
    };

    let resolved = resolve(Some(&value), None);
    let used_default = !resolved.warnings.is_empty();
    warnings.extend(resolved.warnings);
    ConfigLoad {
        config: resolved.config,
        path: path.to_path_buf(),
        used_default,
        warnings,
    }
}
