use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Write `data` to a temp file beside `path`, then rename it into place.
pub fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("write {}: path has no parent", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("write {}", path.display()))?;
    tmp.write_all(data)
        .with_context(|| format!("write {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Pretty-print `value` as JSON (two-space indent, trailing newline) and write it atomically.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> anyhow::Result<()> {
    let mut json = serde_json::to_string_pretty(value)
        .with_context(|| format!("serialize {}", path.display()))?;
    json.push('\n');
    write_atomic(path, json.as_bytes())
}

/// Write text with a trailing newline.
pub fn write_text(path: &Path, content: &str) -> anyhow::Result<()> {
    let mut out = content.to_string();
    if !out.ends_with('\n') {
        out.push('\n');
    }
    write_atomic(path, out.as_bytes())
}

/// Read and parse a JSON file.
///
/// `Ok(None)` when the file does not exist; `Err` when it exists but cannot
/// be read or parsed, so callers decide whether that is fatal.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Option<T>> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("read {}", path.display())),
    };
    let value = serde_json::from_str(&content)
        .with_context(|| format!("parse {}", path.display()))?;
    Ok(Some(value))
}

/// Read a text file, `None` when missing or unreadable.
pub fn read_text_if_exists(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_atomic_creates_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("test.txt");
        write_atomic(&path, b"hello world").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello world");
    }

    #[test]
    fn write_atomic_creates_parent_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a").join("b").join("c.json");
        write_atomic(&path, b"{}").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn write_atomic_error_names_the_path() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("reports");
        fs::write(&blocker, "not a dir").unwrap();
        let err = write_atomic(&blocker.join("issues.json"), b"[]").unwrap_err();
        assert!(format!("{err:#}").contains(&blocker.display().to_string()));
    }

    #[test]
    fn write_json_is_pretty_with_trailing_newline() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("v.json");
        write_json(&path, &serde_json::json!({"a": 1})).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\n  \"a\": 1\n}\n");
    }

    #[test]
    fn read_json_missing_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let got: Option<serde_json::Value> = read_json(&tmp.path().join("nope.json")).unwrap();
        assert!(got.is_none());
    }

    #[test]
    fn read_json_malformed_is_err() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        assert!(read_json::<serde_json::Value>(&path).is_err());
    }

    #[test]
    fn write_text_appends_newline_once() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("LATEST");
        write_text(&path, "reports/x").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "reports/x\n");
        write_text(&path, "reports/y\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "reports/y\n");
    }
}
