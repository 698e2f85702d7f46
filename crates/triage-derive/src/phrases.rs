//! Phrase extraction from markdown and structured (YAML form) templates.

use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::Value as Yaml;

/// Phrases longer than this are template boilerplate, not vocabulary.
const MAX_PHRASE_CHARS: usize = 180;

static CHECKBOX_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-*]\s*\[[ xX]\]").unwrap());
static HEADING_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#+\s*").unwrap());
static BULLET_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-*]\s*").unwrap());
static YAML_FIELD_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:label|id):\s*(.+)$").unwrap());
static SURROUNDING_QUOTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^["']|["']$"#).unwrap());

static SANITIZE_STEPS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        // task-list boxes anywhere in the phrase
        (Regex::new(r"\[[xX ]\]\s*").unwrap(), ""),
        // parenthetical asides
        (Regex::new(r"\([^)]*\)").unwrap(), ""),
        (Regex::new(r"^[\[\]xX\s-]+").unwrap(), ""),
        // emphasis / code markers
        (Regex::new(r"[*_`]").unwrap(), ""),
        // trailing colon, ASCII or full-width
        (Regex::new(r"[：:]\s*$").unwrap(), ""),
        (Regex::new(r"\s+").unwrap(), " "),
    ]
});

pub fn sanitize_phrase(phrase: &str) -> String {
    let mut out = phrase.to_string();
    for (pattern, replacement) in SANITIZE_STEPS.iter() {
        out = pattern.replace_all(&out, *replacement).into_owned();
    }
    out.trim().to_string()
}

/// Headings and list items; checkbox items and block quotes are skipped.
pub fn extract_markdown_phrases(content: &str) -> Vec<String> {
    let mut phrases = Vec::new();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || CHECKBOX_LINE.is_match(trimmed) {
            continue;
        }
        if trimmed.starts_with('#') {
            phrases.push(sanitize_phrase(&HEADING_PREFIX.replace(trimmed, "")));
        } else if trimmed.starts_with('-') || trimmed.starts_with('*') {
            phrases.push(sanitize_phrase(&BULLET_PREFIX.replace(trimmed, "")));
        }
    }
    phrases
}

/// `id` and `attributes.label` of each `body` field, in document order.
/// Option lists nested inside a field are not vocabulary.
fn collect_form_fields(doc: &Yaml) -> Vec<String> {
    let mut out = Vec::new();
    let Some(fields) = doc.get("body").and_then(Yaml::as_sequence) else {
        return out;
    };
    for field in fields {
        let Some(map) = field.as_mapping() else {
            continue;
        };
        for (key, value) in map {
            let text = match key.as_str() {
                Some("id") => value.as_str(),
                Some("attributes") => value.get("label").and_then(Yaml::as_str),
                _ => None,
            };
            if let Some(text) = text {
                out.push(sanitize_phrase(text));
            }
        }
    }
    out
}

/// Field ids and labels of an issue form. Falls back to a line scan when
/// the document is not valid YAML.
pub fn extract_yaml_phrases(content: &str) -> Vec<String> {
    if let Ok(doc) = serde_yaml::from_str::<Yaml>(content) {
        return collect_form_fields(&doc);
    }
    content
        .lines()
        .filter_map(|line| YAML_FIELD_LINE.captures(line.trim()))
        .map(|caps| sanitize_phrase(&SURROUNDING_QUOTES.replace_all(&caps[1], "")))
        .collect()
}

/// Lower-case and keep phrases that are non-empty and not oversized.
pub fn accept_phrase(phrase: &str) -> Option<String> {
    let normalized = phrase.trim().to_lowercase();
    if normalized.is_empty() || normalized.chars().count() > MAX_PHRASE_CHARS {
        return None;
    }
    Some(normalized)
}
