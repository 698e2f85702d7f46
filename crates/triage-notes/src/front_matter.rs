//! `---`-delimited `key: value` header codec.
//!
//! Values are a small tagged union; lists are written as `[a, b]`. Key order
//! is preserved, with well-known keys hoisted to a fixed prefix on output.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static BLOCK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\A---\n(.*?)\n---\n?").unwrap());

/// Keys written first, in this order; any other key follows in stored order.
pub const PREFERRED_ORDER: &[&str] = &[
    "id",
    "type",
    "status",
    "actionability",
    "priority_score",
    "implementation_score_auto",
    "implementation_score_final",
    "implementation_tier_auto",
    "implementation_tier_final",
    "agent_score",
    "agent_confidence",
    "agent_rationale",
    "relationship_score",
    "relationship_overlap",
    "relationship_quality_auto",
    "relationship_quality_final",
    "sentiment_score",
    "needs_info_score",
    "needs_info_signals",
    "linked_issues",
    "labels",
    "last_seen_at",
    "last_reviewed_at",
    "next_review_at",
    "decisions",
    "tags",
    "owner",
];

#[derive(Debug, Clone, PartialEq)]
pub enum FrontValue {
    Str(String),
    Num(f64),
    Bool(bool),
    StrList(Vec<String>),
    NumList(Vec<f64>),
}

/// Integral values print without a fraction (`3`, not `3.0`).
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn canonical_number(s: &str) -> Option<f64> {
    let n: f64 = s.parse().ok()?;
    (n.is_finite() && format_number(n) == s).then_some(n)
}

fn strip_quotes(s: &str) -> &str {
    let s = s.strip_prefix('"').unwrap_or(s);
    let s = s.strip_suffix('"').unwrap_or(s);
    let s = s.strip_prefix('\'').unwrap_or(s);
    s.strip_suffix('\'').unwrap_or(s)
}

impl FrontValue {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return FrontValue::Str(String::new());
        }
        match trimmed {
            "true" => return FrontValue::Bool(true),
            "false" => return FrontValue::Bool(false),
            _ => {}
        }
        if let Some(inner) = trimmed.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
            let inner = inner.trim();
            if inner.is_empty() {
                return FrontValue::StrList(Vec::new());
            }
            let items: Vec<FrontValue> = inner.split(',').map(FrontValue::parse).collect();
            if items.iter().all(|v| matches!(v, FrontValue::Num(_))) {
                return FrontValue::NumList(items.iter().filter_map(FrontValue::as_number).collect());
            }
            return FrontValue::StrList(items.iter().map(|v| v.to_string()).collect());
        }
        if let Some(n) = canonical_number(trimmed) {
            return FrontValue::Num(n);
        }
        FrontValue::Str(strip_quotes(trimmed).to_string())
    }

    /// Numeric view: numbers, and strings that hold a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FrontValue::Num(n) => Some(*n),
            FrontValue::Str(s) if !s.trim().is_empty() => s.trim().parse().ok().filter(|n: &f64| n.is_finite()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FrontValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FrontValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrontValue::Str(s) => f.write_str(s),
            FrontValue::Num(n) => f.write_str(&format_number(*n)),
            FrontValue::Bool(b) => write!(f, "{b}"),
            FrontValue::StrList(items) => write!(f, "[{}]", items.join(", ")),
            FrontValue::NumList(items) => {
                let parts: Vec<String> = items.iter().map(|n| format_number(*n)).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

impl From<&str> for FrontValue {
    fn from(s: &str) -> Self {
        FrontValue::Str(s.to_string())
    }
}

impl From<String> for FrontValue {
    fn from(s: String) -> Self {
        FrontValue::Str(s)
    }
}

impl From<f64> for FrontValue {
    fn from(n: f64) -> Self {
        FrontValue::Num(n)
    }
}

impl From<i64> for FrontValue {
    fn from(n: i64) -> Self {
        FrontValue::Num(n as f64)
    }
}

impl From<u64> for FrontValue {
    fn from(n: u64) -> Self {
        FrontValue::Num(n as f64)
    }
}

impl From<Vec<String>> for FrontValue {
    fn from(items: Vec<String>) -> Self {
        FrontValue::StrList(items)
    }
}

impl From<&[u64]> for FrontValue {
    fn from(items: &[u64]) -> Self {
        FrontValue::NumList(items.iter().map(|n| *n as f64).collect())
    }
}

/// Ordered key/value header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    entries: Vec<(String, FrontValue)>,
}

impl FrontMatter {
    pub fn get(&self, key: &str) -> Option<&FrontValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Replace in place, or append when the key is new.
    pub fn set(&mut self, key: &str, value: impl Into<FrontValue>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<FrontValue> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(FrontValue::as_number)
    }

    pub fn string(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FrontValue::as_str)
    }

    /// Any non-empty value rendered as text.
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key)
            .map(|v| v.to_string())
            .filter(|s| !s.is_empty() && s != "false")
    }

    pub fn strings(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(FrontValue::StrList(items)) => items.clone(),
            Some(FrontValue::NumList(items)) => items.iter().map(|n| format_number(*n)).collect(),
            Some(FrontValue::Str(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
            _ => Vec::new(),
        }
    }

    pub fn numbers(&self, key: &str) -> Vec<f64> {
        match self.get(key) {
            Some(FrontValue::NumList(items)) => items.clone(),
            Some(FrontValue::StrList(items)) => items.iter().filter_map(|s| s.trim().parse().ok()).collect(),
            _ => Vec::new(),
        }
    }

    pub fn render(&self) -> String {
        let mut ordered: Vec<&(String, FrontValue)> = PREFERRED_ORDER
            .iter()
            .filter_map(|key| self.entries.iter().find(|(k, _)| k == key))
            .collect();
        ordered.extend(
            self.entries
                .iter()
                .filter(|(k, _)| !PREFERRED_ORDER.contains(&k.as_str())),
        );
        let mut out = String::from("---\n");
        for (key, value) in ordered {
            out.push_str(&format!("{key}: {value}\n"));
        }
        out.push_str("---\n");
        out
    }
}

/// Split a note into its header and free-form body. Content without a header
/// block is all body.
pub fn parse_document(content: &str) -> (FrontMatter, String) {
    let Some(block) = BLOCK.captures(content) else {
        return (FrontMatter::default(), content.to_string());
    };
    let mut fm = FrontMatter::default();
    for line in block[1].split('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        fm.set(key.trim(), FrontValue::parse(value));
    }
    let header_len = block.get(0).map_or(0, |m| m.end());
    (fm, content[header_len..].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_parsing() {
        assert_eq!(FrontValue::parse(""), FrontValue::Str(String::new()));
        assert_eq!(FrontValue::parse(" true "), FrontValue::Bool(true));
        assert_eq!(FrontValue::parse("12"), FrontValue::Num(12.0));
        assert_eq!(FrontValue::parse("-0.5"), FrontValue::Num(-0.5));
        // not canonical, so kept as text
        assert_eq!(FrontValue::parse("007"), FrontValue::Str("007".into()));
        assert_eq!(FrontValue::parse("\"quoted\""), FrontValue::Str("quoted".into()));
        assert_eq!(FrontValue::parse("[1, 2]"), FrontValue::NumList(vec![1.0, 2.0]));
        assert_eq!(
            FrontValue::parse("[bug, 2]"),
            FrontValue::StrList(vec!["bug".into(), "2".into()])
        );
        assert_eq!(FrontValue::parse("[]"), FrontValue::StrList(vec![]));
    }

    #[test]
    fn document_split_and_comments() {
        let doc = "---\nid: 4\n# comment: ignored\nnot a pair\nlast_seen_at: 2024-01-01T00:00:00Z\n---\nBody text\n";
        let (fm, body) = parse_document(doc);
        assert_eq!(fm.number("id"), Some(4.0));
        assert_eq!(fm.string("last_seen_at"), Some("2024-01-01T00:00:00Z"));
        assert_eq!(fm.keys().count(), 2);
        assert_eq!(body, "Body text\n");

        let (fm, body) = parse_document("no header here");
        assert!(fm.is_empty());
        assert_eq!(body, "no header here");
    }

    #[test]
    fn render_hoists_known_keys_and_keeps_unknown_order() {
        let mut fm = FrontMatter::default();
        fm.set("zeta", "z");
        fm.set("labels", vec!["bug".to_string()]);
        fm.set("alpha", "a");
        fm.set("id", 7u64);
        assert_eq!(fm.render(), "---\nid: 7\nlabels: [bug]\nzeta: z\nalpha: a\n---\n");
    }

    #[test]
    fn render_then_parse_is_stable() {
        let mut fm = FrontMatter::default();
        fm.set("id", 12u64);
        fm.set("priority_score", 14.5);
        fm.set("linked_issues", &[3u64, 9][..]);
        fm.set("needs_info_signals", Vec::<String>::new());
        fm.set("agent_rationale", "looks right");
        let rendered = fm.render();
        let (back, body) = parse_document(&rendered);
        assert_eq!(back.render(), rendered);
        assert!(body.is_empty());
        assert_eq!(back.numbers("linked_issues"), vec![3.0, 9.0]);
    }

    #[test]
    fn number_view_accepts_numeric_strings() {
        let mut fm = FrontMatter::default();
        fm.set("agent_score", "3");
        fm.set("owner", "");
        assert_eq!(fm.number("agent_score"), Some(3.0));
        assert_eq!(fm.number("owner"), None);
        assert_eq!(fm.text("owner"), None);
    }
}
