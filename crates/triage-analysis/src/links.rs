use regex::Regex;

use triage_core::{Result, TriageError};

const DEFAULT_MENTION_KEYWORDS: &str = "fixes?|closes?|resolves?|addresses|related to|see|ref";
const DEFAULT_EXPLICIT_LINK: &str = r"fixes\s+#\d+|closes\s+#\d+|resolves\s+#\d+";

/// `#123` reference patterns, compiled once per batch from the configured
/// link keywords.
#[derive(Debug, Clone)]
pub struct LinkPatterns {
    mention: Regex,
    explicit: Regex,
}

impl LinkPatterns {
    pub fn new(link_keywords: &[String]) -> Result<Self> {
        let alternation = link_keywords
            .iter()
            .filter(|k| !k.is_empty())
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        let (mention_kw, explicit) = if alternation.is_empty() {
            (DEFAULT_MENTION_KEYWORDS.to_string(), DEFAULT_EXPLICIT_LINK.to_string())
        } else {
            (alternation.clone(), format!(r"(?:{alternation})\s+#\d+"))
        };
        let mention = Regex::new(&format!(r"(?i)(?:^|\s)(?:{mention_kw})?[:\s]*#(\d+)"))
            .map_err(|e| TriageError::Config(format!("link keyword pattern: {e}")))?;
        let explicit = Regex::new(&format!("(?i){explicit}"))
            .map_err(|e| TriageError::Config(format!("explicit link pattern: {e}")))?;
        Ok(Self { mention, explicit })
    }

    /// Referenced numbers in first-seen order, without duplicates.
    pub fn mentions(&self, text: Option<&str>) -> Vec<u64> {
        let Some(text) = text else {
            return Vec::new();
        };
        let mut found = Vec::new();
        for caps in self.mention.captures_iter(text) {
            if let Ok(n) = caps[1].parse::<u64>() {
                if !found.contains(&n) {
                    found.push(n);
                }
            }
        }
        found
    }

    /// Whether `text` carries a keyword-qualified link such as `fixes #12`.
    pub fn has_explicit_link(&self, text: &str) -> bool {
        self.explicit.is_match(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> LinkPatterns {
        let cfg = triage_config::resolve(None, None).config;
        LinkPatterns::new(&cfg.semantics.relationship.link_keywords).unwrap()
    }

    #[test]
    fn mentions_dedupe_in_order() {
        let p = defaults();
        assert_eq!(
            p.mentions(Some("Fixes #12, see #4 and also #12\n#7")),
            vec![12, 4, 7]
        );
        assert!(p.mentions(None).is_empty());
    }

    #[test]
    fn mentions_need_leading_whitespace() {
        let p = defaults();
        assert!(p.mentions(Some("issue#5 and foo#6")).is_empty());
        assert_eq!(p.mentions(Some("ref: #9")), vec![9]);
    }

    #[test]
    fn explicit_links_need_keyword() {
        let p = defaults();
        assert!(p.has_explicit_link("This closes #3."));
        assert!(!p.has_explicit_link("Mentions #3 only"));
    }

    #[test]
    fn empty_keywords_use_builtin_alternation() {
        let p = LinkPatterns::new(&[]).unwrap();
        assert_eq!(p.mentions(Some("resolves #2")), vec![2]);
        assert!(p.has_explicit_link("Fixes  #2"));
        assert!(!p.has_explicit_link("see #2"));
    }
}
