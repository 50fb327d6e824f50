//! Write detection for free-form Cypher.
//!
//! This is a textual heuristic, not a parse. A keyword anywhere in the text
//! counts, including inside string literals, comments and property names,
//! so `MATCH (n) RETURN n.delete` is rejected. Write verbs missing from the
//! deny-list are not caught.

use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};

/// Keywords that mark a statement as a write.
pub const WRITE_KEYWORDS: [&str; 6] = ["MERGE", "CREATE", "SET", "DELETE", "REMOVE", "ADD"];

/// Outcome of classifying a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryKind {
    Read,
    /// The first deny-listed keyword found, upper-cased.
    Write { keyword: String },
}

impl QueryKind {
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Write { .. })
    }
}

/// Deny-list policy matching whole words case-insensitively.
#[derive(Debug, Clone)]
pub struct WriteGuard {
    keywords: Vec<String>,
    pattern: Regex,
}

impl WriteGuard {
    /// Build a guard from a custom keyword set.
    pub fn new<I, S>(keywords: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_ascii_uppercase())
            .filter(|k| !k.is_empty())
            .collect();
        let pattern = build_pattern(&keywords)?;
        Ok(Self { keywords, pattern })
    }

    /// The deny-listed keywords, upper-cased.
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn classify(&self, query: &str) -> QueryKind {
        match self.pattern.find(query) {
            Some(m) => QueryKind::Write {
                keyword: m.as_str().to_ascii_uppercase(),
            },
            None => QueryKind::Read,
        }
    }

    pub fn is_write(&self, query: &str) -> bool {
        self.pattern.is_match(query)
    }
}

impl Default for WriteGuard {
    fn default() -> Self {
        static DEFAULT_PATTERN: OnceLock<Regex> = OnceLock::new();
        let keywords: Vec<String> = WRITE_KEYWORDS.iter().map(|k| k.to_string()).collect();
        let pattern = DEFAULT_PATTERN
            .get_or_init(|| build_pattern(&keywords).expect("write keyword pattern is valid"))
            .clone();
        Self { keywords, pattern }
    }
}

/// Classify with the default keyword set.
pub fn is_write_query(query: &str) -> bool {
    WriteGuard::default().is_write(query)
}

/// `\b(K1|K2|...)\b`. An empty keyword set matches nothing.
fn build_pattern(keywords: &[String]) -> Result<Regex, regex::Error> {
    if keywords.is_empty() {
        return Regex::new(r"\b\B");
    }
    let alternation = keywords
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&format!(r"\b({alternation})\b"))
        .case_insensitive(true)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_keyword_is_a_write_in_any_case() {
        let guard = WriteGuard::default();
        for keyword in WRITE_KEYWORDS {
            let upper = format!("MATCH (n) {keyword} n.x = 1");
            let lower = upper.to_lowercase();
            assert!(guard.is_write(&upper), "{upper}");
            assert!(guard.is_write(&lower), "{lower}");
        }
    }

    #[test]
    fn test_plain_reads_are_not_writes() {
        let guard = WriteGuard::default();
        assert!(!guard.is_write("RETURN 1 as x"));
        assert!(!guard.is_write("MATCH (o:Organization) RETURN o.name ORDER BY o.name LIMIT 10"));
        assert!(!guard.is_write(
            "CALL db.index.fulltext.queryNodes('companies_fulltext', $search) YIELD node, score RETURN node"
        ));
        assert_eq!(guard.classify("RETURN 1"), QueryKind::Read);
    }

    #[test]
    fn test_keywords_inside_words_do_not_match() {
        let guard = WriteGuard::default();
        assert!(!guard.is_write("MATCH (n) WHERE n.created_at > $t RETURN n.dataset, n.address"));
        assert!(!guard.is_write("MATCH (a:Article) RETURN a.settlement, a.merged_by"));
    }

    #[test]
    fn test_literals_and_property_names_still_match() {
        let guard = WriteGuard::default();
        assert!(guard.is_write("MATCH (n) WHERE n.title = 'merge talks' RETURN n"));
        assert!(guard.is_write("MATCH (n) RETURN n.delete"));
        assert!(guard.is_write("MATCH (n) // create later\nRETURN n"));
    }

    #[test]
    fn test_classify_reports_first_keyword() {
        let guard = WriteGuard::default();
        assert_eq!(
            guard.classify("merge (n:Person {id: 1}) set n.name = 'x'"),
            QueryKind::Write {
                keyword: "MERGE".to_string()
            }
        );
        assert!(guard.classify("DETACH DELETE n").is_write());
    }

    #[test]
    fn test_custom_keyword_set() {
        let guard = WriteGuard::new(["drop", " load "]).unwrap();
        assert_eq!(guard.keywords(), &["DROP".to_string(), "LOAD".to_string()]);
        assert!(guard.is_write("DROP INDEX idx"));
        assert!(guard.is_write("LOAD CSV FROM 'x' AS row RETURN row"));
        assert!(!guard.is_write("CREATE (n)"));
    }

    #[test]
    fn test_empty_keyword_set_allows_everything() {
        let guard = WriteGuard::new(Vec::<String>::new()).unwrap();
        assert!(!guard.is_write("CREATE (n) SET n.x = 1"));
    }

    #[test]
    fn test_free_function_uses_default_set() {
        assert!(is_write_query("REMOVE n.flag"));
        assert!(!is_write_query("MATCH (n) RETURN count(n)"));
    }
}
