//! Entity Extraction
//!
//! Pulls email addresses, URLs, filesystem paths, and numeric literals out
//! of free text with independent pattern passes. A utility for callers
//! (handler dispatch, logging, parameter pre-fill); the routing decision
//! never depends on it.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("email pattern")
});

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s<>"{}|\\^`\[\]]+"#).expect("url pattern"));

// Unix paths (absolute or home-relative) and Windows drive paths.
static PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:[/~][\w./-]+|[A-Z]:\\[\w.\\/-]+)").expect("path pattern"));

static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d+(?:\.\d+)?\b").expect("number pattern"));

/// Entities found in a piece of text, one list per pattern pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntities {
    pub emails: Vec<String>,
    pub urls: Vec<String>,
    pub file_paths: Vec<String>,
    pub numbers: Vec<String>,
}

/// Extract entities from `text`. Pure and deterministic; each entity class
/// is matched independently, so one span can appear in several lists.
pub fn extract_entities(text: &str) -> ExtractedEntities {
    let collect = |re: &Regex| re.find_iter(text).map(|m| m.as_str().to_string()).collect();
    ExtractedEntities {
        emails: collect(&EMAIL_RE),
        urls: collect(&URL_RE),
        file_paths: collect(&PATH_RE),
        numbers: collect(&NUMBER_RE),
    }
}
