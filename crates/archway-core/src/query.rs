use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ArchiveError;

/// Characters and operators reserved by the Lucene/Solr query syntax.
/// `*` is left out so callers can express prefix wildcards.
static RESERVED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(['" +\-!(){}\[\]^~?:\\/]|&&|\|\|)"#)
        .expect("unable to compile reserved query syntax regex")
});

/// How many escape characters precede a reserved token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeLevel {
    Single,
    Double,
}

/// Escapes reserved query syntax in `query`.
pub fn escape_query(query: &str, level: EscapeLevel) -> String {
    let replacement = match level {
        EscapeLevel::Single => r"\${1}",
        EscapeLevel::Double => r"\\${1}",
    };
    RESERVED.replace_all(query, replacement).into_owned()
}

/// Sort direction applied to titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(ArchiveError::InvalidInput(format!(
                "Sort order must be 'asc' or 'desc', got '{other}'"
            ))),
        }
    }
}

/// Filters for collection searches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionQuery {
    /// Substring matched against titles and identifiers.
    pub search_pattern: Option<String>,
    /// Exact identifier, or a prefix when it ends in `*`.
    pub identifier: Option<String>,
    pub sort: SortOrder,
}

impl CollectionQuery {
    pub fn search_pattern(&self) -> Option<&str> {
        self.search_pattern.as_deref().filter(|s| !s.is_empty())
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref().filter(|s| !s.is_empty())
    }
}

/// A 1-based page of search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 30,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    /// Number of results preceding this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_quotes_per_level() {
        let query = r#""quotes""#;
        assert_eq!(escape_query(query, EscapeLevel::Single), r#"\"quotes\""#);
        assert_eq!(escape_query(query, EscapeLevel::Double), r#"\\"quotes\\""#);
    }

    #[test]
    fn test_escape_double_operators_once() {
        assert_eq!(escape_query("&&test", EscapeLevel::Single), r"\&&test");
        assert_eq!(escape_query("a||b", EscapeLevel::Single), r"a\||b");
    }

    #[test]
    fn test_escape_leaves_plain_text_and_wildcards() {
        assert_eq!(escape_query("test", EscapeLevel::Single), "test");
        assert_eq!(escape_query("F*", EscapeLevel::Double), "F*");
        assert_eq!(escape_query("a b", EscapeLevel::Single), r"a\ b");
        assert_eq!(escape_query("a/b", EscapeLevel::Single), r"a\/b");
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("up".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_page_request_offset() {
        assert_eq!(PageRequest::default().offset(), 0);
        assert_eq!(PageRequest::new(3, 30).offset(), 60);
        assert_eq!(PageRequest::new(0, 0), PageRequest::new(1, 1));
    }

    #[test]
    fn test_collection_query_ignores_empty_filters() {
        let query = CollectionQuery {
            search_pattern: Some(String::new()),
            identifier: Some("F1".into()),
            ..Default::default()
        };
        assert_eq!(query.search_pattern(), None);
        assert_eq!(query.identifier(), Some("F1"));
    }
}
