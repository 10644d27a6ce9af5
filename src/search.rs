use std::str::FromStr;

use regex::{Regex, RegexBuilder};
use thiserror::Error;

use crate::library::Track;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid search pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("no such field: \"{0}\"")]
    UnknownField(String),
}

/// A track field a search pattern can be matched against.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SearchField {
    Artist,
    Album,
    Name,
    Filename,
    Format,
}

/// Fields searched when none are named explicitly.
pub const DEFAULT_FIELDS: [SearchField; 3] =
    [SearchField::Artist, SearchField::Album, SearchField::Name];

impl FromStr for SearchField {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "artist" => Ok(Self::Artist),
            "album" => Ok(Self::Album),
            "name" | "title" => Ok(Self::Name),
            "filename" => Ok(Self::Filename),
            "format" => Ok(Self::Format),
            other => Err(SearchError::UnknownField(other.to_string())),
        }
    }
}

/// A compiled, case-insensitive pattern bound to the fields it applies to.
///
/// A track matches when the pattern matches any of the fields; fields the
/// track does not carry are skipped and never raise.
#[derive(Debug, Clone)]
pub struct Query {
    regex: Regex,
    fields: Vec<SearchField>,
}

impl Query {
    pub fn new(pattern: &str, fields: Vec<SearchField>) -> Result<Self, SearchError> {
        let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self { regex, fields })
    }

    pub fn with_default_fields(pattern: &str) -> Result<Self, SearchError> {
        Self::new(pattern, DEFAULT_FIELDS.to_vec())
    }

    pub fn matches(&self, track: &Track) -> bool {
        self.fields
            .iter()
            .filter_map(|&field| track.field(field))
            .any(|value| self.regex.is_match(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(name: &str, artist: Option<&str>, album: Option<&str>) -> Track {
        Track {
            uri: format!("file:///music/{name}"),
            path: None,
            name: name.to_string(),
            artist: artist.map(str::to_string),
            album: album.map(str::to_string),
            track: None,
            disc: None,
            year: None,
            duration: None,
            format: None,
        }
    }

    #[test]
    fn field_names_parse_case_insensitively() {
        assert_eq!("Artist".parse::<SearchField>().unwrap(), SearchField::Artist);
        assert_eq!("ALBUM".parse::<SearchField>().unwrap(), SearchField::Album);
        assert_eq!("title".parse::<SearchField>().unwrap(), SearchField::Name);
        assert!(matches!(
            " genre ".parse::<SearchField>(),
            Err(SearchError::UnknownField(f)) if f == "genre"
        ));
    }

    #[test]
    fn match_is_case_insensitive_over_default_fields() {
        let q = Query::with_default_fields("beatles").unwrap();
        assert!(q.matches(&track("Taxman", Some("The Beatles"), Some("Revolver"))));
        assert!(q.matches(&track("Beatles Cover", None, None)));
        assert!(!q.matches(&track("Paranoid", Some("Black Sabbath"), None)));
    }

    #[test]
    fn absent_fields_never_match_and_never_fail() {
        let q = Query::new(".", vec![SearchField::Artist, SearchField::Format]).unwrap();
        assert!(!q.matches(&track("Untitled", None, None)));
    }

    #[test]
    fn empty_string_fields_do_not_match() {
        let q = Query::new(".*", vec![SearchField::Artist]).unwrap();
        assert!(!q.matches(&track("Untitled", Some(""), None)));
    }

    #[test]
    fn invalid_pattern_is_a_recoverable_error() {
        assert!(matches!(
            Query::with_default_fields("["),
            Err(SearchError::Pattern(_))
        ));
    }
}
