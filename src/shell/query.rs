//! Search expression parsing.
//!
//! Grammar (`and` is case-insensitive, `in` and `or` are lowercase):
//!
//! ```text
//! pattern [in field1 or field2 ...] [and pattern2 [in field3 ...] ...]
//! ```
//!
//! Every `and`-term narrows the result; an empty expression matches every
//! track. Results keep collection or playlist order.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::library::{Collection, Track};
use crate::playlist::Playlist;
use crate::search::{Query, SearchError};

static AND_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+and\s+").expect("static pattern"));

pub struct SearchExpr {
    terms: Vec<Query>,
}

impl SearchExpr {
    pub fn parse(input: &str) -> Result<Self, SearchError> {
        let input = input.trim();
        if input.is_empty() {
            // Match-all: list the whole collection/playlist.
            return Ok(Self {
                terms: vec![Query::with_default_fields(".")?],
            });
        }

        let terms = AND_SPLIT
            .split(input)
            .map(parse_term)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { terms })
    }

    /// All matching tracks as a playlist, in collection order.
    pub fn over_collection(&self, collection: &Collection) -> Playlist {
        let mut result = collection.search(&self.terms[0]);
        for term in &self.terms[1..] {
            let narrowed: Vec<Arc<Track>> =
                result.iter().filter(|t| term.matches(t)).cloned().collect();
            result = Playlist::new();
            result.extend(narrowed);
        }
        result
    }

    /// Positions of tracks matching every term, in playlist order.
    pub fn over_playlist(&self, playlist: &Playlist) -> Vec<usize> {
        let mut positions = playlist.search(&self.terms[0]);
        for term in &self.terms[1..] {
            positions.retain(|&n| playlist.get(n).is_some_and(|t| term.matches(t)));
        }
        positions
    }
}

fn parse_term(term: &str) -> Result<Query, SearchError> {
    match term.split_once(" in ") {
        Some((pattern, fields)) => {
            let fields = fields
                .split(" or ")
                .map(|f| f.trim().parse())
                .collect::<Result<Vec<_>, _>>()?;
            Query::new(pattern.trim(), fields)
        }
        None => Query::with_default_fields(term.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchError;

    fn collection() -> Collection {
        let track = |name: &str, artist: &str, album: &str| Track {
            uri: format!("file:///m/{name}"),
            path: None,
            name: name.to_string(),
            artist: Some(artist.to_string()),
            album: Some(album.to_string()),
            track: None,
            disc: None,
            year: None,
            duration: None,
            format: None,
        };
        Collection::from_tracks(vec![
            track("Taxman", "The Beatles", "Revolver"),
            track("Come Together", "The Beatles", "Abbey Road"),
            track("Paranoid", "Black Sabbath", "Paranoid"),
        ])
    }

    #[test]
    fn bare_pattern_searches_default_fields() {
        let expr = SearchExpr::parse("beatles").unwrap();
        assert_eq!(expr.over_collection(&collection()).len(), 2);
    }

    #[test]
    fn empty_expression_matches_everything() {
        let expr = SearchExpr::parse("   ").unwrap();
        assert_eq!(expr.over_collection(&collection()).len(), 3);
    }

    #[test]
    fn in_clause_restricts_fields() {
        let c = collection();

        let expr = SearchExpr::parse("paranoid in album").unwrap();
        assert_eq!(expr.over_collection(&c).len(), 1);

        // "paranoid" never appears in artist.
        let expr = SearchExpr::parse("paranoid in artist").unwrap();
        assert!(expr.over_collection(&c).is_empty());

        let expr = SearchExpr::parse("paranoid in artist or name").unwrap();
        assert_eq!(expr.over_collection(&c).len(), 1);
    }

    #[test]
    fn and_terms_intersect() {
        let c = collection();

        let expr = SearchExpr::parse("beatles AND abbey in album").unwrap();
        let result = expr.over_collection(&c);
        assert_eq!(result.len(), 1);
        assert_eq!(result.get(0).unwrap().name, "Come Together");
    }

    #[test]
    fn unknown_field_is_reported() {
        assert!(matches!(
            SearchExpr::parse("x in genre"),
            Err(SearchError::UnknownField(f)) if f == "genre"
        ));
    }

    #[test]
    fn over_playlist_returns_intersected_positions() {
        let c = collection();
        let all = SearchExpr::parse("").unwrap().over_collection(&c);

        let expr = SearchExpr::parse("beatles").unwrap();
        let positions = expr.over_playlist(&all);
        assert_eq!(positions.len(), 2);
        for p in positions {
            assert_eq!(all.get(p).unwrap().artist.as_deref(), Some("The Beatles"));
        }
    }
}
