//! The derived index document (§4.2): flat fields, pre-computed search
//! terms, and a denormalized image-URL list.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ArtistDocument {
    pub artist_id: Uuid,
    pub name: String,
    pub styles: Vec<String>,
    pub geohash: String,
    pub city: String,
    pub search_terms: String,
    pub image_urls: Vec<String>,
    pub version: i64,
}

/// Builds the pre-computed search-term string: lowercased name plus
/// tokenized alias expansions for each style (§4.2).
pub fn build_search_terms(name: &str, styles: &[String], style_aliases: &[Vec<String>]) -> String {
    let mut terms = vec![name.to_lowercase()];
    for style in styles {
        terms.push(style.to_lowercase());
    }
    for aliases in style_aliases {
        terms.extend(aliases.iter().map(|a| a.to_lowercase()));
    }
    terms.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_lowercased_terms_with_alias_expansion() {
        let terms = build_search_terms(
            "Jane DOE",
            &["old_school".to_string()],
            &[vec!["Traditional".to_string(), "Americana".to_string()]],
        );
        assert!(terms.contains("jane doe"));
        assert!(terms.contains("old_school"));
        assert!(terms.contains("traditional"));
        assert!(terms.contains("americana"));
    }
}
