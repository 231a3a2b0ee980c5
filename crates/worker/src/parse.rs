//! Extracts a candidate artist record from a scraped studio/artist page,
//! the same `scraper::{Html, Selector}` style as `extract_links_with_context`
//! (§4.4 step 2 "parse"). A page with no extractable artist content yields
//! `None` — classified as `Empty`, not an error (§4.4, §8 "Empty parse").

use core_catalog::Style;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

static INSTAGRAM_HANDLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"instagram\.com/([A-Za-z0-9._]+)").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedArtist {
    pub name: String,
    pub styles: Vec<String>,
    pub contact_handle: Option<String>,
    pub image_urls: Vec<String>,
}

/// Returns `None` when the page carries no recognizable artist name — the
/// caller treats this as `Empty`, acknowledges the job, and moves on
/// without writing to the catalog. `styles` is the Style reference table
/// (`CatalogStore::list_styles`) against which mentions in the page body,
/// including aliases, resolve to canonical ids (§4.4, §3).
pub fn parse_artist_page(html: &str, base_url: &str, styles: &[Style]) -> Option<ParsedArtist> {
    let document = Html::parse_document(html);
    let name = extract_name(&document)?;
    let styles = extract_styles(&document, styles);
    let contact_handle = extract_instagram_handle(&document);
    let image_urls = extract_image_urls(&document, base_url);

    Some(ParsedArtist { name, styles, contact_handle, image_urls })
}

fn extract_name(document: &Html) -> Option<String> {
    let h1 = Selector::parse("h1").ok()?;
    let text: String = document.select(&h1).next()?.text().collect::<Vec<_>>().join(" ");
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn extract_styles(document: &Html, styles: &[Style]) -> Vec<String> {
    let body_text = document.root_element().text().collect::<Vec<_>>().join(" ").to_lowercase();
    styles
        .iter()
        .filter(|style| style_is_mentioned(style, &body_text))
        .map(|style| style.id.clone())
        .collect()
}

/// True if the id, display name, or any alias appears verbatim in the page
/// body — the worker-side half of the same vocabulary `Style::matches`
/// resolves exact tokens against.
fn style_is_mentioned(style: &Style, body_text: &str) -> bool {
    let mut candidates = vec![style.id.replace('_', " "), style.id.clone(), style.display_name.to_lowercase()];
    candidates.extend(style.aliases.iter().map(|a| a.to_lowercase()));
    candidates.iter().any(|c| !c.is_empty() && body_text.contains(c.as_str()))
}

fn extract_instagram_handle(document: &Html) -> Option<String> {
    let Ok(anchor) = Selector::parse("a[href]") else { return None };
    document.select(&anchor).find_map(|el| {
        let href = el.value().attr("href")?;
        INSTAGRAM_HANDLE.captures(href).map(|c| c[1].to_string())
    })
}

fn extract_image_urls(document: &Html, base_url: &str) -> Vec<String> {
    let Ok(base) = Url::parse(base_url) else { return Vec::new() };
    let Ok(img) = Selector::parse("img[src]") else { return Vec::new() };

    let mut urls = Vec::new();
    for el in document.select(&img) {
        let Some(src) = el.value().attr("src") else { continue };
        if let Ok(resolved) = base.join(src) {
            urls.push(resolved.to_string());
        }
    }
    urls
}
