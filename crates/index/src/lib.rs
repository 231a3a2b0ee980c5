//! The derived, query-optimized search index (§GLOSSARY) shared by the
//! projector (C2, write side) and the query API (C6, read side).

pub mod client;
pub mod document;
pub mod error;

pub use client::{IndexClient, PostgresIndexClient, SearchQuery, SearchResults};
pub use document::{build_search_terms, ArtistDocument};
pub use error::{IndexError, Result, UpsertOutcome};
