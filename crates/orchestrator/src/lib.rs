//! The Orchestrator (C5): drives one ingestion run end to end — discover
//! studios, find artist profiles, enqueue scrape jobs, drain, report.

mod discovery;
mod error;
mod orchestrator;
mod report;
mod sources;
mod state;

pub use discovery::{LinkArtistFinder, SeedListStudioSource};
pub use error::{OrchestratorError, Result};
pub use orchestrator::Orchestrator;
pub use report::RunReport;
pub use sources::{ArtistCandidate, ArtistFinder, StudioCandidate, StudioSource};
pub use state::RunState;
