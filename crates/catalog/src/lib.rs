//! Typed access to the single-table catalog (C1, §4.1).

pub mod change_event;
pub mod error;
pub mod record;
pub mod store;
pub mod style_seed;
pub mod takedown;

pub use change_event::{ChangeEvent, ChangeEventType, RecordKey};
pub use error::{CatalogError, Result, WriteOutcome};
pub use record::{
    Artist, ArtistWithImages, Difficulty, PortfolioImage, Studio, Style, TakedownRequest, TakedownStatus,
};
pub use store::CatalogStore;
pub use style_seed::default_styles;
pub use takedown::{run_sweep, TakedownStore};
