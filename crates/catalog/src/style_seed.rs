//! Built-in controlled vocabulary for the Style reference table (§3).
//! `CatalogStore::migrate` seeds these rows so every process that runs
//! migrations resolves the same canonical ids and aliases — the worker's
//! style extraction and the projector's search-term expansion both read
//! from this table rather than keeping their own copy of the list.

use crate::record::{Difficulty, Style};

pub fn default_styles() -> Vec<Style> {
    vec![
        style("old_school", "Old School", &["traditional", "americana"], Difficulty::Beginner, 90),
        style(
            "neo_traditional",
            "Neo-Traditional",
            &["neo-traditional", "new traditional"],
            Difficulty::Intermediate,
            70,
        ),
        style("japanese", "Japanese", &["irezumi"], Difficulty::Advanced, 65),
        style("blackwork", "Blackwork", &["blackout"], Difficulty::Intermediate, 60),
        style("realism", "Realism", &["photorealism", "hyperrealism"], Difficulty::Advanced, 75),
        style("watercolor", "Watercolor", &["water color"], Difficulty::Advanced, 55),
        style("tribal", "Tribal", &["polynesian", "maori"], Difficulty::Intermediate, 40),
        style("fine_line", "Fine Line", &["fineline", "single needle"], Difficulty::Beginner, 85),
        style("geometric", "Geometric", &["sacred geometry"], Difficulty::Intermediate, 50),
        style("dotwork", "Dotwork", &["stipple", "stippling"], Difficulty::Advanced, 35),
        style("new_school", "New School", &["new-school", "cartoon"], Difficulty::Intermediate, 45),
        style("chicano", "Chicano", &["black and grey", "black & grey"], Difficulty::Advanced, 50),
        style("portrait", "Portrait", &[], Difficulty::Advanced, 60),
        style("script", "Script", &["lettering"], Difficulty::Beginner, 65),
        style("biomechanical", "Biomechanical", &["biomech"], Difficulty::Advanced, 30),
    ]
}

fn style(id: &str, display_name: &str, aliases: &[&str], difficulty: Difficulty, popularity: u32) -> Style {
    Style {
        id: id.to_string(),
        display_name: display_name.to_string(),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
        difficulty,
        popularity,
        characteristic_tags: Vec::new(),
        origin_epoch: None,
    }
}
