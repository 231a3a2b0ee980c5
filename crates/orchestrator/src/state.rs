//! The orchestration run's state machine (§4.5):
//! `Idle → Discovering → FindingArtists → Enqueuing → Draining → Reporting → Idle`,
//! with a `Failed` branch reachable from any in-flight stage.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Discovering,
    FindingArtists,
    Enqueuing,
    Draining,
    Reporting,
    Failed,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunState::Idle => "idle",
            RunState::Discovering => "discovering",
            RunState::FindingArtists => "finding_artists",
            RunState::Enqueuing => "enqueuing",
            RunState::Draining => "draining",
            RunState::Reporting => "reporting",
            RunState::Failed => "failed",
        };
        write!(f, "{s}")
    }
}
