//! Correlation id generation and propagation.
//!
//! Every entry point (HTTP request, queue message, orchestration run) either
//! accepts or generates a correlation id and threads it through the rest of
//! the call via `tracing`'s span fields rather than a manually-passed
//! parameter, matching how the teacher attaches `run_id`/`scrapeRunId`-style
//! context to its event store and engine dispatch.

use uuid::Uuid;

/// Generates a fresh correlation id (`scrapeRunId` for orchestration runs,
/// request id for API calls).
pub fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Parses a caller-supplied correlation id, falling back to a freshly
/// generated one if absent or empty.
pub fn correlation_id_or_new(supplied: Option<&str>) -> String {
    match supplied {
        Some(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => new_correlation_id(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_unique_ids() {
        assert_ne!(new_correlation_id(), new_correlation_id());
    }

    #[test]
    fn falls_back_when_absent_or_blank() {
        assert!(!correlation_id_or_new(None).is_empty());
        assert!(!correlation_id_or_new(Some("  ")).is_empty());
    }

    #[test]
    fn preserves_supplied_id() {
        assert_eq!(correlation_id_or_new(Some("abc-123")), "abc-123");
    }
}
