//! Tagged per-item results.
//!
//! Every unit of per-file work reports one of three outcomes. The
//! orchestrator consumes them after the batch completes; no single item's
//! failure unwinds its siblings.

use radar_common::RadarError;

/// Result of processing one remote key.
#[derive(Debug)]
pub enum ItemOutcome<T> {
    /// Work completed with a value.
    Done(T),
    /// The key was deliberately passed over.
    Skipped { key: String, reason: String },
    /// Work failed at `stage`.
    Failed {
        key: String,
        stage: &'static str,
        error: RadarError,
    },
}

impl<T> ItemOutcome<T> {
    pub fn skipped(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ItemOutcome::Skipped {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Record a failure, taking the stage from the error kind.
    pub fn failed(key: impl Into<String>, error: RadarError) -> Self {
        ItemOutcome::Failed {
            key: key.into(),
            stage: error.stage(),
            error,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, ItemOutcome::Done(_))
    }

    pub fn done(&self) -> Option<&T> {
        match self {
            ItemOutcome::Done(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_done(self) -> Option<T> {
        match self {
            ItemOutcome::Done(value) => Some(value),
            _ => None,
        }
    }

    /// Stage label of a failure.
    pub fn failed_stage(&self) -> Option<&'static str> {
        match self {
            ItemOutcome::Failed { stage, .. } => Some(stage),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_takes_stage_from_error() {
        let outcome: ItemOutcome<()> = ItemOutcome::failed(
            "PDT_HHC_2024_05_01_09_15_22",
            RadarError::Fetch {
                key: "PDT_HHC_2024_05_01_09_15_22".to_string(),
                message: "connection reset".to_string(),
            },
        );
        assert_eq!(outcome.failed_stage(), Some("fetch"));
        assert!(!outcome.is_done());
    }

    #[test]
    fn test_done_accessors() {
        let outcome = ItemOutcome::Done(3u32);
        assert_eq!(outcome.done(), Some(&3));
        assert_eq!(outcome.into_done(), Some(3));

        let skipped: ItemOutcome<u32> = ItemOutcome::skipped("x", "pattern mismatch");
        assert!(skipped.into_done().is_none());
    }
}
