//! Error types for the radar ingestion pipeline.

use thiserror::Error;

/// Result type alias using RadarError.
pub type RadarResult<T> = Result<T, RadarError>;

/// Primary error type for ingestion operations.
#[derive(Debug, Error)]
pub enum RadarError {
    // === Discovery ===
    #[error("Listing failed for prefix '{prefix}': {message}")]
    Discovery { prefix: String, message: String },

    #[error("Filename does not match convention: {0}")]
    Parse(String),

    // === Per-item stages ===
    #[error("Fetch failed for {key}: {message}")]
    Fetch { key: String, message: String },

    #[error("Transform failed for {file}: {message}")]
    Transform { file: String, message: String },

    #[error("Failed to decode radar volume: {0}")]
    Decode(String),

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("Projection error: {0}")]
    Projection(String),

    // === Persistence ===
    #[error("Manifest I/O error: {0}")]
    ManifestIo(String),

    #[error("Storage error: {0}")]
    Storage(String),

    // === Infrastructure ===
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RadarError {
    /// Short stage label used in structured log fields.
    pub fn stage(&self) -> &'static str {
        match self {
            RadarError::Discovery { .. } | RadarError::Storage(_) => "discover",
            RadarError::Parse(_) => "parse",
            RadarError::Fetch { .. } => "fetch",
            RadarError::Transform { .. }
            | RadarError::Decode(_)
            | RadarError::Render(_)
            | RadarError::Projection(_) => "transform",
            RadarError::ManifestIo(_) => "reconcile",
            RadarError::Config(_) => "config",
            RadarError::Io(_) | RadarError::Json(_) => "io",
        }
    }

    /// Whether this error aborts a whole family pass rather than a single item.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            RadarError::Discovery { .. }
                | RadarError::Storage(_)
                | RadarError::ManifestIo(_)
                | RadarError::Config(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_labels() {
        let err = RadarError::Fetch {
            key: "2024/05/01/KPDT/KPDT20240501_091522_V06".to_string(),
            message: "timeout".to_string(),
        };
        assert_eq!(err.stage(), "fetch");
        assert!(!err.is_structural());

        let err = RadarError::Discovery {
            prefix: "2024/05/01/KPDT/".to_string(),
            message: "access denied".to_string(),
        };
        assert_eq!(err.stage(), "discover");
        assert!(err.is_structural());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: RadarError = io.into();
        assert!(err.to_string().contains("gone"));
    }
}
