use thiserror::Error;

/// Result type alias for deduplication operations
pub type Result<T> = std::result::Result<T, DedupError>;

/// Errors raised around the deduplication engine.
///
/// The engine itself is total over valid host records; these errors come from
/// configuration validation and from turning raw source payloads into hosts.
#[derive(Error, Debug)]
pub enum DedupError {
    /// Invalid engine configuration (threshold, weights, metric name)
    #[error("configuration error: {0}")]
    Config(String),

    /// A raw source record could not be turned into a host
    #[error("cannot normalize {source_system} record: {reason}")]
    Normalization {
        /// Source the record came from
        source_system: String,
        /// What was wrong with it
        reason: String,
    },

    /// Source response that does not contain a record list
    #[error("malformed source payload: {0}")]
    Payload(String),

    /// Timestamp that is neither RFC 3339 nor a naive ISO-8601 datetime
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// JSON parsing/serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DedupError {
    /// Returns true if the error only concerns a single source record.
    ///
    /// Record-level errors are skipped by batch normalization instead of
    /// aborting the run.
    #[must_use]
    pub const fn is_record_error(&self) -> bool {
        matches!(self, Self::Normalization { .. } | Self::InvalidTimestamp(_))
    }

    pub(crate) fn normalization(source_system: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Normalization {
            source_system: source_system.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_errors_are_classified() {
        assert!(DedupError::normalization("Qualys", "not an object").is_record_error());
        assert!(DedupError::InvalidTimestamp("yesterday".into()).is_record_error());
        assert!(!DedupError::Config("threshold".into()).is_record_error());
    }

    #[test]
    fn normalization_message_names_source() {
        let err = DedupError::normalization("Crowdstrike", "missing cid");
        assert_eq!(
            err.to_string(),
            "cannot normalize Crowdstrike record: missing cid"
        );
    }
}
