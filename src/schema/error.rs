//! Error types shared by the route data model and its operators.

/// Violations of the discrete route encoding.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RouteError {
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),
    #[error("Mutation requires at least {required} genes, chromosome has {actual}")]
    MutationPrecondition { required: usize, actual: usize },
    #[error("Configuration mismatch: {0}")]
    ConfigurationMismatch(String),
}

impl RouteError {
    pub(crate) fn position_out_of_range(position: usize, positions: usize) -> Self {
        Self::InvalidEncoding(format!(
            "position index {position} out of range for {positions} positions"
        ))
    }

    pub(crate) fn invalid_distance(distance: f64) -> Self {
        Self::InvalidEncoding(format!(
            "distance {distance} must be finite and non-negative"
        ))
    }

    pub(crate) fn slot_mismatch(expected: usize, actual: usize) -> Self {
        Self::ConfigurationMismatch(format!(
            "expected {expected} positions, found {actual}"
        ))
    }
}
